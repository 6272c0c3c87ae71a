//! Aggregation of the values that made validation checks fail.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

use crate::core::RecordVerdicts;
use crate::record::value_text;
use crate::text::standardize_extended;

/// Field name used when a failure does not say which field it came from.
pub const UNKNOWN_FIELD: &str = "unknown";

/// Total occurrences of one standardized failing value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorValueCount {
    pub count: usize,
    /// Sorted names of the fields the value was seen under.
    pub fields: Vec<String>,
}

/// Standardized value → occurrences, as written to the error-value family.
pub type ErrorValueReport = BTreeMap<String, ErrorValueCount>;

/// Counts failing `value_found` entries across validation results.
///
/// Input is either typed [`RecordVerdicts`] or a decoded
/// `products_with_errors` snapshot (record → check → `true` | failure).
/// Sequences are counted element by element. Values are standardized with
/// the extended typography table and empty results are skipped.
///
/// ```rust
/// use nutri_guard::analyzers::ErrorValueAggregator;
/// use serde_json::json;
///
/// let snapshot = json!({
///     "a/1.json": {
///         "name_present": true,
///         "nutri_score_valid": {
///             "error": "Invalid nutri-score value.",
///             "value_found": "Nutri\u{2019}Score",
///             "field_name": "nutri_score"
///         }
///     }
/// });
///
/// let mut agg = ErrorValueAggregator::new();
/// agg.observe_snapshot(&snapshot);
/// let report = agg.finalize();
/// assert_eq!(report["nutri'score"].count, 1);
/// assert_eq!(report["nutri'score"].fields, vec!["nutri_score"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ErrorValueAggregator {
    counts: BTreeMap<String, (usize, BTreeSet<String>)>,
    failures_seen: usize,
}

impl ErrorValueAggregator {
    /// Creates an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts the failures of one record's typed verdicts.
    pub fn observe_verdicts(&mut self, verdicts: &RecordVerdicts) {
        for (_, failure) in verdicts.failures() {
            self.failures_seen += 1;
            self.count_value(&failure.value_found, &failure.field_name);
        }
    }

    /// Counts the failures of a whole decoded snapshot.
    ///
    /// Entries that are not failure objects (passing `true` flags, malformed
    /// records) are ignored.
    pub fn observe_snapshot(&mut self, snapshot: &Value) {
        let Some(records) = snapshot.as_object() else {
            debug!("Error snapshot is not an object, nothing to count");
            return;
        };
        for checks in records.values().filter_map(Value::as_object) {
            for verdict in checks.values() {
                self.observe_verdict_value(verdict);
            }
        }
    }

    fn observe_verdict_value(&mut self, verdict: &Value) {
        let Some(detail) = verdict.as_object() else {
            return;
        };
        let Some(value_found) = detail.get("value_found") else {
            return;
        };
        let field = detail
            .get("field_name")
            .and_then(Value::as_str)
            .unwrap_or(UNKNOWN_FIELD);
        self.failures_seen += 1;
        self.count_value(value_found, field);
    }

    fn count_value(&mut self, value: &Value, field: &str) {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.count_scalar(item, field);
                }
            }
            scalar => self.count_scalar(scalar, field),
        }
    }

    fn count_scalar(&mut self, value: &Value, field: &str) {
        let Some(text) = value_text(value) else {
            return;
        };
        let key = standardize_extended(&text);
        if key.is_empty() {
            return;
        }
        let entry = self.counts.entry(key).or_default();
        entry.0 += 1;
        entry.1.insert(field.to_string());
    }

    /// Number of failure entries seen so far.
    pub fn failures_seen(&self) -> usize {
        self.failures_seen
    }

    /// Number of distinct standardized values.
    pub fn distinct_values(&self) -> usize {
        self.counts.len()
    }

    /// Consumes the aggregator into the final report.
    pub fn finalize(self) -> ErrorValueReport {
        self.counts
            .into_iter()
            .map(|(value, (count, fields))| {
                (
                    value,
                    ErrorValueCount {
                        count,
                        fields: fields.into_iter().collect(),
                    },
                )
            })
            .collect()
    }
}

impl FromIterator<RecordVerdicts> for ErrorValueAggregator {
    fn from_iter<I: IntoIterator<Item = RecordVerdicts>>(iter: I) -> Self {
        let mut agg = Self::new();
        for verdicts in iter {
            agg.observe_verdicts(&verdicts);
        }
        agg
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{FieldFailure, FieldVerdict};
    use serde_json::json;

    #[test]
    fn test_list_values_counted_per_element() {
        let snapshot = json!({
            "x/1.json": {
                "main_nutrients_present": {
                    "error": "Missing required nutrients: fat",
                    "value_found": ["Sel", "Sucres", ""],
                    "field_name": "nutrients_100g"
                }
            },
            "x/2.json": {
                "main_nutrients_present": {
                    "error": "Missing required nutrients: fat",
                    "value_found": ["sel "],
                    "field_name": "nutrients_100g"
                },
                "name_present": true
            }
        });

        let mut agg = ErrorValueAggregator::new();
        agg.observe_snapshot(&snapshot);
        assert_eq!(agg.failures_seen(), 2);

        let report = agg.finalize();
        assert_eq!(report.len(), 2);
        assert_eq!(report["sel"].count, 2);
        assert_eq!(report["sucres"].count, 1);
    }

    #[test]
    fn test_fields_sorted_and_unknown_default() {
        let snapshot = json!({
            "a": {
                "nutri_score_valid": {"error": "e", "value_found": "F", "field_name": "nutri_score"},
                "green_score_valid": {"error": "e", "value_found": "f", "field_name": "green_score_letter"}
            },
            "b": {
                "custom": {"error": "e", "value_found": "f"}
            }
        });

        let mut agg = ErrorValueAggregator::new();
        agg.observe_snapshot(&snapshot);
        let report = agg.finalize();
        assert_eq!(report["f"].count, 3);
        assert_eq!(
            report["f"].fields,
            vec!["green_score_letter", "nutri_score", "unknown"]
        );
    }

    #[test]
    fn test_extended_table_and_skips() {
        let snapshot = json!({
            "a": {
                "c1": {"error": "e", "value_found": "1\u{201a}5 g", "field_name": "salt"},
                "c2": {"error": "e", "value_found": null, "field_name": "name"},
                "c3": {"error": "e", "value_found": "   ", "field_name": "name"},
                "c4": {"error": "e", "value_found": 12, "field_name": "nutri_score"}
            },
            "b": "not a record"
        });

        let mut agg = ErrorValueAggregator::new();
        agg.observe_snapshot(&snapshot);
        let report = agg.finalize();
        assert_eq!(
            report.keys().collect::<Vec<_>>(),
            vec!["1,5 g", "12"]
        );
    }

    #[test]
    fn test_typed_verdicts() {
        let mut verdicts = RecordVerdicts::new();
        verdicts.insert("name_present", FieldVerdict::Passed);
        verdicts.insert(
            "nutri_score_valid",
            FieldVerdict::Failed(FieldFailure::new("nutri_score", "Invalid nutri-score value.", json!("Z"))),
        );

        let agg: ErrorValueAggregator = vec![verdicts.clone(), verdicts].into_iter().collect();
        assert_eq!(agg.distinct_values(), 1);
        assert_eq!(agg.finalize()["z"].count, 2);
    }

    #[test]
    fn test_non_object_snapshot() {
        let mut agg = ErrorValueAggregator::new();
        agg.observe_snapshot(&json!([1, 2]));
        assert!(agg.finalize().is_empty());
    }
}
