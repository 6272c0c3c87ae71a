//! Field check trait and verdict types for record validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt::Debug;

use crate::record::RawRecord;

/// Diagnostic payload of a failed check.
///
/// Serializes with the keys `error`, `value_found` and `field_name`, the shape
/// persisted in the `products_with_errors` report and read back by the error
/// value aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFailure {
    /// Human-readable reason.
    #[serde(rename = "error")]
    pub error_message: String,
    /// The raw value that was inspected, `null` when absent.
    #[serde(default)]
    pub value_found: Value,
    /// The record field the check looked at.
    pub field_name: String,
    /// Names that were required but not found, for coverage checks.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing: Vec<String>,
}

impl FieldFailure {
    /// Creates a failure for `field_name`.
    pub fn new(
        field_name: impl Into<String>,
        error_message: impl Into<String>,
        value_found: Value,
    ) -> Self {
        Self {
            error_message: error_message.into(),
            value_found,
            field_name: field_name.into(),
            missing: Vec::new(),
        }
    }

    /// Attaches the list of missing names.
    pub fn with_missing(mut self, missing: Vec<String>) -> Self {
        self.missing = missing;
        self
    }
}

/// The outcome of one check on one record.
///
/// A passing verdict serializes as `true`; a failing one as its
/// [`FieldFailure`] diagnostic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "VerdictRepr", into = "VerdictRepr")]
pub enum FieldVerdict {
    /// The check passed.
    Passed,
    /// The check failed with a diagnostic.
    Failed(FieldFailure),
}

impl FieldVerdict {
    /// Creates a failing verdict.
    pub fn failed(
        field_name: impl Into<String>,
        error_message: impl Into<String>,
        value_found: Value,
    ) -> Self {
        Self::Failed(FieldFailure::new(field_name, error_message, value_found))
    }

    /// Returns true if the check passed.
    pub fn passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Returns the diagnostic of a failing verdict.
    pub fn failure(&self) -> Option<&FieldFailure> {
        match self {
            Self::Passed => None,
            Self::Failed(failure) => Some(failure),
        }
    }
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum VerdictRepr {
    Flag(bool),
    Failure(FieldFailure),
}

impl TryFrom<VerdictRepr> for FieldVerdict {
    type Error = String;

    fn try_from(repr: VerdictRepr) -> Result<Self, Self::Error> {
        match repr {
            VerdictRepr::Flag(true) => Ok(Self::Passed),
            VerdictRepr::Flag(false) => {
                Err("a failing verdict must carry its diagnostic".to_string())
            }
            VerdictRepr::Failure(failure) => Ok(Self::Failed(failure)),
        }
    }
}

impl From<FieldVerdict> for VerdictRepr {
    fn from(verdict: FieldVerdict) -> Self {
        match verdict {
            FieldVerdict::Passed => Self::Flag(true),
            FieldVerdict::Failed(failure) => Self::Failure(failure),
        }
    }
}

/// Verdicts of every check for one record, keyed by check name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordVerdicts(BTreeMap<String, FieldVerdict>);

impl RecordVerdicts {
    /// Creates an empty set of verdicts.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the verdict of `check`.
    pub fn insert(&mut self, check: impl Into<String>, verdict: FieldVerdict) {
        self.0.insert(check.into(), verdict);
    }

    /// Returns the verdict of `check`.
    pub fn get(&self, check: &str) -> Option<&FieldVerdict> {
        self.0.get(check)
    }

    /// The conjunction of every verdict. An empty set passes.
    pub fn all_passed(&self) -> bool {
        self.0.values().all(FieldVerdict::passed)
    }

    /// Iterates the failing checks with their diagnostics.
    pub fn failures(&self) -> impl Iterator<Item = (&str, &FieldFailure)> {
        self.0
            .iter()
            .filter_map(|(name, verdict)| verdict.failure().map(|f| (name.as_str(), f)))
    }

    /// Iterates every verdict in check-name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldVerdict)> {
        self.0.iter().map(|(name, verdict)| (name.as_str(), verdict))
    }

    /// Number of verdicts.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if no check ran.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, FieldVerdict)> for RecordVerdicts {
    fn from_iter<I: IntoIterator<Item = (String, FieldVerdict)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

/// A validation rule applied to one field of a record.
///
/// Checks are pure: they never fail and never mutate the record. Every call
/// produces exactly one verdict.
///
/// # Examples
///
/// ```rust
/// use nutri_guard::core::{FieldCheck, FieldVerdict};
/// use nutri_guard::record::RawRecord;
///
/// #[derive(Debug)]
/// struct BrandPresent;
///
/// impl FieldCheck for BrandPresent {
///     fn name(&self) -> &str {
///         "brand_present"
///     }
///
///     fn field(&self) -> &str {
///         "brand"
///     }
///
///     fn evaluate(&self, record: &RawRecord) -> FieldVerdict {
///         match record.text("brand") {
///             Some(_) => FieldVerdict::Passed,
///             None => FieldVerdict::failed("brand", "Missing brand.", serde_json::Value::Null),
///         }
///     }
/// }
///
/// let record = RawRecord::new().with("brand", "Acme");
/// assert!(BrandPresent.evaluate(&record).passed());
/// ```
pub trait FieldCheck: Debug + Send + Sync {
    /// The name the verdict is reported under.
    fn name(&self) -> &str;

    /// The record field this check inspects.
    fn field(&self) -> &str;

    /// Evaluates the check against one record.
    fn evaluate(&self, record: &RawRecord) -> FieldVerdict;

    /// Returns a description of what this check validates.
    fn description(&self) -> Option<&str> {
        None
    }
}

/// A boxed check for use in collections.
pub type BoxedCheck = Box<dyn FieldCheck>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_verdict_serialization_shape() {
        assert_eq!(serde_json::to_value(FieldVerdict::Passed).unwrap(), json!(true));

        let failed = FieldVerdict::failed("nutri_score", "Invalid nutri-score value.", json!("z"));
        assert_eq!(
            serde_json::to_value(&failed).unwrap(),
            json!({
                "error": "Invalid nutri-score value.",
                "value_found": "z",
                "field_name": "nutri_score"
            })
        );
    }

    #[test]
    fn test_verdict_deserialization() {
        let verdict: FieldVerdict = serde_json::from_value(json!(true)).unwrap();
        assert!(verdict.passed());

        let verdict: FieldVerdict = serde_json::from_value(json!({
            "error": "Missing required nutrients: fat",
            "value_found": ["energy"],
            "field_name": "nutrients_100g"
        }))
        .unwrap();
        let failure = verdict.failure().unwrap();
        assert_eq!(failure.field_name, "nutrients_100g");
        assert!(failure.missing.is_empty());

        assert!(serde_json::from_value::<FieldVerdict>(json!(false)).is_err());
    }

    #[test]
    fn test_record_verdicts_conjunction() {
        let mut verdicts = RecordVerdicts::new();
        assert!(verdicts.all_passed());

        verdicts.insert("name_present", FieldVerdict::Passed);
        assert!(verdicts.all_passed());

        verdicts.insert(
            "categories_present",
            FieldVerdict::failed("categories", "Missing or empty 'categories' field.", json!("  ")),
        );
        assert!(!verdicts.all_passed());

        let failing: Vec<_> = verdicts.failures().map(|(name, _)| name).collect();
        assert_eq!(failing, vec!["categories_present"]);
        assert_eq!(verdicts.len(), 2);
    }

    #[test]
    fn test_record_verdicts_sorted_output() {
        let verdicts: RecordVerdicts = [
            ("name_present".to_string(), FieldVerdict::Passed),
            ("categories_present".to_string(), FieldVerdict::Passed),
        ]
        .into_iter()
        .collect();
        assert_eq!(
            serde_json::to_string(&verdicts).unwrap(),
            r#"{"categories_present":true,"name_present":true}"#
        );
    }
}
