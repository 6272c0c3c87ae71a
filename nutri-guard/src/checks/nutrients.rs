//! Coverage of the required main nutrients.

use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;

use crate::core::{FieldCheck, FieldFailure, FieldVerdict};
use crate::record::{RawRecord, NUTRIENTS_FIELD};
use crate::reference::ReferenceVocabulary;
use crate::text::standardize_name;

/// Requires every required nutrient among the record's known nutrient keys.
///
/// Keys of the nutrient mapping are standardized with the parenthetical
/// strip, then intersected with the reference vocabulary. Keys the
/// vocabulary does not know never count toward coverage.
#[derive(Debug, Clone)]
pub struct MainNutrientsCheck {
    vocabulary: Arc<ReferenceVocabulary>,
    required: BTreeSet<String>,
}

impl MainNutrientsCheck {
    /// Creates the check. Required names are standardized like nutrient keys.
    pub fn new<I, S>(vocabulary: Arc<ReferenceVocabulary>, required: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            vocabulary,
            required: required
                .into_iter()
                .map(|name| standardize_name(name.as_ref()))
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }

    /// The standardized required names.
    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    /// Returns the required names the record does not cover, sorted.
    pub fn missing(&self, record: &RawRecord) -> Vec<String> {
        let known: BTreeSet<String> = raw_keys(record)
            .iter()
            .map(|key| standardize_name(key))
            .filter(|key| self.vocabulary.contains(key))
            .collect();
        self.required.difference(&known).cloned().collect()
    }
}

fn raw_keys(record: &RawRecord) -> Vec<String> {
    record
        .nutrients()
        .map(|nutrients| nutrients.keys().cloned().collect())
        .unwrap_or_default()
}

impl FieldCheck for MainNutrientsCheck {
    fn name(&self) -> &str {
        "main_nutrients_present"
    }

    fn field(&self) -> &str {
        NUTRIENTS_FIELD
    }

    fn evaluate(&self, record: &RawRecord) -> FieldVerdict {
        let missing = self.missing(record);
        if missing.is_empty() {
            return FieldVerdict::Passed;
        }
        let evidence = raw_keys(record).into_iter().map(Value::String).collect();
        FieldVerdict::Failed(
            FieldFailure::new(
                NUTRIENTS_FIELD,
                format!("Missing required nutrients: {}", missing.join(", ")),
                Value::Array(evidence),
            )
            .with_missing(missing),
        )
    }

    fn description(&self) -> Option<&str> {
        Some("nutrient mapping covers every required nutrient known to the vocabulary")
    }
}
