//! Grade letter checks for the Nutri-Score and Green-Score fields.
//!
//! Both checks treat an absent or `null` value as valid: a missing grade is
//! acceptable, a malformed one is not.

use serde_json::Value;

use crate::core::{FieldCheck, FieldVerdict};
use crate::extract::ScoreLetterExtractor;
use crate::record::RawRecord;
use crate::text::standardize;

/// Requires the standardized value to be exactly one alphabet letter.
#[derive(Debug, Clone)]
pub struct ScoreLetterCheck {
    name: String,
    field: String,
    letters: ScoreLetterExtractor,
}

impl ScoreLetterCheck {
    /// Creates a letter check reported as `name` on `field`.
    pub fn new(
        name: impl Into<String>,
        field: impl Into<String>,
        letters: ScoreLetterExtractor,
    ) -> Self {
        Self {
            name: name.into(),
            field: field.into(),
            letters,
        }
    }

    /// `nutri_score_valid` on the `nutri_score` field.
    pub fn nutri_score(letters: ScoreLetterExtractor) -> Self {
        Self::new("nutri_score_valid", "nutri_score", letters)
    }

    fn is_single_letter(&self, text: &str) -> bool {
        let canonical = standardize(text);
        let mut chars = canonical.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => self.letters.accepts(c),
            _ => false,
        }
    }
}

impl FieldCheck for ScoreLetterCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn field(&self) -> &str {
        &self.field
    }

    fn evaluate(&self, record: &RawRecord) -> FieldVerdict {
        match record.get(&self.field) {
            None | Some(Value::Null) => FieldVerdict::Passed,
            Some(Value::String(s)) if self.is_single_letter(s) => FieldVerdict::Passed,
            Some(other) => {
                FieldVerdict::failed(&self.field, "Invalid nutri-score value.", other.clone())
            }
        }
    }

    fn description(&self) -> Option<&str> {
        Some("grade is a single letter of the score alphabet, or absent")
    }
}

/// Requires the standardized value to start with a literal prefix and end
/// with an alphabet letter.
#[derive(Debug, Clone)]
pub struct GreenScoreCheck {
    name: String,
    field: String,
    prefix: String,
    letters: ScoreLetterExtractor,
}

impl GreenScoreCheck {
    /// `green_score_valid` on the `green_score_letter` field.
    pub fn new(prefix: impl Into<String>, letters: ScoreLetterExtractor) -> Self {
        Self {
            name: "green_score_valid".to_string(),
            field: "green_score_letter".to_string(),
            prefix: prefix.into(),
            letters,
        }
    }

    /// Reports the verdict under a different check name and field.
    pub fn on_field(mut self, name: impl Into<String>, field: impl Into<String>) -> Self {
        self.name = name.into();
        self.field = field.into();
        self
    }

    fn is_well_formed(&self, text: &str) -> bool {
        let canonical = standardize(text);
        canonical.starts_with(&self.prefix)
            && canonical
                .chars()
                .last()
                .is_some_and(|c| self.letters.accepts(c))
    }
}

impl FieldCheck for GreenScoreCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn field(&self) -> &str {
        &self.field
    }

    fn evaluate(&self, record: &RawRecord) -> FieldVerdict {
        match record.get(&self.field) {
            None | Some(Value::Null) => FieldVerdict::Passed,
            Some(Value::String(s)) if self.is_well_formed(s) => FieldVerdict::Passed,
            Some(other) => {
                FieldVerdict::failed(&self.field, "Invalid green-score format.", other.clone())
            }
        }
    }

    fn description(&self) -> Option<&str> {
        Some("grade carries the green-score prefix and ends with an alphabet letter, or is absent")
    }
}
