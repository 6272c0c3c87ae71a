//! Presence checks for free-text fields.

use serde_json::Value;

use crate::core::{FieldCheck, FieldVerdict};
use crate::record::RawRecord;

/// Requires a non-empty string at a field.
///
/// With [`trimmed`](PresenceCheck::trimmed), a value made only of whitespace
/// counts as empty.
#[derive(Debug, Clone)]
pub struct PresenceCheck {
    name: String,
    field: String,
    trim: bool,
    description: String,
}

impl PresenceCheck {
    /// Creates a presence check reported as `name` on `field`.
    pub fn new(name: impl Into<String>, field: impl Into<String>) -> Self {
        let field = field.into();
        Self {
            name: name.into(),
            description: format!("'{field}' holds a non-empty string"),
            field,
            trim: false,
        }
    }

    /// `name_present`: a non-empty string at `name`.
    pub fn product_name() -> Self {
        Self::new("name_present", "name")
    }

    /// `categories_present`: a string at `categories` that is non-empty after trimming.
    pub fn categories() -> Self {
        Self::new("categories_present", "categories").trimmed()
    }

    /// Ignores surrounding whitespace when deciding emptiness.
    pub fn trimmed(mut self) -> Self {
        self.trim = true;
        self
    }

    fn is_present(&self, value: Option<&Value>) -> bool {
        match value {
            Some(Value::String(s)) if self.trim => !s.trim().is_empty(),
            Some(Value::String(s)) => !s.is_empty(),
            _ => false,
        }
    }
}

impl FieldCheck for PresenceCheck {
    fn name(&self) -> &str {
        &self.name
    }

    fn field(&self) -> &str {
        &self.field
    }

    fn evaluate(&self, record: &RawRecord) -> FieldVerdict {
        let value = record.get(&self.field);
        if self.is_present(value) {
            return FieldVerdict::Passed;
        }
        FieldVerdict::failed(
            &self.field,
            format!("Missing or empty '{}' field.", self.field),
            value.cloned().unwrap_or(Value::Null),
        )
    }

    fn description(&self) -> Option<&str> {
        Some(&self.description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_name_present() {
        let check = PresenceCheck::product_name();
        assert_eq!(check.name(), "name_present");
        assert!(check.evaluate(&RawRecord::new().with("name", "Yogurt")).passed());

        let verdict = check.evaluate(&RawRecord::new().with("name", ""));
        let failure = verdict.failure().unwrap();
        assert_eq!(failure.error_message, "Missing or empty 'name' field.");
        assert_eq!(failure.value_found, json!(""));
        assert_eq!(failure.field_name, "name");

        let verdict = check.evaluate(&RawRecord::new());
        assert_eq!(verdict.failure().unwrap().value_found, Value::Null);
    }

    #[test]
    fn test_categories_trimmed() {
        let check = PresenceCheck::categories();
        assert!(check
            .evaluate(&RawRecord::new().with("categories", "Dairies"))
            .passed());
        assert!(!check
            .evaluate(&RawRecord::new().with("categories", "   "))
            .passed());
        assert!(!check.evaluate(&RawRecord::new().with("categories", 3)).passed());
    }

    #[test]
    fn test_untrimmed_accepts_whitespace() {
        let check = PresenceCheck::product_name();
        assert!(check.evaluate(&RawRecord::new().with("name", " ")).passed());
    }
}
