//! Record normalization.
//!
//! [`RecordTransformer`] turns one raw record into one normalized record,
//! field by field. A field that does not parse becomes `null` (or, inside the
//! nutrient mapping, disappears) and never fails the record. Every value lost
//! that way is reported in [`TransformOutcome::unparsed`] so the dirty data
//! stays traceable.

use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::config::EngineConfig;
use crate::extract::numeric::{extract_energy, extract_single_pair, NumericToken, ENERGY_FIELD};
use crate::extract::ScoreLetterExtractor;
use crate::record::{value_text, RawRecord, NUTRIENTS_FIELD};
use crate::text::standardize_name;

const NAME_FIELD: &str = "name";
const SCORE_FIELDS: [&str; 2] = ["nutri_score", "green_score_letter"];
const CARBON_FIELD: &str = "carbon_impact_per_100g";
const MISSING_PLACEHOLDER: &str = "?";

/// Separators that introduce a descriptive suffix in product names.
const NAME_SEPARATORS: [&str; 5] = ["\u{2013}", "\u{2014}", "â€“", "â€”", " - "];

/// A normalized record and the raw values that could not be parsed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformOutcome {
    /// The normalized record.
    pub record: RawRecord,
    /// Field path (`serving_size`, `nutrients_100g.fat`, ...) → raw value
    /// that was nulled or dropped because it did not parse.
    pub unparsed: BTreeMap<String, Value>,
}

impl TransformOutcome {
    /// Returns true when every present value parsed.
    pub fn is_clean(&self) -> bool {
        self.unparsed.is_empty()
    }
}

/// Normalizes raw product records.
///
/// ```rust
/// use nutri_guard::transform::RecordTransformer;
/// use nutri_guard::record::RawRecord;
/// use serde_json::json;
///
/// let raw = RawRecord::new()
///     .with("name", "Yogurt \u{2013} Vanilla")
///     .with("quantity", "450g");
///
/// let outcome = RecordTransformer::default().transform(&raw);
/// assert_eq!(outcome.record.get("name"), Some(&json!("Yogurt")));
/// assert_eq!(
///     outcome.record.get("quantity"),
///     Some(&json!({"quantity": 450.0, "unit": "g"}))
/// );
/// ```
#[derive(Debug, Clone)]
pub struct RecordTransformer {
    letters: ScoreLetterExtractor,
    quantity_fields: Vec<String>,
}

impl Default for RecordTransformer {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl RecordTransformer {
    /// Creates a transformer using the configured alphabet and quantity fields.
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            letters: ScoreLetterExtractor::new(&config.score_alphabet),
            quantity_fields: config.numeric_fields.clone(),
        }
    }

    /// Transforms `record` into a new normalized record.
    pub fn transform(&self, record: &RawRecord) -> TransformOutcome {
        let mut out = TransformOutcome {
            record: record.clone(),
            unparsed: BTreeMap::new(),
        };

        if let Some(Value::String(name)) = record.get(NAME_FIELD) {
            out.record
                .insert(NAME_FIELD, Value::String(strip_name_suffix(name)));
        }

        for field in SCORE_FIELDS {
            if let Some(raw) = record.get(field) {
                let letter = self.score_letter(raw);
                if letter.is_none() && value_text(raw).is_some() {
                    out.unparsed.insert(field.to_string(), raw.clone());
                }
                out.record.insert(
                    field,
                    letter.map_or(Value::Null, |c| Value::String(c.to_string())),
                );
            }
        }

        if let Some(raw) = record.get(CARBON_FIELD) {
            let parsed = parse_plain_number(raw);
            if parsed.is_none() && value_text(raw).is_some() {
                out.unparsed.insert(CARBON_FIELD.to_string(), raw.clone());
            }
            out.record
                .insert(CARBON_FIELD, parsed.map_or(Value::Null, Value::from));
        }

        if let Some(raw) = record.get(NUTRIENTS_FIELD) {
            let nutrients = match raw {
                Value::Object(map) => Value::Object(self.nutrients(map, &mut out.unparsed)),
                Value::Null => Value::Null,
                other => {
                    out.unparsed
                        .insert(NUTRIENTS_FIELD.to_string(), other.clone());
                    Value::Null
                }
            };
            out.record.insert(NUTRIENTS_FIELD, nutrients);
        }

        for field in &self.quantity_fields {
            if let Some(raw) = record.get(field) {
                let token = value_text(raw).and_then(|text| extract_single_pair(&text));
                if token.is_none() && value_text(raw).is_some() {
                    out.unparsed.insert(field.clone(), raw.clone());
                }
                out.record
                    .insert(field.clone(), token.map_or(Value::Null, token_value));
            }
        }

        out
    }

    /// Transforms `record`, discarding the audit side channel.
    pub fn normalize(&self, record: &RawRecord) -> RawRecord {
        self.transform(record).record
    }

    fn score_letter(&self, raw: &Value) -> Option<char> {
        match raw {
            Value::String(s) => self.letters.extract_letter(s),
            _ => None,
        }
    }

    fn nutrients(
        &self,
        raw: &Map<String, Value>,
        unparsed: &mut BTreeMap<String, Value>,
    ) -> Map<String, Value> {
        let mut out = Map::new();
        for (key, value) in raw {
            let text = match value_text(value) {
                Some(text) if text != MISSING_PLACEHOLDER => text,
                _ => continue,
            };
            let name = standardize_name(key);
            let path = format!("{NUTRIENTS_FIELD}.{key}");

            if name == ENERGY_FIELD {
                let reading = extract_energy(&text);
                if reading.is_empty() {
                    unparsed.insert(path, value.clone());
                }
                for (qualified, token) in reading.tokens() {
                    out.insert(format!("{qualified}_100g"), token_value(token.clone()));
                }
                continue;
            }

            match value.as_str().and_then(extract_single_pair) {
                Some(token) => {
                    out.insert(name, token_value(token));
                }
                None => {
                    unparsed.insert(path, value.clone());
                }
            }
        }
        out
    }
}

/// Keeps the part of a product name before its first suffix separator.
fn strip_name_suffix(name: &str) -> String {
    let cut = NAME_SEPARATORS
        .iter()
        .filter_map(|sep| name.find(sep))
        .min();
    match cut {
        Some(at) => name[..at].trim().to_string(),
        None => name.trim().to_string(),
    }
}

fn parse_plain_number(raw: &Value) -> Option<f64> {
    let number = match raw {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }?;
    number.is_finite().then_some(number)
}

fn token_value(token: NumericToken) -> Value {
    let mut object = Map::new();
    object.insert("quantity".to_string(), Value::from(token.magnitude));
    if let Some(unit) = token.unit {
        object.insert("unit".to_string(), Value::String(unit));
    }
    Value::Object(object)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn transform(value: Value) -> TransformOutcome {
        let record = RawRecord::from_value(value).unwrap();
        RecordTransformer::default().transform(&record)
    }

    #[test]
    fn test_end_to_end_record() {
        let outcome = transform(json!({
            "barcode": "123",
            "name": "Yogurt \u{2013} Vanilla",
            "nutri_score": "Nutri-Score B",
            "nutrients_100g": {
                "energy": "500 kj (120 kcal)",
                "fat": "?",
                "proteins": "3g"
            }
        }));

        assert_eq!(
            outcome.record.into_value(),
            json!({
                "barcode": "123",
                "name": "Yogurt",
                "nutri_score": "b",
                "nutrients_100g": {
                    "energy_kj_100g": {"quantity": 500.0, "unit": "kj"},
                    "energy_kcal_100g": {"quantity": 120.0, "unit": "kcal"},
                    "proteins": {"quantity": 3.0, "unit": "g"}
                }
            })
        );
        assert!(outcome.unparsed.is_empty());
    }

    #[test]
    fn test_input_is_not_mutated() {
        let record = RawRecord::new().with("quantity", "indisponible");
        let outcome = RecordTransformer::default().transform(&record);
        assert_eq!(record.get("quantity"), Some(&json!("indisponible")));
        assert_eq!(outcome.record.get("quantity"), Some(&Value::Null));
    }

    #[test]
    fn test_name_separators() {
        assert_eq!(strip_name_suffix("Yogurt \u{2014} Vanilla"), "Yogurt");
        assert_eq!(strip_name_suffix("Yogurt â€“ Vanilla"), "Yogurt");
        assert_eq!(strip_name_suffix("Yogurt - Vanilla - 4x125g"), "Yogurt");
        assert_eq!(strip_name_suffix("Coca-Cola Zero"), "Coca-Cola Zero");
        assert_eq!(strip_name_suffix("  Plain  "), "Plain");
    }

    #[test]
    fn test_quantity_fields_null_on_failure() {
        let outcome = transform(json!({
            "serving_size": "1 serving (20g)",
            "quantity": "< 0,5 l"
        }));
        assert_eq!(
            outcome.record.get("serving_size"),
            Some(&json!({"quantity": 1.0, "unit": "serving"}))
        );
        assert_eq!(outcome.record.get("quantity"), Some(&Value::Null));
        assert_eq!(outcome.unparsed.get("quantity"), Some(&json!("< 0,5 l")));

        let outcome = transform(json!({"barcode": "1"}));
        assert!(!outcome.record.contains("quantity"));
    }

    #[test]
    fn test_scores_and_carbon() {
        let outcome = transform(json!({
            "green_score_letter": "Green-Score A",
            "nutri_score": "unknown",
            "carbon_impact_per_100g": "85.3"
        }));
        assert_eq!(outcome.record.get("green_score_letter"), Some(&json!("a")));
        assert_eq!(outcome.record.get("nutri_score"), Some(&Value::Null));
        assert_eq!(outcome.record.get("carbon_impact_per_100g"), Some(&json!(85.3)));
        assert_eq!(outcome.unparsed.get("nutri_score"), Some(&json!("unknown")));

        let outcome = transform(json!({"carbon_impact_per_100g": "85 g"}));
        assert_eq!(outcome.record.get("carbon_impact_per_100g"), Some(&Value::Null));
        assert!(outcome.unparsed.contains_key("carbon_impact_per_100g"));

        let outcome = transform(json!({"carbon_impact_per_100g": 12.5, "nutri_score": null}));
        assert_eq!(outcome.record.get("carbon_impact_per_100g"), Some(&json!(12.5)));
        assert_eq!(outcome.record.get("nutri_score"), Some(&Value::Null));
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_nutrients_rekeyed_and_dropped() {
        let outcome = transform(json!({
            "nutrients_100g": {
                "Fat (g)": "1,5 g",
                "Salt": "traces",
                "Sugars": "",
                "Energy (kJ)": "n/a"
            }
        }));
        assert_eq!(
            outcome.record.get("nutrients_100g"),
            Some(&json!({"fat": {"quantity": 1.5, "unit": "g"}}))
        );
        assert_eq!(
            outcome.unparsed.keys().collect::<Vec<_>>(),
            vec!["nutrients_100g.Energy (kJ)", "nutrients_100g.Salt"]
        );
    }

    #[test]
    fn test_malformed_nutrient_mapping() {
        let outcome = transform(json!({"nutrients_100g": "see label"}));
        assert_eq!(outcome.record.get("nutrients_100g"), Some(&Value::Null));
        assert_eq!(
            outcome.unparsed.get("nutrients_100g"),
            Some(&json!("see label"))
        );
    }
}
