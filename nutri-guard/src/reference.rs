//! The curated nutrient reference vocabulary.
//!
//! The reference file is a JSON array of objects, each with at least a `name`.
//! Names are keyed by their parenthetical-stripped standardized form, so
//! `"Energy (kJ)"` and `"energy"` share the key `energy`. When two entries
//! collide on a key, the later one wins and the collision is recorded.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::{info, instrument, warn};

use crate::error::{NutriError, Result};
use crate::text::standardize_name;

/// One entry of the reference file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceEntry {
    /// The name as written in the reference file.
    pub name: String,
    /// Every other attribute of the entry, kept verbatim.
    #[serde(flatten)]
    pub metadata: Map<String, Value>,
}

impl ReferenceEntry {
    /// Creates an entry with no metadata.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            metadata: Map::new(),
        }
    }

    /// Adds a metadata attribute.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Two reference entries that standardize to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameCollision {
    /// The shared standardized key.
    pub key: String,
    /// The raw name that was shadowed.
    pub shadowed: String,
    /// The raw name that replaced it.
    pub kept: String,
}

/// Standardized nutrient name → reference entry.
///
/// Loaded once per engine and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ReferenceVocabulary {
    entries: BTreeMap<String, ReferenceEntry>,
    collisions: Vec<NameCollision>,
}

impl ReferenceVocabulary {
    /// Loads the vocabulary from a JSON reference file.
    ///
    /// # Errors
    ///
    /// Returns [`NutriError::Configuration`] when the file is missing,
    /// unreadable, or not a JSON array of objects carrying a `name` string.
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path> + std::fmt::Debug) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            NutriError::Configuration(format!(
                "Cannot read reference file '{}': {e}",
                path.display()
            ))
        })?;
        let vocabulary = Self::from_json_str(&content).map_err(|e| match e {
            NutriError::Configuration(msg) => {
                NutriError::Configuration(format!("{msg} (in '{}')", path.display()))
            }
            other => other,
        })?;
        info!(
            entries = vocabulary.len(),
            collisions = vocabulary.collisions.len(),
            "Loaded reference vocabulary"
        );
        Ok(vocabulary)
    }

    /// Parses the vocabulary from JSON text.
    pub fn from_json_str(content: &str) -> Result<Self> {
        let entries: Vec<ReferenceEntry> = serde_json::from_str(content).map_err(|e| {
            NutriError::Configuration(format!("Malformed reference vocabulary: {e}"))
        })?;
        Ok(Self::from_entries(entries))
    }

    /// Builds the vocabulary from entries, in order.
    pub fn from_entries(entries: impl IntoIterator<Item = ReferenceEntry>) -> Self {
        let mut vocabulary = Self::default();
        for entry in entries {
            vocabulary.insert(entry);
        }
        vocabulary
    }

    /// Builds a vocabulary from bare names.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_entries(names.into_iter().map(ReferenceEntry::new))
    }

    fn insert(&mut self, entry: ReferenceEntry) {
        let key = standardize_name(&entry.name);
        if key.is_empty() {
            warn!(name = %entry.name, "Skipping reference entry with an empty name");
            return;
        }
        let kept = entry.name.clone();
        if let Some(previous) = self.entries.insert(key.clone(), entry) {
            warn!(
                key = %key,
                shadowed = %previous.name,
                kept = %kept,
                "Reference names collide after standardization"
            );
            self.collisions.push(NameCollision {
                key,
                shadowed: previous.name,
                kept,
            });
        }
    }

    /// Returns true if the standardized `name` is in the vocabulary.
    pub fn contains(&self, standardized_name: &str) -> bool {
        self.entries.contains_key(standardized_name)
    }

    /// Looks up an entry by standardized name.
    pub fn get(&self, standardized_name: &str) -> Option<&ReferenceEntry> {
        self.entries.get(standardized_name)
    }

    /// Looks up an entry by raw name, standardizing it first.
    pub fn lookup(&self, raw_name: &str) -> Option<&ReferenceEntry> {
        self.entries.get(&standardize_name(raw_name))
    }

    /// Iterates the standardized names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Returns the standardized names as a set.
    pub fn name_set(&self) -> BTreeSet<&str> {
        self.names().collect()
    }

    /// Collisions detected while loading.
    pub fn collisions(&self) -> &[NameCollision] {
        &self.collisions
    }

    /// Number of distinct standardized names.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the vocabulary has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_names_are_standardized() {
        let vocab = ReferenceVocabulary::from_names(["Energy (kJ)", "Fat", " Proteins "]);
        assert!(vocab.contains("energy"));
        assert!(vocab.contains("fat"));
        assert!(vocab.contains("proteins"));
        assert!(!vocab.contains("Energy (kJ)"));
        assert_eq!(vocab.lookup("ENERGY (kcal)").map(|e| e.name.as_str()), Some("Energy (kJ)"));
        assert_eq!(vocab.len(), 3);
    }

    #[test]
    fn test_collisions_last_write_wins() {
        let vocab = ReferenceVocabulary::from_entries([
            ReferenceEntry::new("Energy (kJ)").with_metadata("unit", "kj"),
            ReferenceEntry::new("Energy (kcal)").with_metadata("unit", "kcal"),
        ]);
        assert_eq!(vocab.len(), 1);
        assert_eq!(
            vocab.get("energy").and_then(|e| e.metadata.get("unit")),
            Some(&Value::from("kcal"))
        );
        assert_eq!(
            vocab.collisions(),
            &[NameCollision {
                key: "energy".to_string(),
                shadowed: "Energy (kJ)".to_string(),
                kept: "Energy (kcal)".to_string(),
            }]
        );
    }

    #[test]
    fn test_metadata_round_trip() {
        let vocab = ReferenceVocabulary::from_json_str(
            r#"[{"name": "Salt", "category": "mineral", "rank": 3}]"#,
        )
        .unwrap();
        let entry = vocab.get("salt").unwrap();
        assert_eq!(entry.metadata.get("category"), Some(&Value::from("mineral")));
        assert_eq!(entry.metadata.get("rank"), Some(&Value::from(3)));
    }

    #[test]
    fn test_malformed_is_configuration_error() {
        let err = ReferenceVocabulary::from_json_str(r#"{"name": "fat"}"#).unwrap_err();
        assert!(matches!(err, NutriError::Configuration(_)));

        let err = ReferenceVocabulary::from_json_str(r#"[{"label": "fat"}]"#).unwrap_err();
        assert!(matches!(err, NutriError::Configuration(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name": "Fat"}}, {{"name": "Sugars"}}]"#).unwrap();

        let vocab = ReferenceVocabulary::load(file.path()).unwrap();
        assert_eq!(vocab.names().collect::<Vec<_>>(), vec!["fat", "sugars"]);
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let err = ReferenceVocabulary::load("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, NutriError::Configuration(_)));
        assert!(err.to_string().contains("/definitely/not/here.json"));
    }
}
