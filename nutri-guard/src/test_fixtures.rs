//! Common fixtures for product record scenarios.
//!
//! Sample records cover the usual shapes of scraped product data: a clean
//! record, one with dirty measurements and scores, and one missing most
//! fields. They are keyed by identifiers laid out as `source/folder/file`.

use serde_json::json;
use std::path::{Path, PathBuf};

use crate::error::{ErrorContext, Result};
use crate::record::RawRecord;
use crate::reference::ReferenceVocabulary;
use crate::sources::MemorySource;

/// Reference vocabulary content with the four main nutrients and a few extras.
pub const SAMPLE_REFERENCE_JSON: &str = r#"[
  {"name": "Energy", "unit": "kJ"},
  {"name": "Fat", "unit": "g"},
  {"name": "Saturated fat", "unit": "g"},
  {"name": "Carbohydrates", "unit": "g"},
  {"name": "Sugars", "unit": "g"},
  {"name": "Proteins", "unit": "g"},
  {"name": "Salt", "unit": "g"},
  {"name": "Fiber", "unit": "g"}
]"#;

/// The parsed [`SAMPLE_REFERENCE_JSON`].
pub fn sample_vocabulary() -> ReferenceVocabulary {
    ReferenceVocabulary::from_json_str(SAMPLE_REFERENCE_JSON)
        .unwrap_or_else(|_| ReferenceVocabulary::default())
}

/// Writes [`SAMPLE_REFERENCE_JSON`] into `dir` and returns its path.
pub fn write_sample_reference(dir: &Path) -> Result<PathBuf> {
    let path = dir.join("nutrients_reference_annotated.json");
    std::fs::write(&path, SAMPLE_REFERENCE_JSON)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

/// A record that passes every product check.
pub fn clean_record() -> RawRecord {
    RawRecord::new()
        .with("barcode", "3017620422003")
        .with("name", "Pâte à tartiner \u{2013} Noisettes")
        .with("categories", "Spreads, Sweet spreads")
        .with("nutri_score", "E")
        .with("green_score_letter", "Green-Score D")
        .with("quantity", "400 g")
        .with("serving_size", "15g")
        .with(
            "nutrients_100g",
            json!({
                "Energy": "2252 kj (539 kcal)",
                "Fat": "30,9 g",
                "Saturated fat": "10.6 g",
                "Carbohydrates": "57.5 g",
                "Sugars": "56.3 g",
                "Proteins": "6.3 g",
                "Salt": "0.107 g"
            }),
        )
}

/// A record with unparsable measurements and invalid scores.
pub fn dirty_record() -> RawRecord {
    RawRecord::new()
        .with("barcode", "5449000000996")
        .with("name", "Soda - Original taste")
        .with("categories", "   ")
        .with("nutri_score", "unknown")
        .with("green_score_letter", "Green Score B")
        .with("quantity", "indisponible")
        .with("serving_size", "1 can (330 ml)")
        .with(
            "nutrients_100g",
            json!({
                "Energy": "180",
                "Fat": "?",
                "Sugars": "traces",
                "Salt": "0 g"
            }),
        )
}

/// A record holding only a barcode.
pub fn sparse_record() -> RawRecord {
    RawRecord::new().with("barcode", "20000001")
}

/// Identifier and record pairs for the three sample records.
pub fn sample_records() -> Vec<(String, RawRecord)> {
    vec![
        ("off/EAN13/3017620422003.json".to_string(), clean_record()),
        ("off/EAN13/5449000000996.json".to_string(), dirty_record()),
        ("off/EAN8/20000001.json".to_string(), sparse_record()),
    ]
}

/// A source over [`sample_records`] plus one identifier that cannot be fetched.
pub fn sample_source() -> MemorySource {
    sample_records()
        .into_iter()
        .fold(MemorySource::new(), |source, (id, record)| {
            source.with_record(id, record)
        })
        .with_unreadable("off/EAN8/broken.json", "truncated download")
}

/// Writes [`sample_records`] under `root` as pretty JSON files.
pub fn write_sample_tree(root: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();
    for (id, record) in sample_records() {
        let path = root.join(&id);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_vec_pretty(&record)?)?;
        written.push(path);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_vocabulary_parses() {
        let vocabulary = sample_vocabulary();
        assert_eq!(vocabulary.len(), 8);
        assert!(vocabulary.contains("saturated fat"));
        assert!(vocabulary.collisions().is_empty());
    }

    #[test]
    fn test_sample_source_shape() {
        assert_eq!(sample_records().len(), 3);
        assert_eq!(sample_source().len(), 4);
        assert_eq!(clean_record().barcode(), "3017620422003");
    }
}
