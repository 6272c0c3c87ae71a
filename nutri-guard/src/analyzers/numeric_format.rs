//! Numeric format analysis of nutrient and quantity fields.

use std::sync::Arc;

use super::accumulator::{AnalysisAccumulator, NumericFormatReport};
use crate::config::EngineConfig;
use crate::error::Result;
use crate::record::{value_text, RawRecord};
use crate::reference::ReferenceVocabulary;
use crate::repository::{write_report, ArtifactId, ArtifactStore, ReportFamily};
use crate::text::standardize_name;

/// Decides which values of a record feed the numeric format reports.
///
/// Every nutrient of the record's nutrient mapping is tracked under its
/// standardized name, by default only when the vocabulary knows it. The
/// configured top-level fields (`serving_size`, `quantity`) are tracked under
/// their own names. Absent, `null` and empty values are skipped entirely.
#[derive(Debug, Clone)]
pub struct NumericFormatAnalyzer {
    vocabulary: Arc<ReferenceVocabulary>,
    fields: Vec<String>,
    restrict_to_vocabulary: bool,
}

impl NumericFormatAnalyzer {
    /// Creates an analyzer from the engine configuration.
    pub fn new(vocabulary: Arc<ReferenceVocabulary>, config: &EngineConfig) -> Self {
        Self {
            vocabulary,
            fields: config.numeric_fields.clone(),
            restrict_to_vocabulary: config.restrict_nutrients_to_vocabulary,
        }
    }

    /// Feeds every tracked value of `record` into `acc`.
    pub fn observe(&self, acc: &mut AnalysisAccumulator, record: &RawRecord) {
        let barcode = record.barcode();

        if let Some(nutrients) = record.nutrients() {
            for (key, value) in nutrients {
                let Some(text) = value_text(value) else {
                    continue;
                };
                let name = standardize_name(key);
                if name.is_empty() || (self.restrict_to_vocabulary && !self.vocabulary.contains(&name)) {
                    continue;
                }
                acc.observe(&name, barcode, &text);
            }
        }

        for field in &self.fields {
            if let Some(text) = record.get(field).and_then(value_text) {
                acc.observe(field, barcode, &text);
            }
        }

        acc.record_seen();
    }

    /// Runs a whole batch through a fresh accumulator.
    pub fn analyze<'a>(&self, records: impl IntoIterator<Item = &'a RawRecord>) -> NumericFormatReport {
        let mut acc = AnalysisAccumulator::new();
        for record in records {
            self.observe(&mut acc, record);
        }
        acc.finalize()
    }
}

impl NumericFormatReport {
    /// Writes the five numeric families, returning their snapshot identifiers
    /// in family order.
    pub async fn write_to(&self, store: &(impl ArtifactStore + ?Sized)) -> Result<Vec<ArtifactId>> {
        Ok(vec![
            write_report(store, &ReportFamily::RawPatterns.family(), &self.raw_patterns).await?,
            write_report(store, &ReportFamily::NumbersFound.family(), &self.numbers_found).await?,
            write_report(
                store,
                &ReportFamily::NumbersMissingByBarcode.family(),
                &self.numbers_missing_by_barcode,
            )
            .await?,
            write_report(store, &ReportFamily::UnitsFound.family(), &self.units_found).await?,
            write_report(
                store,
                &ReportFamily::UnitsMissingByBarcode.family(),
                &self.units_missing_by_barcode,
            )
            .await?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryArtifactStore;
    use serde_json::json;

    fn analyzer(restrict: bool) -> NumericFormatAnalyzer {
        let vocabulary = ReferenceVocabulary::from_names(["Energy (kJ)", "Fat", "Salt"]);
        let config = EngineConfig::default().with_restrict_nutrients_to_vocabulary(restrict);
        NumericFormatAnalyzer::new(Arc::new(vocabulary), &config)
    }

    fn records() -> Vec<RawRecord> {
        vec![
            RawRecord::from_value(json!({
                "barcode": "111",
                "nutrients_100g": {
                    "Energy (kJ)": "1,008 kj (241 kcal)",
                    "Fat": "12 g",
                    "Fibre": "3 g",
                    "Salt": ""
                },
                "serving_size": "30 g",
                "quantity": "indisponible"
            }))
            .unwrap(),
            RawRecord::from_value(json!({
                "nutrients_100g": {"fat": "<0,5 g"},
                "quantity": "4"
            }))
            .unwrap(),
        ]
    }

    #[test]
    fn test_tracked_fields() {
        let records = records();
        let report = analyzer(true).analyze(&records);

        assert_eq!(report.records_seen, 2);
        assert_eq!(
            report.raw_patterns.keys().collect::<Vec<_>>(),
            vec!["energy", "fat", "quantity", "serving_size"]
        );
        assert_eq!(report.numbers_found["energy"], vec!["1008", "241"]);
        assert_eq!(report.units_found["energy"], vec!["kcal", "kj"]);
        assert_eq!(report.numbers_found["fat"], vec!["0.5", "12"]);
        assert_eq!(report.raw_patterns["fat"], vec!["12 g", "<0,5 g"]);
    }

    #[test]
    fn test_missing_by_barcode() {
        let records = records();
        let report = analyzer(true).analyze(&records);

        assert_eq!(
            report.numbers_missing_by_barcode["quantity"]["111"],
            "indisponible"
        );
        assert_eq!(report.units_missing_by_barcode["quantity"]["unknown"], "4");
        assert!(!report.units_missing_by_barcode["quantity"].contains_key("111"));
    }

    #[test]
    fn test_unrestricted_tracks_unknown_nutrients() {
        let records = records();
        let report = analyzer(false).analyze(&records);
        assert_eq!(report.numbers_found["fibre"], vec!["3"]);
        assert!(!report.raw_patterns.contains_key("salt"));
    }

    #[tokio::test]
    async fn test_write_five_families() {
        let records = records();
        let report = analyzer(true).analyze(&records);
        let store = InMemoryArtifactStore::new();

        let ids = report.write_to(&store).await.unwrap();
        let names: Vec<_> = ids.iter().map(|id| id.relative_path()).collect();
        assert_eq!(
            names,
            vec![
                "numeric_analysis/raw/numeric_format_raw_0000.json",
                "numeric_analysis/numbers/numeric_format_numbers_0000.json",
                "numeric_analysis/numbers/missing_numbers_by_barcode_0000.json",
                "numeric_analysis/units/numeric_format_units_0000.json",
                "numeric_analysis/units/missing_units_by_barcode_0000.json",
            ]
        );
    }
}
