//! Numeric format analysis runs.

use futures::StreamExt;
use std::pin::pin;
use tracing::{info, instrument, warn};

use super::{RunMetadata, RunnerConfig};
use crate::analyzers::{AnalysisAccumulator, NumericFormatAnalyzer, NumericFormatReport};
use crate::error::Result;
use crate::repository::{ArtifactId, ArtifactStore};
use crate::sources::RecordSource;
use crate::{log_data_op, log_summary, perf_debug};

/// The outcome of a numeric format batch.
#[derive(Debug, Clone, Default)]
pub struct NumericAnalysisRun {
    pub report: NumericFormatReport,
    /// Identifiers that could not be fetched. They contribute nothing.
    pub failed_to_fetch: Vec<String>,
    pub metadata: RunMetadata,
}

/// Feeds every record of a source through a [`NumericFormatAnalyzer`].
#[derive(Debug, Clone)]
pub struct NumericAnalysisRunner {
    analyzer: NumericFormatAnalyzer,
    config: RunnerConfig,
}

impl NumericAnalysisRunner {
    /// Creates a runner.
    pub fn new(analyzer: NumericFormatAnalyzer, config: RunnerConfig) -> Self {
        Self { analyzer, config }
    }

    /// Analyzes every listed record into one report.
    #[instrument(skip_all, fields(source = %source.description()))]
    pub async fn run(&self, source: &dyn RecordSource) -> Result<NumericAnalysisRun> {
        let mut metadata = RunMetadata::for_source(source);
        metadata.record_start();

        let identifiers = source.list().await?;
        info!("Starting numeric format analysis of {} records", identifiers.len());

        let mut acc = AnalysisAccumulator::new();
        let mut failed_to_fetch = Vec::new();
        let total = identifiers.len();
        let mut fetched = pin!(self.config.fetch_all(source, &identifiers));
        let mut done = 0;
        while let Some((id, record)) = fetched.next().await {
            match record {
                Ok(record) => self.analyzer.observe(&mut acc, &record),
                Err(e) => {
                    warn!(record = %id, error = %e, "Failed to fetch record");
                    failed_to_fetch.push(id.to_string());
                }
            }
            done += 1;
            self.config.report_progress(done, total);
        }

        perf_debug!(
            self.config.log,
            values = acc.values_seen(),
            fields = acc.fields().count(),
            "Numeric accumulation finished"
        );
        let report = acc.finalize();
        metadata.record_end();

        log_summary!(
            self.config.log,
            records = report.records_seen,
            fields = report.raw_patterns.len(),
            missing_units = report.total_missing_units(),
            "Numeric format analysis complete"
        );
        Ok(NumericAnalysisRun {
            report,
            failed_to_fetch,
            metadata,
        })
    }

    /// Runs the batch and writes the five numeric families to `store`.
    pub async fn run_and_write(
        &self,
        source: &dyn RecordSource,
        store: &dyn ArtifactStore,
    ) -> Result<(NumericAnalysisRun, Vec<ArtifactId>)> {
        let run = self.run(source).await?;
        let written = run.report.write_to(store).await?;
        log_data_op!(self.config.log, snapshots = written.len(), "Wrote numeric format reports");
        Ok((run, written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::record::RawRecord;
    use crate::reference::ReferenceVocabulary;
    use crate::repository::{read_latest_report, InMemoryArtifactStore, ReportFamily};
    use crate::sources::MemorySource;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::sync::Arc;

    fn runner() -> NumericAnalysisRunner {
        let vocabulary = Arc::new(ReferenceVocabulary::from_names(["fat", "salt", "energy"]));
        let analyzer = NumericFormatAnalyzer::new(vocabulary, &EngineConfig::default());
        NumericAnalysisRunner::new(analyzer, RunnerConfig::new(2))
    }

    fn record(value: serde_json::Value) -> RawRecord {
        RawRecord::from_value(value).unwrap()
    }

    #[tokio::test]
    async fn test_run_writes_missing_by_barcode() {
        let source = MemorySource::new()
            .with_record(
                "a/1.json",
                record(json!({
                    "barcode": "1",
                    "nutrients_100g": {"fat": "2 g", "salt": "traces"},
                    "quantity": "500 g"
                })),
            )
            .with_record(
                "a/2.json",
                record(json!({
                    "barcode": "2",
                    "nutrients_100g": {"energy": "250"},
                    "serving_size": "1 bol"
                })),
            )
            .with_unreadable("a/3.json", "gone");

        let store = InMemoryArtifactStore::new();
        let (run, written) = runner().run_and_write(&source, &store).await.unwrap();
        assert_eq!(written.len(), 5);
        assert_eq!(run.failed_to_fetch, vec!["a/3.json"]);
        assert_eq!(run.report.records_seen, 2);

        let (_, missing): (_, BTreeMap<String, BTreeMap<String, String>>) = read_latest_report(
            &store,
            &ReportFamily::NumbersMissingByBarcode.family(),
        )
        .await
        .unwrap()
        .unwrap();
        assert_eq!(missing["salt"]["1"], "traces");
        assert_eq!(missing["energy"]["2"], "250");
        assert!(missing["fat"].is_empty());

        let (_, units): (_, BTreeMap<String, Vec<String>>) =
            read_latest_report(&store, &ReportFamily::UnitsFound.family())
                .await
                .unwrap()
                .unwrap();
        assert_eq!(units["quantity"], vec!["g"]);
        assert_eq!(units["serving_size"], vec!["bol"]);
    }
}
