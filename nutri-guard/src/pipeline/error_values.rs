//! Error value runs over the latest validation errors snapshot.

use serde_json::Value;
use tracing::{info, instrument};

use super::{RunMetadata, RunnerConfig};
use crate::analyzers::{ErrorValueAggregator, ErrorValueReport};
use crate::error::{NutriError, Result};
use crate::{log_data_op, log_summary};
use crate::repository::{read_latest_report, write_report, ArtifactId, ArtifactStore, ReportFamily};

/// The outcome of an error value run.
#[derive(Debug, Clone)]
pub struct ErrorValueRun {
    /// The errors snapshot that was aggregated.
    pub input: ArtifactId,
    pub report: ErrorValueReport,
    /// Failure entries read from the snapshot.
    pub failures_seen: usize,
    pub metadata: RunMetadata,
}

impl ErrorValueRun {
    /// Writes the error value counts.
    pub async fn write_to(&self, store: &(impl ArtifactStore + ?Sized)) -> Result<ArtifactId> {
        write_report(store, &ReportFamily::ErrorValueCounts.family(), &self.report).await
    }
}

/// Aggregates the newest `products_with_errors` snapshot of a store.
#[derive(Debug, Clone, Default)]
pub struct ErrorValueRunner {
    config: RunnerConfig,
}

impl ErrorValueRunner {
    /// Creates a runner.
    pub fn new(config: RunnerConfig) -> Self {
        Self { config }
    }

    /// Reads the snapshot with the highest index and aggregates it.
    ///
    /// # Errors
    ///
    /// Returns [`NutriError::Configuration`] when no errors snapshot exists
    /// yet, and an artifact error when it cannot be decoded.
    #[instrument(skip_all)]
    pub async fn run(&self, store: &dyn ArtifactStore) -> Result<ErrorValueRun> {
        let mut metadata = RunMetadata::default();
        metadata.record_start();

        let family = ReportFamily::ValidationErrors.family();
        let (input, snapshot): (ArtifactId, Value) = read_latest_report(store, &family)
            .await?
            .ok_or_else(|| {
                NutriError::Configuration(format!(
                    "No '{family}' snapshot found; run a validation batch first"
                ))
            })?;
        metadata.source = Some(input.to_string());
        info!(snapshot = %input, "Aggregating error values");

        let mut aggregator = ErrorValueAggregator::new();
        aggregator.observe_snapshot(&snapshot);
        let failures_seen = aggregator.failures_seen();
        let report = aggregator.finalize();
        metadata.record_end();

        log_summary!(
            self.config.log,
            failures = failures_seen,
            distinct_values = report.len(),
            "Error value aggregation complete"
        );
        Ok(ErrorValueRun {
            input,
            report,
            failures_seen,
            metadata,
        })
    }

    /// Runs the aggregation and writes the counts to the same store.
    pub async fn run_and_write(&self, store: &dyn ArtifactStore) -> Result<(ErrorValueRun, ArtifactId)> {
        let run = self.run(store).await?;
        let written = run.write_to(store).await?;
        log_data_op!(self.config.log, snapshot = %written, "Wrote error value counts");
        Ok((run, written))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryArtifactStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_missing_snapshot_is_configuration_error() {
        let store = InMemoryArtifactStore::new();
        let err = ErrorValueRunner::default().run(&store).await.unwrap_err();
        assert!(matches!(err, NutriError::Configuration(_)));
    }

    #[tokio::test]
    async fn test_reads_latest_snapshot_only() {
        let store = InMemoryArtifactStore::new();
        let family = ReportFamily::ValidationErrors.family();
        let failure = |value: &str| {
            json!({"p.json": {"nutri_score_valid": {
                "error": "Invalid nutri-score value.",
                "value_found": value,
                "field_name": "nutri_score"
            }}})
        };
        write_report(&store, &family, &failure("old")).await.unwrap();
        write_report(&store, &family, &failure("New")).await.unwrap();

        let (run, written) = ErrorValueRunner::default().run_and_write(&store).await.unwrap();
        assert_eq!(run.input.version(), 1);
        assert_eq!(run.failures_seen, 1);
        assert_eq!(run.report.keys().collect::<Vec<_>>(), vec!["new"]);
        assert_eq!(written.relative_path(), "error_analysis/error_value_analysis_0000.json");
    }
}
