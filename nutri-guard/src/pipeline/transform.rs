//! Transform batch runs.

use futures::StreamExt;
use serde_json::Value;
use std::collections::BTreeMap;
use std::pin::pin;
use tracing::{info, instrument, warn};

use super::{RunMetadata, RunnerConfig};
use crate::error::Result;
use crate::logging::truncate_field;
use crate::repository::{write_report, ArtifactId, ArtifactStore, ReportFamily};
use crate::sources::{RecordSink, RecordSource};
use crate::transform::RecordTransformer;
use crate::{log_data_op, log_record, log_summary};

/// The outcome of a transform batch.
#[derive(Debug, Clone, Default)]
pub struct TransformRun {
    /// Number of records normalized and written to the sink.
    pub records_written: usize,
    /// Identifier → field path → raw value nulled or dropped. Clean records
    /// have no entry.
    pub unparsed: BTreeMap<String, BTreeMap<String, Value>>,
    /// Identifiers that could not be fetched.
    pub failed_to_fetch: Vec<String>,
    pub metadata: RunMetadata,
}

impl TransformRun {
    /// Total number of unparsed values across records.
    pub fn unparsed_values(&self) -> usize {
        self.unparsed.values().map(BTreeMap::len).sum()
    }

    /// Writes the unparsed value audit.
    pub async fn write_to(&self, store: &(impl ArtifactStore + ?Sized)) -> Result<ArtifactId> {
        write_report(
            store,
            &ReportFamily::TransformUnparsedValues.family(),
            &self.unparsed,
        )
        .await
    }
}

/// Normalizes every record of a source into a sink, under the same
/// identifier.
#[derive(Debug, Clone)]
pub struct TransformRunner {
    transformer: RecordTransformer,
    config: RunnerConfig,
}

impl TransformRunner {
    /// Creates a runner.
    pub fn new(transformer: RecordTransformer, config: RunnerConfig) -> Self {
        Self {
            transformer,
            config,
        }
    }

    /// Transforms every listed record.
    ///
    /// # Errors
    ///
    /// Fails if the source cannot be listed or the sink rejects a write.
    #[instrument(skip_all, fields(source = %source.description(), sink = %sink.description()))]
    pub async fn run(&self, source: &dyn RecordSource, sink: &dyn RecordSink) -> Result<TransformRun> {
        let mut run = TransformRun {
            metadata: RunMetadata::for_source(source),
            ..TransformRun::default()
        };
        run.metadata.record_start();

        let identifiers = source.list().await?;
        info!("Starting transform of {} records", identifiers.len());

        let total = identifiers.len();
        let mut fetched = pin!(self.config.fetch_all(source, &identifiers));
        let mut done = 0;
        while let Some((id, record)) = fetched.next().await {
            match record {
                Ok(record) => {
                    let outcome = self.transformer.transform(&record);
                    sink.write(id, &outcome.record).await?;
                    run.records_written += 1;
                    if !outcome.is_clean() {
                        for (path, raw) in &outcome.unparsed {
                            log_record!(
                                self.config.log,
                                record = %id,
                                field = %path,
                                value = %self.config.log.truncate(&raw.to_string()),
                                "Value did not parse"
                            );
                        }
                        run.unparsed.insert(id.to_string(), outcome.unparsed);
                    }
                }
                Err(e) => {
                    warn!(
                        record = %id,
                        error = %truncate_field(&e.to_string(), self.config.log.max_field_length),
                        "Failed to fetch record"
                    );
                    run.failed_to_fetch.push(id.to_string());
                }
            }
            done += 1;
            self.config.report_progress(done, total);
        }
        run.metadata.record_end();

        log_summary!(
            self.config.log,
            written = run.records_written,
            unparsed = run.unparsed_values(),
            failed = run.failed_to_fetch.len(),
            "Transform complete"
        );
        Ok(run)
    }

    /// Runs the batch and writes the unparsed value audit to `store`.
    pub async fn run_and_write(
        &self,
        source: &dyn RecordSource,
        sink: &dyn RecordSink,
        store: &dyn ArtifactStore,
    ) -> Result<(TransformRun, ArtifactId)> {
        let run = self.run(source, sink).await?;
        let written = run.write_to(store).await?;
        log_data_op!(self.config.log, snapshot = %written, "Wrote transform audit");
        Ok((run, written))
    }
}
