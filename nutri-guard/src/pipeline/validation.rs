//! Validation batch runs.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::pin::pin;
use tracing::{info, instrument, warn};

use super::{RunMetadata, RunnerConfig};
use crate::core::{FieldValidator, RecordVerdicts};
use crate::error::Result;
use crate::logging::truncate_field;
use crate::record::folder_of;
use crate::repository::{write_report, ArtifactId, ArtifactStore, ReportFamily};
use crate::sources::RecordSource;
use crate::{log_data_op, log_record, log_summary};

/// Counts persisted as the `products_summary` family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationSummary {
    /// Records fetched and validated.
    pub total_products_analyzed: usize,
    pub products_all_valid: usize,
    pub products_with_errors: usize,
    /// Records listed but not fetched or decoded.
    pub products_failed_to_analyze: usize,
    /// Folder → number of listed identifiers, fetch failures included.
    pub products_per_folder: BTreeMap<String, usize>,
}

/// The outcome of a validation batch.
#[derive(Debug, Clone, Default)]
pub struct ValidationRun {
    /// Identifier → verdicts, for records that passed every check.
    pub valid: BTreeMap<String, RecordVerdicts>,
    /// Identifier → verdicts, for records with at least one failure.
    pub errors: BTreeMap<String, RecordVerdicts>,
    /// Identifiers that could not be fetched, in listing order.
    pub failed_to_fetch: Vec<String>,
    pub summary: ValidationSummary,
    pub metadata: RunMetadata,
}

impl ValidationRun {
    /// Writes the validation families.
    ///
    /// The failed-to-fetch list is skipped when empty unless
    /// `write_empty_failed_list` is set. Returns the written snapshots.
    pub async fn write_to(
        &self,
        store: &(impl ArtifactStore + ?Sized),
        write_empty_failed_list: bool,
    ) -> Result<Vec<ArtifactId>> {
        let mut written = vec![
            write_report(store, &ReportFamily::ValidationValid.family(), &self.valid).await?,
            write_report(store, &ReportFamily::ValidationErrors.family(), &self.errors).await?,
            write_report(store, &ReportFamily::ValidationSummary.family(), &self.summary).await?,
        ];
        if write_empty_failed_list || !self.failed_to_fetch.is_empty() {
            written.push(
                write_report(
                    store,
                    &ReportFamily::ValidationFailedToFetch.family(),
                    &self.failed_to_fetch,
                )
                .await?,
            );
        }
        Ok(written)
    }
}

/// Validates every record of a source.
///
/// # Examples
///
/// ```rust
/// use nutri_guard::core::FieldValidator;
/// use nutri_guard::checks::PresenceCheck;
/// use nutri_guard::pipeline::{RunnerConfig, ValidationRunner};
/// use nutri_guard::record::RawRecord;
/// use nutri_guard::sources::MemorySource;
///
/// # async fn example() -> nutri_guard::error::Result<()> {
/// let validator = FieldValidator::builder()
///     .check(PresenceCheck::product_name())
///     .build();
/// let source = MemorySource::new()
///     .with_record("shop/EAN13/1.json", RawRecord::new().with("name", "Tea"))
///     .with_record("shop/EAN13/2.json", RawRecord::new());
///
/// let run = ValidationRunner::new(validator, RunnerConfig::new(4))
///     .run(&source)
///     .await?;
/// assert_eq!(run.summary.products_with_errors, 1);
/// assert_eq!(run.summary.products_per_folder["EAN13"], 2);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ValidationRunner {
    validator: FieldValidator,
    config: RunnerConfig,
}

impl ValidationRunner {
    /// Creates a runner.
    pub fn new(validator: FieldValidator, config: RunnerConfig) -> Self {
        Self { validator, config }
    }

    /// Validates every listed record.
    ///
    /// # Errors
    ///
    /// Fails only if the source cannot be listed. Fetch failures are
    /// collected in [`ValidationRun::failed_to_fetch`].
    #[instrument(skip_all, fields(source = %source.description()))]
    pub async fn run(&self, source: &dyn RecordSource) -> Result<ValidationRun> {
        let mut run = ValidationRun {
            metadata: RunMetadata::for_source(source),
            ..ValidationRun::default()
        };
        run.metadata.record_start();

        let identifiers = source.list().await?;
        info!("Starting validation of {} records", identifiers.len());

        for id in &identifiers {
            if let Some(folder) = folder_of(id) {
                *run.summary.products_per_folder.entry(folder.to_string()).or_default() += 1;
            }
        }

        let total = identifiers.len();
        let mut fetched = pin!(self.config.fetch_all(source, &identifiers));
        let mut done = 0;
        while let Some((id, record)) = fetched.next().await {
            match record {
                Ok(record) => {
                    let verdicts = self.validator.validate(&record);
                    if verdicts.all_passed() {
                        run.valid.insert(id.to_string(), verdicts);
                    } else {
                        log_record!(
                            self.config.log,
                            record = %id,
                            failures = verdicts.failures().count(),
                            "Record failed validation"
                        );
                        run.errors.insert(id.to_string(), verdicts);
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

        run.summary.total_products_analyzed = run.valid.len() + run.errors.len();
        run.summary.products_all_valid = run.valid.len();
        run.summary.products_with_errors = run.errors.len();
        run.summary.products_failed_to_analyze = run.failed_to_fetch.len();
        run.metadata.record_end();

        log_summary!(
            self.config.log,
            analyzed = run.summary.total_products_analyzed,
            valid = run.summary.products_all_valid,
            errors = run.summary.products_with_errors,
            failed = run.summary.products_failed_to_analyze,
            "Validation complete"
        );
        Ok(run)
    }

    /// Runs the batch and writes its report families to `store`.
    pub async fn run_and_write(
        &self,
        source: &dyn RecordSource,
        store: &dyn ArtifactStore,
        write_empty_failed_list: bool,
    ) -> Result<(ValidationRun, Vec<ArtifactId>)> {
        let run = self.run(source).await?;
        let written = run.write_to(store, write_empty_failed_list).await?;
        log_data_op!(self.config.log, snapshots = written.len(), "Wrote validation reports");
        Ok((run, written))
    }
}
