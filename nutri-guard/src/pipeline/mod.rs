//! Batch runners.
//!
//! Each runner drives one batch from a [`RecordSource`] to its report
//! families:
//!
//! | Runner | Writes |
//! |---|---|
//! | [`ValidationRunner`] | valid, errors, summary, failed-to-fetch |
//! | [`NumericAnalysisRunner`] | the five numeric format families |
//! | [`TransformRunner`] | normalized records to a sink, unparsed-value audit |
//! | [`ErrorValueRunner`] | error value counts, from the latest errors snapshot |
//!
//! Fetches are pipelined up to `max_concurrency` and yielded in listing
//! order. Records are processed on the consuming task, so accumulators are
//! never shared. A failed fetch is recorded and skipped; only listing and
//! artifact store failures end a run early.

use chrono::{DateTime, Utc};
use futures::stream::{self, Stream, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::logging::LogConfig;
use crate::record::RawRecord;
use crate::sources::RecordSource;

mod error_values;
mod numeric;
mod transform;
mod validation;

pub use error_values::{ErrorValueRun, ErrorValueRunner};
pub use numeric::{NumericAnalysisRun, NumericAnalysisRunner};
pub use transform::{TransformRun, TransformRunner};
pub use validation::{ValidationRun, ValidationRunner, ValidationSummary};

/// Type alias for progress callback function.
pub type ProgressCallback = Arc<dyn Fn(f64) + Send + Sync>;

/// Settings shared by every runner.
#[derive(Clone)]
pub struct RunnerConfig {
    /// Maximum number of fetches in flight.
    pub max_concurrency: usize,
    /// Logging switches for per-record and data operation output.
    pub log: LogConfig,
    on_progress: Option<ProgressCallback>,
}

impl std::fmt::Debug for RunnerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunnerConfig")
            .field("max_concurrency", &self.max_concurrency)
            .field("log", &self.log)
            .field("on_progress", &self.on_progress.is_some())
            .finish()
    }
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self::new(num_cpus::get())
    }
}

impl RunnerConfig {
    /// Creates a configuration with the given fetch concurrency.
    pub fn new(max_concurrency: usize) -> Self {
        Self {
            max_concurrency: max_concurrency.max(1),
            log: LogConfig::default(),
            on_progress: None,
        }
    }

    /// Takes the concurrency from the engine configuration.
    pub fn from_engine(config: &EngineConfig) -> Self {
        Self::new(config.max_concurrency)
    }

    /// Replaces the logging switches.
    pub fn with_log_config(mut self, log: LogConfig) -> Self {
        self.log = log;
        self
    }

    /// Sets a progress callback that will be called during execution.
    ///
    /// The callback receives a float between 0.0 and 1.0 indicating progress.
    pub fn on_progress<F>(mut self, callback: F) -> Self
    where
        F: Fn(f64) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(callback));
        self
    }

    pub(crate) fn report_progress(&self, done: usize, total: usize) {
        if let Some(callback) = &self.on_progress {
            if total > 0 {
                callback(done as f64 / total as f64);
            }
        }
    }

    /// Fetches `identifiers` with up to `max_concurrency` requests in flight,
    /// yielding results in listing order.
    pub(crate) fn fetch_all<'a>(
        &self,
        source: &'a dyn RecordSource,
        identifiers: &'a [String],
    ) -> impl Stream<Item = (&'a str, Result<RawRecord>)> + 'a {
        stream::iter(identifiers)
            .map(move |id| async move { (id.as_str(), source.fetch(id).await) })
            .buffered(self.max_concurrency)
    }
}

/// Timing and provenance of one run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    /// Description of the record source.
    pub source: Option<String>,
    /// Timestamp when the run started.
    pub start_time: Option<DateTime<Utc>>,
    /// Timestamp when the run completed.
    pub end_time: Option<DateTime<Utc>>,
}

impl RunMetadata {
    /// Creates metadata for a run over `source`.
    pub fn for_source(source: &dyn RecordSource) -> Self {
        Self {
            source: Some(source.description()),
            ..Self::default()
        }
    }

    /// Records the start time of the run.
    pub fn record_start(&mut self) {
        self.start_time = Some(Utc::now());
    }

    /// Records the end time of the run.
    pub fn record_end(&mut self) {
        self.end_time = Some(Utc::now());
    }

    /// Returns the duration of the run if both start and end times are recorded.
    pub fn duration(&self) -> Option<chrono::Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }
}
