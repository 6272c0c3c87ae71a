//! Prelude for commonly used types and traits in nutri-guard.

pub use crate::config::EngineConfig;
pub use crate::core::{FieldCheck, FieldValidator, FieldVerdict, RecordVerdicts};
pub use crate::engine::Engine;
pub use crate::error::{ErrorContext, NutriError, Result};
pub use crate::formatters::{FormatterConfig, HumanFormatter, SummaryFormatter};
pub use crate::logging::LogConfig;
pub use crate::record::RawRecord;
pub use crate::repository::{ArtifactStore, LocalArtifactStore};
pub use crate::sources::{FileSource, RecordSink, RecordSource};
