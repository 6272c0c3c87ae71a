//! Error types for the nutri-guard engine.
//!
//! Every fallible operation in the crate returns [`NutriError`]. Only
//! configuration-time failures are meant to reach the caller of a batch run:
//! fetch and field-level failures are caught at the record boundary and turned
//! into report entries.

use thiserror::Error;

/// The main error type for the nutri-guard engine.
#[derive(Error, Debug)]
pub enum NutriError {
    /// The engine cannot start: reference file missing or malformed, invalid
    /// settings, or a report the run depends on does not exist.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A single record could not be retrieved or decoded.
    #[error("Failed to fetch '{identifier}': {message}")]
    Fetch {
        /// Identifier of the record as produced by the source listing
        identifier: String,
        /// Detailed error message
        message: String,
        /// Optional underlying error
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A numeric, unit or letter extraction failed for one field.
    #[error("Could not parse field '{field}' from value '{value}'")]
    FieldParse {
        /// Field path, e.g. `nutrients_100g.salt`
        field: String,
        /// The raw value that did not parse
        value: String,
    },

    /// A versioned report artifact could not be written or read.
    #[error("Artifact error for '{family}': {message}")]
    Artifact {
        /// Base name of the report family
        family: String,
        /// Detailed error message
        message: String,
    },

    /// Error from I/O operations.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Error from serialization/deserialization operations.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic internal error for unexpected conditions.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A type alias for `Result<T, NutriError>`.
pub type Result<T> = std::result::Result<T, NutriError>;

impl NutriError {
    /// Creates a fetch error for the given record identifier.
    pub fn fetch(identifier: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Fetch {
            identifier: identifier.into(),
            message: message.into(),
            source: None,
        }
    }

    /// Creates a fetch error that keeps the underlying cause.
    pub fn fetch_with_source(
        identifier: impl Into<String>,
        message: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        Self::Fetch {
            identifier: identifier.into(),
            message: message.into(),
            source: Some(source),
        }
    }

    /// Creates a field parse error.
    pub fn field_parse(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::FieldParse {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Creates an artifact error.
    pub fn artifact(family: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Artifact {
            family: family.into(),
            message: message.into(),
        }
    }

    /// Returns true for per-record and per-field errors that a batch run
    /// absorbs instead of halting.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Self::Fetch { .. } | Self::FieldParse { .. })
    }
}

impl From<serde_json::Error> for NutriError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Extension trait for adding context to errors.
pub trait ErrorContext<T> {
    /// Adds context to an error.
    fn context(self, msg: &str) -> Result<T>;

    /// Adds context with a lazy message.
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E> ErrorContext<T> for std::result::Result<T, E>
where
    E: Into<NutriError>,
{
    fn context(self, msg: &str) -> Result<T> {
        self.with_context(|| msg.to_string())
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| match e.into() {
            NutriError::Configuration(inner) => {
                NutriError::Configuration(format!("{}: {}", f(), inner))
            }
            NutriError::Internal(inner) => NutriError::Internal(format!("{}: {}", f(), inner)),
            other => NutriError::Internal(format!("{}: {}", f(), other)),
        })
    }
}
