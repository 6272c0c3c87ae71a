//! Engine configuration.
//!
//! Every field has a default, so a configuration file only needs the values it
//! changes. Environment variables override file values through
//! [`EngineConfig::from_env`].

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{NutriError, Result};
use crate::extract::DEFAULT_SCORE_ALPHABET;

/// Overrides the reference vocabulary path.
pub const ENV_REFERENCE: &str = "NUTRI_GUARD_REFERENCE";
/// Overrides the report output directory.
pub const ENV_OUTPUT_DIR: &str = "NUTRI_GUARD_OUTPUT_DIR";
/// Overrides the fetch concurrency.
pub const ENV_MAX_CONCURRENCY: &str = "NUTRI_GUARD_MAX_CONCURRENCY";

/// Configuration shared by every component built by an [`Engine`](crate::engine::Engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// JSON file holding the nutrient reference vocabulary.
    pub reference_path: PathBuf,
    /// Root directory of the versioned report families.
    pub output_dir: PathBuf,
    /// Standardized nutrient names every record must carry.
    pub required_nutrients: Vec<String>,
    /// Letters accepted as score grades.
    pub score_alphabet: String,
    /// Literal prefix a standardized green score must start with.
    pub green_score_prefix: String,
    /// Top-level fields tracked by the numeric format analysis.
    pub numeric_fields: Vec<String>,
    /// Only nutrients known to the vocabulary are tracked by the numeric analysis.
    pub restrict_nutrients_to_vocabulary: bool,
    /// Maximum number of record fetches in flight.
    pub max_concurrency: usize,
    /// Write the failed-to-fetch list even when nothing failed.
    pub write_empty_failed_list: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_path: PathBuf::from("nutrients_reference_annotated.json"),
            output_dir: PathBuf::from("log/product_analyzer_raw"),
            required_nutrients: ["energy", "fat", "proteins", "carbohydrates"]
                .into_iter()
                .map(String::from)
                .collect(),
            score_alphabet: DEFAULT_SCORE_ALPHABET.to_string(),
            green_score_prefix: "green-score ".to_string(),
            numeric_fields: vec!["serving_size".to_string(), "quantity".to_string()],
            restrict_nutrients_to_vocabulary: true,
            max_concurrency: num_cpus::get(),
            write_empty_failed_list: false,
        }
    }
}

impl EngineConfig {
    /// Creates a configuration reading the vocabulary from `reference_path`.
    pub fn new(reference_path: impl AsRef<Path>) -> Self {
        Self {
            reference_path: reference_path.as_ref().to_path_buf(),
            ..Self::default()
        }
    }

    /// Loads a configuration from a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            NutriError::Configuration(format!("Cannot read config '{}': {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| {
            NutriError::Configuration(format!("Malformed config '{}': {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Returns the default configuration with environment overrides applied.
    pub fn from_env() -> Result<Self> {
        Self::default().with_env_overrides()
    }

    /// Applies the `NUTRI_GUARD_*` environment overrides to this configuration.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        if let Ok(path) = std::env::var(ENV_REFERENCE) {
            self.reference_path = PathBuf::from(path);
        }
        if let Ok(dir) = std::env::var(ENV_OUTPUT_DIR) {
            self.output_dir = PathBuf::from(dir);
        }
        if let Ok(raw) = std::env::var(ENV_MAX_CONCURRENCY) {
            self.max_concurrency = raw.trim().parse().map_err(|_| {
                NutriError::Configuration(format!(
                    "{ENV_MAX_CONCURRENCY} must be a positive integer, got '{raw}'"
                ))
            })?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Sets the reference vocabulary path.
    pub fn with_reference_path(mut self, path: impl AsRef<Path>) -> Self {
        self.reference_path = path.as_ref().to_path_buf();
        self
    }

    /// Sets the report output directory.
    pub fn with_output_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.output_dir = dir.as_ref().to_path_buf();
        self
    }

    /// Sets the required nutrient names. Names are used as given and should
    /// already be standardized.
    pub fn with_required_nutrients<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.required_nutrients = names.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the score alphabet.
    pub fn with_score_alphabet(mut self, alphabet: impl Into<String>) -> Self {
        self.score_alphabet = alphabet.into();
        self
    }

    /// Sets the green score prefix.
    pub fn with_green_score_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.green_score_prefix = prefix.into();
        self
    }

    /// Sets the top-level numeric fields.
    pub fn with_numeric_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.numeric_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Sets whether the numeric analysis ignores nutrients outside the vocabulary.
    pub fn with_restrict_nutrients_to_vocabulary(mut self, restrict: bool) -> Self {
        self.restrict_nutrients_to_vocabulary = restrict;
        self
    }

    /// Sets the fetch concurrency.
    pub fn with_max_concurrency(mut self, max_concurrency: usize) -> Self {
        self.max_concurrency = max_concurrency;
        self
    }

    /// Sets whether an empty failed-to-fetch list is still written.
    pub fn with_write_empty_failed_list(mut self, write: bool) -> Self {
        self.write_empty_failed_list = write;
        self
    }

    /// Checks the configuration for values no run could work with.
    pub fn validate(&self) -> Result<()> {
        if self.score_alphabet.trim().is_empty() {
            return Err(NutriError::Configuration(
                "score_alphabet must not be empty".to_string(),
            ));
        }
        if self.max_concurrency == 0 {
            return Err(NutriError::Configuration(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.required_nutrients.is_empty() {
            return Err(NutriError::Configuration(
                "required_nutrients must name at least one nutrient".to_string(),
            ));
        }
        Ok(())
    }
}
