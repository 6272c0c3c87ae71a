//! Engine construction.
//!
//! [`Engine`] is the single entry point for batch work: it validates the
//! configuration, loads the reference vocabulary once, and hands out
//! components that share it.

use std::sync::Arc;
use tracing::{info, instrument};

use crate::analyzers::NumericFormatAnalyzer;
use crate::config::EngineConfig;
use crate::core::FieldValidator;
use crate::error::Result;
use crate::pipeline::{
    ErrorValueRunner, NumericAnalysisRunner, RunnerConfig, TransformRunner, ValidationRunner,
};
use crate::reference::ReferenceVocabulary;
use crate::repository::LocalArtifactStore;
use crate::transform::RecordTransformer;

/// A configured engine with its vocabulary loaded.
///
/// ```rust,no_run
/// use nutri_guard::config::EngineConfig;
/// use nutri_guard::engine::Engine;
/// use nutri_guard::sources::FileSource;
///
/// # async fn example() -> nutri_guard::error::Result<()> {
/// let engine = Engine::new(EngineConfig::new("nutrients_reference_annotated.json"))?;
/// let source = FileSource::new("data/products");
/// let (run, _) = engine
///     .validation_runner()
///     .run_and_write(&source, &engine.store(), engine.config().write_empty_failed_list)
///     .await?;
/// println!("{} records with errors", run.summary.products_with_errors);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    vocabulary: Arc<ReferenceVocabulary>,
}

impl Engine {
    /// Builds an engine, reading the vocabulary from `config.reference_path`.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the settings are invalid or the
    /// reference file is missing or malformed.
    #[instrument(skip_all, fields(reference = %config.reference_path.display()))]
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let vocabulary = ReferenceVocabulary::load(&config.reference_path)?;
        Ok(Self::assemble(config, vocabulary))
    }

    /// Builds an engine around an already loaded vocabulary.
    pub fn with_vocabulary(config: EngineConfig, vocabulary: ReferenceVocabulary) -> Result<Self> {
        config.validate()?;
        Ok(Self::assemble(config, vocabulary))
    }

    fn assemble(config: EngineConfig, vocabulary: ReferenceVocabulary) -> Self {
        info!(
            nutrients = vocabulary.len(),
            collisions = vocabulary.collisions().len(),
            output_dir = %config.output_dir.display(),
            "Engine ready"
        );
        Self {
            config,
            vocabulary: Arc::new(vocabulary),
        }
    }

    /// The engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// The shared reference vocabulary.
    pub fn vocabulary(&self) -> &Arc<ReferenceVocabulary> {
        &self.vocabulary
    }

    /// The five product checks.
    pub fn validator(&self) -> FieldValidator {
        FieldValidator::standard(self.vocabulary.clone(), &self.config)
    }

    pub fn transformer(&self) -> RecordTransformer {
        RecordTransformer::new(&self.config)
    }

    pub fn numeric_analyzer(&self) -> NumericFormatAnalyzer {
        NumericFormatAnalyzer::new(self.vocabulary.clone(), &self.config)
    }

    /// Runner settings derived from the configuration.
    pub fn runner_config(&self) -> RunnerConfig {
        RunnerConfig::from_engine(&self.config)
    }

    pub fn validation_runner(&self) -> ValidationRunner {
        ValidationRunner::new(self.validator(), self.runner_config())
    }

    pub fn numeric_runner(&self) -> NumericAnalysisRunner {
        NumericAnalysisRunner::new(self.numeric_analyzer(), self.runner_config())
    }

    pub fn transform_runner(&self) -> TransformRunner {
        TransformRunner::new(self.transformer(), self.runner_config())
    }

    pub fn error_value_runner(&self) -> ErrorValueRunner {
        ErrorValueRunner::new(self.runner_config())
    }

    /// The artifact store rooted at `config.output_dir`.
    pub fn store(&self) -> LocalArtifactStore {
        LocalArtifactStore::new(&self.config.output_dir)
    }
}
