//! Runs a fixed set of field checks against records.

use std::sync::Arc;
use tracing::{debug, instrument};

use super::{FieldCheck, RecordVerdicts};
use crate::checks::{GreenScoreCheck, MainNutrientsCheck, PresenceCheck, ScoreLetterCheck};
use crate::config::EngineConfig;
use crate::extract::ScoreLetterExtractor;
use crate::record::RawRecord;
use crate::reference::ReferenceVocabulary;

/// Evaluates every registered check on a record.
///
/// Checks are independent; a record's verdicts hold one entry per check name
/// and failures are never collapsed.
///
/// # Examples
///
/// ```rust
/// use nutri_guard::core::FieldValidator;
/// use nutri_guard::checks::PresenceCheck;
/// use nutri_guard::record::RawRecord;
///
/// let validator = FieldValidator::builder()
///     .check(PresenceCheck::product_name())
///     .check(PresenceCheck::categories())
///     .build();
///
/// let verdicts = validator.validate(&RawRecord::new().with("name", "Yogurt"));
/// assert!(verdicts.get("name_present").unwrap().passed());
/// assert!(!verdicts.all_passed());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FieldValidator {
    checks: Vec<Arc<dyn FieldCheck>>,
}

impl FieldValidator {
    /// Creates a builder.
    pub fn builder() -> FieldValidatorBuilder {
        FieldValidatorBuilder::default()
    }

    /// The five product checks, configured from `config`.
    pub fn standard(vocabulary: Arc<ReferenceVocabulary>, config: &EngineConfig) -> Self {
        let letters = ScoreLetterExtractor::new(&config.score_alphabet);
        Self::builder()
            .check(PresenceCheck::product_name())
            .check(PresenceCheck::categories())
            .check(ScoreLetterCheck::nutri_score(letters.clone()))
            .check(GreenScoreCheck::new(
                config.green_score_prefix.clone(),
                letters,
            ))
            .check(MainNutrientsCheck::new(
                vocabulary,
                &config.required_nutrients,
            ))
            .build()
    }

    /// The registered checks in evaluation order.
    pub fn checks(&self) -> &[Arc<dyn FieldCheck>] {
        &self.checks
    }

    /// Evaluates every check on `record`.
    #[instrument(skip_all, fields(barcode = %record.barcode()))]
    pub fn validate(&self, record: &RawRecord) -> RecordVerdicts {
        let mut verdicts = RecordVerdicts::new();
        for check in &self.checks {
            let verdict = check.evaluate(record);
            if let Some(failure) = verdict.failure() {
                debug!(
                    check.name = %check.name(),
                    check.field = %check.field(),
                    failure.message = %failure.error_message,
                    "Check failed"
                );
            }
            verdicts.insert(check.name(), verdict);
        }
        verdicts
    }
}

/// Builder for [`FieldValidator`].
#[derive(Debug, Default)]
pub struct FieldValidatorBuilder {
    checks: Vec<Arc<dyn FieldCheck>>,
}

impl FieldValidatorBuilder {
    /// Registers a check. A later check with the same name replaces the
    /// earlier verdict.
    pub fn check(mut self, check: impl FieldCheck + 'static) -> Self {
        self.checks.push(Arc::new(check));
        self
    }

    /// Registers an already shared check.
    pub fn shared_check(mut self, check: Arc<dyn FieldCheck>) -> Self {
        self.checks.push(check);
        self
    }

    /// Builds the validator.
    pub fn build(self) -> FieldValidator {
        FieldValidator {
            checks: self.checks,
        }
    }
}
