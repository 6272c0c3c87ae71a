//! Core validation types.
//!
//! A [`FieldValidator`] holds a list of [`FieldCheck`]s. Validating a record
//! runs each check once and collects the results into [`RecordVerdicts`],
//! keyed by check name:
//!
//! ```text
//! FieldValidator
//!     ├── name_present            → FieldVerdict::Passed
//!     ├── categories_present      → FieldVerdict::Failed(FieldFailure)
//!     └── main_nutrients_present  → FieldVerdict::Passed
//! ```
//!
//! A record passes when every verdict passed. Failing verdicts keep their
//! diagnostic so later stages can attribute failures to fields.

mod check;
mod validator;

pub use check::{BoxedCheck, FieldCheck, FieldFailure, FieldVerdict, RecordVerdicts};
pub use validator::{FieldValidator, FieldValidatorBuilder};
