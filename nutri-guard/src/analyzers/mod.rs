//! Batch analyzers that turn many records into reports.
//!
//! Analyzers never fail a batch. Every value they cannot parse becomes a
//! report entry instead of an error.
//!
//! ## Available Analyzers
//!
//! - **Numeric format** ([`NumericFormatAnalyzer`]): raw patterns, extracted
//!   numbers and units per nutrient and quantity field, plus the values that
//!   yielded none, keyed by barcode
//! - **Error values** ([`ErrorValueAggregator`]): how often each standardized
//!   failing value appears across validation results, and under which fields
//!
//! ## Lifecycle
//!
//! An [`AnalysisAccumulator`] is created empty at batch start, fed one value at
//! a time and consumed by `finalize`. Accumulators built by separate workers
//! combine with `merge`:
//!
//! ```rust
//! use nutri_guard::analyzers::AnalysisAccumulator;
//!
//! let mut left = AnalysisAccumulator::new();
//! left.observe("quantity", "1", "500 g");
//! let mut right = AnalysisAccumulator::new();
//! right.observe("quantity", "2", "1 kg");
//!
//! left.merge(right);
//! let report = left.finalize();
//! assert_eq!(report.units_found["quantity"], vec!["g", "kg"]);
//! ```

pub mod accumulator;
pub mod error_values;
pub mod numeric_format;

pub use accumulator::{AnalysisAccumulator, FieldOutcome, NumericFormatReport};
pub use error_values::{ErrorValueAggregator, ErrorValueCount, ErrorValueReport, UNKNOWN_FIELD};
pub use numeric_format::NumericFormatAnalyzer;
