//! # Nutri Guard - Field Normalization for Food Product Records
//!
//! Nutri Guard cleans and audits scraped food product records. Each record is
//! a flat JSON object keyed by field name, with a `barcode` and an optional
//! `nutrients_100g` map of free-text measurements. The crate turns those
//! strings into structured values and reports on how well the raw data fits.
//!
//! ## Overview
//!
//! Four batch operations share one configured [`engine::Engine`]:
//!
//! - **Validation**: five field checks per record, partitioned into valid and
//!   error snapshots plus a summary.
//! - **Numeric format analysis**: which numeric fields carry numbers, units,
//!   or neither, and which textual patterns occur.
//! - **Transformation**: every record rewritten with parsed quantities,
//!   energies, score letters and name lists, plus an audit of values that
//!   did not parse.
//! - **Error value analysis**: counts of the distinct offending values in the
//!   latest validation errors snapshot.
//!
//! Every report is written as a numbered JSON snapshot. Earlier snapshots are
//! never overwritten.
//!
//! ## Quick Start
//!
//! ```rust
//! use nutri_guard::prelude::*;
//! use nutri_guard::reference::ReferenceVocabulary;
//! use nutri_guard::sources::MemorySource;
//! use serde_json::json;
//!
//! # async fn example() -> Result<()> {
//! let vocabulary = ReferenceVocabulary::from_names(["fat", "salt", "energy"]);
//! let engine = Engine::with_vocabulary(EngineConfig::default(), vocabulary)?;
//!
//! let source = MemorySource::new().with_record(
//!     "off/EAN13/3017620422003.json",
//!     RawRecord::from_value(json!({
//!         "barcode": "3017620422003",
//!         "name": "Pâte à tartiner",
//!         "nutrients_100g": {"energy": "2252 kJ / 539 kcal"}
//!     }))?,
//! );
//!
//! let run = engine.validation_runner().run(&source).await?;
//! println!("{}", HumanFormatter::new().format(&run)?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **`record`**: the raw record type and identifier helpers
//! - **`text`**: text standardization
//! - **`extract`**: number, unit, energy and score letter extraction
//! - **`reference`**: the reference nutrient vocabulary
//! - **`core`** and **`checks`**: the field check abstraction and the five
//!   product checks
//! - **`transform`**: the record transformer
//! - **`analyzers`**: numeric format and error value accumulators
//! - **`sources`**: record sources and sinks (local files, memory, object
//!   storage behind the `cloud-storage` feature)
//! - **`repository`**: versioned artifact stores
//! - **`pipeline`**: concurrent batch runners
//! - **`formatters`**: JSON, console and Markdown summaries
//! - **`logging`**: structured logging helpers built on `tracing`

pub mod analyzers;
pub mod checks;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod extract;
pub mod formatters;
pub mod logging;
pub mod pipeline;
pub mod prelude;
pub mod record;
pub mod reference;
pub mod repository;
pub mod sources;
pub mod text;
pub mod transform;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_fixtures;
