//! Extraction of typed values from standardized text.
//!
//! - [`numeric`]: magnitudes and units, including the two-unit energy case
//! - [`score`]: single classification letters such as Nutri-Score grades

pub mod numeric;
pub mod score;

pub use numeric::{
    extract, extract_energy, extract_field, extract_single_pair, EnergyReading, Extraction,
    NumericToken, ENERGY_FIELD,
};
pub use score::{ScoreLetterExtractor, DEFAULT_SCORE_ALPHABET};
