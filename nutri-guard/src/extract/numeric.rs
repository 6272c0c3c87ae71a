//! Numeric magnitude and unit extraction.
//!
//! Three entry points cover the three ways the engine reads numbers:
//!
//! - [`extract`] scans a value for every number run and every letter run,
//!   independently. It feeds the pattern reports.
//! - [`extract_single_pair`] reads exactly one `number unit` pair anchored at
//!   the start of the value. It feeds the record transformer.
//! - [`extract_energy`] looks for a kJ reading and a kcal reading in the same
//!   value, each optional.
//!
//! Decimal commas are rewritten to periods before matching. This is a blanket
//! replacement: `"1,008 g"` reads as `1.008 g`. Only the energy extractor
//! recognizes thousands grouping.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::text::{standardize, standardize_name};

#[allow(clippy::expect_used)]
static NUMBER_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\d+(?:\.\d+)?").expect("Hard-coded regex pattern should be valid"));

#[allow(clippy::expect_used)]
static UNIT_RUN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[a-zA-Zµμ]+").expect("Hard-coded regex pattern should be valid"));

#[allow(clippy::expect_used)]
static LEADING_PAIR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+(?:\.\d+)?)\s*([a-zA-Zµμ]+)").expect("Hard-coded regex pattern should be valid")
});

#[allow(clippy::expect_used)]
static ENERGY_KJ: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)*)\s*kj").expect("Hard-coded regex pattern should be valid")
});

#[allow(clippy::expect_used)]
static ENERGY_KCAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d+(?:[.,]\d+)*)\s*kcal").expect("Hard-coded regex pattern should be valid")
});

#[allow(clippy::expect_used)]
static THOUSANDS_GROUPED: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[1-9]\d{0,2}(?:,\d{3})+$").expect("Hard-coded regex pattern should be valid")
});

/// Standardized name of the compound energy field.
pub const ENERGY_FIELD: &str = "energy";

/// Unit recorded for the kilojoule energy reading.
pub const UNIT_KJ: &str = "kj";
/// Unit recorded for the kilocalorie energy reading.
pub const UNIT_KCAL: &str = "kcal";

/// An extracted magnitude with its unit.
///
/// Serializes as `{"quantity": .., "unit": ..}`, the shape written into
/// normalized records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericToken {
    /// The parsed magnitude.
    #[serde(rename = "quantity")]
    pub magnitude: f64,
    /// The lowercased unit, if one was found.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl NumericToken {
    /// Creates a token with a unit.
    pub fn new(magnitude: f64, unit: impl Into<String>) -> Self {
        Self {
            magnitude,
            unit: Some(unit.into()),
        }
    }

    /// Creates a token without a unit.
    pub fn unitless(magnitude: f64) -> Self {
        Self {
            magnitude,
            unit: None,
        }
    }
}

/// Number and unit runs found in one value, each in order of appearance.
///
/// The two sequences are not positionally paired.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extraction {
    /// Number runs, with decimal commas already rewritten to periods.
    pub numbers: Vec<String>,
    /// Letter runs.
    pub units: Vec<String>,
}

impl Extraction {
    /// Returns true when at least one number was found.
    pub fn has_numbers(&self) -> bool {
        !self.numbers.is_empty()
    }

    /// Returns true when at least one unit was found.
    pub fn has_units(&self) -> bool {
        !self.units.is_empty()
    }

    /// Pairs the first number with the first unit when the value holds exactly
    /// one of each; any other shape has no reliable pairing.
    pub fn single_token(&self) -> Option<NumericToken> {
        match (self.numbers.as_slice(), self.units.as_slice()) {
            ([number], [unit]) => number
                .parse::<f64>()
                .ok()
                .map(|magnitude| NumericToken::new(magnitude, unit.clone())),
            _ => None,
        }
    }
}

/// The kJ and kcal readings of an energy value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnergyReading {
    /// Kilojoule reading, unit fixed to `"kj"`.
    pub kj: Option<NumericToken>,
    /// Kilocalorie reading, unit fixed to `"kcal"`.
    pub kcal: Option<NumericToken>,
}

impl EnergyReading {
    /// Returns true when neither reading was found.
    pub fn is_empty(&self) -> bool {
        self.kj.is_none() && self.kcal.is_none()
    }

    /// Returns the readings found, keyed by their qualified names
    /// (`energy_kj`, `energy_kcal`).
    pub fn tokens(&self) -> Vec<(&'static str, &NumericToken)> {
        let mut out = Vec::with_capacity(2);
        if let Some(kj) = &self.kj {
            out.push(("energy_kj", kj));
        }
        if let Some(kcal) = &self.kcal {
            out.push(("energy_kcal", kcal));
        }
        out
    }
}

/// Extracts every number run and every unit run from `text`.
///
/// The text is standardized first, so unit runs come out lowercased.
///
/// ```rust
/// use nutri_guard::extract::numeric::extract;
///
/// let found = extract("1,5 g (Salt 0,6 G)");
/// assert_eq!(found.numbers, vec!["1.5", "0.6"]);
/// assert_eq!(found.units, vec!["g", "salt", "g"]);
/// ```
pub fn extract(text: &str) -> Extraction {
    if text.is_empty() {
        return Extraction::default();
    }
    let canonical = standardize(text).replace(',', ".");
    Extraction {
        numbers: NUMBER_RUN
            .find_iter(&canonical)
            .map(|m| m.as_str().to_string())
            .collect(),
        units: UNIT_RUN
            .find_iter(&canonical)
            .map(|m| m.as_str().to_string())
            .collect(),
    }
}

/// Extracts the tokens of a value of `field`.
///
/// A field whose standardized name is `energy` bypasses the generic scan and
/// yields the kJ and kcal readings of [`extract_energy`] instead, each as one
/// number and one unit. Every other field goes through [`extract`].
///
/// ```rust
/// use nutri_guard::extract::numeric::extract_field;
///
/// let energy = extract_field("Energy (kJ)", "1,008 kj (241 kcal)");
/// assert_eq!(energy.numbers, vec!["1008", "241"]);
/// assert_eq!(energy.units, vec!["kj", "kcal"]);
/// ```
pub fn extract_field(field: &str, text: &str) -> Extraction {
    if standardize_name(field) != ENERGY_FIELD {
        return extract(text);
    }
    let reading = extract_energy(text);
    let tokens: Vec<&NumericToken> = reading.kj.iter().chain(reading.kcal.iter()).collect();
    Extraction {
        numbers: tokens.iter().map(|t| t.magnitude.to_string()).collect(),
        units: tokens.iter().filter_map(|t| t.unit.clone()).collect(),
    }
}

/// Reads one `number [whitespace] unit` pair anchored at the start of `text`.
///
/// Anything else is a total failure for the value: `"indisponible"`,
/// `"< 0,5 g"`, or a bare `"12"` all return `None`.
pub fn extract_single_pair(text: &str) -> Option<NumericToken> {
    let normalized = text.trim().replace(',', ".");
    let caps = LEADING_PAIR.captures(&normalized)?;
    let magnitude = caps.get(1)?.as_str().parse::<f64>().ok()?;
    let unit = caps.get(2)?.as_str().to_lowercase();
    Some(NumericToken::new(magnitude, unit))
}

/// Reads the kJ and kcal readings of an energy value, case-insensitively.
///
/// Each reading is independent; a missing kcal part does not affect the kJ
/// part. A number written with thousands grouping (`"1,008"`) keeps its
/// integer value, any other comma is a decimal separator.
pub fn extract_energy(text: &str) -> EnergyReading {
    EnergyReading {
        kj: energy_reading(&ENERGY_KJ, text, UNIT_KJ),
        kcal: energy_reading(&ENERGY_KCAL, text, UNIT_KCAL),
    }
}

fn energy_reading(pattern: &Regex, text: &str, unit: &str) -> Option<NumericToken> {
    let caps = pattern.captures(text)?;
    let magnitude = parse_energy_number(caps.get(1)?.as_str())?;
    Some(NumericToken::new(magnitude, unit))
}

fn parse_energy_number(raw: &str) -> Option<f64> {
    let normalized = if THOUSANDS_GROUPED.is_match(raw) {
        raw.replace(',', "")
    } else {
        raw.replace(',', ".")
    };
    normalized.parse::<f64>().ok()
}
