//! Batch-level accumulation of numeric parse outcomes.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::extract::numeric::extract_field;
use crate::text::standardize;

/// Extraction outcome of one field along one dimension (numbers or units).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldOutcome {
    /// Distinct tokens extracted from the field.
    pub found: BTreeSet<String>,
    /// Barcode → raw value, for values that yielded no token.
    pub missing: BTreeMap<String, String>,
}

impl FieldOutcome {
    fn merge(&mut self, other: FieldOutcome) {
        self.found.extend(other.found);
        self.missing.extend(other.missing);
    }
}

/// Collects raw patterns, numbers and units across a batch of records.
///
/// Created empty at batch start, fed with [`observe`](Self::observe) once per
/// field value, and consumed by [`finalize`](Self::finalize). Numbers and
/// units are tracked independently: `"12"` is a numbers success and a units
/// miss. Values of the `energy` field are read as kJ/kcal pairs.
///
/// One accumulator is not meant to be shared between tasks. Workers each own
/// one and the results are combined with [`merge`](Self::merge).
///
/// ```rust
/// use nutri_guard::analyzers::AnalysisAccumulator;
///
/// let mut acc = AnalysisAccumulator::new();
/// acc.observe("serving_size", "123", "30 g");
/// acc.observe("serving_size", "456", "1 portion");
/// acc.observe("serving_size", "789", "12");
///
/// let report = acc.finalize();
/// assert_eq!(report.numbers_found["serving_size"], vec!["1", "12", "30"]);
/// assert_eq!(report.units_missing_by_barcode["serving_size"]["789"], "12");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AnalysisAccumulator {
    raw: BTreeMap<String, BTreeSet<String>>,
    numbers: BTreeMap<String, FieldOutcome>,
    units: BTreeMap<String, FieldOutcome>,
    records_seen: usize,
    values_seen: usize,
}

impl AnalysisAccumulator {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one raw value of `field` seen on record `barcode`.
    pub fn observe(&mut self, field: &str, barcode: &str, raw: &str) {
        self.values_seen += 1;
        self.raw
            .entry(field.to_string())
            .or_default()
            .insert(standardize(raw));

        let found = extract_field(field, raw);
        let (has_numbers, has_units) = (found.has_numbers(), found.has_units());

        let numbers = self.numbers.entry(field.to_string()).or_default();
        if has_numbers {
            numbers.found.extend(found.numbers);
        } else {
            numbers.missing.insert(barcode.to_string(), raw.to_string());
        }

        let units = self.units.entry(field.to_string()).or_default();
        if has_units {
            units.found.extend(found.units);
        } else {
            units.missing.insert(barcode.to_string(), raw.to_string());
        }
    }

    /// Counts one processed record.
    pub fn record_seen(&mut self) {
        self.records_seen += 1;
    }

    /// Number of records counted with [`record_seen`](Self::record_seen).
    pub fn records_seen(&self) -> usize {
        self.records_seen
    }

    /// Number of values observed.
    pub fn values_seen(&self) -> usize {
        self.values_seen
    }

    /// Fields observed so far, sorted.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.raw.keys().map(String::as_str)
    }

    /// Returns the numbers outcome of `field`.
    pub fn numbers(&self, field: &str) -> Option<&FieldOutcome> {
        self.numbers.get(field)
    }

    /// Returns the units outcome of `field`.
    pub fn units(&self, field: &str) -> Option<&FieldOutcome> {
        self.units.get(field)
    }

    /// Returns true if nothing was observed.
    pub fn is_empty(&self) -> bool {
        self.values_seen == 0
    }

    /// Folds `other` into this accumulator.
    ///
    /// Sets are unioned. When both sides recorded a missing value for the
    /// same barcode and field, `other` wins.
    pub fn merge(&mut self, other: AnalysisAccumulator) {
        for (field, patterns) in other.raw {
            self.raw.entry(field).or_default().extend(patterns);
        }
        for (field, outcome) in other.numbers {
            self.numbers.entry(field).or_default().merge(outcome);
        }
        for (field, outcome) in other.units {
            self.units.entry(field).or_default().merge(outcome);
        }
        self.records_seen += other.records_seen;
        self.values_seen += other.values_seen;
    }

    /// Consumes the accumulator into sorted, deduplicated reports.
    pub fn finalize(self) -> NumericFormatReport {
        let (numbers_found, numbers_missing_by_barcode) = split(self.numbers);
        let (units_found, units_missing_by_barcode) = split(self.units);
        NumericFormatReport {
            raw_patterns: self
                .raw
                .into_iter()
                .map(|(field, set)| (field, set.into_iter().collect()))
                .collect(),
            numbers_found,
            numbers_missing_by_barcode,
            units_found,
            units_missing_by_barcode,
            records_seen: self.records_seen,
        }
    }
}

type FoundByField = BTreeMap<String, Vec<String>>;
type MissingByField = BTreeMap<String, BTreeMap<String, String>>;

fn split(outcomes: BTreeMap<String, FieldOutcome>) -> (FoundByField, MissingByField) {
    let mut found = BTreeMap::new();
    let mut missing = BTreeMap::new();
    for (field, outcome) in outcomes {
        found.insert(field.clone(), outcome.found.into_iter().collect());
        missing.insert(field, outcome.missing);
    }
    (found, missing)
}

/// The finalized numeric format reports, one map per report family.
///
/// Every list is sorted and free of duplicates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NumericFormatReport {
    /// Field → distinct standardized raw values.
    pub raw_patterns: FoundByField,
    /// Field → distinct number tokens.
    pub numbers_found: FoundByField,
    /// Field → barcode → raw value without any number.
    pub numbers_missing_by_barcode: MissingByField,
    /// Field → distinct unit tokens.
    pub units_found: FoundByField,
    /// Field → barcode → raw value without any unit.
    pub units_missing_by_barcode: MissingByField,
    /// Records that contributed to the report.
    pub records_seen: usize,
}

impl NumericFormatReport {
    /// Fields with at least one missing number.
    pub fn fields_missing_numbers(&self) -> Vec<&str> {
        self.numbers_missing_by_barcode
            .iter()
            .filter(|(_, missing)| !missing.is_empty())
            .map(|(field, _)| field.as_str())
            .collect()
    }

    /// Total number of values without any unit, across fields.
    pub fn total_missing_units(&self) -> usize {
        self.units_missing_by_barcode.values().map(BTreeMap::len).sum()
    }
}
