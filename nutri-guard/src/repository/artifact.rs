//! Identifiers of versioned report snapshots.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A logical report: a directory, a base name and an extension.
///
/// Snapshots of a family are named `{base}_{version:04}.{ext}` inside `dir`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactFamily {
    dir: String,
    base: String,
    ext: String,
}

impl ArtifactFamily {
    /// Creates a family. `dir` is relative to the store root and uses `/`.
    pub fn new(dir: impl Into<String>, base: impl Into<String>, ext: impl Into<String>) -> Self {
        Self {
            dir: dir.into().trim_matches('/').to_string(),
            base: base.into(),
            ext: ext.into().trim_start_matches('.').to_string(),
        }
    }

    /// Creates a JSON family.
    pub fn json(dir: impl Into<String>, base: impl Into<String>) -> Self {
        Self::new(dir, base, "json")
    }

    /// The directory holding the snapshots.
    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// The base file name.
    pub fn base(&self) -> &str {
        &self.base
    }

    /// The file extension, without the dot.
    pub fn ext(&self) -> &str {
        &self.ext
    }

    /// Returns the identifier of snapshot `version`.
    pub fn version(&self, version: u32) -> ArtifactId {
        ArtifactId {
            family: self.clone(),
            version,
        }
    }

    /// Parses a snapshot file name of this family, returning its version.
    ///
    /// The index must be at least four digits, so `report_12.json` is not a
    /// snapshot of `report`.
    pub fn parse_version(&self, file_name: &str) -> Option<u32> {
        let digits = file_name
            .strip_prefix(self.base.as_str())?
            .strip_prefix('_')?
            .strip_suffix(self.ext.as_str())?
            .strip_suffix('.')?;
        if digits.len() < 4 || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }
}

impl fmt::Display for ArtifactFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.dir.is_empty() {
            write!(f, "{}.{}", self.base, self.ext)
        } else {
            write!(f, "{}/{}.{}", self.dir, self.base, self.ext)
        }
    }
}

/// One immutable snapshot of a family.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArtifactId {
    family: ArtifactFamily,
    version: u32,
}

impl ArtifactId {
    /// The family this snapshot belongs to.
    pub fn family(&self) -> &ArtifactFamily {
        &self.family
    }

    /// The snapshot index.
    pub fn version(&self) -> u32 {
        self.version
    }

    /// The snapshot file name, e.g. `products_summary_0002.json`.
    pub fn file_name(&self) -> String {
        format!(
            "{}_{:04}.{}",
            self.family.base, self.version, self.family.ext
        )
    }

    /// The path relative to the store root, using `/`.
    pub fn relative_path(&self) -> String {
        if self.family.dir.is_empty() {
            self.file_name()
        } else {
            format!("{}/{}", self.family.dir, self.file_name())
        }
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.relative_path())
    }
}

impl PartialOrd for ArtifactId {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ArtifactId {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.family
            .cmp(&other.family)
            .then(self.version.cmp(&other.version))
    }
}

/// The report families written by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportFamily {
    /// Distinct standardized raw values per field.
    RawPatterns,
    /// Distinct number tokens per field.
    NumbersFound,
    /// Barcode → raw value per field, for values without any number.
    NumbersMissingByBarcode,
    /// Distinct unit tokens per field.
    UnitsFound,
    /// Barcode → raw value per field, for values without any unit.
    UnitsMissingByBarcode,
    /// Records passing every check.
    ValidationValid,
    /// Records failing at least one check, with diagnostics.
    ValidationErrors,
    /// Counts of the validation run.
    ValidationSummary,
    /// Identifiers that could not be fetched or decoded.
    ValidationFailedToFetch,
    /// Offending values with their counts and fields.
    ErrorValueCounts,
    /// Raw values the transformer could not parse.
    TransformUnparsedValues,
}

impl ReportFamily {
    /// Every family, in the order runs write them.
    pub const ALL: [ReportFamily; 11] = [
        ReportFamily::RawPatterns,
        ReportFamily::NumbersFound,
        ReportFamily::NumbersMissingByBarcode,
        ReportFamily::UnitsFound,
        ReportFamily::UnitsMissingByBarcode,
        ReportFamily::ValidationValid,
        ReportFamily::ValidationErrors,
        ReportFamily::ValidationSummary,
        ReportFamily::ValidationFailedToFetch,
        ReportFamily::ErrorValueCounts,
        ReportFamily::TransformUnparsedValues,
    ];

    /// The short kebab-case name of the family.
    pub fn name(&self) -> &'static str {
        match self {
            ReportFamily::RawPatterns => "raw-patterns",
            ReportFamily::NumbersFound => "numbers-found",
            ReportFamily::NumbersMissingByBarcode => "numbers-missing-by-barcode",
            ReportFamily::UnitsFound => "units-found",
            ReportFamily::UnitsMissingByBarcode => "units-missing-by-barcode",
            ReportFamily::ValidationValid => "validation-valid",
            ReportFamily::ValidationErrors => "validation-errors",
            ReportFamily::ValidationSummary => "validation-summary",
            ReportFamily::ValidationFailedToFetch => "validation-failed-to-fetch",
            ReportFamily::ErrorValueCounts => "error-value-counts",
            ReportFamily::TransformUnparsedValues => "transform-unparsed-values",
        }
    }

    /// The on-disk layout of the family.
    pub fn family(&self) -> ArtifactFamily {
        let (dir, base) = match self {
            ReportFamily::RawPatterns => ("numeric_analysis/raw", "numeric_format_raw"),
            ReportFamily::NumbersFound => ("numeric_analysis/numbers", "numeric_format_numbers"),
            ReportFamily::NumbersMissingByBarcode => {
                ("numeric_analysis/numbers", "missing_numbers_by_barcode")
            }
            ReportFamily::UnitsFound => ("numeric_analysis/units", "numeric_format_units"),
            ReportFamily::UnitsMissingByBarcode => {
                ("numeric_analysis/units", "missing_units_by_barcode")
            }
            ReportFamily::ValidationValid => ("products_all_valid", "products_all_valid"),
            ReportFamily::ValidationErrors => ("products_with_errors", "products_with_errors"),
            ReportFamily::ValidationSummary => ("products_summary", "products_summary"),
            ReportFamily::ValidationFailedToFetch => {
                ("products_failed_to_analyze", "products_failed_to_analyze")
            }
            ReportFamily::ErrorValueCounts => ("error_analysis", "error_value_analysis"),
            ReportFamily::TransformUnparsedValues => {
                ("transform_audit", "transform_unparsed_values")
            }
        };
        ArtifactFamily::json(dir, base)
    }
}

impl From<ReportFamily> for ArtifactFamily {
    fn from(report: ReportFamily) -> Self {
        report.family()
    }
}

impl fmt::Display for ReportFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
