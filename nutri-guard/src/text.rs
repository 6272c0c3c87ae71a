//! Text standardization shared by every component of the engine.
//!
//! All variants lowercase first, then apply a typography fix table, then trim.
//! The name variant removes parenthesized groups before the fix table runs, so
//! a removal can never join two halves of a mojibake sequence. Every variant
//! is idempotent: `f(f(t)) == f(t)`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Typography fixes applied by every variant.
const BASIC_FIXES: &[(&str, &str)] = &[
    ("\u{00a0}", " "),
    ("â€™", "'"),
    ("\u{2019}", "'"),
    ("\u{2018}", "'"),
    ("â€“", "-"),
    ("â€”", "-"),
    ("\u{2013}", "-"),
    ("\u{2014}", "-"),
];

/// Additional fixes used when counting offending values.
const EXTENDED_FIXES: &[(&str, &str)] = &[("â€š", ","), ("\u{201a}", ",")];

#[allow(clippy::expect_used)]
static PARENTHETICAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*\([^)]*\)").expect("Hard-coded regex pattern should be valid")
});

/// The named standardization variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StandardizeMode {
    /// Lowercase, typography fixes, trim. Used for values.
    #[default]
    Basic,
    /// Parenthesized groups removed, then basic. Used for nutrient names.
    ParentheticalStrip,
    /// Basic plus the low-9 comma variants. Used by the error value aggregation.
    ExtendedTypography,
}

/// A standardizer bound to one [`StandardizeMode`].
///
/// ```rust
/// use nutri_guard::text::{StandardizeMode, TextStandardizer};
///
/// let names = TextStandardizer::new(StandardizeMode::ParentheticalStrip);
/// assert_eq!(names.apply("Energy (kJ)"), "energy");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TextStandardizer {
    mode: StandardizeMode,
}

impl TextStandardizer {
    /// Creates a standardizer for the given mode.
    pub fn new(mode: StandardizeMode) -> Self {
        Self { mode }
    }

    /// Returns the mode this standardizer applies.
    pub fn mode(&self) -> StandardizeMode {
        self.mode
    }

    /// Standardizes `text`. Never fails; empty input gives an empty string.
    pub fn apply(&self, text: &str) -> String {
        match self.mode {
            StandardizeMode::Basic => standardize(text),
            StandardizeMode::ParentheticalStrip => standardize_name(text),
            StandardizeMode::ExtendedTypography => standardize_extended(text),
        }
    }

    /// Standardizes an optional value, treating `None` as empty.
    pub fn apply_opt(&self, text: Option<&str>) -> String {
        text.map(|t| self.apply(t)).unwrap_or_default()
    }
}

/// Basic standardization: lowercase, typography fixes, trim.
pub fn standardize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let fixed = apply_fixes(text.to_lowercase(), BASIC_FIXES);
    fixed.trim().to_string()
}

/// Removal of parenthesized groups followed by the basic fixes,
/// e.g. `"Energy (kJ)"` → `"energy"`.
pub fn standardize_name(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let lowered = text.to_lowercase();
    let stripped = if lowered.contains('(') {
        PARENTHETICAL.replace_all(&lowered, "").into_owned()
    } else {
        lowered
    };
    apply_fixes(stripped, BASIC_FIXES).trim().to_string()
}

/// Basic standardization with the extended fix table.
pub fn standardize_extended(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let fixed = apply_fixes(text.to_lowercase(), EXTENDED_FIXES);
    let fixed = apply_fixes(fixed, BASIC_FIXES);
    fixed.trim().to_string()
}

fn apply_fixes(mut text: String, table: &[(&str, &str)]) -> String {
    for (from, to) in table {
        if text.contains(from) {
            text = text.replace(from, to);
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_basic_rules() {
        assert_eq!(standardize("  Nutri-Score B "), "nutri-score b");
        assert_eq!(standardize(""), "");
        assert_eq!(standardize("\u{00a0}Green\u{00a0}Score\u{00a0}"), "green score");
        assert_eq!(standardize("L\u{2019}Oréal"), "l'oréal");
        assert_eq!(standardize("Yogurt \u{2013} Vanilla"), "yogurt - vanilla");
        assert_eq!(standardize("Yogurt \u{2014} Vanilla"), "yogurt - vanilla");
        assert_eq!(standardize("Caf\u{e9} â€“ Noir"), "café - noir");
    }

    #[test]
    fn test_basic_keeps_parentheses_and_commas() {
        assert_eq!(standardize("1,008 kJ (241 kcal)"), "1,008 kj (241 kcal)");
    }

    #[test]
    fn test_name_strips_parentheticals() {
        assert_eq!(standardize_name("Energy (kJ)"), "energy");
        assert_eq!(standardize_name("Fat (g) "), "fat");
        assert_eq!(standardize_name("(raw) Proteins"), "proteins");
        assert_eq!(standardize_name("Vitamin B12 (µg) (added)"), "vitamin b12");
        assert_eq!(standardize_name("carbohydrates"), "carbohydrates");
    }

    #[test]
    fn test_name_fixes_mojibake_joined_by_removal() {
        assert_eq!(standardize_name("Energy â€(x)™s"), "energy 's");
        assert_eq!(standardize_name("energy â€™s"), "energy 's");
        assert_eq!(standardize_name("Sugars â€(added)\u{201d}"), "sugars -");
    }

    #[test]
    fn test_extended_handles_low_comma() {
        assert_eq!(standardize_extended("1\u{201a}5 G"), "1,5 g");
        assert_eq!(standardize_extended("1â€š5"), "1,5");
        // the basic variant leaves it alone
        assert_eq!(standardize("1\u{201a}5"), "1\u{201a}5");
    }

    #[test]
    fn test_standardizer_dispatch() {
        let basic = TextStandardizer::default();
        assert_eq!(basic.mode(), StandardizeMode::Basic);
        assert_eq!(basic.apply("Energy (kJ)"), "energy (kj)");
        assert_eq!(basic.apply_opt(None), "");

        let names = TextStandardizer::new(StandardizeMode::ParentheticalStrip);
        assert_eq!(names.apply("Energy (kJ)"), "energy");
    }

    #[test]
    fn test_idempotent_on_mojibake() {
        for input in [
            "Â€™s",
            "  X\u{a0}(y) ",
            "a ((b)) c",
            "â€“â€™",
            "Energy â€(x)™s",
            "Fat â€(kJ)\u{201c} (g)",
        ] {
            for mode in [
                StandardizeMode::Basic,
                StandardizeMode::ParentheticalStrip,
                StandardizeMode::ExtendedTypography,
            ] {
                let s = TextStandardizer::new(mode);
                let once = s.apply(input);
                assert_eq!(s.apply(&once), once, "mode {mode:?} input {input:?}");
            }
        }
    }
}
