//! Classification letter extraction for Nutri-Score and Green-Score fields.

use crate::text::standardize;

/// The grades used by both scores.
pub const DEFAULT_SCORE_ALPHABET: &str = "abcde";

/// Extracts a single grade letter from free text.
///
/// A letter of the alphabet standing alone as a word wins, so
/// `"Nutri-Score B"` reads as `b` rather than the `c` of "score". Without such
/// a word, the first alphabet character found anywhere in the standardized
/// text is returned.
///
/// ```rust
/// use nutri_guard::extract::ScoreLetterExtractor;
///
/// let letters = ScoreLetterExtractor::default();
/// assert_eq!(letters.extract_letter("Nutri-Score B"), Some('b'));
/// assert_eq!(letters.extract_letter("Green-Score A"), Some('a'));
/// assert_eq!(letters.extract_letter("unknown"), None);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreLetterExtractor {
    alphabet: Vec<char>,
}

impl Default for ScoreLetterExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_SCORE_ALPHABET)
    }
}

impl ScoreLetterExtractor {
    /// Creates an extractor over the given letters. Letters are lowercased.
    pub fn new(alphabet: &str) -> Self {
        let mut letters: Vec<char> = alphabet.chars().flat_map(char::to_lowercase).collect();
        letters.sort_unstable();
        letters.dedup();
        Self { alphabet: letters }
    }

    /// The letters this extractor accepts.
    pub fn alphabet(&self) -> &[char] {
        &self.alphabet
    }

    /// Returns true if `c` belongs to the alphabet.
    pub fn accepts(&self, c: char) -> bool {
        self.alphabet.binary_search(&c).is_ok()
    }

    /// Extracts the grade letter from `text`, or `None` if no letter matches.
    pub fn extract_letter(&self, text: &str) -> Option<char> {
        let canonical = standardize(text);
        if canonical.is_empty() {
            return None;
        }
        self.standalone_letter(&canonical)
            .or_else(|| canonical.chars().find(|c| self.accepts(*c)))
    }

    fn standalone_letter(&self, canonical: &str) -> Option<char> {
        canonical
            .split(|c: char| !c.is_alphanumeric())
            .find_map(|word| {
                let mut chars = word.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) if self.accepts(c) => Some(c),
                    _ => None,
                }
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standalone_letter_wins() {
        let letters = ScoreLetterExtractor::default();
        assert_eq!(letters.extract_letter("Nutri-Score B"), Some('b'));
        assert_eq!(letters.extract_letter("nutri-score: e"), Some('e'));
        assert_eq!(letters.extract_letter("  D  "), Some('d'));
    }

    #[test]
    fn test_falls_back_to_scan() {
        let letters = ScoreLetterExtractor::default();
        assert_eq!(letters.extract_letter("grade-B+"), Some('b'));
        assert_eq!(letters.extract_letter("xbz"), Some('b'));
    }

    #[test]
    fn test_absent() {
        let letters = ScoreLetterExtractor::default();
        assert_eq!(letters.extract_letter(""), None);
        assert_eq!(letters.extract_letter("unknown"), None);
        assert_eq!(letters.extract_letter("123"), None);
    }

    #[test]
    fn test_custom_alphabet() {
        let letters = ScoreLetterExtractor::new("XYZ");
        assert_eq!(letters.alphabet(), &['x', 'y', 'z']);
        assert_eq!(letters.extract_letter("Grade Y"), Some('y'));
        assert_eq!(letters.extract_letter("abc"), None);
    }
}
