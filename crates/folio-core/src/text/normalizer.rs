//! Text cleanup applied identically before fitting and before prediction.

use serde::{Deserialize, Serialize};

use super::stopwords::{is_stopword, STOPWORDS_ID};

/// Identifier of the punctuation rule implemented by [`strip_punctuation`].
pub const PUNCTUATION_ID: &str = "ascii-punctuation";

/// Remove every ASCII punctuation character.
pub fn strip_punctuation(text: &str) -> String {
    text.chars().filter(|c| !c.is_ascii_punctuation()).collect()
}

/// Strip punctuation, split on whitespace, drop stopwords, rejoin with single spaces.
pub fn normalize(text: &str) -> String {
    strip_punctuation(text)
        .split_whitespace()
        .filter(|token| !is_stopword(token))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Identifies the normalizer a model was trained with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizerSpec {
    pub stopwords: String,
    pub punctuation: String,
}

impl NormalizerSpec {
    /// The normalizer compiled into this build.
    pub fn current() -> Self {
        Self {
            stopwords: STOPWORDS_ID.to_string(),
            punctuation: PUNCTUATION_ID.to_string(),
        }
    }
}

impl std::fmt::Display for NormalizerSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}+{}", self.punctuation, self.stopwords)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_normalize_removes_punctuation_and_stopwords() {
        assert_eq!(
            normalize("The model, trained on 2024 data, is GREAT!"),
            "model trained 2024 data GREAT"
        );
    }

    #[test]
    fn test_normalize_collapses_whitespace() {
        assert_eq!(normalize("  alpha\t\tbeta\n\ngamma  "), "alpha beta gamma");
    }

    #[test]
    fn test_contractions_lose_apostrophe_before_filtering() {
        // "don't" becomes "dont", which is not in the list.
        assert_eq!(normalize("don't stop"), "dont stop");
    }

    #[test]
    fn test_punctuation_only_and_stopword_only_inputs_are_empty() {
        assert_eq!(normalize("?!... --- ;;"), "");
        assert_eq!(normalize("it is what it is"), "");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_non_ascii_text_is_kept() {
        assert_eq!(normalize("café — naïve résumé"), "café — naïve résumé");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let samples = [
            "The quick (brown) fox; jumps over the lazy dog's back.",
            "it's a trap -- isn't it?",
            "Mixed CASE The THE the",
            "a b c d e f g",
            "§ 1. Überblick: «Zusammenfassung» & Ergebnisse",
            "   ",
        ];
        for sample in samples {
            let once = normalize(sample);
            assert_eq!(normalize(&once), once, "input: {:?}", sample);
        }
    }

    #[test]
    fn test_current_spec_display() {
        assert_eq!(
            NormalizerSpec::current().to_string(),
            "ascii-punctuation+nltk-english-179"
        );
    }
}
