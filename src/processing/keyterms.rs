//! Keyterm extraction — free text to a set of normalized searchable tokens.
//!
//! Pure tokenization: lowercase, whitespace split, punctuation strip.
//! No stemming, no stopword lists, no NLP.

use std::collections::HashSet;

/// Punctuation stripped from both ends of every token.
const EDGE_PUNCTUATION: &[char] = &[
    '.', ',', '?', '!', ':', ';', '(', ')', '[', ']', '{', '}', '"', '\'',
];

/// Extract normalized keyterms from `text`.
///
/// Tokens are lowercased, stripped of surrounding punctuation, and dropped
/// when shorter than `min_length` chars after stripping or entirely
/// numeric. Total over any input: never fails, empty text yields an empty
/// set.
pub fn extract(text: &str, min_length: usize) -> HashSet<String> {
    text.to_lowercase()
        .split_whitespace()
        .map(|word| word.trim_matches(|c: char| EDGE_PUNCTUATION.contains(&c)))
        .filter(|word| word.chars().count() >= min_length)
        .filter(|word| !word.chars().all(|c| c.is_numeric()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::MIN_TERM_LENGTH;

    fn terms(text: &str) -> HashSet<String> {
        extract(text, MIN_TERM_LENGTH)
    }

    #[test]
    fn test_short_words_are_dropped() {
        assert!(terms("The cat sat on a mat.").is_empty());
    }

    #[test]
    fn test_numeric_tokens_are_dropped() {
        let extracted = terms("strawberry counting 123");
        let expected: HashSet<String> =
            ["strawberry", "counting"].iter().map(|s| s.to_string()).collect();
        assert_eq!(extracted, expected);
    }

    #[test]
    fn test_surrounding_punctuation_is_stripped() {
        let extracted = terms("(wrong) \"quoted\" trailing?! [bracketed]");
        let expected: HashSet<String> = ["wrong", "quoted", "trailing", "bracketed"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(extracted, expected);
    }

    #[test]
    fn test_interior_punctuation_survives() {
        // Only the edges are stripped: apostrophes inside a token stay.
        assert!(terms("what's happening").contains("what's"));
    }

    #[test]
    fn test_lowercases_input() {
        assert!(terms("STRAWBERRY Counting").contains("strawberry"));
        assert!(terms("STRAWBERRY Counting").contains("counting"));
    }

    #[test]
    fn test_duplicates_collapse() {
        assert_eq!(terms("again again again").len(), 1);
    }

    #[test]
    fn test_empty_input() {
        assert!(terms("").is_empty());
        assert!(terms("   \n\t ").is_empty());
    }

    #[test]
    fn test_custom_min_length() {
        let extracted = extract("a cat sat", 3);
        let expected: HashSet<String> = ["cat", "sat"].iter().map(|s| s.to_string()).collect();
        assert_eq!(extracted, expected);
    }
}
