//! Dictionary capability shared by every word source.
//!
//! Suggest talks to all sources through [`Dictionary`] and receives results
//! through a [`WordCallback`]. The compiled word list sits behind the lower
//! level [`DictionaryEngine`] contract so that its storage format can change
//! without touching the ranking code.

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::word_composer::WordComposer;

/// Longest word any dictionary stores or looks up, in characters.
pub const MAX_WORD_LENGTH: usize = 48;

/// Highest unigram frequency.
pub const MAX_FREQUENCY: i32 = 255;

/// Highest bigram frequency.
pub const MAX_BIGRAM_FREQUENCY: i32 = 127;

/// Where a word came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DictionaryKind {
    UserTyped,
    Main,
    User,
    Auto,
    Contacts,
}

/// Whether a callback entry is a standalone word or follows a previous word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Unigram,
    Bigram,
}

/// Receives words found by a dictionary lookup.
pub trait WordCallback {
    /// Offer a word. Returning `false` asks the dictionary to stop producing
    /// results for this lookup.
    fn add_word(&mut self, word: &str, frequency: i32, kind: DictionaryKind, data_type: DataType) -> bool;
}

/// A source of unigram and bigram candidates.
pub trait Dictionary: Send + Sync {
    fn kind(&self) -> DictionaryKind;

    /// Report words matching the composer's alternatives lattice.
    fn get_words(&self, composer: &WordComposer, callback: &mut dyn WordCallback);

    /// Report words that follow `previous_word` and start with one of the
    /// alternatives typed at the first position.
    fn get_bigrams(&self, _composer: &WordComposer, _previous_word: &str, _callback: &mut dyn WordCallback) {}

    fn is_valid_word(&self, word: &str) -> bool;

    /// Release resources. Learning dictionaries flush here.
    fn close(&self) {}
}

/// Lookup primitive over a compiled word list.
///
/// `lookup` returns at most `max_results` `(word, frequency)` pairs, highest
/// first. A `skip_position` makes the word letter at that position match
/// without consuming typed input, which recovers a missed keystroke.
pub trait DictionaryEngine: Send + Sync {
    fn lookup(&self, codes: &[Vec<i32>], max_results: usize, skip_position: Option<usize>) -> Vec<(String, i32)>;

    fn bigram_lookup(&self, previous_word: &str, codes: &[Vec<i32>], max_results: usize) -> Vec<(String, i32)>;

    fn is_valid_word(&self, word: &str) -> bool;

    /// Size of the loaded data in bytes; zero when nothing could be loaded.
    fn size(&self) -> usize;
}

/// Lowercased base letter of `c`, so that 'É' matches a typed 'e'.
pub fn fold_char(c: char) -> char {
    let base = c.nfd().next().unwrap_or(c);
    base.to_lowercase().next().unwrap_or(base)
}

/// Whether dictionary letter `c` is matched by key code `code`.
pub fn code_matches(c: char, code: i32) -> bool {
    match crate::keycodes::to_char(code) {
        Some(typed) => typed == c || fold_char(typed) == fold_char(c),
        None => false,
    }
}

/// Most positions a lookup may match through a non-primary alternative.
pub fn max_edit_distance(input_len: usize) -> usize {
    if input_len < 5 {
        2
    } else {
        input_len / 2
    }
}

/// `word` spells exactly the primary codes, one letter per position.
pub fn is_typed_word(word: &str, codes: &[Vec<i32>]) -> bool {
    word.chars().count() == codes.len()
        && word
            .chars()
            .zip(codes)
            .all(|(c, alternatives)| alternatives.first() == Some(&(c as i32)))
}

/// The first letter of `word` is among the alternatives typed first.
pub fn starts_with_alternative(word: &str, codes: &[Vec<i32>]) -> bool {
    let (Some(first), Some(alternatives)) = (word.chars().next(), codes.first()) else {
        return false;
    };
    alternatives.iter().any(|&code| code_matches(first, code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_strips_case_and_accents() {
        assert_eq!(fold_char('É'), 'e');
        assert_eq!(fold_char('a'), 'a');
        assert_eq!(fold_char('Z'), 'z');
        assert!(code_matches('é', 'e' as i32));
        assert!(!code_matches('a', crate::keycodes::DELETE));
    }

    #[test]
    fn edit_distance_grows_with_input() {
        assert_eq!(max_edit_distance(1), 2);
        assert_eq!(max_edit_distance(4), 2);
        assert_eq!(max_edit_distance(5), 2);
        assert_eq!(max_edit_distance(9), 4);
    }

    #[test]
    fn typed_word_is_primary_codes_only() {
        let codes = vec![vec!['h' as i32, 'j' as i32], vec!['i' as i32, 'o' as i32]];
        assert!(is_typed_word("hi", &codes));
        assert!(!is_typed_word("ho", &codes));
        assert!(!is_typed_word("Hi", &codes));
        assert!(!is_typed_word("his", &codes));
    }

    #[test]
    fn first_alternative_filter() {
        let codes = vec![vec!['m' as i32, 'n' as i32]];
        assert!(starts_with_alternative("morning", &codes));
        assert!(starts_with_alternative("night", &codes));
        assert!(!starts_with_alternative("day", &codes));
        assert!(!starts_with_alternative("", &codes));
    }
}
