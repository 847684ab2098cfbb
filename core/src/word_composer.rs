//! The word currently being composed.
//!
//! A `WordComposer` keeps, for every typed position, the primary code plus the
//! geometrically nearby alternatives reported by the key detector. Dictionaries
//! walk this lattice when looking up corrections and completions. The typed
//! characters are mirrored in `typed_word` so that both always have the same
//! length.

use crate::keycodes;

/// Codes typed so far plus capitalization metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WordComposer {
    /// Alternatives per position, primary code first.
    codes: Vec<Vec<i32>>,
    typed_word: String,
    /// Suggestion the user picked for this word, if any.
    preferred_word: Option<String>,
    caps_count: usize,
    auto_capitalized: bool,
    first_char_capitalized: bool,
}

impl WordComposer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all typed state, leaving an empty composer.
    pub fn reset(&mut self) {
        self.codes.clear();
        self.typed_word.clear();
        self.preferred_word = None;
        self.caps_count = 0;
        self.auto_capitalized = false;
        self.first_char_capitalized = false;
    }

    /// Number of typed positions.
    pub fn size(&self) -> usize {
        self.codes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.codes.is_empty()
    }

    /// Alternatives at `index`, primary code first.
    pub fn codes_at(&self, index: usize) -> &[i32] {
        &self.codes[index]
    }

    /// The whole alternatives lattice.
    pub fn codes(&self) -> &[Vec<i32>] {
        &self.codes
    }

    /// Append a keystroke.
    ///
    /// `nearby` is the distance-sorted list of candidate codes for the touch.
    /// When the primary code sits in second place (a bounce between two keys)
    /// the first two entries are swapped so the primary leads. Codes that are
    /// not printable characters are ignored.
    pub fn add(&mut self, primary_code: i32, nearby: &[i32]) {
        let Some(ch) = keycodes::to_char(primary_code) else {
            return;
        };
        let mut alternatives = if nearby.is_empty() {
            vec![primary_code]
        } else {
            nearby.to_vec()
        };
        correct_primary_juxtapos(primary_code, &mut alternatives);

        self.typed_word.push(ch);
        self.codes.push(alternatives);
        if ch.is_uppercase() {
            self.caps_count += 1;
        }
    }

    /// Remove the last typed position. No-op on an empty composer.
    pub fn delete_last(&mut self) {
        if self.codes.pop().is_none() {
            return;
        }
        if let Some(ch) = self.typed_word.pop() {
            if ch.is_uppercase() {
                self.caps_count = self.caps_count.saturating_sub(1);
            }
        }
    }

    /// The typed characters, or `None` when nothing has been typed.
    pub fn typed_word(&self) -> Option<&str> {
        if self.typed_word.is_empty() {
            None
        } else {
            Some(&self.typed_word)
        }
    }

    pub fn set_preferred_word(&mut self, word: Option<String>) {
        self.preferred_word = word;
    }

    pub fn preferred_word(&self) -> Option<&str> {
        self.preferred_word.as_deref()
    }

    pub fn set_first_char_capitalized(&mut self, capitalized: bool) {
        self.first_char_capitalized = capitalized;
    }

    /// Whether the word was started with shift held.
    pub fn is_first_char_capitalized(&self) -> bool {
        self.first_char_capitalized
    }

    /// All typed letters are uppercase.
    pub fn is_all_upper_case(&self) -> bool {
        self.caps_count > 0 && self.caps_count == self.size()
    }

    /// More than one uppercase letter was typed.
    pub fn is_mostly_caps(&self) -> bool {
        self.caps_count > 1
    }

    /// Mark the word as capitalized by the editor rather than by the user.
    pub fn set_auto_capitalized(&mut self, auto: bool) {
        self.auto_capitalized = auto;
    }

    pub fn is_auto_capitalized(&self) -> bool {
        self.auto_capitalized
    }
}

fn correct_primary_juxtapos(primary_code: i32, codes: &mut [i32]) {
    if codes.len() < 2 {
        return;
    }
    if codes[0] > 0 && codes[1] > 0 && codes[0] != primary_code && codes[1] == primary_code {
        codes.swap(0, 1);
    }
}
