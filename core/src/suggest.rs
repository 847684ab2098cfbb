//! Suggestion ranking and merge engine.
//!
//! `Suggest` queries every configured [`Dictionary`] for the word being
//! composed and keeps the results in a bounded, priority-descending list.
//! Entries arrive through the [`WordCallback`] interface and are placed by
//! insertion sort; at equal priority the shorter unigram wins. The literal
//! typed word is always prepended, duplicates are removed and the casing of
//! every suggestion follows the composer's capitalization state.
//!
//! It also decides whether the list carries an auto-correction candidate
//! ([`Suggest::has_minimal_correction`]).

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binary_dictionary::BinaryDictionary;
use crate::dictionary::{
    fold_char, DataType, Dictionary, DictionaryEngine, DictionaryKind, WordCallback,
    MAX_BIGRAM_FREQUENCY,
};
use crate::error::{Error, Result};
use crate::suggestion::{AutoText, Suggestion};
use crate::word_composer::WordComposer;

/// Initial capacity of pooled suggestion buffers.
pub const APPROX_MAX_WORD_LENGTH: usize = 32;
pub const DEFAULT_MAX_SUGGESTIONS: usize = 12;
pub const MAX_BIGRAM_SUGGESTIONS: usize = 60;

const BIGRAM_MULTIPLIER_MIN: f64 = 1.2;
const BIGRAM_MULTIPLIER_MAX: f64 = 1.5;

/// Auto-text is consulted for this many leading suggestions.
const AUTO_TEXT_SCAN: usize = 6;

/// How aggressively typed words are corrected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CorrectionMode {
    /// Suggestions only, never auto-correct.
    None,
    /// Bigram predictions, no auto-correction.
    Basic,
    /// Auto-correct from unigram matches.
    #[default]
    Full,
    /// Auto-correct and predict from the previous word.
    FullBigram,
}

impl CorrectionMode {
    pub fn is_full(self) -> bool {
        matches!(self, CorrectionMode::Full | CorrectionMode::FullBigram)
    }

    fn uses_bigrams(self) -> bool {
        matches!(self, CorrectionMode::FullBigram | CorrectionMode::Basic)
    }
}

/// Factor applied to a unigram that also appeared as a bigram prediction.
///
/// Linear from 1.2 at bigram frequency 0 to 1.5 at the maximum of 127.
pub fn bigram_multiplier(bigram_frequency: i32) -> f64 {
    (bigram_frequency as f64 / MAX_BIGRAM_FREQUENCY as f64) * (BIGRAM_MULTIPLIER_MAX - BIGRAM_MULTIPLIER_MIN)
        + BIGRAM_MULTIPLIER_MIN
}

/// Free list of suggestion buffers, bounded in size.
#[derive(Debug)]
struct StringPool {
    free: Vec<String>,
    capacity: usize,
}

impl StringPool {
    fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    fn take(&mut self) -> String {
        match self.free.pop() {
            Some(mut s) => {
                s.clear();
                s
            }
            None => String::with_capacity(APPROX_MAX_WORD_LENGTH),
        }
    }

    fn recycle(&mut self, s: String) {
        if self.free.len() < self.capacity {
            self.free.push(s);
        }
    }
}

/// Receives dictionary results for one request.
#[derive(Debug)]
struct Collector {
    max_suggestions: usize,
    suggestions: Vec<Suggestion>,
    bigram_suggestions: Vec<Suggestion>,
    pool: StringPool,
    lower_original: String,
    is_all_upper_case: bool,
    is_first_char_capitalized: bool,
}

impl Collector {
    fn new(max_suggestions: usize) -> Self {
        Self {
            max_suggestions,
            suggestions: Vec::with_capacity(max_suggestions + 1),
            bigram_suggestions: Vec::with_capacity(MAX_BIGRAM_SUGGESTIONS + 1),
            pool: StringPool::new(max_suggestions + 1),
            lower_original: String::new(),
            is_all_upper_case: false,
            is_first_char_capitalized: false,
        }
    }

    fn collect_garbage(&mut self) {
        for s in self.suggestions.drain(..) {
            self.pool.recycle(s.text);
        }
    }

    fn collect_bigram_garbage(&mut self) {
        for s in self.bigram_suggestions.drain(..) {
            self.pool.recycle(s.text);
        }
    }

    /// `word` is the typed word with a capital first letter.
    fn same_as_typed_but_capitalized(&self, word: &str) -> bool {
        let mut chars = word.chars();
        let Some(first) = chars.next() else {
            return false;
        };
        if !first.is_uppercase() || word.chars().count() != self.lower_original.chars().count() {
            return false;
        }
        self.lower_original
            .chars()
            .zip(word.chars())
            .all(|(o, w)| w.to_lowercase().eq(std::iter::once(o)))
    }

    fn cased(&mut self, word: &str) -> String {
        let mut out = self.pool.take();
        if self.is_all_upper_case {
            out.push_str(&word.to_uppercase());
        } else if self.is_first_char_capitalized {
            let mut chars = word.chars();
            if let Some(first) = chars.next() {
                out.extend(first.to_uppercase());
                out.push_str(chars.as_str());
            }
        } else {
            out.push_str(word);
        }
        out
    }

    fn remove_dupes(&mut self) {
        let mut i = 1;
        while i < self.suggestions.len() {
            let duplicate = self.suggestions[..i].iter().any(|s| s.text == self.suggestions[i].text);
            if duplicate {
                let removed = self.suggestions.remove(i);
                self.pool.recycle(removed.text);
            } else {
                i += 1;
            }
        }
    }
}

impl WordCallback for Collector {
    fn add_word(&mut self, word: &str, frequency: i32, source: DictionaryKind, data_type: DataType) -> bool {
        let is_bigram = data_type == DataType::Bigram;
        let limit = if is_bigram { MAX_BIGRAM_SUGGESTIONS } else { self.max_suggestions };
        let mut frequency = frequency;

        let pos = if self.same_as_typed_but_capitalized(word) {
            0
        } else {
            if !is_bigram {
                if let Some(bigram) = self.bigram_suggestions.iter().find(|s| s.text == word) {
                    frequency = (frequency as f64 * bigram_multiplier(bigram.priority)).round() as i32;
                }
            }
            let list = if is_bigram { &self.bigram_suggestions } else { &self.suggestions };
            let lowest = if list.len() >= limit { list[limit - 1].priority } else { 0 };
            if lowest >= frequency {
                return true;
            }
            let length = word.chars().count();
            let mut pos = 0;
            while pos < list.len() {
                let current = &list[pos];
                if current.priority < frequency {
                    break;
                }
                // Length breaks ties for unigrams only.
                if !is_bigram && current.priority == frequency && length < current.text.chars().count() {
                    break;
                }
                pos += 1;
            }
            pos
        };
        if pos >= limit {
            return true;
        }

        let text = self.cased(word);
        let list = if is_bigram {
            &mut self.bigram_suggestions
        } else {
            &mut self.suggestions
        };
        list.insert(pos, Suggestion::new(text, frequency, data_type, source));
        let evicted = if list.len() > limit { Some(list.remove(limit)) } else { None };
        if let Some(evicted) = evicted {
            self.pool.recycle(evicted.text);
        }
        true
    }
}

/// Whether `suggestion` shares enough letters with `original` to replace it.
///
/// Letters are compared position by position, also counting a match against
/// the next suggestion letter to tolerate one missed keystroke.
fn have_sufficient_commonality(original: &str, suggestion: &str) -> bool {
    let original: Vec<char> = original.chars().map(fold_char).collect();
    let suggestion: Vec<char> = suggestion.chars().map(fold_char).collect();
    let min_length = original.len().min(suggestion.len());
    if min_length <= 2 {
        return true;
    }
    let mut matching = 0;
    let mut less_matching = 0;
    for i in 0..min_length {
        if original[i] == suggestion[i] {
            matching += 1;
            less_matching += 1;
        } else if i + 1 < suggestion.len() && original[i] == suggestion[i + 1] {
            less_matching += 1;
        }
    }
    let matching = matching.max(less_matching);
    if min_length <= 4 {
        matching >= 2
    } else {
        matching > min_length / 2
    }
}

/// Ranks candidates from every dictionary for the word being typed.
pub struct Suggest {
    main: Box<dyn Dictionary>,
    main_size: usize,
    user: Option<Arc<dyn Dictionary>>,
    auto: Option<Arc<dyn Dictionary>>,
    contacts: Option<Arc<dyn Dictionary>>,
    user_bigrams: Option<Arc<dyn Dictionary>>,
    auto_text: Option<Box<dyn AutoText>>,
    auto_text_enabled: bool,
    correction_mode: CorrectionMode,
    large_dictionary_threshold: usize,
    collector: Collector,
    have_correction: bool,
}

impl Suggest {
    /// Default size above which the main dictionary is trusted for
    /// auto-correction.
    pub const LARGE_DICTIONARY_THRESHOLD: usize = 200 * 1000;

    pub fn new<E: DictionaryEngine + 'static>(main: BinaryDictionary<E>) -> Self {
        let main_size = main.size();
        Self {
            main: Box::new(main),
            main_size,
            user: None,
            auto: None,
            contacts: None,
            user_bigrams: None,
            auto_text: None,
            auto_text_enabled: false,
            correction_mode: CorrectionMode::default(),
            large_dictionary_threshold: Self::LARGE_DICTIONARY_THRESHOLD,
            collector: Collector::new(DEFAULT_MAX_SUGGESTIONS),
            have_correction: false,
        }
    }

    // ========== Configuration ==========

    pub fn set_correction_mode(&mut self, mode: CorrectionMode) {
        self.correction_mode = mode;
    }

    pub fn correction_mode(&self) -> CorrectionMode {
        self.correction_mode
    }

    /// Number of dictionary suggestions kept per request, 1..=100.
    pub fn set_max_suggestions(&mut self, max: usize) -> Result<()> {
        if !(1..=100).contains(&max) {
            return Err(Error::InvalidArgument(format!("max suggestions out of range: {}", max)));
        }
        self.collector.max_suggestions = max;
        self.collector.pool = StringPool::new(max + 1);
        Ok(())
    }

    pub fn max_suggestions(&self) -> usize {
        self.collector.max_suggestions
    }

    pub fn set_large_dictionary_threshold(&mut self, bytes: usize) {
        self.large_dictionary_threshold = bytes;
    }

    /// The main dictionary is big enough to drive auto-correction.
    pub fn has_main_dictionary(&self) -> bool {
        self.main_size > self.large_dictionary_threshold
    }

    pub fn set_user_dictionary(&mut self, dict: Option<Arc<dyn Dictionary>>) {
        self.user = dict;
    }

    pub fn set_auto_dictionary(&mut self, dict: Option<Arc<dyn Dictionary>>) {
        self.auto = dict;
    }

    pub fn set_contacts_dictionary(&mut self, dict: Option<Arc<dyn Dictionary>>) {
        self.contacts = dict;
    }

    pub fn set_user_bigram_dictionary(&mut self, dict: Option<Arc<dyn Dictionary>>) {
        self.user_bigrams = dict;
    }

    pub fn set_auto_text(&mut self, auto_text: Option<Box<dyn AutoText>>) {
        self.auto_text = auto_text;
    }

    pub fn set_auto_text_enabled(&mut self, enabled: bool) {
        self.auto_text_enabled = enabled;
    }

    // ========== Queries ==========

    /// Suggestions for the composed word, typed word first.
    ///
    /// With one letter typed (and a bigram-capable mode) the list is seeded
    /// from predictions after `previous_word`. With more letters every
    /// dictionary is searched over the alternatives lattice. The returned
    /// slice is overwritten by the next call.
    pub fn get_suggestions(&mut self, composer: &WordComposer, previous_word: Option<&str>) -> &[Suggestion] {
        let _span = tracing::debug_span!("get_suggestions", size = composer.size()).entered();
        self.have_correction = false;
        self.collector.is_first_char_capitalized = composer.is_first_char_capitalized();
        self.collector.is_all_upper_case = composer.is_all_upper_case();
        self.collector.collect_garbage();

        let original = composer.typed_word().map(str::to_string);
        self.collector.lower_original = original.as_deref().map(str::to_lowercase).unwrap_or_default();

        if composer.size() == 1 && self.correction_mode.uses_bigrams() {
            self.collect_bigram_predictions(composer, previous_word);
        } else if composer.size() > 1 {
            self.collect_words(composer, original.as_deref());
        }

        if let Some(original) = original {
            self.collector.suggestions.insert(0, Suggestion::typed(original));
        }

        let sugg = &self.collector.suggestions;
        if composer.size() > 1 && sugg.len() > 1 && self.correction_mode.is_full() {
            if !have_sufficient_commonality(&self.collector.lower_original, &sugg[1].text) {
                self.have_correction = false;
            }
        }

        if self.auto_text_enabled {
            self.apply_auto_text();
        }
        self.collector.remove_dupes();
        let bound = self.collector.max_suggestions + 1;
        while self.collector.suggestions.len() > bound {
            if let Some(extra) = self.collector.suggestions.pop() {
                self.collector.pool.recycle(extra.text);
            }
        }
        // Nothing beyond the typed word to correct to
        if self.collector.suggestions.len() < 2 {
            self.have_correction = false;
        }
        debug!(
            count = self.collector.suggestions.len(),
            correction = self.have_correction,
            "suggestions ready"
        );
        &self.collector.suggestions
    }

    fn collect_bigram_predictions(&mut self, composer: &WordComposer, previous_word: Option<&str>) {
        self.collector.collect_bigram_garbage();
        let Some(previous) = previous_word.filter(|w| !w.is_empty()) else {
            return;
        };
        let lower = previous.to_lowercase();
        let previous = if self.main.is_valid_word(&lower) { lower.as_str() } else { previous };

        if let Some(dict) = &self.user_bigrams {
            dict.get_bigrams(composer, previous, &mut self.collector);
        }
        if let Some(dict) = &self.contacts {
            dict.get_bigrams(composer, previous, &mut self.collector);
        }
        self.main.get_bigrams(composer, previous, &mut self.collector);

        let Some(current) = composer.typed_word().and_then(|w| w.chars().next()) else {
            return;
        };
        let current_upper: Vec<char> = current.to_uppercase().collect();
        let mut seeded = Vec::new();
        for bigram in &self.collector.bigram_suggestions {
            if seeded.len() >= self.collector.max_suggestions {
                break;
            }
            let Some(first) = bigram.text.chars().next() else {
                continue;
            };
            if first == current || current_upper == [first] {
                seeded.push(bigram.clone());
            }
        }
        self.collector.suggestions.extend(seeded);
    }

    fn collect_words(&mut self, composer: &WordComposer, original: Option<&str>) {
        if self.user.is_some() || self.contacts.is_some() {
            if let Some(dict) = &self.user {
                dict.get_words(composer, &mut self.collector);
            }
            if let Some(dict) = &self.contacts {
                dict.get_words(composer, &mut self.collector);
            }
            let typed_valid = original.map(|w| self.is_valid_word(w)).unwrap_or(false);
            if !self.collector.suggestions.is_empty() && typed_valid && self.correction_mode.is_full() {
                self.have_correction = true;
            }
        }
        self.main.get_words(composer, &mut self.collector);
        if self.correction_mode.is_full() && !self.collector.suggestions.is_empty() {
            self.have_correction = true;
        }
    }

    fn apply_auto_text(&mut self) {
        let Some(auto_text) = &self.auto_text else {
            return;
        };
        let basic = self.correction_mode == CorrectionMode::Basic;
        let scan = if basic { 1 } else { AUTO_TEXT_SCAN };
        let suggestions = &mut self.collector.suggestions;
        let mut i = 0;
        while i < suggestions.len() && i < scan {
            let lowered = suggestions[i].text.to_lowercase();
            if let Some(replacement) = auto_text.replacement(&lowered) {
                let mut can_add = replacement != suggestions[i].text;
                if can_add && i + 1 < suggestions.len() && !basic {
                    can_add = replacement != suggestions[i + 1].text;
                }
                if can_add {
                    self.have_correction = true;
                    let priority = suggestions[i].priority;
                    suggestions.insert(
                        i + 1,
                        Suggestion::new(replacement, priority, DataType::Unigram, DictionaryKind::UserTyped),
                    );
                    i += 1;
                }
            }
            i += 1;
        }
    }

    /// The last request found a suggestion good enough to auto-correct to.
    pub fn has_minimal_correction(&self) -> bool {
        self.have_correction
    }

    /// Suggestions from the last request.
    pub fn suggestions(&self) -> &[Suggestion] {
        &self.collector.suggestions
    }

    /// Bigram predictions gathered at the first letter of the current word.
    pub fn bigram_suggestions(&self) -> &[Suggestion] {
        &self.collector.bigram_suggestions
    }

    /// Known to any dictionary. Empty words are never valid.
    pub fn is_valid_word(&self, word: &str) -> bool {
        if word.is_empty() {
            return false;
        }
        self.main.is_valid_word(word)
            || self.user.as_ref().is_some_and(|d| d.is_valid_word(word))
            || self.auto.as_ref().is_some_and(|d| d.is_valid_word(word))
            || self.contacts.as_ref().is_some_and(|d| d.is_valid_word(word))
    }

    /// Valid in the main dictionary alone.
    pub fn is_valid_main_word(&self, word: &str) -> bool {
        !word.is_empty() && self.main.is_valid_word(word)
    }

    pub fn close(&self) {
        for dict in [&self.user, &self.auto, &self.contacts, &self.user_bigrams].into_iter().flatten() {
            dict.close();
        }
        self.main.close();
    }
}
