//! Key handling on top of the composer and the suggestion engine.
//!
//! `InputEngine` receives decoded key codes, keeps the word being composed
//! and the text committed so far, and decides what a separator commits: the
//! typed word or the best suggestion. Accepted words feed the adaptive
//! dictionaries when auto-correction is on. A backspace right after an
//! auto-correction reverts it and brings the typed word back into
//! composition.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::auto_dictionary::{AutoDictionary, FREQUENCY_FOR_PICKED, FREQUENCY_FOR_TYPED};
use crate::dictionary::Dictionary;
use crate::error::Result;
use crate::keycodes;
use crate::suggest::{CorrectionMode, Suggest};
use crate::suggestion::Suggestion;
use crate::text_entry::{EntryState, TextEntryState};
use crate::user_dictionary::UserBigramDictionary;
use crate::word_composer::WordComposer;
use crate::Config;

/// Shift key state as seen by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShiftState {
    #[default]
    Off,
    /// Set by the user for the next letter.
    Shifted,
    /// Set automatically at the start of a sentence.
    Auto,
    Locked,
}

impl ShiftState {
    fn is_shifted(self) -> bool {
        self != ShiftState::Off
    }
}

/// A composed word and the text it was committed as.
#[derive(Debug, Clone, PartialEq)]
pub struct CommittedWord {
    pub chosen: String,
    pub composer: WordComposer,
}

/// Outcome of a key handed to [`InputEngine::on_key`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyResult {
    Handled,
    NotHandled,
}

pub struct InputEngine {
    composer: WordComposer,
    suggest: Suggest,
    auto_dictionary: Option<Arc<AutoDictionary>>,
    user_bigrams: Option<Arc<UserBigramDictionary>>,
    entry: TextEntryState,

    /// Text committed to the editor.
    text: String,
    predicting: bool,
    prediction_enabled: bool,
    best_word: Option<String>,
    correction_available: bool,
    typed_word_valid: bool,

    configured_mode: CorrectionMode,
    bigram_suggestions: bool,
    auto_capitalize: bool,
    auto_space: bool,
    shift: ShiftState,

    /// Last commit made while predicting, kept for revert.
    last_commit: Option<CommittedWord>,
    /// Characters of the last committed word.
    committed_length: usize,
    just_reverted_separator: Option<char>,
    history: Vec<CommittedWord>,
}

impl InputEngine {
    pub fn new(suggest: Suggest) -> Self {
        let configured_mode = suggest.correction_mode();
        let mut engine = Self {
            composer: WordComposer::new(),
            suggest,
            auto_dictionary: None,
            user_bigrams: None,
            entry: TextEntryState::new(),
            text: String::new(),
            predicting: false,
            prediction_enabled: true,
            best_word: None,
            correction_available: false,
            typed_word_valid: false,
            configured_mode,
            bigram_suggestions: false,
            auto_capitalize: false,
            auto_space: true,
            shift: ShiftState::Off,
            last_commit: None,
            committed_length: 0,
            just_reverted_separator: None,
            history: Vec::new(),
        };
        engine.refresh_correction_mode();
        engine
    }

    /// Build an engine and apply the suggestion settings of `config`.
    pub fn with_config(mut suggest: Suggest, config: &Config) -> Result<Self> {
        suggest.set_max_suggestions(config.max_suggestions)?;
        suggest.set_large_dictionary_threshold(config.large_dictionary_threshold);
        suggest.set_auto_text_enabled(config.auto_text_enabled);
        suggest.set_correction_mode(config.correction_mode);
        let mut engine = Self::new(suggest);
        engine.bigram_suggestions = config.bigram_suggestions;
        engine.auto_capitalize = config.auto_capitalize;
        engine.refresh_correction_mode();
        engine.update_shift_state();
        Ok(engine)
    }

    // ========== Configuration ==========

    /// Attach the adaptive dictionary used for suggestions and learning.
    pub fn set_auto_dictionary(&mut self, dict: Option<Arc<AutoDictionary>>) {
        self.suggest
            .set_auto_dictionary(dict.clone().map(|d| d as Arc<dyn Dictionary>));
        self.auto_dictionary = dict;
    }

    /// Attach the per-user bigram store used for predictions and learning.
    pub fn set_user_bigram_dictionary(&mut self, dict: Option<Arc<UserBigramDictionary>>) {
        self.suggest
            .set_user_bigram_dictionary(dict.clone().map(|d| d as Arc<dyn Dictionary>));
        self.user_bigrams = dict;
    }

    pub fn set_correction_mode(&mut self, mode: CorrectionMode) {
        self.configured_mode = mode;
        self.refresh_correction_mode();
    }

    pub fn set_bigram_suggestions(&mut self, enabled: bool) {
        self.bigram_suggestions = enabled;
        self.refresh_correction_mode();
    }

    pub fn set_prediction_enabled(&mut self, enabled: bool) {
        self.prediction_enabled = enabled;
    }

    pub fn set_auto_capitalize(&mut self, enabled: bool) {
        self.auto_capitalize = enabled;
        self.update_shift_state();
    }

    pub fn set_auto_space(&mut self, enabled: bool) {
        self.auto_space = enabled;
    }

    /// Effective correction mode. Without a usable main dictionary nothing
    /// is corrected.
    pub fn correction_mode(&self) -> CorrectionMode {
        self.suggest.correction_mode()
    }

    fn refresh_correction_mode(&mut self) {
        let mode = if !self.suggest.has_main_dictionary() {
            CorrectionMode::None
        } else if self.configured_mode == CorrectionMode::Full && self.bigram_suggestions {
            CorrectionMode::FullBigram
        } else {
            self.configured_mode
        };
        self.suggest.set_correction_mode(mode);
    }

    // ========== State ==========

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Word under composition, empty when not predicting.
    pub fn composing(&self) -> &str {
        if self.predicting {
            self.composer.typed_word().unwrap_or("")
        } else {
            ""
        }
    }

    pub fn composer(&self) -> &WordComposer {
        &self.composer
    }

    pub fn is_predicting(&self) -> bool {
        self.predicting
    }

    pub fn suggestions(&self) -> &[Suggestion] {
        if self.predicting {
            self.suggest.suggestions()
        } else {
            &[]
        }
    }

    /// What a separator would commit right now.
    pub fn best_word(&self) -> Option<&str> {
        self.best_word.as_deref()
    }

    pub fn is_correction_available(&self) -> bool {
        self.correction_available
    }

    pub fn is_typed_word_valid(&self) -> bool {
        self.typed_word_valid
    }

    pub fn entry_state(&self) -> EntryState {
        self.entry.state()
    }

    pub fn shift_state(&self) -> ShiftState {
        self.shift
    }

    pub fn suggest(&self) -> &Suggest {
        &self.suggest
    }

    pub fn history(&self) -> &[CommittedWord] {
        &self.history
    }

    // ========== Session ==========

    pub fn start_session(&mut self) {
        self.text.clear();
        self.composer.reset();
        self.predicting = false;
        self.best_word = None;
        self.last_commit = None;
        self.committed_length = 0;
        self.just_reverted_separator = None;
        self.history.clear();
        self.entry.new_session();
        self.update_shift_state();
    }

    /// Commit what is being typed, flush learned words and report the
    /// session counters.
    pub fn finish_session(&mut self) -> crate::text_entry::SessionStats {
        self.commit_typed();
        if let Some(auto) = &self.auto_dictionary {
            auto.flush_pending_writes();
        }
        self.entry.end_session()
    }

    // ========== Key handling ==========

    /// Handle a key press. `nearby` holds the alternatives reported by the
    /// key detector, primary code first.
    pub fn on_key(&mut self, primary_code: i32, nearby: &[i32]) -> KeyResult {
        trace!(primary_code, "on_key");
        match primary_code {
            keycodes::DELETE => {
                self.handle_backspace();
                KeyResult::Handled
            }
            keycodes::SHIFT => {
                self.handle_shift();
                KeyResult::Handled
            }
            keycodes::CANCEL => {
                self.commit_typed();
                self.entry.end_session();
                KeyResult::Handled
            }
            code if code <= 0 => KeyResult::NotHandled,
            code => {
                if keycodes::is_word_separator(code) {
                    self.handle_separator(code);
                } else {
                    self.handle_character(code, nearby);
                }
                self.just_reverted_separator = None;
                KeyResult::Handled
            }
        }
    }

    /// Commit literal text such as a multi-character key label.
    pub fn on_text(&mut self, text: &str) {
        self.commit_typed();
        self.text.push_str(text);
        self.entry.reset();
        self.just_reverted_separator = None;
        self.update_shift_state();
    }

    fn handle_shift(&mut self) {
        self.shift = match self.shift {
            ShiftState::Locked => ShiftState::Off,
            ShiftState::Shifted => ShiftState::Locked,
            ShiftState::Off | ShiftState::Auto => ShiftState::Shifted,
        };
    }

    /// Drop a manual shift, e.g. when a held shift key is released after
    /// chording. Auto-capitalization is re-evaluated.
    pub fn reset_shift(&mut self) {
        self.shift = ShiftState::Off;
        self.update_shift_state();
    }

    fn handle_character(&mut self, code: i32, nearby: &[i32]) {
        if keycodes::is_word_character(code) && self.prediction_enabled && !self.predicting {
            self.predicting = true;
            self.last_commit = None;
            self.composer.reset();
        }
        let Some(mut c) = keycodes::to_char(code) else {
            return;
        };
        if self.shift.is_shifted() && c.is_lowercase() {
            let upper: String = c.to_uppercase().collect();
            let mut chars = upper.chars();
            match (chars.next(), chars.next()) {
                (Some(single), None) => c = single,
                _ => {
                    self.on_text(&upper);
                    return;
                }
            }
        }

        if self.predicting {
            if self.shift.is_shifted() && self.composer.is_empty() {
                self.composer.set_first_char_capitalized(true);
            }
            let auto_caps = self.shift == ShiftState::Auto;
            self.composer.add(c as i32, nearby);
            if self.composer.size() == 1 {
                self.composer.set_auto_capitalized(auto_caps);
            }
            self.update_suggestions();
        } else {
            self.text.push(c);
        }
        if self.shift != ShiftState::Locked {
            self.shift = ShiftState::Off;
        }
        self.update_shift_state();
        self.entry.typed_character(c, keycodes::is_word_separator(code));
    }

    fn handle_separator(&mut self, code: i32) {
        let Some(c) = keycodes::to_char(code) else {
            return;
        };
        let mut picked_default = false;
        if self.predicting {
            let reverted_here = self.just_reverted_separator == Some(c);
            if self.suggest.correction_mode().is_full() && code != keycodes::SINGLE_QUOTE && !reverted_here {
                picked_default = self.pick_default_suggestion();
            } else {
                self.commit_typed();
            }
        }
        self.text.push(c);
        self.entry.typed_character(c, true);
        if picked_default {
            let typed = self.last_commit.as_ref().and_then(|w| w.composer.typed_word().map(str::to_string));
            self.entry.back_to_accepted_default(typed.as_deref());
        }
        self.update_shift_state();
    }

    fn handle_backspace(&mut self) {
        let mut delete_char = false;
        if self.predicting {
            if self.composer.is_empty() {
                self.text.pop();
            } else {
                self.composer.delete_last();
                if self.composer.is_empty() {
                    self.predicting = false;
                }
                self.update_suggestions();
            }
        } else {
            delete_char = true;
        }
        self.entry.backspace();
        if self.entry.state() == EntryState::UndoCommit {
            self.revert_last_word(delete_char);
            return;
        }
        if delete_char {
            self.text.pop();
        }
        self.update_shift_state();
        self.just_reverted_separator = None;
    }

    // ========== Suggestions ==========

    /// Recompute suggestions and the best word for the current composition.
    pub fn update_suggestions(&mut self) {
        if !self.predicting || !self.prediction_enabled {
            self.best_word = None;
            self.correction_available = false;
            self.typed_word_valid = false;
            return;
        }
        let previous = self.previous_word();
        let count = self
            .suggest
            .get_suggestions(&self.composer, previous.as_deref())
            .len();

        let typed = self.composer.typed_word().unwrap_or("").to_string();
        let prefer_caps = self.composer.is_first_char_capitalized();
        let typed_valid = self.suggest.is_valid_word(&typed)
            || (prefer_caps && self.suggest.is_valid_word(&typed.to_lowercase()));
        let mut correction_available = self.suggest.has_minimal_correction();
        if self.suggest.correction_mode().is_full() {
            correction_available |= typed_valid;
        }
        correction_available &= !self.composer.is_mostly_caps();
        correction_available &= !self.entry.is_correcting();

        self.best_word = if count == 0 {
            None
        } else if correction_available && !typed_valid && count > 1 {
            Some(self.suggest.suggestions()[1].text.clone())
        } else {
            Some(typed)
        };
        self.correction_available = correction_available;
        self.typed_word_valid = typed_valid;
        debug!(best = ?self.best_word, correction_available, typed_valid, "best word");
    }

    fn pick_default_suggestion(&mut self) -> bool {
        self.update_suggestions();
        let Some(best) = self.best_word.clone().filter(|w| !w.is_empty()) else {
            return false;
        };
        self.entry.accepted_default(self.composer.typed_word(), &best);
        let committed = self.commit_word(&best);
        self.add_to_dictionaries(&committed, FREQUENCY_FOR_TYPED, false);
        true
    }

    /// Commit the suggestion at `index` of the current list.
    ///
    /// A single separator character is applied as if typed. Returns false
    /// when `index` is out of range.
    pub fn pick_suggestion(&mut self, index: usize) -> bool {
        let Some(suggestion) = self.suggestions().get(index).map(|s| s.text.clone()) else {
            return false;
        };
        let mut chars = suggestion.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            if keycodes::is_word_separator(c as i32) {
                self.on_key(c as i32, &[c as i32]);
                return true;
            }
        }

        let correcting = self.entry.is_correcting();
        let typed = self.composer.typed_word().unwrap_or("").to_string();
        let committed = self.commit_word(&suggestion);
        if index == 0 {
            self.add_to_dictionaries(&committed, FREQUENCY_FOR_PICKED, false);
        } else {
            self.add_to_dictionaries(&committed, 1, true);
        }
        self.entry.accepted_suggestion(&typed, &suggestion);
        if self.auto_space && !correcting {
            self.text.push(' ');
            self.entry.typed_character(' ', true);
        }
        self.update_shift_state();
        true
    }

    /// Commit the composed word unchanged.
    pub fn commit_typed(&mut self) {
        if !self.predicting {
            return;
        }
        self.predicting = false;
        let typed = self.composer.typed_word().unwrap_or("").to_string();
        if !typed.is_empty() {
            let previous = self.previous_word();
            self.text.push_str(&typed);
            self.committed_length = typed.chars().count();
            self.remember_commit(&typed);
            self.entry.accepted_typed(&typed);
            self.learn(&typed, previous.as_deref(), FREQUENCY_FOR_TYPED, false);
        }
        self.best_word = None;
    }

    /// Apply the shift state to `word`, append it to the text and keep the
    /// composer for a later revert. Returns the text as committed.
    fn commit_word(&mut self, word: &str) -> String {
        let committed = if self.shift == ShiftState::Locked {
            word.to_uppercase()
        } else if self.composer.is_first_char_capitalized() || self.shift.is_shifted() {
            capitalize_first(word)
        } else {
            word.to_string()
        };
        self.text.push_str(&committed);
        self.committed_length = committed.chars().count();
        self.remember_commit(&committed);
        self.predicting = false;
        self.best_word = None;
        committed
    }

    fn remember_commit(&mut self, chosen: &str) {
        let entry = CommittedWord {
            chosen: chosen.to_string(),
            composer: self.composer.clone(),
        };
        if self.composer.size() > 1 {
            self.history.push(entry.clone());
        }
        self.last_commit = Some(entry);
    }

    /// Undo the last commit and put the typed word back into composition.
    ///
    /// `delete_char` also removes the separator typed after the word. With
    /// nothing to revert a single character is deleted.
    pub fn revert_last_word(&mut self, delete_char: bool) {
        let commit = if self.predicting { None } else { self.last_commit.take() };
        let Some(commit) = commit else {
            self.text.pop();
            self.just_reverted_separator = None;
            return;
        };
        self.just_reverted_separator = self.text.chars().last();
        if delete_char {
            self.text.pop();
        }
        let mut to_delete = self.committed_length;
        let tail_start = char_offset_from_end(&self.text, self.committed_length);
        if let Some(first) = self.text[tail_start..].chars().next() {
            if keycodes::is_word_separator(first as i32) {
                to_delete -= 1;
            }
        }
        let cut = char_offset_from_end(&self.text, to_delete);
        self.text.truncate(cut);

        self.composer = commit.composer;
        self.predicting = true;
        self.committed_length = 0;
        self.entry.backspace();
        debug!(word = ?self.composer.typed_word(), "reverted last word");
        self.update_suggestions();
    }

    /// Bring a previously composed word back for correction.
    ///
    /// Looks `word` up among the words committed this session; a known
    /// dictionary word without history is recomposed letter by letter.
    pub fn select_word_for_correction(&mut self, word: &str) -> bool {
        if self.predicting || word.chars().count() < 2 {
            return false;
        }
        let found = self
            .history
            .iter()
            .rev()
            .find(|entry| entry.chosen == word)
            .map(|entry| entry.composer.clone());
        let composer = match found {
            Some(composer) => composer,
            None if self.suggest.is_valid_word(word) || self.suggest.is_valid_word(&word.to_lowercase()) => {
                let mut composer = WordComposer::new();
                for c in word.chars() {
                    composer.add(c as i32, &[c as i32]);
                }
                composer.set_first_char_capitalized(word.chars().next().is_some_and(char::is_uppercase));
                composer
            }
            None => return false,
        };
        self.composer = composer;
        self.entry.selected_for_correction();
        self.predicting = true;
        self.update_suggestions();
        true
    }

    // ========== Learning ==========

    fn add_to_dictionaries(&mut self, word: &str, delta: i32, bigram_only: bool) {
        let previous = self.previous_word_before_commit();
        self.learn(word, previous.as_deref(), delta, bigram_only);
    }

    /// Feed an accepted word to the auto dictionary and the bigram store.
    /// Only done while auto-correction is on.
    fn learn(&self, word: &str, previous: Option<&str>, delta: i32, bigram_only: bool) {
        if word.is_empty() || !self.suggest.correction_mode().is_full() {
            return;
        }
        let word = if self.last_commit.as_ref().is_some_and(|c| c.composer.is_auto_capitalized()) {
            lowercase_first(word)
        } else {
            word.to_string()
        };
        if let Some(auto) = &self.auto_dictionary {
            let known = self.suggest.is_valid_word(&word) || self.suggest.is_valid_word(&word.to_lowercase());
            if (!bigram_only && auto.is_valid_word(&word)) || !known {
                auto.add_word(&word, delta);
            }
        }
        if let (Some(bigrams), Some(previous)) = (&self.user_bigrams, previous) {
            bigrams.add_bigram(previous, &word);
        }
    }

    fn previous_word(&self) -> Option<String> {
        previous_word_in(&self.text)
    }

    fn previous_word_before_commit(&self) -> Option<String> {
        let cut = char_offset_from_end(&self.text, self.committed_length);
        previous_word_in(&self.text[..cut])
    }

    fn update_shift_state(&mut self) {
        if matches!(self.shift, ShiftState::Locked | ShiftState::Shifted) {
            return;
        }
        let at_sentence_start = !self.predicting && is_sentence_start(&self.text);
        self.shift = if self.auto_capitalize && at_sentence_start {
            ShiftState::Auto
        } else {
            ShiftState::Off
        };
    }

    pub fn close(&self) {
        if let Some(auto) = &self.auto_dictionary {
            auto.flush_pending_writes();
        }
        self.suggest.close();
    }
}

/// Byte offset of the `n`-th character counted from the end.
fn char_offset_from_end(text: &str, n: usize) -> usize {
    if n == 0 {
        return text.len();
    }
    text.char_indices().rev().nth(n - 1).map(|(i, _)| i).unwrap_or(0)
}

/// Last word of `text` when only spaces follow it.
fn previous_word_in(text: &str) -> Option<String> {
    let trimmed = text.trim_end_matches(' ');
    let word: String = trimmed
        .chars()
        .rev()
        .take_while(|c| keycodes::is_word_character(*c as i32))
        .collect::<Vec<_>>()
        .into_iter()
        .rev()
        .collect();
    if word.is_empty() {
        None
    } else {
        Some(word)
    }
}

fn is_sentence_start(text: &str) -> bool {
    let trimmed = text.trim_end();
    if trimmed.is_empty() {
        return true;
    }
    trimmed.len() != text.len() && matches!(trimmed.chars().last(), Some('.' | '!' | '?'))
}

fn capitalize_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn lowercase_first(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binary_dictionary::{BinaryDictionary, DictionaryBuilder, FstEngine};
    use crate::word_store::MemoryWordStore;

    fn engine_with(words: &[(&str, i32)]) -> InputEngine {
        let mut builder = DictionaryBuilder::new();
        for (word, freq) in words {
            builder.add_word(word, *freq);
        }
        let bytes = builder.build().unwrap();
        let main = BinaryDictionary::new(FstEngine::from_bytes(&bytes).unwrap());
        let mut suggest = Suggest::new(main);
        suggest.set_large_dictionary_threshold(0);
        let mut engine = InputEngine::new(suggest);
        engine.set_correction_mode(CorrectionMode::Full);
        engine.start_session();
        engine
    }

    fn type_word(engine: &mut InputEngine, word: &str) {
        for c in word.chars() {
            engine.on_key(c as i32, &[c as i32]);
        }
    }

    #[test]
    fn empty_main_dictionary_disables_correction() {
        let suggest = Suggest::new(BinaryDictionary::new(FstEngine::empty()));
        let engine = InputEngine::new(suggest);
        assert_eq!(engine.correction_mode(), CorrectionMode::None);
    }

    #[test]
    fn space_commits_best_word() {
        let mut engine = engine_with(&[("hello", 200), ("help", 120)]);
        type_word(&mut engine, "helo");
        assert_eq!(engine.composing(), "helo");
        assert_eq!(engine.best_word(), Some("hello"));
        engine.on_key(keycodes::SPACE, &[keycodes::SPACE]);
        assert_eq!(engine.text(), "hello ");
        assert!(!engine.is_predicting());
        assert_eq!(engine.entry_state(), EntryState::AcceptedDefault);
    }

    #[test]
    fn valid_typed_word_is_kept() {
        let mut engine = engine_with(&[("help", 200), ("hello", 250)]);
        type_word(&mut engine, "help");
        assert!(engine.is_typed_word_valid());
        assert_eq!(engine.best_word(), Some("help"));
    }

    #[test]
    fn backspace_reverts_auto_correction() {
        let mut engine = engine_with(&[("hello", 200)]);
        type_word(&mut engine, "helo");
        engine.on_key(keycodes::SPACE, &[keycodes::SPACE]);
        assert_eq!(engine.text(), "hello ");
        engine.on_key(keycodes::DELETE, &[]);
        assert_eq!(engine.text(), "");
        assert!(engine.is_predicting());
        assert_eq!(engine.composing(), "helo");
        assert_eq!(engine.entry_state(), EntryState::InWord);

        // The same separator right after a revert keeps the typed word.
        engine.on_key(keycodes::SPACE, &[keycodes::SPACE]);
        assert_eq!(engine.text(), "helo ");
    }

    #[test]
    fn picking_a_suggestion_adds_a_space() {
        let mut engine = engine_with(&[("hello", 200), ("help", 120)]);
        type_word(&mut engine, "hel");
        let index = engine
            .suggestions()
            .iter()
            .position(|s| s.text == "help")
            .unwrap();
        assert!(engine.pick_suggestion(index));
        assert_eq!(engine.text(), "help ");
        assert_eq!(engine.entry_state(), EntryState::SpaceAfterPicked);
        assert!(!engine.pick_suggestion(99));
    }

    #[test]
    fn shift_capitalizes_commit() {
        let mut engine = engine_with(&[("hello", 200)]);
        engine.on_key(keycodes::SHIFT, &[]);
        type_word(&mut engine, "helo");
        assert!(engine.composer().is_first_char_capitalized());
        assert_eq!(engine.composing(), "Helo");
        engine.on_key(keycodes::SPACE, &[keycodes::SPACE]);
        assert_eq!(engine.text(), "Hello ");
    }

    #[test]
    fn auto_capitalize_at_sentence_start() {
        let mut engine = engine_with(&[("hello", 200)]);
        engine.set_auto_capitalize(true);
        assert_eq!(engine.shift_state(), ShiftState::Auto);
        type_word(&mut engine, "h");
        assert!(engine.composer().is_auto_capitalized());
        assert_eq!(engine.shift_state(), ShiftState::Off);
    }

    #[test]
    fn typed_words_are_learned() {
        let mut engine = engine_with(&[("hello", 200)]);
        let store = Arc::new(MemoryWordStore::new());
        let auto = Arc::new(AutoDictionary::open(store, "en_US", 48).unwrap());
        engine.set_auto_dictionary(Some(auto.clone()));
        type_word(&mut engine, "zzyzx");
        engine.on_key('.' as i32, &['.' as i32]);
        assert_eq!(auto.word_frequency("zzyzx"), Some(1));
    }

    #[test]
    fn previous_word_stops_at_punctuation() {
        assert_eq!(previous_word_in("good "), Some("good".to_string()));
        assert_eq!(previous_word_in("good. "), None);
        assert_eq!(previous_word_in(""), None);
        assert!(is_sentence_start("Done. "));
        assert!(!is_sentence_start("Done."));
    }
}
