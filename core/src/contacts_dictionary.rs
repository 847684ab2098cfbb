//! Dictionary built from contact display names.
//!
//! Names are split into words (a letter followed by letters, `-` or `'`).
//! Each word gets a fixed frequency and a bigram link from the word before it
//! in the same name, so typing "John" offers "Smith" next.

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::dictionary::{Dictionary, DictionaryKind, WordCallback};
use crate::expandable_dictionary::ExpandableDictionary;
use crate::word_composer::WordComposer;

const FREQUENCY_FOR_CONTACTS: i32 = 128;
const FREQUENCY_FOR_CONTACTS_BIGRAM: i32 = 90;

/// Contacts are re-read at most this often after a change notification.
pub const RELOAD_INTERVAL: Duration = Duration::from_secs(30 * 60);

/// Supplies contact display names.
pub trait ContactSource: Send + Sync {
    fn display_names(&self) -> Vec<String>;
}

#[derive(Debug, Default)]
struct ReloadState {
    last_loaded: Option<Instant>,
    requires_reload: bool,
}

pub struct ContactsDictionary {
    words: ExpandableDictionary,
    source: Arc<dyn ContactSource>,
    reload: Mutex<ReloadState>,
}

impl ContactsDictionary {
    pub fn new(source: Arc<dyn ContactSource>, max_word_length: usize) -> Self {
        Self {
            words: ExpandableDictionary::new(DictionaryKind::Contacts, max_word_length),
            source,
            reload: Mutex::new(ReloadState::default()),
        }
    }

    /// Note that the contact list changed.
    pub fn on_contacts_changed(&self) {
        if let Ok(mut state) = self.reload.lock() {
            state.requires_reload = true;
        }
    }

    /// Load on first use, and again after a change once the reload interval
    /// has passed. Returns true when names were (re)loaded.
    pub fn reload_if_needed(&self, now: Instant) -> bool {
        let Ok(mut state) = self.reload.lock() else {
            return false;
        };
        let due = match state.last_loaded {
            None => true,
            Some(at) => state.requires_reload && now.saturating_duration_since(at) > RELOAD_INTERVAL,
        };
        if !due {
            return false;
        }
        self.load_names(&self.source.display_names());
        state.last_loaded = Some(now);
        state.requires_reload = false;
        true
    }

    fn load_names(&self, names: &[String]) {
        self.words.clear();
        let max = self.words.max_word_length();
        for name in names {
            let mut previous: Option<&str> = None;
            for word in name_words(name) {
                let length = word.chars().count();
                if length <= 1 || length >= max {
                    continue;
                }
                self.words.add_word(word, FREQUENCY_FOR_CONTACTS);
                if let Some(prev) = previous {
                    self.words.set_bigram(prev, word, FREQUENCY_FOR_CONTACTS_BIGRAM);
                }
                previous = Some(word);
            }
        }
        debug!(names = names.len(), words = self.words.len(), "contacts loaded");
    }
}

/// Split a display name into words.
fn name_words(name: &str) -> Vec<&str> {
    let mut words = Vec::new();
    let mut chars = name.char_indices().peekable();
    while let Some((start, c)) = chars.next() {
        if !c.is_alphabetic() {
            continue;
        }
        let mut end = start + c.len_utf8();
        while let Some(&(i, next)) = chars.peek() {
            if !(next.is_alphabetic() || next == '-' || next == '\'') {
                break;
            }
            end = i + next.len_utf8();
            chars.next();
        }
        words.push(&name[start..end]);
    }
    words
}

impl Dictionary for ContactsDictionary {
    fn kind(&self) -> DictionaryKind {
        DictionaryKind::Contacts
    }

    fn get_words(&self, composer: &WordComposer, callback: &mut dyn WordCallback) {
        self.words.get_words(composer, callback);
    }

    fn get_bigrams(&self, composer: &WordComposer, previous_word: &str, callback: &mut dyn WordCallback) {
        self.words.get_bigrams(composer, previous_word, callback);
    }

    fn is_valid_word(&self, word: &str) -> bool {
        self.words.is_valid_word(word)
    }
}
