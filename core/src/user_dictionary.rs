//! Words the user added explicitly or that were promoted from the auto
//! dictionary, and the word pairs the user typed in sequence.

use std::sync::Arc;

use tracing::debug;

use crate::auto_dictionary::PromotionListener;
use crate::dictionary::{Dictionary, DictionaryKind, WordCallback};
use crate::error::Result;
use crate::expandable_dictionary::ExpandableDictionary;
use crate::store_writer::StoreWriter;
use crate::word_composer::WordComposer;
use crate::word_store::WordStore;

pub struct UserDictionary {
    words: ExpandableDictionary,
    locale: String,
    writer: StoreWriter,
}

impl UserDictionary {
    pub fn open(store: Arc<dyn WordStore>, locale: &str, max_word_length: usize) -> Result<Self> {
        let words = ExpandableDictionary::new(DictionaryKind::User, max_word_length);
        for (word, frequency) in store.load(locale)? {
            words.add_word(&word, frequency);
        }
        Ok(Self {
            words,
            locale: locale.to_string(),
            writer: StoreWriter::spawn("user-dictionary-writer", store)?,
        })
    }

    /// Add a word and persist it in the background.
    pub fn add_word(&self, word: &str, frequency: i32) {
        if word.chars().count() >= self.words.max_word_length() {
            return;
        }
        self.words.add_word(word, frequency);
        let stored = self.words.word_frequency(word).unwrap_or(frequency);
        self.writer.submit(&self.locale, vec![(word.to_string(), Some(stored))]);
    }

    pub fn word_frequency(&self, word: &str) -> Option<i32> {
        self.words.word_frequency(word)
    }

    /// Wait for queued writes to reach storage.
    pub fn sync(&self) {
        self.writer.sync();
    }
}

impl PromotionListener for UserDictionary {
    fn promote(&self, word: &str, frequency: i32) {
        if self.is_valid_word(word) {
            return;
        }
        debug!(word, "adding promoted word to user dictionary");
        self.add_word(word, frequency);
    }
}

impl Dictionary for UserDictionary {
    fn kind(&self) -> DictionaryKind {
        DictionaryKind::User
    }

    fn get_words(&self, composer: &WordComposer, callback: &mut dyn WordCallback) {
        self.words.get_words(composer, callback);
    }

    fn is_valid_word(&self, word: &str) -> bool {
        self.words.is_valid_word(word)
    }

    fn close(&self) {
        self.sync();
    }
}

/// Word pairs learned from what the user types.
///
/// Each accepted word adds 1 to the bigram from the word before it. Pairs are
/// stored as `previous<TAB>next`.
pub struct UserBigramDictionary {
    pairs: ExpandableDictionary,
    locale: String,
    writer: StoreWriter,
}

impl UserBigramDictionary {
    const FREQUENCY_FOR_TYPED: i32 = 1;

    pub fn open(store: Arc<dyn WordStore>, locale: &str, max_word_length: usize) -> Result<Self> {
        let pairs = ExpandableDictionary::new(DictionaryKind::User, max_word_length);
        for (key, frequency) in store.load(locale)? {
            if let Some((previous, next)) = key.split_once('\t') {
                pairs.set_bigram(previous, next, frequency);
            }
        }
        Ok(Self {
            pairs,
            locale: locale.to_string(),
            writer: StoreWriter::spawn("user-bigram-writer", store)?,
        })
    }

    /// Count one more occurrence of `next` after `previous`.
    pub fn add_bigram(&self, previous: &str, next: &str) -> i32 {
        let max = self.pairs.max_word_length();
        if previous.is_empty() || next.is_empty() || previous.chars().count() >= max || next.chars().count() >= max {
            return 0;
        }
        let frequency = self.pairs.add_bigram(previous, next, Self::FREQUENCY_FOR_TYPED);
        self.writer
            .submit(&self.locale, vec![(format!("{}\t{}", previous, next), Some(frequency))]);
        frequency
    }

    pub fn bigram_frequency(&self, previous: &str, next: &str) -> Option<i32> {
        self.pairs.bigram_frequency(previous, next)
    }

    pub fn sync(&self) {
        self.writer.sync();
    }
}

impl Dictionary for UserBigramDictionary {
    fn kind(&self) -> DictionaryKind {
        DictionaryKind::User
    }

    fn get_words(&self, _composer: &WordComposer, _callback: &mut dyn WordCallback) {}

    fn get_bigrams(&self, composer: &WordComposer, previous_word: &str, callback: &mut dyn WordCallback) {
        self.pairs.get_bigrams(composer, previous_word, callback);
    }

    fn is_valid_word(&self, _word: &str) -> bool {
        false
    }

    fn close(&self) {
        self.sync();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::word_store::MemoryWordStore;

    #[test]
    fn add_word_persists() {
        let store = MemoryWordStore::new();
        let dict = UserDictionary::open(Arc::new(store.clone()), "en_US", 48).unwrap();
        dict.add_word("libkeyboard", 200);
        dict.sync();
        assert_eq!(store.frequency("en_US", "libkeyboard"), Some(200));
        assert!(dict.is_valid_word("libkeyboard"));
    }

    #[test]
    fn promotion_skips_known_words() {
        let store = MemoryWordStore::new();
        let dict = UserDictionary::open(Arc::new(store.clone()), "en_US", 48).unwrap();
        dict.add_word("known", 10);
        dict.promote("known", 250);
        dict.promote("fresh", 250);
        dict.sync();
        assert_eq!(store.frequency("en_US", "known"), Some(10));
        assert_eq!(store.frequency("en_US", "fresh"), Some(250));
    }

    #[test]
    fn bigrams_accumulate_and_reload() {
        let store = MemoryWordStore::new();
        {
            let dict = UserBigramDictionary::open(Arc::new(store.clone()), "en_US", 48).unwrap();
            assert_eq!(dict.add_bigram("good", "night"), 1);
            assert_eq!(dict.add_bigram("good", "night"), 2);
            dict.sync();
        }
        assert_eq!(store.frequency("en_US", "good\tnight"), Some(2));
        let reloaded = UserBigramDictionary::open(Arc::new(store), "en_US", 48).unwrap();
        assert_eq!(reloaded.bigram_frequency("good", "night"), Some(2));
    }
}
