//! Adaptive dictionary of words the user actually types.
//!
//! Every accepted word adds weight: 3 when picked from the suggestion strip,
//! 1 when typed and kept as is. At 6 the word becomes a valid auto-correct
//! target; at 12 it is promoted to the user dictionary and its local weight
//! resets to 0.
//!
//! Changes accumulate in a pending-write map guarded by a mutex. Flushing
//! swaps in a fresh map and hands the old one to the background writer, so
//! typing during a flush is neither blocked nor lost.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};

use ahash::AHashMap;
use tracing::debug;

use crate::dictionary::{Dictionary, DictionaryKind, WordCallback};
use crate::error::Result;
use crate::expandable_dictionary::ExpandableDictionary;
use crate::store_writer::StoreWriter;
use crate::word_composer::WordComposer;
use crate::word_store::WordStore;

/// Weight added when the user picks a word from the suggestions.
pub const FREQUENCY_FOR_PICKED: i32 = 3;
/// Weight added when a typed word is accepted unchanged.
pub const FREQUENCY_FOR_TYPED: i32 = 1;
/// Frequency given to a word promoted into the user dictionary.
pub const FREQUENCY_FOR_AUTO_ADD: i32 = 250;

const VALIDITY_THRESHOLD: i32 = 2 * FREQUENCY_FOR_PICKED;
const PROMOTION_THRESHOLD: i32 = 4 * FREQUENCY_FOR_PICKED;

/// Receives words that crossed the promotion threshold.
pub trait PromotionListener: Send + Sync {
    fn promote(&self, word: &str, frequency: i32);
}

pub struct AutoDictionary {
    words: ExpandableDictionary,
    locale: String,
    pending: Mutex<AHashMap<String, Option<i32>>>,
    writer: StoreWriter,
    promotion: RwLock<Option<Arc<dyn PromotionListener>>>,
}

impl AutoDictionary {
    /// Load the words stored for `locale` and start the background writer.
    pub fn open(store: Arc<dyn WordStore>, locale: &str, max_word_length: usize) -> Result<Self> {
        let words = ExpandableDictionary::new(DictionaryKind::Auto, max_word_length);
        let stored = store.load(locale)?;
        for (word, frequency) in &stored {
            if word.chars().count() < max_word_length {
                words.set_word_frequency(word, *frequency);
            }
        }
        debug!(count = stored.len(), locale, "auto dictionary loaded");
        Ok(Self {
            words,
            locale: locale.to_string(),
            pending: Mutex::new(AHashMap::new()),
            writer: StoreWriter::spawn("auto-dictionary-writer", store)?,
            promotion: RwLock::new(None),
        })
    }

    pub fn set_promotion_listener(&self, listener: Arc<dyn PromotionListener>) {
        if let Ok(mut slot) = self.promotion.write() {
            *slot = Some(listener);
        }
    }

    pub fn locale(&self) -> &str {
        &self.locale
    }

    /// Add `delta` weight to `word`. Returns true when this call promoted it.
    ///
    /// Words shorter than two characters or longer than the maximum word
    /// length are ignored.
    pub fn add_word(&self, word: &str, delta: i32) -> bool {
        let length = word.chars().count();
        if length < 2 || length > self.words.max_word_length() {
            return false;
        }
        let mut frequency = self.words.word_frequency(word).unwrap_or(0) + delta;
        let mut promoted = false;
        if frequency >= PROMOTION_THRESHOLD {
            debug!(word, "promoting learned word");
            if let Ok(slot) = self.promotion.read() {
                if let Some(listener) = slot.as_ref() {
                    listener.promote(word, FREQUENCY_FOR_AUTO_ADD);
                }
            }
            frequency = 0;
            promoted = true;
        }
        self.words.set_word_frequency(word, frequency);

        if let Ok(mut pending) = self.pending.lock() {
            let value = if frequency == 0 { None } else { Some(frequency) };
            pending.insert(word.to_string(), value);
        }
        promoted
    }

    /// Accumulated local weight of `word`.
    pub fn word_frequency(&self, word: &str) -> Option<i32> {
        self.words.word_frequency(word)
    }

    /// Copy of the changes not yet handed to storage.
    pub fn pending_writes(&self) -> HashMap<String, Option<i32>> {
        self.pending
            .lock()
            .map(|p| p.iter().map(|(k, v)| (k.clone(), *v)).collect())
            .unwrap_or_default()
    }

    /// Hand the pending changes to the background writer.
    pub fn flush_pending_writes(&self) {
        let snapshot = {
            let Ok(mut pending) = self.pending.lock() else {
                return;
            };
            if pending.is_empty() {
                return;
            }
            std::mem::take(&mut *pending)
        };
        let mut batch: Vec<_> = snapshot.into_iter().collect();
        batch.sort();
        debug!(entries = batch.len(), "flushing auto dictionary");
        self.writer.submit(&self.locale, batch);
    }

    /// Wait for flushed batches to reach storage.
    pub fn sync(&self) {
        self.writer.sync();
    }
}

impl Dictionary for AutoDictionary {
    fn kind(&self) -> DictionaryKind {
        DictionaryKind::Auto
    }

    fn get_words(&self, composer: &WordComposer, callback: &mut dyn WordCallback) {
        self.words.get_words(composer, callback);
    }

    fn is_valid_word(&self, word: &str) -> bool {
        self.word_frequency(word).unwrap_or(0) >= VALIDITY_THRESHOLD
    }

    fn close(&self) {
        self.flush_pending_writes();
        self.sync();
    }
}
