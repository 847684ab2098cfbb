// core/tests/learning_persistence.rs
//
// Integration tests for adaptive learning and its redb persistence.
//
// Tests cover:
// - Validity and promotion thresholds of the auto dictionary
// - Promotion into the user dictionary
// - Pending writes reaching redb and surviving a reopen
// - User bigrams feeding predictions after a restart

use libkeyboard_core::auto_dictionary::FREQUENCY_FOR_PICKED;
use libkeyboard_core::{
    AutoDictionary, Dictionary, MemoryWordStore, PromotionListener, RedbWordStore, UserBigramDictionary,
    UserDictionary, WordComposer, WordStore,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingListener {
    promoted: Mutex<Vec<(String, i32)>>,
}

impl PromotionListener for RecordingListener {
    fn promote(&self, word: &str, frequency: i32) {
        self.promoted.lock().unwrap().push((word.to_string(), frequency));
    }
}

#[test]
fn four_picks_promote_once_and_reset() {
    let store = Arc::new(MemoryWordStore::new());
    let auto = AutoDictionary::open(store.clone(), "en_US", 48).unwrap();
    let listener = Arc::new(RecordingListener::default());
    auto.set_promotion_listener(listener.clone());

    assert!(!auto.add_word("test", FREQUENCY_FOR_PICKED));
    assert!(!auto.is_valid_word("test"));
    assert!(!auto.add_word("test", FREQUENCY_FOR_PICKED));
    assert!(auto.is_valid_word("test"));
    assert!(!auto.add_word("test", FREQUENCY_FOR_PICKED));
    assert!(auto.add_word("test", FREQUENCY_FOR_PICKED));

    assert_eq!(*listener.promoted.lock().unwrap(), vec![("test".to_string(), 250)]);
    assert_eq!(auto.word_frequency("test"), Some(0));
    let pending = auto.pending_writes();
    assert_eq!(pending.len(), 1);
    assert_eq!(pending.get("test"), Some(&None));

    auto.flush_pending_writes();
    auto.sync();
    assert!(auto.pending_writes().is_empty());
    assert_eq!(store.frequency("en_US", "test"), None);
}

#[test]
fn promoted_word_lands_in_user_dictionary() {
    let auto = AutoDictionary::open(Arc::new(MemoryWordStore::new()), "en_US", 48).unwrap();
    let user_store = Arc::new(MemoryWordStore::new());
    let user = Arc::new(UserDictionary::open(user_store.clone(), "en_US", 48).unwrap());
    auto.set_promotion_listener(user.clone());

    for _ in 0..4 {
        auto.add_word("grokking", FREQUENCY_FOR_PICKED);
    }
    user.sync();
    assert!(user.is_valid_word("grokking"));
    assert_eq!(user.word_frequency("grokking"), Some(250));
    assert_eq!(user_store.frequency("en_US", "grokking"), Some(250));
}

#[test]
fn short_and_long_words_are_ignored() {
    let auto = AutoDictionary::open(Arc::new(MemoryWordStore::new()), "en_US", 8).unwrap();
    auto.add_word("a", 3);
    auto.add_word("abcdefghi", 3);
    assert!(auto.pending_writes().is_empty());
}

#[test]
fn learned_words_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("auto.redb");
    {
        let store: Arc<dyn WordStore> = Arc::new(RedbWordStore::open(&path, RedbWordStore::AUTO_WORDS).unwrap());
        let auto = AutoDictionary::open(store, "en_US", 48).unwrap();
        auto.add_word("rustacean", 3);
        auto.add_word("rustacean", 3);
        auto.add_word("ferris", 1);
        auto.close();
    }
    let store: Arc<dyn WordStore> = Arc::new(RedbWordStore::open(&path, RedbWordStore::AUTO_WORDS).unwrap());
    let auto = AutoDictionary::open(store, "en_US", 48).unwrap();
    assert_eq!(auto.word_frequency("rustacean"), Some(6));
    assert!(auto.is_valid_word("rustacean"));
    assert_eq!(auto.word_frequency("ferris"), Some(1));
}

#[test]
fn user_bigrams_predict_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bigrams.redb");
    {
        let store: Arc<dyn WordStore> = Arc::new(RedbWordStore::open(&path, RedbWordStore::USER_BIGRAMS).unwrap());
        let bigrams = UserBigramDictionary::open(store, "en_US", 48).unwrap();
        assert_eq!(bigrams.add_bigram("see", "you"), 1);
        assert_eq!(bigrams.add_bigram("see", "you"), 2);
        bigrams.sync();
    }
    let store: Arc<dyn WordStore> = Arc::new(RedbWordStore::open(&path, RedbWordStore::USER_BIGRAMS).unwrap());
    let bigrams = UserBigramDictionary::open(store, "en_US", 48).unwrap();
    assert_eq!(bigrams.bigram_frequency("see", "you"), Some(2));

    struct Collect(Vec<(String, i32)>);
    impl libkeyboard_core::WordCallback for Collect {
        fn add_word(
            &mut self,
            word: &str,
            frequency: i32,
            _kind: libkeyboard_core::DictionaryKind,
            _data_type: libkeyboard_core::DataType,
        ) -> bool {
            self.0.push((word.to_string(), frequency));
            true
        }
    }
    let mut composer = WordComposer::new();
    composer.add('y' as i32, &['y' as i32]);
    let mut out = Collect(Vec::new());
    bigrams.get_bigrams(&composer, "see", &mut out);
    assert_eq!(out.0, vec![("you".to_string(), 2)]);
}
