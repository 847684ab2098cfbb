// core/tests/input_round_trip.rs
//
// Integration tests for InputEngine driven by key codes.
//
// Tests cover:
// - Commit then revert restores the composed word unchanged
// - Learning from accepted words (auto dictionary and user bigrams)
// - Configuration applied through with_config
// - Correcting an earlier word from the session history

use libkeyboard_core::keycodes::{DELETE, SPACE};
use libkeyboard_core::{
    AutoDictionary, BinaryDictionary, Config, CorrectionMode, DictionaryBuilder, EntryState, FstEngine,
    InputEngine, MemoryWordStore, Suggest, UserBigramDictionary,
};
use std::sync::Arc;

fn suggest() -> Suggest {
    let blob = DictionaryBuilder::new()
        .add_word("hello", 200)
        .add_word("world", 180)
        .add_word("good", 150)
        .add_word("morning", 120)
        .add_bigram("good", "morning", 100)
        .build()
        .unwrap();
    let mut suggest = Suggest::new(BinaryDictionary::new(FstEngine::from_bytes(&blob).unwrap()));
    suggest.set_large_dictionary_threshold(0);
    suggest
}

fn config() -> Config {
    Config {
        large_dictionary_threshold: 0,
        auto_capitalize: false,
        ..Config::default()
    }
}

fn type_text(engine: &mut InputEngine, text: &str) {
    for c in text.chars() {
        engine.on_key(c as i32, &[c as i32]);
    }
}

#[test]
fn revert_restores_the_composer() {
    let mut engine = InputEngine::with_config(suggest(), &config()).unwrap();
    engine.start_session();
    type_text(&mut engine, "wrld");
    let before = engine.composer().clone();

    engine.on_key(SPACE, &[SPACE]);
    assert_eq!(engine.text(), "world ");

    engine.on_key(DELETE, &[]);
    assert_eq!(engine.text(), "");
    assert_eq!(engine.composer(), &before);
    assert_eq!(engine.composing(), "wrld");
    assert_eq!(engine.entry_state(), EntryState::InWord);
}

#[test]
fn second_backspace_edits_the_restored_word() {
    let mut engine = InputEngine::with_config(suggest(), &config()).unwrap();
    engine.start_session();
    type_text(&mut engine, "helo ");
    engine.on_key(DELETE, &[]);
    engine.on_key(DELETE, &[]);
    assert_eq!(engine.composing(), "hel");
}

#[test]
fn bigram_mode_follows_config() {
    let engine = InputEngine::with_config(suggest(), &config()).unwrap();
    assert_eq!(engine.correction_mode(), CorrectionMode::FullBigram);

    let mut plain = config();
    plain.bigram_suggestions = false;
    let engine = InputEngine::with_config(suggest(), &plain).unwrap();
    assert_eq!(engine.correction_mode(), CorrectionMode::Full);

    let mut invalid = config();
    invalid.max_suggestions = 0;
    assert!(InputEngine::with_config(suggest(), &invalid).is_err());
}

#[test]
fn accepted_words_are_learned() {
    let mut engine = InputEngine::with_config(suggest(), &config()).unwrap();
    let auto = Arc::new(AutoDictionary::open(Arc::new(MemoryWordStore::new()), "en_US", 48).unwrap());
    let bigrams = Arc::new(UserBigramDictionary::open(Arc::new(MemoryWordStore::new()), "en_US", 48).unwrap());
    engine.set_auto_dictionary(Some(auto.clone()));
    engine.set_user_bigram_dictionary(Some(bigrams.clone()));
    engine.start_session();

    type_text(&mut engine, "good qwzx ");
    assert_eq!(engine.text(), "good qwzx ");
    // Known words are not added to the auto dictionary.
    assert_eq!(auto.word_frequency("good"), None);
    assert_eq!(auto.word_frequency("qwzx"), Some(1));
    assert_eq!(bigrams.bigram_frequency("good", "qwzx"), Some(1));
}

#[test]
fn prediction_uses_previous_word() {
    let mut engine = InputEngine::with_config(suggest(), &config()).unwrap();
    engine.start_session();
    type_text(&mut engine, "good m");
    let texts: Vec<&str> = engine.suggestions().iter().map(|s| s.text.as_str()).collect();
    assert_eq!(texts, vec!["m", "morning"]);
}

#[test]
fn earlier_word_can_be_corrected() {
    let mut engine = InputEngine::with_config(suggest(), &config()).unwrap();
    engine.start_session();
    type_text(&mut engine, "helo world ");
    assert_eq!(engine.text(), "hello world ");

    assert!(engine.select_word_for_correction("hello"));
    assert_eq!(engine.entry_state(), EntryState::Correcting);
    assert_eq!(engine.composing(), "helo");
    assert!(!engine.is_correction_available());
    assert!(!engine.select_word_for_correction("zzz"));
}
