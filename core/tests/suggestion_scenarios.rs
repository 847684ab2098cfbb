// core/tests/suggestion_scenarios.rs
//
// End-to-end ranking tests against a compiled dictionary blob.
//
// Tests cover:
// - Missed-letter correction ("helo" -> "hello")
// - No correction when nothing is close
// - Bigram predictions after a previous word and the unigram boost
// - Bounded, duplicate-free suggestion lists
// - Bigram lists capped at 60 and seeding capped at the suggestion limit

use libkeyboard_core::suggest::{bigram_multiplier, MAX_BIGRAM_SUGGESTIONS};
use libkeyboard_core::{
    BinaryDictionary, CorrectionMode, DataType, Dictionary, DictionaryBuilder, DictionaryKind, ExpandableDictionary,
    FstEngine, Suggest, WordComposer,
};
use std::sync::Arc;

fn main_dictionary() -> BinaryDictionary {
    let blob = DictionaryBuilder::new()
        .add_word("hello", 200)
        .add_word("help", 120)
        .add_word("held", 60)
        .add_word("morning", 80)
        .add_word("more", 150)
        .add_word("good", 180)
        .add_bigram("good", "morning", 100)
        .add_bigram("good", "night", 80)
        .build()
        .unwrap();
    BinaryDictionary::new(FstEngine::from_bytes(&blob).unwrap())
}

fn typed(word: &str) -> WordComposer {
    let mut composer = WordComposer::new();
    for c in word.chars() {
        composer.add(c as i32, &[c as i32]);
    }
    composer
}

fn texts(suggest: &Suggest) -> Vec<String> {
    suggest.suggestions().iter().map(|s| s.text.clone()).collect()
}

#[test]
fn missed_letter_is_corrected() {
    let mut suggest = Suggest::new(main_dictionary());
    suggest.get_suggestions(&typed("helo"), None);
    let list = texts(&suggest);
    assert_eq!(list[0], "helo");
    assert_eq!(list[1], "hello");
    assert!(suggest.has_minimal_correction());
}

#[test]
fn unrelated_input_has_no_correction() {
    let mut suggest = Suggest::new(main_dictionary());
    suggest.get_suggestions(&typed("cxy"), None);
    assert_eq!(texts(&suggest), vec!["cxy"]);
    assert!(!suggest.has_minimal_correction());
}

#[test]
fn bigram_prediction_after_previous_word() {
    let mut suggest = Suggest::new(main_dictionary());
    suggest.set_correction_mode(CorrectionMode::FullBigram);

    suggest.get_suggestions(&typed("m"), Some("good"));
    let bigrams = suggest.bigram_suggestions();
    assert_eq!(bigrams[0].text, "morning");
    assert_eq!(bigrams[0].priority, 100);
    assert_eq!(bigrams[0].data_type, DataType::Bigram);
    // Only predictions starting with the typed letter are seeded.
    assert_eq!(texts(&suggest), vec!["m", "morning"]);
}

#[test]
fn bigram_boosts_matching_unigram() {
    let mut plain = Suggest::new(main_dictionary());
    plain.set_correction_mode(CorrectionMode::FullBigram);
    plain.get_suggestions(&typed("m"), None);
    plain.get_suggestions(&typed("mo"), None);
    let base = plain
        .suggestions()
        .iter()
        .find(|s| s.text == "morning")
        .map(|s| s.priority)
        .unwrap();

    let mut boosted = Suggest::new(main_dictionary());
    boosted.set_correction_mode(CorrectionMode::FullBigram);
    boosted.get_suggestions(&typed("m"), Some("good"));
    boosted.get_suggestions(&typed("mo"), Some("good"));
    let priority = boosted
        .suggestions()
        .iter()
        .find(|s| s.text == "morning")
        .map(|s| s.priority)
        .unwrap();
    assert_eq!(priority, (base as f64 * bigram_multiplier(100)).round() as i32);
}

#[test]
fn previous_word_is_lowercased_when_known() {
    let mut suggest = Suggest::new(main_dictionary());
    suggest.set_correction_mode(CorrectionMode::Basic);
    suggest.get_suggestions(&typed("n"), Some("Good"));
    assert_eq!(suggest.bigram_suggestions()[0].text, "night");
}

#[test]
fn list_is_bounded_and_unique() {
    let user = Arc::new(ExpandableDictionary::new(DictionaryKind::User, 48));
    for word in ["hello", "help", "helm", "helmet", "helix", "hell", "helot", "helps"] {
        user.add_word(word, 100);
    }
    let mut suggest = Suggest::new(main_dictionary());
    suggest.set_max_suggestions(4).unwrap();
    suggest.set_user_dictionary(Some(user as Arc<dyn Dictionary>));
    suggest.get_suggestions(&typed("hel"), None);

    let list = texts(&suggest);
    assert!(list.len() <= 5, "{:?}", list);
    assert_eq!(list[0], "hel");
    for (i, word) in list.iter().enumerate().skip(1) {
        assert!(!list[..i].contains(word), "duplicate {}", word);
    }
}

#[test]
fn bigram_lists_are_bounded() {
    let bigrams = Arc::new(ExpandableDictionary::new(DictionaryKind::User, 48));
    for i in 0..80 {
        bigrams.set_bigram("good", &format!("m{:02}", i), 50 + i % 50);
    }
    for i in 0..20 {
        bigrams.set_bigram("good", &format!("n{:02}", i), 10);
    }
    let mut suggest = Suggest::new(main_dictionary());
    suggest.set_correction_mode(CorrectionMode::FullBigram);
    suggest.set_max_suggestions(5).unwrap();
    suggest.set_user_bigram_dictionary(Some(bigrams as Arc<dyn Dictionary>));

    suggest.get_suggestions(&typed("m"), Some("good"));
    assert_eq!(suggest.bigram_suggestions().len(), MAX_BIGRAM_SUGGESTIONS);
    assert!(suggest.bigram_suggestions().iter().all(|s| s.priority >= 50));

    let list = texts(&suggest);
    assert_eq!(list.len(), 6, "{:?}", list);
    assert_eq!(list[0], "m");
    assert!(list[1..].iter().all(|w| w.starts_with('m')));
}

#[test]
fn capitalized_input_gets_capitalized_suggestions() {
    let mut composer = typed("Helo");
    composer.set_first_char_capitalized(true);
    let mut suggest = Suggest::new(main_dictionary());
    suggest.get_suggestions(&composer, None);
    assert_eq!(texts(&suggest)[1], "Hello");
}
