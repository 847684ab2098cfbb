//! Suggestion entries and the text-replacement hook.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dictionary::{DataType, DictionaryKind};

/// One ranked entry of the suggestion strip.
///
/// Priorities use the dictionary 0-255 scale but can exceed it after the
/// typed-letter and bigram multipliers are applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub text: String,
    pub priority: i32,
    pub data_type: DataType,
    pub source: DictionaryKind,
}

impl Suggestion {
    pub fn new<T: Into<String>>(text: T, priority: i32, data_type: DataType, source: DictionaryKind) -> Self {
        Suggestion {
            text: text.into(),
            priority,
            data_type,
            source,
        }
    }

    /// The literal typed word, always offered first.
    pub fn typed<T: Into<String>>(text: T) -> Self {
        Self::new(text, 0, DataType::Unigram, DictionaryKind::UserTyped)
    }
}

/// Platform text-replacement table ("teh" -> "the").
pub trait AutoText: Send + Sync {
    /// Replacement for a lowercased word, if any.
    fn replacement(&self, word: &str) -> Option<String>;
}

impl AutoText for HashMap<String, String> {
    fn replacement(&self, word: &str) -> Option<String> {
        self.get(word).cloned()
    }
}
