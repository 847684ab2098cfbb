//! In-memory prefix tree used by the learning dictionaries.
//!
//! Auto, user and contacts dictionaries all keep their words in an
//! `ExpandableDictionary`: a character trie whose terminal nodes carry a
//! frequency (0..=255) and an optional list of bigram successors. Lookups walk
//! the composer's alternatives lattice, the same way the compiled dictionary
//! does, so words from every source are scored on a comparable scale.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::dictionary::{
    code_matches, max_edit_distance, starts_with_alternative, DataType, Dictionary, DictionaryKind, WordCallback,
    MAX_FREQUENCY,
};
use crate::keycodes::SINGLE_QUOTE;
use crate::word_composer::WordComposer;

/// Weight applied per position where the primary code matched.
pub const TYPED_LETTER_MULTIPLIER: i32 = 2;

/// Extra weight for words exactly as long as the typed input.
pub const FULL_WORD_FREQ_MULTIPLIER: i32 = 2;

#[derive(Debug, Default)]
struct Node {
    children: BTreeMap<char, Box<Node>>,
    terminal: bool,
    frequency: i32,
    /// Successor words and their bigram frequency.
    bigrams: Vec<(String, i32)>,
}

impl Node {
    fn find(&self, word: &str) -> Option<&Node> {
        let mut node = self;
        for ch in word.chars() {
            node = node.children.get(&ch)?;
        }
        Some(node)
    }

    fn find_or_create(&mut self, word: &str) -> &mut Node {
        let mut node = self;
        for ch in word.chars() {
            node = node.children.entry(ch).or_default();
        }
        node
    }

    fn collect(&self, prefix: &mut String, out: &mut Vec<(String, i32)>) {
        if self.terminal {
            out.push((prefix.clone(), self.frequency));
        }
        for (&ch, child) in &self.children {
            prefix.push(ch);
            child.collect(prefix, out);
            prefix.pop();
        }
    }
}

/// A growable dictionary backed by a character trie.
#[derive(Debug)]
pub struct ExpandableDictionary {
    kind: DictionaryKind,
    max_word_length: usize,
    root: RwLock<Node>,
}

struct Search<'a> {
    codes: &'a [Vec<i32>],
    typed: &'a str,
    max_depth: usize,
    /// Positions that may match through a non-primary alternative
    max_edits: usize,
    skip: Option<usize>,
    kind: DictionaryKind,
}

impl ExpandableDictionary {
    pub fn new(kind: DictionaryKind, max_word_length: usize) -> Self {
        Self {
            kind,
            max_word_length,
            root: RwLock::new(Node::default()),
        }
    }

    pub fn max_word_length(&self) -> usize {
        self.max_word_length
    }

    /// Insert `word`, keeping the higher of the stored and given frequency.
    ///
    /// Words of `max_word_length` characters or more are ignored.
    pub fn add_word(&self, word: &str, frequency: i32) {
        if word.is_empty() || word.chars().count() >= self.max_word_length {
            return;
        }
        if let Ok(mut root) = self.root.write() {
            let node = root.find_or_create(word);
            let merged = if node.terminal { node.frequency.max(frequency) } else { frequency };
            node.terminal = true;
            node.frequency = merged.clamp(0, MAX_FREQUENCY);
        }
    }

    /// Insert `word` with exactly `frequency`, replacing any stored value.
    pub fn set_word_frequency(&self, word: &str, frequency: i32) {
        if word.is_empty() || word.chars().count() >= self.max_word_length {
            return;
        }
        if let Ok(mut root) = self.root.write() {
            let node = root.find_or_create(word);
            node.terminal = true;
            node.frequency = frequency.clamp(0, MAX_FREQUENCY);
        }
    }

    /// Stored frequency of `word`, `None` when the word is absent.
    pub fn word_frequency(&self, word: &str) -> Option<i32> {
        let root = self.root.read().ok()?;
        root.find(word).filter(|n| n.terminal).map(|n| n.frequency)
    }

    /// Record that `next` follows `previous`. Returns the stored frequency.
    pub fn set_bigram(&self, previous: &str, next: &str, frequency: i32) -> i32 {
        let frequency = frequency.clamp(0, crate::dictionary::MAX_BIGRAM_FREQUENCY);
        let Ok(mut root) = self.root.write() else {
            return 0;
        };
        let node = root.find_or_create(previous);
        match node.bigrams.iter_mut().find(|(word, _)| word == next) {
            Some(entry) => entry.1 = frequency,
            None => node.bigrams.push((next.to_string(), frequency)),
        }
        frequency
    }

    /// Add `delta` to the (`previous`, `next`) bigram, creating it when
    /// missing. Returns the new frequency.
    pub fn add_bigram(&self, previous: &str, next: &str, delta: i32) -> i32 {
        let Ok(mut root) = self.root.write() else {
            return 0;
        };
        let node = root.find_or_create(previous);
        let max = crate::dictionary::MAX_BIGRAM_FREQUENCY;
        match node.bigrams.iter_mut().find(|(word, _)| word == next) {
            Some(entry) => {
                entry.1 = (entry.1 + delta).clamp(0, max);
                entry.1
            }
            None => {
                let frequency = delta.clamp(0, max);
                node.bigrams.push((next.to_string(), frequency));
                frequency
            }
        }
    }

    /// Bigram frequency of (`previous`, `next`).
    pub fn bigram_frequency(&self, previous: &str, next: &str) -> Option<i32> {
        let root = self.root.read().ok()?;
        let node = root.find(previous)?;
        node.bigrams.iter().find(|(word, _)| word == next).map(|(_, f)| *f)
    }

    /// All words with their frequencies, in lexical order.
    pub fn entries(&self) -> Vec<(String, i32)> {
        let mut out = Vec::new();
        if let Ok(root) = self.root.read() {
            root.collect(&mut String::new(), &mut out);
        }
        out
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.read().map(|r| r.children.is_empty()).unwrap_or(true)
    }

    pub fn clear(&self) {
        if let Ok(mut root) = self.root.write() {
            *root = Node::default();
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn search_rec(
        &self,
        search: &Search<'_>,
        node: &Node,
        word: &mut String,
        depth: usize,
        completion: bool,
        snr: i32,
        input_index: usize,
        diffs: usize,
        callback: &mut dyn WordCallback,
    ) -> bool {
        if depth > search.max_depth {
            return true;
        }
        for (&c, child) in &node.children {
            truncate_chars(word, depth);
            word.push(c);
            let has_children = !child.children.is_empty();

            if completion {
                if child.terminal
                    && !callback.add_word(word, child.frequency.saturating_mul(snr), search.kind, DataType::Unigram)
                {
                    return false;
                }
                if has_children
                    && !self.search_rec(search, child, word, depth + 1, true, snr, input_index, diffs, callback)
                {
                    return false;
                }
                continue;
            }

            let alternatives = &search.codes[input_index];
            let typed_quote = alternatives.first() == Some(&SINGLE_QUOTE);
            if (c == '\'' && !typed_quote) || search.skip == Some(depth) {
                if has_children
                    && !self.search_rec(search, child, word, depth + 1, false, snr, input_index, diffs, callback)
                {
                    return false;
                }
                continue;
            }

            // Only the primary code counts while looking for a missed letter.
            let usable = if search.skip.is_some() { 1 } else { alternatives.len() };
            for (j, &code) in alternatives.iter().take(usable).enumerate() {
                if code < 0 {
                    break;
                }
                if !code_matches(c, code) {
                    continue;
                }
                let diffs = diffs + usize::from(j > 0);
                if diffs > search.max_edits {
                    break;
                }
                let attenuation = if j == 0 { TYPED_LETTER_MULTIPLIER } else { 1 };
                let weight = snr.saturating_mul(attenuation);
                if input_index + 1 == search.codes.len() {
                    if child.terminal && word.as_str() != search.typed {
                        let mut frequency = child.frequency.saturating_mul(weight);
                        if search.skip.is_none() {
                            frequency = frequency.saturating_mul(FULL_WORD_FREQ_MULTIPLIER);
                        }
                        if !callback.add_word(word, frequency, search.kind, DataType::Unigram) {
                            return false;
                        }
                    }
                    if has_children
                        && !self.search_rec(search, child, word, depth + 1, true, weight, input_index + 1, diffs, callback)
                    {
                        return false;
                    }
                } else if has_children
                    && !self.search_rec(search, child, word, depth + 1, false, weight, input_index + 1, diffs, callback)
                {
                    return false;
                }
                break;
            }
        }
        true
    }
}

fn truncate_chars(word: &mut String, chars: usize) {
    if let Some((idx, _)) = word.char_indices().nth(chars) {
        word.truncate(idx);
    }
}

impl Dictionary for ExpandableDictionary {
    fn kind(&self) -> DictionaryKind {
        self.kind
    }

    fn get_words(&self, composer: &WordComposer, callback: &mut dyn WordCallback) {
        let Some(typed) = composer.typed_word() else {
            return;
        };
        let codes = composer.codes();
        if codes.len() >= self.max_word_length {
            return;
        }
        let Ok(root) = self.root.read() else {
            return;
        };
        let mut search = Search {
            codes,
            typed,
            max_depth: codes.len() * 3,
            max_edits: max_edit_distance(codes.len()),
            skip: None,
            kind: self.kind,
        };
        let mut word = String::with_capacity(self.max_word_length);
        if !self.search_rec(&search, &root, &mut word, 0, false, 1, 0, 0, callback) {
            return;
        }
        for skip in 0..codes.len() {
            search.skip = Some(skip);
            word.clear();
            if !self.search_rec(&search, &root, &mut word, 0, false, 1, 0, 0, callback) {
                return;
            }
        }
    }

    fn get_bigrams(&self, composer: &WordComposer, previous_word: &str, callback: &mut dyn WordCallback) {
        let Ok(root) = self.root.read() else {
            return;
        };
        let Some(node) = root.find(previous_word) else {
            return;
        };
        for (next, frequency) in &node.bigrams {
            if !starts_with_alternative(next, composer.codes()) {
                continue;
            }
            if !callback.add_word(next, *frequency, self.kind, DataType::Bigram) {
                return;
            }
        }
    }

    fn is_valid_word(&self, word: &str) -> bool {
        self.word_frequency(word).is_some()
    }
}
