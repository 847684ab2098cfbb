//! Compiled main dictionary.
//!
//! The word list ships as a single blob: a bincode header followed by two
//! `fst` maps, one from word to frequency and one from `previous \0 next` to
//! bigram frequency. Blobs split into several parts are concatenated before
//! parsing. Lookups walk the unigram map with an automaton over the typed
//! alternatives lattice, so only words reachable from the typed keys are ever
//! visited.
//!
//! [`FstEngine`] implements the [`DictionaryEngine`] primitive;
//! [`BinaryDictionary`] layers the missed-character fallback and the
//! [`Dictionary`] capability on top of any engine.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::Read;
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Mutex;

use fst::{Automaton, IntoStreamer, Map, MapBuilder, Streamer};
use lru::LruCache;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::dictionary::{
    code_matches, is_typed_word, max_edit_distance, starts_with_alternative, DataType, Dictionary, DictionaryEngine, DictionaryKind,
    WordCallback, MAX_BIGRAM_FREQUENCY, MAX_FREQUENCY, MAX_WORD_LENGTH,
};
use crate::error::{Error, Result};
use crate::expandable_dictionary::{FULL_WORD_FREQ_MULTIPLIER, TYPED_LETTER_MULTIPLIER};
use crate::keycodes::SINGLE_QUOTE;
use crate::word_composer::WordComposer;

pub const MAX_ALTERNATIVES: usize = 16;
pub const MAX_WORDS: usize = 18;
pub const MAX_BIGRAMS: usize = 60;

/// Direct lookups returning fewer words than this try the missed-letter pass.
const MIN_DIRECT_RESULTS: usize = 5;

const MAGIC: [u8; 4] = *b"LKBD";
const FORMAT_VERSION: u32 = 1;
const BIGRAM_SEPARATOR: u8 = 0;

#[derive(Debug, Serialize, Deserialize)]
struct BlobHeader {
    magic: [u8; 4],
    version: u32,
    unigram_len: u64,
    bigram_len: u64,
}

/// Builds a dictionary blob from words and bigrams.
#[derive(Debug, Default)]
pub struct DictionaryBuilder {
    unigrams: BTreeMap<Vec<u8>, u64>,
    bigrams: BTreeMap<Vec<u8>, u64>,
}

impl DictionaryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a word. Repeated words keep the highest frequency.
    pub fn add_word(&mut self, word: &str, frequency: i32) -> &mut Self {
        if word.is_empty() || word.chars().count() >= MAX_WORD_LENGTH {
            return self;
        }
        let frequency = frequency.clamp(0, MAX_FREQUENCY) as u64;
        let entry = self.unigrams.entry(word.as_bytes().to_vec()).or_insert(0);
        *entry = (*entry).max(frequency);
        self
    }

    pub fn add_bigram(&mut self, previous: &str, next: &str, frequency: i32) -> &mut Self {
        if previous.is_empty() || next.is_empty() {
            return self;
        }
        let frequency = frequency.clamp(0, MAX_BIGRAM_FREQUENCY) as u64;
        self.bigrams.insert(bigram_key(previous, next), frequency);
        self
    }

    pub fn word_count(&self) -> usize {
        self.unigrams.len()
    }

    pub fn bigram_count(&self) -> usize {
        self.bigrams.len()
    }

    /// Serialize into a blob readable by [`FstEngine::from_bytes`].
    pub fn build(&self) -> Result<Vec<u8>> {
        let unigrams = build_map(&self.unigrams)?;
        let bigrams = build_map(&self.bigrams)?;
        let header = BlobHeader {
            magic: MAGIC,
            version: FORMAT_VERSION,
            unigram_len: unigrams.len() as u64,
            bigram_len: bigrams.len() as u64,
        };
        let mut out = bincode::serialize(&header)?;
        out.extend_from_slice(&unigrams);
        out.extend_from_slice(&bigrams);
        Ok(out)
    }
}

fn build_map(entries: &BTreeMap<Vec<u8>, u64>) -> Result<Vec<u8>> {
    let mut builder = MapBuilder::memory();
    for (key, value) in entries {
        builder.insert(key, *value)?;
    }
    Ok(builder.into_inner()?)
}

fn bigram_key(previous: &str, next: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(previous.len() + next.len() + 1);
    key.extend_from_slice(previous.as_bytes());
    key.push(BIGRAM_SEPARATOR);
    key.extend_from_slice(next.as_bytes());
    key
}

/// Matches words spelled by the alternatives lattice, one letter per position.
///
/// States track the word depth (in characters), the number of typed positions
/// consumed, how many of them matched a non-primary alternative and a
/// partially read UTF-8 sequence.
struct LatticeAutomaton<'a> {
    codes: &'a [Vec<i32>],
    skip: Option<usize>,
    max_depth: usize,
    max_edits: usize,
}

#[derive(Clone, Debug)]
enum LatticeState {
    Live {
        depth: usize,
        input: usize,
        diffs: usize,
        pending: [u8; 4],
        pending_len: u8,
    },
    Dead,
}

impl LatticeAutomaton<'_> {
    /// Advance over one decoded letter. Returns the new input position and
    /// whether a non-primary alternative matched, or `None` when the letter
    /// cannot be spelled at this point.
    fn step(&self, c: char, depth: usize, input: usize) -> Option<(usize, bool)> {
        if input >= self.codes.len() {
            return Some((input, false));
        }
        let alternatives = &self.codes[input];
        let typed_quote = alternatives.first() == Some(&SINGLE_QUOTE);
        if (c == '\'' && !typed_quote) || self.skip == Some(depth) {
            return Some((input, false));
        }
        self.match_index(c, input).map(|j| (input + 1, j > 0))
    }

    fn match_index(&self, c: char, input: usize) -> Option<usize> {
        let usable = if self.skip.is_some() { 1 } else { MAX_ALTERNATIVES };
        self.codes[input]
            .iter()
            .take(usable)
            .take_while(|&&code| code >= 0)
            .position(|&code| code_matches(c, code))
    }

    /// Final frequency for a matched `word`, replaying the walk.
    fn score(&self, word: &str, frequency: i32) -> i32 {
        let mut weight: i32 = 1;
        let mut input = 0;
        let mut completed = false;
        for (depth, c) in word.chars().enumerate() {
            if input >= self.codes.len() {
                completed = true;
                continue;
            }
            let typed_quote = self.codes[input].first() == Some(&SINGLE_QUOTE);
            if (c == '\'' && !typed_quote) || self.skip == Some(depth) {
                continue;
            }
            if let Some(j) = self.match_index(c, input) {
                if j == 0 {
                    weight = weight.saturating_mul(TYPED_LETTER_MULTIPLIER);
                }
                input += 1;
            }
        }
        let mut score = frequency.saturating_mul(weight);
        if !completed && self.skip.is_none() {
            score = score.saturating_mul(FULL_WORD_FREQ_MULTIPLIER);
        }
        score
    }
}

impl Automaton for LatticeAutomaton<'_> {
    type State = LatticeState;

    fn start(&self) -> LatticeState {
        LatticeState::Live {
            depth: 0,
            input: 0,
            diffs: 0,
            pending: [0; 4],
            pending_len: 0,
        }
    }

    fn is_match(&self, state: &LatticeState) -> bool {
        matches!(state, LatticeState::Live { input, pending_len: 0, .. } if *input == self.codes.len())
    }

    fn can_match(&self, state: &LatticeState) -> bool {
        matches!(state, LatticeState::Live { .. })
    }

    fn accept(&self, state: &LatticeState, byte: u8) -> LatticeState {
        let LatticeState::Live {
            depth,
            input,
            diffs,
            mut pending,
            pending_len,
        } = *state
        else {
            return LatticeState::Dead;
        };
        pending[pending_len as usize] = byte;
        let len = pending_len as usize + 1;
        if len < utf8_width(pending[0]) {
            return LatticeState::Live {
                depth,
                input,
                diffs,
                pending,
                pending_len: len as u8,
            };
        }
        let Some(c) = std::str::from_utf8(&pending[..len]).ok().and_then(|s| s.chars().next()) else {
            return LatticeState::Dead;
        };
        if depth + 1 > self.max_depth {
            return LatticeState::Dead;
        }
        match self.step(c, depth, input) {
            Some((_, true)) if diffs + 1 > self.max_edits => LatticeState::Dead,
            Some((input, substituted)) => LatticeState::Live {
                depth: depth + 1,
                input,
                diffs: diffs + usize::from(substituted),
                pending: [0; 4],
                pending_len: 0,
            },
            None => LatticeState::Dead,
        }
    }
}

fn utf8_width(first: u8) -> usize {
    match first {
        0x00..=0x7F => 1,
        0xC0..=0xDF => 2,
        0xE0..=0xEF => 3,
        _ => 4,
    }
}

struct Tables {
    unigrams: Map<Vec<u8>>,
    bigrams: Map<Vec<u8>>,
}

type LookupKey = (Vec<Vec<i32>>, Option<usize>);

/// `fst`-backed implementation of the compiled dictionary primitive.
pub struct FstEngine {
    tables: Option<Tables>,
    size: usize,
    cache: Mutex<LruCache<LookupKey, Vec<(String, i32)>>>,
}

impl FstEngine {
    const CACHE_SIZE: usize = 64;

    /// An engine with no data. Every lookup is empty and `size()` is zero.
    pub fn empty() -> Self {
        Self::with_tables(None, 0)
    }

    fn with_tables(tables: Option<Tables>, size: usize) -> Self {
        let capacity = NonZeroUsize::new(Self::CACHE_SIZE).unwrap_or(NonZeroUsize::MIN);
        Self {
            tables,
            size,
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Parse a blob produced by [`DictionaryBuilder::build`].
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let header: BlobHeader = bincode::deserialize(bytes)?;
        if header.magic != MAGIC {
            return Err(Error::InvalidDictionary("bad magic".into()));
        }
        if header.version != FORMAT_VERSION {
            return Err(Error::InvalidDictionary(format!(
                "unsupported version {}",
                header.version
            )));
        }
        let start = bincode::serialized_size(&header)? as usize;
        let mid = start + header.unigram_len as usize;
        let end = mid + header.bigram_len as usize;
        if bytes.len() < end {
            return Err(Error::InvalidDictionary(format!(
                "truncated: expected {} bytes, got {}",
                end,
                bytes.len()
            )));
        }
        let unigrams = Map::new(bytes[start..mid].to_vec())?;
        let bigrams = Map::new(bytes[mid..end].to_vec())?;
        Ok(Self::with_tables(Some(Tables { unigrams, bigrams }), bytes.len()))
    }

    /// Concatenate the parts in order and parse the result.
    pub fn from_parts<B: AsRef<[u8]>>(parts: &[B]) -> Result<Self> {
        let joined: Vec<u8> = parts.iter().flat_map(|p| p.as_ref().iter().copied()).collect();
        Self::from_bytes(&joined)
    }

    /// Read and concatenate the given files.
    pub fn load_files<P: AsRef<Path>>(paths: &[P]) -> Result<Self> {
        let mut buf = Vec::new();
        for path in paths {
            File::open(path.as_ref())?.read_to_end(&mut buf)?;
        }
        Self::from_bytes(&buf)
    }

    /// Number of words in the unigram table.
    pub fn word_count(&self) -> usize {
        self.tables.as_ref().map(|t| t.unigrams.len()).unwrap_or(0)
    }

    /// Stored frequency for an exact word.
    pub fn frequency(&self, word: &str) -> Option<i32> {
        let tables = self.tables.as_ref()?;
        tables.unigrams.get(word).map(|v| v as i32)
    }

    /// Every word and its frequency, in key order.
    pub fn words(&self) -> Vec<(String, i32)> {
        let mut out = Vec::new();
        if let Some(tables) = &self.tables {
            let mut stream = tables.unigrams.stream();
            while let Some((key, value)) = stream.next() {
                out.push((String::from_utf8_lossy(key).into_owned(), value as i32));
            }
        }
        out
    }

    fn search(&self, codes: &[Vec<i32>], skip: Option<usize>) -> Vec<(String, i32)> {
        let Some(tables) = &self.tables else {
            return Vec::new();
        };
        let automaton = LatticeAutomaton {
            codes,
            skip,
            max_depth: (codes.len() * 3).min(MAX_WORD_LENGTH),
            max_edits: max_edit_distance(codes.len()),
        };
        let mut out = Vec::new();
        let mut stream = tables.unigrams.search(&automaton).into_stream();
        while let Some((key, value)) = stream.next() {
            let Ok(word) = std::str::from_utf8(key) else {
                continue;
            };
            // The typed word already leads every suggestion list
            if is_typed_word(word, codes) {
                continue;
            }
            out.push((word.to_string(), automaton.score(word, value as i32)));
        }
        out.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.len().cmp(&b.0.len())));
        out
    }
}

impl DictionaryEngine for FstEngine {
    fn lookup(&self, codes: &[Vec<i32>], max_results: usize, skip_position: Option<usize>) -> Vec<(String, i32)> {
        if codes.is_empty() || codes.len() >= MAX_WORD_LENGTH {
            return Vec::new();
        }
        let key = (codes.to_vec(), skip_position);
        if let Ok(mut cache) = self.cache.lock() {
            if let Some(hit) = cache.get(&key) {
                return hit.iter().take(max_results).cloned().collect();
            }
        }
        let mut results = self.search(codes, skip_position);
        results.truncate(MAX_WORDS.max(max_results));
        if let Ok(mut cache) = self.cache.lock() {
            cache.put(key, results.clone());
        }
        results.truncate(max_results);
        results
    }

    fn bigram_lookup(&self, previous_word: &str, codes: &[Vec<i32>], max_results: usize) -> Vec<(String, i32)> {
        let Some(tables) = &self.tables else {
            return Vec::new();
        };
        let mut start = previous_word.as_bytes().to_vec();
        start.push(BIGRAM_SEPARATOR);
        let mut end = previous_word.as_bytes().to_vec();
        end.push(BIGRAM_SEPARATOR + 1);

        let mut out = Vec::new();
        let mut stream = tables.bigrams.range().ge(&start).lt(&end).into_stream();
        while let Some((key, value)) = stream.next() {
            let Ok(next) = std::str::from_utf8(&key[start.len()..]) else {
                continue;
            };
            if starts_with_alternative(next, codes) {
                out.push((next.to_string(), value as i32));
            }
        }
        out.sort_by(|a, b| b.1.cmp(&a.1));
        out.truncate(max_results);
        out
    }

    fn is_valid_word(&self, word: &str) -> bool {
        self.tables
            .as_ref()
            .map(|t| t.unigrams.contains_key(word))
            .unwrap_or(false)
    }

    fn size(&self) -> usize {
        self.size
    }
}

/// The main dictionary: a compiled engine plus the missed-letter fallback.
pub struct BinaryDictionary<E: DictionaryEngine = FstEngine> {
    engine: E,
}

impl BinaryDictionary<FstEngine> {
    /// Load and concatenate dictionary parts from disk.
    ///
    /// A missing or corrupt dictionary is not an error for the caller: the
    /// result is an empty dictionary of size zero, which disables
    /// auto-correction.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Self {
        match FstEngine::load_files(paths) {
            Ok(engine) => {
                debug!(words = engine.word_count(), bytes = engine.size(), "main dictionary loaded");
                Self::new(engine)
            }
            Err(e) => {
                warn!("main dictionary unavailable: {}", e);
                Self::new(FstEngine::empty())
            }
        }
    }

    /// Parse dictionary parts already in memory, degrading like [`Self::load`].
    pub fn from_parts<B: AsRef<[u8]>>(parts: &[B]) -> Self {
        match FstEngine::from_parts(parts) {
            Ok(engine) => Self::new(engine),
            Err(e) => {
                warn!("main dictionary unavailable: {}", e);
                Self::new(FstEngine::empty())
            }
        }
    }
}

impl<E: DictionaryEngine> BinaryDictionary<E> {
    pub fn new(engine: E) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn size(&self) -> usize {
        self.engine.size()
    }

    /// Direct lookup, then one missed-letter pass per position when the
    /// direct lookup is thin.
    pub fn lookup_with_fallback(&self, codes: &[Vec<i32>]) -> Vec<(String, i32)> {
        let mut results = self.engine.lookup(codes, MAX_WORDS, None);
        if results.len() < MIN_DIRECT_RESULTS {
            for skip in 0..codes.len() {
                let found = self.engine.lookup(codes, MAX_WORDS, Some(skip));
                if found.is_empty() {
                    continue;
                }
                // Both passes write into one output buffer: entries past the
                // fallback's count still hold direct results.
                let direct_tail: Vec<_> = results.into_iter().skip(found.len()).collect();
                results = found;
                results.extend(direct_tail);
                break;
            }
        }
        results
    }
}

impl<E: DictionaryEngine> Dictionary for BinaryDictionary<E> {
    fn kind(&self) -> DictionaryKind {
        DictionaryKind::Main
    }

    fn get_words(&self, composer: &WordComposer, callback: &mut dyn WordCallback) {
        if composer.size() > MAX_WORD_LENGTH - 1 {
            return;
        }
        let codes: Vec<Vec<i32>> = composer
            .codes()
            .iter()
            .map(|alts| alts.iter().copied().take(MAX_ALTERNATIVES).collect())
            .collect();
        for (word, frequency) in self.lookup_with_fallback(&codes) {
            if frequency < 1 {
                break;
            }
            if !callback.add_word(&word, frequency, DictionaryKind::Main, DataType::Unigram) {
                return;
            }
        }
    }

    fn get_bigrams(&self, composer: &WordComposer, previous_word: &str, callback: &mut dyn WordCallback) {
        let first: Vec<Vec<i32>> = composer.codes().iter().take(1).cloned().collect();
        for (word, frequency) in self.engine.bigram_lookup(previous_word, &first, MAX_BIGRAMS) {
            if frequency < 1 {
                break;
            }
            if !callback.add_word(&word, frequency, DictionaryKind::Main, DataType::Bigram) {
                return;
            }
        }
    }

    fn is_valid_word(&self, word: &str) -> bool {
        !word.is_empty() && self.engine.is_valid_word(word)
    }
}
