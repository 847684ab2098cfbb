//! Plain-text word lists.
//!
//! One entry per line, fields separated by tabs (or any whitespace when a
//! line has no tab):
//!
//! ```text
//! # comment
//! hello	200
//! good	morning	110
//! ```
//!
//! Two fields are a word and its frequency, three fields a bigram. A missing
//! frequency defaults to 1.

use anyhow::{Context, Result, bail};
use libkeyboard_core::DictionaryBuilder;
use serde::Serialize;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Entry {
    Word { word: String, frequency: i32 },
    Bigram { previous: String, next: String, frequency: i32 },
}

/// Counts reported after filling a builder.
#[derive(Debug, Default, Clone, Serialize)]
pub struct ListStats {
    pub words: usize,
    pub bigrams: usize,
    pub skipped: usize,
}

/// Parse one line. Blank lines and comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<Entry>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let fields: Vec<&str> = if line.contains('\t') {
        line.split('\t').map(str::trim).collect()
    } else {
        line.split_whitespace().collect()
    };
    let entry = match fields.as_slice() {
        [word] => Entry::Word { word: word.to_string(), frequency: 1 },
        [word, freq] => match freq.parse::<i32>() {
            Ok(frequency) => Entry::Word { word: word.to_string(), frequency },
            // Two words without a frequency
            Err(_) => Entry::Bigram { previous: word.to_string(), next: freq.to_string(), frequency: 1 },
        },
        [previous, next, freq] => {
            let frequency = freq.parse::<i32>().with_context(|| format!("bad frequency {:?}", freq))?;
            Entry::Bigram { previous: previous.to_string(), next: next.to_string(), frequency }
        }
        _ => bail!("expected 1 to 3 fields, got {}", fields.len()),
    };
    Ok(Some(entry))
}

/// Read every entry of a word list file.
pub fn read_word_list(path: &Path) -> Result<Vec<Entry>> {
    let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut entries = Vec::new();
    for (number, line) in BufReader::new(file).lines().enumerate() {
        let line = line?;
        let parsed = parse_line(&line).with_context(|| format!("{}:{}", path.display(), number + 1))?;
        entries.extend(parsed);
    }
    Ok(entries)
}

/// Add entries to a builder. Entries the builder would reject are counted as
/// skipped.
pub fn fill_builder(builder: &mut DictionaryBuilder, entries: &[Entry]) -> ListStats {
    let mut stats = ListStats::default();
    for entry in entries {
        let (words_before, bigrams_before) = (builder.word_count(), builder.bigram_count());
        match entry {
            Entry::Word { word, frequency } => {
                builder.add_word(word, *frequency);
                if builder.word_count() > words_before {
                    stats.words += 1;
                } else if word.is_empty() || word.chars().count() >= libkeyboard_core::dictionary::MAX_WORD_LENGTH {
                    stats.skipped += 1;
                }
            }
            Entry::Bigram { previous, next, frequency } => {
                builder.add_bigram(previous, next, *frequency);
                if builder.bigram_count() > bigrams_before {
                    stats.bigrams += 1;
                }
            }
        }
    }
    stats
}
