//! libkeyboard-core
//!
//! Word composition, dictionaries, suggestion ranking and adaptive learning
//! shared by the touch-keyboard crate.
//!
//! The main dictionary is a compiled FST blob (bincode header, `fst` maps).
//! Learned words live in in-memory tries and are persisted to redb by a
//! background writer.
//!
//! Public API:
//! - `WordComposer` - Letters typed so far with their nearby-key alternatives
//! - `Dictionary` - Capability shared by every word source
//! - `BinaryDictionary` / `FstEngine` - Compiled main dictionary
//! - `Suggest` - Ranks and merges candidates from all dictionaries
//! - `AutoDictionary` - Learns words the user types
//! - `InputEngine` - Key handling, auto-correction and revert
//! - `Config` - Configuration and feature flags
use serde::{Deserialize, Serialize};

pub mod error;
pub use error::{Error, Result};

pub mod keycodes;

pub mod word_composer;
pub use word_composer::WordComposer;

pub mod dictionary;
pub use dictionary::{DataType, Dictionary, DictionaryEngine, DictionaryKind, WordCallback};

pub mod expandable_dictionary;
pub use expandable_dictionary::ExpandableDictionary;

pub mod binary_dictionary;
pub use binary_dictionary::{BinaryDictionary, DictionaryBuilder, FstEngine};

pub mod word_store;
pub use word_store::{MemoryWordStore, RedbWordStore, WordStore};

mod store_writer;

pub mod auto_dictionary;
pub use auto_dictionary::{AutoDictionary, PromotionListener};

pub mod user_dictionary;
pub use user_dictionary::{UserBigramDictionary, UserDictionary};

pub mod contacts_dictionary;
pub use contacts_dictionary::{ContactSource, ContactsDictionary};

pub mod suggestion;
pub use suggestion::{AutoText, Suggestion};

pub mod suggest;
pub use suggest::{CorrectionMode, Suggest};

pub mod text_entry;
pub use text_entry::{EntryState, TextEntryState};

pub mod input_engine;
pub use input_engine::{InputEngine, KeyResult, ShiftState};

/// Suggestion and learning settings.
///
/// Touch-specific timings live in the keyboard crate's config, which
/// flattens this one.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Dictionary suggestions kept per request (1-100), typed word excluded
    pub max_suggestions: usize,
    pub correction_mode: CorrectionMode,
    /// Predict from the previous word when auto-correction is on
    pub bigram_suggestions: bool,
    pub auto_text_enabled: bool,
    /// Words this long or longer are never stored
    pub max_word_length: usize,
    /// Main dictionary size (bytes) above which it drives auto-correction
    pub large_dictionary_threshold: usize,
    /// Key for learned words in persistent storage
    pub locale: String,
    pub auto_capitalize: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_suggestions: suggest::DEFAULT_MAX_SUGGESTIONS,
            correction_mode: CorrectionMode::Full,
            bigram_suggestions: true,
            auto_text_enabled: true,
            max_word_length: dictionary::MAX_WORD_LENGTH,
            large_dictionary_threshold: Suggest::LARGE_DICTIONARY_THRESHOLD,
            locale: "en_US".to_string(),
            auto_capitalize: true,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load_toml<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_toml<P: AsRef<std::path::Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration from TOML string.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string.
    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if !(1..=100).contains(&self.max_suggestions) {
            return Err(Error::InvalidArgument(format!(
                "max_suggestions must be within 1..=100, got {}",
                self.max_suggestions
            )));
        }
        if self.max_word_length < 2 {
            return Err(Error::InvalidArgument("max_word_length must be at least 2".to_string()));
        }
        Ok(())
    }

    // ========== Correction Settings ==========

    pub fn set_correction_mode(&mut self, mode: CorrectionMode) {
        self.correction_mode = mode;
    }

    pub fn get_correction_mode(&self) -> CorrectionMode {
        self.correction_mode
    }

    /// Toggle bigram predictions on/off.
    pub fn toggle_bigram_suggestions(&mut self) {
        self.bigram_suggestions = !self.bigram_suggestions;
    }

    pub fn set_max_suggestions(&mut self, max: usize) -> Result<()> {
        if !(1..=100).contains(&max) {
            return Err(Error::InvalidArgument(format!("max suggestions out of range: {}", max)));
        }
        self.max_suggestions = max;
        Ok(())
    }

    pub fn get_max_suggestions(&self) -> usize {
        self.max_suggestions
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_round_trip_through_toml() {
        let config = Config::default();
        let text = config.to_toml_string().unwrap();
        assert!(text.contains("max_suggestions = 12"));
        assert_eq!(Config::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = Config::from_toml_str("correction_mode = \"Basic\"\nlocale = \"de_DE\"").unwrap();
        assert_eq!(config.correction_mode, CorrectionMode::Basic);
        assert_eq!(config.locale, "de_DE");
        assert_eq!(config.max_suggestions, 12);
    }

    #[test]
    fn out_of_range_max_suggestions_is_rejected() {
        assert!(Config::from_toml_str("max_suggestions = 0").is_err());
        let mut config = Config::default();
        assert!(config.set_max_suggestions(101).is_err());
        config.set_max_suggestions(5).unwrap();
        assert_eq!(config.get_max_suggestions(), 5);
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyboard.toml");
        let mut config = Config::default();
        config.toggle_bigram_suggestions();
        config.save_toml(&path).unwrap();
        assert!(!Config::load_toml(&path).unwrap().bigram_suggestions);
    }
}
