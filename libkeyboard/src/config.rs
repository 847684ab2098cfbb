//! Keyboard configuration that extends the base `Config` from core.
//!
//! This configuration includes:
//! - All suggestion and learning options from `libkeyboard_core::Config`
//!   (flattened via serde)
//! - Key repeat, long-press and multi-tap timings in milliseconds
//! - Touch geometry: hysteresis, correction offsets, swipe threshold
//!
//! # Example
//!
//! ```rust
//! use libkeyboard::KeyboardConfig;
//!
//! let config = KeyboardConfig::from_toml_str("long_press_key_timeout_ms = 300\nmax_suggestions = 5").unwrap();
//! assert_eq!(config.long_press_key_timeout_ms, 300);
//! assert_eq!(config.base().max_suggestions, 5);
//! ```

use libkeyboard_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct KeyboardConfig {
    /// Suggestion, learning and locale settings
    #[serde(flatten)]
    pub base: libkeyboard_core::Config,

    pub delay_before_key_repeat_start_ms: u64,
    pub key_repeat_interval_ms: u64,
    pub long_press_key_timeout_ms: u64,
    /// Window in which re-pressing a multi-code key cycles its codes
    pub multi_tap_key_timeout_ms: u64,

    /// Pixels the finger may drift off a key before it counts as leaving it
    pub key_hysteresis_distance: f32,
    pub proximity_correction: bool,
    pub key_correction_offset_x: i32,
    pub key_correction_offset_y: i32,
    pub mini_keyboard_slide_allowance: f32,

    /// Minimum fling speed in pixels per second
    pub swipe_velocity_threshold: f32,
    /// Reject flings that slow down before the finger lifts
    pub disambiguate_swipe: bool,
    /// Panel reports each pointer separately
    pub has_distinct_multitouch: bool,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            base: libkeyboard_core::Config::default(),
            delay_before_key_repeat_start_ms: 400,
            key_repeat_interval_ms: 50,
            long_press_key_timeout_ms: 500,
            multi_tap_key_timeout_ms: 800,
            key_hysteresis_distance: 8.0,
            proximity_correction: true,
            key_correction_offset_x: 0,
            key_correction_offset_y: 0,
            mini_keyboard_slide_allowance: 20.0,
            swipe_velocity_threshold: 500.0,
            disambiguate_swipe: true,
            has_distinct_multitouch: true,
        }
    }
}

impl KeyboardConfig {
    /// Convert into the base config for use with `InputEngine::with_config()`
    pub fn into_base(self) -> libkeyboard_core::Config {
        self.base
    }

    pub fn base(&self) -> &libkeyboard_core::Config {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut libkeyboard_core::Config {
        &mut self.base
    }

    pub fn load_toml<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn save_toml<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: KeyboardConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        self.base.validate()?;
        if self.key_repeat_interval_ms == 0 {
            return Err(Error::InvalidArgument("key_repeat_interval_ms must be positive".to_string()));
        }
        if self.key_hysteresis_distance < 0.0 || self.swipe_velocity_threshold < 0.0 {
            return Err(Error::InvalidArgument(
                "distances and thresholds must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use libkeyboard_core::CorrectionMode;

    #[test]
    fn base_fields_are_flattened() {
        let text = KeyboardConfig::default().to_toml_string().unwrap();
        assert!(text.contains("max_suggestions = 12"));
        assert!(text.contains("key_repeat_interval_ms = 50"));
        assert!(!text.contains("[base]"));
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = KeyboardConfig::from_toml_str(
            "correction_mode = \"Basic\"\nhas_distinct_multitouch = false",
        )
        .unwrap();
        assert_eq!(config.base().correction_mode, CorrectionMode::Basic);
        assert!(!config.has_distinct_multitouch);
        assert_eq!(config.delay_before_key_repeat_start_ms, 400);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(KeyboardConfig::from_toml_str("key_repeat_interval_ms = 0").is_err());
        assert!(KeyboardConfig::from_toml_str("max_suggestions = 500").is_err());
    }

    #[test]
    fn file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("keyboard.toml");
        let mut config = KeyboardConfig::default();
        config.base_mut().locale = "fr_FR".to_string();
        config.save_toml(&path).unwrap();
        let loaded = KeyboardConfig::load_toml(&path).unwrap();
        assert_eq!(loaded, config);
        assert_eq!(loaded.into_base().locale, "fr_FR");
    }
}
