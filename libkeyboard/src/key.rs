//! Key geometry and keyboard layouts.
//!
//! A `Keyboard` is an immutable set of keys. Swapping layouts replaces the
//! whole `Arc<Keyboard>` held by the detector and the trackers.
//!
//! Layouts can be built in code (`Keyboard::from_rows`, `Keyboard::qwerty`)
//! or loaded from JSON:
//!
//! ```json
//! { "keys": [ { "codes": [113], "x": 0, "y": 0, "width": 40, "height": 60 } ] }
//! ```

use libkeyboard_core::keycodes;
use libkeyboard_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Axis-aligned key bounds in pixels. `x`/`y` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Squared distance from `(x, y)` to the nearest point of the rectangle.
    /// Zero for points inside.
    pub fn squared_distance_to_edge(&self, x: i32, y: i32) -> i32 {
        let edge_x = x.clamp(self.x, self.right());
        let edge_y = y.clamp(self.y, self.bottom());
        let dx = x - edge_x;
        let dy = y - edge_y;
        dx * dx + dy * dy
    }
}

/// One key of a layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Key {
    /// Primary code first, then the alternates cycled by multi-tap
    pub codes: Vec<i32>,
    #[serde(flatten)]
    pub rect: Rect,
    /// Re-emitted while held (delete, arrows)
    #[serde(default)]
    pub repeatable: bool,
    #[serde(default)]
    pub modifier: bool,
    /// Text committed instead of a key code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Key {
    pub fn new(codes: Vec<i32>, rect: Rect) -> Self {
        Self {
            codes,
            rect,
            repeatable: false,
            modifier: false,
            text: None,
            label: None,
        }
    }

    /// A key producing a single character.
    pub fn character(c: char, rect: Rect) -> Self {
        let mut key = Self::new(vec![c as i32], rect);
        key.label = Some(c.to_string());
        key
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(text.to_string());
        self
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    pub fn modifier(mut self) -> Self {
        self.modifier = true;
        self
    }

    pub fn primary_code(&self) -> i32 {
        self.codes.first().copied().unwrap_or(keycodes::NOT_A_KEY)
    }

    /// Shift and mode-change keys count as modifiers whatever the layout says.
    pub fn is_modifier(&self) -> bool {
        self.modifier || matches!(self.primary_code(), keycodes::SHIFT | keycodes::MODE_CHANGE)
    }

    pub fn squared_distance_to_edge(&self, x: i32, y: i32) -> i32 {
        self.rect.squared_distance_to_edge(x, y)
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        self.rect.contains(x, y)
    }
}

#[derive(Deserialize, Serialize)]
struct LayoutFile {
    keys: Vec<Key>,
}

/// An immutable key layout with its derived proximity threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct Keyboard {
    keys: Vec<Key>,
    width: i32,
    height: i32,
    proximity_threshold_sq: i32,
}

impl Keyboard {
    /// Scale from mean key size to proximity radius.
    pub const SEARCH_DISTANCE: f32 = 1.4;

    pub fn new(keys: Vec<Key>) -> Self {
        let width = keys.iter().map(|k| k.rect.right()).max().unwrap_or(0);
        let height = keys.iter().map(|k| k.rect.bottom()).max().unwrap_or(0);
        let proximity_threshold_sq = proximity_threshold_sq(&keys);
        Self {
            keys,
            width,
            height,
            proximity_threshold_sq,
        }
    }

    /// Build a staggered layout from rows of characters. Row `i` is shifted
    /// right by `i * key_width / 2`.
    pub fn from_rows(rows: &[&str], key_width: i32, key_height: i32) -> Self {
        let mut keys = Vec::new();
        for (row_index, row) in rows.iter().enumerate() {
            let y = row_index as i32 * key_height;
            let indent = row_index as i32 * key_width / 2;
            for (col, c) in row.chars().enumerate() {
                let rect = Rect::new(indent + col as i32 * key_width, y, key_width, key_height);
                keys.push(Key::character(c, rect));
            }
        }
        Self::new(keys)
    }

    /// A lowercase QWERTY layout with shift, delete, mode change, comma,
    /// space, period and enter.
    pub fn qwerty(key_width: i32, key_height: i32) -> Self {
        let mut keys = Self::from_rows(&["qwertyuiop", "asdfghjkl"], key_width, key_height).keys;

        let y = 2 * key_height;
        let shift = Rect::new(0, y, key_width * 3 / 2, key_height);
        keys.push(Key::new(vec![keycodes::SHIFT], shift).with_label("shift"));
        for (col, c) in "zxcvbnm".chars().enumerate() {
            let x = shift.right() + col as i32 * key_width;
            keys.push(Key::character(c, Rect::new(x, y, key_width, key_height)));
        }
        let delete_x = shift.right() + 7 * key_width;
        keys.push(
            Key::new(vec![keycodes::DELETE], Rect::new(delete_x, y, 10 * key_width - delete_x, key_height))
                .with_label("del")
                .repeatable(),
        );

        let y = 3 * key_height;
        let wide = key_width * 3 / 2;
        let mode = Rect::new(0, y, wide, key_height);
        let comma = Rect::new(mode.right(), y, key_width, key_height);
        let space = Rect::new(comma.right(), y, 5 * key_width, key_height);
        let period = Rect::new(space.right(), y, key_width, key_height);
        let enter = Rect::new(period.right(), y, 10 * key_width - period.right(), key_height);
        keys.push(Key::new(vec![keycodes::MODE_CHANGE], mode).with_label("?123"));
        keys.push(Key::character(',', comma));
        keys.push(Key::new(vec![keycodes::SPACE], space).with_label("space"));
        keys.push(Key::character('.', period));
        keys.push(Key::new(vec![keycodes::ENTER], enter).with_label("enter"));

        Self::new(keys)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        let layout: LayoutFile =
            serde_json::from_str(content).map_err(|e| Error::InvalidArgument(format!("invalid layout: {}", e)))?;
        if let Some(key) = layout.keys.iter().find(|k| k.codes.is_empty()) {
            return Err(Error::InvalidArgument(format!("key at {:?} has no codes", key.rect)));
        }
        Ok(Self::new(layout.keys))
    }

    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    pub fn to_json(&self) -> Result<String> {
        let layout = LayoutFile {
            keys: self.keys.clone(),
        };
        serde_json::to_string_pretty(&layout).map_err(|e| Error::InvalidArgument(format!("invalid layout: {}", e)))
    }

    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn key(&self, index: usize) -> Option<&Key> {
        self.keys.get(index)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn proximity_threshold_sq(&self) -> i32 {
        self.proximity_threshold_sq
    }

    /// Index of the first key whose primary code is `code`.
    pub fn find_code(&self, code: i32) -> Option<usize> {
        self.keys.iter().position(|k| k.primary_code() == code)
    }
}

fn proximity_threshold_sq(keys: &[Key]) -> i32 {
    if keys.is_empty() {
        return 0;
    }
    let sum: i64 = keys.iter().map(|k| k.rect.width.min(k.rect.height) as i64).sum();
    let threshold = (sum as f32 * Keyboard::SEARCH_DISTANCE / keys.len() as f32) as i32;
    threshold * threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edge_distance_is_zero_inside() {
        let rect = Rect::new(10, 10, 20, 20);
        assert_eq!(rect.squared_distance_to_edge(15, 25), 0);
        assert_eq!(rect.squared_distance_to_edge(5, 15), 25);
        assert_eq!(rect.squared_distance_to_edge(33, 34), 9 + 16);
    }

    #[test]
    fn threshold_uses_mean_short_side() {
        let keyboard = Keyboard::from_rows(&["ab"], 40, 60);
        // mean min(w, h) = 40, 40 * 1.4 = 56
        assert_eq!(keyboard.proximity_threshold_sq(), 56 * 56);
        assert_eq!(keyboard.width(), 80);
        assert_eq!(keyboard.height(), 60);
    }

    #[test]
    fn qwerty_has_special_keys() {
        let keyboard = Keyboard::qwerty(40, 60);
        let delete = keyboard.find_code(keycodes::DELETE).unwrap();
        assert!(keyboard.key(delete).unwrap().repeatable);
        let shift = keyboard.find_code(keycodes::SHIFT).unwrap();
        assert!(keyboard.key(shift).unwrap().is_modifier());
        assert_eq!(keyboard.width(), 400);
        assert_eq!(keyboard.height(), 240);
    }

    #[test]
    fn json_round_trip() {
        let keyboard = Keyboard::from_rows(&["qw"], 40, 60);
        let json = keyboard.to_json().unwrap();
        assert_eq!(Keyboard::from_json(&json).unwrap(), keyboard);
        assert!(Keyboard::from_json("{\"keys\":[{\"codes\":[],\"x\":0,\"y\":0,\"width\":1,\"height\":1}]}").is_err());
        assert!(Keyboard::from_json("not json").is_err());
    }
}
