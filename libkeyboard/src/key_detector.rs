//! Touch point to key resolution.
//!
//! `ProximityKeyDetector` serves the main keyboard: it returns the key under
//! the finger (or the closest one within the proximity radius) together with
//! the codes of every key close enough to be a plausible intended target.
//! `MiniKeyboardKeyDetector` serves popup keyboards, where the finger slides
//! from the parent key and only the nearest key matters.
//!
//! Both are pure with respect to their layout: resolving the same point twice
//! yields the same result.

use crate::key::Keyboard;
use std::sync::Arc;

/// Upper bound on nearby codes reported for one touch.
pub const MAX_NEARBY_KEYS: usize = 12;

/// Result of resolving one touch point.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Resolved {
    /// Index of the chosen key in the layout
    pub key: Option<usize>,
    /// Codes of plausible keys ordered by distance, nearest first
    pub codes: Vec<i32>,
}

pub trait KeyDetector {
    /// Install a layout. The offsets are added to every touch point before
    /// resolution.
    fn set_layout(&mut self, keyboard: Arc<Keyboard>, offset_x: i32, offset_y: i32);

    fn keyboard(&self) -> Option<&Arc<Keyboard>>;

    fn resolve(&self, x: i32, y: i32) -> Resolved;

    fn key_index(&self, x: i32, y: i32) -> Option<usize> {
        self.resolve(x, y).key
    }
}

/// Main keyboard detector with proximity correction.
#[derive(Debug, Clone)]
pub struct ProximityKeyDetector {
    keyboard: Option<Arc<Keyboard>>,
    offset_x: i32,
    offset_y: i32,
    proximity_correction: bool,
}

impl Default for ProximityKeyDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ProximityKeyDetector {
    pub fn new() -> Self {
        Self {
            keyboard: None,
            offset_x: 0,
            offset_y: 0,
            proximity_correction: true,
        }
    }

    /// With correction off only the key under the finger is reported.
    pub fn set_proximity_correction(&mut self, enabled: bool) {
        self.proximity_correction = enabled;
    }

    pub fn is_proximity_correction_enabled(&self) -> bool {
        self.proximity_correction
    }
}

impl KeyDetector for ProximityKeyDetector {
    fn set_layout(&mut self, keyboard: Arc<Keyboard>, offset_x: i32, offset_y: i32) {
        self.keyboard = Some(keyboard);
        self.offset_x = offset_x;
        self.offset_y = offset_y;
    }

    fn keyboard(&self) -> Option<&Arc<Keyboard>> {
        self.keyboard.as_ref()
    }

    fn resolve(&self, x: i32, y: i32) -> Resolved {
        let Some(keyboard) = &self.keyboard else {
            return Resolved::default();
        };
        let touch_x = x + self.offset_x;
        let touch_y = y + self.offset_y;
        let threshold = keyboard.proximity_threshold_sq();

        let mut primary = None;
        let mut closest = None;
        let mut closest_dist = threshold + 1;
        // (distance, code) kept sorted by distance, stable for equal distances
        let mut nearby: Vec<(i32, i32)> = Vec::with_capacity(MAX_NEARBY_KEYS);

        for (index, key) in keyboard.keys().iter().enumerate() {
            let inside = key.contains(touch_x, touch_y);
            if inside {
                primary = Some(index);
            }
            let dist = key.squared_distance_to_edge(touch_x, touch_y);
            if !(inside || (self.proximity_correction && dist < threshold)) {
                continue;
            }
            if dist < closest_dist {
                closest_dist = dist;
                closest = Some(index);
            }
            // Space and function keys never take part in correction.
            if key.primary_code() <= 32 {
                continue;
            }
            let at = nearby.partition_point(|&(d, _)| d <= dist);
            for (offset, &code) in key.codes.iter().enumerate() {
                nearby.insert(at + offset, (dist, code));
            }
            nearby.truncate(MAX_NEARBY_KEYS);
        }

        Resolved {
            key: primary.or(closest),
            codes: nearby.into_iter().map(|(_, code)| code).collect(),
        }
    }
}

/// Detector for popup keyboards: nearest key by edge distance within the
/// slide allowance. Above the popup the allowance doubles.
#[derive(Debug, Clone)]
pub struct MiniKeyboardKeyDetector {
    keyboard: Option<Arc<Keyboard>>,
    offset_x: i32,
    offset_y: i32,
    slide_allowance_sq: i32,
    slide_allowance_sq_top: i32,
}

impl MiniKeyboardKeyDetector {
    pub fn new(slide_allowance: f32) -> Self {
        let slide_allowance_sq = (slide_allowance * slide_allowance) as i32;
        Self {
            keyboard: None,
            offset_x: 0,
            offset_y: 0,
            slide_allowance_sq,
            slide_allowance_sq_top: slide_allowance_sq * 2,
        }
    }
}

impl KeyDetector for MiniKeyboardKeyDetector {
    fn set_layout(&mut self, keyboard: Arc<Keyboard>, offset_x: i32, offset_y: i32) {
        self.keyboard = Some(keyboard);
        self.offset_x = offset_x;
        self.offset_y = offset_y;
    }

    fn keyboard(&self) -> Option<&Arc<Keyboard>> {
        self.keyboard.as_ref()
    }

    fn resolve(&self, x: i32, y: i32) -> Resolved {
        let Some(keyboard) = &self.keyboard else {
            return Resolved::default();
        };
        let touch_x = x + self.offset_x;
        let touch_y = y + self.offset_y;
        let mut closest = None;
        let mut closest_dist = if y < 0 {
            self.slide_allowance_sq_top
        } else {
            self.slide_allowance_sq
        };
        for (index, key) in keyboard.keys().iter().enumerate() {
            let dist = key.squared_distance_to_edge(touch_x, touch_y);
            if dist < closest_dist {
                closest = Some(index);
                closest_dist = dist;
            }
        }
        let codes = closest
            .and_then(|i| keyboard.key(i))
            .map(|k| vec![k.primary_code()])
            .unwrap_or_default();
        Resolved { key: closest, codes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::{Key, Rect};
    use libkeyboard_core::keycodes;
    use proptest::prelude::*;

    fn detector(keyboard: Keyboard) -> ProximityKeyDetector {
        let mut detector = ProximityKeyDetector::new();
        detector.set_layout(Arc::new(keyboard), 0, 0);
        detector
    }

    fn code(c: char) -> i32 {
        c as i32
    }

    #[test]
    fn empty_layout_yields_no_key() {
        let detector = detector(Keyboard::new(Vec::new()));
        assert_eq!(detector.resolve(10, 10), Resolved::default());
        assert_eq!(ProximityKeyDetector::new().key_index(0, 0), None);
    }

    #[test]
    fn key_under_finger_comes_first() {
        let detector = detector(Keyboard::from_rows(&["qwe"], 40, 60));
        let resolved = detector.resolve(50, 30);
        assert_eq!(resolved.key, Some(1));
        assert_eq!(resolved.codes[0], code('w'));
        assert!(resolved.codes.contains(&code('q')));
        assert!(resolved.codes.contains(&code('e')));
    }

    #[test]
    fn nearby_codes_are_ordered_by_distance() {
        let detector = detector(Keyboard::from_rows(&["qwe"], 40, 60));
        // 3 px into 'q', 37 px from 'w', 77 px from 'e'
        let resolved = detector.resolve(3, 30);
        assert_eq!(resolved.codes, vec![code('q'), code('w')]);
    }

    #[test]
    fn disabled_correction_reports_only_the_key_hit() {
        let mut detector = detector(Keyboard::from_rows(&["qwe"], 40, 60));
        detector.set_proximity_correction(false);
        assert_eq!(detector.resolve(50, 30).codes, vec![code('w')]);
        // Outside every key: nothing
        assert_eq!(detector.resolve(50, 100).key, None);
    }

    #[test]
    fn closest_key_is_chosen_outside_the_layout() {
        let detector = detector(Keyboard::from_rows(&["qwe"], 40, 60));
        let resolved = detector.resolve(50, 70);
        assert_eq!(resolved.key, Some(1));
    }

    #[test]
    fn offsets_shift_the_touch_point() {
        let mut detector = ProximityKeyDetector::new();
        detector.set_layout(Arc::new(Keyboard::from_rows(&["qwe"], 40, 60)), 40, 0);
        assert_eq!(detector.key_index(10, 30), Some(1));
    }

    #[test]
    fn function_keys_are_not_nearby_codes() {
        let keys = vec![
            Key::character('a', Rect::new(0, 0, 40, 60)),
            Key::new(vec![keycodes::SPACE], Rect::new(40, 0, 40, 60)),
        ];
        let detector = detector(Keyboard::new(keys));
        let resolved = detector.resolve(50, 30);
        assert_eq!(resolved.key, Some(1));
        assert_eq!(resolved.codes, vec![code('a')]);
    }

    #[test]
    fn nearby_codes_are_capped() {
        // Twenty overlapping keys all under the finger
        let keys = ('a'..='t')
            .enumerate()
            .map(|(i, c)| Key::character(c, Rect::new(i as i32, 0, 40, 60)))
            .collect();
        let detector = detector(Keyboard::new(keys));
        let resolved = detector.resolve(30, 30);
        assert_eq!(resolved.codes.len(), MAX_NEARBY_KEYS);
        assert_eq!(resolved.codes[0], code('a'));
    }

    #[test]
    fn mini_keyboard_picks_nearest_within_allowance() {
        let mut mini = MiniKeyboardKeyDetector::new(20.0);
        mini.set_layout(Arc::new(Keyboard::from_rows(&["eéè"], 40, 60)), 0, 0);
        let resolved = mini.resolve(95, 30);
        assert_eq!(resolved.key, Some(2));
        assert_eq!(resolved.codes, vec![code('è')]);
        // 25 px below: 625 > 400
        assert_eq!(mini.key_index(60, 85), None);
        // 25 px above: allowance doubles to 800
        assert_eq!(mini.key_index(60, -25), Some(1));
    }

    proptest! {
        #[test]
        fn resolution_is_repeatable(x in -50i32..450, y in -50i32..300) {
            let detector = detector(Keyboard::qwerty(40, 60));
            let first = detector.resolve(x, y);
            prop_assert_eq!(&first, &detector.resolve(x, y));
            prop_assert!(first.codes.len() <= MAX_NEARBY_KEYS);
        }
    }
}
