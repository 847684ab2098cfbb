//! Per-pointer touch state machine.
//!
//! One `PointerTracker` follows one finger from down to up. It turns raw
//! positions into press/release pairs for every key the finger crosses and
//! commits a single key when the finger lifts. It also owns the finger's key
//! repeat and long-press timers and the multi-tap state that survives between
//! gestures.
//!
//! Timers are driven by the caller's clock through `fire_due_timers`.

use crate::config::KeyboardConfig;
use crate::key::{Key, Keyboard};
use crate::key_detector::KeyDetector;
use crate::listener::KeyboardActionListener;
use crate::timer::KeyTimer;
use libkeyboard_core::keycodes;
use std::sync::Arc;
use tracing::{debug, trace};

/// Timing parameters in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    pub delay_before_key_repeat_start: u64,
    pub key_repeat_interval: u64,
    pub long_press_key_timeout: u64,
    pub multi_tap_key_timeout: u64,
}

impl Default for Timings {
    fn default() -> Self {
        Self::from_config(&KeyboardConfig::default())
    }
}

impl Timings {
    pub fn from_config(config: &KeyboardConfig) -> Self {
        Self {
            delay_before_key_repeat_start: config.delay_before_key_repeat_start_ms,
            key_repeat_interval: config.key_repeat_interval_ms,
            long_press_key_timeout: config.long_press_key_timeout_ms,
            multi_tap_key_timeout: config.multi_tap_key_timeout_ms,
        }
    }
}

/// What a timer did when it fired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Repeated,
    /// The listener consumed the long press; the gesture is over.
    LongPressConsumed,
    LongPressIgnored,
}

/// Where the finger went down and which key it currently rests on.
#[derive(Debug, Clone, Copy, Default)]
struct KeyState {
    start_x: i32,
    start_y: i32,
    down_time: u64,
    key: Option<usize>,
    // Position where the current key was entered
    key_x: i32,
    key_y: i32,
    last_x: i32,
    last_y: i32,
}

impl KeyState {
    fn on_down(&mut self, x: i32, y: i32, time: u64, key: Option<usize>) {
        self.start_x = x;
        self.start_y = y;
        self.down_time = time;
        self.enter_key(key, x, y);
    }

    fn enter_key(&mut self, key: Option<usize>, x: i32, y: i32) {
        self.key = key;
        self.key_x = x;
        self.key_y = y;
        self.last_x = x;
        self.last_y = y;
    }

    fn track(&mut self, x: i32, y: i32) {
        self.last_x = x;
        self.last_y = y;
    }
}

#[derive(Debug, Clone)]
pub struct PointerTracker {
    id: usize,
    keyboard: Option<Arc<Keyboard>>,
    hysteresis_sq: i32,
    timings: Timings,
    state: KeyState,

    already_processed: bool,
    repeatable: bool,
    sliding: bool,

    repeat_timer: KeyTimer,
    long_press_timer: KeyTimer,

    // Multi-tap survives between gestures on the same key
    last_sent: Option<usize>,
    last_tap_time: Option<u64>,
    tap_count: Option<usize>,
    in_multi_tap: bool,
}

impl PointerTracker {
    pub fn new(id: usize, timings: Timings) -> Self {
        Self {
            id,
            keyboard: None,
            hysteresis_sq: 0,
            timings,
            state: KeyState::default(),
            already_processed: false,
            repeatable: false,
            sliding: false,
            repeat_timer: KeyTimer::new(),
            long_press_timer: KeyTimer::new(),
            last_sent: None,
            last_tap_time: None,
            tap_count: None,
            in_multi_tap: false,
        }
    }

    pub fn id(&self) -> usize {
        self.id
    }

    /// Install the layout this tracker resolves keys against. Must match the
    /// detector's layout.
    pub fn set_keyboard(&mut self, keyboard: Arc<Keyboard>, hysteresis_distance: f32) {
        self.keyboard = Some(keyboard);
        self.hysteresis_sq = (hysteresis_distance * hysteresis_distance) as i32;
        self.reset_multi_tap();
    }

    pub fn set_timings(&mut self, timings: Timings) {
        self.timings = timings;
    }

    // ========== State Queries ==========

    pub fn key_index(&self) -> Option<usize> {
        self.state.key
    }

    fn key(&self, index: Option<usize>) -> Option<&Key> {
        index.and_then(|i| self.keyboard.as_ref()?.key(i))
    }

    fn code_of(&self, index: usize) -> i32 {
        self.key(Some(index)).map(Key::primary_code).unwrap_or(keycodes::NOT_A_KEY)
    }

    /// Resting on a shift or mode-change key.
    pub fn is_modifier(&self) -> bool {
        self.key(self.state.key).is_some_and(Key::is_modifier)
    }

    pub fn is_on_modifier_key(&self, x: i32, y: i32, detector: &dyn KeyDetector) -> bool {
        self.key(detector.key_index(x, y)).is_some_and(Key::is_modifier)
    }

    pub fn is_in_sliding_key_input(&self) -> bool {
        self.sliding
    }

    pub fn is_repeating(&self) -> bool {
        self.repeat_timer.is_pending()
    }

    pub fn is_already_processed(&self) -> bool {
        self.already_processed
    }

    pub fn set_already_processed(&mut self) {
        self.already_processed = true;
    }

    pub fn last_x(&self) -> i32 {
        self.state.last_x
    }

    pub fn last_y(&self) -> i32 {
        self.state.last_y
    }

    pub fn start_position(&self) -> (i32, i32) {
        (self.state.start_x, self.state.start_y)
    }

    pub fn down_time(&self) -> u64 {
        self.state.down_time
    }

    /// Earliest pending timer deadline.
    pub fn next_deadline(&self) -> Option<u64> {
        match (self.repeat_timer.deadline(), self.long_press_timer.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn cancel_key_timers(&mut self) {
        self.repeat_timer.cancel();
        self.long_press_timer.cancel();
    }

    pub fn cancel_repeat(&mut self) {
        self.repeat_timer.cancel();
    }

    // ========== Touch Events ==========

    pub fn on_down_event(
        &mut self,
        x: i32,
        y: i32,
        time: u64,
        detector: &dyn KeyDetector,
        listener: &mut dyn KeyboardActionListener,
    ) {
        let key = detector.key_index(x, y);
        trace!(pointer = self.id, x, y, ?key, "down");
        self.state.on_down(x, y, time, key);
        self.already_processed = false;
        self.repeatable = false;
        self.sliding = false;
        self.check_multi_tap(time, key);

        let Some(index) = key else {
            return;
        };
        listener.on_press(self.code_of(index));
        if self.key(key).is_some_and(|k| k.repeatable) {
            self.repeat_key(index, detector, listener);
            self.repeat_timer
                .start(time + self.timings.delay_before_key_repeat_start, index);
            self.repeatable = true;
        }
        self.start_long_press_timer(index, time, listener);
    }

    pub fn on_move_event(
        &mut self,
        x: i32,
        y: i32,
        time: u64,
        detector: &dyn KeyDetector,
        listener: &mut dyn KeyboardActionListener,
    ) {
        if self.already_processed {
            return;
        }
        let old = self.state.key;
        let key = detector.key_index(x, y).filter(|&i| self.key(Some(i)).is_some());
        self.state.track(x, y);

        match key {
            Some(index) => {
                if old.is_none() {
                    listener.on_press(self.code_of(index));
                    self.state.enter_key(key, x, y);
                    self.start_long_press_timer(index, time, listener);
                } else if !self.is_minor_move_bounce(x, y, key) {
                    self.slide_off(old, listener);
                    listener.on_press(self.code_of(index));
                    self.state.enter_key(key, x, y);
                    self.start_long_press_timer(index, time, listener);
                }
            }
            None => {
                if old.is_some() && !self.is_minor_move_bounce(x, y, key) {
                    self.slide_off(old, listener);
                    self.state.enter_key(None, x, y);
                }
            }
        }
    }

    fn slide_off(&mut self, old: Option<usize>, listener: &mut dyn KeyboardActionListener) {
        self.sliding = true;
        if let Some(index) = old {
            listener.on_release(self.code_of(index));
        }
        self.reset_multi_tap();
        self.cancel_key_timers();
        self.repeatable = false;
        debug!(pointer = self.id, ?old, "slid off key");
    }

    pub fn on_up_event(
        &mut self,
        x: i32,
        y: i32,
        time: u64,
        detector: &dyn KeyDetector,
        listener: &mut dyn KeyboardActionListener,
    ) {
        trace!(pointer = self.id, x, y, "up");
        self.cancel_key_timers();
        self.sliding = false;
        if self.already_processed {
            return;
        }
        let mut key = detector.key_index(x, y);
        let (mut x, mut y) = (x, y);
        if self.is_minor_move_bounce(x, y, key) {
            key = self.state.key;
            x = self.state.key_x;
            y = self.state.key_y;
        }
        self.state.track(x, y);
        if !self.repeatable {
            self.detect_and_send_key(key, x, y, Some(time), detector, listener);
        }
    }

    pub fn on_cancel_event(&mut self) {
        trace!(pointer = self.id, "cancel");
        self.cancel_key_timers();
        self.sliding = false;
    }

    /// Fire every timer whose deadline is at or before `now`, oldest first.
    /// Repeats are rescheduled from their own deadline so a late poll
    /// catches up.
    pub fn fire_due_timers(
        &mut self,
        now: u64,
        detector: &dyn KeyDetector,
        listener: &mut dyn KeyboardActionListener,
    ) -> Vec<TimerEvent> {
        let mut events = Vec::new();
        while let Some(deadline) = self.next_deadline().filter(|&d| d <= now) {
            if self.long_press_timer.deadline() == Some(deadline) {
                if let Some((_, index)) = self.long_press_timer.expire(now) {
                    let event = self.long_press(index, listener);
                    events.push(event);
                    if event == TimerEvent::LongPressConsumed {
                        break;
                    }
                }
            } else if let Some((deadline, index)) = self.repeat_timer.expire(now) {
                self.repeat_key(index, detector, listener);
                // A zero interval would never advance past `now`
                let interval = self.timings.key_repeat_interval.max(1);
                self.repeat_timer.start(deadline + interval, index);
                events.push(TimerEvent::Repeated);
            }
        }
        events
    }

    fn long_press(&mut self, index: usize, listener: &mut dyn KeyboardActionListener) -> TimerEvent {
        if self.already_processed || self.state.key != Some(index) {
            return TimerEvent::LongPressIgnored;
        }
        if listener.on_long_press(self.code_of(index)) {
            debug!(pointer = self.id, key = index, "long press consumed");
            self.cancel_key_timers();
            self.already_processed = true;
            TimerEvent::LongPressConsumed
        } else {
            TimerEvent::LongPressIgnored
        }
    }

    fn start_long_press_timer(&mut self, index: usize, time: u64, listener: &dyn KeyboardActionListener) {
        let timeout = if listener.is_momentary_mode_switch() {
            self.timings.long_press_key_timeout * 3
        } else {
            self.timings.long_press_key_timeout
        };
        self.long_press_timer.start(time + timeout, index);
    }

    /// Re-send a held key from its top-left corner.
    pub fn repeat_key(&mut self, index: usize, detector: &dyn KeyDetector, listener: &mut dyn KeyboardActionListener) {
        let Some(rect) = self.key(Some(index)).map(|k| k.rect) else {
            return;
        };
        self.detect_and_send_key(Some(index), rect.x, rect.y, None, detector, listener);
    }

    // ========== Key Dispatch ==========

    fn is_minor_move_bounce(&self, x: i32, y: i32, new_key: Option<usize>) -> bool {
        if self.keyboard.is_none() {
            return false;
        }
        let current = self.state.key;
        if new_key == current {
            return true;
        }
        match self.key(current) {
            Some(key) => key.squared_distance_to_edge(x, y) < self.hysteresis_sq,
            None => false,
        }
    }

    fn detect_and_send_key(
        &mut self,
        index: Option<usize>,
        x: i32,
        y: i32,
        time: Option<u64>,
        detector: &dyn KeyDetector,
        listener: &mut dyn KeyboardActionListener,
    ) {
        let Some(keyboard) = self.keyboard.clone() else {
            listener.on_cancel();
            return;
        };
        let Some((index, key)) = index.and_then(|i| keyboard.key(i).map(|k| (i, k))) else {
            listener.on_cancel();
            return;
        };

        if let Some(text) = &key.text {
            listener.on_text(text);
            listener.on_release(0);
        } else {
            let mut code = key.primary_code();
            let mut nearby = detector.resolve(x, y).codes;
            if self.in_multi_tap {
                // Replace the character sent by the previous tap
                let tap = match self.tap_count {
                    Some(tap) => {
                        listener.on_key(keycodes::DELETE, &[keycodes::DELETE], x, y);
                        tap
                    }
                    None => {
                        self.tap_count = Some(0);
                        0
                    }
                };
                code = key.codes.get(tap).copied().unwrap_or(code);
            }
            if nearby.len() >= 2 && nearby[0] != code && nearby[1] == code {
                nearby.swap(0, 1);
            }
            listener.on_key(code, &nearby, x, y);
            listener.on_release(code);
        }
        self.last_sent = Some(index);
        self.last_tap_time = time;
    }

    // ========== Multi-tap ==========

    fn check_multi_tap(&mut self, time: u64, key: Option<usize>) {
        let Some(codes_len) = self.key(key).map(|k| k.codes.len()) else {
            return;
        };
        let is_multi_tap = key == self.last_sent
            && self
                .last_tap_time
                .is_some_and(|last| time < last + self.timings.multi_tap_key_timeout);
        if codes_len > 1 {
            self.in_multi_tap = true;
            self.tap_count = if is_multi_tap {
                Some((self.tap_count.unwrap_or(0) + 1) % codes_len)
            } else {
                None
            };
            return;
        }
        if !is_multi_tap {
            self.reset_multi_tap();
        }
    }

    fn reset_multi_tap(&mut self) {
        self.last_sent = None;
        self.tap_count = None;
        self.last_tap_time = None;
        self.in_multi_tap = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::Rect;
    use crate::key_detector::ProximityKeyDetector;

    #[derive(Debug, Default)]
    struct Recorder {
        events: Vec<String>,
        consume_long_press: bool,
    }

    impl KeyboardActionListener for Recorder {
        fn on_press(&mut self, code: i32) {
            self.events.push(format!("press {}", code));
        }
        fn on_release(&mut self, code: i32) {
            self.events.push(format!("release {}", code));
        }
        fn on_key(&mut self, code: i32, _nearby: &[i32], _x: i32, _y: i32) {
            self.events.push(format!("key {}", code));
        }
        fn on_text(&mut self, text: &str) {
            self.events.push(format!("text {}", text));
        }
        fn on_cancel(&mut self) {
            self.events.push("cancel".to_string());
        }
        fn on_long_press(&mut self, code: i32) -> bool {
            self.events.push(format!("long {}", code));
            self.consume_long_press
        }
    }

    // "a" at 0..40, "b" at 40..80, delete at 80..120, ".,?" at 120..160
    fn setup() -> (ProximityKeyDetector, PointerTracker) {
        let keys = vec![
            Key::character('a', Rect::new(0, 0, 40, 60)),
            Key::character('b', Rect::new(40, 0, 40, 60)),
            Key::new(vec![keycodes::DELETE], Rect::new(80, 0, 40, 60)).repeatable(),
            Key::new(vec!['.' as i32, ',' as i32, '?' as i32], Rect::new(120, 0, 40, 60)),
        ];
        let keyboard = Arc::new(Keyboard::new(keys));
        let mut detector = ProximityKeyDetector::new();
        detector.set_layout(keyboard.clone(), 0, 0);
        let mut tracker = PointerTracker::new(0, Timings::default());
        tracker.set_keyboard(keyboard, 8.0);
        (detector, tracker)
    }

    fn tap(tracker: &mut PointerTracker, detector: &ProximityKeyDetector, l: &mut Recorder, x: i32, t: u64) {
        tracker.on_down_event(x, 30, t, detector, l);
        tracker.on_up_event(x, 30, t + 50, detector, l);
    }

    #[test]
    fn tap_sends_press_key_release() {
        let (detector, mut tracker) = setup();
        let mut l = Recorder::default();
        tap(&mut tracker, &detector, &mut l, 20, 0);
        assert_eq!(l.events, vec!["press 97", "key 97", "release 97"]);
    }

    #[test]
    fn sliding_releases_old_key_and_sends_the_new_one() {
        let (detector, mut tracker) = setup();
        let mut l = Recorder::default();
        tracker.on_down_event(20, 30, 0, &detector, &mut l);
        tracker.on_move_event(60, 30, 10, &detector, &mut l);
        assert!(tracker.is_in_sliding_key_input());
        tracker.on_up_event(60, 30, 20, &detector, &mut l);
        assert!(!tracker.is_in_sliding_key_input());
        assert_eq!(l.events, vec!["press 97", "release 97", "press 98", "key 98", "release 98"]);
    }

    #[test]
    fn small_drift_stays_on_the_key() {
        let (detector, mut tracker) = setup();
        let mut l = Recorder::default();
        tracker.on_down_event(38, 30, 0, &detector, &mut l);
        // 4 px into "b" is within the 8 px hysteresis of "a"
        tracker.on_move_event(44, 30, 10, &detector, &mut l);
        tracker.on_up_event(44, 30, 20, &detector, &mut l);
        assert_eq!(l.events, vec!["press 97", "key 97", "release 97"]);
    }

    #[test]
    fn release_outside_any_key_cancels() {
        let (detector, mut tracker) = setup();
        let mut l = Recorder::default();
        tracker.on_down_event(20, 30, 0, &detector, &mut l);
        tracker.on_move_event(20, 400, 10, &detector, &mut l);
        tracker.on_up_event(20, 400, 20, &detector, &mut l);
        assert_eq!(l.events, vec!["press 97", "release 97", "cancel"]);
    }

    #[test]
    fn repeatable_key_repeats_until_release() {
        let (detector, mut tracker) = setup();
        let mut l = Recorder::default();
        tracker.on_down_event(100, 30, 0, &detector, &mut l);
        assert!(tracker.is_repeating());
        // 400 ms delay then every 50 ms: repeats at 400, 450, 500
        let events = tracker.fire_due_timers(510, &detector, &mut l);
        assert_eq!(events.iter().filter(|e| **e == TimerEvent::Repeated).count(), 3);
        tracker.on_up_event(100, 30, 520, &detector, &mut l);
        assert!(!tracker.is_repeating());
        let deletes = l.events.iter().filter(|e| *e == "key -5").count();
        // One immediate send plus three repeats, none on release
        assert_eq!(deletes, 4);
        assert!(tracker.fire_due_timers(2000, &detector, &mut l).is_empty());
    }

    #[test]
    fn zero_repeat_interval_still_advances() {
        let (detector, mut tracker) = setup();
        let mut l = Recorder::default();
        tracker.set_timings(Timings {
            key_repeat_interval: 0,
            ..Timings::default()
        });
        tracker.on_down_event(100, 30, 0, &detector, &mut l);
        // Treated as 1 ms: repeats at 400, 401, 402 and 403
        let events = tracker.fire_due_timers(403, &detector, &mut l);
        assert_eq!(events.len(), 4);
        assert_eq!(tracker.next_deadline(), Some(404));
    }

    #[test]
    fn multi_tap_cycles_codes() {
        let (detector, mut tracker) = setup();
        let mut l = Recorder::default();
        tap(&mut tracker, &detector, &mut l, 140, 0);
        tap(&mut tracker, &detector, &mut l, 140, 200);
        tap(&mut tracker, &detector, &mut l, 140, 400);
        let keys: Vec<&str> = l.events.iter().filter(|e| e.starts_with("key")).map(String::as_str).collect();
        assert_eq!(keys, vec!["key 46", "key -5", "key 44", "key -5", "key 63"]);
    }

    #[test]
    fn multi_tap_restarts_after_timeout() {
        let (detector, mut tracker) = setup();
        let mut l = Recorder::default();
        tap(&mut tracker, &detector, &mut l, 140, 0);
        tap(&mut tracker, &detector, &mut l, 140, 2000);
        let keys: Vec<&str> = l.events.iter().filter(|e| e.starts_with("key")).map(String::as_str).collect();
        assert_eq!(keys, vec!["key 46", "key 46"]);
    }

    #[test]
    fn consumed_long_press_suppresses_the_key() {
        let (detector, mut tracker) = setup();
        let mut l = Recorder {
            consume_long_press: true,
            ..Recorder::default()
        };
        tracker.on_down_event(20, 30, 0, &detector, &mut l);
        assert!(tracker.fire_due_timers(499, &detector, &mut l).is_empty());
        assert_eq!(
            tracker.fire_due_timers(500, &detector, &mut l),
            vec![TimerEvent::LongPressConsumed]
        );
        assert!(tracker.is_already_processed());
        tracker.on_up_event(20, 30, 600, &detector, &mut l);
        assert_eq!(l.events, vec!["press 97", "long 97"]);
    }

    #[test]
    fn ignored_long_press_still_sends_the_key() {
        let (detector, mut tracker) = setup();
        let mut l = Recorder::default();
        tracker.on_down_event(20, 30, 0, &detector, &mut l);
        tracker.fire_due_timers(600, &detector, &mut l);
        tracker.on_up_event(20, 30, 700, &detector, &mut l);
        assert_eq!(l.events, vec!["press 97", "long 97", "key 97", "release 97"]);
    }

    #[test]
    fn late_timer_after_up_is_a_no_op() {
        let (detector, mut tracker) = setup();
        let mut l = Recorder::default();
        tap(&mut tracker, &detector, &mut l, 20, 0);
        assert!(tracker.fire_due_timers(10_000, &detector, &mut l).is_empty());
        assert_eq!(l.events.len(), 3);
    }

    #[test]
    fn text_key_sends_text() {
        let keys = vec![Key::new(vec![-100], Rect::new(0, 0, 80, 60)).with_text(".com")];
        let keyboard = Arc::new(Keyboard::new(keys));
        let mut detector = ProximityKeyDetector::new();
        detector.set_layout(keyboard.clone(), 0, 0);
        let mut tracker = PointerTracker::new(0, Timings::default());
        tracker.set_keyboard(keyboard, 8.0);
        let mut l = Recorder::default();
        tap(&mut tracker, &detector, &mut l, 20, 0);
        assert_eq!(l.events, vec!["press -100", "text .com", "release 0"]);
    }
}
