//! Routes raw touch events to pointer trackers.
//!
//! The router owns the key detector, one `PointerTracker` per pointer id and
//! the press-order queue. It handles what no single tracker can see:
//! - panels without distinct multitouch, whose two-finger sequences are
//!   serialized into down/up pairs on pointer 0
//! - key repeat, which ignores moves and stops once a second finger lands
//! - fling gestures, which become swipe callbacks instead of key presses
//!
//! Timers are polled from event timestamps: every event first fires the
//! timers due at its time. Call `advance_time` to fire them between events.

use crate::config::KeyboardConfig;
use crate::key::Keyboard;
use crate::key_detector::{KeyDetector, ProximityKeyDetector};
use crate::listener::KeyboardActionListener;
use crate::pointer_queue::PointerQueue;
use crate::pointer_tracker::{PointerTracker, TimerEvent, Timings};
use crate::swipe::SwipeTracker;
use std::sync::Arc;
use tracing::{debug, trace_span, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchAction {
    Down,
    Move,
    Up,
    Cancel,
}

/// One pointer sample. Time is in milliseconds on any monotonic clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TouchEvent {
    pub action: TouchAction,
    pub pointer_id: usize,
    pub x: i32,
    pub y: i32,
    pub time: u64,
}

impl TouchEvent {
    pub fn new(action: TouchAction, pointer_id: usize, x: i32, y: i32, time: u64) -> Self {
        Self {
            action,
            pointer_id,
            x,
            y,
            time,
        }
    }

    pub fn down(pointer_id: usize, x: i32, y: i32, time: u64) -> Self {
        Self::new(TouchAction::Down, pointer_id, x, y, time)
    }

    pub fn moved(pointer_id: usize, x: i32, y: i32, time: u64) -> Self {
        Self::new(TouchAction::Move, pointer_id, x, y, time)
    }

    pub fn up(pointer_id: usize, x: i32, y: i32, time: u64) -> Self {
        Self::new(TouchAction::Up, pointer_id, x, y, time)
    }

    pub fn cancel(pointer_id: usize, x: i32, y: i32, time: u64) -> Self {
        Self::new(TouchAction::Cancel, pointer_id, x, y, time)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeDirection {
    Left,
    Right,
    Up,
    Down,
}

/// A single-finger gesture that may still turn out to be a fling.
#[derive(Debug, Clone, Copy)]
struct FlingCandidate {
    pointer_id: usize,
    x: i32,
    y: i32,
    time: u64,
}

pub struct TouchRouter<L: KeyboardActionListener> {
    listener: L,
    keyboard: Arc<Keyboard>,
    detector: ProximityKeyDetector,
    trackers: Vec<PointerTracker>,
    queue: PointerQueue,
    swipe: SwipeTracker,
    fling: Option<FlingCandidate>,
    // Pointer ids currently touching, in press order
    active: Vec<usize>,
    old_pointer_count: usize,

    timings: Timings,
    hysteresis_distance: f32,
    offset_x: i32,
    offset_y: i32,
    distinct_multitouch: bool,
    swipe_threshold: f32,
    disambiguate_swipe: bool,
}

impl<L: KeyboardActionListener> TouchRouter<L> {
    pub fn new(keyboard: Arc<Keyboard>, config: &KeyboardConfig, listener: L) -> Self {
        let mut detector = ProximityKeyDetector::new();
        detector.set_proximity_correction(config.proximity_correction);
        detector.set_layout(
            keyboard.clone(),
            config.key_correction_offset_x,
            config.key_correction_offset_y,
        );
        Self {
            listener,
            keyboard,
            detector,
            trackers: Vec::new(),
            queue: PointerQueue::new(),
            swipe: SwipeTracker::new(),
            fling: None,
            active: Vec::new(),
            old_pointer_count: 1,
            timings: Timings::from_config(config),
            hysteresis_distance: config.key_hysteresis_distance,
            offset_x: config.key_correction_offset_x,
            offset_y: config.key_correction_offset_y,
            distinct_multitouch: config.has_distinct_multitouch,
            swipe_threshold: config.swipe_velocity_threshold,
            disambiguate_swipe: config.disambiguate_swipe,
        }
    }

    // ========== Accessors ==========

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn into_listener(self) -> L {
        self.listener
    }

    pub fn keyboard(&self) -> &Arc<Keyboard> {
        &self.keyboard
    }

    pub fn detector(&self) -> &ProximityKeyDetector {
        &self.detector
    }

    pub fn tracker(&self, pointer_id: usize) -> Option<&PointerTracker> {
        self.trackers.get(pointer_id)
    }

    pub fn pointer_count(&self) -> usize {
        self.active.len()
    }

    pub fn is_in_sliding_key_input(&self) -> bool {
        self.queue.is_in_sliding_key_input(&self.trackers)
    }

    pub fn is_in_key_repeat(&self) -> bool {
        self.trackers.iter().any(PointerTracker::is_repeating)
    }

    /// Earliest pending timer across all pointers.
    pub fn next_deadline(&self) -> Option<u64> {
        self.trackers.iter().filter_map(PointerTracker::next_deadline).min()
    }

    /// Swap the layout. Pending timers are dropped.
    pub fn set_keyboard(&mut self, keyboard: Arc<Keyboard>) {
        self.detector
            .set_layout(keyboard.clone(), self.offset_x, self.offset_y);
        for tracker in &mut self.trackers {
            tracker.cancel_key_timers();
            tracker.set_keyboard(keyboard.clone(), self.hysteresis_distance);
        }
        self.keyboard = keyboard;
    }

    fn ensure_tracker(&mut self, pointer_id: usize) {
        while self.trackers.len() <= pointer_id {
            let mut tracker = PointerTracker::new(self.trackers.len(), self.timings);
            tracker.set_keyboard(self.keyboard.clone(), self.hysteresis_distance);
            self.trackers.push(tracker);
        }
    }

    // ========== Timers ==========

    /// Fire every timer due at `now`.
    pub fn advance_time(&mut self, now: u64) -> Vec<TimerEvent> {
        let mut fired = Vec::new();
        for tracker in &mut self.trackers {
            let events = tracker.fire_due_timers(now, &self.detector, &mut self.listener);
            if events.contains(&TimerEvent::LongPressConsumed) {
                self.queue.remove(tracker.id());
            }
            fired.extend(events);
        }
        fired
    }

    // ========== Event Dispatch ==========

    pub fn on_touch_event(&mut self, event: TouchEvent) {
        let _span = trace_span!("touch", pointer = event.pointer_id, action = ?event.action).entered();
        self.advance_time(event.time);

        let id = event.pointer_id;
        let pointer_count = match event.action {
            TouchAction::Down => {
                if !self.active.contains(&id) {
                    self.active.push(id);
                }
                self.active.len()
            }
            TouchAction::Move => self.active.len().max(1),
            TouchAction::Up | TouchAction::Cancel => {
                // The lifting pointer still counts for this event
                let count = self.active.len().max(1);
                self.active.retain(|&active| active != id);
                count
            }
        };
        let old_pointer_count = std::mem::replace(&mut self.old_pointer_count, pointer_count);
        self.listener.set_pointer_count(pointer_count);

        if !self.distinct_multitouch && pointer_count > 1 && old_pointer_count > 1 {
            return;
        }

        if self.track_fling(&event, pointer_count) {
            return;
        }

        let tracker_id = if self.distinct_multitouch { id } else { 0 };
        self.ensure_tracker(tracker_id);

        if self.is_in_key_repeat() {
            if event.action == TouchAction::Move {
                return;
            }
            let holds_modifier = self.trackers[tracker_id].is_modifier();
            if pointer_count > 1 && !holds_modifier {
                for tracker in &mut self.trackers {
                    tracker.cancel_repeat();
                }
            }
        }

        if self.distinct_multitouch {
            self.dispatch_distinct(event);
        } else {
            self.dispatch_serialized(event, pointer_count, old_pointer_count);
        }
    }

    /// Feed the swipe tracker and report a fling when the finger lifts.
    fn track_fling(&mut self, event: &TouchEvent, pointer_count: usize) -> bool {
        match event.action {
            TouchAction::Down => {
                self.swipe.clear();
                self.fling = (pointer_count == 1).then_some(FlingCandidate {
                    pointer_id: event.pointer_id,
                    x: event.x,
                    y: event.y,
                    time: event.time,
                });
                false
            }
            TouchAction::Move => {
                self.swipe.add_point(event.x as f32, event.y as f32, event.time);
                false
            }
            TouchAction::Cancel => {
                self.fling = None;
                false
            }
            TouchAction::Up => {
                self.swipe.add_point(event.x as f32, event.y as f32, event.time);
                let Some(start) = self.fling.take() else {
                    return false;
                };
                if start.pointer_id != event.pointer_id || pointer_count != 1 {
                    return false;
                }
                let Some(direction) = self.detect_fling(&start, event) else {
                    return false;
                };
                debug!(?direction, "swipe");
                let tracker_id = if self.distinct_multitouch { event.pointer_id } else { 0 };
                if let Some(tracker) = self.trackers.get_mut(tracker_id) {
                    tracker.on_cancel_event();
                    tracker.set_already_processed();
                }
                self.queue.remove(tracker_id);
                match direction {
                    SwipeDirection::Left => self.listener.swipe_left(),
                    SwipeDirection::Right => self.listener.swipe_right(),
                    SwipeDirection::Up => self.listener.swipe_up(),
                    SwipeDirection::Down => self.listener.swipe_down(),
                }
                true
            }
        }
    }

    fn detect_fling(&mut self, start: &FlingCandidate, end: &TouchEvent) -> Option<SwipeDirection> {
        let duration = end.time.saturating_sub(start.time).max(1) as f32;
        let delta_x = (end.x - start.x) as f32;
        let delta_y = (end.y - start.y) as f32;
        // Whole-gesture velocity in px/s
        let velocity_x = delta_x / duration * 1000.0;
        let velocity_y = delta_y / duration * 1000.0;
        let abs_x = velocity_x.abs();
        let abs_y = velocity_y.abs();
        let travel_x = self.keyboard.width() as f32 / 2.0;
        let travel_y = self.keyboard.height() as f32 / 2.0;

        self.swipe.compute_current_velocity(1000, f32::MAX);
        let ending_x = self.swipe.x_velocity();
        let ending_y = self.swipe.y_velocity();
        let sustained = |ending: f32, velocity: f32, positive: bool| {
            !self.disambiguate_swipe || if positive { ending >= velocity / 4.0 } else { ending <= velocity / 4.0 }
        };

        let threshold = self.swipe_threshold;
        if velocity_x > threshold && abs_y < abs_x && delta_x > travel_x {
            return sustained(ending_x, velocity_x, true).then_some(SwipeDirection::Right);
        }
        if velocity_x < -threshold && abs_y < abs_x && delta_x < -travel_x {
            return sustained(ending_x, velocity_x, false).then_some(SwipeDirection::Left);
        }
        if velocity_y < -threshold && abs_x < abs_y && delta_y < -travel_y {
            return sustained(ending_y, velocity_y, false).then_some(SwipeDirection::Up);
        }
        if velocity_y > threshold && abs_x < abs_y / 2.0 && delta_y > travel_y {
            return sustained(ending_y, velocity_y, true).then_some(SwipeDirection::Down);
        }
        None
    }

    fn dispatch_distinct(&mut self, event: TouchEvent) {
        let TouchEvent { x, y, time, .. } = event;
        let id = event.pointer_id;
        let listener: &mut dyn KeyboardActionListener = &mut self.listener;
        match event.action {
            TouchAction::Move => {
                self.trackers[id].on_move_event(x, y, time, &self.detector, listener);
            }
            TouchAction::Down => {
                if self.trackers[id].is_on_modifier_key(x, y, &self.detector) {
                    // A modifier press releases everything already down
                    self.queue
                        .release_all_pointers_except(None, time, &mut self.trackers, &self.detector, listener);
                }
                self.trackers[id].on_down_event(x, y, time, &self.detector, listener);
                self.queue.add(id);
            }
            TouchAction::Up => {
                if self.trackers[id].is_modifier() {
                    self.queue
                        .release_all_pointers_except(Some(id), time, &mut self.trackers, &self.detector, listener);
                } else if self.queue.contains(id) {
                    self.queue
                        .release_all_pointers_older_than(id, time, &mut self.trackers, &self.detector, listener);
                } else {
                    warn!(pointer = id, "up event for a pointer not in the queue");
                }
                self.trackers[id].on_up_event(x, y, time, &self.detector, listener);
                self.queue.remove(id);
            }
            TouchAction::Cancel => {
                self.trackers[id].on_cancel_event();
                self.queue.remove(id);
            }
        }
    }

    /// Serialize multi-finger input onto pointer 0.
    fn dispatch_serialized(&mut self, event: TouchEvent, pointer_count: usize, old_pointer_count: usize) {
        let TouchEvent { x, y, time, .. } = event;
        let detector = &self.detector;
        let listener: &mut dyn KeyboardActionListener = &mut self.listener;
        let tracker = &mut self.trackers[0];
        match (pointer_count, old_pointer_count) {
            (1, 2) => {
                // Back to one finger: it starts a new press where it is
                tracker.on_down_event(x, y, time, detector, listener);
                if event.action == TouchAction::Up {
                    tracker.on_up_event(x, y, time, detector, listener);
                }
            }
            (2, 1) => {
                // A second finger landed: finish the first press
                let (last_x, last_y) = (tracker.last_x(), tracker.last_y());
                tracker.on_up_event(last_x, last_y, time, detector, listener);
            }
            (1, _) => match event.action {
                TouchAction::Down => tracker.on_down_event(x, y, time, detector, listener),
                TouchAction::Move => tracker.on_move_event(x, y, time, detector, listener),
                TouchAction::Up => tracker.on_up_event(x, y, time, detector, listener),
                TouchAction::Cancel => tracker.on_cancel_event(),
            },
            _ => warn!(pointer_count, old_pointer_count, "unexpected pointer count transition"),
        }
    }
}
