//! Order in which active pointers went down.
//!
//! When a new finger lands, older fingers still resting on character keys
//! are released so their keys commit in order. Fingers on modifier keys stay
//! down to allow chording (shift + letter).

use crate::key_detector::KeyDetector;
use crate::listener::KeyboardActionListener;
use crate::pointer_tracker::PointerTracker;

/// Tracker ids in press order, oldest first.
#[derive(Debug, Clone, Default)]
pub struct PointerQueue {
    queue: Vec<usize>,
}

impl PointerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, id: usize) {
        self.queue.push(id);
    }

    pub fn remove(&mut self, id: usize) {
        self.queue.retain(|&queued| queued != id);
    }

    pub fn contains(&self, id: usize) -> bool {
        self.queue.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    pub fn ids(&self) -> &[usize] {
        &self.queue
    }

    /// Release non-modifier pointers pressed before `id`, at their last
    /// positions.
    pub fn release_all_pointers_older_than(
        &mut self,
        id: usize,
        time: u64,
        trackers: &mut [PointerTracker],
        detector: &dyn KeyDetector,
        listener: &mut dyn KeyboardActionListener,
    ) {
        if !self.contains(id) {
            return;
        }
        let mut pos = 0;
        while pos < self.queue.len() {
            let older = self.queue[pos];
            if older == id {
                break;
            }
            let Some(tracker) = trackers.get_mut(older) else {
                self.queue.remove(pos);
                continue;
            };
            if tracker.is_modifier() {
                pos += 1;
                continue;
            }
            let (x, y) = (tracker.last_x(), tracker.last_y());
            tracker.on_up_event(x, y, time, detector, listener);
            tracker.set_already_processed();
            self.queue.remove(pos);
        }
    }

    /// Release every pointer except `keep`, which becomes the only entry.
    pub fn release_all_pointers_except(
        &mut self,
        keep: Option<usize>,
        time: u64,
        trackers: &mut [PointerTracker],
        detector: &dyn KeyDetector,
        listener: &mut dyn KeyboardActionListener,
    ) {
        for &id in &self.queue {
            if Some(id) == keep {
                continue;
            }
            if let Some(tracker) = trackers.get_mut(id) {
                let (x, y) = (tracker.last_x(), tracker.last_y());
                tracker.on_up_event(x, y, time, detector, listener);
                tracker.set_already_processed();
            }
        }
        self.queue.clear();
        if let Some(id) = keep {
            self.queue.push(id);
        }
    }

    pub fn is_in_sliding_key_input(&self, trackers: &[PointerTracker]) -> bool {
        self.queue
            .iter()
            .filter_map(|&id| trackers.get(id))
            .any(PointerTracker::is_in_sliding_key_input)
    }
}
