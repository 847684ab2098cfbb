//! Recent-motion velocity for swipe disambiguation.
//!
//! Keeps the last few samples of the gesture within a short window and
//! averages their velocities relative to the oldest one. A fling whose
//! ending velocity is much lower than its overall velocity was a slow drag
//! that stopped, not a swipe.

use std::collections::VecDeque;

const NUM_PAST: usize = 4;
const LONGEST_PAST_TIME: u64 = 200;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    x: f32,
    y: f32,
    time: u64,
}

#[derive(Debug, Clone, Default)]
pub struct SwipeTracker {
    samples: VecDeque<Sample>,
    x_velocity: f32,
    y_velocity: f32,
}

impl SwipeTracker {
    pub fn new() -> Self {
        Self {
            samples: VecDeque::with_capacity(NUM_PAST),
            x_velocity: 0.0,
            y_velocity: 0.0,
        }
    }

    /// Start a new gesture.
    pub fn clear(&mut self) {
        self.samples.clear();
    }

    pub fn add_point(&mut self, x: f32, y: f32, time: u64) {
        while let Some(oldest) = self.samples.front() {
            if oldest.time + LONGEST_PAST_TIME >= time {
                break;
            }
            self.samples.pop_front();
        }
        if self.samples.len() >= NUM_PAST {
            self.samples.pop_front();
        }
        self.samples.push_back(Sample { x, y, time });
    }

    /// Compute velocities in pixels per `units` milliseconds, clamped to
    /// `max_velocity` in either direction.
    pub fn compute_current_velocity(&mut self, units: u32, max_velocity: f32) {
        let Some(&oldest) = self.samples.front() else {
            self.x_velocity = 0.0;
            self.y_velocity = 0.0;
            return;
        };
        let mut accum_x = 0.0f32;
        let mut accum_y = 0.0f32;
        for sample in self.samples.iter().skip(1) {
            let dur = sample.time.saturating_sub(oldest.time);
            if dur == 0 {
                continue;
            }
            let vel_x = (sample.x - oldest.x) / dur as f32 * units as f32;
            accum_x = if accum_x == 0.0 { vel_x } else { (accum_x + vel_x) * 0.5 };
            let vel_y = (sample.y - oldest.y) / dur as f32 * units as f32;
            accum_y = if accum_y == 0.0 { vel_y } else { (accum_y + vel_y) * 0.5 };
        }
        self.x_velocity = accum_x.clamp(-max_velocity, max_velocity);
        self.y_velocity = accum_y.clamp(-max_velocity, max_velocity);
    }

    pub fn x_velocity(&self) -> f32 {
        self.x_velocity
    }

    pub fn y_velocity(&self) -> f32 {
        self.y_velocity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn steady_motion_velocity() {
        let mut tracker = SwipeTracker::new();
        for i in 0..4u64 {
            tracker.add_point(i as f32 * 10.0, 0.0, i * 10);
        }
        tracker.compute_current_velocity(1000, f32::MAX);
        // 10 px every 10 ms
        assert!((tracker.x_velocity() - 1000.0).abs() < 0.01);
        assert_eq!(tracker.y_velocity(), 0.0);
    }

    #[test]
    fn old_samples_fall_out_of_the_window() {
        let mut tracker = SwipeTracker::new();
        tracker.add_point(0.0, 0.0, 0);
        tracker.add_point(100.0, 0.0, 10);
        // Finger rests, then moves slowly
        tracker.add_point(100.0, 0.0, 500);
        tracker.add_point(101.0, 0.0, 510);
        tracker.compute_current_velocity(1000, f32::MAX);
        assert!((tracker.x_velocity() - 100.0).abs() < 0.01);
    }

    #[test]
    fn velocity_is_clamped() {
        let mut tracker = SwipeTracker::new();
        tracker.add_point(0.0, 0.0, 0);
        tracker.add_point(0.0, -500.0, 1);
        tracker.compute_current_velocity(1000, 2000.0);
        assert_eq!(tracker.y_velocity(), -2000.0);
    }

    #[test]
    fn empty_tracker_has_no_velocity() {
        let mut tracker = SwipeTracker::new();
        tracker.compute_current_velocity(1000, f32::MAX);
        assert_eq!(tracker.x_velocity(), 0.0);
    }
}
