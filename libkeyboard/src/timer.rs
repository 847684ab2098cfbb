//! Cancelable deadlines for key repeat and long press.
//!
//! Timers run on the caller's clock: the owner polls `expire(now)` with
//! timestamps taken from touch events or its own tick. Starting an armed
//! timer replaces the old deadline, and cancelling an idle or already
//! expired timer does nothing.

/// A pending deadline bound to a key index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyTimer {
    pending: Option<(u64, usize)>,
}

impl KeyTimer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start(&mut self, deadline: u64, key: usize) {
        self.pending = Some((deadline, key));
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn deadline(&self) -> Option<u64> {
        self.pending.map(|(deadline, _)| deadline)
    }

    /// Disarm and return the key if the deadline has passed.
    pub fn expire(&mut self, now: u64) -> Option<(u64, usize)> {
        match self.pending {
            Some((deadline, key)) if deadline <= now => {
                self.pending = None;
                Some((deadline, key))
            }
            _ => None,
        }
    }
}
