//! Callbacks from the touch layer to the input method.

/// Receives the discrete key events produced by pointer tracking.
///
/// `on_press`/`on_release` bracket every key the finger enters, `on_key`
/// commits a code. Sliding across keys produces press/release pairs without
/// an `on_key` until the finger lifts.
pub trait KeyboardActionListener {
    fn on_press(&mut self, primary_code: i32);

    fn on_release(&mut self, primary_code: i32);

    /// A key was committed. `nearby` lists plausible codes for proximity
    /// correction, `primary_code` first when it is a letter.
    fn on_key(&mut self, primary_code: i32, nearby: &[i32], x: i32, y: i32);

    fn on_text(&mut self, text: &str);

    /// The finger was released outside any key.
    fn on_cancel(&mut self);

    fn swipe_left(&mut self) {}

    fn swipe_right(&mut self) {}

    fn swipe_up(&mut self) {}

    fn swipe_down(&mut self) {}

    /// The key was held for the long-press timeout. Returning true consumes
    /// the gesture: the key is not committed on release.
    fn on_long_press(&mut self, _primary_code: i32) -> bool {
        false
    }

    /// Longer long-press timeout while sliding off a held mode-change key.
    fn is_momentary_mode_switch(&self) -> bool {
        false
    }

    /// Number of pointers currently down, reported before each event.
    fn set_pointer_count(&mut self, _count: usize) {}
}
