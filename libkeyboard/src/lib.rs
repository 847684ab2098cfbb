//! # libkeyboard
//!
//! Touch layer of a predictive soft keyboard built on libkeyboard-core.
//!
//! Raw pointer samples go into a `TouchRouter`, which resolves keys with a
//! `KeyDetector`, runs one `PointerTracker` per finger and reports discrete
//! key events to a `KeyboardActionListener`. `KeyboardSession` is the
//! listener that feeds those events into the core `InputEngine`.

pub mod config;
pub mod key;
pub mod key_detector;
pub mod listener;
pub mod mode_switch;
pub mod pointer_queue;
pub mod pointer_tracker;
pub mod session;
pub mod swipe;
pub mod timer;
pub mod touch;

// Re-export engine components from core
pub use libkeyboard_core::{
    keycodes, AutoDictionary, BinaryDictionary, Config, CorrectionMode, DictionaryBuilder, EntryState, Error,
    FstEngine, InputEngine, RedbWordStore, Result, ShiftState, Suggest, Suggestion, UserBigramDictionary,
    UserDictionary, WordComposer,
};

pub use config::KeyboardConfig;
pub use key::{Key, Keyboard, Rect};
pub use key_detector::{KeyDetector, MiniKeyboardKeyDetector, ProximityKeyDetector, Resolved, MAX_NEARBY_KEYS};
pub use listener::KeyboardActionListener;
pub use mode_switch::{AutoModeSwitch, AutoModeSwitchState, ModifierKeyState};
pub use pointer_queue::PointerQueue;
pub use pointer_tracker::{PointerTracker, TimerEvent, Timings};
pub use session::KeyboardSession;
pub use swipe::SwipeTracker;
pub use timer::KeyTimer;
pub use touch::{SwipeDirection, TouchAction, TouchEvent, TouchRouter};
