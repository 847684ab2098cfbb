//! Bridges the touch layer to the input engine.
//!
//! `KeyboardSession` is the `KeyboardActionListener` a keyboard view installs
//! on its `TouchRouter`. Letters, separators and delete go to `InputEngine`.
//! Shift and mode-change are handled on press when the panel reports
//! fingers separately, so they can be chorded with other keys.
//!
//! Layout changes are not applied here: the caller polls
//! `take_mode_change` after dispatching events and swaps the router's
//! keyboard.

use crate::listener::KeyboardActionListener;
use crate::mode_switch::{AutoModeSwitch, ModifierKeyState};
use libkeyboard_core::keycodes;
use libkeyboard_core::InputEngine;
use tracing::debug;

pub struct KeyboardSession {
    engine: InputEngine,
    mode: AutoModeSwitch,
    shift_key: ModifierKeyState,
    symbol_key: ModifierKeyState,
    distinct_multitouch: bool,
    pointer_count: usize,
    mode_changed: bool,
}

impl KeyboardSession {
    pub fn new(engine: InputEngine, distinct_multitouch: bool) -> Self {
        Self {
            engine,
            mode: AutoModeSwitch::new(),
            shift_key: ModifierKeyState::default(),
            symbol_key: ModifierKeyState::default(),
            distinct_multitouch,
            pointer_count: 1,
            mode_changed: false,
        }
    }

    pub fn engine(&self) -> &InputEngine {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut InputEngine {
        &mut self.engine
    }

    pub fn into_engine(self) -> InputEngine {
        self.engine
    }

    pub fn mode_switch(&self) -> &AutoModeSwitch {
        &self.mode
    }

    pub fn is_symbols(&self) -> bool {
        self.mode.is_symbols()
    }

    /// Returns the new symbols state if the layout should be swapped.
    pub fn take_mode_change(&mut self) -> Option<bool> {
        std::mem::take(&mut self.mode_changed).then(|| self.mode.is_symbols())
    }

    fn change_keyboard_mode(&mut self) {
        self.mode.toggle_symbols();
        self.mode_changed = true;
    }

    fn note_snap_back(&mut self, snapped: bool) {
        if snapped {
            debug!(symbols = self.mode.is_symbols(), "keyboard mode snapped back");
            self.mode_changed = true;
        }
    }
}

impl KeyboardActionListener for KeyboardSession {
    fn on_press(&mut self, primary_code: i32) {
        if self.distinct_multitouch && primary_code == keycodes::SHIFT {
            self.shift_key.on_press();
            self.engine.on_key(keycodes::SHIFT, &[]);
        } else if self.distinct_multitouch && primary_code == keycodes::MODE_CHANGE {
            self.change_keyboard_mode();
            self.symbol_key.on_press();
            self.mode.set_momentary();
        } else {
            self.shift_key.on_other_key_pressed();
            self.symbol_key.on_other_key_pressed();
        }
    }

    fn on_release(&mut self, primary_code: i32) {
        if self.distinct_multitouch && primary_code == keycodes::SHIFT {
            // Shift held while typing applies only to those keys
            if self.shift_key.is_momentary() {
                self.engine.reset_shift();
            }
            self.shift_key.on_release();
        } else if self.distinct_multitouch && primary_code == keycodes::MODE_CHANGE {
            let snapped = self.mode.on_release_mode_change();
            self.note_snap_back(snapped);
            self.symbol_key.on_release();
        }
    }

    fn on_key(&mut self, primary_code: i32, nearby: &[i32], _x: i32, _y: i32) {
        match primary_code {
            keycodes::SHIFT => {
                if !self.distinct_multitouch {
                    self.engine.on_key(keycodes::SHIFT, &[]);
                }
            }
            keycodes::MODE_CHANGE => {
                if !self.distinct_multitouch {
                    self.change_keyboard_mode();
                }
            }
            code => {
                self.engine.on_key(code, nearby);
            }
        }
        let snapped = self.mode.on_key(primary_code, self.pointer_count);
        self.note_snap_back(snapped);
    }

    fn on_text(&mut self, text: &str) {
        self.engine.on_text(text);
        let snapped = self.mode.on_key(0, self.pointer_count);
        self.note_snap_back(snapped);
    }

    fn on_cancel(&mut self) {
        let snapped = self.mode.on_cancel_input(self.pointer_count);
        self.note_snap_back(snapped);
    }

    fn swipe_down(&mut self) {
        self.engine.commit_typed();
    }

    fn is_momentary_mode_switch(&self) -> bool {
        self.mode.is_momentary()
    }

    fn set_pointer_count(&mut self, count: usize) {
        self.pointer_count = count;
    }
}
