//! Automatic return from the symbols layout.
//!
//! Holding the mode-change key and sliding to a symbol types that symbol and
//! snaps back to letters on release. Chording (mode-change held by one
//! finger while another types) snaps back when the mode-change key is
//! released. After switching to symbols with a plain tap, typing one symbol
//! followed by space or enter also returns to letters.

use libkeyboard_core::keycodes;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AutoModeSwitchState {
    #[default]
    Alpha,
    /// Symbols shown, nothing typed yet
    SymbolBegin,
    /// A symbol was typed; space or enter returns to letters
    Symbol,
    /// Mode-change key is held
    Momentary,
    /// Another key was pressed while mode-change is held
    Chording,
}

#[derive(Debug, Clone, Default)]
pub struct AutoModeSwitch {
    state: AutoModeSwitchState,
    symbols: bool,
    prefer_symbols: bool,
}

impl AutoModeSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> AutoModeSwitchState {
        self.state
    }

    pub fn is_symbols(&self) -> bool {
        self.symbols
    }

    /// Stay in symbols after typing one (numeric fields).
    pub fn set_prefer_symbols(&mut self, prefer: bool) {
        self.prefer_symbols = prefer;
    }

    pub fn is_momentary(&self) -> bool {
        self.state == AutoModeSwitchState::Momentary
    }

    pub fn is_chording(&self) -> bool {
        self.state == AutoModeSwitchState::Chording
    }

    /// Flip between letters and symbols.
    pub fn toggle_symbols(&mut self) {
        self.symbols = !self.symbols;
        self.state = if self.symbols && !self.prefer_symbols {
            AutoModeSwitchState::SymbolBegin
        } else {
            AutoModeSwitchState::Alpha
        };
        debug!(symbols = self.symbols, "keyboard mode changed");
    }

    /// The mode-change key went down on a panel with distinct multitouch.
    pub fn set_momentary(&mut self) {
        self.state = AutoModeSwitchState::Momentary;
    }

    /// Feed a committed key. Returns true when the layout snapped back.
    pub fn on_key(&mut self, key: i32, pointer_count: usize) -> bool {
        match self.state {
            AutoModeSwitchState::Momentary => {
                if key == keycodes::MODE_CHANGE {
                    // Mode-change pressed and released on its own
                    self.state = if self.symbols {
                        AutoModeSwitchState::SymbolBegin
                    } else {
                        AutoModeSwitchState::Alpha
                    };
                    false
                } else if pointer_count == 1 {
                    // Slid from mode-change to a symbol and lifted
                    self.toggle_symbols();
                    true
                } else {
                    self.state = AutoModeSwitchState::Chording;
                    false
                }
            }
            AutoModeSwitchState::SymbolBegin => {
                if key != keycodes::SPACE && key != keycodes::ENTER && key >= 0 {
                    self.state = AutoModeSwitchState::Symbol;
                }
                false
            }
            AutoModeSwitchState::Symbol => {
                if key == keycodes::ENTER || key == keycodes::SPACE {
                    self.toggle_symbols();
                    true
                } else {
                    false
                }
            }
            AutoModeSwitchState::Alpha | AutoModeSwitchState::Chording => false,
        }
    }

    /// The finger slid off the held mode-change key and lifted outside any
    /// key.
    pub fn on_cancel_input(&mut self, pointer_count: usize) -> bool {
        if self.state == AutoModeSwitchState::Momentary && pointer_count == 1 {
            self.toggle_symbols();
            return true;
        }
        false
    }

    /// The held mode-change key was released.
    pub fn on_release_mode_change(&mut self) -> bool {
        if self.is_chording() {
            self.toggle_symbols();
            return true;
        }
        false
    }
}

/// Press state of a shift or mode-change key used for chording.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModifierKeyState {
    #[default]
    Released,
    Pressing,
    /// Another key was pressed while this one is held
    Momentary,
}

impl ModifierKeyState {
    pub fn on_press(&mut self) {
        *self = ModifierKeyState::Pressing;
    }

    pub fn on_release(&mut self) {
        *self = ModifierKeyState::Released;
    }

    pub fn on_other_key_pressed(&mut self) {
        if *self == ModifierKeyState::Pressing {
            *self = ModifierKeyState::Momentary;
        }
    }

    pub fn is_momentary(&self) -> bool {
        *self == ModifierKeyState::Momentary
    }
}
