//! Where the user is relative to the last word boundary.
//!
//! The input engine feeds every typed character, backspace and commit into
//! `TextEntryState`. The state decides whether a backspace should undo the
//! last auto-correction and whether the user is correcting an earlier word.
//! Per-session counters are reported when the session ends.

use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntryState {
    #[default]
    Unknown,
    Start,
    InWord,
    AcceptedDefault,
    PickedSuggestion,
    PunctuationAfterWord,
    PunctuationAfterAccepted,
    SpaceAfterAccepted,
    SpaceAfterPicked,
    UndoCommit,
    Correcting,
    PickedCorrection,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub backspaces: u32,
    pub auto_suggestions: u32,
    pub auto_suggestions_undone: u32,
    pub manual_suggestions: u32,
    pub words_not_in_dictionary: u32,
}

#[derive(Debug, Clone, Default)]
pub struct TextEntryState {
    state: EntryState,
    stats: SessionStats,
}

impl TextEntryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_session(&mut self) {
        self.stats = SessionStats::default();
        self.state = EntryState::Start;
    }

    /// Report and return the counters of the finished session.
    pub fn end_session(&mut self) -> SessionStats {
        let stats = self.stats;
        debug!(
            backspaces = stats.backspaces,
            auto = stats.auto_suggestions,
            manual = stats.manual_suggestions,
            typed = stats.words_not_in_dictionary,
            undone = stats.auto_suggestions_undone,
            "text entry session ended"
        );
        stats
    }

    pub fn state(&self) -> EntryState {
        self.state
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// The separator just committed the default suggestion.
    pub fn accepted_default(&mut self, typed_word: Option<&str>, actual_word: &str) {
        let Some(typed) = typed_word else {
            return;
        };
        if typed != actual_word {
            self.stats.auto_suggestions += 1;
        }
        self.state = EntryState::AcceptedDefault;
    }

    /// Restore `AcceptedDefault` after handling one of its sub-states.
    pub fn back_to_accepted_default(&mut self, typed_word: Option<&str>) {
        if typed_word.is_none() {
            return;
        }
        if matches!(
            self.state,
            EntryState::SpaceAfterAccepted | EntryState::PunctuationAfterAccepted | EntryState::InWord
        ) {
            self.state = EntryState::AcceptedDefault;
        }
    }

    pub fn accepted_typed(&mut self, _typed_word: &str) {
        self.stats.words_not_in_dictionary += 1;
        self.state = EntryState::PickedSuggestion;
    }

    pub fn accepted_suggestion(&mut self, typed_word: &str, actual_word: &str) {
        self.stats.manual_suggestions += 1;
        let old = self.state;
        if typed_word == actual_word {
            self.accepted_typed(typed_word);
        }
        self.state = if matches!(old, EntryState::Correcting | EntryState::PickedCorrection) {
            EntryState::PickedCorrection
        } else {
            EntryState::PickedSuggestion
        };
    }

    pub fn selected_for_correction(&mut self) {
        self.state = EntryState::Correcting;
    }

    pub fn typed_character(&mut self, c: char, is_separator: bool) {
        let is_space = c == ' ';
        self.state = match self.state {
            EntryState::InWord if is_space || is_separator => EntryState::Start,
            EntryState::InWord => EntryState::InWord,
            EntryState::AcceptedDefault | EntryState::SpaceAfterPicked => {
                if is_space {
                    EntryState::SpaceAfterAccepted
                } else if is_separator {
                    EntryState::PunctuationAfterAccepted
                } else {
                    EntryState::InWord
                }
            }
            EntryState::PickedSuggestion | EntryState::PickedCorrection => {
                if is_space {
                    EntryState::SpaceAfterPicked
                } else if is_separator {
                    EntryState::PunctuationAfterAccepted
                } else {
                    EntryState::InWord
                }
            }
            EntryState::Start
            | EntryState::Unknown
            | EntryState::SpaceAfterAccepted
            | EntryState::PunctuationAfterAccepted
            | EntryState::PunctuationAfterWord => {
                if !is_space && !is_separator {
                    EntryState::InWord
                } else {
                    EntryState::Start
                }
            }
            EntryState::UndoCommit => {
                if is_space || is_separator {
                    EntryState::AcceptedDefault
                } else {
                    EntryState::InWord
                }
            }
            EntryState::Correcting => EntryState::Start,
        };
    }

    pub fn backspace(&mut self) {
        self.stats.backspaces += 1;
        match self.state {
            EntryState::AcceptedDefault => {
                self.state = EntryState::UndoCommit;
                self.stats.auto_suggestions_undone += 1;
            }
            EntryState::UndoCommit => self.state = EntryState::InWord,
            _ => {}
        }
    }

    pub fn reset(&mut self) {
        self.state = EntryState::Start;
    }

    pub fn is_correcting(&self) -> bool {
        matches!(self.state, EntryState::Correcting | EntryState::PickedCorrection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auto_correct_then_undo() {
        let mut s = TextEntryState::new();
        s.new_session();
        s.typed_character('h', false);
        assert_eq!(s.state(), EntryState::InWord);
        s.accepted_default(Some("helo"), "hello");
        s.typed_character(' ', true);
        assert_eq!(s.state(), EntryState::SpaceAfterAccepted);
        s.back_to_accepted_default(Some("helo"));
        assert_eq!(s.state(), EntryState::AcceptedDefault);
        s.backspace();
        assert_eq!(s.state(), EntryState::UndoCommit);
        s.backspace();
        assert_eq!(s.state(), EntryState::InWord);
        let stats = s.end_session();
        assert_eq!(stats.auto_suggestions, 1);
        assert_eq!(stats.auto_suggestions_undone, 1);
        assert_eq!(stats.backspaces, 2);
    }

    #[test]
    fn picking_while_correcting() {
        let mut s = TextEntryState::new();
        s.selected_for_correction();
        assert!(s.is_correcting());
        s.accepted_suggestion("teh", "the");
        assert_eq!(s.state(), EntryState::PickedCorrection);
        s.typed_character('.', true);
        assert_eq!(s.state(), EntryState::PunctuationAfterAccepted);
    }

    #[test]
    fn picking_the_typed_word_counts_as_not_in_dictionary() {
        let mut s = TextEntryState::new();
        s.accepted_suggestion("zxq", "zxq");
        assert_eq!(s.state(), EntryState::PickedSuggestion);
        assert_eq!(s.stats().words_not_in_dictionary, 1);
        s.typed_character(' ', true);
        assert_eq!(s.state(), EntryState::SpaceAfterPicked);
    }
}
