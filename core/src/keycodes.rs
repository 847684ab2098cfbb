//! Key codes shared by the touch layer and the input engine.
//!
//! Printable keys use their Unicode scalar value; function keys are negative.

pub const SHIFT: i32 = -1;
pub const MODE_CHANGE: i32 = -2;
pub const CANCEL: i32 = -3;
pub const DONE: i32 = -4;
pub const DELETE: i32 = -5;
pub const ALT: i32 = -6;

pub const ENTER: i32 = '\n' as i32;
pub const SPACE: i32 = ' ' as i32;
pub const SINGLE_QUOTE: i32 = '\'' as i32;

/// Marker for an unused slot in a code array.
pub const NOT_A_KEY: i32 = -1;

/// Converts a key code to a character if it is a printable code point.
pub fn to_char(code: i32) -> Option<char> {
    if code <= 0 {
        return None;
    }
    char::from_u32(code as u32)
}

/// Separators end the word being composed.
pub fn is_word_separator(code: i32) -> bool {
    matches!(
        to_char(code),
        Some(' ' | '\n' | '.' | ',' | ';' | ':' | '!' | '?' | '(' | ')' | '[' | ']' | '{' | '}' | '"')
    )
}

/// Letters and the apostrophe continue the current word.
pub fn is_word_character(code: i32) -> bool {
    match to_char(code) {
        Some(c) => c.is_alphabetic() || c == '\'',
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn function_keys_are_not_characters() {
        assert_eq!(to_char(DELETE), None);
        assert_eq!(to_char(SHIFT), None);
        assert_eq!(to_char('a' as i32), Some('a'));
    }

    #[test]
    fn separators_and_letters() {
        assert!(is_word_separator(SPACE));
        assert!(is_word_separator('.' as i32));
        assert!(!is_word_separator('a' as i32));
        assert!(is_word_character('é' as i32));
        assert!(is_word_character(SINGLE_QUOTE));
        assert!(!is_word_character('1' as i32));
    }
}
