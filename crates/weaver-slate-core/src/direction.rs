//! Base text direction from the first strong character.

use unicode_bidi::{BidiClass, bidi_class};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ltr,
    Rtl,
    Neutral,
}

pub fn text_direction(text: &str) -> Direction {
    for c in text.chars() {
        match bidi_class(c) {
            BidiClass::L => return Direction::Ltr,
            BidiClass::R | BidiClass::AL => return Direction::Rtl,
            _ => {}
        }
    }
    Direction::Neutral
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_strong_character_wins() {
        assert_eq!(text_direction("hello"), Direction::Ltr);
        assert_eq!(text_direction("  שלום world"), Direction::Rtl);
        assert_eq!(text_direction("123 مرحبا"), Direction::Rtl);
        assert_eq!(text_direction("12 - 34"), Direction::Neutral);
        assert_eq!(text_direction(""), Direction::Neutral);
    }
}
