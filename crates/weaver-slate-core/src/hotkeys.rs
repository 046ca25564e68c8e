//! Platform-normalised hotkeys.
//!
//! Each hotkey has generic bindings plus Apple or Windows/Linux specific
//! ones. Modifiers must match exactly unless a binding marks shift as
//! optional.

use crate::actions::{Key, KeyCombo, Modifiers};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hotkey {
    Bold,
    Italic,
    Compose,
    MoveBackward,
    MoveForward,
    MoveWordBackward,
    MoveWordForward,
    MoveLineBackward,
    MoveLineForward,
    ExtendBackward,
    ExtendForward,
    ExtendLineBackward,
    ExtendLineForward,
    DeleteBackward,
    DeleteForward,
    DeleteWordBackward,
    DeleteWordForward,
    DeleteLineBackward,
    DeleteLineForward,
    SoftBreak,
    SplitBlock,
    TransposeCharacter,
    Undo,
    Redo,
}

#[derive(Debug, Clone)]
struct Binding {
    key: Key,
    modifiers: Modifiers,
    shift_optional: bool,
}

impl Binding {
    fn matches(&self, combo: &KeyCombo) -> bool {
        if !self.key.same_key(&combo.key) {
            return false;
        }
        if self.shift_optional {
            self.modifiers.without_shift() == combo.modifiers.without_shift()
        } else {
            self.modifiers == combo.modifiers
        }
    }
}

fn bind(key: Key, modifiers: Modifiers) -> Binding {
    Binding {
        key,
        modifiers,
        shift_optional: false,
    }
}

fn bind_any_shift(key: Key, modifiers: Modifiers) -> Binding {
    Binding {
        key,
        modifiers,
        shift_optional: true,
    }
}

fn ch(c: &str) -> Key {
    Key::character(c)
}

const OPT: Modifiers = Modifiers::ALT;
const OPT_SHIFT: Modifiers = Modifiers::ALT_SHIFT;

/// Hotkey table for one platform family.
#[derive(Debug, Clone)]
pub struct Hotkeys {
    apple: bool,
}

impl Hotkeys {
    pub fn new(apple: bool) -> Self {
        Self { apple }
    }

    pub fn is(&self, hotkey: Hotkey, combo: &KeyCombo) -> bool {
        let platform = if self.apple {
            apple_bindings(hotkey)
        } else {
            windows_bindings(hotkey)
        };
        generic_bindings(hotkey, self.apple)
            .iter()
            .chain(platform.iter())
            .any(|b| b.matches(combo))
    }

    /// First hotkey among `candidates` that `combo` triggers.
    pub fn first_match(&self, candidates: &[Hotkey], combo: &KeyCombo) -> Option<Hotkey> {
        candidates.iter().copied().find(|h| self.is(*h, combo))
    }
}

fn generic_bindings(hotkey: Hotkey, apple: bool) -> Vec<Binding> {
    let primary = Modifiers::primary(apple);
    match hotkey {
        Hotkey::Bold => vec![bind(ch("b"), primary)],
        Hotkey::Italic => vec![bind(ch("i"), primary)],
        Hotkey::Compose => [
            Key::ArrowDown,
            Key::ArrowLeft,
            Key::ArrowRight,
            Key::ArrowUp,
            Key::Backspace,
            Key::Enter,
        ]
        .into_iter()
        .map(|k| bind(k, Modifiers::NONE))
        .collect(),
        Hotkey::MoveBackward => vec![bind(Key::ArrowLeft, Modifiers::NONE)],
        Hotkey::MoveForward => vec![bind(Key::ArrowRight, Modifiers::NONE)],
        Hotkey::MoveWordBackward => vec![bind(Key::ArrowLeft, Modifiers::CTRL)],
        Hotkey::MoveWordForward => vec![bind(Key::ArrowRight, Modifiers::CTRL)],
        Hotkey::DeleteBackward => vec![bind_any_shift(Key::Backspace, Modifiers::NONE)],
        Hotkey::DeleteForward => vec![bind_any_shift(Key::Delete, Modifiers::NONE)],
        Hotkey::ExtendBackward => vec![bind(Key::ArrowLeft, Modifiers::SHIFT)],
        Hotkey::ExtendForward => vec![bind(Key::ArrowRight, Modifiers::SHIFT)],
        Hotkey::SoftBreak => vec![bind(Key::Enter, Modifiers::SHIFT)],
        Hotkey::SplitBlock => vec![bind(Key::Enter, Modifiers::NONE)],
        Hotkey::Undo => vec![bind(ch("z"), primary)],
        _ => Vec::new(),
    }
}

fn apple_bindings(hotkey: Hotkey) -> Vec<Binding> {
    match hotkey {
        Hotkey::MoveLineBackward => vec![bind(Key::ArrowUp, OPT)],
        Hotkey::MoveLineForward => vec![bind(Key::ArrowDown, OPT)],
        Hotkey::MoveWordBackward => vec![bind(Key::ArrowLeft, OPT)],
        Hotkey::MoveWordForward => vec![bind(Key::ArrowRight, OPT)],
        Hotkey::DeleteBackward => vec![
            bind(Key::Backspace, Modifiers::CTRL),
            bind(ch("h"), Modifiers::CTRL),
        ],
        Hotkey::DeleteForward => vec![
            bind(Key::Delete, Modifiers::CTRL),
            bind(ch("d"), Modifiers::CTRL),
        ],
        Hotkey::DeleteLineBackward => vec![bind_any_shift(Key::Backspace, Modifiers::META)],
        Hotkey::DeleteLineForward => vec![
            bind_any_shift(Key::Delete, Modifiers::META),
            bind(ch("k"), Modifiers::CTRL),
        ],
        Hotkey::DeleteWordBackward => vec![bind_any_shift(Key::Backspace, OPT)],
        Hotkey::DeleteWordForward => vec![bind_any_shift(Key::Delete, OPT)],
        Hotkey::ExtendLineBackward => vec![bind(Key::ArrowUp, OPT_SHIFT)],
        Hotkey::ExtendLineForward => vec![bind(Key::ArrowDown, OPT_SHIFT)],
        Hotkey::Redo => vec![bind(ch("z"), Modifiers::META_SHIFT)],
        Hotkey::TransposeCharacter => vec![bind(ch("t"), Modifiers::CTRL)],
        _ => Vec::new(),
    }
}

fn windows_bindings(hotkey: Hotkey) -> Vec<Binding> {
    match hotkey {
        Hotkey::DeleteWordBackward => vec![bind_any_shift(Key::Backspace, Modifiers::CTRL)],
        Hotkey::DeleteWordForward => vec![bind_any_shift(Key::Delete, Modifiers::CTRL)],
        Hotkey::Redo => vec![
            bind(ch("y"), Modifiers::CTRL),
            bind(ch("z"), Modifiers::CTRL_SHIFT),
        ],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn combo(key: Key, modifiers: Modifiers) -> KeyCombo {
        KeyCombo::with_modifiers(key, modifiers)
    }

    #[test]
    fn primary_modifier_depends_on_platform() {
        let mac = Hotkeys::new(true);
        let pc = Hotkeys::new(false);
        assert!(mac.is(Hotkey::Bold, &combo(ch("b"), Modifiers::META)));
        assert!(!mac.is(Hotkey::Bold, &combo(ch("b"), Modifiers::CTRL)));
        assert!(pc.is(Hotkey::Bold, &combo(ch("B"), Modifiers::CTRL)));
    }

    #[test]
    fn optional_shift_accepts_both_states() {
        let pc = Hotkeys::new(false);
        assert!(pc.is(Hotkey::DeleteBackward, &combo(Key::Backspace, Modifiers::NONE)));
        assert!(pc.is(Hotkey::DeleteBackward, &combo(Key::Backspace, Modifiers::SHIFT)));
        assert!(!pc.is(Hotkey::DeleteBackward, &combo(Key::Backspace, Modifiers::CTRL)));
        assert!(pc.is(Hotkey::DeleteWordBackward, &combo(Key::Backspace, Modifiers::CTRL_SHIFT)));
    }

    #[test]
    fn platform_specific_bindings() {
        let mac = Hotkeys::new(true);
        let pc = Hotkeys::new(false);
        assert!(mac.is(Hotkey::MoveWordBackward, &combo(Key::ArrowLeft, Modifiers::ALT)));
        assert!(mac.is(Hotkey::MoveWordBackward, &combo(Key::ArrowLeft, Modifiers::CTRL)));
        assert!(!pc.is(Hotkey::MoveWordBackward, &combo(Key::ArrowLeft, Modifiers::ALT)));
        assert!(pc.is(Hotkey::Redo, &combo(ch("y"), Modifiers::CTRL)));
        assert!(!mac.is(Hotkey::Redo, &combo(ch("y"), Modifiers::CTRL)));
        assert!(mac.is(Hotkey::Redo, &combo(ch("z"), Modifiers::META_SHIFT)));
        assert!(!mac.is(Hotkey::Undo, &combo(ch("z"), Modifiers::META_SHIFT)));
    }

    #[test]
    fn first_match_respects_order() {
        let pc = Hotkeys::new(false);
        let hit = pc.first_match(
            &[Hotkey::SoftBreak, Hotkey::SplitBlock],
            &combo(Key::Enter, Modifiers::SHIFT),
        );
        assert_eq!(hit, Some(Hotkey::SoftBreak));
    }
}
