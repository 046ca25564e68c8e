//! Input intents and key combinations.
//!
//! `InputType` carries the semantic intent of a `beforeinput` event; `Key`,
//! `Modifiers` and `KeyCombo` describe keyboard input independently of the
//! event source. Browser glue converts native events into these.

use smol_str::SmolStr;

/// Semantic input types, following the W3C Input Events `inputType` values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputType {
    // === Insertion ===
    InsertText,
    InsertReplacementText,
    InsertLineBreak,
    InsertParagraph,
    InsertFromYank,
    InsertFromDrop,
    InsertFromPaste,
    /// Text being composed by an IME. Cannot be cancelled.
    InsertCompositionText,
    /// Composition committed. Safari fires this before `compositionend`.
    InsertFromComposition,

    // === Deletion ===
    DeleteContent,
    DeleteContentBackward,
    DeleteContentForward,
    DeleteWordBackward,
    DeleteWordForward,
    DeleteSoftLineBackward,
    DeleteSoftLineForward,
    DeleteEntireSoftLine,
    DeleteHardLineBackward,
    DeleteHardLineForward,
    DeleteEntireWordBackward,
    DeleteEntireWordForward,
    DeleteByComposition,
    DeleteByCut,
    DeleteByDrag,
    /// Composition text being replaced. Cannot be cancelled.
    DeleteCompositionText,

    // === History ===
    HistoryUndo,
    HistoryRedo,

    // === Formatting ===
    FormatBold,
    FormatItalic,
    FormatUnderline,
    FormatStrikethrough,

    Unknown(String),
}

impl InputType {
    pub fn is_deletion(&self) -> bool {
        matches!(
            self,
            Self::DeleteContent
                | Self::DeleteContentBackward
                | Self::DeleteContentForward
                | Self::DeleteWordBackward
                | Self::DeleteWordForward
                | Self::DeleteSoftLineBackward
                | Self::DeleteSoftLineForward
                | Self::DeleteEntireSoftLine
                | Self::DeleteHardLineBackward
                | Self::DeleteHardLineForward
                | Self::DeleteEntireWordBackward
                | Self::DeleteEntireWordForward
                | Self::DeleteByComposition
                | Self::DeleteByCut
                | Self::DeleteByDrag
                | Self::DeleteCompositionText
        )
    }

    /// The `deleteBy*` family: deletions whose target range is the
    /// selection being moved or replaced rather than a direction.
    pub fn is_delete_by(&self) -> bool {
        matches!(
            self,
            Self::DeleteByComposition | Self::DeleteByCut | Self::DeleteByDrag
        )
    }

    pub fn is_insertion(&self) -> bool {
        matches!(
            self,
            Self::InsertText
                | Self::InsertReplacementText
                | Self::InsertLineBreak
                | Self::InsertParagraph
                | Self::InsertFromYank
                | Self::InsertFromDrop
                | Self::InsertFromPaste
                | Self::InsertCompositionText
                | Self::InsertFromComposition
        )
    }

    /// Intermediate composition updates the browser applies on its own.
    pub fn is_composition_change(&self) -> bool {
        matches!(
            self,
            Self::InsertCompositionText | Self::DeleteCompositionText
        )
    }

    /// Whether a deletion runs toward the start of the document.
    pub fn is_backward(&self) -> bool {
        matches!(
            self,
            Self::DeleteContentBackward
                | Self::DeleteWordBackward
                | Self::DeleteSoftLineBackward
                | Self::DeleteHardLineBackward
                | Self::DeleteEntireWordBackward
        )
    }
}

/// Key values for keyboard input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    /// A printable key. Stored as reported, so letters may be upper case.
    Character(SmolStr),
    Unidentified,

    Backspace,
    Delete,
    Enter,
    Tab,
    Escape,

    ArrowLeft,
    ArrowRight,
    ArrowUp,
    ArrowDown,
    Home,
    End,
    PageUp,
    PageDown,

    Alt,
    Control,
    Meta,
    Shift,

    /// IME processing key reported while a composition is active.
    Process,
}

impl Key {
    pub fn character(s: impl Into<SmolStr>) -> Self {
        Self::Character(s.into())
    }

    pub fn is_navigation(&self) -> bool {
        matches!(
            self,
            Self::ArrowLeft
                | Self::ArrowRight
                | Self::ArrowUp
                | Self::ArrowDown
                | Self::Home
                | Self::End
                | Self::PageUp
                | Self::PageDown
        )
    }

    pub fn is_modifier(&self) -> bool {
        matches!(self, Self::Alt | Self::Control | Self::Meta | Self::Shift)
    }

    /// Case-insensitive key comparison for character keys.
    pub fn same_key(&self, other: &Key) -> bool {
        match (self, other) {
            (Self::Character(a), Self::Character(b)) => a.eq_ignore_ascii_case(b),
            _ => self == other,
        }
    }
}

/// Modifier key state for a key combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub const NONE: Self = Self {
        ctrl: false,
        alt: false,
        shift: false,
        meta: false,
    };

    pub const CTRL: Self = Self {
        ctrl: true,
        ..Self::NONE
    };

    pub const ALT: Self = Self {
        alt: true,
        ..Self::NONE
    };

    pub const SHIFT: Self = Self {
        shift: true,
        ..Self::NONE
    };

    pub const META: Self = Self {
        meta: true,
        ..Self::NONE
    };

    pub const CTRL_SHIFT: Self = Self {
        ctrl: true,
        shift: true,
        ..Self::NONE
    };

    pub const ALT_SHIFT: Self = Self {
        alt: true,
        shift: true,
        ..Self::NONE
    };

    pub const META_SHIFT: Self = Self {
        meta: true,
        shift: true,
        ..Self::NONE
    };

    /// Cmd on Apple platforms, Ctrl elsewhere.
    pub fn primary(is_apple: bool) -> Self {
        if is_apple { Self::META } else { Self::CTRL }
    }

    pub fn primary_shift(is_apple: bool) -> Self {
        if is_apple {
            Self::META_SHIFT
        } else {
            Self::CTRL_SHIFT
        }
    }

    /// Same state ignoring shift.
    pub fn without_shift(self) -> Self {
        Self {
            shift: false,
            ..self
        }
    }
}

/// A pressed key together with its modifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyCombo {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyCombo {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(key: Key, modifiers: Modifiers) -> Self {
        Self { key, modifiers }
    }

    pub fn primary(key: Key, is_apple: bool) -> Self {
        Self {
            key,
            modifiers: Modifiers::primary(is_apple),
        }
    }
}

/// Result of handling a keydown event.
#[derive(Debug, Clone, PartialEq)]
pub enum KeydownResult {
    /// Event was handled, prevent default.
    Handled,
    /// Event was not a keybinding, let the browser handle it.
    NotHandled,
    /// Event belongs to an ongoing composition and must reach the browser.
    PassThrough,
}
