use weaver_slate_model::{Edge, ModelError, TextUnit};

use super::{HistoryAction, KeyDown};
use crate::actions::{KeyCombo, KeydownResult};
use crate::direction::{Direction, text_direction};
use crate::editable::Editable;
use crate::hotkeys::Hotkey;

impl Editable {
    /// Interpret a `keydown` event. Editing normally arrives through
    /// `beforeinput`; keys here are those the browser gets wrong around
    /// voids and zero-width strings, plus the fallback for browsers without
    /// `beforeinput`.
    pub fn key_down(&mut self, event: &KeyDown) -> KeydownResult {
        if self.props.read_only || !self.is_editable_target(event.target) {
            return KeydownResult::NotHandled;
        }
        // `compositionend` is not fired reliably everywhere.
        if self.locator.composing && !event.is_composing {
            self.set_composing(false);
        }
        if let Some(hook) = self.props.on_key_down.clone() {
            if hook(&mut self.editor, event) {
                self.flush_changes();
                return KeydownResult::Handled;
            }
        }
        if self.locator.composing {
            return KeydownResult::PassThrough;
        }

        let result = self.handle_hotkey(&event.combo);
        self.flush_changes();
        result
    }

    fn handle_hotkey(&mut self, combo: &KeyCombo) -> KeydownResult {
        let hotkeys = self.hotkeys.clone();
        let is = |hotkey| hotkeys.is(hotkey, combo);
        let selection = self.editor.selection().cloned();
        let collapsed = selection.as_ref().is_some_and(|s| s.is_collapsed());
        let expanded = selection.as_ref().is_some_and(|s| s.is_expanded());
        let block = selection
            .as_ref()
            .and_then(|s| s.focus.path.first().copied())
            .unwrap_or(0);
        let rtl = text_direction(&self.editor.string(&[block])) == Direction::Rtl;

        if is(Hotkey::Redo) {
            self.run_history(HistoryAction::Redo);
            return KeydownResult::Handled;
        }
        if is(Hotkey::Undo) {
            self.run_history(HistoryAction::Undo);
            return KeydownResult::Handled;
        }

        // Browsers extend and collapse line selections inconsistently.
        let line_move = [
            (Hotkey::MoveLineBackward, true, false),
            (Hotkey::MoveLineForward, false, false),
            (Hotkey::ExtendLineBackward, true, true),
            (Hotkey::ExtendLineForward, false, true),
        ];
        for (hotkey, reverse, extend) in line_move {
            if is(hotkey) {
                let result = self.editor.move_selection(TextUnit::Line, reverse, extend);
                self.log_model("move line", result);
                return KeydownResult::Handled;
            }
        }

        // The browser cannot step over voids or zero-width strings on its own.
        if is(Hotkey::MoveBackward) {
            let result = if collapsed {
                self.editor.move_selection(TextUnit::Character, !rtl, false)
            } else {
                self.editor.collapse(if rtl { Edge::End } else { Edge::Start })
            };
            self.log_model("move backward", result);
            return KeydownResult::Handled;
        }
        if is(Hotkey::MoveForward) {
            let result = if collapsed {
                self.editor.move_selection(TextUnit::Character, rtl, false)
            } else {
                self.editor.collapse(if rtl { Edge::Start } else { Edge::End })
            };
            self.log_model("move forward", result);
            return KeydownResult::Handled;
        }
        for (hotkey, reverse) in [(Hotkey::MoveWordBackward, !rtl), (Hotkey::MoveWordForward, rtl)] {
            if is(hotkey) {
                let result = self.move_word(expanded, reverse);
                self.log_model("move word", result);
                return KeydownResult::Handled;
            }
        }

        if !self.quirks.has_before_input {
            return self.fallback_editing_keys(combo, expanded);
        }

        // Chrome and Safari fire no beforeinput when deleting a selected void.
        if (self.quirks.chrome || self.quirks.webkit)
            && collapsed
            && (is(Hotkey::DeleteBackward) || is(Hotkey::DeleteForward))
        {
            let in_void = selection
                .as_ref()
                .and_then(|s| s.anchor.path.parent())
                .and_then(|parent| self.editor.element(&parent))
                .is_some_and(|el| self.editor.is_void(el));
            if in_void {
                let result = self.editor.delete_backward(TextUnit::Block);
                self.log_model("delete void", result);
                return KeydownResult::Handled;
            }
        }
        KeydownResult::NotHandled
    }

    fn move_word(&mut self, expanded: bool, reverse: bool) -> Result<(), ModelError> {
        if expanded {
            self.editor.collapse(Edge::Focus)?;
        }
        self.editor.move_selection(TextUnit::Word, reverse, false)
    }

    /// Without `beforeinput` every edit key must be handled here.
    fn fallback_editing_keys(&mut self, combo: &KeyCombo, expanded: bool) -> KeydownResult {
        let hotkeys = &self.hotkeys;
        let Some(hotkey) = hotkeys.first_match(
            &[
                Hotkey::Bold,
                Hotkey::Italic,
                Hotkey::TransposeCharacter,
                Hotkey::SoftBreak,
                Hotkey::SplitBlock,
                Hotkey::DeleteBackward,
                Hotkey::DeleteForward,
                Hotkey::DeleteLineBackward,
                Hotkey::DeleteLineForward,
                Hotkey::DeleteWordBackward,
                Hotkey::DeleteWordForward,
            ],
            combo,
        ) else {
            return KeydownResult::NotHandled;
        };

        let editor = &mut self.editor;
        let result = match hotkey {
            // No built-in behaviour, but the browser would format the DOM.
            Hotkey::Bold | Hotkey::Italic | Hotkey::TransposeCharacter => Ok(()),
            Hotkey::SoftBreak => editor.insert_soft_break(),
            Hotkey::SplitBlock => editor.insert_break(),
            _ if expanded => editor.delete_fragment(),
            Hotkey::DeleteBackward => editor.delete_backward(TextUnit::Character),
            Hotkey::DeleteForward => editor.delete_forward(TextUnit::Character),
            Hotkey::DeleteLineBackward => editor.delete_backward(TextUnit::Line),
            Hotkey::DeleteLineForward => editor.delete_forward(TextUnit::Line),
            Hotkey::DeleteWordBackward => editor.delete_backward(TextUnit::Word),
            Hotkey::DeleteWordForward => editor.delete_forward(TextUnit::Word),
            _ => Ok(()),
        };
        self.log_model("edit key", result);
        KeydownResult::Handled
    }
}
