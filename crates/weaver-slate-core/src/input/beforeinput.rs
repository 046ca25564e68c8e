use weaver_slate_model::{Point, TextUnit};

use super::{BeforeInput, BeforeInputResult, DeferredOperation, HistoryAction};
use crate::actions::InputType;
use crate::editable::Editable;
use crate::platform::DomEnvironment;
use crate::selection::transform_range_since;

impl Editable {
    /// Interpret a `beforeinput` event.
    ///
    /// The browser layer flushes any scheduled selection change first, since
    /// some IMEs move the selection immediately before firing.
    pub fn before_input(
        &mut self,
        event: &BeforeInput,
        env: &dyn DomEnvironment,
    ) -> BeforeInputResult {
        if self.props.read_only || self.state.processing || !self.is_editable_target(event.target) {
            self.flush_changes();
            return BeforeInputResult::NotHandled;
        }
        if let Some(hook) = self.props.on_dom_before_input.clone() {
            if hook(&mut self.editor, event) {
                self.flush_changes();
                return BeforeInputResult::Handled;
            }
        }
        let history = match event.input_type {
            InputType::HistoryUndo => Some(HistoryAction::Undo),
            InputType::HistoryRedo => Some(HistoryAction::Redo),
            _ => None,
        };
        if let Some(action) = history {
            self.run_history(action);
            self.flush_changes();
            return BeforeInputResult::Handled;
        }

        self.state.processing = true;
        let result = self.interpret(event, env);
        self.state.processing = false;
        self.flush_changes();
        tracing::trace!(
            target: "weaver::input",
            input_type = ?event.input_type,
            ?result,
            "beforeinput"
        );
        result
    }

    fn interpret(&mut self, event: &BeforeInput, env: &dyn DomEnvironment) -> BeforeInputResult {
        let input_type = &event.input_type;
        let composition_change = input_type.is_composition_change();
        if composition_change && self.locator.composing {
            return BeforeInputResult::PassThrough;
        }

        let selection = self.editor.selection().cloned();
        let data = event.data.as_deref();

        let mut native = false;
        if *input_type == InputType::InsertText {
            if let (Some(sel), Some(data)) = (&selection, data) {
                native = sel.is_collapsed()
                    && self.quirks.is_native_insertable(data)
                    && sel.anchor.offset != 0
                    && self.editor.pending_marks().is_none()
                    && self.native_insertion_allowed(&sel.anchor, env);
            }
        }

        // Composition changes still move the caret to where the browser
        // will put the composed text, but keep that selection afterwards.
        if !input_type.is_deletion() || input_type.is_delete_by() {
            if let Some(target) = &event.target_range {
                match self.bridge().to_model_range(&target.start, &target.end, false) {
                    Ok(range) if selection.as_ref() != Some(&range) => {
                        native = false;
                        let user = selection
                            .clone()
                            .filter(|_| !composition_change)
                            .map(|s| (s, self.editor.operations().len()));
                        let result = self.editor.select(range);
                        self.log_model("select target range", result);
                        if user.is_some() {
                            self.state.user_selection = user;
                        }
                    }
                    Ok(_) => {}
                    Err(error) => tracing::debug!(
                        target: "weaver::input",
                        %error,
                        "target range does not map onto the document"
                    ),
                }
            }
        }

        if composition_change {
            return BeforeInputResult::PassThrough;
        }

        if input_type.is_deletion() && selection.as_ref().is_some_and(|s| s.is_expanded()) {
            let result = match deletion_direction(input_type) {
                Some((unit, true)) => self.editor.delete_backward(unit),
                Some((unit, false)) => self.editor.delete_forward(unit),
                None => self.editor.delete_fragment(),
            };
            self.log_model("delete selection", result);
            self.state.user_selection = None;
            return BeforeInputResult::Handled;
        }

        self.dispatch(event, native);

        if let Some((range, mark)) = self.state.user_selection.take() {
            let restored = transform_range_since(&self.editor, &range, mark);
            if let Some(range) = restored.filter(|r| self.editor.selection() != Some(r)) {
                let result = self.editor.select(range);
                self.log_model("restore selection", result);
            }
        }

        if native {
            BeforeInputResult::PassThrough
        } else {
            BeforeInputResult::Handled
        }
    }

    fn dispatch(&mut self, event: &BeforeInput, native: bool) {
        let editor = &mut self.editor;
        let result = match &event.input_type {
            InputType::DeleteByComposition | InputType::DeleteByCut | InputType::DeleteByDrag => {
                editor.delete_fragment()
            }
            InputType::DeleteContent | InputType::DeleteContentForward => {
                editor.delete_forward(TextUnit::Character)
            }
            InputType::DeleteContentBackward => editor.delete_backward(TextUnit::Character),
            InputType::DeleteEntireSoftLine => editor
                .delete_backward(TextUnit::Line)
                .and_then(|_| editor.delete_forward(TextUnit::Line)),
            InputType::DeleteHardLineBackward => editor.delete_backward(TextUnit::Block),
            InputType::DeleteSoftLineBackward => editor.delete_backward(TextUnit::Line),
            InputType::DeleteHardLineForward => editor.delete_forward(TextUnit::Block),
            InputType::DeleteSoftLineForward => editor.delete_forward(TextUnit::Line),
            InputType::DeleteWordBackward | InputType::DeleteEntireWordBackward => {
                editor.delete_backward(TextUnit::Word)
            }
            InputType::DeleteWordForward | InputType::DeleteEntireWordForward => {
                editor.delete_forward(TextUnit::Word)
            }
            InputType::InsertLineBreak => editor.insert_soft_break(),
            InputType::InsertParagraph => editor.insert_break(),
            InputType::InsertFromComposition
            | InputType::InsertFromDrop
            | InputType::InsertFromPaste
            | InputType::InsertFromYank
            | InputType::InsertReplacementText
            | InputType::InsertText => {
                if event.input_type == InputType::InsertFromComposition && self.locator.composing {
                    // Safari commits before `compositionend`.
                    self.locator.composing = false;
                }
                if let Some(transfer) = &event.transfer {
                    self.insert_data(transfer);
                } else if let Some(data) = &event.data {
                    if native {
                        self.state
                            .deferred
                            .push(DeferredOperation::InsertText(data.clone()));
                    } else {
                        let result = self.editor.insert_text(data);
                        self.log_model("insert text", result);
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        };
        self.log_model(event_name(&event.input_type), result);
    }

    /// Native insertion is unsafe at the end of an inline, where the browser
    /// would extend the wrong element, and in `pre` blocks with tabs, where
    /// it may rewrite whitespace.
    fn native_insertion_allowed(&self, anchor: &Point, env: &dyn DomEnvironment) -> bool {
        let editor = &self.editor;
        if let Some(inline) = editor.inline_above(&anchor.path) {
            if editor.is_end(anchor, &inline) {
                return false;
            }
        }
        let Ok(dom) = self.bridge().to_dom_point(anchor) else {
            return false;
        };
        if env.is_white_space_pre(dom.node.element()) {
            let has_tab = editor
                .block_above(&anchor.path)
                .is_some_and(|block| editor.string(&block).contains('\t'));
            if has_tab {
                return false;
            }
        }
        true
    }
}

/// Unit and direction of a deletion, `true` meaning backward. `None` for
/// deletions without a direction, such as cut and drag.
fn deletion_direction(input_type: &InputType) -> Option<(TextUnit, bool)> {
    let direction = match input_type {
        InputType::DeleteContentBackward => (TextUnit::Character, true),
        InputType::DeleteContent | InputType::DeleteContentForward => {
            (TextUnit::Character, false)
        }
        InputType::DeleteWordBackward | InputType::DeleteEntireWordBackward => {
            (TextUnit::Word, true)
        }
        InputType::DeleteWordForward | InputType::DeleteEntireWordForward => {
            (TextUnit::Word, false)
        }
        InputType::DeleteSoftLineBackward | InputType::DeleteEntireSoftLine => {
            (TextUnit::Line, true)
        }
        InputType::DeleteSoftLineForward => (TextUnit::Line, false),
        InputType::DeleteHardLineBackward => (TextUnit::Block, true),
        InputType::DeleteHardLineForward => (TextUnit::Block, false),
        _ => return None,
    };
    Some(direction)
}

fn event_name(input_type: &InputType) -> &'static str {
    if input_type.is_deletion() {
        "delete"
    } else {
        "insert"
    }
}
