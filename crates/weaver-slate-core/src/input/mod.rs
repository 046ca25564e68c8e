//! Input event interpretation.
//!
//! Each native event the browser layer receives is converted to one of the
//! plain event types here and handed to the matching [`Editable`] handler.
//! Handlers mutate the editor, flush the changes into a fresh render and tell
//! the caller whether to cancel the native default.

mod beforeinput;
mod clipboard;
mod composition;
mod focus;
mod keydown;

#[cfg(test)]
mod tests;

use weaver_slate_model::decode_fragment;

use crate::actions::{InputType, KeyCombo};
use crate::editable::Editable;
use crate::selection::{DomPoint, DomRange};
use crate::vdom::DomId;

pub use clipboard::ClipboardPayload;

/// A `beforeinput` event.
#[derive(Debug, Clone, PartialEq)]
pub struct BeforeInput {
    pub input_type: InputType,
    /// `data` for text insertions.
    pub data: Option<String>,
    /// `dataTransfer` for paste, drop and replacement inputs.
    pub transfer: Option<TransferData>,
    /// First of `getTargetRanges()`.
    pub target_range: Option<DomRange>,
    /// Event target, when it is rendered by this editor.
    pub target: Option<DomId>,
}

impl BeforeInput {
    pub fn new(input_type: InputType, target: Option<DomId>) -> Self {
        Self {
            input_type,
            data: None,
            transfer: None,
            target_range: None,
            target,
        }
    }

    pub fn with_data(mut self, data: impl Into<String>) -> Self {
        self.data = Some(data.into());
        self
    }

    pub fn with_transfer(mut self, transfer: TransferData) -> Self {
        self.transfer = Some(transfer);
        self
    }

    pub fn with_target_range(mut self, range: DomRange) -> Self {
        self.target_range = Some(range);
        self
    }
}

/// Contents of a `DataTransfer`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransferData {
    /// Decoded document fragment JSON.
    pub fragment: Option<String>,
    pub html: Option<String>,
    pub text: Option<String>,
    /// Number of formats on offer.
    pub types: usize,
}

impl TransferData {
    pub fn plain_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            types: 1,
            ..Self::default()
        }
    }

    /// Only non-empty `text/plain` is on offer: "paste without formatting".
    pub fn is_plain_text_only(&self) -> bool {
        self.types == 1 && self.text.as_deref().is_some_and(|t| !t.is_empty())
    }
}

/// A `keydown` event.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyDown {
    pub combo: KeyCombo,
    /// The native event's `isComposing`.
    pub is_composing: bool,
    pub target: Option<DomId>,
}

impl KeyDown {
    pub fn new(combo: KeyCombo, target: Option<DomId>) -> Self {
        Self {
            combo,
            is_composing: false,
            target,
        }
    }
}

/// A `focus` or `blur` event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FocusEvent {
    pub target: Option<DomId>,
    /// `relatedTarget`, when it is rendered by this editor.
    pub related: Option<DomId>,
    /// The document's active element, when it is rendered by this editor.
    pub active: Option<DomId>,
}

/// A `drop` event.
#[derive(Debug, Clone, PartialEq)]
pub struct DropEvent {
    pub target: Option<DomId>,
    /// Caret position under the pointer.
    pub caret: Option<DomPoint>,
    /// Pointer is nearer the start of the target than its end.
    pub before_midpoint: bool,
    pub data: TransferData,
}

/// What the browser should do with the native event after a handler ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeforeInputResult {
    /// Cancel the native default.
    Handled,
    /// Let the browser apply the edit; the model follows on `input`.
    PassThrough,
    /// Not ours to interpret.
    NotHandled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryAction {
    Undo,
    Redo,
}

/// A model edit the browser performs natively first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredOperation {
    InsertText(String),
}

impl Editable {
    /// The native `input` event: apply deferred insertions in order.
    pub fn input(&mut self) {
        for op in std::mem::take(&mut self.state.deferred) {
            match op {
                DeferredOperation::InsertText(text) => {
                    let result = self.editor.insert_text(&text);
                    self.log_model("insert deferred text", result);
                }
            }
        }
        self.flush_changes();
    }

    /// Insert a data transfer: a document fragment when one is on offer,
    /// otherwise its plain text.
    pub(crate) fn insert_data(&mut self, data: &TransferData) {
        if let Some(fragment) = data.fragment.as_deref() {
            match decode_fragment(fragment) {
                Ok(nodes) => {
                    let result = self.editor.insert_fragment(&nodes);
                    self.log_model("insert fragment", result);
                    return;
                }
                Err(error) => tracing::warn!(
                    target: "weaver::input",
                    %error,
                    "ignoring undecodable fragment"
                ),
            }
        }
        if let Some(text) = data.text.as_deref().filter(|t| !t.is_empty()) {
            let result = self.editor.insert_plain_text(text);
            self.log_model("insert plain text", result);
        }
    }

    pub(crate) fn run_history(&mut self, action: HistoryAction) {
        match self.props.on_history.clone() {
            Some(history) => {
                history(&mut self.editor, action);
                tracing::debug!(target: "weaver::input", ?action, "history");
            }
            None => tracing::trace!(target: "weaver::input", ?action, "no history handler"),
        }
    }

    fn is_editable_target(&self, target: Option<DomId>) -> bool {
        target.is_some_and(|t| self.bridge().is_editable_target(t))
    }

    fn is_selectable_target(&self, target: Option<DomId>) -> bool {
        target.is_some_and(|t| self.bridge().is_selectable_target(t))
    }

    fn has_target(&self, target: Option<DomId>) -> bool {
        target.is_some_and(|t| self.bridge().has_target(t))
    }
}
