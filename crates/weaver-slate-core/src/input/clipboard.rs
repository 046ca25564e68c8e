use weaver_slate_model::encode_fragment;

use super::TransferData;
use crate::editable::Editable;
use crate::vdom::DomId;

/// Data to place on a clipboard or drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardPayload {
    /// Fragment JSON for the fragment MIME type.
    pub fragment: String,
    /// Plain text, blocks separated by newlines.
    pub text: String,
}

impl Editable {
    /// Handle `copy`. Works in read-only editors too.
    pub fn copy(&mut self, target: Option<DomId>) -> Option<ClipboardPayload> {
        if !self.is_selectable_target(target) {
            return None;
        }
        self.fragment_data()
    }

    /// Handle `cut`: copy, then remove the selection or the selected void.
    pub fn cut(&mut self, target: Option<DomId>) -> Option<ClipboardPayload> {
        if self.props.read_only || !self.is_selectable_target(target) {
            return None;
        }
        let payload = self.fragment_data();
        if let Some(selection) = self.editor.selection().cloned() {
            if selection.is_expanded() {
                let result = self.editor.delete_fragment();
                self.log_model("cut selection", result);
            } else if let Some(void) = self.editor.void_above(&selection.anchor.path) {
                let result = self.editor.remove_node(&void);
                self.log_model("cut void", result);
            }
        }
        self.flush_changes();
        payload
    }

    /// Handle `paste`. Returns whether the paste was taken over; otherwise
    /// it arrives again as `beforeinput`.
    pub fn paste(&mut self, target: Option<DomId>, data: &TransferData) -> bool {
        if self.props.read_only || !self.is_editable_target(target) {
            return false;
        }
        // Safari drops the fragment type from paste `beforeinput` events,
        // and no browser fires one for "paste without formatting".
        if !self.quirks.has_before_input || data.is_plain_text_only() || self.quirks.webkit {
            self.insert_data(data);
            self.flush_changes();
            return true;
        }
        false
    }

    /// The selection as clipboard data. A collapsed selection yields
    /// nothing unless it sits in a void, which is then taken whole.
    pub fn fragment_data(&self) -> Option<ClipboardPayload> {
        let editor = &self.editor;
        let selection = editor.selection()?;
        let range = if selection.is_collapsed() {
            let void = editor.void_above(&selection.anchor.path)?;
            editor.range(&void)?
        } else {
            selection.clone()
        };

        let nodes = editor.fragment(&range);
        let fragment = match encode_fragment(&nodes) {
            Ok(fragment) => fragment,
            Err(error) => {
                tracing::warn!(target: "weaver::input", %error, "could not encode fragment");
                return None;
            }
        };
        let text = nodes
            .iter()
            .map(|node| node.string())
            .collect::<Vec<_>>()
            .join("\n");
        Some(ClipboardPayload { fragment, text })
    }
}
