//! Focus, pointer and drag handling.

use weaver_slate_model::{NodeKey, Path, Range, TextUnit};

use super::{ClipboardPayload, DropEvent, FocusEvent};
use crate::editable::Editable;
use crate::selection::transform_range_since;
use crate::vdom::DomId;

const TRIPLE_CLICK: u32 = 3;

impl Editable {
    /// Handle `focus`. Returns whether the browser must move focus to the
    /// root element instead of the nested element that received it.
    pub fn focus(&mut self, event: &FocusEvent) -> bool {
        if self.props.read_only
            || self.state.is_updating_selection
            || !self.is_editable_target(event.target)
        {
            return false;
        }
        self.state.latest_element = event.active;
        // Firefox breaks keyboard navigation when focus lands on a nested
        // editable element.
        if self.quirks.firefox && event.target != Some(DomId::ROOT) {
            return true;
        }
        self.locator.focused = true;
        tracing::trace!(target: "weaver::input", "focus");
        false
    }

    /// Handle `blur`. Returns whether the browser must clear the native
    /// selection, which Safari keeps after focus leaves.
    pub fn blur(&mut self, event: &FocusEvent) -> bool {
        if self.props.read_only
            || self.state.is_updating_selection
            || !self.is_selectable_target(event.target)
        {
            return false;
        }
        // The window lost focus; the editor keeps it for when it returns.
        if self.state.latest_element.is_some() && self.state.latest_element == event.active {
            return false;
        }
        if let Some(related) = event.related {
            if related == DomId::ROOT {
                return false;
            }
            if self
                .dom
                .get(related)
                .is_some_and(|el| el.has_attr("data-slate-spacer"))
            {
                return false;
            }
            // Focus moved to a non-editable part of a non-void element.
            if let Ok((key, path)) = self.bridge().node_at(related) {
                let non_void = key != NodeKey::EDITOR
                    && self
                        .editor
                        .element(&path)
                        .is_some_and(|el| !self.editor.is_void(el));
                if non_void {
                    return false;
                }
            }
        }

        if self.locator.composing {
            let dropped = self.state.deferred.len();
            self.state.deferred.clear();
            self.state.composition_aborted = true;
            self.set_composing(false);
            tracing::debug!(
                target: "weaver::input",
                dropped,
                "blur stopped an active composition"
            );
        }
        self.locator.focused = false;
        self.quirks.webkit
    }

    /// Handle `click` with the event's `detail` click count.
    pub fn click(&mut self, target: Option<DomId>, detail: u32) {
        if !self.has_target(target) {
            return;
        }
        let Some(Ok((key, path))) = target.map(|t| self.bridge().node_at(t)) else {
            return;
        };
        if key == NodeKey::EDITOR {
            return;
        }

        let editor = &self.editor;
        if detail == TRIPLE_CLICK {
            let is_block = editor.node(&path).is_some_and(|n| editor.is_block(n));
            let block = if is_block {
                Some(path.clone())
            } else {
                editor.block_above(&path)
            };
            let block = block.unwrap_or_else(|| Path::from([path[0]]));
            if let Some(range) = editor.range(&block) {
                let result = self.editor.select(range);
                self.log_model("select block", result);
                self.flush_changes();
            }
            return;
        }
        if self.props.read_only {
            return;
        }

        let (Some(start), Some(end)) = (editor.start(&path), editor.end(&path)) else {
            return;
        };
        let start_void = editor.void_above(&start.path);
        if start_void.is_some() && start_void == editor.void_above(&end.path) {
            let result = self.editor.select(Range::collapsed(start));
            self.log_model("select void", result);
            self.flush_changes();
        }
    }

    /// Handle `dragover`. Returns whether to cancel it so that a drop over
    /// a void is allowed.
    pub fn drag_over(&self, target: Option<DomId>) -> bool {
        let Some(Ok((key, path))) = target
            .filter(|t| self.bridge().has_target(*t))
            .map(|t| self.bridge().node_at(t))
        else {
            return false;
        };
        key != NodeKey::EDITOR
            && self
                .editor
                .element(&path)
                .is_some_and(|el| self.editor.is_void(el))
    }

    /// Handle `dragstart`. Returns the data to place on the drag.
    pub fn drag_start(&mut self, target: Option<DomId>) -> Option<ClipboardPayload> {
        if self.props.read_only || !self.has_target(target) {
            return None;
        }
        let (_, path) = self.bridge().node_at(target?).ok()?;
        if let Some(void) = self.editor.void_above(&path) {
            if let Some(range) = self.editor.range(&void) {
                let result = self.editor.select(range);
                self.log_model("select dragged void", result);
            }
        }
        self.state.is_dragging_internally = true;
        self.flush_changes();
        self.fragment_data()
    }

    /// Handle `drop`. Returns whether the event was taken over; the browser
    /// then focuses the editor if needed.
    pub fn drop_data(&mut self, event: &DropEvent) -> bool {
        if self.props.read_only || !self.has_target(event.target) {
            return false;
        }
        let dragged = self.editor.selection().cloned();
        let Some(range) = self.drop_range(event) else {
            tracing::debug!(target: "weaver::input", "drop position does not map onto the document");
            self.state.is_dragging_internally = false;
            return true;
        };

        let result = self.editor.select(range.clone());
        self.log_model("select drop point", result);
        if self.state.is_dragging_internally {
            let movable = dragged
                .filter(|d| *d != range && self.editor.void_above(&range.anchor.path).is_none());
            if let Some(dragged) = movable {
                let mark = self.editor.operations().len();
                let result = self.editor.delete_range(&dragged);
                self.log_model("remove dragged content", result);
                if let Some(moved) = transform_range_since(&self.editor, &range, mark) {
                    let result = self.editor.select(moved);
                    self.log_model("select drop point", result);
                }
            }
        }
        self.insert_data(&event.data);
        self.state.is_dragging_internally = false;
        self.flush_changes();
        true
    }

    /// Handle `dragend` and the window-level `drop`.
    pub fn drag_end(&mut self) {
        self.state.is_dragging_internally = false;
    }

    /// Where a drop lands. Over a void it goes to the nearer side.
    fn drop_range(&self, event: &DropEvent) -> Option<Range> {
        let bridge = self.bridge();
        let editor = &self.editor;
        if let Some(Ok((key, path))) = event.target.map(|t| bridge.node_at(t)) {
            let void = key != NodeKey::EDITOR
                && editor.element(&path).is_some_and(|el| editor.is_void(el));
            if void {
                let side = if event.before_midpoint {
                    editor
                        .start(&path)
                        .and_then(|p| editor.point_before(&p, TextUnit::Character))
                } else {
                    editor
                        .end(&path)
                        .and_then(|p| editor.point_after(&p, TextUnit::Character))
                };
                if let Some(point) = side {
                    return Some(Range::collapsed(point));
                }
            }
        }
        let caret = event.caret?;
        bridge
            .to_model_point(&caret, false)
            .ok()
            .map(Range::collapsed)
    }
}
