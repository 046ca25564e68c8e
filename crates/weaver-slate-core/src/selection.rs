//! Selection bridge: DOM positions to document points and back, plus the
//! two-way sync between the native selection and the editor's.
//!
//! DOM positions are expressed against the rendered tree. A text position is
//! the `index`th child of an element with a UTF-16 offset, the way the
//! browser reports it; document offsets count chars.

use std::rc::Rc;

use weaver_slate_model::{Editor, NodeKey, Path, Point, Range, Text};

use crate::editable::Editable;
use crate::error::TranslationError;
use crate::locator::NodeLocator;
use crate::render::ZERO_WIDTH;
use crate::vdom::{DomId, DomIndex, DomRole, StringKind, VElement, VNode};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomNode {
    /// The `index`th child of `parent`, a text node.
    Text { parent: DomId, index: usize },
    Element(DomId),
}

impl DomNode {
    /// The element containing this node, or the node itself.
    pub fn element(&self) -> DomId {
        match self {
            DomNode::Text { parent, .. } => *parent,
            DomNode::Element(id) => *id,
        }
    }
}

/// A DOM boundary point. The offset is in UTF-16 units inside text and in
/// child positions inside an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DomPoint {
    pub node: DomNode,
    pub offset: usize,
}

impl DomPoint {
    pub fn text(parent: DomId, index: usize, offset: usize) -> Self {
        Self {
            node: DomNode::Text { parent, index },
            offset,
        }
    }

    pub fn element(id: DomId, offset: usize) -> Self {
        Self {
            node: DomNode::Element(id),
            offset,
        }
    }
}

/// A DOM range in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomRange {
    pub start: DomPoint,
    pub end: DomPoint,
}

/// Snapshot of the native selection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NativeSelection {
    pub anchor: Option<DomPoint>,
    pub focus: Option<DomPoint>,
    /// Every range of the selection, in document order. Only Firefox reports
    /// more than one.
    pub ranges: Vec<DomRange>,
}

impl NativeSelection {
    pub fn new(anchor: DomPoint, focus: DomPoint) -> Self {
        Self {
            anchor: Some(anchor),
            focus: Some(focus),
            ranges: Vec::new(),
        }
    }

    pub fn collapsed(at: DomPoint) -> Self {
        Self::new(at, at)
    }

    pub fn is_empty(&self) -> bool {
        self.anchor.is_none()
    }

    /// Anchor and focus. With several ranges the outer edges win, and the
    /// focus stays on whichever end it was reported at.
    pub fn endpoints(&self) -> Option<(DomPoint, DomPoint)> {
        if let [first, .., last] = self.ranges.as_slice() {
            let backward = self.focus == Some(first.start);
            return Some(if backward {
                (last.end, first.start)
            } else {
                (first.start, last.end)
            });
        }
        Some((self.anchor?, self.focus?))
    }
}

/// What the browser must do to the native selection.
#[derive(Debug, Clone, PartialEq)]
pub enum DomSelectionUpdate {
    Unchanged,
    RemoveAllRanges,
    /// Composition owns the selection; only move the caret to its end.
    CollapseToEnd,
    SetBaseAndExtent {
        anchor: DomPoint,
        focus: DomPoint,
        /// Scroll the focus leaf into view.
        scroll_into_view: bool,
    },
}

enum Local {
    Text { content: Rc<str>, utf16: usize },
    Edge { at_end: bool },
}

/// Read-only view over a rendered document for position translation.
#[derive(Clone, Copy)]
pub struct DomBridge<'a> {
    editor: &'a Editor,
    locator: &'a NodeLocator,
    dom: &'a DomIndex,
}

impl<'a> DomBridge<'a> {
    pub fn new(editor: &'a Editor, locator: &'a NodeLocator, dom: &'a DomIndex) -> Self {
        Self {
            editor,
            locator,
            dom,
        }
    }

    /// Whether `id` is a rendered element of this editor.
    pub fn has_target(&self, id: DomId) -> bool {
        self.dom.contains(id)
    }

    /// Whether `id` accepts editing: inside the editor and not inside a
    /// non-editable island.
    pub fn is_editable_target(&self, id: DomId) -> bool {
        let Some(target) = self.dom.get(id) else {
            return false;
        };
        if target.has_attr("data-slate-zero-width") {
            return true;
        }
        self.dom.ancestors(id).all(|a| {
            self.dom
                .get(a)
                .is_some_and(|el| el.role == DomRole::Root || !el.is_non_editable())
        })
    }

    /// Whether `id` lies inside a void element of an editable document.
    pub fn is_inside_non_read_only_void(&self, id: DomId) -> bool {
        if self.locator.read_only {
            return false;
        }
        match self.node_at(id) {
            Ok((key, path)) if key != NodeKey::EDITOR => self
                .editor
                .element(&path)
                .is_some_and(|el| self.editor.is_void(el)),
            _ => false,
        }
    }

    pub fn is_selectable_target(&self, id: DomId) -> bool {
        self.is_editable_target(id) || self.is_inside_non_read_only_void(id)
    }

    /// The nearest document node at or above `id`.
    pub fn node_at(&self, id: DomId) -> Result<(NodeKey, Path), TranslationError> {
        if !self.dom.contains(id) {
            return Err(TranslationError::NoMatchingNode(id));
        }
        for ancestor in self.dom.ancestors(id) {
            let el = self
                .dom
                .get(ancestor)
                .ok_or(TranslationError::NoMatchingNode(ancestor))?;
            match el.role {
                DomRole::Element(key) | DomRole::Text(key) => {
                    return self.resolve_key(key).map(|path| (key, path));
                }
                DomRole::Root => return Ok((NodeKey::EDITOR, Path::root())),
                _ => {}
            }
        }
        Err(TranslationError::OutsideEditor)
    }

    fn resolve_key(&self, key: NodeKey) -> Result<Path, TranslationError> {
        let path = self
            .locator
            .path(key)
            .ok_or(TranslationError::NotRendered)?;
        if self.editor.node(&path).map(|n| n.key()) != Some(key) {
            return Err(TranslationError::NotRendered);
        }
        Ok(path)
    }

    /// Map a DOM position onto the document.
    ///
    /// With `exact`, a position inside a void's rendered content (outside
    /// its spacer) or in host-only structure is an error; otherwise it snaps
    /// to the start of that node.
    pub fn to_model_point(&self, point: &DomPoint, exact: bool) -> Result<Point, TranslationError> {
        let (start_id, local) = self.normalize(point)?;
        let mut offset: Option<usize> = None;

        for id in self.dom.ancestors(start_id) {
            let el = self
                .dom
                .get(id)
                .ok_or(TranslationError::NoMatchingNode(id))?;
            match &el.role {
                DomRole::String {
                    start,
                    length,
                    kind,
                    ..
                } => {
                    if offset.is_none() {
                        let local_chars = match (kind, &local) {
                            (StringKind::Literal, Local::Text { content, utf16 }) => {
                                utf16_to_chars(content, *utf16).min(*length)
                            }
                            (StringKind::Literal, Local::Edge { at_end }) => {
                                if *at_end {
                                    *length
                                } else {
                                    0
                                }
                            }
                            (StringKind::ZeroWidth { .. }, _) => 0,
                        };
                        offset = Some(start + local_chars);
                    }
                }
                DomRole::Leaf { start } => {
                    offset.get_or_insert(*start);
                }
                DomRole::Text(key) => {
                    let path = self.resolve_key(*key)?;
                    let len = self
                        .editor
                        .text(&path)
                        .map(Text::len)
                        .ok_or_else(|| TranslationError::NoText(path.clone()))?;
                    return Ok(Point::new(path, offset.unwrap_or(0).min(len)));
                }
                DomRole::Element(key) => {
                    let path = self.resolve_key(*key)?;
                    if exact {
                        let void = self
                            .editor
                            .element(&path)
                            .is_some_and(|e| self.editor.is_void(e));
                        return Err(if void {
                            TranslationError::InsideVoid
                        } else {
                            TranslationError::NoText(path)
                        });
                    }
                    return self
                        .editor
                        .start(&path)
                        .ok_or(TranslationError::NoText(path));
                }
                DomRole::Root => return Err(TranslationError::NotRendered),
                DomRole::Host | DomRole::Spacer | DomRole::Placeholder => {}
            }
        }
        Err(TranslationError::OutsideEditor)
    }

    pub fn to_model_range(
        &self,
        anchor: &DomPoint,
        focus: &DomPoint,
        exact: bool,
    ) -> Result<Range, TranslationError> {
        let anchor_point = self.to_model_point(anchor, exact)?;
        let focus_point = if anchor == focus {
            anchor_point.clone()
        } else {
            self.to_model_point(focus, exact)?
        };
        Ok(Range::new(anchor_point, focus_point))
    }

    pub fn to_model_selection(
        &self,
        native: &NativeSelection,
        exact: bool,
    ) -> Result<Range, TranslationError> {
        let (anchor, focus) = native.endpoints().ok_or(TranslationError::OutsideEditor)?;
        self.to_model_range(&anchor, &focus, exact)
    }

    /// Resolve element positions down to the text they stand for, skipping
    /// placeholders and non-editable islands.
    fn normalize(&self, point: &DomPoint) -> Result<(DomId, Local), TranslationError> {
        match point.node {
            DomNode::Text { parent, index } => {
                let el = self
                    .dom
                    .get(parent)
                    .ok_or(TranslationError::NoMatchingNode(parent))?;
                match el.children.get(index) {
                    Some(VNode::Text(content)) => Ok((
                        parent,
                        Local::Text {
                            content: content.clone(),
                            utf16: point.offset,
                        },
                    )),
                    _ => Err(TranslationError::NoMatchingNode(parent)),
                }
            }
            DomNode::Element(id) => {
                let mut el = self
                    .dom
                    .get(id)
                    .ok_or(TranslationError::NoMatchingNode(id))?
                    .clone();
                let len = el.children.len();
                if len == 0 {
                    return Ok((id, Local::Edge {
                        at_end: point.offset > 0,
                    }));
                }
                let at_end = point.offset >= len;
                let mut index = editable_child(&el, if at_end { len - 1 } else { point.offset }, at_end);
                let at_end = index < point.offset;

                loop {
                    let next = match &el.children[index] {
                        VNode::Text(content) => {
                            let utf16 = if at_end { utf16_len(content) } else { 0 };
                            return Ok((el.id, Local::Text {
                                content: content.clone(),
                                utf16,
                            }));
                        }
                        VNode::Element(child) => child.clone(),
                    };
                    if next.children.is_empty() {
                        return Ok((next.id, Local::Edge { at_end }));
                    }
                    let start = if at_end { next.children.len() - 1 } else { 0 };
                    index = editable_child(&next, start, at_end);
                    el = next;
                }
            }
        }
    }

    /// Map a document point onto the rendered DOM.
    pub fn to_dom_point(&self, point: &Point) -> Result<DomPoint, TranslationError> {
        let no_text = || TranslationError::NoText(point.path.clone());
        let node = self
            .editor
            .node(&point.path)
            .filter(|n| n.is_text())
            .ok_or_else(no_text)?;
        let text_id = self
            .locator
            .dom_of(node.key())
            .ok_or(TranslationError::NotRendered)?;
        let span = self.dom.get(text_id).ok_or(TranslationError::NotRendered)?;
        let offset = if self.editor.void_above(&point.path).is_some() {
            0
        } else {
            point.offset
        };

        let mut strings = Vec::new();
        collect_strings(span, &mut strings);
        let mut start = 0;
        for (i, string) in strings.iter().enumerate() {
            let DomRole::String { length, .. } = string.role else {
                continue;
            };
            let Some(first) = string.children.first() else {
                continue;
            };
            let end = start + length;

            if offset == end {
                let next = strings
                    .get(i + 1)
                    .filter(|s| s.has_attr("data-slate-mark-placeholder"));
                if let Some(next) = next {
                    return Ok(match next.children.first() {
                        Some(VNode::Text(content)) => {
                            let at = usize::from(content.starts_with(ZERO_WIDTH));
                            DomPoint::text(next.id, 0, at)
                        }
                        _ => DomPoint::element(next.id, 0),
                    });
                }
            }

            if offset <= end {
                let local = offset.saturating_sub(start).min(length);
                return Ok(match first {
                    VNode::Text(content) => {
                        let utf16 = chars_to_utf16(content, local).min(utf16_len(content));
                        DomPoint::text(string.id, 0, utf16)
                    }
                    VNode::Element(_) => DomPoint::element(string.id, 0),
                });
            }
            start = end;
        }
        Err(no_text())
    }

    pub fn to_dom_range(&self, range: &Range) -> Result<DomRange, TranslationError> {
        let anchor = self.to_dom_point(&range.anchor)?;
        let focus = if range.is_collapsed() {
            anchor
        } else {
            self.to_dom_point(&range.focus)?
        };
        Ok(if range.is_backward() {
            DomRange {
                start: focus,
                end: anchor,
            }
        } else {
            DomRange {
                start: anchor,
                end: focus,
            }
        })
    }
}

/// Carry `range` through the operations applied since `mark`.
pub fn transform_range_since(editor: &Editor, range: &Range, mark: usize) -> Option<Range> {
    let anchor = editor.transform_point_since(&range.anchor, mark)?;
    let focus = editor.transform_point_since(&range.focus, mark)?;
    Some(Range::new(anchor, focus))
}

fn editable_child(el: &VElement, index: usize, backward: bool) -> usize {
    let usable = |i: &usize| match &el.children[*i] {
        VNode::Element(c) => !c.is_non_editable() && c.role != DomRole::Placeholder,
        VNode::Text(_) => true,
    };
    let len = el.children.len();
    let ahead = || (index..len).find(usable);
    let behind = || (0..=index).rev().find(usable);
    let found = if backward {
        behind().or_else(ahead)
    } else {
        ahead().or_else(behind)
    };
    found.unwrap_or(index)
}

fn collect_strings(el: &VElement, out: &mut Vec<Rc<VElement>>) {
    for child in el.element_children() {
        match child.role {
            DomRole::Placeholder => {}
            DomRole::String { .. } => out.push(child.clone()),
            _ => collect_strings(child, out),
        }
    }
}

fn utf16_len(s: &str) -> usize {
    s.chars().map(char::len_utf16).sum()
}

fn utf16_to_chars(s: &str, utf16: usize) -> usize {
    let mut units = 0;
    for (i, c) in s.chars().enumerate() {
        if units >= utf16 {
            return i;
        }
        units += c.len_utf16();
    }
    s.chars().count()
}

fn chars_to_utf16(s: &str, chars: usize) -> usize {
    s.chars().take(chars).map(char::len_utf16).sum()
}

impl Editable {
    pub fn bridge(&self) -> DomBridge<'_> {
        DomBridge::new(&self.editor, &self.locator, &self.dom)
    }

    /// Note a native `selectionchange`. Returns whether the browser must
    /// request an animation frame to flush it.
    pub fn schedule_selection_change(&mut self) -> bool {
        !std::mem::replace(&mut self.state.selection_change_pending, true)
    }

    /// Apply a scheduled selection change, if any.
    pub fn flush_selection_change(
        &mut self,
        native: Option<&NativeSelection>,
        active: Option<DomId>,
    ) {
        if std::mem::take(&mut self.state.selection_change_pending) {
            self.on_dom_selection_change(native, active);
        }
    }

    /// Adopt the native selection into the editor. `active` is the focused
    /// element when it belongs to the editor.
    pub fn on_dom_selection_change(
        &mut self,
        native: Option<&NativeSelection>,
        active: Option<DomId>,
    ) {
        let composing = self.locator.composing;
        if (composing && !self.quirks.android)
            || self.state.is_updating_selection
            || self.state.is_dragging_internally
        {
            return;
        }

        if active == Some(DomId::ROOT) {
            self.state.latest_element = active;
            self.locator.focused = true;
        } else {
            self.locator.focused = false;
        }

        let Some(native) = native else {
            let result = self.editor.deselect();
            self.log_model("deselect", result);
            self.flush_changes();
            return;
        };

        let bridge = DomBridge::new(&self.editor, &self.locator, &self.dom);
        let endpoints = native.endpoints();
        let anchor_selectable =
            endpoints.is_some_and(|(a, _)| bridge.is_selectable_target(a.node.element()));
        let focus_in_editor = endpoints.is_some_and(|(_, f)| bridge.has_target(f.node.element()));

        let mut adopted = None;
        if anchor_selectable && focus_in_editor {
            match bridge.to_model_selection(native, false) {
                Ok(range) => adopted = Some(range),
                Err(error) => tracing::debug!(
                    target: "weaver::selection",
                    %error,
                    "native selection does not map onto the document"
                ),
            }
        }

        match adopted {
            Some(range) if !composing => {
                let result = self.editor.select(range);
                self.log_model("select", result);
            }
            Some(_) => {}
            // A read-only editor must not keep a caret outside what it shows.
            None if self.props.read_only => {
                let result = self.editor.deselect();
                self.log_model("deselect", result);
            }
            None => {}
        }
        self.flush_changes();
    }

    /// Bring the native selection in line with the editor's after a render.
    /// With `force` the native selection is rewritten even when it already
    /// maps onto the editor's selection.
    pub fn sync_dom_selection(
        &mut self,
        native: Option<&NativeSelection>,
        force: bool,
    ) -> DomSelectionUpdate {
        let Some(native) = native else {
            return DomSelectionUpdate::Unchanged;
        };
        if !self.locator.focused || native.ranges.len() > 1 {
            return DomSelectionUpdate::Unchanged;
        }

        let selection = self.editor.selection().cloned();
        let has_dom_selection = !native.is_empty();
        if selection.is_none() && !has_dom_selection {
            return DomSelectionUpdate::Unchanged;
        }

        let bridge = DomBridge::new(&self.editor, &self.locator, &self.dom);
        let in_editor = native
            .endpoints()
            .is_some_and(|(a, f)| bridge.has_target(a.node.element()) && bridge.has_target(f.node.element()));

        if let (true, Some(selection)) = (has_dom_selection && in_editor && !force, &selection) {
            if let Ok(current) = bridge.to_model_selection(native, true) {
                if &current == selection {
                    if !self.state.has_mark_placeholder {
                        return DomSelectionUpdate::Unchanged;
                    }
                    let anchor_parent = native.anchor.and_then(|a| match a.node {
                        DomNode::Text { parent, .. } => Some(parent),
                        DomNode::Element(id) => self.dom.parent(id),
                    });
                    let in_mark_placeholder = anchor_parent
                        .and_then(|id| self.dom.get(id))
                        .is_some_and(|el| el.has_attr("data-slate-mark-placeholder"));
                    if in_mark_placeholder {
                        return DomSelectionUpdate::Unchanged;
                    }
                }
            }
        }

        if let Some(selection) = &selection {
            if !self.editor.has_range(selection) {
                let adopted = bridge.to_model_selection(native, false).ok();
                let result = match adopted {
                    Some(range) => self.editor.select(range),
                    None => self.editor.deselect(),
                };
                self.log_model("adopt native selection", result);
                self.flush_changes();
                return DomSelectionUpdate::Unchanged;
            }
        }

        let target = selection.as_ref().map(|s| {
            bridge
                .to_dom_range(s)
                .map(|range| (s.clone(), range))
        });
        self.state.is_updating_selection = true;
        match target {
            Some(Ok((selection, range))) => {
                if self.locator.composing && !self.quirks.android {
                    return DomSelectionUpdate::CollapseToEnd;
                }
                let (anchor, focus) = if selection.is_backward() {
                    (range.end, range.start)
                } else {
                    (range.start, range.end)
                };
                let scroll_into_view = match &self.props.scroll_selection_into_view {
                    Some(scroll) => {
                        scroll(&self.editor, &range);
                        false
                    }
                    None => selection.is_collapsed(),
                };
                tracing::trace!(
                    target: "weaver::selection",
                    anchor = ?anchor,
                    focus = ?focus,
                    "writing DOM selection"
                );
                DomSelectionUpdate::SetBaseAndExtent {
                    anchor,
                    focus,
                    scroll_into_view,
                }
            }
            Some(Err(error)) => {
                tracing::debug!(
                    target: "weaver::selection",
                    %error,
                    "selection is not rendered, clearing DOM selection"
                );
                DomSelectionUpdate::RemoveAllRanges
            }
            None => DomSelectionUpdate::RemoveAllRanges,
        }
    }

    /// The DOM selection write from [`Editable::sync_dom_selection`] has been
    /// observed by the browser.
    pub fn selection_settled(&mut self) {
        self.state.is_updating_selection = false;
    }
}
