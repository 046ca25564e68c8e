//! The editable root: document, render state and transient UI state for one
//! mounted editor.
//!
//! The browser layer owns an [`Editable`] behind a `RefCell`, forwards native
//! events to its handlers, patches the DOM from [`Editable::tree`] after each
//! handler, and applies the selection update it asks for.

use std::rc::Rc;
use std::time::Duration;

use smol_str::SmolStr;
use weaver_slate_model::{Attrs, Editor, ModelError, Node, Path, Range};

use crate::decoration::Decoration;
use crate::error::EditableError;
use crate::hotkeys::Hotkeys;
use crate::input::{BeforeInput, DeferredOperation, HistoryAction, KeyDown};
use crate::locator::NodeLocator;
use crate::platform::PlatformQuirks;
use crate::render::{
    DecorateFn, RenderElementFn, RenderElementProps, RenderHooks, RenderLeafFn, RenderLeafProps,
    RenderPlaceholderFn, RenderPlaceholderProps, RenderStats, Renderer, RenderCache,
};
use crate::selection::DomRange;
use crate::vdom::{DomId, DomIndex, DomRole, VElement, VNode};

pub type ScrollIntoViewFn = Rc<dyn Fn(&Editor, &DomRange)>;
pub type BeforeInputHook = Rc<dyn Fn(&mut Editor, &BeforeInput) -> bool>;
pub type KeyDownHook = Rc<dyn Fn(&mut Editor, &KeyDown) -> bool>;
pub type HistoryHook = Rc<dyn Fn(&mut Editor, HistoryAction)>;

/// Host configuration of an editable root.
#[derive(Clone, Default)]
pub struct EditableProps {
    pub hooks: RenderHooks,
    /// Replaces the default scroll of a collapsed selection into view.
    pub scroll_selection_into_view: Option<ScrollIntoViewFn>,
    /// Runs before the built-in `beforeinput` handling; `true` means handled.
    pub on_dom_before_input: Option<BeforeInputHook>,
    /// Runs before the built-in keydown handling; `true` means handled.
    pub on_key_down: Option<KeyDownHook>,
    pub on_history: Option<HistoryHook>,
    pub placeholder: Option<SmolStr>,
    pub read_only: bool,
    pub disable_default_styles: bool,
    pub autofocus: bool,
    /// Extra attributes for the root element.
    pub attributes: Vec<(SmolStr, SmolStr)>,
    /// Extra style for the root element, applied after the defaults.
    pub style: Vec<(SmolStr, SmolStr)>,
}

impl std::fmt::Debug for EditableProps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditableProps")
            .field("hooks", &self.hooks)
            .field("placeholder", &self.placeholder)
            .field("read_only", &self.read_only)
            .field("disable_default_styles", &self.disable_default_styles)
            .field("autofocus", &self.autofocus)
            .finish_non_exhaustive()
    }
}

impl EditableProps {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn placeholder(mut self, text: impl Into<SmolStr>) -> Self {
        self.placeholder = Some(text.into());
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn autofocus(mut self, autofocus: bool) -> Self {
        self.autofocus = autofocus;
        self
    }

    pub fn disable_default_styles(mut self, disable: bool) -> Self {
        self.disable_default_styles = disable;
        self
    }

    pub fn attribute(mut self, name: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn style(mut self, property: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        self.style.push((property.into(), value.into()));
        self
    }

    pub fn decorate(
        mut self,
        f: impl Fn(&Editor, Option<&Node>, &Path) -> Vec<Decoration> + 'static,
    ) -> Self {
        self.hooks.decorate = Some(Rc::new(f) as DecorateFn);
        self
    }

    pub fn render_element(
        mut self,
        f: impl Fn(RenderElementProps<'_>) -> VElement + 'static,
    ) -> Self {
        self.hooks.render_element = Some(Rc::new(f) as RenderElementFn);
        self
    }

    pub fn render_leaf(mut self, f: impl Fn(RenderLeafProps<'_>) -> VElement + 'static) -> Self {
        self.hooks.render_leaf = Some(Rc::new(f) as RenderLeafFn);
        self
    }

    pub fn render_placeholder(
        mut self,
        f: impl Fn(RenderPlaceholderProps) -> VElement + 'static,
    ) -> Self {
        self.hooks.render_placeholder = Some(Rc::new(f) as RenderPlaceholderFn);
        self
    }

    pub fn scroll_selection_into_view(mut self, f: impl Fn(&Editor, &DomRange) + 'static) -> Self {
        self.scroll_selection_into_view = Some(Rc::new(f));
        self
    }

    pub fn on_dom_before_input(
        mut self,
        f: impl Fn(&mut Editor, &BeforeInput) -> bool + 'static,
    ) -> Self {
        self.on_dom_before_input = Some(Rc::new(f));
        self
    }

    pub fn on_key_down(mut self, f: impl Fn(&mut Editor, &KeyDown) -> bool + 'static) -> Self {
        self.on_key_down = Some(Rc::new(f));
        self
    }

    pub fn on_history(mut self, f: impl Fn(&mut Editor, HistoryAction) + 'static) -> Self {
        self.on_history = Some(Rc::new(f));
        self
    }
}

/// Transient UI state of one editable root.
#[derive(Debug, Clone, Default)]
pub struct EditableState {
    pub is_dragging_internally: bool,
    /// Set while the DOM selection is being written, until the browser
    /// reports the write settled.
    pub is_updating_selection: bool,
    /// Focused element when the editor last gained focus.
    pub latest_element: Option<DomId>,
    pub has_mark_placeholder: bool,
    /// A `beforeinput` is being interpreted.
    pub processing: bool,
    /// Selection to restore after a `beforeinput` that retargeted it, with
    /// the operation count it was taken at.
    pub user_selection: Option<(Range, usize)>,
    /// Insertions the browser performs natively, applied to the model on
    /// the following `input` event.
    pub deferred: Vec<DeferredOperation>,
    /// Composition was force-stopped by a blur; its end is ignored.
    pub composition_aborted: bool,
    /// Marks shown by the mark placeholder, used when a composition commits.
    pub pending_insertion_marks: Option<Attrs>,
    pub placeholder_height: Option<f64>,
    /// The placeholder delay elapsed.
    pub placeholder_ready: bool,
    pub placeholder_timer_pending: bool,
    /// A selection change is waiting for the next animation frame.
    pub selection_change_pending: bool,
}

/// One mounted editable document.
pub struct Editable {
    pub(crate) editor: Editor,
    pub(crate) props: EditableProps,
    pub(crate) quirks: PlatformQuirks,
    pub(crate) hotkeys: Hotkeys,
    pub(crate) locator: NodeLocator,
    pub(crate) cache: RenderCache,
    pub(crate) dom: DomIndex,
    pub(crate) state: EditableState,
    tree: Rc<VElement>,
    last_stats: RenderStats,
    /// Pending marks as of the last render.
    rendered_marks: Option<Attrs>,
}

impl Editable {
    /// Validate the document and produce the first render.
    pub fn new(
        editor: Editor,
        props: EditableProps,
        quirks: PlatformQuirks,
    ) -> Result<Self, EditableError> {
        editor.validate()?;
        if let Some(selection) = editor.selection() {
            if !editor.has_range(selection) {
                return Err(EditableError::InvalidSelection(selection.clone()));
            }
        }

        let mut locator = NodeLocator::new();
        locator.refresh(&editor, None);
        locator.root = Some(DomId::ROOT);
        locator.read_only = props.read_only;

        let mut editable = Self {
            hotkeys: Hotkeys::new(quirks.apple),
            editor,
            props,
            quirks,
            locator,
            cache: RenderCache::new(),
            dom: DomIndex::new(),
            state: EditableState::default(),
            tree: Rc::new(VElement::new("div")),
            last_stats: RenderStats::default(),
            rendered_marks: None,
        };
        editable.editor.take_operations();
        editable.render();
        tracing::debug!(
            target: "weaver::editable",
            blocks = editable.editor.children().len(),
            nodes = editable.locator.len(),
            "editable created"
        );
        Ok(editable)
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    /// Mutable access for host commands. Call [`Editable::flush_changes`]
    /// afterwards.
    pub fn editor_mut(&mut self) -> &mut Editor {
        &mut self.editor
    }

    pub fn props(&self) -> &EditableProps {
        &self.props
    }

    pub fn quirks(&self) -> &PlatformQuirks {
        &self.quirks
    }

    pub fn hotkeys(&self) -> &Hotkeys {
        &self.hotkeys
    }

    pub fn locator(&self) -> &NodeLocator {
        &self.locator
    }

    pub fn dom(&self) -> &DomIndex {
        &self.dom
    }

    pub fn state(&self) -> &EditableState {
        &self.state
    }

    /// The last rendered tree, rooted at [`DomId::ROOT`].
    pub fn tree(&self) -> &Rc<VElement> {
        &self.tree
    }

    pub fn last_render_stats(&self) -> RenderStats {
        self.last_stats
    }

    pub fn is_composing(&self) -> bool {
        self.locator.composing
    }

    pub fn is_focused(&self) -> bool {
        self.locator.focused
    }

    pub fn is_read_only(&self) -> bool {
        self.props.read_only
    }

    pub fn set_read_only(&mut self, read_only: bool) {
        if self.props.read_only != read_only {
            self.props.read_only = read_only;
            self.locator.read_only = read_only;
            self.render();
        }
    }

    pub(crate) fn log_model(&self, action: &str, result: Result<(), ModelError>) {
        if let Err(error) = result {
            tracing::warn!(target: "weaver::input", action, %error, "model transform failed");
        }
    }

    pub(crate) fn set_composing(&mut self, composing: bool) {
        if self.locator.composing != composing {
            self.locator.composing = composing;
            tracing::trace!(target: "weaver::input", composing, "composition state");
            self.render();
        }
    }

    /// Whether the placeholder decoration is shown.
    pub fn show_placeholder(&self) -> bool {
        let editor = &self.editor;
        self.props.placeholder.is_some()
            && editor.children().len() == 1
            && editor.texts().len() == 1
            && editor.string(&[]).is_empty()
            && !self.locator.composing
    }

    /// Drain the editor's operations, refresh the locator for them and
    /// re-render. Returns whether anything changed.
    pub fn flush_changes(&mut self) -> bool {
        let ops = self.editor.take_operations();
        if ops.is_empty() {
            // Pending marks change without an operation.
            if self.editor.pending_marks() != self.rendered_marks.as_ref() {
                self.render();
                return true;
            }
            return false;
        }
        let removed = self.locator.refresh_batch(&self.editor, &ops);
        for key in &removed {
            self.cache.evict(*key, &mut self.dom);
        }
        self.render();
        tracing::debug!(
            target: "weaver::editable",
            ops = ops.len(),
            removed = removed.len(),
            rendered = self.last_stats.rendered,
            reused = self.last_stats.reused,
            "flushed changes"
        );
        true
    }

    /// Re-run decoration for every node, after the host's decorate
    /// callback changed its output.
    pub fn redecorate(&mut self) {
        self.cache.invalidate();
        self.render();
    }

    /// The placeholder delay elapsed.
    pub fn reveal_placeholder(&mut self) {
        self.state.placeholder_timer_pending = false;
        if self.show_placeholder() && !self.state.placeholder_ready {
            self.state.placeholder_ready = true;
            self.render();
        }
    }

    /// Delay after which the browser must call
    /// [`Editable::reveal_placeholder`], when a timer is needed.
    pub fn placeholder_timer(&mut self) -> Option<Duration> {
        if self.show_placeholder()
            && !self.state.placeholder_ready
            && !self.state.placeholder_timer_pending
        {
            self.state.placeholder_timer_pending = true;
            return Some(self.quirks.placeholder_delay());
        }
        None
    }

    /// Measured height of the placeholder, or `None` once it is gone.
    pub fn set_placeholder_height(&mut self, height: Option<f64>) {
        if self.state.placeholder_height != height {
            self.state.placeholder_height = height;
            self.render();
        }
    }

    /// Render the document, reusing every unchanged node.
    pub fn render(&mut self) -> Rc<VElement> {
        let show_placeholder = self.show_placeholder();
        if !show_placeholder {
            self.state.placeholder_ready = false;
        } else if self.quirks.placeholder_delay().is_zero() {
            self.state.placeholder_ready = true;
        }
        let decorations = self.root_decorations(show_placeholder);
        self.rendered_marks = self.editor.pending_marks().cloned();

        let mut renderer = Renderer::new(
            &self.editor,
            &self.props.hooks,
            &self.quirks,
            &mut self.cache,
            &mut self.locator,
            &mut self.dom,
        )
        .read_only(self.props.read_only)
        .placeholder_ready(self.state.placeholder_ready);
        let (children, stats) = renderer.render_root(&decorations);
        self.last_stats = stats;

        let root = Rc::new(self.root_element(children));
        self.dom.register(&root, None);
        self.locator.placeholder = if show_placeholder && self.state.placeholder_ready {
            find_role(&root, &DomRole::Placeholder)
        } else {
            None
        };
        if self.locator.placeholder.is_none() && self.state.placeholder_height.is_some() {
            self.state.placeholder_height = None;
            let root = Rc::new(self.root_element(root.children.clone()));
            self.dom.register(&root, None);
            self.tree = root;
        } else {
            self.tree = root;
        }
        self.tree.clone()
    }

    fn root_decorations(&mut self, show_placeholder: bool) -> Vec<Decoration> {
        let editor = &self.editor;
        let mut decorations = match &self.props.hooks.decorate {
            Some(decorate) => decorate(editor, None, &Path::root()),
            None => Vec::new(),
        };

        if show_placeholder {
            if let (Some(text), Some(start)) = (&self.props.placeholder, editor.start(&[])) {
                decorations.push(Decoration::placeholder(start, text.clone()));
            }
        }

        self.state.has_mark_placeholder = false;
        self.state.pending_insertion_marks = None;
        let selection = editor.selection().filter(|s| s.is_collapsed());
        if let (Some(selection), Some(marks)) = (selection, editor.pending_marks()) {
            if let Some(leaf) = editor.text(&selection.anchor.path) {
                if !leaf.marks_equal(marks) {
                    let mut attrs: Attrs = leaf
                        .marks
                        .keys()
                        .map(|k| (k.clone(), serde_json::Value::Null))
                        .collect();
                    attrs.extend(marks.iter().map(|(k, v)| (k.clone(), v.clone())));
                    decorations.push(Decoration::mark_placeholder(
                        selection.anchor.clone(),
                        attrs,
                    ));
                    self.state.has_mark_placeholder = true;
                    self.state.pending_insertion_marks = Some(marks.clone());
                }
            }
        }
        decorations
    }

    fn root_element(&self, children: Vec<VNode>) -> VElement {
        let mut root = VElement::new("div").role(DomRole::Root);
        root.id = DomId::ROOT;
        for (name, value) in &self.props.attributes {
            root = root.attr(name.clone(), value.clone());
        }
        let read_only = self.props.read_only;
        if !read_only {
            root = root.attr("role", "textbox").attr("aria-multiline", "true");
        }
        if !self.quirks.has_before_input {
            root = root
                .attr("spellcheck", "false")
                .attr("autocorrect", "false")
                .attr("autocapitalize", "off");
        }
        root = root
            .attr("data-slate-editor", "true")
            .attr("data-slate-node", "value")
            .attr("contenteditable", if read_only { "false" } else { "true" })
            .attr("zindex", "-1");

        if !self.props.disable_default_styles {
            root = root
                .style("position", "relative")
                .style("white-space", "pre-wrap")
                .style("word-wrap", "break-word");
            if let Some(height) = self.state.placeholder_height {
                root = root.style("min-height", format!("{height}px"));
            }
        }
        for (property, value) in &self.props.style {
            root = root.style(property.clone(), value.clone());
        }
        root.children(children)
    }
}

fn find_role(el: &VElement, role: &DomRole) -> Option<DomId> {
    if &el.role == role {
        return Some(el.id);
    }
    el.element_children().find_map(|c| find_role(c, role))
}

#[cfg(test)]
mod tests;
