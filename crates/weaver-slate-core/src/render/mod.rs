//! Tree renderer: document model to virtual DOM.
//!
//! The renderer walks the document top down. Each element and text leaf is
//! rendered into its own output, memoised in a [`RenderCache`] by node key. A
//! node whose content, decorations, selection overlap and render flags are
//! unchanged reuses its previous output and its whole subtree is skipped.
//!
//! Rendering records each child's position in the [`NodeLocator`] before
//! descending into it, binds every node to the id of its root element, and
//! keeps the [`DomIndex`] in step with the outputs it produces.

mod children;
mod element;
mod leaf;
mod string;
mod text;

use std::collections::HashMap;
use std::rc::Rc;
use std::time::Duration;

use smol_str::SmolStr;
use web_time::Instant;
use weaver_slate_model::{Attrs, Editor, Element, Node, NodeKey, Path, Range, Text};

use crate::decoration::{Decoration, decorations_equal};
use crate::locator::NodeLocator;
use crate::platform::PlatformQuirks;
use crate::vdom::{
    Attributes, DomId, DomIdAllocator, DomIndex, VElement, VNode, assign_owned_ids, owned_ids,
};

pub use leaf::Leaf;
pub use string::ZERO_WIDTH;
pub use text::split_leaves;

/// Host decoration callback, called for every node and the editor root.
pub type DecorateFn = Rc<dyn Fn(&Editor, Option<&Node>, &Path) -> Vec<Decoration>>;
pub type RenderElementFn = Rc<dyn Fn(RenderElementProps<'_>) -> VElement>;
pub type RenderLeafFn = Rc<dyn Fn(RenderLeafProps<'_>) -> VElement>;
pub type RenderPlaceholderFn = Rc<dyn Fn(RenderPlaceholderProps) -> VElement>;

/// What a host element renderer receives. The returned element must be
/// built with `VElement::spread(attributes)` and contain `children`.
pub struct RenderElementProps<'a> {
    pub element: &'a Element,
    pub path: &'a Path,
    pub attributes: Attributes,
    pub children: Vec<VNode>,
    /// Whether the selection touches this element.
    pub selected: bool,
    pub inline: bool,
}

pub struct RenderLeafProps<'a> {
    pub leaf: &'a Leaf,
    pub text: &'a Text,
    pub attributes: Attributes,
    pub children: Vec<VNode>,
}

pub struct RenderPlaceholderProps {
    pub placeholder: SmolStr,
    pub attributes: Attributes,
}

/// Host renderers. Unset hooks fall back to plain `div`/`span` output.
#[derive(Clone, Default)]
pub struct RenderHooks {
    pub decorate: Option<DecorateFn>,
    pub render_element: Option<RenderElementFn>,
    pub render_leaf: Option<RenderLeafFn>,
    pub render_placeholder: Option<RenderPlaceholderFn>,
}

impl std::fmt::Debug for RenderHooks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderHooks")
            .field("decorate", &self.decorate.is_some())
            .field("render_element", &self.render_element.is_some())
            .field("render_leaf", &self.render_leaf.is_some())
            .field("render_placeholder", &self.render_placeholder.is_some())
            .finish()
    }
}

/// Inputs besides the node, its decorations and its selection overlap that
/// decide a node's output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderFlags {
    /// Last leaf of its block.
    pub is_last: bool,
    pub read_only: bool,
    /// Text inside a void element: the void's text length.
    pub void_length: Option<usize>,
    /// Last child of a non-inline element whose text is empty.
    pub empty_block_tail: bool,
    pub placeholder_ready: bool,
}

#[derive(Debug, Clone)]
struct CachedRender {
    node: Rc<Node>,
    decorations: Vec<Decoration>,
    selection: Option<Range>,
    flags: RenderFlags,
    generation: u64,
    output: Rc<VElement>,
}

/// Previous output of every rendered node.
#[derive(Debug, Default)]
pub struct RenderCache {
    entries: HashMap<NodeKey, CachedRender>,
    ids: DomIdAllocator,
    generation: u64,
}

impl RenderCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn output(&self, key: NodeKey) -> Option<&Rc<VElement>> {
        self.entries.get(&key).map(|c| &c.output)
    }

    fn lookup(
        &self,
        node: &Rc<Node>,
        decorations: &[Decoration],
        selection: Option<&Range>,
        flags: RenderFlags,
    ) -> Option<Rc<VElement>> {
        let cached = self.entries.get(&node.key())?;
        let hit = Rc::ptr_eq(&cached.node, node)
            && decorations_equal(&cached.decorations, decorations)
            && cached.selection.as_ref() == selection
            && cached.flags == flags
            && cached.generation == self.generation;
        hit.then(|| cached.output.clone())
    }

    /// Forget a node that left the document, dropping its DOM entries.
    pub fn evict(&mut self, key: NodeKey, dom: &mut DomIndex) {
        if let Some(cached) = self.entries.remove(&key) {
            dom.unregister(&cached.output);
        }
    }

    /// Make every memoised output stale so the next render rebuilds all
    /// nodes. DOM ids are kept, so the browser still patches in place.
    pub fn invalidate(&mut self) {
        self.generation += 1;
    }

    pub fn clear(&mut self, dom: &mut DomIndex) {
        for (_, cached) in self.entries.drain() {
            dom.unregister(&cached.output);
        }
    }

    fn fresh_id(&mut self) -> DomId {
        self.ids.fresh()
    }
}

/// Counters for one render pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderStats {
    pub rendered: usize,
    pub reused: usize,
    pub elapsed: Duration,
}

/// One render pass over the document.
pub struct Renderer<'a> {
    pub editor: &'a Editor,
    pub hooks: &'a RenderHooks,
    pub quirks: &'a PlatformQuirks,
    pub read_only: bool,
    pub placeholder_ready: bool,
    pub cache: &'a mut RenderCache,
    pub locator: &'a mut NodeLocator,
    pub dom: &'a mut DomIndex,
    stats: RenderStats,
}

impl<'a> Renderer<'a> {
    pub fn new(
        editor: &'a Editor,
        hooks: &'a RenderHooks,
        quirks: &'a PlatformQuirks,
        cache: &'a mut RenderCache,
        locator: &'a mut NodeLocator,
        dom: &'a mut DomIndex,
    ) -> Self {
        Self {
            editor,
            hooks,
            quirks,
            read_only: false,
            placeholder_ready: true,
            cache,
            locator,
            dom,
            stats: RenderStats::default(),
        }
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    pub fn placeholder_ready(mut self, ready: bool) -> Self {
        self.placeholder_ready = ready;
        self
    }

    /// Render the editor's top-level children under `decorations`.
    pub fn render_root(&mut self, decorations: &[Decoration]) -> (Vec<VNode>, RenderStats) {
        let started = Instant::now();
        let editor = self.editor;
        let selection = editor.selection().cloned();
        let children = self.render_children(
            NodeKey::EDITOR,
            None,
            editor.children(),
            &Path::root(),
            decorations,
            selection.as_ref(),
        );
        self.stats.elapsed = started.elapsed();
        if tracing::enabled!(target: "weaver::render", tracing::Level::TRACE) {
            tracing::trace!(
                target: "weaver::render",
                rendered = self.stats.rendered,
                reused = self.stats.reused,
                elapsed_us = self.stats.elapsed.as_micros() as u64,
                "render pass"
            );
        }
        (children, self.stats)
    }

    fn base_flags(&self) -> RenderFlags {
        RenderFlags {
            read_only: self.read_only,
            placeholder_ready: self.placeholder_ready,
            ..RenderFlags::default()
        }
    }

    /// Stable root id for a node: its bound id, or a fresh one.
    fn root_id(&mut self, key: NodeKey) -> DomId {
        match self.locator.dom_of(key) {
            Some(id) => id,
            None => {
                let id = self.cache.fresh_id();
                self.locator.bind(key, id);
                id
            }
        }
    }

    /// Assign ids, register with the DOM index and remember the output.
    fn finish(
        &mut self,
        node: &Rc<Node>,
        decorations: &[Decoration],
        selection: Option<&Range>,
        flags: RenderFlags,
        mut output: VElement,
    ) -> Rc<VElement> {
        let key = node.key();
        let previous = self.cache.entries.get(&key).map(|c| c.output.clone());
        let reuse = previous.as_deref().map(owned_ids).unwrap_or_default();
        assign_owned_ids(&mut output, reuse, &mut self.cache.ids);
        if let Some(previous) = &previous {
            self.dom.unregister_owned(previous);
        }
        let parent = self.dom.parent(output.id);
        let output = Rc::new(output);
        self.dom.register(&output, parent);
        self.cache.entries.insert(
            key,
            CachedRender {
                node: node.clone(),
                decorations: decorations.to_vec(),
                selection: selection.cloned(),
                flags,
                generation: self.cache.generation,
                output: output.clone(),
            },
        );
        self.stats.rendered += 1;
        output
    }
}

/// Marks plus decoration attributes, with nulls removed.
pub(crate) fn merged_attrs(marks: &Attrs, extra: &Attrs) -> Attrs {
    let mut out = marks.clone();
    for (k, v) in extra {
        out.insert(k.clone(), v.clone());
    }
    out.retain(|_, v| !v.is_null());
    out
}
