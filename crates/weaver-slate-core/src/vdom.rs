//! Virtual DOM produced by the tree renderer.
//!
//! Every element carries a [`DomId`] that survives re-renders of the node it
//! belongs to, so the browser layer can patch the real DOM in place, and a
//! [`DomRole`] that the selection bridge reads to walk from a DOM position back
//! to a model position. The [`DomIndex`] keeps every rendered element
//! reachable by id together with its parent.

use std::collections::HashMap;
use std::fmt::Write as _;
use std::rc::Rc;

use smol_str::SmolStr;
use weaver_slate_model::NodeKey;

/// Identity of a rendered DOM element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DomId(u32);

impl DomId {
    /// Placeholder for elements built by host renderers; replaced before the
    /// element is registered.
    pub const UNASSIGNED: DomId = DomId(0);
    /// The editable root element.
    pub const ROOT: DomId = DomId(1);

    pub fn new(raw: u32) -> Self {
        DomId(raw)
    }

    pub fn get(self) -> u32 {
        self.0
    }

    pub fn is_assigned(self) -> bool {
        self != Self::UNASSIGNED
    }
}

/// Hands out fresh ids. Zero and one are reserved.
#[derive(Debug, Clone)]
pub struct DomIdAllocator {
    next: u32,
}

impl Default for DomIdAllocator {
    fn default() -> Self {
        Self { next: 2 }
    }
}

impl DomIdAllocator {
    pub fn fresh(&mut self) -> DomId {
        let id = DomId(self.next);
        self.next = self.next.wrapping_add(1).max(2);
        id
    }
}

/// How a zero-width string stands in for text the DOM cannot show.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StringKind {
    Literal,
    /// `line_break` strings end an empty block and carry a `<br>`.
    ZeroWidth { line_break: bool },
}

/// What a rendered element stands for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DomRole {
    /// Extra structure added by a host renderer.
    Host,
    Root,
    /// Root element of a model element.
    Element(NodeKey),
    /// Hidden-text container inside a void element.
    Spacer,
    /// Root element of a text leaf.
    Text(NodeKey),
    /// One decorated slice of a text leaf, starting at `start` chars.
    Leaf { start: usize },
    String {
        text: NodeKey,
        start: usize,
        length: usize,
        kind: StringKind,
    },
    Placeholder,
}

impl DomRole {
    /// Element and text roots belong to their own node's render output.
    pub fn is_node_root(&self) -> bool {
        matches!(self, DomRole::Element(_) | DomRole::Text(_))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum VNode {
    Element(Rc<VElement>),
    Text(Rc<str>),
}

impl VNode {
    pub fn as_element(&self) -> Option<&Rc<VElement>> {
        match self {
            VNode::Element(el) => Some(el),
            VNode::Text(_) => None,
        }
    }
}

impl From<VElement> for VNode {
    fn from(el: VElement) -> Self {
        VNode::Element(Rc::new(el))
    }
}

/// Attributes the renderer requires on a host-rendered root element.
#[derive(Debug, Clone, PartialEq)]
pub struct Attributes {
    pub id: DomId,
    pub role: DomRole,
    pub attrs: Vec<(SmolStr, SmolStr)>,
    pub style: Vec<(SmolStr, SmolStr)>,
}

impl Attributes {
    pub fn new(id: DomId, role: DomRole) -> Self {
        Self {
            id,
            role,
            attrs: Vec::new(),
            style: Vec::new(),
        }
    }

    pub fn set_style(&mut self, property: impl Into<SmolStr>, value: impl Into<SmolStr>) {
        self.style.push((property.into(), value.into()));
    }

    pub fn set(&mut self, name: impl Into<SmolStr>, value: impl Into<SmolStr>) {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VElement {
    pub id: DomId,
    pub tag: SmolStr,
    pub attrs: Vec<(SmolStr, SmolStr)>,
    pub style: Vec<(SmolStr, SmolStr)>,
    pub children: Vec<VNode>,
    pub role: DomRole,
}

impl VElement {
    pub fn new(tag: impl Into<SmolStr>) -> Self {
        Self {
            id: DomId::UNASSIGNED,
            tag: tag.into(),
            attrs: Vec::new(),
            style: Vec::new(),
            children: Vec::new(),
            role: DomRole::Host,
        }
    }

    pub fn attr(mut self, name: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        let name = name.into();
        let value = value.into();
        match self.attrs.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name, value)),
        }
        self
    }

    pub fn style(mut self, property: impl Into<SmolStr>, value: impl Into<SmolStr>) -> Self {
        let property = property.into();
        let value = value.into();
        match self.style.iter_mut().find(|(p, _)| *p == property) {
            Some(slot) => slot.1 = value,
            None => self.style.push((property, value)),
        }
        self
    }

    pub fn child(mut self, child: impl Into<VNode>) -> Self {
        self.children.push(child.into());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.children.push(VNode::Text(Rc::from(text)));
        self
    }

    pub fn children(mut self, children: impl IntoIterator<Item = VNode>) -> Self {
        self.children.extend(children);
        self
    }

    pub fn role(mut self, role: DomRole) -> Self {
        self.role = role;
        self
    }

    /// Apply renderer-required attributes: id, role and data markers.
    pub fn spread(mut self, attributes: Attributes) -> Self {
        self.id = attributes.id;
        self.role = attributes.role;
        for (name, value) in attributes.attrs {
            self = self.attr(name, value);
        }
        for (property, value) in attributes.style {
            self = self.style(property, value);
        }
        self
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_attr(&self, name: &str) -> bool {
        self.get_attr(name).is_some()
    }

    /// Concatenated text of every text node below this element.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        for child in &self.children {
            match child {
                VNode::Text(t) => out.push_str(t),
                VNode::Element(el) => el.push_text(out),
            }
        }
    }

    pub fn element_children(&self) -> impl Iterator<Item = &Rc<VElement>> {
        self.children.iter().filter_map(VNode::as_element)
    }

    /// Whether this element opts out of editing without being a void.
    pub fn is_non_editable(&self) -> bool {
        self.get_attr("contenteditable") == Some("false") && !self.has_attr("data-slate-void")
    }

    /// Serialise to HTML without ids. Used for logging and snapshots.
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        self.write_html(&mut out);
        out
    }

    fn write_html(&self, out: &mut String) {
        let _ = write!(out, "<{}", self.tag);
        for (name, value) in &self.attrs {
            let _ = write!(out, " {}=\"{}\"", name, escape(value, true));
        }
        if !self.style.is_empty() {
            let css: Vec<String> = self
                .style
                .iter()
                .map(|(p, v)| format!("{p}: {v}"))
                .collect();
            let _ = write!(out, " style=\"{}\"", escape(&css.join("; "), true));
        }
        out.push('>');
        if is_void_tag(&self.tag) {
            return;
        }
        for child in &self.children {
            match child {
                VNode::Text(t) => out.push_str(&escape(t, false)),
                VNode::Element(el) => el.write_html(out),
            }
        }
        let _ = write!(out, "</{}>", self.tag);
    }
}

fn is_void_tag(tag: &str) -> bool {
    matches!(tag, "br" | "hr" | "img" | "input")
}

fn escape(s: &str, attr: bool) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' if attr => out.push_str("&quot;"),
            '\u{FEFF}' => out.push_str("&#xFEFF;"),
            c => out.push(c),
        }
    }
    out
}

/// Ids of the elements a node's output owns, in depth-first order, excluding
/// its root and stopping at nested node roots.
pub(crate) fn owned_ids(root: &VElement) -> Vec<DomId> {
    fn walk(el: &VElement, out: &mut Vec<DomId>) {
        for child in el.element_children() {
            if child.role.is_node_root() {
                continue;
            }
            out.push(child.id);
            walk(child, out);
        }
    }
    let mut out = Vec::new();
    walk(root, &mut out);
    out
}

/// Give every unassigned owned element an id, reusing `previous` in order
/// before allocating.
pub(crate) fn assign_owned_ids(
    root: &mut VElement,
    previous: Vec<DomId>,
    alloc: &mut DomIdAllocator,
) {
    fn walk(
        el: &mut VElement,
        reuse: &mut std::vec::IntoIter<DomId>,
        alloc: &mut DomIdAllocator,
    ) {
        for child in el.children.iter_mut() {
            let VNode::Element(rc) = child else {
                continue;
            };
            if rc.role.is_node_root() {
                continue;
            }
            let inner = Rc::make_mut(rc);
            let slot = reuse.next();
            if !inner.id.is_assigned() {
                inner.id = slot.unwrap_or_else(|| alloc.fresh());
            }
            walk(inner, reuse, alloc);
        }
    }
    let mut reuse = previous.into_iter();
    walk(root, &mut reuse, alloc);
}

/// A registered element and the element it is rendered under.
#[derive(Debug, Clone)]
pub struct DomEntry {
    pub parent: Option<DomId>,
    pub element: Rc<VElement>,
}

/// Every rendered element by id.
#[derive(Debug, Clone, Default)]
pub struct DomIndex {
    entries: HashMap<DomId, DomEntry>,
}

impl DomIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: DomId) -> Option<&Rc<VElement>> {
        self.entries.get(&id).map(|e| &e.element)
    }

    pub fn parent(&self, id: DomId) -> Option<DomId> {
        self.entries.get(&id).and_then(|e| e.parent)
    }

    pub fn contains(&self, id: DomId) -> bool {
        self.entries.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// `id` followed by each of its ancestors up to the root.
    pub fn ancestors(&self, id: DomId) -> impl Iterator<Item = DomId> + '_ {
        std::iter::successors(Some(id), move |cur| self.parent(*cur))
    }

    /// Register a node output and every element it owns. Nested node roots
    /// only get their parent pointer updated.
    pub fn register(&mut self, root: &Rc<VElement>, parent: Option<DomId>) {
        self.entries.insert(
            root.id,
            DomEntry {
                parent,
                element: root.clone(),
            },
        );
        self.register_children(root);
    }

    fn register_children(&mut self, el: &Rc<VElement>) {
        for child in el.element_children() {
            if child.role.is_node_root() {
                match self.entries.get_mut(&child.id) {
                    Some(entry) => entry.parent = Some(el.id),
                    None => {
                        self.entries.insert(
                            child.id,
                            DomEntry {
                                parent: Some(el.id),
                                element: child.clone(),
                            },
                        );
                    }
                }
                continue;
            }
            self.entries.insert(
                child.id,
                DomEntry {
                    parent: Some(el.id),
                    element: child.clone(),
                },
            );
            self.register_children(child);
        }
    }

    /// Drop a node output's root and owned elements.
    pub fn unregister(&mut self, root: &VElement) {
        self.entries.remove(&root.id);
        for id in owned_ids(root) {
            self.entries.remove(&id);
        }
    }

    /// Drop only the owned elements, keeping the root entry.
    pub(crate) fn unregister_owned(&mut self, root: &VElement) {
        for id in owned_ids(root) {
            self.entries.remove(&id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf_tree() -> VElement {
        VElement::new("span")
            .role(DomRole::Text(NodeKey::fresh()))
            .attr("data-slate-node", "text")
            .child(
                VElement::new("span")
                    .role(DomRole::Leaf { start: 0 })
                    .attr("data-slate-leaf", "true")
                    .child(VElement::new("span").attr("data-slate-string", "true").text("a<b")),
            )
    }

    #[test]
    fn html_escapes_and_skips_ids() {
        let el = leaf_tree();
        insta::assert_snapshot!(el.to_html(), @r#"<span data-slate-node="text"><span data-slate-leaf="true"><span data-slate-string="true">a&lt;b</span></span></span>"#);
    }

    #[test]
    fn ids_are_reused_positionally() {
        let mut alloc = DomIdAllocator::default();
        let mut first = leaf_tree();
        first.id = alloc.fresh();
        assign_owned_ids(&mut first, Vec::new(), &mut alloc);
        let ids = owned_ids(&first);
        assert_eq!(ids.len(), 2);
        assert!(ids.iter().all(|id| id.is_assigned()));

        let mut second = leaf_tree();
        second.id = first.id;
        assign_owned_ids(&mut second, ids.clone(), &mut alloc);
        assert_eq!(owned_ids(&second), ids);
    }

    #[test]
    fn registration_stops_at_nested_node_roots() {
        let mut alloc = DomIdAllocator::default();
        let mut text = leaf_tree();
        text.id = alloc.fresh();
        assign_owned_ids(&mut text, Vec::new(), &mut alloc);
        let text = Rc::new(text);

        let mut index = DomIndex::new();
        index.register(&text, None);
        assert_eq!(index.len(), 3);

        let mut para = VElement::new("div")
            .role(DomRole::Element(NodeKey::fresh()))
            .child(VNode::Element(text.clone()));
        para.id = alloc.fresh();
        assign_owned_ids(&mut para, Vec::new(), &mut alloc);
        let para = Rc::new(para);
        index.register(&para, Some(DomId::ROOT));

        assert_eq!(index.len(), 4);
        assert_eq!(index.parent(text.id), Some(para.id));
        let chain: Vec<DomId> = index.ancestors(owned_ids(&text)[1]).collect();
        assert_eq!(chain.len(), 5);
        assert_eq!(chain[3], para.id);
        assert_eq!(chain.last(), Some(&DomId::ROOT));

        index.unregister(&para);
        assert_eq!(index.len(), 3);
    }
}
