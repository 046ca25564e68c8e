//! Patching the rendered tree into the live DOM, and mapping live nodes back
//! to their [`DomId`]s.
//!
//! Elements are keyed by `DomId`. An element whose virtual node is the same
//! `Rc` as last time is left alone along with its whole subtree, so only the
//! slice the renderer re-derived is touched.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use wasm_bindgen::{JsCast, JsValue};
use weaver_slate_core::{DomEnvironment, DomId, DomNode, DomPoint, VElement, VNode};

use crate::error::{BrowserError, Result};

/// Expando property carrying the `DomId` of a mounted element.
const ID_PROPERTY: &str = "__weaverDomId";

struct Mounted {
    vnode: Rc<VElement>,
    element: web_sys::Element,
}

pub struct DomPatcher {
    document: web_sys::Document,
    root: web_sys::HtmlElement,
    root_vnode: Option<Rc<VElement>>,
    mounted: HashMap<DomId, Mounted>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PatchStats {
    pub created: usize,
    pub updated: usize,
    pub reused: usize,
    pub removed: usize,
}

impl DomPatcher {
    pub fn new(root: web_sys::HtmlElement) -> Result<Self> {
        let document = root.owner_document().ok_or(BrowserError::Missing("document"))?;
        set_id(&root, DomId::ROOT)?;
        Ok(Self {
            document,
            root,
            root_vnode: None,
            mounted: HashMap::new(),
        })
    }

    pub fn root(&self) -> &web_sys::HtmlElement {
        &self.root
    }

    /// Bring the live DOM in line with `tree`, the rendered root.
    pub fn patch(&mut self, tree: &Rc<VElement>) -> Result<PatchStats> {
        let mut stats = PatchStats::default();
        if self.root_vnode.as_ref().is_some_and(|old| Rc::ptr_eq(old, tree)) {
            return Ok(stats);
        }
        let mut visited = HashSet::new();
        let old = self.root_vnode.take();
        let root: web_sys::Element = self.root.clone().into();
        sync_attributes(&root, old.as_deref(), tree)?;
        self.reconcile_children(&root, &tree.children, &mut visited, &mut stats)?;
        self.root_vnode = Some(tree.clone());

        let before = self.mounted.len();
        self.mounted.retain(|id, _| visited.contains(id));
        stats.removed = before - self.mounted.len();
        tracing::trace!(
            target: "weaver::dom",
            created = stats.created,
            updated = stats.updated,
            reused = stats.reused,
            removed = stats.removed,
            "patched DOM"
        );
        Ok(stats)
    }

    fn element_for(
        &mut self,
        vnode: &Rc<VElement>,
        visited: &mut HashSet<DomId>,
        stats: &mut PatchStats,
    ) -> Result<web_sys::Element> {
        if let Some(mounted) = self.mounted.get(&vnode.id) {
            if Rc::ptr_eq(&mounted.vnode, vnode) {
                mark_subtree(vnode, visited);
                stats.reused += 1;
                return Ok(mounted.element.clone());
            }
        }
        visited.insert(vnode.id);

        let existing = self
            .mounted
            .remove(&vnode.id)
            .filter(|m| m.element.tag_name().eq_ignore_ascii_case(&vnode.tag));
        let (element, old) = match existing {
            Some(Mounted { vnode: old, element }) => {
                stats.updated += 1;
                (element, Some(old))
            }
            None => {
                stats.created += 1;
                let element = self.document.create_element(&vnode.tag)?;
                set_id(&element, vnode.id)?;
                (element, None)
            }
        };
        sync_attributes(&element, old.as_deref(), vnode)?;
        self.reconcile_children(&element, &vnode.children, visited, stats)?;
        self.mounted.insert(
            vnode.id,
            Mounted {
                vnode: vnode.clone(),
                element: element.clone(),
            },
        );
        Ok(element)
    }

    fn reconcile_children(
        &mut self,
        parent: &web_sys::Element,
        children: &[VNode],
        visited: &mut HashSet<DomId>,
        stats: &mut PatchStats,
    ) -> Result<()> {
        let current = parent.child_nodes();
        let mut desired: Vec<web_sys::Node> = Vec::with_capacity(children.len());
        for (index, child) in children.iter().enumerate() {
            let node = match child {
                VNode::Element(el) => self.element_for(el, visited, stats)?.into(),
                VNode::Text(text) => {
                    // Keep the text node in place so a native caret inside it survives.
                    let existing = current
                        .item(index as u32)
                        .and_then(|n| n.dyn_into::<web_sys::Text>().ok());
                    match existing {
                        Some(node) => {
                            if node.data() != **text {
                                node.set_data(text);
                            }
                            node.into()
                        }
                        None => self.document.create_text_node(text).into(),
                    }
                }
            };
            desired.push(node);
        }

        let parent_node: &web_sys::Node = parent;
        for (index, node) in desired.iter().enumerate() {
            let at = parent_node.child_nodes().item(index as u32);
            let in_place = at.as_ref().is_some_and(|at| at.is_same_node(Some(node)));
            if !in_place {
                parent_node.insert_before(node, at.as_ref())?;
            }
        }
        while parent_node.child_nodes().length() as usize > desired.len() {
            match parent_node.last_child() {
                Some(extra) => {
                    parent_node.remove_child(&extra)?;
                }
                None => break,
            }
        }
        Ok(())
    }

    /// The live element rendered for `id`.
    pub fn element(&self, id: DomId) -> Option<web_sys::Element> {
        if id == DomId::ROOT {
            return Some(self.root.clone().into());
        }
        self.mounted.get(&id).map(|m| m.element.clone())
    }

    /// Nearest rendered element at or above `node`, within the root.
    pub fn id_of(&self, node: &web_sys::Node) -> Option<DomId> {
        let root: &web_sys::Node = &self.root;
        if !root.contains(Some(node)) {
            return None;
        }
        let mut current = Some(node.clone());
        while let Some(node) = current {
            if let Some(id) = read_id(&node) {
                return Some(id);
            }
            current = node.parent_node();
        }
        None
    }

    /// The rendered target of an event.
    pub fn target_id(&self, target: Option<web_sys::EventTarget>) -> Option<DomId> {
        let node = target?.dyn_into::<web_sys::Node>().ok()?;
        self.id_of(&node)
    }

    /// A native boundary point as a rendered position.
    pub fn dom_point(&self, node: &web_sys::Node, offset: u32) -> Option<DomPoint> {
        let offset = offset as usize;
        if node.node_type() == web_sys::Node::TEXT_NODE {
            let parent = node.parent_node()?;
            let parent_id = read_id(&parent)?;
            let index = child_index(&parent, node)?;
            return Some(DomPoint::text(parent_id, index, offset));
        }
        if let Some(id) = read_id(node) {
            return Some(DomPoint::element(id, offset));
        }
        // A node the browser inserted itself: use its position in the
        // nearest rendered ancestor.
        let mut child = node.clone();
        let mut parent = node.parent_node()?;
        loop {
            if let Some(id) = read_id(&parent) {
                let index = child_index(&parent, &child)?;
                return Some(DomPoint::element(id, index + usize::from(offset > 0)));
            }
            child = parent;
            parent = child.parent_node()?;
        }
    }

    /// A rendered position as a native boundary point.
    pub fn native_point(&self, point: &DomPoint) -> Option<(web_sys::Node, u32)> {
        let node = match point.node {
            DomNode::Text { parent, index } => {
                self.element(parent)?.child_nodes().item(index as u32)?
            }
            DomNode::Element(id) => self.element(id)?.into(),
        };
        Some((node, point.offset as u32))
    }
}

impl DomEnvironment for DomPatcher {
    fn is_white_space_pre(&self, id: DomId) -> bool {
        let Some(element) = self.element(id) else {
            return false;
        };
        let style = web_sys::window().and_then(|w| w.get_computed_style(&element).ok().flatten());
        style
            .and_then(|s| s.get_property_value("white-space").ok())
            .is_some_and(|v| v == "pre")
    }
}

fn set_id(node: &JsValue, id: DomId) -> Result<()> {
    js_sys::Reflect::set(
        node,
        &JsValue::from_str(ID_PROPERTY),
        &JsValue::from_f64(f64::from(id.get())),
    )?;
    Ok(())
}

fn read_id(node: &web_sys::Node) -> Option<DomId> {
    js_sys::Reflect::get(node, &JsValue::from_str(ID_PROPERTY))
        .ok()?
        .as_f64()
        .map(|raw| DomId::new(raw as u32))
}

fn child_index(parent: &web_sys::Node, child: &web_sys::Node) -> Option<usize> {
    let children = parent.child_nodes();
    (0..children.length())
        .find(|&i| children.item(i).is_some_and(|c| c.is_same_node(Some(child))))
        .map(|i| i as usize)
}

fn mark_subtree(vnode: &VElement, visited: &mut HashSet<DomId>) {
    visited.insert(vnode.id);
    for child in vnode.element_children() {
        mark_subtree(child, visited);
    }
}

fn style_text(vnode: &VElement) -> String {
    vnode
        .style
        .iter()
        .map(|(property, value)| format!("{property}: {value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

fn sync_attributes(element: &web_sys::Element, old: Option<&VElement>, new: &VElement) -> Result<()> {
    if let Some(old) = old {
        for (name, _) in &old.attrs {
            if !new.has_attr(name) {
                element.remove_attribute(name)?;
            }
        }
    }
    for (name, value) in &new.attrs {
        if old.and_then(|o| o.get_attr(name)) != Some(value.as_str()) {
            element.set_attribute(name, value)?;
        }
    }
    let style = style_text(new);
    if old.map(style_text).as_deref() != Some(style.as_str()) {
        if style.is_empty() {
            element.remove_attribute("style")?;
        } else {
            element.set_attribute("style", &style)?;
        }
    }
    Ok(())
}
