//! Bookkeeping that maps model nodes to their rendered DOM and back.
//!
//! Entries are keyed by [`NodeKey`]. Each node records its parent, its index
//! in that parent and its full path; rendered nodes are additionally bound to
//! the [`DomId`] of their root element. Refreshing after an operation only
//! walks the part of the tree the operation can have moved, and an entry is
//! only rewritten when its contents change, so untouched entries stay the
//! same `Rc` across refreshes.

use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use weaver_slate_model::{Editor, Node, NodeKey, Operation, Path};

use crate::vdom::DomId;

/// Where a node sits in the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeEntry {
    pub parent: NodeKey,
    pub index: usize,
    pub path: Path,
    /// Refresh revision that last wrote this entry.
    pub revision: u64,
}

/// How much of the tree an operation can have moved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshScope {
    Nothing,
    /// Only the subtrees of these top-level children.
    TopLevel(Vec<usize>),
    Full,
}

impl RefreshScope {
    pub fn of(op: &Operation) -> Self {
        match op {
            Operation::SetSelection { .. } => RefreshScope::Nothing,
            Operation::InsertText { path, .. } | Operation::RemoveText { path, .. } => {
                path.first()
                    .map_or(RefreshScope::Full, |i| RefreshScope::TopLevel(vec![*i]))
            }
            Operation::SetNode { path, .. } if !path.is_root() => {
                RefreshScope::TopLevel(vec![path[0]])
            }
            _ => RefreshScope::Full,
        }
    }

    fn merge(self, other: RefreshScope) -> RefreshScope {
        match (self, other) {
            (RefreshScope::Full, _) | (_, RefreshScope::Full) => RefreshScope::Full,
            (RefreshScope::Nothing, s) | (s, RefreshScope::Nothing) => s,
            (RefreshScope::TopLevel(mut a), RefreshScope::TopLevel(b)) => {
                for i in b {
                    if !a.contains(&i) {
                        a.push(i);
                    }
                }
                RefreshScope::TopLevel(a)
            }
        }
    }
}

/// Registry of node positions, DOM bindings and editor singletons.
#[derive(Debug, Default)]
pub struct NodeLocator {
    entries: HashMap<NodeKey, Rc<NodeEntry>>,
    key_to_dom: HashMap<NodeKey, DomId>,
    dom_to_key: HashMap<DomId, NodeKey>,
    revision: u64,

    /// The editable root element, once mounted.
    pub root: Option<DomId>,
    /// The rendered placeholder element, while one is shown.
    pub placeholder: Option<DomId>,
    pub focused: bool,
    pub composing: bool,
    pub read_only: bool,
}

impl NodeLocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn entry(&self, key: NodeKey) -> Option<&Rc<NodeEntry>> {
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = NodeKey> + '_ {
        self.entries.keys().copied()
    }

    /// Path of a node. The editor itself sits at the root path.
    pub fn path(&self, key: NodeKey) -> Option<Path> {
        if key == NodeKey::EDITOR {
            return Some(Path::root());
        }
        self.entries.get(&key).map(|e| e.path.clone())
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.entries.get(&key).map(|e| e.parent)
    }

    pub fn index(&self, key: NodeKey) -> Option<usize> {
        self.entries.get(&key).map(|e| e.index)
    }

    /// Record where a node sits. Returns whether the entry changed.
    pub fn record(&mut self, key: NodeKey, parent: NodeKey, index: usize, path: &Path) -> bool {
        if let Some(existing) = self.entries.get(&key) {
            if existing.parent == parent && existing.index == index && &existing.path == path {
                return false;
            }
        }
        self.entries.insert(
            key,
            Rc::new(NodeEntry {
                parent,
                index,
                path: path.clone(),
                revision: self.revision,
            }),
        );
        true
    }

    pub fn bind(&mut self, key: NodeKey, dom: DomId) {
        if let Some(old) = self.key_to_dom.insert(key, dom) {
            if old != dom {
                self.dom_to_key.remove(&old);
            }
        }
        self.dom_to_key.insert(dom, key);
    }

    pub fn dom_of(&self, key: NodeKey) -> Option<DomId> {
        if key == NodeKey::EDITOR {
            return self.root;
        }
        self.key_to_dom.get(&key).copied()
    }

    pub fn node_of(&self, dom: DomId) -> Option<NodeKey> {
        if self.root == Some(dom) {
            return Some(NodeKey::EDITOR);
        }
        self.dom_to_key.get(&dom).copied()
    }

    /// Drop every entry of a node that left the tree.
    pub fn forget(&mut self, key: NodeKey) {
        self.entries.remove(&key);
        if let Some(dom) = self.key_to_dom.remove(&key) {
            self.dom_to_key.remove(&dom);
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.key_to_dom.clear();
        self.dom_to_key.clear();
        self.root = None;
        self.placeholder = None;
        self.focused = false;
        self.composing = false;
    }

    /// Refresh after a single operation, or the whole tree for `None`.
    /// Returns the keys of nodes that are no longer in the document.
    pub fn refresh(&mut self, editor: &Editor, op: Option<&Operation>) -> Vec<NodeKey> {
        let scope = op.map_or(RefreshScope::Full, RefreshScope::of);
        self.refresh_scope(editor, scope)
    }

    /// Refresh after a batch of operations. An empty batch refreshes nothing.
    pub fn refresh_batch(&mut self, editor: &Editor, ops: &[Operation]) -> Vec<NodeKey> {
        let scope = ops
            .iter()
            .map(RefreshScope::of)
            .fold(RefreshScope::Nothing, RefreshScope::merge);
        self.refresh_scope(editor, scope)
    }

    pub fn refresh_scope(&mut self, editor: &Editor, scope: RefreshScope) -> Vec<NodeKey> {
        let roots: Vec<usize> = match &scope {
            RefreshScope::Nothing => return Vec::new(),
            RefreshScope::TopLevel(indices) => indices.clone(),
            RefreshScope::Full => (0..editor.children().len()).collect(),
        };
        self.revision += 1;

        let mut seen = HashSet::new();
        let mut written = 0usize;
        let mut queue: VecDeque<(Rc<Node>, NodeKey, usize, Path)> = roots
            .iter()
            .filter_map(|i| {
                editor
                    .children()
                    .get(*i)
                    .map(|n| (n.clone(), NodeKey::EDITOR, *i, Path::from([*i])))
            })
            .collect();

        while let Some((node, parent, index, path)) = queue.pop_front() {
            let key = node.key();
            seen.insert(key);
            if self.record(key, parent, index, &path) {
                written += 1;
            }
            for (i, child) in node.children().iter().enumerate() {
                queue.push_back((child.clone(), key, i, path.child(i)));
            }
        }

        let removed: Vec<NodeKey> = if scope == RefreshScope::Full {
            let stale: Vec<NodeKey> = self
                .entries
                .keys()
                .filter(|k| !seen.contains(*k))
                .copied()
                .collect();
            for key in &stale {
                self.forget(*key);
            }
            stale
        } else {
            Vec::new()
        };

        tracing::trace!(
            target: "weaver::locator",
            revision = self.revision,
            ?scope,
            visited = seen.len(),
            written,
            removed = removed.len(),
            "refreshed node locator"
        );
        removed
    }

    /// Keys whose recorded path no longer addresses them in `editor`.
    pub fn inconsistent_keys(&self, editor: &Editor) -> Vec<NodeKey> {
        self.entries
            .iter()
            .filter(|(key, entry)| {
                let at_path = editor.node(&entry.path).map(|n| n.key());
                let parent_ok = match entry.path.parent() {
                    Some(p) if p.is_root() => entry.parent == NodeKey::EDITOR,
                    Some(p) => editor.node(&p).map(|n| n.key()) == Some(entry.parent),
                    None => false,
                };
                at_path != Some(**key) || !parent_ok || entry.path.index() != Some(entry.index)
            })
            .map(|(key, _)| *key)
            .collect()
    }
}
