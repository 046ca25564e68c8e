//! The editor: document root, selection, pending marks and operation log.

use std::collections::BTreeSet;
use std::rc::Rc;

use smol_str::SmolStr;

use crate::error::ModelError;
use crate::node::{Attrs, Element, Node, NodeKey, Text, char_to_byte};
use crate::operation::Operation;
use crate::path::Path;
use crate::point::{Point, Range};

/// Which element types are inline or void.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    inline: BTreeSet<SmolStr>,
    void: BTreeSet<SmolStr>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_inline(mut self, kind: impl Into<SmolStr>) -> Self {
        self.inline.insert(kind.into());
        self
    }

    pub fn with_void(mut self, kind: impl Into<SmolStr>) -> Self {
        self.void.insert(kind.into());
        self
    }

    pub fn is_inline(&self, element: &Element) -> bool {
        self.inline.contains(&element.kind)
    }

    pub fn is_void(&self, element: &Element) -> bool {
        self.void.contains(&element.kind)
    }
}

/// The document model root.
///
/// All changes go through [`Editor::apply`], which records each operation so
/// that the layers above can drain the batch after an event and refresh only
/// what it touched.
#[derive(Debug, Clone)]
pub struct Editor {
    children: Vec<Rc<Node>>,
    selection: Option<Range>,
    marks: Option<Attrs>,
    schema: Schema,
    operations: Vec<Operation>,
}

impl Editor {
    pub fn new(children: impl IntoIterator<Item = Node>) -> Self {
        Self {
            children: children.into_iter().map(Rc::new).collect(),
            selection: None,
            marks: None,
            schema: Schema::default(),
            operations: Vec::new(),
        }
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.schema = schema;
        self
    }

    pub fn key(&self) -> NodeKey {
        NodeKey::EDITOR
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    pub fn children(&self) -> &[Rc<Node>] {
        &self.children
    }

    pub fn selection(&self) -> Option<&Range> {
        self.selection.as_ref()
    }

    /// Marks to apply to the next inserted text, if explicitly set.
    pub fn pending_marks(&self) -> Option<&Attrs> {
        self.marks.as_ref()
    }

    pub fn set_pending_marks(&mut self, marks: Option<Attrs>) {
        self.marks = marks;
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Drain the operations applied since the last call.
    pub fn take_operations(&mut self) -> Vec<Operation> {
        std::mem::take(&mut self.operations)
    }

    /// Reject documents the render layer cannot represent.
    pub fn validate(&self) -> Result<(), ModelError> {
        if self.children.is_empty() {
            return Err(ModelError::EmptyDocument);
        }
        for (i, child) in self.children.iter().enumerate() {
            if child.is_text() {
                return Err(ModelError::TopLevelText(i));
            }
            validate_node(child, &Path::from([i]))?;
        }
        Ok(())
    }

    // === Queries ===

    pub fn node(&self, path: &[usize]) -> Option<&Rc<Node>> {
        let (first, rest) = path.split_first()?;
        let top = self.children.get(*first)?;
        if rest.is_empty() {
            Some(top)
        } else {
            top.descendant(rest)
        }
    }

    /// Children of the node at `path`; the root's children for the empty path.
    pub fn children_at(&self, path: &[usize]) -> Option<&[Rc<Node>]> {
        if path.is_empty() {
            return Some(&self.children);
        }
        self.node(path).map(|n| n.children())
    }

    pub fn has_path(&self, path: &[usize]) -> bool {
        path.is_empty() || self.node(path).is_some()
    }

    pub fn text(&self, path: &[usize]) -> Option<&Text> {
        self.node(path).and_then(|n| n.as_text())
    }

    pub fn element(&self, path: &[usize]) -> Option<&Element> {
        self.node(path).and_then(|n| n.as_element())
    }

    pub fn string(&self, path: &[usize]) -> String {
        if path.is_empty() {
            return self.children.iter().map(|c| c.string()).collect();
        }
        self.node(path).map(|n| n.string()).unwrap_or_default()
    }

    pub fn is_inline(&self, element: &Element) -> bool {
        self.schema.is_inline(element)
    }

    pub fn is_void(&self, element: &Element) -> bool {
        self.schema.is_void(element)
    }

    pub fn is_block(&self, node: &Node) -> bool {
        node.as_element().is_some_and(|e| !self.is_inline(e))
    }

    /// Whether an element's children are text or inline elements.
    pub fn has_inlines(&self, element: &Element) -> bool {
        element.children.iter().any(|c| match c.as_ref() {
            Node::Text(_) => true,
            Node::Element(e) => self.is_inline(e),
        })
    }

    /// Every leaf below `path`, in document order.
    pub fn texts_under(&self, path: &[usize]) -> Vec<(&Text, Path)> {
        let mut out = Vec::new();
        if path.is_empty() {
            for (i, child) in self.children.iter().enumerate() {
                child.texts_into(&Path::from([i]), &mut out);
            }
        } else if let Some(node) = self.node(path) {
            node.texts_into(&Path::from(path), &mut out);
        }
        out
    }

    pub fn texts(&self) -> Vec<(&Text, Path)> {
        self.texts_under(&[])
    }

    pub fn start(&self, path: &[usize]) -> Option<Point> {
        let (_, p) = self.texts_under(path).into_iter().next()?;
        Some(Point::new(p, 0))
    }

    pub fn end(&self, path: &[usize]) -> Option<Point> {
        let (t, p) = self.texts_under(path).into_iter().last()?;
        Some(Point::new(p, t.len()))
    }

    /// The full range covered by the node at `path`.
    pub fn range(&self, path: &[usize]) -> Option<Range> {
        Some(Range::new(self.start(path)?, self.end(path)?))
    }

    pub fn is_start(&self, point: &Point, path: &[usize]) -> bool {
        self.start(path).is_some_and(|s| &s == point)
    }

    pub fn is_end(&self, point: &Point, path: &[usize]) -> bool {
        self.end(path).is_some_and(|e| &e == point)
    }

    /// Whether both points of `range` address existing leaves within bounds.
    pub fn has_range(&self, range: &Range) -> bool {
        self.has_point(&range.anchor) && self.has_point(&range.focus)
    }

    pub fn has_point(&self, point: &Point) -> bool {
        self.text(&point.path).is_some_and(|t| point.offset <= t.len())
    }

    /// Nearest block element at or above `path`, excluding the root.
    pub fn block_above(&self, path: &[usize]) -> Option<Path> {
        let mut depth = path.len();
        while depth > 0 {
            let candidate = &path[..depth];
            if let Some(node) = self.node(candidate) {
                if self.is_block(node) {
                    return Some(Path::from(candidate));
                }
            }
            depth -= 1;
        }
        None
    }

    /// Nearest void element at or above `path`.
    pub fn void_above(&self, path: &[usize]) -> Option<Path> {
        let mut depth = path.len();
        while depth > 0 {
            let candidate = &path[..depth];
            if self.element(candidate).is_some_and(|e| self.is_void(e)) {
                return Some(Path::from(candidate));
            }
            depth -= 1;
        }
        None
    }

    /// Highest inline element above `path`.
    pub fn inline_above(&self, path: &[usize]) -> Option<Path> {
        (1..=path.len())
            .map(|depth| &path[..depth])
            .find(|candidate| self.element(candidate).is_some_and(|e| self.is_inline(e)))
            .map(Path::from)
    }

    /// Blocks whose children are text or inlines, in document order.
    pub fn leaf_blocks(&self) -> Vec<Path> {
        let mut out = Vec::new();
        for (i, child) in self.children.iter().enumerate() {
            self.collect_leaf_blocks(child, Path::from([i]), &mut out);
        }
        out
    }

    fn collect_leaf_blocks(&self, node: &Node, path: Path, out: &mut Vec<Path>) {
        let Node::Element(el) = node else {
            return;
        };
        if self.is_inline(el) {
            return;
        }
        if self.has_inlines(el) || self.is_void(el) {
            out.push(path);
            return;
        }
        for (i, child) in el.children.iter().enumerate() {
            self.collect_leaf_blocks(child, path.child(i), out);
        }
    }

    /// Marks that text typed at the current selection would carry.
    pub fn marks(&self) -> Option<Attrs> {
        if let Some(marks) = &self.marks {
            return Some(marks.clone());
        }
        let selection = self.selection.as_ref()?;
        if selection.is_expanded() {
            let (start, end) = selection.edges();
            return self
                .texts()
                .into_iter()
                .find(|(_, p)| p >= &start.path && p <= &end.path)
                .map(|(t, _)| t.marks.clone());
        }
        let anchor = &selection.anchor;
        let mut leaf = self.text(&anchor.path)?;
        if anchor.offset == 0 && self.void_above(&anchor.path).is_none() {
            if let Some(block) = self.block_above(&anchor.path) {
                let texts = self.texts_under(&block);
                let idx = texts.iter().position(|(_, p)| p == &anchor.path);
                if let Some(prev) = idx.and_then(|i| i.checked_sub(1)) {
                    leaf = texts[prev].0;
                }
            }
        }
        Some(leaf.marks.clone())
    }

    /// Document fragment covered by `range`, trimmed at its edges.
    pub fn fragment(&self, range: &Range) -> Vec<Node> {
        let (start, end) = range.edges();
        self.children
            .iter()
            .enumerate()
            .filter_map(|(i, child)| slice_node(child, &Path::from([i]), start, end))
            .collect()
    }

    // === Mutation ===

    /// Apply one operation and record it in the batch.
    pub fn apply(&mut self, op: Operation) -> Result<(), ModelError> {
        match &op {
            Operation::SetSelection { new_properties, .. } => {
                self.selection = new_properties.clone();
                self.marks = None;
            }
            other => {
                self.apply_to_tree(other)?;
                if let Some(selection) = self.selection.take() {
                    self.selection = self.transform_selection(&selection, other);
                }
            }
        }
        tracing::trace!(
            target: "weaver::model",
            op = op.name(),
            path = ?op.path(),
            "applied operation"
        );
        self.operations.push(op);
        Ok(())
    }

    fn transform_selection(&self, selection: &Range, op: &Operation) -> Option<Range> {
        if let Some(next) = selection.transform(op) {
            return Some(next);
        }
        // The selected leaf went away; fall back to the nearest surviving leaf.
        let removed = op.path()?;
        let texts = self.texts();
        let point = texts
            .iter()
            .rev()
            .find(|(_, p)| p < removed)
            .map(|(t, p)| Point::new(p.clone(), t.len()))
            .or_else(|| texts.first().map(|(_, p)| Point::new(p.clone(), 0)))?;
        Some(Range::collapsed(point))
    }

    fn apply_to_tree(&mut self, op: &Operation) -> Result<(), ModelError> {
        match op {
            Operation::InsertText { path, offset, text } => {
                self.replace_leaf(path, |t| {
                    let len = t.len();
                    if *offset > len {
                        return Err(ModelError::OffsetOutOfBounds {
                            path: path.clone(),
                            offset: *offset,
                            len,
                        });
                    }
                    let mut next = t.clone();
                    next.text.insert_str(char_to_byte(&t.text, *offset), text);
                    Ok(next)
                })
            }
            Operation::RemoveText { path, offset, text } => {
                self.replace_leaf(path, |t| {
                    let len = t.len();
                    let count = text.chars().count();
                    if offset + count > len {
                        return Err(ModelError::OffsetOutOfBounds {
                            path: path.clone(),
                            offset: offset + count,
                            len,
                        });
                    }
                    let mut next = t.clone();
                    let a = char_to_byte(&t.text, *offset);
                    let b = char_to_byte(&t.text, offset + count);
                    next.text.replace_range(a..b, "");
                    Ok(next)
                })
            }
            Operation::InsertNode { path, node } => {
                let (parent, index) = split_path(path)?;
                self.with_children(&parent, path, |kids| {
                    if index > kids.len() {
                        return Err(ModelError::InvalidPath(path.clone()));
                    }
                    kids.insert(index, node.clone());
                    Ok(())
                })
            }
            Operation::RemoveNode { path, .. } => {
                let (parent, index) = split_path(path)?;
                self.with_children(&parent, path, |kids| {
                    if index >= kids.len() {
                        return Err(ModelError::InvalidPath(path.clone()));
                    }
                    kids.remove(index);
                    Ok(())
                })
            }
            Operation::SplitNode { path, position } => {
                let (parent, index) = split_path(path)?;
                self.with_children(&parent, path, |kids| {
                    let target = kids
                        .get(index)
                        .ok_or_else(|| ModelError::InvalidPath(path.clone()))?;
                    let (left, right) = split_node(target, *position);
                    kids[index] = Rc::new(left);
                    kids.insert(index + 1, Rc::new(right));
                    Ok(())
                })
            }
            Operation::MergeNode { path, .. } => {
                let (parent, index) = split_path(path)?;
                if index == 0 {
                    return Err(ModelError::InvalidPath(path.clone()));
                }
                self.with_children(&parent, path, |kids| {
                    let prev = kids
                        .get(index - 1)
                        .ok_or_else(|| ModelError::InvalidPath(path.clone()))?;
                    let cur = kids
                        .get(index)
                        .ok_or_else(|| ModelError::InvalidPath(path.clone()))?;
                    let merged = merge_nodes(prev, cur).ok_or_else(|| ModelError::WrongKind {
                        path: path.clone(),
                        expected: "matching",
                    })?;
                    kids[index - 1] = Rc::new(merged);
                    kids.remove(index);
                    Ok(())
                })
            }
            Operation::MoveNode { path, new_path } => {
                let node = self
                    .node(path)
                    .cloned()
                    .ok_or_else(|| ModelError::InvalidPath(path.clone()))?;
                let true_path = path
                    .transform(op)
                    .ok_or_else(|| ModelError::InvalidPath(new_path.clone()))?;
                let (parent, index) = split_path(path)?;
                self.with_children(&parent, path, |kids| {
                    kids.remove(index);
                    Ok(())
                })?;
                let (new_parent, new_index) = split_path(&true_path)?;
                self.with_children(&new_parent, &true_path, |kids| {
                    if new_index > kids.len() {
                        return Err(ModelError::InvalidPath(true_path.clone()));
                    }
                    kids.insert(new_index, node.clone());
                    Ok(())
                })
            }
            Operation::SetNode {
                path,
                properties,
                new_properties,
            } => {
                let (parent, index) = split_path(path)?;
                self.with_children(&parent, path, |kids| {
                    let target = kids
                        .get(index)
                        .ok_or_else(|| ModelError::InvalidPath(path.clone()))?;
                    let mut next = target.as_ref().clone();
                    let attrs = match &mut next {
                        Node::Element(e) => &mut e.attrs,
                        Node::Text(t) => &mut t.marks,
                    };
                    for (k, v) in new_properties {
                        attrs.insert(k.clone(), v.clone());
                    }
                    for k in properties.keys() {
                        if !new_properties.contains_key(k) {
                            attrs.remove(k);
                        }
                    }
                    kids[index] = Rc::new(next);
                    Ok(())
                })
            }
            Operation::SetSelection { .. } => Ok(()),
        }
    }

    fn replace_leaf(
        &mut self,
        path: &Path,
        f: impl FnOnce(&Text) -> Result<Text, ModelError>,
    ) -> Result<(), ModelError> {
        let (parent, index) = split_path(path)?;
        let mut f = Some(f);
        self.with_children(&parent, path, |kids| {
            let leaf = kids
                .get(index)
                .and_then(|n| n.as_text())
                .ok_or_else(|| ModelError::WrongKind {
                    path: path.clone(),
                    expected: "text",
                })?;
            let f = f.take().ok_or_else(|| ModelError::InvalidPath(path.clone()))?;
            kids[index] = Rc::new(Node::Text(f(leaf)?));
            Ok(())
        })
    }

    fn with_children(
        &mut self,
        parent: &[usize],
        full: &Path,
        mut f: impl FnMut(&mut Vec<Rc<Node>>) -> Result<(), ModelError>,
    ) -> Result<(), ModelError> {
        with_children_at(&mut self.children, parent, full, &mut f)
    }
}

fn with_children_at(
    children: &mut Vec<Rc<Node>>,
    parent: &[usize],
    full: &Path,
    f: &mut dyn FnMut(&mut Vec<Rc<Node>>) -> Result<(), ModelError>,
) -> Result<(), ModelError> {
    let Some((first, rest)) = parent.split_first() else {
        return f(children);
    };
    let slot = children
        .get_mut(*first)
        .ok_or_else(|| ModelError::InvalidPath(full.clone()))?;
    let Node::Element(el) = slot.as_ref() else {
        return Err(ModelError::WrongKind {
            path: full.clone(),
            expected: "element",
        });
    };
    let mut inner = el.children.clone();
    with_children_at(&mut inner, rest, full, f)?;
    let replaced = Node::same_key_element(el, inner);
    *slot = Rc::new(replaced);
    Ok(())
}

fn split_path(path: &Path) -> Result<(Path, usize), ModelError> {
    match (path.parent(), path.index()) {
        (Some(parent), Some(index)) => Ok((parent, index)),
        _ => Err(ModelError::InvalidPath(path.clone())),
    }
}

fn split_node(node: &Node, position: usize) -> (Node, Node) {
    match node {
        Node::Text(t) => {
            let at = char_to_byte(&t.text, position);
            let left = Text {
                text: t.text[..at].to_string(),
                ..t.clone()
            };
            let right = Text {
                key: NodeKey::fresh(),
                text: t.text[at..].to_string(),
                marks: t.marks.clone(),
            };
            (Node::Text(left), Node::Text(right))
        }
        Node::Element(e) => {
            let at = position.min(e.children.len());
            let left = Node::same_key_element(e, e.children[..at].to_vec());
            let right = Node::Element(Element {
                key: NodeKey::fresh(),
                kind: e.kind.clone(),
                children: e.children[at..].to_vec(),
                attrs: e.attrs.clone(),
            });
            (left, right)
        }
    }
}

fn merge_nodes(prev: &Node, cur: &Node) -> Option<Node> {
    match (prev, cur) {
        (Node::Text(a), Node::Text(b)) => {
            let mut merged = a.clone();
            merged.text.push_str(&b.text);
            Some(Node::Text(merged))
        }
        (Node::Element(a), Node::Element(b)) => {
            let mut children = a.children.clone();
            children.extend(b.children.iter().cloned());
            Some(Node::same_key_element(a, children))
        }
        _ => None,
    }
}

fn validate_node(node: &Node, path: &Path) -> Result<(), ModelError> {
    if let Node::Element(el) = node {
        if el.children.is_empty() {
            return Err(ModelError::EmptyElement(path.clone()));
        }
        for (i, child) in el.children.iter().enumerate() {
            validate_node(child, &path.child(i))?;
        }
    }
    Ok(())
}

fn slice_node(node: &Node, path: &Path, start: &Point, end: &Point) -> Option<Node> {
    match node {
        Node::Text(t) => {
            if path < &start.path || path > &end.path {
                return None;
            }
            let from = if path == &start.path { start.offset } else { 0 };
            let to = if path == &end.path { end.offset } else { t.len() };
            Some(Node::Text(Text {
                key: NodeKey::fresh(),
                text: crate::node::char_slice(&t.text, from, to).to_string(),
                marks: t.marks.clone(),
            }))
        }
        Node::Element(e) => {
            let children: Vec<Rc<Node>> = e
                .children
                .iter()
                .enumerate()
                .filter_map(|(i, c)| slice_node(c, &path.child(i), start, end))
                .map(Rc::new)
                .collect();
            if children.is_empty() {
                return None;
            }
            Some(Node::Element(Element {
                key: NodeKey::fresh(),
                kind: e.kind.clone(),
                children,
                attrs: e.attrs.clone(),
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn para(text: &str) -> Node {
        Node::element("paragraph", [Node::text(text)])
    }

    #[test]
    fn validate_rejects_bad_documents() {
        assert_eq!(Editor::new(Vec::<Node>::new()).validate(), Err(ModelError::EmptyDocument));
        assert_eq!(
            Editor::new([Node::text("x")]).validate(),
            Err(ModelError::TopLevelText(0))
        );
        assert_eq!(
            Editor::new([Node::element("paragraph", Vec::<Node>::new())]).validate(),
            Err(ModelError::EmptyElement(Path::from([0])))
        );
        assert!(Editor::new([para("")]).validate().is_ok());
    }

    #[test]
    fn insert_text_keeps_keys_along_the_path() {
        let mut editor = Editor::new([para("hello"), para("world")]);
        let block_key = editor.node(&[0]).unwrap().key();
        let leaf_key = editor.node(&[0, 0]).unwrap().key();
        let untouched = editor.node(&[1]).unwrap().clone();

        editor
            .apply(Operation::InsertText {
                path: Path::from([0, 0]),
                offset: 5,
                text: "!".into(),
            })
            .unwrap();

        assert_eq!(editor.string(&[0]), "hello!");
        assert_eq!(editor.node(&[0]).unwrap().key(), block_key);
        assert_eq!(editor.node(&[0, 0]).unwrap().key(), leaf_key);
        assert!(Rc::ptr_eq(editor.node(&[1]).unwrap(), &untouched));
        assert_eq!(editor.operations().len(), 1);
    }

    #[test]
    fn split_gives_right_half_a_fresh_key() {
        let mut editor = Editor::new([para("hello")]);
        let key = editor.node(&[0, 0]).unwrap().key();
        editor
            .apply(Operation::SplitNode {
                path: Path::from([0, 0]),
                position: 2,
            })
            .unwrap();
        assert_eq!(editor.text(&[0, 0]).unwrap().text, "he");
        assert_eq!(editor.text(&[0, 1]).unwrap().text, "llo");
        assert_eq!(editor.node(&[0, 0]).unwrap().key(), key);
        assert_ne!(editor.node(&[0, 1]).unwrap().key(), key);
    }

    #[test]
    fn selection_follows_operations() {
        let mut editor = Editor::new([para("hello")]);
        editor
            .apply(Operation::SetSelection {
                properties: None,
                new_properties: Some(Range::collapsed(Point::new([0, 0], 3))),
            })
            .unwrap();
        editor
            .apply(Operation::InsertText {
                path: Path::from([0, 0]),
                offset: 0,
                text: ">>".into(),
            })
            .unwrap();
        assert_eq!(
            editor.selection(),
            Some(&Range::collapsed(Point::new([0, 0], 5)))
        );
    }

    #[test]
    fn removing_selected_block_falls_back_to_previous_leaf() {
        let mut editor = Editor::new([para("ab"), para("cd")]);
        editor
            .apply(Operation::SetSelection {
                properties: None,
                new_properties: Some(Range::collapsed(Point::new([1, 0], 1))),
            })
            .unwrap();
        let node = editor.node(&[1]).unwrap().clone();
        editor
            .apply(Operation::RemoveNode {
                path: Path::from([1]),
                node,
            })
            .unwrap();
        assert_eq!(
            editor.selection(),
            Some(&Range::collapsed(Point::new([0, 0], 2)))
        );
    }

    #[test]
    fn set_node_adds_and_removes_marks() {
        let mut editor = Editor::new([para("x")]);
        let mut bold = Attrs::new();
        bold.insert("bold".into(), json!(true));
        editor
            .apply(Operation::SetNode {
                path: Path::from([0, 0]),
                properties: Attrs::new(),
                new_properties: bold.clone(),
            })
            .unwrap();
        assert_eq!(editor.text(&[0, 0]).unwrap().marks, bold);
        editor
            .apply(Operation::SetNode {
                path: Path::from([0, 0]),
                properties: bold,
                new_properties: Attrs::new(),
            })
            .unwrap();
        assert!(editor.text(&[0, 0]).unwrap().marks.is_empty());
    }

    #[test]
    fn move_node_reorders_blocks() {
        let mut editor = Editor::new([para("a"), para("b"), para("c")]);
        editor
            .apply(Operation::MoveNode {
                path: Path::from([0]),
                new_path: Path::from([2]),
            })
            .unwrap();
        let order: Vec<String> = (0..3).map(|i| editor.string(&[i])).collect();
        assert_eq!(order, ["b", "c", "a"]);
    }

    #[test]
    fn marks_at_block_start_come_from_previous_leaf() {
        let mut editor = Editor::new([Node::element(
            "paragraph",
            [
                Text::new("bold").with_mark("bold", json!(true)).into(),
                Node::text("plain"),
            ],
        )]);
        editor
            .apply(Operation::SetSelection {
                properties: None,
                new_properties: Some(Range::collapsed(Point::new([0, 1], 0))),
            })
            .unwrap();
        assert_eq!(
            editor.marks().unwrap().get("bold"),
            Some(&json!(true))
        );
    }

    #[test]
    fn fragment_trims_edges() {
        let editor = Editor::new([para("hello"), para("world")]);
        let frag = editor.fragment(&Range::new(Point::new([0, 0], 3), Point::new([1, 0], 2)));
        let strings: Vec<String> = frag.iter().map(|n| n.string()).collect();
        assert_eq!(strings, ["lo", "wo"]);
    }

    #[test]
    fn structure_queries() {
        let editor = Editor::new([Node::element(
            "paragraph",
            [
                Node::text("a"),
                Node::element("link", [Node::text("b")]),
                Node::text(""),
            ],
        )])
        .with_schema(Schema::new().with_inline("link"));
        assert_eq!(editor.block_above(&[0, 1, 0]), Some(Path::from([0])));
        assert_eq!(editor.inline_above(&[0, 1, 0]), Some(Path::from([0, 1])));
        assert_eq!(editor.leaf_blocks(), vec![Path::from([0])]);
        assert!(editor.is_end(&Point::new([0, 1, 0], 1), &[0, 1]));
    }
}
