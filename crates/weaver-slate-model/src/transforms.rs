//! Editing transforms built out of [`Operation`]s.
//!
//! Each public transform applies its operations, normalizes, and leaves the
//! selection where a user would expect the caret.

use std::rc::Rc;

use smol_str::SmolStr;

use crate::editor::Editor;
use crate::error::ModelError;
use crate::node::{Attrs, Node, Text, char_slice};
use crate::operation::Operation;
use crate::path::Path;
use crate::point::{Affinity, Edge, Point, Range};
use crate::text_units::TextUnit;

/// Block type used when a transform has to create a block from nothing.
pub const DEFAULT_BLOCK: &str = "paragraph";

fn missing(path: &Path) -> ModelError {
    ModelError::InvalidPath(path.clone())
}

impl Editor {
    // === Selection ===

    pub fn select(&mut self, range: Range) -> Result<(), ModelError> {
        let current = self.selection().cloned();
        if current.as_ref() == Some(&range) {
            return Ok(());
        }
        self.apply(Operation::SetSelection {
            properties: current,
            new_properties: Some(range),
        })
    }

    pub fn deselect(&mut self) -> Result<(), ModelError> {
        let Some(current) = self.selection().cloned() else {
            return Ok(());
        };
        self.apply(Operation::SetSelection {
            properties: Some(current),
            new_properties: None,
        })
    }

    pub fn collapse(&mut self, edge: Edge) -> Result<(), ModelError> {
        let Some(selection) = self.selection().cloned() else {
            return Ok(());
        };
        self.select(Range::collapsed(selection.edge(edge).clone()))
    }

    /// Move the focus by one `unit`. Without `extend`, an expanded selection
    /// collapses to the edge in the direction of travel instead.
    pub fn move_selection(
        &mut self,
        unit: TextUnit,
        reverse: bool,
        extend: bool,
    ) -> Result<(), ModelError> {
        let Some(selection) = self.selection().cloned() else {
            return Ok(());
        };
        if !extend && selection.is_expanded() {
            return self.collapse(if reverse { Edge::Start } else { Edge::End });
        }
        let target = if reverse {
            self.point_before(&selection.focus, unit)
        } else {
            self.point_after(&selection.focus, unit)
        };
        let Some(target) = target else {
            return Ok(());
        };
        let range = if extend {
            Range::new(selection.anchor, target)
        } else {
            Range::collapsed(target)
        };
        self.select(range)
    }

    // === Text ===

    /// Insert text at the selection, replacing any selected content. Pending
    /// marks that differ from the leaf under the caret produce a new leaf.
    pub fn insert_text(&mut self, text: &str) -> Result<(), ModelError> {
        if self.selection().is_some_and(|s| s.is_expanded()) {
            self.delete_fragment()?;
        }
        let Some(at) = self.selection().map(|s| s.anchor.clone()) else {
            return Ok(());
        };
        if text.is_empty() || self.void_above(&at.path).is_some() {
            return Ok(());
        }
        let leaf_marks = self.text(&at.path).map(|t| t.marks.clone());
        match self.pending_marks().cloned() {
            Some(marks) if leaf_marks.as_ref() != Some(&marks) => {
                let path = self.split_leaf_for_insert(&at)?;
                let mut leaf = Text::new(text);
                leaf.marks = marks;
                self.apply(Operation::InsertNode {
                    path: path.clone(),
                    node: Rc::new(leaf.into()),
                })?;
                self.select(Range::collapsed(Point::new(path, text.chars().count())))?;
            }
            _ => {
                self.apply(Operation::InsertText {
                    path: at.path.clone(),
                    offset: at.offset,
                    text: text.to_string(),
                })?;
            }
        }
        self.set_pending_marks(None);
        self.normalize()
    }

    /// Insert a line break inside the current block.
    pub fn insert_soft_break(&mut self) -> Result<(), ModelError> {
        self.insert_text("\n")
    }

    /// Insert text where each line after the first starts a new block.
    pub fn insert_plain_text(&mut self, text: &str) -> Result<(), ModelError> {
        let normalized = text.replace("\r\n", "\n").replace('\r', "\n");
        for (i, line) in normalized.split('\n').enumerate() {
            if i > 0 {
                self.insert_break()?;
            }
            self.insert_text(line)?;
        }
        Ok(())
    }

    // === Deletion ===

    pub fn delete_backward(&mut self, unit: TextUnit) -> Result<(), ModelError> {
        self.delete_unit(unit, true)
    }

    pub fn delete_forward(&mut self, unit: TextUnit) -> Result<(), ModelError> {
        self.delete_unit(unit, false)
    }

    fn delete_unit(&mut self, unit: TextUnit, reverse: bool) -> Result<(), ModelError> {
        let Some(selection) = self.selection().cloned() else {
            return Ok(());
        };
        if selection.is_expanded() {
            return self.delete_fragment();
        }
        let at = selection.anchor;
        if let Some(void) = self.void_above(&at.path) {
            self.remove_node(&void)?;
            return self.normalize();
        }
        let target = if reverse {
            self.point_before(&at, unit)
        } else {
            self.point_after(&at, unit)
        };
        let Some(target) = target else {
            return Ok(());
        };
        if let Some(void) = self.void_above(&target.path) {
            self.remove_node(&void)?;
            return self.normalize();
        }
        self.delete_range(&Range::new(at, target))
    }

    /// Delete the selected content, if any.
    pub fn delete_fragment(&mut self) -> Result<(), ModelError> {
        match self.selection().cloned() {
            Some(selection) if selection.is_expanded() => self.delete_range(&selection),
            _ => Ok(()),
        }
    }

    /// Delete everything inside `range`, merging the blocks at its edges.
    pub fn delete_range(&mut self, range: &Range) -> Result<(), ModelError> {
        let (start, end) = range.edges();
        let (start, end) = (start.clone(), end.clone());
        if start == end {
            return Ok(());
        }
        let mark = self.operations().len();
        if start.path == end.path {
            self.remove_text(&start.path, start.offset, end.offset)?;
        } else {
            let start_block = self.block_above(&start.path).ok_or_else(|| missing(&start.path))?;
            let end_block = self.block_above(&end.path).ok_or_else(|| missing(&end.path))?;

            self.remove_text(&end.path, 0, end.offset)?;
            for path in self.covered_between(&start.path, &end.path).into_iter().rev() {
                self.remove_node(&path)?;
            }
            let start_len = self.text(&start.path).map(|t| t.len()).unwrap_or(0);
            self.remove_text(&start.path, start.offset, start_len)?;

            if start_block != end_block {
                let end_block = self
                    .transform_path_since(&end_block, mark)
                    .ok_or_else(|| missing(&end_block))?;
                self.join_blocks(&start_block, &end_block)?;
            }
        }
        if let Some(caret) = self.transform_point_since(&start, mark) {
            self.select(Range::collapsed(caret))?;
        }
        self.normalize()
    }

    /// Highest nodes lying strictly between two leaves.
    fn covered_between(&self, start: &Path, end: &Path) -> Vec<Path> {
        let mut out = Vec::new();
        self.collect_covered(&Path::root(), start, end, &mut out);
        out
    }

    fn collect_covered(&self, parent: &Path, start: &Path, end: &Path, out: &mut Vec<Path>) {
        let count = self.children_at(parent).map_or(0, |c| c.len());
        for i in 0..count {
            let p = parent.child(i);
            if p.is_ancestor_of(start) || p.is_ancestor_of(end) {
                self.collect_covered(&p, start, end, out);
            } else if &p > start && &p < end {
                out.push(p);
            }
        }
    }

    fn join_blocks(&mut self, start_block: &Path, end_block: &Path) -> Result<(), ModelError> {
        if self.element(end_block).is_some_and(|e| self.is_void(e)) {
            return self.remove_node(end_block);
        }
        if self.element(start_block).is_some_and(|e| self.is_void(e)) {
            return self.remove_node(start_block);
        }
        let start_len = self.children_at(start_block).map_or(0, |c| c.len());
        if start_block.next().as_ref() == Some(end_block) {
            return self.apply(Operation::MergeNode {
                path: end_block.clone(),
                position: start_len,
            });
        }
        let count = self.children_at(end_block).map_or(0, |c| c.len());
        for i in 0..count {
            self.apply(Operation::MoveNode {
                path: end_block.child(0),
                new_path: start_block.child(start_len + i),
            })?;
        }
        let mut target = end_block.clone();
        loop {
            let parent = target.parent();
            self.remove_node(&target)?;
            match parent {
                Some(parent)
                    if !parent.is_root()
                        && !parent.is_ancestor_of(start_block)
                        && self.children_at(&parent).is_some_and(|c| c.is_empty()) =>
                {
                    target = parent;
                }
                _ => break,
            }
        }
        Ok(())
    }

    // === Structure ===

    /// Split the current block at the caret and move the caret into the
    /// second half.
    pub fn insert_break(&mut self) -> Result<(), ModelError> {
        if self.selection().is_some_and(|s| s.is_expanded()) {
            self.delete_fragment()?;
        }
        let Some(mut at) = self.selection().map(|s| s.anchor.clone()) else {
            return Ok(());
        };
        if let Some(void) = self.void_above(&at.path) {
            let next = void.next().ok_or_else(|| missing(&void))?;
            let inline = self.element(&void).is_some_and(|e| self.is_inline(e));
            if inline && self.text(&next).is_some() {
                at = Point::new(next, 0);
            } else {
                self.insert_node(
                    &next,
                    Node::element(DEFAULT_BLOCK, [Node::text("")]),
                )?;
                let start = self.start(&next).ok_or_else(|| missing(&next))?;
                self.select(Range::collapsed(start))?;
                return self.normalize();
            }
        }
        let block = self.block_above(&at.path).ok_or_else(|| missing(&at.path))?;
        self.split_up_to(&at, &block)?;
        let next = block.next().ok_or_else(|| missing(&block))?;
        let start = self.start(&next).ok_or_else(|| missing(&next))?;
        self.select(Range::collapsed(start))?;
        self.normalize()
    }

    /// Split the leaf at `at` and every ancestor up to and including `block`.
    fn split_up_to(&mut self, at: &Point, block: &Path) -> Result<(), ModelError> {
        let mut path = at.path.clone();
        let mut position = at.offset;
        loop {
            self.apply(Operation::SplitNode {
                path: path.clone(),
                position,
            })?;
            if &path == block {
                return Ok(());
            }
            position = path.index().ok_or_else(|| missing(&path))? + 1;
            path = path.parent().ok_or_else(|| missing(block))?;
        }
    }

    /// Insert a document fragment at the selection. Inline content lands in
    /// the current block; whole blocks are inserted as siblings of it.
    pub fn insert_fragment(&mut self, fragment: &[Node]) -> Result<(), ModelError> {
        if fragment.is_empty() {
            return Ok(());
        }
        if self.selection().is_some_and(|s| s.is_expanded()) {
            self.delete_fragment()?;
        }
        let Some(at) = self.selection().map(|s| s.anchor.clone()) else {
            return Ok(());
        };
        if self.void_above(&at.path).is_some() {
            return Ok(());
        }
        let mut blocks: Vec<Node> = fragment.iter().map(Node::rekeyed).collect();
        if blocks.iter().all(|n| self.is_inline_content(n)) {
            self.insert_inlines(&at, blocks)?;
            return self.normalize();
        }
        if let Some(children) = self.inline_content_of(&blocks[0]) {
            self.insert_inlines(&at, children)?;
            blocks.remove(0);
        }
        if blocks.is_empty() {
            return self.normalize();
        }

        let at = self
            .selection()
            .map(|s| s.anchor.clone())
            .ok_or(ModelError::EmptyDocument)?;
        let block = self.block_above(&at.path).ok_or_else(|| missing(&at.path))?;
        let mut insert_at = if self.is_end(&at, &block) {
            block.next().ok_or_else(|| missing(&block))?
        } else if self.is_start(&at, &block) {
            block.clone()
        } else {
            self.split_up_to(&at, &block)?;
            block.next().ok_or_else(|| missing(&block))?
        };
        let mut last = insert_at.clone();
        for node in blocks {
            self.insert_node(&insert_at, node)?;
            last = insert_at.clone();
            insert_at = insert_at.next().ok_or_else(|| missing(&last))?;
        }
        if let Some(end) = self.end(&last) {
            self.select(Range::collapsed(end))?;
        }
        self.normalize()
    }

    fn is_inline_content(&self, node: &Node) -> bool {
        match node {
            Node::Text(_) => true,
            Node::Element(e) => self.is_inline(e),
        }
    }

    fn inline_content_of(&self, node: &Node) -> Option<Vec<Node>> {
        let el = node.as_element()?;
        if self.is_inline(el) || self.is_void(el) || !self.has_inlines(el) {
            return None;
        }
        Some(el.children.iter().map(|c| c.as_ref().clone()).collect())
    }

    fn insert_inlines(&mut self, at: &Point, nodes: Vec<Node>) -> Result<(), ModelError> {
        if nodes.is_empty() {
            return Ok(());
        }
        let leaf_marks = self
            .text(&at.path)
            .map(|t| t.marks.clone())
            .ok_or_else(|| missing(&at.path))?;
        let plain = nodes
            .iter()
            .all(|n| n.as_text().is_some_and(|t| t.marks == leaf_marks));
        if plain {
            let text: String = nodes.iter().map(|n| n.string()).collect();
            self.apply(Operation::InsertText {
                path: at.path.clone(),
                offset: at.offset,
                text: text.clone(),
            })?;
            return self.select(Range::collapsed(Point::new(
                at.path.clone(),
                at.offset + text.chars().count(),
            )));
        }
        let mut path = self.split_leaf_for_insert(at)?;
        let mut last = path.clone();
        for node in nodes {
            self.insert_node(&path, node)?;
            last = path.clone();
            path = path.next().ok_or_else(|| missing(&last))?;
        }
        let end = self.end(&last).ok_or_else(|| missing(&last))?;
        self.select(Range::collapsed(end))
    }

    // === Marks ===

    pub fn is_mark_active(&self, key: &str) -> bool {
        self.marks()
            .is_some_and(|m| m.get(key) == Some(&serde_json::Value::Bool(true)))
    }

    /// Set a mark on the selected text, or on the next insertion when the
    /// selection is collapsed.
    pub fn add_mark(
        &mut self,
        key: impl Into<SmolStr>,
        value: serde_json::Value,
    ) -> Result<(), ModelError> {
        let key = key.into();
        match self.selection().cloned() {
            Some(selection) if selection.is_expanded() => {
                self.set_mark_in_selection(&key, Some(value))
            }
            Some(_) => {
                let mut marks = self.marks().unwrap_or_default();
                marks.insert(key, value);
                self.set_pending_marks(Some(marks));
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn remove_mark(&mut self, key: impl Into<SmolStr>) -> Result<(), ModelError> {
        let key = key.into();
        match self.selection().cloned() {
            Some(selection) if selection.is_expanded() => self.set_mark_in_selection(&key, None),
            Some(_) => {
                let mut marks = self.marks().unwrap_or_default();
                marks.remove(&key);
                self.set_pending_marks(Some(marks));
                Ok(())
            }
            None => Ok(()),
        }
    }

    pub fn toggle_mark(&mut self, key: impl Into<SmolStr>) -> Result<(), ModelError> {
        let key = key.into();
        if self.is_mark_active(&key) {
            self.remove_mark(key)
        } else {
            self.add_mark(key, serde_json::Value::Bool(true))
        }
    }

    fn set_mark_in_selection(
        &mut self,
        key: &SmolStr,
        value: Option<serde_json::Value>,
    ) -> Result<(), ModelError> {
        let Some(selection) = self.selection().cloned() else {
            return Ok(());
        };
        let (start, end) = selection.edges();
        let (start, end) = (start.clone(), end.clone());
        self.split_leaf_inside(&end)?;
        self.split_leaf_inside(&start)?;

        // The selection has been carried through the splits onto leaf edges.
        let Some(selection) = self.selection().cloned() else {
            return Ok(());
        };
        let (start, end) = selection.edges();
        let targets: Vec<Path> = self
            .texts()
            .into_iter()
            .filter(|(t, p)| {
                p >= &start.path
                    && p <= &end.path
                    && !(p == &start.path && p != &end.path && start.offset >= t.len())
                    && !(p == &end.path && p != &start.path && end.offset == 0)
            })
            .map(|(_, p)| p)
            .collect();
        for path in targets {
            let Some(leaf) = self.text(&path) else {
                continue;
            };
            let mut properties = Attrs::new();
            if let Some(old) = leaf.marks.get(key) {
                properties.insert(key.clone(), old.clone());
            }
            let mut new_properties = Attrs::new();
            if let Some(value) = &value {
                new_properties.insert(key.clone(), value.clone());
            }
            if properties == new_properties {
                continue;
            }
            self.apply(Operation::SetNode {
                path,
                properties,
                new_properties,
            })?;
        }
        self.normalize()
    }

    // === Helpers ===

    pub fn insert_node(&mut self, path: &Path, node: Node) -> Result<(), ModelError> {
        self.apply(Operation::InsertNode {
            path: path.clone(),
            node: Rc::new(node),
        })
    }

    pub fn remove_node(&mut self, path: &Path) -> Result<(), ModelError> {
        let node = self.node(path).cloned().ok_or_else(|| missing(path))?;
        self.apply(Operation::RemoveNode {
            path: path.clone(),
            node,
        })
    }

    /// Remove chars `[from, to)` from the leaf at `path`.
    pub fn remove_text(&mut self, path: &Path, from: usize, to: usize) -> Result<(), ModelError> {
        if from >= to {
            return Ok(());
        }
        let leaf = self.text(path).ok_or_else(|| ModelError::WrongKind {
            path: path.clone(),
            expected: "text",
        })?;
        let text = char_slice(&leaf.text, from, to).to_string();
        self.apply(Operation::RemoveText {
            path: path.clone(),
            offset: from,
            text,
        })
    }

    /// Split the leaf under `at` so that new content can go between its halves,
    /// returning the path where that content belongs.
    fn split_leaf_for_insert(&mut self, at: &Point) -> Result<Path, ModelError> {
        let len = self
            .text(&at.path)
            .map(|t| t.len())
            .ok_or_else(|| missing(&at.path))?;
        if at.offset == 0 {
            return Ok(at.path.clone());
        }
        if at.offset < len {
            self.apply(Operation::SplitNode {
                path: at.path.clone(),
                position: at.offset,
            })?;
        }
        at.path.next().ok_or_else(|| missing(&at.path))
    }

    fn split_leaf_inside(&mut self, at: &Point) -> Result<(), ModelError> {
        let len = self.text(&at.path).map_or(0, |t| t.len());
        if at.offset > 0 && at.offset < len {
            self.apply(Operation::SplitNode {
                path: at.path.clone(),
                position: at.offset,
            })?;
        }
        Ok(())
    }

    /// Carry `path` through every operation applied since `mark`.
    pub fn transform_path_since(&self, path: &Path, mark: usize) -> Option<Path> {
        self.operations()
            .get(mark..)?
            .iter()
            .try_fold(path.clone(), |p, op| p.transform(op))
    }

    pub fn transform_point_since(&self, point: &Point, mark: usize) -> Option<Point> {
        self.operations()
            .get(mark..)?
            .iter()
            .try_fold(point.clone(), |p, op| p.transform(op, Affinity::Backward))
    }
}
