//! Low-level operations and how paths, points and ranges move through them.

use std::rc::Rc;

use crate::node::{Attrs, Node};
use crate::path::Path;
use crate::point::{Affinity, Point, Range};

/// A single atomic change to the editor. Every mutation of the document or
/// the selection is expressed as one of these and recorded in the editor's
/// pending operation batch.
#[derive(Debug, Clone, PartialEq)]
pub enum Operation {
    InsertText {
        path: Path,
        offset: usize,
        text: String,
    },
    RemoveText {
        path: Path,
        offset: usize,
        text: String,
    },
    InsertNode {
        path: Path,
        node: Rc<Node>,
    },
    RemoveNode {
        path: Path,
        node: Rc<Node>,
    },
    /// Split the node at `path`: children (or chars) from `position` onward
    /// move into a new next sibling with the same type and attributes.
    SplitNode {
        path: Path,
        position: usize,
    },
    /// Merge the node at `path` into its previous sibling, whose length
    /// before the merge was `position`.
    MergeNode {
        path: Path,
        position: usize,
    },
    MoveNode {
        path: Path,
        new_path: Path,
    },
    /// Keys present in `new_properties` are set; keys present only in
    /// `properties` are removed.
    SetNode {
        path: Path,
        properties: Attrs,
        new_properties: Attrs,
    },
    SetSelection {
        properties: Option<Range>,
        new_properties: Option<Range>,
    },
}

impl Operation {
    /// Path the operation targets, if it targets a node.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Operation::InsertText { path, .. }
            | Operation::RemoveText { path, .. }
            | Operation::InsertNode { path, .. }
            | Operation::RemoveNode { path, .. }
            | Operation::SplitNode { path, .. }
            | Operation::MergeNode { path, .. }
            | Operation::MoveNode { path, .. }
            | Operation::SetNode { path, .. } => Some(path),
            Operation::SetSelection { .. } => None,
        }
    }

    pub fn is_selection_only(&self) -> bool {
        matches!(self, Operation::SetSelection { .. })
    }

    pub fn is_text_edit(&self) -> bool {
        matches!(
            self,
            Operation::InsertText { .. } | Operation::RemoveText { .. }
        )
    }

    pub fn name(&self) -> &'static str {
        match self {
            Operation::InsertText { .. } => "insert_text",
            Operation::RemoveText { .. } => "remove_text",
            Operation::InsertNode { .. } => "insert_node",
            Operation::RemoveNode { .. } => "remove_node",
            Operation::SplitNode { .. } => "split_node",
            Operation::MergeNode { .. } => "merge_node",
            Operation::MoveNode { .. } => "move_node",
            Operation::SetNode { .. } => "set_node",
            Operation::SetSelection { .. } => "set_selection",
        }
    }
}

impl Path {
    /// Where this path points after `op` is applied, or `None` if the node
    /// it addressed was removed.
    pub fn transform(&self, op: &Operation) -> Option<Path> {
        self.transform_with(op, Affinity::Forward)
    }

    pub fn transform_with(&self, op: &Operation, affinity: Affinity) -> Option<Path> {
        let mut p = self.clone();
        if p.is_root() {
            return Some(p);
        }
        match op {
            Operation::InsertNode { path: op_path, .. } => {
                if op_path == &p || op_path.ends_before(&p) || op_path.is_ancestor_of(&p) {
                    let d = op_path.len() - 1;
                    p.set(d, p[d] + 1);
                }
            }
            Operation::RemoveNode { path: op_path, .. } => {
                if op_path.is_ancestor_or_equal(&p) {
                    return None;
                }
                if op_path.ends_before(&p) {
                    let d = op_path.len() - 1;
                    p.set(d, p[d] - 1);
                }
            }
            Operation::MergeNode {
                path: op_path,
                position,
            } => {
                let d = op_path.len() - 1;
                if op_path == &p || op_path.ends_before(&p) {
                    p.set(d, p[d] - 1);
                } else if op_path.is_ancestor_of(&p) {
                    p.set(d, p[d] - 1);
                    p.set(d + 1, p[d + 1] + position);
                }
            }
            Operation::SplitNode {
                path: op_path,
                position,
            } => {
                let d = op_path.len() - 1;
                if op_path == &p {
                    if affinity == Affinity::Forward {
                        p.set(d, p[d] + 1);
                    }
                } else if op_path.ends_before(&p) {
                    p.set(d, p[d] + 1);
                } else if op_path.is_ancestor_of(&p) && p[d + 1] >= *position {
                    p.set(d, p[d] + 1);
                    p.set(d + 1, p[d + 1] - position);
                }
            }
            Operation::MoveNode {
                path: op_path,
                new_path,
            } => {
                if op_path == new_path {
                    return Some(p);
                }
                let od = op_path.len() - 1;
                if op_path.is_ancestor_or_equal(&p) {
                    let mut moved = new_path.to_vec();
                    if op_path.ends_before(new_path) && op_path.len() < new_path.len() {
                        moved[od] -= 1;
                    }
                    moved.extend_from_slice(&p[op_path.len()..]);
                    return Some(Path::from(moved));
                }
                let nd = new_path.len() - 1;
                if op_path.is_sibling_of(new_path) && new_path.is_ancestor_or_equal(&p) {
                    if op_path.ends_before(&p) {
                        p.set(od, p[od] - 1);
                    } else {
                        p.set(od, p[od] + 1);
                    }
                } else if new_path.ends_before(&p) || new_path.is_ancestor_or_equal(&p) {
                    if op_path.ends_before(&p) {
                        p.set(od, p[od] - 1);
                    }
                    p.set(nd, p[nd] + 1);
                } else if op_path.ends_before(&p) {
                    if new_path == &p {
                        p.set(nd, p[nd] + 1);
                    }
                    p.set(od, p[od] - 1);
                }
            }
            Operation::InsertText { .. }
            | Operation::RemoveText { .. }
            | Operation::SetNode { .. }
            | Operation::SetSelection { .. } => {}
        }
        Some(p)
    }
}

impl Point {
    /// Where this point lands after `op`, or `None` if its leaf was removed.
    pub fn transform(&self, op: &Operation, affinity: Affinity) -> Option<Point> {
        let mut point = self.clone();
        match op {
            Operation::InsertText { path, offset, text } => {
                if path == &point.path
                    && (*offset < point.offset
                        || (*offset == point.offset && affinity == Affinity::Forward))
                {
                    point.offset += text.chars().count();
                }
            }
            Operation::RemoveText { path, offset, text } => {
                if path == &point.path && *offset <= point.offset {
                    point.offset -= (point.offset - offset).min(text.chars().count());
                }
            }
            Operation::MergeNode { path, position } => {
                if path == &point.path {
                    point.offset += position;
                }
                point.path = point.path.transform_with(op, affinity)?;
            }
            Operation::SplitNode { path, position } => {
                if path == &point.path {
                    if *position < point.offset
                        || (*position == point.offset && affinity == Affinity::Forward)
                    {
                        point.offset -= position;
                        point.path = point.path.next()?;
                    }
                } else {
                    point.path = point.path.transform_with(op, affinity)?;
                }
            }
            _ => {
                point.path = point.path.transform_with(op, affinity)?;
            }
        }
        Some(point)
    }
}

impl Range {
    /// Transform with inward affinity: an expanded range does not grow to
    /// swallow text inserted at its edges.
    pub fn transform(&self, op: &Operation) -> Option<Range> {
        let (anchor_aff, focus_aff) = if self.is_collapsed() {
            (Affinity::Forward, Affinity::Forward)
        } else if self.is_backward() {
            (Affinity::Backward, Affinity::Forward)
        } else {
            (Affinity::Forward, Affinity::Backward)
        };
        let anchor = self.anchor.transform(op, anchor_aff)?;
        let focus = self.focus.transform(op, focus_aff)?;
        Some(Range::new(anchor, focus))
    }
}
