//! Points and ranges.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::path::Path;

/// A caret position: a text leaf path plus a char offset into its text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub path: Path,
    pub offset: usize,
}

impl Point {
    pub fn new(path: impl Into<Path>, offset: usize) -> Self {
        Self {
            path: path.into(),
            offset,
        }
    }

    pub fn is_before(&self, other: &Point) -> bool {
        self.cmp(other) == Ordering::Less
    }

    pub fn is_after(&self, other: &Point) -> bool {
        self.cmp(other) == Ordering::Greater
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        match self.path.compare(&other.path) {
            Ordering::Equal => self.offset.cmp(&other.offset),
            unequal => unequal,
        }
    }
}

/// Which end of a range an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Anchor,
    Focus,
    Start,
    End,
}

/// How a point at the exact location of an insertion moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affinity {
    Forward,
    Backward,
}

/// An anchor/focus pair. Backward when the focus precedes the anchor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub anchor: Point,
    pub focus: Point,
}

impl Range {
    pub fn new(anchor: Point, focus: Point) -> Self {
        Self { anchor, focus }
    }

    pub fn collapsed(point: Point) -> Self {
        Self {
            anchor: point.clone(),
            focus: point,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.anchor == self.focus
    }

    pub fn is_expanded(&self) -> bool {
        !self.is_collapsed()
    }

    pub fn is_backward(&self) -> bool {
        self.focus.is_before(&self.anchor)
    }

    /// `(start, end)` in document order.
    pub fn edges(&self) -> (&Point, &Point) {
        if self.is_backward() {
            (&self.focus, &self.anchor)
        } else {
            (&self.anchor, &self.focus)
        }
    }

    pub fn start(&self) -> &Point {
        self.edges().0
    }

    pub fn end(&self) -> &Point {
        self.edges().1
    }

    pub fn edge(&self, edge: Edge) -> &Point {
        match edge {
            Edge::Anchor => &self.anchor,
            Edge::Focus => &self.focus,
            Edge::Start => self.start(),
            Edge::End => self.end(),
        }
    }

    pub fn includes(&self, point: &Point) -> bool {
        let (start, end) = self.edges();
        start <= point && point <= end
    }

    /// The overlap of two ranges, if any. Touching ranges intersect in a
    /// collapsed range; the result is always forward.
    pub fn intersection(&self, other: &Range) -> Option<Range> {
        let (s1, e1) = self.edges();
        let (s2, e2) = other.edges();
        let start = if s1 > s2 { s1 } else { s2 };
        let end = if e1 < e2 { e1 } else { e2 };
        if end < start {
            None
        } else {
            Some(Range::new(start.clone(), end.clone()))
        }
    }

    /// Same range with anchor and focus swapped when needed so it is forward.
    pub fn forward(&self) -> Range {
        let (s, e) = self.edges();
        Range::new(s.clone(), e.clone())
    }
}
