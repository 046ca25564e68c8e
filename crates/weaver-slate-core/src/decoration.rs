//! Decorations: ranges that add attributes to rendered leaves without
//! changing the document.

use smol_str::SmolStr;
use weaver_slate_model::{Attrs, Point, Range};

#[derive(Debug, Clone, PartialEq)]
pub enum DecorationKind {
    Custom,
    /// Placeholder text shown while the document is empty.
    Placeholder(SmolStr),
    /// Marks the caret position while pending marks differ from the leaf.
    MarkPlaceholder,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decoration {
    pub anchor: Point,
    pub focus: Point,
    pub attrs: Attrs,
    pub kind: DecorationKind,
}

impl Decoration {
    pub fn new(range: Range, attrs: Attrs) -> Self {
        Self {
            anchor: range.anchor,
            focus: range.focus,
            attrs,
            kind: DecorationKind::Custom,
        }
    }

    pub fn placeholder(at: Point, text: impl Into<SmolStr>) -> Self {
        Self {
            anchor: at.clone(),
            focus: at,
            attrs: Attrs::new(),
            kind: DecorationKind::Placeholder(text.into()),
        }
    }

    pub fn mark_placeholder(at: Point, attrs: Attrs) -> Self {
        Self {
            anchor: at.clone(),
            focus: at,
            attrs,
            kind: DecorationKind::MarkPlaceholder,
        }
    }

    pub fn range(&self) -> Range {
        Range::new(self.anchor.clone(), self.focus.clone())
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.kind, DecorationKind::Placeholder(_))
    }

    /// This decoration clipped to `range`, keeping its attributes.
    pub fn intersect(&self, range: &Range) -> Option<Decoration> {
        let clipped = self.range().intersection(range)?;
        Some(Decoration {
            anchor: clipped.anchor,
            focus: clipped.focus,
            attrs: self.attrs.clone(),
            kind: self.kind.clone(),
        })
    }
}

/// Equality used to decide whether a node must re-render. Two empty lists are
/// equal whatever their origin.
pub fn decorations_equal(a: &[Decoration], b: &[Decoration]) -> bool {
    if a.is_empty() && b.is_empty() {
        return true;
    }
    a == b
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn attrs(name: &str) -> Attrs {
        let mut a = Attrs::new();
        a.insert(name.into(), json!(true));
        a
    }

    #[test]
    fn empty_lists_compare_equal() {
        let a: Vec<Decoration> = Vec::new();
        let b: Vec<Decoration> = Vec::with_capacity(8);
        assert!(decorations_equal(&a, &b));
    }

    #[test]
    fn lists_compare_by_value() {
        let range = Range::new(Point::new([0, 0], 1), Point::new([0, 0], 4));
        let a = vec![Decoration::new(range.clone(), attrs("highlight"))];
        let b = vec![Decoration::new(range.clone(), attrs("highlight"))];
        let c = vec![Decoration::new(range, attrs("search"))];
        assert!(decorations_equal(&a, &b));
        assert!(!decorations_equal(&a, &c));
        assert!(!decorations_equal(&a, &[]));
    }

    #[test]
    fn intersect_clips_to_node_range() {
        let deco = Decoration::new(
            Range::new(Point::new([0, 0], 2), Point::new([1, 0], 3)),
            attrs("highlight"),
        );
        let second = Range::new(Point::new([1, 0], 0), Point::new([1, 0], 5));
        let clipped = deco.intersect(&second).unwrap();
        assert_eq!(clipped.anchor, Point::new([1, 0], 0));
        assert_eq!(clipped.focus, Point::new([1, 0], 3));

        let third = Range::new(Point::new([2, 0], 0), Point::new([2, 0], 5));
        assert!(deco.intersect(&third).is_none());
    }
}
