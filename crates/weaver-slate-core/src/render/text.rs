use std::rc::Rc;

use weaver_slate_model::node::char_slice;
use weaver_slate_model::{Element, Node, Path, Range, Text};

use super::{Leaf, RenderFlags, Renderer, merged_attrs};
use crate::decoration::{Decoration, DecorationKind};
use crate::vdom::{DomRole, VElement, VNode};

impl Renderer<'_> {
    #[allow(clippy::too_many_arguments)]
    pub(super) fn render_text(
        &mut self,
        node: &Rc<Node>,
        text: &Text,
        parent: &Element,
        path: &Path,
        decorations: Vec<Decoration>,
        selection: Option<Range>,
        flags: RenderFlags,
    ) -> Rc<VElement> {
        if let Some(hit) = self
            .cache
            .lookup(node, &decorations, selection.as_ref(), flags)
        {
            self.stats.reused += 1;
            return hit;
        }

        let key = text.key();
        let id = self.root_id(key);
        let leaves = split_leaves(text, &decorations);
        let last = leaves.len().saturating_sub(1);
        let children = leaves
            .iter()
            .enumerate()
            .map(|(i, leaf)| {
                let is_last = flags.is_last && i == last;
                VNode::Element(Rc::new(self.render_leaf(leaf, text, parent, is_last, flags)))
            })
            .collect::<Vec<_>>();

        let mut output = VElement::new("span")
            .attr("data-slate-node", "text")
            .children(children);
        output.id = id;
        output.role = DomRole::Text(key);

        tracing::trace!(
            target: "weaver::render",
            %path,
            leaves = leaves.len(),
            "rendered text"
        );
        self.finish(node, &decorations, selection.as_ref(), flags, output)
    }
}

/// Split a text node into leaves at decoration boundaries.
///
/// Decorations must already be clipped to the text. A collapsed decoration
/// inside the text produces an empty leaf at its offset; on an empty text it
/// applies to the single leaf.
pub fn split_leaves(text: &Text, decorations: &[Decoration]) -> Vec<Leaf> {
    let mut leaves = vec![Leaf::plain(text)];

    for deco in decorations {
        let range = deco.range();
        let (start, end) = range.edges();
        let (dstart, dend) = (start.offset, end.offset);
        let mut next = Vec::with_capacity(leaves.len() + 2);
        let mut leaf_end = 0;

        for leaf in leaves {
            let length = leaf.text.chars().count();
            let leaf_start = leaf_end;
            leaf_end += length;

            if dstart <= leaf_start && leaf_end <= dend {
                next.push(leaf.decorated(deco));
                continue;
            }

            let outside = (dstart != dend && (dstart == leaf_end || dend == leaf_start))
                || dstart > leaf_end
                || dend < leaf_start
                || (dend == leaf_start && leaf_start != 0);
            if outside {
                next.push(leaf);
                continue;
            }

            let mut middle = leaf;
            let mut before = None;
            let mut after = None;
            if dend < leaf_end {
                let off = dend - leaf_start;
                after = Some(middle.slice(off, length));
                middle = middle.slice(0, off);
            }
            if dstart > leaf_start {
                let off = dstart - leaf_start;
                let len = middle.text.chars().count();
                before = Some(middle.slice(0, off));
                middle = middle.slice(off, len);
            }
            next.extend(before);
            next.push(middle.decorated(deco));
            next.extend(after);
        }
        leaves = next;
    }

    let mut start = 0;
    for leaf in &mut leaves {
        leaf.start = start;
        start += leaf.text.chars().count();
    }
    leaves
}

impl Leaf {
    fn plain(text: &Text) -> Self {
        Leaf {
            text: text.text.clone(),
            marks: text.marks.clone(),
            start: 0,
            placeholder: None,
            mark_placeholder: false,
        }
    }

    fn slice(&self, from: usize, to: usize) -> Leaf {
        Leaf {
            text: char_slice(&self.text, from, to).to_string(),
            ..self.clone()
        }
    }

    fn decorated(mut self, deco: &Decoration) -> Leaf {
        self.marks = merged_attrs(&self.marks, &deco.attrs);
        match &deco.kind {
            DecorationKind::Custom => {}
            DecorationKind::Placeholder(text) => self.placeholder = Some(text.clone()),
            DecorationKind::MarkPlaceholder => self.mark_placeholder = true,
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use weaver_slate_model::{Attrs, Point};

    fn deco(path: &[usize], from: usize, to: usize, mark: &str) -> Decoration {
        let mut attrs = Attrs::new();
        attrs.insert(mark.into(), json!(true));
        Decoration::new(Range::new(Point::new(path, from), Point::new(path, to)), attrs)
    }

    fn texts(leaves: &[Leaf]) -> Vec<&str> {
        leaves.iter().map(|l| l.text.as_str()).collect()
    }

    #[test]
    fn splits_at_decoration_edges() {
        let text = Text::new("some rich text");
        let leaves = split_leaves(&text, &[deco(&[0, 0], 5, 9, "highlight")]);
        assert_eq!(texts(&leaves), ["some ", "rich", " text"]);
        assert_eq!(leaves[1].start, 5);
        assert!(leaves[1].marks.contains_key("highlight"));
        assert!(!leaves[0].marks.contains_key("highlight"));
    }

    #[test]
    fn overlapping_decorations_stack() {
        let text = Text::new("abcdef");
        let leaves = split_leaves(
            &text,
            &[deco(&[0, 0], 0, 4, "a"), deco(&[0, 0], 2, 6, "b")],
        );
        assert_eq!(texts(&leaves), ["ab", "cd", "ef"]);
        assert!(leaves[1].marks.contains_key("a") && leaves[1].marks.contains_key("b"));
        assert!(!leaves[2].marks.contains_key("a"));
    }

    #[test]
    fn collapsed_decoration_makes_an_empty_leaf() {
        let text = Text::new("abc");
        let leaves = split_leaves(&text, &[deco(&[0, 0], 1, 1, "caret")]);
        assert_eq!(texts(&leaves), ["a", "", "bc"]);
        assert!(leaves[1].marks.contains_key("caret"));

        let empty = Text::new("");
        let leaves = split_leaves(
            &empty,
            &[Decoration::placeholder(Point::new([0, 0], 0), "Type here")],
        );
        assert_eq!(leaves.len(), 1);
        assert_eq!(leaves[0].placeholder.as_deref(), Some("Type here"));
    }

    #[test]
    fn null_decoration_values_unset_marks() {
        let text = Text::new("bold").with_mark("bold", json!(true));
        let mut attrs = Attrs::new();
        attrs.insert("bold".into(), serde_json::Value::Null);
        attrs.insert("italic".into(), json!(true));
        let leaves = split_leaves(
            &text,
            &[Decoration::mark_placeholder(Point::new([0, 0], 4), attrs)],
        );
        assert_eq!(texts(&leaves), ["bold", ""]);
        assert!(leaves[1].mark_placeholder);
        assert!(!leaves[1].marks.contains_key("bold"));
        assert!(leaves[1].marks.contains_key("italic"));
    }
}
