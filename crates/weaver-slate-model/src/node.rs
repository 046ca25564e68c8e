//! Document nodes.
//!
//! Nodes are immutable and shared through `Rc`. Every node carries a
//! [`NodeKey`] that identifies it across in-place edits: changing the text of
//! a leaf or the attributes of an element produces a new node value that keeps
//! the old key, while inserted and split-off nodes receive fresh keys. The
//! render layer keys its DOM bookkeeping by `NodeKey` and detects content
//! changes by `Rc` identity.

use std::collections::BTreeMap;
use std::rc::Rc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::path::Path;

/// Arbitrary attributes on elements, and marks on text leaves.
pub type Attrs = BTreeMap<SmolStr, serde_json::Value>;

static NEXT_KEY: AtomicU64 = AtomicU64::new(1);

/// Stable identity of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(u64);

impl NodeKey {
    /// Key of the editor root. Never assigned to a child node.
    pub const EDITOR: NodeKey = NodeKey(0);

    pub fn fresh() -> Self {
        NodeKey(NEXT_KEY.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl Default for NodeKey {
    fn default() -> Self {
        Self::fresh()
    }
}

/// A node in the document tree.
///
/// Serialises in the JSON shape used for clipboard fragments:
/// `{"type": "paragraph", "children": [..], ..attrs}` for elements and
/// `{"text": "..", ..marks}` for leaves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Node {
    Element(Element),
    Text(Text),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Element {
    #[serde(skip)]
    pub(crate) key: NodeKey,
    #[serde(rename = "type")]
    pub kind: SmolStr,
    pub children: Vec<Rc<Node>>,
    #[serde(flatten)]
    pub attrs: Attrs,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Text {
    #[serde(skip)]
    pub(crate) key: NodeKey,
    pub text: String,
    #[serde(flatten)]
    pub marks: Attrs,
}

impl Element {
    pub fn new(kind: impl Into<SmolStr>, children: impl IntoIterator<Item = Node>) -> Self {
        Self {
            key: NodeKey::fresh(),
            kind: kind.into(),
            children: children.into_iter().map(Rc::new).collect(),
            attrs: Attrs::new(),
        }
    }

    pub fn with_attr(mut self, name: impl Into<SmolStr>, value: serde_json::Value) -> Self {
        self.attrs.insert(name.into(), value);
        self
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }
}

impl Text {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            key: NodeKey::fresh(),
            text: text.into(),
            marks: Attrs::new(),
        }
    }

    pub fn with_mark(mut self, name: impl Into<SmolStr>, value: serde_json::Value) -> Self {
        self.marks.insert(name.into(), value);
        self
    }

    pub fn key(&self) -> NodeKey {
        self.key
    }

    /// Length in chars, the unit of [`Point`](crate::Point) offsets.
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Loose equality: compares marks only, ignoring the text.
    pub fn marks_equal(&self, marks: &Attrs) -> bool {
        &self.marks == marks
    }
}

impl Node {
    pub fn element(kind: impl Into<SmolStr>, children: impl IntoIterator<Item = Node>) -> Self {
        Node::Element(Element::new(kind, children))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(Text::new(text))
    }

    pub fn key(&self) -> NodeKey {
        match self {
            Node::Element(e) => e.key,
            Node::Text(t) => t.key,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, Node::Text(_))
    }

    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&Text> {
        match self {
            Node::Text(t) => Some(t),
            Node::Element(_) => None,
        }
    }

    /// Children of an element; empty for text leaves.
    pub fn children(&self) -> &[Rc<Node>] {
        match self {
            Node::Element(e) => &e.children,
            Node::Text(_) => &[],
        }
    }

    /// Concatenated text of every leaf below this node.
    pub fn string(&self) -> String {
        let mut out = String::new();
        self.push_string(&mut out);
        out
    }

    fn push_string(&self, out: &mut String) {
        match self {
            Node::Text(t) => out.push_str(&t.text),
            Node::Element(e) => e.children.iter().for_each(|c| c.push_string(out)),
        }
    }

    /// Descendant at a path relative to this node.
    pub fn descendant(&self, rel: &[usize]) -> Option<&Rc<Node>> {
        let (first, rest) = rel.split_first()?;
        let child = self.children().get(*first)?;
        if rest.is_empty() {
            Some(child)
        } else {
            child.descendant(rest)
        }
    }

    /// Copy of this subtree where every node gets a fresh key.
    pub fn rekeyed(&self) -> Node {
        match self {
            Node::Text(t) => Node::Text(Text {
                key: NodeKey::fresh(),
                ..t.clone()
            }),
            Node::Element(e) => Node::Element(Element {
                key: NodeKey::fresh(),
                kind: e.kind.clone(),
                children: e.children.iter().map(|c| Rc::new(c.rekeyed())).collect(),
                attrs: e.attrs.clone(),
            }),
        }
    }

    /// Collect `(text, path)` for every leaf below `self`, where `base` is the
    /// path of `self`.
    pub fn texts_into<'a>(&'a self, base: &Path, out: &mut Vec<(&'a Text, Path)>) {
        match self {
            Node::Text(t) => out.push((t, base.clone())),
            Node::Element(e) => {
                for (i, child) in e.children.iter().enumerate() {
                    child.texts_into(&base.child(i), out);
                }
            }
        }
    }

    /// Copy of this node that keeps its key. Used when replacing a node in
    /// place so that identity survives the edit.
    pub(crate) fn same_key_element(e: &Element, children: Vec<Rc<Node>>) -> Node {
        Node::Element(Element {
            key: e.key,
            kind: e.kind.clone(),
            children,
            attrs: e.attrs.clone(),
        })
    }
}

impl From<Element> for Node {
    fn from(e: Element) -> Self {
        Node::Element(e)
    }
}

impl From<Text> for Node {
    fn from(t: Text) -> Self {
        Node::Text(t)
    }
}

/// Convert a char offset in `s` to a byte index.
pub fn char_to_byte(s: &str, char_offset: usize) -> usize {
    s.char_indices()
        .nth(char_offset)
        .map(|(b, _)| b)
        .unwrap_or(s.len())
}

/// Slice `s` by char offsets.
pub fn char_slice(s: &str, start: usize, end: usize) -> &str {
    let a = char_to_byte(s, start);
    let b = char_to_byte(s, end.max(start));
    &s[a..b]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fragment_json_shape() {
        let node = Node::element(
            "paragraph",
            [
                Node::text("plain "),
                Text::new("bold").with_mark("bold", json!(true)).into(),
            ],
        );
        let value = serde_json::to_value(&node).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "paragraph",
                "children": [{"text": "plain "}, {"text": "bold", "bold": true}]
            })
        );

        let back: Node = serde_json::from_value(value).unwrap();
        let el = back.as_element().unwrap();
        assert_eq!(el.kind, "paragraph");
        assert_eq!(el.children.len(), 2);
        assert_eq!(
            el.children[1].as_text().unwrap().marks.get("bold"),
            Some(&json!(true))
        );
        // Deserialized nodes never reuse keys.
        assert_ne!(back.key(), node.key());
    }

    #[test]
    fn string_and_descendant() {
        let node = Node::element(
            "paragraph",
            [
                Node::text("a"),
                Node::element("link", [Node::text("b")]),
                Node::text("c"),
            ],
        );
        assert_eq!(node.string(), "abc");
        assert_eq!(
            node.descendant(&[1, 0]).and_then(|n| n.as_text()).map(|t| t.text.as_str()),
            Some("b")
        );
        assert!(node.descendant(&[3]).is_none());
    }

    #[test]
    fn rekeyed_changes_every_key() {
        let node = Node::element("paragraph", [Node::text("x")]);
        let copy = node.rekeyed();
        assert_ne!(copy.key(), node.key());
        assert_ne!(copy.children()[0].key(), node.children()[0].key());
        assert_eq!(copy.string(), "x");
    }

    #[test]
    fn char_slicing_respects_multibyte() {
        assert_eq!(char_slice("héllo", 1, 3), "él");
        assert_eq!(char_to_byte("héllo", 2), 3);
        assert_eq!(char_slice("ab", 1, 9), "b");
    }
}
