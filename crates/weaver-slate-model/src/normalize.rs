//! Structural normalization.
//!
//! After every transform the tree is brought back to a shape the renderer can
//! rely on: elements are never empty, blocks hold either blocks or inline
//! content but not both, adjacent leaves with equal marks are merged, and
//! inline elements are always surrounded by leaves.

use std::rc::Rc;

use crate::editor::Editor;
use crate::error::ModelError;
use crate::node::Node;
use crate::operation::Operation;
use crate::path::Path;
use crate::transforms::DEFAULT_BLOCK;

const MAX_FIXES: usize = 10_000;

impl Editor {
    /// Apply fixes one at a time until the tree is stable.
    pub fn normalize(&mut self) -> Result<(), ModelError> {
        for _ in 0..MAX_FIXES {
            let Some(fix) = self.next_fix() else {
                return Ok(());
            };
            self.apply(fix)?;
        }
        tracing::warn!(
            target: "weaver::model",
            "normalization did not settle after {MAX_FIXES} fixes"
        );
        Ok(())
    }

    fn next_fix(&self) -> Option<Operation> {
        if self.children().is_empty() {
            return Some(Operation::InsertNode {
                path: Path::from([0]),
                node: Rc::new(Node::element(DEFAULT_BLOCK, [Node::text("")])),
            });
        }
        self.children()
            .iter()
            .enumerate()
            .find_map(|(i, child)| self.fix_in(child, Path::from([i])))
    }

    fn fix_in(&self, node: &Node, path: Path) -> Option<Operation> {
        let Node::Element(el) = node else {
            return None;
        };
        if el.children.is_empty() {
            return Some(Operation::InsertNode {
                path: path.child(0),
                node: Rc::new(Node::text("")),
            });
        }

        let wants_inlines = self.is_inline(el)
            || match el.children[0].as_ref() {
                Node::Text(_) => true,
                Node::Element(first) => self.is_inline(first),
            };
        let last = el.children.len() - 1;

        for (i, child) in el.children.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| el.children[p].as_ref());
            let child_path = path.child(i);
            match child.as_ref() {
                Node::Text(text) => {
                    if !wants_inlines {
                        return Some(remove(child_path, child));
                    }
                    if let Some(Node::Text(prev_text)) = prev {
                        if prev_text.marks == text.marks {
                            return Some(Operation::MergeNode {
                                path: child_path,
                                position: prev_text.len(),
                            });
                        }
                        if prev_text.is_empty() {
                            let prev_path = path.child(i - 1);
                            return Some(remove(prev_path, &el.children[i - 1]));
                        }
                        if text.is_empty() {
                            return Some(remove(child_path, child));
                        }
                    }
                }
                Node::Element(inner) => {
                    let inline = self.is_inline(inner);
                    if inline != wants_inlines {
                        return Some(remove(child_path, child));
                    }
                    if inline {
                        if !matches!(prev, Some(Node::Text(_))) {
                            return Some(Operation::InsertNode {
                                path: child_path,
                                node: Rc::new(Node::text("")),
                            });
                        }
                        if i == last {
                            return Some(Operation::InsertNode {
                                path: path.child(i + 1),
                                node: Rc::new(Node::text("")),
                            });
                        }
                    }
                }
            }
        }

        el.children
            .iter()
            .enumerate()
            .find_map(|(i, child)| self.fix_in(child, path.child(i)))
    }
}

fn remove(path: Path, node: &Rc<Node>) -> Operation {
    Operation::RemoveNode {
        path,
        node: node.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::Schema;
    use crate::node::Text;
    use serde_json::json;

    #[test]
    fn merges_equal_marks_and_drops_empty_leaves() {
        let mut editor = Editor::new([Node::element(
            "paragraph",
            [
                Node::text("a"),
                Node::text("b"),
                Text::new("").with_mark("bold", json!(true)).into(),
                Text::new("c").with_mark("italic", json!(true)).into(),
            ],
        )]);
        editor.normalize().unwrap();
        let texts: Vec<String> = editor.texts().into_iter().map(|(t, _)| t.text.clone()).collect();
        assert_eq!(texts, ["ab", "c"]);
    }

    #[test]
    fn inline_elements_get_surrounding_leaves() {
        let mut editor = Editor::new([Node::element(
            "paragraph",
            [Node::element("link", [Node::text("x")])],
        )])
        .with_schema(Schema::new().with_inline("link"));
        editor.normalize().unwrap();
        let block = editor.node(&[0]).unwrap();
        assert_eq!(block.children().len(), 3);
        assert!(block.children()[0].is_text());
        assert!(block.children()[2].is_text());
    }

    #[test]
    fn empty_elements_and_documents_are_filled() {
        let mut editor = Editor::new([Node::element("paragraph", Vec::<Node>::new())]);
        editor.normalize().unwrap();
        assert_eq!(editor.text(&[0, 0]).map(|t| t.text.as_str()), Some(""));

        let mut empty = Editor::new(Vec::<Node>::new());
        empty.normalize().unwrap();
        assert!(empty.validate().is_ok());
    }

    #[test]
    fn normalizing_a_clean_tree_applies_nothing() {
        let mut editor = Editor::new([Node::element("paragraph", [Node::text("ok")])]);
        editor.normalize().unwrap();
        assert!(editor.operations().is_empty());
    }
}
