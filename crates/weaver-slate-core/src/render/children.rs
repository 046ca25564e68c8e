use std::rc::Rc;

use weaver_slate_model::{Element, Node, NodeKey, Path, Range};

use super::Renderer;
use crate::decoration::Decoration;
use crate::vdom::{VNode, VElement};

impl Renderer<'_> {
    /// Render the children of `parent`, which is `None` for the editor root.
    pub(super) fn render_children(
        &mut self,
        parent_key: NodeKey,
        parent: Option<&Element>,
        children: &[Rc<Node>],
        path: &Path,
        decorations: &[Decoration],
        selection: Option<&Range>,
    ) -> Vec<VNode> {
        let editor = self.editor;
        let is_leaf_block =
            parent.is_some_and(|el| !editor.is_inline(el) && editor.has_inlines(el));
        let last = children.len().saturating_sub(1);

        let mut out = Vec::with_capacity(children.len());
        for (i, child) in children.iter().enumerate() {
            let child_path = path.child(i);
            let Some(range) = editor.range(&child_path) else {
                tracing::warn!(
                    target: "weaver::render",
                    path = %child_path,
                    "skipping node without text"
                );
                continue;
            };

            let mut ds = match &self.hooks.decorate {
                Some(decorate) => decorate(editor, Some(child), &child_path),
                None => Vec::new(),
            };
            ds.extend(decorations.iter().filter_map(|d| d.intersect(&range)));
            let sel = selection.and_then(|s| range.intersection(s));

            self.locator
                .record(child.key(), parent_key, i, &child_path);

            let rendered: Rc<VElement> = match child.as_ref() {
                Node::Element(el) => self.render_element(child, el, &child_path, ds, sel),
                Node::Text(text) => {
                    let Some(parent) = parent else {
                        tracing::warn!(
                            target: "weaver::render",
                            path = %child_path,
                            "text node directly under the editor"
                        );
                        continue;
                    };
                    let mut flags = self.base_flags();
                    flags.is_last = is_leaf_block && i == last;
                    flags.empty_block_tail =
                        i == last && !editor.is_inline(parent) && text_is_empty(parent);
                    self.render_text(child, text, parent, &child_path, ds, sel, flags)
                }
            };
            out.push(VNode::Element(rendered));
        }
        out
    }
}

fn text_is_empty(element: &Element) -> bool {
    element
        .children
        .iter()
        .all(|c| c.string().is_empty())
}
