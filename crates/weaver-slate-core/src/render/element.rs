use std::rc::Rc;

use weaver_slate_model::{Element, Node, Path, Range};

use super::{RenderElementProps, Renderer};
use crate::decoration::Decoration;
use crate::direction::{Direction, text_direction};
use crate::vdom::{Attributes, DomRole, VElement, VNode};

impl Renderer<'_> {
    pub(super) fn render_element(
        &mut self,
        node: &Rc<Node>,
        element: &Element,
        path: &Path,
        decorations: Vec<Decoration>,
        selection: Option<Range>,
    ) -> Rc<VElement> {
        let flags = self.base_flags();
        if let Some(hit) = self
            .cache
            .lookup(node, &decorations, selection.as_ref(), flags)
        {
            self.stats.reused += 1;
            return hit;
        }

        let editor = self.editor;
        let key = element.key();
        let inline = editor.is_inline(element);
        let void = editor.is_void(element);
        let id = self.root_id(key);

        let mut attributes = Attributes::new(id, DomRole::Element(key));
        attributes.set("data-slate-node", "element");
        if inline {
            attributes.set("data-slate-inline", "true");
        }
        if !inline
            && editor.has_inlines(element)
            && text_direction(&node.string()) == Direction::Rtl
        {
            attributes.set("dir", "rtl");
        }

        let children = if void {
            attributes.set("data-slate-void", "true");
            if !self.read_only && inline {
                attributes.set("contenteditable", "false");
            }
            self.render_void_spacer(element, path, inline)
                .into_iter()
                .collect()
        } else {
            self.render_children(
                key,
                Some(element),
                &element.children,
                path,
                &decorations,
                selection.as_ref(),
            )
        };

        let props = RenderElementProps {
            element,
            path,
            attributes,
            children,
            selected: selection.is_some(),
            inline,
        };
        let mut output = match &self.hooks.render_element {
            Some(render) => render(props),
            None => default_element(props),
        };
        if output.id != id || output.role != DomRole::Element(key) {
            tracing::warn!(
                target: "weaver::render",
                %path,
                "render_element did not spread its attributes onto the root element"
            );
            output.id = id;
            output.role = DomRole::Element(key);
        }

        self.finish(node, &decorations, selection.as_ref(), flags, output)
    }

    /// The hidden text of a void element, inside a zero-height spacer.
    fn render_void_spacer(
        &mut self,
        element: &Element,
        path: &Path,
        inline: bool,
    ) -> Option<VNode> {
        let editor = self.editor;
        // The first text anywhere inside the void, nested inlines included.
        let text_path = editor.texts_under(path).into_iter().next()?.1;
        let text_node = editor.node(&text_path)?.clone();
        let text = text_node.as_text()?;
        let parent = editor.element(&text_path[..text_path.len() - 1])?;

        let mut parent_key = element.key();
        for depth in path.len() + 1..=text_path.len() {
            let at = Path::from(&text_path[..depth]);
            let node = editor.node(&at)?;
            self.locator
                .record(node.key(), parent_key, at.index().unwrap_or(0), &at);
            parent_key = node.key();
        }
        let mut flags = self.base_flags();
        flags.void_length = Some(editor.string(path).chars().count());
        let rendered = self.render_text(
            &text_node,
            text,
            parent,
            &text_path,
            Vec::new(),
            None,
            flags,
        );

        let spacer = VElement::new(if inline { "span" } else { "div" })
            .role(DomRole::Spacer)
            .attr("data-slate-spacer", "true")
            .style("height", "0")
            .style("color", "transparent")
            .style("outline", "none")
            .style("position", "absolute")
            .child(VNode::Element(rendered));
        Some(spacer.into())
    }
}

fn default_element(props: RenderElementProps<'_>) -> VElement {
    let tag = if props.inline { "span" } else { "div" };
    VElement::new(tag)
        .spread(props.attributes)
        .children(props.children)
}
