use smol_str::SmolStr;
use weaver_slate_model::{Attrs, Element, Text};

use super::{RenderFlags, RenderLeafProps, RenderPlaceholderProps, Renderer};
use crate::vdom::{Attributes, DomId, DomRole, VElement, VNode};

/// A slice of a text node carrying the same marks and decorations.
#[derive(Debug, Clone, PartialEq)]
pub struct Leaf {
    pub text: String,
    /// The text's marks merged with its decorations' attributes.
    pub marks: Attrs,
    /// Char offset of this leaf within its text node.
    pub start: usize,
    pub placeholder: Option<SmolStr>,
    pub mark_placeholder: bool,
}

impl Renderer<'_> {
    pub(super) fn render_leaf(
        &mut self,
        leaf: &Leaf,
        text: &Text,
        parent: &Element,
        is_last: bool,
        flags: RenderFlags,
    ) -> VElement {
        let string = self.render_string(leaf, text, is_last, flags);
        let mut children = Vec::with_capacity(2);
        if let Some(placeholder) = leaf.placeholder.as_ref().filter(|_| flags.placeholder_ready) {
            children.push(VNode::from(self.placeholder_element(placeholder)));
        }
        children.push(VNode::from(string));

        let mut attributes = Attributes::new(DomId::UNASSIGNED, DomRole::Leaf { start: leaf.start });
        attributes.set("data-slate-leaf", "true");
        let props = RenderLeafProps {
            leaf,
            text,
            attributes,
            children,
        };
        let mut output = match &self.hooks.render_leaf {
            Some(render) => render(props),
            None => VElement::new("span").spread(props.attributes).children(props.children),
        };
        if output.role != (DomRole::Leaf { start: leaf.start }) {
            tracing::warn!(
                target: "weaver::render",
                parent = %parent.kind,
                "render_leaf did not spread its attributes onto the root element"
            );
            output.role = DomRole::Leaf { start: leaf.start };
        }
        output
    }

    fn placeholder_element(&self, placeholder: &SmolStr) -> VElement {
        let mut attributes = Attributes::new(DomId::UNASSIGNED, DomRole::Placeholder);
        attributes.set("data-slate-placeholder", "true");
        attributes.set("contenteditable", "false");
        for (property, value) in [
            ("position", "absolute"),
            ("top", "0"),
            ("pointer-events", "none"),
            ("width", "100%"),
            ("max-width", "100%"),
            ("display", "block"),
            ("opacity", "0.333"),
            ("user-select", "none"),
            ("text-decoration", "none"),
        ] {
            attributes.set_style(property, value);
        }
        if self.quirks.webkit {
            attributes.set_style("-webkit-user-modify", "inherit");
        }

        let props = RenderPlaceholderProps {
            placeholder: placeholder.clone(),
            attributes,
        };
        match &self.hooks.render_placeholder {
            Some(render) => render(props),
            None => {
                let el = VElement::new("span")
                    .spread(props.attributes)
                    .text(&props.placeholder);
                if self.quirks.android {
                    el.child(VElement::new("br"))
                } else {
                    el
                }
            }
        }
    }
}
