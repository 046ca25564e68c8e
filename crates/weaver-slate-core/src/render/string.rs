use weaver_slate_model::Text;

use super::{Leaf, RenderFlags, Renderer};
use crate::vdom::{DomRole, StringKind, VElement};

/// Byte order mark used as zero-width content the caret can sit in.
pub const ZERO_WIDTH: &str = "\u{FEFF}";

impl Renderer<'_> {
    pub(super) fn render_string(
        &self,
        leaf: &Leaf,
        text: &Text,
        is_last: bool,
        flags: RenderFlags,
    ) -> VElement {
        let key = text.key();
        let length = leaf.text.chars().count();

        if let Some(void_length) = flags.void_length {
            return self.zero_width(leaf, key, void_length, false);
        }
        if leaf.text.is_empty() && flags.empty_block_tail {
            return self.zero_width(leaf, key, 0, true);
        }
        if leaf.text.is_empty() {
            return self.zero_width(leaf, key, 0, false);
        }

        let mut content = leaf.text.clone();
        if is_last && leaf.text.ends_with('\n') {
            content.push('\n');
        }
        VElement::new("span")
            .attr("data-slate-string", "true")
            .role(DomRole::String {
                text: key,
                start: leaf.start,
                length,
                kind: StringKind::Literal,
            })
            .text(&content)
    }

    fn zero_width(
        &self,
        leaf: &Leaf,
        key: weaver_slate_model::NodeKey,
        length: usize,
        line_break: bool,
    ) -> VElement {
        let mut el = VElement::new("span")
            .attr("data-slate-zero-width", if line_break { "n" } else { "z" })
            .attr("data-slate-length", length.to_string());
        if leaf.mark_placeholder {
            el = el.attr("data-slate-mark-placeholder", "true");
        }
        el = el.role(DomRole::String {
            text: key,
            start: leaf.start,
            length,
            kind: StringKind::ZeroWidth { line_break },
        });
        if !line_break || self.quirks.line_break_bom {
            el = el.text(ZERO_WIDTH);
        }
        if line_break {
            el = el.child(VElement::new("br"));
        }
        el
    }
}
