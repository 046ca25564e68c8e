//! Unit-wise movement through text: characters, words, lines and blocks.
//!
//! Movement happens inside the flattened text of a leaf block. Stepping off
//! either end of a block lands on the adjacent block's edge, which counts as
//! one unit regardless of the unit kind.

use crate::editor::Editor;
use crate::path::Path;
use crate::point::Point;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextUnit {
    Character,
    Word,
    Line,
    Block,
}

/// Flattened text of one leaf block and the leaves it is made of.
#[derive(Debug, Clone)]
pub(crate) struct BlockText {
    pub(crate) path: Path,
    pub(crate) chars: Vec<char>,
    /// `(leaf path, start offset, length)` in document order.
    spans: Vec<(Path, usize, usize)>,
}

impl BlockText {
    pub(crate) fn len(&self) -> usize {
        self.chars.len()
    }

    pub(crate) fn offset_of(&self, point: &Point) -> Option<usize> {
        self.spans
            .iter()
            .find(|(p, _, _)| p == &point.path)
            .map(|(_, start, len)| start + point.offset.min(*len))
    }

    /// Point at a block offset. At a boundary between two leaves the earlier
    /// leaf wins unless `prefer_later` is set.
    pub(crate) fn point_at(&self, offset: usize, prefer_later: bool) -> Option<Point> {
        let mut found = None;
        for (path, start, len) in &self.spans {
            if offset >= *start && offset <= start + len {
                found = Some(Point::new(path.clone(), offset - start));
                if !prefer_later || offset < start + len {
                    break;
                }
            }
        }
        found
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

/// Start of the word before `cursor`, skipping separators first.
pub fn find_word_boundary_backward(chars: &[char], cursor: usize) -> usize {
    let mut pos = cursor.min(chars.len());
    while pos > 0 && !is_word_char(chars[pos - 1]) {
        pos -= 1;
    }
    while pos > 0 && is_word_char(chars[pos - 1]) {
        pos -= 1;
    }
    pos
}

/// End of the separators following the word after `cursor`.
pub fn find_word_boundary_forward(chars: &[char], cursor: usize) -> usize {
    let len = chars.len();
    let mut pos = cursor.min(len);
    while pos < len && is_word_char(chars[pos]) {
        pos += 1;
    }
    while pos < len && !is_word_char(chars[pos]) {
        pos += 1;
    }
    pos
}

fn line_start(chars: &[char], cursor: usize) -> usize {
    if cursor > 0 && chars[cursor - 1] == '\n' {
        return cursor - 1;
    }
    let mut pos = cursor;
    while pos > 0 && chars[pos - 1] != '\n' {
        pos -= 1;
    }
    pos
}

fn line_end(chars: &[char], cursor: usize) -> usize {
    if chars.get(cursor) == Some(&'\n') {
        return cursor + 1;
    }
    let mut pos = cursor;
    while pos < chars.len() && chars[pos] != '\n' {
        pos += 1;
    }
    pos
}

impl Editor {
    pub(crate) fn block_text(&self, block: &Path) -> BlockText {
        let mut chars = Vec::new();
        let mut spans = Vec::new();
        let is_void = self.element(block).is_some_and(|e| self.is_void(e));
        for (text, path) in self.texts_under(block) {
            if is_void {
                spans.push((path, 0, 0));
                break;
            }
            let start = chars.len();
            chars.extend(text.text.chars());
            spans.push((path, start, chars.len() - start));
        }
        BlockText {
            path: block.clone(),
            chars,
            spans,
        }
    }

    fn adjacent_block(&self, block: &Path, reverse: bool) -> Option<Path> {
        let blocks = self.leaf_blocks();
        let idx = blocks.iter().position(|b| b == block)?;
        if reverse {
            idx.checked_sub(1).and_then(|i| blocks.get(i)).cloned()
        } else {
            blocks.get(idx + 1).cloned()
        }
    }

    /// One `unit` before `point`, or `None` at the start of the document.
    pub fn point_before(&self, point: &Point, unit: TextUnit) -> Option<Point> {
        let block = self.block_above(&point.path)?;
        let text = self.block_text(&block);
        let offset = text.offset_of(point)?;
        if offset == 0 {
            let prev = self.adjacent_block(&block, true)?;
            return self.end(&prev);
        }
        let target = match unit {
            TextUnit::Character => offset - 1,
            TextUnit::Word => find_word_boundary_backward(&text.chars, offset),
            TextUnit::Line => line_start(&text.chars, offset),
            TextUnit::Block => 0,
        };
        text.point_at(target, false)
    }

    /// One `unit` after `point`, or `None` at the end of the document.
    pub fn point_after(&self, point: &Point, unit: TextUnit) -> Option<Point> {
        let block = self.block_above(&point.path)?;
        let text = self.block_text(&block);
        let offset = text.offset_of(point)?;
        if offset >= text.len() {
            let next = self.adjacent_block(&block, false)?;
            return self.start(&next);
        }
        let target = match unit {
            TextUnit::Character => offset + 1,
            TextUnit::Word => find_word_boundary_forward(&text.chars, offset),
            TextUnit::Line => line_end(&text.chars, offset),
            TextUnit::Block => text.len(),
        };
        text.point_at(target, true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::{Node, Text};
    use crate::editor::Schema;
    use serde_json::json;

    fn chars(s: &str) -> Vec<char> {
        s.chars().collect()
    }

    #[test]
    fn word_boundaries_skip_separators_first() {
        let text = chars("hello, world_2 ");
        assert_eq!(find_word_boundary_backward(&text, 15), 7);
        assert_eq!(find_word_boundary_backward(&text, 7), 0);
        assert_eq!(find_word_boundary_forward(&text, 0), 7);
        assert_eq!(find_word_boundary_forward(&text, 7), 15);
    }

    #[test]
    fn steps_cross_leaves_and_blocks() {
        let editor = Editor::new([
            Node::element(
                "paragraph",
                [
                    Node::text("ab"),
                    Text::new("cd").with_mark("bold", json!(true)).into(),
                ],
            ),
            Node::element("paragraph", [Node::text("ef")]),
        ]);
        assert_eq!(
            editor.point_before(&Point::new([0, 1], 1), TextUnit::Character),
            Some(Point::new([0, 1], 0))
        );
        assert_eq!(
            editor.point_before(&Point::new([0, 1], 0), TextUnit::Character),
            Some(Point::new([0, 0], 1))
        );
        assert_eq!(
            editor.point_before(&Point::new([1, 0], 0), TextUnit::Word),
            Some(Point::new([0, 1], 2))
        );
        assert_eq!(
            editor.point_after(&Point::new([0, 0], 2), TextUnit::Character),
            Some(Point::new([0, 1], 1))
        );
        assert_eq!(editor.point_after(&Point::new([1, 0], 2), TextUnit::Block), None);
    }

    #[test]
    fn lines_are_soft_breaks_within_a_block() {
        let editor = Editor::new([Node::element("paragraph", [Node::text("one\ntwo")])]);
        assert_eq!(
            editor.point_before(&Point::new([0, 0], 6), TextUnit::Line),
            Some(Point::new([0, 0], 4))
        );
        assert_eq!(
            editor.point_before(&Point::new([0, 0], 4), TextUnit::Line),
            Some(Point::new([0, 0], 3))
        );
        assert_eq!(
            editor.point_after(&Point::new([0, 0], 0), TextUnit::Line),
            Some(Point::new([0, 0], 3))
        );
    }

    #[test]
    fn void_blocks_are_a_single_stop() {
        let editor = Editor::new([
            Node::element("paragraph", [Node::text("a")]),
            Node::element("image", [Node::text("")]),
            Node::element("paragraph", [Node::text("b")]),
        ])
        .with_schema(Schema::new().with_void("image"));
        assert_eq!(
            editor.point_before(&Point::new([2, 0], 0), TextUnit::Character),
            Some(Point::new([1, 0], 0))
        );
        assert_eq!(
            editor.point_before(&Point::new([1, 0], 0), TextUnit::Character),
            Some(Point::new([0, 0], 1))
        );
    }
}
