use std::time::Duration;

use serde_json::json;
use weaver_slate_model::Point;

use super::*;

fn paragraph(text: &str) -> Node {
    Node::element("paragraph", [Node::text(text)])
}

fn editable(editor: Editor, props: EditableProps) -> Editable {
    Editable::new(editor, props, PlatformQuirks::default()).unwrap()
}

fn caret(path: [usize; 2], offset: usize) -> Range {
    Range::collapsed(Point::new(path, offset))
}

fn find_all<'a>(el: &'a VElement, pred: &dyn Fn(&VElement) -> bool, out: &mut Vec<&'a VElement>) {
    if pred(el) {
        out.push(el);
    }
    for child in el.element_children() {
        find_all(child, pred, out);
    }
}

fn placeholders(e: &Editable) -> Vec<String> {
    let mut out = Vec::new();
    find_all(e.tree(), &|el| el.role == DomRole::Placeholder, &mut out);
    out.into_iter().map(|el| el.text_content()).collect()
}

fn attrs(el: &VElement) -> String {
    el.attrs
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[test]
fn placeholder_shows_on_an_empty_document() {
    let mut e = editable(
        Editor::new([paragraph("")]),
        EditableProps::new().placeholder("Enter text"),
    );
    assert!(e.show_placeholder());
    assert_eq!(placeholders(&e), ["Enter text"]);
    let id = e.locator().placeholder.unwrap();
    assert_eq!(e.dom().get(id).unwrap().role, DomRole::Placeholder);

    e.editor_mut().select(caret([0, 0], 0)).unwrap();
    e.editor_mut().insert_text("a").unwrap();
    assert!(e.flush_changes());
    assert!(placeholders(&e).is_empty());
    assert_eq!(e.locator().placeholder, None);
}

#[test]
fn placeholder_waits_for_its_delay_on_android() {
    let quirks = PlatformQuirks {
        android: true,
        ..PlatformQuirks::default()
    };
    let mut e = Editable::new(
        Editor::new([paragraph("")]),
        EditableProps::new().placeholder("Type here"),
        quirks,
    )
    .unwrap();
    assert!(placeholders(&e).is_empty());

    assert_eq!(e.placeholder_timer(), Some(Duration::from_millis(300)));
    assert_eq!(e.placeholder_timer(), None);
    e.reveal_placeholder();
    assert_eq!(placeholders(&e), ["Type here"]);
}

#[test]
fn placeholder_height_becomes_the_minimum_height() {
    let mut e = editable(
        Editor::new([paragraph("")]),
        EditableProps::new().placeholder("Enter text"),
    );
    e.set_placeholder_height(Some(24.0));
    assert!(
        e.tree()
            .style
            .iter()
            .any(|(p, v)| p == "min-height" && v == "24px")
    );

    e.editor_mut().select(caret([0, 0], 0)).unwrap();
    e.editor_mut().insert_text("a").unwrap();
    e.flush_changes();
    assert_eq!(e.state().placeholder_height, None);
    assert!(!e.tree().style.iter().any(|(p, _)| p == "min-height"));
}

#[test]
fn no_placeholder_while_composing() {
    let mut e = editable(
        Editor::new([paragraph("")]),
        EditableProps::new().placeholder("Enter text"),
    );
    e.set_composing(true);
    assert!(placeholders(&e).is_empty());
    e.set_composing(false);
    assert_eq!(placeholders(&e).len(), 1);
}

#[test]
fn root_attributes() {
    let e = editable(
        Editor::new([paragraph("x")]),
        EditableProps::new()
            .attribute("class", "editor")
            .style("min-height", "4em"),
    );
    let root = e.tree();
    assert_eq!(root.id, DomId::ROOT);
    assert_eq!(root.role, DomRole::Root);
    insta::assert_snapshot!(attrs(root), @r"
    class=editor
    role=textbox
    aria-multiline=true
    data-slate-editor=true
    data-slate-node=value
    contenteditable=true
    zindex=-1
    ");
    let style: Vec<_> = root.style.iter().map(|(p, _)| p.as_str()).collect();
    assert_eq!(
        style,
        ["position", "white-space", "word-wrap", "min-height"]
    );
}

#[test]
fn root_without_beforeinput_disables_autocorrect() {
    let quirks = PlatformQuirks::default().with_before_input(false);
    let e = Editable::new(
        Editor::new([paragraph("x")]),
        EditableProps::new().read_only(true).disable_default_styles(true),
        quirks,
    )
    .unwrap();
    insta::assert_snapshot!(attrs(e.tree()), @r"
    spellcheck=false
    autocorrect=false
    autocapitalize=off
    data-slate-editor=true
    data-slate-node=value
    contenteditable=false
    zindex=-1
    ");
    assert!(e.tree().style.is_empty());
}

#[test]
fn read_only_can_be_toggled() {
    let mut e = editable(Editor::new([paragraph("x")]), EditableProps::new());
    assert_eq!(e.tree().get_attr("contenteditable"), Some("true"));

    e.set_read_only(true);
    assert!(e.is_read_only());
    assert!(e.locator().read_only);
    assert_eq!(e.tree().get_attr("contenteditable"), Some("false"));
    assert_eq!(e.tree().get_attr("role"), None);

    e.set_read_only(false);
    assert_eq!(e.tree().get_attr("role"), Some("textbox"));
}

#[test]
fn pending_marks_render_a_mark_placeholder() {
    let mut editor = Editor::new([paragraph("ab")]);
    editor.select(caret([0, 0], 1)).unwrap();
    let mut e = editable(editor, EditableProps::new());
    assert!(!e.state().has_mark_placeholder);

    e.editor_mut().add_mark("bold", json!(true)).unwrap();
    assert!(e.flush_changes());
    assert!(e.state().has_mark_placeholder);
    let mut marked = Vec::new();
    find_all(
        e.tree(),
        &|el| el.has_attr("data-slate-mark-placeholder"),
        &mut marked,
    );
    assert_eq!(marked.len(), 1);
    let mut expected = Attrs::new();
    expected.insert("bold".into(), json!(true));
    assert_eq!(e.state().pending_insertion_marks, Some(expected));

    // Moving the caret drops the pending marks and the placeholder with them.
    e.editor_mut().select(caret([0, 0], 2)).unwrap();
    e.flush_changes();
    assert!(!e.state().has_mark_placeholder);
    assert_eq!(e.state().pending_insertion_marks, None);
}

#[test]
fn flush_without_changes_is_a_no_op() {
    let mut e = editable(Editor::new([paragraph("x")]), EditableProps::new());
    let tree = e.tree().clone();
    assert!(!e.flush_changes());
    assert!(Rc::ptr_eq(&tree, e.tree()));
}

#[test]
fn edits_reuse_untouched_blocks() {
    let mut editor = Editor::new([paragraph("one"), paragraph("two"), paragraph("three")]);
    editor.select(caret([1, 0], 3)).unwrap();
    let mut e = editable(editor, EditableProps::new());
    let first = e.tree().element_children().next().unwrap().clone();

    e.editor_mut().insert_text("!").unwrap();
    e.flush_changes();
    assert!(Rc::ptr_eq(
        &first,
        e.tree().element_children().next().unwrap()
    ));
    let stats = e.last_render_stats();
    assert_eq!((stats.rendered, stats.reused), (2, 2));
    assert_eq!(e.editor().string(&[1]), "two!");
}

#[test]
fn host_decorations_need_a_redecorate() {
    use std::cell::Cell;

    let enabled = Rc::new(Cell::new(false));
    let flag = enabled.clone();
    let props = EditableProps::new().decorate(move |_, node, path| {
        let Some(text) = node.and_then(|n| n.as_text()) else {
            return Vec::new();
        };
        if !flag.get() || text.is_empty() {
            return Vec::new();
        }
        let mut attrs = Attrs::new();
        attrs.insert("highlight".into(), json!(true));
        vec![Decoration::new(
            Range::new(Point::new(path.clone(), 0), Point::new(path.clone(), 1)),
            attrs,
        )]
    });
    let mut e = editable(Editor::new([paragraph("abc")]), props);
    let leaves = |e: &Editable| {
        let mut out = Vec::new();
        find_all(e.tree(), &|el| el.has_attr("data-slate-leaf"), &mut out);
        out.len()
    };
    assert_eq!(leaves(&e), 1);

    enabled.set(true);
    e.redecorate();
    assert_eq!(leaves(&e), 2);
}

#[test]
fn invalid_values_are_rejected() {
    let empty = Editable::new(
        Editor::new(Vec::<Node>::new()),
        EditableProps::new(),
        PlatformQuirks::default(),
    );
    assert!(matches!(
        empty.err(),
        Some(EditableError::InvalidValue(ModelError::EmptyDocument))
    ));

    let mut editor = Editor::new([paragraph("x")]);
    editor.select(caret([4, 0], 0)).unwrap();
    let stray = Editable::new(editor, EditableProps::new(), PlatformQuirks::default());
    assert_eq!(
        stray.err(),
        Some(EditableError::InvalidSelection(caret([4, 0], 0)))
    );
}
