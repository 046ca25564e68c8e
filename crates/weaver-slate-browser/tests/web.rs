//! WASM browser tests for weaver-slate-browser.
//!
//! Run with: `wasm-pack test --headless --firefox` or `--chrome`

use wasm_bindgen::JsCast;
use wasm_bindgen_test::*;

wasm_bindgen_test_configure!(run_in_browser);

use weaver_slate_browser::model::{Editor, Node, Point, Range};
use weaver_slate_browser::{
    DomNode, DomPatcher, DomPoint, Editable, EditableProps, InputType, Key, MountedEditable,
    PlatformQuirks, clear_logs, init_logging, parse_browser_input_type, parse_key, recent_logs,
};

fn make_editor(text: &str) -> Editor {
    let mut editor = Editor::new([Node::element("paragraph", [Node::text(text)])]);
    editor
        .select(Range::collapsed(Point::new(vec![0, 0], text.len())))
        .unwrap();
    editor
}

fn make_root() -> web_sys::HtmlElement {
    let document = gloo_utils::document();
    let root: web_sys::HtmlElement = document.create_element("div").unwrap().unchecked_into();
    document.body().unwrap().append_child(&root).unwrap();
    root
}

fn string_span(root: &web_sys::HtmlElement) -> web_sys::Element {
    root.query_selector("[data-slate-string]").unwrap().unwrap()
}

fn dispatch_before_input(target: &web_sys::Element, input_type: &str, data: &str) -> bool {
    let init = web_sys::InputEventInit::new();
    init.set_input_type(input_type);
    init.set_data(Some(data));
    init.set_bubbles(true);
    init.set_cancelable(true);
    let event = web_sys::InputEvent::new_with_event_init_dict("beforeinput", &init).unwrap();
    target.dispatch_event(&event).unwrap()
}

// === Event conversion ===

#[wasm_bindgen_test]
fn test_parse_insert_text() {
    assert_eq!(parse_browser_input_type("insertText"), InputType::InsertText);
}

#[wasm_bindgen_test]
fn test_parse_strikethrough_spelling() {
    assert_eq!(
        parse_browser_input_type("formatStrikeThrough"),
        InputType::FormatStrikethrough
    );
}

#[wasm_bindgen_test]
fn test_parse_unknown() {
    match parse_browser_input_type("unknownType") {
        InputType::Unknown(s) => assert_eq!(s, "unknownType"),
        _ => panic!("Expected Unknown variant"),
    }
}

#[wasm_bindgen_test]
fn test_parse_keys() {
    assert_eq!(parse_key("Backspace"), Key::Backspace);
    assert_eq!(parse_key(""), Key::Unidentified);
    assert!(parse_key("B").same_key(&Key::character("b")));
}

// === Patching ===

#[wasm_bindgen_test]
fn test_patch_renders_slate_markup() {
    let root = make_root();
    let editable =
        Editable::new(make_editor("hello"), EditableProps::new(), PlatformQuirks::default())
            .unwrap();
    let mut dom = DomPatcher::new(root.clone()).unwrap();
    let stats = dom.patch(editable.tree()).unwrap();

    assert!(stats.created > 0);
    assert_eq!(root.get_attribute("data-slate-editor").as_deref(), Some("true"));
    assert_eq!(root.get_attribute("contenteditable").as_deref(), Some("true"));
    assert_eq!(string_span(&root).text_content().as_deref(), Some("hello"));

    // Patching the same tree again touches nothing.
    assert_eq!(dom.patch(editable.tree()).unwrap().created, 0);
    root.remove();
}

#[wasm_bindgen_test]
fn test_text_nodes_map_to_dom_points() {
    let root = make_root();
    let editable =
        Editable::new(make_editor("hello"), EditableProps::new(), PlatformQuirks::default())
            .unwrap();
    let mut dom = DomPatcher::new(root.clone()).unwrap();
    dom.patch(editable.tree()).unwrap();

    let span = string_span(&root);
    let span_id = dom.id_of(&span).unwrap();
    let text = span.first_child().unwrap();

    let point = dom.dom_point(&text, 2).unwrap();
    assert_eq!(point, DomPoint::text(span_id, 0, 2));
    assert!(matches!(point.node, DomNode::Text { parent, .. } if parent == span_id));

    let (node, offset) = dom.native_point(&point).unwrap();
    assert!(node.is_same_node(Some(&text)));
    assert_eq!(offset, 2);

    // The model side agrees.
    let model = editable.bridge().to_model_point(&point, true).unwrap();
    assert_eq!(model, Point::new(vec![0, 0], 2));
    root.remove();
}

// === Mounted editor ===

#[wasm_bindgen_test]
fn test_before_input_edits_the_document() {
    let root = make_root();
    let mounted = MountedEditable::mount_with_quirks(
        root.clone(),
        make_editor("hello"),
        EditableProps::new(),
        PlatformQuirks::default(),
    )
    .unwrap();

    let not_cancelled = dispatch_before_input(&string_span(&root), "insertText", "!");
    assert!(!not_cancelled, "handled insertions cancel the native edit");
    assert_eq!(mounted.editable().editor().string(&[0]), "hello!");
    assert_eq!(string_span(&root).text_content().as_deref(), Some("hello!"));
    root.remove();
}

#[wasm_bindgen_test]
fn test_update_rerenders() {
    let root = make_root();
    let mounted = MountedEditable::mount_with_quirks(
        root.clone(),
        make_editor("hello"),
        EditableProps::new(),
        PlatformQuirks::default(),
    )
    .unwrap();

    mounted.update(|editor| editor.insert_text(" world")).unwrap().unwrap();
    assert_eq!(string_span(&root).text_content().as_deref(), Some("hello world"));

    mounted.set_read_only(true);
    assert_eq!(root.get_attribute("contenteditable").as_deref(), Some("false"));
    root.remove();
}

#[wasm_bindgen_test]
fn test_placeholder_appears_on_empty_document() {
    let root = make_root();
    let _mounted = MountedEditable::mount_with_quirks(
        root.clone(),
        make_editor(""),
        EditableProps::new().placeholder("Write something"),
        PlatformQuirks::default(),
    )
    .unwrap();

    let placeholder = root.query_selector("[data-slate-placeholder]").unwrap();
    assert_eq!(
        placeholder.and_then(|p| p.text_content()).as_deref(),
        Some("Write something")
    );
    root.remove();
}

#[wasm_bindgen_test]
fn test_drop_removes_listeners() {
    let root = make_root();
    let mounted = MountedEditable::mount_with_quirks(
        root.clone(),
        make_editor("hello"),
        EditableProps::new(),
        PlatformQuirks::default(),
    )
    .unwrap();
    drop(mounted);

    let not_cancelled = dispatch_before_input(&string_span(&root), "insertText", "!");
    assert!(not_cancelled);
    assert_eq!(string_span(&root).text_content().as_deref(), Some("hello"));
    root.remove();
}

// === Logging ===

#[wasm_bindgen_test]
fn test_mount_is_logged_for_bug_reports() {
    // Another test may have installed the subscriber already.
    let _ = init_logging();
    clear_logs();
    let root = make_root();
    let mounted = MountedEditable::mount_with_quirks(
        root.clone(),
        make_editor("hello"),
        EditableProps::new(),
        PlatformQuirks::default(),
    )
    .unwrap();
    drop(mounted);

    let logs = recent_logs();
    assert!(logs.contains("[DEBUG] weaver::editable: mounted"), "{logs}");
    assert!(logs.contains("unmounted"), "{logs}");
    root.remove();
}
