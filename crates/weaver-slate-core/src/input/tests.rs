use serde_json::json;
use weaver_slate_model::{Editor, Node, Path, Point, Range, Schema, Text, decode_fragment};

use super::*;
use crate::actions::{Key, KeydownResult, Modifiers};
use crate::editable::EditableProps;
use crate::hotkeys::{Hotkey, Hotkeys};
use crate::platform::{Detached, PlatformQuirks};

fn paragraph(text: &str) -> Node {
    Node::element("paragraph", [Node::text(text)])
}

fn editable_at(mut editor: Editor, selection: Range, props: EditableProps) -> Editable {
    editor.select(selection).unwrap();
    Editable::new(editor, props, PlatformQuirks::default()).unwrap()
}

fn caret(path: impl Into<Path>, offset: usize) -> Range {
    Range::collapsed(Point::new(path, offset))
}

fn dom_of(e: &Editable, path: &[usize]) -> Option<DomId> {
    let key = e.editor().node(path).unwrap().key();
    e.locator().dom_of(key)
}

fn insert_text(data: &str, target: Option<DomId>) -> BeforeInput {
    BeforeInput::new(InputType::InsertText, target).with_data(data)
}

#[test]
fn host_keydown_toggles_bold_over_a_word() {
    let props = EditableProps::new().on_key_down(|editor, event| {
        if Hotkeys::new(false).is(Hotkey::Bold, &event.combo) {
            editor.toggle_mark("bold").unwrap();
            return true;
        }
        false
    });
    let selection = Range::new(Point::new([0, 0], 5), Point::new([0, 0], 9));
    let mut e = editable_at(Editor::new([paragraph("some rich text")]), selection, props);
    let target = dom_of(&e, &[0, 0]);

    let combo = KeyCombo::primary(Key::character("b"), false);
    assert_eq!(e.key_down(&KeyDown::new(combo, target)), KeydownResult::Handled);

    let block = e.editor().node(&[0]).unwrap();
    assert_eq!(block.children().len(), 3);
    let leaves: Vec<_> = (0..3)
        .map(|i| {
            let text = e.editor().text(&[0, i]).unwrap();
            (text.text.to_string(), text.marks.get("bold").cloned())
        })
        .collect();
    assert_eq!(
        leaves,
        [
            ("some ".to_string(), None),
            ("rich".to_string(), Some(json!(true))),
            (" text".to_string(), None),
        ]
    );
    // Every leaf got its own rendered text element.
    for i in 0..3 {
        assert!(dom_of(&e, &[0, i]).is_some());
    }
}

#[test]
fn native_insertions_apply_in_order_on_input() {
    let mut e = editable_at(
        Editor::new([paragraph("x")]),
        caret([0, 0], 1),
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);

    let result = e.before_input(&insert_text("a", target), &Detached);
    assert_eq!(result, BeforeInputResult::PassThrough);
    // The browser edits the DOM first; the model catches up on `input`.
    assert_eq!(e.editor().string(&[0]), "x");
    assert_eq!(
        e.state().deferred,
        [DeferredOperation::InsertText("a".into())]
    );
    e.input();
    assert_eq!(e.editor().string(&[0]), "xa");

    let target = dom_of(&e, &[0, 0]);
    let result = e.before_input(&insert_text("b", target), &Detached);
    assert_eq!(result, BeforeInputResult::PassThrough);
    e.input();

    assert_eq!(e.editor().string(&[0]), "xab");
    assert_eq!(e.editor().selection(), Some(&caret([0, 0], 3)));
    assert!(e.state().deferred.is_empty());
}

#[test]
fn insertion_is_handled_where_native_editing_is_unsafe() {
    let editor = Editor::new([Node::element(
        "paragraph",
        [
            Node::text("see "),
            Node::element("link", [Node::text("here")]),
            Node::text(""),
        ],
    )])
    .with_schema(Schema::new().with_inline("link"));

    // Start of an inline: offset zero is never passed through.
    let mut e = editable_at(editor.clone(), caret([0, 1, 0], 0), EditableProps::new());
    let target = dom_of(&e, &[0, 1, 0]);
    let result = e.before_input(&insert_text("a", target), &Detached);
    assert_eq!(result, BeforeInputResult::Handled);
    assert_eq!(e.editor().string(&[0, 1]), "ahere");
    assert!(e.state().deferred.is_empty());

    // End of an inline: the browser would extend the wrong element.
    let mut e = editable_at(editor, caret([0, 1, 0], 4), EditableProps::new());
    let target = dom_of(&e, &[0, 1, 0]);
    let result = e.before_input(&insert_text("s", target), &Detached);
    assert_eq!(result, BeforeInputResult::Handled);
    assert_eq!(e.editor().string(&[0, 1]), "heres");
}

#[test]
fn pending_marks_and_wide_characters_are_not_native() {
    let mut e = editable_at(
        Editor::new([paragraph("ab")]),
        caret([0, 0], 1),
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);
    let result = e.before_input(&insert_text("é", target), &Detached);
    assert_eq!(result, BeforeInputResult::Handled);
    assert_eq!(e.editor().string(&[0]), "aéb");

    e.editor_mut().add_mark("italic", json!(true)).unwrap();
    let target = dom_of(&e, &[0, 0]);
    let result = e.before_input(&insert_text("c", target), &Detached);
    assert_eq!(result, BeforeInputResult::Handled);
    assert_eq!(e.editor().string(&[0]), "aécb");
}

#[test]
fn blur_during_composition_discards_it() {
    let mut e = editable_at(
        Editor::new([paragraph("x")]),
        caret([0, 0], 1),
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);
    e.before_input(&insert_text("a", target), &Detached);
    assert_eq!(e.state().deferred.len(), 1);

    e.composition_start(target);
    assert!(e.is_composing());
    let composing = BeforeInput::new(InputType::InsertCompositionText, target).with_data("か");
    assert_eq!(
        e.before_input(&composing, &Detached),
        BeforeInputResult::PassThrough
    );

    let clear_native = e.blur(&FocusEvent {
        target,
        related: None,
        active: None,
    });
    assert!(!clear_native);
    assert!(!e.is_composing());
    assert!(e.state().deferred.is_empty());

    assert!(!e.composition_end(target, Some("か")));
    e.input();
    assert_eq!(e.editor().string(&[0]), "x");
}

#[test]
fn composition_end_commits_the_data() {
    let mut e = editable_at(
        Editor::new([paragraph("x")]),
        caret([0, 0], 1),
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);
    e.composition_start(target);
    assert!(e.composition_end(target, Some("かな")));
    e.composition_settled();
    assert!(!e.is_composing());
    assert_eq!(e.editor().string(&[0]), "xかな");
}

#[test]
fn composition_start_replaces_an_expanded_selection() {
    let selection = Range::new(Point::new([0, 0], 1), Point::new([0, 0], 4));
    let mut e = editable_at(Editor::new([paragraph("abcde")]), selection, EditableProps::new());
    let target = dom_of(&e, &[0, 0]);
    e.composition_start(target);
    assert_eq!(e.editor().string(&[0]), "ae");
    assert_eq!(e.editor().selection(), Some(&caret([0, 0], 1)));
}

#[test]
fn deleting_an_expanded_selection() {
    let selection = Range::new(Point::new([0, 0], 0), Point::new([0, 0], 6));
    let mut e = editable_at(
        Editor::new([paragraph("hello world")]),
        selection,
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);
    let event = BeforeInput::new(InputType::DeleteContentBackward, target);
    assert_eq!(e.before_input(&event, &Detached), BeforeInputResult::Handled);
    assert_eq!(e.editor().string(&[0]), "world");
    assert_eq!(e.editor().selection(), Some(&caret([0, 0], 0)));
}

#[test]
fn expanded_deletes_of_any_unit_remove_only_the_selection() {
    let selection = Range::new(Point::new([0, 0], 11), Point::new([0, 0], 6));
    let mut e = editable_at(
        Editor::new([paragraph("hello world"), paragraph("next")]),
        selection,
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);
    let event = BeforeInput::new(InputType::DeleteWordForward, target);
    assert_eq!(e.before_input(&event, &Detached), BeforeInputResult::Handled);
    assert_eq!(e.editor().string(&[0]), "hello ");
    assert_eq!(e.editor().string(&[1]), "next");
    assert_eq!(e.editor().selection(), Some(&caret([0, 0], 6)));

    e.editor_mut()
        .select(Range::new(Point::new([0, 0], 1), Point::new([0, 0], 4)))
        .unwrap();
    e.flush_changes();
    let event = BeforeInput::new(InputType::DeleteHardLineBackward, target);
    assert_eq!(e.before_input(&event, &Detached), BeforeInputResult::Handled);
    assert_eq!(e.editor().string(&[0]), "ho ");
    assert_eq!(e.editor().selection(), Some(&caret([0, 0], 1)));
}

#[test]
fn composition_text_moves_the_caret_to_its_target_range() {
    let mut e = editable_at(
        Editor::new([paragraph("hello world")]),
        caret([0, 0], 11),
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);
    let at = e.bridge().to_dom_range(&caret([0, 0], 5)).unwrap();

    let event = BeforeInput::new(InputType::InsertCompositionText, target)
        .with_data("x")
        .with_target_range(at);
    assert_eq!(e.before_input(&event, &Detached), BeforeInputResult::PassThrough);
    // The composed text lands at the target, so the caret stays there.
    assert_eq!(e.editor().selection(), Some(&caret([0, 0], 5)));
    assert_eq!(e.editor().string(&[0]), "hello world");
    assert!(e.state().user_selection.is_none());
}

#[test]
fn target_range_edits_restore_the_user_selection() {
    let mut e = editable_at(
        Editor::new([paragraph("hello world")]),
        caret([0, 0], 11),
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);
    let word = Range::new(Point::new([0, 0], 0), Point::new([0, 0], 5));
    let dom_range = e.bridge().to_dom_range(&word).unwrap();

    let event = BeforeInput::new(InputType::InsertReplacementText, target)
        .with_data("howdy")
        .with_target_range(dom_range);
    assert_eq!(e.before_input(&event, &Detached), BeforeInputResult::Handled);
    assert_eq!(e.editor().string(&[0]), "howdy world");
    // The spell-check replacement must not move the caret.
    assert_eq!(e.editor().selection(), Some(&caret([0, 0], 11)));
    assert!(e.state().user_selection.is_none());
}

#[test]
fn paragraph_and_line_breaks() {
    let mut e = editable_at(
        Editor::new([paragraph("ab")]),
        caret([0, 0], 1),
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);
    let event = BeforeInput::new(InputType::InsertParagraph, target);
    assert_eq!(e.before_input(&event, &Detached), BeforeInputResult::Handled);
    assert_eq!(e.editor().children().len(), 2);
    assert_eq!(e.editor().string(&[0]), "a");
    assert_eq!(e.editor().string(&[1]), "b");

    let target = dom_of(&e, &[1, 0]);
    let event = BeforeInput::new(InputType::InsertLineBreak, target);
    assert_eq!(e.before_input(&event, &Detached), BeforeInputResult::Handled);
    assert_eq!(e.editor().string(&[1]), "\nb");
}

#[test]
fn read_only_editors_ignore_input() {
    let mut e = editable_at(
        Editor::new([paragraph("x")]),
        caret([0, 0], 1),
        EditableProps::new().read_only(true),
    );
    let target = dom_of(&e, &[0, 0]);
    assert_eq!(
        e.before_input(&insert_text("a", target), &Detached),
        BeforeInputResult::NotHandled
    );
    let combo = KeyCombo::new(Key::Backspace);
    assert_eq!(
        e.key_down(&KeyDown::new(combo, target)),
        KeydownResult::NotHandled
    );
    assert!(!e.paste(target, &TransferData::plain_text("y")));
    assert_eq!(e.editor().string(&[0]), "x");
}

#[test]
fn history_inputs_are_gated_like_other_input() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let props = EditableProps::new()
        .read_only(true)
        .on_history(move |editor, action| {
            editor.insert_text("!").unwrap();
            log.borrow_mut().push(action);
        });
    let mut e = editable_at(Editor::new([paragraph("x")]), caret([0, 0], 1), props);
    let target = dom_of(&e, &[0, 0]);

    let undo = BeforeInput::new(InputType::HistoryUndo, target);
    assert_eq!(e.before_input(&undo, &Detached), BeforeInputResult::NotHandled);
    assert!(seen.borrow().is_empty());
    assert_eq!(e.editor().string(&[0]), "x");

    // Editable again, but the event comes from outside the editor.
    e.set_read_only(false);
    let redo = BeforeInput::new(InputType::HistoryRedo, None);
    assert_eq!(e.before_input(&redo, &Detached), BeforeInputResult::NotHandled);
    assert!(seen.borrow().is_empty());

    assert_eq!(e.before_input(&undo, &Detached), BeforeInputResult::Handled);
    assert_eq!(*seen.borrow(), [HistoryAction::Undo]);
    assert_eq!(e.editor().string(&[0]), "x!");
}

#[test]
fn host_before_input_hook_takes_over() {
    let props = EditableProps::new().on_dom_before_input(|editor, event| {
        if event.input_type == InputType::InsertText {
            editor.insert_text("!").unwrap();
            return true;
        }
        false
    });
    let mut e = editable_at(Editor::new([paragraph("x")]), caret([0, 0], 1), props);
    let target = dom_of(&e, &[0, 0]);
    assert_eq!(
        e.before_input(&insert_text("a", target), &Detached),
        BeforeInputResult::Handled
    );
    assert_eq!(e.editor().string(&[0]), "x!");
}

#[test]
fn history_inputs_reach_the_host() {
    use std::cell::RefCell;
    use std::rc::Rc;

    let seen = Rc::new(RefCell::new(Vec::new()));
    let log = seen.clone();
    let props = EditableProps::new().on_history(move |_, action| log.borrow_mut().push(action));
    let mut e = editable_at(Editor::new([paragraph("x")]), caret([0, 0], 1), props);
    let target = dom_of(&e, &[0, 0]);

    e.before_input(&BeforeInput::new(InputType::HistoryUndo, target), &Detached);
    let redo = KeyCombo::with_modifiers(Key::character("y"), Modifiers::CTRL);
    assert_eq!(e.key_down(&KeyDown::new(redo, target)), KeydownResult::Handled);
    assert_eq!(*seen.borrow(), [HistoryAction::Undo, HistoryAction::Redo]);
}

#[test]
fn plain_text_paste_is_intercepted() {
    let mut e = editable_at(
        Editor::new([paragraph("ab")]),
        caret([0, 0], 1),
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);
    assert!(e.paste(target, &TransferData::plain_text("one\ntwo")));
    assert_eq!(e.editor().string(&[0]), "aone");
    assert_eq!(e.editor().string(&[1]), "twob");

    // Rich pastes arrive again as `insertFromPaste`.
    let rich = TransferData {
        html: Some("<b>x</b>".into()),
        text: Some("x".into()),
        types: 2,
        ..TransferData::default()
    };
    let target = dom_of(&e, &[1, 0]);
    assert!(!e.paste(target, &rich));
    let event = BeforeInput::new(InputType::InsertFromPaste, target).with_transfer(rich);
    assert_eq!(e.before_input(&event, &Detached), BeforeInputResult::Handled);
    assert_eq!(e.editor().string(&[1]), "twoxb");
}

#[test]
fn fragment_paste_keeps_marks() {
    let mut e = editable_at(
        Editor::new([paragraph("ab")]),
        caret([0, 0], 1),
        EditableProps::new(),
    );
    let bold = Node::element(
        "paragraph",
        [Text::new("B").with_mark("bold", json!(true)).into()],
    );
    let data = TransferData {
        fragment: Some(weaver_slate_model::encode_fragment(&[bold]).unwrap()),
        text: Some("B".into()),
        types: 2,
        ..TransferData::default()
    };
    let target = dom_of(&e, &[0, 0]);
    let event = BeforeInput::new(InputType::InsertFromPaste, target).with_transfer(data);
    e.before_input(&event, &Detached);

    assert_eq!(e.editor().string(&[0]), "aBb");
    assert_eq!(
        e.editor().text(&[0, 1]).unwrap().marks.get("bold"),
        Some(&json!(true))
    );
}

fn with_image() -> Editor {
    Editor::new([
        paragraph("a"),
        Node::element("image", [Node::text("")]),
    ])
    .with_schema(Schema::new().with_void("image"))
}

#[test]
fn copy_and_cut_a_selected_void() {
    let mut e = editable_at(with_image(), caret([1, 0], 0), EditableProps::new());
    let target = dom_of(&e, &[1]);

    let copied = e.copy(target).unwrap();
    let nodes = decode_fragment(&copied.fragment).unwrap();
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].as_element().unwrap().kind, "image");
    assert_eq!(e.editor().children().len(), 2);

    let cut = e.cut(target).unwrap();
    assert_eq!(cut, copied);
    assert_eq!(e.editor().children().len(), 1);
    assert_eq!(e.editor().string(&[0]), "a");
}

#[test]
fn copy_joins_blocks_with_newlines() {
    let selection = Range::new(Point::new([0, 0], 2), Point::new([1, 0], 3));
    let mut e = editable_at(
        Editor::new([paragraph("first"), paragraph("second")]),
        selection,
        EditableProps::new(),
    );
    let payload = e.copy(dom_of(&e, &[0, 0])).unwrap();
    assert_eq!(payload.text, "rst\nsec");
    assert!(e.copy(None).is_none());
}

#[test]
fn arrows_follow_text_direction() {
    let mut e = editable_at(
        Editor::new([paragraph("שלום")]),
        caret([0, 0], 2),
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);
    let left = KeyDown::new(KeyCombo::new(Key::ArrowLeft), target);
    assert_eq!(e.key_down(&left), KeydownResult::Handled);
    assert_eq!(e.editor().selection(), Some(&caret([0, 0], 3)));

    let mut e = editable_at(
        Editor::new([paragraph("hello")]),
        Range::new(Point::new([0, 0], 1), Point::new([0, 0], 4)),
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);
    let right = KeyDown::new(KeyCombo::new(Key::ArrowRight), target);
    assert_eq!(e.key_down(&right), KeydownResult::Handled);
    assert_eq!(e.editor().selection(), Some(&caret([0, 0], 4)));
}

#[test]
fn keys_without_beforeinput_edit_the_model() {
    let mut editor = Editor::new([paragraph("ab")]);
    editor.select(caret([0, 0], 2)).unwrap();
    let quirks = PlatformQuirks::default().with_before_input(false);
    let mut e = Editable::new(editor, EditableProps::new(), quirks).unwrap();

    let target = dom_of(&e, &[0, 0]);
    let backspace = KeyDown::new(KeyCombo::new(Key::Backspace), target);
    assert_eq!(e.key_down(&backspace), KeydownResult::Handled);
    assert_eq!(e.editor().string(&[0]), "a");

    let target = dom_of(&e, &[0, 0]);
    let enter = KeyDown::new(KeyCombo::new(Key::Enter), target);
    assert_eq!(e.key_down(&enter), KeydownResult::Handled);
    assert_eq!(e.editor().children().len(), 2);

    let target = dom_of(&e, &[1, 0]);
    let bold = KeyDown::new(KeyCombo::primary(Key::character("b"), false), target);
    assert_eq!(e.key_down(&bold), KeydownResult::Handled);
    assert!(!e.editor().is_mark_active("bold"));
}

#[test]
fn keydown_while_composing_passes_through() {
    let mut e = editable_at(
        Editor::new([paragraph("ab")]),
        caret([0, 0], 1),
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);
    e.composition_start(target);

    let mut enter = KeyDown::new(KeyCombo::new(Key::Enter), target);
    enter.is_composing = true;
    assert_eq!(e.key_down(&enter), KeydownResult::PassThrough);
    assert!(e.is_composing());

    // A keydown outside a composition ends one the browser never closed.
    enter.is_composing = false;
    e.key_down(&enter);
    assert!(!e.is_composing());
}

#[test]
fn internal_drag_moves_content() {
    let selection = Range::new(Point::new([0, 0], 0), Point::new([0, 0], 4));
    let mut e = editable_at(
        Editor::new([paragraph("one two")]),
        selection,
        EditableProps::new(),
    );
    let target = dom_of(&e, &[0, 0]);
    let payload = e.drag_start(target).unwrap();
    assert!(e.state().is_dragging_internally);

    let caret_at = e.bridge().to_dom_point(&Point::new([0, 0], 7)).unwrap();
    let event = DropEvent {
        target,
        caret: Some(caret_at),
        before_midpoint: false,
        data: TransferData {
            fragment: Some(payload.fragment),
            text: Some(payload.text),
            types: 2,
            ..TransferData::default()
        },
    };
    assert!(e.drop_data(&event));
    assert_eq!(e.editor().string(&[0]), "twoone ");
    assert!(!e.state().is_dragging_internally);
}

#[test]
fn drops_over_a_void_land_beside_it() {
    let mut e = editable_at(with_image(), caret([0, 0], 0), EditableProps::new());
    let image = dom_of(&e, &[1]);
    assert!(e.drag_over(image));
    assert!(!e.drag_over(dom_of(&e, &[0])));

    let event = DropEvent {
        target: image,
        caret: None,
        before_midpoint: true,
        data: TransferData::plain_text("z"),
    };
    assert!(e.drop_data(&event));
    assert_eq!(e.editor().string(&[0]), "az");
}

#[test]
fn triple_click_selects_the_block() {
    let mut e = editable_at(
        Editor::new([paragraph("one"), paragraph("two")]),
        caret([1, 0], 1),
        EditableProps::new(),
    );
    e.click(dom_of(&e, &[1, 0]), 3);
    let block = e.editor().range(&[1]).unwrap();
    assert_eq!(e.editor().selection(), Some(&block));
}

#[test]
fn clicking_a_void_selects_it() {
    let mut e = editable_at(with_image(), caret([0, 0], 0), EditableProps::new());
    e.click(dom_of(&e, &[1]), 1);
    assert_eq!(e.editor().selection(), Some(&caret([1, 0], 0)));
}

#[test]
fn focus_tracks_the_root() {
    let mut e = editable_at(
        Editor::new([paragraph("x")]),
        caret([0, 0], 0),
        EditableProps::new(),
    );
    let root = FocusEvent {
        target: Some(DomId::ROOT),
        related: None,
        active: Some(DomId::ROOT),
    };
    assert!(!e.focus(&root));
    assert!(e.is_focused());

    // Focus moving inside the editor is not a blur.
    let inner = FocusEvent {
        target: Some(DomId::ROOT),
        related: Some(DomId::ROOT),
        active: None,
    };
    e.blur(&inner);
    assert!(e.is_focused());

    let away = FocusEvent {
        target: Some(DomId::ROOT),
        related: None,
        active: None,
    };
    e.blur(&away);
    assert!(!e.is_focused());
}

#[test]
fn firefox_refocuses_nested_targets() {
    let mut editor = Editor::new([paragraph("x")]);
    editor.select(caret([0, 0], 0)).unwrap();
    let quirks = PlatformQuirks {
        firefox: true,
        ..PlatformQuirks::default()
    };
    let mut e = Editable::new(editor, EditableProps::new(), quirks).unwrap();
    let nested = FocusEvent {
        target: dom_of(&e, &[0, 0]),
        related: None,
        active: None,
    };
    assert!(e.focus(&nested));
    assert!(!e.is_focused());
}
