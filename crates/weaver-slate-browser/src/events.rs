//! Conversion of native DOM events into the core's plain event types.

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use weaver_slate_core::{
    BeforeInput, DomRange, DropEvent, FocusEvent, InputType, Key, KeyCombo, KeyDown, Modifiers,
};

use crate::clipboard::transfer_data;
use crate::dom::DomPatcher;

// === StaticRange binding ===
//
// web-sys does not expose StaticRange, which `getTargetRanges()` returns.

#[wasm_bindgen]
extern "C" {
    pub type StaticRange;

    #[wasm_bindgen(method, getter, structural, js_name = startContainer)]
    pub fn start_container(this: &StaticRange) -> web_sys::Node;

    #[wasm_bindgen(method, getter, structural, js_name = startOffset)]
    pub fn start_offset(this: &StaticRange) -> u32;

    #[wasm_bindgen(method, getter, structural, js_name = endContainer)]
    pub fn end_container(this: &StaticRange) -> web_sys::Node;

    #[wasm_bindgen(method, getter, structural, js_name = endOffset)]
    pub fn end_offset(this: &StaticRange) -> u32;
}

/// Parse a W3C Input Events `inputType`.
pub fn parse_browser_input_type(s: &str) -> InputType {
    match s {
        // Insertion
        "insertText" => InputType::InsertText,
        "insertReplacementText" => InputType::InsertReplacementText,
        "insertLineBreak" => InputType::InsertLineBreak,
        "insertParagraph" => InputType::InsertParagraph,
        "insertFromYank" => InputType::InsertFromYank,
        "insertFromDrop" => InputType::InsertFromDrop,
        "insertFromPaste" => InputType::InsertFromPaste,
        "insertCompositionText" => InputType::InsertCompositionText,
        "insertFromComposition" => InputType::InsertFromComposition,

        // Deletion
        "deleteContent" => InputType::DeleteContent,
        "deleteContentBackward" => InputType::DeleteContentBackward,
        "deleteContentForward" => InputType::DeleteContentForward,
        "deleteWordBackward" => InputType::DeleteWordBackward,
        "deleteWordForward" => InputType::DeleteWordForward,
        "deleteSoftLineBackward" => InputType::DeleteSoftLineBackward,
        "deleteSoftLineForward" => InputType::DeleteSoftLineForward,
        "deleteEntireSoftLine" => InputType::DeleteEntireSoftLine,
        "deleteHardLineBackward" => InputType::DeleteHardLineBackward,
        "deleteHardLineForward" => InputType::DeleteHardLineForward,
        "deleteEntireWordBackward" => InputType::DeleteEntireWordBackward,
        "deleteEntireWordForward" => InputType::DeleteEntireWordForward,
        "deleteByComposition" => InputType::DeleteByComposition,
        "deleteByCut" => InputType::DeleteByCut,
        "deleteByDrag" => InputType::DeleteByDrag,
        "deleteCompositionText" => InputType::DeleteCompositionText,

        // History
        "historyUndo" => InputType::HistoryUndo,
        "historyRedo" => InputType::HistoryRedo,

        // Formatting
        "formatBold" => InputType::FormatBold,
        "formatItalic" => InputType::FormatItalic,
        "formatUnderline" => InputType::FormatUnderline,
        "formatStrikeThrough" => InputType::FormatStrikethrough,

        other => InputType::Unknown(other.to_string()),
    }
}

/// Parse a `KeyboardEvent.key` value.
pub fn parse_key(key: &str) -> Key {
    match key {
        "Backspace" => Key::Backspace,
        "Delete" => Key::Delete,
        "Enter" => Key::Enter,
        "Tab" => Key::Tab,
        "Escape" => Key::Escape,
        "ArrowLeft" => Key::ArrowLeft,
        "ArrowRight" => Key::ArrowRight,
        "ArrowUp" => Key::ArrowUp,
        "ArrowDown" => Key::ArrowDown,
        "Home" => Key::Home,
        "End" => Key::End,
        "PageUp" => Key::PageUp,
        "PageDown" => Key::PageDown,
        "Alt" => Key::Alt,
        "Control" => Key::Control,
        "Meta" => Key::Meta,
        "Shift" => Key::Shift,
        "Process" => Key::Process,
        "Unidentified" | "" => Key::Unidentified,
        other => Key::character(other),
    }
}

pub fn key_down(event: &web_sys::KeyboardEvent, dom: &DomPatcher) -> KeyDown {
    let modifiers = Modifiers {
        ctrl: event.ctrl_key(),
        alt: event.alt_key(),
        shift: event.shift_key(),
        meta: event.meta_key(),
    };
    KeyDown {
        combo: KeyCombo::with_modifiers(parse_key(&event.key()), modifiers),
        is_composing: event.is_composing(),
        target: dom.target_id(event.target()),
    }
}

pub fn before_input(event: &web_sys::InputEvent, dom: &DomPatcher) -> BeforeInput {
    let input_type = parse_browser_input_type(&event.input_type());
    let mut converted = BeforeInput::new(input_type, dom.target_id(event.target()));
    converted.data = event.data();
    converted.transfer = event.data_transfer().map(|dt| transfer_data(&dt));
    converted.target_range = target_range(event, dom);
    converted
}

/// First range of `getTargetRanges()`.
pub fn target_range(event: &web_sys::InputEvent, dom: &DomPatcher) -> Option<DomRange> {
    let ranges = event.get_target_ranges();
    let range: StaticRange = ranges.get(0).dyn_into().ok()?;
    let start = dom.dom_point(&range.start_container(), range.start_offset());
    let end = dom.dom_point(&range.end_container(), range.end_offset());
    match (start, end) {
        (Some(start), Some(end)) => Some(DomRange { start, end }),
        _ => {
            tracing::trace!(target: "weaver::input", "target range outside the editor");
            None
        }
    }
}

pub fn focus_event(event: &web_sys::FocusEvent, dom: &DomPatcher) -> FocusEvent {
    let active = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.active_element())
        .and_then(|el| dom.id_of(&el));
    FocusEvent {
        target: dom.target_id(event.target()),
        related: dom.target_id(event.related_target()),
        active,
    }
}

pub fn drop_event(event: &web_sys::DragEvent, dom: &DomPatcher) -> DropEvent {
    let target = dom.target_id(event.target());
    let (x, y) = (event.client_x(), event.client_y());
    let before_midpoint = event
        .target()
        .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
        .map(|el| {
            let rect = el.get_bounding_client_rect();
            f64::from(y) - rect.top() < rect.height() / 2.0
        })
        .unwrap_or(false);
    DropEvent {
        target,
        caret: caret_at(dom, x, y),
        before_midpoint,
        data: event
            .data_transfer()
            .map(|dt| transfer_data(&dt))
            .unwrap_or_default(),
    }
}

/// Caret position under a viewport coordinate.
fn caret_at(dom: &DomPatcher, x: i32, y: i32) -> Option<weaver_slate_core::DomPoint> {
    let document = web_sys::window()?.document()?;
    let func = js_sys::Reflect::get(&document, &JsValue::from_str("caretRangeFromPoint")).ok()?;
    if let Some(func) = func.dyn_ref::<js_sys::Function>() {
        let range: web_sys::Range = func
            .call2(&document, &JsValue::from(x), &JsValue::from(y))
            .ok()?
            .dyn_into()
            .ok()?;
        return dom.dom_point(&range.start_container().ok()?, range.start_offset().ok()?);
    }
    // Firefox only has `caretPositionFromPoint`.
    let func = js_sys::Reflect::get(&document, &JsValue::from_str("caretPositionFromPoint")).ok()?;
    let func = func.dyn_ref::<js_sys::Function>()?;
    let position = func
        .call2(&document, &JsValue::from(x), &JsValue::from(y))
        .ok()?;
    let node: web_sys::Node = js_sys::Reflect::get(&position, &JsValue::from_str("offsetNode"))
        .ok()?
        .dyn_into()
        .ok()?;
    let offset = js_sys::Reflect::get(&position, &JsValue::from_str("offset"))
        .ok()?
        .as_f64()?;
    dom.dom_point(&node, offset as u32)
}
