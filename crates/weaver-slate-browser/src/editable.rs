//! A mounted editable root: owns the core [`Editable`], keeps the live DOM
//! patched from its tree and wires native events to its handlers.
//!
//! Every handler runs the same way: convert the native event, call the core
//! handler with both cells borrowed, release the borrows, then touch the DOM
//! (patch, selection write, focus). DOM calls can fire further events
//! synchronously, so no borrow is ever held across one.
//!
//! Dropping a [`MountedEditable`] removes every listener and cancels every
//! pending timer and animation frame.

use std::cell::{Ref, RefCell};
use std::rc::{Rc, Weak};
use std::time::Duration;

use gloo_events::{EventListener, EventListenerOptions};
use gloo_timers::callback::Timeout;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;
use weaver_slate_core::model::Editor;
use weaver_slate_core::{
    BeforeInputResult, DomId, DomNode, DomRange, DomSelectionUpdate, Editable, EditableProps,
    KeydownResult, NativeSelection, PlatformQuirks,
};

use crate::clipboard::{selected_contents, transfer_data, write_payload};
use crate::dom::DomPatcher;
use crate::error::{BrowserError, Result};
use crate::events;
use crate::platform::platform_quirks;

type FrameCallback = Closure<dyn FnMut()>;
type ResizeCallback = Closure<dyn FnMut(js_sys::Array)>;

#[derive(Default)]
struct Timers {
    /// Clears the selection-update guard after the browser saw the write.
    settle: Option<Timeout>,
    placeholder: Option<Timeout>,
    frame: Option<(i32, FrameCallback)>,
}

struct PlaceholderObserver {
    observer: web_sys::ResizeObserver,
    observed: Option<DomId>,
    _callback: ResizeCallback,
}

struct Shared {
    editable: RefCell<Editable>,
    dom: RefCell<DomPatcher>,
    timers: RefCell<Timers>,
    observer: RefCell<Option<PlaceholderObserver>>,
}

/// An [`Editable`] mounted on a live element.
pub struct MountedEditable {
    shared: Rc<Shared>,
    _listeners: Vec<EventListener>,
}

impl MountedEditable {
    /// Mount on `root`, using the detected platform quirks.
    pub fn mount(root: web_sys::HtmlElement, editor: Editor, props: EditableProps) -> Result<Self> {
        Self::mount_with_quirks(root, editor, props, platform_quirks().clone())
    }

    pub fn mount_with_quirks(
        root: web_sys::HtmlElement,
        editor: Editor,
        props: EditableProps,
        quirks: PlatformQuirks,
    ) -> Result<Self> {
        let autofocus = props.autofocus;
        let editable = Editable::new(editor, props, quirks)?;
        let dom = DomPatcher::new(root.clone())?;
        let shared = Rc::new(Shared {
            editable: RefCell::new(editable),
            dom: RefCell::new(dom),
            timers: RefCell::new(Timers::default()),
            observer: RefCell::new(None),
        });
        *shared.observer.borrow_mut() = placeholder_observer(Rc::downgrade(&shared));

        let listeners = listeners(&shared, &root);
        commit(&shared);
        if autofocus {
            if let Err(e) = root.focus() {
                tracing::warn!(target: "weaver::editable", "autofocus failed: {:?}", e);
            }
        }
        tracing::debug!(target: "weaver::editable", listeners = listeners.len(), "mounted");
        Ok(Self {
            shared,
            _listeners: listeners,
        })
    }

    pub fn editable(&self) -> Ref<'_, Editable> {
        self.shared.editable.borrow()
    }

    /// Change the document from outside an event, then re-render.
    pub fn update<R>(&self, f: impl FnOnce(&mut Editor) -> R) -> Result<R> {
        let result = {
            let mut editable = self
                .shared
                .editable
                .try_borrow_mut()
                .map_err(|_| BrowserError::Missing("idle editor"))?;
            let result = f(editable.editor_mut());
            editable.flush_changes();
            result
        };
        commit(&self.shared);
        Ok(result)
    }

    /// Re-run the host's decorate callback over the whole document.
    pub fn redecorate(&self) {
        handle(&self.shared, |editable, _| editable.redecorate());
    }

    pub fn set_read_only(&self, read_only: bool) {
        handle(&self.shared, |editable, _| editable.set_read_only(read_only));
    }
}

impl Drop for MountedEditable {
    fn drop(&mut self) {
        let mut timers = self.shared.timers.borrow_mut();
        if let Some((handle, _)) = timers.frame.take() {
            if let Err(e) = gloo_utils::window().cancel_animation_frame(handle) {
                tracing::warn!(target: "weaver::editable", "cancel_animation_frame failed: {:?}", e);
            }
        }
        // Dropping a Timeout clears it.
        timers.settle = None;
        timers.placeholder = None;
        if let Some(observer) = self.shared.observer.borrow_mut().take() {
            observer.observer.disconnect();
        }
        tracing::debug!(target: "weaver::editable", "unmounted");
    }
}

/// Run a core handler with both cells borrowed, then commit. `None` when
/// re-entered from a DOM call made by another handler.
fn handle<R>(shared: &Rc<Shared>, f: impl FnOnce(&mut Editable, &DomPatcher) -> R) -> Option<R> {
    let result = {
        let (Ok(mut editable), Ok(dom)) = (shared.editable.try_borrow_mut(), shared.dom.try_borrow())
        else {
            tracing::debug!(target: "weaver::editable", "event re-entered a running handler");
            return None;
        };
        f(&mut editable, &dom)
    };
    commit(shared);
    Some(result)
}

/// Patch the DOM from the current tree, then sync the native selection and
/// the placeholder machinery to it.
fn commit(shared: &Rc<Shared>) {
    let (tree, placeholder_delay) = {
        let Ok(mut editable) = shared.editable.try_borrow_mut() else {
            return;
        };
        (editable.tree().clone(), editable.placeholder_timer())
    };
    let patched = shared.dom.try_borrow_mut().map(|mut dom| dom.patch(&tree));
    match patched {
        Ok(Ok(stats)) => tracing::trace!(target: "weaver::editable", ?stats, "committed"),
        Ok(Err(error)) => tracing::warn!(target: "weaver::editable", %error, "DOM patch failed"),
        Err(_) => return,
    }

    sync_selection(shared);
    watch_placeholder(shared);
    match placeholder_delay {
        Some(delay) if delay.is_zero() => {
            handle(shared, |editable, _| editable.reveal_placeholder());
        }
        Some(delay) => schedule_placeholder(shared, delay),
        None => {}
    }
}

fn sync_selection(shared: &Rc<Shared>) {
    let update = {
        let (Ok(mut editable), Ok(dom)) = (shared.editable.try_borrow_mut(), shared.dom.try_borrow())
        else {
            return;
        };
        let native = read_selection(&dom);
        editable.sync_dom_selection(native.as_ref(), false)
    };
    if update == DomSelectionUpdate::Unchanged {
        return;
    }
    if let Ok(dom) = shared.dom.try_borrow() {
        if let Err(error) = write_selection(&dom, &update) {
            tracing::warn!(target: "weaver::selection", %error, "DOM selection write failed");
        }
    }
    // The browser reports the write as a selectionchange; ignore that one.
    let weak = Rc::downgrade(shared);
    let settle = Timeout::new(0, move || {
        if let Some(shared) = weak.upgrade() {
            if let Ok(mut editable) = shared.editable.try_borrow_mut() {
                editable.selection_settled();
            }
        }
    });
    shared.timers.borrow_mut().settle = Some(settle);
}

fn schedule_placeholder(shared: &Rc<Shared>, delay: Duration) {
    let weak = Rc::downgrade(shared);
    let millis = u32::try_from(delay.as_millis()).unwrap_or(u32::MAX);
    let timeout = Timeout::new(millis, move || {
        if let Some(shared) = weak.upgrade() {
            handle(&shared, |editable, _| editable.reveal_placeholder());
        }
    });
    shared.timers.borrow_mut().placeholder = Some(timeout);
}

fn placeholder_observer(weak: Weak<Shared>) -> Option<PlaceholderObserver> {
    let callback: ResizeCallback = Closure::new(move |_entries: js_sys::Array| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let height = {
            let (Ok(editable), Ok(dom)) = (shared.editable.try_borrow(), shared.dom.try_borrow())
            else {
                return;
            };
            editable
                .locator()
                .placeholder
                .and_then(|id| dom.element(id))
                .map(|el| el.get_bounding_client_rect().height())
        };
        handle(&shared, |editable, _| editable.set_placeholder_height(height));
    });
    match web_sys::ResizeObserver::new(callback.as_ref().unchecked_ref()) {
        Ok(observer) => Some(PlaceholderObserver {
            observer,
            observed: None,
            _callback: callback,
        }),
        Err(e) => {
            tracing::warn!(target: "weaver::editable", "ResizeObserver unavailable: {:?}", e);
            None
        }
    }
}

/// Observe the placeholder element currently rendered, if it changed.
fn watch_placeholder(shared: &Rc<Shared>) {
    let (Ok(editable), Ok(dom), Ok(mut observer)) = (
        shared.editable.try_borrow(),
        shared.dom.try_borrow(),
        shared.observer.try_borrow_mut(),
    ) else {
        return;
    };
    let Some(observer) = observer.as_mut() else {
        return;
    };
    let current = editable.locator().placeholder;
    if observer.observed == current {
        return;
    }
    observer.observer.disconnect();
    if let Some(element) = current.and_then(|id| dom.element(id)) {
        observer.observer.observe(&element);
    }
    observer.observed = current;
}

/// Snapshot of the native selection, or `None` without a selection object.
fn read_selection(dom: &DomPatcher) -> Option<NativeSelection> {
    let selection = gloo_utils::window().get_selection().ok()??;
    if selection.range_count() == 0 {
        return Some(NativeSelection::default());
    }
    let point = |node: Option<web_sys::Node>, offset: u32| node.and_then(|n| dom.dom_point(&n, offset));
    let mut native = NativeSelection {
        anchor: point(selection.anchor_node(), selection.anchor_offset()),
        focus: point(selection.focus_node(), selection.focus_offset()),
        ranges: Vec::new(),
    };
    if selection.range_count() > 1 {
        for i in 0..selection.range_count() {
            let Ok(range) = selection.get_range_at(i) else {
                continue;
            };
            let start = range.start_container().ok().zip(range.start_offset().ok());
            let end = range.end_container().ok().zip(range.end_offset().ok());
            if let (Some(start), Some(end)) = (
                start.and_then(|(n, o)| dom.dom_point(&n, o)),
                end.and_then(|(n, o)| dom.dom_point(&n, o)),
            ) {
                native.ranges.push(DomRange { start, end });
            }
        }
    }
    Some(native)
}

fn write_selection(dom: &DomPatcher, update: &DomSelectionUpdate) -> Result<()> {
    let selection = gloo_utils::window()
        .get_selection()?
        .ok_or(BrowserError::Missing("selection"))?;
    match update {
        DomSelectionUpdate::Unchanged => {}
        DomSelectionUpdate::RemoveAllRanges => selection.remove_all_ranges()?,
        DomSelectionUpdate::CollapseToEnd => selection.collapse_to_end()?,
        DomSelectionUpdate::SetBaseAndExtent {
            anchor,
            focus,
            scroll_into_view,
        } => {
            let (anchor_node, anchor_offset) = dom
                .native_point(anchor)
                .ok_or(BrowserError::NotMounted(anchor.node.element()))?;
            let (focus_node, focus_offset) = dom
                .native_point(focus)
                .ok_or(BrowserError::NotMounted(focus.node.element()))?;
            selection.set_base_and_extent(&anchor_node, anchor_offset, &focus_node, focus_offset)?;
            if *scroll_into_view {
                let leaf = match focus.node {
                    DomNode::Text { parent, .. } => parent,
                    DomNode::Element(id) => id,
                };
                if let Some(element) = dom.element(leaf) {
                    let options = web_sys::ScrollIntoViewOptions::new();
                    options.set_block(web_sys::ScrollLogicalPosition::Nearest);
                    element.scroll_into_view_with_scroll_into_view_options(&options);
                }
            }
        }
    }
    Ok(())
}

fn active_element(dom: &DomPatcher) -> Option<DomId> {
    let active = gloo_utils::document().active_element()?;
    dom.id_of(&active)
}

/// Schedule a selection flush on the next animation frame.
fn request_selection_flush(shared: &Rc<Shared>) {
    let weak = Rc::downgrade(shared);
    let callback: FrameCallback = Closure::new(move || {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        // The closure stays in `frame` until the next request replaces it.
        handle(&shared, |editable, dom| {
            let native = read_selection(dom);
            editable.flush_selection_change(native.as_ref(), active_element(dom));
        });
    });
    match gloo_utils::window().request_animation_frame(callback.as_ref().unchecked_ref()) {
        Ok(handle) => shared.timers.borrow_mut().frame = Some((handle, callback)),
        Err(e) => tracing::warn!(target: "weaver::selection", "requestAnimationFrame failed: {:?}", e),
    }
}

fn listeners(shared: &Rc<Shared>, root: &web_sys::HtmlElement) -> Vec<EventListener> {
    let document = gloo_utils::document();
    let window = gloo_utils::window();
    let cancellable = EventListenerOptions::enable_prevent_default();
    let mut out = Vec::new();

    // Document and window level.
    let weak = Rc::downgrade(shared);
    out.push(EventListener::new(&document, "selectionchange", move |_| {
        let Some(shared) = weak.upgrade() else {
            return;
        };
        let needs_frame = shared
            .editable
            .try_borrow_mut()
            .is_ok_and(|mut e| e.schedule_selection_change());
        if needs_frame {
            request_selection_flush(&shared);
        }
    }));
    for kind in ["dragend", "drop"] {
        let weak = Rc::downgrade(shared);
        out.push(EventListener::new(&window, kind, move |_| {
            if let Some(shared) = weak.upgrade() {
                if let Ok(mut editable) = shared.editable.try_borrow_mut() {
                    editable.drag_end();
                }
            }
        }));
    }

    // Root element.
    let on = |kind: &'static str, f: fn(&Rc<Shared>, &web_sys::Event)| {
        let weak = Rc::downgrade(shared);
        EventListener::new_with_options(root, kind, cancellable, move |event| {
            if let Some(shared) = weak.upgrade() {
                f(&shared, event);
            }
        })
    };
    out.push(on("beforeinput", on_before_input));
    out.push(on("input", |shared, _| {
        handle(shared, |editable, _| editable.input());
    }));
    out.push(on("keydown", on_key_down));
    out.push(on("compositionstart", |shared, event| {
        handle(shared, |editable, dom| editable.composition_start(dom.target_id(event.target())));
    }));
    out.push(on("compositionupdate", |shared, event| {
        handle(shared, |editable, dom| editable.composition_update(dom.target_id(event.target())));
    }));
    out.push(on("compositionend", on_composition_end));
    out.push(on("focus", on_focus));
    out.push(on("blur", on_blur));
    out.push(on("click", |shared, event| {
        let detail = event
            .dyn_ref::<web_sys::MouseEvent>()
            .map_or(1, |e| e.detail().max(0) as u32);
        handle(shared, |editable, dom| editable.click(dom.target_id(event.target()), detail));
    }));
    out.push(on("copy", on_copy));
    out.push(on("cut", on_cut));
    out.push(on("paste", on_paste));
    out.push(on("dragover", |shared, event| {
        let allow = handle(shared, |editable, dom| editable.drag_over(dom.target_id(event.target())));
        if allow == Some(true) {
            event.prevent_default();
        }
    }));
    out.push(on("dragstart", on_drag_start));
    out.push(on("drop", on_drop));
    out.push(on("dragend", |shared, _| {
        handle(shared, |editable, _| editable.drag_end());
    }));
    out
}

fn on_before_input(shared: &Rc<Shared>, event: &web_sys::Event) {
    let Some(event) = event.dyn_ref::<web_sys::InputEvent>() else {
        return;
    };
    let result = handle(shared, |editable, dom| {
        if !editable.quirks().has_before_input {
            return BeforeInputResult::NotHandled;
        }
        // Some IMEs move the selection right before firing.
        let native = read_selection(dom);
        editable.flush_selection_change(native.as_ref(), active_element(dom));
        let converted = events::before_input(event, dom);
        editable.before_input(&converted, dom)
    });
    if result == Some(BeforeInputResult::Handled) {
        event.prevent_default();
    }
}

fn on_key_down(shared: &Rc<Shared>, event: &web_sys::Event) {
    let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
        return;
    };
    let result = handle(shared, |editable, dom| editable.key_down(&events::key_down(event, dom)));
    if result == Some(KeydownResult::Handled) {
        event.prevent_default();
    }
}

fn on_composition_end(shared: &Rc<Shared>, event: &web_sys::Event) {
    let data = event
        .dyn_ref::<web_sys::CompositionEvent>()
        .and_then(|e| e.data());
    let settle = handle(shared, |editable, dom| {
        editable.composition_end(dom.target_id(event.target()), data.as_deref())
    });
    if settle == Some(true) {
        // Cleared from a microtask so the trailing input event still sees
        // the composition.
        let weak = Rc::downgrade(shared);
        wasm_bindgen_futures::spawn_local(async move {
            if let Some(shared) = weak.upgrade() {
                handle(&shared, |editable, _| editable.composition_settled());
            }
        });
    }
}

fn on_focus(shared: &Rc<Shared>, event: &web_sys::Event) {
    let Some(event) = event.dyn_ref::<web_sys::FocusEvent>() else {
        return;
    };
    let refocus = handle(shared, |editable, dom| editable.focus(&events::focus_event(event, dom)));
    if refocus == Some(true) {
        let root = shared.dom.borrow().root().clone();
        if let Err(e) = root.focus() {
            tracing::warn!(target: "weaver::input", "refocus failed: {:?}", e);
        }
    }
}

fn on_blur(shared: &Rc<Shared>, event: &web_sys::Event) {
    let Some(event) = event.dyn_ref::<web_sys::FocusEvent>() else {
        return;
    };
    let clear = handle(shared, |editable, dom| editable.blur(&events::focus_event(event, dom)));
    if clear == Some(true) {
        if let Ok(Some(selection)) = gloo_utils::window().get_selection() {
            if let Err(e) = selection.remove_all_ranges() {
                tracing::warn!(target: "weaver::input", "clearing selection failed: {:?}", e);
            }
        }
    }
}

fn on_copy(shared: &Rc<Shared>, event: &web_sys::Event) {
    let Some(event) = event.dyn_ref::<web_sys::ClipboardEvent>() else {
        return;
    };
    let payload = handle(shared, |editable, dom| editable.copy(dom.target_id(event.target())));
    if let (Some(Some(payload)), Some(dt)) = (payload, event.clipboard_data()) {
        write_payload(&dt, &payload, selected_contents());
        event.prevent_default();
    }
}

fn on_cut(shared: &Rc<Shared>, event: &web_sys::Event) {
    let Some(event) = event.dyn_ref::<web_sys::ClipboardEvent>() else {
        return;
    };
    // The DOM contents must be taken before the cut removes them.
    let contents = selected_contents();
    let payload = handle(shared, |editable, dom| editable.cut(dom.target_id(event.target())));
    if let (Some(Some(payload)), Some(dt)) = (payload, event.clipboard_data()) {
        write_payload(&dt, &payload, contents);
        event.prevent_default();
    }
}

fn on_paste(shared: &Rc<Shared>, event: &web_sys::Event) {
    let Some(event) = event.dyn_ref::<web_sys::ClipboardEvent>() else {
        return;
    };
    let Some(dt) = event.clipboard_data() else {
        return;
    };
    let data = transfer_data(&dt);
    let taken = handle(shared, |editable, dom| editable.paste(dom.target_id(event.target()), &data));
    if taken == Some(true) {
        event.prevent_default();
    }
}

fn on_drag_start(shared: &Rc<Shared>, event: &web_sys::Event) {
    let Some(event) = event.dyn_ref::<web_sys::DragEvent>() else {
        return;
    };
    let payload = handle(shared, |editable, dom| editable.drag_start(dom.target_id(event.target())));
    if let (Some(Some(payload)), Some(dt)) = (payload, event.data_transfer()) {
        write_payload(&dt, &payload, selected_contents());
    }
}

fn on_drop(shared: &Rc<Shared>, event: &web_sys::Event) {
    let Some(event) = event.dyn_ref::<web_sys::DragEvent>() else {
        return;
    };
    let taken = handle(shared, |editable, dom| {
        let handled = editable.drop_data(&events::drop_event(event, dom));
        (handled, editable.is_focused())
    });
    if let Some((true, focused)) = taken {
        event.prevent_default();
        if !focused {
            let root = shared.dom.borrow().root().clone();
            if let Err(e) = root.focus() {
                tracing::warn!(target: "weaver::input", "focus after drop failed: {:?}", e);
            }
        }
    }
}
