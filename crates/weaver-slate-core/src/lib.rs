//! weaver-slate-core: the DOM side of the slate-style editable surface,
//! without any browser dependency.
//!
//! This crate provides:
//! - `Renderer` - keyed, memoised rendering of a document to a virtual DOM
//! - `NodeLocator` - bidirectional maps between document nodes and DOM ids
//! - `DomBridge` - translation of DOM points and selections to and from the model
//! - `Editable` - the editable root and its input event interpreter
//!
//! The browser crate patches the real DOM from [`Editable::tree`] and feeds
//! native events back in as the plain event types of [`input`].

pub mod actions;
pub mod decoration;
pub mod direction;
pub mod editable;
pub mod error;
pub mod hotkeys;
pub mod input;
pub mod locator;
pub mod platform;
pub mod render;
pub mod selection;
pub mod vdom;

pub use actions::{InputType, Key, KeyCombo, KeydownResult, Modifiers};
pub use decoration::{Decoration, DecorationKind};
pub use direction::{Direction, text_direction};
pub use editable::{
    BeforeInputHook, Editable, EditableProps, EditableState, HistoryHook, KeyDownHook,
    ScrollIntoViewFn,
};
pub use error::{EditableError, TranslationError};
pub use hotkeys::{Hotkey, Hotkeys};
pub use input::{
    BeforeInput, BeforeInputResult, ClipboardPayload, DeferredOperation, DropEvent, FocusEvent,
    HistoryAction, KeyDown, TransferData,
};
pub use locator::NodeLocator;
pub use platform::{Detached, DomEnvironment, PlatformQuirks};
pub use render::{
    RenderElementProps, RenderHooks, RenderLeafProps, RenderPlaceholderProps, RenderStats,
    Renderer,
};
pub use selection::{
    DomBridge, DomNode, DomPoint, DomRange, DomSelectionUpdate, NativeSelection,
};
pub use smol_str::SmolStr;
pub use vdom::{DomId, DomIndex, DomRole, VElement, VNode};
pub use weaver_slate_model as model;
