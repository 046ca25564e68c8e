//! Browser DOM layer for the weaver rich-text surface.
//!
//! Patches the tree rendered by `weaver-slate-core` into a live
//! contenteditable element and feeds native events back into it. Assumes a
//! `wasm32-unknown-unknown` target.
//!
//! # Architecture
//!
//! - `dom`: keyed DOM patching and live node to `DomId` mapping
//! - `events`: native event conversion
//! - `clipboard`: `DataTransfer` reading and writing
//! - `editable`: the mounted root and its listeners
//! - `platform`: browser detection
//! - `logging`: console output plus a buffer of recent records
//!
//! # Re-exports
//!
//! This crate re-exports `weaver-slate-core`, so consumers only need to
//! depend on `weaver-slate-browser`.

pub use weaver_slate_core;
pub use weaver_slate_core::*;

pub mod clipboard;
pub mod dom;
pub mod editable;
pub mod error;
pub mod events;
pub mod logging;
pub mod platform;

pub use dom::{DomPatcher, PatchStats};
pub use editable::MountedEditable;
pub use error::BrowserError;
pub use events::{parse_browser_input_type, parse_key};
pub use logging::{RecentLogLayer, clear_logs, init_logging, recent_logs};
pub use platform::{override_platform_quirks, platform_quirks};
