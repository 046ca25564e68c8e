//! Error types for the editable surface.

use thiserror::Error;
use weaver_slate_model::{ModelError, Range};

use crate::vdom::DomId;

/// Fatal setup errors. These indicate a host integration bug and are
/// surfaced from [`Editable::new`](crate::Editable::new) instead of being
/// recovered.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum EditableError {
    /// The initial document failed validation.
    #[error("invalid initial value: {0}")]
    InvalidValue(#[from] ModelError),

    /// The editor's selection points outside its own document.
    #[error("editor selection {0:?} does not resolve inside the document")]
    InvalidSelection(Range),
}

/// A DOM position or target could not be mapped onto the document, or the
/// other way around.
///
/// Translation failures are always handled where they occur: the caller
/// logs them and keeps its previous state.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TranslationError {
    #[error("DOM position lies outside the editor")]
    OutsideEditor,

    #[error("no rendered node for DOM id {0:?}")]
    NoMatchingNode(DomId),

    #[error("DOM position is inside the interior of a void element")]
    InsideVoid,

    #[error("no text leaf at {0}")]
    NoText(weaver_slate_model::Path),

    #[error("node has not been rendered yet")]
    NotRendered,
}
