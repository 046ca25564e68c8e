//! Error types for document model operations.

use thiserror::Error;

use crate::path::Path;

/// Errors raised when the document tree or an operation against it is invalid.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum ModelError {
    /// The document has no top-level nodes.
    #[error("document must contain at least one block")]
    EmptyDocument,

    /// A top-level node is a text leaf instead of an element.
    #[error("top-level node {0} is a text node, expected an element")]
    TopLevelText(usize),

    /// An element has no children.
    #[error("element at {0} has no children")]
    EmptyElement(Path),

    /// No node exists at the given path.
    #[error("no node at path {0}")]
    InvalidPath(Path),

    /// The node at the path has the wrong kind for the operation.
    #[error("node at {path} is not a {expected} node")]
    WrongKind { path: Path, expected: &'static str },

    /// An offset fell outside the text it addresses.
    #[error("offset {offset} out of bounds for text of length {len} at {path}")]
    OffsetOutOfBounds {
        path: Path,
        offset: usize,
        len: usize,
    },

    /// Fragment (de)serialization failed.
    #[error("invalid fragment: {0}")]
    Fragment(String),
}

impl From<serde_json::Error> for ModelError {
    fn from(e: serde_json::Error) -> Self {
        ModelError::Fragment(e.to_string())
    }
}
