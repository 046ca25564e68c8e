//! Document model for the slate-style editable surface.
//!
//! A tree of elements and text leaves, paths and points into it, the
//! operations that change it, and the editing transforms built on top.

pub mod editor;
pub mod error;
pub mod fragment;
pub mod node;
pub mod normalize;
pub mod operation;
pub mod path;
pub mod point;
pub mod text_units;
pub mod transforms;

pub use editor::{Editor, Schema};
pub use error::ModelError;
pub use fragment::{FRAGMENT_MIME, decode_fragment, encode_fragment};
pub use node::{Attrs, Element, Node, NodeKey, Text};
pub use operation::Operation;
pub use path::Path;
pub use point::{Affinity, Edge, Point, Range};
pub use text_units::TextUnit;
pub use transforms::DEFAULT_BLOCK;
