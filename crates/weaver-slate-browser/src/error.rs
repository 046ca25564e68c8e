use thiserror::Error;
use wasm_bindgen::JsValue;
use weaver_slate_core::{DomId, EditableError};

/// Failures of the browser layer.
#[derive(Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum BrowserError {
    #[error(transparent)]
    Editable(#[from] EditableError),

    #[error("no {0} available")]
    Missing(&'static str),

    /// A rendered element has no live DOM counterpart.
    #[error("DOM id {0:?} is not mounted")]
    NotMounted(DomId),

    /// A DOM call threw.
    #[error("{0}")]
    Js(String),
}

impl From<JsValue> for BrowserError {
    fn from(value: JsValue) -> Self {
        BrowserError::Js(format!("{value:?}"))
    }
}

pub type Result<T> = std::result::Result<T, BrowserError>;
