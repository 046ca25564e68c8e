//! `DataTransfer` access for copy, cut, paste and drag.
//!
//! The fragment travels base64-encoded under the fragment MIME type and,
//! for pasting between browsers that drop custom types, as a
//! `data-slate-fragment` attribute on the HTML payload.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use weaver_slate_core::model::FRAGMENT_MIME;
use weaver_slate_core::{ClipboardPayload, TransferData};

const FRAGMENT_ATTRIBUTE: &str = "data-slate-fragment";

/// Read a `DataTransfer` into the core's transfer data.
pub fn transfer_data(dt: &web_sys::DataTransfer) -> TransferData {
    let get = |format: &str| dt.get_data(format).ok().filter(|s| !s.is_empty());
    let html = get("text/html");
    let fragment = get(FRAGMENT_MIME)
        .or_else(|| html.as_deref().and_then(fragment_from_html))
        .and_then(|encoded| decode(&encoded));
    TransferData {
        fragment,
        html,
        text: get("text/plain"),
        types: dt.types().length() as usize,
    }
}

/// Put a payload onto a `DataTransfer`. `contents` is the selected DOM
/// content, used for the HTML flavour.
pub fn write_payload(
    dt: &web_sys::DataTransfer,
    payload: &ClipboardPayload,
    contents: Option<web_sys::DocumentFragment>,
) {
    let encoded = STANDARD.encode(payload.fragment.as_bytes());
    let write = |format: &str, data: &str| {
        if let Err(e) = dt.set_data(format, data) {
            tracing::warn!(target: "weaver::clipboard", format, "clipboard write failed: {:?}", e);
        }
    };
    write(FRAGMENT_MIME, &encoded);
    write("text/plain", &payload.text);
    if let Some(html) = contents.and_then(|c| html_with_fragment(c, &encoded)) {
        write("text/html", &html);
    }
}

/// Contents of the native selection's first range.
pub fn selected_contents() -> Option<web_sys::DocumentFragment> {
    let selection = web_sys::window()?.get_selection().ok()??;
    if selection.range_count() == 0 {
        return None;
    }
    selection.get_range_at(0).ok()?.clone_contents().ok()
}

fn html_with_fragment(contents: web_sys::DocumentFragment, encoded: &str) -> Option<String> {
    let document = gloo_utils::document();
    let wrapper = document.create_element("div").ok()?;
    wrapper.append_child(&contents).ok()?;
    wrapper.set_attribute(FRAGMENT_ATTRIBUTE, encoded).ok()?;
    Some(wrapper.outer_html())
}

fn fragment_from_html(html: &str) -> Option<String> {
    let start = html.find(FRAGMENT_ATTRIBUTE)? + FRAGMENT_ATTRIBUTE.len();
    let rest = html[start..].strip_prefix("=\"")?;
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

fn decode(encoded: &str) -> Option<String> {
    match STANDARD.decode(encoded.trim()) {
        Ok(bytes) => String::from_utf8(bytes).ok(),
        // Some hosts put the JSON on the clipboard unencoded.
        Err(_) if encoded.trim_start().starts_with('[') => Some(encoded.to_string()),
        Err(error) => {
            tracing::debug!(target: "weaver::clipboard", %error, "undecodable fragment");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fragment_attribute_is_found_in_html() {
        let html = r#"<meta charset="utf-8"><div data-slate-fragment="W10="><p>x</p></div>"#;
        assert_eq!(fragment_from_html(html).as_deref(), Some("W10="));
        assert_eq!(decode("W10=").as_deref(), Some("[]"));
        assert_eq!(fragment_from_html("<p>plain</p>"), None);
    }

    #[test]
    fn raw_json_fragments_are_accepted() {
        assert_eq!(decode(r#"[{"type":"p"}]"#).as_deref(), Some(r#"[{"type":"p"}]"#));
    }
}
