//! Final `Content-Type` negotiation.

use crate::response::ResponseState;

pub const CONTENT_TYPE: &str = "Content-Type";
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=UTF-8";
pub const HTML_CONTENT_TYPE: &str = "text/html; charset=UTF-8";

/// Settle the response's `Content-Type` for `path`.
///
/// A `.json` path always gets JSON, whatever a handler or template set.
/// Otherwise an existing value is kept and a missing one defaults to HTML.
pub fn finalize(path: &str, state: &mut ResponseState) {
    if path.ends_with(".json") {
        state.set_header(CONTENT_TYPE, JSON_CONTENT_TYPE);
    } else if state.get_header(CONTENT_TYPE).is_none() {
        state.set_header(CONTENT_TYPE, HTML_CONTENT_TYPE);
    }
}
