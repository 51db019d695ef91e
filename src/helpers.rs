//! HTML fragment builders used by handlers and templates.
//!
//! Plain string interpolation of the base path or nonce; no escaping and no
//! side effects.

/// Directory, under the base path, holding the UI's scripts
pub const JAVASCRIPT_DIR: &str = "/media/javascript/";
/// Directory, under the base path, holding the UI's stylesheets
pub const STYLESHEET_DIR: &str = "/media/css/";

#[must_use]
pub fn script_tag(base_path: &str, filename: &str) -> String {
    format!(r#"<script src="{base_path}{JAVASCRIPT_DIR}{filename}" type="text/javascript"></script>"#)
}

#[must_use]
pub fn stylesheet_tag(base_path: &str, filename: &str) -> String {
    format!(r#"<link rel="stylesheet" href="{base_path}{STYLESHEET_DIR}{filename}" type="text/css" />"#)
}

/// Hidden form field carrying the anti-forgery nonce.
#[must_use]
pub fn nonce_tag(nonce: &str) -> String {
    format!(r#"<input type="hidden" name="nonce" id="nonce" value="{nonce}" />"#)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_script_tag() {
        assert_eq!(
            script_tag("/ui", "panel.js"),
            r#"<script src="/ui/media/javascript/panel.js" type="text/javascript"></script>"#
        );
    }

    #[test]
    fn test_stylesheet_tag() {
        assert_eq!(
            stylesheet_tag("/admin", "base.css"),
            r#"<link rel="stylesheet" href="/admin/media/css/base.css" type="text/css" />"#
        );
    }

    #[test]
    fn test_nonce_tag() {
        assert_eq!(
            nonce_tag("01J9Z"),
            r#"<input type="hidden" name="nonce" id="nonce" value="01J9Z" />"#
        );
    }
}
