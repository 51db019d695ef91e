//! Mutable per-request response state.

use crate::request::HeaderVec;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::sync::Arc;

/// Status, headers and body built up while one request moves through the pipeline.
///
/// Allocated fresh by every [`Dispatcher::run`](crate::dispatcher::Dispatcher::run)
/// and never shared between requests. Header names compare case-insensitively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseState {
    /// HTTP status code
    pub status: u16,
    /// Response headers
    pub headers: HeaderVec,
    /// Response body
    pub body: String,
}

impl Default for ResponseState {
    fn default() -> Self {
        Self {
            status: 200,
            headers: HeaderVec::new(),
            body: String::new(),
        }
    }
}

impl ResponseState {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get a header by name
    #[inline]
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Add or replace a header
    pub fn set_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((Arc::from(name), value.into()));
    }

    /// Remove a header, returning its value
    pub fn remove_header(&mut self, name: &str) -> Option<String> {
        let idx = self
            .headers
            .iter()
            .position(|(k, _)| k.eq_ignore_ascii_case(name))?;
        Some(self.headers.remove(idx).1)
    }

    /// Overwrite status, body and headers in one go.
    pub fn replace(&mut self, status: u16, body: &str, headers: &[(&str, &str)]) {
        self.status = status;
        self.body = body.to_string();
        self.headers.clear();
        for (name, value) in headers {
            self.set_header(name, *value);
        }
    }
}

/// Headers serialize as a map so templates can write `headers["Content-Type"]`.
struct HeaderMapView<'a>(&'a HeaderVec);

impl Serialize for HeaderMapView<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in self.0.iter() {
            map.serialize_entry(k.as_ref(), v)?;
        }
        map.end()
    }
}

impl Serialize for ResponseState {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("status", &self.status)?;
        map.serialize_entry("headers", &HeaderMapView(&self.headers))?;
        map.serialize_entry("body", &self.body)?;
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let state = ResponseState::new();
        assert_eq!(state.status, 200);
        assert!(state.headers.is_empty());
        assert!(state.body.is_empty());
    }

    #[test]
    fn test_set_header_is_case_insensitive() {
        let mut state = ResponseState::new();
        state.set_header("content-type", "text/plain");
        state.set_header("Content-Type", "text/html");
        assert_eq!(state.headers.len(), 1);
        assert_eq!(state.get_header("CONTENT-TYPE"), Some("text/html"));
        assert_eq!(state.remove_header("content-TYPE").as_deref(), Some("text/html"));
        assert!(state.get_header("content-type").is_none());
    }

    #[test]
    fn test_replace_clears_previous_headers() {
        let mut state = ResponseState::new();
        state.set_header("X-Stale", "1");
        state.replace(404, "gone", &[("Server", "test")]);
        assert_eq!(state.status, 404);
        assert_eq!(state.body, "gone");
        assert!(state.get_header("x-stale").is_none());
        assert_eq!(state.get_header("server"), Some("test"));
    }

    #[test]
    fn test_serializes_headers_as_map() {
        let mut state = ResponseState::new();
        state.set_header("Location", "/ui/authentication");
        let value = serde_json::to_value(&state).unwrap();
        assert_eq!(value["status"], 200);
        assert_eq!(value["headers"]["Location"], "/ui/authentication");
        assert_eq!(value["body"], "");
    }
}
