//! # Session Gate
//!
//! Second stage of the pipeline: requests without a valid session are sent to
//! the authentication entry point, unless the controller handling them *is*
//! that entry point.
//!
//! Session validity and the anti-forgery nonce come from a [`SessionStore`].
//! Issuing tokens is someone else's job; [`TokenSessionStore`] only checks a
//! request's session cookie against tokens registered with it.

use crate::controller::ControllerKind;
use crate::request::AdminRequest;
use crate::response::ResponseState;
use dashmap::DashSet;
use tracing::{debug, info};

/// Path, relative to the base path, of the authentication entry point
pub const AUTHENTICATION_PATH: &str = "/authentication";

/// Default name of the session cookie read by [`TokenSessionStore`]
pub const DEFAULT_SESSION_COOKIE: &str = "GATEHOUSE_SESSION";

/// Session validity and anti-forgery nonce provider.
pub trait SessionStore: Send + Sync {
    /// Whether `request` carries a valid session.
    fn valid_session(&self, request: &AdminRequest) -> bool;

    /// Nonce to embed in rendered forms.
    fn nonce(&self) -> String;
}

/// Outcome of the session gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionOutcome {
    Continue,
    /// The response state now holds the redirect
    RedirectToAuth,
}

/// Stateless session decision.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionGate;

impl SessionGate {
    /// Let the request through or turn `state` into a 302 to `<base_path>/authentication`.
    pub fn check(
        session_valid: bool,
        kind: ControllerKind,
        base_path: &str,
        state: &mut ResponseState,
    ) -> SessionOutcome {
        if session_valid {
            return SessionOutcome::Continue;
        }
        if kind.is_auth_endpoint() {
            debug!("No session, but this is the authentication controller");
            return SessionOutcome::Continue;
        }

        let location = format!("{base_path}{AUTHENTICATION_PATH}");
        state.status = 302;
        state.body.clear();
        state.set_header("Location", location.as_str());
        info!(location = %location, "No valid session - redirecting to authentication");
        SessionOutcome::RedirectToAuth
    }
}

/// In-memory store of live session tokens, read from a cookie.
///
/// Tokens can be added and revoked concurrently while requests are in flight.
pub struct TokenSessionStore {
    cookie_name: String,
    tokens: DashSet<String>,
    nonce: String,
}

impl TokenSessionStore {
    /// Empty store using the default cookie name and a freshly generated nonce.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            tokens: DashSet::new(),
            nonce: ulid::Ulid::new().to_string(),
        }
    }

    /// Read the token from `name` instead of the default cookie.
    #[must_use]
    pub fn cookie_name(mut self, name: impl Into<String>) -> Self {
        self.cookie_name = name.into();
        self
    }

    /// Use a fixed nonce.
    #[must_use]
    pub fn with_nonce(mut self, nonce: impl Into<String>) -> Self {
        self.nonce = nonce.into();
        self
    }

    /// Register a live session token.
    pub fn insert(&self, token: impl Into<String>) {
        self.tokens.insert(token.into());
    }

    /// Revoke a token. Returns whether it was present.
    pub fn revoke(&self, token: &str) -> bool {
        self.tokens.remove(token).is_some()
    }
}

impl Default for TokenSessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStore for TokenSessionStore {
    fn valid_session(&self, request: &AdminRequest) -> bool {
        request
            .get_cookie(&self.cookie_name)
            .is_some_and(|token| !token.is_empty() && self.tokens.contains(token))
    }

    fn nonce(&self) -> String {
        self.nonce.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;
    use std::net::{IpAddr, Ipv4Addr};

    fn request_with_cookie(cookie: Option<&str>) -> AdminRequest {
        let req = AdminRequest::new(Method::GET, "/", IpAddr::V4(Ipv4Addr::LOCALHOST));
        match cookie {
            Some(c) => req.with_header("Cookie", c),
            None => req,
        }
    }

    #[test]
    fn test_valid_session_continues_untouched() {
        let mut state = ResponseState::new();
        let outcome = SessionGate::check(true, ControllerKind::Standard, "/ui", &mut state);
        assert_eq!(outcome, SessionOutcome::Continue);
        assert_eq!(state, ResponseState::new());
    }

    #[test]
    fn test_invalid_session_redirects() {
        let mut state = ResponseState::new();
        state.body.push_str("partial");
        let outcome = SessionGate::check(false, ControllerKind::Standard, "/ui", &mut state);
        assert_eq!(outcome, SessionOutcome::RedirectToAuth);
        assert_eq!(state.status, 302);
        assert!(state.body.is_empty());
        assert_eq!(state.get_header("location"), Some("/ui/authentication"));
    }

    #[test]
    fn test_auth_controller_never_redirects() {
        let mut state = ResponseState::new();
        let outcome =
            SessionGate::check(false, ControllerKind::Authentication, "/ui", &mut state);
        assert_eq!(outcome, SessionOutcome::Continue);
        assert!(state.get_header("location").is_none());
    }

    #[test]
    fn test_token_store_checks_cookie() {
        let store = TokenSessionStore::new();
        store.insert("s3cret");
        assert!(store.valid_session(&request_with_cookie(Some("GATEHOUSE_SESSION=s3cret"))));
        assert!(!store.valid_session(&request_with_cookie(Some("GATEHOUSE_SESSION=forged"))));
        assert!(!store.valid_session(&request_with_cookie(Some("GATEHOUSE_SESSION="))));
        assert!(!store.valid_session(&request_with_cookie(None)));
    }

    #[test]
    fn test_token_store_revoke_and_custom_cookie() {
        let store = TokenSessionStore::new().cookie_name("sid").with_nonce("n-1");
        store.insert("abc");
        let req = request_with_cookie(Some("sid=abc"));
        assert!(store.valid_session(&req));
        assert!(store.revoke("abc"));
        assert!(!store.revoke("abc"));
        assert!(!store.valid_session(&req));
        assert_eq!(store.nonce(), "n-1");
    }
}
