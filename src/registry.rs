//! Mount table: maps `<base_path>/<controller>` prefixes to dispatchers.
//!
//! The transport layer hands over full request paths; [`AdminApp::dispatch`]
//! strips the base path and controller segment and forwards the remainder to
//! the controller's [`Dispatcher`]. All controllers share one set of
//! collaborators.

use crate::config::ConfigSnapshot;
use crate::controller::Controller;
use crate::dispatcher::{Collaborators, Dispatcher};
use crate::origin::{Admission, OriginGate};
use crate::request::{resolve_client_ip, AdminRequest};
use crate::response::ResponseState;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, info_span, warn};

pub struct AdminApp {
    collaborators: Collaborators,
    origin_gate: OriginGate,
    mounts: HashMap<String, Dispatcher>,
}

impl AdminApp {
    pub fn new(collaborators: Collaborators) -> Self {
        Self {
            origin_gate: OriginGate::new(Arc::clone(&collaborators.origin)),
            collaborators,
            mounts: HashMap::new(),
        }
    }

    /// Mount `controller` under its lower-cased name. A controller already
    /// mounted under that name is replaced.
    pub fn mount(&mut self, controller: Controller) -> &mut Self {
        let key = controller.template_group();
        let dispatcher = Dispatcher::new(controller, self.collaborators.clone());
        if self.mounts.insert(key.clone(), dispatcher).is_some() {
            warn!(controller = %key, "Replaced previously mounted controller");
        } else {
            info!(controller = %key, "Mounted controller");
        }
        self
    }

    /// Mounted controller names, sorted
    #[must_use]
    pub fn mounts(&self) -> Vec<String> {
        let mut names: Vec<String> = self.mounts.keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn dispatcher(&self, name: &str) -> Option<&Dispatcher> {
        self.mounts.get(name)
    }

    /// Route a full request path to its controller and run it.
    ///
    /// Paths outside the base path or naming no mounted controller still
    /// pass the origin gate first, so a denied caller sees the same canned
    /// page either way; admitted callers get an empty 404.
    #[must_use]
    pub fn dispatch(&self, request: &AdminRequest) -> ResponseState {
        let config = ConfigSnapshot::from_store(self.collaborators.config.as_ref());

        if let Some((name, rest)) = split_mount(&request.path, &config.base_path) {
            if let Some(dispatcher) = self.mounts.get(name) {
                let mut inner = request.clone();
                inner.path = rest;
                return dispatcher.run(&inner);
            }
        }

        let span = info_span!("unmounted", request_id = %request.request_id, path = %request.path);
        let _enter = span.enter();

        let mut state = ResponseState::new();
        let client_ip = resolve_client_ip(request, config.trust_reverse_proxy);
        if self.origin_gate.check(&client_ip, &config, &mut state) == Admission::Allowed {
            state.status = 404;
            info!(status = state.status, "No controller mounted at path");
        }
        state
    }
}

/// Split `path` into `(controller, controller-relative path)` under `base_path`.
fn split_mount<'a>(path: &'a str, base_path: &str) -> Option<(&'a str, String)> {
    let remainder = path.strip_prefix(base_path)?;
    let remainder = remainder.strip_prefix('/')?;
    let (name, rest) = match remainder.split_once('/') {
        Some((name, rest)) => (name, format!("/{rest}")),
        None => (remainder, "/".to_string()),
    };
    if name.is_empty() {
        return None;
    }
    Some((name, rest))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_mount() {
        assert_eq!(
            split_mount("/ui/panel/hooks.json", "/ui"),
            Some(("panel", "/hooks.json".to_string()))
        );
        assert_eq!(split_mount("/ui/panel", "/ui"), Some(("panel", "/".to_string())));
        assert_eq!(split_mount("/ui/panel/", "/ui"), Some(("panel", "/".to_string())));
        assert_eq!(
            split_mount("/ui/panel/a/b/", "/ui"),
            Some(("panel", "/a/b/".to_string()))
        );
    }

    #[test]
    fn test_split_mount_outside_base() {
        assert_eq!(split_mount("/other/panel", "/ui"), None);
        assert_eq!(split_mount("/uipanel", "/ui"), None);
        assert_eq!(split_mount("/ui", "/ui"), None);
        assert_eq!(split_mount("/ui/", "/ui"), None);
    }

    #[test]
    fn test_split_mount_empty_base() {
        assert_eq!(split_mount("/panel/x", ""), Some(("panel", "/x".to_string())));
    }
}
