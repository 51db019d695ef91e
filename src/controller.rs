//! Controllers: a named group of handlers with one route table.
//!
//! The controller name identifies the group on the mount table and, lower
//! cased, locates its templates (`<name>/<handler>.html`).

use crate::error::RouteTableError;
use crate::handler::{Handler, HandlerContext, HandlerRef};
use crate::router::{DefaultPathValidator, PathValidator, RouteTable, Router};
use std::collections::HashMap;
use std::sync::Arc;

/// Whether a controller is the authentication entry point.
///
/// Requests to an [`ControllerKind::Authentication`] controller pass the
/// session gate without a valid session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ControllerKind {
    #[default]
    Standard,
    Authentication,
}

impl ControllerKind {
    #[must_use]
    pub fn is_auth_endpoint(self) -> bool {
        matches!(self, ControllerKind::Authentication)
    }
}

#[derive(Debug, Clone)]
pub struct Controller {
    name: String,
    kind: ControllerKind,
    router: Router,
}

impl Controller {
    pub fn builder(name: &str) -> ControllerBuilder {
        ControllerBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn kind(&self) -> ControllerKind {
        self.kind
    }

    /// Template directory for this controller's handlers
    #[must_use]
    pub fn template_group(&self) -> String {
        self.name.to_lowercase()
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }
}

/// Collects handlers and routes, then freezes them into a [`Controller`].
pub struct ControllerBuilder {
    name: String,
    kind: ControllerKind,
    handlers: HashMap<String, HandlerRef>,
    routes: Vec<(String, String)>,
    validator: Arc<dyn PathValidator>,
}

impl ControllerBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: ControllerKind::Standard,
            handlers: HashMap::new(),
            routes: Vec::new(),
            validator: Arc::new(DefaultPathValidator),
        }
    }

    #[must_use]
    pub fn kind(mut self, kind: ControllerKind) -> Self {
        self.kind = kind;
        self
    }

    /// Register a handler. A later registration with the same name replaces
    /// the earlier one.
    #[must_use]
    pub fn handler<F>(mut self, name: &str, func: F) -> Self
    where
        F: Fn(&mut HandlerContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        self.handlers
            .insert(name.to_string(), Arc::new(Handler::new(name, func)));
        self
    }

    /// Bind `path` to the handler named `handler`.
    #[must_use]
    pub fn route(mut self, path: &str, handler: &str) -> Self {
        self.routes.push((path.to_string(), handler.to_string()));
        self
    }

    #[must_use]
    pub fn validator(mut self, validator: Arc<dyn PathValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn build(self) -> Result<Controller, RouteTableError> {
        let table = RouteTable::build(&self.routes, &self.handlers)?;
        Ok(Controller {
            name: self.name,
            kind: self.kind,
            router: Router::new(table, self.validator),
        })
    }
}
