//! Route table and path resolution.

use crate::error::RouteTableError;
use crate::handler::HandlerRef;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::validator::PathValidator;

/// Path bound to the `index` handler when a controller declares no routes
pub const DEFAULT_PATH: &str = "/";
/// Handler name that receives [`DEFAULT_PATH`]
pub const DEFAULT_HANDLER: &str = "index";

/// Immutable map of controller-relative path → handler.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: HashMap<String, HandlerRef>,
}

impl RouteTable {
    /// Build a table from explicit `(path, handler name)` pairs.
    ///
    /// With no pairs and an `index` handler present, the table is exactly
    /// `{"/" → index}`. Every path must start with `/` and every handler name
    /// must be present in `handlers`.
    pub fn build(
        routes: &[(String, String)],
        handlers: &HashMap<String, HandlerRef>,
    ) -> Result<Self, RouteTableError> {
        let mut entries = HashMap::with_capacity(routes.len().max(1));

        if routes.is_empty() {
            if let Some(index) = handlers.get(DEFAULT_HANDLER) {
                entries.insert(DEFAULT_PATH.to_string(), Arc::clone(index));
            }
            return Ok(Self { entries });
        }

        for (path, handler_name) in routes {
            if !path.starts_with('/') {
                return Err(RouteTableError::InvalidRoutePath { path: path.clone() });
            }
            let handler =
                handlers
                    .get(handler_name)
                    .ok_or_else(|| RouteTableError::UnknownHandler {
                        path: path.clone(),
                        handler: handler_name.clone(),
                    })?;
            entries.insert(path.clone(), Arc::clone(handler));
        }

        Ok(Self { entries })
    }

    #[must_use]
    pub fn get(&self, path: &str) -> Option<&HandlerRef> {
        self.entries.get(path)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(path, handler name)` pairs sorted by path
    #[must_use]
    pub fn routes(&self) -> Vec<(String, String)> {
        let mut routes: Vec<(String, String)> = self
            .entries
            .iter()
            .map(|(path, handler)| (path.clone(), handler.name().to_string()))
            .collect();
        routes.sort();
        routes
    }
}

/// Resolves controller-relative paths against one [`RouteTable`].
#[derive(Clone)]
pub struct Router {
    table: RouteTable,
    validator: Arc<dyn PathValidator>,
}

impl Router {
    #[must_use]
    pub fn new(table: RouteTable, validator: Arc<dyn PathValidator>) -> Self {
        info!(
            routes_count = table.len(),
            routes = ?table.routes(),
            "Routing table loaded"
        );
        Self { table, validator }
    }

    /// Find the handler bound to `path`.
    ///
    /// # Returns
    ///
    /// * `Some(handler)` - exact match, else `path` + `/`, else `path` without
    ///   its trailing `/`
    /// * `None` - the path is invalid or unregistered (results in 404)
    #[must_use]
    pub fn resolve(&self, path: &str) -> Option<HandlerRef> {
        debug!(path = %path, "Route match attempt");

        if !self.validator.is_valid_path_info(path) {
            warn!(path = %path, "Rejected invalid path");
            return None;
        }

        if let Some(handler) = self.table.get(path) {
            debug!(path = %path, handler_name = %handler.name(), "Route matched");
            return Some(Arc::clone(handler));
        }

        let slashed = format!("{path}/");
        if let Some(handler) = self.table.get(&slashed) {
            debug!(
                path = %path,
                route = %slashed,
                handler_name = %handler.name(),
                "Route matched with trailing slash"
            );
            return Some(Arc::clone(handler));
        }

        if let Some(trimmed) = path.strip_suffix('/').filter(|t| !t.is_empty()) {
            if let Some(handler) = self.table.get(trimmed) {
                debug!(
                    path = %path,
                    route = %trimmed,
                    handler_name = %handler.name(),
                    "Route matched without trailing slash"
                );
                return Some(Arc::clone(handler));
            }
        }

        info!(path = %path, "No route matched");
        None
    }

    #[must_use]
    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// `(path, handler name)` pairs sorted by path
    #[must_use]
    pub fn routes(&self) -> Vec<(String, String)> {
        self.table.routes()
    }

    /// Log every registered route at `info`.
    pub fn dump_routes(&self) {
        info!(count = self.table.len(), "Registered routes");
        for (path, handler) in self.table.routes() {
            info!(path = %path, handler_name = %handler, "Route");
        }
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("routes", &self.table.routes())
            .finish_non_exhaustive()
    }
}
