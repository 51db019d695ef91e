//! Handler types.
//!
//! A handler is trusted application code bound to a path. It receives an
//! explicit [`HandlerContext`] and may set status, headers and body freely;
//! anything it puts into `vars` is available to its companion template.

use crate::config::ConfigSnapshot;
use crate::helpers;
use crate::request::AdminRequest;
use crate::response::ResponseState;
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

/// Signature of a handler function.
pub type HandlerFn = dyn Fn(&mut HandlerContext<'_>) -> anyhow::Result<()> + Send + Sync;

/// Shared reference to a registered handler
pub type HandlerRef = Arc<Handler>;

/// A named handler. The name also locates its template.
pub struct Handler {
    name: Arc<str>,
    func: Box<HandlerFn>,
}

impl Handler {
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&mut HandlerContext<'_>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            func: Box::new(func),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run the handler against `ctx`.
    pub fn invoke(&self, ctx: &mut HandlerContext<'_>) -> anyhow::Result<()> {
        (self.func)(ctx)
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler").field("name", &self.name).finish()
    }
}

/// Everything a handler may read or mutate during one dispatch.
pub struct HandlerContext<'a> {
    /// The inbound request
    pub request: &'a AdminRequest,
    /// Response state; the handler owns it for the duration of the call
    pub response: &'a mut ResponseState,
    /// Configuration snapshot taken at the start of the dispatch
    pub config: &'a ConfigSnapshot,
    /// Whether the session store accepted the request's session.
    /// Only ever false on the authentication controller.
    pub session_valid: bool,
    /// Anti-forgery nonce of the current session store
    pub nonce: &'a str,
    /// Address the origin gate admitted
    pub client_ip: &'a str,
    /// Extra template variables, exposed to the template as `vars`
    pub vars: &'a mut Map<String, Value>,
}

impl HandlerContext<'_> {
    /// Parameter value by name
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.request.get_param(name)
    }

    /// Replace the response body
    pub fn set_body(&mut self, body: impl Into<String>) {
        self.response.body = body.into();
    }

    /// Serialize `value` as the response body.
    ///
    /// The content type is left alone; a `.json` path forces it anyway.
    pub fn set_json<T: Serialize>(&mut self, value: &T) -> anyhow::Result<()> {
        self.response.body = serde_json::to_string(value)?;
        Ok(())
    }

    /// Expose `value` to the template as `vars.<name>`.
    pub fn set_var<T: Serialize>(&mut self, name: &str, value: T) -> anyhow::Result<()> {
        self.vars.insert(name.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    /// `<script>` tag for a file under the admin UI's JavaScript directory
    #[must_use]
    pub fn script_tag(&self, filename: &str) -> String {
        helpers::script_tag(&self.config.base_path, filename)
    }

    /// `<link>` tag for a file under the admin UI's stylesheet directory
    #[must_use]
    pub fn stylesheet_tag(&self, filename: &str) -> String {
        helpers::stylesheet_tag(&self.config.base_path, filename)
    }

    /// Hidden anti-forgery `<input>` carrying the session nonce
    #[must_use]
    pub fn nonce_tag(&self) -> String {
        helpers::nonce_tag(self.nonce)
    }
}
