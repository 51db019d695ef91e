//! Template rendering.
//!
//! After a handler runs, the renderer looks for `<controller>/<handler>.html`
//! under the template root. If it exists it is rendered against the
//! post-handler state and replaces the body; if not, the handler's body stands.

use crate::error::TemplateError;
use crate::handler::HandlerContext;
use crate::helpers;
use minijinja::{Environment, State, Value as TemplateValue};
use serde_json::{json, Map, Value};
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Template source and rendering.
pub trait TemplateEngine: Send + Sync {
    /// Whether a template exists at `path` (relative to the template root).
    fn exists(&self, path: &str) -> bool;

    /// Render the template at `path` against `context`.
    fn render(&self, path: &str, context: &Value) -> Result<String, TemplateError>;
}

/// Engine for controllers that never render templates.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTemplates;

impl TemplateEngine for NoTemplates {
    fn exists(&self, _path: &str) -> bool {
        false
    }

    fn render(&self, path: &str, _context: &Value) -> Result<String, TemplateError> {
        Err(TemplateError::Io {
            template: path.to_string(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "no template engine"),
        })
    }
}

/// minijinja templates read from a directory.
///
/// Files are read on every render so edits show up without a restart.
/// `.html` templates are autoescaped; the tag helpers return safe strings.
#[derive(Debug, Clone)]
pub struct FsTemplateEngine {
    root: PathBuf,
}

impl FsTemplateEngine {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn map_path(&self, template: &str) -> Option<PathBuf> {
        let mut pb = self.root.clone();
        for comp in Path::new(template.trim_start_matches('/')).components() {
            match comp {
                Component::Normal(s) => pb.push(s),
                Component::CurDir => {}
                _ => return None,
            }
        }
        Some(pb)
    }
}

fn lookup_str(state: &State, name: &str) -> String {
    state
        .lookup(name)
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_default()
}

fn script_tag_fn(state: &State, filename: &str) -> TemplateValue {
    let base_path = lookup_str(state, "base_path");
    TemplateValue::from_safe_string(helpers::script_tag(&base_path, filename))
}

fn stylesheet_tag_fn(state: &State, filename: &str) -> TemplateValue {
    let base_path = lookup_str(state, "base_path");
    TemplateValue::from_safe_string(helpers::stylesheet_tag(&base_path, filename))
}

fn nonce_tag_fn(state: &State) -> TemplateValue {
    let nonce = lookup_str(state, "nonce");
    TemplateValue::from_safe_string(helpers::nonce_tag(&nonce))
}

impl TemplateEngine for FsTemplateEngine {
    fn exists(&self, path: &str) -> bool {
        self.map_path(path).is_some_and(|p| p.is_file())
    }

    fn render(&self, path: &str, context: &Value) -> Result<String, TemplateError> {
        let io_err = |source| TemplateError::Io {
            template: path.to_string(),
            source,
        };
        let render_err = |source| TemplateError::Render {
            template: path.to_string(),
            source,
        };

        let file = self.map_path(path).ok_or_else(|| {
            io_err(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                "invalid template path",
            ))
        })?;
        let source = fs::read_to_string(&file).map_err(io_err)?;

        let mut env = Environment::new();
        env.add_function("script_tag", script_tag_fn);
        env.add_function("stylesheet_tag", stylesheet_tag_fn);
        env.add_function("nonce_tag", nonce_tag_fn);
        env.add_template(path, &source).map_err(render_err)?;
        let tmpl = env.get_template(path).map_err(render_err)?;
        tmpl.render(context).map_err(render_err)
    }
}

/// Renders a handler's companion template into the response body.
#[derive(Clone)]
pub struct ResponseRenderer {
    templates: Arc<dyn TemplateEngine>,
}

impl ResponseRenderer {
    pub fn new(templates: Arc<dyn TemplateEngine>) -> Self {
        Self { templates }
    }

    /// Template path for `handler` in `group`
    #[must_use]
    pub fn template_path(group: &str, handler: &str) -> String {
        format!("{group}/{handler}.html")
    }

    /// Render `<group>/<handler>.html` if it exists.
    ///
    /// Returns whether a template was rendered. On success the body is
    /// replaced; on error the state is left as the handler left it.
    pub fn render(
        &self,
        group: &str,
        handler: &str,
        ctx: &mut HandlerContext<'_>,
    ) -> Result<bool, TemplateError> {
        let path = Self::template_path(group, handler);
        if !self.templates.exists(&path) {
            debug!(template = %path, "No template, keeping handler body");
            return Ok(false);
        }

        let context = template_context(ctx);
        let body = self.templates.render(&path, &context)?;
        debug!(template = %path, bytes = body.len(), "Template rendered");
        ctx.response.body = body;
        Ok(true)
    }
}

/// Variables visible to a template.
fn template_context(ctx: &HandlerContext<'_>) -> Value {
    let headers: Map<String, Value> = ctx
        .response
        .headers
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.clone())))
        .collect();

    json!({
        "status": ctx.response.status,
        "headers": headers,
        "body": ctx.response.body,
        "base_path": ctx.config.base_path,
        "session_valid": ctx.session_valid,
        "nonce": ctx.nonce,
        "client_ip": ctx.client_ip,
        "params": ctx.request.params,
        "config": ctx.config,
        "vars": ctx.vars,
    })
}
