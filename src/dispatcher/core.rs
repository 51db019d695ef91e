use crate::config::{ConfigSnapshot, ConfigStore, YamlConfigStore};
use crate::content_type;
use crate::controller::Controller;
use crate::error::DispatchError;
use crate::handler::{Handler, HandlerContext};
use crate::origin::{Admission, OriginChecker, OriginGate, SubnetAllowList};
use crate::render::{NoTemplates, ResponseRenderer, TemplateEngine};
use crate::request::{resolve_client_ip, AdminRequest};
use crate::response::ResponseState;
use crate::session::{SessionGate, SessionOutcome, SessionStore, TokenSessionStore};
use serde_json::Map;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, info_span};

/// The injected services a dispatcher consults on every request.
#[derive(Clone)]
pub struct Collaborators {
    pub origin: Arc<dyn OriginChecker>,
    pub sessions: Arc<dyn SessionStore>,
    pub config: Arc<dyn ConfigStore>,
    pub templates: Arc<dyn TemplateEngine>,
}

impl Default for Collaborators {
    /// Loopback-only origins, no live sessions, built-in configuration
    /// defaults and no templates.
    fn default() -> Self {
        Self {
            origin: Arc::new(SubnetAllowList::loopback()),
            sessions: Arc::new(TokenSessionStore::new()),
            config: Arc::new(YamlConfigStore::empty()),
            templates: Arc::new(NoTemplates),
        }
    }
}

/// How a dispatch ended. Only used for logging and tests; the response
/// state is the real result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    OriginDenied,
    RedirectedToAuth,
    NotFound,
    Handled {
        handler: String,
        /// Whether a template replaced the body
        rendered: bool,
    },
    /// Handler or template failure; the partial state was returned
    Failed,
}

/// One controller's request pipeline.
///
/// Built once and shared across request threads.
#[derive(Clone)]
pub struct Dispatcher {
    controller: Controller,
    origin_gate: OriginGate,
    sessions: Arc<dyn SessionStore>,
    config: Arc<dyn ConfigStore>,
    renderer: ResponseRenderer,
}

impl Dispatcher {
    pub fn new(controller: Controller, collaborators: Collaborators) -> Self {
        Self {
            controller,
            origin_gate: OriginGate::new(collaborators.origin),
            sessions: collaborators.sessions,
            config: collaborators.config,
            renderer: ResponseRenderer::new(collaborators.templates),
        }
    }

    pub fn builder(controller: Controller) -> DispatcherBuilder {
        DispatcherBuilder::new(controller)
    }

    #[must_use]
    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Run `request` through the pipeline.
    #[must_use]
    pub fn run(&self, request: &AdminRequest) -> ResponseState {
        self.run_traced(request).0
    }

    /// Like [`Dispatcher::run`], also reporting where the pipeline stopped.
    pub fn run_traced(&self, request: &AdminRequest) -> (ResponseState, DispatchOutcome) {
        let span = info_span!(
            "dispatch",
            request_id = %request.request_id,
            controller = %self.controller.name(),
            method = %request.method,
            path = %request.path,
        );
        let _enter = span.enter();

        let mut state = ResponseState::new();
        let result = catch_unwind(AssertUnwindSafe(|| self.pipeline(request, &mut state)));
        let outcome = match result {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(e)) => {
                let backtrace = std::backtrace::Backtrace::capture();
                error!(
                    error = %e,
                    backtrace = %backtrace,
                    status = state.status,
                    "Dispatch failed - returning partial response"
                );
                DispatchOutcome::Failed
            }
            Err(panic) => {
                let backtrace = std::backtrace::Backtrace::capture();
                error!(
                    panic_message = %panic_message(panic.as_ref()),
                    backtrace = %backtrace,
                    status = state.status,
                    "Dispatch pipeline panicked - returning partial response"
                );
                DispatchOutcome::Failed
            }
        };

        info!(status = state.status, outcome = ?outcome, "Dispatch complete");
        (state, outcome)
    }

    fn pipeline(
        &self,
        request: &AdminRequest,
        state: &mut ResponseState,
    ) -> Result<DispatchOutcome, DispatchError> {
        let config = ConfigSnapshot::from_store(self.config.as_ref());
        let client_ip = resolve_client_ip(request, config.trust_reverse_proxy);

        if self.origin_gate.check(&client_ip, &config, state) == Admission::Denied {
            return Ok(DispatchOutcome::OriginDenied);
        }

        let session_valid = self.sessions.valid_session(request);
        if SessionGate::check(
            session_valid,
            self.controller.kind(),
            &config.base_path,
            state,
        ) == SessionOutcome::RedirectToAuth
        {
            return Ok(DispatchOutcome::RedirectedToAuth);
        }

        let Some(handler) = self.controller.router().resolve(&request.path) else {
            state.status = 404;
            return Ok(DispatchOutcome::NotFound);
        };

        let nonce = self.sessions.nonce();
        let mut vars = Map::new();
        let mut ctx = HandlerContext {
            request,
            response: &mut *state,
            config: &config,
            session_valid,
            nonce: &nonce,
            client_ip: &client_ip,
            vars: &mut vars,
        };

        debug!(client_ip = %client_ip, handler_name = %handler.name(), "Invoking handler");
        invoke_handler(&handler, &mut ctx)?;
        let rendered =
            self.renderer
                .render(&self.controller.template_group(), handler.name(), &mut ctx)?;

        content_type::finalize(&request.path, state);
        Ok(DispatchOutcome::Handled {
            handler: handler.name().to_string(),
            rendered,
        })
    }
}

fn invoke_handler(handler: &Handler, ctx: &mut HandlerContext<'_>) -> Result<(), DispatchError> {
    match catch_unwind(AssertUnwindSafe(|| handler.invoke(ctx))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(source)) => Err(DispatchError::Handler {
            handler: handler.name().to_string(),
            source,
        }),
        Err(panic) => Err(DispatchError::HandlerPanic {
            handler: handler.name().to_string(),
            message: panic_message(panic.as_ref()),
        }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Assembles a [`Dispatcher`], filling unset collaborators from
/// [`Collaborators::default`].
pub struct DispatcherBuilder {
    controller: Controller,
    collaborators: Collaborators,
}

impl DispatcherBuilder {
    pub fn new(controller: Controller) -> Self {
        Self {
            controller,
            collaborators: Collaborators::default(),
        }
    }

    #[must_use]
    pub fn collaborators(mut self, collaborators: Collaborators) -> Self {
        self.collaborators = collaborators;
        self
    }

    #[must_use]
    pub fn origin(mut self, origin: Arc<dyn OriginChecker>) -> Self {
        self.collaborators.origin = origin;
        self
    }

    #[must_use]
    pub fn sessions(mut self, sessions: Arc<dyn SessionStore>) -> Self {
        self.collaborators.sessions = sessions;
        self
    }

    #[must_use]
    pub fn config(mut self, config: Arc<dyn ConfigStore>) -> Self {
        self.collaborators.config = config;
        self
    }

    #[must_use]
    pub fn templates(mut self, templates: Arc<dyn TemplateEngine>) -> Self {
        self.collaborators.templates = templates;
        self
    }

    #[must_use]
    pub fn build(self) -> Dispatcher {
        Dispatcher::new(self.controller, self.collaborators)
    }
}
