//! # Gatehouse
//!
//! **Gatehouse** is the request-dispatch core of an administrative web
//! interface. It takes a pre-parsed request, decides whether its origin may
//! reach the interface at all, checks the caller's session, routes the path to
//! a handler, lets the handler fill in the response, renders the handler's
//! template and settles the content type.
//!
//! ## Architecture
//!
//! - **[`origin`]** - Origin gate: permit list check with a canned "not found"
//!   denial that can imitate Apache or IIS ([`impersonation`])
//! - **[`session`]** - Session gate: redirect to the authentication controller
//! - **[`router`]** - Path → handler resolution with path validation
//! - **[`controller`]** - Named handler groups and their route tables
//! - **[`dispatcher`]** - The per-controller pipeline
//! - **[`render`]** - Template lookup and rendering (minijinja)
//! - **[`content_type`]** - Final `Content-Type` negotiation
//! - **[`helpers`]** - `<script>`, `<link>` and nonce field builders
//! - **[`registry`]** - Mount table mapping URL prefixes to controllers
//! - **[`config`]**, **[`runtime_config`]**, **[`hot_reload`]** - YAML
//!   configuration, environment settings and live reload
//! - **[`logging`]** - `tracing` subscriber setup
//!
//! ### Request Flow
//!
//! ```mermaid
//! sequenceDiagram
//!     participant App as AdminApp
//!     participant D as Dispatcher
//!     participant O as OriginGate
//!     participant S as SessionGate
//!     participant R as Router
//!     participant H as Handler
//!     participant T as ResponseRenderer
//!
//!     App->>D: run(request without mount prefix)
//!     D->>O: check(client_ip)
//!     O-->>D: Denied (canned 404) / Allowed
//!     D->>S: check(session_valid, kind)
//!     S-->>D: RedirectToAuth (302) / Continue
//!     D->>R: resolve(path)
//!     R-->>D: None (404) / handler
//!     D->>H: invoke(&mut HandlerContext)
//!     D->>T: render(<controller>/<handler>.html)
//!     D->>D: content_type::finalize
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use gatehouse::controller::Controller;
//! use gatehouse::dispatcher::Collaborators;
//! use gatehouse::registry::AdminApp;
//!
//! let panel = Controller::builder("panel")
//!     .handler("index", |ctx| {
//!         ctx.set_body("hello");
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let mut app = AdminApp::new(Collaborators::default());
//! app.mount(panel);
//!
//! let response = app.dispatch(&request);
//! ```

pub mod cli;
pub mod config;
pub mod content_type;
pub mod controller;
pub mod dispatcher;
pub mod error;
pub mod handler;
pub mod helpers;
pub mod hot_reload;
pub mod impersonation;
pub mod logging;
pub mod origin;
pub mod registry;
pub mod render;
pub mod request;
pub mod response;
pub mod router;
pub mod runtime_config;
pub mod session;

pub use config::{ConfigSnapshot, ConfigStore, YamlConfigStore};
pub use controller::{Controller, ControllerBuilder, ControllerKind};
pub use dispatcher::{Collaborators, DispatchOutcome, Dispatcher, DispatcherBuilder};
pub use error::{DispatchError, OriginCheckError, RouteTableError, TemplateError};
pub use handler::{Handler, HandlerContext};
pub use origin::{Admission, OriginChecker, OriginGate, SubnetAllowList};
pub use registry::AdminApp;
pub use render::{FsTemplateEngine, NoTemplates, ResponseRenderer, TemplateEngine};
pub use request::{resolve_client_ip, AdminRequest, ParamValue};
pub use response::ResponseState;
pub use router::{DefaultPathValidator, PathValidator, Router};
pub use session::{SessionGate, SessionOutcome, SessionStore, TokenSessionStore};
