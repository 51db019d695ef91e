//! # Dispatcher Module
//!
//! Runs one request through a controller's pipeline and returns the response
//! state.
//!
//! ## Request Flow
//!
//! 1. Snapshot the configuration and resolve the client address
//! 2. Origin gate: denied requests get the canned 404 and stop here
//! 3. Session gate: unauthenticated requests get a 302 to the authentication
//!    controller (unless this *is* that controller)
//! 4. Router: unresolved paths get status 404 and stop here
//! 5. Handler: receives a mutable [`HandlerContext`](crate::handler::HandlerContext)
//! 6. Renderer: `<controller>/<handler>.html`, if present, replaces the body
//! 7. Content type is finalized
//!
//! ## Error Handling
//!
//! Nothing escapes [`Dispatcher::run`]. A handler error, handler panic or
//! template failure is logged at `error` with a backtrace and the state as it
//! stood at the point of failure is returned.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gatehouse::controller::Controller;
//! use gatehouse::dispatcher::Dispatcher;
//!
//! let panel = Controller::builder("panel")
//!     .handler("index", |ctx| {
//!         ctx.set_body("hello");
//!         Ok(())
//!     })
//!     .build()?;
//!
//! let dispatcher = Dispatcher::builder(panel)
//!     .origin(Arc::new(SubnetAllowList::loopback()))
//!     .sessions(sessions)
//!     .build();
//!
//! let response = dispatcher.run(&request);
//! ```

mod core;

pub use core::{Collaborators, DispatchOutcome, Dispatcher, DispatcherBuilder};
