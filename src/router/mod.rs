//! # Router Module
//!
//! Maps a controller-relative path to one of the controller's handlers.
//!
//! ## Overview
//!
//! Each controller owns one immutable [`RouteTable`], built when the controller
//! is built. Resolution is deliberately simple:
//!
//! 1. The path must pass the [`PathValidator`]; anything else is not found.
//! 2. The exact path is looked up.
//! 3. Failing that, the path with a trailing `/` is looked up, and then the
//!    path with its trailing `/` removed. `/foo` and `/foo/` therefore reach
//!    the same handler whichever of the two was registered.
//!
//! A controller that registers no explicit routes but has an `index` handler
//! gets the single route `"/" → index`.
//!
//! ## Example
//!
//! ```rust,ignore
//! use gatehouse::router::{DefaultPathValidator, RouteTable, Router};
//! use std::sync::Arc;
//!
//! let table = RouteTable::build(&routes, &handlers)?;
//! let router = Router::new(table, Arc::new(DefaultPathValidator));
//!
//! if let Some(handler) = router.resolve("/hooks") {
//!     println!("Handler: {}", handler.name());
//! }
//! ```

mod core;
mod validator;

pub use core::{RouteTable, Router, DEFAULT_HANDLER, DEFAULT_PATH};
pub use validator::{DefaultPathValidator, PathValidator, MAX_PATH_LEN};
