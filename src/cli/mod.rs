//! # CLI Module
//!
//! Command-line front end for trying the dispatch pipeline without a web
//! server. Requests run through a small demo app (an `authentication` and a
//! `panel` controller) built from a configuration file and template root.
//!
//! ## Commands
//!
//! ### `dispatch`
//!
//! Run one request and print status, headers and body:
//!
//! ```bash
//! gatehouse dispatch --config demo/config.yaml --templates demo/templates \
//!     --session-token secret --path /ui/panel/hooks.json
//! ```
//!
//! Options:
//! - `--allow <CIDR,...>` - permitted source networks (default: loopback)
//! - `--ip <ADDR>` - transport source address (default: 127.0.0.1)
//! - `-H "Name: value"` - extra request header, repeatable
//! - `--json` - print the response as JSON
//!
//! ### `replay`
//!
//! Dispatch `METHOD PATH [IP]` lines from a file or stdin, printing one
//! status line per request. `--watch` reloads the configuration on change.
//!
//! ### `check-config`
//!
//! Print the configuration snapshot a dispatch would use.

mod commands;
mod demo;


pub use commands::{execute, run_cli, AppArgs, Cli, Commands};
pub use demo::{authentication_controller, demo_app, panel_controller};
