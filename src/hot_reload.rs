//! # Hot Reload Module
//!
//! Live reloading of the YAML configuration without restarting the process.
//!
//! The watcher observes the file behind a [`YamlConfigStore`] and calls
//! [`YamlConfigStore::reload`] whenever it is modified or recreated. Because the
//! store swaps its document atomically, requests already in flight finish
//! against the document they started with.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gatehouse::config::YamlConfigStore;
//! use gatehouse::hot_reload::watch_config;
//! use std::sync::Arc;
//!
//! let store = Arc::new(YamlConfigStore::load("config/config.yaml")?);
//! let watcher = watch_config(Arc::clone(&store))?;
//!
//! // Keep the watcher alive for as long as reloads are wanted
//! ```
//!
//! ## Error Handling
//!
//! If the new file fails to parse, or its root is not a mapping (an editor
//! truncating the file before writing it), the error is logged and the
//! previous document remains active.

use crate::config::YamlConfigStore;
use notify::{Config, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::sync::Arc;
use tracing::{info, warn};

/// Watch the file behind `store` and reload it when it changes.
///
/// Fails if the store was not loaded from a file.
pub fn watch_config(store: Arc<YamlConfigStore>) -> notify::Result<RecommendedWatcher> {
    let path = store
        .path()
        .map(|p| p.to_path_buf())
        .ok_or_else(|| notify::Error::generic("configuration store has no backing file"))?;

    let watched = Arc::clone(&store);
    let mut watcher = RecommendedWatcher::new(
        move |res: Result<notify::Event, notify::Error>| match res {
            Ok(event) => {
                if matches!(event.kind, EventKind::Modify(_) | EventKind::Create(_)) {
                    match watched.reload() {
                        Ok(()) => info!("hot-reload: configuration applied"),
                        Err(e) => warn!(
                            error = %format!("{e:#}"),
                            "hot-reload: keeping previous configuration"
                        ),
                    }
                }
            }
            Err(e) => warn!(error = %e, "hot-reload: watch error"),
        },
        Config::default(),
    )?;

    watcher.watch(&path, RecursiveMode::NonRecursive)?;
    info!(config_path = %path.display(), "hot-reload: watching configuration");
    Ok(watcher)
}
