//! # Configuration Module
//!
//! Read-only configuration consulted by the dispatch pipeline on every request.
//!
//! The pipeline never reads configuration directly; it goes through the
//! [`ConfigStore`] trait using dotted keys and collects the handful of values it
//! needs into a [`ConfigSnapshot`]. [`YamlConfigStore`] is the bundled
//! implementation, backed by a YAML document that can be swapped atomically on
//! reload (see [`crate::hot_reload`]).
//!
//! ## Keys
//!
//! | Key | Type | Default |
//! |-----|------|---------|
//! | `http.allow_reverse_proxy` | bool | `false` |
//! | `http.web_server_imitation.enable` | bool | `false` |
//! | `http.web_server_imitation.type` | string | `apache` |
//! | `admin_ui.base_path` | string | `/ui` |
//!
//! ## Example
//!
//! ```yaml
//! http:
//!   allow_reverse_proxy: false
//!   web_server_imitation:
//!     enable: true
//!     type: nginx
//! admin_ui:
//!   base_path: /ui
//! ```

use anyhow::Context;
use arc_swap::ArcSwap;
use serde::Serialize;
use serde_yaml::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Trust the client-asserted `X-Forwarded-For` address
pub const KEY_ALLOW_REVERSE_PROXY: &str = "http.allow_reverse_proxy";
/// Answer non-permitted origins with a canned web server 404
pub const KEY_IMITATION_ENABLE: &str = "http.web_server_imitation.enable";
/// Which web server to imitate (`apache`, `iis`, `nginx`)
pub const KEY_IMITATION_TYPE: &str = "http.web_server_imitation.type";
/// URL prefix under which the admin UI is mounted
pub const KEY_BASE_PATH: &str = "admin_ui.base_path";

/// Base path used when the config store has none
pub const DEFAULT_BASE_PATH: &str = "/ui";
/// Imitation type used when the config store has none
pub const DEFAULT_IMITATION_TYPE: &str = "apache";

/// Read-only lookup of configuration values by dotted key.
pub trait ConfigStore: Send + Sync {
    /// String value at `key`, if present and scalar
    fn get_str(&self, key: &str) -> Option<String>;

    /// Boolean value at `key`, if present and boolean-like
    fn get_bool(&self, key: &str) -> Option<bool>;
}

/// The configuration values one dispatch consults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSnapshot {
    /// Use `X-Forwarded-For` instead of the transport address
    pub trust_reverse_proxy: bool,
    /// Imitate a web server when denying an origin
    pub impersonation_enabled: bool,
    /// Imitation type as configured (not normalised)
    pub impersonation_type: String,
    /// Admin UI base path, without trailing slash
    pub base_path: String,
}

impl Default for ConfigSnapshot {
    fn default() -> Self {
        Self {
            trust_reverse_proxy: false,
            impersonation_enabled: false,
            impersonation_type: DEFAULT_IMITATION_TYPE.to_string(),
            base_path: DEFAULT_BASE_PATH.to_string(),
        }
    }
}

impl ConfigSnapshot {
    /// Read the current values from `store`, falling back to defaults for missing keys.
    #[must_use]
    pub fn from_store(store: &dyn ConfigStore) -> Self {
        let defaults = Self::default();
        let base_path = store
            .get_str(KEY_BASE_PATH)
            .map(|p| p.trim_end_matches('/').to_string())
            .unwrap_or(defaults.base_path);
        Self {
            trust_reverse_proxy: store
                .get_bool(KEY_ALLOW_REVERSE_PROXY)
                .unwrap_or(defaults.trust_reverse_proxy),
            impersonation_enabled: store
                .get_bool(KEY_IMITATION_ENABLE)
                .unwrap_or(defaults.impersonation_enabled),
            impersonation_type: store
                .get_str(KEY_IMITATION_TYPE)
                .unwrap_or(defaults.impersonation_type),
            base_path,
        }
    }
}

/// YAML-backed [`ConfigStore`].
///
/// The parsed document lives behind an [`ArcSwap`], so `reload` never blocks
/// readers and every lookup sees one complete document.
pub struct YamlConfigStore {
    doc: ArcSwap<Value>,
    path: Option<PathBuf>,
}

impl YamlConfigStore {
    /// Parse a store from YAML text. Not associated with any file.
    pub fn from_yaml_str(content: &str) -> anyhow::Result<Self> {
        let doc = parse_document(content).context("invalid configuration YAML")?;
        Ok(Self {
            doc: ArcSwap::from_pointee(doc),
            path: None,
        })
    }

    /// Load a store from a YAML file. The path is remembered for [`reload`](Self::reload).
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let doc = read_document(&path)?;
        info!(config_path = %path.display(), "Configuration loaded");
        Ok(Self {
            doc: ArcSwap::from_pointee(doc),
            path: Some(path),
        })
    }

    /// An empty store; every lookup falls back to defaults.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            doc: ArcSwap::from_pointee(Value::Null),
            path: None,
        }
    }

    /// File this store was loaded from, if any.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Re-read the backing file and swap the document in.
    ///
    /// On error the previous document stays active.
    pub fn reload(&self) -> anyhow::Result<()> {
        let path = self
            .path
            .as_ref()
            .context("configuration store has no backing file")?;
        let doc = read_document(path)?;
        self.doc.store(Arc::new(doc));
        info!(config_path = %path.display(), "Configuration reloaded");
        Ok(())
    }

    /// Replace the document with new YAML text.
    pub fn replace_yaml(&self, content: &str) -> anyhow::Result<()> {
        let doc = parse_document(content).context("invalid configuration YAML")?;
        self.doc.store(Arc::new(doc));
        Ok(())
    }

    fn lookup(&self, key: &str) -> Option<Value> {
        let doc = self.doc.load();
        let mut current: &Value = &doc;
        for segment in key.split('.') {
            current = current.as_mapping()?.get(segment)?;
        }
        debug!(key = key, "Configuration lookup hit");
        Some(current.clone())
    }
}

fn read_document(path: &Path) -> anyhow::Result<Value> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read configuration file {}", path.display()))?;
    parse_document(&content)
        .with_context(|| format!("invalid configuration YAML in {}", path.display()))
}

/// The root must be a mapping. An empty or truncated file parses as `Null`
/// and would otherwise silently reset every key to its default.
fn parse_document(content: &str) -> anyhow::Result<Value> {
    let doc: Value = serde_yaml::from_str(content)?;
    if !doc.is_mapping() {
        anyhow::bail!("configuration root must be a mapping");
    }
    Ok(doc)
}

impl ConfigStore for YamlConfigStore {
    fn get_str(&self, key: &str) -> Option<String> {
        match self.lookup(key)? {
            Value::String(s) => Some(s),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        match self.lookup(key)? {
            Value::Bool(b) => Some(b),
            Value::String(s) => match s.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => Some(true),
                "false" | "no" | "off" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }
}
