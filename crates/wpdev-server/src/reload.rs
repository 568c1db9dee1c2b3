//! Live-reload/proxy server contract.
//!
//! The live-reload server proxies an existing WordPress backend, serves
//! the dev middleware's virtual output, and can force full-page reloads
//! of every connected client. The orchestrator drives it through this
//! trait; a built-in implementation lives in [`crate::sync`].

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{Result, ServerError};
use crate::middleware::{LogLevel, MiddlewareHandle};

/// Paths always passed through to the backend untouched: the WP REST API
/// and admin AJAX calls.
pub const API_PASSTHROUGH: [&str; 2] = ["/wp-json/**", "/wp-admin/admin-ajax.php"];

/// Hook fired for each filesystem change under a watched pattern.
pub type ChangeHook = Box<dyn FnMut(&Path) + Send>;

/// Handle for forcing a full reload of all connected clients.
pub trait Reloader: Send + Sync {
    fn reload(&self);
}

/// Options for initialising the live-reload server.
///
/// Serializes to a flat object so user overrides can be merged shallowly
/// over it, key by key. Unknown keys survive the merge and are left for
/// the implementation to interpret.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReloadOptions {
    pub log_level: LogLevel,
    pub host: Option<String>,
    pub port: u16,
    /// UI port; `None` disables the UI.
    pub ui_port: Option<u16>,
    /// Origin of the backend to proxy.
    pub proxy: String,
    /// The orchestrator opens the browser itself, so this stays false.
    pub open: bool,
    pub notify: bool,
    /// Patterns passed through to the backend without snippet handling.
    pub snippet_allow: Vec<String>,
}

impl Default for ReloadOptions {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Silent,
            host: None,
            port: 3000,
            ui_port: None,
            proxy: String::new(),
            open: false,
            notify: true,
            snippet_allow: API_PASSTHROUGH.iter().map(|p| (*p).to_string()).collect(),
        }
    }
}

impl ReloadOptions {
    /// Merge user overrides shallowly over these defaults. User keys win.
    pub fn merged(&self, overrides: &Map<String, Value>) -> Map<String, Value> {
        let mut base = match serde_json::to_value(self) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        for (key, value) in overrides {
            base.insert(key.clone(), value.clone());
        }
        base
    }

    /// Interpret a merged option object back into typed options.
    ///
    /// # Errors
    ///
    /// Returns `ServerError::Options` when a known key carries a value of
    /// the wrong shape. Unknown keys are ignored.
    pub fn from_merged(options: Map<String, Value>) -> Result<Self> {
        serde_json::from_value(Value::Object(options))
            .map_err(|e| ServerError::Options(e.to_string()))
    }
}

/// External live-reload/proxy server.
pub trait ReloadServer: Send {
    /// Start the server with merged options and the middlewares to mount.
    fn init(&mut self, options: Map<String, Value>, middlewares: Vec<MiddlewareHandle>)
        -> Result<()>;

    /// Watch a glob pattern; the handler fires per matching change.
    fn watch(&mut self, pattern: &str, handler: ChangeHook) -> Result<()>;

    /// Cloneable handle for forcing full reloads.
    fn reloader(&self) -> Arc<dyn Reloader>;

    /// Tear the server down. Watchers and client connections drop.
    fn exit(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn defaults_include_api_passthrough() {
        let options = ReloadOptions::default();
        assert_eq!(
            options.snippet_allow,
            vec!["/wp-json/**", "/wp-admin/admin-ajax.php"]
        );
        assert!(!options.open);
    }

    #[test]
    fn merge_lets_user_keys_win() {
        let options = ReloadOptions {
            port: 3000,
            notify: true,
            ..ReloadOptions::default()
        };
        let mut overrides = Map::new();
        overrides.insert("notify".to_string(), json!(false));
        overrides.insert("ghost_mode".to_string(), json!({"clicks": true}));

        let merged = options.merged(&overrides);
        assert_eq!(merged.get("notify"), Some(&json!(false)));
        assert_eq!(merged.get("port"), Some(&json!(3000)));
        // Unknown keys survive for the implementation to interpret.
        assert!(merged.contains_key("ghost_mode"));
    }

    #[test]
    fn merged_options_round_trip() {
        let options = ReloadOptions {
            proxy: "http://wp.test".to_string(),
            ..ReloadOptions::default()
        };
        let mut overrides = Map::new();
        overrides.insert("port".to_string(), json!(4000));

        let parsed = ReloadOptions::from_merged(options.merged(&overrides)).unwrap();
        assert_eq!(parsed.port, 4000);
        assert_eq!(parsed.proxy, "http://wp.test");
    }

    #[test]
    fn bad_override_shape_is_an_options_error() {
        let mut overrides = Map::new();
        overrides.insert("port".to_string(), json!("not-a-port"));

        let err =
            ReloadOptions::from_merged(ReloadOptions::default().merged(&overrides)).unwrap_err();
        assert!(matches!(err, ServerError::Options(_)));
    }
}
