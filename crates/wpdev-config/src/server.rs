//! Development server configuration.
//!
//! Per-machine settings: where the existing WordPress backend runs, which
//! port to serve on, and live-reload server knobs. Unlike the project
//! config this file is expected to stay out of version control.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Live-reload server UI settings. Absent means the UI is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UiConfig {
    /// Port the UI listens on.
    #[serde(default = "default_ui_port")]
    pub port: u16,
}

fn default_ui_port() -> u16 {
    8080
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            port: default_ui_port(),
        }
    }
}

/// User-declared server settings.
///
/// Immutable after load except for `host`: when unset, the orchestrator
/// resolves it once at construction from the local network interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Network host to serve on. `None` lets the orchestrator pick the
    /// first local network address, falling back to localhost.
    #[serde(default)]
    pub host: Option<String>,

    /// Port the dev server listens on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Origin of the existing WordPress backend to proxy,
    /// e.g. `http://localhost:8080`.
    pub proxy: String,

    /// Live-reload server UI. `None` disables it.
    #[serde(default)]
    pub ui: Option<UiConfig>,

    /// Open the browser after the first successful compile.
    #[serde(default = "default_true")]
    pub open: bool,

    /// Show in-browser connect/reload notifications.
    #[serde(default = "default_true")]
    pub notify: bool,

    /// Raw overrides merged shallowly over the live-reload server's
    /// default options. User keys win.
    #[serde(default)]
    pub overrides: serde_json::Map<String, serde_json::Value>,
}

fn default_port() -> u16 {
    3000
}

fn default_true() -> bool {
    true
}

impl ServerConfig {
    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error when the proxy origin is empty or lacks a scheme.
    pub fn validate(&self) -> Result<()> {
        if self.proxy.is_empty() {
            return Err(ConfigError::MissingField {
                field: "proxy".to_string(),
                hint: "set it to the origin of your local WordPress install".to_string(),
            });
        }
        if !self.proxy.starts_with("http://") && !self.proxy.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                field: "proxy".to_string(),
                value: self.proxy.clone(),
                hint: "expected an http(s) origin like http://localhost:8080".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let config: ServerConfig = toml::from_str(r#"proxy = "http://localhost:8080""#).unwrap();
        assert_eq!(config.port, 3000);
        assert!(config.host.is_none());
        assert!(config.ui.is_none());
        assert!(config.open);
        assert!(config.notify);
        assert!(config.overrides.is_empty());
    }

    #[test]
    fn deserializes_ui_and_overrides() {
        let config: ServerConfig = toml::from_str(
            r#"
            proxy = "http://wp.test"
            port = 4000

            [ui]
            port = 4001

            [overrides]
            ghostMode = false
            "#,
        )
        .unwrap();
        assert_eq!(config.ui, Some(UiConfig { port: 4001 }));
        assert_eq!(
            config.overrides.get("ghostMode"),
            Some(&serde_json::Value::Bool(false))
        );
    }

    #[test]
    fn validate_rejects_empty_proxy() {
        let config = ServerConfig {
            host: None,
            port: 3000,
            proxy: String::new(),
            ui: None,
            open: true,
            notify: true,
            overrides: serde_json::Map::new(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingField { .. })
        ));
    }

    #[test]
    fn validate_rejects_schemeless_proxy() {
        let config = ServerConfig {
            host: None,
            port: 3000,
            proxy: "localhost:8080".to_string(),
            ui: None,
            open: true,
            notify: true,
            overrides: serde_json::Map::new(),
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { .. })
        ));
    }
}
