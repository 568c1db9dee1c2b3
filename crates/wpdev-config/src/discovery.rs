//! File-based config discovery.
//!
//! Finds and loads the two configuration files from a project root:
//! `wpdev.project.toml` (tracked) and `wpdev.server.toml` (per-machine).

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{ConfigError, Result};
use crate::project::ProjectConfig;
use crate::server::ServerConfig;

pub const PROJECT_FILE: &str = "wpdev.project.toml";
pub const SERVER_FILE: &str = "wpdev.server.toml";

/// Configuration discovery rooted at a project directory.
///
/// # Example
///
/// ```no_run
/// use wpdev_config::ConfigDiscovery;
///
/// let discovery = ConfigDiscovery::new(".");
/// let (project, server) = discovery.load().unwrap();
/// ```
pub struct ConfigDiscovery {
    root: PathBuf,
}

impl ConfigDiscovery {
    /// Create a discovery with a root directory.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Path to the project config, if present.
    pub fn find_project(&self) -> Option<PathBuf> {
        let path = self.root.join(PROJECT_FILE);
        path.exists().then_some(path)
    }

    /// Path to the server config, if present.
    pub fn find_server(&self) -> Option<PathBuf> {
        let path = self.root.join(SERVER_FILE);
        path.exists().then_some(path)
    }

    /// Load and validate both configs.
    ///
    /// # Errors
    ///
    /// Returns `ProjectNotFound`/`ServerNotFound` when a file is missing,
    /// `InvalidToml` for syntax errors, and validation errors from the
    /// config types themselves.
    pub fn load(&self) -> Result<(ProjectConfig, ServerConfig)> {
        let project_path = self
            .find_project()
            .ok_or_else(|| ConfigError::ProjectNotFound(self.root.clone()))?;
        let server_path = self
            .find_server()
            .ok_or_else(|| ConfigError::ServerNotFound(self.root.clone()))?;

        let project: ProjectConfig = self.load_from(&project_path)?;
        let server: ServerConfig = self.load_from(&server_path)?;

        project.validate()?;
        server.validate()?;

        tracing::debug!(
            slug = %project.slug,
            proxy = %server.proxy,
            "loaded configuration"
        );

        Ok((project, server))
    }

    fn load_from<T: serde::de::DeserializeOwned>(&self, path: &Path) -> Result<T> {
        let content = fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ConfigError::InvalidToml {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    const PROJECT_TOML: &str = r#"
        slug = "my-theme"
        kind = "theme"

        [[entries]]
        name = "app"
        paths = ["src/index.js"]
    "#;

    const SERVER_TOML: &str = r#"proxy = "http://localhost:8080""#;

    #[test]
    fn loads_both_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), PROJECT_FILE, PROJECT_TOML);
        write(dir.path(), SERVER_FILE, SERVER_TOML);

        let (project, server) = ConfigDiscovery::new(dir.path()).load().unwrap();
        assert_eq!(project.slug, "my-theme");
        assert_eq!(server.proxy, "http://localhost:8080");
    }

    #[test]
    fn missing_project_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), SERVER_FILE, SERVER_TOML);

        let err = ConfigDiscovery::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::ProjectNotFound(_)));
    }

    #[test]
    fn missing_server_file() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), PROJECT_FILE, PROJECT_TOML);

        let err = ConfigDiscovery::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::ServerNotFound(_)));
    }

    #[test]
    fn invalid_toml_reports_path() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), PROJECT_FILE, "slug = [broken");
        write(dir.path(), SERVER_FILE, SERVER_TOML);

        let err = ConfigDiscovery::new(dir.path()).load().unwrap_err();
        match err {
            ConfigError::InvalidToml { path, .. } => {
                assert!(path.ends_with(PROJECT_FILE));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn invalid_config_fails_validation() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            PROJECT_FILE,
            r#"
            slug = "my-theme"
            kind = "theme"
            entries = []
            "#,
        );
        write(dir.path(), SERVER_FILE, SERVER_TOML);

        let err = ConfigDiscovery::new(dir.path()).load().unwrap_err();
        assert!(matches!(err, ConfigError::NoEntries));
    }
}
