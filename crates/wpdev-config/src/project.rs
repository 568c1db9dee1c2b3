//! Project configuration: what to build and where it lives inside WordPress.
//!
//! The project config is declared by the user, tracked in version control,
//! and read-only to the rest of the system. One compiler target is produced
//! per entry point.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Whether the project is a theme or a plugin.
///
/// Decides the `wp-content` subdirectory the built assets are served from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectKind {
    Theme,
    Plugin,
}

impl ProjectKind {
    /// Directory name under `wp-content` for this kind.
    pub fn content_dir(self) -> &'static str {
        match self {
            ProjectKind::Theme => "themes",
            ProjectKind::Plugin => "plugins",
        }
    }
}

/// A single named entry point.
///
/// Each entry becomes one compiler target. `paths` are source files relative
/// to the project root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryPoint {
    /// Target name, used for output chunk naming.
    pub name: String,
    /// Source files for this entry.
    pub paths: Vec<String>,
}

/// User-declared build configuration.
///
/// Immutable after load. The orchestrator only reads it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Theme/plugin directory name under `wp-content/<themes|plugins>/`.
    pub slug: String,

    /// Theme or plugin.
    pub kind: ProjectKind,

    /// Entry points, one compiler target each.
    pub entries: Vec<EntryPoint>,

    /// Output directory relative to the project root.
    #[serde(default = "default_out_dir")]
    pub out_dir: String,

    /// Glob patterns whose changes force a full browser reload
    /// (PHP templates, typically). Empty disables watching.
    #[serde(default)]
    pub watch: Vec<String>,
}

fn default_out_dir() -> String {
    "dist".to_string()
}

impl ProjectConfig {
    /// Public path the built assets are served from, with leading and
    /// trailing slashes: `/wp-content/<themes|plugins>/<slug>/<out_dir>/`.
    pub fn public_path(&self) -> String {
        format!(
            "/wp-content/{}/{}/{}/",
            self.kind.content_dir(),
            self.slug,
            self.out_dir.trim_matches('/')
        )
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error for an empty slug, no entries, or an entry without
    /// source paths.
    pub fn validate(&self) -> Result<()> {
        if self.slug.is_empty() {
            return Err(ConfigError::MissingField {
                field: "slug".to_string(),
                hint: "set it to the theme/plugin directory name".to_string(),
            });
        }
        if self.entries.is_empty() {
            return Err(ConfigError::NoEntries);
        }
        for entry in &self.entries {
            if entry.paths.is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "entries".to_string(),
                    value: entry.name.clone(),
                    hint: "every entry needs at least one source path".to_string(),
                });
            }
        }
        Ok(())
    }
}
