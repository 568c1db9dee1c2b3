//! Configuration layer for the wpdev development server.
//!
//! Two files describe a project:
//!
//! - `wpdev.project.toml`: what to build (entries, slug, watch globs).
//!   Tracked in version control.
//! - `wpdev.server.toml`: how to serve it locally (proxy target, port,
//!   live-reload knobs). Differs per machine, kept out of version control.
//!
//! Both are validated on load; everything downstream may assume a
//! well-formed configuration.

pub mod discovery;
pub mod error;
pub mod project;
pub mod server;

pub use discovery::{ConfigDiscovery, PROJECT_FILE, SERVER_FILE};
pub use error::{ConfigError, Result};
pub use project::{EntryPoint, ProjectConfig, ProjectKind};
pub use server::{ServerConfig, UiConfig};
