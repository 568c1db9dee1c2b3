//! Compiler-target generation from the two configuration files.
//!
//! One target is produced per entry point; a single entry yields a
//! single-target compiler, several yield a multi-target one. The payload
//! is an opaque JSON object the toolchain's compiler understands; the
//! orchestrator never looks inside.

use std::path::Path;

use serde_json::json;
use wpdev_config::{ProjectConfig, ServerConfig};

use crate::compiler::CompilerTargets;

/// Endpoint the hot-reload middleware serves module updates on. The
/// client runtime assumes the public-path prefix, so the server side
/// mounts it under the same prefix.
pub const HMR_PATH: &str = "/__wpdev_hmr";

/// Full HMR endpoint for a project, under its public path.
pub fn hmr_path(project: &ProjectConfig) -> String {
    format!("{}{}", project.public_path().trim_end_matches('/'), HMR_PATH)
}

/// Build the compiler targets for a project.
pub fn compiler_targets(
    project: &ProjectConfig,
    server: &ServerConfig,
    cwd: &Path,
) -> CompilerTargets {
    let public_path = project.public_path();
    let targets = project
        .entries
        .iter()
        .map(|entry| {
            json!({
                "name": entry.name,
                "entry": entry.paths,
                "context": cwd.display().to_string(),
                "output": {
                    "path": cwd.join(&project.out_dir).display().to_string(),
                    "public_path": public_path,
                },
                "hmr_path": hmr_path(project),
                "dev_server_port": server.port,
            })
        })
        .collect();

    CompilerTargets::from_targets(targets)
}
