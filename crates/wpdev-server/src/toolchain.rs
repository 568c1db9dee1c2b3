//! Toolchain factory seam and the browser launcher.
//!
//! The orchestrator never constructs its collaborators directly; a
//! `Toolchain` produces them from configuration. Tests substitute mocks,
//! embedders wire in their bundler of choice.

use std::sync::Arc;

use crate::compiler::{Compiler, CompilerTargets};
use crate::error::Result;
use crate::middleware::{DevMiddleware, DevMiddlewareOptions, HotMiddleware, HotMiddlewareOptions};
use crate::reload::ReloadServer;

/// Factory for the orchestrator's collaborators.
pub trait Toolchain: Send {
    /// Construct a compiler for the resolved targets (single or multi).
    fn compiler(&mut self, targets: &CompilerTargets) -> Result<Box<dyn Compiler>>;

    /// Construct the dev middleware against a compiler.
    fn dev_middleware(
        &mut self,
        compiler: &mut dyn Compiler,
        options: DevMiddlewareOptions,
    ) -> Result<Arc<dyn DevMiddleware>>;

    /// Construct the hot-reload middleware against a compiler.
    fn hot_middleware(
        &mut self,
        compiler: &mut dyn Compiler,
        options: HotMiddlewareOptions,
    ) -> Result<Arc<dyn HotMiddleware>>;

    /// Construct a fresh live-reload/proxy server.
    fn reload_server(&mut self) -> Result<Box<dyn ReloadServer>>;
}

/// Opens a URL in the user's browser. Fire and forget; nothing depends
/// on the outcome.
pub trait BrowserLauncher: Send + Sync {
    fn open(&self, url: &str);
}

/// Default launcher shelling out to the platform opener.
pub struct SystemBrowser;

impl BrowserLauncher for SystemBrowser {
    fn open(&self, url: &str) {
        use std::process::Command;

        let result = if cfg!(target_os = "macos") {
            Command::new("open").arg(url).spawn()
        } else if cfg!(target_os = "windows") {
            Command::new("cmd").args(["/C", "start", url]).spawn()
        } else {
            Command::new("xdg-open").arg(url).spawn()
        };

        match result {
            Ok(_) => tracing::info!(url, "opened browser"),
            Err(e) => tracing::warn!(url, error = %e, "failed to open browser"),
        }
    }
}
