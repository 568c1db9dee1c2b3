//! Middleware collaborator contracts.
//!
//! Two kinds of middleware sit between the compiler and the live-reload
//! server: the dev middleware (an in-memory virtual filesystem plus build
//! trigger) and the hot-reload middleware (pushes incremental module
//! updates to connected clients). Both are opaque beyond the small
//! surface below.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::compiler::BuildStats;

/// Hook fired on every valid build, starting with the first one.
pub type ValidHook = Box<dyn FnMut(&BuildStats) + Send>;

/// Log verbosity for middleware and the live-reload server.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    #[default]
    Silent,
    Info,
    Debug,
}

/// Options for constructing the dev middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DevMiddlewareOptions {
    /// Suppress the middleware's own stats output.
    pub suppress_stats: bool,
    /// Public path the virtual output is served under.
    pub public_path: String,
    pub log_level: LogLevel,
    pub log_time: bool,
}

/// Options for constructing the hot-reload middleware.
///
/// `path` is the HMR endpoint; the client assumes a prefixed public path,
/// so the server side uses the same one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HotMiddlewareOptions {
    pub path: String,
    pub log: bool,
}

/// Dev middleware: in-memory build output plus rebuild control.
pub trait DevMiddleware: Send + Sync {
    /// Register a hook that fires once per valid build, including the
    /// first and every subsequent one.
    fn wait_until_valid(&self, hook: ValidHook);

    /// Force a recompilation.
    fn invalidate(&self);

    /// Shut the middleware down and release its compiler watcher.
    fn close(&self);

    /// In-memory lookup of build output for a URL path, as
    /// `(content, content-type)`. Used by the live-reload server before
    /// falling back to the proxied backend.
    fn serve(&self, _path: &str) -> Option<(Vec<u8>, String)> {
        None
    }
}

/// Hot-reload middleware. Opaque after construction; it may expose its
/// client runtime through `serve`.
pub trait HotMiddleware: Send + Sync {
    fn serve(&self, _path: &str) -> Option<(Vec<u8>, String)> {
        None
    }
}

/// A middleware as mounted on the live-reload server.
#[derive(Clone)]
pub enum MiddlewareHandle {
    Dev(Arc<dyn DevMiddleware>),
    Hot(Arc<dyn HotMiddleware>),
}

impl MiddlewareHandle {
    /// Serve a URL path from whichever middleware this wraps.
    pub fn serve(&self, path: &str) -> Option<(Vec<u8>, String)> {
        match self {
            MiddlewareHandle::Dev(middleware) => middleware.serve(path),
            MiddlewareHandle::Hot(middleware) => middleware.serve(path),
        }
    }
}

impl std::fmt::Debug for MiddlewareHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MiddlewareHandle::Dev(_) => f.write_str("MiddlewareHandle::Dev"),
            MiddlewareHandle::Hot(_) => f.write_str("MiddlewareHandle::Hot"),
        }
    }
}
