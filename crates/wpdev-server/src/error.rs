//! Error types for the development server.
//!
//! The orchestrator's own taxonomy is deliberately small: lifecycle
//! precondition violations (`AlreadyServing`, `NotServing`) plus the
//! infrastructure failures the built-in live-reload server can hit.
//! Compilation errors and warnings are never errors here; they are
//! structured data delivered through the callback channel.

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T, E = ServerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ServerError {
    /// `serve()` was called while the server is already running.
    #[error("cannot serve while the server is already running\n\nHint: call stop() first")]
    AlreadyServing,

    /// `stop()` or `refresh()` was called while the server is not running.
    #[error("the server is not running\n\nHint: call serve() first")]
    NotServing,

    /// The live-reload server could not bind its listen address.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// Watch root does not exist.
    #[error("watch root not found: {}", .0.display())]
    WatchRootNotFound(PathBuf),

    /// File watcher errors from the underlying notifier.
    #[error("file watcher error: {0}")]
    Watch(#[from] notify::Error),

    /// A user-supplied watch glob failed to parse.
    #[error("invalid watch pattern '{pattern}': {message}")]
    Pattern { pattern: String, message: String },

    /// The merged live-reload server options could not be interpreted.
    #[error("invalid reload server options: {0}")]
    Options(String),

    /// I/O errors from the surrounding plumbing.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_carry_hints() {
        assert!(ServerError::AlreadyServing.to_string().contains("stop()"));
        assert!(ServerError::NotServing.to_string().contains("serve()"));
    }

    #[test]
    fn watch_error_converts() {
        let err: ServerError = notify::Error::generic("boom").into();
        assert!(matches!(err, ServerError::Watch(_)));
    }
}
