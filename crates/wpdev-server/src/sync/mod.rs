//! Built-in live-reload/proxy server implementation.
//!
//! Implements the [`crate::reload::ReloadServer`] contract with an axum
//! server (SSE push, snippet injection, backend proxying) and
//! notify-based glob watching.

pub mod server;
pub mod watcher;

pub use server::{ReloadBroadcaster, SyncEvent, SyncReloadServer, RELOAD_SCRIPT_PATH, SSE_PATH};
pub use watcher::GlobWatcher;
