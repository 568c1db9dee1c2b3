//! Development server orchestration for WordPress front-end assets.
//!
//! The centrepiece is [`DevServer`]: it owns one compiler instance and
//! one live-reload/proxy server instance, wires the compiler's lifecycle
//! events to a caller-supplied callback set, and exposes a
//! serve/stop/refresh lifecycle. The heavy machinery (dependency-graph
//! resolution, incremental compilation, the HMR protocol) belongs to
//! the collaborators behind the [`Toolchain`] seam; this crate only
//! orchestrates.
//!
//! # Modules
//!
//! - [`orchestrator`] - the [`DevServer`] lifecycle
//! - [`compiler`], [`middleware`], [`reload`], [`toolchain`] - collaborator contracts
//! - [`sync`] - built-in live-reload/proxy server (axum + SSE + notify)
//! - [`targets`] - compiler-target generation from configuration
//! - [`error`] - error types
//! - [`logger`] - tracing subscriber setup for embedders
//!
//! # Example
//!
//! ```no_run
//! use wpdev_config::ConfigDiscovery;
//! use wpdev_server::{DevServer, ServeCallbacks, Toolchain};
//!
//! # fn run(toolchain: impl Toolchain) -> wpdev_server::Result<()> {
//! let (project, server) = ConfigDiscovery::new(".").load().map_err(|e| {
//!     wpdev_server::ServerError::Options(e.to_string())
//! })?;
//! let callbacks = ServeCallbacks {
//!     invalid: Box::new(|| println!("compiling…")),
//!     done: Box::new(|_| println!("compiled successfully")),
//!     first_compile: Box::new(|_| {}),
//!     on_error: Box::new(|m| eprintln!("{:?}", m.errors)),
//!     on_warn: Box::new(|m| eprintln!("{:?}", m.warnings)),
//!     on_change: Box::new(|f| println!("changed: {}", f.display())),
//!     on_emit: Box::new(|_| {}),
//! };
//! let mut dev = DevServer::new(project, server, ".", callbacks, toolchain);
//! dev.serve()?;
//! # Ok(())
//! # }
//! ```

pub mod compiler;
pub mod error;
pub mod logger;
pub mod middleware;
pub mod net;
pub mod orchestrator;
pub mod reload;
pub mod sync;
pub mod targets;
pub mod toolchain;

pub use compiler::{BuildMessages, BuildStats, Compiler, CompilerTargets, DoneHook, InvalidHook};
pub use error::{Result, ServerError};
pub use middleware::{
    DevMiddleware, DevMiddlewareOptions, HotMiddleware, HotMiddlewareOptions, LogLevel,
    MiddlewareHandle, ValidHook,
};
pub use orchestrator::{DevServer, ServeCallbacks};
pub use reload::{ChangeHook, ReloadOptions, ReloadServer, Reloader, API_PASSTHROUGH};
pub use sync::SyncReloadServer;
pub use toolchain::{BrowserLauncher, SystemBrowser, Toolchain};
