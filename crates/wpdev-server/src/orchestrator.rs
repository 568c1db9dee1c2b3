//! The development server orchestrator.
//!
//! Binds a compiler's lifecycle events to a live-reload/proxy server and
//! to a caller-supplied callback set, managing a single serve/stop
//! lifecycle. All registration happens synchronously inside `serve()`;
//! compilation and serving proceed on the collaborators' own event loops
//! and are observed only through the callbacks.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use wpdev_config::{ProjectConfig, ServerConfig};

use crate::compiler::{BuildMessages, BuildStats, Compiler, CompilerTargets};
use crate::error::{Result, ServerError};
use crate::middleware::{
    DevMiddleware, DevMiddlewareOptions, HotMiddlewareOptions, LogLevel, MiddlewareHandle,
};
use crate::net;
use crate::reload::{ReloadOptions, ReloadServer};
use crate::targets;
use crate::toolchain::{BrowserLauncher, SystemBrowser, Toolchain};

/// Caller-supplied callback set: the orchestrator's outbound interface.
///
/// All seven callbacks are mandatory and fire-and-forget; return values
/// are never inspected. They are invoked from the compiler's and the
/// live-reload server's threads.
pub struct ServeCallbacks {
    /// A compile started.
    pub invalid: Box<dyn FnMut() + Send>,
    /// A compile finished with zero errors and zero warnings.
    pub done: Box<dyn FnMut(&BuildStats) + Send>,
    /// The first successful compile completed. Fires exactly once.
    pub first_compile: Box<dyn FnMut(&BuildStats) + Send>,
    /// A compile finished with errors.
    pub on_error: Box<dyn FnMut(&BuildMessages) + Send>,
    /// A compile finished with warnings only.
    pub on_warn: Box<dyn FnMut(&BuildMessages) + Send>,
    /// A watched file changed; a full reload follows.
    pub on_change: Box<dyn FnMut(&Path) + Send>,
    /// A compile finished, regardless of outcome. Telemetry channel.
    pub on_emit: Box<dyn FnMut(&BuildStats) + Send>,
}

/// Development server orchestrator.
///
/// Owns the lifecycle of one compiler instance and one live-reload/proxy
/// server instance. State machine:
/// `Idle --serve()--> Serving --stop()--> Idle`, with
/// `refresh()` as a self-loop on Serving; every other transition is a
/// rejected precondition, not a silent no-op.
pub struct DevServer<T: Toolchain> {
    project: ProjectConfig,
    server: ServerConfig,
    cwd: PathBuf,
    toolchain: T,
    targets: CompilerTargets,
    callbacks: Arc<Mutex<ServeCallbacks>>,
    launcher: Arc<dyn BrowserLauncher>,

    serving: bool,
    first_compile_done: Arc<AtomicBool>,
    browser_opened: Arc<AtomicBool>,

    compiler: Option<Box<dyn Compiler>>,
    reload_server: Option<Box<dyn ReloadServer>>,
    dev_middlewares: Vec<Arc<dyn DevMiddleware>>,
}

impl<T: Toolchain> DevServer<T> {
    /// Create an orchestrator from pre-validated configuration.
    ///
    /// If the server config carries no host, the first local network
    /// address is resolved and assigned once, here. The compiler targets
    /// (single vs multi) are also resolved once, here.
    pub fn new(
        project: ProjectConfig,
        mut server: ServerConfig,
        cwd: impl Into<PathBuf>,
        callbacks: ServeCallbacks,
        toolchain: T,
    ) -> Self {
        let cwd = cwd.into();
        if server.host.is_none() {
            server.host = net::local_network_host();
            if let Some(host) = &server.host {
                tracing::debug!(%host, "resolved network host");
            }
        }
        let targets = targets::compiler_targets(&project, &server, &cwd);

        Self {
            project,
            server,
            cwd,
            toolchain,
            targets,
            callbacks: Arc::new(Mutex::new(callbacks)),
            launcher: Arc::new(SystemBrowser),
            serving: false,
            first_compile_done: Arc::new(AtomicBool::new(false)),
            browser_opened: Arc::new(AtomicBool::new(false)),
            compiler: None,
            reload_server: None,
            dev_middlewares: Vec::new(),
        }
    }

    /// Replace the browser launcher. Tests use this to observe the
    /// at-most-once open behaviour.
    pub fn with_launcher(mut self, launcher: Arc<dyn BrowserLauncher>) -> Self {
        self.launcher = launcher;
        self
    }

    /// Whether the orchestrator is currently serving.
    pub fn is_serving(&self) -> bool {
        self.serving
    }

    /// The server configuration, with the host resolved.
    pub fn server_config(&self) -> &ServerConfig {
        &self.server
    }

    /// Start serving: construct the compiler, tap its lifecycle hooks,
    /// mount dev and hot middleware on the live-reload server, and start
    /// watching the project's reload globs.
    ///
    /// Returns as soon as all registrations succeed; builds happen on the
    /// collaborators' own loops afterwards.
    ///
    /// # Errors
    ///
    /// `ServerError::AlreadyServing` when already serving; collaborator
    /// failures propagate unmodified.
    pub fn serve(&mut self) -> Result<()> {
        if self.serving {
            return Err(ServerError::AlreadyServing);
        }

        let mut compiler = self.toolchain.compiler(&self.targets)?;
        self.add_hooks(compiler.as_mut());

        let dev_middleware = self.toolchain.dev_middleware(
            compiler.as_mut(),
            DevMiddlewareOptions {
                suppress_stats: true,
                public_path: self.project.public_path(),
                log_level: LogLevel::Silent,
                log_time: false,
            },
        )?;
        let hot_middleware = self.toolchain.hot_middleware(
            compiler.as_mut(),
            HotMiddlewareOptions {
                path: targets::hmr_path(&self.project),
                log: false,
            },
        )?;

        // First valid build: fire first_compile once, then the one-time
        // browser open. The hook keeps firing on later valid builds; the
        // flags make both effects at-most-once.
        {
            let callbacks = Arc::clone(&self.callbacks);
            let first = Arc::clone(&self.first_compile_done);
            let opened = Arc::clone(&self.browser_opened);
            let launcher = Arc::clone(&self.launcher);
            let open = self.server.open;
            let url = self.server_url();
            dev_middleware.wait_until_valid(Box::new(move |stats| {
                if !first.swap(true, Ordering::SeqCst) {
                    (callbacks.lock().first_compile)(stats);
                }
                if open && !opened.swap(true, Ordering::SeqCst) {
                    launcher.open(&url);
                }
            }));
        }

        let mut reload_server = self.toolchain.reload_server()?;
        let options = ReloadOptions {
            log_level: LogLevel::Silent,
            host: self.server.host.clone(),
            port: self.server.port,
            ui_port: self.server.ui.map(|ui| ui.port),
            proxy: self.server.proxy.clone(),
            open: false, // the orchestrator opens the browser itself
            notify: self.server.notify,
            ..ReloadOptions::default()
        };
        reload_server.init(
            options.merged(&self.server.overrides),
            vec![
                MiddlewareHandle::Dev(Arc::clone(&dev_middleware)),
                MiddlewareHandle::Hot(hot_middleware),
            ],
        )?;

        // Watched files (PHP templates and the like) force a full reload.
        // Config changes are deliberately not watched; those need a
        // restart anyway.
        let reloader = reload_server.reloader();
        for pattern in &self.project.watch {
            let callbacks = Arc::clone(&self.callbacks);
            let reloader = Arc::clone(&reloader);
            reload_server.watch(
                pattern,
                Box::new(move |file| {
                    (callbacks.lock().on_change)(file);
                    reloader.reload();
                }),
            )?;
        }

        self.compiler = Some(compiler);
        self.reload_server = Some(reload_server);
        self.dev_middlewares = vec![dev_middleware];
        self.serving = true;

        tracing::info!(url = %self.server_url(), "development server serving");
        Ok(())
    }

    /// Stop the server: exit the live-reload server and close every dev
    /// middleware registered by the most recent `serve()`.
    ///
    /// # Errors
    ///
    /// `ServerError::NotServing` when not serving.
    pub fn stop(&mut self) -> Result<()> {
        if !self.serving {
            return Err(ServerError::NotServing);
        }
        if let Some(mut reload_server) = self.reload_server.take() {
            reload_server.exit();
        }
        for middleware in self.dev_middlewares.drain(..) {
            middleware.close();
        }
        self.compiler = None;
        self.serving = false;

        tracing::info!("development server stopped");
        Ok(())
    }

    /// Force a recompilation of every dev middleware. The live-reload
    /// server is left untouched.
    ///
    /// # Errors
    ///
    /// `ServerError::NotServing` when not serving.
    pub fn refresh(&mut self) -> Result<()> {
        if !self.serving {
            return Err(ServerError::NotServing);
        }
        for middleware in &self.dev_middlewares {
            middleware.invalidate();
        }
        Ok(())
    }

    /// URL the dev server is reachable on, ending in the public path.
    pub fn server_url(&self) -> String {
        format!(
            "http://{}:{}{}",
            self.host_or_localhost(),
            self.server.port,
            self.project.public_path()
        )
    }

    /// URL of the live-reload server UI, `None` when the UI is disabled.
    pub fn ui_url(&self) -> Option<String> {
        self.server
            .ui
            .map(|ui| format!("http://{}:{}", self.host_or_localhost(), ui.port))
    }

    fn host_or_localhost(&self) -> &str {
        self.server.host.as_deref().unwrap_or("localhost")
    }

    /// Tap the compiler's `done` and `invalid` hooks.
    ///
    /// Both deliveries are suppressed until the first successful compile
    /// has been observed through the dev middleware's valid signal.
    fn add_hooks(&self, compiler: &mut dyn Compiler) {
        {
            let callbacks = Arc::clone(&self.callbacks);
            let first = Arc::clone(&self.first_compile_done);
            compiler.on_done(Box::new(move |stats| {
                if !first.load(Ordering::SeqCst) {
                    return;
                }
                let messages = stats.messages();
                let mut callbacks = callbacks.lock();
                if messages.is_clean() {
                    (callbacks.done)(stats);
                }
                if !messages.errors.is_empty() {
                    (callbacks.on_error)(&messages);
                } else if !messages.warnings.is_empty() {
                    (callbacks.on_warn)(&messages);
                }
                (callbacks.on_emit)(stats);
            }));
        }
        {
            let callbacks = Arc::clone(&self.callbacks);
            let first = Arc::clone(&self.first_compile_done);
            compiler.on_invalid(Box::new(move || {
                if !first.load(Ordering::SeqCst) {
                    return;
                }
                (callbacks.lock().invalid)();
            }));
        }
    }
}

impl<T: Toolchain> std::fmt::Debug for DevServer<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevServer")
            .field("slug", &self.project.slug)
            .field("serving", &self.serving)
            .field("targets", &self.targets.len())
            .finish_non_exhaustive()
    }
}
