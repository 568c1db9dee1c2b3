//! Built-in live-reload/proxy server.
//!
//! Rust has no browser-sync, so this implements the [`ReloadServer`]
//! contract directly: an axum server that proxies the existing WordPress
//! backend, serves middleware build output from memory, injects the
//! reload client into proxied HTML, and pushes full-reload events to
//! connected browsers over Server-Sent Events.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response, Sse},
    routing::get,
    Router,
};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio_stream::{wrappers::ReceiverStream, StreamExt};
use tower_http::cors::{Any, CorsLayer};

use crate::error::{Result, ServerError};
use crate::middleware::MiddlewareHandle;
use crate::reload::{ChangeHook, ReloadOptions, ReloadServer, Reloader};
use crate::sync::watcher::GlobWatcher;

/// SSE endpoint the reload client subscribes to.
pub const SSE_PATH: &str = "/__wpdev_sse__";

/// Route serving the embedded reload client script.
pub const RELOAD_SCRIPT_PATH: &str = "/__wpdev_reload__.js";

const RELOAD_SCRIPT: &str = include_str!("../../assets/reload-client.js");

/// Proxied bodies are buffered for snippet injection; cap them.
const MAX_BODY_BYTES: usize = 10 * 1024 * 1024;

/// Events pushed to connected clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SyncEvent {
    /// Full page reload requested.
    Reload,
    /// A client connected.
    ClientConnected { id: usize },
}

/// SSE client registry and broadcast channel.
///
/// Doubles as the [`Reloader`] handle the orchestrator hands to its
/// watch callbacks.
pub struct ReloadBroadcaster {
    clients: RwLock<HashMap<usize, mpsc::Sender<String>>>,
    next_client_id: RwLock<usize>,
}

impl ReloadBroadcaster {
    pub fn new() -> Self {
        Self {
            clients: RwLock::new(HashMap::new()),
            next_client_id: RwLock::new(0),
        }
    }

    /// Register a client, returning its id and event receiver.
    pub fn register_client(&self) -> (usize, mpsc::Receiver<String>) {
        let id = {
            let mut next_id = self.next_client_id.write();
            let id = *next_id;
            *next_id += 1;
            id
        };
        let (tx, rx) = mpsc::channel(100);
        self.clients.write().insert(id, tx);
        (id, rx)
    }

    pub fn unregister_client(&self, id: usize) {
        self.clients.write().remove(&id);
    }

    pub fn client_count(&self) -> usize {
        self.clients.read().len()
    }

    /// Send an event to every connected client, dropping the ones whose
    /// channel is gone or full.
    pub fn broadcast(&self, event: &SyncEvent) {
        let json = serde_json::to_string(event).unwrap_or_else(|_| "{}".to_string());
        let clients = self.clients.read().clone();

        let mut failed_ids = Vec::new();
        for (id, tx) in clients {
            if tx.try_send(json.clone()).is_err() {
                failed_ids.push(id);
            }
        }
        for id in failed_ids {
            self.unregister_client(id);
        }
    }
}

impl Default for ReloadBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl Reloader for ReloadBroadcaster {
    fn reload(&self) {
        tracing::debug!(clients = self.client_count(), "broadcasting full reload");
        self.broadcast(&SyncEvent::Reload);
    }
}

/// Shared request-handling state.
struct SyncState {
    broadcaster: Arc<ReloadBroadcaster>,
    middlewares: Vec<MiddlewareHandle>,
    options: ReloadOptions,
    passthrough: Vec<glob::Pattern>,
    http: reqwest::Client,
}

/// The built-in [`ReloadServer`] implementation.
///
/// Owns its own tokio runtime so the orchestrator's synchronous contract
/// holds; construct it from a non-async context.
pub struct SyncReloadServer {
    cwd: PathBuf,
    debounce_ms: u64,
    runtime: tokio::runtime::Runtime,
    broadcaster: Arc<ReloadBroadcaster>,
    server_task: Option<tokio::task::JoinHandle<()>>,
    watchers: Vec<GlobWatcher>,
}

impl SyncReloadServer {
    /// Create a server rooted at the project directory.
    ///
    /// # Errors
    ///
    /// Fails when the runtime cannot be created.
    pub fn new(cwd: impl Into<PathBuf>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .enable_all()
            .build()?;
        Ok(Self {
            cwd: cwd.into(),
            debounce_ms: 100,
            runtime,
            broadcaster: Arc::new(ReloadBroadcaster::new()),
            server_task: None,
            watchers: Vec::new(),
        })
    }
}

impl ReloadServer for SyncReloadServer {
    fn init(
        &mut self,
        options: serde_json::Map<String, serde_json::Value>,
        middlewares: Vec<MiddlewareHandle>,
    ) -> Result<()> {
        let options = ReloadOptions::from_merged(options)?;

        let mut passthrough = Vec::with_capacity(options.snippet_allow.len());
        for pattern in &options.snippet_allow {
            passthrough.push(glob::Pattern::new(pattern).map_err(|e| ServerError::Pattern {
                pattern: pattern.clone(),
                message: e.to_string(),
            })?);
        }

        // Bind all interfaces; the configured host only shapes URLs.
        let addr = format!("0.0.0.0:{}", options.port);
        let std_listener =
            std::net::TcpListener::bind(&addr).map_err(|source| ServerError::Bind {
                addr: addr.clone(),
                source,
            })?;
        std_listener.set_nonblocking(true)?;

        let state = Arc::new(SyncState {
            broadcaster: Arc::clone(&self.broadcaster),
            middlewares,
            options,
            passthrough,
            http: reqwest::Client::new(),
        });

        let app = Router::new()
            .route(SSE_PATH, get(handle_sse))
            .route(RELOAD_SCRIPT_PATH, get(handle_reload_script))
            .fallback(handle_request)
            .layer(
                // Dev server: allow everything.
                CorsLayer::new()
                    .allow_origin(Any)
                    .allow_methods(Any)
                    .allow_headers(Any),
            )
            .with_state(state);

        let listener = {
            let _guard = self.runtime.enter();
            tokio::net::TcpListener::from_std(std_listener)?
        };

        tracing::debug!(%addr, "live-reload server listening");
        self.server_task = Some(self.runtime.spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "live-reload server exited");
            }
        }));

        Ok(())
    }

    fn watch(&mut self, pattern: &str, handler: ChangeHook) -> Result<()> {
        let watcher = GlobWatcher::new(self.cwd.clone(), pattern, self.debounce_ms, handler)?;
        tracing::debug!(pattern, root = %watcher.root().display(), "watching");
        self.watchers.push(watcher);
        Ok(())
    }

    fn reloader(&self) -> Arc<dyn Reloader> {
        Arc::clone(&self.broadcaster) as Arc<dyn Reloader>
    }

    fn exit(&mut self) {
        if let Some(task) = self.server_task.take() {
            task.abort();
        }
        self.watchers.clear();
    }
}

async fn handle_sse(
    State(state): State<Arc<SyncState>>,
) -> Sse<impl tokio_stream::Stream<Item = std::result::Result<axum::response::sse::Event, std::convert::Infallible>>>
{
    use axum::response::sse::Event;

    let (id, rx) = state.broadcaster.register_client();
    tracing::debug!(id, "reload client connected");
    state
        .broadcaster
        .broadcast(&SyncEvent::ClientConnected { id });

    let stream = ReceiverStream::new(rx).map(|data| Ok(Event::default().data(data)));

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(std::time::Duration::from_secs(15))
            .text("ping"),
    )
}

async fn handle_reload_script(State(state): State<Arc<SyncState>>) -> impl IntoResponse {
    let script = RELOAD_SCRIPT.replace(
        "__WPDEV_NOTIFY__",
        if state.options.notify { "true" } else { "false" },
    );

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/javascript")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from(script))
        .unwrap()
}

/// Serve middleware build output from memory, otherwise proxy the
/// backend. Proxied HTML gets the reload snippet unless the path is on
/// the API passthrough list.
async fn handle_request(State(state): State<Arc<SyncState>>, req: Request) -> Response {
    let path = req.uri().path().to_string();

    for middleware in &state.middlewares {
        if let Some((content, content_type)) = middleware.serve(&path) {
            return Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, content_type)
                .header(header::CACHE_CONTROL, "no-cache")
                .body(Body::from(content))
                .unwrap();
        }
    }

    let passthrough = state.passthrough.iter().any(|p| p.matches(&path));
    proxy_request(&state, req, passthrough).await
}

async fn proxy_request(state: &SyncState, req: Request, passthrough: bool) -> Response {
    let path_and_query = req
        .uri()
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());
    let target = format!(
        "{}{}",
        state.options.proxy.trim_end_matches('/'),
        path_and_query
    );

    let method = reqwest::Method::from_bytes(req.method().as_str().as_bytes())
        .unwrap_or(reqwest::Method::GET);

    let mut builder = state.http.request(method, &target);
    for name in [header::CONTENT_TYPE, header::COOKIE, header::ACCEPT] {
        if let Some(value) = req.headers().get(&name) {
            if let Ok(value) = value.to_str() {
                builder = builder.header(name.as_str(), value);
            }
        }
    }

    let body = match axum::body::to_bytes(req.into_body(), MAX_BODY_BYTES).await {
        Ok(bytes) => bytes,
        Err(e) => {
            return error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                format!("request body: {e}"),
            )
        }
    };

    let upstream = match builder.body(body.to_vec()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(target, error = %e, "backend proxy failed");
            return error_response(StatusCode::BAD_GATEWAY, format!("backend unreachable: {e}"));
        }
    };

    let status =
        StatusCode::from_u16(upstream.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
    let content_type = upstream
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let bytes = match upstream.bytes().await {
        Ok(bytes) => bytes,
        Err(e) => return error_response(StatusCode::BAD_GATEWAY, format!("backend body: {e}")),
    };

    let body = if !passthrough && content_type.starts_with("text/html") {
        inject_reload_script(&bytes)
    } else {
        bytes.to_vec()
    };

    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from(body))
        .unwrap()
}

fn error_response(status: StatusCode, message: String) -> Response {
    Response::builder()
        .status(status)
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from(message))
        .unwrap()
}

/// Add the reload client script before the closing `</body>` tag, or at
/// the end when there is none.
fn inject_reload_script(content: &[u8]) -> Vec<u8> {
    let html = String::from_utf8_lossy(content);
    let script_tag = format!(r#"<script src="{RELOAD_SCRIPT_PATH}"></script>"#);

    if let Some(pos) = html.rfind("</body>") {
        let mut result = String::with_capacity(html.len() + script_tag.len() + 10);
        result.push_str(&html[..pos]);
        result.push_str("\n  ");
        result.push_str(&script_tag);
        result.push('\n');
        result.push_str(&html[pos..]);
        return result.into_bytes();
    }

    let mut result = html.to_string();
    result.push('\n');
    result.push_str(&script_tag);
    result.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inject_before_body_close() {
        let html = b"<html><body><h1>Shop</h1></body></html>";
        let result = String::from_utf8(inject_reload_script(html)).unwrap();

        let script_pos = result.find(RELOAD_SCRIPT_PATH).unwrap();
        let body_pos = result.find("</body>").unwrap();
        assert!(script_pos < body_pos);
    }

    #[test]
    fn inject_appends_without_body_tag() {
        let html = b"<p>fragment</p>";
        let result = String::from_utf8(inject_reload_script(html)).unwrap();
        assert!(result.ends_with(&format!(
            r#"<script src="{RELOAD_SCRIPT_PATH}"></script>"#
        )));
    }

    #[test]
    fn broadcaster_registers_and_counts() {
        let broadcaster = ReloadBroadcaster::new();
        let (id1, _rx1) = broadcaster.register_client();
        let (id2, _rx2) = broadcaster.register_client();

        assert_ne!(id1, id2);
        assert_eq!(broadcaster.client_count(), 2);

        broadcaster.unregister_client(id1);
        assert_eq!(broadcaster.client_count(), 1);
    }

    #[test]
    fn reload_reaches_connected_clients() {
        let broadcaster = ReloadBroadcaster::new();
        let (_id, mut rx) = broadcaster.register_client();

        broadcaster.reload();

        let message = rx.try_recv().unwrap();
        assert!(message.contains("\"Reload\""));
    }

    #[test]
    fn dead_clients_are_dropped_on_broadcast() {
        let broadcaster = ReloadBroadcaster::new();
        let (_id, rx) = broadcaster.register_client();
        drop(rx);

        broadcaster.broadcast(&SyncEvent::Reload);
        assert_eq!(broadcaster.client_count(), 0);
    }

    #[test]
    fn passthrough_patterns_match_api_paths() {
        let patterns: Vec<glob::Pattern> = crate::reload::API_PASSTHROUGH
            .iter()
            .map(|p| glob::Pattern::new(p).unwrap())
            .collect();

        assert!(patterns.iter().any(|p| p.matches("/wp-json/wp/v2/posts")));
        assert!(patterns
            .iter()
            .any(|p| p.matches("/wp-admin/admin-ajax.php")));
        assert!(!patterns.iter().any(|p| p.matches("/sample-page/")));
    }

    #[test]
    fn notify_flag_lands_in_client_script() {
        let on = RELOAD_SCRIPT.replace("__WPDEV_NOTIFY__", "true");
        assert!(on.contains("var notify = true;"));
    }

    #[test]
    fn server_lifecycle_binds_and_exits() {
        let dir = tempfile::tempdir().unwrap();
        let mut server = SyncReloadServer::new(dir.path()).unwrap();

        // Port 0 lets the OS choose; init only needs the bind to succeed.
        let options = ReloadOptions {
            port: 0,
            proxy: "http://localhost:9".to_string(),
            ..ReloadOptions::default()
        };
        server
            .init(options.merged(&serde_json::Map::new()), Vec::new())
            .unwrap();
        server
            .watch("*.php", Box::new(|_| {}))
            .unwrap();

        let reloader = server.reloader();
        reloader.reload();

        server.exit();
    }
}
