//! HTTP transport server using Axum.
//!
//! Each REST route is translated into a method name and a JSON parameter
//! object and handed to the [`RequestHandler`]. Handler errors come back as
//! `{ "error": { "code", "message" } }` with the status of their category.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    Router,
    extract::{DefaultBodyLimit, OriginalUri, Path, Query, Request, State, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use shelf_protocol::{ApiError, ErrorBody, HandlerResult, Methods};
use tokio::sync::mpsc;
use tower::ServiceBuilder;
use tower_http::{
    cors::CorsLayer,
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};
use tracing::info;

/// Trait implemented by the server to handle incoming requests.
/// The transport layer calls this for every API route.
pub trait RequestHandler: Send + Sync + 'static {
    /// Handle a method call and return its JSON result.
    fn handle_request(
        &self,
        method: &str,
        params: Option<Value>,
    ) -> impl std::future::Future<Output = HandlerResult> + Send;
}

/// Transport server configuration.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// Port to listen on (0 for OS-assigned)
    pub port: u16,
    /// Hostname to bind to
    pub hostname: String,
    /// Enable permissive CORS (client served from another origin)
    pub enable_cors: bool,
    /// Directory holding the browser client; served for non-API paths
    pub static_dir: Option<PathBuf>,
    /// Maximum request body size in bytes
    pub max_body_bytes: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            port: 3001,
            hostname: "127.0.0.1".into(),
            enable_cors: false,
            static_dir: None,
            max_body_bytes: 50 * 1024 * 1024,
        }
    }
}

/// Shared state for the transport server.
struct AppState<H: RequestHandler> {
    handler: Arc<H>,
}

/// The transport server: owns the listener task.
pub struct TransportServer {
    /// Shutdown signal
    shutdown_tx: Option<mpsc::Sender<()>>,
    /// Server task handle
    handle: Option<tokio::task::JoinHandle<()>>,
    /// Actual bound port
    port: u16,
}

impl TransportServer {
    /// Start the transport server with the given request handler.
    pub async fn start<H: RequestHandler>(
        config: TransportConfig,
        handler: H,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        Self::start_shared(config, Arc::new(handler)).await
    }

    /// Start the transport server with a handler shared with the caller
    /// (the binary keeps a reference to shut services down afterwards).
    pub async fn start_shared<H: RequestHandler>(
        config: TransportConfig,
        handler: Arc<H>,
    ) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel(1);

        let app = build_router(&config, handler);

        let addr: SocketAddr = format!("{}:{}", config.hostname, config.port).parse()?;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let actual_port = listener.local_addr()?.port();

        info!("HTTP transport listening on http://{}:{}", config.hostname, actual_port);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = shutdown_rx.recv().await;
                })
                .await
                .ok();
        });

        Ok(Self {
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
            port: actual_port,
        })
    }

    /// Get the actual bound port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Gracefully stop the server.
    pub async fn stop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(()).await;
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
        info!("HTTP transport stopped");
    }
}

/// Build the axum router: API routes, optional static client, layers.
pub fn build_router<H: RequestHandler>(config: &TransportConfig, handler: Arc<H>) -> Router {
    let state = Arc::new(AppState { handler });

    let api = Router::new()
        .route("/config", get(config_handler::<H>))
        .route("/workspace", get(workspace_handler::<H>).post(select_workspace_handler::<H>))
        .route("/tree", get(tree_handler::<H>))
        .route("/files", post(create_file_handler::<H>))
        .route(
            "/files/{id}",
            get(read_file_handler::<H>)
                .put(write_file_handler::<H>)
                .delete(delete_file_handler::<H>),
        )
        .route("/files/{id}/rename", post(rename_file_handler::<H>))
        .route("/folders", post(create_folder_handler::<H>))
        .route("/folders/{id}", delete(delete_folder_handler::<H>))
        .route("/directories", get(list_dirs_handler::<H>))
        .route("/directories/home", get(home_dir_handler::<H>))
        .route("/directories/common", get(common_dirs_handler::<H>))
        .fallback(api_not_found_handler);

    let mut app = Router::new()
        .route("/health", get(health_handler))
        .nest("/api", api);

    if let Some(dir) = &config.static_dir {
        // Unknown paths get index.html so client-side routes survive a reload.
        let index = ServeFile::new(dir.join("index.html"));
        app = app.fallback_service(ServeDir::new(dir).fallback(index));
    }

    let mut app = app.with_state(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http().make_span_with(|req: &Request| {
                tracing::debug_span!(
                    "request",
                    id = %uuid::Uuid::new_v4(),
                    method = %req.method(),
                    uri = %req.uri(),
                )
            }))
            .layer(DefaultBodyLimit::max(config.max_body_bytes)),
    );

    if config.enable_cors {
        app = app.layer(CorsLayer::permissive());
    }

    app
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Handlers
// ─────────────────────────────────────────────────────────────────────────────

type AppStateRef<H> = State<Arc<AppState<H>>>;
type JsonBody = Result<Json<Value>, JsonRejection>;

async fn health_handler() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn config_handler<H: RequestHandler>(State(state): AppStateRef<H>) -> Response {
    dispatch(&state, Methods::CONFIG_GET, None, StatusCode::OK).await
}

async fn workspace_handler<H: RequestHandler>(State(state): AppStateRef<H>) -> Response {
    dispatch(&state, Methods::WORKSPACE_GET, None, StatusCode::OK).await
}

async fn select_workspace_handler<H: RequestHandler>(
    State(state): AppStateRef<H>,
    body: JsonBody,
) -> Response {
    match json_body(body) {
        Ok(params) => {
            let method = Methods::WORKSPACE_SELECT;
            dispatch(&state, method, Some(params), StatusCode::OK).await
        }
        Err(e) => error_response(e),
    }
}

async fn tree_handler<H: RequestHandler>(State(state): AppStateRef<H>) -> Response {
    dispatch(&state, Methods::WORKSPACE_TREE, None, StatusCode::OK).await
}

async fn create_file_handler<H: RequestHandler>(
    State(state): AppStateRef<H>,
    body: JsonBody,
) -> Response {
    match json_body(body) {
        Ok(params) => {
            let method = Methods::FILE_CREATE;
            dispatch(&state, method, Some(params), StatusCode::CREATED).await
        }
        Err(e) => error_response(e),
    }
}

async fn read_file_handler<H: RequestHandler>(
    State(state): AppStateRef<H>,
    Path(id): Path<String>,
) -> Response {
    dispatch(&state, Methods::FILE_READ, Some(json!({ "id": id })), StatusCode::OK).await
}

async fn write_file_handler<H: RequestHandler>(
    State(state): AppStateRef<H>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Response {
    match json_body(body) {
        Ok(params) => {
            let method = Methods::FILE_WRITE;
            dispatch(&state, method, Some(with_id(params, id)), StatusCode::OK).await
        }
        Err(e) => error_response(e),
    }
}

async fn delete_file_handler<H: RequestHandler>(
    State(state): AppStateRef<H>,
    Path(id): Path<String>,
) -> Response {
    dispatch(&state, Methods::FILE_DELETE, Some(json!({ "id": id })), StatusCode::OK).await
}

async fn rename_file_handler<H: RequestHandler>(
    State(state): AppStateRef<H>,
    Path(id): Path<String>,
    body: JsonBody,
) -> Response {
    match json_body(body) {
        Ok(params) => {
            let method = Methods::FILE_RENAME;
            dispatch(&state, method, Some(with_id(params, id)), StatusCode::OK).await
        }
        Err(e) => error_response(e),
    }
}

async fn create_folder_handler<H: RequestHandler>(
    State(state): AppStateRef<H>,
    body: JsonBody,
) -> Response {
    match json_body(body) {
        Ok(params) => {
            let method = Methods::FILE_CREATE_DIR;
            dispatch(&state, method, Some(params), StatusCode::CREATED).await
        }
        Err(e) => error_response(e),
    }
}

async fn delete_folder_handler<H: RequestHandler>(
    State(state): AppStateRef<H>,
    Path(id): Path<String>,
) -> Response {
    dispatch(&state, Methods::FILE_DELETE_DIR, Some(json!({ "id": id })), StatusCode::OK).await
}

#[derive(Deserialize)]
struct DirQuery {
    path: Option<String>,
}

async fn list_dirs_handler<H: RequestHandler>(
    State(state): AppStateRef<H>,
    Query(q): Query<DirQuery>,
) -> Response {
    dispatch(&state, Methods::BROWSE_LIST, Some(json!({ "path": q.path })), StatusCode::OK).await
}

async fn home_dir_handler<H: RequestHandler>(State(state): AppStateRef<H>) -> Response {
    dispatch(&state, Methods::BROWSE_HOME, None, StatusCode::OK).await
}

async fn common_dirs_handler<H: RequestHandler>(State(state): AppStateRef<H>) -> Response {
    dispatch(&state, Methods::BROWSE_COMMON, None, StatusCode::OK).await
}

async fn api_not_found_handler(OriginalUri(uri): OriginalUri) -> Response {
    error_response(ApiError::method_not_found(uri.path()))
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

async fn dispatch<H: RequestHandler>(
    state: &AppState<H>,
    method: &str,
    params: Option<Value>,
    success: StatusCode,
) -> Response {
    match state.handler.handle_request(method, params).await {
        Ok(result) => (success, Json(result)).into_response(),
        Err(err) => error_response(err),
    }
}

fn error_response(err: ApiError) -> Response {
    let status = StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(ErrorBody::from(err))).into_response()
}

fn json_body(body: JsonBody) -> Result<Value, ApiError> {
    body.map(|Json(v)| v)
        .map_err(|e| ApiError::invalid_params(format!("Invalid JSON body: {}", e.body_text())))
}

/// Merge the identifier from the URL into the body parameters.
fn with_id(body: Value, id: String) -> Value {
    let mut map = match body {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    map.insert("id".into(), Value::String(id));
    Value::Object(map)
}
