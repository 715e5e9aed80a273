use std::{sync::Arc, time::Duration};

use axum::{extract::DefaultBodyLimit, middleware, routing::get, Router};

pub mod config;
pub mod domain;
pub mod errors;
pub mod http;
pub mod logging;
pub mod mcp;
pub mod session;
pub mod tools;

use config::DEFAULT_MAX_BODY_BYTES;
use domain::initialize::ServerInfo;
use mcp::registry::HandlerRegistry;
use session::McpSession;
use tools::ToolRepository;

#[derive(Clone)]
pub struct AppState {
    pub endpoint_path: Arc<str>,
    pub server_info: Arc<ServerInfo>,
    pub registry: Arc<HandlerRegistry>,
    pub session: Arc<McpSession>,
    pub sse_keep_alive: Duration,
    pub max_body_bytes: usize,
}

impl AppState {
    pub fn new(
        endpoint_path: impl Into<Arc<str>>,
        server_info: ServerInfo,
        tools: ToolRepository,
        sse_keep_alive: Duration,
    ) -> Self {
        let endpoint_path = endpoint_path.into();
        let registry = domain::build_registry(server_info.clone(), Arc::new(tools));
        Self {
            session: Arc::new(McpSession::new(Arc::clone(&endpoint_path))),
            endpoint_path,
            server_info: Arc::new(server_info),
            registry: Arc::new(registry),
            sse_keep_alive,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    pub fn with_max_body_bytes(mut self, max_body_bytes: usize) -> Self {
        self.max_body_bytes = max_body_bytes;
        self
    }
}

/// `state.endpoint_path` is mounted verbatim; callers building state by hand
/// should check it with `config::validate_endpoint_path` first.
pub fn build_app(state: AppState) -> Router {
    let endpoint = get(http::handlers::mcp_sse)
        .post(http::handlers::mcp_post)
        .fallback(http::handlers::method_not_supported);

    Router::new()
        .route("/health", get(http::handlers::health))
        .route("/.well-known/mcp", get(http::handlers::discovery))
        .route(&state.endpoint_path, endpoint)
        .layer(DefaultBodyLimit::max(state.max_body_bytes))
        .layer(middleware::from_fn(logging::request_logging_middleware))
        .with_state(state)
}
