//! Axum HTTP handlers for the web server

use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::{header::HeaderName, HeaderValue, StatusCode},
    response::{sse::KeepAlive, IntoResponse, Response, Sse},
    Json,
};
use serde::Serialize;
use serde_json::Value;
use tracing::warn;

use crate::errors::ProtocolError;
use crate::mcp::{rpc::RpcReply, server::handle_json_rpc_body};
use crate::AppState;

pub const X_ACCEL_BUFFERING: HeaderName = HeaderName::from_static("x-accel-buffering");

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: String,
    pub version: String,
    pub mcp_endpoint: String,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    Json(DiscoveryResponse {
        name: state.server_info.name.clone(),
        version: state.server_info.version.clone(),
        mcp_endpoint: state.endpoint_path.to_string(),
    })
}

/// Bodies that cannot be buffered (over the size limit, broken transfer)
/// are answered with a JSON-RPC error like any other malformed request.
pub async fn mcp_post(
    State(state): State<AppState>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(
                status = rejection.status().as_u16(),
                error = %rejection.body_text(),
                "request body rejected"
            );
            return RpcReply::failure(
                Value::Null,
                ProtocolError::invalid_request(format!(
                    "Request body could not be read: {}",
                    rejection.body_text()
                )),
            )
            .into_response();
        }
    };

    handle_json_rpc_body(&state.registry, &body)
        .await
        .into_response()
}

pub async fn mcp_sse(State(state): State<AppState>) -> Response {
    let connection = state.session.connect();
    let sse = Sse::new(connection).keep_alive(KeepAlive::new().interval(state.sse_keep_alive));

    ([(X_ACCEL_BUFFERING, HeaderValue::from_static("no"))], sse).into_response()
}

pub async fn method_not_supported() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        "Method not supported on this endpoint",
    )
        .into_response()
}
