//! JSON-RPC protocol representations and formatting utilities
//!
//! Provides the request/response envelopes and the mapping of `ProtocolError`s
//! to JSON-RPC error objects plus HTTP status codes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::error;

use crate::errors::ProtocolError;

pub const JSONRPC_VERSION: &str = "2.0";

/// A validated inbound request. `id` is kept as the raw JSON value so it can be
/// echoed back exactly as received.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    pub id: Value,
    pub method: String,
    pub params: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Result(Value),
    Error(JsonRpcError),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    pub id: Value,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl JsonRpcResponse {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Result(result),
        }
    }

    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            id,
            outcome: Outcome::Error(error),
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self.outcome, Outcome::Error(_))
    }
}

/// A response envelope together with the HTTP status it is sent with.
#[derive(Debug)]
pub struct RpcReply {
    pub status: StatusCode,
    pub body: JsonRpcResponse,
}

impl RpcReply {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            status: StatusCode::OK,
            body: JsonRpcResponse::result(id, result),
        }
    }

    pub fn failure(id: Value, err: ProtocolError) -> Self {
        let status = err.status();
        Self {
            status,
            body: JsonRpcResponse::error(id, protocol_error_to_json_rpc(err)),
        }
    }
}

impl IntoResponse for RpcReply {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

pub fn protocol_error_to_json_rpc(err: ProtocolError) -> JsonRpcError {
    let code = err.code();
    // Faults were already logged with their backtrace by the panic hook.
    if let ProtocolError::Internal { message, location } = &err {
        error!(
            error = %message,
            location = %location,
            "request failed with internal error"
        );
    }

    JsonRpcError {
        code,
        message: err.to_string(),
        data: None,
    }
}

/// Ids are echoed only when they have a JSON-RPC compatible type.
pub fn echoable_id(id: Option<&Value>) -> Value {
    match id {
        Some(value @ (Value::String(_) | Value::Number(_))) => value.clone(),
        _ => Value::Null,
    }
}
