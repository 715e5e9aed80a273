//! The central Model Context Protocol engine
//!
//! Ties envelope validation, method dispatch and error mapping together for a
//! single POST body, and records an audit line for every dispatched method.

use std::{any::Any, panic::AssertUnwindSafe};

use futures_util::FutureExt;
use serde_json::{Map, Value};
use tracing::{error, info};

use crate::errors::ProtocolError;
use crate::logging::take_panic_location;
use crate::mcp::{
    envelope::{validate_envelope, Rejection},
    registry::HandlerRegistry,
    rpc::RpcReply,
};

pub async fn handle_json_rpc_body(registry: &HandlerRegistry, body: &[u8]) -> RpcReply {
    let request = match validate_envelope(body) {
        Ok(request) => request,
        Err(Rejection { id, error }) => return RpcReply::failure(id, error),
    };

    let audit_params = redact_audit_params(&request.params);
    let id = request.id;
    let method = request.method;

    let outcome = dispatch_guarded(registry, &method, request.params).await;

    info!(
        method = %method,
        params = %audit_params,
        outcome = if outcome.is_ok() { "success" } else { "failure" },
        "mcp action audited"
    );

    match outcome {
        Ok(result) => RpcReply::success(id, result),
        Err(err) => RpcReply::failure(id, err),
    }
}

/// Dispatches with a panic boundary; a panicking handler becomes a `Fault`
/// carrying the panic site recorded by the panic hook.
pub async fn dispatch_guarded(
    registry: &HandlerRegistry,
    method: &str,
    params: Map<String, Value>,
) -> Result<Value, ProtocolError> {
    AssertUnwindSafe(registry.dispatch(method, params))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| Err(unexpected_fault(method, panic)))
}

fn unexpected_fault(method: &str, panic: Box<dyn Any + Send>) -> ProtocolError {
    let message = panic
        .downcast_ref::<&str>()
        .map(|message| message.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());

    let location = take_panic_location();
    if location.is_none() {
        error!(method = %method, error = %message, "handler panicked during dispatch");
    }

    ProtocolError::fault(format!("Internal server error: {message}"), location)
}

pub fn redact_audit_params(params: &Map<String, Value>) -> Value {
    redact_audit_value(&Value::Object(params.clone()))
}

pub fn redact_audit_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(key, item)| {
                    if is_sensitive_key(key) {
                        (key.clone(), Value::String("[REDACTED]".to_string()))
                    } else {
                        (key.clone(), redact_audit_value(item))
                    }
                })
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.iter().map(redact_audit_value).collect()),
        _ => value.clone(),
    }
}

pub fn is_sensitive_key(key: &str) -> bool {
    let normalized = key.trim().to_ascii_lowercase();
    matches!(
        normalized.as_str(),
        "authorization" | "bearer" | "api_key" | "apikey" | "private_key"
    ) || ["token", "secret", "password", "credential"]
        .iter()
        .any(|needle| normalized.contains(needle))
}
