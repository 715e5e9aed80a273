//! Wire-format validation of inbound JSON-RPC request bodies

use serde_json::{Map, Value};

use crate::errors::ProtocolError;
use crate::mcp::rpc::{echoable_id, JsonRpcRequest, JSONRPC_VERSION};

/// A body that failed validation, with the id to echo in the error response.
#[derive(Debug)]
pub struct Rejection {
    pub id: Value,
    pub error: ProtocolError,
}

impl Rejection {
    fn new(id: Value, error: ProtocolError) -> Self {
        Self { id, error }
    }
}

pub fn validate_envelope(body: &[u8]) -> Result<JsonRpcRequest, Rejection> {
    if body.is_empty() {
        return Err(Rejection::new(
            Value::Null,
            ProtocolError::invalid_request("Request body is empty"),
        ));
    }

    let payload: Value = serde_json::from_slice(body).map_err(|err| {
        Rejection::new(
            Value::Null,
            ProtocolError::parse(format!("Parse error: Invalid JSON. {err}")),
        )
    })?;

    let Value::Object(mut object) = payload else {
        return Err(Rejection::new(Value::Null, invalid_structure()));
    };

    let id = echoable_id(object.get("id"));
    let present = |key: &str| object.get(key).is_some_and(|value| !value.is_null());
    if !present("jsonrpc") || !present("method") || !present("id") {
        return Err(Rejection::new(id, invalid_structure()));
    }

    if object.get("jsonrpc").and_then(Value::as_str) != Some(JSONRPC_VERSION) {
        return Err(Rejection::new(
            id,
            ProtocolError::invalid_request("Invalid JSON-RPC version"),
        ));
    }

    let Some(method) = object.get("method").and_then(Value::as_str).map(str::to_owned) else {
        return Err(Rejection::new(id, invalid_structure()));
    };
    if id.is_null() {
        return Err(Rejection::new(id, invalid_structure()));
    }

    let params = match object.remove("params") {
        None | Some(Value::Null) => Map::new(),
        Some(Value::Object(params)) => params,
        Some(_) => {
            return Err(Rejection::new(
                id,
                ProtocolError::invalid_request("Request params must be an object"),
            ))
        }
    };

    Ok(JsonRpcRequest { id, method, params })
}

fn invalid_structure() -> ProtocolError {
    ProtocolError::invalid_request("Invalid JSON-RPC request structure")
}
