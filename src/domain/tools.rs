//! Tool invocation and discovery handlers
//!
//! `tools/call` and `tools/execute` both land in `ToolsCallHandler` but report
//! tool failures differently: `tools/call` absorbs them into an in-band
//! `isError` result while `tools/execute` surfaces them as a JSON-RPC internal
//! error.

use std::sync::Arc;

use async_trait::async_trait;
use rust_mcp_sdk::schema::{CallToolResult, ContentBlock, TextContent};
use serde_json::{json, Map, Value};
use tracing::warn;

use crate::errors::ProtocolError;
use crate::mcp::registry::RequestHandler;
use crate::tools::ToolRepository;

pub const TOOLS_CALL: &str = "tools/call";
pub const TOOLS_EXECUTE: &str = "tools/execute";

pub struct ToolsCallHandler {
    tools: Arc<ToolRepository>,
}

impl ToolsCallHandler {
    pub fn new(tools: Arc<ToolRepository>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl RequestHandler for ToolsCallHandler {
    fn methods(&self) -> &'static [&'static str] {
        &[TOOLS_CALL, TOOLS_EXECUTE]
    }

    async fn execute(
        &self,
        method: &str,
        mut params: Map<String, Value>,
    ) -> Result<Value, ProtocolError> {
        let Some(name) = params.get("name").and_then(Value::as_str).map(str::to_owned) else {
            return Err(ProtocolError::invalid_request("Tool name is required"));
        };

        let tool = self
            .tools
            .get_tool(&name)
            .ok_or_else(|| ProtocolError::method_not_found(format!("Tool '{name}' not found")))?;

        let arguments = match params.remove("arguments") {
            None | Some(Value::Null) => Map::new(),
            Some(Value::Object(arguments)) => arguments,
            Some(_) => {
                return Err(ProtocolError::invalid_request(
                    "Tool arguments must be an object",
                ))
            }
        };

        let outcome = tool.execute(arguments).await;

        if method == TOOLS_CALL {
            let (text, is_error) = match outcome {
                Ok(result) => (stringify_result(result), false),
                Err(err) => {
                    warn!(tool = %name, error = %err, "tool reported failure");
                    (format!("Error executing tool '{name}': {err}"), true)
                }
            };
            return call_tool_result(text, is_error);
        }

        match outcome {
            Ok(result) => Ok(json!({ "result": result })),
            Err(err) => Err(ProtocolError::internal(format!(
                "Error executing tool '{name}' for method '{method}': {err}"
            ))),
        }
    }
}

fn call_tool_result(text: String, is_error: bool) -> Result<Value, ProtocolError> {
    serde_json::to_value(CallToolResult {
        content: vec![ContentBlock::from(TextContent::new(text, None, None))],
        is_error: Some(is_error),
        meta: None,
        structured_content: None,
    })
    .map_err(|err| ProtocolError::internal(format!("failed to serialize tool result: {err}")))
}

/// Strings are passed through, anything else is rendered as JSON text.
pub fn stringify_result(result: Value) -> String {
    match result {
        Value::String(text) => text,
        other => other.to_string(),
    }
}

pub struct ToolsListHandler {
    tools: Arc<ToolRepository>,
}

impl ToolsListHandler {
    pub fn new(tools: Arc<ToolRepository>) -> Self {
        Self { tools }
    }
}

#[async_trait]
impl RequestHandler for ToolsListHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["tools/list"]
    }

    async fn execute(
        &self,
        _method: &str,
        _params: Map<String, Value>,
    ) -> Result<Value, ProtocolError> {
        let tools = self
            .tools
            .tools()
            .map(|tool| {
                json!({
                    "name": tool.name(),
                    "description": tool.description(),
                    "inputSchema": tool.input_schema(),
                })
            })
            .collect::<Vec<_>>();

        Ok(json!({ "tools": tools }))
    }
}
