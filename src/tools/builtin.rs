//! Small tools shipped with the server binary

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};

use crate::errors::ToolError;
use crate::tools::Tool;

/// Returns `arguments.message` unchanged.
#[derive(Debug, Default)]
pub struct EchoTool;

#[async_trait]
impl Tool for EchoTool {
    fn name(&self) -> &str {
        "echo"
    }

    fn description(&self) -> &str {
        "Echo back the provided message"
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": { "message": { "type": "string" } },
            "required": ["message"]
        })
    }

    async fn execute(&self, arguments: Map<String, Value>) -> Result<Value, ToolError> {
        match arguments.get("message") {
            Some(Value::String(message)) => Ok(Value::String(message.clone())),
            Some(_) => Err(ToolError::new("message must be a string")),
            None => Err(ToolError::new("message is required")),
        }
    }
}

#[derive(Debug, Default)]
pub struct CurrentTimeTool;

#[async_trait]
impl Tool for CurrentTimeTool {
    fn name(&self) -> &str {
        "current_time"
    }

    fn description(&self) -> &str {
        "Current server time in UTC"
    }

    async fn execute(&self, _arguments: Map<String, Value>) -> Result<Value, ToolError> {
        Ok(json!({ "utc": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true) }))
    }
}
