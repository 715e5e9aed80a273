use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::errors::ProtocolError;
use crate::mcp::registry::RequestHandler;

pub struct PingHandler;

#[async_trait]
impl RequestHandler for PingHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["ping"]
    }

    async fn execute(
        &self,
        _method: &str,
        _params: Map<String, Value>,
    ) -> Result<Value, ProtocolError> {
        Ok(Value::Object(Map::new()))
    }
}
