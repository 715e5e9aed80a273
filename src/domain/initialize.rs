//! Session handshake (`initialize`)

use async_trait::async_trait;
use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ServerCapabilities, ServerCapabilitiesTools,
};
use serde_json::{Map, Value};

use crate::errors::ProtocolError;
use crate::mcp::registry::RequestHandler;

pub const DEFAULT_PROTOCOL_VERSION: &str = "2024-11-05";
pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 2] = ["2024-11-05", "2025-03-26"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
    pub instructions: Option<String>,
}

impl Default for ServerInfo {
    fn default() -> Self {
        Self {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            instructions: None,
        }
    }
}

pub struct InitializeHandler {
    server_info: ServerInfo,
}

impl InitializeHandler {
    pub fn new(server_info: ServerInfo) -> Self {
        Self { server_info }
    }
}

#[async_trait]
impl RequestHandler for InitializeHandler {
    fn methods(&self) -> &'static [&'static str] {
        &["initialize"]
    }

    async fn execute(
        &self,
        _method: &str,
        params: Map<String, Value>,
    ) -> Result<Value, ProtocolError> {
        let initialize_result = InitializeResult {
            server_info: Implementation {
                name: self.server_info.name.clone(),
                version: self.server_info.version.clone(),
                title: None,
                description: None,
                icons: vec![],
                website_url: None,
            },
            capabilities: ServerCapabilities {
                tools: Some(ServerCapabilitiesTools {
                    list_changed: Some(false),
                }),
                ..Default::default()
            },
            protocol_version: negotiate_protocol_version(&params).to_string(),
            instructions: self.server_info.instructions.clone(),
            meta: None,
        };

        serde_json::to_value(initialize_result).map_err(|err| {
            ProtocolError::internal(format!("failed to serialize initialize result: {err}"))
        })
    }
}

/// Echoes a supported client version, otherwise falls back to the default.
pub fn negotiate_protocol_version(params: &Map<String, Value>) -> &'static str {
    params
        .get("protocolVersion")
        .and_then(Value::as_str)
        .map(str::trim)
        .and_then(|offered| {
            SUPPORTED_PROTOCOL_VERSIONS
                .iter()
                .copied()
                .find(|supported| *supported == offered)
        })
        .unwrap_or(DEFAULT_PROTOCOL_VERSION)
}
