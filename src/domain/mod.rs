//! Capability handlers exposed over the Model Context Protocol
//!
//! Each handler claims a fixed set of JSON-RPC method names and is registered
//! with the `HandlerRegistry` at startup.

pub mod initialize;
pub mod ping;
pub mod tools;

use std::sync::Arc;

use crate::mcp::registry::HandlerRegistry;
use crate::tools::ToolRepository;

use self::{
    initialize::{InitializeHandler, ServerInfo},
    ping::PingHandler,
    tools::{ToolsCallHandler, ToolsListHandler},
};

pub fn build_registry(server_info: ServerInfo, tools: Arc<ToolRepository>) -> HandlerRegistry {
    HandlerRegistry::builder()
        .handler(InitializeHandler::new(server_info))
        .handler(ToolsCallHandler::new(Arc::clone(&tools)))
        .handler(ToolsListHandler::new(tools))
        .handler(PingHandler)
        .build()
}
