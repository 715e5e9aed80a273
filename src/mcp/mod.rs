//! Model Context Protocol (MCP) server handling and JSON-RPC implementations
//!
//! Provides protocol-level specifics surrounding JSON-RPC validation, routing, and error formatting.

pub mod envelope;
pub mod registry;
pub mod rpc;
pub mod server;
