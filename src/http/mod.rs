//! HTTP Transport layer for the Model Context Protocol
//!
//! Provides the single MCP endpoint (POST for JSON-RPC, GET for the SSE push
//! channel) and the public metadata endpoints.

pub mod handlers;
