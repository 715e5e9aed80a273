use std::{env, net::SocketAddr, time::Duration};

use thiserror::Error;

use crate::domain::initialize::ServerInfo;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub bind_port: u16,
    pub endpoint_path: String,
    pub server_name: String,
    pub server_version: String,
    pub instructions: Option<String>,
    pub sse_keep_alive: Duration,
    pub max_body_bytes: usize,
}

pub const DEFAULT_MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Paths already routed by the server besides the MCP endpoint.
pub const RESERVED_PATHS: [&str; 2] = ["/health", "/.well-known/mcp"];

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("BIND_PORT must be a valid u16")]
    InvalidPort,
    #[error("MCP_ENDPOINT_PATH {0}")]
    InvalidEndpointPath(&'static str),
    #[error("MCP_MAX_BODY_BYTES must be a positive integer")]
    InvalidBodyLimit,
    #[error("MCP_SSE_KEEPALIVE_SECS must be a positive integer")]
    InvalidKeepAlive,
    #[error("invalid bind address or port")]
    InvalidSocket,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
        let bind_port = env::var("BIND_PORT")
            .ok()
            .map(|value| value.parse::<u16>().map_err(|_| ConfigError::InvalidPort))
            .transpose()?
            .unwrap_or(8080);

        let endpoint_path = non_empty_var("MCP_ENDPOINT_PATH").unwrap_or_else(|| "/mcp".to_string());
        validate_endpoint_path(&endpoint_path)?;

        let keep_alive_secs = non_empty_var("MCP_SSE_KEEPALIVE_SECS")
            .map(|value| {
                value
                    .parse::<u64>()
                    .ok()
                    .filter(|secs| *secs > 0)
                    .ok_or(ConfigError::InvalidKeepAlive)
            })
            .transpose()?
            .unwrap_or(15);

        let max_body_bytes = non_empty_var("MCP_MAX_BODY_BYTES")
            .map(|value| {
                value
                    .parse::<usize>()
                    .ok()
                    .filter(|bytes| *bytes > 0)
                    .ok_or(ConfigError::InvalidBodyLimit)
            })
            .transpose()?
            .unwrap_or(DEFAULT_MAX_BODY_BYTES);

        let defaults = ServerInfo::default();
        let config = Self {
            bind_addr,
            bind_port,
            endpoint_path,
            server_name: non_empty_var("MCP_SERVER_NAME").unwrap_or(defaults.name),
            server_version: non_empty_var("MCP_SERVER_VERSION").unwrap_or(defaults.version),
            instructions: non_empty_var("MCP_INSTRUCTIONS"),
            sse_keep_alive: Duration::from_secs(keep_alive_secs),
            max_body_bytes,
        };

        let _ = config.bind_socket()?;
        Ok(config)
    }

    pub fn bind_socket(&self) -> Result<SocketAddr, ConfigError> {
        format!("{}:{}", self.bind_addr, self.bind_port)
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::InvalidSocket)
    }

    pub fn server_info(&self) -> ServerInfo {
        ServerInfo {
            name: self.server_name.clone(),
            version: self.server_version.clone(),
            instructions: self.instructions.clone(),
        }
    }
}

/// The endpoint path is mounted as a literal route next to the reserved
/// paths, so it must not collide with them or contain route syntax.
pub fn validate_endpoint_path(path: &str) -> Result<(), ConfigError> {
    if !path.starts_with('/') {
        return Err(ConfigError::InvalidEndpointPath("must start with '/'"));
    }
    if RESERVED_PATHS.contains(&path) {
        return Err(ConfigError::InvalidEndpointPath(
            "must not be /health or /.well-known/mcp",
        ));
    }
    if path.contains(['{', '}', '*']) || path.split('/').any(|segment| segment.starts_with(':')) {
        return Err(ConfigError::InvalidEndpointPath(
            "must not contain route parameters or wildcards",
        ));
    }
    Ok(())
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
