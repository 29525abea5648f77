//! Connection settings for the node's JSON-RPC endpoint.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::CoreError;

pub const DEFAULT_RPC_URL: &str = "http://127.0.0.1:8332";
pub const DEFAULT_RPC_TIMEOUT_SECS: u64 = 25;

/// Adapter configuration, typically read from a JSON file and then
/// overridden from the command line.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    pub rpc_url: String,
    pub rpc_user: Option<String>,
    pub rpc_pass: Option<String>,
    /// Used only when `rpc_user`/`rpc_pass` are absent.
    pub rpc_cookie_file: Option<PathBuf>,
    pub rpc_timeout: u64,
    pub rpc_requests_per_second: Option<u32>,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            rpc_url: DEFAULT_RPC_URL.to_owned(),
            rpc_user: None,
            rpc_pass: None,
            rpc_cookie_file: None,
            rpc_timeout: DEFAULT_RPC_TIMEOUT_SECS,
            rpc_requests_per_second: None,
        }
    }
}

impl RpcConfig {
    pub fn from_json(raw: &str) -> Result<Self, CoreError> {
        serde_json::from_str(raw).map_err(|e| CoreError::Config(format!("invalid config: {e}")))
    }

    pub fn from_file(path: &Path) -> Result<Self, CoreError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            CoreError::Config(format!("failed to read config {}: {e}", path.display()))
        })?;
        Self::from_json(&raw)
    }
}
