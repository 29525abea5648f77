use std::path::PathBuf;

use clap::{Parser, Subcommand};

use bcd_core::{CoreError, RpcConfig};

/// bcd: query a Bitcoin Diamond node through the block-assembling adapter.
#[derive(Parser)]
#[command(version, about)]
pub struct Cli {
    /// JSON adapter configuration file. Flags below override its values.
    #[arg(long, env = "BCD_CONFIG")]
    pub config: Option<PathBuf>,

    /// Node RPC URL.
    #[arg(long, env = "BCD_RPC_URL")]
    pub rpc_url: Option<String>,

    /// RPC username.
    #[arg(long, env = "BCD_RPC_USER")]
    pub rpc_user: Option<String>,

    /// RPC password.
    #[arg(long, env = "BCD_RPC_PASS")]
    pub rpc_pass: Option<String>,

    /// Cookie file with `username:password`, used when user/pass are absent.
    #[arg(long, env = "BCD_RPC_COOKIE_FILE")]
    pub rpc_cookie_file: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub rpc_timeout: Option<u64>,

    /// Maximum outbound RPC requests per second.
    #[arg(long)]
    pub rpc_requests_per_second: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Show chain info and the adapter's network classification.
    Info,
    /// Assemble a block by hash or height.
    Block {
        /// Block hash, or a decimal height.
        id: String,
    },
    /// Fetch a transaction by txid.
    Tx { txid: String },
    /// Fetch a mempool transaction by txid.
    MempoolTx { txid: String },
    /// Fetch mempool metadata for a transaction (unsupported by the node).
    MempoolEntry { txid: String },
    /// List txids currently in the node's mempool.
    Mempool,
    /// Report every new chain tip until interrupted.
    Watch {
        /// Poll interval in seconds.
        #[arg(long, default_value = "10")]
        interval: u64,
    },
}

impl Cli {
    /// Resolve the adapter configuration: defaults, then the config file,
    /// then explicit flags.
    pub fn rpc_config(&self) -> Result<RpcConfig, CoreError> {
        let mut config = match &self.config {
            Some(path) => RpcConfig::from_file(path)?,
            None => RpcConfig::default(),
        };

        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if self.rpc_user.is_some() {
            config.rpc_user = self.rpc_user.clone();
        }
        if self.rpc_pass.is_some() {
            config.rpc_pass = self.rpc_pass.clone();
        }
        if self.rpc_cookie_file.is_some() {
            config.rpc_cookie_file = self.rpc_cookie_file.clone();
        }
        if let Some(timeout) = self.rpc_timeout {
            config.rpc_timeout = timeout;
        }
        if self.rpc_requests_per_second.is_some() {
            config.rpc_requests_per_second = self.rpc_requests_per_second;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let cli = Cli::parse_from([
            "bcd",
            "--rpc-url",
            "http://10.0.0.2:7116",
            "--rpc-timeout",
            "5",
            "block",
            "12",
        ]);
        let config = cli.rpc_config().expect("config must resolve");
        assert_eq!(config.rpc_url, "http://10.0.0.2:7116");
        assert_eq!(config.rpc_timeout, 5);
        assert!(matches!(cli.command, Command::Block { ref id } if id == "12"));
    }

    #[test]
    fn watch_interval_defaults_to_ten_seconds() {
        let cli = Cli::parse_from(["bcd", "watch"]);
        assert!(matches!(cli.command, Command::Watch { interval: 10 }));
    }
}
