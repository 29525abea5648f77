//! Generic Bitcoin-family JSON-RPC core.
//!
//! Defines the [`BitcoinRpc`] trait the adapter is composed over, and
//! provides an HTTP JSON-RPC implementation ([`HttpRpcClient`]) plus a test
//! mock (`mock::MockRpc`).

mod http_adapter;
#[cfg(test)]
pub mod mock;
pub mod types;

pub use http_adapter::{HttpRpcClient, JsonRpcProtocol};
pub use types::ChainInfo;

use async_trait::async_trait;
use bitcoin::{BlockHash, Txid};

use crate::error::CoreError;

/// Node RPC methods the adapter builds on.
///
/// Block and transaction queries return the node's JSON untouched; turning
/// it into domain types is left to the chain parser. Implementations handle
/// authentication, connection management, and response decoding internally.
#[async_trait]
pub trait BitcoinRpc: Send + Sync {
    /// `getblockchaininfo`.
    async fn get_chain_info(&self) -> Result<ChainInfo, CoreError>;

    /// `getbestblockhash`.
    async fn get_best_block_hash(&self) -> Result<BlockHash, CoreError>;

    /// `getblockcount`.
    async fn get_block_count(&self) -> Result<u32, CoreError>;

    /// `getblockhash`.
    async fn get_block_hash(&self, height: u32) -> Result<BlockHash, CoreError>;

    /// `getblock` with an explicit verbosity level.
    async fn get_block(
        &self,
        hash: &BlockHash,
        verbosity: u8,
    ) -> Result<serde_json::Value, CoreError>;

    /// `getblockheader` in verbose form.
    async fn get_block_header(&self, hash: &BlockHash) -> Result<serde_json::Value, CoreError>;

    /// Verbose `getrawtransaction`. A transaction the node does not know
    /// must be reported as [`CoreError::TxNotFound`].
    async fn get_raw_transaction(&self, txid: &Txid) -> Result<serde_json::Value, CoreError>;

    /// `getrawmempool`.
    async fn get_raw_mempool(&self) -> Result<Vec<Txid>, CoreError>;
}
