use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, Txid};

use crate::error::{CoreError, RpcError};

use super::types::ChainInfo;
use super::BitcoinRpc;

/// A canned failure returned by [`MockRpc`] for a specific txid or block.
#[derive(Debug, Clone)]
pub enum MockFailure {
    /// The node reported the object as unknown.
    NotFound,
    Server { code: i64, message: String },
    Transport(String),
}

impl MockFailure {
    fn into_error(self, txid: Option<Txid>) -> CoreError {
        match (self, txid) {
            (Self::NotFound, Some(txid)) => CoreError::TxNotFound(txid),
            (Self::NotFound, None) => block_not_found(),
            (Self::Server { code, message }, _) => {
                CoreError::Rpc(RpcError::ServerError { code, message })
            }
            (Self::Transport(message), _) => CoreError::Rpc(RpcError::InvalidResponse(message)),
        }
    }
}

fn block_not_found() -> CoreError {
    CoreError::Rpc(RpcError::ServerError {
        code: -5,
        message: "Block not found".into(),
    })
}

/// A mock node for testing. Serves canned JSON for blocks and transactions
/// populated via the builder pattern, and records the calls it receives.
pub struct MockRpc {
    chain_info: Option<ChainInfo>,
    best_block_hash: Mutex<BlockHash>,
    heights: HashMap<u32, BlockHash>,
    blocks: HashMap<BlockHash, serde_json::Value>,
    block_failures: HashMap<BlockHash, MockFailure>,
    transactions: HashMap<Txid, serde_json::Value>,
    tx_failures: HashMap<Txid, MockFailure>,
    mempool: Vec<Txid>,
    chain_info_calls: AtomicUsize,
    block_calls: Mutex<Vec<(BlockHash, u8)>>,
    tx_calls: Mutex<Vec<Txid>>,
}

impl MockRpc {
    pub fn builder() -> MockRpcBuilder {
        MockRpcBuilder {
            chain_info: Some(ChainInfo {
                chain: "main".into(),
                blocks: 100,
                headers: 100,
                best_block_hash: BlockHash::all_zeros(),
                difficulty: 1.0,
                pruned: false,
            }),
            heights: HashMap::new(),
            blocks: HashMap::new(),
            block_failures: HashMap::new(),
            transactions: HashMap::new(),
            tx_failures: HashMap::new(),
            mempool: Vec::new(),
        }
    }

    pub fn chain_info_calls(&self) -> usize {
        self.chain_info_calls.load(Ordering::SeqCst)
    }

    pub fn block_calls(&self) -> Vec<(BlockHash, u8)> {
        self.block_calls.lock().expect("mock lock poisoned").clone()
    }

    pub fn tx_calls(&self) -> Vec<Txid> {
        self.tx_calls.lock().expect("mock lock poisoned").clone()
    }

    pub fn set_best_block_hash(&self, hash: BlockHash) {
        *self.best_block_hash.lock().expect("mock lock poisoned") = hash;
    }
}

pub struct MockRpcBuilder {
    chain_info: Option<ChainInfo>,
    heights: HashMap<u32, BlockHash>,
    blocks: HashMap<BlockHash, serde_json::Value>,
    block_failures: HashMap<BlockHash, MockFailure>,
    transactions: HashMap<Txid, serde_json::Value>,
    tx_failures: HashMap<Txid, MockFailure>,
    mempool: Vec<Txid>,
}

impl MockRpcBuilder {
    pub fn with_chain(mut self, chain: &str) -> Self {
        if let Some(info) = self.chain_info.as_mut() {
            info.chain = chain.to_owned();
        }
        self
    }

    /// Make `getblockchaininfo` fail.
    pub fn without_chain_info(mut self) -> Self {
        self.chain_info = None;
        self
    }

    /// Register a `getblock` result, indexed by its `hash` and `height`.
    pub fn with_block(mut self, raw: serde_json::Value) -> Self {
        let hash: BlockHash = raw["hash"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .expect("mock block needs a hash");
        if let Some(height) = raw["height"].as_u64() {
            self.heights.insert(height as u32, hash);
        }
        self.blocks.insert(hash, raw);
        self
    }

    pub fn with_block_failure(mut self, hash: BlockHash, failure: MockFailure) -> Self {
        self.block_failures.insert(hash, failure);
        self
    }

    /// Register a verbose `getrawtransaction` result, indexed by `txid`.
    pub fn with_tx(mut self, raw: serde_json::Value) -> Self {
        let txid: Txid = raw["txid"]
            .as_str()
            .and_then(|s| s.parse().ok())
            .expect("mock tx needs a txid");
        self.transactions.insert(txid, raw);
        self
    }

    pub fn with_tx_failure(mut self, txid: Txid, failure: MockFailure) -> Self {
        self.tx_failures.insert(txid, failure);
        self
    }

    pub fn with_mempool(mut self, txids: Vec<Txid>) -> Self {
        self.mempool = txids;
        self
    }

    pub fn build(self) -> MockRpc {
        let best = self
            .chain_info
            .as_ref()
            .map(|info| info.best_block_hash)
            .unwrap_or_else(BlockHash::all_zeros);
        MockRpc {
            chain_info: self.chain_info,
            best_block_hash: Mutex::new(best),
            heights: self.heights,
            blocks: self.blocks,
            block_failures: self.block_failures,
            transactions: self.transactions,
            tx_failures: self.tx_failures,
            mempool: self.mempool,
            chain_info_calls: AtomicUsize::new(0),
            block_calls: Mutex::new(Vec::new()),
            tx_calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BitcoinRpc for MockRpc {
    async fn get_chain_info(&self) -> Result<ChainInfo, CoreError> {
        self.chain_info_calls.fetch_add(1, Ordering::SeqCst);
        self.chain_info.clone().ok_or_else(|| {
            CoreError::Rpc(RpcError::InvalidResponse("mock: node unreachable".into()))
        })
    }

    async fn get_best_block_hash(&self) -> Result<BlockHash, CoreError> {
        Ok(*self.best_block_hash.lock().expect("mock lock poisoned"))
    }

    async fn get_block_count(&self) -> Result<u32, CoreError> {
        Ok(self.heights.keys().copied().max().unwrap_or(0))
    }

    async fn get_block_hash(&self, height: u32) -> Result<BlockHash, CoreError> {
        self.heights.get(&height).copied().ok_or_else(|| {
            CoreError::Rpc(RpcError::ServerError {
                code: -8,
                message: "Block height out of range".into(),
            })
        })
    }

    async fn get_block(
        &self,
        hash: &BlockHash,
        verbosity: u8,
    ) -> Result<serde_json::Value, CoreError> {
        self.block_calls
            .lock()
            .expect("mock lock poisoned")
            .push((*hash, verbosity));
        if let Some(failure) = self.block_failures.get(hash) {
            return Err(failure.clone().into_error(None));
        }
        self.blocks.get(hash).cloned().ok_or_else(block_not_found)
    }

    async fn get_block_header(&self, hash: &BlockHash) -> Result<serde_json::Value, CoreError> {
        let mut raw = self.blocks.get(hash).cloned().ok_or_else(block_not_found)?;
        if let Some(obj) = raw.as_object_mut() {
            obj.remove("tx");
        }
        Ok(raw)
    }

    async fn get_raw_transaction(&self, txid: &Txid) -> Result<serde_json::Value, CoreError> {
        self.tx_calls.lock().expect("mock lock poisoned").push(*txid);
        if let Some(failure) = self.tx_failures.get(txid) {
            return Err(failure.clone().into_error(Some(*txid)));
        }
        self.transactions
            .get(txid)
            .cloned()
            .ok_or(CoreError::TxNotFound(*txid))
    }

    async fn get_raw_mempool(&self) -> Result<Vec<Txid>, CoreError> {
        Ok(self.mempool.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;

    #[tokio::test]
    async fn unknown_height_reports_out_of_range() {
        let rpc = MockRpc::builder().build();
        let err = rpc.get_block_hash(5).await.expect_err("no blocks registered");
        assert!(err.to_string().contains("Block height out of range"));
    }

    #[tokio::test]
    async fn with_block_indexes_by_height() {
        let hash = block_hash_from_byte(9);
        let rpc = MockRpc::builder()
            .with_block(block_json(hash, 12, &[]))
            .build();
        assert_eq!(rpc.get_block_hash(12).await.expect("height registered"), hash);
        assert_eq!(rpc.get_block_count().await.expect("count"), 12);
        let header = rpc.get_block_header(&hash).await.expect("header");
        assert!(header.get("tx").is_none());
    }
}
