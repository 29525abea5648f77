//! Bitcoin Diamond adapter over the generic JSON-RPC core.
//!
//! [`BdiamondRpc`] holds a [`BitcoinRpc`] implementation and overrides the
//! few operations where the Bitcoin Diamond node differs from Bitcoin Core:
//! it needs the legacy request dialect, and `getblock` cannot return full
//! transaction bodies reliably, so blocks are assembled from the txid list
//! one `getrawtransaction` at a time.

use std::sync::Arc;

use bitcoin::{BlockHash, Txid};
use tracing::debug;

use crate::chain::{ChainParams, MAINNET_PARAMS};
use crate::config::RpcConfig;
use crate::error::{CoreError, RpcError};
use crate::observe::{NotificationSink, Observer, TracingObserver};
use crate::parser::BdiamondParser;
use crate::rpc::{BitcoinRpc, ChainInfo, HttpRpcClient, JsonRpcProtocol};
use crate::types::{
    Block, BlockEnvelope, BlockHeader, MempoolEntry, NotificationType, Tx,
};

/// `getblock` verbosity that returns the header and the flat txid list.
pub const GET_BLOCK_VERBOSITY: u8 = 1;

pub const NETWORK_MAINNET: &str = "livenet";
pub const NETWORK_TESTNET: &str = "testnet";

// ==============================================================================
// Adapter Configuration
// ==============================================================================

/// Per-instance settings. Written at construction and by
/// [`BdiamondRpc::initialize`], read-only afterwards.
#[derive(Debug, Clone)]
pub struct AdapterConfig {
    pub rpc_protocol: JsonRpcProtocol,
    pub testnet: bool,
    /// `"livenet"` or `"testnet"` once initialized; empty before.
    pub network: String,
    pub supports_estimate_fee: bool,
    pub supports_estimate_smart_fee: bool,
    pub parser: BdiamondParser,
}

// ==============================================================================
// Adapter
// ==============================================================================

pub struct BdiamondRpc {
    rpc: Arc<dyn BitcoinRpc>,
    config: AdapterConfig,
    observer: Arc<dyn Observer>,
    notify: NotificationSink,
}

impl BdiamondRpc {
    /// Build the HTTP core from `config` and wire it for Bitcoin Diamond.
    ///
    /// Client construction errors are returned as-is. The adapter is not
    /// initialized; call [`initialize`](Self::initialize) before use.
    pub fn new(config: &RpcConfig, notify: NotificationSink) -> Result<Self, CoreError> {
        let client = HttpRpcClient::new(config)?.with_protocol(JsonRpcProtocol::V1);
        Ok(Self::with_backend(Arc::new(client), notify))
    }

    /// Wire an existing core. The backend is expected to speak
    /// [`JsonRpcProtocol::V1`], which is what the configuration records.
    pub fn with_backend(rpc: Arc<dyn BitcoinRpc>, notify: NotificationSink) -> Self {
        Self {
            rpc,
            config: AdapterConfig {
                rpc_protocol: JsonRpcProtocol::V1,
                testnet: false,
                network: String::new(),
                supports_estimate_fee: false,
                supports_estimate_smart_fee: true,
                parser: BdiamondParser::new(MAINNET_PARAMS),
            },
            observer: Arc::new(TracingObserver),
            notify,
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn Observer>) -> Self {
        self.observer = observer;
        self
    }

    /// Query the node's chain, classify it as main or test network, and
    /// install the matching parser.
    pub async fn initialize(&mut self) -> Result<(), CoreError> {
        let info = self
            .rpc
            .get_chain_info()
            .await
            .map_err(|err| CoreError::ChainInfoUnavailable(Box::new(err)))?;

        let params = ChainParams::for_chain(&info.chain);
        self.config.parser = BdiamondParser::new(params);

        if params.is_mainnet() {
            self.config.testnet = false;
            self.config.network = NETWORK_MAINNET.to_owned();
        } else {
            self.config.testnet = true;
            self.config.network = NETWORK_TESTNET.to_owned();
        }

        self.observer.chain_resolved(params.name);
        Ok(())
    }

    pub fn config(&self) -> &AdapterConfig {
        &self.config
    }

    pub fn is_testnet(&self) -> bool {
        self.config.testnet
    }

    pub fn network(&self) -> &str {
        &self.config.network
    }

    pub fn parser(&self) -> &BdiamondParser {
        &self.config.parser
    }

    // ==========================================================================
    // Block Assembly
    // ==========================================================================

    /// Return the block identified by `hash`, or by `height` when no hash is
    /// given, with every transaction body the node can produce.
    ///
    /// Transactions the node lists but reports as not found are left out;
    /// any other transaction failure aborts the whole call.
    pub async fn get_block(
        &self,
        hash: Option<BlockHash>,
        height: Option<u32>,
    ) -> Result<Block, CoreError> {
        let hash = match (hash, height) {
            (Some(hash), _) => hash,
            (None, Some(height)) if height > 0 => {
                self.get_block_hash(height).await.map_err(|source| {
                    CoreError::BlockIdentifierUnresolved {
                        height,
                        source: Box::new(source),
                    }
                })?
            }
            (None, height) => {
                return Err(CoreError::BlockIdentifierUnresolved {
                    height: height.unwrap_or(0),
                    source: Box::new(CoreError::InvalidData(
                        "neither a block hash nor a positive height was given".into(),
                    )),
                });
            }
        };

        let envelope = self
            .get_block_envelope(&hash)
            .await
            .map_err(|source| CoreError::BlockFetchFailed {
                hash,
                source: Box::new(source),
            })?;

        let txs = self.resolve_transactions(&envelope).await?;
        Ok(Block {
            header: envelope.header,
            txs,
        })
    }

    async fn get_block_envelope(&self, hash: &BlockHash) -> Result<BlockEnvelope, CoreError> {
        debug!(block = %hash, verbosity = GET_BLOCK_VERBOSITY, "rpc: getblock");
        let raw = self
            .rpc
            .get_block(hash, GET_BLOCK_VERBOSITY)
            .await
            .map_err(normalize_block_error)?;
        self.config.parser.parse_block_envelope(&raw)
    }

    /// Resolve the envelope's txids sequentially, in block order.
    async fn resolve_transactions(&self, envelope: &BlockEnvelope) -> Result<Vec<Tx>, CoreError> {
        let mut txs = Vec::with_capacity(envelope.txids.len());
        for txid in &envelope.txids {
            match classify_tx_resolution(self.get_transaction(txid).await)? {
                TxResolution::Resolved(tx) => txs.push(tx),
                TxResolution::Skipped(err) => {
                    self.observer.tx_skipped(&envelope.header.hash, txid, &err);
                }
            }
        }
        Ok(txs)
    }

    // ==========================================================================
    // Transactions and Mempool
    // ==========================================================================

    pub async fn get_transaction(&self, txid: &Txid) -> Result<Tx, CoreError> {
        let raw = self.rpc.get_raw_transaction(txid).await?;
        self.config.parser.parse_tx(&raw)
    }

    /// Same as [`get_transaction`](Self::get_transaction); the node has no
    /// cheaper mempool-specific query.
    pub async fn get_transaction_for_mempool(&self, txid: &Txid) -> Result<Tx, CoreError> {
        self.get_transaction(txid).await
    }

    /// Always fails: the node does not expose per-transaction mempool data.
    pub async fn get_mempool_entry(&self, _txid: &Txid) -> Result<MempoolEntry, CoreError> {
        Err(CoreError::NotImplemented("get_mempool_entry"))
    }

    pub async fn get_mempool_transactions(&self) -> Result<Vec<Txid>, CoreError> {
        self.rpc.get_raw_mempool().await
    }

    // ==========================================================================
    // Chain Queries
    // ==========================================================================

    pub async fn get_chain_info(&self) -> Result<ChainInfo, CoreError> {
        self.rpc.get_chain_info().await
    }

    pub async fn get_best_block_hash(&self) -> Result<BlockHash, CoreError> {
        self.rpc.get_best_block_hash().await
    }

    pub async fn get_best_block_height(&self) -> Result<u32, CoreError> {
        self.rpc.get_block_count().await
    }

    pub async fn get_block_hash(&self, height: u32) -> Result<BlockHash, CoreError> {
        self.rpc
            .get_block_hash(height)
            .await
            .map_err(normalize_block_error)
    }

    pub async fn get_block_header(&self, hash: &BlockHash) -> Result<BlockHeader, CoreError> {
        let raw = self
            .rpc
            .get_block_header(hash)
            .await
            .map_err(normalize_block_error)?;
        self.config.parser.parse_block_header(&raw)
    }

    /// Compare the node's tip with `last` and push a new-block notification
    /// when it moved. `None` counts as a change. Returns the new tip, if any.
    pub async fn poll_new_block(
        &self,
        last: Option<BlockHash>,
    ) -> Result<Option<BlockHash>, CoreError> {
        let best = self.rpc.get_best_block_hash().await?;
        if last == Some(best) {
            return Ok(None);
        }
        (self.notify)(NotificationType::NewBlock);
        Ok(Some(best))
    }
}

// ==============================================================================
// Transaction Resolution Classification
// ==============================================================================

/// Outcome of resolving one txid during block assembly.
#[derive(Debug)]
pub enum TxResolution {
    Resolved(Tx),
    /// The node listed the txid but could not produce its body.
    Skipped(CoreError),
}

/// Sort a resolution result into keep / skip; every error other than
/// [`CoreError::TxNotFound`] is passed back as fatal.
pub fn classify_tx_resolution(result: Result<Tx, CoreError>) -> Result<TxResolution, CoreError> {
    match result {
        Ok(tx) => Ok(TxResolution::Resolved(tx)),
        Err(err @ CoreError::TxNotFound(_)) => Ok(TxResolution::Skipped(err)),
        Err(err) => Err(err),
    }
}

// ==============================================================================
// Node Error Classification
// ==============================================================================

/// True for the two node messages that both mean the requested block does
/// not exist: lookup by unknown hash and lookup by a height past the tip.
pub fn is_block_not_found(err: &RpcError) -> bool {
    match err {
        RpcError::ServerError { message, .. } => {
            message == "Block not found" || message == "Block height out of range"
        }
        _ => false,
    }
}

fn normalize_block_error(err: CoreError) -> CoreError {
    match err {
        CoreError::Rpc(ref rpc) if is_block_not_found(rpc) => CoreError::BlockNotFound,
        other => other,
    }
}
