//! Domain types handed to the indexing client.
//!
//! Contains the block model (`BlockHeader`, `BlockEnvelope`, `Block`), the
//! resolved transaction model (`Tx`, `TxInput`, `TxOutput`), the mempool
//! entry shape, and shared enums like `ScriptType` and `BlockHeight`.

use bitcoin::{BlockHash, OutPoint, ScriptBuf, Txid};
use serde::{Deserialize, Serialize};

// ==============================================================================
// Script Type Classification
// ==============================================================================

/// Classifies a script output type. Detection is delegated to the `bitcoin`
/// crate's `Script::is_p2pkh()`, `is_p2sh()`, etc. methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScriptType {
    P2pk,
    P2pkh,
    P2sh,
    P2wpkh,
    P2wsh,
    P2tr,
    BareMultisig,
    OpReturn,
    Unknown,
}

impl std::fmt::Display for ScriptType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::P2pk => write!(f, "p2pk"),
            Self::P2pkh => write!(f, "p2pkh"),
            Self::P2sh => write!(f, "p2sh"),
            Self::P2wpkh => write!(f, "p2wpkh"),
            Self::P2wsh => write!(f, "p2wsh"),
            Self::P2tr => write!(f, "p2tr"),
            Self::BareMultisig => write!(f, "bare_multisig"),
            Self::OpReturn => write!(f, "op_return"),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

// ==============================================================================
// Block Height
// ==============================================================================

/// A block height, wrapped for type safety.
///
/// `#[serde(transparent)]` keeps the JSON representation a bare integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockHeight(pub u32);

impl From<u32> for BlockHeight {
    fn from(h: u32) -> Self {
        Self(h)
    }
}

impl From<BlockHeight> for u32 {
    fn from(h: BlockHeight) -> Self {
        h.0
    }
}

impl std::ops::Deref for BlockHeight {
    type Target = u32;
    fn deref(&self) -> &u32 {
        &self.0
    }
}

impl std::fmt::Display for BlockHeight {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

// ==============================================================================
// Block Types
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub hash: BlockHash,
    pub prev_hash: Option<BlockHash>,
    /// `None` for the current chain tip.
    pub next_hash: Option<BlockHash>,
    pub height: BlockHeight,
    /// Negative when the block is no longer on the main chain.
    pub confirmations: i64,
    pub size: u64,
    pub time: i64,
}

/// A block as returned by `getblock` with verbosity 1: the header plus the
/// ordered list of transaction ids, without transaction bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEnvelope {
    pub header: BlockHeader,
    pub txids: Vec<Txid>,
}

/// A block with every resolvable transaction body attached, in block order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub txs: Vec<Tx>,
}

// ==============================================================================
// Transaction Types
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tx {
    pub txid: Txid,
    /// Raw serialized transaction, when the node includes it.
    pub hex: Option<String>,
    pub version: i32,
    pub locktime: u32,
    pub inputs: Vec<TxInput>,
    pub outputs: Vec<TxOutput>,
    /// `None` for unconfirmed (mempool) transactions.
    pub block_hash: Option<BlockHash>,
    pub confirmations: u32,
    pub time: i64,
    pub block_time: i64,
}

impl Tx {
    /// A coinbase transaction has exactly one input whose prevout is `None`.
    pub fn is_coinbase(&self) -> bool {
        self.inputs.len() == 1 && self.inputs[0].prevout.is_none()
    }

    /// Sum of all output values in base units.
    pub fn total_output_value(&self) -> u64 {
        self.outputs.iter().map(|o| o.value).sum()
    }
}

/// A transaction input. For coinbase inputs, `prevout` is `None` and
/// `coinbase` carries the coinbase script hex.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxInput {
    pub prevout: Option<OutPoint>,
    pub coinbase: Option<String>,
    pub script_sig_hex: Option<String>,
    pub sequence: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxOutput {
    pub n: u32,
    /// Value in the chain's smallest unit.
    pub value: u64,
    pub script_pub_key: ScriptBuf,
    pub script_type: ScriptType,
    pub addresses: Vec<String>,
}

// ==============================================================================
// Mempool
// ==============================================================================

/// Per-transaction mempool metadata. The Bitcoin Diamond node offers no RPC
/// this adapter can use to fill it, so it is never produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MempoolEntry {
    pub size: u32,
    pub fee: u64,
    pub modified_fee: u64,
    pub time: u64,
    pub height: u32,
    pub descendant_count: u32,
    pub ancestor_count: u32,
    pub depends: Vec<Txid>,
}

// ==============================================================================
// Notifications
// ==============================================================================

/// Events pushed to the [`NotificationSink`](crate::observe::NotificationSink).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationType {
    /// The chain tip changed; raised by `poll_new_block`.
    NewBlock,
    /// Part of the sink contract for clients that also subscribe to mempool
    /// arrivals. The adapter has no mempool feed and never raises it.
    NewTx,
}
