//! Shared test helpers for `bcd-core` unit tests.
//!
//! Builders for deterministic ids and for node JSON shaped like verbose
//! `getrawtransaction` and verbosity-1 `getblock` results.

use bitcoin::hashes::Hash;
use bitcoin::{BlockHash, Txid};

// ==============================================================================
// Id Helpers
// ==============================================================================

/// Create a deterministic `Txid` from a single distinguishing byte.
pub fn txid_from_byte(b: u8) -> Txid {
    let mut bytes = [0u8; 32];
    bytes[0] = b;
    Txid::from_byte_array(bytes)
}

/// Create a deterministic `BlockHash` from a single distinguishing byte.
pub fn block_hash_from_byte(b: u8) -> BlockHash {
    let mut bytes = [0u8; 32];
    bytes[31] = b;
    BlockHash::from_byte_array(bytes)
}

// ==============================================================================
// Node JSON Builders
// ==============================================================================

/// Minimal P2PKH scriptPubKey: OP_DUP OP_HASH160 PUSH20 <hash> OP_EQUALVERIFY OP_CHECKSIG.
const P2PKH_SCRIPT_HEX: &str = "76a9140102030405060708090a0b0c0d0e0f101112131488ac";

/// A verbose transaction with one input and one P2PKH output. The input is a
/// coinbase when `funding` is `None`, otherwise it spends `funding:1`.
pub fn raw_tx_json(txid: Txid, funding: Option<Txid>, value: f64) -> serde_json::Value {
    let vin = match funding {
        None => serde_json::json!({
            "coinbase": "03a0860100",
            "sequence": 4294967295u32,
        }),
        Some(funding) => serde_json::json!({
            "txid": funding.to_string(),
            "vout": 1,
            "scriptSig": { "asm": "", "hex": "00" },
            "sequence": 4294967294u32,
        }),
    };
    serde_json::json!({
        "txid": txid.to_string(),
        "hex": "02000000",
        "version": 2,
        "locktime": 0,
        "vin": [vin],
        "vout": [{
            "value": value,
            "n": 0,
            "scriptPubKey": { "hex": P2PKH_SCRIPT_HEX, "type": "pubkeyhash" },
        }],
        "blockhash": block_hash_from_byte(1).to_string(),
        "confirmations": 3,
        "time": 1_500_000_000,
        "blocktime": 1_500_000_000,
    })
}

/// A verbosity-1 `getblock` result listing `txids` in order.
pub fn block_json(hash: BlockHash, height: u32, txids: &[Txid]) -> serde_json::Value {
    serde_json::json!({
        "hash": hash.to_string(),
        "previousblockhash": block_hash_from_byte(0xfe).to_string(),
        "height": height,
        "confirmations": 1,
        "size": 285,
        "time": 1_500_000_000,
        "tx": txids.iter().map(ToString::to_string).collect::<Vec<_>>(),
    })
}
