//! Chain-specific parsing of node JSON into the domain model.
//!
//! The parser is built from the resolved [`ChainParams`], which decide how
//! output scripts map to addresses. Bitcoin Diamond amounts carry seven
//! decimal places instead of Bitcoin's eight.

use bitcoin::{Address, BlockHash, OutPoint, Script, ScriptBuf, Txid};

use crate::chain::ChainParams;
use crate::error::CoreError;
use crate::types::{
    BlockEnvelope, BlockHeader, BlockHeight, ScriptType, Tx, TxInput, TxOutput,
};

pub const AMOUNT_DECIMAL_POINT: u32 = 7;

#[derive(Debug, Clone)]
pub struct BdiamondParser {
    params: ChainParams,
    amount_decimal_point: u32,
}

impl BdiamondParser {
    pub fn new(params: ChainParams) -> Self {
        Self {
            params,
            amount_decimal_point: AMOUNT_DECIMAL_POINT,
        }
    }

    pub fn params(&self) -> &ChainParams {
        &self.params
    }

    pub fn amount_decimal_point(&self) -> u32 {
        self.amount_decimal_point
    }

    /// Parse a verbose `getrawtransaction` result.
    pub fn parse_tx(&self, raw: &serde_json::Value) -> Result<Tx, CoreError> {
        let txid = parse_txid(raw.get("txid"), "txid")?;
        let version = parse_integer_required::<i32, true>(raw.get("version"), "version")?;
        let locktime = parse_integer_required::<u32, false>(raw.get("locktime"), "locktime")?;
        let block_hash = parse_opt_block_hash(raw.get("blockhash"), "blockhash")?;
        let confirmations =
            parse_integer_optional::<u32, false>(raw.get("confirmations")).unwrap_or(0);
        let time = parse_integer_optional::<i64, true>(raw.get("time")).unwrap_or(0);
        let block_time = parse_integer_optional::<i64, true>(raw.get("blocktime")).unwrap_or(0);
        let hex = raw
            .get("hex")
            .and_then(serde_json::Value::as_str)
            .map(str::to_owned);

        let vin = raw
            .get("vin")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| CoreError::InvalidData(format!("tx {txid}: missing vin array")))?;
        let vout = raw
            .get("vout")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| CoreError::InvalidData(format!("tx {txid}: missing vout array")))?;

        Ok(Tx {
            txid,
            hex,
            version,
            locktime,
            inputs: parse_vin(vin)?,
            outputs: self.parse_vout(vout)?,
            block_hash,
            confirmations,
            time,
            block_time,
        })
    }

    /// Parse a `getblock` result requested with verbosity 1.
    pub fn parse_block_envelope(&self, raw: &serde_json::Value) -> Result<BlockEnvelope, CoreError> {
        let header = self.parse_block_header(raw)?;
        let txids = raw
            .get("tx")
            .and_then(serde_json::Value::as_array)
            .ok_or_else(|| {
                CoreError::InvalidData(format!("block {}: missing tx array", header.hash))
            })?
            .iter()
            .map(|txid| parse_txid(Some(txid), "tx"))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(BlockEnvelope { header, txids })
    }

    /// Parse header fields shared by `getblock` and `getblockheader`.
    pub fn parse_block_header(&self, raw: &serde_json::Value) -> Result<BlockHeader, CoreError> {
        let hash = parse_opt_block_hash(raw.get("hash"), "hash")?
            .ok_or_else(|| CoreError::InvalidData("missing hash".into()))?;
        Ok(BlockHeader {
            hash,
            prev_hash: parse_opt_block_hash(raw.get("previousblockhash"), "previousblockhash")?,
            next_hash: parse_opt_block_hash(raw.get("nextblockhash"), "nextblockhash")?,
            height: BlockHeight(parse_integer_required::<u32, false>(
                raw.get("height"),
                "height",
            )?),
            confirmations: parse_integer_required::<i64, true>(
                raw.get("confirmations"),
                "confirmations",
            )?,
            size: parse_integer_optional::<u64, false>(raw.get("size")).unwrap_or(0),
            time: parse_integer_required::<i64, true>(raw.get("time"), "time")?,
        })
    }

    fn parse_vout(&self, vout: &[serde_json::Value]) -> Result<Vec<TxOutput>, CoreError> {
        vout.iter()
            .enumerate()
            .map(|(index, output)| {
                let value = self.parse_amount(
                    output
                        .get("value")
                        .ok_or_else(|| CoreError::InvalidData("missing value in vout".into()))?,
                )?;
                let n = parse_integer_optional::<u32, false>(output.get("n"))
                    .unwrap_or(index as u32);

                let script = parse_script_pubkey_from_json(output.get("scriptPubKey").ok_or_else(
                    || CoreError::InvalidData("missing scriptPubKey in vout".into()),
                )?)?;
                let script_type = classify_script(script.as_script());
                let addresses = Address::from_script(script.as_script(), self.params.network)
                    .map(|address| vec![address.to_string()])
                    .unwrap_or_default();

                Ok(TxOutput {
                    n,
                    value,
                    script_pub_key: script,
                    script_type,
                    addresses,
                })
            })
            .collect()
    }

    /// Parse an amount in whole coins into base units.
    ///
    /// Numbers go through `f64` so scientific notation is accepted; strings
    /// must be plain decimals with at most `amount_decimal_point` fraction
    /// digits.
    pub fn parse_amount(&self, value: &serde_json::Value) -> Result<u64, CoreError> {
        let scale = 10u64.pow(self.amount_decimal_point);
        match value {
            serde_json::Value::Number(n) => {
                let parsed = n
                    .as_f64()
                    .filter(|f| f.is_finite() && *f >= 0.0)
                    .ok_or_else(|| CoreError::InvalidData(format!("invalid amount `{value}`")))?;
                let units = (parsed * scale as f64).round();
                if units >= u64::MAX as f64 {
                    return Err(CoreError::InvalidData(format!("amount out of range `{value}`")));
                }
                Ok(units as u64)
            }
            serde_json::Value::String(s) => parse_decimal_amount(s, self.amount_decimal_point),
            _ => Err(CoreError::InvalidData(format!(
                "expected numeric amount, got: {value}"
            ))),
        }
    }
}

fn parse_decimal_amount(s: &str, decimals: u32) -> Result<u64, CoreError> {
    let invalid = || CoreError::InvalidData(format!("invalid amount `{s}`"));
    let (whole, frac) = s.split_once('.').unwrap_or((s, ""));
    if whole.is_empty() && frac.is_empty() {
        return Err(invalid());
    }
    if !whole.bytes().all(|b| b.is_ascii_digit())
        || !frac.bytes().all(|b| b.is_ascii_digit())
        || frac.len() > decimals as usize
    {
        return Err(invalid());
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| invalid())?
    };
    let frac_units: u64 = if frac.is_empty() {
        0
    } else {
        let padded = format!("{frac:0<width$}", width = decimals as usize);
        padded.parse().map_err(|_| invalid())?
    };

    whole
        .checked_mul(10u64.pow(decimals))
        .and_then(|units| units.checked_add(frac_units))
        .ok_or_else(invalid)
}

// ==============================================================================
// Script Classification
// ==============================================================================

#[must_use]
pub fn classify_script(script: &Script) -> ScriptType {
    if script.is_p2pk() {
        ScriptType::P2pk
    } else if script.is_p2pkh() {
        ScriptType::P2pkh
    } else if script.is_p2sh() {
        ScriptType::P2sh
    } else if script.is_p2wpkh() {
        ScriptType::P2wpkh
    } else if script.is_p2wsh() {
        ScriptType::P2wsh
    } else if script.is_p2tr() {
        ScriptType::P2tr
    } else if script.is_multisig() {
        ScriptType::BareMultisig
    } else if script.is_op_return() {
        ScriptType::OpReturn
    } else {
        ScriptType::Unknown
    }
}

// ==============================================================================
// Field Helpers
// ==============================================================================

fn parse_vin(vin: &[serde_json::Value]) -> Result<Vec<TxInput>, CoreError> {
    vin.iter()
        .map(|input| {
            let sequence = parse_integer_required::<u32, false>(input.get("sequence"), "sequence")?;
            let coinbase = input
                .get("coinbase")
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned);

            let prevout = if coinbase.is_some() {
                None
            } else {
                let prev_txid = parse_txid(input.get("txid"), "vin.txid")?;
                let prev_vout =
                    parse_integer_required::<u32, false>(input.get("vout"), "vin.vout")?;
                Some(OutPoint::new(prev_txid, prev_vout))
            };

            let script_sig_hex = input
                .get("scriptSig")
                .and_then(|s| s.get("hex"))
                .and_then(serde_json::Value::as_str)
                .map(str::to_owned);

            Ok(TxInput {
                prevout,
                coinbase,
                script_sig_hex,
                sequence,
            })
        })
        .collect()
}

fn parse_script_pubkey_from_json(spk: &serde_json::Value) -> Result<ScriptBuf, CoreError> {
    let hex_str = spk
        .get("hex")
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::InvalidData("missing hex in scriptPubKey".into()))?;
    ScriptBuf::from_hex(hex_str)
        .map_err(|e| CoreError::InvalidData(format!("invalid scriptPubKey hex: {e}")))
}

fn parse_txid(value: Option<&serde_json::Value>, field: &str) -> Result<Txid, CoreError> {
    let value = value
        .and_then(serde_json::Value::as_str)
        .ok_or_else(|| CoreError::InvalidData(format!("missing {field}")))?;
    value
        .parse()
        .map_err(|e| CoreError::InvalidData(format!("invalid {field}: {e}")))
}

fn parse_opt_block_hash(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Option<BlockHash>, CoreError> {
    match value.and_then(serde_json::Value::as_str) {
        None => Ok(None),
        Some(s) => s
            .parse()
            .map(Some)
            .map_err(|e| CoreError::InvalidData(format!("invalid {field}: {e}"))),
    }
}

fn parse_integer_required<T, const SIGNED: bool>(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<T, CoreError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, true>(value, field)?
        .ok_or_else(|| CoreError::InvalidData(format!("missing {field}")))
}

fn parse_integer_optional<T, const SIGNED: bool>(value: Option<&serde_json::Value>) -> Option<T>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    parse_integer::<T, SIGNED, false>(value, "value")
        .ok()
        .flatten()
}

// `REQUIRED=false` treats missing/null/type-mismatch as `Ok(None)`.
fn parse_integer<T, const SIGNED: bool, const REQUIRED: bool>(
    value: Option<&serde_json::Value>,
    field: &str,
) -> Result<Option<T>, CoreError>
where
    T: TryFrom<i64> + TryFrom<u64>,
{
    let missing_or_none = || {
        if REQUIRED {
            Err(CoreError::InvalidData(format!("missing {field}")))
        } else {
            Ok(None)
        }
    };

    let Some(value) = value else {
        return missing_or_none();
    };

    if SIGNED {
        let Some(n) = value.as_i64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| CoreError::InvalidData(format!("{field} out of range: {n}")))
    } else {
        let Some(n) = value.as_u64() else {
            return missing_or_none();
        };
        T::try_from(n)
            .map(Some)
            .map_err(|_| CoreError::InvalidData(format!("{field} out of range: {n}")))
    }
}
