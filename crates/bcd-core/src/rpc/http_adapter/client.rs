use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use bitcoin::{BlockHash, Txid};
use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use reqwest::header;
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::config::RpcConfig;
use crate::error::{CoreError, RpcError};

use super::super::types::ChainInfo;
use super::super::BitcoinRpc;
use super::connection::{parse_connection, resolve_auth};
use super::protocol::{parse_jsonrpc_error, JsonRpcProtocol, JsonRpcResponse};

/// Bitcoin Core "invalid address or key", returned for unknown txids.
const RPC_INVALID_ADDRESS_OR_KEY: i64 = -5;

type DirectRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// JSON-RPC client over HTTP(S) for Bitcoin Core compatible nodes.
pub struct HttpRpcClient {
    client: reqwest::Client,
    url: String,
    auth: Option<(String, String)>,
    limiter: Option<DirectRateLimiter>,
    protocol: JsonRpcProtocol,
    next_id: AtomicU64,
}

impl HttpRpcClient {
    /// Create a client from adapter configuration.
    ///
    /// If `rpc_requests_per_second` is set, outbound requests are
    /// rate-limited. The request timeout is `rpc_timeout` seconds.
    pub fn new(config: &RpcConfig) -> Result<Self, CoreError> {
        let auth = resolve_auth(config)?;
        let url = parse_connection(&config.rpc_url)?;

        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.rpc_timeout))
            .pool_max_idle_per_host(32)
            .tcp_nodelay(true)
            .build()
            .map_err(RpcError::Transport)?;

        let limiter = match config.rpc_requests_per_second {
            None => None,
            Some(limit) => {
                let limit = NonZeroU32::new(limit).ok_or_else(|| {
                    CoreError::Config("rpc_requests_per_second must be at least 1".to_owned())
                })?;
                Some(RateLimiter::direct(Quota::per_second(limit)))
            }
        };

        Ok(Self {
            client,
            url,
            auth,
            limiter,
            protocol: JsonRpcProtocol::default(),
            next_id: AtomicU64::new(initial_request_id()),
        })
    }

    /// Replace the request dialect.
    pub fn with_protocol(mut self, protocol: JsonRpcProtocol) -> Self {
        self.protocol = protocol;
        self
    }

    pub fn protocol(&self) -> JsonRpcProtocol {
        self.protocol
    }

    async fn wait_for_rate_limit(&self) {
        if let Some(limiter) = &self.limiter {
            limiter.until_ready().await;
        }
    }

    async fn rpc_call(
        &self,
        method: &str,
        params: &[(&'static str, serde_json::Value)],
    ) -> Result<serde_json::Value, CoreError> {
        self.wait_for_rate_limit().await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(
            rpc.id = id,
            rpc.method = method,
            rpc.params = params.len(),
            rpc.protocol = self.protocol.version(),
            "rpc call"
        );
        let req = self.protocol.encode_request(id, method, params);

        let mut builder = self
            .client
            .post(&self.url)
            .header(header::CONTENT_TYPE, "application/json")
            .json(&req);
        if let Some((ref user, ref pass)) = self.auth {
            builder = builder.basic_auth(user, Some(pass));
        }

        let response = builder.send().await.map_err(RpcError::Transport)?;
        let status = response.status();

        let body = response.text().await.map_err(RpcError::Transport)?;
        debug!(rpc.id = id, rpc.method = method, %status, body_len = body.len(), "rpc response");
        trace!(rpc.id = id, rpc.method = method, body = %body, "rpc response body");

        let decoded: JsonRpcResponse = serde_json::from_str(&body).map_err(|e| {
            RpcError::InvalidResponse(format!("decode JSON-RPC response: {e}; body={body}"))
        })?;

        if let Some(err) = decoded.error.filter(|err| !err.is_null()) {
            return Err(parse_jsonrpc_error(err));
        }

        Ok(decoded.result.unwrap_or(serde_json::Value::Null))
    }

    async fn rpc_call_typed<T: DeserializeOwned>(
        &self,
        method: &str,
        params: &[(&'static str, serde_json::Value)],
    ) -> Result<T, CoreError> {
        let raw = self.rpc_call(method, params).await?;
        serde_json::from_value(raw).map_err(|e| {
            RpcError::InvalidResponse(format!("invalid {method} result: {e}")).into()
        })
    }
}

#[async_trait]
impl BitcoinRpc for HttpRpcClient {
    async fn get_chain_info(&self) -> Result<ChainInfo, CoreError> {
        self.rpc_call_typed("getblockchaininfo", &[]).await
    }

    async fn get_best_block_hash(&self) -> Result<BlockHash, CoreError> {
        self.rpc_call_typed("getbestblockhash", &[]).await
    }

    async fn get_block_count(&self) -> Result<u32, CoreError> {
        self.rpc_call_typed("getblockcount", &[]).await
    }

    async fn get_block_hash(&self, height: u32) -> Result<BlockHash, CoreError> {
        self.rpc_call_typed("getblockhash", &[("height", serde_json::json!(height))])
            .await
    }

    async fn get_block(
        &self,
        hash: &BlockHash,
        verbosity: u8,
    ) -> Result<serde_json::Value, CoreError> {
        self.rpc_call(
            "getblock",
            &[
                ("blockhash", serde_json::json!(hash.to_string())),
                ("verbosity", serde_json::json!(verbosity)),
            ],
        )
        .await
    }

    async fn get_block_header(&self, hash: &BlockHash) -> Result<serde_json::Value, CoreError> {
        self.rpc_call(
            "getblockheader",
            &[
                ("blockhash", serde_json::json!(hash.to_string())),
                ("verbose", serde_json::json!(true)),
            ],
        )
        .await
    }

    async fn get_raw_transaction(&self, txid: &Txid) -> Result<serde_json::Value, CoreError> {
        self.rpc_call(
            "getrawtransaction",
            &[
                ("txid", serde_json::json!(txid.to_string())),
                ("verbose", serde_json::json!(1)),
            ],
        )
        .await
        .map_err(|err| normalize_getrawtransaction_error(txid, err))
    }

    async fn get_raw_mempool(&self) -> Result<Vec<Txid>, CoreError> {
        self.rpc_call_typed("getrawmempool", &[]).await
    }
}

fn initial_request_id() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or(1)
}

// ==============================================================================
// RPC Error Normalization
// ==============================================================================

/// Convert "missing tx" JSON-RPC responses into `TxNotFound`, preserving
/// other RPC/transport failures as-is.
fn normalize_getrawtransaction_error(txid: &Txid, err: CoreError) -> CoreError {
    match err {
        CoreError::Rpc(RpcError::ServerError { code, .. }) if code == RPC_INVALID_ADDRESS_OR_KEY => {
            CoreError::TxNotFound(*txid)
        }
        other => other,
    }
}
