//! JSON-RPC client for Bitcoin Core compatible endpoints.
//!
//! Implements [`BitcoinRpc`](super::BitcoinRpc) over HTTP using `reqwest`,
//! with basic or cookie auth, optional request rate limiting, and a
//! selectable request dialect ([`JsonRpcProtocol`]).

mod client;
mod connection;
mod protocol;

pub use client::HttpRpcClient;
pub use protocol::JsonRpcProtocol;
