pub mod adapter;
pub mod chain;
pub mod config;
pub mod error;
pub mod observe;
pub mod parser;
pub mod rpc;
#[cfg(test)]
mod test_util;
pub mod types;

pub use adapter::{AdapterConfig, BdiamondRpc};
pub use config::RpcConfig;
pub use error::{CoreError, RpcError};
