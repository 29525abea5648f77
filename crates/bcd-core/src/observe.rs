//! Diagnostic and notification seams injected into the adapter.

use std::sync::Arc;

use bitcoin::{BlockHash, Txid};
use tracing::{info, warn};

use crate::error::CoreError;
use crate::types::NotificationType;

/// Receives push notifications (new block, new transaction) for the
/// indexing client.
pub type NotificationSink = Arc<dyn Fn(NotificationType) + Send + Sync>;

/// A sink that drops every notification.
pub fn discard_notifications() -> NotificationSink {
    Arc::new(|_| {})
}

/// Diagnostic events raised by the adapter. None of them affect control flow.
pub trait Observer: Send + Sync {
    /// Chain parameters were resolved during initialization.
    fn chain_resolved(&self, chain_name: &str);

    /// A transaction listed in a block could not be materialized and was left
    /// out of the assembled block.
    fn tx_skipped(&self, block_hash: &BlockHash, txid: &Txid, error: &CoreError);
}

/// Default observer: forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn chain_resolved(&self, chain_name: &str) {
        info!(chain = chain_name, "rpc: block chain resolved");
    }

    fn tx_skipped(&self, block_hash: &BlockHash, txid: &Txid, error: &CoreError) {
        warn!(
            block = %block_hash,
            %txid,
            %error,
            "rpc: getblock: skipping transaction"
        );
    }
}
