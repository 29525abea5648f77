mod cli;

use std::sync::Arc;
use std::time::Duration;

use bitcoin::{BlockHash, Txid};
use clap::Parser;
use eyre::{eyre, WrapErr};

use bcd_core::observe::NotificationSink;
use bcd_core::types::NotificationType;
use bcd_core::BdiamondRpc;

use cli::Command;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::Cli::parse();

    // Logs go to stderr so stdout carries only command output.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .init();

    let config = args.rpc_config().wrap_err("load adapter configuration")?;

    let notify: NotificationSink = Arc::new(|notification: NotificationType| {
        tracing::info!(?notification, "node notification");
    });
    let mut rpc = BdiamondRpc::new(&config, notify).wrap_err("construct RPC adapter")?;

    rpc.initialize().await.map_err(|err| {
        let message = format_rpc_connect_error(&config.rpc_url, &err.to_string());
        eyre!(message).wrap_err("while initializing the Bitcoin Diamond adapter")
    })?;
    tracing::info!(
        network = rpc.network(),
        testnet = rpc.is_testnet(),
        "adapter initialized"
    );

    match args.command {
        Command::Info => {
            let info = rpc.get_chain_info().await.wrap_err("getblockchaininfo")?;
            let adapter = rpc.config();
            print_json(&serde_json::json!({
                "chain": info,
                "network": adapter.network.as_str(),
                "testnet": adapter.testnet,
                "supports_estimate_fee": adapter.supports_estimate_fee,
                "supports_estimate_smart_fee": adapter.supports_estimate_smart_fee,
                "magic": format!("{:#010x}", adapter.parser.params().net),
            }))
        }
        Command::Block { id } => {
            let block = match parse_block_id(&id)? {
                BlockId::Hash(hash) => rpc.get_block(Some(hash), None).await,
                BlockId::Height(height) => rpc.get_block(None, Some(height)).await,
            }
            .wrap_err_with(|| format!("get block `{id}`"))?;
            print_json(&block)
        }
        Command::Tx { txid } => {
            let txid = parse_txid(&txid)?;
            let tx = rpc
                .get_transaction(&txid)
                .await
                .wrap_err_with(|| format!("get transaction {txid}"))?;
            print_json(&tx)
        }
        Command::MempoolTx { txid } => {
            let txid = parse_txid(&txid)?;
            let tx = rpc
                .get_transaction_for_mempool(&txid)
                .await
                .wrap_err_with(|| format!("get mempool transaction {txid}"))?;
            print_json(&tx)
        }
        Command::MempoolEntry { txid } => {
            let txid = parse_txid(&txid)?;
            let entry = rpc
                .get_mempool_entry(&txid)
                .await
                .wrap_err_with(|| format!("get mempool entry {txid}"))?;
            print_json(&entry)
        }
        Command::Mempool => {
            let txids = rpc
                .get_mempool_transactions()
                .await
                .wrap_err("getrawmempool")?;
            print_json(&txids)
        }
        Command::Watch { interval } => watch(&rpc, Duration::from_secs(interval.max(1))).await,
    }
}

async fn watch(rpc: &BdiamondRpc, interval: Duration) -> eyre::Result<()> {
    let mut ticker = tokio::time::interval(interval);
    let mut last = None;
    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("interrupted; stopping watch");
                return Ok(());
            }
        }

        match rpc.poll_new_block(last).await {
            Ok(Some(tip)) => {
                last = Some(tip);
                let header = rpc
                    .get_block_header(&tip)
                    .await
                    .wrap_err_with(|| format!("get block header {tip}"))?;
                println!("{} {}", header.height, header.hash);
            }
            Ok(None) => {}
            Err(err) => tracing::warn!(error = %err, "tip poll failed"),
        }
    }
}

enum BlockId {
    Hash(BlockHash),
    Height(u32),
}

fn parse_block_id(id: &str) -> eyre::Result<BlockId> {
    if id.len() < 64 && id.bytes().all(|b| b.is_ascii_digit()) {
        let height = id
            .parse()
            .wrap_err_with(|| format!("invalid block height `{id}`"))?;
        return Ok(BlockId::Height(height));
    }
    let hash = id
        .parse()
        .wrap_err_with(|| format!("invalid block hash `{id}`"))?;
    Ok(BlockId::Hash(hash))
}

fn parse_txid(txid: &str) -> eyre::Result<Txid> {
    txid.parse()
        .wrap_err_with(|| format!("invalid txid `{txid}`"))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> eyre::Result<()> {
    let rendered = serde_json::to_string_pretty(value).wrap_err("serialize output")?;
    println!("{rendered}");
    Ok(())
}

fn format_rpc_connect_error(rpc_url: &str, source_error: &str) -> String {
    let mut lines = vec![
        format!("could not initialize against RPC endpoint `{rpc_url}`"),
        format!("RPC error: {source_error}"),
    ];

    if source_error.contains("dns error") {
        lines.push(
            "hint: hostname resolution failed; verify the endpoint hostname and your DNS/network"
                .into(),
        );
    } else if source_error.contains("Connection refused") || source_error.contains("connect") {
        lines.push("hint: is the node running with -server and the RPC port open?".into());
    } else if source_error.contains("decode JSON-RPC response") {
        lines.push(
            "hint: the endpoint did not answer with JSON-RPC; verify --rpc-user/--rpc-pass or the cookie file"
                .into(),
        );
    }

    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_block_id_accepts_height_and_hash() {
        assert!(matches!(parse_block_id("1024").expect("height"), BlockId::Height(1024)));
        let hash = format!("{}ff", "0".repeat(62));
        assert!(matches!(parse_block_id(&hash).expect("hash"), BlockId::Hash(_)));
        assert!(parse_block_id("not-a-block").is_err());
    }

    #[test]
    fn connect_error_adds_auth_hint_for_non_json_reply() {
        let message = format_rpc_connect_error(
            "http://127.0.0.1:7116",
            "invalid response: decode JSON-RPC response: EOF while parsing",
        );
        assert!(message.contains("hint: the endpoint did not answer with JSON-RPC"));
    }
}
