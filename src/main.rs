use alloy_eips::BlockNumberOrTag;
use alloy_network::AnyNetwork;
use alloy_provider::RootProvider;
use alloy_rpc_client::RpcClient;
use anyhow::{Result, anyhow};
use std::io::Write;
use std::time::Duration;
use tokio::{signal, sync::broadcast, time::Instant};
use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};
use url::Url;

use rollup_fee_indexer::indexer::{self, rpc::client::JsonRpc, transformations::fees::FeeEngine};
use rollup_fee_indexer::metrics::Metrics;
use rollup_fee_indexer::utils::load_config;
use rollup_fee_indexer::utils::retry::{RetryConfig, retry};

const SLEEP_DURATION: u64 = 1000; // ms

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing. Stdout carries the operations, logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .with_writer(std::io::stderr)
        .init();

    info!("=========================== INITIALIZING ===========================");

    // Load config
    let config = match load_config("config.yml") {
        Ok(config) => {
            info!("Config loaded successfully");
            config
        }
        Err(e) => {
            error!("Failed to load config: {}", e);
            return Err(anyhow!(e));
        }
    };
    let chain = config.chain_config()?;
    let timeout = Duration::from_secs(config.request_timeout_secs);

    // Initialize optional metrics
    let metrics = if config.metrics.enabled {
        Some(Metrics::new(config.chain_name.clone())?)
    } else {
        info!("Metrics are disabled");
        None
    };

    // Start metrics server if metrics are enabled
    if let Some(metrics_instance) = &metrics {
        metrics_instance
            .start_metrics_server(&config.metrics.address, config.metrics.port)
            .await?;
    }

    // Create RPC client
    let rpc_url: Url = config.rpc_url.parse()?;
    info!("RPC URL: {}", rpc_url);
    let client = RpcClient::new_http(rpc_url);
    let provider = RootProvider::<AnyNetwork>::new(client.clone());

    // Verify the node serves the configured chain
    let chain_id = indexer::get_chain_id(&provider, metrics.as_ref()).await?;
    if chain_id != chain.chain_id {
        return Err(anyhow!(
            "RPC reports chain ID {} but chain ID {} is configured",
            chain_id,
            chain.chain_id
        ));
    }
    info!("Chain ID: {}, Bedrock block: {}", chain_id, chain.bedrock_block);

    let engine = FeeEngine::new(chain);

    // Create a shutdown signal handler
    let (shutdown_tx, mut shutdown_rx) = broadcast::channel::<()>(1);
    tokio::spawn(async move {
        if let Ok(()) = signal::ctrl_c().await {
            info!("Received Ctrl+C signal, initiating shutdown...");
            let _ = shutdown_tx.send(());
        }
    });

    let mut block_number = config.start_block.unwrap_or(0);
    info!("Starting block number: {}", block_number);

    info!("========================= STARTING INDEXER =========================");

    let retry_config = RetryConfig::default();
    let mut stdout = std::io::stdout().lock();

    let result = loop {
        if config.end_block.is_some_and(|end| block_number > end) {
            info!("Reached end block {}, stopping", block_number - 1);
            break Ok(());
        }

        // Get latest block number
        let latest_block = tokio::select! {
            _ = shutdown_rx.recv() => break Ok(()),
            latest = indexer::get_latest_block_number(&provider, metrics.as_ref()) => latest?,
        };

        // If indexer gets too close to tip, back off and retry
        if block_number > latest_block.saturating_sub(config.chain_tip_buffer) {
            info!(
                "Buffer limit reached. Waiting for block {} to be {} blocks behind tip {} - sleeping for 1s",
                block_number, config.chain_tip_buffer, latest_block
            );
            tokio::time::sleep(Duration::from_millis(SLEEP_DURATION)).await;
            continue;
        }

        let block_start_time = Instant::now();
        let selector = BlockNumberOrTag::Number(block_number);

        let processed = tokio::select! {
            _ = shutdown_rx.recv() => {
                info!("Shutting down main processing loop...");
                break Ok(());
            }
            processed = retry(
                || indexer::process_block(&client, &engine, selector, timeout, metrics.as_ref()),
                &retry_config,
                "process_block",
            ) => processed,
        };

        match processed {
            Ok(transactions) => {
                for transaction in &transactions {
                    let line = serde_json::to_string(transaction)?;
                    writeln!(stdout, "{line}")?;
                }
                stdout.flush()?;

                info!(
                    "Processed block {} with {} transactions",
                    block_number,
                    transactions.len()
                );

                // Update metrics
                if let Some(metrics_instance) = &metrics {
                    metrics_instance.record_block(
                        block_number,
                        block_start_time.elapsed(),
                        latest_block,
                    );
                }

                block_number += 1;
            }
            Err(e) if e.is_not_found() => {
                info!("{} - sleeping for 1s", e);
                tokio::time::sleep(Duration::from_millis(SLEEP_DURATION)).await;
            }
            Err(e) => {
                error!("Failed to process block {}: {}", block_number, e);
                break Err(anyhow!(e));
            }
        }
    };

    // The provider shares the client's transport
    drop(provider);
    client.close();
    result
}
