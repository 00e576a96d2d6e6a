pub mod rpc;
pub mod transformations;

use alloy_eips::BlockNumberOrTag;
use alloy_network::AnyNetwork;
use alloy_provider::Provider;
use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::indexer::rpc::blocks::get_block;
use crate::indexer::rpc::client::{JsonRpc, RpcMethod};
use crate::indexer::rpc::receipts::get_transaction_receipts;
use crate::indexer::transformations::fees::FeeEngine;
use crate::indexer::transformations::transactions::TransactionNormalizer;
use crate::metrics::Metrics;
use crate::models::datasets::operations::TransactionOperations;
use crate::models::errors::IndexerError;
use crate::utils::retry::{RetryConfig, retry};

pub async fn get_chain_id<P>(provider: &P, metrics: Option<&Metrics>) -> Result<u64>
where
    P: Provider<AnyNetwork>,
{
    let retry_config = RetryConfig::default();
    retry(
        || async {
            let start = Instant::now();

            // Record metrics if enabled
            if let Some(metrics) = metrics {
                metrics.record_rpc_request("eth_chainId");
            }

            let result = provider.get_chain_id().await;

            if let Some(metrics) = metrics {
                metrics.record_rpc_result("eth_chainId", start.elapsed(), result.is_err());
            }

            result.map_err(|e| {
                warn!("Failed to get chain ID. Error details:\n{:#?}", e);
                anyhow!("RPC error: {}", e)
            })
        },
        &retry_config,
        "get_chain_id",
    )
    .await
}

pub async fn get_latest_block_number<P>(provider: &P, metrics: Option<&Metrics>) -> Result<u64>
where
    P: Provider<AnyNetwork>,
{
    let retry_config = RetryConfig::default();
    retry(
        || async {
            let start = Instant::now();

            if let Some(metrics) = metrics {
                metrics.record_rpc_request("eth_blockNumber");
            }

            let result = provider.get_block_number().await;

            // Record metrics if enabled
            if let Some(metrics) = metrics {
                metrics.record_rpc_result("eth_blockNumber", start.elapsed(), result.is_err());
            }

            result.map_err(|e| {
                warn!("Failed to get latest block number. Error details:\n{:#?}", e);
                anyhow!("RPC error: {}", e)
            })
        },
        &retry_config,
        "get_latest_block_number",
    )
    .await
}

/// Loads one block with its receipts and returns the fee operations of every
/// transaction in block order. Any failure fails the whole block; nothing is
/// returned for a partially processed block.
pub async fn process_block<C>(
    client: &C,
    engine: &FeeEngine,
    block: BlockNumberOrTag,
    timeout: Duration,
    metrics: Option<&Metrics>,
) -> Result<Vec<TransactionOperations>, IndexerError>
where
    C: JsonRpc + ?Sized,
{
    let chain = engine.chain();

    // Get block with full transactions
    let (header, body) = get_block(
        client,
        RpcMethod::GetBlockByNumber.as_str(),
        block,
        chain,
        timeout,
        metrics,
    )
    .await?;

    // Normalize transactions against the enclosing header
    let mut transactions = body
        .into_records()
        .into_iter()
        .map(|record| record.normalize(&header))
        .collect::<Result<Vec<_>, _>>()?;

    if transactions.is_empty() {
        debug!("Block {} has no transactions", header.number);
        return Ok(vec![]);
    }

    // Get receipts in one batch
    let tx_hashes = transactions.iter().map(|tx| tx.tx_hash).collect::<Vec<_>>();
    let receipts = get_transaction_receipts(client, &tx_hashes, timeout, metrics).await?;

    let block_time =
        DateTime::<Utc>::from_timestamp(header.timestamp as i64, 0).unwrap_or_default();

    let mut output = Vec::with_capacity(transactions.len());
    for (tx, receipt) in transactions.iter_mut().zip(receipts) {
        tx.apply_receipt(receipt?, header.base_fee_per_gas)?;

        let operations = engine.applied_fee_operations(tx)?;
        if let Some(metrics) = metrics {
            metrics.record_operations(operations.len());
        }

        output.push(TransactionOperations {
            chain_id: chain.chain_id,
            block_time,
            block_number: tx.block_number,
            block_hash: tx.block_hash,
            tx_hash: tx.tx_hash,
            operations,
        });
    }

    debug!(
        "Block {} produced operations for {} transactions",
        header.number,
        output.len()
    );

    Ok(output)
}
