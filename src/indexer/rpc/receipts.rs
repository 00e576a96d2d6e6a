use alloy_primitives::FixedBytes;
use serde_json::json;
use serde_json::value::RawValue;
use std::time::{Duration, Instant};
use tracing::warn;

use crate::indexer::rpc::client::{JsonRpc, RpcMethod, RpcRequest};
use crate::metrics::Metrics;
use crate::models::errors::LoaderError;

/// Fetches the raw receipts of `tx_hashes` in one batched request.
///
/// The outer error covers the whole batch timing out. Each inner result
/// belongs to the hash at the same position; a missing receipt is `NotFound`.
pub async fn get_transaction_receipts<C>(
    client: &C,
    tx_hashes: &[FixedBytes<32>],
    timeout: Duration,
    metrics: Option<&Metrics>,
) -> Result<Vec<Result<Box<RawValue>, LoaderError>>, LoaderError>
where
    C: JsonRpc + ?Sized,
{
    let method = RpcMethod::GetTransactionReceipt.as_str();
    let requests = tx_hashes
        .iter()
        .map(|hash| RpcRequest::new(RpcMethod::GetTransactionReceipt, json!([hash])))
        .collect::<Vec<_>>();

    let start = Instant::now();
    if let Some(metrics) = metrics {
        metrics.record_rpc_request(method);
    }

    let results = tokio::time::timeout(timeout, client.batch_call(requests))
        .await
        .map_err(|_| {
            warn!("Receipt batch of {} calls timed out after {:?}", tx_hashes.len(), timeout);
            LoaderError::Timeout {
                method: method.to_string(),
                timeout,
            }
        });

    let results = match results {
        Ok(results) => results,
        Err(e) => {
            if let Some(metrics) = metrics {
                metrics.record_rpc_result(method, start.elapsed(), true);
            }
            return Err(e);
        }
    };

    let mut results = results.into_iter();
    let receipts: Vec<_> = tx_hashes
        .iter()
        .map(|hash| match results.next() {
            Some(Ok(raw)) if is_empty(&raw) => Err(LoaderError::NotFound {
                what: format!("receipt for transaction {hash}"),
            }),
            Some(Ok(raw)) => Ok(raw),
            Some(Err(source)) => {
                warn!("Failed to get receipt for transaction {}: {}", hash, source);
                Err(LoaderError::Transport {
                    method: method.to_string(),
                    source,
                })
            }
            None => Err(LoaderError::NotFound {
                what: format!("receipt for transaction {hash}"),
            }),
        })
        .collect();

    if let Some(metrics) = metrics {
        let failed = receipts.iter().any(|r| r.is_err());
        metrics.record_rpc_result(method, start.elapsed(), failed);
    }

    Ok(receipts)
}

fn is_empty(raw: &RawValue) -> bool {
    let payload = raw.get().trim();
    payload.is_empty() || payload == "null"
}
