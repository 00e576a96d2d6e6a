use alloy_eips::BlockNumberOrTag;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use crate::indexer::rpc::client::{JsonRpc, call_with_timeout};
use crate::metrics::Metrics;
use crate::models::common::{ChainConfig, Fork};
use crate::models::errors::LoaderError;
use crate::models::rpc::blocks::{BlockBody, HeaderView};

/// Fetches one block with full transaction objects and decodes the single
/// payload into its header and its fork specific body.
pub async fn get_block<C>(
    client: &C,
    method: &str,
    selector: BlockNumberOrTag,
    chain: &ChainConfig,
    timeout: Duration,
    metrics: Option<&Metrics>,
) -> Result<(HeaderView, BlockBody), LoaderError>
where
    C: JsonRpc + ?Sized,
{
    let raw = call_with_timeout(client, method, json!([selector, true]), timeout, metrics).await?;

    decode_block(raw.get(), chain).map_err(|e| match e {
        LoaderError::NotFound { .. } => LoaderError::NotFound {
            what: format!("block {selector}"),
        },
        other => other,
    })
}

/// Both decodes must succeed. An empty or `null` payload means the node does
/// not have the block (yet).
pub fn decode_block(
    raw: &str,
    chain: &ChainConfig,
) -> Result<(HeaderView, BlockBody), LoaderError> {
    let payload = raw.trim();
    if payload.is_empty() || payload == "null" {
        return Err(LoaderError::NotFound {
            what: "block".to_string(),
        });
    }

    let header: HeaderView = decode(payload, "block header")?;

    let body = match chain.fork_at(header.number) {
        Fork::Legacy => BlockBody::Legacy(decode(payload, "legacy block body")?),
        Fork::Bedrock => BlockBody::Bedrock(decode(payload, "bedrock block body")?),
    };

    debug!(
        "Decoded block {} ({:?}) with {} transactions and {} uncles",
        header.number,
        chain.fork_at(header.number),
        body.len(),
        body.uncle_hashes().len()
    );

    Ok((header, body))
}

fn decode<T: DeserializeOwned>(payload: &str, shape: &'static str) -> Result<T, LoaderError> {
    serde_json::from_str(payload).map_err(|source| LoaderError::Decode { shape, source })
}
