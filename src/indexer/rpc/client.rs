use alloy_rpc_client::RpcClient;
use alloy_transport::{TransportErrorKind, TransportResult};
use futures::future::BoxFuture;
use serde_json::Value;
use serde_json::value::RawValue;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::metrics::Metrics;
use crate::models::errors::LoaderError;

/// Node RPC methods this indexer and its collaborators call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RpcMethod {
    GetBlockByNumber,
    GetTransactionReceipt,
    Call,
    EstimateGas,
}

impl RpcMethod {
    pub const ALL: [RpcMethod; 4] = [
        RpcMethod::GetBlockByNumber,
        RpcMethod::GetTransactionReceipt,
        RpcMethod::Call,
        RpcMethod::EstimateGas,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RpcMethod::GetBlockByNumber => "eth_getBlockByNumber",
            RpcMethod::GetTransactionReceipt => "eth_getTransactionReceipt",
            RpcMethod::Call => "eth_call",
            RpcMethod::EstimateGas => "eth_estimateGas",
        }
    }
}

#[derive(Debug, Clone)]
pub struct RpcRequest {
    pub method: String,
    pub params: Value,
}

impl RpcRequest {
    pub fn new(method: RpcMethod, params: Value) -> Self {
        Self {
            method: method.as_str().to_string(),
            params,
        }
    }
}

/// Raw JSON-RPC access to a node. Results are left undecoded so callers can
/// decode one payload into several views.
pub trait JsonRpc: Send + Sync {
    fn call<'a>(
        &'a self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, TransportResult<Box<RawValue>>>;

    /// Sends all requests in one round trip. Returns one result per request,
    /// in request order; a failed call never affects its siblings.
    fn batch_call<'a>(
        &'a self,
        requests: Vec<RpcRequest>,
    ) -> BoxFuture<'a, Vec<TransportResult<Box<RawValue>>>>;

    /// Releases this handle. The connection pool is shut down once the last
    /// handle to it is closed or dropped.
    fn close(self)
    where
        Self: Sized;
}

impl JsonRpc for RpcClient {
    fn call<'a>(
        &'a self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, TransportResult<Box<RawValue>>> {
        Box::pin(async move {
            self.request::<_, Box<RawValue>>(method.to_string(), params)
                .await
        })
    }

    fn batch_call<'a>(
        &'a self,
        requests: Vec<RpcRequest>,
    ) -> BoxFuture<'a, Vec<TransportResult<Box<RawValue>>>> {
        Box::pin(async move {
            let mut batch = self.new_batch();
            let waiters: Vec<_> = requests
                .iter()
                .map(|request| {
                    batch.add_call::<_, Box<RawValue>>(request.method.clone(), &request.params)
                })
                .collect();

            // A failed round trip fails every call in it
            if let Err(e) = batch.send().await {
                let message = e.to_string();
                return requests
                    .iter()
                    .map(|_| Err(TransportErrorKind::custom_str(&message)))
                    .collect();
            }

            let mut results = Vec::with_capacity(waiters.len());
            for waiter in waiters {
                results.push(match waiter {
                    Ok(waiter) => waiter.await,
                    Err(e) => Err(e),
                });
            }
            results
        })
    }

    fn close(self) {
        debug!("Closing RPC client handle");
        drop(self);
    }
}

/// Single call bounded by `timeout`. Dropping or timing out the future
/// abandons the request without side effects.
pub async fn call_with_timeout<C>(
    client: &C,
    method: &str,
    params: Value,
    timeout: Duration,
    metrics: Option<&Metrics>,
) -> Result<Box<RawValue>, LoaderError>
where
    C: JsonRpc + ?Sized,
{
    let start = Instant::now();

    if let Some(metrics) = metrics {
        metrics.record_rpc_request(method);
    }

    let result = match tokio::time::timeout(timeout, client.call(method, params)).await {
        Ok(Ok(raw)) => Ok(raw),
        Ok(Err(source)) => {
            warn!("RPC call {} failed. Error details:\n{:#?}", method, source);
            Err(LoaderError::Transport {
                method: method.to_string(),
                source,
            })
        }
        Err(_) => {
            warn!("RPC call {} timed out after {:?}", method, timeout);
            Err(LoaderError::Timeout {
                method: method.to_string(),
                timeout,
            })
        }
    };

    // Record metrics if enabled
    if let Some(metrics) = metrics {
        metrics.record_rpc_result(method, start.elapsed(), result.is_err());
    }

    result
}
