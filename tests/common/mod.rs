use alloy_transport::{TransportErrorKind, TransportResult};
use futures::future::BoxFuture;
use serde_json::Value;
use serde_json::value::RawValue;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use rollup_fee_indexer::indexer::rpc::client::{JsonRpc, RpcRequest};

#[derive(Debug, Clone)]
enum Response {
    Payload(String),
    Error(String),
}

/// In-memory node. Responses are keyed by method and serialized params.
#[derive(Default)]
pub struct MockRpc {
    responses: Mutex<HashMap<(String, String), Response>>,
    delay: Option<Duration>,
    pub calls: AtomicUsize,
}

impl MockRpc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call sleeps for `delay` before answering.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn key(method: &str, params: &Value) -> (String, String) {
        (method.to_string(), params.to_string())
    }

    pub fn respond(&self, method: &str, params: Value, payload: &str) {
        self.responses.lock().unwrap().insert(
            Self::key(method, &params),
            Response::Payload(payload.to_string()),
        );
    }

    pub fn fail(&self, method: &str, params: Value, message: &str) {
        self.responses.lock().unwrap().insert(
            Self::key(method, &params),
            Response::Error(message.to_string()),
        );
    }

    fn lookup(&self, method: &str, params: &Value) -> TransportResult<Box<RawValue>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let response = self
            .responses
            .lock()
            .unwrap()
            .get(&Self::key(method, params))
            .cloned();

        match response {
            Some(Response::Payload(payload)) => RawValue::from_string(payload)
                .map_err(|e| TransportErrorKind::custom_str(&e.to_string())),
            Some(Response::Error(message)) => Err(TransportErrorKind::custom_str(&message)),
            // Unknown objects are reported the way nodes do
            None => Ok(RawValue::from_string("null".to_string()).unwrap()),
        }
    }

    async fn pause(&self) {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
    }
}

impl JsonRpc for MockRpc {
    fn call<'a>(
        &'a self,
        method: &'a str,
        params: Value,
    ) -> BoxFuture<'a, TransportResult<Box<RawValue>>> {
        Box::pin(async move {
            self.pause().await;
            self.lookup(method, &params)
        })
    }

    fn batch_call<'a>(
        &'a self,
        requests: Vec<RpcRequest>,
    ) -> BoxFuture<'a, Vec<TransportResult<Box<RawValue>>>> {
        Box::pin(async move {
            self.pause().await;
            requests
                .iter()
                .map(|request| self.lookup(&request.method, &request.params))
                .collect()
        })
    }

    fn close(self) {
        self.responses.lock().unwrap().clear();
    }
}
