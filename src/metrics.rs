use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use anyhow::Result;
use axum::{Router, http::StatusCode, routing::get};
use opentelemetry::KeyValue;
use opentelemetry::metrics::{Counter, Gauge, Histogram, MeterProvider};
use opentelemetry_sdk::metrics::{MetricError, SdkMeterProvider};
use prometheus::{Encoder, TextEncoder};
use std::net::SocketAddr;

pub struct Metrics {
    registry: Arc<prometheus::Registry>,
    _provider: SdkMeterProvider,
    pub chain_name: String,

    // Block processing metrics
    pub blocks_processed: Counter<u64>,
    pub latest_processed_block: Gauge<u64>,
    pub latest_block_processing_time: Gauge<f64>,

    // Chain metrics
    pub chain_tip_block: Gauge<u64>,
    pub chain_tip_lag: Gauge<u64>,

    // RPC metrics
    pub rpc_requests: Counter<u64>,
    pub rpc_errors: Counter<u64>,
    pub rpc_latency: Histogram<f64>,

    // Ledger output metrics
    pub operations_emitted: Counter<u64>,
    pub transactions_without_fees: Counter<u64>,
}

impl Metrics {
    pub fn new(chain_name: String) -> Result<Self, MetricError> {
        // Create a new prometheus registry
        let registry = prometheus::Registry::new();

        // Configure OpenTelemetry to use this registry
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        // Set up a meter to create instruments
        let provider = SdkMeterProvider::builder().with_reader(exporter).build();
        let meter = provider.meter("fee_indexer_metrics");

        let blocks_processed = meter
            .u64_counter("indexer_blocks_processed")
            .with_description("Total number of blocks processed")
            .build();

        let latest_processed_block = meter
            .u64_gauge("indexer_latest_processed_block_number")
            .with_description("Latest block number processed")
            .build();

        let latest_block_processing_time = meter
            .f64_gauge("indexer_latest_block_processing")
            .with_description("Time spent processing the latest block")
            .build();

        let chain_tip_block = meter
            .u64_gauge("indexer_chain_tip_block_number")
            .with_description("Latest block number on chain")
            .build();

        let chain_tip_lag = meter
            .u64_gauge("indexer_chain_tip_lag")
            .with_description("Number of blocks behind chain tip")
            .build();

        let rpc_requests = meter
            .u64_counter("indexer_rpc_requests")
            .with_description("Number of RPC requests made")
            .build();

        let rpc_errors = meter
            .u64_counter("indexer_rpc_errors")
            .with_description("Number of RPC errors encountered")
            .build();

        let rpc_latency = meter
            .f64_histogram("indexer_rpc_latency")
            .with_description("RPC request latency")
            .with_boundaries(vec![
                0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 1.0, 5.0, 10.0,
            ])
            .with_unit("s")
            .build();

        let operations_emitted = meter
            .u64_counter("indexer_fee_operations_emitted")
            .with_description("Number of fee operations emitted")
            .build();

        let transactions_without_fees = meter
            .u64_counter("indexer_transactions_without_fees")
            .with_description("Transactions that produced no fee operations (deposits, unknown fee)")
            .build();

        Ok(Self {
            registry: Arc::new(registry),
            _provider: provider,
            chain_name,
            blocks_processed,
            latest_processed_block,
            latest_block_processing_time,
            chain_tip_block,
            chain_tip_lag,
            rpc_requests,
            rpc_errors,
            rpc_latency,
            operations_emitted,
            transactions_without_fees,
        })
    }

    fn chain_label(&self) -> KeyValue {
        KeyValue::new("chain", self.chain_name.clone())
    }

    pub fn record_rpc_request(&self, method: &str) {
        self.rpc_requests.add(
            1,
            &[self.chain_label(), KeyValue::new("method", method.to_string())],
        );
    }

    pub fn record_rpc_result(&self, method: &str, elapsed: Duration, is_error: bool) {
        let labels = [self.chain_label(), KeyValue::new("method", method.to_string())];
        self.rpc_latency.record(elapsed.as_secs_f64(), &labels);
        if is_error {
            self.rpc_errors.add(1, &labels);
        }
    }

    pub fn record_block(&self, block_number: u64, elapsed: Duration, chain_tip: u64) {
        let labels = [self.chain_label()];
        self.blocks_processed.add(1, &labels);
        self.latest_processed_block.record(block_number, &labels);
        self.latest_block_processing_time
            .record(elapsed.as_secs_f64(), &labels);
        self.chain_tip_block.record(chain_tip, &labels);
        self.chain_tip_lag
            .record(chain_tip.saturating_sub(block_number), &labels);
    }

    pub fn record_operations(&self, operations: usize) {
        let labels = [self.chain_label()];
        if operations == 0 {
            self.transactions_without_fees.add(1, &labels);
        } else {
            self.operations_emitted.add(operations as u64, &labels);
        }
    }

    pub async fn start_metrics_server(&self, addr: &str, port: u16) -> Result<()> {
        let addr = format!("{addr}:{port}").parse::<SocketAddr>()?;
        let registry = self.registry.clone();

        let app = Router::new().route("/metrics", get(move || metrics_handler(registry.clone())));

        // Determine the access URL based on the binding address. Only used for logging.
        let access_url = if addr.ip().to_string() == "0.0.0.0" {
            format!("http://localhost:{port}/metrics")
        } else {
            format!("http://{}:{port}/metrics", addr.ip())
        };

        info!(
            "Starting metrics server - binding to {} (accessible at {})",
            addr, access_url
        );

        let listener = tokio::net::TcpListener::bind(addr).await?;

        // Spawn the server in a separate task
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("Metrics server stopped: {}", e);
            }
        });

        Ok(())
    }
}

async fn metrics_handler(registry: Arc<prometheus::Registry>) -> Result<String, StatusCode> {
    let encoder = TextEncoder::new();
    let metric_families = registry.gather();
    let mut buffer = vec![];
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?;
    String::from_utf8(buffer).map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}
