use alloy_primitives::{FixedBytes, U256};
use alloy_transport::TransportError;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("Unknown network preset: {network}")]
    UnknownNetwork { network: String },
    #[error("Either `network` or `chain` must be configured")]
    MissingChain,
    #[error("Fee override must never target the production chain (chain ID {chain_id})")]
    ProductionOverride { chain_id: u64 },
    #[error("Fee override targets chain ID {override_chain_id} but the configured chain ID is {chain_id}")]
    OverrideChainMismatch { chain_id: u64, override_chain_id: u64 },
}

#[derive(Error, Debug)]
pub enum LoaderError {
    #[error("RPC call {method} failed: {source}")]
    Transport {
        method: String,
        #[source]
        source: TransportError,
    },
    #[error("RPC call {method} timed out after {timeout:?}")]
    Timeout { method: String, timeout: Duration },
    #[error("{what} not found")]
    NotFound { what: String },
    #[error("Failed to decode {shape}: {source}")]
    Decode {
        shape: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum TransactionError {
    #[error("Missing required field in transaction: {field}")]
    MissingField { field: &'static str },
    #[error("Invalid block number in transaction {tx_hash}: {got}")]
    InvalidBlockNumber { tx_hash: FixedBytes<32>, got: String },
    #[error("Transaction {tx_hash} has no resolvable sender")]
    MissingSender { tx_hash: FixedBytes<32> },
    #[error("Failed to decode receipt for transaction {tx_hash}: {source}")]
    Receipt {
        tx_hash: FixedBytes<32>,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Error, Debug)]
pub enum FeeError {
    #[error("Failed to decode receipt for transaction {tx_hash}: {source}")]
    Decode {
        tx_hash: FixedBytes<32>,
        #[source]
        source: serde_json::Error,
    },
    #[error("Fee components of transaction {tx_hash} exceed its total fee {fee_amount}")]
    Underflow { tx_hash: FixedBytes<32>, fee_amount: U256 },
}

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error(transparent)]
    Loader(#[from] LoaderError),
    #[error(transparent)]
    Transaction(#[from] TransactionError),
    #[error(transparent)]
    Fee(#[from] FeeError),
}

impl IndexerError {
    /// Transport failures may succeed on a later attempt. Everything else is
    /// either a permanent property of the data or an absence the caller polls on.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            IndexerError::Loader(LoaderError::Transport { .. } | LoaderError::Timeout { .. })
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, IndexerError::Loader(LoaderError::NotFound { .. }))
    }
}
