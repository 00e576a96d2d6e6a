use alloy_primitives::{Address, FixedBytes, U256};
use serde_json::value::RawValue;

use crate::models::common::Fork;
use crate::models::rpc::blocks::{BedrockTxPayload, LegacyTxPayload};

#[derive(Debug, Clone)]
pub enum TransactionPayload {
    Legacy(LegacyTxPayload),
    Bedrock(BedrockTxPayload),
}

/// Fork independent view of a transaction and the fee totals taken from its
/// receipt.
#[derive(Debug, Clone)]
pub struct NormalizedTransaction {
    pub payload: TransactionPayload,
    pub tx_hash: FixedBytes<32>,
    pub from: Address,
    pub block_number: u64,
    pub block_hash: FixedBytes<32>,
    pub gas_price: u128,
    /// Total fee charged. `None` until a receipt has been applied.
    pub fee_amount: Option<U256>,
    /// Base fee portion. On L2 it is credited to the base fee vault, not burnt.
    pub fee_burned: Option<U256>,
    pub receipt: Option<Box<RawValue>>,
    pub miner: Address,
    pub author: Option<Address>,
    pub is_deposit: bool,
}

impl NormalizedTransaction {
    pub fn fork(&self) -> Fork {
        match self.payload {
            TransactionPayload::Legacy(_) => Fork::Legacy,
            TransactionPayload::Bedrock(_) => Fork::Bedrock,
        }
    }

    /// Prefers the consensus client `author` over `miner`.
    pub fn fee_recipient(&self) -> Address {
        self.author.unwrap_or(self.miner)
    }
}
