use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use serde::Deserialize;

/// OP Stack deposit transaction type. Deposits are minted by the protocol
/// from L1 and never pay an L2 gas fee.
pub const DEPOSIT_TX_TYPE_ID: u8 = 0x7e;

/// Queue origin of legacy transactions enqueued on L1.
pub const L1_QUEUE_ORIGIN: &str = "l1";

////////////////////////////////////// Header //////////////////////////////////////////
///////////////////////////////// eth_getBlockByNumber /////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderView {
    pub hash: FixedBytes<32>,
    pub parent_hash: FixedBytes<32>,
    #[serde(with = "alloy_serde::quantity")]
    pub number: u64,
    #[serde(with = "alloy_serde::quantity")]
    pub timestamp: u64,
    pub miner: Address,
    // Consensus clients name the block producer `author`
    #[serde(default)]
    pub author: Option<Address>,
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub base_fee_per_gas: Option<u128>,
    #[serde(rename = "uncles", default)]
    pub uncle_hashes: Vec<FixedBytes<32>>,
}

/////////////////////////////////// Transactions ///////////////////////////////////////

/// Context the node attaches next to the transaction payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TxExtraInfo {
    #[serde(default)]
    pub block_number: Option<String>,
    #[serde(default)]
    pub block_hash: Option<FixedBytes<32>>,
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(rename = "hash", default)]
    pub tx_hash: Option<FixedBytes<32>>,
}

// Pre-Bedrock (l2geth) transaction payload
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegacyTxPayload {
    #[serde(with = "alloy_serde::quantity")]
    pub nonce: u64,
    #[serde(with = "alloy_serde::quantity")]
    pub gas_price: u128,
    #[serde(with = "alloy_serde::quantity")]
    pub gas: u64,
    #[serde(default)]
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    #[serde(default)]
    pub queue_origin: Option<String>,
    #[serde(default)]
    pub l1_tx_origin: Option<Address>,
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub l1_block_number: Option<u64>,
}

impl LegacyTxPayload {
    pub fn is_l1_queued(&self) -> bool {
        self.queue_origin.as_deref() == Some(L1_QUEUE_ORIGIN)
    }
}

// Post-Bedrock transaction payload. Dynamic fee fields replace the single gas
// price for EIP-1559 transactions and deposits carry their own fields.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BedrockTxPayload {
    #[serde(rename = "type", default, with = "alloy_serde::quantity")]
    pub tx_type: u8,
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub nonce: Option<u64>,
    #[serde(with = "alloy_serde::quantity")]
    pub gas: u64,
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub gas_price: Option<u128>,
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub max_fee_per_gas: Option<u128>,
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub max_priority_fee_per_gas: Option<u128>,
    #[serde(default)]
    pub to: Option<Address>,
    pub value: U256,
    pub input: Bytes,
    #[serde(default)]
    pub source_hash: Option<FixedBytes<32>>,
    #[serde(default)]
    pub mint: Option<U256>,
    #[serde(default)]
    pub is_system_tx: Option<bool>,
}

impl BedrockTxPayload {
    pub fn is_deposit(&self) -> bool {
        self.tx_type == DEPOSIT_TX_TYPE_ID
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyRpcTransaction {
    #[serde(flatten)]
    pub tx: LegacyTxPayload,
    #[serde(flatten)]
    pub extra: TxExtraInfo,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BedrockRpcTransaction {
    #[serde(flatten)]
    pub tx: BedrockTxPayload,
    #[serde(flatten)]
    pub extra: TxExtraInfo,
}

/// A transaction as returned by the node, in the shape of its fork.
#[derive(Debug, Clone)]
pub enum RawTransactionRecord {
    Legacy(LegacyRpcTransaction),
    Bedrock(BedrockRpcTransaction),
}

/////////////////////////////////////// Bodies /////////////////////////////////////////

#[derive(Debug, Clone, Deserialize)]
pub struct LegacyBlockBody {
    pub hash: FixedBytes<32>,
    pub transactions: Vec<LegacyRpcTransaction>,
    #[serde(rename = "uncles", default)]
    pub uncle_hashes: Vec<FixedBytes<32>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BedrockBlockBody {
    pub hash: FixedBytes<32>,
    pub transactions: Vec<BedrockRpcTransaction>,
    #[serde(rename = "uncles", default)]
    pub uncle_hashes: Vec<FixedBytes<32>>,
}

#[derive(Debug, Clone)]
pub enum BlockBody {
    Legacy(LegacyBlockBody),
    Bedrock(BedrockBlockBody),
}

impl BlockBody {
    pub fn hash(&self) -> FixedBytes<32> {
        match self {
            BlockBody::Legacy(body) => body.hash,
            BlockBody::Bedrock(body) => body.hash,
        }
    }

    pub fn uncle_hashes(&self) -> &[FixedBytes<32>] {
        match self {
            BlockBody::Legacy(body) => &body.uncle_hashes,
            BlockBody::Bedrock(body) => &body.uncle_hashes,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            BlockBody::Legacy(body) => body.transactions.len(),
            BlockBody::Bedrock(body) => body.transactions.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn into_records(self) -> Vec<RawTransactionRecord> {
        match self {
            BlockBody::Legacy(body) => body
                .transactions
                .into_iter()
                .map(RawTransactionRecord::Legacy)
                .collect(),
            BlockBody::Bedrock(body) => body
                .transactions
                .into_iter()
                .map(RawTransactionRecord::Bedrock)
                .collect(),
        }
    }
}
