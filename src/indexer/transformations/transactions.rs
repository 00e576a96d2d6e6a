use alloy_primitives::U256;
use serde_json::value::RawValue;

use crate::models::datasets::transactions::{NormalizedTransaction, TransactionPayload};
use crate::models::errors::TransactionError;
use crate::models::rpc::blocks::{HeaderView, RawTransactionRecord};
use crate::models::rpc::receipts::ReceiptView;
use crate::utils::parse_block_number;

pub trait TransactionNormalizer {
    fn normalize(self, header: &HeaderView) -> Result<NormalizedTransaction, TransactionError>;
}

impl TransactionNormalizer for RawTransactionRecord {
    fn normalize(self, header: &HeaderView) -> Result<NormalizedTransaction, TransactionError> {
        let (payload, extra) = match self {
            RawTransactionRecord::Legacy(tx) => (TransactionPayload::Legacy(tx.tx), tx.extra),
            RawTransactionRecord::Bedrock(tx) => (TransactionPayload::Bedrock(tx.tx), tx.extra),
        };

        let tx_hash = extra
            .tx_hash
            .ok_or(TransactionError::MissingField { field: "hash" })?;

        // Context attached by the node wins, the enclosing header fills gaps
        let block_number = match extra.block_number {
            Some(number) => parse_block_number(&number)
                .ok_or(TransactionError::InvalidBlockNumber { tx_hash, got: number })?,
            None => header.number,
        };
        let block_hash = extra.block_hash.unwrap_or(header.hash);

        let (from, gas_price, is_deposit) = match &payload {
            TransactionPayload::Legacy(tx) => {
                // L1 enqueued transactions are attributed to their L1 origin
                let l1_origin = if tx.is_l1_queued() {
                    tx.l1_tx_origin
                } else {
                    None
                };
                (extra.from.or(l1_origin), tx.gas_price, tx.is_l1_queued())
            }
            TransactionPayload::Bedrock(tx) => (
                extra.from,
                tx.gas_price.or(tx.max_fee_per_gas).unwrap_or_default(),
                tx.is_deposit(),
            ),
        };
        let from = from.ok_or(TransactionError::MissingSender { tx_hash })?;

        Ok(NormalizedTransaction {
            payload,
            tx_hash,
            from,
            block_number,
            block_hash,
            gas_price,
            fee_amount: None,
            fee_burned: None,
            receipt: None,
            miner: header.miner,
            author: header.author,
            is_deposit,
        })
    }
}

impl NormalizedTransaction {
    /// Takes the fee totals from the transaction's receipt and keeps the raw
    /// receipt for fee decomposition. Deposits keep no fee amount.
    pub fn apply_receipt(
        &mut self,
        raw: Box<RawValue>,
        base_fee_per_gas: Option<u128>,
    ) -> Result<(), TransactionError> {
        let receipt: ReceiptView =
            serde_json::from_str(raw.get()).map_err(|source| TransactionError::Receipt {
                tx_hash: self.tx_hash,
                source,
            })?;

        if !self.is_deposit {
            self.fee_amount = Some(receipt.transaction_fee(self.gas_price));
            self.fee_burned = match self.payload {
                TransactionPayload::Bedrock(_) => base_fee_per_gas
                    .map(|base_fee| U256::from(base_fee) * U256::from(receipt.gas_used)),
                TransactionPayload::Legacy(_) => None,
            };
        }
        self.receipt = Some(raw);

        Ok(())
    }
}
