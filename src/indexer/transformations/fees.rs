use alloy_primitives::U256;
use serde_json::value::RawValue;
use tracing::debug;

use crate::indexer::transformations::operations::OperationBuilder;
use crate::models::common::{ChainConfig, OPTIMISM_CHAIN_ID};
use crate::models::datasets::operations::{Amount, Currency, LedgerOperation, OperationType};
use crate::models::datasets::transactions::{NormalizedTransaction, TransactionPayload};
use crate::models::errors::FeeError;
use crate::models::rpc::receipts::ReceiptView;

/// Splits a transaction's fee payment into ledger operations for one chain.
///
/// Holds only immutable chain parameters, so one engine can be shared across
/// any number of concurrent block workers.
#[derive(Debug, Clone)]
pub struct FeeEngine {
    chain: ChainConfig,
    currency: Currency,
}

impl FeeEngine {
    pub fn new(chain: ChainConfig) -> Self {
        Self {
            chain,
            currency: Currency::native(),
        }
    }

    pub fn chain(&self) -> &ChainConfig {
        &self.chain
    }

    /// Fee operations of a transaction against the receipt it carries. Without
    /// an applied receipt the total fee is unknown and the list is empty.
    pub fn applied_fee_operations(
        &self,
        tx: &NormalizedTransaction,
    ) -> Result<Vec<LedgerOperation>, FeeError> {
        match tx.receipt.as_deref() {
            Some(receipt) => self.fee_operations(tx, receipt),
            None => Ok(vec![]),
        }
    }

    /// Returns the fee operations of `tx`, or an empty list when the
    /// transaction is a deposit or its total fee is unknown.
    ///
    /// Post-Bedrock the fee is split four ways:
    /// 0. sender debit of the total fee
    /// 1. fee recipient credit of the sequencer fee
    /// 2. base fee vault credit of the base fee
    /// 3. L1 fee vault credit of the L1 data fee
    ///
    /// Pre-Bedrock the fee recipient is credited the total fee.
    pub fn fee_operations(
        &self,
        tx: &NormalizedTransaction,
        receipt: &RawValue,
    ) -> Result<Vec<LedgerOperation>, FeeError> {
        if tx.is_deposit {
            return Ok(vec![]);
        }
        let Some(fee_amount) = tx.fee_amount else {
            debug!(
                "Transaction {} has no fee amount, skipping fee operations",
                tx.tx_hash
            );
            return Ok(vec![]);
        };

        let receipt: ReceiptView =
            serde_json::from_str(receipt.get()).map_err(|source| FeeError::Decode {
                tx_hash: tx.tx_hash,
                source,
            })?;

        let mut operations = match tx.payload {
            TransactionPayload::Legacy(_) => self.legacy_fee_operations(tx, fee_amount),
            TransactionPayload::Bedrock(_) => {
                self.bedrock_fee_operations(tx, fee_amount, receipt.l1_fee)?
            }
        };

        if self.zero_fee_override_applies(tx.gas_price, tx.block_number) {
            debug!(
                "Zeroing fee operations of transaction {} at block {}",
                tx.tx_hash, tx.block_number
            );
            for op in operations
                .iter_mut()
                .filter(|op| op.op_type == OperationType::Fee)
            {
                op.amount = Amount::zero(self.currency.clone());
            }
        }

        Ok(operations)
    }

    fn bedrock_fee_operations(
        &self,
        tx: &NormalizedTransaction,
        fee_amount: U256,
        l1_fee: Option<U256>,
    ) -> Result<Vec<LedgerOperation>, FeeError> {
        let fee_burned = tx.fee_burned.unwrap_or_default();
        let l1_fee = l1_fee.unwrap_or_default();

        let sequencer_fee = fee_amount
            .checked_sub(fee_burned)
            .and_then(|fee| fee.checked_sub(l1_fee))
            .ok_or(FeeError::Underflow {
                tx_hash: tx.tx_hash,
                fee_amount,
            })?;

        let mut builder = OperationBuilder::with_capacity(4);
        let debit = builder.push(
            OperationType::Fee,
            tx.from,
            Amount::debit(fee_amount, self.currency.clone()),
            None,
        );
        builder.push(
            OperationType::Fee,
            tx.fee_recipient(),
            Amount::credit(sequencer_fee, self.currency.clone()),
            Some(debit),
        );
        builder.push(
            OperationType::Fee,
            self.chain.base_fee_vault,
            Amount::credit(fee_burned, self.currency.clone()),
            Some(debit),
        );
        builder.push(
            OperationType::Fee,
            self.chain.l1_fee_vault,
            Amount::credit(l1_fee, self.currency.clone()),
            Some(debit),
        );

        Ok(builder.build())
    }

    fn legacy_fee_operations(
        &self,
        tx: &NormalizedTransaction,
        fee_amount: U256,
    ) -> Vec<LedgerOperation> {
        let mut builder = OperationBuilder::with_capacity(2);
        let debit = builder.push(
            OperationType::Fee,
            tx.from,
            Amount::debit(fee_amount, self.currency.clone()),
            None,
        );
        builder.push(
            OperationType::Fee,
            tx.fee_recipient(),
            Amount::credit(fee_amount, self.currency.clone()),
            Some(debit),
        );
        builder.build()
    }

    /// The override chain did not charge fees for zero gas price transactions
    /// below the enforcement height. Never applies on the production chain,
    /// whether or not the chain parameters were validated.
    pub fn zero_fee_override_applies(&self, gas_price: u128, block_number: u64) -> bool {
        match &self.chain.fee_override {
            Some(fee_override) => {
                self.chain.chain_id != OPTIMISM_CHAIN_ID
                    && self.chain.chain_id == fee_override.chain_id
                    && gas_price == 0
                    && block_number < fee_override.enforcement_block
            }
            None => false,
        }
    }
}
