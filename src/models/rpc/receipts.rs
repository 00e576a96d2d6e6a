use alloy_primitives::{FixedBytes, U256};
use serde::Deserialize;

///////////////////////////////// eth_getTransactionReceipt ////////////////////////////

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
    pub transaction_hash: FixedBytes<32>,
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub status: Option<u64>,
    #[serde(with = "alloy_serde::quantity")]
    pub gas_used: u64,
    #[serde(default, with = "alloy_serde::quantity::opt")]
    pub effective_gas_price: Option<u128>,
    // Roll-up data fee. Absent on deposits and on nodes that predate it.
    #[serde(default)]
    pub l1_fee: Option<U256>,
    #[serde(default)]
    pub l1_gas_used: Option<U256>,
    #[serde(default)]
    pub l1_gas_price: Option<U256>,
    #[serde(default)]
    pub l1_fee_scalar: Option<String>,
}

impl ReceiptView {
    /// Total fee charged to the sender: execution gas at the effective price
    /// plus the L1 data fee. `gas_price` is used when the receipt predates
    /// `effectiveGasPrice`.
    pub fn transaction_fee(&self, gas_price: u128) -> U256 {
        let price = self.effective_gas_price.unwrap_or(gas_price);
        let execution_fee = U256::from(self.gas_used) * U256::from(price);
        execution_fee + self.l1_fee.unwrap_or_default()
    }

    pub fn succeeded(&self) -> Option<bool> {
        self.status.map(|status| status == 1)
    }
}
