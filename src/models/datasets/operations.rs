use alloy_primitives::{Address, FixedBytes, U256};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub const NATIVE_SYMBOL: &str = "ETH";
pub const NATIVE_DECIMALS: u32 = 18;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum OperationType {
    #[serde(rename = "FEE")]
    Fee,
    #[serde(rename = "PAYMENT")]
    Payment,
    #[serde(rename = "ERC20_MINT")]
    Erc20Mint,
    #[serde(rename = "ERC20_BURN")]
    Erc20Burn,
    // Deposit ("mint") and withdrawal ("burn") of the native currency
    #[serde(rename = "MINT")]
    Mint,
    #[serde(rename = "BURN")]
    Burn,
    #[serde(rename = "CALL")]
    Call,
    #[serde(rename = "CREATE")]
    Create,
    #[serde(rename = "CREATE2")]
    Create2,
    #[serde(rename = "SELFDESTRUCT")]
    SelfDestruct,
    #[serde(rename = "CALLCODE")]
    CallCode,
    #[serde(rename = "DELEGATECALL")]
    DelegateCall,
    #[serde(rename = "STATICCALL")]
    StaticCall,
    /// Synthetic deletion of a self-destructed account that still held funds
    /// at the end of the transaction.
    #[serde(rename = "DESTRUCT")]
    Destruct,
    #[serde(rename = "DELEGATE_VOTES")]
    DelegateVotes,
    #[serde(rename = "STOP")]
    Stop,
}

impl OperationType {
    pub const ALL: [OperationType; 16] = [
        OperationType::Fee,
        OperationType::Payment,
        OperationType::Erc20Mint,
        OperationType::Erc20Burn,
        OperationType::Mint,
        OperationType::Burn,
        OperationType::Call,
        OperationType::Create,
        OperationType::Create2,
        OperationType::SelfDestruct,
        OperationType::CallCode,
        OperationType::DelegateCall,
        OperationType::StaticCall,
        OperationType::Destruct,
        OperationType::DelegateVotes,
        OperationType::Stop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OperationType::Fee => "FEE",
            OperationType::Payment => "PAYMENT",
            OperationType::Erc20Mint => "ERC20_MINT",
            OperationType::Erc20Burn => "ERC20_BURN",
            OperationType::Mint => "MINT",
            OperationType::Burn => "BURN",
            OperationType::Call => "CALL",
            OperationType::Create => "CREATE",
            OperationType::Create2 => "CREATE2",
            OperationType::SelfDestruct => "SELFDESTRUCT",
            OperationType::CallCode => "CALLCODE",
            OperationType::DelegateCall => "DELEGATECALL",
            OperationType::StaticCall => "STATICCALL",
            OperationType::Destruct => "DESTRUCT",
            OperationType::DelegateVotes => "DELEGATE_VOTES",
            OperationType::Stop => "STOP",
        }
    }

    pub fn is_call(&self) -> bool {
        matches!(
            self,
            OperationType::Call
                | OperationType::CallCode
                | OperationType::DelegateCall
                | OperationType::StaticCall
        )
    }

    pub fn is_create(&self) -> bool {
        matches!(self, OperationType::Create | OperationType::Create2)
    }
}

impl fmt::Display for OperationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OperationStatus {
    Success,
    Failure,
}

impl OperationStatus {
    pub fn is_successful(&self) -> bool {
        *self == OperationStatus::Success
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CurrencyMetadata {
    pub token_address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Currency {
    pub symbol: String,
    pub decimals: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CurrencyMetadata>,
}

impl Currency {
    pub fn native() -> Self {
        Self {
            symbol: NATIVE_SYMBOL.to_string(),
            decimals: NATIVE_DECIMALS,
            metadata: None,
        }
    }

    pub fn token(symbol: &str, decimals: u32, contract: Address) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals,
            metadata: Some(CurrencyMetadata {
                token_address: contract.to_checksum(None),
            }),
        }
    }

    pub fn contract_address(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.token_address.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Amount {
    /// Signed integer in the currency's smallest unit, base 10.
    pub value: String,
    pub currency: Currency,
}

impl Amount {
    pub fn credit(value: U256, currency: Currency) -> Self {
        Self {
            value: value.to_string(),
            currency,
        }
    }

    pub fn debit(value: U256, currency: Currency) -> Self {
        let value = if value.is_zero() {
            "0".to_string()
        } else {
            format!("-{value}")
        };
        Self { value, currency }
    }

    pub fn zero(currency: Currency) -> Self {
        Self::credit(U256::ZERO, currency)
    }

    pub fn is_zero(&self) -> bool {
        self.value.trim_start_matches('-') == "0"
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OperationIdentifier {
    pub index: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AccountIdentifier {
    pub address: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LedgerOperation {
    pub operation_identifier: OperationIdentifier,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub related_operations: Vec<OperationIdentifier>,
    #[serde(rename = "type")]
    pub op_type: OperationType,
    pub status: OperationStatus,
    pub account: AccountIdentifier,
    pub amount: Amount,
}

/////////////////////////////////// Transformed Data ///////////////////////////////////

#[derive(Debug, Serialize)]
pub struct TransactionOperations {
    pub chain_id: u64,
    pub block_time: DateTime<Utc>,
    pub block_number: u64,
    pub block_hash: FixedBytes<32>,
    pub tx_hash: FixedBytes<32>,
    pub operations: Vec<LedgerOperation>,
}
