use alloy_primitives::{Address, address};
use serde::{Deserialize, Serialize};

use crate::models::errors::ConfigError;

/// Chain ID of the production OP Mainnet network.
pub const OPTIMISM_CHAIN_ID: u64 = 10;
/// Chain ID of the retired OP Goerli test network.
pub const OPTIMISM_GOERLI_CHAIN_ID: u64 = 420;

pub const OPTIMISM_BEDROCK_BLOCK: u64 = 105_235_063;
pub const OPTIMISM_GOERLI_BEDROCK_BLOCK: u64 = 4_061_224;
pub const OPTIMISM_GOERLI_FEE_ENFORCEMENT_BLOCK: u64 = 1_000_000;

// Predeploys. The base fee is not burnt on L2, it accumulates in the vault
// until it is withdrawn to L1.
pub const BASE_FEE_VAULT: Address = address!("4200000000000000000000000000000000000019");
pub const L1_FEE_VAULT: Address = address!("420000000000000000000000000000000000001a");

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub enabled: bool,
    pub address: String,
    pub port: u16,
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub chain_name: String,
    pub start_block: Option<u64>,
    pub end_block: Option<u64>,
    pub chain_tip_buffer: u64,
    pub rpc_url: String,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Name of a built-in network preset. Ignored when `chain` is set.
    pub network: Option<String>,
    pub chain: Option<ChainConfig>,
    pub metrics: MetricsConfig,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

impl Config {
    /// Resolves the chain parameters from either the explicit `chain` section
    /// or the `network` preset, and validates them.
    pub fn chain_config(&self) -> Result<ChainConfig, ConfigError> {
        let chain = match (&self.chain, &self.network) {
            (Some(chain), _) => chain.clone(),
            (None, Some(network)) => ChainConfig::from_network(network)?,
            (None, None) => return Err(ConfigError::MissingChain),
        };
        chain.validate()?;
        Ok(chain)
    }
}

/// Historical anomaly: the network did not charge fees for zero gas price
/// transactions below `enforcement_block`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeOverride {
    pub chain_id: u64,
    pub enforcement_block: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    pub chain_id: u64,
    pub bedrock_block: u64,
    #[serde(default = "default_base_fee_vault")]
    pub base_fee_vault: Address,
    #[serde(default = "default_l1_fee_vault")]
    pub l1_fee_vault: Address,
    #[serde(default)]
    pub fee_override: Option<FeeOverride>,
}

fn default_base_fee_vault() -> Address {
    BASE_FEE_VAULT
}

fn default_l1_fee_vault() -> Address {
    L1_FEE_VAULT
}

impl ChainConfig {
    pub fn optimism() -> Self {
        Self {
            chain_id: OPTIMISM_CHAIN_ID,
            bedrock_block: OPTIMISM_BEDROCK_BLOCK,
            base_fee_vault: BASE_FEE_VAULT,
            l1_fee_vault: L1_FEE_VAULT,
            fee_override: None,
        }
    }

    pub fn optimism_goerli() -> Self {
        Self {
            chain_id: OPTIMISM_GOERLI_CHAIN_ID,
            bedrock_block: OPTIMISM_GOERLI_BEDROCK_BLOCK,
            base_fee_vault: BASE_FEE_VAULT,
            l1_fee_vault: L1_FEE_VAULT,
            fee_override: Some(FeeOverride {
                chain_id: OPTIMISM_GOERLI_CHAIN_ID,
                enforcement_block: OPTIMISM_GOERLI_FEE_ENFORCEMENT_BLOCK,
            }),
        }
    }

    pub fn from_network(network: &str) -> Result<Self, ConfigError> {
        match network.to_lowercase().replace('_', "-").as_str() {
            "optimism" | "optimism-mainnet" | "mainnet" => Ok(Self::optimism()),
            "optimism-goerli" | "goerli" => Ok(Self::optimism_goerli()),
            _ => Err(ConfigError::UnknownNetwork {
                network: network.to_string(),
            }),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(fee_override) = &self.fee_override {
            if fee_override.chain_id == OPTIMISM_CHAIN_ID {
                return Err(ConfigError::ProductionOverride {
                    chain_id: fee_override.chain_id,
                });
            }
            if fee_override.chain_id != self.chain_id {
                return Err(ConfigError::OverrideChainMismatch {
                    chain_id: self.chain_id,
                    override_chain_id: fee_override.chain_id,
                });
            }
        }
        Ok(())
    }

    pub fn fork_at(&self, block_number: u64) -> Fork {
        Fork::at(block_number, self.bedrock_block)
    }
}

/// Wire format epoch of a block. The Bedrock upgrade changed both the
/// transaction encoding and the fee model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fork {
    Legacy,
    Bedrock,
}

impl Fork {
    pub fn at(block_number: u64, bedrock_block: u64) -> Self {
        if block_number < bedrock_block {
            Fork::Legacy
        } else {
            Fork::Bedrock
        }
    }

    pub fn is_pre_bedrock(self) -> bool {
        self == Fork::Legacy
    }
}
