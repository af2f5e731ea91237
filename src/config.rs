//! Token construction parameters

use crate::token::{Amount, BasisPoints, FeeRouting, FeeSchedule, TokenError, DECIMALS, NAME, SYMBOL};
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Whole tokens minted to governance at construction
pub const DEFAULT_INITIAL_SUPPLY: u64 = 4_000_000;
pub const DEFAULT_FEE_RATE: BasisPoints = 100;
pub const DEFAULT_BURN_RATE: BasisPoints = 100;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Failed to encode config: {0}")]
    Encode(String),
}

/// Parameters a ledger is created with
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Initial supply in whole tokens; scaled by `10^decimals`
    pub initial_supply_tokens: u64,
    pub fee_rate: BasisPoints,
    pub burn_rate: BasisPoints,
    pub fee_routing: FeeRouting,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            name: NAME.to_string(),
            symbol: SYMBOL.to_string(),
            decimals: DECIMALS,
            initial_supply_tokens: DEFAULT_INITIAL_SUPPLY,
            fee_rate: DEFAULT_FEE_RATE,
            burn_rate: DEFAULT_BURN_RATE,
            fee_routing: FeeRouting::Sender,
        }
    }
}

impl TokenConfig {
    /// Load and validate a JSON config file. Missing fields take defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, ConfigError> {
        let config: TokenConfig = serde_json::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("name must not be empty".into()));
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::Invalid("symbol must not be empty".into()));
        }
        FeeSchedule::new(self.fee_rate, self.burn_rate, self.fee_routing)
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;
        self.initial_supply()
            .map_err(|_| ConfigError::Invalid("initial supply overflows".into()))?;
        Ok(())
    }

    /// Initial supply in base units
    pub fn initial_supply(&self) -> Result<Amount, TokenError> {
        (10 as Amount)
            .checked_pow(self.decimals as u32)
            .and_then(|unit| unit.checked_mul(self.initial_supply_tokens as Amount))
            .ok_or(TokenError::Overflow)
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|e| ConfigError::Encode(e.to_string()))
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ConfigError> {
        postcard::from_bytes(bytes).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
