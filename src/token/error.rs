//! Token ledger errors

use crate::token::{Amount, BasisPoints};
use std::fmt;
use thiserror::Error;

/// Operations reserved for the governance address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GovernedAction {
    TransferNoFeeNoBurn,
    SetFeeRate,
    SetBurnRate,
    ChangeGovernanceAddress,
}

impl fmt::Display for GovernedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Names as exposed on the contract surface
        let name = match self {
            GovernedAction::TransferNoFeeNoBurn => "transferNoFeeNoBurn",
            GovernedAction::SetFeeRate => "setFeeRate",
            GovernedAction::SetBurnRate => "setBurnRate",
            GovernedAction::ChangeGovernanceAddress => "changeDeFierAddress",
        };
        f.write_str(name)
    }
}

/// Error during token operations.
///
/// Every message carries the `DeFierToken:` prefix so callers can match on
/// the rejection reason.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("DeFierToken: must have governance role to {0}")]
    Unauthorized(GovernedAction),

    #[error("DeFierToken: transfer amount exceeds balance (available {available}, required {required})")]
    InsufficientBalance { available: Amount, required: Amount },

    #[error("DeFierToken: insufficient allowance (available {available}, required {required})")]
    InsufficientAllowance { available: Amount, required: Amount },

    #[error("DeFierToken: zero address not allowed")]
    ZeroAddress,

    #[error("DeFierToken: fee rate {fee_rate}bp plus burn rate {burn_rate}bp exceeds 10000bp")]
    InvalidRate {
        fee_rate: BasisPoints,
        burn_rate: BasisPoints,
    },

    #[error("DeFierToken: arithmetic overflow")]
    Overflow,

    #[error("DeFierToken: balances sum to {balances} but total supply is {total_supply}")]
    ConservationViolated { balances: Amount, total_supply: Amount },

    #[error("DeFierToken: invalid snapshot: {0}")]
    Snapshot(String),
}

impl TokenError {
    /// The human-readable rejection reason
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

/// Result type for token operations
pub type TokenResult<T> = Result<T, TokenError>;
