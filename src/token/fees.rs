//! Fee and burn arithmetic in basis points

use crate::token::{TokenError, TokenResult};
use serde::{Deserialize, Serialize};

/// Token amount in base units (18 decimals)
pub type Amount = u128;

/// Rate in basis points, 10_000 = 100%
pub type BasisPoints = u32;

/// Basis-point denominator
pub const BPS_DENOMINATOR: BasisPoints = 10_000;

/// Where the fee portion of a transfer is credited
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeeRouting {
    /// Fee stays with the sender (self-rebate)
    #[default]
    Sender,
    /// Fee is paid to the governance address
    Governance,
}

/// How a transfer amount is split up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferSplit {
    /// Amount debited from the sender
    pub amount: Amount,
    /// Fee portion
    pub fee: Amount,
    /// Burned portion, removed from total supply
    pub burn: Amount,
    /// Amount credited to the recipient
    pub net: Amount,
}

/// Fee schedule applied to ordinary transfers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawFeeSchedule")]
pub struct FeeSchedule {
    fee_rate: BasisPoints,
    burn_rate: BasisPoints,
    routing: FeeRouting,
}

/// Wire form, checked by `FeeSchedule::new` on the way in
#[derive(Deserialize)]
struct RawFeeSchedule {
    fee_rate: BasisPoints,
    burn_rate: BasisPoints,
    routing: FeeRouting,
}

impl TryFrom<RawFeeSchedule> for FeeSchedule {
    type Error = TokenError;

    fn try_from(raw: RawFeeSchedule) -> TokenResult<Self> {
        Self::new(raw.fee_rate, raw.burn_rate, raw.routing)
    }
}

impl FeeSchedule {
    /// Create a schedule, rejecting rates that together exceed 100%
    pub fn new(fee_rate: BasisPoints, burn_rate: BasisPoints, routing: FeeRouting) -> TokenResult<Self> {
        Self::check_bounds(fee_rate, burn_rate)?;
        Ok(Self {
            fee_rate,
            burn_rate,
            routing,
        })
    }

    /// A schedule that charges nothing
    pub fn zero() -> Self {
        Self {
            fee_rate: 0,
            burn_rate: 0,
            routing: FeeRouting::Sender,
        }
    }

    pub fn fee_rate(&self) -> BasisPoints {
        self.fee_rate
    }

    pub fn burn_rate(&self) -> BasisPoints {
        self.burn_rate
    }

    pub fn routing(&self) -> FeeRouting {
        self.routing
    }

    /// Copy of this schedule with a different fee rate
    pub fn with_fee_rate(&self, fee_rate: BasisPoints) -> TokenResult<Self> {
        Self::new(fee_rate, self.burn_rate, self.routing)
    }

    /// Copy of this schedule with a different burn rate
    pub fn with_burn_rate(&self, burn_rate: BasisPoints) -> TokenResult<Self> {
        Self::new(self.fee_rate, burn_rate, self.routing)
    }

    /// Split an amount into fee, burn and net.
    ///
    /// Formula: portion = amount * rate / 10_000, truncating.
    pub fn split(&self, amount: Amount) -> TokenResult<TransferSplit> {
        let fee = portion(amount, self.fee_rate)?;
        let burn = portion(amount, self.burn_rate)?;
        let net = amount
            .checked_sub(fee)
            .and_then(|v| v.checked_sub(burn))
            .ok_or(TokenError::Overflow)?;

        Ok(TransferSplit {
            amount,
            fee,
            burn,
            net,
        })
    }

    fn check_bounds(fee_rate: BasisPoints, burn_rate: BasisPoints) -> TokenResult<()> {
        match fee_rate.checked_add(burn_rate) {
            Some(total) if total <= BPS_DENOMINATOR => Ok(()),
            _ => Err(TokenError::InvalidRate { fee_rate, burn_rate }),
        }
    }
}

impl Default for FeeSchedule {
    fn default() -> Self {
        Self::zero()
    }
}

fn portion(amount: Amount, rate: BasisPoints) -> TokenResult<Amount> {
    if rate == 0 {
        return Ok(0);
    }
    amount
        .checked_mul(rate as Amount)
        .map(|v| v / BPS_DENOMINATOR as Amount)
        .ok_or(TokenError::Overflow)
}
