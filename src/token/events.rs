//! Ledger event log entries

use crate::account::Address;
use crate::token::{Amount, BasisPoints};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Something the ledger did
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    /// Value moved between accounts. `from == Address::ZERO` is a mint.
    Transfer {
        from: Address,
        to: Address,
        amount: Amount,
    },
    Burn {
        from: Address,
        amount: Amount,
    },
    Approval {
        owner: Address,
        spender: Address,
        amount: Amount,
    },
    FeeRateChanged {
        previous: BasisPoints,
        current: BasisPoints,
    },
    BurnRateChanged {
        previous: BasisPoints,
        current: BasisPoints,
    },
    GovernanceChanged {
        previous: Address,
        current: Address,
    },
}

impl fmt::Display for LedgerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LedgerEvent::Transfer { from, to, amount } => {
                write!(f, "Transfer {} -> {} ({})", from, to, amount)
            }
            LedgerEvent::Burn { from, amount } => write!(f, "Burn {} ({})", from, amount),
            LedgerEvent::Approval {
                owner,
                spender,
                amount,
            } => write!(f, "Approval {} -> {} ({})", owner, spender, amount),
            LedgerEvent::FeeRateChanged { previous, current } => {
                write!(f, "FeeRateChanged {}bp -> {}bp", previous, current)
            }
            LedgerEvent::BurnRateChanged { previous, current } => {
                write!(f, "BurnRateChanged {}bp -> {}bp", previous, current)
            }
            LedgerEvent::GovernanceChanged { previous, current } => {
                write!(f, "GovernanceChanged {} -> {}", previous, current)
            }
        }
    }
}

/// An event with the ledger sequence that produced it
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EventRecord {
    sequence: u64,
    recorded_at: DateTime<Utc>,
    event: LedgerEvent,
}

impl EventRecord {
    pub(crate) fn new(sequence: u64, event: LedgerEvent) -> Self {
        Self {
            sequence,
            recorded_at: Utc::now(),
            event,
        }
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn recorded_at(&self) -> DateTime<Utc> {
        self.recorded_at
    }

    pub fn event(&self) -> &LedgerEvent {
        &self.event
    }
}
