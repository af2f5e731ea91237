// Token module - THE LEDGER
// Balances, fee/burn transfers, allowances and governance

mod error;
mod events;
mod fees;
mod ledger;
pub mod units;

pub use error::{GovernedAction, TokenError, TokenResult};
pub use events::{EventRecord, LedgerEvent};
pub use fees::{Amount, BasisPoints, FeeRouting, FeeSchedule, TransferSplit, BPS_DENOMINATOR};
pub use ledger::{TokenLedger, TransferReceipt, DECIMALS, NAME, SYMBOL};
