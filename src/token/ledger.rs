// TokenLedger - the DeFier token state and every operation that mutates it

use crate::account::Address;
use crate::config::TokenConfig;
use crate::token::events::{EventRecord, LedgerEvent};
use crate::token::fees::{Amount, BasisPoints, FeeRouting, FeeSchedule, TransferSplit};
use crate::token::{GovernedAction, TokenError, TokenResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

pub const NAME: &str = "DeFier";
pub const SYMBOL: &str = "DFR";
pub const DECIMALS: u8 = 18;

/// Outcome of a successful transfer
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TransferReceipt {
    pub from: Address,
    pub to: Address,
    /// How the amount was divided
    pub split: TransferSplit,
    /// Account that received the fee portion
    pub fee_recipient: Address,
}

#[derive(Clone, Copy)]
enum Posting {
    Debit(Address, Amount),
    Credit(Address, Amount),
}

/// The DeFier token ledger.
///
/// Holds every balance plus the governance-controlled fee schedule. Each
/// mutating operation is all-or-nothing: balance changes are staged and
/// validated before any of them is written.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TokenLedger {
    name: String,
    symbol: String,
    decimals: u8,
    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
    allowances: BTreeMap<(Address, Address), Amount>,
    fee_schedule: FeeSchedule,
    governance: Address,
    /// Logical clock, bumped on every successful mutation
    sequence: u64,
    /// Events recorded since the last `take_events`. Not part of snapshots;
    /// the store keeps the history under its own keys.
    #[serde(skip)]
    events: Vec<EventRecord>,
}

impl TokenLedger {
    /// Create the ledger, minting the whole supply to `governance`
    pub fn new(config: &TokenConfig, governance: Address) -> TokenResult<Self> {
        if governance.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        let fee_schedule = FeeSchedule::new(config.fee_rate, config.burn_rate, config.fee_routing)?;
        let total_supply = config.initial_supply()?;

        let mut ledger = Self {
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            decimals: config.decimals,
            total_supply,
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
            fee_schedule,
            governance,
            sequence: 0,
            events: Vec::new(),
        };
        ledger.balances.insert(governance, total_supply);
        ledger.record(LedgerEvent::Transfer {
            from: Address::ZERO,
            to: governance,
            amount: total_supply,
        });

        info!(
            %governance,
            total_supply,
            fee_rate = config.fee_rate,
            burn_rate = config.burn_rate,
            "token ledger initialized"
        );
        Ok(ledger)
    }

    // ========================================================================
    // READ-ONLY ACCESSORS
    // ========================================================================

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn total_supply(&self) -> Amount {
        self.total_supply
    }

    /// Balance of an address (zero if it never held tokens)
    pub fn balance_of(&self, address: &Address) -> Amount {
        self.balances.get(address).copied().unwrap_or(0)
    }

    pub fn governance_address(&self) -> Address {
        self.governance
    }

    pub fn fee_rate(&self) -> BasisPoints {
        self.fee_schedule.fee_rate()
    }

    pub fn burn_rate(&self) -> BasisPoints {
        self.fee_schedule.burn_rate()
    }

    pub fn fee_routing(&self) -> FeeRouting {
        self.fee_schedule.routing()
    }

    pub fn fee_schedule(&self) -> &FeeSchedule {
        &self.fee_schedule
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Number of accounts with an entry (zero balances included)
    pub fn account_count(&self) -> usize {
        self.balances.len()
    }

    /// Iterate over every (address, balance) entry in address order
    pub fn balances(&self) -> impl Iterator<Item = (&Address, &Amount)> {
        self.balances.iter()
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances.get(&(*owner, *spender)).copied().unwrap_or(0)
    }

    /// Events recorded in memory and not yet taken for persistence
    pub fn events(&self) -> &[EventRecord] {
        &self.events
    }

    // ========================================================================
    // TRANSFERS
    // ========================================================================

    /// Transfer from the caller's own balance, charging fee and burn
    pub fn transfer(&mut self, caller: &Address, to: &Address, amount: Amount) -> TokenResult<TransferReceipt> {
        self.transfer_charged(*caller, *to, amount)
    }

    /// Fee-free, burn-free transfer between any two accounts (governance only)
    pub fn transfer_no_fee_no_burn(
        &mut self,
        caller: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> TokenResult<()> {
        self.require_governance(caller, GovernedAction::TransferNoFeeNoBurn)?;
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        self.commit(&[Posting::Debit(*from, amount), Posting::Credit(*to, amount)])?;
        self.record(LedgerEvent::Transfer {
            from: *from,
            to: *to,
            amount,
        });

        debug!(%from, %to, amount, "privileged transfer");
        Ok(())
    }

    fn transfer_charged(&mut self, from: Address, to: Address, amount: Amount) -> TokenResult<TransferReceipt> {
        if to.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        let available = self.balance_of(&from);
        if amount > available {
            return Err(TokenError::InsufficientBalance {
                available,
                required: amount,
            });
        }

        let split = self.fee_schedule.split(amount)?;
        let fee_recipient = match self.fee_schedule.routing() {
            FeeRouting::Sender => from,
            FeeRouting::Governance => self.governance,
        };
        let total_supply = self
            .total_supply
            .checked_sub(split.burn)
            .ok_or(TokenError::Overflow)?;

        self.commit(&[
            Posting::Debit(from, amount),
            Posting::Credit(fee_recipient, split.fee),
            Posting::Credit(to, split.net),
        ])?;
        self.total_supply = total_supply;

        self.record(LedgerEvent::Transfer {
            from,
            to,
            amount: split.net,
        });
        if split.fee > 0 && fee_recipient != from {
            self.record(LedgerEvent::Transfer {
                from,
                to: fee_recipient,
                amount: split.fee,
            });
        }
        if split.burn > 0 {
            self.record(LedgerEvent::Burn {
                from,
                amount: split.burn,
            });
        }

        debug!(
            %from,
            %to,
            amount,
            fee = split.fee,
            burn = split.burn,
            net = split.net,
            "transfer"
        );
        Ok(TransferReceipt {
            from,
            to,
            split,
            fee_recipient,
        })
    }

    // ========================================================================
    // ALLOWANCES
    // ========================================================================

    /// Set the amount `spender` may move out of `owner`'s balance
    pub fn approve(&mut self, owner: &Address, spender: &Address, amount: Amount) -> TokenResult<()> {
        if spender.is_zero() || owner.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        self.set_allowance(*owner, *spender, amount);
        Ok(())
    }

    pub fn increase_allowance(&mut self, owner: &Address, spender: &Address, added: Amount) -> TokenResult<()> {
        if spender.is_zero() || owner.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        let current = self.allowance(owner, spender);
        let updated = current.checked_add(added).ok_or(TokenError::Overflow)?;
        self.set_allowance(*owner, *spender, updated);
        Ok(())
    }

    pub fn decrease_allowance(&mut self, owner: &Address, spender: &Address, subtracted: Amount) -> TokenResult<()> {
        if spender.is_zero() || owner.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        let current = self.allowance(owner, spender);
        let updated = current
            .checked_sub(subtracted)
            .ok_or(TokenError::InsufficientAllowance {
                available: current,
                required: subtracted,
            })?;
        self.set_allowance(*owner, *spender, updated);
        Ok(())
    }

    /// Spend `spender`'s allowance on `from`, with the usual fee and burn
    pub fn transfer_from(
        &mut self,
        spender: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> TokenResult<TransferReceipt> {
        let allowed = self.allowance(from, spender);
        if amount > allowed {
            return Err(TokenError::InsufficientAllowance {
                available: allowed,
                required: amount,
            });
        }

        let receipt = self.transfer_charged(*from, *to, amount)?;
        // Cannot fail: checked above and the transfer does not touch allowances
        self.allowances.insert((*from, *spender), allowed - amount);
        Ok(receipt)
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, amount: Amount) {
        self.allowances.insert((owner, spender), amount);
        self.record(LedgerEvent::Approval {
            owner,
            spender,
            amount,
        });
        debug!(%owner, %spender, amount, "approval");
    }

    // ========================================================================
    // GOVERNANCE
    // ========================================================================

    pub fn set_fee_rate(&mut self, caller: &Address, rate: BasisPoints) -> TokenResult<()> {
        self.require_governance(caller, GovernedAction::SetFeeRate)?;
        let previous = self.fee_schedule.fee_rate();
        self.fee_schedule = self.fee_schedule.with_fee_rate(rate)?;
        self.record(LedgerEvent::FeeRateChanged {
            previous,
            current: rate,
        });

        info!(previous, current = rate, "fee rate changed");
        Ok(())
    }

    pub fn set_burn_rate(&mut self, caller: &Address, rate: BasisPoints) -> TokenResult<()> {
        self.require_governance(caller, GovernedAction::SetBurnRate)?;
        let previous = self.fee_schedule.burn_rate();
        self.fee_schedule = self.fee_schedule.with_burn_rate(rate)?;
        self.record(LedgerEvent::BurnRateChanged {
            previous,
            current: rate,
        });

        info!(previous, current = rate, "burn rate changed");
        Ok(())
    }

    /// Hand the governance role to a new address. The caller loses it.
    pub fn change_governance_address(&mut self, caller: &Address, new_address: &Address) -> TokenResult<()> {
        self.require_governance(caller, GovernedAction::ChangeGovernanceAddress)?;
        if new_address.is_zero() {
            return Err(TokenError::ZeroAddress);
        }

        let previous = self.governance;
        self.governance = *new_address;
        self.record(LedgerEvent::GovernanceChanged {
            previous,
            current: *new_address,
        });

        info!(%previous, current = %new_address, "governance address changed");
        Ok(())
    }

    fn require_governance(&self, caller: &Address, action: GovernedAction) -> TokenResult<()> {
        if *caller != self.governance {
            warn!(%caller, %action, "rejected call without governance role");
            return Err(TokenError::Unauthorized(action));
        }
        Ok(())
    }

    // ========================================================================
    // INVARIANTS
    // ========================================================================

    /// Check that balances sum to total supply
    pub fn verify_supply(&self) -> TokenResult<()> {
        let mut sum: Amount = 0;
        for balance in self.balances.values() {
            sum = sum.checked_add(*balance).ok_or(TokenError::Overflow)?;
        }
        if sum != self.total_supply {
            return Err(TokenError::ConservationViolated {
                balances: sum,
                total_supply: self.total_supply,
            });
        }
        Ok(())
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    /// Apply postings atomically: all are validated on a staging copy of
    /// the touched balances before any is written.
    fn commit(&mut self, postings: &[Posting]) -> TokenResult<()> {
        let mut staged: BTreeMap<Address, Amount> = BTreeMap::new();

        for posting in postings {
            match *posting {
                Posting::Debit(account, amount) => {
                    let current = staged
                        .get(&account)
                        .copied()
                        .unwrap_or_else(|| self.balance_of(&account));
                    let next = current
                        .checked_sub(amount)
                        .ok_or(TokenError::InsufficientBalance {
                            available: current,
                            required: amount,
                        })?;
                    staged.insert(account, next);
                }
                Posting::Credit(account, amount) => {
                    let current = staged
                        .get(&account)
                        .copied()
                        .unwrap_or_else(|| self.balance_of(&account));
                    let next = current.checked_add(amount).ok_or(TokenError::Overflow)?;
                    staged.insert(account, next);
                }
            }
        }

        self.balances.extend(staged);
        Ok(())
    }

    /// Drain the pending events, leaving the in-memory log empty
    pub fn take_events(&mut self) -> Vec<EventRecord> {
        std::mem::take(&mut self.events)
    }

    fn record(&mut self, event: LedgerEvent) {
        self.sequence += 1;
        self.events.push(EventRecord::new(self.sequence, event));
    }

    // ========================================================================
    // SERIALIZATION
    // ========================================================================

    /// Serialize the ledger to bytes
    pub fn to_bytes(&self) -> TokenResult<Vec<u8>> {
        postcard::to_allocvec(self).map_err(|e| TokenError::Snapshot(e.to_string()))
    }

    /// Deserialize a ledger from bytes.
    ///
    /// The fee schedule bounds are enforced while decoding. Governance must
    /// be a real address and balances must sum to total supply.
    pub fn from_bytes(bytes: &[u8]) -> TokenResult<Self> {
        let ledger: TokenLedger =
            postcard::from_bytes(bytes).map_err(|e| TokenError::Snapshot(e.to_string()))?;
        if ledger.governance.is_zero() {
            return Err(TokenError::ZeroAddress);
        }
        ledger.verify_supply()?;
        Ok(ledger)
    }
}
