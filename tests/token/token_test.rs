// Token Ledger Tests
// Metadata, fee/burn transfers, privileged transfers and governance

use defier::account::{Address, Keypair};
use defier::config::TokenConfig;
use defier::token::{
    Amount, FeeRouting, GovernedAction, LedgerEvent, TokenError, TokenLedger, DECIMALS,
};

const TOKEN: Amount = 1_000_000_000_000_000_000;
const TOTAL_SUPPLY: Amount = 4_000_000 * TOKEN;

fn new_address() -> Address {
    Address::from_public_key(&Keypair::generate().public_key())
}

struct Fixture {
    owner: Address,
    recipient: Address,
    new_address: Address,
    ledger: TokenLedger,
}

fn setup() -> Fixture {
    let owner = new_address();
    let ledger = TokenLedger::new(&TokenConfig::default(), owner).unwrap();
    Fixture {
        owner,
        recipient: new_address(),
        new_address: new_address(),
        ledger,
    }
}

// ============================================================================
// DEFAULT ERC20 FUNCTIONS
// ============================================================================

#[test]
fn test_name() {
    let f = setup();
    assert_eq!(f.ledger.name(), "DeFier");
}

#[test]
fn test_symbol() {
    let f = setup();
    assert_eq!(f.ledger.symbol(), "DFR");
}

#[test]
fn test_decimals() {
    let f = setup();
    assert_eq!(f.ledger.decimals(), 18);
    assert_eq!(DECIMALS, 18);
}

#[test]
fn test_governance_address_is_deployer() {
    let f = setup();
    assert_eq!(f.ledger.governance_address(), f.owner);
}

#[test]
fn test_owner_holds_total_supply() {
    let f = setup();
    assert_eq!(f.ledger.total_supply(), TOTAL_SUPPLY);
    assert_eq!(f.ledger.balance_of(&f.owner), TOTAL_SUPPLY);
}

#[test]
fn test_unknown_account_has_zero_balance() {
    let f = setup();
    assert_eq!(f.ledger.balance_of(&f.recipient), 0);
}

// ============================================================================
// TRANSFER WITH FEE AND BURN
// ============================================================================

#[test]
fn test_transfer_burns_and_charges_fee() {
    let mut f = setup();

    f.ledger.transfer(&f.owner, &f.recipient, 100 * TOKEN).unwrap();

    assert_eq!(f.ledger.balance_of(&f.owner), 3_999_901 * TOKEN);
    assert_eq!(f.ledger.balance_of(&f.recipient), 98 * TOKEN);
    assert_eq!(f.ledger.total_supply(), 3_999_999 * TOKEN);
    f.ledger.verify_supply().unwrap();
}

#[test]
fn test_transfer_receipt_split() {
    let mut f = setup();

    let receipt = f.ledger.transfer(&f.owner, &f.recipient, 100 * TOKEN).unwrap();

    assert_eq!(receipt.split.amount, 100 * TOKEN);
    assert_eq!(receipt.split.fee, TOKEN);
    assert_eq!(receipt.split.burn, TOKEN);
    assert_eq!(receipt.split.net, 98 * TOKEN);
    assert_eq!(receipt.fee_recipient, f.owner);
}

#[test]
fn test_fee_is_credited_back_to_sender() {
    let mut f = setup();
    let holder = new_address();
    f.ledger
        .transfer_no_fee_no_burn(&f.owner, &f.owner, &holder, 1_000 * TOKEN)
        .unwrap();

    let before = f.ledger.balance_of(&holder);
    let supply_before = f.ledger.total_supply();
    let receipt = f.ledger.transfer(&holder, &f.recipient, 250 * TOKEN).unwrap();

    assert_eq!(
        f.ledger.balance_of(&holder) + 250 * TOKEN,
        before + receipt.split.fee
    );
    assert_eq!(f.ledger.total_supply(), supply_before - receipt.split.burn);
    f.ledger.verify_supply().unwrap();
}

#[test]
fn test_fee_routed_to_governance() {
    let owner = new_address();
    let holder = new_address();
    let recipient = new_address();
    let config = TokenConfig {
        fee_routing: FeeRouting::Governance,
        ..TokenConfig::default()
    };
    let mut ledger = TokenLedger::new(&config, owner).unwrap();
    ledger
        .transfer_no_fee_no_burn(&owner, &owner, &holder, 1_000 * TOKEN)
        .unwrap();
    let owner_before = ledger.balance_of(&owner);

    let receipt = ledger.transfer(&holder, &recipient, 100 * TOKEN).unwrap();

    assert_eq!(receipt.fee_recipient, owner);
    assert_eq!(ledger.balance_of(&holder), 900 * TOKEN);
    assert_eq!(ledger.balance_of(&owner), owner_before + TOKEN);
    assert_eq!(ledger.balance_of(&recipient), 98 * TOKEN);
    ledger.verify_supply().unwrap();
}

#[test]
fn test_transfer_exceeding_balance_fails() {
    let mut f = setup();
    let sequence = f.ledger.sequence();

    let result = f.ledger.transfer(&f.recipient, &f.owner, 1);

    assert_eq!(
        result,
        Err(TokenError::InsufficientBalance {
            available: 0,
            required: 1
        })
    );
    assert_eq!(f.ledger.balance_of(&f.owner), TOTAL_SUPPLY);
    assert_eq!(f.ledger.sequence(), sequence);
}

#[test]
fn test_transfer_to_zero_address_fails() {
    let mut f = setup();
    let result = f.ledger.transfer(&f.owner, &Address::ZERO, TOKEN);
    assert_eq!(result, Err(TokenError::ZeroAddress));
    assert_eq!(f.ledger.total_supply(), TOTAL_SUPPLY);
}

#[test]
fn test_transfer_entire_balance() {
    let mut f = setup();
    f.ledger
        .transfer_no_fee_no_burn(&f.owner, &f.owner, &f.recipient, 50 * TOKEN)
        .unwrap();

    f.ledger.transfer(&f.recipient, &f.new_address, 50 * TOKEN).unwrap();

    // 1% fee stays with the sender, 1% is burned
    assert_eq!(f.ledger.balance_of(&f.recipient), TOKEN / 2);
    assert_eq!(f.ledger.balance_of(&f.new_address), 49 * TOKEN);
    f.ledger.verify_supply().unwrap();
}

#[test]
fn test_small_transfer_truncates_fee_and_burn() {
    let mut f = setup();

    let receipt = f.ledger.transfer(&f.owner, &f.recipient, 99).unwrap();

    assert_eq!(receipt.split.fee, 0);
    assert_eq!(receipt.split.burn, 0);
    assert_eq!(f.ledger.balance_of(&f.recipient), 99);
    assert_eq!(f.ledger.total_supply(), TOTAL_SUPPLY);
}

#[test]
fn test_transfer_emits_events() {
    let mut f = setup();
    f.ledger.transfer(&f.owner, &f.recipient, 100 * TOKEN).unwrap();

    let events: Vec<&LedgerEvent> = f.ledger.events().iter().map(|r| r.event()).collect();

    assert_eq!(
        events[0],
        &LedgerEvent::Transfer {
            from: Address::ZERO,
            to: f.owner,
            amount: TOTAL_SUPPLY
        }
    );
    assert!(events.contains(&&LedgerEvent::Transfer {
        from: f.owner,
        to: f.recipient,
        amount: 98 * TOKEN
    }));
    assert!(events.contains(&&LedgerEvent::Burn {
        from: f.owner,
        amount: TOKEN
    }));
}

// ============================================================================
// TRANSFER WITHOUT FEE AND BURN
// ============================================================================

#[test]
fn test_transfer_no_fee_no_burn() {
    let mut f = setup();

    f.ledger
        .transfer_no_fee_no_burn(&f.owner, &f.owner, &f.recipient, 100 * TOKEN)
        .unwrap();

    assert_eq!(f.ledger.balance_of(&f.owner), 3_999_900 * TOKEN);
    assert_eq!(f.ledger.balance_of(&f.recipient), 100 * TOKEN);
    assert_eq!(f.ledger.total_supply(), TOTAL_SUPPLY);
}

#[test]
fn test_transfer_no_fee_no_burn_ignores_rates() {
    let mut f = setup();
    f.ledger.set_fee_rate(&f.owner, 3_000).unwrap();
    f.ledger.set_burn_rate(&f.owner, 3_000).unwrap();

    f.ledger
        .transfer_no_fee_no_burn(&f.owner, &f.owner, &f.recipient, 10 * TOKEN)
        .unwrap();

    assert_eq!(f.ledger.balance_of(&f.recipient), 10 * TOKEN);
    assert_eq!(f.ledger.total_supply(), TOTAL_SUPPLY);
}

#[test]
fn test_transfer_no_fee_no_burn_between_third_parties() {
    let mut f = setup();
    f.ledger
        .transfer_no_fee_no_burn(&f.owner, &f.owner, &f.recipient, 10 * TOKEN)
        .unwrap();

    f.ledger
        .transfer_no_fee_no_burn(&f.owner, &f.recipient, &f.new_address, 4 * TOKEN)
        .unwrap();

    assert_eq!(f.ledger.balance_of(&f.recipient), 6 * TOKEN);
    assert_eq!(f.ledger.balance_of(&f.new_address), 4 * TOKEN);
}

#[test]
fn test_transfer_no_fee_no_burn_requires_governance() {
    let mut f = setup();

    let result = f
        .ledger
        .transfer_no_fee_no_burn(&f.recipient, &f.owner, &f.recipient, TOKEN);

    assert_eq!(
        result,
        Err(TokenError::Unauthorized(GovernedAction::TransferNoFeeNoBurn))
    );
    assert_eq!(f.ledger.balance_of(&f.recipient), 0);
}

#[test]
fn test_transfer_no_fee_no_burn_insufficient_balance() {
    let mut f = setup();

    let result = f
        .ledger
        .transfer_no_fee_no_burn(&f.owner, &f.recipient, &f.owner, TOKEN);

    assert!(matches!(result, Err(TokenError::InsufficientBalance { .. })));
    assert_eq!(f.ledger.balance_of(&f.owner), TOTAL_SUPPLY);
}

// ============================================================================
// GOVERNANCE
// ============================================================================

#[test]
fn test_set_burn_rate() {
    let mut f = setup();
    f.ledger.set_burn_rate(&f.owner, 250).unwrap();
    assert_eq!(f.ledger.burn_rate(), 250);
}

#[test]
fn test_set_fee_rate() {
    let mut f = setup();
    f.ledger.set_fee_rate(&f.owner, 250).unwrap();
    assert_eq!(f.ledger.fee_rate(), 250);
}

#[test]
fn test_new_rates_apply_to_next_transfer() {
    let mut f = setup();
    f.ledger.set_fee_rate(&f.owner, 250).unwrap();
    f.ledger.set_burn_rate(&f.owner, 250).unwrap();

    f.ledger.transfer(&f.owner, &f.recipient, 100 * TOKEN).unwrap();

    assert_eq!(f.ledger.balance_of(&f.recipient), 95 * TOKEN);
    assert_eq!(f.ledger.total_supply(), TOTAL_SUPPLY - 5 * TOKEN / 2);
}

#[test]
fn test_rates_above_full_amount_rejected() {
    let mut f = setup();

    let result = f.ledger.set_fee_rate(&f.owner, 9_950);

    assert_eq!(
        result,
        Err(TokenError::InvalidRate {
            fee_rate: 9_950,
            burn_rate: 100
        })
    );
    assert_eq!(f.ledger.fee_rate(), 100);
}

#[test]
fn test_rate_setters_require_governance() {
    let mut f = setup();

    assert_eq!(
        f.ledger.set_fee_rate(&f.recipient, 250),
        Err(TokenError::Unauthorized(GovernedAction::SetFeeRate))
    );
    assert_eq!(
        f.ledger.set_burn_rate(&f.recipient, 250),
        Err(TokenError::Unauthorized(GovernedAction::SetBurnRate))
    );
    assert_eq!(f.ledger.fee_rate(), 100);
    assert_eq!(f.ledger.burn_rate(), 100);
}

#[test]
fn test_change_governance_address() {
    let mut f = setup();
    f.ledger
        .change_governance_address(&f.owner, &f.new_address)
        .unwrap();
    assert_eq!(f.ledger.governance_address(), f.new_address);
}

#[test]
fn test_change_governance_address_reverts_for_non_governance() {
    let mut f = setup();

    let err = f
        .ledger
        .change_governance_address(&f.new_address, &f.new_address)
        .unwrap_err();

    assert_eq!(
        err.reason(),
        "DeFierToken: must have governance role to changeDeFierAddress"
    );
    assert_eq!(f.ledger.governance_address(), f.owner);
}

#[test]
fn test_old_governance_loses_rights() {
    let mut f = setup();
    f.ledger
        .change_governance_address(&f.owner, &f.new_address)
        .unwrap();

    assert!(f.ledger.set_fee_rate(&f.owner, 10).is_err());
    assert!(f.ledger.set_burn_rate(&f.owner, 10).is_err());
    assert!(f
        .ledger
        .transfer_no_fee_no_burn(&f.owner, &f.owner, &f.recipient, TOKEN)
        .is_err());
    assert!(f
        .ledger
        .change_governance_address(&f.owner, &f.owner)
        .is_err());

    f.ledger.set_fee_rate(&f.new_address, 10).unwrap();
    assert_eq!(f.ledger.fee_rate(), 10);
}

#[test]
fn test_change_governance_to_zero_rejected() {
    let mut f = setup();
    assert_eq!(
        f.ledger.change_governance_address(&f.owner, &Address::ZERO),
        Err(TokenError::ZeroAddress)
    );
    assert_eq!(f.ledger.governance_address(), f.owner);
}

#[test]
fn test_governance_changes_are_logged() {
    let mut f = setup();
    f.ledger.set_fee_rate(&f.owner, 250).unwrap();
    f.ledger
        .change_governance_address(&f.owner, &f.new_address)
        .unwrap();

    let last_two: Vec<&LedgerEvent> = f.ledger.events()[1..].iter().map(|r| r.event()).collect();
    assert_eq!(
        last_two,
        vec![
            &LedgerEvent::FeeRateChanged {
                previous: 100,
                current: 250
            },
            &LedgerEvent::GovernanceChanged {
                previous: f.owner,
                current: f.new_address
            },
        ]
    );
    assert_eq!(f.ledger.sequence(), 3);
}

// ============================================================================
// CONSERVATION
// ============================================================================

#[test]
fn test_supply_conserved_across_many_transfers() {
    let mut f = setup();
    let accounts: Vec<Address> = (0..5).map(|_| new_address()).collect();

    for (i, account) in accounts.iter().enumerate() {
        f.ledger
            .transfer(&f.owner, account, (i as Amount + 1) * 1_234_567 * TOKEN / 1_000)
            .unwrap();
    }
    for window in accounts.windows(2) {
        let amount = f.ledger.balance_of(&window[0]) / 3;
        f.ledger.transfer(&window[0], &window[1], amount).unwrap();
    }

    f.ledger.verify_supply().unwrap();
    assert!(f.ledger.total_supply() < TOTAL_SUPPLY);
}
