// crates/syndicate-token/tests/prop_conservation.rs
//
// Property tests: balance conservation and voting-power consistency hold
// after every operation in arbitrary sequences, including rejected ones.

use proptest::prelude::*;

use syndicate_core::{AccountId, Amount};
use syndicate_token::{
    GatedToken, FEATURE_DELEGATIONS, FEATURE_TRANSFERS, FEATURE_TRANSFERS_ON_BEHALF,
};

const ACCOUNTS: usize = 4;

#[derive(Debug, Clone)]
enum Op {
    Transfer { from: usize, to: usize, amount: Amount },
    TransferFrom { spender: usize, from: usize, to: usize, amount: Amount },
    Approve { owner: usize, spender: usize, amount: Amount },
    Mint { to: usize, amount: Amount },
    Burn { from: usize, amount: Amount },
    Delegate { from: usize, to: Option<usize> },
}

fn account(index: usize) -> AccountId {
    AccountId::from_label(&format!("holder-{}", index))
}

fn admin() -> AccountId {
    AccountId::from_label("admin")
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let idx = 0..ACCOUNTS;
    let amount = 0u128..2_000u128;
    prop_oneof![
        (idx.clone(), idx.clone(), amount.clone())
            .prop_map(|(from, to, amount)| Op::Transfer { from, to, amount }),
        (idx.clone(), idx.clone(), idx.clone(), amount.clone()).prop_map(
            |(spender, from, to, amount)| Op::TransferFrom { spender, from, to, amount }
        ),
        (idx.clone(), idx.clone(), amount.clone())
            .prop_map(|(owner, spender, amount)| Op::Approve { owner, spender, amount }),
        (idx.clone(), amount.clone()).prop_map(|(to, amount)| Op::Mint { to, amount }),
        (idx.clone(), amount).prop_map(|(from, amount)| Op::Burn { from, amount }),
        (idx.clone(), proptest::option::of(idx))
            .prop_map(|(from, to)| Op::Delegate { from, to }),
    ]
}

fn apply(token: &mut GatedToken, op: &Op) {
    // Rejections are expected; only the invariants matter.
    let _ = match op {
        Op::Transfer { from, to, amount } => token.transfer(&account(*from), &account(*to), *amount),
        Op::TransferFrom { spender, from, to, amount } => {
            token.transfer_from(&account(*spender), &account(*from), &account(*to), *amount)
        }
        Op::Approve { owner, spender, amount } => {
            token.approve(&account(*owner), &account(*spender), *amount)
        }
        Op::Mint { to, amount } => token.mint(&admin(), &account(*to), *amount),
        Op::Burn { from, amount } => token.burn(&admin(), &account(*from), *amount),
        Op::Delegate { from, to } => {
            let target = to.map(account).unwrap_or(AccountId::ZERO);
            token.delegate(&account(*from), &target)
        }
    };
}

fn new_token() -> GatedToken {
    let mut token = GatedToken::new(AccountId::from_label("SYN"), "SYN", &[admin()])
        .with_initial_supply(&account(0), 5_000)
        .unwrap();
    token
        .update_features(
            &admin(),
            FEATURE_TRANSFERS | FEATURE_TRANSFERS_ON_BEHALF | FEATURE_DELEGATIONS,
        )
        .unwrap();
    token
}

proptest! {
    /// Sum of all balances equals total supply after every operation.
    #[test]
    fn balances_sum_to_total_supply(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut token = new_token();
        for op in &ops {
            apply(&mut token, op);
            let sum: Amount = token.holders().map(|(_, b)| *b).sum();
            prop_assert_eq!(sum, token.total_supply());
        }
    }

    /// Each account's voting power equals the balances of its current delegators.
    #[test]
    fn voting_power_matches_delegators(ops in prop::collection::vec(op_strategy(), 1..60)) {
        let mut token = new_token();
        for op in &ops {
            apply(&mut token, op);
        }
        for i in 0..ACCOUNTS {
            let delegate = account(i);
            let expected: Amount = token
                .delegation()
                .delegators_of(&delegate)
                .iter()
                .map(|d| token.balance_of(d))
                .sum();
            prop_assert_eq!(token.voting_power(&delegate), expected);
        }
    }
}
