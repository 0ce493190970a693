use super::{expense, reg, test_trip, unreg};
use crate::core::engine::ledger::recalculate_all_balances;
use crate::core::engine::settlement::{SettlementLimits, settle};
use crate::core::engine::split::SplitRequest;
use crate::core::models::participant::ParticipantId;
use crate::core::models::settlement::{SettlementBound, SettlementPlan, Transfer};
use crate::core::money::is_settled;
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::BTreeMap;

fn apply(balances: &BTreeMap<ParticipantId, Decimal>, plan: &SettlementPlan) -> BTreeMap<ParticipantId, Decimal> {
    let mut remaining = balances.clone();
    for transfer in &plan.transfers {
        *remaining.entry(transfer.from.clone()).or_default() += transfer.amount;
        *remaining.entry(transfer.to.clone()).or_default() -= transfer.amount;
    }
    remaining
}

#[test]
fn test_largest_creditor_is_paid_by_largest_debtor() {
    let _ = env_logger::try_init();
    let balances = BTreeMap::from([(reg(1), dec!(50)), (reg(2), dec!(-30)), (reg(3), dec!(-20))]);

    let plan = settle(&balances, SettlementLimits::default());

    assert_eq!(
        plan.transfers,
        vec![
            Transfer {
                from: reg(2),
                to: reg(1),
                amount: dec!(30),
            },
            Transfer {
                from: reg(3),
                to: reg(1),
                amount: dec!(20),
            },
        ]
    );
    assert!(plan.is_complete());
}

#[test]
fn test_ties_go_to_the_first_participant() {
    let balances = BTreeMap::from([(reg(1), dec!(10)), (reg(2), dec!(10)), (unreg("zoe"), dec!(-20))]);

    let plan = settle(&balances, SettlementLimits::default());

    assert_eq!(plan.transfers.len(), 2);
    assert_eq!(plan.transfers[0].to, reg(1));
    assert_eq!(plan.transfers[1].to, reg(2));
    assert!(plan.transfers.iter().all(|t| t.from == unreg("zoe")));
}

#[test]
fn test_settled_balances_need_no_transfers() {
    let balances = BTreeMap::from([(reg(1), dec!(0.01)), (reg(2), dec!(-0.01)), (reg(3), Decimal::ZERO)]);

    let plan = settle(&balances, SettlementLimits::default());

    assert!(plan.transfers.is_empty());
    assert!(plan.is_complete());
    assert_eq!(settle(&BTreeMap::new(), SettlementLimits::default()), SettlementPlan::default());
}

#[test]
fn test_applying_plan_zeroes_trip_balances() {
    let mut trip = test_trip(&[2, 3, 4], &["Kim"]);
    trip.save_expense(expense(
        "Villa",
        dec!(1000),
        reg(1),
        SplitRequest::equal(vec![1, 2, 3, 4], vec!["Kim".to_string()]),
    ));
    trip.save_expense(expense(
        "Scooters",
        dec!(100),
        reg(2),
        SplitRequest::equal(vec![2, 3, 4], vec![]),
    ));
    trip.save_expense(expense(
        "Drinks",
        dec!(77.77),
        unreg("kim"),
        SplitRequest::equal(vec![1, 3], vec!["Kim".to_string()]),
    ));
    let balances = recalculate_all_balances(&trip);

    let plan = settle(&balances, SettlementLimits::default());

    assert!(plan.is_complete());
    assert!(plan.transfers.iter().all(|t| t.amount > Decimal::ZERO));
    for (participant, remaining) in apply(&balances, &plan) {
        assert!(is_settled(remaining), "{} still has {}", participant, remaining);
    }
}

#[test]
fn test_plan_is_truncated_at_transfer_cap() {
    let mut balances = BTreeMap::from([(reg(1), dec!(25))]);
    for user_id in 2..=26 {
        balances.insert(reg(user_id), dec!(-1));
    }

    let plan = settle(&balances, SettlementLimits::default());

    assert_eq!(plan.transfers.len(), 20);
    assert_eq!(plan.bounds_exceeded, vec![SettlementBound::Transfers { limit: 20, omitted: 5 }]);
    assert!(!plan.is_complete());
}

#[test]
fn test_iteration_cap_returns_partial_plan() {
    let mut balances = BTreeMap::from([(reg(1), dec!(5))]);
    for user_id in 2..=6 {
        balances.insert(reg(user_id), dec!(-1));
    }
    let limits = SettlementLimits {
        max_iterations: 3,
        max_transfers: 20,
    };

    let plan = settle(&balances, limits);

    assert_eq!(plan.transfers.len(), 3);
    assert_eq!(plan.bounds_exceeded, vec![SettlementBound::Iterations { limit: 3 }]);
}

#[test]
fn test_settlement_is_deterministic() {
    let balances = BTreeMap::from([
        (reg(4), dec!(12.5)),
        (unreg("ana"), dec!(-7.25)),
        (reg(9), dec!(-5.25)),
    ]);

    assert_eq!(
        settle(&balances, SettlementLimits::default()),
        settle(&balances, SettlementLimits::default())
    );
}

/// Balances in cents for 2 to 12 people, summing to zero. Nobody starts within a cent of zero.
fn arb_balances() -> impl Strategy<Value = BTreeMap<ParticipantId, Decimal>> {
    prop::collection::vec((2i64..=1_000_000, any::<bool>()), 1..12).prop_filter_map(
        "closing balance is within a cent of zero",
        |entries| {
            let mut cents: Vec<i64> = entries
                .into_iter()
                .map(|(c, owes)| if owes { -c } else { c })
                .collect();
            let closing = -cents.iter().sum::<i64>();
            if closing.abs() < 2 {
                return None;
            }
            cents.push(closing);
            Some(
                cents
                    .into_iter()
                    .enumerate()
                    .map(|(i, c)| (reg(i as u64 + 1), Decimal::new(c, 2)))
                    .collect::<BTreeMap<_, _>>(),
            )
        },
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn prop_applying_plan_zeroes_every_balance(balances in arb_balances()) {
        let plan = settle(&balances, SettlementLimits::default());

        prop_assert!(plan.is_complete());
        prop_assert!(plan.transfers.len() < balances.len());
        prop_assert!(plan.transfers.iter().all(|t| t.amount > Decimal::ZERO && t.from != t.to));
        for (participant, remaining) in apply(&balances, &plan) {
            prop_assert!(is_settled(remaining), "{} still has {}", participant, remaining);
        }
    }

    #[test]
    fn prop_settlement_is_deterministic(balances in arb_balances()) {
        let first = settle(&balances, SettlementLimits::default());
        let second = settle(&balances, SettlementLimits::default());
        prop_assert_eq!(first, second);
    }
}
