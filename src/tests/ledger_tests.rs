use super::{date, expense, reg, test_trip, unreg};
use crate::core::engine::ledger::{
    balance, get_expense_contributors, recalculate_all_balances, spending_by_category, spending_by_month,
    spending_summary, summarize, total_paid, total_share,
};
use crate::core::engine::split::{ExactShare, SplitRequest, UnregisteredShare};
use crate::core::models::participant::Payer;
use crate::core::models::trip::{Payment, Trip};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

fn sample_trip() -> Trip {
    let mut trip = test_trip(&[2, 3], &["Dave"]);
    trip.save_expense(expense(
        "Hotel",
        dec!(100),
        reg(1),
        SplitRequest::equal(vec![1, 2, 3], vec![]),
    ));
    trip.save_expense(expense(
        "Boat",
        dec!(90.50),
        unreg("dave"),
        SplitRequest::equal(vec![2, 3], vec!["Dave".to_string()]),
    ));
    trip.save_expense(expense(
        "Lunch",
        dec!(45),
        reg(3),
        SplitRequest::exact(
            vec![
                ExactShare {
                    user_id: 1,
                    amount: dec!(20),
                },
                ExactShare {
                    user_id: 3,
                    amount: dec!(25),
                },
            ],
            vec![],
        ),
    ));
    trip
}

#[test]
fn test_balances_conserve_money() {
    let _ = env_logger::try_init();
    let trip = sample_trip();

    let balances = recalculate_all_balances(&trip);

    assert_eq!(balances.len(), 4);
    let sum: Decimal = balances.values().sum();
    assert!(sum.abs() <= dec!(0.01), "balances sum to {}", sum);
}

#[test]
fn test_balance_is_paid_minus_share() {
    let trip = sample_trip();

    assert_eq!(total_paid(&trip, &reg(1)), dec!(100));
    assert_eq!(total_share(&trip, &reg(1)), dec!(53.34));
    assert_eq!(balance(&trip, &reg(1)), dec!(46.66));
    // Dave paid 90.50 and owes 30.17; participant 2 took the -0.01 drift.
    assert_eq!(balance(&trip, &unreg("DAVE")), dec!(60.33));
}

#[test]
fn test_advance_shifts_only_its_participant() {
    let mut trip = sample_trip();
    let before = recalculate_all_balances(&trip);

    trip.add_advance(&reg(2), dec!(75)).unwrap();
    let after = recalculate_all_balances(&trip);

    for (participant, amount) in &before {
        let expected = if *participant == reg(2) { amount + dec!(75) } else { *amount };
        assert_eq!(after[participant], expected);
    }
}

#[test]
fn test_repeated_advances_accumulate() {
    let mut trip = test_trip(&[2], &[]);

    assert_eq!(trip.add_advance(&reg(2), dec!(10)).unwrap(), dec!(10));
    assert_eq!(trip.add_advance(&reg(2), dec!(15.5)).unwrap(), dec!(25.5));
    assert_eq!(total_paid(&trip, &reg(2)), dec!(25.5));
}

#[test]
fn test_group_pool_payer_credits_nobody() {
    let mut trip = test_trip(&[2, 3], &[]);
    trip.save_expense(expense(
        "Fuel",
        dec!(90),
        Payer::GroupEveryone,
        SplitRequest::equal(vec![1, 2, 3], vec![]),
    ));

    let balances = recalculate_all_balances(&trip);
    assert!(balances.values().all(|b| *b == dec!(-30)));

    trip.add_advance(&reg(1), dec!(90)).unwrap();
    let balances = recalculate_all_balances(&trip);
    assert_eq!(balances[&reg(1)], dec!(60));
    assert_eq!(balances.values().sum::<Decimal>(), Decimal::ZERO);
}

#[test]
fn test_general_payment_counts_as_paid() {
    let mut trip = sample_trip();
    let before = balance(&trip, &reg(2));

    trip.add_general_payment(Payment {
        participant: reg(2),
        amount: dec!(12.25),
        description: "Paid Dave back".to_string(),
        date: date(2024, 3, 12),
        related_expense_id: None,
    })
    .unwrap();

    assert_eq!(balance(&trip, &reg(2)), before + dec!(12.25));
}

#[test]
fn test_deleting_expense_cancels_it() {
    let mut trip = sample_trip();
    let before = recalculate_all_balances(&trip);

    let extra = expense(
        "Souvenirs",
        dec!(33.33),
        reg(2),
        SplitRequest::exact(
            vec![ExactShare {
                user_id: 1,
                amount: dec!(13.33),
            }],
            vec![UnregisteredShare {
                name: "dave".to_string(),
                amount: dec!(20),
            }],
        ),
    );
    let extra_id = extra.id.clone();
    trip.save_expense(extra);
    assert_ne!(recalculate_all_balances(&trip), before);

    trip.remove_expense(&extra_id).unwrap();
    assert_eq!(recalculate_all_balances(&trip), before);
}

#[test]
fn test_recalculation_is_idempotent() {
    let trip = sample_trip();

    assert_eq!(recalculate_all_balances(&trip), recalculate_all_balances(&trip));
}

#[test]
fn test_removed_participant_records_leave_the_balance_table() {
    let mut trip = sample_trip();

    trip.remove_participant(3);
    let balances = recalculate_all_balances(&trip);

    assert!(!balances.contains_key(&reg(3)));
    assert_eq!(balances.len(), 3);
}

#[test]
fn test_contributors_are_known_participants_with_records() {
    let mut trip = test_trip(&[2, 3, 4], &["Eve", "Finn"]);
    trip.save_expense(expense(
        "Museum",
        dec!(30),
        reg(2),
        SplitRequest::equal(vec![2, 3], vec![]),
    ));
    trip.add_advance(&unreg("eve"), dec!(5)).unwrap();

    let contributors = get_expense_contributors(&trip);

    assert_eq!(
        contributors.into_iter().collect::<Vec<_>>(),
        vec![reg(2), reg(3), unreg("eve")]
    );
}

#[test]
fn test_summary_rows_carry_display_names() {
    let trip = sample_trip();
    let names = HashMap::from([(1, "Asha".to_string()), (2, "Ben".to_string())]);

    let rows = summarize(&trip, &names);

    let labels: Vec<&str> = rows.iter().map(|r| r.participant_display_name.as_str()).collect();
    assert_eq!(labels, vec!["Asha", "Ben", "User 3", "Dave"]);
    for row in &rows {
        assert_eq!(row.balance, row.total_paid - row.total_share);
    }
}

/// Sample trip with categories, plus a second trip in April shared by users 1 and 2.
fn categorized_trips() -> Vec<Trip> {
    let mut goa = sample_trip();
    goa.expenses[0].category = Some("Stay".to_string());
    goa.expenses[1].category = Some("Transport".to_string());

    let mut pune = test_trip(&[2], &[]);
    let mut dinner = expense("Dinner", dec!(50), reg(2), SplitRequest::equal(vec![1, 2], vec![]));
    dinner.date = date(2024, 4, 2);
    pune.save_expense(dinner);
    vec![goa, pune]
}

#[test]
fn test_spending_sums_the_users_share_not_what_they_paid() {
    let trips = categorized_trips();

    let by_category = spending_by_category(&trips, 2);
    assert_eq!(by_category.len(), 3);
    assert_eq!(by_category["Stay"], dec!(33.33));
    assert_eq!(by_category["Transport"], dec!(30.16));
    assert_eq!(by_category["Uncategorized"], dec!(25));

    let by_month = spending_by_month(&trips, 2);
    assert_eq!(by_month["2024-03"], dec!(63.49));
    assert_eq!(by_month["2024-04"], dec!(25));

    assert_eq!(spending_by_category(&trips, 1)["Uncategorized"], dec!(45));
    assert!(spending_by_category(&trips, 42).is_empty());
}

#[test]
fn test_spending_summary_orders_categories_by_amount() {
    let trips = categorized_trips();

    let summary = spending_summary(&trips, 2);

    assert_eq!(summary.total, dec!(88.49));
    let order: Vec<_> = summary.by_category.iter().map(|c| c.category.as_str()).collect();
    assert_eq!(order, vec!["Stay", "Transport", "Uncategorized"]);
}

#[test]
fn test_spending_follows_linked_names() {
    let mut trips = categorized_trips();
    if let Some(dave) = trips[0].unregistered_mut("dave") {
        dave.linked_user_id = Some(9);
    }

    let by_category = spending_by_category(&trips, 9);

    assert_eq!(by_category.len(), 1);
    assert_eq!(by_category["Transport"], dec!(30.17));
}
