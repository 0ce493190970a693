use super::{date, expense, reg, test_trip, unreg};
use crate::core::engine::identity::{link, resync, rewrite_identity};
use crate::core::engine::ledger::{balance, recalculate_all_balances};
use crate::core::engine::split::{ExactShare, SplitRequest, UnregisteredShare};
use crate::core::errors::TripSplitError;
use crate::core::models::participant::Payer;
use crate::core::models::trip::{Payment, Trip};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Admin 1, user 2 and Carol, who paid for things, owes shares, and has an
/// advance and a general payment on record.
fn trip_with_carol() -> Trip {
    let mut trip = test_trip(&[2], &["Carol"]);
    trip.save_expense(expense(
        "Dinner",
        dec!(90),
        unreg("carol"),
        SplitRequest::equal(vec![1, 2], vec!["Carol".to_string()]),
    ));
    trip.save_expense(expense(
        "Kayaks",
        dec!(60),
        reg(1),
        SplitRequest::exact(
            vec![ExactShare {
                user_id: 2,
                amount: dec!(30),
            }],
            vec![UnregisteredShare {
                name: "carol".to_string(),
                amount: dec!(30),
            }],
        ),
    ));
    trip.add_advance(&unreg("carol"), dec!(20)).unwrap();
    trip.add_general_payment(Payment {
        participant: unreg("carol"),
        amount: dec!(10),
        description: "Cash to the pool".to_string(),
        date: date(2024, 3, 11),
        related_expense_id: None,
    })
    .unwrap();
    trip
}

#[test]
fn test_link_preserves_balance() {
    let _ = env_logger::try_init();
    let trip = trip_with_carol();
    let carol_before = balance(&trip, &unreg("carol"));
    assert_eq!(carol_before, dec!(60));

    let (linked, report) = link(&trip, "CAROL", 7).unwrap();

    assert_eq!(balance(&linked, &reg(7)), carol_before);
    let before: Decimal = recalculate_all_balances(&trip).values().sum();
    let after = recalculate_all_balances(&linked);
    assert_eq!(after.values().sum::<Decimal>(), before);
    assert!(!after.contains_key(&unreg("carol")));
    assert_eq!(after[&reg(7)], carol_before);
    assert_eq!(report.payers, 1);
    assert_eq!(report.shares, 2);
    assert_eq!(report.advances, 1);
    assert_eq!(report.payments, 1);
    assert_eq!(report.expenses_touched, 2);
}

#[test]
fn test_link_updates_membership_and_leaves_input_untouched() {
    let trip = trip_with_carol();
    let snapshot = trip.clone();

    let (linked, _) = link(&trip, "carol", 7).unwrap();

    assert_eq!(trip, snapshot);
    assert!(linked.is_registered_participant(7));
    assert_eq!(linked.unregistered("Carol").and_then(|p| p.linked_user_id), Some(7));
    assert_eq!(linked.resolve(&unreg("carol")), reg(7));
    assert!(linked.expenses.iter().all(|e| !e.shares.contains_key(&unreg("carol"))));
    assert_eq!(linked.expenses[0].payer, Payer::Participant(reg(7)));
    assert_eq!(linked.general_payments[0].participant, reg(7));
}

#[test]
fn test_link_rejections() {
    let trip = trip_with_carol();

    assert_eq!(
        link(&trip, "dan", 7).unwrap_err(),
        TripSplitError::LinkNotFound("dan".to_string())
    );
    assert_eq!(link(&trip, "carol", 1).unwrap_err(), TripSplitError::AlreadyParticipant(1));
    assert_eq!(link(&trip, "carol", 2).unwrap_err(), TripSplitError::AlreadyParticipant(2));

    let (linked, _) = link(&trip, "carol", 7).unwrap();
    assert_eq!(
        link(&linked, "Carol", 8).unwrap_err(),
        TripSplitError::AlreadyLinked("carol".to_string())
    );
}

#[test]
fn test_link_rejects_removed_user_with_records() {
    let mut trip = trip_with_carol();
    assert!(trip.remove_participant(2));
    assert!(trip.mentions(&reg(2)));
    let stale = balance(&trip, &reg(2));
    assert_ne!(stale, Decimal::ZERO);

    assert_eq!(link(&trip, "carol", 2).unwrap_err(), TripSplitError::AlreadyParticipant(2));
    assert_eq!(balance(&trip, &unreg("carol")), dec!(60));

    // A removed user with nothing on record can still take over the name.
    let mut clean = trip_with_carol();
    clean.add_participant(9);
    clean.remove_participant(9);
    let (linked, _) = link(&clean, "carol", 9).unwrap();
    assert_eq!(balance(&linked, &reg(9)), dec!(60));
}

#[test]
fn test_rewrite_merges_colliding_records() {
    let mut trip = test_trip(&[2], &["Carol"]);
    trip.save_expense(expense(
        "Tickets",
        dec!(60),
        reg(1),
        SplitRequest::equal(vec![2], vec!["carol".to_string()]),
    ));
    trip.add_advance(&reg(2), dec!(10)).unwrap();
    trip.add_advance(&unreg("carol"), dec!(5)).unwrap();

    let report = rewrite_identity(&mut trip, &unreg("carol"), &reg(2));

    assert_eq!(trip.advances.get(&reg(2)), Some(&dec!(15)));
    assert_eq!(trip.advances.len(), 1);
    let tickets = &trip.expenses[0];
    assert_eq!(tickets.participants, vec![reg(2)]);
    assert_eq!(tickets.shares.len(), 1);
    assert_eq!(tickets.share_of(&reg(2)), dec!(60));
    assert_eq!(report.advances, 1);
}

#[test]
fn test_resync_repairs_stale_records_once() {
    let trip = trip_with_carol();
    let (mut linked, _) = link(&trip, "carol", 7).unwrap();
    // Written by an older input path that did not route through the link.
    linked.expenses.push(expense(
        "Late taxi",
        dec!(18),
        unreg("carol"),
        SplitRequest::equal(vec![2], vec!["carol".to_string()]),
    ));

    let (synced, report) = resync(&linked);
    assert_eq!(report.payers, 1);
    assert_eq!(report.shares, 1);
    assert_eq!(synced.expenses[2].payer, Payer::Participant(reg(7)));
    assert_eq!(synced.expenses[2].share_of(&reg(7)), dec!(9));

    let (again, second) = resync(&synced);
    assert!(second.is_empty());
    assert_eq!(again, synced);
}

#[test]
fn test_resync_without_links_changes_nothing() {
    let trip = trip_with_carol();

    let (synced, report) = resync(&trip);

    assert!(report.is_empty());
    assert_eq!(synced, trip);
}
