//! Net balances recomputed from scratch out of a trip's expenses, advances and
//! general payments. Nothing here is cached: every call reads the whole trip.

use crate::constants::UNCATEGORIZED;
use crate::core::models::expense::Expense;
use crate::core::models::participant::ParticipantId;
use crate::core::models::settlement::BalanceRow;
use crate::core::models::spending::{CategorySpending, SpendingSummary};
use crate::core::models::trip::Trip;
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::debug;

/// Expense amounts paid, general payments made and advances contributed.
pub fn total_paid(trip: &Trip, participant: &ParticipantId) -> Decimal {
    let participant = trip.resolve(participant);
    let expenses: Decimal = trip
        .expenses
        .iter()
        .filter(|e| e.is_paid_by(&participant))
        .map(|e| e.amount)
        .sum();
    let payments: Decimal = trip
        .general_payments
        .iter()
        .filter(|p| p.participant == participant)
        .map(|p| p.amount)
        .sum();
    let advance = trip.advances.get(&participant).copied().unwrap_or(Decimal::ZERO);
    expenses + payments + advance
}

/// Sum of this participant's shares across every expense.
pub fn total_share(trip: &Trip, participant: &ParticipantId) -> Decimal {
    let participant = trip.resolve(participant);
    trip.expenses.iter().map(|e| e.share_of(&participant)).sum()
}

/// Positive: the participant is owed money. Negative: they owe.
pub fn balance(trip: &Trip, participant: &ParticipantId) -> Decimal {
    total_paid(trip, participant) - total_share(trip, participant)
}

/// Balance of the admin, every registered participant, and every unlinked name.
pub fn recalculate_all_balances(trip: &Trip) -> BTreeMap<ParticipantId, Decimal> {
    let balances: BTreeMap<_, _> = trip
        .known_participants()
        .into_iter()
        .map(|p| {
            let b = balance(trip, &p);
            (p, b)
        })
        .collect();
    debug!("Recalculated {} balances for trip {}", balances.len(), trip.id);
    balances
}

/// Known participants that appear anywhere in the trip's records.
pub fn get_expense_contributors(trip: &Trip) -> BTreeSet<ParticipantId> {
    let mut seen: BTreeSet<ParticipantId> = BTreeSet::new();
    for expense in &trip.expenses {
        if let Some(payer) = expense.payer.participant() {
            seen.insert(payer.clone());
        }
        seen.extend(expense.participants.iter().cloned());
        seen.extend(expense.shares.keys().cloned());
    }
    seen.extend(trip.advances.keys().cloned());
    seen.extend(trip.general_payments.iter().map(|p| p.participant.clone()));

    trip.known_participants()
        .into_iter()
        .filter(|p| seen.contains(p))
        .collect()
}

/// The per-participant table shown next to the settlement plan.
pub fn summarize(trip: &Trip, user_names: &HashMap<u64, String>) -> Vec<BalanceRow> {
    trip.known_participants()
        .into_iter()
        .map(|participant| {
            let paid = total_paid(trip, &participant);
            let share = total_share(trip, &participant);
            BalanceRow {
                participant_display_name: trip.display_name(&participant, user_names),
                participant,
                total_paid: paid,
                total_share: share,
                balance: paid - share,
            }
        })
        .collect()
}

/// Every expense across `trips` in which the user owes something, with that share.
/// Shares still held under a name linked to the user count as theirs.
fn user_shares(trips: &[Trip], user_id: u64) -> impl Iterator<Item = (&Expense, Decimal)> {
    let user = ParticipantId::Registered(user_id);
    trips.iter().flat_map(move |trip| {
        let user = user.clone();
        trip.expenses.iter().filter_map(move |expense| {
            let share: Decimal = expense
                .shares
                .iter()
                .filter(|(participant, _)| trip.resolve(participant) == user)
                .map(|(_, amount)| *amount)
                .sum();
            (!share.is_zero()).then_some((expense, share))
        })
    })
}

/// The user's share summed per expense category.
pub fn spending_by_category(trips: &[Trip], user_id: u64) -> BTreeMap<String, Decimal> {
    let mut totals = BTreeMap::new();
    for (expense, share) in user_shares(trips, user_id) {
        let category = expense
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(UNCATEGORIZED);
        *totals.entry(category.to_string()).or_insert(Decimal::ZERO) += share;
    }
    totals
}

/// The user's share summed per calendar month, keyed `YYYY-MM`.
pub fn spending_by_month(trips: &[Trip], user_id: u64) -> BTreeMap<String, Decimal> {
    let mut totals = BTreeMap::new();
    for (expense, share) in user_shares(trips, user_id) {
        *totals
            .entry(expense.date.format("%Y-%m").to_string())
            .or_insert(Decimal::ZERO) += share;
    }
    totals
}

/// Categories largest first, ties by name.
pub fn spending_summary(trips: &[Trip], user_id: u64) -> SpendingSummary {
    let mut by_category: Vec<CategorySpending> = spending_by_category(trips, user_id)
        .into_iter()
        .map(|(category, amount)| CategorySpending { category, amount })
        .collect();
    by_category.sort_by(|a, b| b.amount.cmp(&a.amount).then_with(|| a.category.cmp(&b.category)));
    let by_month = spending_by_month(trips, user_id);
    SpendingSummary {
        user_id,
        total: by_month.values().copied().sum(),
        by_category,
        by_month,
    }
}
