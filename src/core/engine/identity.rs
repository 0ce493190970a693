//! Linking unregistered names to registered accounts.
//!
//! `link` and `resync` both go through [`rewrite_identity`]. Neither mutates its
//! input: they return a rewritten copy of the trip, which the caller persists in a
//! single write or drops. A failed call therefore leaves no partial rewrite behind.

use crate::core::errors::TripSplitError;
use crate::core::models::participant::{ParticipantId, normalize_name};
use crate::core::models::trip::Trip;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RewriteReport {
    pub payers: usize,
    pub expense_participants: usize,
    pub shares: usize,
    pub advances: usize,
    pub payments: usize,
    pub expenses_touched: usize,
}

impl RewriteReport {
    pub fn records(&self) -> usize {
        self.payers + self.expense_participants + self.shares + self.advances + self.payments
    }

    pub fn is_empty(&self) -> bool {
        self.records() == 0
    }

    fn merge(&mut self, other: &RewriteReport) {
        self.payers += other.payers;
        self.expense_participants += other.expense_participants;
        self.shares += other.shares;
        self.advances += other.advances;
        self.payments += other.payments;
        self.expenses_touched += other.expenses_touched;
    }
}

/// Replaces every reference to `old` with `new`, keeping all amounts.
///
/// Colliding entries are merged: shares and advances are summed under `new`,
/// participant lists keep a single `new`.
pub fn rewrite_identity(trip: &mut Trip, old: &ParticipantId, new: &ParticipantId) -> RewriteReport {
    let mut report = RewriteReport::default();
    if old == new {
        return report;
    }

    for expense in trip.expenses.iter_mut() {
        let mut touched = false;

        if expense.payer.is(old) {
            expense.payer = new.clone().into();
            report.payers += 1;
            touched = true;
        }

        if let Some(index) = expense.participants.iter().position(|p| p == old) {
            if expense.participants.contains(new) {
                expense.participants.remove(index);
            } else {
                expense.participants[index] = new.clone();
            }
            report.expense_participants += 1;
            touched = true;
        }

        for item in expense.items.iter_mut() {
            if let Some(index) = item.participants.iter().position(|p| p == old) {
                if item.participants.contains(new) {
                    item.participants.remove(index);
                } else {
                    item.participants[index] = new.clone();
                }
                touched = true;
            }
        }

        if expense.shares.rename(old, new).is_some() {
            report.shares += 1;
            touched = true;
        }

        if touched {
            report.expenses_touched += 1;
            debug!("Rewrote {} to {} in expense {}", old, new, expense.id);
        }
    }

    if let Some(amount) = trip.advances.remove(old) {
        *trip.advances.entry(new.clone()).or_default() += amount;
        report.advances += 1;
    }

    for payment in trip.general_payments.iter_mut().filter(|p| &p.participant == old) {
        payment.participant = new.clone();
        report.payments += 1;
    }

    report
}

/// Absorbs the unregistered `name` into `target_user_id` and returns the rewritten trip.
pub fn link(trip: &Trip, name: &str, target_user_id: u64) -> Result<(Trip, RewriteReport), TripSplitError> {
    let record = trip
        .unregistered(name)
        .ok_or_else(|| TripSplitError::LinkNotFound(normalize_name(name)))?;
    if record.is_linked() {
        return Err(TripSplitError::AlreadyLinked(record.name.clone()));
    }
    // A removed user with leftover records still carries a balance of their own.
    let new = ParticipantId::registered(target_user_id);
    if trip.is_registered_participant(target_user_id) || trip.mentions(&new) {
        return Err(TripSplitError::AlreadyParticipant(target_user_id));
    }

    let old = record.id();
    let mut linked = trip.clone();

    if let Some(record) = linked.unregistered_mut(name) {
        record.linked_user_id = Some(target_user_id);
    }
    linked.add_participant(target_user_id);
    let report = rewrite_identity(&mut linked, &old, &new);
    linked.touch();

    info!(
        "Linked {} to user {} in trip {}: {} records rewritten",
        old,
        target_user_id,
        trip.id,
        report.records()
    );
    Ok((linked, report))
}

/// Re-applies the rewrite for every linked name. Running it twice changes nothing
/// the second time.
pub fn resync(trip: &Trip) -> (Trip, RewriteReport) {
    let mut synced = trip.clone();
    let mut total = RewriteReport::default();

    let links: Vec<(ParticipantId, u64)> = trip
        .linked_unregistered()
        .filter_map(|p| p.linked_user_id.map(|user_id| (p.id(), user_id)))
        .collect();

    for (old, user_id) in links {
        synced.add_participant(user_id);
        let report = rewrite_identity(&mut synced, &old, &ParticipantId::registered(user_id));
        total.merge(&report);
    }

    if !total.is_empty() {
        synced.touch();
        info!("Resynced trip {}: {} records rewritten", trip.id, total.records());
    }
    (synced, total)
}
