use crate::config::CONFIG;
use crate::constants::actions::{
    ADVANCE_ADDED, ADVANCE_DELETED, ADVANCE_EDITED, EXPENSE_ADDED, EXPENSE_DELETED, EXPENSE_SPLIT_UPDATED,
    LINKED_PARTICIPANTS_RESYNCED, PARTICIPANT_ADDED, PARTICIPANT_LINKED, PARTICIPANT_REMOVED, PAYMENT_ADDED,
    PAYMENT_DELETED, PAYMENT_EDITED, SETTLEMENT_TRUNCATED, SPLIT_DRIFT_ABSORBED, SPLIT_DRIFT_TOLERATED,
    SPLIT_ITEM_SKIPPED, TRIP_CREATED, TRIP_DELETED, TRIP_UPDATED, UNREGISTERED_ADDED, UNREGISTERED_REMOVED,
};
use crate::core::engine::identity::{self, RewriteReport};
use crate::core::engine::ledger;
use crate::core::engine::settlement::{SettlementLimits, settle};
use crate::core::engine::split::{ExactShare, ItemInput, MethodInput, SplitEvent, SplitRequest, UnregisteredShare};
use crate::core::errors::TripSplitError;
use crate::core::models::{
    audit::{AppLog, LogQuery, TripAudit},
    expense::{Expense, NewExpense},
    participant::{ParticipantId, Payer},
    settlement::{SettlementPlan, SettlementReport},
    spending::SpendingSummary,
    trip::{Payment, Trip},
};
use crate::infrastructure::logging::LoggingService;
use crate::infrastructure::storage::Storage;
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::json;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

const MAX_NAME_LENGTH: usize = 100;
const MAX_DESCRIPTION_LENGTH: usize = 255;
const MAX_AMOUNT: Decimal = dec!(10000000);

/// Trip operations on top of a [`Storage`] and a [`LoggingService`].
///
/// Every mutation of a trip runs under that trip's lock: load, change, save. A
/// failing step returns before the save, so storage never sees half an operation.
pub struct TripService<L: LoggingService, S: Storage> {
    storage: S,
    logging: L,
    trip_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
    limits: SettlementLimits,
    default_currency: String,
}

impl<L: LoggingService, S: Storage> TripService<L, S> {
    pub fn new(storage: S, logging: L) -> Self {
        let limits = SettlementLimits {
            max_iterations: CONFIG.settlement_max_iterations,
            max_transfers: CONFIG.settlement_max_transfers,
        };
        Self::with_limits(storage, logging, limits, CONFIG.default_currency.clone())
    }

    pub fn with_limits(storage: S, logging: L, limits: SettlementLimits, default_currency: String) -> Self {
        info!(
            "Initializing TripService (max {} iterations, {} transfers)",
            limits.max_iterations, limits.max_transfers
        );
        TripService {
            storage,
            logging,
            trip_locks: Mutex::new(HashMap::new()),
            limits,
            default_currency,
        }
    }

    /// Only trips that exist get a registry entry; `delete_trip` drops it again.
    async fn lock_trip(&self, trip_id: &str) -> Result<OwnedMutexGuard<()>, TripSplitError> {
        let lock = {
            let mut locks = self.trip_locks.lock().await;
            match locks.get(trip_id) {
                Some(lock) => lock.clone(),
                None => {
                    if self.storage.get_trip(trip_id).await?.is_none() {
                        return Err(TripSplitError::TripNotFound(trip_id.to_string()));
                    }
                    locks.entry(trip_id.to_string()).or_default().clone()
                }
            }
        };
        Ok(lock.lock_owned().await)
    }

    #[cfg(test)]
    pub(crate) async fn tracked_trip_locks(&self) -> usize {
        self.trip_locks.lock().await.len()
    }

    async fn load_trip(&self, trip_id: &str) -> Result<Trip, TripSplitError> {
        self.storage
            .get_trip(trip_id)
            .await?
            .ok_or_else(|| TripSplitError::TripNotFound(trip_id.to_string()))
    }

    /// Runs `change` on a fresh copy of the trip and saves the copy only if it succeeds.
    async fn mutate_trip<T, F>(&self, trip_id: &str, change: F) -> Result<T, TripSplitError>
    where
        F: FnOnce(&mut Trip) -> Result<T, TripSplitError> + Send,
        T: Send,
    {
        let _guard = self.lock_trip(trip_id).await?;
        let mut trip = self.load_trip(trip_id).await?;
        let result = change(&mut trip)?;
        trip.touch();
        self.storage.save_trip(trip).await?;
        Ok(result)
    }

    async fn log_and_audit(
        &self,
        trip_id: &str,
        action: &str,
        log_details: serde_json::Value,
        user_id: Option<u64>,
    ) -> Result<(), TripSplitError> {
        self.logging
            .log_action(action, Some(trip_id), log_details.clone(), user_id)
            .await?;
        self.storage
            .save_trip_audit(TripAudit {
                id: Uuid::new_v4().to_string(),
                trip_id: trip_id.to_string(),
                action: action.to_string(),
                user_id,
                details: serde_json::from_value(log_details).unwrap_or_default(),
                timestamp: Utc::now(),
            })
            .await?;
        Ok(())
    }

    async fn audit_split_events(
        &self,
        trip_id: &str,
        expense_id: &str,
        events: &[SplitEvent],
        user_id: u64,
    ) -> Result<(), TripSplitError> {
        for event in events {
            let action = match event {
                SplitEvent::DriftAbsorbed { .. } => SPLIT_DRIFT_ABSORBED,
                SplitEvent::ItemSkipped { .. } => SPLIT_ITEM_SKIPPED,
                SplitEvent::ExactDriftTolerated { .. } => SPLIT_DRIFT_TOLERATED,
            };
            let mut details = serde_json::to_value(event)
                .map_err(|e| TripSplitError::InternalServerError(format!("Failed to serialize split event: {}", e)))?;
            if let Some(fields) = details.as_object_mut() {
                fields.insert("trip_id".to_string(), json!(trip_id));
                fields.insert("expense_id".to_string(), json!(expense_id));
            }
            self.log_and_audit(trip_id, action, details, Some(user_id)).await?;
        }
        Ok(())
    }

    fn validate_string_input(&self, field: &str, value: &str, max_length: usize) -> Result<(), TripSplitError> {
        if value.trim().is_empty() {
            return Err(TripSplitError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} cannot be empty", field),
            ));
        }
        if value.chars().count() > max_length {
            return Err(TripSplitError::invalid_input(
                field,
                &format!("{} Too Long", field),
                format!("{} cannot exceed {} characters", field, max_length),
            ));
        }
        if value.chars().any(|c| c.is_control() || "<>{}[]".contains(c)) {
            return Err(TripSplitError::invalid_input(
                field,
                &format!("Invalid {}", field),
                format!("{} contains invalid characters", field),
            ));
        }
        Ok(())
    }

    fn validate_amount_input(&self, field: &str, amount: Decimal) -> Result<(), TripSplitError> {
        if amount <= Decimal::ZERO {
            return Err(TripSplitError::invalid_input(
                field,
                "Invalid Amount",
                "Amount must be greater than 0",
            ));
        }
        if amount > MAX_AMOUNT {
            return Err(TripSplitError::invalid_input(
                field,
                "Amount Too Large",
                "Amount cannot exceed 10,000,000",
            ));
        }
        if amount.normalize().scale() > 2 {
            return Err(TripSplitError::invalid_input(
                field,
                "Invalid Amount",
                "Amount cannot have more than 2 decimal places",
            ));
        }
        Ok(())
    }

    // TRIPS

    pub async fn create_trip(
        &self,
        name: String,
        description: Option<String>,
        admin_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Trip, TripSplitError> {
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        if let Some(description) = &description {
            self.validate_string_input("description", description, MAX_DESCRIPTION_LENGTH)?;
        }
        let trip = Trip::new(name.trim().to_string(), description, admin_id, start_date, end_date)?;
        self.storage.save_trip(trip.clone()).await?;
        info!("Created trip {} for admin {}", trip.id, admin_id);

        self.log_and_audit(
            &trip.id,
            TRIP_CREATED,
            json!({
                "trip_id": trip.id,
                "name": trip.name,
                "start_date": trip.start_date,
                "end_date": trip.end_date
            }),
            Some(admin_id),
        )
        .await?;
        Ok(trip)
    }

    /// Admin only. Dates out of order leave the trip as it was.
    pub async fn update_trip(
        &self,
        trip_id: &str,
        name: String,
        description: Option<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
        updated_by: u64,
    ) -> Result<Trip, TripSplitError> {
        self.validate_string_input("name", &name, MAX_NAME_LENGTH)?;
        if let Some(description) = &description {
            self.validate_string_input("description", description, MAX_DESCRIPTION_LENGTH)?;
        }
        let trip = self
            .mutate_trip(trip_id, |trip| {
                if trip.admin_id != updated_by {
                    return Err(TripSplitError::invalid_input(
                        "updated_by",
                        "Permission Denied",
                        "Only the trip admin can edit the trip",
                    ));
                }
                trip.update_details(name.trim().to_string(), description, start_date, end_date)?;
                trip.touch();
                Ok(trip.clone())
            })
            .await?;

        self.log_and_audit(
            trip_id,
            TRIP_UPDATED,
            json!({
                "trip_id": trip_id,
                "name": trip.name,
                "start_date": trip.start_date,
                "end_date": trip.end_date
            }),
            Some(updated_by),
        )
        .await?;
        Ok(trip)
    }

    pub async fn get_trip(&self, trip_id: &str) -> Result<Trip, TripSplitError> {
        self.load_trip(trip_id).await
    }

    pub async fn list_user_trips(&self, user_id: u64) -> Result<Vec<Trip>, TripSplitError> {
        let mut trips = self.storage.list_user_trips(user_id).await?;
        trips.sort_by(|a, b| b.start_date.cmp(&a.start_date));
        Ok(trips)
    }

    pub async fn delete_trip(&self, trip_id: &str, deleted_by: u64) -> Result<(), TripSplitError> {
        {
            let _guard = self.lock_trip(trip_id).await?;
            if !self.storage.delete_trip(trip_id).await? {
                return Err(TripSplitError::TripNotFound(trip_id.to_string()));
            }
        }
        self.trip_locks.lock().await.remove(trip_id);
        info!("Deleted trip {}", trip_id);

        self.logging
            .log_action(TRIP_DELETED, Some(trip_id), json!({ "trip_id": trip_id }), Some(deleted_by))
            .await
    }

    // PARTICIPANTS

    pub async fn add_participant(&self, trip_id: &str, user_id: u64, added_by: u64) -> Result<(), TripSplitError> {
        self.mutate_trip(trip_id, |trip| {
            if trip.add_participant(user_id) {
                Ok(())
            } else {
                Err(TripSplitError::AlreadyTripParticipant(
                    ParticipantId::registered(user_id).to_string(),
                ))
            }
        })
        .await?;

        self.log_and_audit(
            trip_id,
            PARTICIPANT_ADDED,
            json!({ "trip_id": trip_id, "user_id": user_id }),
            Some(added_by),
        )
        .await
    }

    /// Only removes membership. Records that mention the user stay and keep counting.
    pub async fn remove_participant(&self, trip_id: &str, user_id: u64, removed_by: u64) -> Result<(), TripSplitError> {
        self.mutate_trip(trip_id, |trip| {
            if user_id == trip.admin_id {
                return Err(TripSplitError::invalid_input(
                    "user_id",
                    "Invalid Participant",
                    "The trip admin cannot be removed",
                ));
            }
            if trip.remove_participant(user_id) {
                Ok(())
            } else {
                Err(TripSplitError::NotTripParticipant(
                    ParticipantId::registered(user_id).to_string(),
                ))
            }
        })
        .await?;

        self.log_and_audit(
            trip_id,
            PARTICIPANT_REMOVED,
            json!({ "trip_id": trip_id, "user_id": user_id }),
            Some(removed_by),
        )
        .await
    }

    pub async fn add_unregistered_participant(
        &self,
        trip_id: &str,
        name: &str,
        added_by: u64,
    ) -> Result<ParticipantId, TripSplitError> {
        self.validate_string_input("name", name, MAX_NAME_LENGTH)?;
        let id = self
            .mutate_trip(trip_id, |trip| {
                let id = ParticipantId::unregistered(name)?;
                if trip.add_unregistered_participant(name)? {
                    Ok(id)
                } else {
                    Err(TripSplitError::AlreadyTripParticipant(id.to_string()))
                }
            })
            .await?;

        self.log_and_audit(
            trip_id,
            UNREGISTERED_ADDED,
            json!({ "trip_id": trip_id, "participant": id }),
            Some(added_by),
        )
        .await?;
        Ok(id)
    }

    pub async fn remove_unregistered_participant(
        &self,
        trip_id: &str,
        name: &str,
        removed_by: u64,
    ) -> Result<(), TripSplitError> {
        let id = ParticipantId::unregistered(name)?;
        self.mutate_trip(trip_id, |trip| {
            if trip.remove_unregistered_participant(name) {
                Ok(())
            } else {
                Err(TripSplitError::NotTripParticipant(id.to_string()))
            }
        })
        .await?;

        self.log_and_audit(
            trip_id,
            UNREGISTERED_REMOVED,
            json!({ "trip_id": trip_id, "participant": id }),
            Some(removed_by),
        )
        .await
    }

    // EXPENSES

    pub async fn add_expense(&self, trip_id: &str, new: NewExpense, created_by: u64) -> Result<Expense, TripSplitError> {
        self.validate_string_input("description", &new.description, MAX_DESCRIPTION_LENGTH)?;
        self.validate_amount_input("amount", new.amount)?;

        let (expense, events) = {
            let _guard = self.lock_trip(trip_id).await?;
            let trip = self.load_trip(trip_id).await?;
            let new = NewExpense {
                payer: route_payer(&trip, &new.payer)?,
                split: route_split_request(&trip, &new.split)?,
                ..new
            };
            let (expense, events) = Expense::create(new, &self.default_currency)?;
            self.storage.save_expense(trip_id, expense.clone()).await?;
            (expense, events)
        };
        debug!("Expense {} saved with {} shares", expense.id, expense.shares.len());

        self.log_and_audit(
            trip_id,
            EXPENSE_ADDED,
            json!({
                "trip_id": trip_id,
                "expense_id": expense.id,
                "description": expense.description,
                "amount": expense.amount,
                "currency": expense.currency,
                "payer": expense.payer,
                "split_method": expense.split_method
            }),
            Some(created_by),
        )
        .await?;
        self.audit_split_events(trip_id, &expense.id, &events, created_by).await?;
        Ok(expense)
    }

    /// Recomputes an expense's split. A rejected request leaves the old split in place.
    pub async fn update_expense_split(
        &self,
        trip_id: &str,
        expense_id: &str,
        request: SplitRequest,
        updated_by: u64,
    ) -> Result<Expense, TripSplitError> {
        let (expense, events) = self
            .mutate_trip(trip_id, |trip| {
                let request = route_split_request(trip, &request)?;
                let expense = trip
                    .expenses
                    .iter_mut()
                    .find(|e| e.id == expense_id)
                    .ok_or_else(|| TripSplitError::ExpenseNotFound(expense_id.to_string()))?;
                let events = expense.apply_split(&request)?;
                Ok((expense.clone(), events))
            })
            .await?;

        self.log_and_audit(
            trip_id,
            EXPENSE_SPLIT_UPDATED,
            json!({
                "trip_id": trip_id,
                "expense_id": expense.id,
                "split_method": expense.split_method,
                "participants": expense.participants
            }),
            Some(updated_by),
        )
        .await?;
        self.audit_split_events(trip_id, &expense.id, &events, updated_by).await?;
        Ok(expense)
    }

    pub async fn delete_expense(&self, trip_id: &str, expense_id: &str, deleted_by: u64) -> Result<Expense, TripSplitError> {
        let removed = {
            let _guard = self.lock_trip(trip_id).await?;
            self.storage.delete_expense(trip_id, expense_id).await?
        };

        self.log_and_audit(
            trip_id,
            EXPENSE_DELETED,
            json!({
                "trip_id": trip_id,
                "expense_id": removed.id,
                "amount": removed.amount,
                "payer": removed.payer
            }),
            Some(deleted_by),
        )
        .await?;
        Ok(removed)
    }

    pub async fn list_expenses(&self, trip_id: &str) -> Result<Vec<Expense>, TripSplitError> {
        self.storage.list_expenses(trip_id).await
    }

    // ADVANCES

    /// Returns the participant's advance total after the addition.
    pub async fn add_advance(
        &self,
        trip_id: &str,
        participant: &ParticipantId,
        amount: Decimal,
        added_by: u64,
    ) -> Result<Decimal, TripSplitError> {
        self.validate_amount_input("amount", amount)?;
        let total = self
            .mutate_trip(trip_id, |trip| trip.add_advance(participant, amount))
            .await?;

        self.log_and_audit(
            trip_id,
            ADVANCE_ADDED,
            json!({ "trip_id": trip_id, "participant": participant, "amount": amount, "total": total }),
            Some(added_by),
        )
        .await?;
        Ok(total)
    }

    pub async fn edit_advance(
        &self,
        trip_id: &str,
        participant: &ParticipantId,
        amount: Decimal,
        edited_by: u64,
    ) -> Result<(), TripSplitError> {
        self.validate_amount_input("amount", amount)?;
        self.mutate_trip(trip_id, |trip| trip.edit_advance(participant, amount))
            .await?;

        self.log_and_audit(
            trip_id,
            ADVANCE_EDITED,
            json!({ "trip_id": trip_id, "participant": participant, "amount": amount }),
            Some(edited_by),
        )
        .await
    }

    pub async fn delete_advance(
        &self,
        trip_id: &str,
        participant: &ParticipantId,
        deleted_by: u64,
    ) -> Result<Decimal, TripSplitError> {
        let removed = self
            .mutate_trip(trip_id, |trip| trip.delete_advance(participant))
            .await?;

        self.log_and_audit(
            trip_id,
            ADVANCE_DELETED,
            json!({ "trip_id": trip_id, "participant": participant, "amount": removed }),
            Some(deleted_by),
        )
        .await?;
        Ok(removed)
    }

    // GENERAL PAYMENTS

    /// Returns the index the payment was stored at.
    pub async fn add_general_payment(&self, trip_id: &str, payment: Payment, added_by: u64) -> Result<usize, TripSplitError> {
        self.validate_amount_input("amount", payment.amount)?;
        let participant = payment.participant.clone();
        let amount = payment.amount;
        let index = self
            .mutate_trip(trip_id, |trip| trip.add_general_payment(payment))
            .await?;

        self.log_and_audit(
            trip_id,
            PAYMENT_ADDED,
            json!({ "trip_id": trip_id, "index": index, "participant": participant, "amount": amount }),
            Some(added_by),
        )
        .await?;
        Ok(index)
    }

    pub async fn edit_general_payment(
        &self,
        trip_id: &str,
        index: usize,
        payment: Payment,
        edited_by: u64,
    ) -> Result<(), TripSplitError> {
        self.validate_amount_input("amount", payment.amount)?;
        let participant = payment.participant.clone();
        let amount = payment.amount;
        self.mutate_trip(trip_id, |trip| trip.edit_general_payment(index, payment))
            .await?;

        self.log_and_audit(
            trip_id,
            PAYMENT_EDITED,
            json!({ "trip_id": trip_id, "index": index, "participant": participant, "amount": amount }),
            Some(edited_by),
        )
        .await
    }

    pub async fn delete_general_payment(
        &self,
        trip_id: &str,
        index: usize,
        deleted_by: u64,
    ) -> Result<Payment, TripSplitError> {
        let removed = self
            .mutate_trip(trip_id, |trip| trip.delete_general_payment(index))
            .await?;

        self.log_and_audit(
            trip_id,
            PAYMENT_DELETED,
            json!({
                "trip_id": trip_id,
                "index": index,
                "participant": removed.participant,
                "amount": removed.amount
            }),
            Some(deleted_by),
        )
        .await?;
        Ok(removed)
    }

    // BALANCES AND SETTLEMENT

    pub async fn balances(&self, trip_id: &str) -> Result<BTreeMap<ParticipantId, Decimal>, TripSplitError> {
        let trip = self.load_trip(trip_id).await?;
        Ok(ledger::recalculate_all_balances(&trip))
    }

    pub async fn expense_contributors(&self, trip_id: &str) -> Result<BTreeSet<ParticipantId>, TripSplitError> {
        let trip = self.load_trip(trip_id).await?;
        Ok(ledger::get_expense_contributors(&trip))
    }

    pub async fn settlements(&self, trip_id: &str) -> Result<SettlementPlan, TripSplitError> {
        let trip = self.load_trip(trip_id).await?;
        self.plan_for(&trip).await
    }

    /// Balance table with display names, plus the transfer plan.
    pub async fn settlement_report(
        &self,
        trip_id: &str,
        user_names: &HashMap<u64, String>,
    ) -> Result<SettlementReport, TripSplitError> {
        let trip = self.load_trip(trip_id).await?;
        let plan = self.plan_for(&trip).await?;
        Ok(SettlementReport {
            trip_id: trip.id.clone(),
            trip_name: trip.name.clone(),
            total_expenses: trip.total_expenses(),
            balances: ledger::summarize(&trip, user_names),
            plan,
        })
    }

    async fn plan_for(&self, trip: &Trip) -> Result<SettlementPlan, TripSplitError> {
        let balances = ledger::recalculate_all_balances(trip);
        let plan = settle(&balances, self.limits);
        if !plan.is_complete() {
            warn!("Settlement plan for trip {} is incomplete", trip.id);
            self.log_and_audit(
                &trip.id,
                SETTLEMENT_TRUNCATED,
                json!({
                    "trip_id": trip.id,
                    "transfers": plan.transfers.len(),
                    "bounds_exceeded": plan.bounds_exceeded
                }),
                None,
            )
            .await?;
        }
        Ok(plan)
    }

    // IDENTITY

    /// Absorbs an unregistered name into a registered user. All or nothing.
    pub async fn link_participant(
        &self,
        trip_id: &str,
        name: &str,
        user_id: u64,
        linked_by: u64,
    ) -> Result<RewriteReport, TripSplitError> {
        let report = {
            let _guard = self.lock_trip(trip_id).await?;
            let trip = self.load_trip(trip_id).await?;
            let (linked, report) = identity::link(&trip, name, user_id)?;
            self.storage.save_trip(linked).await?;
            report
        };

        self.log_and_audit(
            trip_id,
            PARTICIPANT_LINKED,
            json!({
                "trip_id": trip_id,
                "name": ParticipantId::unregistered(name)?,
                "user_id": user_id,
                "rewritten": report
            }),
            Some(linked_by),
        )
        .await?;
        Ok(report)
    }

    /// Rewrites records that still mention a linked name. Safe to run repeatedly.
    pub async fn resync_linked_participants(&self, trip_id: &str, requested_by: u64) -> Result<RewriteReport, TripSplitError> {
        let report = {
            let _guard = self.lock_trip(trip_id).await?;
            let trip = self.load_trip(trip_id).await?;
            let (synced, report) = identity::resync(&trip);
            if !report.is_empty() {
                self.storage.save_trip(synced).await?;
            }
            report
        };

        if !report.is_empty() {
            self.log_and_audit(
                trip_id,
                LINKED_PARTICIPANTS_RESYNCED,
                json!({ "trip_id": trip_id, "rewritten": report }),
                Some(requested_by),
            )
            .await?;
        }
        Ok(report)
    }

    // SPENDING

    /// The user's own share of spending across every trip they belong to.
    pub async fn spending_summary(&self, user_id: u64) -> Result<SpendingSummary, TripSplitError> {
        let trips = self.storage.list_user_trips(user_id).await?;
        Ok(ledger::spending_summary(&trips, user_id))
    }

    // AUDIT

    pub async fn get_trip_audits(&self, trip_id: &str) -> Result<Vec<TripAudit>, TripSplitError> {
        self.storage.get_trip_audits(trip_id).await
    }

    pub async fn get_app_logs(&self, query: &LogQuery) -> Result<Vec<AppLog>, TripSplitError> {
        self.logging.get_logs(query).await
    }
}

fn route_payer(trip: &Trip, payer: &Payer) -> Result<Payer, TripSplitError> {
    match payer {
        Payer::Participant(id) => Ok(Payer::Participant(trip.require_known(id)?)),
        Payer::GroupEveryone => Ok(Payer::GroupEveryone),
    }
}

/// Checks everyone named in a split belongs to the trip and sends linked names to
/// their registered account, so new records never mention an absorbed name.
fn route_split_request(trip: &Trip, request: &SplitRequest) -> Result<SplitRequest, TripSplitError> {
    let (registered, unregistered) = route_people(trip, &request.registered, &request.unregistered)?;

    let input = match &request.input {
        MethodInput::None => MethodInput::None,
        MethodInput::Exact {
            registered: reg_shares,
            unregistered: unreg_shares,
        } => {
            let mut registered = Vec::with_capacity(reg_shares.len());
            let mut unregistered = Vec::new();
            let mut route = |id: ParticipantId, amount: Decimal| -> Result<(), TripSplitError> {
                match trip.require_known(&id)? {
                    ParticipantId::Registered(user_id) => registered.push(ExactShare { user_id, amount }),
                    ParticipantId::Unregistered(name) => unregistered.push(UnregisteredShare { name, amount }),
                }
                Ok(())
            };
            for share in reg_shares {
                route(ParticipantId::registered(share.user_id), share.amount)?;
            }
            for share in unreg_shares {
                route(ParticipantId::unregistered(&share.name)?, share.amount)?;
            }
            MethodInput::Exact {
                registered,
                unregistered,
            }
        }
        MethodInput::Itemized { items } => {
            let items = items
                .iter()
                .map(|item| {
                    let (participants, unregistered) = route_people(trip, &item.participants, &item.unregistered)?;
                    Ok(ItemInput {
                        name: item.name.clone(),
                        price: item.price,
                        participants,
                        unregistered,
                    })
                })
                .collect::<Result<Vec<_>, TripSplitError>>()?;
            MethodInput::Itemized { items }
        }
    };

    Ok(SplitRequest {
        method: request.method,
        registered,
        unregistered,
        input,
    })
}

fn route_people(trip: &Trip, registered: &[u64], unregistered: &[String]) -> Result<(Vec<u64>, Vec<String>), TripSplitError> {
    let mut reg = Vec::with_capacity(registered.len());
    let mut unreg = Vec::new();
    for user_id in registered {
        trip.require_known(&ParticipantId::registered(*user_id))?;
        reg.push(*user_id);
    }
    for name in unregistered {
        match trip.require_known(&ParticipantId::unregistered(name)?)? {
            ParticipantId::Registered(user_id) => reg.push(user_id),
            ParticipantId::Unregistered(name) => unreg.push(name),
        }
    }
    Ok((reg, unreg))
}
