use super::expense::Expense;
use super::participant::{ParticipantId, UnregisteredParticipant, normalize_name, title_case};
use crate::core::errors::TripSplitError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub participant: ParticipantId,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
    /// Informational only; balances never look at it.
    #[serde(default)]
    pub related_expense_id: Option<String>,
}

fn check_dates(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), TripSplitError> {
    if end_date < start_date {
        return Err(TripSplitError::invalid_input(
            "end_date",
            "Invalid Dates",
            "Trip cannot end before it starts",
        ));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Trip {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub admin_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Does not need to contain the admin.
    #[serde(default)]
    pub registered_participants: BTreeSet<u64>,
    #[serde(default)]
    pub unregistered_participants: Vec<UnregisteredParticipant>,
    #[serde(default)]
    pub advances: BTreeMap<ParticipantId, Decimal>,
    #[serde(default)]
    pub general_payments: Vec<Payment>,
    #[serde(default)]
    pub expenses: Vec<Expense>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Trip {
    pub fn new(
        name: String,
        description: Option<String>,
        admin_id: u64,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Trip, TripSplitError> {
        check_dates(start_date, end_date)?;
        let now = Utc::now();
        Ok(Trip {
            id: Uuid::new_v4().to_string(),
            name,
            description,
            admin_id,
            start_date,
            end_date,
            registered_participants: BTreeSet::new(),
            unregistered_participants: Vec::new(),
            advances: BTreeMap::new(),
            general_payments: Vec::new(),
            expenses: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    /// Replaces name, description and dates. Nothing changes if the dates are out of order.
    pub fn update_details(
        &mut self,
        name: String,
        description: Option<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<(), TripSplitError> {
        check_dates(start_date, end_date)?;
        self.name = name;
        self.description = description;
        self.start_date = start_date;
        self.end_date = end_date;
        Ok(())
    }

    // PARTICIPANTS

    pub fn is_registered_participant(&self, user_id: u64) -> bool {
        user_id == self.admin_id || self.registered_participants.contains(&user_id)
    }

    /// Admin first, then the registered set in id order.
    pub fn registered_ids(&self) -> Vec<u64> {
        let mut ids = vec![self.admin_id];
        ids.extend(self.registered_participants.iter().copied().filter(|&id| id != self.admin_id));
        ids
    }

    pub fn add_participant(&mut self, user_id: u64) -> bool {
        if self.is_registered_participant(user_id) {
            return false;
        }
        self.registered_participants.insert(user_id)
    }

    pub fn remove_participant(&mut self, user_id: u64) -> bool {
        self.registered_participants.remove(&user_id)
    }

    pub fn unregistered(&self, name: &str) -> Option<&UnregisteredParticipant> {
        let name = normalize_name(name);
        self.unregistered_participants.iter().find(|p| p.name == name)
    }

    pub fn unregistered_mut(&mut self, name: &str) -> Option<&mut UnregisteredParticipant> {
        let name = normalize_name(name);
        self.unregistered_participants.iter_mut().find(|p| p.name == name)
    }

    pub fn add_unregistered_participant(&mut self, name: &str) -> Result<bool, TripSplitError> {
        let participant = UnregisteredParticipant::new(name)?;
        if self.unregistered(&participant.name).is_some() {
            return Ok(false);
        }
        self.unregistered_participants.push(participant);
        Ok(true)
    }

    pub fn remove_unregistered_participant(&mut self, name: &str) -> bool {
        let name = normalize_name(name);
        let before = self.unregistered_participants.len();
        self.unregistered_participants.retain(|p| p.name != name);
        self.unregistered_participants.len() != before
    }

    /// Unregistered names that still carry their own balance.
    pub fn active_unregistered(&self) -> impl Iterator<Item = &UnregisteredParticipant> {
        self.unregistered_participants.iter().filter(|p| !p.is_linked())
    }

    pub fn linked_unregistered(&self) -> impl Iterator<Item = &UnregisteredParticipant> {
        self.unregistered_participants.iter().filter(|p| p.is_linked())
    }

    /// Routes a linked name to the registered account it was absorbed into.
    pub fn resolve(&self, participant: &ParticipantId) -> ParticipantId {
        if let ParticipantId::Unregistered(name) = participant {
            if let Some(user_id) = self.unregistered(name).and_then(|p| p.linked_user_id) {
                return ParticipantId::Registered(user_id);
            }
        }
        participant.clone()
    }

    /// Everyone who can carry a balance: admin, registered participants, unlinked names.
    pub fn known_participants(&self) -> Vec<ParticipantId> {
        self.registered_ids()
            .into_iter()
            .map(ParticipantId::Registered)
            .chain(self.active_unregistered().map(UnregisteredParticipant::id))
            .collect()
    }

    pub fn is_known(&self, participant: &ParticipantId) -> bool {
        match participant {
            ParticipantId::Registered(id) => self.is_registered_participant(*id),
            ParticipantId::Unregistered(name) => self.unregistered(name).is_some_and(|p| !p.is_linked()),
        }
    }

    /// Resolves linked names, then rejects anyone who cannot carry a balance.
    pub fn require_known(&self, participant: &ParticipantId) -> Result<ParticipantId, TripSplitError> {
        let resolved = self.resolve(participant);
        if self.is_known(&resolved) {
            Ok(resolved)
        } else {
            Err(TripSplitError::NotTripParticipant(participant.to_string()))
        }
    }

    /// Whether any record (or link) still refers to this participant, member or not.
    pub fn mentions(&self, participant: &ParticipantId) -> bool {
        let in_expenses = self.expenses.iter().any(|e| {
            e.is_paid_by(participant)
                || e.participants.contains(participant)
                || e.shares.contains_key(participant)
                || e.items.iter().any(|item| item.participants.contains(participant))
        });
        let linked_to = participant.user_id().is_some_and(|user_id| {
            self.linked_unregistered()
                .any(|p| p.linked_user_id == Some(user_id))
        });
        in_expenses
            || linked_to
            || self.advances.contains_key(participant)
            || self.general_payments.iter().any(|p| &p.participant == participant)
    }

    pub fn display_name(&self, participant: &ParticipantId, user_names: &HashMap<u64, String>) -> String {
        match participant {
            ParticipantId::Registered(id) => user_names
                .get(id)
                .cloned()
                .unwrap_or_else(|| format!("User {}", id)),
            ParticipantId::Unregistered(name) => title_case(name),
        }
    }

    // ADVANCES

    /// Repeated contributions accumulate.
    pub fn add_advance(&mut self, participant: &ParticipantId, amount: Decimal) -> Result<Decimal, TripSplitError> {
        validate_positive("amount", amount)?;
        let key = self.require_known(participant)?;
        let entry = self.advances.entry(key).or_insert(Decimal::ZERO);
        *entry += amount;
        Ok(*entry)
    }

    pub fn edit_advance(&mut self, participant: &ParticipantId, amount: Decimal) -> Result<(), TripSplitError> {
        validate_positive("amount", amount)?;
        let key = self.resolve(participant);
        let entry = self
            .advances
            .get_mut(&key)
            .ok_or_else(|| TripSplitError::AdvanceNotFound(participant.to_string()))?;
        *entry = amount;
        Ok(())
    }

    pub fn delete_advance(&mut self, participant: &ParticipantId) -> Result<Decimal, TripSplitError> {
        let key = self.resolve(participant);
        self.advances
            .remove(&key)
            .ok_or_else(|| TripSplitError::AdvanceNotFound(participant.to_string()))
    }

    // GENERAL PAYMENTS

    pub fn add_general_payment(&mut self, mut payment: Payment) -> Result<usize, TripSplitError> {
        validate_positive("amount", payment.amount)?;
        payment.participant = self.require_known(&payment.participant)?;
        self.general_payments.push(payment);
        Ok(self.general_payments.len() - 1)
    }

    pub fn edit_general_payment(&mut self, index: usize, mut payment: Payment) -> Result<(), TripSplitError> {
        validate_positive("amount", payment.amount)?;
        payment.participant = self.require_known(&payment.participant)?;
        let slot = self
            .general_payments
            .get_mut(index)
            .ok_or(TripSplitError::PaymentNotFound(index))?;
        *slot = payment;
        Ok(())
    }

    pub fn delete_general_payment(&mut self, index: usize) -> Result<Payment, TripSplitError> {
        if index >= self.general_payments.len() {
            return Err(TripSplitError::PaymentNotFound(index));
        }
        Ok(self.general_payments.remove(index))
    }

    // EXPENSES

    pub fn expense(&self, expense_id: &str) -> Option<&Expense> {
        self.expenses.iter().find(|e| e.id == expense_id)
    }

    /// Inserts or replaces by id.
    pub fn save_expense(&mut self, expense: Expense) {
        match self.expenses.iter_mut().find(|e| e.id == expense.id) {
            Some(existing) => *existing = expense,
            None => self.expenses.push(expense),
        }
    }

    pub fn remove_expense(&mut self, expense_id: &str) -> Result<Expense, TripSplitError> {
        let index = self
            .expenses
            .iter()
            .position(|e| e.id == expense_id)
            .ok_or_else(|| TripSplitError::ExpenseNotFound(expense_id.to_string()))?;
        Ok(self.expenses.remove(index))
    }

    /// Newest first, the order expense lists are shown in.
    pub fn expenses_by_date_desc(&self) -> Vec<Expense> {
        let mut expenses = self.expenses.clone();
        expenses.sort_by(|a, b| b.date.cmp(&a.date).then_with(|| b.created_at.cmp(&a.created_at)));
        expenses
    }

    pub fn total_expenses(&self) -> Decimal {
        self.expenses.iter().map(|e| e.amount).sum()
    }
}

fn validate_positive(field: &str, amount: Decimal) -> Result<(), TripSplitError> {
    if amount <= Decimal::ZERO {
        return Err(TripSplitError::invalid_input(
            field,
            "Invalid Amount",
            "Amount must be greater than 0",
        ));
    }
    Ok(())
}
