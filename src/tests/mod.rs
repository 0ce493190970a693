mod identity_tests;
mod ledger_tests;
mod settlement_tests;

use crate::core::engine::settlement::SettlementLimits;
use crate::core::engine::split::SplitRequest;
use crate::core::models::expense::{Expense, NewExpense};
use crate::core::models::participant::{ParticipantId, Payer};
use crate::core::models::trip::Trip;
use crate::core::services::TripService;
use crate::infrastructure::logging::in_memory::InMemoryLogging;
use crate::infrastructure::storage::in_memory::InMemoryStorage;
use chrono::NaiveDate;
use rust_decimal::Decimal;

pub fn create_test_service() -> TripService<InMemoryLogging, InMemoryStorage> {
    create_test_service_with_limits(SettlementLimits::default())
}

pub fn create_test_service_with_limits(limits: SettlementLimits) -> TripService<InMemoryLogging, InMemoryStorage> {
    let storage = InMemoryStorage::new();
    let logging = InMemoryLogging::new();
    TripService::with_limits(storage, logging, limits, "INR".to_string())
}

pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

pub fn reg(user_id: u64) -> ParticipantId {
    ParticipantId::registered(user_id)
}

pub fn unreg(name: &str) -> ParticipantId {
    ParticipantId::unregistered(name).unwrap()
}

pub fn new_expense(description: &str, amount: Decimal, payer: impl Into<Payer>, split: SplitRequest) -> NewExpense {
    NewExpense {
        description: description.to_string(),
        amount,
        currency: None,
        date: date(2024, 3, 10),
        category: None,
        payer: payer.into(),
        split,
    }
}

pub fn expense(description: &str, amount: Decimal, payer: impl Into<Payer>, split: SplitRequest) -> Expense {
    Expense::create(new_expense(description, amount, payer, split), "INR")
        .unwrap()
        .0
}

/// Admin 1 plus the given registered ids and unregistered names.
pub fn test_trip(registered: &[u64], unregistered: &[&str]) -> Trip {
    let mut trip = Trip::new("Goa".to_string(), None, 1, date(2024, 3, 9), date(2024, 3, 14)).unwrap();
    for &user_id in registered {
        trip.add_participant(user_id);
    }
    for name in unregistered {
        trip.add_unregistered_participant(name).unwrap();
    }
    trip
}
