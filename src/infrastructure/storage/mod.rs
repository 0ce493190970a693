use crate::core::errors::TripSplitError;
use crate::core::models::{audit::TripAudit, expense::Expense, trip::Trip};
use async_trait::async_trait;

/// Record store for trips. A trip owns its expenses, so deleting a trip removes them too.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, TripSplitError>;
    async fn save_trip(&self, trip: Trip) -> Result<(), TripSplitError>;
    async fn delete_trip(&self, trip_id: &str) -> Result<bool, TripSplitError>;
    async fn list_user_trips(&self, user_id: u64) -> Result<Vec<Trip>, TripSplitError>;
    /// Newest first.
    async fn list_expenses(&self, trip_id: &str) -> Result<Vec<Expense>, TripSplitError>;
    async fn save_expense(&self, trip_id: &str, expense: Expense) -> Result<String, TripSplitError>;
    async fn delete_expense(&self, trip_id: &str, expense_id: &str) -> Result<Expense, TripSplitError>;
    async fn save_trip_audit(&self, audit: TripAudit) -> Result<(), TripSplitError>;
    async fn get_trip_audits(&self, trip_id: &str) -> Result<Vec<TripAudit>, TripSplitError>;
}

pub mod in_memory;
