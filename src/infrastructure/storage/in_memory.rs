use crate::core::errors::TripSplitError;
use crate::core::models::{audit::TripAudit, expense::Expense, trip::Trip};
use crate::infrastructure::storage::Storage;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Clone, Default)]
pub struct InMemoryStorage {
    trips: Arc<RwLock<HashMap<String, Trip>>>,
    trip_audits: Arc<RwLock<HashMap<String, Vec<TripAudit>>>>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        InMemoryStorage {
            trips: Arc::new(RwLock::new(HashMap::new())),
            trip_audits: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn get_trip(&self, trip_id: &str) -> Result<Option<Trip>, TripSplitError> {
        let trips = self.trips.read().await;
        Ok(trips.get(trip_id).cloned())
    }

    async fn save_trip(&self, trip: Trip) -> Result<(), TripSplitError> {
        let mut trips = self.trips.write().await;
        trips.insert(trip.id.clone(), trip);
        Ok(())
    }

    async fn delete_trip(&self, trip_id: &str) -> Result<bool, TripSplitError> {
        let mut trips = self.trips.write().await;
        Ok(trips.remove(trip_id).is_some())
    }

    async fn list_user_trips(&self, user_id: u64) -> Result<Vec<Trip>, TripSplitError> {
        let trips = self.trips.read().await;
        Ok(trips
            .values()
            .filter(|t| t.is_registered_participant(user_id))
            .cloned()
            .collect())
    }

    async fn list_expenses(&self, trip_id: &str) -> Result<Vec<Expense>, TripSplitError> {
        let trips = self.trips.read().await;
        trips
            .get(trip_id)
            .map(Trip::expenses_by_date_desc)
            .ok_or_else(|| TripSplitError::TripNotFound(trip_id.to_string()))
    }

    async fn save_expense(&self, trip_id: &str, expense: Expense) -> Result<String, TripSplitError> {
        let mut trips = self.trips.write().await;
        let trip = trips
            .get_mut(trip_id)
            .ok_or_else(|| TripSplitError::TripNotFound(trip_id.to_string()))?;
        let id = expense.id.clone();
        trip.save_expense(expense);
        trip.touch();
        Ok(id)
    }

    async fn delete_expense(&self, trip_id: &str, expense_id: &str) -> Result<Expense, TripSplitError> {
        let mut trips = self.trips.write().await;
        let trip = trips
            .get_mut(trip_id)
            .ok_or_else(|| TripSplitError::TripNotFound(trip_id.to_string()))?;
        let removed = trip.remove_expense(expense_id)?;
        trip.touch();
        Ok(removed)
    }

    async fn save_trip_audit(&self, audit: TripAudit) -> Result<(), TripSplitError> {
        let mut trip_audits = self.trip_audits.write().await;
        trip_audits.entry(audit.trip_id.clone()).or_default().push(audit);
        Ok(())
    }

    async fn get_trip_audits(&self, trip_id: &str) -> Result<Vec<TripAudit>, TripSplitError> {
        let trip_audits = self.trip_audits.read().await;
        Ok(trip_audits.get(trip_id).cloned().unwrap_or_default())
    }
}
