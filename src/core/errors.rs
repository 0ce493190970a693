use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub title: String,
    pub description: String,
}

#[derive(Error, Debug, Clone, Serialize, PartialEq, Eq)]
pub enum TripSplitError {
    #[error("Invalid split input: {0}")]
    InvalidSplitInput(String),
    #[error("Unregistered participant {0} not found")]
    LinkNotFound(String),
    #[error("User {0} is already a participant of this trip")]
    AlreadyParticipant(u64),
    #[error("Unregistered participant {0} is already linked")]
    AlreadyLinked(String),
    #[error("Invalid participant id: {0}")]
    InvalidParticipantId(String),
    #[error("Trip {0} not found")]
    TripNotFound(String),
    #[error("Expense {0} not found")]
    ExpenseNotFound(String),
    #[error("No advance recorded for {0}")]
    AdvanceNotFound(String),
    #[error("General payment at index {0} not found")]
    PaymentNotFound(usize),
    #[error("{0} is not a participant of this trip")]
    NotTripParticipant(String),
    #[error("{0} is already a participant of this trip")]
    AlreadyTripParticipant(String),
    #[error("Invalid input for field `{0}`: {1:?}")]
    InvalidInput(String, FieldError),
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Logging error: {0}")]
    LoggingError(String),
    #[error("Internal server error: {0}")]
    InternalServerError(String),
}

impl TripSplitError {
    pub fn invalid_input(field: &str, title: &str, description: impl Into<String>) -> Self {
        TripSplitError::InvalidInput(
            field.to_string(),
            FieldError {
                field: field.to_string(),
                title: title.to_string(),
                description: description.into(),
            },
        )
    }
}
