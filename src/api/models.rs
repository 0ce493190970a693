use axum::{Json, http::StatusCode, response::IntoResponse};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::engine::split::SplitRequest;
use crate::core::errors::TripSplitError;
use crate::core::models::{expense::NewExpense, participant::ParticipantId, trip::Payment};

// Request structs for JSON payloads
#[derive(Deserialize)]
pub struct CreateTripRequest {
    pub name: String,
    pub description: Option<String>,
    pub admin_id: u64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

#[derive(Deserialize)]
pub struct UpdateTripRequest {
    pub name: String,
    pub description: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub updated_by_id: u64,
}

/// Who is acting, for requests without a body.
#[derive(Deserialize)]
pub struct ActorQuery {
    pub user_id: u64,
}

#[derive(Deserialize)]
pub struct AddParticipantRequest {
    pub user_id: u64,
    pub added_by_id: u64,
}

#[derive(Deserialize)]
pub struct AddUnregisteredRequest {
    pub name: String,
    pub added_by_id: u64,
}

#[derive(Serialize)]
pub struct AddUnregisteredResponse {
    pub participant: ParticipantId,
}

#[derive(Deserialize)]
pub struct AddExpenseRequest {
    pub expense: NewExpense,
    pub created_by_id: u64,
}

#[derive(Deserialize)]
pub struct UpdateSplitRequest {
    pub split: SplitRequest,
    pub updated_by_id: u64,
}

#[derive(Deserialize)]
pub struct AddAdvanceRequest {
    pub participant: ParticipantId,
    pub amount: Decimal,
    pub added_by_id: u64,
}

#[derive(Serialize)]
pub struct AdvanceTotalResponse {
    pub participant: ParticipantId,
    pub total: Decimal,
}

#[derive(Deserialize)]
pub struct AddPaymentRequest {
    pub payment: Payment,
    pub added_by_id: u64,
}

#[derive(Serialize)]
pub struct PaymentIndexResponse {
    pub index: usize,
}

#[derive(Deserialize)]
pub struct LinkRequest {
    pub name: String,
    pub user_id: u64,
    pub linked_by_id: u64,
}

#[derive(Deserialize)]
pub struct ResyncRequest {
    pub requested_by_id: u64,
}

// Error response struct
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

// Newtype wrapper for TripSplitError to implement IntoResponse
pub struct ApiError(pub TripSplitError);

impl From<TripSplitError> for ApiError {
    fn from(err: TripSplitError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self.0 {
            TripSplitError::InvalidSplitInput(_)
            | TripSplitError::InvalidParticipantId(_)
            | TripSplitError::InvalidInput(_, _) => StatusCode::BAD_REQUEST,
            TripSplitError::LinkNotFound(_)
            | TripSplitError::TripNotFound(_)
            | TripSplitError::ExpenseNotFound(_)
            | TripSplitError::AdvanceNotFound(_)
            | TripSplitError::PaymentNotFound(_) => StatusCode::NOT_FOUND,
            TripSplitError::AlreadyParticipant(_)
            | TripSplitError::AlreadyLinked(_)
            | TripSplitError::AlreadyTripParticipant(_) => StatusCode::CONFLICT,
            TripSplitError::NotTripParticipant(_) => StatusCode::FORBIDDEN,
            TripSplitError::StorageError(_)
            | TripSplitError::LoggingError(_)
            | TripSplitError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let error_message = match &self.0 {
            TripSplitError::InvalidInput(_, field) => format!("{}: {}", field.title, field.description),
            other => other.to_string(),
        };
        (status, Json(ErrorResponse { error: error_message })).into_response()
    }
}
