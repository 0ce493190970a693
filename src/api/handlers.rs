use crate::{
    api::models::*,
    core::{
        engine::identity::RewriteReport,
        models::{
            audit::{AppLog, LogQuery, TripAudit},
            expense::Expense,
            participant::ParticipantId,
            settlement::SettlementReport,
            spending::SpendingSummary,
            trip::Trip,
        },
        services::TripService,
    },
    infrastructure::{logging::in_memory::InMemoryLogging, storage::in_memory::InMemoryStorage},
};
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post},
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

pub type SharedTripService = Arc<TripService<InMemoryLogging, InMemoryStorage>>;

// Define API routes
pub fn api_routes(service: SharedTripService) -> Router {
    Router::new()
        .route("/", get(|| async { "OK" }))
        .route("/trips", post(create_trip))
        .route("/trips/{trip_id}", get(get_trip).put(update_trip).delete(delete_trip))
        .route("/users/{user_id}/trips", get(list_user_trips))
        .route("/users/{user_id}/spending", get(get_spending_summary))
        .route("/trips/{trip_id}/participants", post(add_participant))
        .route("/trips/{trip_id}/unregistered", post(add_unregistered_participant))
        .route("/trips/{trip_id}/expenses", post(add_expense).get(list_expenses))
        .route("/trips/{trip_id}/expenses/{expense_id}", delete(delete_expense))
        .route("/trips/{trip_id}/expenses/{expense_id}/split", post(update_expense_split))
        .route("/trips/{trip_id}/advances", post(add_advance))
        .route("/trips/{trip_id}/payments", post(add_general_payment))
        .route("/trips/{trip_id}/balances", get(get_balances))
        .route("/trips/{trip_id}/contributors", get(get_contributors))
        .route("/trips/{trip_id}/settlements", get(get_settlements))
        .route("/trips/{trip_id}/link", post(link_participant))
        .route("/trips/{trip_id}/resync", post(resync_linked_participants))
        .route("/trips/{trip_id}/audits", get(get_trip_audits))
        .route("/logs", get(get_app_logs))
        .with_state(service)
}

async fn create_trip(
    State(service): State<SharedTripService>,
    Json(req): Json<CreateTripRequest>,
) -> Result<(StatusCode, Json<Trip>), ApiError> {
    let trip = service
        .create_trip(req.name, req.description, req.admin_id, req.start_date, req.end_date)
        .await?;
    Ok((StatusCode::CREATED, Json(trip)))
}

async fn get_trip(State(service): State<SharedTripService>, Path(trip_id): Path<String>) -> Result<Json<Trip>, ApiError> {
    let trip = service.get_trip(&trip_id).await?;
    Ok(Json(trip))
}

async fn update_trip(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
    Json(req): Json<UpdateTripRequest>,
) -> Result<Json<Trip>, ApiError> {
    let trip = service
        .update_trip(&trip_id, req.name, req.description, req.start_date, req.end_date, req.updated_by_id)
        .await?;
    Ok(Json(trip))
}

async fn delete_trip(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
    Query(actor): Query<ActorQuery>,
) -> Result<StatusCode, ApiError> {
    service.delete_trip(&trip_id, actor.user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_user_trips(
    State(service): State<SharedTripService>,
    Path(user_id): Path<u64>,
) -> Result<Json<Vec<Trip>>, ApiError> {
    let trips = service.list_user_trips(user_id).await?;
    Ok(Json(trips))
}

async fn get_spending_summary(
    State(service): State<SharedTripService>,
    Path(user_id): Path<u64>,
) -> Result<Json<SpendingSummary>, ApiError> {
    let summary = service.spending_summary(user_id).await?;
    Ok(Json(summary))
}

async fn add_participant(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
    Json(req): Json<AddParticipantRequest>,
) -> Result<StatusCode, ApiError> {
    service.add_participant(&trip_id, req.user_id, req.added_by_id).await?;
    Ok(StatusCode::CREATED)
}

async fn add_unregistered_participant(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
    Json(req): Json<AddUnregisteredRequest>,
) -> Result<(StatusCode, Json<AddUnregisteredResponse>), ApiError> {
    let participant = service
        .add_unregistered_participant(&trip_id, &req.name, req.added_by_id)
        .await?;
    Ok((StatusCode::CREATED, Json(AddUnregisteredResponse { participant })))
}

async fn add_expense(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
    Json(req): Json<AddExpenseRequest>,
) -> Result<(StatusCode, Json<Expense>), ApiError> {
    let expense = service.add_expense(&trip_id, req.expense, req.created_by_id).await?;
    Ok((StatusCode::CREATED, Json(expense)))
}

async fn list_expenses(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
) -> Result<Json<Vec<Expense>>, ApiError> {
    let expenses = service.list_expenses(&trip_id).await?;
    Ok(Json(expenses))
}

async fn update_expense_split(
    State(service): State<SharedTripService>,
    Path((trip_id, expense_id)): Path<(String, String)>,
    Json(req): Json<UpdateSplitRequest>,
) -> Result<Json<Expense>, ApiError> {
    let expense = service
        .update_expense_split(&trip_id, &expense_id, req.split, req.updated_by_id)
        .await?;
    Ok(Json(expense))
}

async fn delete_expense(
    State(service): State<SharedTripService>,
    Path((trip_id, expense_id)): Path<(String, String)>,
    Query(actor): Query<ActorQuery>,
) -> Result<Json<Expense>, ApiError> {
    let removed = service.delete_expense(&trip_id, &expense_id, actor.user_id).await?;
    Ok(Json(removed))
}

async fn add_advance(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
    Json(req): Json<AddAdvanceRequest>,
) -> Result<Json<AdvanceTotalResponse>, ApiError> {
    let total = service
        .add_advance(&trip_id, &req.participant, req.amount, req.added_by_id)
        .await?;
    Ok(Json(AdvanceTotalResponse {
        participant: req.participant,
        total,
    }))
}

async fn add_general_payment(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
    Json(req): Json<AddPaymentRequest>,
) -> Result<(StatusCode, Json<PaymentIndexResponse>), ApiError> {
    let index = service
        .add_general_payment(&trip_id, req.payment, req.added_by_id)
        .await?;
    Ok((StatusCode::CREATED, Json(PaymentIndexResponse { index })))
}

async fn get_balances(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
) -> Result<Json<BTreeMap<ParticipantId, Decimal>>, ApiError> {
    let balances = service.balances(&trip_id).await?;
    Ok(Json(balances))
}

async fn get_contributors(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
) -> Result<Json<BTreeSet<ParticipantId>>, ApiError> {
    let contributors = service.expense_contributors(&trip_id).await?;
    Ok(Json(contributors))
}

async fn get_settlements(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
) -> Result<Json<SettlementReport>, ApiError> {
    // No user directory here; registered users are shown as "User <id>".
    let report = service.settlement_report(&trip_id, &HashMap::new()).await?;
    Ok(Json(report))
}

async fn link_participant(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
    Json(req): Json<LinkRequest>,
) -> Result<Json<RewriteReport>, ApiError> {
    let report = service
        .link_participant(&trip_id, &req.name, req.user_id, req.linked_by_id)
        .await?;
    Ok(Json(report))
}

async fn resync_linked_participants(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
    Json(req): Json<ResyncRequest>,
) -> Result<Json<RewriteReport>, ApiError> {
    let report = service
        .resync_linked_participants(&trip_id, req.requested_by_id)
        .await?;
    Ok(Json(report))
}

async fn get_trip_audits(
    State(service): State<SharedTripService>,
    Path(trip_id): Path<String>,
) -> Result<Json<Vec<TripAudit>>, ApiError> {
    let audits = service.get_trip_audits(&trip_id).await?;
    Ok(Json(audits))
}

async fn get_app_logs(
    State(service): State<SharedTripService>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<AppLog>>, ApiError> {
    let logs = service.get_app_logs(&query).await?;
    Ok(Json(logs))
}
