use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::BookingStatus;
use crate::services::bookings;
use crate::services::bookings::{BookingFilter, BookingPatch, NewBooking};
use crate::state::AppState;

fn parse_status(s: &str) -> Result<BookingStatus, AppError> {
    BookingStatus::parse(s)
        .ok_or_else(|| AppError::validation(format!("Unknown booking status: {s}")))
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewBooking>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let outcome =
        bookings::create(state.store.as_ref(), state.config.conflict_policy, body).await?;

    let mut response = json!({
        "success": true,
        "bookingId": outcome.booking_id,
        "message": "Booking created successfully",
    });
    if outcome.slot_conflict {
        response["slotConflict"] = json!(true);
    }
    Ok((StatusCode::CREATED, Json(response)))
}

// GET /api/bookings?userId=&status=
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListBookingsQuery {
    pub user_id: Option<String>,
    pub status: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListBookingsQuery>,
) -> Result<Json<Value>, AppError> {
    let user_id = query
        .user_id
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::validation("userId is required"))?;
    let status = query
        .status
        .as_deref()
        .map(parse_status)
        .transpose()?;

    let filter = BookingFilter::from_params(Some(user_id), status);
    let bookings = bookings::list(state.store.as_ref(), &filter).await?;
    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "bookings": bookings,
    })))
}

// PUT /api/bookings/:id
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookingRequest {
    pub user_id: Option<String>,
    #[serde(flatten)]
    pub patch: BookingPatch,
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateBookingRequest>,
) -> Result<Json<Value>, AppError> {
    bookings::update(
        state.store.as_ref(),
        &id,
        body.user_id.as_deref(),
        body.patch,
    )
    .await?;
    Ok(Json(json!({ "success": true, "message": "Booking updated successfully" })))
}

// DELETE /api/bookings/:id?userId=
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerQuery {
    pub user_id: Option<String>,
}

pub async fn delete_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<OwnerQuery>,
) -> Result<Json<Value>, AppError> {
    bookings::delete(state.store.as_ref(), &id, query.user_id.as_deref()).await?;
    Ok(Json(json!({ "success": true, "message": "Booking deleted successfully" })))
}

// POST /api/bookings/:id/accept-suggestion
pub async fn accept_suggestion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    bookings::accept_suggestion(state.store.as_ref(), &id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Suggestion accepted and booking updated successfully",
    })))
}

// POST /api/bookings/:id/reject-suggestion
pub async fn reject_suggestion(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    bookings::reject_suggestion(state.store.as_ref(), &id).await?;
    Ok(Json(json!({ "success": true, "message": "Booking cancelled successfully" })))
}
