use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::BookingStatus;
use crate::services::bookings;
use crate::services::bookings::{BookingFilter, SuggestAlternate};
use crate::state::AppState;

// GET /api/admin/stats
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Result<Json<Value>, AppError> {
    let store = state.store.as_ref();
    let total_users = store.query("users", &[], None).await?.len();
    let total_bookings = store.query("bookings", &[], None).await?.len();
    let total_pending = store
        .query("bookings", &[("status", json!("pending"))], None)
        .await?
        .len();

    Ok(Json(json!({
        "success": true,
        "stats": {
            "totalUsers": total_users,
            "totalBookings": total_bookings,
            "totalPendingBookings": total_pending,
        },
    })))
}

// GET /api/admin/bookings?status=
#[derive(Deserialize)]
pub struct AdminBookingsQuery {
    pub status: Option<String>,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<AdminBookingsQuery>,
) -> Result<Json<Value>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            BookingStatus::parse(s)
                .ok_or_else(|| AppError::validation(format!("Unknown booking status: {s}")))
        })
        .transpose()?;

    let filter = BookingFilter::from_params(None, status);
    let bookings = bookings::list(state.store.as_ref(), &filter).await?;
    Ok(Json(json!({
        "success": true,
        "count": bookings.len(),
        "bookings": bookings,
    })))
}

// POST /api/admin/bookings/:id/status
#[derive(Deserialize)]
pub struct StatusUpdateRequest {
    #[serde(default)]
    pub status: String,
}

/// Staff set pending/approved/rejected/completed here; `cancelled` and
/// `suggestion_pending` move only through the suggestion endpoints.
const STAFF_TARGETS: [BookingStatus; 4] = [
    BookingStatus::Pending,
    BookingStatus::Approved,
    BookingStatus::Rejected,
    BookingStatus::Completed,
];

pub async fn update_status(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<StatusUpdateRequest>,
) -> Result<Json<Value>, AppError> {
    let target = BookingStatus::parse(&body.status)
        .filter(|s| STAFF_TARGETS.contains(s))
        .ok_or_else(|| {
            AppError::validation(
                "Invalid status. Must be one of: pending, approved, rejected, completed",
            )
        })?;

    bookings::transition(state.store.as_ref(), &id, target).await?;
    Ok(Json(json!({
        "success": true,
        "message": format!("Booking {} successfully", target.as_str()),
    })))
}

// POST /api/admin/bookings/:id/suggest
pub async fn suggest_datetime(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<SuggestAlternate>,
) -> Result<Json<Value>, AppError> {
    bookings::propose_alternate(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &state.config.mail_from,
        &id,
        body,
    )
    .await?;
    Ok(Json(json!({
        "success": true,
        "message": "Date/Time suggestion sent to customer successfully",
    })))
}
