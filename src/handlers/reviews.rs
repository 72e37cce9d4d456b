use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::models::ReviewStatus;
use crate::services::reviews;
use crate::services::reviews::{ModerateReview, NewReview, ReviewFilter};
use crate::state::AppState;

// POST /api/reviews
pub async fn create_review(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NewReview>,
) -> Result<(StatusCode, Json<Value>), AppError> {
    let review_id = reviews::create(state.store.as_ref(), body).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "reviewId": review_id,
            "message": "Review submitted successfully",
        })),
    ))
}

// GET /api/reviews?userId=&status=&isPublished=
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListReviewsQuery {
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub is_published: Option<String>,
}

pub async fn list_reviews(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListReviewsQuery>,
) -> Result<Json<Value>, AppError> {
    let status = query
        .status
        .as_deref()
        .map(|s| {
            ReviewStatus::parse(s)
                .ok_or_else(|| AppError::validation(format!("Unknown review status: {s}")))
        })
        .transpose()?;
    let published = match query.is_published.as_deref() {
        None => None,
        Some("true") => Some(true),
        Some("false") => Some(false),
        Some(other) => {
            return Err(AppError::validation(format!(
                "isPublished must be true or false, got {other}"
            )))
        }
    };

    let filter = ReviewFilter::from_params(query.user_id, status, published);
    let reviews = reviews::list(state.store.as_ref(), &filter).await?;
    Ok(Json(json!({
        "success": true,
        "count": reviews.len(),
        "reviews": reviews,
    })))
}

// PUT /api/reviews/:id
pub async fn moderate_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ModerateReview>,
) -> Result<Json<Value>, AppError> {
    reviews::moderate(state.store.as_ref(), &id, body).await?;
    Ok(Json(json!({ "success": true, "message": "Review updated successfully" })))
}

// DELETE /api/reviews/:id
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    reviews::delete(state.store.as_ref(), &id).await?;
    Ok(Json(json!({ "success": true, "message": "Review deleted successfully" })))
}
