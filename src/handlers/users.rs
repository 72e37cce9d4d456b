use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::services::directory;
use crate::services::directory::ProfileUpdate;
use crate::state::AppState;

// GET /api/users/:id
pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let profile = directory::get_profile(state.store.as_ref(), &id).await?;
    Ok(Json(json!({
        "success": true,
        "user": {
            "fullName": profile.full_name,
            "mobileNumber": profile.mobile_number,
            "username": profile.username,
            "email": profile.email,
            "role": profile.role.as_str(),
        },
    })))
}

// PUT /api/users/:id
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<ProfileUpdate>,
) -> Result<Json<Value>, AppError> {
    directory::update_profile(state.store.as_ref(), state.identity.as_ref(), &id, body).await?;
    Ok(Json(json!({ "success": true, "message": "Profile updated successfully" })))
}

// DELETE /api/users/:id
pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    directory::delete_profile(state.store.as_ref(), state.identity.as_ref(), &id).await?;
    Ok(Json(json!({ "success": true, "message": "Account deleted successfully" })))
}
