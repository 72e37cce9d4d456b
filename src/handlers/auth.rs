use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::errors::AppError;
use crate::services::auth::{LoginRequest, Registration};
use crate::services::{auth, directory, otp};
use crate::state::AppState;

// POST /api/auth/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(body): Json<Registration>,
) -> Result<Json<Value>, AppError> {
    let uid = auth::register(state.store.as_ref(), state.identity.as_ref(), body).await?;
    Ok(Json(json!({
        "success": true,
        "uid": uid,
        "message": "User registered successfully",
    })))
}

// POST /api/auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<Value>, AppError> {
    let outcome = auth::login(state.store.as_ref(), state.identity.as_ref(), body).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Login successful",
        "user": {
            "uid": outcome.uid,
            "email": outcome.email,
            "username": outcome.username,
            "role": outcome.role.as_str(),
            "idToken": outcome.id_token,
            "refreshToken": outcome.refresh_token,
        },
    })))
}

// POST /api/auth/check-username
#[derive(Deserialize)]
pub struct UsernameRequest {
    #[serde(default)]
    pub username: String,
}

pub async fn check_username(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UsernameRequest>,
) -> Result<Json<Value>, AppError> {
    let available = directory::username_available(state.store.as_ref(), &body.username).await?;
    let message = if available {
        "Username is available"
    } else {
        "Username is already taken"
    };
    Ok(Json(json!({
        "success": true,
        "available": available,
        "message": message,
    })))
}

// POST /api/auth/check-email
#[derive(Deserialize)]
pub struct EmailRequest {
    #[serde(default)]
    pub email: String,
}

pub async fn check_email(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<Value>, AppError> {
    let registered = directory::email_registered(state.identity.as_ref(), &body.email).await?;
    let message = if registered {
        "Email is already registered"
    } else {
        "Email is available"
    };
    Ok(Json(json!({
        "success": true,
        "available": !registered,
        "message": message,
    })))
}

// POST /api/auth/email-by-username
pub async fn email_by_username(
    State(state): State<Arc<AppState>>,
    Json(body): Json<UsernameRequest>,
) -> Result<Json<Value>, AppError> {
    let email = directory::email_by_username(state.store.as_ref(), &body.username).await?;
    Ok(Json(json!({ "success": true, "email": email })))
}

// GET /api/auth/verify-role
pub async fn verify_role(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<Value>, AppError> {
    let auth_header = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let token = auth_header.strip_prefix("Bearer ").unwrap_or("");

    let info = auth::verify_role(state.store.as_ref(), state.identity.as_ref(), token).await?;
    Ok(Json(json!({
        "success": true,
        "role": info.role.as_str(),
        "uid": info.uid,
        "email": info.email,
    })))
}

// POST /api/auth/send-otp
pub async fn send_otp(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<Value>, AppError> {
    otp::send(
        state.store.as_ref(),
        state.identity.as_ref(),
        state.mailer.as_ref(),
        &state.config.mail_from,
        &body.email,
    )
    .await?;
    Ok(Json(json!({ "success": true, "message": "OTP sent successfully" })))
}

// POST /api/auth/verify-otp
#[derive(Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

pub async fn verify_otp(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VerifyOtpRequest>,
) -> Result<Json<Value>, AppError> {
    otp::verify(state.store.as_ref(), &body.email, &body.otp).await?;
    Ok(Json(json!({ "success": true, "message": "OTP verified successfully" })))
}

// POST /api/auth/resend-otp
pub async fn resend_otp(
    State(state): State<Arc<AppState>>,
    Json(body): Json<EmailRequest>,
) -> Result<Json<Value>, AppError> {
    otp::resend(
        state.store.as_ref(),
        state.mailer.as_ref(),
        &state.config.mail_from,
        &body.email,
    )
    .await?;
    Ok(Json(json!({ "success": true, "message": "OTP resent successfully" })))
}
