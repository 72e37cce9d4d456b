use chrono::{Duration, Utc};
use rand::Rng;
use serde_json::json;

use crate::errors::AppError;
use crate::models::OtpChallenge;
use crate::services::identity::IdentityProvider;
use crate::services::mail::Mailer;
use crate::services::{decode, directory, object};
use crate::store::DocumentStore;

const COLLECTION: &str = "otps";
const TTL_MINUTES: i64 = 5;

fn generate_code() -> String {
    rand::rng().random_range(100_000..=999_999).to_string()
}

fn code_email_html(code: &str) -> String {
    format!(
        "<p>Your verification code is:</p>\
         <h2 style=\"letter-spacing: 4px;\">{code}</h2>\
         <p>The code expires in {TTL_MINUTES} minutes. If you did not request it, \
         you can ignore this email.</p>"
    )
}

/// Writes the challenge before mailing it; a delivery failure leaves a
/// harmless record that the next send overwrites.
async fn issue(
    store: &dyn DocumentStore,
    mailer: &dyn Mailer,
    mail_from: &str,
    email: &str,
) -> Result<(), AppError> {
    let code = generate_code();
    let expires_at = Utc::now() + Duration::minutes(TTL_MINUTES);

    store
        .set(
            COLLECTION,
            email,
            object(json!({ "otp": code, "expiresAt": expires_at })),
        )
        .await?;

    mailer
        .send(
            mail_from,
            email,
            "Your verification code",
            &code_email_html(&code),
        )
        .await
        .map_err(|e| AppError::gateway("failed to send verification email", e))?;

    tracing::info!(email = %email, "verification code sent");
    Ok(())
}

pub async fn send(
    store: &dyn DocumentStore,
    identity: &dyn IdentityProvider,
    mailer: &dyn Mailer,
    mail_from: &str,
    email: &str,
) -> Result<(), AppError> {
    if email.is_empty() {
        return Err(AppError::validation("Email is required"));
    }
    if directory::email_registered(identity, email).await? {
        return Err(AppError::validation("Email is already registered"));
    }
    issue(store, mailer, mail_from, email).await
}

pub async fn verify(store: &dyn DocumentStore, email: &str, otp: &str) -> Result<(), AppError> {
    if email.is_empty() || otp.is_empty() {
        return Err(AppError::validation("Email and OTP are required"));
    }

    let stored = store
        .get(COLLECTION, email)
        .await?
        .ok_or_else(|| AppError::validation("No verification code found for this email"))?;
    let challenge: OtpChallenge = decode(stored, "otp")?;

    // An expired record stays so a resend can still find it.
    if challenge.is_expired(Utc::now()) {
        return Err(AppError::validation(
            "Verification code has expired. Please request a new one",
        ));
    }
    if challenge.otp != otp {
        return Err(AppError::validation("Invalid verification code"));
    }

    store.delete(COLLECTION, email).await?;
    tracing::info!(email = %email, "email verified");
    Ok(())
}

pub async fn resend(
    store: &dyn DocumentStore,
    mailer: &dyn Mailer,
    mail_from: &str,
    email: &str,
) -> Result<(), AppError> {
    if email.is_empty() {
        return Err(AppError::validation("Email is required"));
    }
    if store.get(COLLECTION, email).await?.is_none() {
        return Err(AppError::NotFound(
            "No pending verification for this email".to_string(),
        ));
    }
    issue(store, mailer, mail_from, email).await
}
