use serde::Deserialize;
use serde_json::json;

use crate::errors::AppError;
use crate::models::UserProfile;
use crate::services::identity::{IdentityError, IdentityProvider};
use crate::services::{decode, identity_gateway, object};
use crate::store::DocumentStore;

const COLLECTION: &str = "users";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub mobile_number: String,
    #[serde(default)]
    pub username: String,
}

pub async fn email_by_username(
    store: &dyn DocumentStore,
    username: &str,
) -> Result<String, AppError> {
    if username.is_empty() {
        return Err(AppError::validation("Username is required"));
    }
    let matches = store
        .query(COLLECTION, &[("username", json!(username))], None)
        .await?;
    matches
        .first()
        .and_then(|doc| doc.data.get("email"))
        .and_then(|v| v.as_str())
        .map(str::to_string)
        .ok_or_else(|| AppError::NotFound("Username not found".to_string()))
}

pub async fn username_available(
    store: &dyn DocumentStore,
    username: &str,
) -> Result<bool, AppError> {
    if username.is_empty() {
        return Err(AppError::validation("Username is required"));
    }
    let matches = store
        .query(COLLECTION, &[("username", json!(username))], None)
        .await?;
    Ok(matches.is_empty())
}

/// Asks the identity provider, not the profile collection; an account can
/// exist before its profile document does.
pub async fn email_registered(
    identity: &dyn IdentityProvider,
    email: &str,
) -> Result<bool, AppError> {
    if email.is_empty() {
        return Err(AppError::validation("Email is required"));
    }
    identity.email_registered(email).await.map_err(identity_gateway)
}

pub async fn get_profile(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<UserProfile, AppError> {
    let stored = store
        .get(COLLECTION, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    decode(stored, "user")
}

pub async fn update_profile(
    store: &dyn DocumentStore,
    identity: &dyn IdentityProvider,
    user_id: &str,
    req: ProfileUpdate,
) -> Result<(), AppError> {
    if req.full_name.is_empty() || req.mobile_number.is_empty() || req.username.is_empty() {
        return Err(AppError::validation(
            "Full name, mobile number, and username are required",
        ));
    }
    if req.mobile_number.len() != 10 || !req.mobile_number.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::validation("Mobile number must be 10 digits"));
    }

    store
        .get(COLLECTION, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let holders = store
        .query(COLLECTION, &[("username", json!(req.username))], None)
        .await?;
    if holders.iter().any(|doc| doc.id != user_id) {
        return Err(AppError::validation("Username is already taken"));
    }

    store
        .update(
            COLLECTION,
            user_id,
            object(json!({
                "fullName": req.full_name,
                "mobileNumber": req.mobile_number,
                "username": req.username,
            })),
        )
        .await?;

    identity
        .set_display_name(user_id, &req.username)
        .await
        .map_err(identity_gateway)?;

    tracing::info!(user_id = %user_id, "profile updated");
    Ok(())
}

pub async fn delete_profile(
    store: &dyn DocumentStore,
    identity: &dyn IdentityProvider,
    user_id: &str,
) -> Result<(), AppError> {
    store
        .get(COLLECTION, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    // Account first, then document. An already-missing account is fine.
    match identity.delete_account(user_id).await {
        Ok(()) | Err(IdentityError::NotFound) => {}
        Err(e) => return Err(identity_gateway(e)),
    }
    store.delete(COLLECTION, user_id).await?;

    tracing::info!(user_id = %user_id, "profile deleted");
    Ok(())
}
