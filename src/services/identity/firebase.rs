use async_trait::async_trait;
use serde_json::json;

use super::{IdentityError, IdentityProvider, SignIn, TokenClaims};

/// Google Identity Toolkit REST client. One `accounts:*` call per method;
/// the failure kind arrives in the error message field.
pub struct FirebaseAuthClient {
    api_key: String,
    client: reqwest::Client,
}

impl FirebaseAuthClient {
    pub fn new(api_key: String) -> Self {
        Self {
            api_key,
            client: reqwest::Client::new(),
        }
    }

    async fn call(
        &self,
        method: &str,
        body: serde_json::Value,
    ) -> Result<serde_json::Value, IdentityError> {
        let url = format!(
            "https://identitytoolkit.googleapis.com/v1/accounts:{}?key={}",
            method, self.api_key
        );

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        let status = res.status();
        let payload: serde_json::Value = res
            .json()
            .await
            .map_err(|e| IdentityError::Upstream(e.to_string()))?;

        if status.is_success() {
            return Ok(payload);
        }

        let message = payload
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .unwrap_or("unknown identity error");
        Err(classify(message))
    }
}

fn classify(message: &str) -> IdentityError {
    // Messages look like "EMAIL_EXISTS" or "WEAK_PASSWORD : Password ...".
    let head = message.split([' ', ':']).next().unwrap_or(message);
    match head {
        "EMAIL_EXISTS" => IdentityError::EmailExists,
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => IdentityError::NotFound,
        "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_ID_TOKEN"
        | "TOKEN_EXPIRED" | "USER_DISABLED" => IdentityError::InvalidCredentials,
        _ => IdentityError::Upstream(message.to_string()),
    }
}

fn str_field(value: &serde_json::Value, key: &str) -> String {
    value
        .get(key)
        .and_then(|v| v.as_str())
        .unwrap_or_default()
        .to_string()
}

#[async_trait]
impl IdentityProvider for FirebaseAuthClient {
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<String, IdentityError> {
        let payload = self
            .call(
                "signUp",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;

        let uid = str_field(&payload, "localId");
        if uid.is_empty() {
            return Err(IdentityError::Upstream(
                "signUp response missing localId".to_string(),
            ));
        }

        // The display name rides on the fresh session token.
        if let Some(id_token) = payload.get("idToken").and_then(|v| v.as_str()) {
            self.call(
                "update",
                json!({ "idToken": id_token, "displayName": display_name }),
            )
            .await?;
        }

        Ok(uid)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn, IdentityError> {
        let payload = self
            .call(
                "signInWithPassword",
                json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;

        Ok(SignIn {
            uid: str_field(&payload, "localId"),
            email: str_field(&payload, "email"),
            id_token: str_field(&payload, "idToken"),
            refresh_token: str_field(&payload, "refreshToken"),
        })
    }

    async fn email_registered(&self, email: &str) -> Result<bool, IdentityError> {
        let payload = self
            .call(
                "createAuthUri",
                json!({ "identifier": email, "continueUri": "http://localhost" }),
            )
            .await?;
        Ok(payload
            .get("registered")
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn verify_token(&self, id_token: &str) -> Result<TokenClaims, IdentityError> {
        let payload = self.call("lookup", json!({ "idToken": id_token })).await?;
        let user = payload
            .pointer("/users/0")
            .ok_or(IdentityError::InvalidCredentials)?;
        Ok(TokenClaims {
            uid: str_field(user, "localId"),
            email: str_field(user, "email"),
        })
    }

    async fn set_display_name(&self, uid: &str, display_name: &str) -> Result<(), IdentityError> {
        self.call("update", json!({ "localId": uid, "displayName": display_name }))
            .await?;
        Ok(())
    }

    async fn delete_account(&self, uid: &str) -> Result<(), IdentityError> {
        self.call("delete", json!({ "localId": uid })).await?;
        Ok(())
    }
}
