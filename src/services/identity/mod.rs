pub mod firebase;

use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct SignIn {
    pub uid: String,
    pub email: String,
    pub id_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone)]
pub struct TokenClaims {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("account not found")]
    NotFound,

    #[error("email already registered")]
    EmailExists,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("identity provider request failed: {0}")]
    Upstream(String),
}

/// External account backend. Passwords and tokens never touch the local
/// store; everything credential-shaped lives behind this seam.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and return its uid.
    async fn create_account(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<String, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn, IdentityError>;

    async fn email_registered(&self, email: &str) -> Result<bool, IdentityError>;

    async fn verify_token(&self, id_token: &str) -> Result<TokenClaims, IdentityError>;

    async fn set_display_name(&self, uid: &str, display_name: &str) -> Result<(), IdentityError>;

    async fn delete_account(&self, uid: &str) -> Result<(), IdentityError>;
}
