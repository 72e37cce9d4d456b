use serde::Deserialize;
use serde_json::json;

use crate::errors::AppError;
use crate::models::Role;
use crate::services::identity::{IdentityError, IdentityProvider};
use crate::services::{directory, identity_gateway, object};
use crate::store::DocumentStore;

const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

#[derive(Debug, Deserialize)]
pub struct Registration {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// Username or email address.
    #[serde(default)]
    pub identifier: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug)]
pub struct LoginOutcome {
    pub uid: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub id_token: String,
    pub refresh_token: String,
}

#[derive(Debug)]
pub struct RoleInfo {
    pub uid: String,
    pub email: String,
    pub role: Role,
}

pub fn validate_password(password: &str) -> Result<(), AppError> {
    if password.len() < 8 {
        return Err(AppError::validation(
            "Password must be at least 8 characters long",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_lowercase()) {
        return Err(AppError::validation(
            "Password must contain at least one lowercase letter",
        ));
    }
    if !password.chars().any(|c| c.is_ascii_uppercase()) {
        return Err(AppError::validation(
            "Password must contain at least one uppercase letter",
        ));
    }
    if !password.chars().any(|c| SPECIAL_CHARS.contains(c)) {
        return Err(AppError::validation(
            "Password must contain at least one special character",
        ));
    }
    Ok(())
}

/// Registration runs after the email has passed OTP verification, so the
/// profile is written with `emailVerified` already true.
pub async fn register(
    store: &dyn DocumentStore,
    identity: &dyn IdentityProvider,
    req: Registration,
) -> Result<String, AppError> {
    if req.username.is_empty() || req.email.is_empty() || req.password.is_empty() {
        return Err(AppError::validation(
            "Username, email, and password are required",
        ));
    }
    validate_password(&req.password)?;

    if !directory::username_available(store, &req.username).await? {
        return Err(AppError::validation("Username is already taken"));
    }

    let uid = identity
        .create_account(&req.email, &req.password, &req.username)
        .await
        .map_err(|e| match e {
            IdentityError::EmailExists => AppError::validation("Email is already registered"),
            other => identity_gateway(other),
        })?;

    store
        .set(
            "users",
            &uid,
            object(json!({
                "username": req.username,
                "email": req.email,
                "fullName": "",
                "mobileNumber": "",
                "role": Role::Customer,
                "emailVerified": true,
            })),
        )
        .await?;

    tracing::info!(uid = %uid, username = %req.username, "user registered");
    Ok(uid)
}

pub async fn login(
    store: &dyn DocumentStore,
    identity: &dyn IdentityProvider,
    req: LoginRequest,
) -> Result<LoginOutcome, AppError> {
    if req.identifier.is_empty() || req.password.is_empty() {
        return Err(AppError::validation(
            "Identifier (email or username) and password are required",
        ));
    }

    // An unknown username answers exactly like a wrong password.
    let email = if req.identifier.contains('@') {
        req.identifier.clone()
    } else {
        match directory::email_by_username(store, &req.identifier).await {
            Ok(email) => email,
            Err(AppError::NotFound(_)) => {
                return Err(AppError::Unauthorized(
                    "Invalid username or password".to_string(),
                ))
            }
            Err(e) => return Err(e),
        }
    };

    let session = identity.sign_in(&email, &req.password).await.map_err(|e| match e {
        IdentityError::InvalidCredentials | IdentityError::NotFound => {
            AppError::Unauthorized("Invalid username or password".to_string())
        }
        other => identity_gateway(other),
    })?;

    let (username, role) = match store.get("users", &session.uid).await? {
        Some(doc) => (
            doc.data
                .get("username")
                .and_then(|v| v.as_str())
                .unwrap_or(&req.identifier)
                .to_string(),
            doc.data
                .get("role")
                .and_then(|v| v.as_str())
                .and_then(Role::parse)
                .unwrap_or_default(),
        ),
        None => (req.identifier.clone(), Role::Customer),
    };

    tracing::info!(uid = %session.uid, username = %username, "user logged in");
    Ok(LoginOutcome {
        uid: session.uid,
        email: session.email,
        username,
        role,
        id_token: session.id_token,
        refresh_token: session.refresh_token,
    })
}

pub async fn verify_role(
    store: &dyn DocumentStore,
    identity: &dyn IdentityProvider,
    token: &str,
) -> Result<RoleInfo, AppError> {
    if token.is_empty() {
        return Err(AppError::Unauthorized(
            "Missing authorization token".to_string(),
        ));
    }

    let claims = identity.verify_token(token).await.map_err(|e| match e {
        IdentityError::InvalidCredentials | IdentityError::NotFound => {
            AppError::Unauthorized("Invalid or expired token".to_string())
        }
        other => identity_gateway(other),
    })?;

    let profile = directory::get_profile(store, &claims.uid).await?;
    Ok(RoleInfo {
        uid: claims.uid,
        email: claims.email,
        role: profile.role,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::identity::{SignIn, TokenClaims};
    use crate::store::MemoryStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Identity fake with a fixed account table.
    struct FakeIdentity {
        accounts: Mutex<HashMap<String, (String, String)>>,
        next_uid: Mutex<u32>,
    }

    impl FakeIdentity {
        fn new() -> Self {
            Self {
                accounts: Mutex::new(HashMap::new()),
                next_uid: Mutex::new(0),
            }
        }

        fn with_account(self, email: &str, password: &str, uid: &str) -> Self {
            self.accounts
                .lock()
                .unwrap()
                .insert(email.to_string(), (password.to_string(), uid.to_string()));
            self
        }
    }

    #[async_trait]
    impl IdentityProvider for FakeIdentity {
        async fn create_account(
            &self,
            email: &str,
            password: &str,
            _display_name: &str,
        ) -> Result<String, IdentityError> {
            let mut accounts = self.accounts.lock().unwrap();
            if accounts.contains_key(email) {
                return Err(IdentityError::EmailExists);
            }
            let mut next = self.next_uid.lock().unwrap();
            *next += 1;
            let uid = format!("uid-{next}");
            accounts.insert(email.to_string(), (password.to_string(), uid.clone()));
            Ok(uid)
        }

        async fn sign_in(&self, email: &str, password: &str) -> Result<SignIn, IdentityError> {
            let accounts = self.accounts.lock().unwrap();
            match accounts.get(email) {
                Some((stored, uid)) if stored == password => Ok(SignIn {
                    uid: uid.clone(),
                    email: email.to_string(),
                    id_token: format!("token-{uid}"),
                    refresh_token: format!("refresh-{uid}"),
                }),
                Some(_) => Err(IdentityError::InvalidCredentials),
                None => Err(IdentityError::NotFound),
            }
        }

        async fn email_registered(&self, email: &str) -> Result<bool, IdentityError> {
            Ok(self.accounts.lock().unwrap().contains_key(email))
        }

        async fn verify_token(&self, id_token: &str) -> Result<TokenClaims, IdentityError> {
            let accounts = self.accounts.lock().unwrap();
            for (email, (_, uid)) in accounts.iter() {
                if format!("token-{uid}") == id_token {
                    return Ok(TokenClaims {
                        uid: uid.clone(),
                        email: email.clone(),
                    });
                }
            }
            Err(IdentityError::InvalidCredentials)
        }

        async fn set_display_name(&self, _: &str, _: &str) -> Result<(), IdentityError> {
            Ok(())
        }

        async fn delete_account(&self, _: &str) -> Result<(), IdentityError> {
            Ok(())
        }
    }

    #[test]
    fn test_password_policy() {
        assert!(validate_password("Str0ng!pass").is_ok());
        assert!(validate_password("short1!").is_err());
        assert!(validate_password("all-lower-1!").is_err());
        assert!(validate_password("ALL-UPPER-1!").is_err());
        assert!(validate_password("NoSpecial123").is_err());
        // Underscore counts as a special character.
        assert!(validate_password("Snake_Case_123").is_ok());
    }

    #[tokio::test]
    async fn test_register_creates_account_and_profile() {
        let store = MemoryStore::new();
        let identity = FakeIdentity::new();

        let uid = register(
            &store,
            &identity,
            Registration {
                username: "priya".to_string(),
                email: "priya@example.com".to_string(),
                password: "Str0ng!pass".to_string(),
            },
        )
        .await
        .unwrap();

        let doc = store.get("users", &uid).await.unwrap().unwrap();
        assert_eq!(doc.data["username"], json!("priya"));
        assert_eq!(doc.data["role"], json!("customer"));
        assert_eq!(doc.data["emailVerified"], json!(true));
    }

    #[tokio::test]
    async fn test_register_rejects_taken_username_and_email() {
        let store = MemoryStore::new();
        let identity = FakeIdentity::new();

        register(
            &store,
            &identity,
            Registration {
                username: "priya".to_string(),
                email: "priya@example.com".to_string(),
                password: "Str0ng!pass".to_string(),
            },
        )
        .await
        .unwrap();

        let err = register(
            &store,
            &identity,
            Registration {
                username: "priya".to_string(),
                email: "other@example.com".to_string(),
                password: "Str0ng!pass".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let err = register(
            &store,
            &identity,
            Registration {
                username: "priya2".to_string(),
                email: "priya@example.com".to_string(),
                password: "Str0ng!pass".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    async fn seeded(store: &MemoryStore, identity: &FakeIdentity) -> String {
        register(
            store,
            identity,
            Registration {
                username: "priya".to_string(),
                email: "priya@example.com".to_string(),
                password: "Str0ng!pass".to_string(),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_login_by_username_and_email() {
        let store = MemoryStore::new();
        let identity = FakeIdentity::new();
        let uid = seeded(&store, &identity).await;

        let by_username = login(
            &store,
            &identity,
            LoginRequest {
                identifier: "priya".to_string(),
                password: "Str0ng!pass".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(by_username.uid, uid);
        assert_eq!(by_username.role, Role::Customer);
        assert!(!by_username.id_token.is_empty());

        let by_email = login(
            &store,
            &identity,
            LoginRequest {
                identifier: "priya@example.com".to_string(),
                password: "Str0ng!pass".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(by_email.uid, uid);
        assert_eq!(by_email.username, "priya");
    }

    #[tokio::test]
    async fn test_login_failures_are_indistinct() {
        let store = MemoryStore::new();
        let identity = FakeIdentity::new();
        seeded(&store, &identity).await;

        let wrong_password = login(
            &store,
            &identity,
            LoginRequest {
                identifier: "priya".to_string(),
                password: "Wrong!pass1".to_string(),
            },
        )
        .await
        .unwrap_err();
        let unknown_username = login(
            &store,
            &identity,
            LoginRequest {
                identifier: "nobody".to_string(),
                password: "Str0ng!pass".to_string(),
            },
        )
        .await
        .unwrap_err();

        match (&wrong_password, &unknown_username) {
            (AppError::Unauthorized(a), AppError::Unauthorized(b)) => assert_eq!(a, b),
            other => panic!("expected matching unauthorized errors, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_verify_role() {
        let store = MemoryStore::new();
        let identity = FakeIdentity::new();
        let uid = seeded(&store, &identity).await;

        // Promote through the store, as an operator would.
        store
            .update("users", &uid, object(json!({"role": "admin"})))
            .await
            .unwrap();

        let info = verify_role(&store, &identity, &format!("token-{uid}"))
            .await
            .unwrap();
        assert_eq!(info.uid, uid);
        assert_eq!(info.role, Role::Admin);

        let err = verify_role(&store, &identity, "bogus").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
        let err = verify_role(&store, &identity, "").await.unwrap_err();
        assert!(matches!(err, AppError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn test_login_with_admin_identity_but_no_profile() {
        let store = MemoryStore::new();
        let identity = FakeIdentity::new().with_account("staff@example.com", "Adm1n!pass", "uid-staff");

        let outcome = login(
            &store,
            &identity,
            LoginRequest {
                identifier: "staff@example.com".to_string(),
                password: "Adm1n!pass".to_string(),
            },
        )
        .await
        .unwrap();
        // No profile document: falls back to customer.
        assert_eq!(outcome.role, Role::Customer);
    }
}
