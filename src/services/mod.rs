pub mod auth;
pub mod bookings;
pub mod directory;
pub mod identity;
pub mod mail;
pub mod otp;
pub mod reviews;

use serde_json::Value;

use crate::errors::AppError;
use crate::services::identity::IdentityError;
use crate::store::{Document, StoreError, StoredDocument};

/// Body builder for `serde_json::json!` literals, which are always objects
/// at the call sites here.
pub(crate) fn object(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

pub(crate) fn decode<T: serde::de::DeserializeOwned>(
    doc: StoredDocument,
    what: &str,
) -> Result<T, AppError> {
    serde_json::from_value(doc.into_value()).map_err(|e| {
        AppError::Store(StoreError::Backend(
            anyhow::Error::new(e).context(format!("malformed {what} document")),
        ))
    })
}

pub(crate) fn identity_gateway(err: IdentityError) -> AppError {
    AppError::gateway("identity provider error", err)
}
