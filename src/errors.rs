use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// Identity or mail infrastructure failure. `context` is the headline,
    /// `details` the provider's message.
    #[error("{context}: {details}")]
    Gateway {
        context: &'static str,
        details: String,
    },
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn gateway(context: &'static str, err: impl std::fmt::Display) -> Self {
        AppError::Gateway {
            context,
            details: err.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(StoreError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Gateway { .. } => StatusCode::BAD_GATEWAY,
        };

        let body = match &self {
            AppError::Store(StoreError::Backend(e)) => {
                serde_json::json!({ "error": "storage error", "details": e.to_string() })
            }
            AppError::Gateway { context, details } => {
                serde_json::json!({ "error": context, "details": details })
            }
            other => serde_json::json!({ "error": other.to_string() }),
        };

        (status, axum::Json(body)).into_response()
    }
}
