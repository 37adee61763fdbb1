//! API error type with uniform `{success:false, message, errors?}` bodies.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::accounts::AccountError;
use crate::core_state::CoreError;
use crate::crypto::CryptoError;
use crate::db::DatabaseError;
use crate::federated::FederatedError;
use crate::validation::{FieldErrors, ValidationError};

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

/// API-level errors with HTTP status mapping.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Validation failed")]
    Validation(FieldErrors),
    #[error("Invalid request: {0}")]
    BadRequest(String),
    #[error("Authentication required")]
    Unauthorized,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Forbidden")]
    Forbidden,
    #[error("{0} not found")]
    NotFound(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found(entity: &str) -> Self {
        ApiError::NotFound(entity.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized | ApiError::TokenExpired | ApiError::InvalidCredentials => {
                StatusCode::UNAUTHORIZED
            }
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (message, errors) = match self {
            ApiError::Validation(errors) => ("Validation failed".to_string(), Some(errors)),
            ApiError::BadRequest(detail) => (detail, None),
            ApiError::Unauthorized => ("Unauthenticated".to_string(), None),
            ApiError::TokenExpired => ("Token expired, log in again".to_string(), None),
            ApiError::InvalidCredentials => ("Invalid credentials".to_string(), None),
            ApiError::Forbidden => ("This action is unauthorized".to_string(), None),
            ApiError::NotFound(entity) => (format!("{entity} not found"), None),
            ApiError::Internal(detail) => {
                tracing::error!(%detail, "API internal error");
                ("An internal error occurred".to_string(), None)
            }
        };

        let body = ErrorBody {
            success: false,
            message,
            errors,
        };
        (status, Json(body)).into_response()
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Database(e) => e.into(),
        }
    }
}

impl From<rusqlite::Error> for ApiError {
    fn from(err: rusqlite::Error) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<DatabaseError> for ApiError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { entity_type, .. } => ApiError::NotFound(entity_type),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CryptoError> for ApiError {
    fn from(err: CryptoError) -> Self {
        ApiError::Internal(err.to_string())
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        ApiError::Validation(errors)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::Invalid(errors) => ApiError::Validation(errors),
            ValidationError::Database(e) => e.into(),
        }
    }
}

impl From<AccountError> for ApiError {
    fn from(err: AccountError) -> Self {
        match err {
            AccountError::Invalid(errors) => ApiError::Validation(errors),
            AccountError::InvalidCredentials => ApiError::InvalidCredentials,
            AccountError::NotFound(entity) => ApiError::not_found(entity),
            AccountError::Conflict(detail) => {
                tracing::warn!(%detail, "Write rejected by constraint");
                ApiError::BadRequest("The request conflicts with existing data".into())
            }
            other @ (AccountError::TokenIssuance { .. }
            | AccountError::Database(_)
            | AccountError::Crypto(_)) => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<FederatedError> for ApiError {
    fn from(err: FederatedError) -> Self {
        match err {
            FederatedError::Rejected(detail) => {
                tracing::warn!(%detail, "Identity provider rejected sign-in");
                ApiError::InvalidCredentials
            }
            FederatedError::UnverifiedEmail => ApiError::InvalidCredentials,
            FederatedError::EmailInUse => ApiError::BadRequest(
                "An account with this email already exists, log in with its password".into(),
            ),
            FederatedError::StateMismatch => {
                ApiError::BadRequest("Sign-in request expired or was not started here".into())
            }
            FederatedError::Database(e) => e.into(),
            other => ApiError::Internal(other.to_string()),
        }
    }
}
