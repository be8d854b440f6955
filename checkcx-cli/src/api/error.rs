//! API error responses

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use checkcx_shared::{ErrorBody, GroupFieldErrors};
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    /// Form validation failure with per-field messages
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: GroupFieldErrors,
    },

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// Unexpected storage failure; the message is what the client sees
    #[error("{context}: {source}")]
    Database {
        context: String,
        source: sqlx::Error,
    },
}

impl ApiError {
    pub fn database(context: impl Into<String>, source: sqlx::Error) -> Self {
        Self::Database {
            context: context.into(),
            source,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Database { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Whether a database error is a UNIQUE constraint violation
pub fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db| db.is_unique_violation())
        .unwrap_or(false)
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation { message, field_errors } => ErrorBody {
                error: message,
                field_errors: Some(field_errors),
            },
            ApiError::Database { context, source } => {
                error!("{}: {}", context, source);
                ErrorBody {
                    error: context,
                    field_errors: None,
                }
            }
            other => ErrorBody {
                error: other.to_string(),
                field_errors: None,
            },
        };

        (status, Json(body)).into_response()
    }
}
