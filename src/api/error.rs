use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::{AuthError, NoteError, ProjectError};

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),

    DatabaseError(String),

    ValidationError(String),

    /// Validation failure tied to a specific form field.
    FieldError { field: String, message: String },

    Conflict(String),

    Forbidden(String),

    InternalError(String),

    Unauthorized(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::NotFound(msg) => write!(f, "Not found: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::FieldError { field, message } => write!(f, "{}: {}", field, message),
            ApiError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ApiError::Forbidden(msg) => write!(f, "Forbidden: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, field, error_message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, None, msg),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    "A database error occurred".to_string(),
                )
            }
            ApiError::ValidationError(msg) => (StatusCode::BAD_REQUEST, None, msg),
            ApiError::FieldError { field, message } => {
                (StatusCode::BAD_REQUEST, Some(field), message)
            }
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, None, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, None, msg),
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    None,
                    "An internal error occurred".to_string(),
                )
            }
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, None, msg),
        };

        let mut body = ApiResponse::<()>::error(error_message);
        body.field = field;
        (status, Json(body)).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl From<ProjectError> for ApiError {
    fn from(err: ProjectError) -> Self {
        match err {
            ProjectError::DuplicateName | ProjectError::DuplicateMembership => {
                ApiError::Conflict(err.to_string())
            }
            ProjectError::NotFound(what) => ApiError::NotFound(what),
            ProjectError::Validation(msg) => ApiError::ValidationError(msg),
            ProjectError::PermissionDenied(msg) => ApiError::Forbidden(msg),
            ProjectError::Database(msg) => ApiError::DatabaseError(msg),
            ProjectError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<NoteError> for ApiError {
    fn from(err: NoteError) -> Self {
        match err {
            NoteError::NotFound(what) => ApiError::NotFound(what),
            NoteError::Validation(msg) => ApiError::ValidationError(msg),
            NoteError::PermissionDenied(msg) => ApiError::Forbidden(msg),
            NoteError::Database(msg) => ApiError::DatabaseError(msg),
            NoteError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials => ApiError::Unauthorized(err.to_string()),
            AuthError::UserNotFound => ApiError::NotFound("User".to_string()),
            AuthError::Validation { field, message } => ApiError::FieldError {
                field: field.to_string(),
                message,
            },
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::ValidationError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::InternalError(msg.into())
    }
}
