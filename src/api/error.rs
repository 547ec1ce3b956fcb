use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::fmt;

use super::ApiResponse;
use crate::services::bookmark_service::BookmarkError;
use crate::services::session_service::SessionError;
use crate::services::user_service::UserError;

/// Stable error codes clients branch on.
pub mod codes {
    pub const INVALID_BODY: &str = "INVALID_BODY";
    pub const USER_ALREADY_LOGGED: &str = "USER_ALREADY_LOGGED";
    pub const EMAIL_NOT_VERIFIED: &str = "EMAIL_NOT_VERIFIED";
    pub const EMAIL_EXISTS: &str = "EMAIL_EXISTS";
    pub const USERNAME_EXISTS: &str = "USERNAME_EXISTS";
    pub const USER_ALREADY_VERIFIED: &str = "USER_ALREADY_VERIFIED";
    pub const INVALID_VERIFICATION_CODE: &str = "INVALID_VERIFICATION_CODE";
    pub const INVALID_PASSWORD: &str = "INVALID_PASSWORD";
    pub const EXPIRED_TOKEN: &str = "EXPIRED_TOKEN";
    pub const BELONGS_TO_ANOTHER_USER: &str = "BELONGS_TO_ANOTHER_USER";
    pub const MISSING_SESSION: &str = "MISSING_SESSION";
    pub const BOOKMARKS_LIMIT: &str = "BOOKMARKS_LIMIT";
}

#[derive(Debug)]
pub enum ApiError {
    NotFound {
        message: String,
        code: Option<&'static str>,
    },

    DatabaseError(String),

    ValidationError {
        message: String,
        code: Option<&'static str>,
    },

    Conflict {
        message: String,
        code: &'static str,
    },

    Forbidden {
        message: String,
        code: &'static str,
    },

    Unauthorized {
        message: String,
        code: Option<&'static str>,
    },

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { message, .. } => write!(f, "Not found: {message}"),
            Self::DatabaseError(msg) => write!(f, "Database error: {msg}"),
            Self::ValidationError { message, .. } => write!(f, "Validation error: {message}"),
            Self::Conflict { message, .. } => write!(f, "Conflict: {message}"),
            Self::Forbidden { message, .. } => write!(f, "Forbidden: {message}"),
            Self::Unauthorized { message, .. } => write!(f, "Unauthorized: {message}"),
            Self::InternalError(msg) => write!(f, "Internal error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, code) = match self {
            Self::NotFound { message, code } => (StatusCode::NOT_FOUND, message, code),
            Self::DatabaseError(msg) => {
                tracing::error!("Database error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                    None,
                )
            }
            Self::ValidationError { message, code } => (StatusCode::BAD_REQUEST, message, code),
            Self::Conflict { message, code } => (StatusCode::CONFLICT, message, Some(code)),
            Self::Forbidden { message, code } => (StatusCode::FORBIDDEN, message, Some(code)),
            Self::Unauthorized { message, code } => (StatusCode::UNAUTHORIZED, message, code),
            Self::InternalError(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let body = match code {
            Some(code) => ApiResponse::<()>::error_with_code(message, code),
            None => ApiResponse::<()>::error(message),
        };
        (status, Json(body)).into_response()
    }
}

impl ApiError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
            code: None,
        }
    }

    pub fn not_found_code(message: impl Into<String>, code: &'static str) -> Self {
        Self::NotFound {
            message: message.into(),
            code: Some(code),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            code: None,
        }
    }

    pub fn invalid_body(message: impl Into<String>) -> Self {
        Self::ValidationError {
            message: message.into(),
            code: Some(codes::INVALID_BODY),
        }
    }

    pub fn conflict(message: impl Into<String>, code: &'static str) -> Self {
        Self::Conflict {
            message: message.into(),
            code,
        }
    }

    pub fn forbidden(message: impl Into<String>, code: &'static str) -> Self {
        Self::Forbidden {
            message: message.into(),
            code,
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized {
            message: message.into(),
            code: None,
        }
    }

    pub fn unauthorized_code(message: impl Into<String>, code: &'static str) -> Self {
        Self::Unauthorized {
            message: message.into(),
            code: Some(code),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::InternalError(message.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::InternalError(err.to_string())
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::EmailTaken => Self::conflict("Email already in use", codes::EMAIL_EXISTS),
            UserError::UsernameTaken => {
                Self::conflict("Username already in use", codes::USERNAME_EXISTS)
            }
            UserError::NotFound => Self::not_found("User not found"),
            UserError::AlreadyVerified => {
                Self::conflict("Email is already verified", codes::USER_ALREADY_VERIFIED)
            }
            UserError::InvalidPassword => {
                Self::unauthorized_code("Invalid password", codes::INVALID_PASSWORD)
            }
            UserError::TokenExpired => Self::ValidationError {
                message: "Reset token has expired".to_string(),
                code: Some(codes::EXPIRED_TOKEN),
            },
            UserError::Database(msg) => Self::DatabaseError(msg),
            UserError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Invalid => Self::unauthorized("Invalid or expired session"),
            SessionError::Database(msg) => Self::DatabaseError(msg),
            SessionError::Internal(msg) => Self::InternalError(msg),
        }
    }
}

impl From<BookmarkError> for ApiError {
    fn from(err: BookmarkError) -> Self {
        match err {
            BookmarkError::LimitReached => {
                Self::conflict("Bookmark limit reached", codes::BOOKMARKS_LIMIT)
            }
            BookmarkError::NotFound => Self::not_found("Bookmark not found"),
            BookmarkError::Forbidden => Self::forbidden(
                "Bookmark belongs to another user",
                codes::BELONGS_TO_ANOTHER_USER,
            ),
            BookmarkError::Database(msg) => Self::DatabaseError(msg),
            BookmarkError::Internal(msg) => Self::InternalError(msg),
        }
    }
}
