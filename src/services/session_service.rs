//! Domain service for cookie-backed sessions.
//!
//! Sessions are opaque UUID rows in the database; validity is existence plus
//! an unexpired timestamp.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors specific to session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// Covers both "no such session" and "session expired". Callers cannot
    /// tell the two apart, so a guessed session ID leaks nothing.
    #[error("Invalid or expired session")]
    Invalid,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for SessionError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for SessionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for session lifecycle.
#[async_trait::async_trait]
pub trait SessionService: Send + Sync {
    /// Persists a new session row. IDs are caller-generated UUIDs; a
    /// primary-key collision is a fatal persistence error, not a retry.
    async fn create_session(
        &self,
        session_id: &str,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError>;

    /// Resolves a session ID to its user.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Invalid`] for missing and expired sessions
    /// alike. Expired rows are left in place for the daily sweep.
    async fn validate_session(&self, session_id: &str) -> Result<i32, SessionError>;

    /// Removes a session. Deleting a session that does not exist succeeds.
    async fn delete_session(&self, session_id: &str) -> Result<(), SessionError>;

    /// Removes every session belonging to a user, including the one the
    /// caller is acting through.
    async fn delete_all_sessions(&self, user_id: i32) -> Result<(), SessionError>;
}
