//! Domain service for account lifecycle: registration, email verification,
//! authentication, and password change/reset.

use thiserror::Error;

use crate::db::User;

/// Errors specific to user operations.
#[derive(Debug, Error)]
pub enum UserError {
    #[error("Email already in use")]
    EmailTaken,

    #[error("Username already in use")]
    UsernameTaken,

    #[error("User not found")]
    NotFound,

    #[error("Email is already verified")]
    AlreadyVerified,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Reset token has expired")]
    TokenExpired,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for UserError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Domain service trait for user management.
#[async_trait::async_trait]
pub trait UserService: Send + Sync {
    /// Creates an unverified account and mails a 6-digit verification code.
    /// The mail send is fire-and-forget; its failure never fails registration.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::EmailTaken`] / [`UserError::UsernameTaken`] before
    /// any password hashing happens.
    async fn register(&self, email: &str, username: &str, password: &str)
    -> Result<User, UserError>;

    /// Consumes a verification code. The code is the lookup key; no identity
    /// accompanies it.
    async fn verify_email(&self, code: &str) -> Result<(), UserError>;

    /// Assigns a fresh verification code and resends it.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::AlreadyVerified`] when there is nothing to verify.
    async fn request_verification(&self, username: &str) -> Result<(), UserError>;

    /// Checks credentials and returns the user. Does NOT create a session;
    /// that is the login handler's job after the verified-email gate.
    async fn auth(&self, username: &str, password: &str) -> Result<User, UserError>;

    /// Whether the user's email address has been verified.
    async fn verification_status(&self, user_id: i32) -> Result<bool, UserError>;

    /// Re-hashes and stores a new password, then revokes every session the
    /// user holds, including the one this call arrived through.
    async fn change_password(&self, user_id: i32, new_password: &str) -> Result<(), UserError>;

    /// Issues a password-reset token (24 h window) and mails a reset link.
    async fn request_password_reset(&self, email: &str) -> Result<(), UserError>;

    /// Consumes a reset token: re-hashes the password, clears the token, and
    /// revokes all sessions.
    ///
    /// # Errors
    ///
    /// Returns [`UserError::NotFound`] when no user carries the token and
    /// [`UserError::TokenExpired`] when the window has passed.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), UserError>;
}
