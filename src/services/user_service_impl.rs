//! `SeaORM` implementation of the `UserService` trait.

use async_trait::async_trait;
use tokio::task;
use tracing::{info, warn};

use crate::clients::mail::MailClient;
use crate::db::repositories::user::{
    generate_reset_token, generate_verification_code, hash_password,
};
use crate::db::{Store, User};
use crate::services::user_service::{UserError, UserService};

/// How long a password-reset token stays usable.
const RESET_TOKEN_TTL_HOURS: i64 = 24;

pub struct SeaOrmUserService {
    store: Store,
    mail: MailClient,
    app_url: String,
}

impl SeaOrmUserService {
    #[must_use]
    pub const fn new(store: Store, mail: MailClient, app_url: String) -> Self {
        Self {
            store,
            mail,
            app_url,
        }
    }

    fn send_verification_mail(&self, email: String, username: String, code: String) {
        let mail = self.mail.clone();
        tokio::spawn(async move {
            if let Err(e) = mail.send_verification_code(&email, &username, &code).await {
                warn!(username, "failed to send verification email: {e:#}");
            }
        });
    }

    fn send_reset_mail(&self, email: String, username: String, token: &str) {
        let link = format!("{}/reset-password?token={token}", self.app_url);
        let mail = self.mail.clone();
        tokio::spawn(async move {
            if let Err(e) = mail.send_reset_link(&email, &username, &link).await {
                warn!(username, "failed to send password-reset email: {e:#}");
            }
        });
    }
}

#[async_trait]
impl UserService for SeaOrmUserService {
    async fn register(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<User, UserError> {
        // Both checks run concurrently and both complete before any branch,
        // and before the expensive hash.
        let (email_taken, username_taken) = tokio::join!(
            self.store.user_email_exists(email),
            self.store.user_username_exists(username),
        );

        if email_taken? {
            return Err(UserError::EmailTaken);
        }
        if username_taken? {
            return Err(UserError::UsernameTaken);
        }

        let password = password.to_string();
        let password_hash = task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| UserError::Internal(format!("Hashing task panicked: {e}")))??;

        let code = generate_verification_code();
        let user = self
            .store
            .create_user(email, username, &password_hash, &code)
            .await?;

        info!(user_id = user.id, username, "registered new user");
        self.send_verification_mail(user.email.clone(), user.username.clone(), code);

        Ok(user)
    }

    async fn verify_email(&self, code: &str) -> Result<(), UserError> {
        let user = self
            .store
            .get_user_by_verification_code(code)
            .await?
            .ok_or(UserError::NotFound)?;

        if user.is_verified {
            return Err(UserError::AlreadyVerified);
        }

        self.store.mark_user_verified(user.id).await?;
        info!(user_id = user.id, "email verified");

        Ok(())
    }

    async fn request_verification(&self, username: &str) -> Result<(), UserError> {
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(UserError::NotFound)?;

        if user.is_verified {
            return Err(UserError::AlreadyVerified);
        }

        let code = generate_verification_code();
        self.store.set_user_verification_code(user.id, &code).await?;
        self.send_verification_mail(user.email, user.username, code);

        Ok(())
    }

    async fn auth(&self, username: &str, password: &str) -> Result<User, UserError> {
        let user = self
            .store
            .get_user_by_username(username)
            .await?
            .ok_or(UserError::NotFound)?;

        let is_valid = self.store.verify_user_password(username, password).await?;
        if !is_valid {
            return Err(UserError::InvalidPassword);
        }

        Ok(user)
    }

    async fn verification_status(&self, user_id: i32) -> Result<bool, UserError> {
        let user = self
            .store
            .get_user_by_id(user_id)
            .await?
            .ok_or(UserError::NotFound)?;

        Ok(user.is_verified)
    }

    async fn change_password(&self, user_id: i32, new_password: &str) -> Result<(), UserError> {
        self.store.update_user_password(user_id, new_password).await?;

        // Every session goes, including the one this request arrived through.
        let removed = self.store.delete_all_sessions(user_id).await?;
        info!(user_id, removed, "password changed, sessions revoked");

        Ok(())
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), UserError> {
        let user = self
            .store
            .get_user_by_email(email)
            .await?
            .ok_or(UserError::NotFound)?;

        let token = generate_reset_token();
        let expires_at = chrono::Utc::now() + chrono::Duration::hours(RESET_TOKEN_TTL_HOURS);
        self.store
            .set_user_reset_token(user.id, &token, expires_at)
            .await?;

        self.send_reset_mail(user.email, user.username, &token);

        Ok(())
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), UserError> {
        let user = self
            .store
            .get_user_by_reset_token(token)
            .await?
            .ok_or(UserError::NotFound)?;

        let expired = user
            .reset_token_expire
            .is_none_or(|expire| expire <= chrono::Utc::now());
        if expired {
            return Err(UserError::TokenExpired);
        }

        // Re-hash and clear the token so it cannot be replayed.
        self.store.update_user_password(user.id, new_password).await?;

        let removed = self.store.delete_all_sessions(user.id).await?;
        info!(user_id = user.id, removed, "password reset, sessions revoked");

        Ok(())
    }
}
