//! `SeaORM` implementation of the `SessionService` trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::db::Store;
use crate::services::session_service::{SessionError, SessionService};

pub struct SeaOrmSessionService {
    store: Store,
}

impl SeaOrmSessionService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }
}

#[async_trait]
impl SessionService for SeaOrmSessionService {
    async fn create_session(
        &self,
        session_id: &str,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.store
            .create_session(session_id, user_id, expires_at)
            .await?;
        Ok(())
    }

    async fn validate_session(&self, session_id: &str) -> Result<i32, SessionError> {
        let session = self
            .store
            .get_session(session_id)
            .await?
            .ok_or(SessionError::Invalid)?;

        if session.expires_at <= Utc::now() {
            debug!(user_id = session.user_id, "rejected expired session");
            return Err(SessionError::Invalid);
        }

        Ok(session.user_id)
    }

    async fn delete_session(&self, session_id: &str) -> Result<(), SessionError> {
        self.store.delete_session(session_id).await?;
        Ok(())
    }

    async fn delete_all_sessions(&self, user_id: i32) -> Result<(), SessionError> {
        let removed = self.store.delete_all_sessions(user_id).await?;
        debug!(user_id, removed, "revoked user sessions");
        Ok(())
    }
}
