use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, Set,
};

use crate::entities::sessions;

#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub user_id: i32,
    pub expires_at: DateTime<Utc>,
}

impl From<sessions::Model> for Session {
    fn from(model: sessions::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            expires_at: model.expires_at,
        }
    }
}

pub struct SessionRepository {
    conn: DatabaseConnection,
}

impl SessionRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a session row. A primary-key collision surfaces as an error;
    /// IDs are UUIDs so there is no retry path.
    pub async fn create(
        &self,
        session_id: &str,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();

        let active_model = sessions::ActiveModel {
            id: Set(session_id.to_string()),
            user_id: Set(user_id),
            expires_at: Set(expires_at),
            created_at: Set(now.clone()),
            updated_at: Set(now),
        };

        active_model
            .insert(&self.conn)
            .await
            .context("Failed to insert session")?;

        Ok(())
    }

    pub async fn get(&self, session_id: &str) -> Result<Option<Session>> {
        let session = sessions::Entity::find_by_id(session_id)
            .one(&self.conn)
            .await
            .context("Failed to query session")?;

        Ok(session.map(Session::from))
    }

    /// Deleting a session that does not exist is not an error.
    pub async fn delete(&self, session_id: &str) -> Result<()> {
        sessions::Entity::delete_by_id(session_id)
            .exec(&self.conn)
            .await
            .context("Failed to delete session")?;

        Ok(())
    }

    pub async fn delete_all_for_user(&self, user_id: i32) -> Result<u64> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::UserId.eq(user_id))
            .exec(&self.conn)
            .await
            .context("Failed to delete user sessions")?;

        Ok(result.rows_affected)
    }

    /// Bulk-remove rows whose expiry has passed. Used by the daily sweep.
    pub async fn delete_expired(&self, now: DateTime<Utc>) -> Result<u64> {
        let result = sessions::Entity::delete_many()
            .filter(sessions::Column::ExpiresAt.lt(now))
            .exec(&self.conn)
            .await
            .context("Failed to delete expired sessions")?;

        Ok(result.rows_affected)
    }
}
