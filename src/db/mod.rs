use anyhow::Result;
use chrono::{DateTime, Utc};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::bookmark::{Bookmark, CreateOutcome};
pub use repositories::session::Session;
pub use repositories::user::User;

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        // Each pooled connection to an in-memory sqlite database gets its own
        // database, so those are pinned to a single connection.
        let in_memory = db_url.contains(":memory:");

        if !in_memory {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        if in_memory {
            opt.max_connections(1).min_connections(1);
        } else {
            opt.max_connections(max_connections)
                .min_connections(min_connections)
                .connect_timeout(Duration::from_secs(10))
                .acquire_timeout(Duration::from_secs(10))
                .idle_timeout(Duration::from_secs(300))
                .max_lifetime(Duration::from_secs(600));
        }
        opt.sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            min = min_connections,
            max = max_connections,
            "Database connected & migrations applied"
        );

        Ok(Self { conn })
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn session_repo(&self) -> repositories::session::SessionRepository {
        repositories::session::SessionRepository::new(self.conn.clone())
    }

    fn bookmark_repo(&self) -> repositories::bookmark::BookmarkRepository {
        repositories::bookmark::BookmarkRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
        verification_code: &str,
    ) -> Result<User> {
        self.user_repo()
            .create(email, username, password_hash, verification_code)
            .await
    }

    pub async fn user_email_exists(&self, email: &str) -> Result<bool> {
        self.user_repo().email_exists(email).await
    }

    pub async fn user_username_exists(&self, username: &str) -> Result<bool> {
        self.user_repo().username_exists(username).await
    }

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().get_by_email(email).await
    }

    pub async fn get_user_by_verification_code(&self, code: &str) -> Result<Option<User>> {
        self.user_repo().get_by_verification_code(code).await
    }

    pub async fn get_user_by_reset_token(&self, token: &str) -> Result<Option<User>> {
        self.user_repo().get_by_reset_token(token).await
    }

    pub async fn verify_user_password(&self, username: &str, password: &str) -> Result<bool> {
        self.user_repo().verify_password(username, password).await
    }

    pub async fn mark_user_verified(&self, id: i32) -> Result<()> {
        self.user_repo().mark_verified(id).await
    }

    pub async fn set_user_verification_code(&self, id: i32, code: &str) -> Result<()> {
        self.user_repo().set_verification_code(id, code).await
    }

    pub async fn update_user_password(&self, id: i32, new_password: &str) -> Result<()> {
        self.user_repo().update_password(id, new_password).await
    }

    pub async fn set_user_reset_token(
        &self,
        id: i32,
        token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.user_repo().set_reset_token(id, token, expires_at).await
    }

    // ========== Session Repository Methods ==========

    pub async fn create_session(
        &self,
        session_id: &str,
        user_id: i32,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.session_repo()
            .create(session_id, user_id, expires_at)
            .await
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Option<Session>> {
        self.session_repo().get(session_id).await
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        self.session_repo().delete(session_id).await
    }

    pub async fn delete_all_sessions(&self, user_id: i32) -> Result<u64> {
        self.session_repo().delete_all_for_user(user_id).await
    }

    pub async fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<u64> {
        self.session_repo().delete_expired(now).await
    }

    // ========== Bookmark Repository Methods ==========

    pub async fn create_bookmark(
        &self,
        user_id: i32,
        title: &str,
        url: &str,
        show_text: bool,
        max_per_user: i32,
    ) -> Result<CreateOutcome> {
        self.bookmark_repo()
            .create(user_id, title, url, show_text, max_per_user)
            .await
    }

    pub async fn get_bookmark(&self, bookmark_id: i32) -> Result<Option<Bookmark>> {
        self.bookmark_repo().get(bookmark_id).await
    }

    pub async fn bookmarks_for_user(&self, user_id: i32) -> Result<Vec<Bookmark>> {
        self.bookmark_repo().for_user(user_id).await
    }

    pub async fn delete_bookmark(&self, bookmark_id: i32) -> Result<bool> {
        self.bookmark_repo().delete(bookmark_id).await
    }

    pub async fn update_bookmark(
        &self,
        bookmark_id: i32,
        title: &str,
        url: &str,
        show_text: bool,
    ) -> Result<Option<Bookmark>> {
        self.bookmark_repo()
            .update(bookmark_id, title, url, show_text)
            .await
    }

    pub async fn set_bookmark_icon_url(&self, bookmark_id: i32, icon_url: &str) -> Result<()> {
        self.bookmark_repo().set_icon_url(bookmark_id, icon_url).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::user::hash_password;

    async fn memory_store() -> Store {
        Store::new("sqlite::memory:").await.unwrap()
    }

    async fn seed_user(store: &Store, email: &str, username: &str) -> User {
        let hash = hash_password("password123").unwrap();
        store
            .create_user(email, username, &hash, "123456")
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn bookmark_create_bumps_counter_and_enforces_quota() {
        let store = memory_store().await;
        let user = seed_user(&store, "a@example.com", "alice").await;

        for i in 0..3 {
            let outcome = store
                .create_bookmark(user.id, &format!("b{i}"), "https://example.com", true, 3)
                .await
                .unwrap();
            assert!(matches!(outcome, CreateOutcome::Created(_)));
        }

        let outcome = store
            .create_bookmark(user.id, "overflow", "https://example.com", true, 3)
            .await
            .unwrap();
        assert!(matches!(outcome, CreateOutcome::LimitReached));

        let refreshed = store.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(refreshed.amount_of_bookmarks, 3);
    }

    #[tokio::test]
    async fn bookmark_delete_decrements_counter() {
        let store = memory_store().await;
        let user = seed_user(&store, "b@example.com", "bob").await;

        let outcome = store
            .create_bookmark(user.id, "one", "https://example.com", true, 25)
            .await
            .unwrap();
        let CreateOutcome::Created(bookmark) = outcome else {
            panic!("expected created bookmark");
        };

        assert!(store.delete_bookmark(bookmark.id).await.unwrap());
        assert!(!store.delete_bookmark(bookmark.id).await.unwrap());

        let refreshed = store.get_user_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(refreshed.amount_of_bookmarks, 0);
    }

    #[tokio::test]
    async fn session_delete_is_idempotent() {
        let store = memory_store().await;
        let user = seed_user(&store, "d@example.com", "dana").await;

        let future = Utc::now() + chrono::Duration::hours(1);
        store.create_session("s1", user.id, future).await.unwrap();

        store.delete_session("s1").await.unwrap();
        assert!(store.get_session("s1").await.unwrap().is_none());

        // Deleting again is not an error.
        store.delete_session("s1").await.unwrap();
    }

    #[tokio::test]
    async fn expired_sessions_are_swept() {
        let store = memory_store().await;
        let user = seed_user(&store, "c@example.com", "carol").await;

        let past = Utc::now() - chrono::Duration::hours(1);
        let future = Utc::now() + chrono::Duration::hours(1);
        store.create_session("stale", user.id, past).await.unwrap();
        store.create_session("live", user.id, future).await.unwrap();

        let removed = store.delete_expired_sessions(Utc::now()).await.unwrap();
        assert_eq!(removed, 1);
        assert!(store.get_session("stale").await.unwrap().is_none());
        assert!(store.get_session("live").await.unwrap().is_some());
    }
}
