//! Domain service for per-user bookmarks.

use thiserror::Error;

use crate::db::Bookmark;

/// Hard cap on bookmarks per user.
pub const MAX_BOOKMARKS_PER_USER: i32 = 25;

/// Errors specific to bookmark operations.
#[derive(Debug, Error)]
pub enum BookmarkError {
    #[error("Bookmark limit reached")]
    LimitReached,

    #[error("Bookmark not found")]
    NotFound,

    #[error("Bookmark belongs to another user")]
    Forbidden,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for BookmarkError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for BookmarkError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Fields accepted when creating a bookmark.
#[derive(Debug, Clone)]
pub struct NewBookmark {
    pub title: String,
    pub url: String,
    pub show_text: bool,
}

/// Fields accepted when updating a bookmark.
#[derive(Debug, Clone)]
pub struct BookmarkUpdate {
    pub id: i32,
    pub title: String,
    pub url: String,
    pub show_text: bool,
}

/// Domain service trait for bookmark CRUD.
#[async_trait::async_trait]
pub trait BookmarkService: Send + Sync {
    /// Inserts a bookmark for `user_id`, quota-checked. The favicon is
    /// resolved after the insert commits and back-filled asynchronously.
    ///
    /// # Errors
    ///
    /// Returns [`BookmarkError::LimitReached`] at the per-user cap.
    async fn create_bookmark(
        &self,
        user_id: i32,
        new: NewBookmark,
    ) -> Result<Bookmark, BookmarkError>;

    /// All bookmarks owned by `user_id`.
    async fn bookmarks_for_user(&self, user_id: i32) -> Result<Vec<Bookmark>, BookmarkError>;

    /// Deletes a bookmark after re-resolving its true owner from storage.
    ///
    /// # Errors
    ///
    /// Returns [`BookmarkError::Forbidden`] on an ownership mismatch, before
    /// anything is written.
    async fn delete_bookmark(&self, user_id: i32, bookmark_id: i32) -> Result<(), BookmarkError>;

    /// Updates a bookmark's fields, with the same ownership check as delete.
    /// A changed URL triggers an asynchronous favicon refetch.
    async fn update_bookmark(
        &self,
        user_id: i32,
        update: BookmarkUpdate,
    ) -> Result<Bookmark, BookmarkError>;
}
