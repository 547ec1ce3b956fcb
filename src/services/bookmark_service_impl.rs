//! `SeaORM` implementation of the `BookmarkService` trait.

use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::db::{Bookmark, CreateOutcome, Store};
use crate::services::bookmark_service::{
    BookmarkError, BookmarkService, BookmarkUpdate, MAX_BOOKMARKS_PER_USER, NewBookmark,
};
use crate::services::favicon::FaviconFetcher;

pub struct SeaOrmBookmarkService {
    store: Store,
    favicon: FaviconFetcher,
}

impl SeaOrmBookmarkService {
    #[must_use]
    pub const fn new(store: Store, favicon: FaviconFetcher) -> Self {
        Self { store, favicon }
    }

    /// Fire-and-forget favicon resolution. Failure leaves `icon_url` unset;
    /// the bookmark itself is already committed.
    fn backfill_icon(&self, bookmark_id: i32, page_url: String) {
        let store = self.store.clone();
        let favicon = self.favicon.clone();
        tokio::spawn(async move {
            match favicon.fetch(&page_url).await {
                Ok(icon_url) => {
                    if let Err(e) = store.set_bookmark_icon_url(bookmark_id, &icon_url).await {
                        warn!(bookmark_id, "failed to store icon URL: {e:#}");
                    } else {
                        debug!(bookmark_id, icon_url, "favicon back-filled");
                    }
                }
                Err(e) => {
                    debug!(bookmark_id, "favicon resolution failed: {e:#}");
                }
            }
        });
    }
}

#[async_trait]
impl BookmarkService for SeaOrmBookmarkService {
    async fn create_bookmark(
        &self,
        user_id: i32,
        new: NewBookmark,
    ) -> Result<Bookmark, BookmarkError> {
        let outcome = self
            .store
            .create_bookmark(
                user_id,
                &new.title,
                &new.url,
                new.show_text,
                MAX_BOOKMARKS_PER_USER,
            )
            .await?;

        let bookmark = match outcome {
            CreateOutcome::Created(bookmark) => bookmark,
            CreateOutcome::LimitReached => return Err(BookmarkError::LimitReached),
        };

        info!(user_id, bookmark_id = bookmark.id, "bookmark created");
        self.backfill_icon(bookmark.id, bookmark.url.clone());

        Ok(bookmark)
    }

    async fn bookmarks_for_user(&self, user_id: i32) -> Result<Vec<Bookmark>, BookmarkError> {
        Ok(self.store.bookmarks_for_user(user_id).await?)
    }

    async fn delete_bookmark(&self, user_id: i32, bookmark_id: i32) -> Result<(), BookmarkError> {
        let bookmark = self
            .store
            .get_bookmark(bookmark_id)
            .await?
            .ok_or(BookmarkError::NotFound)?;

        // Ownership is settled before any write happens.
        if bookmark.user_id != user_id {
            return Err(BookmarkError::Forbidden);
        }

        self.store.delete_bookmark(bookmark_id).await?;
        info!(user_id, bookmark_id, "bookmark deleted");

        Ok(())
    }

    async fn update_bookmark(
        &self,
        user_id: i32,
        update: BookmarkUpdate,
    ) -> Result<Bookmark, BookmarkError> {
        let existing = self
            .store
            .get_bookmark(update.id)
            .await?
            .ok_or(BookmarkError::NotFound)?;

        if existing.user_id != user_id {
            return Err(BookmarkError::Forbidden);
        }

        let url_changed = existing.url != update.url;

        let updated = self
            .store
            .update_bookmark(update.id, &update.title, &update.url, update.show_text)
            .await?
            .ok_or(BookmarkError::NotFound)?;

        if url_changed {
            self.backfill_icon(updated.id, updated.url.clone());
        }

        Ok(updated)
    }
}
