use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};

use crate::entities::{bookmarks, users};

#[derive(Debug, Clone)]
pub struct Bookmark {
    pub id: i32,
    pub user_id: i32,
    pub title: String,
    pub url: String,
    pub icon_url: Option<String>,
    pub show_text: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<bookmarks::Model> for Bookmark {
    fn from(model: bookmarks::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            title: model.title,
            url: model.url,
            icon_url: model.icon_url,
            show_text: model.show_text,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

/// Outcome of a quota-checked insert.
#[derive(Debug)]
pub enum CreateOutcome {
    Created(Bookmark),
    LimitReached,
}

pub struct BookmarkRepository {
    conn: DatabaseConnection,
}

impl BookmarkRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a bookmark and bump the owner's counter in one transaction.
    /// The quota check reads the counter inside the same transaction, so two
    /// concurrent creates cannot both slip under the limit.
    pub async fn create(
        &self,
        user_id: i32,
        title: &str,
        url: &str,
        show_text: bool,
        max_per_user: i32,
    ) -> Result<CreateOutcome> {
        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        let user = users::Entity::find_by_id(user_id)
            .one(&txn)
            .await
            .context("Failed to query bookmark owner")?
            .ok_or_else(|| anyhow::anyhow!("User not found: {user_id}"))?;

        if user.amount_of_bookmarks >= max_per_user {
            txn.rollback().await.ok();
            return Ok(CreateOutcome::LimitReached);
        }

        let now = chrono::Utc::now().to_rfc3339();

        let inserted = bookmarks::ActiveModel {
            user_id: Set(user_id),
            title: Set(title.to_string()),
            url: Set(url.to_string()),
            icon_url: Set(None),
            show_text: Set(show_text),
            created_at: Set(now.clone()),
            updated_at: Set(now.clone()),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .context("Failed to insert bookmark")?;

        let count = user.amount_of_bookmarks + 1;
        let mut owner: users::ActiveModel = user.into();
        owner.amount_of_bookmarks = Set(count);
        owner.updated_at = Set(now);
        owner.update(&txn).await.context("Failed to bump bookmark count")?;

        txn.commit().await.context("Failed to commit bookmark insert")?;

        Ok(CreateOutcome::Created(Bookmark::from(inserted)))
    }

    pub async fn get(&self, bookmark_id: i32) -> Result<Option<Bookmark>> {
        let bookmark = bookmarks::Entity::find_by_id(bookmark_id)
            .one(&self.conn)
            .await
            .context("Failed to query bookmark")?;

        Ok(bookmark.map(Bookmark::from))
    }

    pub async fn for_user(&self, user_id: i32) -> Result<Vec<Bookmark>> {
        let rows = bookmarks::Entity::find()
            .filter(bookmarks::Column::UserId.eq(user_id))
            .order_by_asc(bookmarks::Column::Id)
            .all(&self.conn)
            .await
            .context("Failed to list bookmarks")?;

        Ok(rows.into_iter().map(Bookmark::from).collect())
    }

    /// Delete a bookmark and decrement the owner's counter in one transaction.
    /// Returns false when the row no longer exists.
    pub async fn delete(&self, bookmark_id: i32) -> Result<bool> {
        let txn = self.conn.begin().await.context("Failed to open transaction")?;

        let Some(bookmark) = bookmarks::Entity::find_by_id(bookmark_id)
            .one(&txn)
            .await
            .context("Failed to query bookmark for deletion")?
        else {
            txn.rollback().await.ok();
            return Ok(false);
        };

        bookmarks::Entity::delete_by_id(bookmark_id)
            .exec(&txn)
            .await
            .context("Failed to delete bookmark")?;

        if let Some(user) = users::Entity::find_by_id(bookmark.user_id)
            .one(&txn)
            .await
            .context("Failed to query bookmark owner")?
        {
            let count = (user.amount_of_bookmarks - 1).max(0);
            let now = chrono::Utc::now().to_rfc3339();
            let mut owner: users::ActiveModel = user.into();
            owner.amount_of_bookmarks = Set(count);
            owner.updated_at = Set(now);
            owner.update(&txn).await.context("Failed to drop bookmark count")?;
        }

        txn.commit().await.context("Failed to commit bookmark deletion")?;

        Ok(true)
    }

    pub async fn update(
        &self,
        bookmark_id: i32,
        title: &str,
        url: &str,
        show_text: bool,
    ) -> Result<Option<Bookmark>> {
        let Some(bookmark) = bookmarks::Entity::find_by_id(bookmark_id)
            .one(&self.conn)
            .await
            .context("Failed to query bookmark for update")?
        else {
            return Ok(None);
        };

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: bookmarks::ActiveModel = bookmark.into();
        active.title = Set(title.to_string());
        active.url = Set(url.to_string());
        active.show_text = Set(show_text);
        active.updated_at = Set(now);
        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to update bookmark")?;

        Ok(Some(Bookmark::from(updated)))
    }

    /// Back-fill the icon URL once the favicon fetch resolves.
    pub async fn set_icon_url(&self, bookmark_id: i32, icon_url: &str) -> Result<()> {
        let Some(bookmark) = bookmarks::Entity::find_by_id(bookmark_id)
            .one(&self.conn)
            .await
            .context("Failed to query bookmark for icon update")?
        else {
            // Deleted while the fetch was in flight; nothing to do.
            return Ok(());
        };

        let now = chrono::Utc::now().to_rfc3339();

        let mut active: bookmarks::ActiveModel = bookmark.into();
        active.icon_url = Set(Some(icon_url.to_string()));
        active.updated_at = Set(now);
        active.update(&self.conn).await?;

        Ok(())
    }
}
