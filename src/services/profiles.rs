use std::collections::BTreeMap;

use sqlx::PgPool;
use tokio::sync::RwLock;

use crate::{
    error::{AppError, AppResult},
    models::{ItemId, RatedItem, UserId, UserProfile, RATING_MAX, RATING_MIN},
};

/// Where reading lists live
///
/// A user "exists" for matching purposes only while they have at least one
/// saved item; `profile` returns `None` otherwise.
#[cfg_attr(test, mockall::automock)]
#[async_trait::async_trait]
pub trait ProfileStore: Send + Sync {
    /// Inserts or replaces the user's record for `item.item_id`
    async fn save_item(&self, user_id: UserId, item: RatedItem) -> AppResult<RatedItem>;

    /// Deletes a saved item, reporting whether it existed
    async fn remove_item(&self, user_id: UserId, item_id: &ItemId) -> AppResult<bool>;

    async fn profile(&self, user_id: UserId) -> AppResult<Option<UserProfile>>;

    /// Every other user sharing at least one item with `target`, ordered by id
    async fn candidates_for(&self, target: &UserProfile) -> AppResult<Vec<UserProfile>>;
}

/// Rejects records that can never be stored
pub fn check_item(item: &RatedItem) -> AppResult<()> {
    if item.item_id.as_str().trim().is_empty() {
        return Err(AppError::InvalidInput("Item id cannot be empty".to_string()));
    }

    if let Some(rating) = item.rating {
        if !(RATING_MIN..=RATING_MAX).contains(&rating) {
            return Err(AppError::InvalidInput(format!(
                "Rating {} outside {}..={}",
                rating, RATING_MIN, RATING_MAX
            )));
        }
    }

    Ok(())
}

fn shares_item(target: &UserProfile, other: &UserProfile) -> bool {
    let ids = target.item_ids();
    other.reading_list.iter().any(|i| ids.contains(&i.item_id))
}

/// Profiles kept in process memory
#[derive(Default)]
pub struct InMemoryProfileStore {
    profiles: RwLock<BTreeMap<UserId, UserProfile>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl ProfileStore for InMemoryProfileStore {
    async fn save_item(&self, user_id: UserId, item: RatedItem) -> AppResult<RatedItem> {
        check_item(&item)?;

        let mut profiles = self.profiles.write().await;
        profiles
            .entry(user_id)
            .or_insert_with(|| UserProfile::new(user_id))
            .upsert(item.clone());

        tracing::debug!(user_id = %user_id, item_id = %item.item_id, "Item saved");
        Ok(item)
    }

    async fn remove_item(&self, user_id: UserId, item_id: &ItemId) -> AppResult<bool> {
        let mut profiles = self.profiles.write().await;

        let Some(profile) = profiles.get_mut(&user_id) else {
            return Ok(false);
        };

        let removed = profile.remove(item_id);
        if profile.is_empty() {
            profiles.remove(&user_id);
        }

        Ok(removed)
    }

    async fn profile(&self, user_id: UserId) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(&user_id).cloned())
    }

    async fn candidates_for(&self, target: &UserProfile) -> AppResult<Vec<UserProfile>> {
        let profiles = self.profiles.read().await;

        Ok(profiles
            .values()
            .filter(|p| p.user_id != target.user_id && shares_item(target, p))
            .cloned()
            .collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct SavedBookRow {
    user_id: i64,
    item_id: String,
    rating: Option<i32>,
    review: Option<String>,
    to_be_read: bool,
}

impl From<SavedBookRow> for RatedItem {
    fn from(row: SavedBookRow) -> Self {
        RatedItem {
            item_id: ItemId(row.item_id),
            rating: row.rating,
            review: row.review,
            to_be_read: row.to_be_read,
        }
    }
}

/// Folds rows sorted by user id into one profile per user
fn group_rows(rows: Vec<SavedBookRow>) -> Vec<UserProfile> {
    let mut profiles: Vec<UserProfile> = Vec::new();

    for row in rows {
        let user_id = UserId(row.user_id);
        match profiles.last_mut() {
            Some(last) if last.user_id == user_id => last.reading_list.push(row.into()),
            _ => profiles.push(UserProfile::new(user_id).with_item(row.into())),
        }
    }

    profiles
}

/// Profiles backed by the `saved_books` table
#[derive(Clone)]
pub struct PostgresProfileStore {
    pool: PgPool,
}

impl PostgresProfileStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl ProfileStore for PostgresProfileStore {
    async fn save_item(&self, user_id: UserId, item: RatedItem) -> AppResult<RatedItem> {
        check_item(&item)?;

        sqlx::query(
            r#"
            INSERT INTO saved_books (user_id, item_id, rating, review, to_be_read)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (user_id, item_id) DO UPDATE
            SET rating = EXCLUDED.rating,
                review = EXCLUDED.review,
                to_be_read = EXCLUDED.to_be_read
            "#,
        )
        .bind(user_id.0)
        .bind(item.item_id.as_str())
        .bind(item.rating)
        .bind(item.review.as_deref())
        .bind(item.to_be_read)
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id = %user_id, item_id = %item.item_id, "Item saved");
        Ok(item)
    }

    async fn remove_item(&self, user_id: UserId, item_id: &ItemId) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM saved_books WHERE user_id = $1 AND item_id = $2")
            .bind(user_id.0)
            .bind(item_id.as_str())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn profile(&self, user_id: UserId) -> AppResult<Option<UserProfile>> {
        let rows: Vec<SavedBookRow> = sqlx::query_as(
            r#"
            SELECT user_id, item_id, rating, review, to_be_read
            FROM saved_books
            WHERE user_id = $1
            ORDER BY item_id
            "#,
        )
        .bind(user_id.0)
        .fetch_all(&self.pool)
        .await?;

        Ok(group_rows(rows).into_iter().next())
    }

    async fn candidates_for(&self, target: &UserProfile) -> AppResult<Vec<UserProfile>> {
        let item_ids: Vec<String> = target
            .reading_list
            .iter()
            .map(|i| i.item_id.0.clone())
            .collect();

        if item_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows: Vec<SavedBookRow> = sqlx::query_as(
            r#"
            SELECT user_id, item_id, rating, review, to_be_read
            FROM saved_books
            WHERE user_id <> $1
              AND user_id IN (
                  SELECT DISTINCT user_id FROM saved_books WHERE item_id = ANY($2)
              )
            ORDER BY user_id, item_id
            "#,
        )
        .bind(target.user_id.0)
        .bind(&item_ids)
        .fetch_all(&self.pool)
        .await?;

        let candidates = group_rows(rows);
        tracing::debug!(
            user_id = %target.user_id,
            candidates = candidates.len(),
            "Loaded match candidates"
        );

        Ok(candidates)
    }
}
