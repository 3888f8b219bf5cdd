use std::{
    fs,
    path::{Path, PathBuf},
    str::FromStr,
};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    Pool, Row, Sqlite,
};

use shared::{domain::ItemId, sort_key::SortKey};

#[derive(Clone)]
pub struct Storage {
    pool: Pool<Sqlite>,
}

#[derive(Debug, Clone)]
pub struct StoredItem {
    pub id: ItemId,
    pub title: String,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

impl Storage {
    pub async fn new(database_url: &str) -> Result<Self> {
        ensure_sqlite_parent_dir_exists(database_url)?;

        let connect_options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(connect_options)
            .await?;
        sqlx::migrate!("./migrations").run(&pool).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let _: i64 = sqlx::query_scalar("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .context("sqlite ping failed")?;
        Ok(())
    }

    /// Inserts a new item in front of the list and returns its id.
    pub async fn create_item(&self, title: &str, body: &str) -> Result<ItemId> {
        let mut tx = self.pool.begin().await?;

        let keys = sqlx::query("SELECT sort_key FROM items")
            .fetch_all(&mut *tx)
            .await?;
        let first = keys
            .into_iter()
            .map(|r| SortKey::from(r.get::<Vec<u8>, _>(0)))
            .min();
        let sort_key = SortKey::before_first(first.as_ref());

        let rec = sqlx::query(
            "INSERT INTO items (sort_key, title, body) VALUES (?, ?, ?) RETURNING id",
        )
        .bind(sort_key.as_bytes())
        .bind(title)
        .bind(body)
        .fetch_one(&mut *tx)
        .await?;
        let item_id = ItemId(rec.get::<i64, _>(0));

        tx.commit().await?;
        Ok(item_id)
    }

    /// All items, front to back. SQLite compares blobs bytewise, which is not
    /// the SortKey order, so the sort happens here.
    pub async fn list_items(&self) -> Result<Vec<StoredItem>> {
        let rows = sqlx::query("SELECT id, sort_key, title, body, created_at FROM items")
            .fetch_all(&self.pool)
            .await?;

        let mut items: Vec<(SortKey, StoredItem)> = rows
            .into_iter()
            .map(|r| {
                (
                    SortKey::from(r.get::<Vec<u8>, _>(1)),
                    StoredItem {
                        id: ItemId(r.get::<i64, _>(0)),
                        title: r.get::<String, _>(2),
                        body: r.get::<String, _>(3),
                        created_at: r.get::<chrono::NaiveDateTime, _>(4).and_utc(),
                    },
                )
            })
            .collect();

        items.sort_unstable_by(|a, b| a.0.cmp(&b.0));

        Ok(items.into_iter().map(|(_, item)| item).collect())
    }

    pub async fn load_item(&self, item_id: ItemId) -> Result<Option<StoredItem>> {
        let row = sqlx::query("SELECT id, title, body, created_at FROM items WHERE id = ?")
            .bind(item_id.0)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| StoredItem {
            id: ItemId(r.get::<i64, _>(0)),
            title: r.get::<String, _>(1),
            body: r.get::<String, _>(2),
            created_at: r.get::<chrono::NaiveDateTime, _>(3).and_utc(),
        }))
    }

    /// Edits an item's content, keeping its position. Returns `false` when
    /// the id is unknown.
    pub async fn update_item(&self, item_id: ItemId, title: &str, body: &str) -> Result<bool> {
        let result = sqlx::query("UPDATE items SET title = ?, body = ? WHERE id = ?")
            .bind(title)
            .bind(body)
            .bind(item_id.0)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Moves `curr` between its new neighbors by rewriting its sort key.
    ///
    /// Only the moved item's row changes. Both neighbors absent means a drop
    /// with nothing to compute against (single-element list) and is a no-op.
    pub async fn reorder_item(
        &self,
        prev_id: Option<ItemId>,
        curr_id: ItemId,
        next_id: Option<ItemId>,
    ) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        let curr_key = fetch_sort_key(&mut tx, curr_id)
            .await?
            .with_context(|| format!("moved item {curr_id} not found"))?;

        let prev_key = match prev_id {
            Some(id) => Some(
                fetch_sort_key(&mut tx, id)
                    .await?
                    .with_context(|| format!("previous neighbor {id} not found"))?,
            ),
            None => None,
        };
        let next_key = match next_id {
            Some(id) => Some(
                fetch_sort_key(&mut tx, id)
                    .await?
                    .with_context(|| format!("next neighbor {id} not found"))?,
            ),
            None => None,
        };

        let new_key = match (&prev_key, &next_key) {
            (Some(prev), Some(next)) => SortKey::midpoint(prev, next),
            (Some(prev), None) => SortKey::after_last(Some(prev)),
            (None, Some(next)) => SortKey::before_first(Some(next)),
            (None, None) => {
                // single-element list, position unchanged
                return Ok(());
            }
        };

        if new_key != curr_key {
            sqlx::query("UPDATE items SET sort_key = ? WHERE id = ?")
                .bind(new_key.as_bytes())
                .bind(curr_id.0)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

async fn fetch_sort_key(
    tx: &mut sqlx::Transaction<'_, Sqlite>,
    item_id: ItemId,
) -> Result<Option<SortKey>> {
    let row = sqlx::query("SELECT sort_key FROM items WHERE id = ?")
        .bind(item_id.0)
        .fetch_optional(&mut **tx)
        .await?;
    Ok(row.map(|r| SortKey::from(r.get::<Vec<u8>, _>(0))))
}

fn ensure_sqlite_parent_dir_exists(database_url: &str) -> Result<()> {
    let Some(path) = sqlite_path(database_url) else {
        return Ok(());
    };

    let Some(parent) = path.parent() else {
        return Ok(());
    };

    if parent.as_os_str().is_empty() {
        return Ok(());
    }

    fs::create_dir_all(parent).with_context(|| {
        format!(
            "failed to create parent directory '{}' for database url '{database_url}'",
            parent.display()
        )
    })?;

    Ok(())
}

fn sqlite_path(database_url: &str) -> Option<PathBuf> {
    if database_url == "sqlite::memory:" || !database_url.starts_with("sqlite:") {
        return None;
    }

    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:")
        .split('?')
        .next()
        .unwrap_or_default();

    if path.is_empty() {
        return None;
    }

    Some(Path::new(path).to_path_buf())
}

#[cfg(test)]
mod tests;
