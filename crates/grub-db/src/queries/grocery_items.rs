//! Database query functions for the `grocery_items` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::GroceryItem;

/// Append one item to a user's grocery list.
pub async fn insert_item(pool: &PgPool, user_id: Uuid, item: &str) -> Result<GroceryItem> {
    let row = sqlx::query_as::<_, GroceryItem>(
        "INSERT INTO grocery_items (user_id, item) \
         VALUES ($1, $2) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(item)
    .fetch_one(pool)
    .await
    .context("failed to insert grocery item")?;

    Ok(row)
}

/// Append several items in one transaction, preserving their order.
pub async fn insert_items(
    pool: &PgPool,
    user_id: Uuid,
    items: &[String],
) -> Result<Vec<GroceryItem>> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    let mut rows = Vec::with_capacity(items.len());
    for item in items {
        let row = sqlx::query_as::<_, GroceryItem>(
            "INSERT INTO grocery_items (user_id, item) \
             VALUES ($1, $2) \
             RETURNING *",
        )
        .bind(user_id)
        .bind(item)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("failed to insert grocery item {item:?}"))?;
        rows.push(row);
    }

    tx.commit().await.context("failed to commit grocery items")?;
    Ok(rows)
}

/// A user's grocery list, oldest first.
pub async fn list_items(pool: &PgPool, user_id: Uuid) -> Result<Vec<GroceryItem>> {
    let rows = sqlx::query_as::<_, GroceryItem>(
        "SELECT * FROM grocery_items WHERE user_id = $1 ORDER BY created_at, id",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list grocery items")?;

    Ok(rows)
}
