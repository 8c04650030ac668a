//! Database query functions for the `meal_plans` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::SavedMealPlan;

/// Store a validated plan document for a user.
pub async fn save_meal_plan(
    pool: &PgPool,
    user_id: Uuid,
    label: Option<&str>,
    plan: &serde_json::Value,
) -> Result<SavedMealPlan> {
    let row = sqlx::query_as::<_, SavedMealPlan>(
        "INSERT INTO meal_plans (user_id, label, plan) \
         VALUES ($1, $2, $3) \
         RETURNING *",
    )
    .bind(user_id)
    .bind(label)
    .bind(plan)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to save meal plan for user {user_id}"))?;

    Ok(row)
}

/// The most recently saved plan for a user.
pub async fn latest_meal_plan(pool: &PgPool, user_id: Uuid) -> Result<Option<SavedMealPlan>> {
    let row = sqlx::query_as::<_, SavedMealPlan>(
        "SELECT * FROM meal_plans WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await
    .context("failed to fetch latest meal plan")?;

    Ok(row)
}

/// All saved plans for a user, newest first.
pub async fn list_meal_plans(pool: &PgPool, user_id: Uuid) -> Result<Vec<SavedMealPlan>> {
    let rows = sqlx::query_as::<_, SavedMealPlan>(
        "SELECT * FROM meal_plans WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to list meal plans")?;

    Ok(rows)
}
