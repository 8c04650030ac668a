//! Database query functions for the `preferences` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewPreferences, Preferences};

/// Fetch a user's preferences, if any were saved.
pub async fn get_preferences(pool: &PgPool, user_id: Uuid) -> Result<Option<Preferences>> {
    let prefs = sqlx::query_as::<_, Preferences>("SELECT * FROM preferences WHERE user_id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch preferences")?;

    Ok(prefs)
}

/// Insert or replace a user's preferences. Returns the stored row.
pub async fn upsert_preferences(pool: &PgPool, new: &NewPreferences<'_>) -> Result<Preferences> {
    let prefs = sqlx::query_as::<_, Preferences>(
        "INSERT INTO preferences (user_id, diet, allergies, goals_text, calorie_goal, protein_goal) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (user_id) DO UPDATE SET \
             diet = EXCLUDED.diet, \
             allergies = EXCLUDED.allergies, \
             goals_text = EXCLUDED.goals_text, \
             calorie_goal = EXCLUDED.calorie_goal, \
             protein_goal = EXCLUDED.protein_goal, \
             updated_at = now() \
         RETURNING *",
    )
    .bind(new.user_id)
    .bind(new.diet)
    .bind(new.allergies)
    .bind(new.goals_text)
    .bind(new.calorie_goal)
    .bind(new.protein_goal)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to save preferences for user {}", new.user_id))?;

    Ok(prefs)
}
