//! Database query functions for the `profiles` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::Profile;

/// Insert a profile, or update its email if the id already exists.
///
/// Errors are returned to the caller; a signup flow must not treat a failed
/// profile write as success.
pub async fn upsert_profile(pool: &PgPool, id: Uuid, email: Option<&str>) -> Result<Profile> {
    let profile = sqlx::query_as::<_, Profile>(
        "INSERT INTO profiles (id, email) \
         VALUES ($1, $2) \
         ON CONFLICT (id) DO UPDATE SET email = COALESCE(EXCLUDED.email, profiles.email) \
         RETURNING *",
    )
    .bind(id)
    .bind(email)
    .fetch_one(pool)
    .await
    .with_context(|| format!("failed to upsert profile {id}"))?;

    Ok(profile)
}

/// Fetch a profile by id.
pub async fn get_profile(pool: &PgPool, id: Uuid) -> Result<Option<Profile>> {
    let profile = sqlx::query_as::<_, Profile>("SELECT * FROM profiles WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch profile")?;

    Ok(profile)
}
