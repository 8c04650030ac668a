//! `grub generate`: one-shot plan generation from saved preferences.

use anyhow::{Result, anyhow};
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use grub_core::assistant::Assistant;
use grub_core::service;

pub async fn run_generate(
    pool: &PgPool,
    assistant: &Assistant,
    user_id: Uuid,
    variants: usize,
) -> Result<()> {
    let plans = service::generate_for_user(pool, assistant, user_id, variants)
        .await
        .map_err(|e| anyhow!("{}: {e}", e.kind()))?;
    println!("{}", serde_json::to_string_pretty(&json!({ "plans": plans }))?);
    Ok(())
}
