//! Per-user flows: load rows, call the [`Assistant`], store results.
//!
//! Generation and persistence are separate steps; no transaction spans a
//! completion call.

use anyhow::Context;
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use grub_db::models::{GroceryItem, SavedMealPlan};
use grub_db::queries::{grocery_items, meal_plans, preferences};

use crate::assistant::{Assistant, GenerateError};
use crate::normalize::validate_plan;
use crate::plan::{MealPlan, PlanSet, merge_new_items};
use crate::replies::Recipe;

/// Generate plans from the user's saved preferences.
pub async fn generate_for_user(
    pool: &PgPool,
    assistant: &Assistant,
    user_id: Uuid,
    variants: usize,
) -> Result<PlanSet, GenerateError> {
    let prefs = preferences::get_preferences(pool, user_id)
        .await?
        .ok_or(GenerateError::PreferencesNotFound(user_id))?;
    assistant.generate_plans(&prefs, variants).await
}

/// Persist an already-validated plan.
pub async fn save_plan(
    pool: &PgPool,
    user_id: Uuid,
    plan: &MealPlan,
) -> anyhow::Result<SavedMealPlan> {
    let doc = serde_json::to_value(plan).context("failed to serialize meal plan")?;
    let saved = meal_plans::save_meal_plan(pool, user_id, plan.label.as_deref(), &doc).await?;
    info!(%user_id, plan_id = %saved.id, meals = plan.meal_count(), "meal plan saved");
    Ok(saved)
}

/// Validate a client-supplied plan document, then persist the coerced plan.
pub async fn save_plan_document(
    pool: &PgPool,
    user_id: Uuid,
    doc: &serde_json::Value,
) -> Result<SavedMealPlan, GenerateError> {
    let plan = validate_plan(doc)?;
    Ok(save_plan(pool, user_id, &plan).await?)
}

/// The user's most recent saved plan, decoded.
pub async fn latest_plan(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<(SavedMealPlan, MealPlan), GenerateError> {
    let saved = meal_plans::latest_meal_plan(pool, user_id)
        .await?
        .ok_or(GenerateError::PlanNotFound(user_id))?;
    let plan = validate_plan(&saved.plan)?;
    Ok((saved, plan))
}

/// Add the latest plan's consolidated ingredients to the grocery list.
///
/// Items already on the list (case-insensitive, trimmed) are skipped. Returns
/// the full list afterwards.
pub async fn import_grocery_list(
    pool: &PgPool,
    assistant: &Assistant,
    user_id: Uuid,
) -> Result<Vec<GroceryItem>, GenerateError> {
    let (_, plan) = latest_plan(pool, user_id).await?;
    let consolidated = assistant.consolidate_ingredients(&plan).await?;

    let existing: Vec<String> = grocery_items::list_items(pool, user_id)
        .await?
        .into_iter()
        .map(|row| row.item)
        .collect();
    let fresh = merge_new_items(&existing, consolidated);

    if !fresh.is_empty() {
        grocery_items::insert_items(pool, user_id, &fresh).await?;
    }
    info!(%user_id, added = fresh.len(), "grocery list imported");

    Ok(grocery_items::list_items(pool, user_id).await?)
}

/// Recipes inspired by the user's latest saved plan.
pub async fn suggest_recipes_for_user(
    pool: &PgPool,
    assistant: &Assistant,
    user_id: Uuid,
    count: usize,
) -> Result<Vec<Recipe>, GenerateError> {
    let (_, plan) = latest_plan(pool, user_id).await?;
    assistant.suggest_recipes(&plan, count).await
}
