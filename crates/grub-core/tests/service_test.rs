//! Integration tests for the per-user service flows.
//!
//! Each test gets its own temporary database and a scripted completion
//! client, so no network access is needed.

use std::sync::Arc;

use serde_json::json;
use uuid::Uuid;

use grub_core::assistant::{Assistant, GenerateError};
use grub_core::plan::{Meal, MealPlan};
use grub_core::service;
use grub_db::models::NewPreferences;
use grub_db::queries::{grocery_items, meal_plans, preferences};
use grub_test_utils::{ScriptedClient, create_test_db, drop_test_db};

const TWO_PLANS: &str = r#"Here you go:
```json
{
  "plans": [
    {"label": "Plan A", "Monday": [{"name": "Oats", "calories": 350, "protein": 12, "ingredients": ["oats", "milk"]}]},
    {"label": "Plan B", "Tuesday": [{"name": "Tofu bowl", "calories": "520 kcal", "protein": "30g",}]},
  ]
}
```"#;

async fn seed_preferences(pool: &sqlx::PgPool, user_id: Uuid) {
    preferences::upsert_preferences(
        pool,
        &NewPreferences {
            user_id,
            diet: "vegetarian",
            allergies: &["peanuts".to_string()],
            goals_text: "build muscle",
            calorie_goal: Some(2400),
            protein_goal: Some(150),
        },
    )
    .await
    .expect("seed preferences");
}

fn plan_with(ingredients: &[&str]) -> MealPlan {
    let mut plan = MealPlan::with_label("Plan A");
    plan.monday.push(Meal {
        ingredients: Some(ingredients.iter().map(|s| s.to_string()).collect()),
        ..Meal::new("Porridge", 300.0, 10.0)
    });
    plan
}

#[tokio::test]
async fn generate_for_user_uses_saved_preferences() {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();
    seed_preferences(&pool, user_id).await;

    let client = Arc::new(ScriptedClient::new().reply(TWO_PLANS));
    let assistant = Assistant::with_model(client.clone(), "gpt-4");

    let plans = service::generate_for_user(&pool, &assistant, user_id, 2)
        .await
        .unwrap();
    assert_eq!(plans.len(), 2);
    let second = plans.iter().nth(1).unwrap();
    assert_eq!(second.tuesday[0].calories, 520.0);
    assert_eq!(second.tuesday[0].protein, 30.0);

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].model, "gpt-4");
    assert!(requests[0].prompt.contains("vegetarian"));
    assert!(requests[0].prompt.contains("peanuts"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn generate_without_preferences_is_not_found() {
    let (pool, db_name) = create_test_db().await;
    let client = Arc::new(ScriptedClient::new().reply(TWO_PLANS));
    let assistant = Assistant::new(client.clone());

    let err = service::generate_for_user(&pool, &assistant, Uuid::new_v4(), 2)
        .await
        .unwrap_err();
    assert!(matches!(err, GenerateError::PreferencesNotFound(_)));
    assert!(client.requests().is_empty(), "no completion call expected");

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn save_plan_document_coerces_before_storing() {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();

    let doc = json!({
        "label": "Plan A",
        "Monday": [
            {"name": "Oats", "calories": "350", "protein": 12},
            {"name": "", "calories": 100, "protein": 1}
        ],
        "Funday": [{"name": "Cake", "calories": 900, "protein": 2}]
    });
    let saved = service::save_plan_document(&pool, user_id, &doc)
        .await
        .unwrap();
    assert_eq!(saved.label.as_deref(), Some("Plan A"));
    assert_eq!(saved.plan["Monday"].as_array().unwrap().len(), 1);
    assert_eq!(saved.plan["Monday"][0]["calories"], json!(350.0));
    assert!(saved.plan.get("Funday").is_none());

    let (latest, plan) = service::latest_plan(&pool, user_id).await.unwrap();
    assert_eq!(latest.id, saved.id);
    assert_eq!(plan.meal_count(), 1);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn save_plan_document_rejects_empty_plan() {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();

    let err = service::save_plan_document(&pool, user_id, &json!({"label": "Plan A"}))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "schema_error");
    assert!(
        meal_plans::latest_meal_plan(&pool, user_id)
            .await
            .unwrap()
            .is_none()
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn import_grocery_list_skips_existing_items() {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();
    service::save_plan(&pool, user_id, &plan_with(&["oats", "milk", "banana"]))
        .await
        .unwrap();
    grocery_items::insert_item(&pool, user_id, "Milk").await.unwrap();

    let client = Arc::new(
        ScriptedClient::new().reply(r#"{"ingredients": ["Oats", "milk ", "bananas", "oats"]}"#),
    );
    let assistant = Assistant::new(client.clone());

    let items: Vec<String> = service::import_grocery_list(&pool, &assistant, user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.item)
        .collect();
    assert_eq!(items, vec!["Milk", "Oats", "bananas"]);
    assert!(client.requests()[0].prompt.contains("banana"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn import_grocery_list_fails_on_unusable_reply() {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();
    service::save_plan(&pool, user_id, &plan_with(&["oats"]))
        .await
        .unwrap();

    let assistant = Assistant::new(Arc::new(ScriptedClient::new().reply("oats, milk")));
    let err = service::import_grocery_list(&pool, &assistant, user_id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "malformed_response");
    assert!(
        grocery_items::list_items(&pool, user_id)
            .await
            .unwrap()
            .is_empty()
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn import_without_saved_plan_is_not_found() {
    let (pool, db_name) = create_test_db().await;
    let assistant = Assistant::new(Arc::new(ScriptedClient::new()));

    let err = service::import_grocery_list(&pool, &assistant, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, GenerateError::PlanNotFound(_)));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn suggest_recipes_for_user_reads_latest_plan() {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();
    service::save_plan(&pool, user_id, &plan_with(&["oats"]))
        .await
        .unwrap();

    let client = Arc::new(ScriptedClient::new().reply(
        r#"{"recipes": [{"name": "Overnight oats", "ingredients": ["oats"], "instructions": ["Mix.", "Chill."]}]}"#,
    ));
    let assistant = Assistant::new(client.clone());

    let recipes = service::suggest_recipes_for_user(&pool, &assistant, user_id, 5)
        .await
        .unwrap();
    assert_eq!(recipes.len(), 1);
    assert_eq!(recipes[0].instructions, "Mix. Chill.");
    assert!(client.requests()[0].prompt.contains("Porridge"));

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn upstream_failure_propagates_unchanged() {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();
    seed_preferences(&pool, user_id).await;

    let assistant = Assistant::new(Arc::new(ScriptedClient::new().fail(429)));
    let err = service::generate_for_user(&pool, &assistant, user_id, 1)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "upstream_error");

    pool.close().await;
    drop_test_db(&db_name).await;
}
