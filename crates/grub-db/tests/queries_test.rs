//! CRUD tests for the query modules against a real PostgreSQL database.
//!
//! Each test creates an isolated temporary database via `grub-test-utils`.

use serde_json::json;
use uuid::Uuid;

use grub_db::models::NewPreferences;
use grub_db::pool;
use grub_db::queries::{grocery_items, meal_plans, preferences, profiles};
use grub_test_utils::{create_test_db, drop_test_db};

// ===========================================================================
// Migrations
// ===========================================================================

#[tokio::test]
async fn migrations_create_all_tables() {
    let (pool, db_name) = create_test_db().await;

    let counts = pool::table_counts(&pool).await.unwrap();
    let names: Vec<&str> = counts.iter().map(|(name, _)| *name).collect();
    assert_eq!(names, pool::TABLES);
    assert!(counts.iter().all(|(_, n)| *n == 0), "fresh tables: {counts:?}");

    // Running again is a no-op.
    pool::run_migrations(&pool).await.unwrap();

    pool.close().await;
    drop_test_db(&db_name).await;
}

// ===========================================================================
// Profiles
// ===========================================================================

#[tokio::test]
async fn upsert_profile_inserts_then_updates_email() {
    let (pool, db_name) = create_test_db().await;
    let id = Uuid::new_v4();

    let created = profiles::upsert_profile(&pool, id, Some("a@example.com"))
        .await
        .unwrap();
    assert_eq!(created.id, id);
    assert_eq!(created.email.as_deref(), Some("a@example.com"));

    let updated = profiles::upsert_profile(&pool, id, Some("b@example.com"))
        .await
        .unwrap();
    assert_eq!(updated.email.as_deref(), Some("b@example.com"));
    assert_eq!(updated.created_at, created.created_at);

    // A missing email does not erase the stored one.
    let kept = profiles::upsert_profile(&pool, id, None).await.unwrap();
    assert_eq!(kept.email.as_deref(), Some("b@example.com"));

    assert!(
        profiles::get_profile(&pool, Uuid::new_v4())
            .await
            .unwrap()
            .is_none()
    );

    pool.close().await;
    drop_test_db(&db_name).await;
}

// ===========================================================================
// Preferences
// ===========================================================================

#[tokio::test]
async fn preferences_upsert_replaces_row() {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();

    assert!(
        preferences::get_preferences(&pool, user_id)
            .await
            .unwrap()
            .is_none()
    );

    let allergies = vec!["peanuts".to_string()];
    let first = preferences::upsert_preferences(
        &pool,
        &NewPreferences {
            user_id,
            diet: "vegan",
            allergies: &allergies,
            goals_text: "lose weight",
            calorie_goal: Some(1800),
            protein_goal: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(first.diet, "vegan");
    assert_eq!(first.allergies, allergies);
    assert_eq!(first.protein_goal, None);

    let second = preferences::upsert_preferences(
        &pool,
        &NewPreferences {
            user_id,
            diet: "keto",
            allergies: &[],
            goals_text: "",
            calorie_goal: Some(2200),
            protein_goal: Some(140),
        },
    )
    .await
    .unwrap();
    assert_eq!(second.diet, "keto");
    assert!(second.allergies.is_empty());
    assert!(second.updated_at >= first.updated_at);

    let fetched = preferences::get_preferences(&pool, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fetched, second);

    pool.close().await;
    drop_test_db(&db_name).await;
}

#[tokio::test]
async fn negative_goals_are_rejected_by_the_database() {
    let (pool, db_name) = create_test_db().await;

    let result = preferences::upsert_preferences(
        &pool,
        &NewPreferences {
            user_id: Uuid::new_v4(),
            diet: "none",
            allergies: &[],
            goals_text: "",
            calorie_goal: Some(-1),
            protein_goal: None,
        },
    )
    .await;
    assert!(result.is_err());

    pool.close().await;
    drop_test_db(&db_name).await;
}

// ===========================================================================
// Grocery items
// ===========================================================================

#[tokio::test]
async fn grocery_items_list_in_insertion_order() {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();
    let other = Uuid::new_v4();

    grocery_items::insert_item(&pool, user_id, "milk").await.unwrap();
    let batch = vec!["eggs".to_string(), "spinach".to_string()];
    let inserted = grocery_items::insert_items(&pool, user_id, &batch)
        .await
        .unwrap();
    assert_eq!(inserted.len(), 2);
    grocery_items::insert_item(&pool, other, "bread").await.unwrap();

    let items: Vec<String> = grocery_items::list_items(&pool, user_id)
        .await
        .unwrap()
        .into_iter()
        .map(|row| row.item)
        .collect();
    assert_eq!(items, vec!["milk", "eggs", "spinach"]);

    pool.close().await;
    drop_test_db(&db_name).await;
}

// ===========================================================================
// Meal plans
// ===========================================================================

#[tokio::test]
async fn latest_meal_plan_returns_newest() {
    let (pool, db_name) = create_test_db().await;
    let user_id = Uuid::new_v4();

    assert!(
        meal_plans::latest_meal_plan(&pool, user_id)
            .await
            .unwrap()
            .is_none()
    );

    let older = json!({"Monday": [{"name": "Oats", "calories": 350, "protein": 12}]});
    let newer = json!({"label": "Plan B", "Tuesday": [{"name": "Soup", "calories": 400, "protein": 20}]});
    meal_plans::save_meal_plan(&pool, user_id, None, &older)
        .await
        .unwrap();
    let saved = meal_plans::save_meal_plan(&pool, user_id, Some("Plan B"), &newer)
        .await
        .unwrap();
    assert_eq!(saved.label.as_deref(), Some("Plan B"));

    let latest = meal_plans::latest_meal_plan(&pool, user_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(latest.id, saved.id);
    assert_eq!(latest.plan, newer);

    let all = meal_plans::list_meal_plans(&pool, user_id).await.unwrap();
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, saved.id);

    pool.close().await;
    drop_test_db(&db_name).await;
}
