use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A user profile row, created when a user signs up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Dietary preferences and daily targets for one user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Preferences {
    pub user_id: Uuid,
    /// Diet name as chosen in the UI ("none", "vegetarian", "keto", ...).
    pub diet: String,
    pub allergies: Vec<String>,
    /// Free-form goals ("lose 5kg", "build muscle").
    pub goals_text: String,
    pub calorie_goal: Option<i32>,
    pub protein_goal: Option<i32>,
    pub updated_at: DateTime<Utc>,
}

/// Fields written by a preferences upsert.
#[derive(Debug, Clone)]
pub struct NewPreferences<'a> {
    pub user_id: Uuid,
    pub diet: &'a str,
    pub allergies: &'a [String],
    pub goals_text: &'a str,
    pub calorie_goal: Option<i32>,
    pub protein_goal: Option<i32>,
}

/// One entry on a user's grocery list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct GroceryItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub item: String,
    pub created_at: DateTime<Utc>,
}

/// A meal plan the user chose to keep.
///
/// `plan` holds the serialized, already-validated plan document; this crate
/// does not interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct SavedMealPlan {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: Option<String>,
    pub plan: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
