//! Prompt construction for every AI-backed feature.
//!
//! Prompts ask for strict JSON, but nothing downstream relies on the model
//! obeying: replies always go through [`crate::normalize`].

use grub_db::models::Preferences;
use serde_json::json;

use crate::plan::{MAX_PLANS, MealPlan, collect_ingredients};

/// Meals requested per day, in order.
pub const MEAL_SLOTS: [&str; 4] = ["Breakfast", "Morning Snack", "Lunch", "Dinner"];

/// Number of recipes requested by [`recipe_prompt`] callers by default.
pub const DEFAULT_RECIPE_COUNT: usize = 5;

/// Goal text used when the user left theirs blank.
pub const DEFAULT_GOALS: &str = "general health";

fn plan_label(index: usize) -> String {
    let letter = (b'A' + (index % 26) as u8) as char;
    format!("Plan {letter}")
}

/// The preference fields the model needs, without row bookkeeping.
fn preference_summary(prefs: &Preferences) -> serde_json::Value {
    let goals = if prefs.goals_text.trim().is_empty() {
        DEFAULT_GOALS
    } else {
        prefs.goals_text.trim()
    };
    json!({
        "diet": prefs.diet,
        "allergies": prefs.allergies,
        "goals": goals,
        "calorie_goal": prefs.calorie_goal,
        "protein_goal": prefs.protein_goal,
    })
}

/// Prompt for `variants` alternative seven-day plans (clamped to 1..=2).
pub fn meal_plan_prompt(prefs: &Preferences, variants: usize) -> String {
    let variants = variants.clamp(1, MAX_PLANS);
    let labels: Vec<String> = (0..variants).map(plan_label).collect();

    let mut prompt = String::with_capacity(2048);
    prompt.push_str("You are a professional meal-prep chef. Given these user preferences:\n");
    prompt.push_str(&preference_summary(prefs).to_string());
    prompt.push_str("\n\n");

    prompt.push_str(&format!(
        "Produce {variants} alternative 7-day meal plan{} labelled {}. ",
        if variants == 1 { "" } else { "s" },
        labels
            .iter()
            .map(|l| format!("\"{l}\""))
            .collect::<Vec<_>>()
            .join(" and ")
    ));
    prompt.push_str(&format!(
        "Each day has {} meals: {}.\n",
        MEAL_SLOTS.len(),
        MEAL_SLOTS.join(", ")
    ));
    prompt.push_str(
        "Each meal must include: name (string), calories (number), protein (number, grams), \
         carbs (number, grams), fats (number, grams), ingredients (array of strings).\n",
    );
    if !prefs.allergies.is_empty() {
        prompt.push_str(&format!(
            "Never use these allergens: {}.\n",
            prefs.allergies.join(", ")
        ));
    }
    prompt.push_str(
        "Reply ONLY with JSON, no prose, no comments, no code fences, exactly like:\n\
         {\"plans\": [{\"label\": \"Plan A\", \"Monday\": [{\"name\": \"...\", \"calories\": 0, \
         \"protein\": 0, \"carbs\": 0, \"fats\": 0, \"ingredients\": [\"...\"]}], \
         \"Tuesday\": [], \"Wednesday\": [], \"Thursday\": [], \"Friday\": [], \
         \"Saturday\": [], \"Sunday\": []}]}\n",
    );
    prompt
}

/// Prompt for daily calorie and protein targets.
pub fn target_suggestion_prompt(diet: &str, goals: &str) -> String {
    let diet = match diet.trim() {
        "" => "balanced",
        d => d,
    };
    let goals = match goals.trim() {
        "" => DEFAULT_GOALS,
        g => g,
    };
    format!(
        "Suggest daily calorie and protein targets for a {diet} diet with goals \"{goals}\".\n\
         Reply ONLY with JSON: {{\"calorieGoal\": number, \"proteinGoal\": number}}"
    )
}

/// Prompt asking the model to consolidate a plan's ingredients into a
/// shopping list.
pub fn grocery_consolidation_prompt(plan: &MealPlan) -> String {
    let ingredients = collect_ingredients(plan);
    let source = if ingredients.is_empty() {
        serde_json::to_string(plan).unwrap_or_default()
    } else {
        serde_json::to_string(&ingredients).unwrap_or_default()
    };
    format!(
        "Consolidate a weekly grocery list of unique ingredients from this meal plan: {source}\n\
         Merge duplicates and near-duplicates (e.g. \"egg\" and \"eggs\"). \
         Reply ONLY with JSON: {{\"ingredients\": [\"item1\", \"item2\"]}}"
    )
}

/// Prompt for `count` recipes inspired by a saved plan.
pub fn recipe_prompt(plan: &MealPlan, count: usize) -> String {
    let plan_json = serde_json::to_string(plan).unwrap_or_default();
    format!(
        "Given this weekly meal plan {plan_json}, suggest {count} recipes.\n\
         Reply ONLY with JSON: {{\"recipes\": [{{\"name\": \"...\", \
         \"ingredients\": [\"...\"], \"instructions\": \"...\"}}]}}"
    )
}
