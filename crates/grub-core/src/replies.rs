//! Typed parsers for the non-plan AI replies (targets, grocery lists,
//! recipes). All of them share the normalizer's recovery stages.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::normalize::schema::{coerce_number, string_items};
use crate::normalize::{NormalizeError, SchemaViolation, recover_json};

/// Suggested daily targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetSuggestion {
    pub calorie_goal: i32,
    pub protein_goal: i32,
}

/// A suggested recipe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub ingredients: Vec<String>,
    pub instructions: String,
}

/// Look up a number under either its camelCase or snake_case key.
fn target_field(obj: &Value, camel: &'static str, snake: &str) -> Result<i32, NormalizeError> {
    obj.get(camel)
        .or_else(|| obj.get(snake))
        .and_then(coerce_number)
        .filter(|n| *n <= f64::from(i32::MAX))
        .map(|n| n.round() as i32)
        .ok_or(NormalizeError::Schema(SchemaViolation::InvalidField(camel)))
}

/// Parse `{ "calorieGoal": n, "proteinGoal": n }`.
pub fn parse_target_suggestion(raw: &str) -> Result<TargetSuggestion, NormalizeError> {
    let value = recover_json(raw)?;
    Ok(TargetSuggestion {
        calorie_goal: target_field(&value, "calorieGoal", "calorie_goal")?,
        protein_goal: target_field(&value, "proteinGoal", "protein_goal")?,
    })
}

/// Parse `{ "ingredients": ["..."] }` into trimmed, non-empty strings.
pub fn parse_ingredient_list(raw: &str) -> Result<Vec<String>, NormalizeError> {
    let value = recover_json(raw)?;
    let items = value
        .get("ingredients")
        .and_then(Value::as_array)
        .ok_or(NormalizeError::Schema(SchemaViolation::InvalidField(
            "ingredients",
        )))?;

    let ingredients = string_items(items);
    if ingredients.is_empty() {
        return Err(SchemaViolation::NoEntries("ingredients").into());
    }
    Ok(ingredients)
}

fn recipe_from_value(value: &Value) -> Option<Recipe> {
    let name = value.get("name")?.as_str()?.trim();
    if name.is_empty() {
        return None;
    }
    let ingredients = value
        .get("ingredients")
        .and_then(Value::as_array)
        .map(|items| string_items(items))
        .unwrap_or_default();
    // Models return instructions either as one string or as a list of steps.
    let instructions = match value.get("instructions") {
        Some(Value::String(s)) => s.trim().to_owned(),
        Some(Value::Array(steps)) => string_items(steps).join(" "),
        _ => String::new(),
    };
    Some(Recipe {
        name: name.to_owned(),
        ingredients,
        instructions,
    })
}

/// Parse `{ "recipes": [ { name, ingredients, instructions } ] }`.
///
/// Recipes without a name are dropped; an empty result is a schema error.
pub fn parse_recipes(raw: &str) -> Result<Vec<Recipe>, NormalizeError> {
    let value = recover_json(raw)?;
    let items = value
        .get("recipes")
        .and_then(Value::as_array)
        .ok_or(NormalizeError::Schema(SchemaViolation::InvalidField(
            "recipes",
        )))?;

    let recipes: Vec<Recipe> = items.iter().filter_map(recipe_from_value).collect();
    if recipes.is_empty() {
        return Err(SchemaViolation::NoEntries("recipes").into());
    }
    Ok(recipes)
}
