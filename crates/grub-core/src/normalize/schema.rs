//! Shape validation and per-entry coercion of recovered plan JSON.
//!
//! Coercion is local: a bad day becomes an empty day and a bad
//! meal is dropped, but the surrounding plan is kept.

use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{NormalizeError, SchemaViolation};
use crate::plan::{MAX_PLANS, Meal, MealPlan, PlanSet, Weekday};

/// Build a [`PlanSet`] from a recovered JSON document.
///
/// Accepts `{ "plans": [ ... ] }` or a bare weekday-keyed object.
pub fn plan_set_from_value(value: &Value) -> Result<PlanSet, NormalizeError> {
    let obj = value
        .as_object()
        .ok_or(NormalizeError::Schema(SchemaViolation::NotAnObject))?;

    let candidates: Vec<&Map<String, Value>> = match obj.get("plans") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| {
                let plan = item.as_object();
                if plan.is_none() {
                    debug!("skipping non-object entry in `plans`");
                }
                plan
            })
            .collect(),
        Some(_) => return Err(NormalizeError::Schema(SchemaViolation::PlansNotArray)),
        None if has_weekday_key(obj) => vec![obj],
        None => return Err(NormalizeError::Schema(SchemaViolation::UnrecognizedShape)),
    };

    let mut plans: Vec<MealPlan> = candidates.into_iter().map(plan_from_object).collect();

    if plans.len() > MAX_PLANS {
        warn!(
            received = plans.len(),
            kept = MAX_PLANS,
            "completion returned more plans than requested"
        );
        plans.truncate(MAX_PLANS);
    }
    if plans.iter().all(MealPlan::is_empty) {
        return Err(NormalizeError::Schema(SchemaViolation::EmptyAfterCoercion));
    }

    Ok(PlanSet { plans })
}

/// Validate a single plan supplied by a client (e.g. one chosen for saving).
pub fn plan_from_value(value: &Value) -> Result<MealPlan, NormalizeError> {
    let obj = value
        .as_object()
        .ok_or(NormalizeError::Schema(SchemaViolation::NotAnObject))?;
    let plan = plan_from_object(obj);
    if plan.is_empty() {
        return Err(NormalizeError::Schema(SchemaViolation::EmptyAfterCoercion));
    }
    Ok(plan)
}

fn has_weekday_key(obj: &Map<String, Value>) -> bool {
    Weekday::ALL.iter().any(|d| obj.contains_key(d.as_str()))
}

/// Read the seven canonical weekday keys; everything else is ignored.
fn plan_from_object(obj: &Map<String, Value>) -> MealPlan {
    let mut plan = MealPlan {
        label: obj
            .get("label")
            .and_then(Value::as_str)
            .map(str::to_owned),
        ..MealPlan::default()
    };

    for day in Weekday::ALL {
        match obj.get(day.as_str()) {
            None => {}
            Some(Value::Array(entries)) => {
                let meals = plan.day_mut(day);
                for entry in entries {
                    match meal_from_value(entry) {
                        Some(meal) => meals.push(meal),
                        None => debug!(%day, "dropping invalid meal entry"),
                    }
                }
            }
            Some(_) => debug!(%day, "day is not an array; treating as empty"),
        }
    }
    plan
}

/// Coerce one meal entry, or `None` if it is unusable.
pub(crate) fn meal_from_value(value: &Value) -> Option<Meal> {
    let obj = value.as_object()?;

    let name = obj.get("name")?.as_str()?;
    if name.trim().is_empty() {
        return None;
    }

    let calories = coerce_number(obj.get("calories")?)?;
    let protein = coerce_number(obj.get("protein")?)?;
    let carbs = optional_number(obj.get("carbs"))?;
    let fats = optional_number(obj.get("fats"))?;

    let ingredients = match obj.get("ingredients") {
        Some(Value::Array(items)) => Some(
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_owned)
                .collect(),
        ),
        _ => None,
    };

    Some(Meal {
        name: name.to_owned(),
        calories,
        protein,
        carbs,
        fats,
        ingredients,
    })
}

/// `Some(None)` when absent or null, `Some(Some(n))` when valid, `None` when
/// present but invalid (which invalidates the whole meal).
fn optional_number(value: Option<&Value>) -> Option<Option<f64>> {
    match value {
        None | Some(Value::Null) => Some(None),
        Some(v) => coerce_number(v).map(Some),
    }
}

/// Non-empty trimmed strings from a JSON array; other entries are dropped.
///
/// Used for free-form AI lists. Meal ingredients keep their strings as sent.
pub(crate) fn string_items(items: &[Value]) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// Coerce a JSON value to a non-negative finite number.
///
/// Numeric strings are accepted with an optional trailing unit, so `"25g"`
/// and `"300 kcal"` both coerce. A leading sign is not accepted.
pub(crate) fn coerce_number(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => leading_number(s.trim())?,
        _ => return None,
    };
    (n.is_finite() && n >= 0.0).then_some(n)
}

fn leading_number(s: &str) -> Option<f64> {
    let mut seen_dot = false;
    let end = s
        .char_indices()
        .find(|&(_, c)| {
            if c == '.' && !seen_dot {
                seen_dot = true;
                false
            } else {
                !c.is_ascii_digit()
            }
        })
        .map_or(s.len(), |(i, _)| i);
    s[..end].parse().ok()
}
