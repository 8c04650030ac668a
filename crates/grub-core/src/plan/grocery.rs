//! Grocery-list helpers over meal plans.

use std::collections::HashSet;

use super::types::MealPlan;

fn grocery_key(item: &str) -> String {
    item.trim().to_lowercase()
}

/// Every distinct ingredient in `plan`, in first-seen calendar order.
///
/// Comparison ignores case and surrounding whitespace; the first spelling
/// encountered is kept.
pub fn collect_ingredients(plan: &MealPlan) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for (_, meal) in plan.meals() {
        for ingredient in meal.ingredients.iter().flatten() {
            let trimmed = ingredient.trim();
            if !trimmed.is_empty() && seen.insert(grocery_key(trimmed)) {
                out.push(trimmed.to_owned());
            }
        }
    }
    out
}

/// Items from `candidates` that are not already on the list.
///
/// Blank candidates and duplicates within `candidates` are skipped.
pub fn merge_new_items<I, S>(existing: &[String], candidates: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = existing.iter().map(|s| grocery_key(s)).collect();
    candidates
        .into_iter()
        .filter_map(|c| {
            let trimmed = c.as_ref().trim();
            (!trimmed.is_empty() && seen.insert(grocery_key(trimmed))).then(|| trimmed.to_owned())
        })
        .collect()
}
