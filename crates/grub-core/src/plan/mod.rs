//! Meal-plan types and pure helpers over them.

pub mod grocery;
pub mod types;

pub use grocery::{collect_ingredients, merge_new_items};
pub use types::{MAX_PLANS, Meal, MealPlan, PlanSet, Weekday};
