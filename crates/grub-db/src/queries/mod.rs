//! Query functions, one module per table.

pub mod grocery_items;
pub mod meal_plans;
pub mod preferences;
pub mod profiles;
