//! Core logic for grub: meal-plan types, the response normalizer, prompt
//! construction, the completion-service client and the generation service.

pub mod assistant;
pub mod completion;
pub mod normalize;
pub mod plan;
pub mod prompt;
pub mod replies;
pub mod service;

pub use assistant::{Assistant, GenerateError};
pub use normalize::{NormalizeError, normalize, recover_json};
pub use plan::{Meal, MealPlan, PlanSet, Weekday};
