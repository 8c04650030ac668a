//! The AI-facing half of every feature: build a prompt, call the completion
//! client once, normalize the reply.
//!
//! Nothing here touches the database; see [`crate::service`] for the
//! per-user flows that load and store rows around these calls.

use std::sync::Arc;

use grub_db::models::Preferences;
use thiserror::Error;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::completion::{CompletionClient, CompletionRequest, UpstreamError};
use crate::normalize::{self, NormalizeError};
use crate::plan::{MAX_PLANS, MealPlan, PlanSet};
use crate::prompt;
use crate::replies::{self, Recipe, TargetSuggestion};

/// Errors from any AI-backed operation.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error(transparent)]
    Normalize(#[from] NormalizeError),

    #[error("no preferences saved for user {0}")]
    PreferencesNotFound(Uuid),

    #[error("no saved meal plan for user {0}")]
    PlanNotFound(Uuid),

    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

impl GenerateError {
    /// Stable machine-readable kind for HTTP bodies and CLI output.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Upstream(_) => "upstream_error",
            Self::Normalize(e) => e.kind(),
            Self::PreferencesNotFound(_) | Self::PlanNotFound(_) => "not_found",
            Self::Database(_) => "internal",
        }
    }
}

/// Shared handle around a completion client and the model to ask.
#[derive(Clone)]
pub struct Assistant {
    client: Arc<dyn CompletionClient>,
    model: String,
}

impl std::fmt::Debug for Assistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Assistant")
            .field("client", &self.client.name())
            .field("model", &self.model)
            .finish()
    }
}

impl Assistant {
    /// Use the client's own default model.
    pub fn new(client: Arc<dyn CompletionClient>) -> Self {
        let model = client.default_model().to_owned();
        Self { client, model }
    }

    pub fn with_model(client: Arc<dyn CompletionClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a prompt as-is and return the raw reply text.
    ///
    /// An empty `model` falls back to the assistant's model.
    pub async fn complete_raw(&self, model: &str, prompt: &str) -> Result<String, UpstreamError> {
        let model = if model.trim().is_empty() {
            self.model.as_str()
        } else {
            model
        };
        let request = CompletionRequest::new(model, prompt);
        let response = self.client.complete(&request).await?;
        Ok(response.text)
    }

    /// One completion call followed by `parse`. The raw text is logged when
    /// parsing fails and is never part of the returned error.
    async fn ask<T>(
        &self,
        feature: &'static str,
        prompt: String,
        parse: impl FnOnce(&str) -> Result<T, NormalizeError>,
    ) -> Result<T, GenerateError> {
        let raw = self.complete_raw("", &prompt).await?;
        parse(&raw).map_err(|e| {
            warn!(
                feature,
                kind = e.kind(),
                error = %e,
                bytes = raw.len(),
                raw = %raw,
                "could not normalize completion"
            );
            GenerateError::Normalize(e)
        })
    }

    /// Ask for `variants` alternative weekly plans (clamped to 1..=2).
    #[instrument(skip_all, fields(user_id = %prefs.user_id, variants))]
    pub async fn generate_plans(
        &self,
        prefs: &Preferences,
        variants: usize,
    ) -> Result<PlanSet, GenerateError> {
        let variants = variants.clamp(1, MAX_PLANS);
        let prompt = prompt::meal_plan_prompt(prefs, variants);
        let plans = self.ask("meal_plans", prompt, normalize::normalize).await?;
        info!(plans = plans.len(), "meal plans generated");
        Ok(plans)
    }

    /// Ask for daily calorie and protein targets.
    #[instrument(skip(self))]
    pub async fn suggest_targets(
        &self,
        diet: &str,
        goals: &str,
    ) -> Result<TargetSuggestion, GenerateError> {
        let prompt = prompt::target_suggestion_prompt(diet, goals);
        self.ask("targets", prompt, replies::parse_target_suggestion)
            .await
    }

    /// Ask the model to merge a plan's ingredients into a shopping list.
    pub async fn consolidate_ingredients(
        &self,
        plan: &MealPlan,
    ) -> Result<Vec<String>, GenerateError> {
        let prompt = prompt::grocery_consolidation_prompt(plan);
        self.ask("grocery", prompt, replies::parse_ingredient_list)
            .await
    }

    /// Ask for `count` recipes inspired by a plan.
    pub async fn suggest_recipes(
        &self,
        plan: &MealPlan,
        count: usize,
    ) -> Result<Vec<Recipe>, GenerateError> {
        let prompt = prompt::recipe_prompt(plan, count.max(1));
        self.ask("recipes", prompt, replies::parse_recipes).await
    }
}
