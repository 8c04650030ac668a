use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

use grub_core::assistant::{Assistant, GenerateError};
use grub_core::normalize::NormalizeError;
use grub_core::plan::MAX_PLANS;
use grub_core::prompt::DEFAULT_RECIPE_COUNT;
use grub_core::service;
use grub_db::models::NewPreferences;
use grub_db::queries::{grocery_items, preferences, profiles};

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub assistant: Assistant,
}

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    kind: &'static str,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            kind: "bad_request",
            message: msg.into(),
        }
    }

    /// The error chain goes to the log only; clients get a generic message.
    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            kind: "internal",
            message: "internal server error".to_string(),
        }
    }
}

impl From<GenerateError> for AppError {
    fn from(err: GenerateError) -> Self {
        let status = match err {
            GenerateError::Database(e) => return Self::internal(e),
            GenerateError::Upstream(_) => StatusCode::BAD_GATEWAY,
            GenerateError::Normalize(NormalizeError::Schema(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            GenerateError::Normalize(NormalizeError::Malformed(_)) => StatusCode::BAD_GATEWAY,
            GenerateError::PreferencesNotFound(_) | GenerateError::PlanNotFound(_) => {
                StatusCode::NOT_FOUND
            }
        };
        Self {
            status,
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.message, "kind": self.kind });
        (self.status, Json(body)).into_response()
    }
}

type ApiResult = Result<Response, AppError>;

// ---------------------------------------------------------------------------
// Request types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    #[serde(default)]
    model: Option<String>,
    prompt: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MealPlansRequest {
    user_id: Uuid,
    #[serde(default)]
    variants: Option<usize>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SavePlanRequest {
    user_id: Uuid,
    plan: serde_json::Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PreferencesRequest {
    user_id: Uuid,
    #[serde(default)]
    diet: String,
    #[serde(default)]
    allergies: Vec<String>,
    #[serde(default)]
    goals_text: String,
    #[serde(default)]
    calorie_goal: Option<i32>,
    #[serde(default)]
    protein_goal: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct SuggestTargetsRequest {
    #[serde(default)]
    diet: String,
    #[serde(default)]
    goals: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserRequest {
    user_id: Uuid,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AddGroceryRequest {
    user_id: Uuid,
    item: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfileRequest {
    user_id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/generate", post(generate))
        .route("/api/meal-plans", post(generate_meal_plans))
        .route("/api/meal-plans/save", post(save_meal_plan))
        .route("/api/meal-plans/{user_id}", get(latest_meal_plan))
        .route("/api/preferences", post(save_preferences))
        .route("/api/preferences/suggest-targets", post(suggest_targets))
        .route("/api/preferences/{user_id}", get(get_preferences))
        .route("/api/grocery-list", post(add_grocery_item))
        .route("/api/grocery-list/import", post(import_grocery_list))
        .route("/api/grocery-list/{user_id}", get(list_grocery_items))
        .route("/api/recipes/suggest", post(suggest_recipes))
        .route("/api/profiles", post(upsert_profile))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!("grub serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("grub serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C; shutting down");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn generate(
    State(state): State<AppState>,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let model = req.model.unwrap_or_default();
    let content = state
        .assistant
        .complete_raw(&model, &req.prompt)
        .await
        .map_err(GenerateError::from)?;
    Ok(Json(json!({ "content": content })).into_response())
}

async fn generate_meal_plans(
    State(state): State<AppState>,
    payload: Result<Json<MealPlansRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let variants = req.variants.unwrap_or(MAX_PLANS);
    if !(1..=MAX_PLANS).contains(&variants) {
        return Err(AppError::bad_request(format!(
            "variants must be between 1 and {MAX_PLANS}, got {variants}"
        )));
    }
    let plans =
        service::generate_for_user(&state.pool, &state.assistant, req.user_id, variants).await?;
    Ok(Json(json!({ "plans": plans })).into_response())
}

async fn save_meal_plan(
    State(state): State<AppState>,
    payload: Result<Json<SavePlanRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let saved = service::save_plan_document(&state.pool, req.user_id, &req.plan).await?;
    Ok((StatusCode::CREATED, Json(saved)).into_response())
}

async fn latest_meal_plan(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult {
    let (saved, plan) = service::latest_plan(&state.pool, user_id).await?;
    Ok(Json(json!({
        "id": saved.id,
        "label": saved.label,
        "plan": plan,
        "created_at": saved.created_at,
    }))
    .into_response())
}

async fn get_preferences(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult {
    let prefs = preferences::get_preferences(&state.pool, user_id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(prefs).into_response())
}

async fn save_preferences(
    State(state): State<AppState>,
    payload: Result<Json<PreferencesRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    for (field, value) in [
        ("calorieGoal", req.calorie_goal),
        ("proteinGoal", req.protein_goal),
    ] {
        if value.is_some_and(|v| v < 0) {
            return Err(AppError::bad_request(format!("{field} must not be negative")));
        }
    }

    let allergies: Vec<String> = req
        .allergies
        .iter()
        .map(|a| a.trim())
        .filter(|a| !a.is_empty())
        .map(str::to_owned)
        .collect();
    let diet = match req.diet.trim() {
        "" => "none",
        d => d,
    };

    let prefs = preferences::upsert_preferences(
        &state.pool,
        &NewPreferences {
            user_id: req.user_id,
            diet,
            allergies: &allergies,
            goals_text: req.goals_text.trim(),
            calorie_goal: req.calorie_goal,
            protein_goal: req.protein_goal,
        },
    )
    .await
    .map_err(AppError::internal)?;
    Ok(Json(prefs).into_response())
}

async fn suggest_targets(
    State(state): State<AppState>,
    payload: Result<Json<SuggestTargetsRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let targets = state
        .assistant
        .suggest_targets(&req.diet, &req.goals)
        .await?;
    Ok(Json(targets).into_response())
}

async fn list_grocery_items(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult {
    let items = grocery_items::list_items(&state.pool, user_id)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(items).into_response())
}

async fn add_grocery_item(
    State(state): State<AppState>,
    payload: Result<Json<AddGroceryRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let item = req.item.trim();
    if item.is_empty() {
        return Err(AppError::bad_request("item must not be blank"));
    }
    let row = grocery_items::insert_item(&state.pool, req.user_id, item)
        .await
        .map_err(AppError::internal)?;
    Ok((StatusCode::CREATED, Json(row)).into_response())
}

async fn import_grocery_list(
    State(state): State<AppState>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let items = service::import_grocery_list(&state.pool, &state.assistant, req.user_id).await?;
    Ok(Json(items).into_response())
}

async fn suggest_recipes(
    State(state): State<AppState>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let recipes = service::suggest_recipes_for_user(
        &state.pool,
        &state.assistant,
        req.user_id,
        DEFAULT_RECIPE_COUNT,
    )
    .await?;
    Ok(Json(json!({ "recipes": recipes })).into_response())
}

async fn upsert_profile(
    State(state): State<AppState>,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let email = req.email.as_deref().map(str::trim).filter(|e| !e.is_empty());
    let profile = profiles::upsert_profile(&state.pool, req.user_id, email)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(profile).into_response())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
