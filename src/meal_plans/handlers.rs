use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use super::dto::{EditPlanRequest, GeneratePlanRequest, LogMealRequest};
use super::repo_types::MealPlan;
use super::MealPlanService;
use crate::{auth::AuthUser, error::AppError, pantry::PantryService, state::AppState};

pub fn meal_plan_routes() -> Router<AppState> {
    Router::new()
        .route("/meal-plans", get(list_plans))
        .route("/meal-plans/generate", post(generate_plan))
        .route("/meal-plans/active", get(active_plan))
        .route("/meal-plans/log-meal", post(log_meal_from_plan))
        .route(
            "/meal-plans/:id",
            get(get_plan).put(edit_plan).delete(delete_plan),
        )
        .route("/meal-plans/:id/activate", post(activate_plan))
}

fn service(state: &AppState, user_id: &str) -> MealPlanService {
    MealPlanService::new(state.meal_plan_repo(user_id))
}

#[instrument(skip(state))]
pub async fn list_plans(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<MealPlan>>, AppError> {
    Ok(Json(service(&state, &user_id).list().await?))
}

#[instrument(skip(state, form))]
pub async fn generate_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(form): Json<GeneratePlanRequest>,
) -> Result<(StatusCode, Json<MealPlan>), AppError> {
    let pantry = PantryService::new(state.pantry_repo(&user_id))
        .saved_item_names()
        .await?;
    let plan = service(&state, &user_id)
        .generate(
            &state.ai,
            &state.catalog,
            &form,
            &pantry,
            state.config.ai.max_prompt_dishes,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[instrument(skip(state))]
pub async fn active_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<MealPlan>, AppError> {
    service(&state, &user_id)
        .active_plan()
        .await?
        .map(Json)
        .ok_or_else(|| AppError::not_found("No active meal plan"))
}

#[instrument(skip(state))]
pub async fn get_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MealPlan>, AppError> {
    Ok(Json(service(&state, &user_id).get(&id).await?))
}

#[instrument(skip(state, payload))]
pub async fn edit_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<EditPlanRequest>,
) -> Result<Json<MealPlan>, AppError> {
    let plan = service(&state, &user_id)
        .edit_plan(&id, payload.name, payload.plan)
        .await?;
    Ok(Json(plan))
}

#[instrument(skip(state))]
pub async fn delete_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    service(&state, &user_id).delete_plan(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[instrument(skip(state))]
pub async fn activate_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Vec<MealPlan>>, AppError> {
    Ok(Json(service(&state, &user_id).set_active_plan(&id).await?))
}

#[instrument(skip(state, payload))]
pub async fn log_meal_from_plan(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<LogMealRequest>,
) -> Result<StatusCode, AppError> {
    service(&state, &user_id)
        .log_meal_from_plan(&payload.meal_name)
        .await?;
    Ok(StatusCode::ACCEPTED)
}
