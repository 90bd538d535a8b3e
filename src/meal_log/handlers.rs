use axum::{
    extract::State,
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::dto::{LogMealRequest, MealLogResponse, PendingMeal};
use super::repo_types::MealLog;
use crate::{auth::AuthUser, error::AppError, meal_plans::MealPlanService, state::AppState};

pub fn meal_log_routes() -> Router<AppState> {
    Router::new()
        .route("/meal-log", get(list_log).post(log_meal).delete(clear_log))
        .route("/meal-log/pending", get(take_pending))
}

#[instrument(skip(state))]
pub async fn list_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<MealLogResponse> {
    let entries = state.meal_logs.entries(&user_id).await;
    let totals = super::repo::totals(&entries);
    Json(MealLogResponse { entries, totals })
}

#[instrument(skip(state))]
pub async fn log_meal(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<LogMealRequest>,
) -> Result<(StatusCode, Json<MealLog>), AppError> {
    let dish = state
        .catalog
        .get(&payload.dish_id)
        .ok_or_else(|| AppError::not_found("Dish not found"))?;
    let entry = state
        .meal_logs
        .log_meal(&user_id, dish, payload.meal_type, payload.portion)
        .await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

#[instrument(skip(state))]
pub async fn clear_log(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> StatusCode {
    state.meal_logs.clear(&user_id).await;
    StatusCode::NO_CONTENT
}

/// Takes the meal handed over from the plan screen, if any.
#[instrument(skip(state))]
pub async fn take_pending(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<PendingMeal>, AppError> {
    let meal_name = MealPlanService::new(state.meal_plan_repo(&user_id))
        .take_meal_to_log()
        .await?;
    let dish = meal_name
        .as_deref()
        .and_then(|name| state.catalog.find_by_name(name))
        .cloned();
    Ok(Json(PendingMeal { meal_name, dish }))
}
