use axum::{extract::State, routing::get, Json, Router};
use tracing::instrument;

use super::dto::{DashboardSummary, DEFAULT_AGE, DEFAULT_CALORIE_GOAL, DEFAULT_GOAL};
use crate::{
    auth::{AuthUser, UserProfile},
    error::AppError,
    meal_log::MealTotals,
    meal_plans::{MealPlan, MealPlanService},
    pantry::PantryService,
    state::AppState,
};

pub fn dashboard_routes() -> Router<AppState> {
    Router::new().route("/dashboard", get(summary))
}

pub fn build_summary(
    profile: Option<&UserProfile>,
    totals: MealTotals,
    active_plan: Option<MealPlan>,
    low_stock_count: usize,
) -> DashboardSummary {
    DashboardSummary {
        name: profile.map_or_else(|| "User".to_owned(), UserProfile::greeting_name),
        email: profile.and_then(|p| p.email.clone()).unwrap_or_default(),
        age: DEFAULT_AGE,
        goal: DEFAULT_GOAL.to_owned(),
        calorie_goal: DEFAULT_CALORIE_GOAL,
        calories_consumed: totals.calories,
        meals_logged: totals.meals,
        active_plan,
        low_stock_count,
    }
}

#[instrument(skip(state))]
pub async fn summary(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<DashboardSummary>, AppError> {
    let profile = state.auth_events.current_user(&user_id).await;
    let totals = state.meal_logs.totals(&user_id).await;
    let active_plan = MealPlanService::new(state.meal_plan_repo(&user_id))
        .active_plan()
        .await?;
    let low_stock = PantryService::new(state.pantry_repo(&user_id))
        .low_stock()
        .await?
        .len();
    Ok(Json(build_summary(profile.as_ref(), totals, active_plan, low_stock)))
}
