pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo::MealPlanRepo;
pub use repo_types::{LegacySavedMealPlan, MealPlan};
pub use services::MealPlanService;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::meal_plan_routes())
}
