pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

pub use repo::MealLogBook;
pub use repo_types::{MealLog, MealTotals, MealType};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::meal_log_routes())
}
