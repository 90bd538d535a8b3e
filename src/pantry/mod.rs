pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub use repo::PantryRepo;
pub use repo_types::PantryItem;
pub use services::PantryService;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::pantry_routes())
}
