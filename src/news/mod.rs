pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

use crate::state::AppState;
use axum::Router;

pub use repo::NewsFeed;
pub use repo_types::Article;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::news_routes())
}
