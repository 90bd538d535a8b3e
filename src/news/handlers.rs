use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{dto::NewsQuery, repo_types::Article};
use crate::{error::AppError, state::AppState};

pub fn news_routes() -> Router<AppState> {
    Router::new()
        .route("/news", get(list_articles))
        .route("/news/categories", get(list_categories))
        .route("/news/:id", get(get_article))
}

#[instrument(skip(state))]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(q): Query<NewsQuery>,
) -> Json<Vec<Article>> {
    Json(
        state
            .news
            .list(q.category.as_deref(), q.search.as_deref())
            .into_iter()
            .cloned()
            .collect(),
    )
}

pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.news.categories())
}

pub async fn get_article(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Article>, AppError> {
    state
        .news
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found("Article not found"))
}
