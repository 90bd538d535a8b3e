use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{dto::DishQuery, repo_types::Dish};
use crate::{error::AppError, state::AppState};

pub fn dish_routes() -> Router<AppState> {
    Router::new()
        .route("/dishes", get(list_dishes))
        .route("/dishes/categories", get(list_categories))
        .route("/dishes/regions", get(list_regions))
        .route("/dishes/:id", get(get_dish))
}

#[instrument(skip(state))]
pub async fn list_dishes(
    State(state): State<AppState>,
    Query(q): Query<DishQuery>,
) -> Json<Vec<Dish>> {
    Json(state.catalog.search(&q).into_iter().cloned().collect())
}

pub async fn list_categories(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.categories())
}

pub async fn list_regions(State(state): State<AppState>) -> Json<Vec<String>> {
    Json(state.catalog.regions())
}

#[instrument(skip(state))]
pub async fn get_dish(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Dish>, AppError> {
    state
        .catalog
        .get(&id)
        .cloned()
        .map(Json)
        .ok_or_else(|| AppError::not_found("Dish not found"))
}
