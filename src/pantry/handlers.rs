use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, patch},
    Json, Router,
};
use tracing::instrument;

use super::dto::{NewPantryItem, PantryQuery, QuantityChange};
use super::repo_types::{PantryItem, CATEGORIES};
use super::PantryService;
use crate::{auth::AuthUser, error::AppError, state::AppState};

pub fn pantry_routes() -> Router<AppState> {
    Router::new()
        .route("/pantry", get(list_items).post(add_item))
        .route("/pantry/categories", get(list_categories))
        .route("/pantry/low-stock", get(low_stock))
        .route("/pantry/:id", delete(remove_item))
        .route("/pantry/:id/quantity", patch(update_quantity))
}

fn service(state: &AppState, user_id: &str) -> PantryService {
    PantryService::new(state.pantry_repo(user_id))
}

#[instrument(skip(state))]
pub async fn list_items(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(q): Query<PantryQuery>,
) -> Result<Json<Vec<PantryItem>>, AppError> {
    Ok(Json(service(&state, &user_id).list(q.category.as_deref()).await?))
}

pub async fn list_categories() -> Json<Vec<&'static str>> {
    Json(CATEGORIES.to_vec())
}

#[instrument(skip(state))]
pub async fn low_stock(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<PantryItem>>, AppError> {
    Ok(Json(service(&state, &user_id).low_stock().await?))
}

#[instrument(skip(state, payload))]
pub async fn add_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<NewPantryItem>,
) -> Result<(StatusCode, Json<PantryItem>), AppError> {
    let item = service(&state, &user_id).add(payload).await?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[instrument(skip(state))]
pub async fn update_quantity(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<QuantityChange>,
) -> Result<Json<PantryItem>, AppError> {
    Ok(Json(
        service(&state, &user_id)
            .update_quantity(&id, payload.delta)
            .await?,
    ))
}

#[instrument(skip(state))]
pub async fn remove_item(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    service(&state, &user_id).remove(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
