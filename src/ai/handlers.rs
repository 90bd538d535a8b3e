use axum::{
    extract::{Path, State},
    routing::post,
    Json, Router,
};
use tracing::{info, instrument};

use super::dto::{
    AiTextResponse, AlternativesRequest, ConcernsRequest, ExplainRequest, ModifyRequest,
    MythRequest, ProgressRequest, QueryRequest, RecipeRequest, RecommendRequest,
    SubstitutionRequest,
};
use super::{MealEntry, QueryAnswer};
use crate::{auth::AuthUser, error::AppError, state::AppState};

pub fn ai_routes() -> Router<AppState> {
    Router::new()
        .route("/ai/query", post(process_query))
        .route("/ai/explain", post(explain_concept))
        .route("/ai/myth", post(debunk_myth))
        .route("/ai/recipe", post(get_recipe))
        .route("/ai/substitutions", post(suggest_substitutions))
        .route("/ai/modify", post(modify_for_condition))
        .route("/ai/recommend", post(recommend_meals))
        .route("/ai/alternatives", post(suggest_alternatives))
        .route("/ai/progress", post(analyze_progress))
        .route("/ai/concerns", post(flag_concerns))
        .route("/ai/dishes/:id/analysis", post(analyze_dish))
}

#[instrument(skip(state, payload))]
pub async fn process_query(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<QueryRequest>,
) -> Result<Json<QueryAnswer>, AppError> {
    let answer = state
        .ai
        .process_query(&payload.query, &payload.profile, &payload.context)
        .await?;
    info!(%user_id, route = ?answer.route, "ai query answered");
    Ok(Json(answer))
}

#[instrument(skip(state, payload))]
pub async fn explain_concept(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<ExplainRequest>,
) -> Result<Json<AiTextResponse>, AppError> {
    let text = state.ai.education_agent.explain_concept(&payload.topic).await?;
    Ok(Json(text.into()))
}

#[instrument(skip(state, payload))]
pub async fn debunk_myth(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<MythRequest>,
) -> Result<Json<AiTextResponse>, AppError> {
    let text = state.ai.education_agent.debunk_myth(&payload.myth).await?;
    Ok(Json(text.into()))
}

#[instrument(skip(state, payload))]
pub async fn get_recipe(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<RecipeRequest>,
) -> Result<Json<AiTextResponse>, AppError> {
    let text = state
        .ai
        .recipe_agent
        .get_recipe(&payload.dish_name, payload.servings)
        .await?;
    Ok(Json(text.into()))
}

#[instrument(skip(state, payload))]
pub async fn suggest_substitutions(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<SubstitutionRequest>,
) -> Result<Json<AiTextResponse>, AppError> {
    let text = state
        .ai
        .recipe_agent
        .suggest_substitutions(&payload.ingredient, &payload.reason)
        .await?;
    Ok(Json(text.into()))
}

#[instrument(skip(state, payload))]
pub async fn modify_for_condition(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<ModifyRequest>,
) -> Result<Json<AiTextResponse>, AppError> {
    let text = state
        .ai
        .recipe_agent
        .modify_for_health_condition(&payload.dish_name, &payload.condition)
        .await?;
    Ok(Json(text.into()))
}

#[instrument(skip(state, payload))]
pub async fn recommend_meals(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<RecommendRequest>,
) -> Result<Json<AiTextResponse>, AppError> {
    let text = state
        .ai
        .meal_recommender
        .recommend_meals(&payload.profile, state.catalog.all())
        .await?;
    Ok(Json(text.into()))
}

#[instrument(skip(state, payload))]
pub async fn suggest_alternatives(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<AlternativesRequest>,
) -> Result<Json<AiTextResponse>, AppError> {
    let text = state
        .ai
        .meal_recommender
        .suggest_alternatives(&payload.dish_name, &payload.reason)
        .await?;
    Ok(Json(text.into()))
}

#[instrument(skip(state, payload))]
pub async fn analyze_progress(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<ProgressRequest>,
) -> Result<Json<AiTextResponse>, AppError> {
    let text = state.ai.health_monitor.analyze_progress(&payload.stats).await?;
    Ok(Json(text.into()))
}

#[instrument(skip(state, payload))]
pub async fn flag_concerns(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<ConcernsRequest>,
) -> Result<Json<AiTextResponse>, AppError> {
    let meals = match payload.meals {
        Some(meals) => meals,
        None => state
            .meal_logs
            .entries(&user_id)
            .await
            .into_iter()
            .map(|m| MealEntry {
                name: m.dish,
                calories: m.calories,
            })
            .collect(),
    };
    let text = state
        .ai
        .health_monitor
        .flag_concerns(&meals, &payload.conditions)
        .await?;
    Ok(Json(text.into()))
}

#[instrument(skip(state))]
pub async fn analyze_dish(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<AiTextResponse>, AppError> {
    let dish = state
        .catalog
        .get(&id)
        .ok_or_else(|| AppError::not_found("Dish not found"))?;
    let text = state.ai.nutrition_expert.analyze_meal(dish).await?;
    Ok(Json(text.into()))
}
