// Prompt-routing layer over the hosted generative model.
//
// Five narrow agents, each a fixed system prompt bound to one call, plus a
// keyword coordinator that picks one of them for a free-text query.

pub mod agents;
pub mod client;
pub mod coordinator;
pub mod dto;
pub mod errors;
pub mod handlers;
pub mod prompts;
pub mod types;

use crate::state::AppState;
use axum::Router;

pub use client::{GeminiClient, GenerativeClient, ScriptedClient};
pub use coordinator::{route_for, AgentRoute, NutriCareAiSystem, QueryAnswer};
pub use errors::{AiError, AiResult};
pub use types::{MealEntry, NutritionProfile, QueryContext, UserStats};

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::ai_routes())
}
