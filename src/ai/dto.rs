use serde::{Deserialize, Serialize};

use super::types::{MealEntry, NutritionProfile, QueryContext, UserStats};

#[derive(Debug, Deserialize)]
pub struct QueryRequest {
    pub query: String,
    #[serde(default)]
    pub profile: NutritionProfile,
    #[serde(default)]
    pub context: QueryContext,
}

#[derive(Debug, Deserialize)]
pub struct ExplainRequest {
    pub topic: String,
}

#[derive(Debug, Deserialize)]
pub struct MythRequest {
    pub myth: String,
}

#[derive(Debug, Deserialize)]
pub struct RecipeRequest {
    pub dish_name: String,
    pub servings: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct SubstitutionRequest {
    pub ingredient: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct ModifyRequest {
    pub dish_name: String,
    pub condition: String,
}

#[derive(Debug, Deserialize)]
pub struct AlternativesRequest {
    pub dish_name: String,
    pub reason: String,
}

#[derive(Debug, Deserialize)]
pub struct RecommendRequest {
    #[serde(default)]
    pub profile: NutritionProfile,
}

#[derive(Debug, Deserialize)]
pub struct ProgressRequest {
    pub stats: UserStats,
}

/// When `meals` is omitted the caller's logged meals are used.
#[derive(Debug, Deserialize)]
pub struct ConcernsRequest {
    pub conditions: Vec<String>,
    pub meals: Option<Vec<MealEntry>>,
}

#[derive(Debug, Serialize)]
pub struct AiTextResponse {
    pub text: String,
}

impl From<String> for AiTextResponse {
    fn from(text: String) -> Self {
        Self { text }
    }
}
