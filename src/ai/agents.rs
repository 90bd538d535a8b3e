use std::sync::Arc;

use tracing::{info, warn};

use super::client::GenerativeClient;
use super::errors::{AiError, AiResult};
use super::prompts;
use super::types::{MealEntry, NutritionProfile, UserStats};
use crate::catalog::{DietaryPreference, Dish};

/// Returned instead of an error by the nutrition expert when no credential is configured.
pub const NOT_CONFIGURED_SENTINEL: &str = "AI features require API key to be configured.";

pub type SharedClient = Option<Arc<dyn GenerativeClient>>;

fn require(client: &SharedClient) -> AiResult<&dyn GenerativeClient> {
    client.as_deref().ok_or(AiError::NotConfigured)
}

fn non_empty<'a>(value: &'a str, what: &str) -> AiResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AiError::InvalidInput(format!("{what} must not be empty")));
    }
    Ok(trimmed)
}

/// Single-prompt agent; degrades to [`NOT_CONFIGURED_SENTINEL`] without a credential.
#[derive(Clone)]
pub struct NutritionExpertAgent {
    client: SharedClient,
}

impl NutritionExpertAgent {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    pub async fn analyze(&self, query: &str, profile: Option<&NutritionProfile>) -> AiResult<String> {
        let Some(client) = self.client.as_deref() else {
            warn!("GEMINI_API_KEY not set; AI features will be limited");
            return Ok(NOT_CONFIGURED_SENTINEL.to_owned());
        };
        client
            .generate_content(&prompts::expert_query(query, profile))
            .await
    }

    pub async fn analyze_meal(&self, dish: &Dish) -> AiResult<String> {
        let Some(client) = self.client.as_deref() else {
            return Ok(NOT_CONFIGURED_SENTINEL.to_owned());
        };
        let nutrition = serde_json::json!({
            "calories": dish.calories,
            "protein": dish.protein,
            "carbs": dish.carbs,
            "fat": dish.fat,
        });
        client
            .generate_content(&prompts::expert_meal_analysis(&dish.name, &nutrition.to_string()))
            .await
    }
}

#[derive(Clone)]
pub struct MealRecommendationAgent {
    client: SharedClient,
    max_dishes: usize,
}

impl MealRecommendationAgent {
    pub fn new(client: SharedClient, max_dishes: usize) -> Self {
        Self { client, max_dishes }
    }

    /// Dishes that will be offered in the prompt: preference-filtered, then truncated.
    pub fn candidates<'a>(&self, profile: &NutritionProfile, dishes: &'a [Dish]) -> Vec<&'a Dish> {
        let pref = profile
            .dietary_preference
            .as_deref()
            .map(DietaryPreference::from_label)
            .unwrap_or(DietaryPreference::Any);
        dishes
            .iter()
            .filter(|d| pref.allows(d))
            .take(self.max_dishes)
            .collect()
    }

    pub async fn recommend_meals(&self, profile: &NutritionProfile, dishes: &[Dish]) -> AiResult<String> {
        let client = require(&self.client)?;
        let candidates = self.candidates(profile, dishes);
        info!(candidates = candidates.len(), offered = dishes.len(), "recommending meals");
        client
            .invoke(
                prompts::MEAL_RECOMMENDATION_SYSTEM,
                &prompts::recommend_meals(profile, &candidates),
            )
            .await
    }

    pub async fn suggest_alternatives(&self, dish_name: &str, reason: &str) -> AiResult<String> {
        let client = require(&self.client)?;
        let dish_name = non_empty(dish_name, "dish name")?;
        client
            .invoke(
                prompts::MEAL_RECOMMENDATION_SYSTEM,
                &prompts::suggest_alternatives(dish_name, reason),
            )
            .await
    }
}

#[derive(Clone)]
pub struct HealthMonitoringAgent {
    client: SharedClient,
}

impl HealthMonitoringAgent {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    pub async fn analyze_progress(&self, stats: &UserStats) -> AiResult<String> {
        let client = require(&self.client)?;
        client
            .invoke(prompts::HEALTH_MONITORING_SYSTEM, &prompts::analyze_progress(stats))
            .await
    }

    pub async fn flag_concerns(&self, meal_log: &[MealEntry], conditions: &[String]) -> AiResult<String> {
        let client = require(&self.client)?;
        client
            .invoke(
                prompts::HEALTH_MONITORING_SYSTEM,
                &prompts::flag_concerns(meal_log, conditions),
            )
            .await
    }
}

#[derive(Clone)]
pub struct RecipeAgent {
    client: SharedClient,
}

impl RecipeAgent {
    pub const DEFAULT_SERVINGS: u32 = 2;

    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    pub async fn get_recipe(&self, dish_name: &str, servings: Option<u32>) -> AiResult<String> {
        let client = require(&self.client)?;
        let dish_name = non_empty(dish_name, "dish name")?;
        let servings = servings.unwrap_or(Self::DEFAULT_SERVINGS);
        client
            .invoke(prompts::RECIPE_SYSTEM, &prompts::recipe(dish_name, servings))
            .await
    }

    pub async fn suggest_substitutions(&self, ingredient: &str, reason: &str) -> AiResult<String> {
        let client = require(&self.client)?;
        let ingredient = non_empty(ingredient, "ingredient")?;
        client
            .invoke(prompts::RECIPE_SYSTEM, &prompts::substitutions(ingredient, reason))
            .await
    }

    pub async fn modify_for_health_condition(&self, dish_name: &str, condition: &str) -> AiResult<String> {
        let client = require(&self.client)?;
        let dish_name = non_empty(dish_name, "dish name")?;
        client
            .invoke(
                prompts::RECIPE_SYSTEM,
                &prompts::modify_for_condition(dish_name, condition),
            )
            .await
    }
}

#[derive(Clone)]
pub struct NutritionEducationAgent {
    client: SharedClient,
}

impl NutritionEducationAgent {
    pub fn new(client: SharedClient) -> Self {
        Self { client }
    }

    pub async fn explain_concept(&self, topic: &str) -> AiResult<String> {
        let topic = non_empty(topic, "topic")?;
        let client = require(&self.client)?;
        client
            .invoke(prompts::EDUCATION_SYSTEM, &prompts::explain_concept(topic))
            .await
    }

    pub async fn debunk_myth(&self, myth: &str) -> AiResult<String> {
        let myth = non_empty(myth, "myth")?;
        let client = require(&self.client)?;
        client
            .invoke(prompts::EDUCATION_SYSTEM, &prompts::debunk_myth(myth))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::client::ScriptedClient;
    use crate::catalog::DishCatalog;

    fn scripted() -> (Arc<ScriptedClient>, SharedClient) {
        let client = Arc::new(ScriptedClient::new("answer"));
        let shared: Arc<dyn GenerativeClient> = client.clone();
        (client, Some(shared))
    }

    #[tokio::test]
    async fn expert_returns_sentinel_without_credential() {
        let agent = NutritionExpertAgent::new(None);
        let text = agent.analyze("Is rice fattening?", None).await.unwrap();
        assert_eq!(text, NOT_CONFIGURED_SENTINEL);
    }

    #[tokio::test]
    async fn chat_agents_fail_without_credential() {
        let agent = RecipeAgent::new(None);
        let err = agent.get_recipe("Poha", None).await.unwrap_err();
        assert!(matches!(err, AiError::NotConfigured));
    }

    #[tokio::test]
    async fn explain_rejects_blank_topic() {
        let (_, shared) = scripted();
        let agent = NutritionEducationAgent::new(shared);
        let err = agent.explain_concept("   ").await.unwrap_err();
        assert!(matches!(err, AiError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn recipe_defaults_to_two_servings() {
        let (client, shared) = scripted();
        RecipeAgent::new(shared).get_recipe("Dal Tadka", None).await.unwrap();
        let calls = client.calls();
        assert_eq!(calls[0].system.as_deref(), Some(prompts::RECIPE_SYSTEM));
        assert!(calls[0].input.contains("Dal Tadka (2 servings)"));
    }

    #[test]
    fn recommendation_candidates_follow_preference() {
        let catalog = DishCatalog::bundled().unwrap();
        let agent = MealRecommendationAgent::new(None, 1000);
        let cases: [(&str, fn(&Dish) -> bool); 2] =
            [("vegetarian", |d| d.vegetarian), ("vegan", |d| d.vegan)];
        for (label, check) in cases {
            let profile = NutritionProfile {
                dietary_preference: Some(label.into()),
                ..Default::default()
            };
            let picked = agent.candidates(&profile, catalog.all());
            assert!(!picked.is_empty());
            assert!(picked.iter().all(|d| check(d)), "{label} leaked a dish");
        }

        let any = agent.candidates(&NutritionProfile::default(), catalog.all());
        assert_eq!(any.len(), catalog.len());
    }

    #[test]
    fn recommendation_candidates_are_truncated() {
        let catalog = DishCatalog::bundled().unwrap();
        let agent = MealRecommendationAgent::new(None, 3);
        assert_eq!(agent.candidates(&NutritionProfile::default(), catalog.all()).len(), 3);
    }

    #[tokio::test]
    async fn flag_concerns_uses_health_system_prompt() {
        let (client, shared) = scripted();
        HealthMonitoringAgent::new(shared)
            .flag_concerns(&[], &["PCOS".into()])
            .await
            .unwrap();
        assert_eq!(
            client.calls()[0].system.as_deref(),
            Some(prompts::HEALTH_MONITORING_SYSTEM)
        );
    }
}
