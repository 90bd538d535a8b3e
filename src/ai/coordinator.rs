use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument};

use super::agents::{
    HealthMonitoringAgent, MealRecommendationAgent, NutritionEducationAgent, NutritionExpertAgent,
    RecipeAgent, SharedClient,
};
use super::client::GenerativeClient;
use super::errors::{AiError, AiResult};
use super::types::{NutritionProfile, QueryContext};

/// Which agent answers a free-text query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AgentRoute {
    Recipe,
    MealRecommendation,
    HealthMonitoring,
    Education,
    NutritionExpert,
}

struct RouteRule {
    keywords: &'static [&'static str],
    route: AgentRoute,
}

impl RouteRule {
    fn matches(&self, lowered_query: &str) -> bool {
        self.keywords.iter().any(|k| lowered_query.contains(k))
    }
}

/// Evaluated in order; the first rule with a matching keyword wins.
const ROUTES: &[RouteRule] = &[
    RouteRule {
        keywords: &["recipe", "how to cook", "how to make"],
        route: AgentRoute::Recipe,
    },
    RouteRule {
        keywords: &["recommend", "suggest meal", "what should i eat"],
        route: AgentRoute::MealRecommendation,
    },
    RouteRule {
        keywords: &["progress", "how am i doing", "check my"],
        route: AgentRoute::HealthMonitoring,
    },
    RouteRule {
        keywords: &["what is", "explain", "tell me about"],
        route: AgentRoute::Education,
    },
];

pub fn route_for(query: &str) -> AgentRoute {
    let lowered = query.to_lowercase();
    ROUTES
        .iter()
        .find(|rule| rule.matches(&lowered))
        .map_or(AgentRoute::NutritionExpert, |rule| rule.route)
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryAnswer {
    pub route: AgentRoute,
    pub text: String,
}

/// Holds the five agents and dispatches free-text queries to one of them.
#[derive(Clone)]
pub struct NutriCareAiSystem {
    pub nutrition_expert: NutritionExpertAgent,
    pub meal_recommender: MealRecommendationAgent,
    pub health_monitor: HealthMonitoringAgent,
    pub recipe_agent: RecipeAgent,
    pub education_agent: NutritionEducationAgent,
    client: SharedClient,
}

impl NutriCareAiSystem {
    pub fn new(client: Option<Arc<dyn GenerativeClient>>, max_prompt_dishes: usize) -> Self {
        let shared: SharedClient = client;
        Self {
            nutrition_expert: NutritionExpertAgent::new(shared.clone()),
            meal_recommender: MealRecommendationAgent::new(shared.clone(), max_prompt_dishes),
            health_monitor: HealthMonitoringAgent::new(shared.clone()),
            recipe_agent: RecipeAgent::new(shared.clone()),
            education_agent: NutritionEducationAgent::new(shared.clone()),
            client: shared,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    /// The underlying client, for flows that build their own prompt.
    pub fn client(&self) -> Option<&dyn GenerativeClient> {
        self.client.as_deref()
    }

    #[instrument(skip_all, fields(route = tracing::field::Empty))]
    pub async fn process_query(
        &self,
        query: &str,
        profile: &NutritionProfile,
        context: &QueryContext,
    ) -> AiResult<QueryAnswer> {
        let route = route_for(query);
        tracing::Span::current().record("route", tracing::field::debug(route));
        debug!(?route, "query routed");

        let text = match route {
            AgentRoute::Recipe => self.recipe_agent.get_recipe(query, context.servings).await?,
            AgentRoute::MealRecommendation => {
                self.meal_recommender
                    .recommend_meals(profile, &context.dishes)
                    .await?
            }
            AgentRoute::HealthMonitoring => {
                let stats = profile.stats.as_ref().ok_or_else(|| {
                    AiError::InvalidInput("progress questions need user stats".into())
                })?;
                self.health_monitor.analyze_progress(stats).await?
            }
            AgentRoute::Education => self.education_agent.explain_concept(query).await?,
            AgentRoute::NutritionExpert => {
                self.nutrition_expert.analyze(query, Some(profile)).await?
            }
        };
        Ok(QueryAnswer { route, text })
    }
}
