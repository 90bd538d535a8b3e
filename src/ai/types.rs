use serde::{Deserialize, Serialize};

use crate::catalog::Dish;

/// What the caller knows about the user when asking the agents.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NutritionProfile {
    pub age: Option<u32>,
    pub goal: Option<String>,
    pub calorie_goal: Option<f64>,
    pub dietary_preference: Option<String>,
    pub budget: Option<String>,
    pub conditions: Option<String>,
    pub stats: Option<UserStats>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub calories_consumed: f64,
    pub calorie_goal: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    #[serde(default)]
    pub fiber: f64,
    #[serde(default)]
    pub recent_meals: Vec<String>,
    pub goal: String,
}

/// A meal as fed to the concern check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealEntry {
    pub name: String,
    pub calories: f64,
}

/// Extra inputs for coordinator routes that need them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QueryContext {
    pub servings: Option<u32>,
    #[serde(default)]
    pub dishes: Vec<Dish>,
}
