use serde::{Deserialize, Serialize};

use super::repo_types::{MealLog, MealTotals, MealType};
use crate::catalog::Dish;

fn default_portion() -> f64 {
    1.0
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMealRequest {
    pub dish_id: String,
    pub meal_type: MealType,
    #[serde(default = "default_portion")]
    pub portion: f64,
}

#[derive(Debug, Serialize)]
pub struct MealLogResponse {
    pub entries: Vec<MealLog>,
    pub totals: MealTotals,
}

/// Meal handed over from a plan, matched against the catalog when possible.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingMeal {
    pub meal_name: Option<String>,
    pub dish: Option<Dish>,
}
