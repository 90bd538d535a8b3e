use serde::{Deserialize, Serialize};

/// A generated plan as kept in the user's plan collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MealPlan {
    pub id: String,
    pub name: String,
    pub generated_date: String,
    pub days: String,
    pub goal: String,
    pub calorie_target: String,
    /// Model output, stored verbatim.
    pub plan: String,
    #[serde(default)]
    pub is_active: bool,
}

/// Single-plan record written before plans became a collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LegacySavedMealPlan {
    pub generated_date: Option<String>,
    pub days: String,
    pub goal: String,
    pub calorie_target: String,
    pub plan: String,
}
