use serde::Serialize;

use crate::meal_plans::MealPlan;

pub const DEFAULT_AGE: u32 = 32;
pub const DEFAULT_GOAL: &str = "Weight Loss";
pub const DEFAULT_CALORIE_GOAL: f64 = 1800.0;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub name: String,
    pub email: String,
    pub age: u32,
    pub goal: String,
    pub calorie_goal: f64,
    pub calories_consumed: f64,
    pub meals_logged: usize,
    pub active_plan: Option<MealPlan>,
    pub low_stock_count: usize,
}
