use serde::Deserialize;

fn default_goal() -> String {
    "weight-loss".into()
}

fn default_calorie_target() -> String {
    "1800".into()
}

fn default_preference() -> String {
    "vegetarian".into()
}

fn default_budget() -> String {
    "moderate".into()
}

fn default_days() -> String {
    "7".into()
}

/// Generation form. Values are kept as the strings the plan records store.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanRequest {
    #[serde(default = "default_goal")]
    pub goal: String,
    #[serde(default = "default_calorie_target")]
    pub calorie_target: String,
    #[serde(default = "default_preference")]
    pub dietary_preference: String,
    #[serde(default = "default_budget")]
    pub budget: String,
    #[serde(default = "default_days")]
    pub days: String,
}

impl Default for GeneratePlanRequest {
    fn default() -> Self {
        Self {
            goal: default_goal(),
            calorie_target: default_calorie_target(),
            dietary_preference: default_preference(),
            budget: default_budget(),
            days: default_days(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct EditPlanRequest {
    pub name: Option<String>,
    pub plan: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogMealRequest {
    pub meal_name: String,
}
