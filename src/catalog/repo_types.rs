use serde::{Deserialize, Serialize};

/// Catalog entry. Nutrition values are per reference portion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dish {
    pub id: String,
    pub name: String,
    pub category: String,
    pub region: String,
    pub vegetarian: bool,
    pub vegan: bool,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub price: f64,
    pub ingredients: Vec<String>,
    pub health_benefits: String,
}

/// Dietary filter applied before dishes are offered to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DietaryPreference {
    Vegetarian,
    Vegan,
    #[serde(other)]
    Any,
}

impl DietaryPreference {
    /// Free-form labels ("non-vegetarian", "No preference", ...) map to `Any`.
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "vegetarian" => Self::Vegetarian,
            "vegan" => Self::Vegan,
            _ => Self::Any,
        }
    }

    /// Plan-form values are matched exactly: only "vegetarian" and "vegan"
    /// narrow the list, any other casing or label means `Any`.
    pub fn from_form_value(value: &str) -> Self {
        match value {
            "vegetarian" => Self::Vegetarian,
            "vegan" => Self::Vegan,
            _ => Self::Any,
        }
    }

    pub fn allows(self, dish: &Dish) -> bool {
        match self {
            Self::Vegetarian => dish.vegetarian,
            Self::Vegan => dish.vegan,
            Self::Any => true,
        }
    }
}
