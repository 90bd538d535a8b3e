// Prompt templates for the nutrition agents.
//
// Each agent has one fixed system prompt; the functions below fill in the
// per-call user message.

use super::types::{MealEntry, NutritionProfile, UserStats};
use crate::catalog::Dish;

pub const NUTRITION_EXPERT_SYSTEM: &str = "You are a certified nutritionist specializing in Indian cuisine. \
You provide evidence-based dietary guidance tailored to Indian dietary patterns. \
Consider regional variations, traditional cooking methods, and common health conditions in India. \
Always provide practical, culturally-appropriate advice.";

pub const MEAL_RECOMMENDATION_SYSTEM: &str = "You are an AI meal planner specializing in Indian cuisine. \
You recommend dishes based on user preferences, health goals, dietary restrictions, and budget. \
Consider macronutrient balance, meal timing, and traditional Indian eating patterns. \
Always suggest authentic Indian dishes with regional variety.";

pub const HEALTH_MONITORING_SYSTEM: &str = "You are a health monitoring AI assistant focused on Indian dietary patterns. \
You track nutritional intake, identify deficiencies, and flag potential health concerns. \
You understand common health conditions in India like diabetes, hypertension, and PCOS. \
Provide actionable insights and early warnings based on dietary data.";

pub const RECIPE_SYSTEM: &str = "You are an Indian cooking expert and recipe advisor. \
You provide detailed cooking instructions, ingredient substitutions, and cooking tips. \
You understand regional cooking techniques and can adapt recipes for different skill levels. \
You also suggest healthier cooking methods while maintaining authentic flavors.";

pub const EDUCATION_SYSTEM: &str = "You are a nutrition educator specializing in Indian dietary concepts. \
You explain nutritional science in simple terms relevant to Indian food culture. \
You debunk common myths and provide evidence-based information. \
You make complex nutritional concepts easy to understand for everyday Indians.";

const NOT_SPECIFIED: &str = "Not specified";

fn or_default<'a>(value: Option<&'a str>, default: &'a str) -> &'a str {
    value.filter(|v| !v.trim().is_empty()).unwrap_or(default)
}

pub fn expert_query(query: &str, profile: Option<&NutritionProfile>) -> String {
    let context = profile
        .map(|p| {
            format!(
                "User Profile: Age {}, Goal: {}, Health Conditions: {}",
                p.age.map_or_else(|| NOT_SPECIFIED.to_owned(), |a| a.to_string()),
                or_default(p.goal.as_deref(), NOT_SPECIFIED),
                or_default(p.conditions.as_deref(), "None"),
            )
        })
        .unwrap_or_default();
    format!("{NUTRITION_EXPERT_SYSTEM}\n\n{context}\n\nQuery: {query}")
}

pub fn expert_meal_analysis(dish_name: &str, nutrition_json: &str) -> String {
    format!(
        "{NUTRITION_EXPERT_SYSTEM}\n\nAnalyze this Indian dish: {dish_name}\n\
         Nutritional Info: {nutrition_json}\n\n\
         Provide:\n\
         1. Health benefits\n\
         2. Potential concerns\n\
         3. Who should/shouldn't eat this\n\
         4. Serving size recommendations"
    )
}

pub fn recommend_meals(profile: &NutritionProfile, dishes: &[&Dish]) -> String {
    let dish_list = dishes
        .iter()
        .map(|d| format!("{} ({} cal, ₹{})", d.name, d.calories, d.price))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "User Profile:\n\
         - Goal: {}\n\
         - Calorie Target: {}\n\
         - Dietary Preference: {}\n\
         - Budget: {}\n\
         - Health Conditions: {}\n\n\
         Available Dishes: {dish_list}\n\n\
         Recommend a balanced daily meal plan (breakfast, lunch, dinner) with variety and nutritional balance.",
        or_default(profile.goal.as_deref(), NOT_SPECIFIED),
        profile
            .calorie_goal
            .map_or_else(|| NOT_SPECIFIED.to_owned(), |c| c.to_string()),
        or_default(profile.dietary_preference.as_deref(), "No preference"),
        or_default(profile.budget.as_deref(), "Moderate"),
        or_default(profile.conditions.as_deref(), "None"),
    )
}

pub fn suggest_alternatives(dish_name: &str, reason: &str) -> String {
    format!(
        "The user wants an alternative to {dish_name} because: {reason}\n\
         Suggest 3 similar Indian dishes that address their concern while maintaining similar taste profile or regional origin."
    )
}

pub fn analyze_progress(stats: &UserStats) -> String {
    format!(
        "Analyze this user's nutritional progress:\n\n\
         Daily Stats:\n\
         - Calories Consumed: {}/{}\n\
         - Protein: {}g\n\
         - Carbs: {}g\n\
         - Fat: {}g\n\
         - Fiber: {}g\n\n\
         Recent Meals: {}\n\
         Goal: {}\n\n\
         Provide:\n\
         1. Progress assessment\n\
         2. Nutritional gaps\n\
         3. Recommendations for next meal\n\
         4. Any health concerns",
        stats.calories_consumed,
        stats.calorie_goal,
        stats.protein,
        stats.carbs,
        stats.fat,
        stats.fiber,
        stats.recent_meals.join(", "),
        stats.goal,
    )
}

pub fn flag_concerns(meal_log: &[MealEntry], conditions: &[String]) -> String {
    let meals = meal_log
        .iter()
        .map(|m| format!("{} - {} cal", m.name, m.calories))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "User has these health conditions: {}\n\n\
         Recent meals consumed: {meals}\n\n\
         Are there any dietary concerns or conflicts with their health conditions?",
        conditions.join(", ")
    )
}

pub fn recipe(dish_name: &str, servings: u32) -> String {
    format!(
        "Provide a detailed recipe for {dish_name} ({servings} servings).\n\
         Include:\n\
         1. Ingredients with exact measurements\n\
         2. Step-by-step cooking instructions\n\
         3. Cooking time and difficulty\n\
         4. Tips for better taste\n\
         5. Healthier alternatives if applicable"
    )
}

pub fn substitutions(ingredient: &str, reason: &str) -> String {
    format!(
        "Suggest Indian pantry substitutes for {ingredient} because: {reason}\n\
         Provide options that maintain authentic flavor and are commonly available in India."
    )
}

pub fn modify_for_condition(dish_name: &str, condition: &str) -> String {
    format!(
        "How can I modify {dish_name} to make it suitable for someone with {condition}?\n\
         Provide specific ingredient swaps and cooking method changes while maintaining authenticity."
    )
}

pub fn explain_concept(concept: &str) -> String {
    format!(
        "Explain \"{concept}\" in the context of Indian cuisine and dietary patterns.\n\
         Use simple language and Indian food examples.\n\
         Include practical tips for application in daily life."
    )
}

pub fn debunk_myth(myth: &str) -> String {
    format!(
        "Address this common Indian dietary myth: \"{myth}\"\n\
         Provide scientific facts and practical guidance."
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expert_prompt_without_profile_has_no_profile_line() {
        let p = expert_query("Is ghee healthy?", None);
        assert!(p.starts_with(NUTRITION_EXPERT_SYSTEM));
        assert!(!p.contains("User Profile"));
        assert!(p.ends_with("Query: Is ghee healthy?"));
    }

    #[test]
    fn expert_prompt_defaults_missing_conditions_to_none() {
        let profile = NutritionProfile {
            age: Some(32),
            goal: Some("Weight Loss".into()),
            ..Default::default()
        };
        let p = expert_query("q", Some(&profile));
        assert!(p.contains("User Profile: Age 32, Goal: Weight Loss, Health Conditions: None"));
    }

    #[test]
    fn recommendation_prompt_applies_defaults() {
        let p = recommend_meals(&NutritionProfile::default(), &[]);
        assert!(p.contains("Dietary Preference: No preference"));
        assert!(p.contains("Budget: Moderate"));
        assert!(p.contains("Health Conditions: None"));
    }

    #[test]
    fn concern_prompt_lists_meals_with_calories() {
        let meals = vec![MealEntry {
            name: "Gulab Jamun".into(),
            calories: 300.0,
        }];
        let p = flag_concerns(&meals, &["diabetes".into(), "hypertension".into()]);
        assert!(p.contains("User has these health conditions: diabetes, hypertension"));
        assert!(p.contains("Gulab Jamun - 300 cal"));
    }
}
