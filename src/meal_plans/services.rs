use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use super::dto::GeneratePlanRequest;
use super::repo::{display_date, MealPlanRepo};
use super::repo_types::MealPlan;
use crate::{
    ai::NutriCareAiSystem,
    catalog::{DietaryPreference, Dish, DishCatalog},
    error::AppError,
    storage::millis_id,
};

pub const MISSING_KEY_MESSAGE: &str = "Error: Gemini API key not configured";
pub const GENERATION_FAILED_MESSAGE: &str = "Error generating meal plan. Please try again.";

/// `weight-loss` becomes `Weight loss Plan`: first letter upper-cased, first `-` replaced.
pub fn plan_name(goal: &str) -> String {
    let mut chars = goal.chars();
    let head = chars
        .next()
        .map(|c| c.to_uppercase().collect::<String>())
        .unwrap_or_default();
    format!("{head}{} Plan", chars.as_str().replacen('-', " ", 1))
}

pub fn dish_line(d: &Dish) -> String {
    let ingredients = d.ingredients.iter().take(3).cloned().collect::<Vec<_>>().join(", ");
    format!(
        "{} ({} cal, ₹{}, {}, {}g protein, Ingredients: {ingredients})",
        d.name, d.calories, d.price, d.region, d.protein
    )
}

/// Dishes offered to the model for the chosen preference, at most `max` of them.
/// The preference is the raw form value and is case-sensitive, unlike
/// `DietaryPreference::from_label` used for the dish search.
pub fn candidate_dishes<'a>(catalog: &'a DishCatalog, preference: &str, max: usize) -> Vec<&'a Dish> {
    let mut dishes = catalog.filter_by_preference(DietaryPreference::from_form_value(preference));
    dishes.truncate(max);
    dishes
}

pub fn generation_prompt(form: &GeneratePlanRequest, dishes: &[&Dish], pantry: &[String]) -> String {
    let GeneratePlanRequest {
        goal,
        calorie_target,
        dietary_preference,
        budget,
        days,
    } = form;
    let dish_list = dishes.iter().map(|d| dish_line(d)).collect::<Vec<_>>().join("\n");
    let pantry_info = if pantry.is_empty() {
        String::new()
    } else {
        format!(
            "\n\nUser's Pantry Items: {}\nPrioritize dishes that use these pantry items when possible.",
            pantry.join(", ")
        )
    };
    format!(
        "You are a nutrition expert specializing in Indian cuisine. Create a detailed {days}-day meal plan.

**User Requirements:**
- Goal: {goal}
- Daily Calorie Target: {calorie_target} calories
- Dietary Preference: {dietary_preference}
- Budget: {budget}{pantry_info}

**Available Dishes (USE ONLY THESE):**
{dish_list}

**Instructions:**
1. Create a {days}-day plan with breakfast, lunch, and dinner
2. Each day should total approximately {calorie_target} calories (±100)
3. Use ONLY dishes from the available list above
4. Provide variety - don't repeat the same dish on consecutive days
5. Balance macronutrients appropriately for the goal
6. Consider the budget constraint
7. If pantry items are provided, try to use dishes containing those ingredients

**Format (IMPORTANT - Follow this EXACT format):**

**Day 1**
- **Breakfast:** [Exact Dish Name from list] - [Calories] cal
- **Lunch:** [Exact Dish Name from list] - [Calories] cal
- **Dinner:** [Exact Dish Name from list] - [Calories] cal
- **Total:** [Sum] cal

**Day 2**
[Same format...]

[Continue for all {days} days]

**Nutritional Tips:**
[2-3 specific tips based on the goal]

**Key Ingredients to Buy:**
[List main ingredients needed, highlighting items from user's pantry if applicable]"
    )
}

/// Appends a plan; it becomes active only when it is the first one.
pub fn append_plan(plans: &mut Vec<MealPlan>, form: &GeneratePlanRequest, text: String, now: OffsetDateTime) -> MealPlan {
    let plan = MealPlan {
        id: millis_id(|id| plans.iter().any(|p| p.id == id)),
        name: plan_name(&form.goal),
        generated_date: display_date(now),
        days: form.days.clone(),
        goal: form.goal.clone(),
        calorie_target: form.calorie_target.clone(),
        plan: text,
        is_active: plans.is_empty(),
    };
    plans.push(plan.clone());
    plan
}

/// Marks exactly the plan with `id` active. Returns false when no plan has that id.
pub fn set_active(plans: &mut [MealPlan], id: &str) -> bool {
    let found = plans.iter().any(|p| p.id == id);
    if found {
        for p in plans.iter_mut() {
            p.is_active = p.id == id;
        }
    }
    found
}

pub fn edit(plans: &mut [MealPlan], id: &str, name: Option<String>, content: Option<String>) -> Option<MealPlan> {
    let plan = plans.iter_mut().find(|p| p.id == id)?;
    if let Some(name) = name {
        plan.name = name;
    }
    if let Some(content) = content {
        plan.plan = content;
    }
    Some(plan.clone())
}

pub fn active(plans: &[MealPlan]) -> Option<&MealPlan> {
    plans.iter().find(|p| p.is_active)
}

/// Plan collection operations for one user.
pub struct MealPlanService {
    repo: MealPlanRepo,
}

impl MealPlanService {
    pub fn new(repo: MealPlanRepo) -> Self {
        Self { repo }
    }

    pub async fn list(&self) -> Result<Vec<MealPlan>, AppError> {
        Ok(self.repo.load().await?)
    }

    pub async fn get(&self, id: &str) -> Result<MealPlan, AppError> {
        self.repo
            .load()
            .await?
            .into_iter()
            .find(|p| p.id == id)
            .ok_or_else(|| AppError::not_found("Meal plan not found"))
    }

    pub async fn active_plan(&self) -> Result<Option<MealPlan>, AppError> {
        Ok(active(&self.repo.load().await?).cloned())
    }

    /// Fills the prompt, calls the model once and stores the reply. Nothing is stored on failure.
    #[instrument(skip_all, fields(goal = %form.goal, days = %form.days))]
    pub async fn generate(
        &self,
        ai: &NutriCareAiSystem,
        catalog: &DishCatalog,
        form: &GeneratePlanRequest,
        pantry: &[String],
        max_dishes: usize,
    ) -> Result<MealPlan, AppError> {
        let Some(client) = ai.client() else {
            warn!("meal plan requested without a Gemini key");
            return Err(AppError::Configuration(MISSING_KEY_MESSAGE.into()));
        };
        let dishes = candidate_dishes(catalog, &form.dietary_preference, max_dishes);
        let prompt = generation_prompt(form, &dishes, pantry);

        let text = client.generate_content(&prompt).await.map_err(|e| {
            error!(error = %e, "meal plan generation failed");
            AppError::Upstream(GENERATION_FAILED_MESSAGE.into())
        })?;

        let mut plans = self.repo.load().await?;
        let plan = append_plan(&mut plans, form, text, OffsetDateTime::now_utc());
        self.repo.save(&plans).await?;
        info!(plan_id = %plan.id, dishes = dishes.len(), pantry = pantry.len(), "meal plan generated");
        Ok(plan)
    }

    pub async fn set_active_plan(&self, id: &str) -> Result<Vec<MealPlan>, AppError> {
        let mut plans = self.repo.load().await?;
        if !set_active(&mut plans, id) {
            return Err(AppError::not_found("Meal plan not found"));
        }
        self.repo.save(&plans).await?;
        Ok(plans)
    }

    pub async fn delete_plan(&self, id: &str) -> Result<(), AppError> {
        let mut plans = self.repo.load().await?;
        let before = plans.len();
        plans.retain(|p| p.id != id);
        if plans.len() == before {
            return Err(AppError::not_found("Meal plan not found"));
        }
        self.repo.save(&plans).await?;
        info!(plan_id = %id, "meal plan deleted");
        Ok(())
    }

    pub async fn edit_plan(&self, id: &str, name: Option<String>, content: Option<String>) -> Result<MealPlan, AppError> {
        if name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::validation("Plan name must not be empty"));
        }
        let mut plans = self.repo.load().await?;
        let updated = edit(&mut plans, id, name, content)
            .ok_or_else(|| AppError::not_found("Meal plan not found"))?;
        self.repo.save(&plans).await?;
        Ok(updated)
    }

    pub async fn log_meal_from_plan(&self, meal_name: &str) -> Result<(), AppError> {
        let meal_name = meal_name.trim();
        if meal_name.is_empty() {
            return Err(AppError::validation("Meal name is required"));
        }
        Ok(self.repo.set_meal_to_log(meal_name).await?)
    }

    pub async fn take_meal_to_log(&self) -> Result<Option<String>, AppError> {
        Ok(self.repo.take_meal_to_log().await?)
    }
}
