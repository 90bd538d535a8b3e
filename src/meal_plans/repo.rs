use time::OffsetDateTime;
use tracing::{error, info};

use super::repo_types::{LegacySavedMealPlan, MealPlan};
use crate::storage::{keys, millis_id, StoreError, Stored, UserStore};

/// `M/D/YYYY`, the date format plans were always stored with.
pub fn display_date(at: OffsetDateTime) -> String {
    format!("{}/{}/{}", u8::from(at.month()), at.day(), at.year())
}

/// One user's plan collection plus the meal hand-off slot.
#[derive(Clone)]
pub struct MealPlanRepo {
    store: UserStore,
}

impl MealPlanRepo {
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }

    /// Reads `mealPlans`; when it is missing or unreadable, migrates the legacy single plan.
    pub async fn load(&self) -> Result<Vec<MealPlan>, StoreError> {
        match self.store.load_json::<Vec<MealPlan>>(keys::MEAL_PLANS).await? {
            Stored::Present(plans) => Ok(plans),
            Stored::Absent | Stored::Malformed(_) => self.migrate_legacy().await,
        }
    }

    async fn migrate_legacy(&self) -> Result<Vec<MealPlan>, StoreError> {
        let legacy = match self
            .store
            .load_json::<LegacySavedMealPlan>(keys::LEGACY_SAVED_MEAL_PLAN)
            .await?
        {
            Stored::Present(legacy) => legacy,
            Stored::Absent => return Ok(Vec::new()),
            Stored::Malformed(e) => {
                error!(scope = %self.store.scope(), error = %e, "legacy meal plan unreadable; not migrated");
                return Ok(Vec::new());
            }
        };

        let plan = MealPlan {
            id: millis_id(|_| false),
            name: format!("{} Plan", legacy.goal),
            generated_date: legacy
                .generated_date
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| display_date(OffsetDateTime::now_utc())),
            days: legacy.days,
            goal: legacy.goal,
            calorie_target: legacy.calorie_target,
            plan: legacy.plan,
            is_active: true,
        };
        let plans = vec![plan];
        self.save(&plans).await?;
        self.store.remove(keys::LEGACY_SAVED_MEAL_PLAN).await?;
        info!(scope = %self.store.scope(), "migrated legacy meal plan");
        Ok(plans)
    }

    pub async fn save(&self, plans: &[MealPlan]) -> Result<(), StoreError> {
        self.store.save_json(keys::MEAL_PLANS, plans).await
    }

    pub async fn set_meal_to_log(&self, meal_name: &str) -> Result<(), StoreError> {
        self.store.set_raw(keys::MEAL_TO_LOG, meal_name.to_owned()).await
    }

    /// Reads and clears the pending meal hand-off.
    pub async fn take_meal_to_log(&self) -> Result<Option<String>, StoreError> {
        let pending = self.store.get_raw(keys::MEAL_TO_LOG).await?;
        if pending.is_some() {
            self.store.remove(keys::MEAL_TO_LOG).await?;
        }
        Ok(pending)
    }
}
