use std::collections::HashMap;

use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use super::repo_types::{MealLog, MealTotals, MealType};
use crate::{catalog::Dish, error::AppError};

/// Per-user meal logs for the lifetime of the process. Nothing is persisted.
#[derive(Default)]
pub struct MealLogBook {
    logs: RwLock<HashMap<String, Vec<MealLog>>>,
}

impl MealLogBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn log_meal(
        &self,
        user_id: &str,
        dish: &Dish,
        meal_type: MealType,
        portion: f64,
    ) -> Result<MealLog, AppError> {
        if !(portion.is_finite() && portion > 0.0) {
            return Err(AppError::validation("Portion must be greater than 0"));
        }
        let entry = MealLog {
            id: Uuid::new_v4().to_string(),
            dish: dish.name.clone(),
            meal_type,
            portion,
            calories: dish.calories * portion,
            protein: dish.protein * portion,
            carbs: dish.carbs * portion,
            fat: dish.fat * portion,
            timestamp: OffsetDateTime::now_utc(),
        };
        self.logs
            .write()
            .await
            .entry(user_id.to_owned())
            .or_default()
            .push(entry.clone());
        info!(%user_id, dish = %entry.dish, ?meal_type, portion, "meal logged");
        Ok(entry)
    }

    pub async fn entries(&self, user_id: &str) -> Vec<MealLog> {
        self.logs
            .read()
            .await
            .get(user_id)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn totals(&self, user_id: &str) -> MealTotals {
        totals(&self.entries(user_id).await)
    }

    pub async fn clear(&self, user_id: &str) {
        self.logs.write().await.remove(user_id);
    }
}

pub fn totals(entries: &[MealLog]) -> MealTotals {
    entries.iter().fold(
        MealTotals {
            meals: entries.len(),
            ..MealTotals::default()
        },
        |acc, e| MealTotals {
            calories: acc.calories + e.calories,
            protein: acc.protein + e.protein,
            carbs: acc.carbs + e.carbs,
            fat: acc.fat + e.fat,
            ..acc
        },
    )
}
