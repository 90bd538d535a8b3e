use std::collections::HashSet;

use anyhow::Context;

use super::dto::DishQuery;
use super::repo_types::{DietaryPreference, Dish};

const BUNDLED_DISHES: &str = include_str!("../../data/indian-dishes.json");

/// Selector value that matches every category or region.
pub const ALL: &str = "All";

/// Read-only dish list, loaded once at start.
#[derive(Debug, Clone)]
pub struct DishCatalog {
    dishes: Vec<Dish>,
}

impl DishCatalog {
    pub fn bundled() -> anyhow::Result<Self> {
        Self::from_json(BUNDLED_DISHES).context("parse bundled dish catalog")
    }

    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        Ok(Self::new(serde_json::from_str(raw)?))
    }

    pub fn new(dishes: Vec<Dish>) -> Self {
        Self { dishes }
    }

    pub fn all(&self) -> &[Dish] {
        &self.dishes
    }

    pub fn len(&self) -> usize {
        self.dishes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dishes.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Dish> {
        self.dishes.iter().find(|d| d.id == id)
    }

    pub fn find_by_name(&self, name: &str) -> Option<&Dish> {
        let needle = name.trim().to_lowercase();
        self.dishes.iter().find(|d| d.name.to_lowercase() == needle)
    }

    pub fn filter_by_preference(&self, pref: DietaryPreference) -> Vec<&Dish> {
        self.dishes.iter().filter(|d| pref.allows(d)).collect()
    }

    /// Explorer search: name or ingredient substring, plus category/region/vegetarian filters.
    pub fn search(&self, q: &DishQuery) -> Vec<&Dish> {
        let needle = q.search.as_deref().unwrap_or("").to_lowercase();
        let category = q.category.as_deref().unwrap_or(ALL);
        let region = q.region.as_deref().unwrap_or(ALL);

        self.dishes
            .iter()
            .filter(|d| {
                d.name.to_lowercase().contains(&needle)
                    || d.ingredients.iter().any(|i| i.to_lowercase().contains(&needle))
            })
            .filter(|d| category == ALL || d.category == category)
            .filter(|d| region == ALL || d.region == region)
            .filter(|d| !q.vegetarian_only || d.vegetarian)
            .collect()
    }

    pub fn categories(&self) -> Vec<String> {
        Self::distinct_with_all(self.dishes.iter().map(|d| d.category.as_str()))
    }

    pub fn regions(&self) -> Vec<String> {
        Self::distinct_with_all(self.dishes.iter().map(|d| d.region.as_str()))
    }

    fn distinct_with_all<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = vec![ALL.to_string()];
        for v in values {
            if seen.insert(v) {
                out.push(v.to_string());
            }
        }
        out
    }
}
