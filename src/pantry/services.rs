use tracing::info;

use super::dto::NewPantryItem;
use super::repo::PantryRepo;
use super::repo_types::PantryItem;
use crate::{catalog::repo::ALL, error::AppError, storage::millis_id};

pub fn add_item(items: &mut Vec<PantryItem>, new: NewPantryItem) -> Result<&PantryItem, AppError> {
    let name = new.name.trim();
    if name.is_empty() {
        return Err(AppError::validation("Item name is required"));
    }
    if !(new.quantity.is_finite() && new.quantity > 0.0) {
        return Err(AppError::validation("Quantity must be greater than 0"));
    }
    let id = millis_id(|id| items.iter().any(|i| i.id == id));
    items.push(PantryItem {
        id,
        name: name.to_owned(),
        category: new.category,
        quantity: new.quantity,
        unit: new.unit,
        expiry_date: new.expiry_date.filter(|d| !d.trim().is_empty()),
        low_stock: false,
    });
    Ok(&items[items.len() - 1])
}

/// Adds `delta` to the quantity, clamping at zero. `lowStock` is left as is.
pub fn update_quantity(items: &mut [PantryItem], id: &str, delta: f64) -> Option<PantryItem> {
    let item = items.iter_mut().find(|i| i.id == id)?;
    item.quantity = (item.quantity + delta).max(0.0);
    Some(item.clone())
}

pub fn remove_item(items: &mut Vec<PantryItem>, id: &str) -> bool {
    let before = items.len();
    items.retain(|i| i.id != id);
    items.len() != before
}

pub fn filter_by_category<'a>(items: &'a [PantryItem], category: &str) -> Vec<&'a PantryItem> {
    items
        .iter()
        .filter(|i| category == ALL || i.category == category)
        .collect()
}

pub fn low_stock_items(items: &[PantryItem]) -> Vec<&PantryItem> {
    items.iter().filter(|i| i.low_stock).collect()
}

pub fn item_names(items: &[PantryItem]) -> Vec<String> {
    items.iter().map(|i| i.name.clone()).collect()
}

/// Pantry operations for one user; every mutation rewrites the whole collection.
pub struct PantryService {
    repo: PantryRepo,
}

impl PantryService {
    pub fn new(repo: PantryRepo) -> Self {
        Self { repo }
    }

    pub async fn list(&self, category: Option<&str>) -> Result<Vec<PantryItem>, AppError> {
        let items = self.repo.load().await?;
        Ok(filter_by_category(&items, category.unwrap_or(ALL))
            .into_iter()
            .cloned()
            .collect())
    }

    pub async fn low_stock(&self) -> Result<Vec<PantryItem>, AppError> {
        let items = self.repo.load().await?;
        Ok(low_stock_items(&items).into_iter().cloned().collect())
    }

    /// Names from the saved pantry only; the seed list is never offered to plan generation.
    pub async fn saved_item_names(&self) -> Result<Vec<String>, AppError> {
        Ok(self
            .repo
            .load_saved()
            .await?
            .map(|items| item_names(&items))
            .unwrap_or_default())
    }

    pub async fn add(&self, new: NewPantryItem) -> Result<PantryItem, AppError> {
        let mut items = self.repo.load().await?;
        let added = add_item(&mut items, new)?.clone();
        self.repo.save(&items).await?;
        info!(item_id = %added.id, name = %added.name, "pantry item added");
        Ok(added)
    }

    pub async fn update_quantity(&self, id: &str, delta: f64) -> Result<PantryItem, AppError> {
        if !delta.is_finite() {
            return Err(AppError::validation("Quantity change must be a number"));
        }
        let mut items = self.repo.load().await?;
        let updated = update_quantity(&mut items, id, delta)
            .ok_or_else(|| AppError::not_found("Pantry item not found"))?;
        self.repo.save(&items).await?;
        Ok(updated)
    }

    pub async fn remove(&self, id: &str) -> Result<(), AppError> {
        let mut items = self.repo.load().await?;
        if !remove_item(&mut items, id) {
            return Err(AppError::not_found("Pantry item not found"));
        }
        self.repo.save(&items).await?;
        info!(item_id = %id, "pantry item removed");
        Ok(())
    }
}
