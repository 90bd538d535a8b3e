use tracing::debug;

use super::repo_types::{seed_items, PantryItem};
use crate::storage::{keys, StoreError, UserStore};

/// Loads and saves one user's pantry as a single snapshot.
#[derive(Clone)]
pub struct PantryRepo {
    store: UserStore,
}

impl PantryRepo {
    pub fn new(store: UserStore) -> Self {
        Self { store }
    }

    /// Only what the user has saved; `None` when absent or unreadable.
    pub async fn load_saved(&self) -> Result<Option<Vec<PantryItem>>, StoreError> {
        Ok(self.store.load_json(keys::PANTRY_ITEMS).await?.present())
    }

    /// Stored pantry, or the seed list when nothing readable is stored.
    pub async fn load(&self) -> Result<Vec<PantryItem>, StoreError> {
        Ok(match self.load_saved().await? {
            Some(items) => items,
            None => {
                debug!(scope = %self.store.scope(), "using seed pantry");
                seed_items()
            }
        })
    }

    pub async fn save(&self, items: &[PantryItem]) -> Result<(), StoreError> {
        self.store.save_json(keys::PANTRY_ITEMS, items).await
    }
}
