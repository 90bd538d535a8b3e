use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Keys used by the per-user store. Values are JSON documents.
pub mod keys {
    pub const PANTRY_ITEMS: &str = "pantryItems";
    pub const MEAL_PLANS: &str = "mealPlans";
    /// Single-plan record written before plans became a collection.
    pub const LEGACY_SAVED_MEAL_PLAN: &str = "savedMealPlan";
    pub const MEAL_TO_LOG: &str = "mealToLog";
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage backend error: {0}")]
    Backend(#[from] sqlx::Error),

    #[error("failed to encode value for {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Key-value storage scoped by user. No transactions; last write wins.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<String>, StoreError>;
    async fn set(&self, scope: &str, key: &str, value: String) -> Result<(), StoreError>;
    async fn remove(&self, scope: &str, key: &str) -> Result<(), StoreError>;
}

#[derive(Clone)]
pub struct PgKvStore {
    db: PgPool,
}

impl PgKvStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl KvStore for PgKvStore {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query_as::<_, (String,)>(
            r#"
            SELECT value
              FROM kv_entries
             WHERE scope = $1 AND key = $2
            "#,
        )
        .bind(scope)
        .bind(key)
        .fetch_optional(&self.db)
        .await?;
        Ok(row.map(|(v,)| v))
    }

    async fn set(&self, scope: &str, key: &str, value: String) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO kv_entries (scope, key, value)
            VALUES ($1, $2, $3)
            ON CONFLICT (scope, key)
            DO UPDATE SET value = EXCLUDED.value, updated_at = now()
            "#,
        )
        .bind(scope)
        .bind(key)
        .bind(value)
        .execute(&self.db)
        .await?;
        Ok(())
    }

    async fn remove(&self, scope: &str, key: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM kv_entries WHERE scope = $1 AND key = $2")
            .bind(scope)
            .bind(key)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Process-local store. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: RwLock<HashMap<(String, String), String>>,
}

impl MemoryKvStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryKvStore {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(&(scope.to_owned(), key.to_owned())).cloned())
    }

    async fn set(&self, scope: &str, key: &str, value: String) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .insert((scope.to_owned(), key.to_owned()), value);
        Ok(())
    }

    async fn remove(&self, scope: &str, key: &str) -> Result<(), StoreError> {
        self.entries
            .write()
            .await
            .remove(&(scope.to_owned(), key.to_owned()));
        Ok(())
    }
}

/// Result of reading a JSON value that may be absent or unreadable.
#[derive(Debug)]
pub enum Stored<T> {
    Absent,
    Malformed(serde_json::Error),
    Present(T),
}

impl<T> Stored<T> {
    pub fn present(self) -> Option<T> {
        match self {
            Stored::Present(v) => Some(v),
            _ => None,
        }
    }
}

/// One user's view of the store.
#[derive(Clone)]
pub struct UserStore {
    store: Arc<dyn KvStore>,
    scope: String,
}

impl UserStore {
    pub fn new(store: Arc<dyn KvStore>, scope: impl Into<String>) -> Self {
        Self {
            store,
            scope: scope.into(),
        }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub async fn get_raw(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.store.get(&self.scope, key).await
    }

    pub async fn set_raw(&self, key: &str, value: String) -> Result<(), StoreError> {
        self.store.set(&self.scope, key, value).await
    }

    pub async fn remove(&self, key: &str) -> Result<(), StoreError> {
        debug!(scope = %self.scope, key, "store remove");
        self.store.remove(&self.scope, key).await
    }

    pub async fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Stored<T>, StoreError> {
        let Some(raw) = self.get_raw(key).await? else {
            return Ok(Stored::Absent);
        };
        match serde_json::from_str(&raw) {
            Ok(v) => Ok(Stored::Present(v)),
            Err(e) => {
                warn!(scope = %self.scope, key, error = %e, "stored value is not valid json");
                Ok(Stored::Malformed(e))
            }
        }
    }

    pub async fn save_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<(), StoreError> {
        let raw = serde_json::to_string(value).map_err(|source| StoreError::Encode {
            key: key.to_owned(),
            source,
        })?;
        debug!(scope = %self.scope, key, bytes = raw.len(), "store write");
        self.set_raw(key, raw).await
    }
}

/// Record id in the stored format: a millisecond timestamp string, bumped past any id already taken.
pub fn millis_id(taken: impl Fn(&str) -> bool) -> String {
    let mut ms = time::OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
    while taken(&ms.to_string()) {
        ms += 1;
    }
    ms.to_string()
}
