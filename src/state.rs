use std::sync::Arc;

use sqlx::PgPool;
use time::Duration as TimeDuration;
use tracing::{info, warn};

use crate::ai::{GeminiClient, GenerativeClient, NutriCareAiSystem, ScriptedClient};
use crate::auth::{
    firebase::FirebaseIdentityProvider,
    local::LocalIdentityProvider,
    repo::{MemoryUserRepository, PgUserRepository, UserRepository},
    AuthStateHub, IdentityProvider,
};
use crate::catalog::DishCatalog;
use crate::config::{AppConfig, IdentityBackend};
use crate::meal_log::MealLogBook;
use crate::meal_plans::MealPlanRepo;
use crate::news::NewsFeed;
use crate::pantry::PantryRepo;
use crate::storage::{KvStore, MemoryKvStore, PgKvStore, UserStore};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    /// Present only when `DATABASE_URL` is set.
    pub db: Option<PgPool>,
    pub store: Arc<dyn KvStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub auth_events: Arc<AuthStateHub>,
    pub ai: Arc<NutriCareAiSystem>,
    pub catalog: Arc<DishCatalog>,
    pub news: Arc<NewsFeed>,
    pub meal_logs: Arc<MealLogBook>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = AppConfig::from_env()?;

        let db = match &config.database_url {
            Some(url) => Some(
                sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await?,
            ),
            None => {
                warn!("DATABASE_URL not set; user data is kept in memory and lost on restart");
                None
            }
        };

        let store: Arc<dyn KvStore> = match &db {
            Some(pool) => Arc::new(PgKvStore::new(pool.clone())),
            None => Arc::new(MemoryKvStore::new()),
        };

        let identity: Arc<dyn IdentityProvider> = match config.identity.backend {
            IdentityBackend::Firebase => {
                let key = config
                    .identity
                    .firebase_api_key
                    .clone()
                    .ok_or_else(|| anyhow::anyhow!("FIREBASE_API_KEY must be set"))?;
                Arc::new(FirebaseIdentityProvider::new(key))
            }
            IdentityBackend::Local => {
                let users: Arc<dyn UserRepository> = match &db {
                    Some(pool) => Arc::new(PgUserRepository::new(pool.clone())),
                    None => Arc::new(MemoryUserRepository::new()),
                };
                Arc::new(LocalIdentityProvider::new(
                    users,
                    config.identity.recent_login_minutes,
                ))
            }
        };
        info!(provider = identity.name(), "identity provider ready");

        let client: Option<Arc<dyn GenerativeClient>> = match &config.ai.api_key {
            Some(key) => Some(Arc::new(GeminiClient::new(key.clone(), config.ai.model.clone()))),
            None => {
                warn!("GEMINI_API_KEY not set; AI features will be limited");
                None
            }
        };

        Ok(Self::from_parts(
            config,
            db,
            store,
            identity,
            client,
            DishCatalog::bundled()?,
            NewsFeed::bundled()?,
        ))
    }

    pub fn from_parts(
        config: AppConfig,
        db: Option<PgPool>,
        store: Arc<dyn KvStore>,
        identity: Arc<dyn IdentityProvider>,
        client: Option<Arc<dyn GenerativeClient>>,
        catalog: DishCatalog,
        news: NewsFeed,
    ) -> Self {
        let ai = NutriCareAiSystem::new(client, config.ai.max_prompt_dishes);
        let auth_events = AuthStateHub::default()
            .with_session_ttl(TimeDuration::minutes(config.jwt.refresh_ttl_minutes.max(1)));
        Self {
            config: Arc::new(config),
            db,
            store,
            identity,
            auth_events: Arc::new(auth_events),
            ai: Arc::new(ai),
            catalog: Arc::new(catalog),
            news: Arc::new(news),
            meal_logs: Arc::new(MealLogBook::new()),
        }
    }

    /// Ends the provider session and drops the user's scratch meal log.
    pub async fn end_session(&self, user_id: &str) {
        self.auth_events.signed_out(user_id).await;
        self.meal_logs.clear(user_id).await;
    }

    /// Drops sessions past the refresh-token lifetime along with their meal logs.
    pub async fn sweep_expired_sessions(&self) -> usize {
        let expired = self.auth_events.sweep_expired().await;
        for uid in &expired {
            self.meal_logs.clear(uid).await;
        }
        expired.len()
    }

    pub fn user_store(&self, user_id: &str) -> UserStore {
        UserStore::new(self.store.clone(), user_id)
    }

    pub fn pantry_repo(&self, user_id: &str) -> PantryRepo {
        PantryRepo::new(self.user_store(user_id))
    }

    pub fn meal_plan_repo(&self, user_id: &str) -> MealPlanRepo {
        MealPlanRepo::new(self.user_store(user_id))
    }

    /// In-memory state with a scripted model that always answers `"scripted reply"`.
    pub fn fake() -> Self {
        Self::fake_with_ai(Some(Arc::new(ScriptedClient::new("scripted reply"))))
    }

    /// In-memory state with the given model client; `None` behaves like a missing key.
    pub fn fake_with_ai(client: Option<Arc<dyn GenerativeClient>>) -> Self {
        let config = AppConfig::for_tests();
        let identity = Arc::new(LocalIdentityProvider::new(
            Arc::new(MemoryUserRepository::new()),
            config.identity.recent_login_minutes,
        ));
        let catalog = DishCatalog::bundled().unwrap_or_else(|_| DishCatalog::new(Vec::new()));
        let news = NewsFeed::bundled().unwrap_or_else(|_| NewsFeed::new(Vec::new()));
        Self::from_parts(
            config,
            None,
            Arc::new(MemoryKvStore::new()),
            identity,
            client,
            catalog,
            news,
        )
    }
}
