use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Gemini credential. Without it AI features degrade instead of failing start-up.
    pub api_key: Option<String>,
    pub model: String,
    /// Upper bound on dishes serialized into one prompt.
    pub max_prompt_dishes: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IdentityBackend {
    Local,
    Firebase,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    pub backend: IdentityBackend,
    pub firebase_api_key: Option<String>,
    pub recent_login_minutes: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// When unset, records live in process memory.
    pub database_url: Option<String>,
    pub jwt: JwtConfig,
    pub ai: AiConfig,
    pub identity: IdentityConfig,
}

pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_MAX_PROMPT_DISHES: usize = 60;

fn env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<T>().ok())
        .unwrap_or(default)
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env_non_empty("DATABASE_URL");
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "nutricare".into()),
            audience: std::env::var("JWT_AUDIENCE").unwrap_or_else(|_| "nutricare-users".into()),
            ttl_minutes: env_parse("JWT_TTL_MINUTES", 60),
            refresh_ttl_minutes: env_parse("JWT_REFRESH_TTL_MINUTES", 60 * 24 * 14),
        };
        let ai = AiConfig {
            api_key: env_non_empty("GEMINI_API_KEY"),
            model: std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.into()),
            max_prompt_dishes: env_parse("AI_MAX_PROMPT_DISHES", DEFAULT_MAX_PROMPT_DISHES),
        };
        let backend = match std::env::var("IDENTITY_PROVIDER")
            .unwrap_or_else(|_| "local".into())
            .to_lowercase()
            .as_str()
        {
            "local" => IdentityBackend::Local,
            "firebase" => IdentityBackend::Firebase,
            other => anyhow::bail!("unknown IDENTITY_PROVIDER: {other}"),
        };
        let identity = IdentityConfig {
            backend,
            firebase_api_key: env_non_empty("FIREBASE_API_KEY"),
            recent_login_minutes: env_parse("RECENT_LOGIN_MINUTES", 5),
        };
        if backend == IdentityBackend::Firebase && identity.firebase_api_key.is_none() {
            anyhow::bail!("IDENTITY_PROVIDER=firebase requires FIREBASE_API_KEY");
        }
        Ok(Self {
            database_url,
            jwt,
            ai,
            identity,
        })
    }

    /// Settings used by tests and `AppState::fake`.
    pub fn for_tests() -> Self {
        Self {
            database_url: None,
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                refresh_ttl_minutes: 60,
            },
            ai: AiConfig {
                api_key: None,
                model: DEFAULT_GEMINI_MODEL.into(),
                max_prompt_dishes: DEFAULT_MAX_PROMPT_DISHES,
            },
            identity: IdentityConfig {
                backend: IdentityBackend::Local,
                firebase_api_key: None,
                recent_login_minutes: 5,
            },
        }
    }
}
