use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub mod events;
pub mod firebase;
pub mod handlers;
pub mod jwt;
pub mod local;
pub mod password;
pub mod provider;
pub mod repo;
pub mod repo_types;

pub use events::{AuthEvent, AuthStateHub, AuthSubscription};
pub use jwt::{AuthUser, JwtKeys};
pub use provider::{AuthError, AuthErrorCode, AuthFlow, IdentityProvider, ProviderSession, UserProfile};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::me_routes())
}
