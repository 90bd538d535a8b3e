use std::sync::Arc;

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration as TimeDuration, OffsetDateTime};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::password::{check_password, hash_password};
use super::provider::{
    AuthError, AuthErrorCode, AuthResult, FederatedCredential, IdentityProvider, ProviderSession,
    UserProfile,
};
use super::repo::{DuplicateEmail, UserRepository};

/// Shortest password the local provider accepts.
pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

fn internal(e: anyhow::Error) -> AuthError {
    error!(error = %e, "local identity backend failure");
    AuthError::with_message(AuthErrorCode::Internal, e.to_string())
}

/// Accounts stored in our own users table, raising the same codes as the hosted provider.
pub struct LocalIdentityProvider {
    users: Arc<dyn UserRepository>,
    recent_login_window: TimeDuration,
}

impl LocalIdentityProvider {
    pub fn new(users: Arc<dyn UserRepository>, recent_login_minutes: i64) -> Self {
        Self {
            users,
            recent_login_window: TimeDuration::minutes(recent_login_minutes.max(0)),
        }
    }

    fn session_id(session: &ProviderSession) -> AuthResult<Uuid> {
        Uuid::parse_str(session.uid()).map_err(|_| AuthError::new(AuthErrorCode::UserNotFound))
    }

    async fn start_session(&self, id: Uuid) -> AuthResult<ProviderSession> {
        let now = OffsetDateTime::now_utc();
        let user = self
            .users
            .touch_last_sign_in(id, now)
            .await
            .map_err(internal)?
            .ok_or_else(|| AuthError::new(AuthErrorCode::UserNotFound))?;
        Ok(ProviderSession {
            profile: user.profile(),
            id_token: None,
            signed_in_at: now,
        })
    }
}

#[async_trait]
impl IdentityProvider for LocalIdentityProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<ProviderSession> {
        if !is_valid_email(email) {
            warn!(%email, "invalid email");
            return Err(AuthError::new(AuthErrorCode::InvalidEmail));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::with_message(
                AuthErrorCode::WeakPassword,
                "Password should be at least 6 characters",
            ));
        }
        if self.users.find_by_email(email).await.map_err(internal)?.is_some() {
            warn!(%email, "email already registered");
            return Err(AuthError::new(AuthErrorCode::EmailAlreadyInUse));
        }
        let hash = hash_password(password)?;
        // A concurrent sign-up can still win the insert after the check above.
        let user = self.users.create(email, &hash).await.map_err(|e| {
            if e.is::<DuplicateEmail>() {
                warn!(%email, "email registered concurrently");
                AuthError::new(AuthErrorCode::EmailAlreadyInUse)
            } else {
                internal(e)
            }
        })?;
        info!(user_id = %user.id, "local account created");
        self.start_session(user.id).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<ProviderSession> {
        if !is_valid_email(email) {
            return Err(AuthError::new(AuthErrorCode::InvalidEmail));
        }
        let user = self
            .users
            .find_by_email(email)
            .await
            .map_err(internal)?
            .ok_or_else(|| {
                warn!(%email, "login unknown email");
                AuthError::new(AuthErrorCode::UserNotFound)
            })?;
        check_password(password, &user.password_hash).inspect_err(|e| {
            if e.code == AuthErrorCode::WrongPassword {
                warn!(user_id = %user.id, "login invalid password");
            }
        })?;
        self.start_session(user.id).await
    }

    async fn sign_in_federated(&self, credential: &FederatedCredential) -> AuthResult<ProviderSession> {
        warn!(provider = %credential.provider_id, "federated sign-in is not available locally");
        Err(AuthError::with_message(
            AuthErrorCode::OperationNotAllowed,
            "Federated sign-in requires the hosted identity provider",
        ))
    }

    async fn sign_out(&self, _session: &ProviderSession) -> AuthResult<()> {
        Ok(())
    }

    async fn update_profile(&self, session: &ProviderSession, display_name: &str) -> AuthResult<UserProfile> {
        let id = Self::session_id(session)?;
        let user = self
            .users
            .update_display_name(id, display_name)
            .await
            .map_err(internal)?
            .ok_or_else(|| AuthError::new(AuthErrorCode::UserNotFound))?;
        Ok(user.profile())
    }

    async fn update_password(&self, session: &ProviderSession, new_password: &str) -> AuthResult<ProviderSession> {
        if OffsetDateTime::now_utc() - session.signed_in_at > self.recent_login_window {
            return Err(AuthError::with_message(
                AuthErrorCode::RequiresRecentLogin,
                "This operation is sensitive and requires recent authentication.",
            ));
        }
        if new_password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AuthError::with_message(
                AuthErrorCode::WeakPassword,
                "Password should be at least 6 characters",
            ));
        }
        let id = Self::session_id(session)?;
        let hash = hash_password(new_password)?;
        if !self.users.update_password_hash(id, &hash).await.map_err(internal)? {
            return Err(AuthError::new(AuthErrorCode::UserNotFound));
        }
        info!(user_id = %id, "local password changed");
        Ok(session.clone())
    }

    async fn current_user(&self, session: &ProviderSession) -> AuthResult<UserProfile> {
        let id = Self::session_id(session)?;
        self.users
            .find_by_id(id)
            .await
            .map_err(internal)?
            .map(|u| u.profile())
            .ok_or_else(|| AuthError::new(AuthErrorCode::UserNotFound))
    }
}
