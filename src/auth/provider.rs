use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::OffsetDateTime;

use crate::error::AppError;

/// Timestamps the identity provider keeps for an account.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMetadata {
    #[serde(with = "time::serde::rfc3339::option")]
    pub creation_time: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339::option")]
    pub last_sign_in_time: Option<OffsetDateTime>,
}

/// Snapshot of the signed-in user as the provider reports it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub display_name: Option<String>,
    pub email: Option<String>,
    pub metadata: UserMetadata,
}

impl UserProfile {
    /// Name shown in greetings: display name, else the email local part, else "User".
    pub fn greeting_name(&self) -> String {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.to_owned();
        }
        self.email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|local| !local.is_empty())
            .unwrap_or("User")
            .to_owned()
    }
}

/// A provider-side sign-in. Kept server-side; clients only see our JWTs.
#[derive(Debug, Clone)]
pub struct ProviderSession {
    pub profile: UserProfile,
    /// Provider credential for follow-up calls (Firebase ID token). Local sessions have none.
    pub id_token: Option<String>,
    pub signed_in_at: OffsetDateTime,
}

impl ProviderSession {
    pub fn uid(&self) -> &str {
        &self.profile.uid
    }
}

/// Credential obtained from a federated provider (Google) on the client.
#[derive(Debug, Clone, Deserialize)]
pub struct FederatedCredential {
    pub provider_id: String,
    pub id_token: String,
    pub request_uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthErrorCode {
    UserNotFound,
    WrongPassword,
    InvalidEmail,
    InvalidCredential,
    EmailAlreadyInUse,
    WeakPassword,
    RequiresRecentLogin,
    OperationNotAllowed,
    NetworkRequestFailed,
    Internal,
    Other(String),
}

impl AuthErrorCode {
    pub fn as_str(&self) -> &str {
        match self {
            Self::UserNotFound => "auth/user-not-found",
            Self::WrongPassword => "auth/wrong-password",
            Self::InvalidEmail => "auth/invalid-email",
            Self::InvalidCredential => "auth/invalid-credential",
            Self::EmailAlreadyInUse => "auth/email-already-in-use",
            Self::WeakPassword => "auth/weak-password",
            Self::RequiresRecentLogin => "auth/requires-recent-login",
            Self::OperationNotAllowed => "auth/operation-not-allowed",
            Self::NetworkRequestFailed => "auth/network-request-failed",
            Self::Internal => "auth/internal-error",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for AuthErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AuthError {
    pub code: AuthErrorCode,
    pub message: String,
}

impl AuthError {
    pub fn new(code: AuthErrorCode) -> Self {
        let message = format!("Identity provider error ({code}).");
        Self { code, message }
    }

    pub fn with_message(code: AuthErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Provider text safe to show a user. Transport and backend failures keep their
    /// detail in the logs only.
    pub fn public_detail(&self) -> String {
        match self.code {
            AuthErrorCode::NetworkRequestFailed | AuthErrorCode::Internal => {
                format!("Identity provider error ({}).", self.code)
            }
            _ => self.message.clone(),
        }
    }

    /// Fixed, user-facing text for this error in the given flow.
    pub fn user_message(&self, flow: AuthFlow) -> String {
        use AuthErrorCode::*;
        match (flow, &self.code) {
            (AuthFlow::Login, UserNotFound) => "No account found with this email.".into(),
            (AuthFlow::Login, WrongPassword) => "Incorrect password.".into(),
            (AuthFlow::Login, InvalidEmail) => "Invalid email address.".into(),
            (AuthFlow::Login, InvalidCredential) => "Invalid email or password.".into(),
            (AuthFlow::Login, _) => "Failed to login. Please check your credentials.".into(),
            (AuthFlow::Federated, _) => "Failed to login with Google.".into(),
            (AuthFlow::SignUp, EmailAlreadyInUse) => {
                "This email is already registered. Please login instead.".into()
            }
            (AuthFlow::SignUp, WeakPassword) => {
                "Password is too weak. Please use at least 8 characters.".into()
            }
            (AuthFlow::SignUp, InvalidEmail) => "Invalid email address.".into(),
            (AuthFlow::SignUp, _) => "Failed to create account. Please try again.".into(),
            (AuthFlow::ChangePassword, RequiresRecentLogin) => {
                "Please log out and log in again before changing your password".into()
            }
            (AuthFlow::ChangePassword, _) => {
                format!("Failed to change password: {}", self.public_detail())
            }
            (AuthFlow::UpdateProfile, _) => {
                format!("Failed to update profile: {}", self.public_detail())
            }
            (AuthFlow::SignOut, _) => format!("Failed to log out: {}", self.public_detail()),
        }
    }

    /// Converts into an HTTP error carrying the flow's user-facing message.
    pub fn into_app_error(self, flow: AuthFlow) -> AppError {
        use AuthErrorCode::*;
        let message = self.user_message(flow);
        match self.code {
            UserNotFound | WrongPassword | InvalidCredential | RequiresRecentLogin => {
                AppError::Unauthorized(message)
            }
            InvalidEmail | WeakPassword | OperationNotAllowed => AppError::Validation(message),
            EmailAlreadyInUse => AppError::Conflict(message),
            NetworkRequestFailed | Internal | Other(_) => AppError::Upstream(message),
        }
    }
}

/// Screen-level operation an auth error surfaced from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFlow {
    Login,
    Federated,
    SignUp,
    ChangePassword,
    UpdateProfile,
    SignOut,
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Hosted or local account backend.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<ProviderSession>;

    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<ProviderSession>;

    async fn sign_in_federated(&self, credential: &FederatedCredential) -> AuthResult<ProviderSession>;

    async fn sign_out(&self, session: &ProviderSession) -> AuthResult<()>;

    async fn update_profile(&self, session: &ProviderSession, display_name: &str) -> AuthResult<UserProfile>;

    /// Returns the session to keep using; hosted providers rotate credentials here.
    async fn update_password(&self, session: &ProviderSession, new_password: &str) -> AuthResult<ProviderSession>;

    async fn current_user(&self, session: &ProviderSession) -> AuthResult<UserProfile>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    fn profile(display_name: Option<&str>, email: Option<&str>) -> UserProfile {
        UserProfile {
            uid: "u1".into(),
            display_name: display_name.map(str::to_owned),
            email: email.map(str::to_owned),
            metadata: UserMetadata {
                creation_time: None,
                last_sign_in_time: None,
            },
        }
    }

    #[test]
    fn greeting_name_falls_back_to_email_then_user() {
        assert_eq!(profile(Some("Asha"), Some("a@x.in")).greeting_name(), "Asha");
        assert_eq!(profile(None, Some("ravi@x.in")).greeting_name(), "ravi");
        assert_eq!(profile(Some("  "), None).greeting_name(), "User");
    }

    #[test]
    fn login_messages_per_code() {
        let cases = [
            (AuthErrorCode::UserNotFound, "No account found with this email."),
            (AuthErrorCode::WrongPassword, "Incorrect password."),
            (AuthErrorCode::InvalidEmail, "Invalid email address."),
            (AuthErrorCode::InvalidCredential, "Invalid email or password."),
            (
                AuthErrorCode::WeakPassword,
                "Failed to login. Please check your credentials.",
            ),
        ];
        for (code, expected) in cases {
            assert_eq!(AuthError::new(code).user_message(AuthFlow::Login), expected);
        }
    }

    #[test]
    fn change_password_embeds_provider_message() {
        let err = AuthError::with_message(
            AuthErrorCode::Other("auth/too-many-requests".into()),
            "Firebase: Error (auth/too-many-requests).",
        );
        assert_eq!(
            err.user_message(AuthFlow::ChangePassword),
            "Failed to change password: Firebase: Error (auth/too-many-requests)."
        );
        let recent = AuthError::new(AuthErrorCode::RequiresRecentLogin);
        assert_eq!(
            recent.user_message(AuthFlow::ChangePassword),
            "Please log out and log in again before changing your password"
        );
    }

    #[test]
    fn backend_detail_stays_out_of_user_messages() {
        let network = AuthError::with_message(
            AuthErrorCode::NetworkRequestFailed,
            "error sending request: connection refused",
        );
        let internal = AuthError::with_message(AuthErrorCode::Internal, "pool timed out");
        for flow in [AuthFlow::ChangePassword, AuthFlow::UpdateProfile, AuthFlow::SignOut] {
            assert!(!network.user_message(flow).contains("connection refused"));
            assert!(!internal.user_message(flow).contains("pool timed out"));
        }
        assert_eq!(
            internal.user_message(AuthFlow::UpdateProfile),
            "Failed to update profile: Identity provider error (auth/internal-error)."
        );
    }

    #[test]
    fn http_status_follows_code() {
        let conflict = AuthError::new(AuthErrorCode::EmailAlreadyInUse).into_app_error(AuthFlow::SignUp);
        assert_eq!(conflict.status(), StatusCode::CONFLICT);
        let weak = AuthError::new(AuthErrorCode::WeakPassword).into_app_error(AuthFlow::SignUp);
        assert_eq!(weak.status(), StatusCode::BAD_REQUEST);
        let network =
            AuthError::new(AuthErrorCode::NetworkRequestFailed).into_app_error(AuthFlow::Login);
        assert_eq!(network.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn profile_serializes_like_provider_snapshot() {
        let json = serde_json::to_value(profile(Some("Asha"), Some("a@x.in"))).unwrap();
        assert_eq!(json["displayName"], "Asha");
        assert!(json["metadata"]["creationTime"].is_null());
    }
}
