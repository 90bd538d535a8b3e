use serde::{Deserialize, Serialize};

use super::provider::UserProfile;

/// Request body for account creation.
#[derive(Debug, Deserialize)]
pub struct SignUpRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub agree_terms: bool,
}

/// Request body for email/password login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

fn default_provider_id() -> String {
    "google.com".into()
}

fn default_request_uri() -> String {
    "http://localhost".into()
}

/// Request body for federated (Google) login.
#[derive(Debug, Deserialize)]
pub struct FederatedRequest {
    pub id_token: String,
    #[serde(default = "default_provider_id")]
    pub provider_id: String,
    #[serde(default = "default_request_uri")]
    pub request_uri: String,
}

/// Request body for token refresh.
#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub new_password: String,
    pub confirm_password: String,
}

/// Response returned after sign-up, login or refresh.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub message: String,
    pub user: UserProfile,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl From<&str> for MessageResponse {
    fn from(message: &str) -> Self {
        Self {
            message: message.to_owned(),
        }
    }
}
