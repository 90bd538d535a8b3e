use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

use super::provider::{UserMetadata, UserProfile};

/// Account row kept by the local identity provider.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,                                // unique user ID
    pub email: String,                           // normalized email
    #[serde(skip_serializing)]
    pub password_hash: String,                   // Argon2 hash, not exposed in JSON
    pub display_name: Option<String>,            // set after sign-up
    pub created_at: OffsetDateTime,              // creation timestamp
    pub last_sign_in_at: Option<OffsetDateTime>, // updated on every sign-in
}

impl User {
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            uid: self.id.to_string(),
            display_name: self.display_name.clone(),
            email: Some(self.email.clone()),
            metadata: UserMetadata {
                creation_time: Some(self.created_at),
                last_sign_in_time: self.last_sign_in_at,
            },
        }
    }
}
