use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::json;
use time::OffsetDateTime;
use tracing::{debug, error, instrument, warn};

use super::provider::{
    AuthError, AuthErrorCode, AuthResult, FederatedCredential, IdentityProvider, ProviderSession,
    UserMetadata, UserProfile,
};

const IDENTITY_TOOLKIT_URL: &str = "https://identitytoolkit.googleapis.com/v1";
const API_KEY_HEADER: &str = "x-goog-api-key";

/// Firebase Authentication through the Identity Toolkit REST API.
pub struct FirebaseIdentityProvider {
    api_key: String,
    client: Client,
    base_url: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    id_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    users: Vec<AccountInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AccountInfo {
    local_id: String,
    email: Option<String>,
    display_name: Option<String>,
    created_at: Option<String>,
    last_login_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

fn millis_to_time(raw: Option<&str>) -> Option<OffsetDateTime> {
    let ms: i128 = raw?.parse().ok()?;
    OffsetDateTime::from_unix_timestamp_nanos(ms * 1_000_000).ok()
}

impl AccountInfo {
    fn into_profile(self) -> UserProfile {
        UserProfile {
            metadata: UserMetadata {
                creation_time: millis_to_time(self.created_at.as_deref()),
                last_sign_in_time: millis_to_time(self.last_login_at.as_deref()),
            },
            uid: self.local_id,
            display_name: self.display_name,
            email: self.email,
        }
    }
}

/// Maps an Identity Toolkit error string (e.g. `WEAK_PASSWORD : Password should be...`) to a code.
pub fn map_error_message(raw: &str) -> AuthError {
    let (reason, detail) = match raw.split_once(" : ") {
        Some((r, d)) => (r.trim(), Some(d.trim())),
        None => (raw.trim(), None),
    };
    let code = match reason {
        "EMAIL_NOT_FOUND" | "USER_NOT_FOUND" => AuthErrorCode::UserNotFound,
        "INVALID_PASSWORD" => AuthErrorCode::WrongPassword,
        "INVALID_EMAIL" | "MISSING_EMAIL" => AuthErrorCode::InvalidEmail,
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_IDP_RESPONSE" => AuthErrorCode::InvalidCredential,
        "EMAIL_EXISTS" => AuthErrorCode::EmailAlreadyInUse,
        "WEAK_PASSWORD" => AuthErrorCode::WeakPassword,
        "CREDENTIAL_TOO_OLD_LOGIN_AGAIN" | "TOKEN_EXPIRED" => AuthErrorCode::RequiresRecentLogin,
        "OPERATION_NOT_ALLOWED" | "PASSWORD_LOGIN_DISABLED" => AuthErrorCode::OperationNotAllowed,
        other => AuthErrorCode::Other(format!("auth/{}", other.to_lowercase().replace('_', "-"))),
    };
    let message = match detail {
        Some(d) => format!("Firebase: {d} ({code})."),
        None => format!("Firebase: Error ({code})."),
    };
    AuthError::with_message(code, message)
}

fn network_failure(method: &str, e: reqwest::Error) -> AuthError {
    let e = e.without_url();
    error!(error = %e, %method, "identity toolkit unreachable");
    AuthError::with_message(AuthErrorCode::NetworkRequestFailed, e.to_string())
}

impl FirebaseIdentityProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            client: Client::new(),
            base_url: IDENTITY_TOOLKIT_URL.to_owned(),
        }
    }

    /// Point the provider at another endpoint (emulator or mock server).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    async fn call<T: DeserializeOwned, B: Serialize + ?Sized>(&self, method: &str, body: &B) -> AuthResult<T> {
        let url = format!("{}/accounts:{method}", self.base_url);
        debug!(%method, "identity toolkit request");
        let response = self
            .client
            .post(url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| network_failure(method, e))?;
        let status = response.status();
        let text = response.text().await.map_err(|e| network_failure(method, e))?;
        if !status.is_success() {
            let err = serde_json::from_str::<ErrorEnvelope>(&text)
                .map(|env| map_error_message(&env.error.message))
                .unwrap_or_else(|_| AuthError::with_message(AuthErrorCode::Internal, text));
            warn!(%status, %method, code = %err.code, "identity toolkit rejected request");
            return Err(err);
        }
        serde_json::from_str(&text).map_err(|e| {
            error!(error = %e, %method, "unreadable identity toolkit response");
            AuthError::with_message(AuthErrorCode::Internal, e.to_string())
        })
    }

    async fn lookup(&self, id_token: &str) -> AuthResult<UserProfile> {
        let res: LookupResponse = self.call("lookup", &json!({ "idToken": id_token })).await?;
        res.users
            .into_iter()
            .next()
            .map(AccountInfo::into_profile)
            .ok_or_else(|| AuthError::new(AuthErrorCode::UserNotFound))
    }

    async fn session_from(&self, token: TokenResponse) -> AuthResult<ProviderSession> {
        let id_token = token
            .id_token
            .ok_or_else(|| AuthError::with_message(AuthErrorCode::Internal, "missing idToken"))?;
        let profile = self.lookup(&id_token).await?;
        if profile.uid != token.local_id {
            warn!(expected = %token.local_id, got = %profile.uid, "lookup returned another account");
        }
        Ok(ProviderSession {
            profile,
            id_token: Some(id_token),
            signed_in_at: OffsetDateTime::now_utc(),
        })
    }

    fn id_token(session: &ProviderSession) -> AuthResult<&str> {
        session
            .id_token
            .as_deref()
            .ok_or_else(|| AuthError::new(AuthErrorCode::RequiresRecentLogin))
    }
}

impl std::fmt::Debug for FirebaseIdentityProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirebaseIdentityProvider")
            .field("base_url", &self.base_url)
            .field("api_key", &"[redacted]")
            .finish()
    }
}

#[async_trait]
impl IdentityProvider for FirebaseIdentityProvider {
    fn name(&self) -> &'static str {
        "firebase"
    }

    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &str, password: &str) -> AuthResult<ProviderSession> {
        let token: TokenResponse = self
            .call(
                "signUp",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        self.session_from(token).await
    }

    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &str, password: &str) -> AuthResult<ProviderSession> {
        let token: TokenResponse = self
            .call(
                "signInWithPassword",
                &json!({ "email": email, "password": password, "returnSecureToken": true }),
            )
            .await?;
        self.session_from(token).await
    }

    #[instrument(skip(self, credential), fields(provider = %credential.provider_id))]
    async fn sign_in_federated(&self, credential: &FederatedCredential) -> AuthResult<ProviderSession> {
        let post_body = format!(
            "id_token={}&providerId={}",
            credential.id_token, credential.provider_id
        );
        let token: TokenResponse = self
            .call(
                "signInWithIdp",
                &json!({
                    "postBody": post_body,
                    "requestUri": credential.request_uri,
                    "returnSecureToken": true,
                    "returnIdpCredential": true,
                }),
            )
            .await?;
        self.session_from(token).await
    }

    async fn sign_out(&self, _session: &ProviderSession) -> AuthResult<()> {
        // ID tokens expire on their own; dropping the session is enough.
        Ok(())
    }

    #[instrument(skip(self, session), fields(uid = %session.uid()))]
    async fn update_profile(&self, session: &ProviderSession, display_name: &str) -> AuthResult<UserProfile> {
        let id_token = Self::id_token(session)?;
        let _: serde_json::Value = self
            .call(
                "update",
                &json!({ "idToken": id_token, "displayName": display_name, "returnSecureToken": false }),
            )
            .await?;
        self.lookup(id_token).await
    }

    #[instrument(skip(self, session, new_password), fields(uid = %session.uid()))]
    async fn update_password(&self, session: &ProviderSession, new_password: &str) -> AuthResult<ProviderSession> {
        let id_token = Self::id_token(session)?;
        let token: TokenResponse = self
            .call(
                "update",
                &json!({ "idToken": id_token, "password": new_password, "returnSecureToken": true }),
            )
            .await?;
        Ok(ProviderSession {
            profile: session.profile.clone(),
            id_token: token.id_token.or_else(|| session.id_token.clone()),
            signed_in_at: session.signed_in_at,
        })
    }

    async fn current_user(&self, session: &ProviderSession) -> AuthResult<UserProfile> {
        self.lookup(Self::id_token(session)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_identity_toolkit_reasons() {
        let cases = [
            ("EMAIL_NOT_FOUND", AuthErrorCode::UserNotFound),
            ("INVALID_PASSWORD", AuthErrorCode::WrongPassword),
            ("INVALID_EMAIL", AuthErrorCode::InvalidEmail),
            ("INVALID_LOGIN_CREDENTIALS", AuthErrorCode::InvalidCredential),
            ("EMAIL_EXISTS", AuthErrorCode::EmailAlreadyInUse),
            ("CREDENTIAL_TOO_OLD_LOGIN_AGAIN", AuthErrorCode::RequiresRecentLogin),
            ("TOKEN_EXPIRED", AuthErrorCode::RequiresRecentLogin),
        ];
        for (raw, code) in cases {
            assert_eq!(map_error_message(raw).code, code, "{raw}");
        }
    }

    #[test]
    fn weak_password_detail_is_kept() {
        let err = map_error_message("WEAK_PASSWORD : Password should be at least 6 characters");
        assert_eq!(err.code, AuthErrorCode::WeakPassword);
        assert_eq!(
            err.message,
            "Firebase: Password should be at least 6 characters (auth/weak-password)."
        );
    }

    #[test]
    fn unknown_reason_becomes_kebab_code() {
        let err = map_error_message("TOO_MANY_ATTEMPTS_TRY_LATER");
        assert_eq!(err.code.as_str(), "auth/too-many-attempts-try-later");
    }

    #[test]
    fn lookup_timestamps_are_millis() {
        let t = millis_to_time(Some("1700000000000")).unwrap();
        assert_eq!(t.unix_timestamp(), 1_700_000_000);
        assert!(millis_to_time(Some("soon")).is_none());
    }
}
