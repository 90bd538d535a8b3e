use axum::{
    extract::{FromRef, State},
    routing::{get, post, put},
    Json, Router,
};
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AuthResponse, ChangePasswordRequest, FederatedRequest, LoginRequest, MessageResponse,
            ProfileResponse, RefreshRequest, SignUpRequest, UpdateProfileRequest,
        },
        jwt::{AuthUser, JwtKeys},
        provider::{AuthFlow, FederatedCredential, ProviderSession, UserProfile},
    },
    error::AppError,
    state::AppState,
};

/// Shortest password the account screen accepts before asking the provider.
pub const ACCOUNT_MIN_PASSWORD_LEN: usize = 8;

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(sign_up))
        .route("/auth/login", post(login))
        .route("/auth/federated", post(federated_login))
        .route("/auth/refresh", post(refresh))
        .route("/auth/logout", post(logout))
}

pub fn me_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route("/account/profile", put(update_profile))
        .route("/account/password", put(change_password))
}

fn issue_tokens(state: &AppState, uid: &str, user: UserProfile) -> Result<AuthResponse, AppError> {
    let (access_token, refresh_token) = JwtKeys::from_ref(state).issue_pair(uid).map_err(|e| {
        error!(error = %e, %uid, "jwt sign failed");
        AppError::Internal(e.to_string())
    })?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user,
    })
}

async fn require_session(state: &AppState, uid: &str) -> Result<ProviderSession, AppError> {
    state.auth_events.session(uid).await.ok_or_else(|| {
        warn!(%uid, "no provider session for token");
        AppError::Unauthorized("Session expired. Please log in again.".into())
    })
}

async fn start_session(state: &AppState, session: ProviderSession) -> Result<Json<AuthResponse>, AppError> {
    let uid = session.uid().to_owned();
    let profile = session.profile.clone();
    state.auth_events.signed_in(session).await;
    Ok(Json(issue_tokens(state, &uid, profile)?))
}

#[instrument(skip(state, payload))]
pub async fn sign_up(
    State(state): State<AppState>,
    Json(mut payload): Json<SignUpRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.password != payload.confirm_password {
        return Err(AppError::validation("Passwords do not match"));
    }
    if !payload.agree_terms {
        return Err(AppError::validation("Please agree to the terms and conditions"));
    }

    let mut session = state
        .identity
        .sign_up(&payload.email, &payload.password)
        .await
        .map_err(|e| e.into_app_error(AuthFlow::SignUp))?;

    let name = payload.name.trim();
    if !name.is_empty() {
        session.profile = state
            .identity
            .update_profile(&session, name)
            .await
            .map_err(|e| e.into_app_error(AuthFlow::SignUp))?;
    }

    info!(uid = %session.uid(), provider = state.identity.name(), "user signed up");
    start_session(&state, session).await
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    payload.email = payload.email.trim().to_lowercase();

    let session = state
        .identity
        .sign_in(&payload.email, &payload.password)
        .await
        .map_err(|e| {
            warn!(email = %payload.email, code = %e.code, "login failed");
            e.into_app_error(AuthFlow::Login)
        })?;

    info!(uid = %session.uid(), "user logged in");
    start_session(&state, session).await
}

#[instrument(skip(state, payload))]
pub async fn federated_login(
    State(state): State<AppState>,
    Json(payload): Json<FederatedRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let credential = FederatedCredential {
        provider_id: payload.provider_id,
        id_token: payload.id_token,
        request_uri: payload.request_uri,
    };
    let session = state
        .identity
        .sign_in_federated(&credential)
        .await
        .map_err(|e| {
            warn!(provider = %credential.provider_id, code = %e.code, "federated login failed");
            e.into_app_error(AuthFlow::Federated)
        })?;

    info!(uid = %session.uid(), provider = %credential.provider_id, "user logged in");
    start_session(&state, session).await
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|e| AppError::Unauthorized(e.to_string()))?;

    let user = require_session(&state, &claims.sub).await?.profile;
    Ok(Json(issue_tokens(&state, &claims.sub, user)?))
}

#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
) -> Result<Json<MessageResponse>, AppError> {
    if let Some(session) = state.auth_events.session(&uid).await {
        state
            .identity
            .sign_out(&session)
            .await
            .map_err(|e| e.into_app_error(AuthFlow::SignOut))?;
    }
    state.end_session(&uid).await;
    info!(%uid, "user logged out");
    Ok(Json("Logged out".into()))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
) -> Result<Json<UserProfile>, AppError> {
    let session = require_session(&state, &uid).await?;
    let profile = state.identity.current_user(&session).await.map_err(|e| {
        error!(error = %e, %uid, "current user lookup failed");
        AppError::Unauthorized("User not found".into())
    })?;
    Ok(Json(profile))
}

#[instrument(skip(state, payload))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let session = require_session(&state, &uid).await?;
    let profile = state
        .identity
        .update_profile(&session, payload.display_name.trim())
        .await
        .map_err(|e| e.into_app_error(AuthFlow::UpdateProfile))?;
    state.auth_events.profile_updated(profile.clone()).await;
    Ok(Json(ProfileResponse {
        message: "Profile updated successfully!".into(),
        user: profile,
    }))
}

#[instrument(skip(state, payload))]
pub async fn change_password(
    State(state): State<AppState>,
    AuthUser(uid): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    if payload.new_password != payload.confirm_password {
        return Err(AppError::validation("New passwords do not match"));
    }
    if payload.new_password.chars().count() < ACCOUNT_MIN_PASSWORD_LEN {
        return Err(AppError::validation("Password must be at least 8 characters"));
    }

    let session = require_session(&state, &uid).await?;
    let rotated = state
        .identity
        .update_password(&session, &payload.new_password)
        .await
        .map_err(|e| {
            warn!(%uid, code = %e.code, "password change rejected");
            e.into_app_error(AuthFlow::ChangePassword)
        })?;
    state.auth_events.replace_session(rotated).await;
    info!(%uid, "password changed");
    Ok(Json("Password changed successfully!".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_response_serialization() {
        let json = serde_json::to_string(&MessageResponse::from("Logged out")).unwrap();
        assert_eq!(json, r#"{"message":"Logged out"}"#);
    }
}
