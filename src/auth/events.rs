use std::collections::HashMap;

use serde::Serialize;
use time::{Duration, OffsetDateTime};
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info};

use super::provider::{ProviderSession, UserProfile};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthEvent {
    SignedIn { profile: UserProfile },
    ProfileUpdated { profile: UserProfile },
    SignedOut { uid: String },
}

impl AuthEvent {
    pub fn uid(&self) -> &str {
        match self {
            Self::SignedIn { profile } | Self::ProfileUpdated { profile } => &profile.uid,
            Self::SignedOut { uid } => uid,
        }
    }
}

/// Current provider sessions plus a broadcast of sign-in state changes.
/// Sessions older than the TTL are treated as signed out.
pub struct AuthStateHub {
    sender: broadcast::Sender<AuthEvent>,
    sessions: RwLock<HashMap<String, ProviderSession>>,
    session_ttl: Option<Duration>,
}

impl AuthStateHub {
    pub const DEFAULT_CAPACITY: usize = 64;

    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            sessions: RwLock::new(HashMap::new()),
            session_ttl: None,
        }
    }

    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.session_ttl = Some(ttl);
        self
    }

    fn is_live(&self, session: &ProviderSession, now: OffsetDateTime) -> bool {
        self.session_ttl
            .map_or(true, |ttl| session.signed_in_at + ttl > now)
    }

    /// Dropping the returned subscription unsubscribes.
    pub fn subscribe(&self) -> AuthSubscription {
        AuthSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    fn publish(&self, event: AuthEvent) {
        // No subscribers is not an error.
        if self.sender.send(event).is_err() {
            debug!("auth event dropped: no subscribers");
        }
    }

    pub async fn signed_in(&self, session: ProviderSession) {
        let profile = session.profile.clone();
        self.sessions
            .write()
            .await
            .insert(profile.uid.clone(), session);
        self.publish(AuthEvent::SignedIn { profile });
    }

    /// Stores a rotated session without announcing a new sign-in.
    pub async fn replace_session(&self, session: ProviderSession) {
        self.sessions
            .write()
            .await
            .insert(session.uid().to_owned(), session);
    }

    pub async fn profile_updated(&self, profile: UserProfile) {
        if let Some(session) = self.sessions.write().await.get_mut(&profile.uid) {
            session.profile = profile.clone();
        }
        self.publish(AuthEvent::ProfileUpdated { profile });
    }

    pub async fn signed_out(&self, uid: &str) -> Option<ProviderSession> {
        let removed = self.sessions.write().await.remove(uid);
        self.publish(AuthEvent::SignedOut { uid: uid.to_owned() });
        removed
    }

    pub async fn session(&self, uid: &str) -> Option<ProviderSession> {
        let now = OffsetDateTime::now_utc();
        self.sessions
            .read()
            .await
            .get(uid)
            .filter(|s| self.is_live(s, now))
            .cloned()
    }

    pub async fn current_user(&self, uid: &str) -> Option<UserProfile> {
        self.session(uid).await.map(|s| s.profile)
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops expired sessions, announcing each as a sign-out. Returns their uids.
    pub async fn sweep_expired(&self) -> Vec<String> {
        let now = OffsetDateTime::now_utc();
        let expired: Vec<String> = {
            let mut sessions = self.sessions.write().await;
            let expired = sessions
                .values()
                .filter(|s| !self.is_live(s, now))
                .map(|s| s.uid().to_owned())
                .collect::<Vec<_>>();
            for uid in &expired {
                sessions.remove(uid);
            }
            expired
        };
        for uid in &expired {
            self.publish(AuthEvent::SignedOut { uid: uid.clone() });
        }
        if !expired.is_empty() {
            info!(count = expired.len(), "expired sessions dropped");
        }
        expired
    }
}

impl Default for AuthStateHub {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY)
    }
}

pub struct AuthSubscription {
    receiver: broadcast::Receiver<AuthEvent>,
}

impl AuthSubscription {
    /// Next event, or `None` once the hub is gone. Events missed while lagging are skipped.
    pub async fn next(&mut self) -> Option<AuthEvent> {
        loop {
            match self.receiver.recv().await {
                Ok(event) => return Some(event),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    debug!(skipped, "auth subscriber lagged");
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    pub fn try_next(&mut self) -> Option<AuthEvent> {
        loop {
            match self.receiver.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(_)) => continue,
                Err(_) => return None,
            }
        }
    }

    /// Same as dropping the subscription.
    pub fn unsubscribe(self) {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::provider::UserMetadata;

    fn session_signed_in_at(uid: &str, signed_in_at: OffsetDateTime) -> ProviderSession {
        ProviderSession {
            profile: UserProfile {
                uid: uid.into(),
                display_name: None,
                email: Some(format!("{uid}@example.in")),
                metadata: UserMetadata {
                    creation_time: None,
                    last_sign_in_time: None,
                },
            },
            id_token: None,
            signed_in_at,
        }
    }

    fn session(uid: &str) -> ProviderSession {
        session_signed_in_at(uid, OffsetDateTime::now_utc())
    }

    #[tokio::test]
    async fn subscribers_see_sign_in_and_out() {
        let hub = AuthStateHub::default();
        let mut sub = hub.subscribe();
        hub.signed_in(session("u1")).await;
        hub.signed_out("u1").await;

        assert!(matches!(sub.next().await, Some(AuthEvent::SignedIn { .. })));
        let out = sub.next().await.unwrap();
        assert_eq!(out, AuthEvent::SignedOut { uid: "u1".into() });
        assert!(hub.session("u1").await.is_none());
    }

    #[tokio::test]
    async fn dropping_subscription_unsubscribes() {
        let hub = AuthStateHub::default();
        let first = hub.subscribe();
        let second = hub.subscribe();
        assert_eq!(hub.subscriber_count(), 2);
        drop(first);
        second.unsubscribe();
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn profile_update_refreshes_stored_session() {
        let hub = AuthStateHub::default();
        hub.signed_in(session("u2")).await;
        let mut profile = hub.current_user("u2").await.unwrap();
        profile.display_name = Some("Meera".into());
        hub.profile_updated(profile).await;
        assert_eq!(
            hub.current_user("u2").await.unwrap().display_name.as_deref(),
            Some("Meera")
        );
    }

    #[tokio::test]
    async fn publishing_without_subscribers_is_fine() {
        let hub = AuthStateHub::default();
        hub.signed_in(session("u3")).await;
        assert_eq!(hub.current_user("u3").await.unwrap().uid, "u3");
    }

    #[tokio::test]
    async fn expired_sessions_are_hidden_then_swept() {
        let hub = AuthStateHub::default().with_session_ttl(Duration::minutes(30));
        let stale = OffsetDateTime::now_utc() - Duration::minutes(31);
        hub.signed_in(session_signed_in_at("old", stale)).await;
        hub.signed_in(session("fresh")).await;
        let mut sub = hub.subscribe();

        assert!(hub.session("old").await.is_none());
        assert!(hub.current_user("old").await.is_none());
        assert!(hub.session("fresh").await.is_some());
        assert_eq!(hub.session_count().await, 2);

        assert_eq!(hub.sweep_expired().await, vec!["old".to_owned()]);
        assert_eq!(hub.session_count().await, 1);
        assert_eq!(sub.try_next(), Some(AuthEvent::SignedOut { uid: "old".into() }));
        assert!(hub.sweep_expired().await.is_empty());
    }
}
