use std::time::Duration;

use nutricare::{app, auth::AuthEvent, state::AppState};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "nutricare=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let app_state = AppState::init().await?;

    // Run migrations if a database is configured
    if let Some(db) = &app_state.db {
        if let Err(e) = sqlx::migrate!("./migrations").run(db).await {
            tracing::warn!(error = %e, "migration failed; continuing");
        }
    }

    let mut auth_events = app_state.auth_events.subscribe();
    tokio::spawn(async move {
        while let Some(event) = auth_events.next().await {
            match &event {
                AuthEvent::SignedIn { .. } => tracing::info!(uid = %event.uid(), "auth state: signed in"),
                AuthEvent::ProfileUpdated { .. } => {
                    tracing::info!(uid = %event.uid(), "auth state: profile updated")
                }
                AuthEvent::SignedOut { .. } => tracing::info!(uid = %event.uid(), "auth state: signed out"),
            }
        }
    });

    let sweeper = app_state.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            ticker.tick().await;
            let dropped = sweeper.sweep_expired_sessions().await;
            if dropped > 0 {
                tracing::debug!(dropped, "session sweep");
            }
        }
    });

    let app = app::build_app(app_state);
    app::serve(app).await
}
