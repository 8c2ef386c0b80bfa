mod config;

use std::sync::Arc;

use anyhow::Context;
use axum::http::{
    HeaderValue, Method,
    header::{AUTHORIZATION, CONTENT_TYPE},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use pawhaven_api::state::{AppState, AppStateInner};
use pawhaven_db::Database;
use pawhaven_recommender::{FeatureSpace, Recommender};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pawhaven=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    if config.uses_placeholder_secret() {
        warn!("PAWHAVEN_JWT_SECRET is unset or still a placeholder. Tokens are forgeable!");
    }
    if config.whatsapp_number.is_none() {
        warn!("PAWHAVEN_WHATSAPP_NUMBER not set; checkout links will be blank");
    }

    let db = Database::open(&config.db_path)?;

    let recommender = match &config.recommender_model {
        Some(path) => Recommender::new(
            FeatureSpace::load(path)
                .with_context(|| format!("loading recommender model {}", path.display()))?,
        ),
        None => Recommender::default(),
    };

    let mut inner = AppStateInner::new(db, config.jwt_secret.clone());
    inner.token_ttl = chrono::Duration::minutes(config.token_ttl_minutes);
    inner.verify_code_secret = config.verify_code_secret.clone();
    inner.whatsapp_number = config.whatsapp_number.clone();
    inner.admin_emails = config.admin_emails.clone();
    inner.recommender = recommender;
    let state: AppState = Arc::new(inner);

    let app = pawhaven_api::router(state)
        .layer(cors_layer(&config.cors_origins))
        .layer(TraceLayer::new_for_http());

    info!("PawHaven listening on {}", config.addr);
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("PawHaven stopped");
    Ok(())
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .allow_credentials(true)
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Failed to install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
