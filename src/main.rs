//! FixMate Backend Server
//!
//! Serves the booking, negotiation and technician directory APIs.

use anyhow::Context;
use axum::http::{HeaderValue, Method};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::cors::{Any, CorsLayer};

use fixmate_server::auth::AuthService;
use fixmate_server::booking::BookingService;
use fixmate_server::config::{Config, StorageBackend};
use fixmate_server::estimator::{GeminiEstimator, GeminiSettings};
use fixmate_server::responder::AutoResponder;
use fixmate_server::routes::app_router;
use fixmate_server::state::AppState;
use fixmate_server::store::{MemoryStore, NegotiationStore, PgStore};
use fixmate_server::technician::TechnicianService;
use fixmate_server::{db, seed};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log_level)),
        )
        .with_target(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    tracing::info!(environment = config.environment.as_str(), "Starting FixMate server");

    let store: Arc<dyn NegotiationStore> = match config.storage_backend {
        StorageBackend::Postgres => {
            let pool = db::create_pool(&config).await?;
            db::run_migrations(&pool).await?;
            Arc::new(PgStore::new(pool))
        }
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    if config.seed_demo_data {
        let inserted = seed::seed_demo_data(store.as_ref())
            .await
            .context("Failed to seed demo technicians")?;
        tracing::info!(inserted, "Demo data seeding finished");
    }

    if config.estimator_api_key.is_none() {
        tracing::warn!("ESTIMATOR_API_KEY not set; opening quotes will use category minimums");
    }
    let estimator = GeminiEstimator::new(GeminiSettings {
        api_key: config.estimator_api_key.clone(),
        base_url: config.estimator_base_url.clone(),
        model: config.estimator_model.clone(),
        timeout: config.estimator_timeout,
    })
    .context("Failed to build cost estimator client")?;

    let responder = AutoResponder::new(Arc::new(estimator), config.estimator_timeout)
        .with_enabled(config.auto_responder_enabled);

    let booking_service = Arc::new(BookingService::new(store.clone(), responder));
    let technician_service = Arc::new(TechnicianService::new(store.clone()));
    let auth_service = Arc::new(AuthService::new(
        config.jwt_secret.clone(),
        config.jwt_token_ttl_seconds,
    ));

    let app_state = AppState::new(booking_service, technician_service, auth_service, store);

    let app = app_router(app_state).layer(configure_cors(&config));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    tracing::info!("Server listening on {}", addr);
    tracing::info!("Health check at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

fn configure_cors(config: &Config) -> CorsLayer {
    let allowed_origins = config.cors_allowed_origins.as_deref().unwrap_or_default();

    if allowed_origins.is_empty() {
        tracing::warn!("CORS_ALLOWED_ORIGINS not set, allowing all origins (permissive)");
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .filter_map(|s| s.trim().parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}
