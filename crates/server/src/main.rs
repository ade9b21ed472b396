//! World Priority server entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, middleware};
use priority_api::{AppState, auth_middleware, router as api_router};
use priority_common::Config;
use priority_core::{
    AdminAllowList, AuthService, JwtIdentityProvider, ModerationService, PriorityFeed,
    PriorityService, RankingService, SessionStore, StatsService, VoteService,
};
use priority_db::repositories::{PriorityRepository, UserRepository, VoteRepository};
use sea_orm::DatabaseConnection;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Default log filter when `RUST_LOG` is unset.
const DEFAULT_LOG_FILTER: &str = "world_priority=debug,priority_core=debug,tower_http=debug";

/// Waits for a shutdown signal (SIGINT or SIGTERM).
///
/// On Unix systems, this listens for both SIGINT (Ctrl+C) and SIGTERM.
/// On Windows, this only listens for Ctrl+C.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
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
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            info!("Received SIGINT, initiating graceful shutdown...");
        },
        () = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown...");
        },
    }
}

/// Install the global tracing subscriber.
fn init_tracing(json: bool) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

/// Wire repositories and services into the API state.
fn build_state(db: &Arc<DatabaseConnection>, config: &Config) -> AppState {
    let feed = PriorityFeed::new();

    let priority_repo = PriorityRepository::new(Arc::clone(db));
    let vote_repo = VoteRepository::new(Arc::clone(db));
    let user_repo = UserRepository::new(Arc::clone(db));

    let mut vote_service = VoteService::new(vote_repo.clone());
    vote_service.set_event_publisher(Arc::new(feed.clone()));

    let mut moderation_service = ModerationService::new(priority_repo.clone());
    moderation_service.set_event_publisher(Arc::new(feed.clone()));

    let provider = JwtIdentityProvider::new(
        &config.auth.jwt_secret,
        config.auth.issuer.as_deref(),
        config.auth.audience.as_deref(),
    );
    let allow_list = AdminAllowList::new(&config.auth.admin_emails);
    if allow_list.is_empty() {
        warn!("No admin emails configured, the moderation console is closed");
    }

    let auth_service = AuthService::new(
        Arc::new(provider),
        user_repo.clone(),
        vote_service.clone(),
        SessionStore::new(),
        allow_list,
    );

    AppState {
        auth_service,
        priority_service: PriorityService::new(priority_repo.clone()),
        vote_service,
        moderation_service,
        ranking_service: RankingService::new(priority_repo.clone(), feed),
        stats_service: StatsService::new(priority_repo, vote_repo, user_repo),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    init_tracing(config.logging.json);
    info!("Starting world-priority server...");

    // Connect to database
    let db = priority_db::init(&config).await?;
    info!("Connected to database");

    // Run migrations
    info!("Running database migrations...");
    priority_db::migrate(&db).await?;
    info!("Migrations completed");

    let db = Arc::new(db);
    let state = build_state(&db, &config);

    let app = Router::new()
        .nest("/api", api_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state);

    // Start server with graceful shutdown
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}
