//! # huddle
//!
//! Real-time conversation and notification server.
//!
//! - `GET /health` - liveness plus the live connection count
//! - `GET /realtime` - WebSocket gateway (`?token=` or, in development,
//!   `?userId=`)
//!
//! Storage is PostgreSQL when `HUDDLE__DATABASE__URL` is set, otherwise
//! in-memory.

use std::error::Error;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use http::HeaderValue;
use serde_json::{json, Value};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use huddle::adapters::auth::{JwtSessionValidator, TrustedIdentityValidator};
use huddle::adapters::postgres::{
    self, PostgresConversationRepository, PostgresMessageRepository,
    PostgresNotificationRepository, PostgresProfileReader,
};
use huddle::adapters::websocket::{realtime_router, RealtimeGateway, RealtimeState, SessionRegistry};
use huddle::application::{RealtimeCore, Stores};
use huddle::config::{AppConfig, DatabaseConfig, ServerConfig};
use huddle::ports::SessionValidator;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // -----------------------------------------------------------------------
    // 1. Configuration and tracing (RUST_LOG overrides server.log_level)
    // -----------------------------------------------------------------------
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.server.environment,
        "Starting huddle"
    );

    // -----------------------------------------------------------------------
    // 2. Stores
    // -----------------------------------------------------------------------
    let stores = match &config.database {
        Some(database) => postgres_stores(database).await?,
        None => {
            info!("No database configured, using in-memory stores");
            Stores::in_memory()
        }
    };

    // -----------------------------------------------------------------------
    // 3. Registry and core (history-free event bus)
    // -----------------------------------------------------------------------
    let registry = Arc::new(SessionRegistry::new());
    let core = Arc::new(RealtimeCore::for_server(stores, registry.clone()));

    let validator: Arc<dyn SessionValidator> = match &config.auth.jwt_secret {
        Some(secret) => Arc::new(JwtSessionValidator::new(
            secret,
            config.auth.jwt_issuer.as_deref(),
        )),
        None => {
            tracing::warn!("No JWT secret configured, trusting handshake identity claims");
            Arc::new(TrustedIdentityValidator::new())
        }
    };

    let gateway = Arc::new(RealtimeGateway::new(
        core,
        registry.clone(),
        validator,
        config.realtime.welcome_message.clone(),
    ));
    let state = RealtimeState::new(gateway, config.realtime.outbound_buffer);

    // -----------------------------------------------------------------------
    // 4. HTTP server (runs until Ctrl+C)
    // -----------------------------------------------------------------------
    let app = Router::new()
        .route("/health", get(health).with_state(registry))
        .merge(realtime_router(state))
        .layer(TimeoutLayer::new(config.server.request_timeout()))
        .layer(cors_layer(&config.server))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid));

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));

    if config.server.json_logs() {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

async fn postgres_stores(config: &DatabaseConfig) -> Result<Stores, Box<dyn Error>> {
    info!(url = %config.redacted_url(), "Connecting to PostgreSQL");
    let pool = postgres::connect(config).await?;
    if config.run_migrations {
        postgres::run_migrations(&pool).await?;
    }

    Ok(Stores {
        conversations: Arc::new(PostgresConversationRepository::new(pool.clone())),
        messages: Arc::new(PostgresMessageRepository::new(pool.clone())),
        notifications: Arc::new(PostgresNotificationRepository::new(pool.clone())),
        profiles: Arc::new(PostgresProfileReader::new(pool)),
    })
}

fn cors_layer(server: &ServerConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = server
        .cors_origins_list()
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new().allow_origin(Any).allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_headers(Any)
    }
}

async fn health(State(registry): State<Arc<SessionRegistry>>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "connections": registry.connection_count(),
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}
