use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderValue, Method, Request};
use axum::response::Response;
use axum::Router;
use fred::prelude::ClientLike;
use migration::{Migrator, MigratorTrait};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::Span;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use scribe_api::config::{Config, Environment};
use scribe_api::rate_limit::{self, MemoryCounterStore, RateLimiter, RedisCounterStore};
use scribe_api::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize structured logging
    init_tracing(&config.log_level);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        environment = ?config.environment,
        "Starting Scribe API"
    );

    // Connect to database
    tracing::info!("Connecting to database...");
    let db = scribe_api::db::connect(&config.database_url).await?;
    tracing::info!("Database connected");

    // Run migrations
    tracing::info!("Running database migrations...");
    Migrator::up(&db, None).await?;
    tracing::info!("Migrations applied");

    let rate_limiter = build_rate_limiter(&config).await?;
    let state = AppState::new(db, config.clone()).with_rate_limiter(rate_limiter);

    // Build the application with middleware
    let app = build_app(state, &config);

    // Start the server
    let addr = config.socket_addr();
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "Server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Redis-backed counters when `REDIS_URL` is set, in-process counters otherwise.
async fn build_rate_limiter(config: &Config) -> anyhow::Result<RateLimiter> {
    let max = config.rate_limit_max_requests;
    let window = config.rate_limit_window_secs;

    if let Some(url) = config.redis_url.as_deref() {
        let fred_config = fred::types::config::Config::from_url(url)?;
        let client = fred::clients::Client::new(fred_config, None, None, None);
        client.connect();
        client.wait_for_connect().await?;
        tracing::info!("Connected to Redis for distributed rate limiting");
        return Ok(RateLimiter::new(
            Arc::new(RedisCounterStore::new(Arc::new(client))),
            max,
            window,
        ));
    }

    let store = Arc::new(MemoryCounterStore::new());
    rate_limit::spawn_sweeper(Arc::clone(&store), Duration::from_secs(window.max(1)));
    tracing::info!("Using in-process rate limit counters");
    Ok(RateLimiter::new(store, max, window))
}

/// Wrap the application router with CORS and request tracing.
fn build_app(state: AppState, config: &Config) -> Router {
    let cors = if config.environment == Environment::Development {
        CorsLayer::very_permissive()
    } else {
        let origin = config
            .frontend_url
            .parse::<HeaderValue>()
            .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:3001"));

        CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT])
            .allow_credentials(true)
            .max_age(Duration::from_secs(3600))
    };

    let trace = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                uri = %request.uri(),
                status_code = tracing::field::Empty,
            )
        })
        .on_response(|response: &Response, latency: Duration, span: &Span| {
            span.record("status_code", response.status().as_u16());
            tracing::info!(latency_ms = latency.as_millis(), "response");
        });

    scribe_api::routes::app(state).layer(cors).layer(trace)
}

/// Initialize the `tracing` subscriber with an environment-based filter.
fn init_tracing(log_level: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("scribe_api={log_level},tower_http=info,sea_orm=warn").into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}
