//! ScholarNet API Gateway
//!
//! HTTP surface of the graph builder.
//! Handles:
//! - Researcher search across providers and per-source researcher detail
//! - Citation, co-author, and paper network builds
//! - Rate limiting
//! - Observability (logging, metrics, tracing)

mod handlers;
mod middleware;

use axum::{middleware as axum_middleware, routing::get, Router};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use scholarnet_common::{
    config::{AppConfig, ObservabilityConfig},
    metrics,
};
use scholarnet_network::NetworkService;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::middleware::rate_limit::RateLimitState;

/// Prometheus exporter with latency buckets for provider calls and builds
fn metrics_exporter(addr: SocketAddr) -> anyhow::Result<PrometheusBuilder> {
    let mut builder = PrometheusBuilder::new().with_http_listener(addr);
    for (name, buckets) in metrics::histogram_buckets() {
        builder = builder.set_buckets_for_metric(Matcher::Full(name), buckets)?;
    }
    Ok(builder)
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub service: NetworkService,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    
    // Load configuration
    let config = AppConfig::load()?;
    
    // Initialize tracing
    init_tracing(&config.observability);
    info!("Starting ScholarNet API Gateway v{}", scholarnet_common::VERSION);
    
    // Initialize metrics
    if config.observability.metrics_port != 0 {
        let metrics_addr = SocketAddr::from(([0, 0, 0, 0], config.observability.metrics_port));
        metrics_exporter(metrics_addr)?.install()?;
        info!("Metrics exporter listening on {}", metrics_addr);
    }
    metrics::register_metrics();
    
    // Build providers and the network service
    let service = NetworkService::from_config(&config).map_err(|e| {
        tracing::error!(error = %e, "Failed to initialize network service");
        e
    })?;
    
    let config = Arc::new(config);
    let state = AppState {
        config: config.clone(),
        service,
    };
    
    // Build the router
    let app = create_router(state)?;
    
    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);
    
    let listener = tokio::net::TcpListener::bind(addr).await?;
    
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    
    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);
    
    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Create the main application router
fn create_router(state: AppState) -> scholarnet_common::Result<Router> {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);
    
    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();
    
    let timeout = TimeoutLayer::new(state.config.request_timeout());
    
    // API routes
    let mut api_routes = Router::new()
        .route("/researchers/search", get(handlers::researchers::search))
        .route("/researchers/{id}", get(handlers::researchers::researcher))
        .route("/networks/citation/{seed_id}", get(handlers::networks::citation_network))
        .route("/networks/coauthor/{seed_id}", get(handlers::networks::coauthor_network))
        .route("/networks/paper/{paper_id}", get(handlers::networks::paper_network))
        .route("/networks/sample", get(handlers::networks::sample_network));
    
    if state.config.rate_limit.enabled {
        let limiter = RateLimitState::from_config(&state.config.rate_limit)?;
        api_routes = api_routes.layer(axum_middleware::from_fn_with_state(
            limiter,
            middleware::rate_limit::rate_limit,
        ));
    }
    
    // Compose the app
    Ok(Router::new()
        // Health endpoints (never rate limited)
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))
        .nest("/v1", api_routes)
        .route_layer(axum_middleware::from_fn(middleware::metrics::track_requests))
        .layer(TraceLayer::new_for_http())
        .layer(timeout)
        .layer(cors)
        .layer(request_id)
        .layer(propagate_id)
        .with_state(state))
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
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
