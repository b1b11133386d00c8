//! HTTP server for the boiler fault detection dashboard.
//!
//! Every widget of the page maps to one endpoint. Each request re-reads the
//! dataset and model files; the snapshot for an unchanged pair of files is
//! served from [`SnapshotCache`], any change triggers a rebuild.
//!
//! Features:
//! - Per-IP rate limiting on `POST /api/v1/predict`
//! - In-memory usage counters at `GET /stats`
//! - Structured logging via [`tracing`]

pub mod handlers;
pub mod logging;
pub mod middleware;
pub mod types;

pub use handlers::MAX_BODY_BYTES;
pub use logging::{Endpoint, UsageMetrics};
pub use types::{
    CacheStats, EndpointStats, ErrorResponse, HealthResponse, PredictionStats, RequestStats,
    ServerConfig, StatsResponse,
};

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use eyre::{Result, WrapErr};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::cache::SnapshotCache;
use crate::dashboard::{Dashboard, Sources};

// ---------------------------------------------------------------------------
// Server state
// ---------------------------------------------------------------------------

pub struct ServerState {
    pub config: ServerConfig,
    pub sources: Sources,
    pub start_time: Instant,
    pub rate_limiters: middleware::RateLimiterCache,
    pub usage: UsageMetrics,
    pub snapshots: SnapshotCache,
}

impl ServerState {
    pub fn new(config: ServerConfig) -> Self {
        let capacity = SnapshotCache::capacity_from_env(config.cache_capacity);
        let sources = Sources {
            dataset: config.dataset_path.clone(),
            model: config.model_path.clone(),
        };
        Self {
            config,
            sources,
            start_time: Instant::now(),
            rate_limiters: middleware::new_rate_limiter_cache(),
            usage: UsageMetrics::new(),
            snapshots: SnapshotCache::new(capacity),
        }
    }

    /// Snapshot for the files as they are on disk right now.
    pub async fn snapshot(&self) -> crate::Result<Arc<Dashboard>> {
        self.snapshots.load(&self.sources).await
    }
}

// ---------------------------------------------------------------------------
// HTTP server
// ---------------------------------------------------------------------------

/// All routes with their layers, ready to serve.
pub fn router(state: Arc<ServerState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(crate::ui::index_handler))
        .route("/health", get(handlers::health_handler))
        .route("/stats", get(handlers::stats_handler))
        .route("/api/v1/summary", get(handlers::summary_handler))
        .route("/api/v1/rows", get(handlers::rows_handler))
        .route("/api/v1/charts", get(handlers::charts_handler))
        .route("/api/v1/charts/{id}", get(handlers::chart_svg_handler))
        .route("/api/v1/form", get(handlers::form_handler))
        .route("/api/v1/predict", post(handlers::predict_handler))
        .route("/api/v1/importance", get(handlers::importance_handler))
        .route("/api/v1/insights", get(handlers::insights_handler))
        .layer(cors)
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}

/// Run the HTTP server until SIGINT/SIGTERM.
pub async fn run_server(config: ServerConfig) -> Result<()> {
    let bind_addr = config.bind_addr;
    let rate_limit_rpm = config.rate_limit_rpm;
    let state = Arc::new(ServerState::new(config));

    // Fail fast on unreadable inputs; later requests rebuild as files change.
    let initial = state
        .snapshot()
        .await
        .wrap_err("failed to build initial dashboard")?;
    info!(
        dataset = %state.sources.dataset.display(),
        model = %state.sources.model.display(),
        rows = initial.dataset.len(),
        model_kind = initial.model.kind(),
        "dashboard inputs loaded"
    );

    let app = router(state);

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .wrap_err_with(|| format!("failed to bind {bind_addr}"))?;
    info!(bind = %bind_addr, "boiler dashboard listening");
    info!("Endpoints: GET / (UI), GET /health, GET /stats, GET /api/v1/summary, GET /api/v1/rows, GET /api/v1/charts, GET /api/v1/charts/{{id}}, GET /api/v1/form, POST /api/v1/predict, GET /api/v1/importance, GET /api/v1/insights");
    if rate_limit_rpm > 0 {
        info!(rate_limit_rpm, "rate limiting enabled");
    } else {
        info!("rate limiting disabled");
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    };
    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut s) => {
                s.recv().await;
            }
            Err(_) => std::future::pending::<()>().await,
        }
    };
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down gracefully"),
        _ = sigterm => info!("received SIGTERM, shutting down gracefully"),
    }
}
