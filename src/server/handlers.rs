//! HTTP endpoint handler functions.

use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

use axum::body::Bytes;
use axum::extract::rejection::{BytesRejection, QueryRejection};
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{info, warn};

use crate::dashboard::{Dashboard, SUBTITLE, TITLE};
use crate::dataset::PREVIEW_STEP;
use crate::error::DashboardError;
use crate::form::{PredictionInput, FIELDS};
use crate::importance::ImportanceReport;
use crate::insights::{INSIGHTS_HEADER, INSIGHTS_MARKDOWN};

use super::logging::Endpoint;
use super::types::*;
use super::ServerState;

/// Maximum request body size in bytes (64 KB).
pub const MAX_BODY_BYTES: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            success: false,
            error: error.into(),
        }),
    )
        .into_response()
}

fn failure(state: &ServerState, err: &DashboardError) -> Response {
    state.usage.record_error();
    if err.is_client_error() {
        return error_response(StatusCode::BAD_REQUEST, err.to_string());
    }
    warn!(error = %err, "dashboard unavailable");
    error_response(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

/// Count the hit and fetch the snapshot for the current files.
async fn snapshot(state: &ServerState, endpoint: Endpoint) -> Result<Arc<Dashboard>, Response> {
    state.usage.hit(endpoint);
    state.snapshot().await.map_err(|e| failure(state, &e))
}

fn svg_response(svg: &str) -> Response {
    ([(header::CONTENT_TYPE, "image/svg+xml")], svg.to_string()).into_response()
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub async fn health_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.usage.hit(Endpoint::Other);
    let (status, fingerprint, model_kind, error) = match state.snapshot().await {
        Ok(dash) => (
            "ok",
            Some(dash.fingerprint.clone()),
            Some(dash.model.kind().to_string()),
            None,
        ),
        Err(e) => ("error", None, None, Some(e.to_string())),
    };
    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        fingerprint,
        model_kind,
        error,
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

pub async fn stats_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    let usage = &state.usage;
    let load = |c: &std::sync::atomic::AtomicU64| c.load(Ordering::Relaxed);
    Json(StatsResponse {
        uptime_seconds: state.start_time.elapsed().as_secs(),
        requests: RequestStats {
            total: load(&usage.total_requests),
            errors: load(&usage.total_errors),
            rate_limited: load(&usage.rate_limited),
        },
        predictions: PredictionStats {
            safe: load(&usage.safe),
            unsafe_: load(&usage.unsafe_),
        },
        endpoints: EndpointStats {
            summary: load(&usage.ep_summary),
            rows: load(&usage.ep_rows),
            charts: load(&usage.ep_charts),
            predict: load(&usage.ep_predict),
            importance: load(&usage.ep_importance),
        },
        cache: CacheStats {
            hits: load(&state.snapshots.hits),
            misses: load(&state.snapshots.misses),
            entries: state.snapshots.len().await,
        },
    })
}

pub async fn summary_handler(State(state): State<Arc<ServerState>>) -> Response {
    let dash = match snapshot(&state, Endpoint::Summary).await {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    Json(SummaryResponse {
        success: true,
        title: TITLE,
        subtitle: SUBTITLE,
        fingerprint: dash.fingerprint.clone(),
        rows: dash.summary.rows,
        metrics: dash.summary.metrics.clone(),
    })
    .into_response()
}

pub async fn rows_handler(
    State(state): State<Arc<ServerState>>,
    query: Result<Query<RowsQuery>, QueryRejection>,
) -> Response {
    let Query(query) = match query {
        Ok(q) => q,
        Err(rejection) => {
            state.usage.hit(Endpoint::Rows);
            state.usage.record_error();
            return error_response(
                StatusCode::BAD_REQUEST,
                format!("Invalid query: {}", rejection.body_text()),
            );
        }
    };
    let dash = match snapshot(&state, Endpoint::Rows).await {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let requested = query.count.unwrap_or(PREVIEW_STEP);
    let rows = dash.dataset.preview(requested);
    Json(RowsResponse {
        success: true,
        count: rows.len(),
        total: dash.dataset.len(),
        step: PREVIEW_STEP,
        columns: dash.dataset.column_names(),
        rows: rows.to_vec(),
    })
    .into_response()
}

pub async fn charts_handler(State(state): State<Arc<ServerState>>) -> Response {
    let dash = match snapshot(&state, Endpoint::Charts).await {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let charts = dash
        .charts
        .iter()
        .map(|c| ChartEntry {
            chart: &c.chart,
            svg: &c.svg,
        })
        .collect();
    Json(ChartsResponse {
        success: true,
        charts,
    })
    .into_response()
}

pub async fn chart_svg_handler(
    State(state): State<Arc<ServerState>>,
    Path(id): Path<String>,
) -> Response {
    let dash = match snapshot(&state, Endpoint::Charts).await {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match dash.chart_svg(&id) {
        Some(svg) => svg_response(svg),
        None => error_response(StatusCode::NOT_FOUND, format!("Unknown chart '{id}'")),
    }
}

pub async fn form_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.usage.hit(Endpoint::Other);
    Json(FormResponse {
        success: true,
        fields: &FIELDS,
    })
}

pub async fn predict_handler(
    State(state): State<Arc<ServerState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let start = Instant::now();

    if let Some(limiter) = super::middleware::get_rate_limiter(
        state.config.rate_limit_rpm,
        &state.rate_limiters,
        addr.ip(),
    )
    .await
    {
        if limiter.check().is_err() {
            state.usage.hit(Endpoint::Predict);
            state.usage.record_rate_limited();
            return error_response(
                StatusCode::TOO_MANY_REQUESTS,
                format!(
                    "Rate limit exceeded. Maximum {} requests per minute.",
                    state.config.rate_limit_rpm
                ),
            );
        }
    }

    // Oversized bodies surface here as 413.
    let body = match body {
        Ok(body) => body,
        Err(rejection) => {
            state.usage.hit(Endpoint::Predict);
            state.usage.record_error();
            return error_response(rejection.status(), rejection.body_text());
        }
    };

    let input: PredictionInput = if body.iter().all(u8::is_ascii_whitespace) {
        PredictionInput::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(input) => input,
            Err(e) => {
                state.usage.hit(Endpoint::Predict);
                state.usage.record_error();
                return error_response(StatusCode::BAD_REQUEST, format!("Invalid JSON: {e}"));
            }
        }
    };

    let dash = match snapshot(&state, Endpoint::Predict).await {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    match dash.predict(&input) {
        Ok(prediction) => {
            state.usage.record_prediction(prediction.safe);
            info!(label = %prediction.label, "prediction served");
            Json(PredictResponse {
                success: true,
                prediction,
                processing_time_ms: start.elapsed().as_millis() as u64,
            })
            .into_response()
        }
        Err(e) => failure(&state, &e),
    }
}

pub async fn importance_handler(State(state): State<Arc<ServerState>>) -> Response {
    let dash = match snapshot(&state, Endpoint::Importance).await {
        Ok(d) => d,
        Err(resp) => return resp,
    };
    let response = match &dash.importance {
        ImportanceReport::Ranked { table, chart } => ImportanceResponse {
            success: true,
            available: true,
            warning: None,
            table: Some(table.as_slice()),
            chart: dash.importance_svg.as_deref().map(|svg| ChartEntry { chart, svg }),
        },
        ImportanceReport::Unavailable { warning } => ImportanceResponse {
            success: true,
            available: false,
            warning: Some(warning.as_str()),
            table: None,
            chart: None,
        },
    };
    Json(response).into_response()
}

pub async fn insights_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    state.usage.hit(Endpoint::Other);
    Json(InsightsResponse {
        success: true,
        header: INSIGHTS_HEADER,
        markdown: INSIGHTS_MARKDOWN,
    })
}
