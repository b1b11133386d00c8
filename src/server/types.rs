//! Request/response types and configuration for the dashboard server.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::charts::Chart;
use crate::dashboard::{DEFAULT_DATASET_PATH, DEFAULT_MODEL_PATH};
use crate::dataset::Observation;
use crate::form::{InputField, Prediction};
use crate::importance::RankedFeature;
use crate::summary::Metric;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to (defaults to 127.0.0.1:8080; use 0.0.0.0 to expose externally)
    pub bind_addr: SocketAddr,
    /// CSV dataset, re-read on every request
    pub dataset_path: PathBuf,
    /// JSON model artifact, re-read on every request
    pub model_path: PathBuf,
    /// Rate limit for prediction requests per minute per IP (0 = no limit)
    pub rate_limit_rpm: u32,
    /// Number of dashboard snapshots kept in memory
    pub cache_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080"
                .parse()
                .expect("valid default bind address"),
            dataset_path: PathBuf::from(DEFAULT_DATASET_PATH),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            rate_limit_rpm: 60,
            cache_capacity: crate::cache::DEFAULT_CACHE_CAPACITY,
        }
    }
}

// ---------------------------------------------------------------------------
// Request / Response types
// ---------------------------------------------------------------------------

/// Error body shared by every endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Fingerprint of the current dataset and model, if they load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fingerprint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_kind: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub uptime_seconds: u64,
}

/// Stats response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub uptime_seconds: u64,
    pub requests: RequestStats,
    pub predictions: PredictionStats,
    pub endpoints: EndpointStats,
    pub cache: CacheStats,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RequestStats {
    pub total: u64,
    pub errors: u64,
    pub rate_limited: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PredictionStats {
    pub safe: u64,
    #[serde(rename = "unsafe")]
    pub unsafe_: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct EndpointStats {
    pub summary: u64,
    pub rows: u64,
    pub charts: u64,
    pub predict: u64,
    pub importance: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub entries: usize,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub success: bool,
    pub title: &'static str,
    pub subtitle: &'static str,
    pub fingerprint: String,
    pub rows: usize,
    pub metrics: Vec<Metric>,
}

/// Query string for the row preview slider.
#[derive(Debug, Deserialize)]
pub struct RowsQuery {
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct RowsResponse {
    pub success: bool,
    /// Slider value actually applied.
    pub count: usize,
    pub total: usize,
    pub step: usize,
    pub columns: Vec<String>,
    pub rows: Vec<Observation>,
}

#[derive(Debug, Serialize)]
pub struct ChartEntry<'a> {
    #[serde(flatten)]
    pub chart: &'a Chart,
    pub svg: &'a str,
}

#[derive(Debug, Serialize)]
pub struct ChartsResponse<'a> {
    pub success: bool,
    pub charts: Vec<ChartEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct FormResponse {
    pub success: bool,
    pub fields: &'static [InputField],
}

#[derive(Debug, Serialize)]
pub struct PredictResponse {
    pub success: bool,
    #[serde(flatten)]
    pub prediction: Prediction,
    pub processing_time_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct ImportanceResponse<'a> {
    pub success: bool,
    pub available: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warning: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<&'a [RankedFeature]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chart: Option<ChartEntry<'a>>,
}

#[derive(Debug, Serialize)]
pub struct InsightsResponse {
    pub success: bool,
    pub header: &'static str,
    pub markdown: &'static str,
}
