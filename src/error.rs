//! Error type shared by the loaders, the dashboard pipeline, and the server.

use std::path::PathBuf;

/// Everything that can stop a dashboard snapshot from being built.
#[derive(thiserror::Error, Debug)]
pub enum DashboardError {
    /// A dataset or model file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CSV could not be tokenized or a field failed to parse.
    #[error("dataset parse error: {0}")]
    Csv(#[from] csv::Error),

    /// The CSV header does not match the fixed boiler schema.
    #[error("dataset schema mismatch: {0}")]
    Schema(String),

    /// The dataset has a header but no rows.
    #[error("dataset contains no rows")]
    EmptyDataset,

    /// No row carries the "Safe" label, so the safe percentage is undefined.
    #[error("dataset has no rows labeled \"Safe\"")]
    MissingSafeLabel,

    /// The model artifact is not valid JSON for any supported estimator.
    #[error("model artifact parse error: {0}")]
    ModelFormat(#[from] serde_json::Error),

    /// The model artifact parsed but is structurally inconsistent.
    #[error("invalid model: {0}")]
    InvalidModel(String),

    /// A feature vector or importance vector has the wrong length.
    #[error("expected {expected} features, got {actual}")]
    FeatureCount { expected: usize, actual: usize },

    /// A submitted value is NaN or infinite.
    #[error("input '{field}' is not a finite number")]
    NonFiniteInput { field: String },

    /// The chart backend failed to draw.
    #[error("chart rendering failed: {0}")]
    Render(String),

    /// The blocking task building a snapshot panicked or was cancelled.
    #[error("snapshot build task failed: {0}")]
    BuildTask(#[from] tokio::task::JoinError),
}

pub type Result<T> = std::result::Result<T, DashboardError>;

impl DashboardError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error was caused by the caller's input rather than the
    /// files backing the dashboard.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::NonFiniteInput { .. })
    }
}
