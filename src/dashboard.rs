//! A dashboard snapshot: everything the page shows for one pair of input
//! files, computed once and shared read-only.

use std::path::PathBuf;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use crate::charts::{self, Chart, IMPORTANCE_ID};
use crate::dataset::Dataset;
use crate::error::{DashboardError, Result};
use crate::form::{self, Prediction, PredictionInput};
use crate::importance::ImportanceReport;
use crate::model::Model;
use crate::render;
use crate::summary::Summary;

pub const TITLE: &str = "🚢 Boiler Fault Detection Dashboard";
pub const SUBTITLE: &str = "Monitor boiler performance and predict possible faults.";

pub const DEFAULT_DATASET_PATH: &str = "boiler_fault_dataset.csv";
pub const DEFAULT_MODEL_PATH: &str = "boiler_fault_model.json";

/// Locations of the two input files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sources {
    pub dataset: PathBuf,
    pub model: PathBuf,
}

impl Default for Sources {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from(DEFAULT_DATASET_PATH),
            model: PathBuf::from(DEFAULT_MODEL_PATH),
        }
    }
}

/// Raw contents of both input files.
#[derive(Debug, Clone)]
pub struct SourceBytes {
    pub dataset: Vec<u8>,
    pub model: Vec<u8>,
}

impl Sources {
    pub fn read(&self) -> Result<SourceBytes> {
        let dataset =
            std::fs::read(&self.dataset).map_err(|e| DashboardError::io(&self.dataset, e))?;
        let model = std::fs::read(&self.model).map_err(|e| DashboardError::io(&self.model, e))?;
        Ok(SourceBytes { dataset, model })
    }

    pub async fn read_async(&self) -> Result<SourceBytes> {
        let dataset = tokio::fs::read(&self.dataset)
            .await
            .map_err(|e| DashboardError::io(&self.dataset, e))?;
        let model = tokio::fs::read(&self.model)
            .await
            .map_err(|e| DashboardError::io(&self.model, e))?;
        Ok(SourceBytes { dataset, model })
    }
}

impl SourceBytes {
    /// `sha256:<hex>` over both files. Lengths are hashed too, so moving bytes
    /// from one file to the other changes the fingerprint.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        for part in [&self.dataset, &self.model] {
            hasher.update((part.len() as u64).to_le_bytes());
            hasher.update(part);
        }
        format!("sha256:{}", hex::encode(hasher.finalize()))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedChart {
    #[serde(flatten)]
    pub chart: Chart,
    pub svg: String,
}

impl RenderedChart {
    pub fn render(chart: Chart) -> Result<Self> {
        let svg = render::render_svg(&chart)?;
        Ok(Self { chart, svg })
    }
}

#[derive(Debug)]
pub struct Dashboard {
    pub fingerprint: String,
    pub dataset: Dataset,
    pub model: Model,
    pub summary: Summary,
    pub charts: Vec<RenderedChart>,
    pub importance: ImportanceReport,
    /// Present only when `importance` is ranked.
    pub importance_svg: Option<String>,
}

impl Dashboard {
    /// Read both files and build a snapshot.
    pub fn load(sources: &Sources) -> Result<Self> {
        Self::from_bytes(&sources.read()?)
    }

    pub fn from_bytes(bytes: &SourceBytes) -> Result<Self> {
        let dataset = Dataset::from_reader(bytes.dataset.as_slice())?;
        let model = Model::from_slice(&bytes.model)?;
        Self::build(dataset, model, bytes.fingerprint())
    }

    /// Compute every panel. Fails if any panel fails; a model without
    /// importances is not a failure.
    pub fn build(dataset: Dataset, model: Model, fingerprint: String) -> Result<Self> {
        let summary = Summary::compute(&dataset)?;
        let charts = charts::gallery(&dataset)
            .into_iter()
            .map(RenderedChart::render)
            .collect::<Result<Vec<_>>>()?;
        let importance = ImportanceReport::build(&model, dataset.feature_names())?;
        let importance_svg = match &importance {
            ImportanceReport::Ranked { chart, .. } => Some(render::render_svg(chart)?),
            ImportanceReport::Unavailable { .. } => None,
        };

        info!(
            fingerprint = %short(&fingerprint),
            rows = dataset.len(),
            model = model.kind(),
            charts = charts.len(),
            importance = importance.is_available(),
            "dashboard snapshot built"
        );

        Ok(Self {
            fingerprint,
            dataset,
            model,
            summary,
            charts,
            importance,
            importance_svg,
        })
    }

    /// SVG for a gallery chart or the importance chart.
    pub fn chart_svg(&self, id: &str) -> Option<&str> {
        if id == IMPORTANCE_ID {
            return self.importance_svg.as_deref();
        }
        self.charts
            .iter()
            .find(|c| c.chart.id == id)
            .map(|c| c.svg.as_str())
    }

    pub fn predict(&self, input: &PredictionInput) -> Result<Prediction> {
        form::submit(&self.model, input)
    }
}

/// First 12 hex digits, for log lines.
pub fn short(fingerprint: &str) -> &str {
    let hex = fingerprint.strip_prefix("sha256:").unwrap_or(fingerprint);
    &hex[..hex.len().min(12)]
}
