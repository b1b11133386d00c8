//! Feature importance report: a ranked table and a horizontal bar chart, or
//! a warning when the model does not expose importances.

use serde::Serialize;

use crate::charts::{Chart, ChartData, IMPORTANCE_ID};
use crate::error::{DashboardError, Result};
use crate::model::Model;

pub const IMPORTANCE_WARNING: &str =
    "Feature importance is only available for tree-based models like Random Forest.";
pub const IMPORTANCE_TITLE: &str = "Feature Importance for Boiler Fault Detection";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedFeature {
    pub feature: String,
    pub importance: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ImportanceReport {
    Ranked {
        table: Vec<RankedFeature>,
        chart: Chart,
    },
    Unavailable { warning: String },
}

/// Pair names with weights and sort descending. Equal weights keep their
/// column order.
pub fn rank(feature_names: &[String], importances: &[f64]) -> Result<Vec<RankedFeature>> {
    if feature_names.len() != importances.len() {
        return Err(DashboardError::FeatureCount {
            expected: feature_names.len(),
            actual: importances.len(),
        });
    }
    let mut table: Vec<RankedFeature> = feature_names
        .iter()
        .zip(importances)
        .map(|(name, w)| RankedFeature {
            feature: name.clone(),
            importance: *w,
        })
        .collect();
    table.sort_by(|a, b| b.importance.total_cmp(&a.importance));
    Ok(table)
}

impl ImportanceReport {
    pub fn build(model: &Model, feature_names: &[String]) -> Result<Self> {
        let Some(importances) = model.feature_importances() else {
            return Ok(Self::Unavailable {
                warning: IMPORTANCE_WARNING.to_string(),
            });
        };
        let table = rank(feature_names, &importances)?;
        let chart = Chart {
            id: IMPORTANCE_ID.into(),
            title: IMPORTANCE_TITLE.into(),
            x_label: "Importance".into(),
            y_label: "Feature".into(),
            data: ChartData::Bar {
                labels: table.iter().map(|r| r.feature.clone()).collect(),
                values: table.iter().map(|r| r.importance).collect(),
            },
        };
        Ok(Self::Ranked { table, chart })
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Self::Ranked { .. })
    }
}
