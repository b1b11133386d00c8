//! Chart gallery as plain data.
//!
//! Every chart is computed from the dataset alone and rendered separately by
//! [`crate::render`], so the same values can be served as JSON and as SVG.

use serde::Serialize;

use crate::dataset::{Dataset, STATUS_COLUMN};
use crate::stats::{self, Bin, BoxStats, Point};

pub const STATUS_COUNT_ID: &str = "status_count";
pub const CORRELATION_ID: &str = "correlation";
pub const IMPORTANCE_ID: &str = "importance";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxGroup {
    pub label: String,
    pub stats: BoxStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ChartData {
    /// Vertical bars, one per category.
    Count { labels: Vec<String>, counts: Vec<usize> },
    /// Square matrix, rows and columns both ordered as `labels`.
    /// Undefined cells (constant columns) are NaN and serialize as null.
    Heatmap {
        labels: Vec<String>,
        matrix: Vec<Vec<f64>>,
    },
    Histogram { bins: Vec<Bin>, kde: Vec<Point> },
    Boxplot { groups: Vec<BoxGroup> },
    /// Horizontal bars, first entry drawn at the top.
    Bar { labels: Vec<String>, values: Vec<f64> },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub id: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    #[serde(flatten)]
    pub data: ChartData,
}

pub fn histogram_id(column: &str) -> String {
    format!("hist_{column}")
}

pub fn boxplot_id(column: &str) -> String {
    format!("box_{column}")
}

pub fn status_count(dataset: &Dataset) -> Chart {
    let (labels, counts) = dataset.status_counts().into_iter().unzip();
    Chart {
        id: STATUS_COUNT_ID.into(),
        title: "Safe vs Unsafe Boilers".into(),
        x_label: STATUS_COLUMN.into(),
        y_label: "count".into(),
        data: ChartData::Count { labels, counts },
    }
}

pub fn correlation(dataset: &Dataset) -> Chart {
    let columns: Vec<Vec<f64>> = (0..dataset.feature_names().len())
        .map(|i| dataset.column(i))
        .collect();
    Chart {
        id: CORRELATION_ID.into(),
        title: "Correlation Heatmap".into(),
        x_label: String::new(),
        y_label: String::new(),
        data: ChartData::Heatmap {
            labels: dataset.feature_names().to_vec(),
            matrix: stats::correlation_matrix(&columns),
        },
    }
}

/// Histogram with an overlaid KDE curve scaled to bin counts.
pub fn distribution(dataset: &Dataset, index: usize) -> Chart {
    let column = &dataset.feature_names()[index];
    let values = dataset.column(index);
    let bins = stats::histogram(&values);
    let width = bins.first().map(|b| b.end - b.start).unwrap_or(1.0);
    Chart {
        id: histogram_id(column),
        title: format!("Distribution of {column}"),
        x_label: column.clone(),
        y_label: "Count".into(),
        data: ChartData::Histogram {
            kde: stats::kde_curve(&values, width),
            bins,
        },
    }
}

/// One box per label, labels in order of first appearance.
pub fn by_status(dataset: &Dataset, index: usize) -> Chart {
    let column = &dataset.feature_names()[index];
    let groups = dataset
        .labels()
        .into_iter()
        .filter_map(|label| {
            let values: Vec<f64> = dataset
                .rows()
                .iter()
                .filter(|r| r.status == label)
                .map(|r| r.values[index])
                .collect();
            BoxStats::compute(&values).map(|stats| BoxGroup { label, stats })
        })
        .collect();
    Chart {
        id: boxplot_id(column),
        title: format!("{column} by Boiler Status"),
        x_label: STATUS_COLUMN.into(),
        y_label: column.clone(),
        data: ChartData::Boxplot { groups },
    }
}

/// The full gallery in display order: count plot, heatmap, every
/// distribution, then every per-status boxplot.
pub fn gallery(dataset: &Dataset) -> Vec<Chart> {
    let n = dataset.feature_names().len();
    let mut charts = Vec::with_capacity(2 + 2 * n);
    charts.push(status_count(dataset));
    charts.push(correlation(dataset));
    charts.extend((0..n).map(|i| distribution(dataset, i)));
    charts.extend((0..n).map(|i| by_status(dataset, i)));
    charts
}
