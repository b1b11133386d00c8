//! Summary panel: the three headline metrics shown above the charts.

use serde::Serialize;

use crate::dataset::{Dataset, FLUE_GAS_TEMP, STEAM_PRESSURE};
use crate::error::{DashboardError, Result};
use crate::stats;

/// One metric widget: a label and its pre-formatted value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metric {
    pub label: String,
    pub value: String,
    /// Unformatted value, for clients that want to re-format.
    pub raw: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub rows: usize,
    pub avg_flue_gas_temp: f64,
    pub avg_steam_pressure: f64,
    pub safe_percentage: f64,
    /// Three side-by-side widgets, left to right.
    pub metrics: Vec<Metric>,
}

/// Share of rows labeled "Safe", in percent.
///
/// A dataset without a single "Safe" row has no defined percentage and is
/// reported as [`DashboardError::MissingSafeLabel`].
pub fn safe_percentage(dataset: &Dataset) -> Result<f64> {
    let safe = dataset.rows().iter().filter(|r| r.is_safe()).count();
    if safe == 0 {
        return Err(DashboardError::MissingSafeLabel);
    }
    Ok(safe as f64 / dataset.len() as f64 * 100.0)
}

impl Summary {
    pub fn compute(dataset: &Dataset) -> Result<Self> {
        let column = |name: &str| {
            dataset
                .column_by_name(name)
                .ok_or_else(|| DashboardError::Schema(format!("missing '{name}' column")))
        };
        let avg_flue_gas_temp = stats::mean(&column(FLUE_GAS_TEMP)?);
        let avg_steam_pressure = stats::mean(&column(STEAM_PRESSURE)?);
        let safe_percentage = safe_percentage(dataset)?;

        let metrics = vec![
            Metric {
                label: "Avg Flue Gas Temp".into(),
                value: format!("{avg_flue_gas_temp:.2} °C"),
                raw: avg_flue_gas_temp,
            },
            Metric {
                label: "Avg Steam Pressure".into(),
                value: format!("{avg_steam_pressure:.2} bar"),
                raw: avg_steam_pressure,
            },
            Metric {
                label: "% Safe Boilers".into(),
                value: format!("{safe_percentage:.1}%"),
                raw: safe_percentage,
            },
        ];

        Ok(Self {
            rows: dataset.len(),
            avg_flue_gas_temp,
            avg_steam_pressure,
            safe_percentage,
            metrics,
        })
    }
}
