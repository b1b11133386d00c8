//! Boiler sensor dataset: fixed-schema CSV loaded into memory once per snapshot.
//!
//! The file has six numeric sensor columns and one categorical `Status`
//! column. The sensor columns must appear in [`FEATURE_COLUMNS`] order, the
//! order the model was trained on; `Status` may sit anywhere.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::error::{DashboardError, Result};

/// Label column name.
pub const STATUS_COLUMN: &str = "Status";
/// Label value counted by the "% Safe" metric and matched by the form.
pub const SAFE_LABEL: &str = "Safe";
/// Number of numeric sensor columns.
pub const NUM_FEATURES: usize = 6;

pub const FLUE_GAS_TEMP: &str = "FlueGasTemp";
pub const STEAM_PRESSURE: &str = "SteamPressure";

/// Sensor columns in model input order.
pub const FEATURE_COLUMNS: [&str; NUM_FEATURES] = [
    FLUE_GAS_TEMP,
    STEAM_PRESSURE,
    "FeedwaterConductivity",
    "DrumLevel",
    "FuelFlow",
    "OxygenContent",
];

/// Smallest value (and step) of the row preview slider.
pub const PREVIEW_STEP: usize = 5;

/// One row of the dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Observation {
    pub values: [f64; NUM_FEATURES],
    pub status: String,
}

impl Observation {
    pub fn is_safe(&self) -> bool {
        self.status == SAFE_LABEL
    }
}

#[derive(Debug, Clone)]
pub struct Dataset {
    feature_names: Vec<String>,
    /// Position of `Status` in the original header, kept so previews can
    /// reproduce the file's column order.
    status_position: usize,
    rows: Vec<Observation>,
}

impl Dataset {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| DashboardError::io(path, e))?;
        let dataset = Self::from_reader(file)?;
        debug!(path = %path.display(), rows = dataset.len(), "dataset loaded");
        Ok(dataset)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers = csv.headers()?.clone();
        let status_position = headers
            .iter()
            .position(|h| h == STATUS_COLUMN)
            .ok_or_else(|| DashboardError::Schema(format!("missing '{STATUS_COLUMN}' column")))?;

        let feature_names: Vec<String> = headers
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != status_position)
            .map(|(_, h)| h.to_string())
            .collect();

        if feature_names.len() != NUM_FEATURES {
            return Err(DashboardError::Schema(format!(
                "expected {NUM_FEATURES} sensor columns besides '{STATUS_COLUMN}', found {}",
                feature_names.len()
            )));
        }
        let expected_columns = feature_names.iter().zip(FEATURE_COLUMNS).enumerate();
        for (position, (found, expected)) in expected_columns {
            if found != expected {
                return Err(DashboardError::Schema(format!(
                    "sensor column {} must be '{expected}', found '{found}'",
                    position + 1
                )));
            }
        }

        let mut rows = Vec::new();
        for (line, record) in csv.records().enumerate() {
            let record = record?;
            let mut values = [0.0; NUM_FEATURES];
            let mut slot = 0;
            for (i, field) in record.iter().enumerate() {
                if i == status_position {
                    continue;
                }
                values[slot] = field.parse::<f64>().map_err(|_| {
                    DashboardError::Schema(format!(
                        "row {}: column '{}' has non-numeric value '{}'",
                        line + 1,
                        feature_names[slot],
                        field
                    ))
                })?;
                slot += 1;
            }
            let status = record
                .get(status_position)
                .unwrap_or_default()
                .to_string();
            rows.push(Observation { values, status });
        }

        if rows.is_empty() {
            return Err(DashboardError::EmptyDataset);
        }

        Ok(Self {
            feature_names,
            status_position,
            rows,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Sensor column names in file order.
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names
    }

    /// All column names, `Status` included, in file order.
    pub fn column_names(&self) -> Vec<String> {
        let mut names = self.feature_names.clone();
        names.insert(self.status_position, STATUS_COLUMN.to_string());
        names
    }

    pub fn status_position(&self) -> usize {
        self.status_position
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    pub fn feature_index(&self, name: &str) -> Option<usize> {
        self.feature_names.iter().position(|n| n == name)
    }

    /// Values of one sensor column.
    pub fn column(&self, index: usize) -> Vec<f64> {
        self.rows.iter().map(|r| r.values[index]).collect()
    }

    pub fn column_by_name(&self, name: &str) -> Option<Vec<f64>> {
        self.feature_index(name).map(|i| self.column(i))
    }

    /// Distinct labels in order of first appearance.
    pub fn labels(&self) -> Vec<String> {
        let mut labels: Vec<String> = Vec::new();
        for row in &self.rows {
            if !labels.contains(&row.status) {
                labels.push(row.status.clone());
            }
        }
        labels
    }

    /// Row count per label, labels in order of first appearance.
    pub fn status_counts(&self) -> Vec<(String, usize)> {
        self.labels()
            .into_iter()
            .map(|label| {
                let n = self.rows.iter().filter(|r| r.status == label).count();
                (label, n)
            })
            .collect()
    }

    /// Snap a requested slider value onto `{5, 10, ...} ∪ {len}` within `[5, len]`.
    pub fn snap_row_count(&self, requested: usize) -> usize {
        let total = self.len();
        if total <= PREVIEW_STEP {
            return total;
        }
        if requested >= total {
            return total;
        }
        let clamped = requested.max(PREVIEW_STEP);
        clamped - clamped % PREVIEW_STEP
    }

    /// First rows of the table as shown by the row-count slider.
    pub fn preview(&self, requested: usize) -> &[Observation] {
        &self.rows[..self.snap_row_count(requested)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CSV: &str = "\
FlueGasTemp,SteamPressure,FeedwaterConductivity,DrumLevel,FuelFlow,OxygenContent,Status
250.0,55.0,2.5,60.0,5.0,3.8,Safe
320.5,80.1,6.2,30.0,11.0,1.2,Unsafe
240.0,50.0,2.0,65.0,4.5,4.0,Safe
";

    #[test]
    fn test_parses_fixed_schema() {
        let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(ds.len(), 3);
        assert_eq!(ds.feature_names()[0], FLUE_GAS_TEMP);
        assert_eq!(ds.feature_names()[5], "OxygenContent");
        assert_eq!(ds.rows()[1].values, [320.5, 80.1, 6.2, 30.0, 11.0, 1.2]);
        assert_eq!(ds.rows()[1].status, "Unsafe");
        assert_eq!(ds.status_position(), 6);
    }

    const HEADER: &str =
        "FlueGasTemp,SteamPressure,FeedwaterConductivity,DrumLevel,FuelFlow,OxygenContent";

    #[test]
    fn test_status_column_anywhere() {
        let csv = format!("Status,{HEADER}\nSafe,1,2,3,4,5,6\n");
        let ds = Dataset::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(ds.rows()[0].values, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        assert_eq!(ds.column_names()[0], STATUS_COLUMN);
        assert_eq!(ds.column_names().len(), 7);
    }

    #[test]
    fn test_swapped_sensor_columns_are_schema_error() {
        let csv = "SteamPressure,FlueGasTemp,FeedwaterConductivity,DrumLevel,FuelFlow,OxygenContent,Status\n2,1,3,4,5,6,Safe\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::Schema(_)), "{err}");
        assert!(err.to_string().contains("'FlueGasTemp'"), "{err}");
    }

    #[test]
    fn test_unknown_sensor_column_is_schema_error() {
        let csv = "FlueGasTemp,SteamPressure,Foo,DrumLevel,FuelFlow,OxygenContent,Status\n1,2,3,4,5,6,Safe\n";
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("'Foo'"), "{err}");
    }

    #[test]
    fn test_missing_status_is_schema_error() {
        let csv = format!("{HEADER}\n1,2,3,4,5,6\n");
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, DashboardError::Schema(_)), "{err}");
    }

    #[test]
    fn test_wrong_feature_count_is_schema_error() {
        let csv = "FlueGasTemp,SteamPressure,A,Status\n1,2,3,Safe\n";
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes()),
            Err(DashboardError::Schema(_))
        ));
    }

    #[test]
    fn test_non_numeric_value_reports_row() {
        let csv = format!("{HEADER},Status\n1,2,x,4,5,6,Safe\n");
        let err = Dataset::from_reader(csv.as_bytes()).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("row 1"), "{msg}");
        assert!(msg.contains("'FeedwaterConductivity'"), "{msg}");
    }

    #[test]
    fn test_header_only_is_empty_error() {
        let csv = format!("{HEADER},Status\n");
        assert!(matches!(
            Dataset::from_reader(csv.as_bytes()),
            Err(DashboardError::EmptyDataset)
        ));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = Dataset::load("/nonexistent/boiler.csv").unwrap_err();
        assert!(matches!(err, DashboardError::Io { .. }));
    }

    #[test]
    fn test_labels_in_first_appearance_order() {
        let ds = Dataset::from_reader(CSV.as_bytes()).unwrap();
        assert_eq!(ds.labels(), vec!["Safe", "Unsafe"]);
        assert_eq!(
            ds.status_counts(),
            vec![("Safe".to_string(), 2), ("Unsafe".to_string(), 1)]
        );
    }

    fn dataset_with_rows(n: usize) -> Dataset {
        let mut csv = format!("{HEADER},Status\n");
        for i in 0..n {
            csv.push_str(&format!("{i},1,1,1,1,1,Safe\n"));
        }
        Dataset::from_reader(csv.as_bytes()).unwrap()
    }

    #[test]
    fn test_preview_shows_exactly_k_rows_for_every_slider_step() {
        let ds = dataset_with_rows(23);
        for k in (5..=20).step_by(5) {
            let rows = ds.preview(k);
            assert_eq!(rows.len(), k);
            assert_eq!(rows[k - 1].values[0], (k - 1) as f64);
        }
        assert_eq!(ds.preview(23).len(), 23);
    }

    #[test]
    fn test_preview_snaps_off_grid_values() {
        let ds = dataset_with_rows(23);
        assert_eq!(ds.snap_row_count(0), 5);
        assert_eq!(ds.snap_row_count(7), 5);
        assert_eq!(ds.snap_row_count(19), 15);
        assert_eq!(ds.snap_row_count(1000), 23);
    }

    #[test]
    fn test_preview_small_dataset_shows_everything() {
        let ds = dataset_with_rows(3);
        assert_eq!(ds.preview(5).len(), 3);
        assert_eq!(ds.preview(0).len(), 3);
    }
}
