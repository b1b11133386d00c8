//! Boiler fault detection dashboard.
//!
//! Loads a fixed-schema CSV of boiler sensor readings and a pre-trained
//! classifier, and serves:
//! - **Summary**: average flue gas temperature, average steam pressure, % Safe
//! - **Charts**: status counts, correlation heatmap, per-sensor distributions
//!   and per-status boxplots, rendered to SVG
//! - **Prediction**: six sensor readings in, "Safe" or "Unsafe" out
//! - **Importance**: ranked feature importances for tree-based models
//!
//! Everything the page shows for one pair of input files is a
//! [`dashboard::Dashboard`] snapshot, cached by the files' SHA-256
//! fingerprint.
//!
//! Uses structured logging via [`tracing`]. Set the `RUST_LOG` environment
//! variable to control log verbosity (e.g., `RUST_LOG=boilerwatch=debug`).

pub mod cache;
pub mod charts;
pub mod dashboard;
pub mod dataset;
pub mod error;
pub mod form;
pub mod importance;
pub mod insights;
pub mod model;
pub mod render;
pub mod server;
pub mod stats;
pub mod summary;
pub mod ui;

pub use dashboard::{Dashboard, Sources};
pub use error::{DashboardError, Result};
