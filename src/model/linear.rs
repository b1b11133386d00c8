//! Logistic regression. Linear models carry no impurity statistics, so this
//! estimator never reports feature importances.

use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::error::{DashboardError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinearArtifact {
    /// `[1][n_features]` for two classes, `[n_classes][n_features]` otherwise.
    pub coef: Vec<Vec<f64>>,
    pub intercept: Vec<f64>,
}

#[derive(Debug, Clone)]
pub struct LogisticRegression {
    coef: Vec<Vec<f64>>,
    intercept: Vec<f64>,
    n_classes: usize,
}

impl LogisticRegression {
    pub fn from_artifact(artifact: LinearArtifact, n_features: usize, n_classes: usize) -> Result<Self> {
        let expected_rows = if n_classes == 2 { 1 } else { n_classes };
        if artifact.coef.len() != expected_rows || artifact.intercept.len() != expected_rows {
            return Err(DashboardError::InvalidModel(format!(
                "expected {expected_rows} coefficient rows for {n_classes} classes"
            )));
        }
        if let Some(row) = artifact.coef.iter().find(|r| r.len() != n_features) {
            return Err(DashboardError::FeatureCount {
                expected: n_features,
                actual: row.len(),
            });
        }
        Ok(Self {
            coef: artifact.coef,
            intercept: artifact.intercept,
            n_classes,
        })
    }

    fn decision(&self, features: &[f64]) -> Vec<f64> {
        self.coef
            .iter()
            .zip(&self.intercept)
            .map(|(row, b)| row.iter().zip(features).map(|(w, x)| w * x).sum::<f64>() + b)
            .collect()
    }
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

impl Classifier for LogisticRegression {
    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let scores = self.decision(features);
        if self.n_classes == 2 {
            let p = sigmoid(scores[0]);
            return vec![1.0 - p, p];
        }
        let max = scores.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
        let exp: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
        let total: f64 = exp.iter().sum();
        exp.iter().map(|e| e / total).collect()
    }

    fn predict_index(&self, features: &[f64]) -> usize {
        let scores = self.decision(features);
        if self.n_classes == 2 {
            return usize::from(scores[0] > 0.0);
        }
        super::argmax(&scores)
    }

    fn kind(&self) -> &'static str {
        "logistic_regression"
    }
}
