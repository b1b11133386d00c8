//! Fitted boiler status classifier, loaded from a JSON export of a
//! scikit-learn estimator.
//!
//! The artifact is tagged by `kind`:
//! - `random_forest`: `classes`, `n_features`, `trees`, optional `feature_importances`
//! - `decision_tree`: `classes`, `n_features`, `tree`, optional `feature_importances`
//! - `logistic_regression`: `classes`, `n_features`, `coef`, `intercept`
//!
//! Tree models without exported importances fall back to mean decrease in
//! impurity when the nodes carry `impurity` and `weighted_n_node_samples`.
//! Logistic regression exposes no importances at all.
//!
//! Inference only; nothing here trains or mutates a model.

pub mod forest;
pub mod linear;
pub mod tree;

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dataset::NUM_FEATURES;
use crate::error::{DashboardError, Result};

use self::forest::RandomForest;
use self::linear::{LinearArtifact, LogisticRegression};
use self::tree::{DecisionTree, TreeArtifact, TreeClassifier};

/// Inference surface shared by every supported estimator.
pub trait Classifier: Send + Sync {
    /// Class probabilities, parallel to the model's `classes`.
    fn predict_proba(&self, features: &[f64]) -> Vec<f64>;

    /// Index of the predicted class.
    fn predict_index(&self, features: &[f64]) -> usize {
        argmax(&self.predict_proba(features))
    }

    /// Per-feature importance weights, if this estimator defines them.
    fn feature_importances(&self) -> Option<Vec<f64>> {
        None
    }

    fn kind(&self) -> &'static str;
}

/// Index of the first maximum.
pub(crate) fn argmax(values: &[f64]) -> usize {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelArtifact {
    RandomForest {
        classes: Vec<String>,
        n_features: usize,
        trees: Vec<TreeArtifact>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feature_importances: Option<Vec<f64>>,
    },
    DecisionTree {
        classes: Vec<String>,
        n_features: usize,
        tree: TreeArtifact,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        feature_importances: Option<Vec<f64>>,
    },
    LogisticRegression {
        classes: Vec<String>,
        n_features: usize,
        #[serde(flatten)]
        linear: LinearArtifact,
    },
}

pub struct Model {
    classes: Vec<String>,
    estimator: Box<dyn Classifier>,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("kind", &self.estimator.kind())
            .field("classes", &self.classes)
            .finish()
    }
}

fn check_importances(importances: &Option<Vec<f64>>, n_features: usize) -> Result<()> {
    match importances {
        Some(v) if v.len() != n_features => Err(DashboardError::FeatureCount {
            expected: n_features,
            actual: v.len(),
        }),
        _ => Ok(()),
    }
}

impl Model {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| DashboardError::io(path, e))?;
        let model = Self::from_json(&json)?;
        debug!(path = %path.display(), kind = model.kind(), "model loaded");
        Ok(model)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Self::from_slice(json.as_bytes())
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let artifact: ModelArtifact = serde_json::from_slice(bytes)?;
        Self::from_artifact(artifact)
    }

    pub fn from_artifact(artifact: ModelArtifact) -> Result<Self> {
        let (classes, n_features, estimator): (Vec<String>, usize, Box<dyn Classifier>) =
            match artifact {
                ModelArtifact::RandomForest {
                    classes,
                    n_features,
                    trees,
                    feature_importances,
                } => {
                    check_importances(&feature_importances, n_features)?;
                    let trees = trees
                        .iter()
                        .map(|t| DecisionTree::from_artifact(t, n_features, classes.len()))
                        .collect::<Result<Vec<_>>>()?;
                    let forest = RandomForest::from_trees(trees, feature_importances)?;
                    (classes, n_features, Box::new(forest))
                }
                ModelArtifact::DecisionTree {
                    classes,
                    n_features,
                    tree,
                    feature_importances,
                } => {
                    check_importances(&feature_importances, n_features)?;
                    let tree = DecisionTree::from_artifact(&tree, n_features, classes.len())?;
                    let clf = TreeClassifier {
                        tree,
                        importances: feature_importances,
                    };
                    (classes, n_features, Box::new(clf))
                }
                ModelArtifact::LogisticRegression {
                    classes,
                    n_features,
                    linear,
                } => {
                    let lr = LogisticRegression::from_artifact(linear, n_features, classes.len())?;
                    (classes, n_features, Box::new(lr))
                }
            };

        if classes.is_empty() {
            return Err(DashboardError::InvalidModel("model has no classes".into()));
        }
        if n_features != NUM_FEATURES {
            return Err(DashboardError::FeatureCount {
                expected: NUM_FEATURES,
                actual: n_features,
            });
        }

        Ok(Self { classes, estimator })
    }

    pub fn classes(&self) -> &[String] {
        &self.classes
    }

    pub fn kind(&self) -> &'static str {
        self.estimator.kind()
    }

    /// Predicted label for one ordered sensor vector.
    pub fn predict(&self, features: &[f64]) -> Result<String> {
        if features.len() != NUM_FEATURES {
            return Err(DashboardError::FeatureCount {
                expected: NUM_FEATURES,
                actual: features.len(),
            });
        }
        let idx = self.estimator.predict_index(features);
        Ok(self.classes[idx.min(self.classes.len() - 1)].clone())
    }

    pub fn predict_proba(&self, features: &[f64]) -> Result<Vec<f64>> {
        if features.len() != NUM_FEATURES {
            return Err(DashboardError::FeatureCount {
                expected: NUM_FEATURES,
                actual: features.len(),
            });
        }
        Ok(self.estimator.predict_proba(features))
    }

    pub fn feature_importances(&self) -> Option<Vec<f64>> {
        self.estimator.feature_importances()
    }
}
