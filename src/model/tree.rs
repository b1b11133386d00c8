//! Decision tree inference over scikit-learn's array layout.
//!
//! Node `i` is a leaf when `children_left[i] == -1`. Internal nodes send a
//! sample left when `x[feature[i]] <= threshold[i]`. Leaves hold per-class
//! values (counts or weighted fractions) in `value[i]`.

use serde::{Deserialize, Serialize};

use super::Classifier;
use crate::error::{DashboardError, Result};

const LEAF: i64 = -1;

/// Serialized form of one fitted tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeArtifact {
    pub children_left: Vec<i64>,
    pub children_right: Vec<i64>,
    pub feature: Vec<i64>,
    pub threshold: Vec<f64>,
    /// `[n_nodes][n_classes]` class values at each node.
    pub value: Vec<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impurity: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weighted_n_node_samples: Option<Vec<f64>>,
}

#[derive(Debug, Clone)]
struct Node {
    left: usize,
    right: usize,
    feature: usize,
    threshold: f64,
    is_leaf: bool,
}

#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    /// Normalized class distribution per node.
    proba: Vec<Vec<f64>>,
    impurity: Option<Vec<f64>>,
    weights: Option<Vec<f64>>,
    n_features: usize,
    n_classes: usize,
}

impl DecisionTree {
    /// Validate the parallel arrays and build the tree.
    ///
    /// Children must be allocated after their parent (as scikit-learn does),
    /// which guarantees every traversal terminates.
    pub fn from_artifact(artifact: &TreeArtifact, n_features: usize, n_classes: usize) -> Result<Self> {
        let n = artifact.children_left.len();
        if n == 0 {
            return Err(DashboardError::InvalidModel("tree has no nodes".into()));
        }
        if artifact.children_right.len() != n
            || artifact.feature.len() != n
            || artifact.threshold.len() != n
            || artifact.value.len() != n
        {
            return Err(DashboardError::InvalidModel(
                "inconsistent tree array lengths".into(),
            ));
        }
        for optional in [&artifact.impurity, &artifact.weighted_n_node_samples]
            .into_iter()
            .flatten()
        {
            if optional.len() != n {
                return Err(DashboardError::InvalidModel(
                    "inconsistent impurity/sample array lengths".into(),
                ));
            }
        }

        let mut nodes = Vec::with_capacity(n);
        let mut proba = Vec::with_capacity(n);
        for i in 0..n {
            let (l, r) = (artifact.children_left[i], artifact.children_right[i]);
            let is_leaf = l == LEAF;
            let node = if is_leaf {
                Node {
                    left: 0,
                    right: 0,
                    feature: 0,
                    threshold: 0.0,
                    is_leaf,
                }
            } else {
                let in_range = |c: i64| c > i as i64 && (c as usize) < n;
                if !in_range(l) || !in_range(r) {
                    return Err(DashboardError::InvalidModel(format!(
                        "node {i} has out-of-order children ({l}, {r})"
                    )));
                }
                let feature = artifact.feature[i];
                if feature < 0 || feature as usize >= n_features {
                    return Err(DashboardError::InvalidModel(format!(
                        "node {i} splits on feature {feature}, model has {n_features}"
                    )));
                }
                Node {
                    left: l as usize,
                    right: r as usize,
                    feature: feature as usize,
                    threshold: artifact.threshold[i],
                    is_leaf,
                }
            };
            nodes.push(node);

            let values = &artifact.value[i];
            if values.len() != n_classes {
                return Err(DashboardError::InvalidModel(format!(
                    "node {i} has {} class values, model has {n_classes} classes",
                    values.len()
                )));
            }
            let total: f64 = values.iter().sum();
            let normalizer = if total == 0.0 { 1.0 } else { total };
            proba.push(values.iter().map(|v| v / normalizer).collect());
        }

        Ok(Self {
            nodes,
            proba,
            impurity: artifact.impurity.clone(),
            weights: artifact.weighted_n_node_samples.clone(),
            n_features,
            n_classes,
        })
    }

    fn leaf_index(&self, features: &[f64]) -> usize {
        let mut idx = 0;
        loop {
            let node = &self.nodes[idx];
            if node.is_leaf {
                return idx;
            }
            // Trees are fitted on single-precision inputs.
            let x = features[node.feature] as f32 as f64;
            idx = if x <= node.threshold {
                node.left
            } else {
                node.right
            };
        }
    }

    /// Normalized class distribution at the leaf reached by `features`.
    pub fn predict_proba(&self, features: &[f64]) -> &[f64] {
        &self.proba[self.leaf_index(features)]
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_leaf).count()
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    /// Mean decrease in impurity, normalized to sum to 1. `None` when the
    /// artifact carries no impurity statistics; all zeros for a stump.
    pub fn impurity_importances(&self) -> Option<Vec<f64>> {
        let impurity = self.impurity.as_ref()?;
        let weights = self.weights.as_ref()?;
        let mut importances = vec![0.0; self.n_features];
        for (i, node) in self.nodes.iter().enumerate() {
            if node.is_leaf {
                continue;
            }
            let (l, r) = (node.left, node.right);
            importances[node.feature] += weights[i] * impurity[i]
                - weights[l] * impurity[l]
                - weights[r] * impurity[r];
        }
        if weights[0] > 0.0 {
            for v in &mut importances {
                *v /= weights[0];
            }
        }
        let total: f64 = importances.iter().sum();
        if total > 0.0 {
            for v in &mut importances {
                *v /= total;
            }
        }
        Some(importances)
    }
}

/// A standalone tree classifier, optionally carrying exported importances.
#[derive(Debug, Clone)]
pub struct TreeClassifier {
    pub(crate) tree: DecisionTree,
    pub(crate) importances: Option<Vec<f64>>,
}

impl Classifier for TreeClassifier {
    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        self.tree.predict_proba(features).to_vec()
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.importances
            .clone()
            .or_else(|| self.tree.impurity_importances())
    }

    fn kind(&self) -> &'static str {
        "decision_tree"
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// f0 <= 0.5 → class 0, else class 1; gini impurities of a balanced split.
    pub(crate) fn stump_artifact(feature: i64) -> TreeArtifact {
        TreeArtifact {
            children_left: vec![1, -1, -1],
            children_right: vec![2, -1, -1],
            feature: vec![feature, -2, -2],
            threshold: vec![0.5, -2.0, -2.0],
            value: vec![vec![5.0, 5.0], vec![5.0, 0.0], vec![0.0, 5.0]],
            impurity: Some(vec![0.5, 0.0, 0.0]),
            weighted_n_node_samples: Some(vec![10.0, 5.0, 5.0]),
        }
    }

    /// f0 <= 5: (f1 <= 3 → 0 else 1); else (f0 <= 8 → 1 else 0)
    fn deeper_artifact() -> TreeArtifact {
        TreeArtifact {
            children_left: vec![1, 2, -1, -1, 5, -1, -1],
            children_right: vec![4, 3, -1, -1, 6, -1, -1],
            feature: vec![0, 1, -2, -2, 0, -2, -2],
            threshold: vec![5.0, 3.0, -2.0, -2.0, 8.0, -2.0, -2.0],
            value: vec![
                vec![6.0, 4.0],
                vec![3.0, 2.0],
                vec![3.0, 0.0],
                vec![0.0, 2.0],
                vec![3.0, 2.0],
                vec![0.0, 2.0],
                vec![3.0, 0.0],
            ],
            impurity: Some(vec![0.48, 0.48, 0.0, 0.0, 0.48, 0.0, 0.0]),
            weighted_n_node_samples: Some(vec![10.0, 5.0, 3.0, 2.0, 5.0, 2.0, 3.0]),
        }
    }

    #[test]
    fn test_stump_routes_on_threshold() {
        let tree = DecisionTree::from_artifact(&stump_artifact(0), 2, 2).unwrap();
        assert_eq!(tree.predict_proba(&[0.3, 9.0]), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba(&[0.7, 9.0]), &[0.0, 1.0]);
        // <= goes left
        assert_eq!(tree.predict_proba(&[0.5, 9.0]), &[1.0, 0.0]);
    }

    #[test]
    fn test_deeper_tree_paths() {
        let tree = DecisionTree::from_artifact(&deeper_artifact(), 2, 2).unwrap();
        assert_eq!(tree.predict_proba(&[3.0, 2.0]), &[1.0, 0.0]);
        assert_eq!(tree.predict_proba(&[3.0, 4.0]), &[0.0, 1.0]);
        assert_eq!(tree.predict_proba(&[7.0, 0.0]), &[0.0, 1.0]);
        assert_eq!(tree.predict_proba(&[9.0, 0.0]), &[1.0, 0.0]);
        assert_eq!(tree.n_nodes(), 7);
        assert_eq!(tree.n_leaves(), 4);
    }

    #[test]
    fn test_impurity_importances_normalized() {
        let tree = DecisionTree::from_artifact(&deeper_artifact(), 2, 2).unwrap();
        let imp = tree.impurity_importances().unwrap();
        // root split gains nothing; f1 at node 1 and f0 at node 4 each gain 2.4
        assert!((imp[0] - 0.5).abs() < 1e-12);
        assert!((imp[1] - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_importances_absent_without_impurity() {
        let mut artifact = stump_artifact(0);
        artifact.impurity = None;
        let tree = DecisionTree::from_artifact(&artifact, 2, 2).unwrap();
        assert!(tree.impurity_importances().is_none());
    }

    #[test]
    fn test_rejects_inconsistent_lengths() {
        let mut artifact = stump_artifact(0);
        artifact.threshold.pop();
        assert!(DecisionTree::from_artifact(&artifact, 2, 2).is_err());
    }

    #[test]
    fn test_rejects_backward_child_pointer() {
        let mut artifact = stump_artifact(0);
        artifact.children_left[0] = 0;
        let err = DecisionTree::from_artifact(&artifact, 2, 2).unwrap_err();
        assert!(err.to_string().contains("out-of-order"), "{err}");
    }

    #[test]
    fn test_rejects_feature_out_of_range() {
        let artifact = stump_artifact(4);
        assert!(DecisionTree::from_artifact(&artifact, 2, 2).is_err());
    }

    #[test]
    fn test_rejects_wrong_class_count() {
        let artifact = stump_artifact(0);
        assert!(DecisionTree::from_artifact(&artifact, 2, 3).is_err());
    }
}
