//! Random forest: soft voting over [`DecisionTree`]s.
//!
//! Each tree contributes its normalized leaf distribution; the forest's
//! probability is the mean over trees and the prediction is its argmax.

use super::tree::DecisionTree;
use super::Classifier;
use crate::error::{DashboardError, Result};

#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    importances: Option<Vec<f64>>,
    n_classes: usize,
}

impl RandomForest {
    pub fn from_trees(trees: Vec<DecisionTree>, importances: Option<Vec<f64>>) -> Result<Self> {
        let first = trees
            .first()
            .ok_or_else(|| DashboardError::InvalidModel("empty forest".into()))?;
        let (n_features, n_classes) = (first.n_features(), first.n_classes());
        if trees
            .iter()
            .any(|t| t.n_features() != n_features || t.n_classes() != n_classes)
        {
            return Err(DashboardError::InvalidModel(
                "inconsistent tree shapes across forest".into(),
            ));
        }
        Ok(Self {
            trees,
            importances,
            n_classes,
        })
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn total_nodes(&self) -> usize {
        self.trees.iter().map(DecisionTree::n_nodes).sum()
    }

    /// Mean of per-tree impurity importances over trees with at least one
    /// split, renormalized. `None` if any tree lacks impurity statistics.
    pub fn impurity_importances(&self) -> Option<Vec<f64>> {
        let n_features = self.trees[0].n_features();
        let mut per_tree = Vec::new();
        for tree in &self.trees {
            let imp = tree.impurity_importances()?;
            if tree.n_nodes() > 1 {
                per_tree.push(imp);
            }
        }
        if per_tree.is_empty() {
            return Some(vec![0.0; n_features]);
        }
        let mut mean = vec![0.0; n_features];
        for imp in &per_tree {
            for (m, v) in mean.iter_mut().zip(imp) {
                *m += v / per_tree.len() as f64;
            }
        }
        let total: f64 = mean.iter().sum();
        if total > 0.0 {
            for m in &mut mean {
                *m /= total;
            }
        }
        Some(mean)
    }
}

impl Classifier for RandomForest {
    fn predict_proba(&self, features: &[f64]) -> Vec<f64> {
        let mut proba = vec![0.0; self.n_classes];
        for tree in &self.trees {
            for (p, v) in proba.iter_mut().zip(tree.predict_proba(features)) {
                *p += v;
            }
        }
        let n = self.trees.len() as f64;
        proba.iter_mut().for_each(|p| *p /= n);
        proba
    }

    fn feature_importances(&self) -> Option<Vec<f64>> {
        self.importances
            .clone()
            .or_else(|| self.impurity_importances())
    }

    fn kind(&self) -> &'static str {
        "random_forest"
    }
}
