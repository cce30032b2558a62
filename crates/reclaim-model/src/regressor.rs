//! Gradient-boosted regression tree ensembles.
//!
//! Prediction is `init + learning_rate * sum(leaf values)`, one leaf per
//! tree. A sample goes to the left child when `x[feature] <= threshold`.

use crate::error::InferenceError;
use crate::preprocess::EncodedFeatures;
use serde::{Deserialize, Serialize};

/// A node of a regression tree. Nodes are stored in a flat list and the root
/// is at index 0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: f64,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    pub nodes: Vec<TreeNode>,
}

impl RegressionTree {
    /// Walk from the root to a leaf. Requires a tree that passed
    /// [`GradientBoostingRegressor::validate`].
    fn leaf_value(&self, x: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if x[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }
}

/// Regressor artifact for one target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientBoostingRegressor {
    /// Baseline prediction before any tree contributes.
    pub init: f64,
    pub learning_rate: f64,
    pub n_features: usize,

    /// Names of the features seen at fit time, if recorded.
    #[serde(default)]
    pub feature_names: Option<Vec<String>>,

    pub trees: Vec<RegressionTree>,
}

impl GradientBoostingRegressor {
    /// Structural checks run at load time so that prediction cannot index
    /// out of bounds or loop.
    pub fn validate(&self) -> Result<(), String> {
        if !self.init.is_finite() || !self.learning_rate.is_finite() {
            return Err("init and learning_rate must be finite".into());
        }
        if let Some(names) = &self.feature_names {
            if names.len() != self.n_features {
                return Err(format!(
                    "{} feature names recorded for {} features",
                    names.len(),
                    self.n_features
                ));
            }
        }
        for (t, tree) in self.trees.iter().enumerate() {
            if tree.nodes.is_empty() {
                return Err(format!("tree {t} has no nodes"));
            }
            for (i, node) in tree.nodes.iter().enumerate() {
                match node {
                    TreeNode::Split {
                        feature,
                        threshold,
                        left,
                        right,
                    } => {
                        if *feature >= self.n_features {
                            return Err(format!(
                                "tree {t} node {i} splits on feature {feature} of {}",
                                self.n_features
                            ));
                        }
                        if threshold.is_nan() {
                            return Err(format!("tree {t} node {i} has a NaN threshold"));
                        }
                        // Children must point forward; this rules out cycles.
                        for child in [*left, *right] {
                            if child <= i || child >= tree.nodes.len() {
                                return Err(format!("tree {t} node {i} has invalid child {child}"));
                            }
                        }
                    }
                    TreeNode::Leaf { value } => {
                        if !value.is_finite() {
                            return Err(format!("tree {t} leaf {i} is not finite"));
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Predict a single value for one encoded row.
    pub fn predict(&self, features: &EncodedFeatures) -> Result<f64, InferenceError> {
        if features.len() != self.n_features {
            return Err(InferenceError::FeatureCount {
                expected: self.n_features,
                found: features.len(),
            });
        }
        if let Some(expected) = &self.feature_names {
            if let Some((position, (e, f))) = expected
                .iter()
                .zip(&features.names)
                .enumerate()
                .find(|(_, (e, f))| e != f)
            {
                return Err(InferenceError::FeatureNames {
                    position,
                    expected: e.clone(),
                    found: f.clone(),
                });
            }
        }

        let sum: f64 = self
            .trees
            .iter()
            .map(|tree| tree.leaf_value(&features.values))
            .sum();
        Ok(self.init + self.learning_rate * sum)
    }
}
