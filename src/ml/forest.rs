//! Random forest regressor
//!
//! Bagged CART regression trees, averaged at prediction time.
//!
//! # Tree Traversal
//!
//! - Start at node 0 (root)
//! - A `Leaf` returns its value
//! - A `Split` compares `row[feature]` to `threshold`
//!   - `<= threshold` or `NaN` goes to `left`
//!   - otherwise to `right`
//!
//! # Training
//!
//! Each tree is grown on a bootstrap sample drawn from a seeded `StdRng`.
//! Splits maximize the reduction in squared error; thresholds sit halfway
//! between adjacent distinct values. Growth stops at `max_depth`, when a node
//! has fewer than `min_samples_split` rows, when its targets are constant, or
//! when no split leaves `min_samples_leaf` rows on both sides.

use super::estimator::{check_training_matrix, FittedModel, Regressor};
use crate::error::{PredictorError, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// A node of a fitted regression tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
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

/// Tree growth limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeParams {
    /// Maximum depth (None = grow until pure)
    pub max_depth: Option<usize>,
    /// Minimum rows required to split a node
    pub min_samples_split: usize,
    /// Minimum rows in each child
    pub min_samples_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
        }
    }
}

/// Forest hyperparameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ForestParams {
    pub n_estimators: usize,
    pub tree: TreeParams,
    /// Sample rows with replacement for each tree
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for ForestParams {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeParams::default(),
            bootstrap: true,
            seed: 42,
        }
    }
}

/// A fitted regression tree, nodes in pre-order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Copy)]
struct SplitCandidate {
    feature: usize,
    threshold: f64,
    gain: f64,
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    y: &'a [f64],
    params: &'a TreeParams,
    n_features: usize,
    nodes: Vec<TreeNode>,
}

impl<'a> TreeBuilder<'a> {
    fn grow(&mut self, samples: &mut [usize], depth: usize) -> usize {
        let idx = self.nodes.len();
        let n = samples.len();
        let sum: f64 = samples.iter().map(|&s| self.y[s]).sum();
        self.nodes.push(TreeNode::Leaf { value: sum / n as f64 });

        if self.is_terminal(samples, depth) {
            return idx;
        }
        let Some(split) = self.best_split(samples, sum) else {
            return idx;
        };

        // Move rows going left to the front
        let x = self.x;
        let mut mid = 0;
        for i in 0..n {
            if x[samples[i]][split.feature] <= split.threshold {
                samples.swap(i, mid);
                mid += 1;
            }
        }

        let (left_rows, right_rows) = samples.split_at_mut(mid);
        let left = self.grow(left_rows, depth + 1);
        let right = self.grow(right_rows, depth + 1);
        self.nodes[idx] = TreeNode::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        idx
    }

    fn is_terminal(&self, samples: &[usize], depth: usize) -> bool {
        let n = samples.len();
        if n < self.params.min_samples_split.max(2) || n < 2 * self.params.min_samples_leaf.max(1) {
            return true;
        }
        if self.params.max_depth.is_some_and(|max| depth >= max) {
            return true;
        }
        let first = self.y[samples[0]];
        samples.iter().all(|&s| self.y[s] == first)
    }

    fn best_split(&self, samples: &[usize], total: f64) -> Option<SplitCandidate> {
        let n = samples.len();
        let min_leaf = self.params.min_samples_leaf.max(1);
        let parent_score = total * total / n as f64;
        let mut order = samples.to_vec();
        let mut best: Option<SplitCandidate> = None;

        for feature in 0..self.n_features {
            order.sort_by(|&a, &b| self.x[a][feature].total_cmp(&self.x[b][feature]));

            let mut left_sum = 0.0;
            for i in 0..n - 1 {
                left_sum += self.y[order[i]];
                let left_n = i + 1;
                let right_n = n - left_n;
                if left_n < min_leaf || right_n < min_leaf {
                    continue;
                }

                let lo = self.x[order[i]][feature];
                let hi = self.x[order[i + 1]][feature];
                if lo >= hi {
                    continue;
                }

                let right_sum = total - left_sum;
                let score = left_sum * left_sum / left_n as f64 + right_sum * right_sum / right_n as f64;
                let gain = score - parent_score;
                if gain > 0.0 && best.map_or(true, |b| gain > b.gain) {
                    best = Some(SplitCandidate {
                        feature,
                        threshold: midpoint(lo, hi),
                        gain,
                    });
                }
            }
        }

        best
    }
}

/// Halfway between two adjacent distinct values, never equal to `hi`
fn midpoint(lo: f64, hi: f64) -> f64 {
    let mid = lo + (hi - lo) / 2.0;
    if mid < hi {
        mid
    } else {
        lo
    }
}

impl RegressionTree {
    /// Grow a tree on the given row indices (duplicates allowed)
    pub fn fit(x: &[Vec<f64>], y: &[f64], mut samples: Vec<usize>, params: &TreeParams) -> Result<Self> {
        let n_features = check_training_matrix(x, y)?;
        if samples.is_empty() {
            return Err(PredictorError::Estimator("tree sample is empty".into()));
        }
        if let Some(&bad) = samples.iter().find(|&&s| s >= x.len()) {
            return Err(PredictorError::Estimator(format!("sample index {} out of range", bad)));
        }

        let mut builder = TreeBuilder {
            x,
            y,
            params,
            n_features,
            nodes: Vec::new(),
        };
        builder.grow(&mut samples, 0);
        Ok(Self { nodes: builder.nodes })
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    /// Longest root-to-leaf path
    pub fn depth(&self) -> usize {
        fn walk(nodes: &[TreeNode], idx: usize) -> usize {
            match nodes[idx] {
                TreeNode::Leaf { .. } => 0,
                TreeNode::Split { left, right, .. } => 1 + walk(nodes, left).max(walk(nodes, right)),
            }
        }
        if self.nodes.is_empty() {
            0
        } else {
            walk(&self.nodes, 0)
        }
    }

    /// Traverse the tree for a row and return the leaf value
    #[inline]
    pub fn predict_row(&self, row: &[f64]) -> f64 {
        let mut node_idx = 0usize;

        loop {
            match self.nodes[node_idx] {
                TreeNode::Leaf { value } => return value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    let value = row.get(feature).copied().unwrap_or(f64::NAN);
                    node_idx = if value.is_nan() || value <= threshold { left } else { right };
                }
            }
        }
    }

    /// Check that every child index points forward inside the node list
    fn validate(&self, n_features: usize) -> Result<()> {
        if self.nodes.is_empty() {
            return Err(PredictorError::CorruptArtifact("tree has no nodes".into()));
        }
        for (i, node) in self.nodes.iter().enumerate() {
            if let TreeNode::Split {
                feature, left, right, ..
            } = *node
            {
                if feature >= n_features {
                    return Err(PredictorError::CorruptArtifact(format!(
                        "node {} splits on feature {} of {}",
                        i, feature, n_features
                    )));
                }
                if left <= i || right <= i || left >= self.nodes.len() || right >= self.nodes.len() {
                    return Err(PredictorError::CorruptArtifact(format!(
                        "node {} has invalid children {} / {}",
                        i, left, right
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Unfitted random forest regressor
#[derive(Debug, Clone, Default)]
pub struct RandomForestRegressor {
    params: ForestParams,
}

impl RandomForestRegressor {
    pub fn new(params: ForestParams) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &ForestParams {
        &self.params
    }
}

impl Regressor for RandomForestRegressor {
    type Model = RandomForest;

    fn fit(&self, x: &[Vec<f64>], y: &[f64]) -> Result<RandomForest> {
        let n_features = check_training_matrix(x, y)?;
        if self.params.n_estimators == 0 {
            return Err(PredictorError::Estimator("n_estimators must be at least 1".into()));
        }

        let n = x.len();
        let mut rng = StdRng::seed_from_u64(self.params.seed);
        let mut trees = Vec::with_capacity(self.params.n_estimators);

        for _ in 0..self.params.n_estimators {
            let samples: Vec<usize> = if self.params.bootstrap {
                (0..n).map(|_| rng.random_range(0..n)).collect()
            } else {
                (0..n).collect()
            };
            trees.push(RegressionTree::fit(x, y, samples, &self.params.tree)?);
        }

        tracing::debug!(
            "Grew {} trees on {} rows x {} features (max depth {})",
            trees.len(),
            n,
            n_features,
            trees.iter().map(RegressionTree::depth).max().unwrap_or(0)
        );

        Ok(RandomForest {
            params: self.params,
            n_features,
            trees,
        })
    }
}

/// Fitted random forest
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RandomForest {
    params: ForestParams,
    n_features: usize,
    trees: Vec<RegressionTree>,
}

impl RandomForest {
    pub fn params(&self) -> &ForestParams {
        &self.params
    }

    pub fn trees(&self) -> &[RegressionTree] {
        &self.trees
    }
}

impl FittedModel for RandomForest {
    fn name(&self) -> &str {
        "random_forest"
    }

    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_row(&self, row: &[f64]) -> f64 {
        let sum: f64 = self.trees.iter().map(|t| t.predict_row(row)).sum();
        sum / self.trees.len() as f64
    }

    fn validate(&self) -> Result<()> {
        if self.trees.is_empty() {
            return Err(PredictorError::CorruptArtifact("random forest has no trees".into()));
        }
        self.trees.iter().try_for_each(|t| t.validate(self.n_features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step_data() -> (Vec<Vec<f64>>, Vec<f64>) {
        // y jumps from 10 to 50 when x0 crosses 5
        let x: Vec<Vec<f64>> = (0..10).map(|i| vec![i as f64, 1.0]).collect();
        let y: Vec<f64> = (0..10).map(|i| if i < 5 { 10.0 } else { 50.0 }).collect();
        (x, y)
    }

    #[test]
    fn test_tree_learns_step() {
        let (x, y) = step_data();
        let tree = RegressionTree::fit(&x, &y, (0..10).collect(), &TreeParams::default()).unwrap();

        assert_eq!(tree.depth(), 1);
        assert_eq!(tree.predict_row(&[2.0, 1.0]), 10.0);
        assert_eq!(tree.predict_row(&[7.0, 1.0]), 50.0);
        match tree.nodes()[0] {
            TreeNode::Split { feature, threshold, .. } => {
                assert_eq!(feature, 0);
                assert!((threshold - 4.5).abs() < 1e-12);
            }
            _ => panic!("root should split"),
        }
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x: Vec<Vec<f64>> = (0..6).map(|i| vec![i as f64]).collect();
        let y = vec![3.0; 6];
        let tree = RegressionTree::fit(&x, &y, (0..6).collect(), &TreeParams::default()).unwrap();
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.predict_row(&[100.0]), 3.0);
    }

    #[test]
    fn test_max_depth_limits_growth() {
        let x: Vec<Vec<f64>> = (0..32).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..32).map(|i| (i * i) as f64).collect();
        let params = TreeParams {
            max_depth: Some(2),
            ..Default::default()
        };
        let tree = RegressionTree::fit(&x, &y, (0..32).collect(), &params).unwrap();
        assert!(tree.depth() <= 2);
    }

    #[test]
    fn test_min_samples_leaf_respected() {
        let (x, y) = step_data();
        let params = TreeParams {
            min_samples_leaf: 6,
            ..Default::default()
        };
        // no split can leave 6 rows on both sides of 10
        let tree = RegressionTree::fit(&x, &y, (0..10).collect(), &params).unwrap();
        assert_eq!(tree.nodes().len(), 1);
        assert_eq!(tree.predict_row(&[0.0, 1.0]), 30.0);
    }

    #[test]
    fn test_nan_goes_left() {
        let (x, y) = step_data();
        let tree = RegressionTree::fit(&x, &y, (0..10).collect(), &TreeParams::default()).unwrap();
        assert_eq!(tree.predict_row(&[f64::NAN, 1.0]), 10.0);
    }

    #[test]
    fn test_midpoint_never_reaches_upper_value() {
        let lo = 1.0_f64;
        let hi = f64::from_bits(lo.to_bits() + 1);
        assert_eq!(midpoint(lo, hi), lo);
        assert_eq!(midpoint(2.0, 4.0), 3.0);
    }

    #[test]
    fn test_forest_is_deterministic_for_seed() {
        let x: Vec<Vec<f64>> = (0..40).map(|i| vec![i as f64, (i % 7) as f64]).collect();
        let y: Vec<f64> = (0..40).map(|i| i as f64 * 3.0 + (i % 7) as f64).collect();
        let params = ForestParams {
            n_estimators: 8,
            ..Default::default()
        };

        let a = RandomForestRegressor::new(params).fit(&x, &y).unwrap();
        let b = RandomForestRegressor::new(params).fit(&x, &y).unwrap();
        assert_eq!(a, b);

        let row = [12.5, 3.0];
        assert_eq!(a.predict_row(&row).to_bits(), b.predict_row(&row).to_bits());
    }

    #[test]
    fn test_forest_tracks_trend() {
        let x: Vec<Vec<f64>> = (0..50).map(|i| vec![i as f64]).collect();
        let y: Vec<f64> = (0..50).map(|i| i as f64 * 10.0).collect();
        let forest = RandomForestRegressor::new(ForestParams {
            n_estimators: 10,
            ..Default::default()
        })
        .fit(&x, &y)
        .unwrap();

        assert_eq!(forest.trees().len(), 10);
        assert!(forest.predict_row(&[5.0]) < forest.predict_row(&[45.0]));
        forest.validate().unwrap();
    }

    #[test]
    fn test_zero_estimators_rejected() {
        let (x, y) = step_data();
        let result = RandomForestRegressor::new(ForestParams {
            n_estimators: 0,
            ..Default::default()
        })
        .fit(&x, &y);
        assert!(matches!(result, Err(PredictorError::Estimator(_))));
    }

    #[test]
    fn test_validate_rejects_backward_child() {
        let tree = RegressionTree {
            nodes: vec![
                TreeNode::Split { feature: 0, threshold: 1.0, left: 0, right: 1 },
                TreeNode::Leaf { value: 1.0 },
            ],
        };
        assert!(tree.validate(1).is_err());
    }
}
