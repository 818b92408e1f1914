use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Split test comparing two sampled feature pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SplitTest {
    pub idx1: u32,
    pub idx2: u32,
    pub threshold: f32,
}

/// A complete binary regression tree stored in breadth-first order.
///
/// Split `i` has children `2i + 1` and `2i + 2`; node indices past the last
/// split address leaves. Each leaf holds one `(dx, dy)` delta per landmark in
/// normalized face coordinates, flattened as `[dx0, dy0, dx1, dy1, ...]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegressionTree {
    splits: Vec<SplitTest>,
    leaves: Vec<f32>,
    num_landmarks: usize,
}

impl RegressionTree {
    pub fn new(splits: Vec<SplitTest>, leaves: Vec<f32>, num_landmarks: usize) -> Result<Self> {
        let leaf_len = num_landmarks * 2;
        if leaf_len == 0 || leaves.len() % leaf_len != 0 {
            return Err(Error::InvalidModel(format!(
                "leaf data of {} values is not a multiple of {}",
                leaves.len(),
                leaf_len
            )));
        }
        let num_leaves = leaves.len() / leaf_len;
        if num_leaves != splits.len() + 1 {
            return Err(Error::InvalidModel(format!(
                "tree with {} splits needs {} leaves, got {}",
                splits.len(),
                splits.len() + 1,
                num_leaves
            )));
        }
        Ok(Self {
            splits,
            leaves,
            num_landmarks,
        })
    }

    pub fn splits(&self) -> &[SplitTest] {
        &self.splits
    }

    pub fn num_landmarks(&self) -> usize {
        self.num_landmarks
    }

    pub fn num_leaves(&self) -> usize {
        self.splits.len() + 1
    }

    /// Walk the tree over sampled feature intensities and return the leaf
    /// delta reached. A split goes left when `f[idx1] - f[idx2] > threshold`.
    pub fn leaf(&self, features: &[f32]) -> &[f32] {
        let mut node = 0usize;
        while let Some(split) = self.splits.get(node) {
            let diff = features[split.idx1 as usize] - features[split.idx2 as usize];
            node = if diff > split.threshold {
                2 * node + 1
            } else {
                2 * node + 2
            };
        }
        let leaf_len = self.num_landmarks * 2;
        let start = (node - self.splits.len()) * leaf_len;
        &self.leaves[start..start + leaf_len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump() -> RegressionTree {
        //        [0: split f0 - f1 > 50]
        //       /                      \
        //   [leaf -0.1]            [leaf 0.1]
        RegressionTree::new(
            vec![SplitTest {
                idx1: 0,
                idx2: 1,
                threshold: 50.0,
            }],
            vec![-0.1, -0.2, 0.1, 0.2],
            1,
        )
        .unwrap()
    }

    #[test]
    fn split_goes_left_above_threshold() {
        let tree = stump();
        assert_eq!(tree.leaf(&[120.0, 10.0]), &[-0.1, -0.2]);
        assert_eq!(tree.leaf(&[60.0, 10.0]), &[0.1, 0.2]);
        assert_eq!(tree.leaf(&[10.0, 120.0]), &[0.1, 0.2]);
    }

    #[test]
    fn depth_two_tree_reaches_every_leaf() {
        let split = |threshold| SplitTest {
            idx1: 0,
            idx2: 1,
            threshold,
        };
        // leaves 0..4 carry their own index as delta
        let tree = RegressionTree::new(
            vec![split(0.0), split(10.0), split(-10.0)],
            vec![0.0, 0.0, 1.0, 1.0, 2.0, 2.0, 3.0, 3.0],
            1,
        )
        .unwrap();

        assert_eq!(tree.leaf(&[20.0, 0.0])[0], 0.0);
        assert_eq!(tree.leaf(&[5.0, 0.0])[0], 1.0);
        assert_eq!(tree.leaf(&[-5.0, 0.0])[0], 2.0);
        assert_eq!(tree.leaf(&[-20.0, 0.0])[0], 3.0);
        assert_eq!(tree.num_leaves(), 4);
    }

    #[test]
    fn leaf_count_must_match_splits() {
        let err = RegressionTree::new(vec![], vec![0.0, 0.0, 1.0, 1.0], 1).unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));

        let err = RegressionTree::new(vec![], vec![0.0, 0.0, 1.0], 1).unwrap_err();
        assert!(matches!(err, Error::InvalidModel(_)));
    }
}
