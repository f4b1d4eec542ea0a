use super::GbdtError;
use super::model::{GbdtRegressor, RegressionTree, TreeNode};

/// Training hyperparameters for tree boosting.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Number of boosting rounds (one tree per round).
    pub n_estimators: usize,
    /// Maximum number of split levels per tree.
    pub max_depth: usize,
    /// Learning rate applied per round.
    pub learning_rate: f64,
    /// Number of bins used for split search.
    pub bins: usize,
    /// Minimum number of rows in each leaf.
    pub min_samples_leaf: usize,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            max_depth: 6,
            learning_rate: 0.1,
            bins: 32,
            min_samples_leaf: 1,
        }
    }
}

/// Fit a squared-error gradient-boosted tree ensemble.
///
/// Training is fully deterministic: the same inputs and options always
/// produce the same model.
pub fn train_gbdt_regressor(
    x: &[Vec<f64>],
    y: &[f64],
    options: &TrainOptions,
) -> Result<GbdtRegressor, GbdtError> {
    if x.len() != y.len() {
        return Err(GbdtError::MismatchedLengths {
            rows: x.len(),
            targets: y.len(),
        });
    }
    if x.is_empty() {
        return Err(GbdtError::EmptyDataset);
    }
    let feature_count = x[0].len();
    if let Some((row, found)) = x
        .iter()
        .map(Vec::len)
        .enumerate()
        .find(|&(_, len)| len != feature_count)
    {
        return Err(GbdtError::RaggedRows {
            row,
            found,
            expected: feature_count,
        });
    }
    if x.iter().flatten().chain(y).any(|v| !v.is_finite()) {
        return Err(GbdtError::NonFinite);
    }

    let bins = options.bins.clamp(2, 256);
    let (mins, maxs) = compute_feature_min_max(x, feature_count);
    let binned = bin_features(x, &mins, &maxs, bins);

    let base_score = y.iter().sum::<f64>() / y.len() as f64;
    let mut predictions = vec![base_score; y.len()];
    let all_rows = (0..y.len()).collect::<Vec<_>>();

    let mut trees = Vec::with_capacity(options.n_estimators);
    for _round in 0..options.n_estimators {
        let residuals = y
            .iter()
            .zip(&predictions)
            .map(|(target, prediction)| target - prediction)
            .collect::<Vec<_>>();

        let builder = TreeBuilder {
            x,
            binned: &binned,
            mins: &mins,
            maxs: &maxs,
            bins,
            residuals: &residuals,
            max_depth: options.max_depth,
            min_samples_leaf: options.min_samples_leaf.max(1),
        };
        let mut nodes = Vec::new();
        builder.grow(&mut nodes, &all_rows, 0);
        let tree = RegressionTree { nodes };

        for (prediction, row) in predictions.iter_mut().zip(x) {
            *prediction += options.learning_rate * tree.predict(row);
        }
        trees.push(tree);
    }

    Ok(GbdtRegressor {
        model_version: GbdtRegressor::MODEL_VERSION,
        feature_count,
        learning_rate: options.learning_rate,
        base_score,
        trees,
    })
}

struct TreeBuilder<'a> {
    x: &'a [Vec<f64>],
    binned: &'a [Vec<u8>],
    mins: &'a [f64],
    maxs: &'a [f64],
    bins: usize,
    residuals: &'a [f64],
    max_depth: usize,
    min_samples_leaf: usize,
}

#[derive(Debug, Clone, Copy)]
struct BestSplit {
    gain: f64,
    feature_index: usize,
    split_bin: usize,
}

impl TreeBuilder<'_> {
    /// Grow the subtree for `rows`, returning the index of its root node.
    fn grow(&self, nodes: &mut Vec<TreeNode>, rows: &[usize], depth: usize) -> usize {
        let index = nodes.len();
        let sum = rows.iter().map(|&i| self.residuals[i]).sum::<f64>();
        nodes.push(TreeNode::Leaf {
            value: sum / rows.len().max(1) as f64,
        });

        if depth >= self.max_depth || rows.len() < 2 * self.min_samples_leaf {
            return index;
        }
        let Some(split) = self.best_split(rows, sum) else {
            return index;
        };

        let feature_index = split.feature_index;
        let threshold = threshold_for_bin(
            self.mins[feature_index],
            self.maxs[feature_index],
            split.split_bin,
            self.bins,
        );
        let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = rows
            .iter()
            .partition(|&&i| self.x[i][feature_index] < threshold);
        if left_rows.len() < self.min_samples_leaf || right_rows.len() < self.min_samples_leaf {
            return index;
        }

        let left = self.grow(nodes, &left_rows, depth + 1);
        let right = self.grow(nodes, &right_rows, depth + 1);
        nodes[index] = TreeNode::Split {
            feature_index,
            threshold,
            left,
            right,
        };
        index
    }

    /// Best squared-error reduction over every feature, if any split helps.
    fn best_split(&self, rows: &[usize], total_sum: f64) -> Option<BestSplit> {
        let total_count = rows.len() as f64;
        let parent_score = total_sum * total_sum / total_count;

        let mut counts = vec![0usize; self.bins];
        let mut sums = vec![0f64; self.bins];
        let mut best: Option<BestSplit> = None;

        for feature_index in 0..self.mins.len() {
            counts.fill(0);
            sums.fill(0.0);
            for &i in rows {
                let b = self.binned[i][feature_index] as usize;
                counts[b] += 1;
                sums[b] += self.residuals[i];
            }

            let mut left_count = 0usize;
            let mut left_sum = 0f64;
            for split_bin in 0..(self.bins - 1) {
                left_count += counts[split_bin];
                left_sum += sums[split_bin];
                let right_count = rows.len() - left_count;
                if left_count < self.min_samples_leaf || right_count < self.min_samples_leaf {
                    continue;
                }
                let right_sum = total_sum - left_sum;
                let score = left_sum * left_sum / left_count as f64
                    + right_sum * right_sum / right_count as f64;
                let gain = score - parent_score;
                if gain > 1e-12 && best.is_none_or(|b| gain > b.gain) {
                    best = Some(BestSplit {
                        gain,
                        feature_index,
                        split_bin,
                    });
                }
            }
        }
        best
    }
}

fn compute_feature_min_max(x: &[Vec<f64>], feature_count: usize) -> (Vec<f64>, Vec<f64>) {
    let mut mins = vec![f64::INFINITY; feature_count];
    let mut maxs = vec![f64::NEG_INFINITY; feature_count];
    for row in x {
        for (j, &v) in row.iter().take(feature_count).enumerate() {
            mins[j] = mins[j].min(v);
            maxs[j] = maxs[j].max(v);
        }
    }
    for j in 0..feature_count {
        if !mins[j].is_finite() || !maxs[j].is_finite() {
            mins[j] = 0.0;
            maxs[j] = 0.0;
        }
        if mins[j] == maxs[j] {
            maxs[j] = mins[j] + 1.0;
        }
    }
    (mins, maxs)
}

/// Bin `b` holds values in `[min + b/bins * range, min + (b+1)/bins * range)`.
fn bin_features(x: &[Vec<f64>], mins: &[f64], maxs: &[f64], bins: usize) -> Vec<Vec<u8>> {
    let last_bin = (bins - 1) as f64;
    x.iter()
        .map(|row| {
            mins.iter()
                .zip(maxs)
                .zip(row)
                .map(|((&min, &max), &v)| {
                    let t = ((v - min) / (max - min)).clamp(0.0, 1.0);
                    (t * bins as f64).floor().min(last_bin) as u8
                })
                .collect()
        })
        .collect()
}

fn threshold_for_bin(min: f64, max: f64, split_bin: usize, bins: usize) -> f64 {
    let t = (split_bin + 1) as f64 / bins as f64;
    min + t * (max - min)
}
