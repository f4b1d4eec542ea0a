//! Deterministic gradient-boosted regression trees.
//!
//! A small squared-error booster in the spirit of XGBoost's `reg:squarederror`:
//! - Histogram split search over per-feature bins.
//! - Depth-limited trees with mean-residual leaves.
//! - Reproducible JSON model export/load.

mod model;
mod train;

use thiserror::Error;

pub use model::{GbdtRegressor, RegressionTree, TreeNode};
pub use train::{TrainOptions, train_gbdt_regressor};

#[derive(Debug, Error, Clone, PartialEq)]
pub enum GbdtError {
    #[error("empty dataset")]
    EmptyDataset,
    #[error("feature matrix has {rows} rows but target has {targets} values")]
    MismatchedLengths { rows: usize, targets: usize },
    #[error("row {row} has {found} features, expected {expected}")]
    RaggedRows {
        row: usize,
        found: usize,
        expected: usize,
    },
    #[error("training data contains non-finite values")]
    NonFinite,
    #[error("invalid model: {0}")]
    InvalidModel(String),
}
