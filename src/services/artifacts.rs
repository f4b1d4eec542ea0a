//! Model and metadata persistence.
//!
//! Every training run writes a timestamped model and metadata pair plus
//! `*_latest.json` copies that inference loads.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::features::{FeatureLayout, ScoreRange};
use crate::ml::gbdt::GbdtRegressor;

pub const MODEL_FILE_PREFIX: &str = "engagement_model";
pub const METADATA_FILE_PREFIX: &str = "metadata";
pub const LATEST_SUFFIX: &str = "latest";
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("artifact i/o failed for {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("artifact json failed for {path}: {source}")]
    Json {
        path: String,
        source: serde_json::Error,
    },
    #[error("invalid artifact: {0}")]
    Invalid(String),
}

/// Summary of a training run, persisted next to the model.
///
/// `layout` carries the discovered vocabularies; inference needs it to
/// rebuild the exact training column order.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelMetadata {
    pub trained_at: NaiveDateTime,
    pub training_samples: usize,
    pub test_samples: usize,
    pub train_mae: f64,
    pub test_mae: f64,
    pub train_r2: f64,
    pub test_r2: f64,
    pub feature_count: usize,
    /// Column names in training order, one per feature.
    pub feature_names: Vec<String>,
    /// Raw image/carousel score range used for normalization, if applied.
    pub image_score_range: Option<ScoreRange>,
    pub layout: FeatureLayout,
}

impl ModelMetadata {
    pub fn timestamp(&self) -> String {
        self.trained_at.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Files written by [`save_artifacts`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub model_latest: PathBuf,
    pub metadata: PathBuf,
    pub metadata_latest: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: &Path, timestamp: &str) -> Self {
        Self {
            model: dir.join(format!("{MODEL_FILE_PREFIX}_{timestamp}.json")),
            model_latest: dir.join(format!("{MODEL_FILE_PREFIX}_{LATEST_SUFFIX}.json")),
            metadata: dir.join(format!("{METADATA_FILE_PREFIX}_{timestamp}.json")),
            metadata_latest: dir.join(format!("{METADATA_FILE_PREFIX}_{LATEST_SUFFIX}.json")),
        }
    }

    pub fn latest(dir: &Path) -> Self {
        Self::new(dir, LATEST_SUFFIX)
    }
}

/// Write the model and metadata, timestamped and as the latest copies.
pub fn save_artifacts(
    dir: &Path,
    model: &GbdtRegressor,
    metadata: &ModelMetadata,
) -> Result<ArtifactPaths, ArtifactError> {
    fs::create_dir_all(dir).map_err(|source| ArtifactError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let paths = ArtifactPaths::new(dir, &metadata.timestamp());
    write_json(&paths.model, model)?;
    write_json(&paths.model_latest, model)?;
    write_json(&paths.metadata, metadata)?;
    write_json(&paths.metadata_latest, metadata)?;
    Ok(paths)
}

/// Load the latest model and its metadata, checking they describe the same
/// column layout.
pub fn load_latest(dir: &Path) -> Result<(GbdtRegressor, ModelMetadata), ArtifactError> {
    let paths = ArtifactPaths::latest(dir);
    let model: GbdtRegressor = read_json(&paths.model_latest)?;
    let metadata: ModelMetadata = read_json(&paths.metadata_latest)?;

    model
        .validate()
        .map_err(|e| ArtifactError::Invalid(e.to_string()))?;
    let layout_width = metadata.layout.feature_count();
    if model.feature_count != metadata.feature_count || layout_width != metadata.feature_count {
        return Err(ArtifactError::Invalid(format!(
            "feature count mismatch: model {}, metadata {}, layout {}",
            model.feature_count, metadata.feature_count, layout_width
        )));
    }
    if metadata.feature_names != metadata.layout.column_names() {
        return Err(ArtifactError::Invalid(
            "feature names do not match the persisted layout".to_string(),
        ));
    }
    Ok((model, metadata))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), ArtifactError> {
    let bytes = serde_json::to_vec_pretty(value).map_err(|source| ArtifactError::Json {
        path: path.display().to_string(),
        source,
    })?;
    fs::write(path, bytes).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = fs::read(path).map_err(|source| ArtifactError::Io {
        path: path.display().to_string(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Json {
        path: path.display().to_string(),
        source,
    })
}
