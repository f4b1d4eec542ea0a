//! Runtime configuration shared by the pipeline binaries.

use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::embedding::{DEFAULT_EMBEDDING_DIMENSIONS, MAX_EMBEDDING_INPUT_CHARS};

/// Environment variable holding the training-data store location.
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";
/// Environment variable holding the embedding service API key.
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Default location of the optional YAML settings file (extension is probed).
pub const DEFAULT_CONFIG_PATH: &str = "config/pipeline";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} not found in environment")]
    MissingCredential(&'static str),
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Tunables for the importer, embedder and trainer.
///
/// Values come from `config/pipeline.yaml` (optional) overlaid with
/// `ENGAGEMENT_*` environment variables.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Directory receiving trained models and metadata.
    pub model_dir: PathBuf,
    pub embedding_model: String,
    pub embedding_base_url: String,
    /// Length of the vectors returned by `embedding_model`.
    pub embedding_dimensions: usize,
    /// Captions are cut to this many characters before embedding.
    pub max_input_chars: usize,
    /// Pause after each successful embedding request.
    pub request_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub min_training_samples: usize,
    pub test_fraction: f64,
    pub random_seed: u64,
    pub n_estimators: usize,
    pub max_depth: usize,
    pub learning_rate: f64,
    pub bins: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("models"),
            embedding_model: "text-embedding-3-small".to_string(),
            embedding_base_url: "https://api.openai.com/v1".to_string(),
            embedding_dimensions: DEFAULT_EMBEDDING_DIMENSIONS,
            max_input_chars: MAX_EMBEDDING_INPUT_CHARS,
            request_delay_ms: 20,
            request_timeout_secs: 30,
            min_training_samples: 10,
            test_fraction: 0.2,
            random_seed: 42,
            n_estimators: 100,
            max_depth: 6,
            learning_rate: 0.1,
            bins: 32,
        }
    }
}

impl PipelineConfig {
    /// Load settings from `path` (if present) and the environment.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("ENGAGEMENT").try_parsing(true))
            .build()?;
        Ok(settings.try_deserialize()?)
    }

    pub fn request_delay(&self) -> Duration {
        Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

/// Read a required credential from the process environment.
///
/// Blank values count as missing.
pub fn require_env(name: &'static str) -> Result<String, ConfigError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingCredential(name)),
    }
}
