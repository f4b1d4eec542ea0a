use thiserror::Error;

use crate::forms::import::ImportParseError;
use crate::ml::gbdt::GbdtError;
use crate::repository::RepositoryError;
use crate::services::artifacts::ArtifactError;

/// Fatal errors of the batch jobs.
///
/// Per-record problems never surface here; they are logged and counted in
/// the job reports instead.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Repository(#[from] RepositoryError),
    /// Fewer usable records than training requires.
    #[error("insufficient training data: found {found}, need at least {required}")]
    InsufficientData { found: usize, required: usize },
    #[error("training failed: {0}")]
    Training(#[from] GbdtError),
    #[error(transparent)]
    Artifact(#[from] ArtifactError),
    #[error(transparent)]
    Import(#[from] ImportParseError),
}

/// Convenient alias for results returned from service functions.
pub type ServiceResult<T> = Result<T, ServiceError>;
