use crate::db::{DbConnection, DbPool};
use crate::domain::training_record::{NewTrainingRecord, TrainingRecord};
use crate::domain::types::{PostUrl, TrainingRecordId};

pub mod errors;
#[cfg(test)]
pub mod test;
pub mod training_record;

pub use errors::{RepositoryError, RepositoryResult};

/// Repository implementation backed by Diesel and SQLite.
///
/// The underlying `r2d2::Pool` is cheap to clone, allowing the repository to
/// be passed around freely between jobs.
#[derive(Clone)]
pub struct DieselRepository {
    pool: DbPool, // r2d2::Pool is cheap to clone
}

impl DieselRepository {
    /// Create a new repository from an established database pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Get a pooled database connection.
    fn conn(&self) -> RepositoryResult<DbConnection> {
        Ok(self.pool.get()?)
    }
}

/// Query parameters used when listing training records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrainingRecordListQuery {
    /// Filter by the labeling flag.
    pub labeled: Option<bool>,
    /// `Some(true)` keeps records with an embedding, `Some(false)` those without.
    pub has_embedding: Option<bool>,
    /// `Some(true)` keeps records with a caption, `Some(false)` those without.
    pub has_caption: Option<bool>,
}

impl TrainingRecordListQuery {
    /// Records the embedder should process: caption present, embedding missing.
    pub fn missing_embeddings() -> Self {
        Self::default().has_caption(true).has_embedding(false)
    }

    /// Records the trainer may use: labeled and embedded.
    pub fn training_ready() -> Self {
        Self::default().labeled(true).has_embedding(true)
    }

    pub fn labeled(mut self, labeled: bool) -> Self {
        self.labeled = Some(labeled);
        self
    }
    pub fn has_embedding(mut self, has_embedding: bool) -> Self {
        self.has_embedding = Some(has_embedding);
        self
    }
    pub fn has_caption(mut self, has_caption: bool) -> Self {
        self.has_caption = Some(has_caption);
        self
    }

    /// Whether `record` satisfies every filter of this query.
    pub fn matches(&self, record: &TrainingRecord) -> bool {
        self.labeled.is_none_or(|labeled| record.is_labeled == labeled)
            && self
                .has_embedding
                .is_none_or(|wanted| record.caption_embedding.is_some() == wanted)
            && self
                .has_caption
                .is_none_or(|wanted| record.caption.is_some() == wanted)
    }
}

/// Read-only operations for training records.
pub trait TrainingRecordReader {
    /// Retrieve a record by its canonical post URL.
    fn get_record_by_url(&self, url: &PostUrl) -> RepositoryResult<Option<TrainingRecord>>;
    /// List records matching the supplied query, ordered by identifier.
    fn list_records(&self, query: TrainingRecordListQuery)
    -> RepositoryResult<Vec<TrainingRecord>>;
}

/// Write operations for training records.
pub trait TrainingRecordWriter {
    /// Persist a new record.
    fn create_record(&self, record: &NewTrainingRecord) -> RepositoryResult<usize>;
    /// Store the caption embedding of an existing record.
    fn set_caption_embedding(
        &self,
        id: TrainingRecordId,
        embedding: &[f32],
    ) -> RepositoryResult<usize>;
}
