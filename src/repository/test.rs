use std::cell::{Cell, RefCell};
use std::collections::HashSet;

use crate::domain::training_record::{NewTrainingRecord, TrainingRecord};
use crate::domain::types::{PostUrl, TrainingRecordId};
use crate::repository::{
    RepositoryError, RepositoryResult, TrainingRecordListQuery, TrainingRecordReader,
    TrainingRecordWriter,
};

/// Simple in-memory repository used for unit tests.
#[derive(Default)]
pub struct TestRepository {
    records: RefCell<Vec<TrainingRecord>>,
    /// URLs whose writes fail, to exercise per-record error handling.
    failing_urls: HashSet<String>,
    embedding_writes: Cell<usize>,
}

impl TestRepository {
    pub fn new(records: Vec<TrainingRecord>) -> Self {
        Self {
            records: RefCell::new(records),
            ..Self::default()
        }
    }

    pub fn fail_writes_for(mut self, url: &str) -> Self {
        self.failing_urls.insert(url.to_string());
        self
    }

    pub fn records(&self) -> Vec<TrainingRecord> {
        self.records.borrow().clone()
    }

    pub fn embedding_writes(&self) -> usize {
        self.embedding_writes.get()
    }
}

impl TrainingRecordReader for TestRepository {
    fn get_record_by_url(&self, url: &PostUrl) -> RepositoryResult<Option<TrainingRecord>> {
        Ok(self
            .records
            .borrow()
            .iter()
            .find(|r| &r.post_url == url)
            .cloned())
    }

    fn list_records(
        &self,
        query: TrainingRecordListQuery,
    ) -> RepositoryResult<Vec<TrainingRecord>> {
        Ok(self
            .records
            .borrow()
            .iter()
            .filter(|r| query.matches(r))
            .cloned()
            .collect())
    }
}

impl TrainingRecordWriter for TestRepository {
    fn create_record(&self, record: &NewTrainingRecord) -> RepositoryResult<usize> {
        if self.failing_urls.contains(record.post_url.as_str()) {
            return Err(RepositoryError::ValidationError(
                "simulated insert failure".to_string(),
            ));
        }
        let mut records = self.records.borrow_mut();
        let id = TrainingRecordId::new(records.len() as i32 + 1)?;
        records.push(TrainingRecord {
            id,
            post_url: record.post_url.clone(),
            post_type: Some(record.post_type),
            caption: record.caption.clone(),
            caption_embedding: None,
            engagement_score: record.engagement_score,
            likes_count: record.likes_count,
            comments_count: record.comments_count,
            views_count: record.views_count,
            followers_count: record.followers_count,
            theme: record.theme.clone(),
            tone: record.tone.clone(),
            dominant_color: record.dominant_color.clone(),
            cta_present: record.cta_present,
            paid: record.paid,
            posting_time: record.posting_time.clone(),
            posted_at: record.posted_at,
            language: record.language.clone(),
            is_labeled: record.is_labeled,
            labeled_by: record.labeled_by.clone(),
            user_id: record.user_id.clone(),
            created_at: record.created_at,
        });
        Ok(1)
    }

    fn set_caption_embedding(
        &self,
        id: TrainingRecordId,
        embedding: &[f32],
    ) -> RepositoryResult<usize> {
        let mut records = self.records.borrow_mut();
        let Some(record) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(0);
        };
        if self.failing_urls.contains(record.post_url.as_str()) {
            return Err(RepositoryError::ValidationError(
                "simulated write failure".to_string(),
            ));
        }
        record.caption_embedding = Some(embedding.to_vec());
        self.embedding_writes.set(self.embedding_writes.get() + 1);
        Ok(1)
    }
}
