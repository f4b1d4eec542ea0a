use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;

use crate::domain::training_record::{
    NewTrainingRecord as DomainNewTrainingRecord, TrainingRecord as DomainTrainingRecord,
};
use crate::domain::types::{
    InteractionCount, OperatorId, PostType, PostUrl, TagList, TypeConstraintError,
};
use crate::embedding::decode_embedding;

/// Diesel model representing a row in the `engagement_training_data` table.
#[derive(Debug, Clone, Identifiable, Queryable)]
#[diesel(table_name = crate::schema::engagement_training_data)]
pub struct TrainingRecord {
    pub id: i32,
    pub post_url: String,
    pub post_type: String,
    pub caption: Option<String>,
    pub caption_embedding: Option<Vec<u8>>,
    pub engagement_score: Option<f64>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub views_count: Option<i64>,
    pub followers_count: Option<i64>,
    pub theme: Option<String>,
    pub tone: Option<String>,
    pub dominant_color: Option<String>,
    pub cta_present: Option<bool>,
    pub paid: Option<bool>,
    pub posting_time: Option<String>,
    pub posted_at: Option<NaiveDate>,
    pub language: String,
    pub is_labeled: bool,
    pub labeled_by: Option<String>,
    pub user_id: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Insertable form of [`TrainingRecord`].
#[derive(Debug, Insertable)]
#[diesel(table_name = crate::schema::engagement_training_data)]
pub struct NewTrainingRecord {
    pub post_url: String,
    pub post_type: String,
    pub caption: Option<String>,
    pub caption_embedding: Option<Vec<u8>>,
    pub engagement_score: Option<f64>,
    pub likes_count: i64,
    pub comments_count: i64,
    pub views_count: Option<i64>,
    pub followers_count: Option<i64>,
    pub theme: Option<String>,
    pub tone: Option<String>,
    pub dominant_color: Option<String>,
    pub cta_present: Option<bool>,
    pub paid: Option<bool>,
    pub posting_time: Option<String>,
    pub posted_at: Option<NaiveDate>,
    pub language: String,
    pub is_labeled: bool,
    pub labeled_by: Option<String>,
    pub user_id: Option<String>,
    pub created_at: NaiveDateTime,
}

fn optional_count(value: Option<i64>) -> Result<Option<InteractionCount>, TypeConstraintError> {
    value.map(InteractionCount::new).transpose()
}

fn optional_operator(value: Option<String>) -> Option<OperatorId> {
    value.and_then(|v| OperatorId::new(v).ok())
}

impl TryFrom<TrainingRecord> for DomainTrainingRecord {
    type Error = TypeConstraintError;

    fn try_from(record: TrainingRecord) -> Result<Self, Self::Error> {
        let caption_embedding = record
            .caption_embedding
            .map(|bytes| {
                decode_embedding(&bytes).ok_or_else(|| {
                    TypeConstraintError::InvalidValue(format!(
                        "caption embedding of {} bytes",
                        bytes.len()
                    ))
                })
            })
            .transpose()?;

        Ok(Self {
            id: record.id.try_into()?,
            post_url: PostUrl::new(record.post_url)?,
            post_type: PostType::try_from(record.post_type.as_str()).ok(),
            caption: record.caption.filter(|c| !c.trim().is_empty()),
            caption_embedding,
            engagement_score: record.engagement_score,
            likes_count: InteractionCount::new(record.likes_count)?,
            comments_count: InteractionCount::new(record.comments_count)?,
            views_count: optional_count(record.views_count)?,
            followers_count: optional_count(record.followers_count)?,
            theme: record.theme.as_deref().and_then(TagList::parse),
            tone: record.tone.as_deref().and_then(TagList::parse),
            dominant_color: record.dominant_color.as_deref().and_then(TagList::parse),
            cta_present: record.cta_present,
            paid: record.paid,
            posting_time: record.posting_time,
            posted_at: record.posted_at,
            language: record.language,
            is_labeled: record.is_labeled,
            labeled_by: optional_operator(record.labeled_by),
            user_id: optional_operator(record.user_id),
            created_at: record.created_at,
        })
    }
}

impl From<&DomainNewTrainingRecord> for NewTrainingRecord {
    fn from(record: &DomainNewTrainingRecord) -> Self {
        Self {
            post_url: record.post_url.as_str().to_string(),
            post_type: record.post_type.into(),
            caption: record.caption.clone(),
            caption_embedding: None,
            engagement_score: record.engagement_score,
            likes_count: record.likes_count.get(),
            comments_count: record.comments_count.get(),
            views_count: record.views_count.map(InteractionCount::get),
            followers_count: record.followers_count.map(InteractionCount::get),
            theme: record.theme.as_ref().map(ToString::to_string),
            tone: record.tone.as_ref().map(ToString::to_string),
            dominant_color: record.dominant_color.as_ref().map(ToString::to_string),
            cta_present: record.cta_present,
            paid: record.paid,
            posting_time: record.posting_time.clone(),
            posted_at: record.posted_at,
            language: record.language.clone(),
            is_labeled: record.is_labeled,
            labeled_by: record.labeled_by.as_ref().map(|op| op.as_str().to_string()),
            user_id: record.user_id.as_ref().map(|op| op.as_str().to_string()),
            created_at: record.created_at,
        }
    }
}
