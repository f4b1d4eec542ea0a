use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::domain::types::{
    InteractionCount, OperatorId, PostType, PostUrl, TagList, TrainingRecordId,
};

/// Language assumed when a post does not declare one.
pub const DEFAULT_LANGUAGE: &str = "English";

/// One scraped social post together with its labels and caption embedding.
///
/// This domain struct mirrors the `engagement_training_data` table and is
/// independent from any persistence layer representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TrainingRecord {
    pub id: TrainingRecordId,
    pub post_url: PostUrl,
    /// `None` when the stored type is not one of the known post types.
    pub post_type: Option<PostType>,
    pub caption: Option<String>,
    pub caption_embedding: Option<Vec<f32>>,
    /// Raw engagement score; the scale depends on the post type until normalized.
    pub engagement_score: Option<f64>,
    pub likes_count: InteractionCount,
    pub comments_count: InteractionCount,
    pub views_count: Option<InteractionCount>,
    pub followers_count: Option<InteractionCount>,
    pub theme: Option<TagList>,
    pub tone: Option<TagList>,
    pub dominant_color: Option<TagList>,
    pub cta_present: Option<bool>,
    pub paid: Option<bool>,
    /// Wall-clock posting time, e.g. `18:30`.
    pub posting_time: Option<String>,
    pub posted_at: Option<NaiveDate>,
    pub language: String,
    pub is_labeled: bool,
    pub labeled_by: Option<OperatorId>,
    pub user_id: Option<OperatorId>,
    pub created_at: NaiveDateTime,
}

impl TrainingRecord {
    /// Whether the embedder should generate a caption embedding for this record.
    pub fn needs_embedding(&self) -> bool {
        self.caption.is_some() && self.caption_embedding.is_none()
    }

    /// Whether the trainer may use this record.
    pub fn is_training_ready(&self) -> bool {
        self.is_labeled && self.caption_embedding.is_some()
    }
}

/// Data required to insert a new [`TrainingRecord`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewTrainingRecord {
    pub post_url: PostUrl,
    pub post_type: PostType,
    pub caption: Option<String>,
    pub engagement_score: Option<f64>,
    pub likes_count: InteractionCount,
    pub comments_count: InteractionCount,
    pub views_count: Option<InteractionCount>,
    pub followers_count: Option<InteractionCount>,
    pub theme: Option<TagList>,
    pub tone: Option<TagList>,
    pub dominant_color: Option<TagList>,
    pub cta_present: Option<bool>,
    pub paid: Option<bool>,
    pub posting_time: Option<String>,
    pub posted_at: Option<NaiveDate>,
    pub language: String,
    pub is_labeled: bool,
    pub labeled_by: Option<OperatorId>,
    pub user_id: Option<OperatorId>,
    pub created_at: NaiveDateTime,
}
