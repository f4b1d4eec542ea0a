//! Feature engineering for the engagement model.
//!
//! Turns training records into fixed-width numeric rows. Column blocks are
//! concatenated in this order:
//!
//! 1. caption embedding (`embedding_dimensions` columns, zeros when absent)
//! 2. raw counts: likes, comments, views, followers (missing -> 0)
//! 3. post type one-hot
//! 4. theme, tone and dominant color multi-hot over discovered vocabularies
//! 5. call-to-action and paid flags (missing -> 0)
//! 6. posting hour scaled to `[0, 1)` (missing or unparsable -> 0.5)
//! 7. language one-hot, unmatched languages falling into `Other`
//!
//! The [`FeatureLayout`] produced at training time is persisted with the model
//! so inference rebuilds the identical column order.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::domain::training_record::{DEFAULT_LANGUAGE, TrainingRecord};
use crate::domain::types::{InteractionCount, PostType, TagList};

/// Languages with a dedicated one-hot column.
pub const LANGUAGES: [&str; 3] = ["English", "Hindi", "Other"];

/// Catch-all language column.
pub const OTHER_LANGUAGE: &str = "Other";

/// Hour feature used when the posting time is missing or unparsable.
pub const DEFAULT_POSTING_HOUR: f64 = 0.5;

/// Names of the count columns, in order.
pub const NUMERIC_COLUMNS: [&str; 4] = [
    "likes_count",
    "comments_count",
    "views_count",
    "followers_count",
];

/// Sorted label vocabularies of the multi-valued tag fields.
///
/// Labels are compared case-sensitively after trimming, so `luxury` and
/// `Luxury` become separate columns.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TagVocabulary {
    pub themes: Vec<String>,
    pub tones: Vec<String>,
    pub dominant_colors: Vec<String>,
}

impl TagVocabulary {
    /// Collect every distinct label across `records`, sorted lexicographically.
    pub fn discover(records: &[TrainingRecord]) -> Self {
        Self {
            themes: collect_labels(records, |r| r.theme.as_ref()),
            tones: collect_labels(records, |r| r.tone.as_ref()),
            dominant_colors: collect_labels(records, |r| r.dominant_color.as_ref()),
        }
    }
}

fn collect_labels<'a, F>(records: &'a [TrainingRecord], select: F) -> Vec<String>
where
    F: Fn(&'a TrainingRecord) -> Option<&'a TagList>,
{
    records
        .iter()
        .filter_map(select)
        .flat_map(|tags| tags.labels().iter().cloned())
        .collect::<BTreeSet<String>>()
        .into_iter()
        .collect()
}

/// Column layout of a feature matrix.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FeatureLayout {
    pub embedding_dimensions: usize,
    pub post_types: Vec<PostType>,
    pub vocabulary: TagVocabulary,
    pub languages: Vec<String>,
}

impl FeatureLayout {
    pub fn new(embedding_dimensions: usize, vocabulary: TagVocabulary) -> Self {
        Self {
            embedding_dimensions,
            post_types: PostType::ALL.to_vec(),
            vocabulary,
            languages: LANGUAGES.iter().map(|l| l.to_string()).collect(),
        }
    }

    /// Width of every row produced by [`Self::vectorize`].
    pub fn feature_count(&self) -> usize {
        self.embedding_dimensions
            + NUMERIC_COLUMNS.len()
            + self.post_types.len()
            + self.vocabulary.themes.len()
            + self.vocabulary.tones.len()
            + self.vocabulary.dominant_colors.len()
            + 2
            + 1
            + self.languages.len()
    }

    /// Human-readable column names, aligned with [`Self::vectorize`].
    pub fn column_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.feature_count());
        names.extend((0..self.embedding_dimensions).map(|i| format!("embedding_{i}")));
        names.extend(NUMERIC_COLUMNS.iter().map(|c| c.to_string()));
        names.extend(self.post_types.iter().map(|t| format!("post_type={t}")));
        names.extend(self.vocabulary.themes.iter().map(|l| format!("theme={l}")));
        names.extend(self.vocabulary.tones.iter().map(|l| format!("tone={l}")));
        names.extend(
            self.vocabulary
                .dominant_colors
                .iter()
                .map(|l| format!("dominant_color={l}")),
        );
        names.push("cta_present".to_string());
        names.push("paid".to_string());
        names.push("posting_hour".to_string());
        names.extend(self.languages.iter().map(|l| format!("language={l}")));
        names
    }

    /// Build the feature row of a single record.
    pub fn vectorize(&self, record: &TrainingRecord) -> Vec<f64> {
        let mut row = Vec::with_capacity(self.feature_count());

        match &record.caption_embedding {
            Some(embedding) => {
                if embedding.len() != self.embedding_dimensions {
                    log::warn!(
                        "Embedding of {} has {} values, expected {}; resizing",
                        record.post_url,
                        embedding.len(),
                        self.embedding_dimensions
                    );
                }
                row.extend(
                    embedding
                        .iter()
                        .take(self.embedding_dimensions)
                        .map(|&v| f64::from(v)),
                );
                row.resize(self.embedding_dimensions, 0.0);
            }
            None => row.resize(self.embedding_dimensions, 0.0),
        }

        let count = |value: Option<InteractionCount>| value.map_or(0.0, |c| c.get() as f64);
        row.push(count(Some(record.likes_count)));
        row.push(count(Some(record.comments_count)));
        row.push(count(record.views_count));
        row.push(count(record.followers_count));

        row.extend(
            self.post_types
                .iter()
                .map(|&t| one_hot(record.post_type == Some(t))),
        );

        push_multi_hot(&mut row, &self.vocabulary.themes, record.theme.as_ref());
        push_multi_hot(&mut row, &self.vocabulary.tones, record.tone.as_ref());
        push_multi_hot(
            &mut row,
            &self.vocabulary.dominant_colors,
            record.dominant_color.as_ref(),
        );

        row.push(one_hot(record.cta_present.unwrap_or(false)));
        row.push(one_hot(record.paid.unwrap_or(false)));

        row.push(posting_hour_feature(record.posting_time.as_deref()));

        let language = match record.language.trim() {
            "" => DEFAULT_LANGUAGE,
            language => language,
        };
        let matched = self.languages.iter().any(|l| l == language);
        row.extend(self.languages.iter().map(|l| {
            one_hot(if matched {
                l == language
            } else {
                l == OTHER_LANGUAGE
            })
        }));

        row
    }
}

/// Feature rows aligned with the input records, plus their layout.
#[derive(Debug, Clone)]
pub struct FeatureMatrix {
    pub rows: Vec<Vec<f64>>,
    pub layout: FeatureLayout,
}

/// Discover vocabularies over `records` and vectorize each record in order.
pub fn prepare_features(records: &[TrainingRecord], embedding_dimensions: usize) -> FeatureMatrix {
    let layout = FeatureLayout::new(embedding_dimensions, TagVocabulary::discover(records));
    let rows = records.iter().map(|r| layout.vectorize(r)).collect();
    FeatureMatrix { rows, layout }
}

/// Scale a `HH:MM` posting time to `hour / 24`.
pub fn posting_hour_feature(posting_time: Option<&str>) -> f64 {
    posting_time
        .and_then(|time| time.split(':').next())
        .and_then(|hour| hour.trim().parse::<u32>().ok())
        .filter(|&hour| hour < 24)
        .map_or(DEFAULT_POSTING_HOUR, |hour| f64::from(hour) / 24.0)
}

/// Observed raw score range of the normalized subset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreRange {
    pub min: f64,
    pub max: f64,
}

/// Min-max normalize image and carousel scores onto 0-100.
///
/// The range is taken over exactly that subset; other post types are left
/// untouched. A degenerate range (min == max) leaves every score as is.
/// Returns the range when normalization was applied.
pub fn normalize_image_scores(records: &mut [TrainingRecord]) -> Option<ScoreRange> {
    let in_subset = |record: &TrainingRecord| {
        record
            .post_type
            .is_some_and(PostType::needs_score_normalization)
    };

    let scores = records
        .iter()
        .filter(|r| in_subset(r))
        .filter_map(|r| r.engagement_score)
        .filter(|s| s.is_finite())
        .collect::<Vec<_>>();
    if scores.is_empty() {
        return None;
    }

    let min = scores.iter().copied().fold(f64::INFINITY, f64::min);
    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if max <= min {
        return None;
    }

    for record in records.iter_mut().filter(|r| in_subset(r)) {
        if let Some(score) = record.engagement_score.filter(|s| s.is_finite()) {
            record.engagement_score = Some((score - min) / (max - min) * 100.0);
        }
    }
    log::info!("Image normalization: min={min:.2}, max={max:.2}");
    Some(ScoreRange { min, max })
}

fn one_hot(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

fn push_multi_hot(row: &mut Vec<f64>, vocabulary: &[String], tags: Option<&TagList>) {
    row.extend(
        vocabulary
            .iter()
            .map(|label| one_hot(tags.is_some_and(|t| t.contains(label)))),
    );
}
