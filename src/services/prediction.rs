use std::path::Path;

use crate::domain::training_record::TrainingRecord;
use crate::ml::gbdt::GbdtRegressor;
use crate::services::artifacts::{ArtifactError, ModelMetadata, load_latest};

/// Lowest engagement score the model reports.
pub const MIN_ENGAGEMENT_SCORE: f64 = 0.0;
/// Highest engagement score the model reports.
pub const MAX_ENGAGEMENT_SCORE: f64 = 100.0;

/// Latest trained model together with the column layout it was fitted on.
#[derive(Debug, Clone)]
pub struct EngagementPredictor {
    model: GbdtRegressor,
    metadata: ModelMetadata,
}

impl EngagementPredictor {
    /// Load the `*_latest.json` artifacts from `dir`.
    pub fn load_latest(dir: &Path) -> Result<Self, ArtifactError> {
        let (model, metadata) = load_latest(dir)?;
        log::info!(
            "Loaded engagement model trained at {} ({} features)",
            metadata.trained_at,
            metadata.feature_count
        );
        Ok(Self { model, metadata })
    }

    pub fn metadata(&self) -> &ModelMetadata {
        &self.metadata
    }

    /// Predicted engagement score for `record`, clamped to 0-100.
    pub fn predict(&self, record: &TrainingRecord) -> f64 {
        predict_engagement(&self.model, &self.metadata, record)
    }
}

/// Vectorize `record` with the persisted layout and run the model.
pub fn predict_engagement(
    model: &GbdtRegressor,
    metadata: &ModelMetadata,
    record: &TrainingRecord,
) -> f64 {
    let features = metadata.layout.vectorize(record);
    model
        .predict(&features)
        .clamp(MIN_ENGAGEMENT_SCORE, MAX_ENGAGEMENT_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::{PostType, TagList};
    use crate::features::tests::record;
    use crate::features::{FeatureLayout, TagVocabulary};
    use crate::models::config::PipelineConfig;
    use crate::repository::test::TestRepository;
    use crate::services::training::train_engagement_model;

    fn themed(id: i32, theme: &str, score: f64) -> TrainingRecord {
        let mut r = record(id, PostType::Reel, Some(score));
        r.caption_embedding = Some(vec![0.0, 0.0]);
        r.theme = TagList::parse(theme);
        r
    }

    #[test]
    fn predictions_follow_persisted_vocabulary() {
        let dir = tempfile::tempdir().unwrap();
        let records = (1..=20)
            .map(|i| {
                if i % 2 == 0 {
                    themed(i, "Bridal", 90.0)
                } else {
                    themed(i, "Casual", 20.0)
                }
            })
            .collect();
        let repo = TestRepository::new(records);
        let config = PipelineConfig {
            model_dir: dir.path().to_path_buf(),
            embedding_dimensions: 2,
            ..PipelineConfig::default()
        };
        train_engagement_model(&repo, &config).unwrap();

        let predictor = EngagementPredictor::load_latest(dir.path()).unwrap();

        assert_eq!(
            predictor.metadata().layout.vocabulary.themes,
            vec!["Bridal", "Casual"]
        );
        let bridal = predictor.predict(&themed(100, "Bridal", 0.0));
        let casual = predictor.predict(&themed(101, "Casual", 0.0));
        assert!((bridal - 90.0).abs() < 5.0, "bridal prediction {bridal}");
        assert!((casual - 20.0).abs() < 5.0, "casual prediction {casual}");
    }

    #[test]
    fn predictions_are_clamped() {
        let layout = FeatureLayout::new(1, TagVocabulary::default());
        let model = GbdtRegressor {
            model_version: GbdtRegressor::MODEL_VERSION,
            feature_count: layout.feature_count(),
            learning_rate: 1.0,
            base_score: 250.0,
            trees: vec![],
        };
        let metadata = ModelMetadata {
            trained_at: chrono::Utc::now().naive_utc(),
            training_samples: 0,
            test_samples: 0,
            train_mae: 0.0,
            test_mae: 0.0,
            train_r2: 0.0,
            test_r2: 0.0,
            feature_count: layout.feature_count(),
            feature_names: layout.column_names(),
            image_score_range: None,
            layout,
        };

        let r = record(1, PostType::Image, None);
        assert_eq!(predict_engagement(&model, &metadata, &r), 100.0);
    }
}
