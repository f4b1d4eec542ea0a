use chrono::Utc;

use crate::domain::training_record::TrainingRecord;
use crate::features::{FeatureMatrix, normalize_image_scores, prepare_features};
use crate::ml::gbdt::{GbdtRegressor, TrainOptions, train_gbdt_regressor};
use crate::ml::metrics::{mean_absolute_error, r2_score};
use crate::ml::split::train_test_split;
use crate::models::config::PipelineConfig;
use crate::repository::{TrainingRecordListQuery, TrainingRecordReader};
use crate::services::artifacts::{ArtifactPaths, ModelMetadata, save_artifacts};

use super::{ServiceError, ServiceResult};

/// Smallest dataset that still leaves one row on each side of the split.
const MIN_SPLITTABLE_ROWS: usize = 2;

/// A fitted model with its evaluation summary.
#[derive(Debug, Clone)]
pub struct FittedModel {
    pub model: GbdtRegressor,
    pub metadata: ModelMetadata,
}

/// Result of a full training run.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub model: GbdtRegressor,
    pub metadata: ModelMetadata,
    pub paths: ArtifactPaths,
}

/// Train on every labeled, embedded record and persist the artifacts.
pub fn train_engagement_model<R>(repo: &R, config: &PipelineConfig) -> ServiceResult<TrainingOutcome>
where
    R: TrainingRecordReader,
{
    let records = repo.list_records(TrainingRecordListQuery::training_ready())?;
    log::info!("Loaded {} labeled records with embeddings", records.len());

    let FittedModel { model, metadata } = fit_engagement_model(records, config)?;
    let paths = save_artifacts(&config.model_dir, &model, &metadata)?;
    log::info!("Model saved to {}", paths.model.display());
    log::info!("Metadata saved to {}", paths.metadata.display());

    Ok(TrainingOutcome {
        model,
        metadata,
        paths,
    })
}

/// Normalize scores, build features, split, fit and evaluate.
///
/// Fails with [`ServiceError::InsufficientData`] before touching the data
/// when fewer than `min_training_samples` records are given.
pub fn fit_engagement_model(
    mut records: Vec<TrainingRecord>,
    config: &PipelineConfig,
) -> ServiceResult<FittedModel> {
    if records.len() < config.min_training_samples {
        return Err(ServiceError::InsufficientData {
            found: records.len(),
            required: config.min_training_samples,
        });
    }

    let image_score_range = normalize_image_scores(&mut records);
    let FeatureMatrix { rows, layout } = prepare_features(&records, config.embedding_dimensions);
    log::info!("Feature shape: {} x {}", rows.len(), layout.feature_count());

    let (x, y): (Vec<Vec<f64>>, Vec<f64>) = rows
        .into_iter()
        .zip(&records)
        .filter_map(|(row, record)| {
            let target = record.engagement_score.unwrap_or(f64::NAN);
            (target.is_finite() && row.iter().all(|v| v.is_finite())).then_some((row, target))
        })
        .unzip();
    let dropped = records.len() - x.len();
    if dropped > 0 {
        log::warn!("Dropped {dropped} records with non-finite features or targets");
    }
    if x.len() < MIN_SPLITTABLE_ROWS {
        return Err(ServiceError::InsufficientData {
            found: x.len(),
            required: MIN_SPLITTABLE_ROWS,
        });
    }

    let split = train_test_split(x.len(), config.test_fraction, config.random_seed);
    let (x_train, y_train) = select_rows(&x, &y, &split.train);
    let (x_test, y_test) = select_rows(&x, &y, &split.test);
    log::info!(
        "Split: {} training rows, {} test rows",
        x_train.len(),
        x_test.len()
    );

    let options = TrainOptions {
        n_estimators: config.n_estimators,
        max_depth: config.max_depth,
        learning_rate: config.learning_rate,
        bins: config.bins,
        ..TrainOptions::default()
    };
    let model = train_gbdt_regressor(&x_train, &y_train, &options)?;

    let train_pred = model.predict_batch(&x_train);
    let test_pred = model.predict_batch(&x_test);
    let metadata = ModelMetadata {
        trained_at: Utc::now().naive_utc(),
        training_samples: x_train.len(),
        test_samples: x_test.len(),
        train_mae: mean_absolute_error(&y_train, &train_pred),
        test_mae: mean_absolute_error(&y_test, &test_pred),
        train_r2: r2_score(&y_train, &train_pred),
        test_r2: r2_score(&y_test, &test_pred),
        feature_count: layout.feature_count(),
        feature_names: layout.column_names(),
        image_score_range,
        layout,
    };
    log::info!(
        "Training set: MAE {:.2}, R2 {:.4}",
        metadata.train_mae,
        metadata.train_r2
    );
    log::info!(
        "Test set: MAE {:.2}, R2 {:.4}",
        metadata.test_mae,
        metadata.test_r2
    );

    Ok(FittedModel { model, metadata })
}

fn select_rows(x: &[Vec<f64>], y: &[f64], indices: &[usize]) -> (Vec<Vec<f64>>, Vec<f64>) {
    indices.iter().map(|&i| (x[i].clone(), y[i])).unzip()
}
