use std::io::Write;

use engagement_pipeline::domain::types::{OperatorId, PostType};
use engagement_pipeline::embedding::{EmbeddingClient, EmbeddingError};
use engagement_pipeline::models::config::PipelineConfig;
use engagement_pipeline::repository::{
    DieselRepository, TrainingRecordListQuery, TrainingRecordReader,
};
use engagement_pipeline::services::ServiceError;
use engagement_pipeline::services::embeddings::backfill_embeddings;
use engagement_pipeline::services::import::import_csv_file;
use engagement_pipeline::services::prediction::EngagementPredictor;
use engagement_pipeline::services::training::train_engagement_model;
use tempfile::NamedTempFile;

mod common;

/// Deterministic embedder: the vector depends on the caption length.
struct LengthEmbedder;

impl EmbeddingClient for LengthEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let len = text.chars().count() as f32;
        Ok(vec![len / 100.0, 1.0, 0.0, 0.5])
    }
}

fn csv_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp csv");
    file.write_all(contents.as_bytes()).expect("write csv");
    file
}

fn scraped_csv(rows: usize) -> String {
    let mut csv = String::from("Post URL,Caption,Likes,Theme,Tone,Engagement Score,Posted Date\n");
    for i in 0..rows {
        let (kind, theme, score) = if i % 2 == 0 {
            ("reel", "Bridal", 80.0 + i as f64)
        } else {
            ("p", "Casual, Festive", 100.0 + 10.0 * i as f64)
        };
        csv.push_str(&format!(
            "https://www.instagram.com/{kind}/post{i}/,Caption number {i},{},\"{theme}\",Warm,{score},11/03/2025\n",
            i * 10
        ));
    }
    csv
}

#[test]
fn reimporting_the_same_csv_inserts_nothing() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());
    let file = csv_file(&scraped_csv(6));
    let operator = OperatorId::new("analyst").expect("valid operator");

    let first = import_csv_file(file.path(), Some(&operator), &repo).expect("first import");
    let second = import_csv_file(file.path(), Some(&operator), &repo).expect("second import");

    assert_eq!(first.imported, 6);
    assert_eq!(second.imported, 0);
    assert_eq!(second.skipped, 6);
    let stored = repo
        .list_records(TrainingRecordListQuery::default())
        .expect("list");
    assert_eq!(stored.len(), 6);
    assert_eq!(stored[0].post_type, Some(PostType::Reel));
    assert_eq!(stored[1].post_type, Some(PostType::Image));
    assert_eq!(
        stored[1].labeled_by.as_ref().map(|o| o.as_str()),
        Some("analyst")
    );
}

#[test]
fn csv_without_url_column_is_fatal() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());
    let file = csv_file("Caption,Likes\nhello,1\n");

    let err = import_csv_file(file.path(), None, &repo).unwrap_err();
    assert!(matches!(err, ServiceError::Import(_)));
}

#[test]
fn import_embed_train_predict() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());
    let model_dir = tempfile::tempdir().expect("model dir");
    let config = PipelineConfig {
        model_dir: model_dir.path().to_path_buf(),
        embedding_dimensions: 4,
        request_delay_ms: 0,
        n_estimators: 20,
        ..PipelineConfig::default()
    };

    let file = csv_file(&scraped_csv(9));
    import_csv_file(file.path(), None, &repo).expect("import");
    let report = backfill_embeddings(&repo, &LengthEmbedder, &config).expect("embed");
    assert_eq!(report.updated, 9);

    let err = train_engagement_model(&repo, &config).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::InsufficientData {
            found: 9,
            required: 10
        }
    ));

    let more = csv_file(&scraped_csv(15));
    let imported = import_csv_file(more.path(), None, &repo).expect("import more");
    assert_eq!(imported.imported, 6);
    backfill_embeddings(&repo, &LengthEmbedder, &config).expect("embed more");

    let outcome = train_engagement_model(&repo, &config).expect("train");
    assert_eq!(outcome.metadata.training_samples, 12);
    assert_eq!(outcome.metadata.test_samples, 3);
    assert_eq!(
        outcome.metadata.layout.vocabulary.themes,
        vec!["Bridal", "Casual", "Festive"]
    );
    assert!(outcome.paths.model_latest.exists());

    let predictor = EngagementPredictor::load_latest(model_dir.path()).expect("load model");
    let record = repo
        .list_records(TrainingRecordListQuery::training_ready())
        .expect("list")
        .remove(0);
    let score = predictor.predict(&record);
    assert!((0.0..=100.0).contains(&score));
}
