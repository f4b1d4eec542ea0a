use std::thread;
use std::time::Duration;

use serde::Serialize;

use crate::embedding::{EmbeddingClient, truncate_prompt};
use crate::models::config::PipelineConfig;
use crate::repository::{TrainingRecordListQuery, TrainingRecordReader, TrainingRecordWriter};

use super::ServiceResult;

/// Aggregated outcome of an embedding back-fill run.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct EmbeddingReport {
    pub updated: usize,
    pub failed: usize,
    pub total: usize,
}

/// Generate caption embeddings for every record that has a caption but no
/// embedding yet.
///
/// Each record gets a single request with no retries. A failed request or
/// write is logged and counted, and the batch moves on; re-running the job
/// picks the stragglers up again. After every stored embedding the job sleeps
/// for the configured request delay.
pub fn backfill_embeddings<R, C>(
    repo: &R,
    client: &C,
    config: &PipelineConfig,
) -> ServiceResult<EmbeddingReport>
where
    R: TrainingRecordReader + TrainingRecordWriter,
    C: EmbeddingClient + ?Sized,
{
    backfill_embeddings_with(repo, client, config, thread::sleep)
}

/// [`backfill_embeddings`] with the pause between requests supplied by the
/// caller.
pub fn backfill_embeddings_with<R, C, P>(
    repo: &R,
    client: &C,
    config: &PipelineConfig,
    mut pause: P,
) -> ServiceResult<EmbeddingReport>
where
    R: TrainingRecordReader + TrainingRecordWriter,
    C: EmbeddingClient + ?Sized,
    P: FnMut(Duration),
{
    let records = repo.list_records(TrainingRecordListQuery::missing_embeddings())?;
    let mut report = EmbeddingReport {
        total: records.len(),
        ..EmbeddingReport::default()
    };
    log::info!("Found {} records without embeddings", report.total);

    for (idx, record) in records.iter().enumerate() {
        let position = idx + 1;
        let caption = record.caption.as_deref().unwrap_or_default();
        let prompt = truncate_prompt(caption, config.max_input_chars);
        if prompt.trim().is_empty() {
            log::warn!("[{position}/{}] {}: blank caption", report.total, record.post_url);
            report.failed += 1;
            continue;
        }

        let embedding = match client.embed(prompt) {
            Ok(embedding) => embedding,
            Err(e) => {
                log::error!("[{position}/{}] {}: {e}", report.total, record.post_url);
                report.failed += 1;
                continue;
            }
        };
        if embedding.len() != config.embedding_dimensions {
            log::warn!(
                "[{position}/{}] {}: embedding has {} dimensions, expected {}",
                report.total,
                record.post_url,
                embedding.len(),
                config.embedding_dimensions
            );
        }

        match repo.set_caption_embedding(record.id, &embedding) {
            Ok(_) => {
                log::info!("[{position}/{}] {}: embedding stored", report.total, record.post_url);
                report.updated += 1;
                pause(config.request_delay());
            }
            Err(e) => {
                log::error!(
                    "[{position}/{}] {}: failed to store embedding: {e}",
                    report.total,
                    record.post_url
                );
                report.failed += 1;
            }
        }
    }

    log::info!(
        "Embedding complete: {} updated, {} failed, {} total",
        report.updated,
        report.failed,
        report.total
    );
    Ok(report)
}
