use std::path::Path;

use chrono::Utc;
use serde::Serialize;

use crate::domain::types::OperatorId;
use crate::forms::import::{CsvRow, read_scraped_csv_file};
use crate::repository::{TrainingRecordReader, TrainingRecordWriter};

use super::ServiceResult;

/// Row-level import error kept for the final summary.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ImportRowError {
    pub row_number: usize,
    pub post_url: Option<String>,
    pub message: String,
}

/// Aggregated import outcome.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ImportReport {
    pub total_rows: usize,
    pub imported: usize,
    /// Rows without a URL or whose URL is already stored.
    pub skipped: usize,
    pub errors: Vec<ImportRowError>,
}

impl ImportReport {
    pub fn with_total(total_rows: usize) -> Self {
        Self {
            total_rows,
            ..Self::default()
        }
    }

    fn push_error(&mut self, row_number: usize, post_url: Option<String>, message: String) {
        self.errors.push(ImportRowError {
            row_number,
            post_url,
            message,
        });
    }
}

/// Read `path` and import every row into the store.
///
/// An unreadable file or a CSV without a URL column is fatal; everything
/// after that is handled per row by [`import_posts`].
pub fn import_csv_file<R>(
    path: &Path,
    operator: Option<&OperatorId>,
    repo: &R,
) -> ServiceResult<ImportReport>
where
    R: TrainingRecordReader + TrainingRecordWriter,
{
    let rows = read_scraped_csv_file(path)?;
    log::info!("Read {} rows from {}", rows.len(), path.display());
    Ok(import_posts(rows, operator, repo))
}

/// Insert rows whose URL is not stored yet.
///
/// Existing URLs are skipped and never updated, so importing the same file
/// twice inserts nothing the second time. Undecodable rows, invalid rows and
/// failed inserts are logged and reported without stopping the batch.
pub fn import_posts<R>(
    rows: Vec<CsvRow>,
    operator: Option<&OperatorId>,
    repo: &R,
) -> ImportReport
where
    R: TrainingRecordReader + TrainingRecordWriter,
{
    let mut report = ImportReport::with_total(rows.len());

    for row in rows {
        let row = match row {
            Ok(row) => row,
            Err(rejected) => {
                log::error!("Row {}: {}", rejected.row_number, rejected.error);
                report.push_error(rejected.row_number, None, rejected.error.to_string());
                continue;
            }
        };
        let row_number = row.row_number;
        let post_url = match row.post_url() {
            Ok(Some(url)) => url,
            Ok(None) => {
                log::warn!("Row {row_number}: no post URL, skipping");
                report.skipped += 1;
                continue;
            }
            Err(e) => {
                log::error!("Row {row_number}: {e}");
                report.push_error(row_number, None, e.to_string());
                continue;
            }
        };

        match repo.get_record_by_url(&post_url) {
            Ok(Some(_)) => {
                log::info!("Already exists: {post_url}");
                report.skipped += 1;
                continue;
            }
            Ok(None) => {}
            Err(e) => {
                log::error!("Row {row_number}: failed to look up {post_url}: {e}");
                report.push_error(row_number, Some(post_url.to_string()), e.to_string());
                continue;
            }
        }

        let url_text = post_url.to_string();
        let record = match row.into_new_record(post_url, operator, Utc::now().naive_utc()) {
            Ok(record) => record,
            Err(e) => {
                log::error!("Row {row_number}: {e}");
                report.push_error(row_number, Some(url_text), e.to_string());
                continue;
            }
        };

        match repo.create_record(&record) {
            Ok(_) => {
                log::info!("Imported {} ({})", url_text, record.post_type);
                report.imported += 1;
            }
            Err(e) => {
                log::error!("Row {row_number}: failed to insert {url_text}: {e}");
                report.push_error(row_number, Some(url_text), e.to_string());
            }
        }
    }

    log::info!(
        "Import complete: {} imported, {} skipped, {} errors, {} total",
        report.imported,
        report.skipped,
        report.errors.len(),
        report.total_rows
    );
    report
}
