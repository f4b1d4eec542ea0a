//! Parsing of scraped-post CSV exports.
//!
//! Headers are matched loosely: case, surrounding whitespace and the
//! separators ` `, `_` and `-` are ignored, so `Posted Date`, `posted_date`
//! and `POSTED-DATE` all address the same column.

use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use thiserror::Error;

use crate::domain::training_record::{DEFAULT_LANGUAGE, NewTrainingRecord};
use crate::domain::types::{
    InteractionCount, OperatorId, PostType, PostUrl, TagList, TypeConstraintError,
};

/// Date-only formats tried in order; the first match wins.
pub const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y", "%d %B %Y", "%B %d, %Y"];

/// Date-time formats tried after [`DATE_FORMATS`]; only the date part is kept.
pub const DATE_TIME_FORMATS: [&str; 3] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
];

const TRUTHY_TOKENS: [&str; 5] = ["true", "yes", "y", "1", "t"];
const FALSY_TOKENS: [&str; 5] = ["false", "no", "n", "0", "f"];

/// Logical columns understood by the importer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsvField {
    Url,
    PostType,
    Likes,
    Comments,
    Views,
    Followers,
    Caption,
    Language,
    Theme,
    Tone,
    DominantColor,
    CtaPresent,
    Paid,
    PostingTime,
    EngagementScore,
    PostedDate,
}

impl CsvField {
    /// Normalized header names for this field, in priority order.
    pub const fn aliases(self) -> &'static [&'static str] {
        match self {
            Self::Url => &["url", "post_url", "link", "post_link"],
            Self::PostType => &["type", "post_type"],
            Self::Likes => &["likes", "likes_count"],
            Self::Comments => &["comments", "comments_count"],
            Self::Views => &["views", "views_count", "video_views"],
            Self::Followers => &["followers", "followers_count"],
            Self::Caption => &["caption"],
            Self::Language => &["language", "lang"],
            Self::Theme => &["theme", "themes"],
            Self::Tone => &["tone", "tones"],
            Self::DominantColor => &["dominant_color", "dominant_colour", "color", "colour"],
            Self::CtaPresent => &["cta_present", "cta"],
            Self::Paid => &["paid", "boosted", "is_paid"],
            Self::PostingTime => &["posting_time", "post_time", "time"],
            Self::EngagementScore => &["engagement_score", "score"],
            Self::PostedDate => &["posted_date", "date", "posted_at", "post_date"],
        }
    }
}

#[derive(Debug, Error)]
pub enum ImportParseError {
    #[error("failed to open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV has no URL column")]
    MissingUrlColumn,
}

/// Problems with a single CSV row; the row is skipped and the batch continues.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RowError {
    #[error("invalid post url: {0}")]
    InvalidUrl(TypeConstraintError),
    #[error("invalid {field} value: {value}")]
    InvalidCount { field: &'static str, value: String },
    #[error("invalid engagement score: {0}")]
    InvalidScore(String),
    #[error("invalid UTF-8 in column {0}")]
    InvalidEncoding(String),
    #[error("malformed CSV row: {0}")]
    Malformed(String),
}

/// A data row that could not be decoded; the rest of the file is still read.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedRow {
    pub row_number: usize,
    pub error: RowError,
}

/// One CSV data row, decoded or rejected.
pub type CsvRow = Result<ScrapedPostRow, RejectedRow>;

/// A CSV data row keyed by normalized header name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapedPostRow {
    /// 1-based line number in the file, counting the header row.
    pub row_number: usize,
    values: HashMap<String, String>,
}

impl ScrapedPostRow {
    pub fn new(row_number: usize, values: HashMap<String, String>) -> Self {
        Self { row_number, values }
    }

    /// Value of the first alias of `field` that is present with a non-blank value.
    pub fn field(&self, field: CsvField) -> Option<&str> {
        field
            .aliases()
            .iter()
            .filter_map(|alias| self.values.get(*alias))
            .map(|value| value.trim())
            .find(|value| !value.is_empty())
    }

    /// Canonical post URL, or `None` when the row has no URL at all.
    pub fn post_url(&self) -> Result<Option<PostUrl>, RowError> {
        self.field(CsvField::Url)
            .map(|raw| PostUrl::new(raw).map_err(RowError::InvalidUrl))
            .transpose()
    }

    /// Build the record to insert for this row.
    ///
    /// Data-quality problems in optional columns (dates, boolean tokens,
    /// unknown post types) drop the field; malformed counts or scores reject
    /// the row.
    pub fn into_new_record(
        self,
        post_url: PostUrl,
        operator: Option<&OperatorId>,
        created_at: NaiveDateTime,
    ) -> Result<NewTrainingRecord, RowError> {
        let post_type = self
            .field(CsvField::PostType)
            .and_then(|raw| PostType::try_from(raw).ok())
            .unwrap_or_else(|| detect_post_type(&post_url));

        let theme = self.field(CsvField::Theme).and_then(TagList::parse);
        let tone = self.field(CsvField::Tone).and_then(TagList::parse);
        let is_labeled = theme.is_some() || tone.is_some();

        let engagement_score = self
            .field(CsvField::EngagementScore)
            .map(|raw| {
                raw.parse::<f64>()
                    .ok()
                    .filter(|score| score.is_finite())
                    .ok_or_else(|| RowError::InvalidScore(raw.to_string()))
            })
            .transpose()?;

        Ok(NewTrainingRecord {
            post_type,
            caption: self.field(CsvField::Caption).map(str::to_string),
            engagement_score,
            likes_count: self
                .optional_count(CsvField::Likes, "likes")?
                .unwrap_or_default(),
            comments_count: self
                .optional_count(CsvField::Comments, "comments")?
                .unwrap_or_default(),
            views_count: self.optional_count(CsvField::Views, "views")?,
            followers_count: self.optional_count(CsvField::Followers, "followers")?,
            theme,
            tone,
            dominant_color: self.field(CsvField::DominantColor).and_then(TagList::parse),
            cta_present: self.field(CsvField::CtaPresent).and_then(parse_bool_token),
            paid: self.field(CsvField::Paid).and_then(parse_bool_token),
            posting_time: self.field(CsvField::PostingTime).map(str::to_string),
            posted_at: self.field(CsvField::PostedDate).and_then(parse_posted_date),
            language: self
                .field(CsvField::Language)
                .unwrap_or(DEFAULT_LANGUAGE)
                .to_string(),
            is_labeled,
            labeled_by: operator.filter(|_| is_labeled).cloned(),
            user_id: operator.cloned(),
            created_at,
            post_url,
        })
    }

    fn optional_count(
        &self,
        field: CsvField,
        name: &'static str,
    ) -> Result<Option<InteractionCount>, RowError> {
        self.field(field)
            .map(|raw| parse_count(raw, name))
            .transpose()
    }
}

/// Normalize a header name for alias matching.
pub fn normalize_header(header: &str) -> String {
    header
        .trim()
        .to_lowercase()
        .split([' ', '_', '-'])
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

/// Read scraped posts from a CSV file.
pub fn read_scraped_csv_file(path: &Path) -> Result<Vec<CsvRow>, ImportParseError> {
    let file = File::open(path).map_err(|source| ImportParseError::Open {
        path: path.display().to_string(),
        source,
    })?;
    read_scraped_csv(file)
}

/// Read scraped posts from any CSV source with a header row.
///
/// An unreadable header or source is fatal. Rows that fail to decode are
/// returned as [`RejectedRow`]s in file order.
pub fn read_scraped_csv<R: Read>(reader: R) -> Result<Vec<CsvRow>, ImportParseError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::None)
        .flexible(true)
        .from_reader(reader);

    let headers = reader
        .headers()?
        .iter()
        .map(normalize_header)
        .collect::<Vec<_>>();

    let has_url = CsvField::Url
        .aliases()
        .iter()
        .any(|alias| headers.iter().any(|header| header == alias));
    if !has_url {
        return Err(ImportParseError::MissingUrlColumn);
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.byte_records().enumerate() {
        let row_number = idx + 2;
        let record = match record {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                rows.push(Err(RejectedRow {
                    row_number,
                    error: RowError::Malformed(e.to_string()),
                }));
                continue;
            }
        };
        rows.push(decode_row(row_number, &headers, &record));
    }

    Ok(rows)
}

fn decode_row(row_number: usize, headers: &[String], record: &csv::ByteRecord) -> CsvRow {
    let mut values = HashMap::new();
    for (col_idx, header) in headers.iter().enumerate() {
        let raw = record.get(col_idx).unwrap_or_default();
        let value = std::str::from_utf8(raw).map_err(|_| RejectedRow {
            row_number,
            error: RowError::InvalidEncoding(header.clone()),
        })?;
        // The first column wins when two headers normalize to the same name.
        values
            .entry(header.clone())
            .or_insert_with(|| value.to_string());
    }
    Ok(ScrapedPostRow::new(row_number, values))
}

/// Infer the post type from the URL path.
///
/// `/reel/`, `/reels/` and `/tv/` links are reels; everything else, including
/// `/p/` links, is treated as an image until relabeled.
pub fn detect_post_type(url: &PostUrl) -> PostType {
    if url
        .path_segments()
        .any(|segment| matches!(segment, "reel" | "reels" | "tv"))
    {
        PostType::Reel
    } else {
        PostType::Image
    }
}

/// Parse a free-text posting date, trying each known format in order.
///
/// Unparsable input yields `None` and a warning.
pub fn parse_posted_date(raw: &str) -> Option<NaiveDate> {
    let value = raw.trim();
    if value.is_empty() {
        return None;
    }

    let parsed = DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_TIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
                .map(|dt| dt.date())
        })
        .or_else(|| {
            DateTime::parse_from_rfc3339(value)
                .ok()
                .map(|dt| dt.date_naive())
        });

    if parsed.is_none() {
        log::warn!("Could not parse date '{value}', skipping date");
    }
    parsed
}

/// Interpret a boolean-like CSV token.
///
/// Anything outside the known tokens leaves the field unset.
pub fn parse_bool_token(raw: &str) -> Option<bool> {
    let token = raw.trim().to_ascii_lowercase();
    if TRUTHY_TOKENS.contains(&token.as_str()) {
        Some(true)
    } else if FALSY_TOKENS.contains(&token.as_str()) {
        Some(false)
    } else {
        None
    }
}

/// Parse a count column; thousands separators are accepted.
pub fn parse_count(raw: &str, field: &'static str) -> Result<InteractionCount, RowError> {
    let invalid = || RowError::InvalidCount {
        field,
        value: raw.to_string(),
    };
    let digits = raw.trim().replace(',', "");
    let value = digits.parse::<i64>().map_err(|_| invalid())?;
    InteractionCount::new(value).map_err(|_| invalid())
}
