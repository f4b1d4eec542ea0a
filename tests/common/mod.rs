//! Helpers for integration tests.

use chrono::NaiveDate;
use diesel_migrations::{EmbeddedMigrations, MigrationHarness, embed_migrations};
use engagement_pipeline::db::{DbPool, establish_connection_pool};
use engagement_pipeline::domain::training_record::{DEFAULT_LANGUAGE, NewTrainingRecord};
use engagement_pipeline::domain::types::{InteractionCount, PostType, PostUrl, TagList};
use tempfile::NamedTempFile;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!(); // assumes migrations/ exists

/// Temporary database used in integration tests.
pub struct TestDb {
    _tempfile: NamedTempFile,
    pool: DbPool,
}

impl TestDb {
    pub fn new() -> Self {
        let tempfile = NamedTempFile::new().expect("Failed to create temp file");
        let pool = establish_connection_pool(tempfile.path().to_str().unwrap())
            .expect("Failed to establish SQLite connection.");
        let mut conn = pool
            .get()
            .expect("Failed to get SQLite connection from pool.");
        conn.run_pending_migrations(MIGRATIONS)
            .expect("Migrations failed");
        TestDb {
            _tempfile: tempfile,
            pool,
        }
    }

    pub fn pool(&self) -> DbPool {
        self.pool.clone()
    }
}

/// A labeled post with a caption, ready to insert.
#[allow(dead_code)]
pub fn new_record(slug: &str, post_type: PostType, score: f64) -> NewTrainingRecord {
    NewTrainingRecord {
        post_url: PostUrl::new(format!("https://www.instagram.com/p/{slug}/"))
            .expect("valid post url"),
        post_type,
        caption: Some(format!("caption for {slug}")),
        engagement_score: Some(score),
        likes_count: InteractionCount::new(10).expect("valid count"),
        comments_count: InteractionCount::default(),
        views_count: None,
        followers_count: None,
        theme: TagList::parse("Bridal, Luxury"),
        tone: None,
        dominant_color: None,
        cta_present: Some(true),
        paid: None,
        posting_time: Some("18:30".to_string()),
        posted_at: NaiveDate::from_ymd_opt(2025, 11, 3),
        language: DEFAULT_LANGUAGE.to_string(),
        is_labeled: true,
        labeled_by: None,
        user_id: None,
        created_at: NaiveDate::from_ymd_opt(2025, 11, 3)
            .and_then(|d| d.and_hms_opt(12, 0, 0))
            .expect("valid timestamp"),
    }
}
