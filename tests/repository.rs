use diesel::prelude::*;
use engagement_pipeline::domain::types::{PostType, PostUrl};
use engagement_pipeline::repository::{
    DieselRepository, TrainingRecordListQuery, TrainingRecordReader, TrainingRecordWriter,
};
use engagement_pipeline::schema::engagement_training_data;

mod common;

#[test]
fn create_and_fetch_by_url() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());
    let new_record = common::new_record("abc", PostType::Carousel, 42.5);

    assert_eq!(repo.create_record(&new_record).expect("should insert"), 1);

    let url = PostUrl::new("https://www.instagram.com/p/abc/").expect("valid url");
    let stored = repo
        .get_record_by_url(&url)
        .expect("should query")
        .expect("record should exist");
    assert_eq!(stored.post_type, Some(PostType::Carousel));
    assert_eq!(stored.engagement_score, Some(42.5));
    assert_eq!(stored.likes_count.get(), 10);
    assert_eq!(
        stored.theme.as_ref().map(|t| t.labels().to_vec()),
        Some(vec!["Bridal".to_string(), "Luxury".to_string()])
    );
    assert_eq!(stored.posting_time.as_deref(), Some("18:30"));
    assert!(stored.is_labeled);
    assert!(stored.caption_embedding.is_none());

    let missing = PostUrl::new("https://www.instagram.com/p/nope/").expect("valid url");
    assert!(repo.get_record_by_url(&missing).expect("should query").is_none());
}

#[test]
fn duplicate_urls_are_rejected_by_the_store() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());
    let new_record = common::new_record("dup", PostType::Image, 1.0);

    repo.create_record(&new_record).expect("first insert");
    assert!(repo.create_record(&new_record).is_err());
}

#[test]
fn embeddings_round_trip_and_drive_list_filters() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());
    repo.create_record(&common::new_record("one", PostType::Reel, 80.0))
        .expect("insert one");
    let mut unlabeled = common::new_record("two", PostType::Image, 5.0);
    unlabeled.is_labeled = false;
    unlabeled.theme = None;
    repo.create_record(&unlabeled).expect("insert two");
    let mut no_caption = common::new_record("three", PostType::Image, 7.0);
    no_caption.caption = None;
    repo.create_record(&no_caption).expect("insert three");

    let pending = repo
        .list_records(TrainingRecordListQuery::missing_embeddings())
        .expect("list pending");
    assert_eq!(pending.len(), 2);
    assert!(pending.iter().all(|r| r.needs_embedding()));

    let first = &pending[0];
    let embedding = vec![0.25_f32, -1.5, 3.0];
    assert_eq!(
        repo.set_caption_embedding(first.id, &embedding)
            .expect("store embedding"),
        1
    );

    let ready = repo
        .list_records(TrainingRecordListQuery::training_ready())
        .expect("list ready");
    assert_eq!(ready.len(), 1);
    assert_eq!(ready[0].caption_embedding.as_deref(), Some(embedding.as_slice()));

    let still_pending = repo
        .list_records(TrainingRecordListQuery::missing_embeddings())
        .expect("list pending");
    assert_eq!(still_pending.len(), 1);
    assert_eq!(still_pending[0].post_url.as_str(), "https://www.instagram.com/p/two/");
}

#[test]
fn unknown_stored_post_types_read_as_none() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());
    repo.create_record(&common::new_record("odd", PostType::Image, 1.0))
        .expect("insert");

    let mut conn = test_db.pool().get().expect("connection");
    diesel::update(engagement_training_data::table)
        .set(engagement_training_data::post_type.eq("story"))
        .execute(&mut conn)
        .expect("update type");

    let url = PostUrl::new("https://www.instagram.com/p/odd/").expect("valid url");
    let stored = repo
        .get_record_by_url(&url)
        .expect("query")
        .expect("record should exist");
    assert_eq!(stored.post_type, None);
}

#[test]
fn invalid_rows_are_left_out_of_listings() {
    let test_db = common::TestDb::new();
    let repo = DieselRepository::new(test_db.pool());
    for slug in ["one", "two", "three"] {
        repo.create_record(&common::new_record(slug, PostType::Image, 1.0))
            .expect("insert");
    }

    let mut conn = test_db.pool().get().expect("connection");
    diesel::update(
        engagement_training_data::table
            .filter(engagement_training_data::post_url.eq("https://www.instagram.com/p/two/")),
    )
    .set(engagement_training_data::caption_embedding.eq(Some(vec![1u8, 2, 3])))
    .execute(&mut conn)
    .expect("corrupt embedding");
    diesel::update(
        engagement_training_data::table
            .filter(engagement_training_data::post_url.eq("https://www.instagram.com/p/three/")),
    )
    .set(engagement_training_data::likes_count.eq(-5))
    .execute(&mut conn)
    .expect("corrupt count");

    let listed = repo
        .list_records(TrainingRecordListQuery::default())
        .expect("listing should survive bad rows");
    let urls = listed
        .iter()
        .map(|r| r.post_url.as_str())
        .collect::<Vec<_>>();
    assert_eq!(urls, ["https://www.instagram.com/p/one/"]);
}
