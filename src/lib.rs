//! Offline engagement pipeline.
//!
//! Three batch jobs share this library:
//! - `import-scraped-data` loads scraped posts from CSV into the store.
//! - `generate-embeddings` back-fills caption embeddings.
//! - `train-model` fits the engagement regressor and writes its artifacts.

pub mod db;
pub mod domain;
pub mod embedding;
pub mod features;
pub mod forms;
pub mod ml;
pub mod models;
pub mod repository;
pub mod schema;
pub mod services;
