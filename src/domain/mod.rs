//! Domain entities and value objects, independent of persistence.

pub mod training_record;
pub mod types;
