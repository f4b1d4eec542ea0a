pub mod artifacts;
pub mod embeddings;
pub mod errors;
pub mod import;
pub mod prediction;
pub mod training;

pub use errors::{ServiceError, ServiceResult};
