//! Diesel row models and their conversions to domain types.

pub mod config;
pub mod training_record;
