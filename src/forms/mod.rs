//! Parsing of external inputs into domain payloads.

pub mod import;
