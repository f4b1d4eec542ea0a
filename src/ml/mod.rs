pub mod gbdt;
pub mod metrics;
pub mod split;
