//! Train the engagement model on labeled, embedded records.

use std::error::Error;

use engagement_pipeline::db::establish_connection_pool;
use engagement_pipeline::models::config::{
    DATABASE_URL_ENV, DEFAULT_CONFIG_PATH, PipelineConfig, require_env,
};
use engagement_pipeline::repository::DieselRepository;
use engagement_pipeline::services::training::train_engagement_model;
use env_logger::Env;

fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    if let Err(err) = run() {
        log::error!("{err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn Error>> {
    let database_url = require_env(DATABASE_URL_ENV)?;
    let config = PipelineConfig::load(DEFAULT_CONFIG_PATH)?;

    let pool = establish_connection_pool(&database_url)?;
    let repo = DieselRepository::new(pool);

    let outcome = train_engagement_model(&repo, &config)?;
    let metadata = &outcome.metadata;
    println!(
        "Training set: MAE {:.2}, R2 {:.4} ({} samples)",
        metadata.train_mae, metadata.train_r2, metadata.training_samples
    );
    println!(
        "Test set:     MAE {:.2}, R2 {:.4} ({} samples)",
        metadata.test_mae, metadata.test_r2, metadata.test_samples
    );
    println!("Model:    {}", outcome.paths.model.display());
    println!("Latest:   {}", outcome.paths.model_latest.display());
    println!("Metadata: {}", outcome.paths.metadata.display());
    Ok(())
}
