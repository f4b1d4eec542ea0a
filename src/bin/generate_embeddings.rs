//! Back-fill caption embeddings for records that lack one.

use std::error::Error;

use engagement_pipeline::db::establish_connection_pool;
use engagement_pipeline::embedding::OpenAiEmbedder;
use engagement_pipeline::models::config::{
    DATABASE_URL_ENV, DEFAULT_CONFIG_PATH, OPENAI_API_KEY_ENV, PipelineConfig, require_env,
};
use engagement_pipeline::repository::DieselRepository;
use engagement_pipeline::services::embeddings::backfill_embeddings;
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
    let api_key = require_env(OPENAI_API_KEY_ENV)?;
    let config = PipelineConfig::load(DEFAULT_CONFIG_PATH)?;

    let client = OpenAiEmbedder::new(
        &api_key,
        &config.embedding_base_url,
        &config.embedding_model,
        config.request_timeout(),
    )?;
    let pool = establish_connection_pool(&database_url)?;
    let repo = DieselRepository::new(pool);

    let report = backfill_embeddings(&repo, &client, &config)?;
    println!("Updated: {}", report.updated);
    println!("Failed:  {}", report.failed);
    println!("Total:   {}", report.total);
    Ok(())
}
