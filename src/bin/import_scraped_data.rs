//! Import scraped posts from a CSV file.
//!
//! Usage: `import-scraped-data <csv> [operator]`

use std::error::Error;
use std::path::PathBuf;

use engagement_pipeline::db::establish_connection_pool;
use engagement_pipeline::domain::types::OperatorId;
use engagement_pipeline::models::config::{DATABASE_URL_ENV, require_env};
use engagement_pipeline::repository::DieselRepository;
use engagement_pipeline::services::import::import_csv_file;
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
    let mut args = std::env::args().skip(1);
    let Some(csv_path) = args.next().map(PathBuf::from) else {
        eprintln!("Usage: import-scraped-data <csv> [operator]");
        std::process::exit(1);
    };
    let operator = args.next().map(OperatorId::new).transpose()?;

    let database_url = require_env(DATABASE_URL_ENV)?;
    if !csv_path.exists() {
        return Err(format!("CSV file not found: {}", csv_path.display()).into());
    }

    let pool = establish_connection_pool(&database_url)?;
    let repo = DieselRepository::new(pool);
    let report = import_csv_file(&csv_path, operator.as_ref(), &repo)?;

    println!("Imported: {}", report.imported);
    println!("Skipped:  {}", report.skipped);
    println!("Errors:   {}", report.errors.len());
    println!("Total:    {}", report.total_rows);
    for error in &report.errors {
        println!(
            "  row {}{}: {}",
            error.row_number,
            error
                .post_url
                .as_deref()
                .map(|url| format!(" ({url})"))
                .unwrap_or_default(),
            error.message
        );
    }
    Ok(())
}
