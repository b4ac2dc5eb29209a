//! # Posto Back Office Entry Point
//!
//! Loads the period view for a date and prints its derived report as JSON.
//!
//! ## Usage
//! ```bash
//! cargo run -p posto-backoffice
//!
//! # Explicit config file and period date
//! cargo run -p posto-backoffice -- --config ./posto.toml --date 2024-03-31
//! ```

use chrono::{Local, NaiveDate};
use std::env;
use std::path::PathBuf;
use tracing::info;

use posto_backoffice::{init_tracing, BackOfficeConfig, PeriodSession};
use posto_db::{Database, DbConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();
    let mut config_path: Option<PathBuf> = None;
    let mut period_date = Local::now().date_naive();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--date" | "-d" => {
                if i + 1 < args.len() {
                    period_date = NaiveDate::parse_from_str(&args[i + 1], "%Y-%m-%d")?;
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Posto Back Office");
                println!();
                println!("Usage: posto-backoffice [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -c, --config <PATH>   Config file (default: ./posto.toml if present)");
                println!("  -d, --date <DATE>     Period date, YYYY-MM-DD (default: today)");
                println!("  -h, --help            Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    let config = BackOfficeConfig::load(config_path.as_deref())?;
    let db_path = config.database_path()?;
    info!(station = %config.station_name, db = %db_path.display(), "Starting back office");

    let db = Database::new(DbConfig::new(db_path)).await?;
    let session = PeriodSession::load(db, period_date, &config).await?;

    let report = session.report();
    println!("{}", serde_json::to_string_pretty(&report)?);

    session.store().close().await;
    Ok(())
}
