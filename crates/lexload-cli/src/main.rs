//! Main entry point for the lexload command-line tool.

use anyhow::Result;
use clap::Parser;
use lexload_cli::App;
use lexload_common::logging::{init_logging, LoggingConfig};
use lexload_config::{apply_env_overrides, Config, ConfigLoader, ConfigValidator};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path (YAML or TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Language to load, e.g. `en` or `de-AT`
    language: String,

    /// Namespaces to load
    #[arg(required = true)]
    namespaces: Vec<String>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => ConfigLoader::new(path).load().await?,
        None => Config::default(),
    };
    apply_env_overrides(&mut config);
    config.engine.default_language = args.language.clone();

    init_logging(LoggingConfig::from(&config.logging))?;
    info!("Starting lexload");

    // Logs each warning itself.
    ConfigValidator::validate_with_warnings(&config)?;

    let app = App::new(config)?;
    let reports = app.run(&args.namespaces).await?;

    for report in &reports {
        println!("{report}");
    }

    if reports.iter().all(|report| report.ready()) {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
