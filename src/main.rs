//! LiDAR Sync CLI application
//!
//! Command-line interface for resumable download and extraction of zipped
//! LiDAR and GeoTIFF tiles.

use std::process;

use tracing::info;
use tracing_subscriber::{filter::Directive, fmt, EnvFilter};

// Import CLI modules through the library (module is public but not re-exported)
use lidar_sync::cli::{
    handle_census, handle_check, handle_config, handle_emit, handle_profiles, handle_sync, Cli,
    Commands,
};
use lidar_sync::config::AppConfig;
use lidar_sync::errors::{AppError, Result};

#[tokio::main]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    match result {
        Ok(code) => process::exit(code),
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

/// Main application logic, returning the process exit code
async fn run() -> Result<i32> {
    // Load environment variables from .env file if it exists
    dotenv::dotenv().ok();

    let cli = Cli::parse_args();
    let config = AppConfig::load(cli.global.config.clone()).await?;

    init_logging(&cli, &config)?;

    info!("LiDAR Sync v{} starting", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Sync(args) => {
            info!("Executing sync command");
            handle_sync(args, &cli.global, &config).await
        }
        Commands::Emit(args) => {
            info!("Executing emit command");
            handle_emit(args, &cli.global, &config).await.map(|_| 0)
        }
        Commands::Check(args) => {
            info!("Executing check command");
            handle_check(args, &cli.global, &config).await.map(|_| 0)
        }
        Commands::Census(args) => {
            info!("Executing census command");
            handle_census(args, &cli.global, &config).await.map(|_| 0)
        }
        Commands::Profiles => handle_profiles(&config).await.map(|_| 0),
        Commands::Config(args) => handle_config(args, &config).await.map(|_| 0),
    }
}

/// Initialize logging from CLI verbosity, falling back to the configured level
fn init_logging(cli: &Cli, config: &AppConfig) -> Result<()> {
    let level = cli
        .log_level()
        .map(|level| level.to_string().to_lowercase())
        .unwrap_or_else(|| config.logging.level.clone());

    let directive: Directive = format!("lidar_sync={}", level)
        .parse()
        .map_err(|e| AppError::generic(format!("Invalid log level '{}': {}", level, e)))?;
    let filter = EnvFilter::from_default_env().add_directive(directive);

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .with_ansi(config.logging.colored_output)
        .with_writer(std::io::stderr)
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
    Ok(())
}
