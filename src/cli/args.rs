//! Command-line argument parsing for LiDAR Sync
//!
//! This module defines the CLI structure using clap derive macros.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::app::FailurePolicy;

/// LiDAR Sync - mirror zipped LiDAR and GeoTIFF tiles
#[derive(Parser, Debug)]
#[command(
    name = "lidar_sync",
    version,
    about = "Resumable download and extraction of zipped LiDAR and GeoTIFF tiles",
    long_about = "Turns a tile manifest into canonical URL lists, works out which extracted outputs are \
missing locally and fetches, extracts and removes only those archives. Safe to interrupt and re-run."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Working root that profile paths are resolved against
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Parse the manifest, reconcile and fetch every missing archive
    Sync(SyncArgs),

    /// Parse the manifest and rewrite the canonical URL lists only
    Emit(EmitArgs),

    /// Reconcile the canonical URL lists against the local tree (no network access)
    Check(ProfileArgs),

    /// Count the files currently present for each output rule
    Census(ProfileArgs),

    /// List built-in and configured profiles
    Profiles,

    /// Manage the configuration file
    Config(ConfigArgs),
}

/// Arguments naming a single profile
#[derive(Args, Debug, Clone)]
pub struct ProfileArgs {
    /// Profile name (see `profiles`)
    #[arg(value_name = "PROFILE")]
    pub profile: String,
}

/// Arguments for the emit command
#[derive(Args, Debug, Clone)]
pub struct EmitArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Manifest file to read instead of the profile's
    #[arg(short, long, value_name = "FILE")]
    pub manifest: Option<PathBuf>,
}

/// Arguments for the sync command
#[derive(Args, Debug, Clone)]
pub struct SyncArgs {
    #[command(flatten)]
    pub profile: ProfileArgs,

    /// Manifest file to read instead of the profile's
    #[arg(short, long, value_name = "FILE", conflicts_with = "from_list")]
    pub manifest: Option<PathBuf>,

    /// Skip the manifest and reconcile the existing canonical URL lists
    #[arg(long)]
    pub from_list: bool,

    /// Do not ask for confirmation before downloading
    #[arg(short = 'y', long)]
    pub yes: bool,

    /// Number of archives processed concurrently
    #[arg(short = 'w', long)]
    pub workers: Option<usize>,

    /// Keep going after a failed archive instead of stopping
    #[arg(long)]
    pub continue_on_error: bool,

    /// Seconds without data before a transfer is abandoned
    #[arg(long, value_name = "SECS")]
    pub read_timeout: Option<u64>,

    /// Write the session report as JSON to this file
    #[arg(long, value_name = "FILE")]
    pub summary_json: Option<PathBuf>,
}

/// Arguments for configuration management
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a commented default configuration file
    Init {
        /// Destination file (defaults to the user configuration directory)
        #[arg(value_name = "FILE")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Logging level requested on the command line, if any
    pub fn log_level(&self) -> Option<tracing::Level> {
        if self.global.quiet {
            Some(tracing::Level::ERROR)
        } else if self.global.very_verbose {
            Some(tracing::Level::DEBUG)
        } else if self.global.verbose {
            Some(tracing::Level::INFO)
        } else {
            None
        }
    }
}

impl SyncArgs {
    /// Validate argument combinations clap cannot express
    pub fn validate(&self) -> Result<(), String> {
        if self.workers == Some(0) {
            return Err("Number of workers must be greater than 0".to_string());
        }
        if self.read_timeout == Some(0) {
            return Err("Read timeout must be greater than 0".to_string());
        }
        Ok(())
    }

    /// Failure policy requested on the command line, if any
    pub fn failure_policy(&self) -> Option<FailurePolicy> {
        self.continue_on_error.then_some(FailurePolicy::Continue)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_sync_arguments() {
        let cli = Cli::try_parse_from([
            "lidar_sync",
            "--root",
            "/data",
            "sync",
            "van-2018",
            "-y",
            "-w",
            "4",
            "--continue-on-error",
            "--read-timeout",
            "30",
        ])
        .unwrap();

        assert_eq!(cli.global.root, PathBuf::from("/data"));
        match cli.command {
            Commands::Sync(args) => {
                assert_eq!(args.profile.profile, "van-2018");
                assert!(args.yes);
                assert_eq!(args.workers, Some(4));
                assert_eq!(args.read_timeout, Some(30));
                assert_eq!(args.failure_policy(), Some(FailurePolicy::Continue));
                assert!(args.validate().is_ok());
            }
            other => panic!("Expected sync, got {:?}", other),
        }
    }

    #[test]
    fn test_manifest_conflicts_with_from_list() {
        let result = Cli::try_parse_from([
            "lidar_sync",
            "sync",
            "van-2022",
            "--from-list",
            "--manifest",
            "x.csv",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_zero_workers_rejected() {
        let cli = Cli::try_parse_from(["lidar_sync", "sync", "van-2013", "-w", "0"]).unwrap();
        match cli.command {
            Commands::Sync(args) => assert!(args.validate().is_err()),
            other => panic!("Expected sync, got {:?}", other),
        }
    }

    #[test]
    fn test_log_level() {
        let quiet = Cli::try_parse_from(["lidar_sync", "-q", "profiles"]).unwrap();
        assert_eq!(quiet.log_level(), Some(tracing::Level::ERROR));

        let verbose = Cli::try_parse_from(["lidar_sync", "profiles", "-v"]).unwrap();
        assert_eq!(verbose.log_level(), Some(tracing::Level::INFO));

        let default = Cli::try_parse_from(["lidar_sync", "census", "van-2018"]).unwrap();
        assert_eq!(default.log_level(), None);
        assert_eq!(default.global.root, PathBuf::from("."));
    }
}
