//! Command-line interface components
//!
//! This module contains CLI-specific code for LiDAR Sync, including
//! argument parsing, console summaries and the confirmation prompt.

pub mod args;
pub mod commands;
pub mod progress;
pub mod prompt;

pub use args::{
    Cli, Commands, ConfigAction, ConfigArgs, EmitArgs, GlobalArgs, ProfileArgs, SyncArgs,
};
pub use commands::{
    handle_census, handle_check, handle_config, handle_emit, handle_profiles, handle_sync,
    plan_profile, resolve_profile, SyncPlan,
};
pub use progress::{format_census, format_reconciliation, format_session, should_show_progress};
pub use prompt::confirm;
