//! Command handlers for the LiDAR Sync CLI
//!
//! This module implements the command handlers that coordinate between
//! CLI arguments and the core application functionality.

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::app::{
    census, emit_profile_lists, read_url_list, reconcile, ArchiveClient, CategoryPlan,
    Coordinator, Profile, ReconciliationReport, SessionReport, SignalHandler,
};
use crate::cli::progress::{
    format_census, format_reconciliation, format_session, should_show_progress,
};
use crate::cli::prompt::confirm;
use crate::cli::{ConfigAction, ConfigArgs, EmitArgs, GlobalArgs, ProfileArgs, SyncArgs};
use crate::config::{AppConfig, ProfileSource};
use crate::errors::{AppError, ProgressError, Result};

/// Jobs and reconciliation reports for every category of a profile
#[derive(Debug)]
pub struct SyncPlan {
    pub plans: Vec<CategoryPlan>,
    pub reports: Vec<ReconciliationReport>,
}

impl SyncPlan {
    /// Archives that will be fetched across all categories
    pub fn pending_count(&self) -> usize {
        self.plans.iter().map(|plan| plan.jobs.len()).sum()
    }
}

/// Handle the sync command
///
/// Emits the canonical lists (unless `--from-list`), reconciles every
/// category, asks once for confirmation and then runs the jobs. Returns the
/// process exit code.
pub async fn handle_sync(args: SyncArgs, global: &GlobalArgs, config: &AppConfig) -> Result<i32> {
    let start_time = Instant::now();
    args.validate().map_err(AppError::generic)?;

    let mut profile = resolve_profile(config, &args.profile.profile, &global.root)?;
    if let Some(manifest) = &args.manifest {
        profile.manifest = manifest.clone();
    }
    profile.ensure_directories()?;

    if args.from_list {
        info!("Using existing canonical URL lists");
    } else {
        for (category, count) in emit_profile_lists(&profile)? {
            info!("{}: {} URLs written", category, count);
        }
    }

    let sync_plan = plan_profile(&profile)?;
    if !global.quiet {
        for report in &sync_plan.reports {
            print!("{}", format_reconciliation(report));
        }
    }

    let pending = sync_plan.pending_count();
    if pending == 0 {
        println!("Nothing to download, every required output is present");
        return Ok(0);
    }

    if !args.yes {
        let stdin = io::stdin();
        let mut input = stdin.lock();
        let mut output = io::stdout();
        if !confirm(&mut input, &mut output, pending)? {
            println!("Cancelled, nothing was downloaded");
            return Ok(0);
        }
    }

    let mut client_config = config.client.clone();
    if let Some(secs) = args.read_timeout {
        client_config.read_timeout = Duration::from_secs(secs);
    }
    let client = Arc::new(ArchiveClient::with_config(&client_config)?);

    let mut pipeline = config.pipeline.clone();
    if let Some(workers) = args.workers {
        pipeline = pipeline.with_worker_count(workers);
    }
    if let Some(policy) = args.failure_policy() {
        pipeline = pipeline.with_failure_policy(policy);
    }
    pipeline.validate()?;

    let cancel = CancellationToken::new();
    let signal_task = SignalHandler::new(cancel.clone()).setup();

    let coordinator = Coordinator::new(pipeline, client, cancel)
        .with_progress(should_show_progress(global.quiet));
    let session = coordinator.run_session(&profile.name, sync_plan.plans).await;
    signal_task.abort();

    print!("{}", format_session(&session));

    if let Some(path) = &args.summary_json {
        write_summary(path, &session).await?;
        println!("Session summary written to {}", path.display());
    }

    info!(
        "Sync of {} finished in {:?} with exit code {}",
        profile.name,
        start_time.elapsed(),
        session.exit_code()
    );
    Ok(session.exit_code())
}

/// Handle the emit command
pub async fn handle_emit(args: EmitArgs, global: &GlobalArgs, config: &AppConfig) -> Result<()> {
    let mut profile = resolve_profile(config, &args.profile.profile, &global.root)?;
    if let Some(manifest) = args.manifest {
        profile.manifest = manifest;
    }

    let written = emit_profile_lists(&profile)?;
    for ((name, count), category) in written.iter().zip(&profile.categories) {
        println!(
            "{}: {} URLs written to {}",
            name,
            count,
            category.url_list.display()
        );
    }
    Ok(())
}

/// Handle the check command: reconcile without touching the network
pub async fn handle_check(args: ProfileArgs, global: &GlobalArgs, config: &AppConfig) -> Result<()> {
    let profile = resolve_profile(config, &args.profile, &global.root)?;
    let sync_plan = plan_profile(&profile)?;

    for report in &sync_plan.reports {
        print!("{}", format_reconciliation(report));
    }
    println!("{} archives would be fetched", sync_plan.pending_count());
    Ok(())
}

/// Handle the census command
pub async fn handle_census(args: ProfileArgs, global: &GlobalArgs, config: &AppConfig) -> Result<()> {
    let profile = resolve_profile(config, &args.profile, &global.root)?;

    for category in &profile.categories {
        print!("{}", format_census(&category.name, &census(category)));
    }
    Ok(())
}

/// Handle the profiles command
pub async fn handle_profiles(config: &AppConfig) -> Result<()> {
    for (name, spec, source) in config.profile_list() {
        let origin = match source {
            ProfileSource::Builtin => "built-in",
            ProfileSource::Configured => "configured",
            ProfileSource::Override => "configured, overrides built-in",
        };
        println!("{} ({})", name, origin);
        if !spec.description.is_empty() {
            println!("  {}", spec.description);
        }
        println!("  manifest: {}", spec.manifest.display());
        for category in &spec.categories {
            let extensions: Vec<String> = category
                .rules
                .iter()
                .map(|rule| {
                    if rule.optional {
                        format!("{} (companion)", rule.extension)
                    } else {
                        rule.extension.clone()
                    }
                })
                .collect();
            println!(
                "  {} -> {} [{}]",
                category.name,
                category.destination.display(),
                extensions.join(", ")
            );
        }
    }
    Ok(())
}

/// Handle the config command
pub async fn handle_config(args: ConfigArgs, config: &AppConfig) -> Result<()> {
    match args.action {
        ConfigAction::Init { path, force } => {
            let path = match path.or_else(AppConfig::default_config_path) {
                Some(path) => path,
                None => {
                    return Err(AppError::generic(
                        "No user configuration directory available; pass a file path",
                    ))
                }
            };
            AppConfig::write_default(&path, force).await?;
            println!("Configuration written to {}", path.display());
        }
        ConfigAction::Show => {
            print!("{}", config.to_toml()?);
        }
    }
    Ok(())
}

/// Look up a profile and resolve its paths against `root`
pub fn resolve_profile(config: &AppConfig, name: &str, root: &Path) -> Result<Profile> {
    let spec = config.profile_spec(name)?;
    let profile = spec.resolve(name, root)?;
    debug!(
        "Resolved profile {} with {} categories under {}",
        profile.name,
        profile.categories.len(),
        root.display()
    );
    Ok(profile)
}

/// Read every canonical list of `profile` and reconcile it
///
/// Reconciliation of all categories completes before any job exists.
pub fn plan_profile(profile: &Profile) -> Result<SyncPlan> {
    let mut plans = Vec::with_capacity(profile.categories.len());
    let mut reports = Vec::with_capacity(profile.categories.len());

    for category in &profile.categories {
        let urls = read_url_list(&category.url_list, &category.url_header())?;
        let report = reconcile(category, &urls);
        if !report.unnamed.is_empty() {
            warn!(
                "{}: {} URLs have no file name and were skipped",
                category.name,
                report.unnamed.len()
            );
        }
        plans.push(CategoryPlan::new(category.clone(), report.jobs(category)));
        reports.push(report);
    }

    Ok(SyncPlan { plans, reports })
}

async fn write_summary(path: &Path, session: &SessionReport) -> Result<()> {
    let json = session.to_json().map_err(ProgressError::from)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(ProgressError::from)?;
    }
    tokio::fs::write(path, json)
        .await
        .map_err(ProgressError::from)?;
    Ok(())
}
