//! smon - Live terminal dashboard for Slurm clusters

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use smon::display;
use smon::error::BackendError;
use smon::filter::{FilterCriteria, apply_filter};
use smon::fixtures::FixtureBackend;
use smon::models::SmonConfig;
use smon::parser::{parse_jobs, parse_nodes};
use smon::scheduler::fetch_job_detail;
use smon::slurm::{PathResolution, QueryKind, SlurmBackend, SlurmCli};
use smon::tui;

#[derive(Parser)]
#[command(name = "smon")]
#[command(about = "Live terminal dashboard for Slurm clusters", long_about = None)]
#[command(version)]
struct Cli {
    /// Use generated demo data instead of querying Slurm
    #[arg(long, global = true)]
    fake: bool,

    /// Refresh interval in seconds
    #[arg(short, long, value_name = "SECONDS", global = true)]
    interval: Option<u64>,

    /// Title shown in the dashboard header
    #[arg(long, global = true)]
    title: Option<String>,

    /// Write logs to this file (level from SMON_LOG, default info)
    #[arg(long, value_name = "PATH", env = "SMON_LOG_FILE", global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive dashboard (default)
    #[command(alias = "ui")]
    Tui,

    /// Show node information with cluster totals
    Nodes {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show the job queue
    Jobs {
        /// Only jobs of this user (case-insensitive)
        #[arg(short, long)]
        user: Option<String>,

        /// Only jobs whose name starts with this prefix (case-insensitive)
        #[arg(short, long)]
        prefix: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Show detailed information for a specific job
    Job {
        /// Job ID to inspect
        job_id: String,

        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        init_logging(path)?;
    }

    let (mut config, warnings) = SmonConfig::load()?;
    config.apply_cli(cli.fake, cli.interval, cli.title);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let command = cli.command.unwrap_or(Commands::Tui);

    if config.system.fake_data {
        tracing::info!("running with generated demo data");
        return runtime.block_on(dispatch(
            Arc::new(FixtureBackend::new()),
            command,
            config,
            warnings,
        ));
    }

    let backend = SlurmCli::discover(
        config.system.slurm_bin_path.as_deref(),
        config.refresh.command_timeout(),
    );
    if let Err(e) = backend.check_available() {
        tracing::error!(
            error = %e,
            path = %backend.bin_path().display(),
            resolution = ?backend.resolution(),
            "Slurm is not available"
        );
        eprintln!("Error: {e}");
        eprintln!("Hint: {}", missing_slurm_hint(backend.resolution()));
        std::process::exit(1);
    }

    runtime.block_on(dispatch(Arc::new(backend), command, config, warnings))
}

fn missing_slurm_hint(resolution: PathResolution) -> &'static str {
    match resolution {
        PathResolution::Configured => {
            "the configured Slurm path has no scontrol; check SMON_SLURM_PATH or system.slurm_bin_path."
        }
        PathResolution::AutoDetected | PathResolution::Fallback | PathResolution::FallbackUnverified => {
            "scontrol was not found on PATH or in /usr/bin; set SMON_SLURM_PATH, or run with --fake to try the demo data."
        }
    }
}

/// Install a file subscriber. The dashboard owns the terminal, so logs never go to stderr.
fn init_logging(path: &Path) -> Result<()> {
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open log file '{}'", path.display()))?;

    let filter = EnvFilter::try_from_env("SMON_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "smon starting");
    Ok(())
}

async fn dispatch<B: SlurmBackend>(
    backend: Arc<B>,
    command: Commands,
    config: SmonConfig,
    warnings: Vec<String>,
) -> Result<()> {
    match command {
        Commands::Tui => tui::run_tui(backend, config, warnings).await,
        Commands::Nodes { json } => {
            let output = handle_nodes_command(backend.as_ref(), json).await?;
            println!("{output}");
            Ok(())
        }
        Commands::Jobs { user, prefix, json } => {
            let criteria = FilterCriteria::new(user.as_deref(), prefix.as_deref());
            let output = handle_jobs_command(backend.as_ref(), &criteria, json).await?;
            println!("{output}");
            Ok(())
        }
        Commands::Job { job_id, json } => {
            let output = handle_job_command(backend.as_ref(), &job_id, json).await?;
            println!("{output}");
            Ok(())
        }
    }
}

async fn status_text<B: SlurmBackend>(backend: &B, kind: QueryKind) -> Result<String, BackendError> {
    let text = backend.run_status_query(kind).await?;
    tracing::debug!(%kind, bytes = text.len(), "status query finished");
    Ok(text)
}

fn warn_skipped(skipped: usize) {
    if skipped > 0 {
        tracing::warn!(skipped, "parser skipped malformed rows");
        eprintln!("warning: {skipped} malformed rows skipped");
    }
}

async fn handle_nodes_command<B: SlurmBackend>(backend: &B, json: bool) -> Result<String> {
    let text = status_text(backend, QueryKind::Nodes)
        .await
        .context("failed to query nodes")?;
    let nodes = parse_nodes(&text);
    warn_skipped(nodes.skipped);

    if json {
        return serde_json::to_string_pretty(&nodes.records).context("failed to encode nodes");
    }
    Ok(display::format_nodes(&nodes.records))
}

async fn handle_jobs_command<B: SlurmBackend>(
    backend: &B,
    criteria: &FilterCriteria,
    json: bool,
) -> Result<String> {
    let text = status_text(backend, QueryKind::Jobs)
        .await
        .context("failed to query jobs")?;
    let jobs = parse_jobs(&text);
    warn_skipped(jobs.skipped);

    let view = apply_filter(&jobs.records, criteria);
    if json {
        let visible: Vec<_> = view.iter(&jobs.records).collect();
        return serde_json::to_string_pretty(&visible).context("failed to encode jobs");
    }
    Ok(display::format_jobs(&jobs.records, &view, criteria))
}

async fn handle_job_command<B: SlurmBackend>(
    backend: &B,
    job_id: &str,
    json: bool,
) -> Result<String> {
    let detail = fetch_job_detail(backend, job_id)
        .await
        .with_context(|| format!("failed to fetch job {job_id}"))?;

    if json {
        return serde_json::to_string_pretty(&detail).context("failed to encode job detail");
    }
    Ok(display::format_job_detail(&detail))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_jobs_filters() {
        let cli = Cli::parse_from(["smon", "--fake", "jobs", "--user", "alice", "-p", "train"]);
        assert!(cli.fake);
        match cli.command {
            Some(Commands::Jobs { user, prefix, json }) => {
                assert_eq!(user.as_deref(), Some("alice"));
                assert_eq!(prefix.as_deref(), Some("train"));
                assert!(!json);
            }
            _ => panic!("expected jobs command"),
        }
    }

    #[test]
    fn test_cli_defaults_to_dashboard() {
        let cli = Cli::parse_from(["smon", "--interval", "5"]);
        assert_eq!(cli.interval, Some(5));
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_missing_slurm_hint_names_the_fix() {
        assert!(missing_slurm_hint(PathResolution::Configured).contains("SMON_SLURM_PATH"));
        assert!(missing_slurm_hint(PathResolution::FallbackUnverified).contains("--fake"));
    }

    #[tokio::test]
    async fn test_one_shot_commands_against_fixtures() {
        let backend = FixtureBackend::new();

        let nodes = handle_nodes_command(&backend, true).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&nodes).unwrap();
        assert_eq!(parsed.as_array().map(Vec::len), Some(64));

        let criteria = FilterCriteria::new(Some("alice"), None);
        let jobs = handle_jobs_command(&backend, &criteria, true).await.unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&jobs).unwrap();
        let jobs = parsed.as_array().unwrap();
        assert!(!jobs.is_empty());
        assert!(jobs.iter().all(|j| j["user"] == "alice"));
    }

    #[tokio::test]
    async fn test_unknown_job_is_an_error() {
        let backend = FixtureBackend::new();
        let err = handle_job_command(&backend, "no-such-job", false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no-such-job"));
    }
}
