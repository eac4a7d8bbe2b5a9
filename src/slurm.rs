//! Interface to the Slurm command-line tools
//!
//! The [`SlurmBackend`] trait is the boundary between the dashboard and the
//! cluster: it runs status, detail, live-statistics and kill commands and hands
//! back raw text. Parsing happens elsewhere. [`SlurmCli`] runs the real
//! binaries through `tokio::process`; the fixture backend in
//! [`crate::fixtures`] implements the same trait for demo mode.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;

use crate::error::BackendError;
use crate::parser::squeue_format;

/// Which bulk status query to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Nodes,
    Jobs,
}

impl std::fmt::Display for QueryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            QueryKind::Nodes => write!(f, "nodes"),
            QueryKind::Jobs => write!(f, "jobs"),
        }
    }
}

/// Source of raw cluster text.
///
/// Every call is bounded by a timeout and either returns the full output or a
/// typed error; partial output is never returned.
pub trait SlurmBackend: Send + Sync + 'static {
    /// Bulk node or job status.
    fn run_status_query(
        &self,
        kind: QueryKind,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;

    /// Static `key=value` attributes of one job.
    fn run_detail_query(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;

    /// Resource usage of a running job. Empty output means "no data yet".
    fn run_live_stats_query(
        &self,
        job_id: &str,
    ) -> impl Future<Output = Result<String, BackendError>> + Send;

    /// Terminate a job. Single attempt.
    fn run_kill(&self, job_id: &str) -> impl Future<Output = Result<(), BackendError>> + Send;
}

/// How the Slurm binary path was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathResolution {
    /// Explicitly configured via config file or environment variable
    Configured,
    /// Found `scontrol` on the user's PATH
    AutoDetected,
    /// Fell back to /usr/bin and `scontrol` was found there
    Fallback,
    /// Fell back to /usr/bin but `scontrol` was NOT found
    FallbackUnverified,
}

/// Result of finding the Slurm binary path
#[derive(Debug, Clone)]
pub struct SlurmPathResult {
    pub path: PathBuf,
    pub resolution: PathResolution,
}

const PROBE_BINARY: &str = "scontrol";
const FALLBACK_BIN_DIR: &str = "/usr/bin";

/// Find the directory containing Slurm binaries.
///
/// Resolution order:
/// 1. Explicit path (from config), if it is an existing directory.
/// 2. Directory of `scontrol` found on `PATH`.
/// 3. `/usr/bin`.
pub fn find_slurm_bin_path(config_path: Option<&Path>) -> SlurmPathResult {
    find_slurm_bin_path_with(config_path, || which::which(PROBE_BINARY).ok())
}

fn find_slurm_bin_path_with(
    config_path: Option<&Path>,
    lookup: impl FnOnce() -> Option<PathBuf>,
) -> SlurmPathResult {
    if let Some(path) = config_path {
        if path.is_dir() {
            return SlurmPathResult {
                path: path.to_path_buf(),
                resolution: PathResolution::Configured,
            };
        }
        tracing::warn!(
            path = %path.display(),
            "configured slurm_bin_path is not a directory, trying auto-detection"
        );
    }

    if let Some(found) = lookup()
        && let Some(parent) = found.parent()
    {
        return SlurmPathResult {
            path: parent.to_path_buf(),
            resolution: PathResolution::AutoDetected,
        };
    }

    let fallback = PathBuf::from(FALLBACK_BIN_DIR);
    let resolution = if fallback.join(PROBE_BINARY).exists() {
        PathResolution::Fallback
    } else {
        tracing::warn!("Slurm binaries not found in PATH or {FALLBACK_BIN_DIR}");
        PathResolution::FallbackUnverified
    };
    SlurmPathResult {
        path: fallback,
        resolution,
    }
}

/// Backend that runs the real Slurm binaries.
#[derive(Debug, Clone)]
pub struct SlurmCli {
    bin_path: PathBuf,
    resolution: PathResolution,
    timeout: Duration,
}

impl SlurmCli {
    /// Locate the Slurm binaries and build a backend with the given timeout.
    pub fn discover(config_path: Option<&Path>, timeout: Duration) -> Self {
        let found = find_slurm_bin_path(config_path);
        tracing::info!(
            path = %found.path.display(),
            resolution = ?found.resolution,
            "using Slurm binaries"
        );
        Self {
            bin_path: found.path,
            resolution: found.resolution,
            timeout,
        }
    }

    #[must_use]
    pub fn bin_path(&self) -> &Path {
        &self.bin_path
    }

    #[must_use]
    pub fn resolution(&self) -> PathResolution {
        self.resolution
    }

    /// Fails with `CommandNotFound` when `scontrol` is missing.
    pub fn check_available(&self) -> Result<(), BackendError> {
        let probe = self.bin_path.join(PROBE_BINARY);
        if probe.is_file() {
            Ok(())
        } else {
            Err(BackendError::CommandNotFound {
                program: probe.display().to_string(),
            })
        }
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<String, BackendError> {
        let path = self.bin_path.join(program);
        tracing::debug!(program, ?args, "running Slurm command");

        let child = Command::new(&path)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| spawn_error(program, &path, &e))?;

        // Dropping the future on timeout drops the child, which kills it.
        let output = match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|e| spawn_error(program, &path, &e))?,
            Err(_) => {
                return Err(BackendError::CommandTimeout {
                    program: program.to_string(),
                    timeout: self.timeout,
                });
            }
        };

        if !output.status.success() {
            return Err(BackendError::CommandFailed {
                program: program.to_string(),
                exit_code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

fn spawn_error(program: &str, path: &Path, e: &std::io::Error) -> BackendError {
    match e.kind() {
        std::io::ErrorKind::NotFound => BackendError::CommandNotFound {
            program: path.display().to_string(),
        },
        _ => BackendError::CommandFailed {
            program: program.to_string(),
            exit_code: None,
            stderr: e.to_string(),
        },
    }
}

impl SlurmBackend for SlurmCli {
    async fn run_status_query(&self, kind: QueryKind) -> Result<String, BackendError> {
        match kind {
            QueryKind::Nodes => self.run("scontrol", &["show", "node", "-o"]).await,
            QueryKind::Jobs => {
                let format = format!("--format={}", squeue_format());
                self.run("squeue", &["--all", "--noheader", &format]).await
            }
        }
    }

    async fn run_detail_query(&self, job_id: &str) -> Result<String, BackendError> {
        self.run("scontrol", &["show", "job", job_id]).await
    }

    async fn run_live_stats_query(&self, job_id: &str) -> Result<String, BackendError> {
        self.run(
            "sstat",
            &[
                "-j",
                job_id,
                "--format=AveCPU,AveRSS,MaxRSS,MaxDiskRead,MaxDiskWrite",
                "-n",
                "-P",
            ],
        )
        .await
    }

    async fn run_kill(&self, job_id: &str) -> Result<(), BackendError> {
        self.run("scancel", &[job_id]).await.map(|_| ())
    }
}

/// Get current username from environment
pub fn current_user() -> String {
    std::env::var("USER")
        .or_else(|_| std::env::var("LOGNAME"))
        .unwrap_or_else(|_| {
            tracing::warn!("could not determine username from USER or LOGNAME");
            "unknown".to_string()
        })
}
