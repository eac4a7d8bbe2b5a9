//! Error types for backend calls and job termination.
//!
//! Transient failures (`CommandTimeout`, `CommandFailed`) never reach the
//! entrypoint: the refresh scheduler turns them into a stale snapshot. Only
//! `CommandNotFound` at startup is fatal, and only outside fake-data mode.

use std::time::Duration;

use thiserror::Error;

/// Failure of a single external command invocation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BackendError {
    #[error("{program} not found (is Slurm installed and on PATH?)")]
    CommandNotFound { program: String },

    #[error("{program} timed out after {}s", .timeout.as_secs())]
    CommandTimeout { program: String, timeout: Duration },

    #[error("{program} failed{}: {stderr}", .exit_code.map(|c| format!(" (exit {c})")).unwrap_or_default())]
    CommandFailed {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },
}

impl BackendError {
    /// Name of the command that failed.
    #[must_use]
    pub fn program(&self) -> &str {
        match self {
            Self::CommandNotFound { program }
            | Self::CommandTimeout { program, .. }
            | Self::CommandFailed { program, .. } => program,
        }
    }

    /// Whether the next refresh cycle may succeed where this one failed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        !matches!(self, Self::CommandNotFound { .. })
    }
}

/// A confirmed kill that the control command rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("failed to kill job {job_id}: {source}")]
pub struct KillFailed {
    pub job_id: String,
    #[source]
    pub source: BackendError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_failed_message_includes_exit_code() {
        let err = BackendError::CommandFailed {
            program: "squeue".into(),
            exit_code: Some(1),
            stderr: "slurm_load_jobs error".into(),
        };
        assert_eq!(
            err.to_string(),
            "squeue failed (exit 1): slurm_load_jobs error"
        );
    }

    #[test]
    fn test_command_failed_without_exit_code() {
        let err = BackendError::CommandFailed {
            program: "scontrol".into(),
            exit_code: None,
            stderr: "killed by signal".into(),
        };
        assert_eq!(err.to_string(), "scontrol failed: killed by signal");
    }

    #[test]
    fn test_timeout_message() {
        let err = BackendError::CommandTimeout {
            program: "squeue".into(),
            timeout: Duration::from_secs(5),
        };
        assert_eq!(err.to_string(), "squeue timed out after 5s");
        assert!(err.is_transient());
        assert_eq!(err.program(), "squeue");
    }

    #[test]
    fn test_not_found_is_not_transient() {
        let err = BackendError::CommandNotFound {
            program: "scontrol".into(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn test_kill_failed_carries_job_id() {
        let err = KillFailed {
            job_id: "4242".into(),
            source: BackendError::CommandFailed {
                program: "scancel".into(),
                exit_code: Some(1),
                stderr: "Invalid job id specified".into(),
            },
        };
        assert!(err.to_string().starts_with("failed to kill job 4242"));
    }
}
