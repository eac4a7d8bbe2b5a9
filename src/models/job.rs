//! Job records built from the bulk `squeue` query.

use chrono::NaiveDateTime;
use serde::Serialize;

use super::state::JobState;

/// Resources a job asked for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Resources {
    pub nodes: u32,
    pub cpus: u32,
    /// Minimum memory per node, in bytes.
    pub mem_per_node: u64,
    /// GPUs across all nodes of the job.
    pub gpus: u32,
}

/// One job as of a single sampling cycle. Identity is `job_id`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct JobRecord {
    /// May carry an array or het-job suffix (`1234_7`, `1234+0`).
    pub job_id: String,
    pub user: String,
    pub name: String,
    pub state: JobState,
    pub state_raw: String,
    pub partition: String,
    pub account: String,
    pub qos: String,
    /// Node range expression as reported (`gpu-a[01-04]`), never expanded.
    pub node_list: String,
    /// Pending reason, empty for running jobs.
    pub reason: String,
    pub submit_time: Option<NaiveDateTime>,
    /// Elapsed run time in seconds.
    pub run_time: Option<u64>,
    /// Remaining time in seconds, `None` when unlimited.
    pub time_left: Option<u64>,
    pub priority: u64,
    /// Empty when the job has no dependency.
    pub dependency: String,
    pub resources: Resources,
}

impl JobRecord {
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.state == JobState::Running
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.state == JobState::Pending
    }

    /// Node list for running jobs, the bracketed reason for pending ones.
    #[must_use]
    pub fn where_or_why(&self) -> String {
        if self.node_list.is_empty() && !self.reason.is_empty() {
            format!("({})", self.reason)
        } else {
            self.node_list.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_where_or_why() {
        let mut job = JobRecord {
            job_id: "101".into(),
            state: JobState::Pending,
            reason: "Priority".into(),
            ..Default::default()
        };
        assert_eq!(job.where_or_why(), "(Priority)");

        job.state = JobState::Running;
        job.node_list = "gpu-a[01-02]".into();
        job.reason.clear();
        assert_eq!(job.where_or_why(), "gpu-a[01-02]");
        assert!(job.is_running());
    }
}
