//! Cluster snapshots and the capacity totals derived from them.

use std::sync::Arc;

use chrono::{DateTime, Local};

use super::job::JobRecord;
use super::node::NodeRecord;
use crate::error::BackendError;

/// The state of the cluster as of one sampling cycle.
///
/// Node and job sequences are shared, so a stale snapshot carries the previous
/// data forward without copying it. A snapshot is never mutated after it has
/// been installed.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub nodes: Arc<[NodeRecord]>,
    pub jobs: Arc<[JobRecord]>,
    /// Time of the last successful sample.
    pub fetched_at: Option<DateTime<Local>>,
    /// Time of the latest attempt, successful or not.
    pub attempted_at: Option<DateTime<Local>>,
    pub last_error: Option<BackendError>,
    pub stale: bool,
    /// Rows the parser dropped while building `nodes` and `jobs`.
    pub skipped_rows: usize,
    /// Incremented on every install.
    pub cycle: u64,
}

impl Default for Snapshot {
    fn default() -> Self {
        Self {
            nodes: Arc::from(Vec::new()),
            jobs: Arc::from(Vec::new()),
            fetched_at: None,
            attempted_at: None,
            last_error: None,
            stale: false,
            skipped_rows: 0,
            cycle: 0,
        }
    }
}

impl Snapshot {
    /// Successor of `previous` built from freshly parsed data.
    #[must_use]
    pub fn fresh(
        previous: &Snapshot,
        nodes: Vec<NodeRecord>,
        jobs: Vec<JobRecord>,
        skipped_rows: usize,
        at: DateTime<Local>,
    ) -> Self {
        Self {
            nodes: nodes.into(),
            jobs: jobs.into(),
            fetched_at: Some(at),
            attempted_at: Some(at),
            last_error: None,
            stale: false,
            skipped_rows,
            cycle: previous.cycle + 1,
        }
    }

    /// Successor of `previous` after a failed attempt: same data, marked stale.
    #[must_use]
    pub fn stale_from(previous: &Snapshot, error: BackendError, at: DateTime<Local>) -> Self {
        Self {
            nodes: Arc::clone(&previous.nodes),
            jobs: Arc::clone(&previous.jobs),
            fetched_at: previous.fetched_at,
            attempted_at: Some(at),
            last_error: Some(error),
            stale: true,
            skipped_rows: previous.skipped_rows,
            cycle: previous.cycle + 1,
        }
    }

    /// True until the first successful sample.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.fetched_at.is_none()
    }

    #[must_use]
    pub fn totals(&self) -> ClusterTotals {
        ClusterTotals::from_nodes(&self.nodes)
    }

    #[must_use]
    pub fn job(&self, job_id: &str) -> Option<&JobRecord> {
        self.jobs.iter().find(|j| j.job_id == job_id)
    }
}

/// Summed capacity of a set of nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Capacity {
    pub nodes: usize,
    pub cpu_allocated: u64,
    pub cpu_total: u64,
    pub mem_allocated: u64,
    pub mem_total: u64,
    pub gpu_allocated: u64,
    pub gpu_total: u64,
}

impl Capacity {
    fn add(&mut self, node: &NodeRecord) {
        self.nodes += 1;
        self.cpu_allocated += u64::from(node.cpu_allocated);
        self.cpu_total += u64::from(node.cpu_total);
        self.mem_allocated += node.mem_allocated;
        self.mem_total += node.mem_total;
        self.gpu_allocated += u64::from(node.gpu_allocated.unwrap_or(0));
        self.gpu_total += u64::from(node.gpu_total.unwrap_or(0));
    }
}

/// Theoretical capacity (every node) next to what is actually available
/// (nodes that are not down, drained, failed, in maintenance or unresponsive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ClusterTotals {
    pub theoretical: Capacity,
    pub available: Capacity,
}

impl ClusterTotals {
    #[must_use]
    pub fn from_nodes(nodes: &[NodeRecord]) -> Self {
        let mut totals = Self::default();
        for node in nodes {
            totals.theoretical.add(node);
            if !node.is_offline() {
                totals.available.add(node);
            }
        }
        totals
    }

    #[must_use]
    pub fn offline_nodes(&self) -> usize {
        self.theoretical.nodes - self.available.nodes
    }
}
