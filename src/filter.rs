//! Job filtering by user and name prefix.
//!
//! Filtering is a pure function of the job slice and the criteria. It returns
//! indices into the slice instead of cloned records, so the dashboard can keep
//! the filtered view alongside the snapshot it was computed from.

use crate::formatting::truncate_string;
use crate::models::JobRecord;

/// Longest status-pill text before it is cut with `...`.
pub const SUMMARY_MAX_CHARS: usize = 33;

/// User and name-prefix criteria. `None` matches everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub user: Option<String>,
    pub prefix: Option<String>,
}

impl FilterCriteria {
    /// Build criteria from raw input; blank values become `None`.
    #[must_use]
    pub fn new(user: Option<&str>, prefix: Option<&str>) -> Self {
        Self {
            user: normalized(user),
            prefix: normalized(prefix),
        }
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.user.is_some() || self.prefix.is_some()
    }

    /// Whether `job` passes both criteria (case-insensitive).
    #[must_use]
    pub fn matches(&self, job: &JobRecord) -> bool {
        let user_ok = self
            .user
            .as_deref()
            .is_none_or(|u| job.user.to_lowercase() == u.to_lowercase());
        let prefix_ok = self
            .prefix
            .as_deref()
            .is_none_or(|p| job.name.to_lowercase().starts_with(&p.to_lowercase()));
        user_ok && prefix_ok
    }

    /// Text for the status line, e.g. `U=alice N^=train`.
    #[must_use]
    pub fn summary(&self) -> Option<String> {
        let mut parts = Vec::new();
        if let Some(user) = &self.user {
            parts.push(format!("U={user}"));
        }
        if let Some(prefix) = &self.prefix {
            parts.push(format!("N^={prefix}"));
        }
        if parts.is_empty() {
            None
        } else {
            Some(truncate_string(&parts.join(" "), SUMMARY_MAX_CHARS))
        }
    }
}

fn normalized(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Result of filtering: positions of the visible jobs plus counts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilteredJobs {
    pub indices: Vec<usize>,
    pub total: usize,
}

impl FilteredJobs {
    #[must_use]
    pub fn visible(&self) -> usize {
        self.indices.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Visible jobs in input order.
    pub fn iter<'a>(&'a self, jobs: &'a [JobRecord]) -> impl Iterator<Item = &'a JobRecord> + 'a {
        self.indices.iter().filter_map(move |&i| jobs.get(i))
    }

    /// The `n`-th visible job.
    #[must_use]
    pub fn get<'a>(&self, jobs: &'a [JobRecord], n: usize) -> Option<&'a JobRecord> {
        self.indices.get(n).and_then(|&i| jobs.get(i))
    }
}

/// Ordered subsequence of `jobs` matching `criteria`.
#[must_use]
pub fn apply_filter(jobs: &[JobRecord], criteria: &FilterCriteria) -> FilteredJobs {
    FilteredJobs {
        indices: jobs
            .iter()
            .enumerate()
            .filter(|(_, job)| criteria.matches(job))
            .map(|(i, _)| i)
            .collect(),
        total: jobs.len(),
    }
}
