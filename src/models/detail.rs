//! On-demand job detail: static attributes plus live usage.

use chrono::{DateTime, Local};
use serde::Serialize;

/// Attributes shown first in the detail view, in this order.
pub const INTERESTING_KEYS: &[&str] = &[
    "JobId",
    "JobName",
    "UserId",
    "Account",
    "QOS",
    "JobState",
    "Reason",
    "Dependency",
    "RunTime",
    "TimeLimit",
    "SubmitTime",
    "StartTime",
    "Partition",
    "NodeList",
    "NumNodes",
    "NumCPUs",
    "TRES",
    "Command",
    "WorkDir",
    "StdOut",
];

/// Ordered `key=value` attributes of one job, as the detail query printed them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct DetailFields(Vec<(String, String)>);

impl DetailFields {
    #[must_use]
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self(fields)
    }

    /// First value recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// The subset listed in [`INTERESTING_KEYS`], in that order.
    pub fn interesting(&self) -> impl Iterator<Item = (&'static str, &str)> {
        INTERESTING_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|v| (*key, v)))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether the job is running according to its `JobState` attribute.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.get("JobState")
            .is_some_and(|s| s.eq_ignore_ascii_case("RUNNING"))
    }
}

/// Resource usage of a running job, from `sstat`.
///
/// Sizes are in bytes and times in seconds. Values are the peak across the
/// job's steps.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct LiveStats {
    pub ave_cpu_secs: u64,
    pub ave_rss: u64,
    pub max_rss: u64,
    pub max_disk_read: u64,
    pub max_disk_write: u64,
    pub elapsed_secs: Option<u64>,
}

impl LiveStats {
    /// Average CPU time as a share of wall-clock time.
    #[must_use]
    pub fn cpu_percent(&self) -> Option<f64> {
        match self.elapsed_secs {
            Some(elapsed) if elapsed > 0 => {
                Some(self.ave_cpu_secs as f64 / elapsed as f64 * 100.0)
            }
            _ => None,
        }
    }
}

/// Everything the detail modal shows for one job.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JobDetail {
    pub job_id: String,
    pub fields: DetailFields,
    pub live: Option<LiveStats>,
    pub fetched_at: DateTime<Local>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> DetailFields {
        DetailFields::new(vec![
            ("JobId".into(), "1001".into()),
            ("Priority".into(), "4294".into()),
            ("JobState".into(), "RUNNING".into()),
            ("JobName".into(), "train".into()),
        ])
    }

    #[test]
    fn test_get_and_interesting_order() {
        let f = fields();
        assert_eq!(f.get("JobName"), Some("train"));
        assert_eq!(f.get("Missing"), None);
        let keys: Vec<&str> = f.interesting().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["JobId", "JobName", "JobState"]);
        assert!(f.is_running());
    }

    #[test]
    fn test_cpu_percent() {
        let stats = LiveStats {
            ave_cpu_secs: 30,
            elapsed_secs: Some(60),
            ..Default::default()
        };
        assert_eq!(stats.cpu_percent(), Some(50.0));

        let no_elapsed = LiveStats::default();
        assert_eq!(no_elapsed.cpu_percent(), None);
    }
}
