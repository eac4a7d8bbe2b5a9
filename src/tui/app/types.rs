//! Table column definitions for the TUI
//!
//! The jobs table has a full column set (wide, scrolled horizontally) and a
//! compact one that fits narrow terminals. Each column knows its header, its
//! width and how to render a [`JobRecord`] cell.

use crate::formatting::{format_bytes, format_duration_hms, format_submit_time, format_time_left};
use crate::models::JobRecord;

/// One column of the jobs table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobColumn {
    Id,
    Name,
    User,
    Account,
    State,
    Priority,
    TimeLeft,
    Gpus,
    Cpus,
    Memory,
    Nodes,
    WhereOrWhy,
    Qos,
    Partition,
    Dependency,
    Time,
    Submit,
}

/// Columns of the full jobs table, in display order.
pub const FULL_COLUMNS: &[JobColumn] = &[
    JobColumn::Id,
    JobColumn::Name,
    JobColumn::User,
    JobColumn::Account,
    JobColumn::State,
    JobColumn::Priority,
    JobColumn::TimeLeft,
    JobColumn::Gpus,
    JobColumn::Cpus,
    JobColumn::Memory,
    JobColumn::Nodes,
    JobColumn::WhereOrWhy,
    JobColumn::Qos,
    JobColumn::Partition,
    JobColumn::Dependency,
    JobColumn::Time,
    JobColumn::Submit,
];

/// Columns of the compact jobs table.
pub const COMPACT_COLUMNS: &[JobColumn] = &[
    JobColumn::Id,
    JobColumn::User,
    JobColumn::State,
    JobColumn::TimeLeft,
    JobColumn::Nodes,
    JobColumn::Gpus,
];

/// Column set for the compact flag.
#[must_use]
pub fn job_columns(compact: bool) -> &'static [JobColumn] {
    if compact { COMPACT_COLUMNS } else { FULL_COLUMNS }
}

impl JobColumn {
    #[must_use]
    pub fn header(self) -> &'static str {
        match self {
            JobColumn::Id => "ID",
            JobColumn::Name => "Name",
            JobColumn::User => "User",
            JobColumn::Account => "Acct",
            JobColumn::State => "State",
            JobColumn::Priority => "Prio",
            JobColumn::TimeLeft => "Left",
            JobColumn::Gpus => "GPU",
            JobColumn::Cpus => "CPU",
            JobColumn::Memory => "Mem",
            JobColumn::Nodes => "Nodes",
            JobColumn::WhereOrWhy => "Node/Reason",
            JobColumn::Qos => "QOS",
            JobColumn::Partition => "Part",
            JobColumn::Dependency => "Dep",
            JobColumn::Time => "Time",
            JobColumn::Submit => "Submit",
        }
    }

    /// Display width in terminal cells
    #[must_use]
    pub fn width(self) -> u16 {
        match self {
            JobColumn::Id => 12,
            JobColumn::Name => 20,
            JobColumn::User => 10,
            JobColumn::Account => 10,
            JobColumn::State => 10,
            JobColumn::Priority => 6,
            JobColumn::TimeLeft => 11,
            JobColumn::Gpus => 4,
            JobColumn::Cpus => 5,
            JobColumn::Memory => 7,
            JobColumn::Nodes => 5,
            JobColumn::WhereOrWhy => 22,
            JobColumn::Qos => 8,
            JobColumn::Partition => 8,
            JobColumn::Dependency => 14,
            JobColumn::Time => 11,
            JobColumn::Submit => 11,
        }
    }

    /// Cell text for `job`
    #[must_use]
    pub fn cell(self, job: &JobRecord) -> String {
        let res = &job.resources;
        match self {
            JobColumn::Id => job.job_id.clone(),
            JobColumn::Name => job.name.clone(),
            JobColumn::User => job.user.clone(),
            JobColumn::Account => job.account.clone(),
            JobColumn::State => job.state.as_str().to_string(),
            JobColumn::Priority => job.priority.to_string(),
            JobColumn::TimeLeft => format_time_left(job.time_left),
            JobColumn::Gpus => res.gpus.to_string(),
            JobColumn::Cpus => res.cpus.to_string(),
            JobColumn::Memory => format_bytes(res.mem_per_node),
            JobColumn::Nodes => res.nodes.to_string(),
            JobColumn::WhereOrWhy => job.where_or_why(),
            JobColumn::Qos => job.qos.clone(),
            JobColumn::Partition => job.partition.clone(),
            JobColumn::Dependency => {
                if job.dependency.is_empty() {
                    "-".to_string()
                } else {
                    job.dependency.clone()
                }
            }
            JobColumn::Time => job.run_time.map_or_else(|| "-".to_string(), format_duration_hms),
            JobColumn::Submit => format_submit_time(job.submit_time),
        }
    }
}
