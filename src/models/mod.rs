//! Data model for cluster snapshots, job details and configuration.
//!
//! Records are plain values produced by the parser. A snapshot bundles one
//! cycle's nodes and jobs with staleness metadata and is replaced wholesale on
//! every refresh.

mod config;
mod detail;
mod job;
mod node;
mod snapshot;
mod state;

pub use config::{
    BehaviorConfig, DEMO_CLUSTER_NAME, DisplayConfig, RefreshConfig, SYSTEM_CONFIG_PATH,
    SmonConfig, SystemConfig, is_truthy,
};
pub use detail::{DetailFields, INTERESTING_KEYS, JobDetail, LiveStats};
pub use job::{JobRecord, Resources};
pub use node::NodeRecord;
pub use snapshot::{Capacity, ClusterTotals, Snapshot};
pub use state::{JobState, NodeState, state_tokens};
