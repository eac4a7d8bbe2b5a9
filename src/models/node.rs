//! Node records built from `scontrol show node -o`.

use serde::Serialize;

use super::state::{NodeState, define_state_checkers, state_tokens};

/// One compute node as of a single sampling cycle.
///
/// Memory values are in bytes. GPU counts are `None` for nodes that expose no
/// GPU gres at all, which is different from a GPU node with nothing allocated.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct NodeRecord {
    pub name: String,
    pub state: NodeState,
    /// State text exactly as reported, e.g. `MIXED+DRAIN`.
    pub state_raw: String,
    pub cpu_allocated: u32,
    pub cpu_total: u32,
    pub mem_allocated: u64,
    pub mem_total: u64,
    pub gpu_allocated: Option<u32>,
    pub gpu_total: Option<u32>,
    pub partitions: String,
    pub reason: String,
}

impl NodeRecord {
    fn has_state(&self, states: &[&str]) -> bool {
        state_tokens(&self.state_raw).any(|t| states.iter().any(|s| t.eq_ignore_ascii_case(s)))
    }

    define_state_checkers! {
        is_down => ["DOWN"],
        is_draining => ["DRAIN", "DRAINING", "DRAINED"],
        is_fail => ["FAIL", "FAILING"],
        is_maint => ["MAINT"],
        is_not_responding => ["NO_RESPOND", "NOT_RESPONDING"],
    }

    /// Offline nodes contribute to the theoretical capacity but not to the
    /// capacity jobs can actually use.
    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.is_down()
            || self.is_draining()
            || self.is_fail()
            || self.is_maint()
            || self.is_not_responding()
    }

    #[must_use]
    pub fn has_gpus(&self) -> bool {
        self.gpu_total.is_some_and(|t| t > 0)
    }

    #[must_use]
    pub fn cpu_percent(&self) -> f64 {
        percent(u64::from(self.cpu_allocated), u64::from(self.cpu_total))
    }

    #[must_use]
    pub fn mem_percent(&self) -> f64 {
        percent(self.mem_allocated, self.mem_total)
    }
}

pub(crate) fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(raw: &str) -> NodeRecord {
        NodeRecord {
            name: "gpu-a01".into(),
            state: NodeState::from_slurm(raw),
            state_raw: raw.into(),
            cpu_allocated: 32,
            cpu_total: 128,
            ..Default::default()
        }
    }

    #[test]
    fn test_offline_states() {
        assert!(node("DOWN*").is_offline());
        assert!(node("MIXED+DRAIN").is_offline());
        assert!(node("MAINT").is_offline());
        assert!(node("NO_RESPOND").is_offline());
        assert!(node("IDLE+FAIL").is_offline());
        assert!(!node("MIXED").is_offline());
        assert!(!node("IDLE").is_offline());
    }

    #[test]
    fn test_cpu_percent() {
        assert_eq!(node("MIXED").cpu_percent(), 25.0);
        let empty = NodeRecord::default();
        assert_eq!(empty.cpu_percent(), 0.0);
    }

    #[test]
    fn test_has_gpus() {
        let mut n = node("IDLE");
        assert!(!n.has_gpus());
        n.gpu_total = Some(8);
        assert!(n.has_gpus());
    }
}
