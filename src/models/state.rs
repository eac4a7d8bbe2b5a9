//! Job and node state enums.
//!
//! Slurm reports far more states than the dashboard distinguishes. Both enums
//! collapse the raw text into a handful of display categories; the raw text is
//! kept alongside on the records so nothing is lost for the detail views.
//!
//! The `define_state_checkers!` macro generates `is_*()` methods from a
//! declarative list of state names and the raw tokens that match them.

use serde::Serialize;

// ============================================================================
// State Checker Macro
// ============================================================================

/// Generate `is_*()` methods that call `has_state()` with the listed tokens.
///
/// ```ignore
/// define_state_checkers! {
///     is_down => ["DOWN"],
///     is_draining => ["DRAIN", "DRAINING", "DRAINED"],
/// }
/// ```
macro_rules! define_state_checkers {
    ($($method:ident => [$($state:literal),+ $(,)?]),* $(,)?) => {
        $(
            #[must_use]
            pub fn $method(&self) -> bool {
                self.has_state(&[$($state),+])
            }
        )*
    }
}

pub(crate) use define_state_checkers;

/// Split a raw Slurm state such as `IDLE*+DRAIN` into bare tokens.
///
/// Trailing flag characters (`*` not responding, `~` powered off, `#`, `!`,
/// `%`, `$`, `@`, `^`, `-`) are stripped.
pub fn state_tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split('+')
        .map(|t| t.trim().trim_end_matches(['*', '~', '#', '!', '%', '$', '@', '^', '-']))
        .filter(|t| !t.is_empty())
}

// ============================================================================
// Job State
// ============================================================================

/// Display category of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Pending,
    Running,
    Completing,
    Cancelled,
    Failed,
    #[default]
    Unknown,
}

impl JobState {
    /// Map squeue/scontrol state text (long or short form) to a category.
    ///
    /// `CANCELLED by 1234` counts as cancelled. Anything unrecognised is
    /// `Unknown`.
    #[must_use]
    pub fn from_slurm(raw: &str) -> Self {
        let word = raw
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .trim_end_matches('+');
        match word.to_ascii_uppercase().as_str() {
            "PENDING" | "PD" => Self::Pending,
            "RUNNING" | "R" => Self::Running,
            "COMPLETING" | "CG" => Self::Completing,
            "CANCELLED" | "CA" => Self::Cancelled,
            "FAILED" | "F" => Self::Failed,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Running => "RUNNING",
            Self::Completing => "COMPLETING",
            Self::Cancelled => "CANCELLED",
            Self::Failed => "FAILED",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Two-letter code used by the compact job table.
    #[must_use]
    pub const fn short(self) -> &'static str {
        match self {
            Self::Pending => "PD",
            Self::Running => "R",
            Self::Completing => "CG",
            Self::Cancelled => "CA",
            Self::Failed => "F",
            Self::Unknown => "?",
        }
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Node State
// ============================================================================

/// Display category of a node.
///
/// Flags take precedence over the base state: `MIXED+DRAIN` is `Drain`,
/// `IDLE+NOT_RESPONDING` is `Down`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NodeState {
    Idle,
    Allocated,
    Mixed,
    Down,
    Drain,
    #[default]
    Unknown,
}

/// Tokens that put a node in the `Down` category.
const DOWN_TOKENS: &[&str] = &["DOWN", "FAIL", "FAILING", "NO_RESPOND", "NOT_RESPONDING"];

/// Tokens that put a node in the `Drain` category.
const DRAIN_TOKENS: &[&str] = &["DRAIN", "DRAINING", "DRAINED", "MAINT"];

impl NodeState {
    #[must_use]
    pub fn from_slurm(raw: &str) -> Self {
        let upper = raw.to_ascii_uppercase();
        let tokens: Vec<&str> = state_tokens(&upper).collect();

        if tokens.iter().any(|t| DOWN_TOKENS.contains(t)) {
            return Self::Down;
        }
        if tokens.iter().any(|t| DRAIN_TOKENS.contains(t)) {
            return Self::Drain;
        }
        tokens
            .iter()
            .find_map(|t| match *t {
                "IDLE" => Some(Self::Idle),
                "ALLOCATED" | "ALLOC" | "COMPLETING" => Some(Self::Allocated),
                "MIXED" | "MIX" => Some(Self::Mixed),
                _ => None,
            })
            .unwrap_or(Self::Unknown)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "IDLE",
            Self::Allocated => "ALLOCATED",
            Self::Mixed => "MIXED",
            Self::Down => "DOWN",
            Self::Drain => "DRAIN",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl std::fmt::Display for NodeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_state_long_and_short_forms() {
        assert_eq!(JobState::from_slurm("RUNNING"), JobState::Running);
        assert_eq!(JobState::from_slurm("R"), JobState::Running);
        assert_eq!(JobState::from_slurm("PD"), JobState::Pending);
        assert_eq!(JobState::from_slurm("completing"), JobState::Completing);
        assert_eq!(JobState::from_slurm("CANCELLED by 1001"), JobState::Cancelled);
    }

    #[test]
    fn test_job_state_unknown_text() {
        assert_eq!(JobState::from_slurm("TIMEOUT"), JobState::Unknown);
        assert_eq!(JobState::from_slurm(""), JobState::Unknown);
        assert_eq!(JobState::from_slurm("garbage"), JobState::Unknown);
    }

    #[test]
    fn test_node_state_flags_win() {
        assert_eq!(NodeState::from_slurm("MIXED+DRAIN"), NodeState::Drain);
        assert_eq!(NodeState::from_slurm("IDLE*+NOT_RESPONDING"), NodeState::Down);
        assert_eq!(NodeState::from_slurm("DOWN+DRAIN"), NodeState::Down);
        assert_eq!(NodeState::from_slurm("MAINT"), NodeState::Drain);
    }

    #[test]
    fn test_node_state_base_states() {
        assert_eq!(NodeState::from_slurm("IDLE"), NodeState::Idle);
        assert_eq!(NodeState::from_slurm("idle~"), NodeState::Idle);
        assert_eq!(NodeState::from_slurm("ALLOCATED"), NodeState::Allocated);
        assert_eq!(NodeState::from_slurm("MIXED"), NodeState::Mixed);
        assert_eq!(NodeState::from_slurm("FUTURE"), NodeState::Unknown);
    }

    #[test]
    fn test_state_tokens_strip_flag_suffixes() {
        let tokens: Vec<&str> = state_tokens("IDLE*+DRAIN~").collect();
        assert_eq!(tokens, vec!["IDLE", "DRAIN"]);
    }
}
