//! Text parsers for Slurm command output.
//!
//! Everything here is pure. Malformed rows are skipped and counted instead of
//! failing the whole parse, numeric fields that do not parse fall back to 0,
//! and records come out in input order.

use chrono::NaiveDateTime;

use crate::formatting::size;
use crate::models::{DetailFields, JobRecord, JobState, LiveStats, NodeRecord, NodeState, Resources};

/// Records parsed from one command output plus the number of dropped rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parsed<T> {
    pub records: Vec<T>,
    pub skipped: usize,
}

impl<T> Default for Parsed<T> {
    fn default() -> Self {
        Self {
            records: Vec::new(),
            skipped: 0,
        }
    }
}

// ============================================================================
// Job table layout
// ============================================================================

/// Columns of the bulk job query, in output order, as `(squeue code, name)`.
///
/// The job name comes last so that a `|` inside a name cannot shift the other
/// columns; the row is split into at most `JOB_COLUMNS.len()` fields.
pub const JOB_COLUMNS: &[(&str, &str)] = &[
    ("%i", "job_id"),
    ("%u", "user"),
    ("%T", "state"),
    ("%P", "partition"),
    ("%a", "account"),
    ("%q", "qos"),
    ("%N", "node_list"),
    ("%r", "reason"),
    ("%V", "submit_time"),
    ("%M", "run_time"),
    ("%L", "time_left"),
    ("%Q", "priority"),
    ("%D", "nodes"),
    ("%C", "cpus"),
    ("%m", "min_memory"),
    ("%b", "gres"),
    ("%E", "dependency"),
    ("%j", "name"),
];

/// Delimiter between job columns.
pub const JOB_DELIMITER: char = '|';

/// `--format` argument matching [`JOB_COLUMNS`].
#[must_use]
pub fn squeue_format() -> String {
    JOB_COLUMNS
        .iter()
        .map(|(code, _)| *code)
        .collect::<Vec<_>>()
        .join("|")
}

// ============================================================================
// Public parsers
// ============================================================================

/// Parse `scontrol show node -o` output: one `key=value` line per node.
///
/// A line without a `NodeName` is skipped and counted.
#[must_use]
pub fn parse_nodes(text: &str) -> Parsed<NodeRecord> {
    let mut parsed = Parsed::default();

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        match parse_node_line(line) {
            Some(node) => parsed.records.push(node),
            None => parsed.skipped += 1,
        }
    }

    parsed
}

/// Parse the bulk job query (see [`JOB_COLUMNS`]).
///
/// Rows with too few columns, a job id that does not start with a digit or an
/// empty user are skipped and counted. A header row is ignored.
#[must_use]
pub fn parse_jobs(text: &str) -> Parsed<JobRecord> {
    let mut parsed = Parsed::default();

    for line in text.lines() {
        let line = line.trim_end_matches(['\r', '\n']);
        if line.trim().is_empty() || line.trim_start().starts_with("JOBID") {
            continue;
        }
        match parse_job_line(line) {
            Some(job) => parsed.records.push(job),
            None => parsed.skipped += 1,
        }
    }

    parsed
}

/// Parse `scontrol show job <id>` output into ordered attributes.
#[must_use]
pub fn parse_detail(text: &str) -> DetailFields {
    DetailFields::new(
        key_values(text)
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect(),
    )
}

/// Parse `sstat -n -P --format=AveCPU,AveRSS,MaxRSS,MaxDiskRead,MaxDiskWrite`.
///
/// Each step prints one row; the result holds the peak of each column.
/// Returns `None` when no row has all five columns.
#[must_use]
pub fn parse_live_stats(text: &str, elapsed_secs: Option<u64>) -> Option<LiveStats> {
    let mut stats: Option<LiveStats> = None;

    for line in text.lines().filter(|l| !l.trim().is_empty()) {
        let parts: Vec<&str> = line.split('|').map(str::trim).collect();
        if parts.len() < 5 {
            continue;
        }
        let row = LiveStats {
            ave_cpu_secs: parse_duration(parts[0]).unwrap_or(0),
            ave_rss: parse_size(parts[1], 1),
            max_rss: parse_size(parts[2], 1),
            max_disk_read: parse_size(parts[3], 1),
            max_disk_write: parse_size(parts[4], 1),
            elapsed_secs,
        };
        let acc = stats.get_or_insert(row);
        acc.ave_cpu_secs = acc.ave_cpu_secs.max(row.ave_cpu_secs);
        acc.ave_rss = acc.ave_rss.max(row.ave_rss);
        acc.max_rss = acc.max_rss.max(row.max_rss);
        acc.max_disk_read = acc.max_disk_read.max(row.max_disk_read);
        acc.max_disk_write = acc.max_disk_write.max(row.max_disk_write);
    }

    stats
}

// ============================================================================
// Row parsers
// ============================================================================

fn parse_node_line(line: &str) -> Option<NodeRecord> {
    let fields = key_values(line);
    let get = |key: &str| {
        fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| *v)
    };

    let name = get("NodeName").filter(|n| !n.is_empty())?;
    let state_raw = get("State").unwrap_or("UNKNOWN");

    let (mut cpu_allocated, mut cpu_total) = (
        get("CPUAlloc").map_or(0, parse_u32),
        get("CPUTot").map_or(0, parse_u32),
    );
    if get("CPUTot").is_none()
        && let Some(ratio) = get("CPUs")
    {
        (cpu_allocated, cpu_total) = split_ratio(ratio);
    }

    let mem_total = get("RealMemory").map_or(0, parse_u64).saturating_mul(size::MB);
    let mem_allocated = get("AllocMem").map_or(0, parse_u64).saturating_mul(size::MB);

    let gpu_total = get("Gres").and_then(gres_gpu_total);
    let gpu_allocated = gpu_total.map(|total| {
        get("AllocTRES")
            .and_then(tres_gpu_count)
            .unwrap_or(0)
            .min(total)
    });

    Some(NodeRecord {
        name: name.to_string(),
        state: NodeState::from_slurm(state_raw),
        state_raw: state_raw.to_string(),
        cpu_allocated: cpu_allocated.min(cpu_total),
        cpu_total,
        mem_allocated: mem_allocated.min(mem_total),
        mem_total,
        gpu_allocated,
        gpu_total,
        partitions: get("Partitions").unwrap_or_default().to_string(),
        reason: get("Reason").map(null_to_empty).unwrap_or_default().to_string(),
    })
}

fn parse_job_line(line: &str) -> Option<JobRecord> {
    let parts: Vec<&str> = line.splitn(JOB_COLUMNS.len(), JOB_DELIMITER).collect();
    if parts.len() < JOB_COLUMNS.len() {
        return None;
    }
    let col = |i: usize| parts[i].trim();

    let job_id = col(0);
    let user = col(1);
    if !job_id.starts_with(|c: char| c.is_ascii_digit()) || user.is_empty() {
        return None;
    }

    let nodes = parse_u32(col(12));
    let state_raw = col(2);

    Some(JobRecord {
        job_id: job_id.to_string(),
        user: user.to_string(),
        state: JobState::from_slurm(state_raw),
        state_raw: state_raw.to_string(),
        partition: col(3).to_string(),
        account: col(4).to_string(),
        qos: col(5).to_string(),
        node_list: null_to_empty(col(6)).to_string(),
        reason: match null_to_empty(col(7)) {
            "None" => "",
            other => other,
        }
        .to_string(),
        submit_time: parse_timestamp(col(8)),
        run_time: parse_duration(col(9)),
        time_left: parse_duration(col(10)),
        priority: parse_u64(col(11)),
        dependency: null_to_empty(col(16)).to_string(),
        name: parts[17].to_string(),
        resources: Resources {
            nodes,
            cpus: parse_u32(col(13)),
            mem_per_node: parse_size(col(14), size::MB),
            gpus: gres_gpu_per_node(col(15)).saturating_mul(nodes.max(1)),
        },
    })
}

// ============================================================================
// Field helpers
// ============================================================================

/// Split whitespace-separated `key=value` tokens, zero-copy.
///
/// A token that does not look like `Key=...` continues the previous value, so
/// `Reason=Not responding [root@...]` keeps its spaces. Values may themselves
/// contain `=` (`AllocTRES=cpu=4,mem=8G`).
pub(crate) fn key_values(text: &str) -> Vec<(&str, &str)> {
    let mut spans: Vec<(&str, usize, usize)> = Vec::new();

    for (start, token) in tokens(text) {
        let end = start + token.len();
        match token.split_once('=') {
            Some((key, _)) if is_key(key) => spans.push((key, start + key.len() + 1, end)),
            _ => {
                if let Some(last) = spans.last_mut() {
                    last.2 = end;
                }
            }
        }
    }

    spans
        .into_iter()
        .map(|(key, from, to)| (key, &text[from..to]))
        .collect()
}

fn tokens(text: &str) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in text.char_indices() {
        if c.is_whitespace() {
            if let Some(s) = start.take() {
                out.push((s, &text[s..i]));
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        out.push((s, &text[s..]));
    }
    out
}

fn is_key(key: &str) -> bool {
    key.starts_with(|c: char| c.is_ascii_alphabetic())
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '/' | ':'))
}

fn null_to_empty(value: &str) -> &str {
    match value {
        "(null)" | "N/A" | "n/a" | "(None)" => "",
        other => other,
    }
}

fn parse_u32(value: &str) -> u32 {
    value.trim().parse().unwrap_or(0)
}

fn parse_u64(value: &str) -> u64 {
    value.trim().parse().unwrap_or(0)
}

/// Split an `A/T` or sinfo-style `A/I/O/T` ratio into (allocated, total).
#[must_use]
pub fn split_ratio(value: &str) -> (u32, u32) {
    let parts: Vec<u32> = value.split('/').map(parse_u32).collect();
    match parts.as_slice() {
        [alloc, .., total] => ((*alloc).min(*total), *total),
        [only] => (0, *only),
        [] => (0, 0),
    }
}

/// GPU count of a node's `Gres` field, e.g. `gpu:a100:8(S:0-1)` is 8.
///
/// `None` when the field names no GPU.
fn gres_gpu_total(gres: &str) -> Option<u32> {
    let item = gres.split(',').find(|item| item.contains("gpu"))?;
    let item = item.split('(').next().unwrap_or(item);
    Some(
        item.split(':')
            .skip(1)
            .find_map(|part| part.parse::<u32>().ok())
            .unwrap_or(0),
    )
}

/// Allocated GPUs in a TRES string, e.g. `cpu=8,gres/gpu:a100=2` is 2.
fn tres_gpu_count(tres: &str) -> Option<u32> {
    tres.split(',')
        .filter_map(|item| item.split_once('='))
        .find(|(key, _)| key.starts_with("gres/gpu"))
        .and_then(|(_, count)| count.parse().ok())
}

/// Per-node GPU count of a job's gres request.
///
/// Accepts `gpu:4`, `gres/gpu:a100:2`, `gres:gpu=2` and `gres/gpu` (one GPU).
fn gres_gpu_per_node(gres: &str) -> u32 {
    null_to_empty(gres)
        .split(',')
        .filter(|item| item.contains("gpu"))
        .map(|item| {
            let tail = item.rsplit([':', '=']).next().unwrap_or_default();
            tail.split('(').next().unwrap_or_default().parse().unwrap_or(1)
        })
        .fold(0u32, u32::saturating_add)
}

/// Parse a Slurm duration into seconds.
///
/// Accepts `D-HH:MM:SS`, `HH:MM:SS`, `MM:SS` and fractional seconds
/// (`01:23.456`). `UNLIMITED`, `INVALID`, `N/A` and garbage are `None`.
#[must_use]
pub fn parse_duration(value: &str) -> Option<u64> {
    let value = value.trim();
    let (days, clock) = match value.split_once('-') {
        Some((d, rest)) => (d.parse::<u64>().ok()?, rest),
        None => (0, value),
    };

    let fields: Vec<&str> = clock.split(':').collect();
    let secs_field = |s: &str| s.split('.').next().and_then(|w| w.parse::<u64>().ok());
    let (h, m, s) = match fields.as_slice() {
        [h, m, s] => (h.parse::<u64>().ok()?, m.parse::<u64>().ok()?, secs_field(s)?),
        [m, s] => (0, m.parse::<u64>().ok()?, secs_field(s)?),
        [s] if days > 0 => (s.parse::<u64>().ok()?, 0, 0),
        _ => return None,
    };

    days.checked_mul(86_400)?
        .checked_add(h.checked_mul(3600)?)?
        .checked_add(m.checked_mul(60)?)?
        .checked_add(s)
}

/// Parse `YYYY-MM-DDTHH:MM:SS`; `Unknown`, `N/A` and `None` are `None`.
#[must_use]
pub fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), "%Y-%m-%dT%H:%M:%S").ok()
}

/// Parse a size such as `16G`, `4000M`, `512K`, `1.5T` into bytes.
///
/// A bare number is multiplied by `default_unit`. Unparsable input is 0.
#[must_use]
pub fn parse_size(value: &str, default_unit: u64) -> u64 {
    let value = value.trim();
    let (number, unit) = match value.char_indices().last() {
        Some((i, c)) if c.is_ascii_alphabetic() => {
            let unit = match c.to_ascii_uppercase() {
                'K' => size::KB,
                'M' => size::MB,
                'G' => size::GB,
                'T' => size::TB,
                _ => return 0,
            };
            (&value[..i], unit)
        }
        Some(_) => (value, default_unit),
        None => return 0,
    };

    number
        .parse::<f64>()
        .map(|n| if n.is_finite() && n > 0.0 { (n * unit as f64) as u64 } else { 0 })
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const NODE_LINE: &str = "NodeName=gpu-a03 Arch=x86_64 CoresPerSocket=32 CPUAlloc=48 CPUTot=128 \
        CPULoad=40.12 Gres=gpu:a100:8(S:0-1) NodeAddr=gpu-a03 RealMemory=515000 AllocMem=200000 \
        State=MIXED Partitions=gpu AllocTRES=cpu=48,mem=200000M,gres/gpu=3 Reason=(null)";

    fn job_line(id: &str, user: &str, name: &str) -> String {
        format!(
            "{id}|{user}|RUNNING|gpu|proj|normal|gpu-a[01-02]|None|2026-01-01T08:00:00|1-02:03:04|\
             12:00:00|4294|2|16|16G|gres/gpu:4|(null)|{name}"
        )
    }

    #[test]
    fn test_parse_node_line() {
        let parsed = parse_nodes(NODE_LINE);
        assert_eq!(parsed.skipped, 0);
        let node = &parsed.records[0];
        assert_eq!(node.name, "gpu-a03");
        assert_eq!(node.state, NodeState::Mixed);
        assert_eq!((node.cpu_allocated, node.cpu_total), (48, 128));
        assert_eq!(node.mem_total, 515_000 * size::MB);
        assert_eq!(node.mem_allocated, 200_000 * size::MB);
        assert_eq!(node.gpu_total, Some(8));
        assert_eq!(node.gpu_allocated, Some(3));
        assert_eq!(node.partitions, "gpu");
        assert_eq!(node.reason, "");
    }

    #[test]
    fn test_node_without_gpus_and_reason_with_spaces() {
        let text = "NodeName=cpu-a07 CPUAlloc=0 CPUTot=64 Gres=(null) RealMemory=257000 \
            AllocMem=0 State=DOWN* Reason=Not responding [slurm@2026-01-01T00:00:00]";
        let node = &parse_nodes(text).records[0];
        assert_eq!(node.gpu_total, None);
        assert_eq!(node.gpu_allocated, None);
        assert_eq!(node.state, NodeState::Down);
        assert_eq!(node.reason, "Not responding [slurm@2026-01-01T00:00:00]");
    }

    #[test]
    fn test_node_allocated_clamped_to_total() {
        let node = &parse_nodes("NodeName=n1 CPUAlloc=99 CPUTot=8 State=ALLOCATED").records[0];
        assert_eq!((node.cpu_allocated, node.cpu_total), (8, 8));
    }

    #[test]
    fn test_node_cpu_ratio_field() {
        let node = &parse_nodes("NodeName=n1 CPUs=4/2/2/8 State=MIXED").records[0];
        assert_eq!((node.cpu_allocated, node.cpu_total), (4, 8));
    }

    #[test]
    fn test_node_bad_numbers_fall_back_to_zero() {
        let parsed = parse_nodes("NodeName=n1 CPUAlloc=lots CPUTot=?? State=WEIRD\n");
        assert_eq!(parsed.skipped, 0);
        let node = &parsed.records[0];
        assert_eq!((node.cpu_allocated, node.cpu_total), (0, 0));
        assert_eq!(node.state, NodeState::Unknown);
    }

    #[test]
    fn test_node_line_without_name_is_skipped() {
        let text = format!("{NODE_LINE}\nState=IDLE CPUTot=4\n\n{NODE_LINE}\n");
        let parsed = parse_nodes(&text);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_parse_job_line() {
        let parsed = parse_jobs(&job_line("1001", "alice", "train-resnet"));
        assert_eq!(parsed.skipped, 0);
        let job = &parsed.records[0];
        assert_eq!(job.job_id, "1001");
        assert_eq!(job.user, "alice");
        assert_eq!(job.state, JobState::Running);
        assert_eq!(job.node_list, "gpu-a[01-02]");
        assert_eq!(job.reason, "");
        assert_eq!(job.run_time, Some(93_784));
        assert_eq!(job.time_left, Some(43_200));
        assert_eq!(job.priority, 4294);
        assert_eq!(job.resources.nodes, 2);
        assert_eq!(job.resources.cpus, 16);
        assert_eq!(job.resources.mem_per_node, 16 * size::GB);
        assert_eq!(job.resources.gpus, 8);
        assert_eq!(job.dependency, "");
        assert!(job.submit_time.is_some());
    }

    #[test]
    fn test_three_valid_rows_and_one_truncated() {
        let text = format!(
            "{}\n{}\n1003|carol|RUNNING|gpu\n{}\n",
            job_line("1001", "alice", "a"),
            job_line("1002", "bob", "b"),
            job_line("1004", "dave", "d"),
        );
        let parsed = parse_jobs(&text);
        let ids: Vec<&str> = parsed.records.iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(ids, vec!["1001", "1002", "1004"]);
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_job_rows_missing_identity_are_skipped() {
        let text = format!(
            "{}\n{}\n{}\n",
            job_line("", "alice", "a"),
            job_line("1002", "", "b"),
            job_line("abc", "carol", "c"),
        );
        let parsed = parse_jobs(&text);
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.skipped, 3);
    }

    #[test]
    fn test_job_header_and_blank_lines_ignored() {
        let text = format!(
            "JOBID|USER|STATE\n\n{}\n",
            job_line("1001_7", "alice", "array")
        );
        let parsed = parse_jobs(&text);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.skipped, 0);
        assert_eq!(parsed.records[0].job_id, "1001_7");
    }

    #[test]
    fn test_job_name_may_contain_delimiter() {
        let job = &parse_jobs(&job_line("1001", "alice", "a|b|c")).records[0];
        assert_eq!(job.name, "a|b|c");
    }

    #[test]
    fn test_pending_job_fields() {
        let line = "2001|bob|PENDING|cpu|proj|normal||Priority|2026-01-01T09:00:00|0:00|\
                    UNLIMITED|100|1|4|4000M|N/A|afterok:2000|wait";
        let job = &parse_jobs(line).records[0];
        assert_eq!(job.state, JobState::Pending);
        assert_eq!(job.node_list, "");
        assert_eq!(job.reason, "Priority");
        assert_eq!(job.where_or_why(), "(Priority)");
        assert_eq!(job.run_time, Some(0));
        assert_eq!(job.time_left, None);
        assert_eq!(job.resources.gpus, 0);
        assert_eq!(job.resources.mem_per_node, 4000 * size::MB);
        assert_eq!(job.dependency, "afterok:2000");
    }

    #[test]
    fn test_parse_detail_multiline() {
        let text = "JobId=1001 JobName=train resnet\n   UserId=alice(1001) GroupId=alice(1001)\n   \
                    JobState=RUNNING Reason=None Dependency=(null)\n   RunTime=00:10:00 TimeLimit=1-00:00:00\n   \
                    TRES=cpu=16,mem=64G,node=2,gres/gpu=8\n   Command=/home/alice/run.sh --lr=0.1\n";
        let fields = parse_detail(text);
        assert_eq!(fields.get("JobId"), Some("1001"));
        assert_eq!(fields.get("JobName"), Some("train resnet"));
        assert_eq!(fields.get("UserId"), Some("alice(1001)"));
        assert_eq!(fields.get("TRES"), Some("cpu=16,mem=64G,node=2,gres/gpu=8"));
        assert_eq!(fields.get("Command"), Some("/home/alice/run.sh --lr=0.1"));
        assert!(fields.is_running());
    }

    #[test]
    fn test_parse_live_stats_takes_peak_across_steps() {
        let text = "00:05:00|1024K|2048K|1.5M|512K\n00:10:00|512K|4096K|1M|1M\n";
        let stats = parse_live_stats(text, Some(1200)).unwrap();
        assert_eq!(stats.ave_cpu_secs, 600);
        assert_eq!(stats.ave_rss, 1024 * size::KB);
        assert_eq!(stats.max_rss, 4096 * size::KB);
        assert_eq!(stats.max_disk_read, (1.5 * size::MB as f64) as u64);
        assert_eq!(stats.max_disk_write, size::MB);
        assert_eq!(stats.cpu_percent(), Some(50.0));
    }

    #[test]
    fn test_parse_live_stats_empty() {
        assert_eq!(parse_live_stats("", None), None);
        assert_eq!(parse_live_stats("garbage\n", None), None);
    }

    #[test]
    fn test_parse_duration() {
        assert_eq!(parse_duration("00:00:05"), Some(5));
        assert_eq!(parse_duration("12:34"), Some(754));
        assert_eq!(parse_duration("2-00:00:00"), Some(172_800));
        assert_eq!(parse_duration("01:23.456"), Some(83));
        assert_eq!(parse_duration("UNLIMITED"), None);
        assert_eq!(parse_duration("INVALID"), None);
        assert_eq!(parse_duration(""), None);
    }

    #[test]
    fn test_parse_size() {
        assert_eq!(parse_size("16G", size::MB), 16 * size::GB);
        assert_eq!(parse_size("4000", size::MB), 4000 * size::MB);
        assert_eq!(parse_size("0", size::MB), 0);
        assert_eq!(parse_size("512k", 1), 512 * size::KB);
        assert_eq!(parse_size("lots", 1), 0);
        assert_eq!(parse_size("", 1), 0);
    }

    #[test]
    fn test_gpu_helpers() {
        assert_eq!(gres_gpu_total("gpu:a100:8(S:0-1)"), Some(8));
        assert_eq!(gres_gpu_total("gpu:4"), Some(4));
        assert_eq!(gres_gpu_total("(null)"), None);
        assert_eq!(tres_gpu_count("cpu=8,mem=1G,gres/gpu:a100=2"), Some(2));
        assert_eq!(tres_gpu_count("cpu=8"), None);
        assert_eq!(gres_gpu_per_node("gres/gpu:a100:2"), 2);
        assert_eq!(gres_gpu_per_node("gpu"), 1);
        assert_eq!(gres_gpu_per_node("N/A"), 0);
    }

    #[test]
    fn test_split_ratio() {
        assert_eq!(split_ratio("4/8"), (4, 8));
        assert_eq!(split_ratio("4/2/2/8"), (4, 8));
        assert_eq!(split_ratio("9/8"), (8, 8));
        assert_eq!(split_ratio("x/8"), (0, 8));
    }

    #[test]
    fn test_squeue_format_matches_columns() {
        let format = squeue_format();
        assert_eq!(format.split('|').count(), JOB_COLUMNS.len());
        assert!(format.ends_with("%j"));
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        #[test]
        fn prop_parse_jobs_never_panics(text in "\\PC{0,400}") {
            let parsed = parse_jobs(&text);
            let lines = text.lines().count();
            prop_assert!(parsed.records.len() + parsed.skipped <= lines);
        }

        #[test]
        fn prop_parse_nodes_never_panics(text in "[A-Za-z=/:,()* \n0-9]{0,300}") {
            let parsed = parse_nodes(&text);
            for node in &parsed.records {
                prop_assert!(node.cpu_allocated <= node.cpu_total);
                prop_assert!(node.mem_allocated <= node.mem_total);
            }
        }

        #[test]
        fn prop_valid_rows_survive_garbage(
            users in proptest::collection::vec("[a-z]{1,8}", 1..10),
            garbage in proptest::collection::vec("[a-z ]{0,20}", 0..10),
        ) {
            let mut lines = Vec::new();
            for (i, user) in users.iter().enumerate() {
                lines.push(job_line(&(1000 + i).to_string(), user, "job"));
            }
            lines.extend(garbage.iter().filter(|g| !g.trim().is_empty()).cloned());
            let parsed = parse_jobs(&lines.join("\n"));
            prop_assert_eq!(parsed.records.len(), users.len());
            let parsed_users: Vec<&str> = parsed.records.iter().map(|j| j.user.as_str()).collect();
            let expected: Vec<&str> = users.iter().map(String::as_str).collect();
            prop_assert_eq!(parsed_users, expected);
        }
    }
}
