//! Table output for the one-shot commands (`smon nodes`, `smon jobs`, `smon job`).

use owo_colors::OwoColorize;
use tabled::{
    Table, Tabled,
    settings::{Alignment, Modify, Style, Width, object::Rows},
};

use crate::filter::{FilterCriteria, FilteredJobs};
use crate::formatting::{
    format_bytes, format_duration_hms, format_gib, format_submit_time, format_time_left, layout,
    percent, thresholds, truncate_string, usage_bar,
};
use crate::models::{ClusterTotals, JobDetail, JobRecord, JobState, NodeRecord, NodeState};

const TABLE_WIDTH: usize = 200;

/// Colour a usage figure by how close it is to full.
fn color_by_usage(text: String, pct: f64) -> String {
    if pct >= thresholds::UTILIZATION_HIGH {
        text.red().to_string()
    } else if pct >= thresholds::UTILIZATION_LOW {
        text.yellow().to_string()
    } else {
        text.green().to_string()
    }
}

fn format_node_state(node: &NodeRecord) -> String {
    let label = node.state_raw.to_lowercase();
    match node.state {
        NodeState::Idle => format!("{} {}", "○".green(), label.green()),
        NodeState::Mixed => format!("{} {}", "◐".yellow(), label.yellow()),
        NodeState::Allocated => format!("{} {}", "●".blue(), label.blue()),
        NodeState::Drain => format!("{} {}", "◐".magenta(), label.magenta()),
        NodeState::Down => format!("{} {}", "●".red(), label.red()),
        NodeState::Unknown => format!("{} {}", "?".white(), label.white()),
    }
}

fn format_cpu_usage(node: &NodeRecord) -> String {
    let text = format!("{}/{}", node.cpu_allocated, node.cpu_total);
    color_by_usage(text, node.cpu_percent())
}

fn format_memory_usage(node: &NodeRecord) -> String {
    let text = format!("{}/{}", format_gib(node.mem_allocated), format_gib(node.mem_total));
    color_by_usage(text, node.mem_percent())
}

fn format_gpu_usage(node: &NodeRecord) -> String {
    match (node.gpu_allocated, node.gpu_total) {
        (Some(used), Some(total)) if total > 0 => color_by_usage(
            format!("{used}/{total}"),
            percent(u64::from(used), u64::from(total)),
        ),
        _ => "-".dimmed().to_string(),
    }
}

/// Table row for node display
#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "Node")]
    node: String,

    #[tabled(rename = "State")]
    state: String,

    #[tabled(rename = "CPU")]
    cpu: String,

    #[tabled(rename = "Memory")]
    memory: String,

    #[tabled(rename = "GPU")]
    gpu: String,

    #[tabled(rename = "Partitions")]
    partitions: String,

    #[tabled(rename = "Reason")]
    reason: String,
}

fn render_table<T: Tabled>(rows: Vec<T>) -> String {
    let mut table = Table::new(rows);
    table
        .with(Style::rounded())
        .with(Width::wrap(TABLE_WIDTH).keep_words(true))
        .with(Modify::new(Rows::first()).with(Alignment::center()));
    table.to_string()
}

/// Nodes table followed by the cluster totals.
pub fn format_nodes(nodes: &[NodeRecord]) -> String {
    if nodes.is_empty() {
        return "No nodes found".yellow().to_string();
    }

    let rows: Vec<NodeRow> = nodes
        .iter()
        .map(|node| NodeRow {
            node: node.name.clone(),
            state: format_node_state(node),
            cpu: format_cpu_usage(node),
            memory: format_memory_usage(node),
            gpu: format_gpu_usage(node),
            partitions: node.partitions.clone(),
            reason: if node.reason.is_empty() {
                "-".to_string()
            } else {
                truncate_string(&node.reason, 40)
            },
        })
        .collect();

    let mut output = render_table(rows);
    output.push('\n');
    output.push_str(&format_totals(&ClusterTotals::from_nodes(nodes)));
    output
}

fn capacity_line(
    label: &str,
    used: u64,
    avail: u64,
    theoretical: u64,
    fmt: fn(u64) -> String,
) -> String {
    let pct = percent(used, avail);
    format!(
        "{} {} of {} available ({} theoretical) {}",
        label.bold(),
        color_by_usage(fmt(used), pct),
        fmt(avail),
        fmt(theoretical),
        color_by_usage(usage_bar(pct, layout::BAR_LENGTH), pct)
    )
}

/// Available and theoretical capacity, one resource per line.
pub fn format_totals(totals: &ClusterTotals) -> String {
    let (avail, all) = (&totals.available, &totals.theoretical);
    let mut lines = vec![
        format!(
            "{} {}/{} available ({} offline)",
            "Nodes:".bold(),
            avail.nodes,
            all.nodes,
            totals.offline_nodes()
        ),
        capacity_line(
            "CPUs:",
            avail.cpu_allocated,
            avail.cpu_total,
            all.cpu_total,
            |n| n.to_string(),
        ),
        capacity_line(
            "Memory:",
            avail.mem_allocated,
            avail.mem_total,
            all.mem_total,
            format_gib,
        ),
    ];
    if all.gpu_total > 0 {
        lines.push(capacity_line(
            "GPUs:",
            avail.gpu_allocated,
            avail.gpu_total,
            all.gpu_total,
            |n| n.to_string(),
        ));
    }
    lines.join("\n")
}

/// Table row for job display
#[derive(Tabled)]
struct JobRow {
    #[tabled(rename = "JobID")]
    job_id: String,

    #[tabled(rename = "Name")]
    name: String,

    #[tabled(rename = "User")]
    user: String,

    #[tabled(rename = "Partition")]
    partition: String,

    #[tabled(rename = "State")]
    state: String,

    #[tabled(rename = "Nodes/Reason")]
    where_or_why: String,

    #[tabled(rename = "CPUs")]
    cpus: String,

    #[tabled(rename = "GPUs")]
    gpus: String,

    #[tabled(rename = "Submitted")]
    submitted: String,

    #[tabled(rename = "Time Left")]
    time_left: String,
}

fn format_job_state(state: JobState) -> String {
    let text = state.as_str();
    match state {
        JobState::Running => text.green().to_string(),
        JobState::Pending => text.yellow().to_string(),
        JobState::Completing => text.bright_yellow().to_string(),
        JobState::Failed => text.red().to_string(),
        JobState::Cancelled => text.magenta().to_string(),
        JobState::Unknown => text.white().to_string(),
    }
}

/// Color pending reasons based on type
fn format_where_or_why(job: &JobRecord) -> String {
    let text = job.where_or_why();
    if !job.node_list.is_empty() || job.reason.is_empty() {
        return text;
    }
    let reason = &job.reason;
    if reason.contains("Resources") || reason.contains("Priority") {
        text.yellow().to_string()
    } else if reason.contains("Dependency") {
        text.cyan().to_string()
    } else if reason.contains("QOS") || reason.contains("Assoc") {
        text.magenta().to_string()
    } else {
        text
    }
}

/// Jobs table for the filtered view, with a `visible/total` footer.
pub fn format_jobs(jobs: &[JobRecord], view: &FilteredJobs, criteria: &FilterCriteria) -> String {
    let mut footer = if criteria.is_active() {
        format!("{}/{} jobs", view.visible(), view.total)
    } else {
        format!("{} jobs", view.total)
    };
    if let Some(summary) = criteria.summary() {
        footer.push_str(&format!(" ({summary})"));
    }

    if view.is_empty() {
        let message = if view.total == 0 {
            "No jobs found".to_string()
        } else {
            format!("No jobs match the filter ({footer})")
        };
        return message.yellow().to_string();
    }

    let rows: Vec<JobRow> = view
        .iter(jobs)
        .map(|job| JobRow {
            job_id: job.job_id.clone(),
            name: truncate_string(&job.name, 40),
            user: job.user.clone(),
            partition: job.partition.clone(),
            state: format_job_state(job.state),
            where_or_why: format_where_or_why(job),
            cpus: job.resources.cpus.to_string(),
            gpus: match job.resources.gpus {
                0 => "-".to_string(),
                n => n.to_string(),
            },
            submitted: format_submit_time(job.submit_time),
            time_left: format_time_left(job.time_left),
        })
        .collect();

    format!("{}\n{}", render_table(rows), footer.dimmed())
}

/// Job detail as a key/value listing followed by live usage.
pub fn format_job_detail(detail: &JobDetail) -> String {
    let mut output = format!("{} {}\n", "Job".bold(), detail.job_id.cyan().bold());

    let width = detail
        .fields
        .interesting()
        .map(|(key, _)| key.len())
        .max()
        .unwrap_or(0);
    for (key, value) in detail.fields.interesting() {
        let value = if key == "JobState" {
            format_job_state(JobState::from_slurm(value))
        } else {
            value.to_string()
        };
        output.push_str(&format!("  {}  {}\n", format!("{key:<width$}").bold(), value));
    }

    match &detail.live {
        Some(live) => {
            output.push_str(&format!("\n{}\n", "Live Usage".bold().underline()));
            let cpu = live
                .cpu_percent()
                .map_or_else(|| "-".to_string(), |p| format!("{p:.0}%"));
            output.push_str(&format!("  CPU        {cpu}\n"));
            output.push_str(&format!(
                "  CPU time   {}\n",
                format_duration_hms(live.ave_cpu_secs)
            ));
            output.push_str(&format!(
                "  RSS        {} avg / {} max\n",
                format_bytes(live.ave_rss),
                format_bytes(live.max_rss)
            ));
            output.push_str(&format!(
                "  Disk       {} read / {} written\n",
                format_bytes(live.max_disk_read),
                format_bytes(live.max_disk_write)
            ));
        }
        None if detail.fields.is_running() => {
            output.push_str(&format!("\n{}\n", "Live usage unavailable".dimmed()));
        }
        None => {}
    }

    output
}
