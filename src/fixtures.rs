//! Deterministic demo cluster
//!
//! [`FixtureBackend`] renders a synthetic 64-node, 40-job cluster in exactly
//! the text formats the real commands print, so demo mode exercises the same
//! parser and scheduler paths as a live cluster. Running jobs age with wall
//! time and cancelled jobs disappear from later listings.

use std::collections::HashSet;
use std::fmt::Write as _;
use std::sync::{Mutex, PoisonError};
use std::time::Instant;

use crate::error::BackendError;
use crate::formatting::format_duration_hms;
use crate::slurm::{QueryKind, SlurmBackend};

pub const FIXTURE_USERS: &[&str] = &["alice", "bob", "carol", "dave", "eve"];

const JOB_COUNT: usize = 40;
const FIRST_JOB_ID: u64 = 451_950;

const NAME_STEMS: &[&str] = &[
    "train_resnet",
    "eval_bert",
    "train_llama_ft",
    "sweep_lr",
    "preprocess_shards",
    "train_diffusion",
    "eval_heldout",
    "tokenize_corpus",
];

const PENDING_REASONS: &[&str] = &["Priority", "Resources", "Dependency", "AssocGrpCPU"];

#[derive(Debug, Clone)]
struct FixtureJob {
    id: u64,
    user: &'static str,
    name: String,
    running: bool,
    partition: &'static str,
    account: &'static str,
    qos: &'static str,
    node_list: String,
    reason: &'static str,
    submit: String,
    base_run: u64,
    limit: u64,
    priority: u64,
    nodes: u32,
    cpus: u32,
    mem: &'static str,
    gpus_per_node: u32,
    dependency: String,
}

/// Backend serving the demo cluster.
#[derive(Debug)]
pub struct FixtureBackend {
    jobs: Vec<FixtureJob>,
    cancelled: Mutex<HashSet<u64>>,
    started: Instant,
}

impl Default for FixtureBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureBackend {
    #[must_use]
    pub fn new() -> Self {
        Self {
            jobs: (0..JOB_COUNT).map(build_job).collect(),
            cancelled: Mutex::new(HashSet::new()),
            started: Instant::now(),
        }
    }

    fn elapsed(&self) -> u64 {
        self.started.elapsed().as_secs()
    }

    fn is_cancelled(&self, id: u64) -> bool {
        self.cancelled
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(&id)
    }

    /// A job Slurm still knows about; cancelled jobs are gone like on a real cluster.
    fn find(&self, job_id: &str, program: &str) -> Result<&FixtureJob, BackendError> {
        job_id
            .parse::<u64>()
            .ok()
            .filter(|&id| !self.is_cancelled(id))
            .and_then(|id| self.jobs.iter().find(|j| j.id == id))
            .ok_or_else(|| invalid_job_id(program))
    }

    fn run_time(&self, job: &FixtureJob) -> u64 {
        if job.running {
            (job.base_run + self.elapsed()).min(job.limit)
        } else {
            0
        }
    }

    /// `scontrol show node -o` output.
    #[must_use]
    pub fn node_text(&self) -> String {
        let mut out = String::new();
        for i in 1..=12u32 {
            let state = match i {
                7 => "DOWN*",
                11 => "IDLE+DRAIN",
                _ if i % 6 == 0 => "IDLE",
                _ => "MIXED",
            };
            let cpu_alloc = if state == "MIXED" {
                (22 + (i * 5) % 38).min(62)
            } else {
                0
            };
            let reason = match i {
                7 => "Not responding [slurm@2026-01-12T03:14:07]",
                11 => "disk replacement [root@2026-01-11T16:20:00]",
                _ => "(null)",
            };
            push_node(
                &mut out,
                &format!("cpu-a{i:02}"),
                state,
                (cpu_alloc, 64),
                ((cpu_alloc * 3600 + (i % 5) * 2048).min(255_000), 257_000),
                None,
                "cpu",
                reason,
            );
        }
        for i in 1..=48u32 {
            let state = match i {
                12 | 24 | 36 | 48 => "MAINT",
                _ if i % 5 == 0 => "ALLOCATED",
                _ if i % 7 == 0 => "IDLE",
                _ => "MIXED",
            };
            let (cpu_alloc, gpu_alloc) = match state {
                "ALLOCATED" => (126 + i % 2, 8),
                "MIXED" => (28 + (i * 4) % 56, 3 + i % 5),
                _ => (0, 0),
            };
            let reason = if state == "MAINT" {
                "scheduled maintenance [root@2026-01-10T08:00:00]"
            } else {
                "(null)"
            };
            push_node(
                &mut out,
                &format!("gpu-a{i:02}"),
                state,
                (cpu_alloc, 128),
                ((cpu_alloc * 3200 + gpu_alloc * 16_000).min(513_000), 515_000),
                Some((gpu_alloc, 8)),
                "gpu",
                reason,
            );
        }
        for i in 1..=4u32 {
            let (state, cpu_alloc, reason) = if i == 4 {
                ("IDLE*+NO_RESPOND", 0, "Not responding [slurm@2026-01-12T05:00:00]")
            } else {
                ("MIXED", 40 + i * 6, "(null)")
            };
            push_node(
                &mut out,
                &format!("hm-a{i:02}"),
                state,
                (cpu_alloc, 96),
                ((cpu_alloc * 14_500).min(1_023_000), 1_024_000),
                None,
                "bigmem",
                reason,
            );
        }
        out
    }

    /// `squeue` output in the bulk job format, cancelled jobs omitted.
    #[must_use]
    pub fn job_text(&self) -> String {
        let mut out = String::new();
        for job in self.jobs.iter().filter(|j| !self.is_cancelled(j.id)) {
            let run = self.run_time(job);
            let gres = if job.gpus_per_node > 0 {
                format!("gres/gpu:{}", job.gpus_per_node)
            } else {
                "N/A".to_string()
            };
            let _ = writeln!(
                out,
                "{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}|{}",
                job.id,
                job.user,
                if job.running { "RUNNING" } else { "PENDING" },
                job.partition,
                job.account,
                job.qos,
                job.node_list,
                job.reason,
                job.submit,
                format_duration_hms(run),
                format_duration_hms(job.limit - run),
                job.priority,
                job.nodes,
                job.cpus,
                job.mem,
                gres,
                if job.dependency.is_empty() { "(null)" } else { job.dependency.as_str() },
                job.name,
            );
        }
        out
    }

    fn detail_text(&self, job: &FixtureJob) -> String {
        let state = if job.running { "RUNNING" } else { "PENDING" };
        let run = self.run_time(job);
        let tres = if job.gpus_per_node > 0 {
            format!(
                "cpu={},mem={},node={},billing={},gres/gpu={}",
                job.cpus,
                job.mem,
                job.nodes,
                job.cpus,
                job.gpus_per_node * job.nodes
            )
        } else {
            format!("cpu={},mem={},node={},billing={}", job.cpus, job.mem, job.nodes, job.cpus)
        };
        let node_list = if job.node_list.is_empty() {
            "(null)"
        } else {
            job.node_list.as_str()
        };
        let dependency = if job.dependency.is_empty() {
            "(null)"
        } else {
            job.dependency.as_str()
        };

        format!(
            "JobId={id} JobName={name}\n   \
             UserId={user}(2{uid:03}) GroupId={user}(2{uid:03}) MCS_label=N/A\n   \
             Priority={prio} Nice=0 Account={account} QOS={qos}\n   \
             JobState={state} Reason={reason} Dependency={dependency}\n   \
             Requeue=1 Restarts=0 BatchFlag=1 Reboot=0 ExitCode=0:0\n   \
             RunTime={run} TimeLimit={limit} TimeMin=N/A\n   \
             SubmitTime={submit} EligibleTime={submit}\n   \
             StartTime={start} EndTime=Unknown Deadline=N/A\n   \
             Partition={partition} AllocNode:Sid=login01:4242\n   \
             NodeList={node_list}\n   \
             NumNodes={nodes} NumCPUs={cpus} NumTasks={nodes} CPUs/Task=N/A\n   \
             TRES={tres}\n   \
             Command=/home/{user}/jobs/{name}.sbatch\n   \
             WorkDir=/home/{user}/jobs\n   \
             StdErr=/home/{user}/jobs/{name}-{id}.err\n   \
             StdOut=/home/{user}/jobs/{name}-{id}.out\n",
            id = job.id,
            name = job.name,
            user = job.user,
            uid = job.id % 1000,
            prio = job.priority,
            account = job.account,
            qos = job.qos,
            reason = if job.running { "None" } else { job.reason },
            run = format_duration_hms(run),
            limit = format_duration_hms(job.limit),
            submit = job.submit,
            start = if job.running { job.submit.as_str() } else { "Unknown" },
            partition = job.partition,
            nodes = job.nodes,
            cpus = job.cpus,
        )
    }

    fn live_stats_text(&self, job: &FixtureJob) -> String {
        if !job.running {
            return String::new();
        }
        let run = self.run_time(job);
        let load = 55 + job.id % 40;
        let ave_cpu = run * load / 100;
        let rss_mb = 2_048 + (job.id % 17) * 1_024;
        let disk_mb = 100 + run / 30;
        format!(
            "{}|{}M|{}M|{}M|{}M\n",
            format_duration_hms(ave_cpu),
            rss_mb,
            rss_mb + rss_mb / 4,
            disk_mb * 3,
            disk_mb,
        )
    }
}

impl SlurmBackend for FixtureBackend {
    async fn run_status_query(&self, kind: QueryKind) -> Result<String, BackendError> {
        Ok(match kind {
            QueryKind::Nodes => self.node_text(),
            QueryKind::Jobs => self.job_text(),
        })
    }

    async fn run_detail_query(&self, job_id: &str) -> Result<String, BackendError> {
        self.find(job_id, "scontrol").map(|job| self.detail_text(job))
    }

    async fn run_live_stats_query(&self, job_id: &str) -> Result<String, BackendError> {
        self.find(job_id, "sstat").map(|job| self.live_stats_text(job))
    }

    async fn run_kill(&self, job_id: &str) -> Result<(), BackendError> {
        let job = self.find(job_id, "scancel")?;
        let mut cancelled = self.cancelled.lock().unwrap_or_else(PoisonError::into_inner);
        if cancelled.insert(job.id) {
            tracing::info!(job_id, "demo job cancelled");
            Ok(())
        } else {
            Err(invalid_job_id("scancel"))
        }
    }
}

fn invalid_job_id(program: &str) -> BackendError {
    BackendError::CommandFailed {
        program: program.to_string(),
        exit_code: Some(1),
        stderr: format!("{program}: error: Invalid job id specified"),
    }
}

#[allow(clippy::too_many_arguments)]
fn push_node(
    out: &mut String,
    name: &str,
    state: &str,
    cpus: (u32, u32),
    mem_mb: (u32, u32),
    gpus: Option<(u32, u32)>,
    partition: &str,
    reason: &str,
) {
    let (gres, alloc_tres) = match gpus {
        Some((alloc, total)) => (
            format!("gpu:a100:{total}(S:0-1)"),
            format!("cpu={},mem={}M,gres/gpu={alloc}", cpus.0, mem_mb.0),
        ),
        None => ("(null)".to_string(), format!("cpu={},mem={}M", cpus.0, mem_mb.0)),
    };
    let _ = writeln!(
        out,
        "NodeName={name} Arch=x86_64 CoresPerSocket=16 CPUAlloc={} CPUEfctv={} CPUTot={} \
         Gres={gres} NodeAddr={name} RealMemory={} AllocMem={} State={state} \
         Partitions={partition} AllocTRES={alloc_tres} Reason={reason}",
        cpus.0, cpus.1, cpus.1, mem_mb.1, mem_mb.0,
    );
}

fn build_job(i: usize) -> FixtureJob {
    let n = i as u64;
    let user = FIXTURE_USERS[i % FIXTURE_USERS.len()];
    let running = i % 5 != 3;
    let (partition, nodes, gpus_per_node) = match i % 3 {
        0 => ("gpu", 1 + (i % 4) as u32, if (i / 3) % 2 == 0 { 8 } else { 4 }),
        1 => ("cpu", 1 + (i % 3) as u32, 0),
        _ => ("bigmem", 1, 0),
    };
    let cores = match partition {
        "gpu" => 32,
        "bigmem" => 48,
        _ => 64,
    };
    let node_list = match (running, partition, nodes) {
        (false, _, _) => String::new(),
        (true, "gpu", 1) => format!("gpu-a{:02}", 1 + i % 44),
        (true, "gpu", k) => format!("gpu-a[{:02}-{:02}]", 1 + i % 40, i % 40 + k as usize),
        (true, "cpu", 1) => format!("cpu-a{:02}", 1 + i % 10),
        (true, "cpu", k) => format!("cpu-a[{:02}-{:02}]", 1 + i % 9, i % 9 + k as usize),
        (true, _, _) => format!("hm-a{:02}", 1 + i % 3),
    };
    let reason = if running {
        "None"
    } else {
        PENDING_REASONS[(i / 5) % PENDING_REASONS.len()]
    };
    let dependency = if reason == "Dependency" {
        format!("afterok:{}", FIRST_JOB_ID + n - 1)
    } else {
        String::new()
    };
    let limit = 3_600 * (2 + (n * 5) % 46);

    FixtureJob {
        id: FIRST_JOB_ID + n,
        user,
        name: format!("{}_{:02}", NAME_STEMS[(i * 3) % NAME_STEMS.len()], i),
        running,
        partition,
        account: ["ml_lab", "ml_ops", "research", "ml_platform", "ml_research"][i % 5],
        qos: if partition == "gpu" { "gpu_high" } else { "normal" },
        node_list,
        reason,
        submit: format!("2026-01-12T{:02}:{:02}:00", 1 + i % 12, (i * 7) % 60),
        base_run: if running { (n * 7_919) % (limit - 60) } else { 0 },
        limit,
        priority: 4_900 - n * 20,
        nodes,
        cpus: nodes * cores,
        mem: match partition {
            "gpu" => "256G",
            "bigmem" => "900G",
            _ => "64G",
        },
        gpus_per_node,
        dependency,
    }
}
