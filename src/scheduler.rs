//! Periodic sampling, on-demand job detail and job termination
//!
//! The scheduler task owns the refresh interval. Each tick starts a sampling
//! cycle unless one is already running; that tick is then dropped, never
//! queued. A cycle runs both status queries concurrently and installs exactly
//! one snapshot: fresh when both succeeded, stale (previous data, error
//! recorded) otherwise.
//!
//! Detail watching and kills run on their own tasks and report back over the
//! dashboard's data channel. Their failures never touch snapshot staleness.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::Local;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::{BackendError, KillFailed};
use crate::models::{JobDetail, Snapshot};
use crate::parser::{parse_detail, parse_duration, parse_jobs, parse_live_stats, parse_nodes};
use crate::slurm::{QueryKind, SlurmBackend};
use crate::store::SnapshotStore;

const COMMAND_CHANNEL_CAPACITY: usize = 16;

/// Results reported back to the dashboard (data channel, may be dropped
/// under load except for kill results).
#[derive(Debug, Clone, PartialEq)]
pub enum DataEvent {
    DetailUpdated(JobDetail),
    DetailFailed {
        job_id: String,
        error: BackendError,
    },
    KillFinished {
        job_id: String,
        result: Result<(), KillFailed>,
    },
}

/// Requests from the dashboard to the scheduler task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchedulerCommand {
    RefreshNow,
    WatchDetail(String),
    StopDetail,
    Kill(String),
}

/// Fire-and-forget handle to a running scheduler.
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    tx: mpsc::Sender<SchedulerCommand>,
}

impl SchedulerHandle {
    /// A handle plus the receiving end the scheduler task reads from.
    #[must_use]
    pub fn channel() -> (Self, mpsc::Receiver<SchedulerCommand>) {
        let (tx, rx) = mpsc::channel(COMMAND_CHANNEL_CAPACITY);
        (Self { tx }, rx)
    }

    fn send(&self, command: SchedulerCommand) {
        if let Err(e) = self.tx.try_send(command) {
            tracing::warn!(error = %e, "scheduler command dropped");
        }
    }

    /// Sample now, subject to the at-most-one-in-flight rule.
    pub fn request_refresh(&self) {
        self.send(SchedulerCommand::RefreshNow);
    }

    /// Start refreshing the detail of `job_id`, replacing any previous watch.
    pub fn fetch_detail(&self, job_id: &str) {
        self.send(SchedulerCommand::WatchDetail(job_id.to_string()));
    }

    pub fn stop_detail(&self) {
        self.send(SchedulerCommand::StopDetail);
    }

    /// Single kill attempt; the outcome arrives as [`DataEvent::KillFinished`].
    pub fn kill_job(&self, job_id: &str) {
        self.send(SchedulerCommand::Kill(job_id.to_string()));
    }
}

/// Whether a sampling cycle is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    Idle,
    Sampling,
}

/// What happened to a sampling request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleOutcome {
    /// A snapshot was installed (fresh or stale).
    Sampled,
    /// Another cycle was in flight.
    Dropped,
}

/// Releases the in-flight flag when the cycle ends, even on cancellation.
struct InFlightGuard<'a>(&'a AtomicBool);

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runs sampling cycles against one backend and installs the results.
#[derive(Debug)]
pub struct Sampler<B> {
    backend: Arc<B>,
    store: SnapshotStore,
    in_flight: AtomicBool,
}

impl<B: SlurmBackend> Sampler<B> {
    pub fn new(backend: Arc<B>, store: SnapshotStore) -> Self {
        Self {
            backend,
            store,
            in_flight: AtomicBool::new(false),
        }
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    #[must_use]
    pub fn state(&self) -> SchedulerState {
        if self.in_flight.load(Ordering::Acquire) {
            SchedulerState::Sampling
        } else {
            SchedulerState::Idle
        }
    }

    /// Run one cycle unless one is already in flight.
    pub async fn sample_once(&self) -> SampleOutcome {
        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            tracing::debug!("sampling cycle already in flight, dropping request");
            return SampleOutcome::Dropped;
        };

        let (nodes, jobs) = tokio::join!(
            self.backend.run_status_query(QueryKind::Nodes),
            self.backend.run_status_query(QueryKind::Jobs),
        );

        let previous = self.store.read();
        let now = Local::now();
        let snapshot = match (nodes, jobs) {
            (Ok(nodes), Ok(jobs)) => {
                let nodes = parse_nodes(&nodes);
                let jobs = parse_jobs(&jobs);
                let skipped = nodes.skipped + jobs.skipped;
                if skipped > 0 {
                    tracing::debug!(skipped, "parser skipped malformed rows");
                }
                let snapshot = Snapshot::fresh(&previous, nodes.records, jobs.records, skipped, now);
                tracing::debug!(
                    cycle = snapshot.cycle,
                    nodes = snapshot.nodes.len(),
                    jobs = snapshot.jobs.len(),
                    "sample installed"
                );
                snapshot
            }
            (Err(error), _) | (_, Err(error)) => {
                tracing::warn!(
                    program = error.program(),
                    %error,
                    "sampling failed, keeping previous data"
                );
                Snapshot::stale_from(&previous, error, now)
            }
        };

        self.store.install(snapshot);
        SampleOutcome::Sampled
    }
}

/// Fetch static detail, plus live statistics when the job is running.
///
/// A live-statistics failure keeps the static detail and leaves `live` empty.
pub async fn fetch_job_detail<B: SlurmBackend>(
    backend: &B,
    job_id: &str,
) -> Result<JobDetail, BackendError> {
    let fields = parse_detail(&backend.run_detail_query(job_id).await?);

    let live = if fields.is_running() {
        let elapsed = fields.get("RunTime").and_then(parse_duration);
        match backend.run_live_stats_query(job_id).await {
            Ok(text) => parse_live_stats(&text, elapsed),
            Err(error) => {
                tracing::debug!(job_id, %error, "live stats unavailable");
                None
            }
        }
    } else {
        None
    };

    Ok(JobDetail {
        job_id: job_id.to_string(),
        fields,
        live,
        fetched_at: Local::now(),
    })
}

/// Intervals driving the scheduler.
#[derive(Debug, Clone, Copy)]
pub struct RefreshTimings {
    pub interval: Duration,
    pub detail_interval: Duration,
}

/// The background task that samples the cluster and executes commands.
pub struct RefreshScheduler<B> {
    sampler: Arc<Sampler<B>>,
    timings: RefreshTimings,
    events: mpsc::Sender<DataEvent>,
}

impl<B: SlurmBackend> RefreshScheduler<B> {
    pub fn new(
        backend: Arc<B>,
        store: SnapshotStore,
        timings: RefreshTimings,
        events: mpsc::Sender<DataEvent>,
    ) -> Self {
        Self {
            sampler: Arc::new(Sampler::new(backend, store)),
            timings,
            events,
        }
    }

    /// Start the scheduler task. It stops when `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> (SchedulerHandle, JoinHandle<()>) {
        let (handle, commands) = SchedulerHandle::channel();
        let task = tokio::spawn(self.run(commands, cancel));
        (handle, task)
    }

    async fn run(self, mut commands: mpsc::Receiver<SchedulerCommand>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.timings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut detail: Option<CancellationToken> = None;

        tracing::info!(interval = ?self.timings.interval, "refresh scheduler started");

        loop {
            tokio::select! {
                biased;

                _ = cancel.cancelled() => break,

                Some(command) = commands.recv() => match command {
                    SchedulerCommand::RefreshNow => self.start_sample(),
                    SchedulerCommand::WatchDetail(job_id) => {
                        if let Some(previous) = detail.take() {
                            previous.cancel();
                        }
                        detail = Some(self.watch_detail(job_id, &cancel));
                    }
                    SchedulerCommand::StopDetail => {
                        if let Some(previous) = detail.take() {
                            previous.cancel();
                        }
                    }
                    SchedulerCommand::Kill(job_id) => self.start_kill(job_id),
                },

                _ = ticker.tick() => self.start_sample(),
            }
        }

        if let Some(token) = detail.take() {
            token.cancel();
        }
        tracing::info!("refresh scheduler stopped");
    }

    fn start_sample(&self) {
        if self.sampler.state() == SchedulerState::Sampling {
            tracing::debug!("tick dropped, sampling cycle in flight");
            return;
        }
        let sampler = Arc::clone(&self.sampler);
        tokio::spawn(async move {
            sampler.sample_once().await;
        });
    }

    fn watch_detail(&self, job_id: String, parent: &CancellationToken) -> CancellationToken {
        let token = parent.child_token();
        let cancel = token.clone();
        let backend = Arc::clone(self.sampler.backend());
        let events = self.events.clone();
        let period = self.timings.detail_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {}
                }

                let result = tokio::select! {
                    _ = cancel.cancelled() => break,
                    result = fetch_job_detail(backend.as_ref(), &job_id) => result,
                };

                let event = match result {
                    Ok(detail) => DataEvent::DetailUpdated(detail),
                    Err(error) => {
                        tracing::debug!(job_id = %job_id, %error, "detail fetch failed");
                        DataEvent::DetailFailed {
                            job_id: job_id.clone(),
                            error,
                        }
                    }
                };
                if events.try_send(event).is_err() {
                    tracing::debug!(job_id = %job_id, "detail update dropped (channel full)");
                }
            }
        });

        token
    }

    fn start_kill(&self, job_id: String) {
        let sampler = Arc::clone(&self.sampler);
        let events = self.events.clone();

        tokio::spawn(async move {
            let result = sampler
                .backend()
                .run_kill(&job_id)
                .await
                .map_err(|source| KillFailed {
                    job_id: job_id.clone(),
                    source,
                });

            match &result {
                Ok(()) => tracing::info!(job_id = %job_id, "job killed"),
                Err(e) => tracing::warn!(error = %e, "kill failed"),
            }
            let killed = result.is_ok();

            if events
                .send(DataEvent::KillFinished { job_id, result })
                .await
                .is_err()
            {
                tracing::debug!("kill result dropped, dashboard gone");
            }
            if killed {
                sampler.sample_once().await;
            }
        });
    }
}
