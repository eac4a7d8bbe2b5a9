//! Background tasks and the dashboard event loop
//!
//! Three sources feed the [`App`]:
//! - terminal input, read by [`spawn_input_task`] and never dropped
//! - detail and kill results sent by the refresh scheduler
//! - the snapshot store's watch channel, which only ever holds the newest snapshot
//!
//! [`run_event_loop`] polls them with a biased `select!` so keys stay
//! responsive while the scheduler is busy.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream};
use futures::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::models::Snapshot;
use crate::tui::app::App;
use crate::tui::event::{DataEvent, EventResult, InputEvent};

const INPUT_QUEUE: usize = 16;
const DATA_QUEUE: usize = 32;

/// Redraw cadence for the header clock and expiring notices
const CLOCK_TICK_INTERVAL: Duration = Duration::from_secs(1);

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Owns the dashboard's background tasks and the token that stops them.
#[derive(Default)]
pub struct TuiRuntime {
    cancel_token: CancellationToken,
    tasks: Vec<JoinHandle<()>>,
}

impl TuiRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token handed to every spawned task; cancelled by [`TuiRuntime::shutdown`].
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    pub fn track(&mut self, handle: JoinHandle<()>) {
        self.tasks.push(handle);
    }

    /// Cancel every task and wait up to two seconds for them to finish.
    ///
    /// Slurm commands still running are abandoned; their child processes are
    /// killed on drop.
    pub async fn shutdown(self) {
        let Self { cancel_token, tasks } = self;
        cancel_token.cancel();

        let joined = futures::future::join_all(tasks);
        match tokio::time::timeout(SHUTDOWN_GRACE, joined).await {
            Ok(results) => {
                let panicked = results.iter().filter(|r| r.is_err()).count();
                if panicked > 0 {
                    tracing::warn!(panicked, "background tasks ended abnormally");
                }
            }
            Err(_) => tracing::warn!("background tasks did not stop in time"),
        }
    }
}

/// Keys, mouse and resize events; focus and paste events are not used.
fn to_input_event(event: Event) -> Option<InputEvent> {
    match event {
        Event::Key(key) => Some(InputEvent::Key(key)),
        Event::Mouse(mouse) => Some(InputEvent::Mouse(mouse)),
        Event::Resize(w, h) => Some(InputEvent::Resize(w, h)),
        _ => None,
    }
}

/// A closed terminal, as opposed to a transient read error.
fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset | io::ErrorKind::UnexpectedEof
    )
}

/// Forward terminal events to `tx` until cancelled, the terminal goes away,
/// or the event loop drops its receiver.
pub fn spawn_input_task(tx: mpsc::Sender<InputEvent>, cancel: CancellationToken) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut events = EventStream::new();

        loop {
            let next = tokio::select! {
                _ = cancel.cancelled() => return,
                next = events.next() => next,
            };

            match next {
                Some(Ok(event)) => {
                    let Some(input) = to_input_event(event) else {
                        continue;
                    };
                    if tx.send(input).await.is_err() {
                        return;
                    }
                }
                Some(Err(e)) if is_disconnect(&e) => {
                    tracing::info!(error = %e, "terminal disconnected");
                    return;
                }
                Some(Err(e)) => tracing::warn!(error = %e, "failed to read terminal event"),
                None => return,
            }
        }
    })
}

/// Drive `app` until it quits or the input task ends.
///
/// `render_fn` runs after any event that changed the app and on every clock
/// tick. A closed snapshot channel is tolerated; the last snapshot stays up.
pub async fn run_event_loop(
    mut app: App,
    mut input_rx: mpsc::Receiver<InputEvent>,
    mut data_rx: mpsc::Receiver<DataEvent>,
    mut snapshot_rx: watch::Receiver<Arc<Snapshot>>,
    mut render_fn: impl FnMut(&App) -> Result<()>,
) -> Result<()> {
    let mut needs_render = true;
    let mut snapshots_open = true;
    let mut clock = tokio::time::interval(CLOCK_TICK_INTERVAL);
    clock.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let initial = snapshot_rx.borrow_and_update().clone();
    app.on_snapshot(initial);

    loop {
        if needs_render {
            render_fn(&app)?;
            needs_render = false;
        }

        if !app.running {
            break;
        }

        tokio::select! {
            biased;

            maybe_input = input_rx.recv() => {
                // Input task gone means the terminal is gone
                let Some(input) = maybe_input else { break };
                match app.handle_input(input) {
                    EventResult::Continue => needs_render = true,
                    EventResult::Unchanged => {}
                    EventResult::Quit => break,
                }
            }

            Some(data) = data_rx.recv() => {
                match app.handle_data(data) {
                    EventResult::Continue => needs_render = true,
                    EventResult::Unchanged => {}
                    EventResult::Quit => break,
                }
            }

            changed = snapshot_rx.changed(), if snapshots_open => {
                if changed.is_ok() {
                    let snapshot = snapshot_rx.borrow_and_update().clone();
                    tracing::trace!(cycle = snapshot.cycle, stale = snapshot.stale, "snapshot received");
                    app.on_snapshot(snapshot);
                    needs_render = true;
                } else {
                    snapshots_open = false;
                }
            }

            _ = clock.tick() => needs_render = true,
        }
    }

    Ok(())
}

/// Bounded queues between the input task, the scheduler and the event loop.
pub fn create_channels() -> (
    mpsc::Sender<InputEvent>,
    mpsc::Receiver<InputEvent>,
    mpsc::Sender<DataEvent>,
    mpsc::Receiver<DataEvent>,
) {
    let (input_tx, input_rx) = mpsc::channel(INPUT_QUEUE);
    let (data_tx, data_rx) = mpsc::channel(DATA_QUEUE);
    (input_tx, input_rx, data_tx, data_rx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobRecord, SmonConfig};
    use crate::scheduler::SchedulerHandle;
    use crate::store::SnapshotStore;
    use crate::tui::clipboard::DisabledClipboard;
    use chrono::Local;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

    fn app() -> App {
        let (handle, _rx) = SchedulerHandle::channel();
        App::new(
            SmonConfig::default(),
            Vec::new(),
            handle,
            Box::new(DisabledClipboard),
        )
    }

    fn key(c: char) -> InputEvent {
        InputEvent::Key(KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE))
    }

    #[tokio::test]
    async fn test_quit_key_ends_loop() {
        let (input_tx, input_rx, _data_tx, data_rx) = create_channels();
        let store = SnapshotStore::new();
        input_tx.send(key('q')).await.unwrap();

        let mut renders = 0;
        run_event_loop(app(), input_rx, data_rx, store.subscribe(), |_| {
            renders += 1;
            Ok(())
        })
        .await
        .unwrap();

        assert_eq!(renders, 1);
    }

    #[tokio::test]
    async fn test_installed_snapshot_reaches_app() {
        let (input_tx, input_rx, _data_tx, data_rx) = create_channels();
        let store = SnapshotStore::new();
        let previous = store.read();
        let job = JobRecord {
            job_id: "7".into(),
            ..Default::default()
        };
        store.install(Snapshot::fresh(&previous, Vec::new(), vec![job], 0, Local::now()));

        let mut seen = Vec::new();
        let sender = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            input_tx.send(key('q')).await.unwrap();
        });

        run_event_loop(app(), input_rx, data_rx, store.subscribe(), |app| {
            seen.push(app.selected_job_id());
            Ok(())
        })
        .await
        .unwrap();
        sender.await.unwrap();

        assert_eq!(seen.first().cloned().flatten().as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn test_shutdown_stops_tracked_tasks() {
        let mut runtime = TuiRuntime::new();
        let token = runtime.cancel_token();
        runtime.track(tokio::spawn(async move { token.cancelled().await }));
        tokio::time::timeout(Duration::from_secs(1), runtime.shutdown())
            .await
            .unwrap();
    }

    #[test]
    fn test_input_event_mapping() {
        let k = KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE);
        assert!(matches!(to_input_event(Event::Key(k)), Some(InputEvent::Key(_))));
        assert!(matches!(to_input_event(Event::Resize(80, 24)), Some(InputEvent::Resize(80, 24))));
        assert!(to_input_event(Event::FocusGained).is_none());

        assert!(is_disconnect(&io::Error::from(io::ErrorKind::BrokenPipe)));
        assert!(!is_disconnect(&io::Error::from(io::ErrorKind::Interrupted)));
    }
}
