//! Single-writer holder of the latest cluster snapshot.

use std::sync::Arc;

use tokio::sync::watch;

use crate::models::Snapshot;

/// Latest [`Snapshot`], replaced wholesale on every install.
///
/// Readers get an `Arc` to one complete snapshot, so nodes and jobs always come
/// from the same cycle. Cloning the store clones the handle, not the data.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    tx: Arc<watch::Sender<Arc<Snapshot>>>,
}

impl Default for SnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl SnapshotStore {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(Arc::new(Snapshot::default()));
        Self { tx: Arc::new(tx) }
    }

    /// Replace the current snapshot and wake every subscriber.
    pub fn install(&self, snapshot: Snapshot) {
        tracing::trace!(cycle = snapshot.cycle, stale = snapshot.stale, "installing snapshot");
        self.tx.send_replace(Arc::new(snapshot));
    }

    /// The latest installed snapshot. Never blocks on the writer.
    #[must_use]
    pub fn read(&self) -> Arc<Snapshot> {
        Arc::clone(&self.tx.borrow())
    }

    /// Receiver that is notified on every install.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Arc<Snapshot>> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{JobRecord, NodeRecord};
    use chrono::Local;

    fn cycle(previous: &Snapshot, tag: &str) -> Snapshot {
        Snapshot::fresh(
            previous,
            vec![NodeRecord {
                name: format!("node-{tag}"),
                ..Default::default()
            }],
            vec![JobRecord {
                job_id: format!("1{tag}"),
                user: format!("user-{tag}"),
                ..Default::default()
            }],
            0,
            Local::now(),
        )
    }

    #[test]
    fn test_read_returns_latest_install() {
        let store = SnapshotStore::new();
        assert_eq!(store.read().cycle, 0);

        let first = cycle(&store.read(), "a");
        store.install(first);
        let second = cycle(&store.read(), "b");
        store.install(second);

        let snap = store.read();
        assert_eq!(snap.cycle, 2);
        assert_eq!(snap.nodes[0].name, "node-b");
    }

    #[test]
    fn test_held_reader_keeps_consistent_cycle() {
        let store = SnapshotStore::new();
        store.install(cycle(&store.read(), "a"));
        let held = store.read();

        store.install(cycle(&store.read(), "b"));

        assert_eq!(held.nodes[0].name, "node-a");
        assert_eq!(held.jobs[0].user, "user-a");
        assert_eq!(store.read().jobs[0].user, "user-b");
    }

    #[tokio::test]
    async fn test_subscriber_is_notified() {
        let store = SnapshotStore::new();
        let mut rx = store.subscribe();

        store.install(cycle(&store.read(), "a"));
        rx.changed().await.unwrap();
        assert_eq!(rx.borrow_and_update().cycle, 1);
    }

    #[test]
    fn test_concurrent_readers_never_see_mixed_cycles() {
        let store = SnapshotStore::new();
        let writer = store.clone();

        let handle = std::thread::spawn(move || {
            for i in 0..500 {
                let next = cycle(&writer.read(), &i.to_string());
                writer.install(next);
            }
        });

        for _ in 0..2_000 {
            let snap = store.read();
            if let (Some(node), Some(job)) = (snap.nodes.first(), snap.jobs.first()) {
                let node_tag = node.name.trim_start_matches("node-");
                let job_tag = job.user.trim_start_matches("user-");
                assert_eq!(node_tag, job_tag);
            }
        }
        handle.join().unwrap();
    }
}
