use std::time::Duration;

use log::{debug, error, info};
use tokio::sync::mpsc::{Receiver, Sender};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::snapshot::{BuildId, BuildSnapshot};

use super::store::SnapshotStore;

/// Persists every snapshot and re-enqueues the build while it is still running.
///
/// Re-polls wait in delay tasks owned by the scheduler, so cancelling the
/// shutdown token (or the scheduler returning) drops them before they fire.
pub struct PollScheduler {
    store: SnapshotStore,
    interval: Duration,
    stop_on_terminal: bool,
}

impl PollScheduler {
    /// # Arguments
    ///
    /// * `store` - Where snapshots are written
    /// * `interval` - Delay between receiving a running snapshot and re-polling
    /// * `stop_on_terminal` - Cancel the crawl once a terminal status arrives,
    ///   instead of idling until shutdown
    pub fn new(store: SnapshotStore, interval: Duration, stop_on_terminal: bool) -> Self {
        Self {
            store,
            interval,
            stop_on_terminal,
        }
    }

    /// Runs until shutdown, until the snapshot channel closes, or (with
    /// `stop_on_terminal`) until the build finishes.
    ///
    /// # Returns
    ///
    /// The last snapshot received, if any.
    pub async fn run(
        self,
        mut snapshots: Receiver<BuildSnapshot>,
        requeue: Sender<BuildId>,
        shutdown: CancellationToken,
    ) -> Option<BuildSnapshot> {
        let mut pending = JoinSet::new();
        let mut last = None;

        loop {
            while pending.try_join_next().is_some() {}

            let snapshot = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = snapshots.recv() => match next {
                    Some(snapshot) => snapshot,
                    None => break,
                },
            };

            debug!("Got request to update the state of build {}", snapshot.build_id);
            match self.store.persist(&snapshot) {
                Ok(path) => debug!("File written: {}", path.display()),
                Err(e) => error!(
                    "Failed to write snapshot for build {}: {e}",
                    snapshot.build_id
                ),
            }
            debug!("Jenkins build status: '{}'", snapshot.status);

            let finished = !snapshot.needs_repoll();
            if finished {
                info!(
                    "Build {} finished with status {}",
                    snapshot.build_id, snapshot.status
                );
            } else {
                self.schedule_repoll(
                    &mut pending,
                    snapshot.build_id.clone(),
                    requeue.clone(),
                    shutdown.clone(),
                );
            }
            last = Some(snapshot);

            if finished && self.stop_on_terminal {
                shutdown.cancel();
                break;
            }
        }

        pending.abort_all();
        debug!("Poll scheduler stopped");
        last
    }

    fn schedule_repoll(
        &self,
        pending: &mut JoinSet<()>,
        build_id: BuildId,
        requeue: Sender<BuildId>,
        shutdown: CancellationToken,
    ) {
        let interval = self.interval;
        debug!("Re-polling build {build_id} in {interval:?}");

        pending.spawn(async move {
            tokio::select! {
                _ = shutdown.cancelled() => {}
                _ = tokio::time::sleep(interval) => {
                    tokio::select! {
                        _ = shutdown.cancelled() => {}
                        sent = requeue.send(build_id) => {
                            if sent.is_err() {
                                debug!("Crawl worker gone, dropping re-poll");
                            }
                        }
                    }
                }
            }
        });
    }
}
