use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use log::info;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::{CrawlError, Result};
use crate::snapshot::{BuildId, BuildSnapshot};

use super::client::JenkinsClient;
use super::extract::FailurePolicy;
use super::links;
use super::scheduler::PollScheduler;
use super::store::SnapshotStore;
use super::worker::CrawlWorker;

/// Runtime knobs for a single build crawl.
#[derive(Debug, Clone)]
pub struct CrawlSettings {
    pub poll_interval: Duration,
    pub request_timeout: Option<Duration>,
    pub user_agent: String,
    pub failure_policy: FailurePolicy,
    pub stop_on_terminal: bool,
    /// Directory for `out_<build id>.json`; `None` means next to the executable
    pub output_dir: Option<PathBuf>,
}

impl Default for CrawlSettings {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            request_timeout: Some(Duration::from_secs(30)),
            user_agent: format!("wfwatch/{}", env!("CARGO_PKG_VERSION")),
            failure_policy: FailurePolicy::Degrade,
            stop_on_terminal: true,
            output_dir: None,
        }
    }
}

/// A running crawl: one worker loop and one scheduler loop.
pub struct CrawlHandle {
    build_id: BuildId,
    output_path: PathBuf,
    shutdown: CancellationToken,
    worker: JoinHandle<()>,
    scheduler: JoinHandle<Option<BuildSnapshot>>,
}

impl CrawlHandle {
    pub fn build_id(&self) -> &BuildId {
        &self.build_id
    }

    /// File the scheduler overwrites after every poll.
    pub fn output_path(&self) -> &Path {
        &self.output_path
    }

    /// Token that stops the crawl when cancelled; pending re-polls are dropped.
    ///
    /// Cancelling it from another task (e.g. a Ctrl-C listener) is the way to
    /// end a crawl that would otherwise keep polling.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Waits for both loops to stop and returns the last snapshot written.
    ///
    /// # Errors
    ///
    /// Returns an error if either background task panicked.
    pub async fn wait(self) -> Result<Option<BuildSnapshot>> {
        let last = self.scheduler.await?;
        self.shutdown.cancel();
        self.worker.await?;
        Ok(last)
    }
}

/// Starts polling a build until it reaches a terminal status.
///
/// # Arguments
///
/// * `settings` - Poll cadence, HTTP and output options
/// * `build_url` - Build page URL (e.g., <https://ci.example.com/job/app/42/>)
/// * `build_id` - Identifier used for the output file name
///
/// # Errors
///
/// Returns an error if the build URL is invalid or the HTTP client cannot be built.
pub async fn start_crawl(
    settings: CrawlSettings,
    build_url: &str,
    build_id: BuildId,
) -> Result<CrawlHandle> {
    let describe_url = links::describe_url(build_url)?;
    let client = Arc::new(JenkinsClient::new(
        &settings.user_agent,
        settings.request_timeout,
    )?);

    let store = match &settings.output_dir {
        Some(dir) => SnapshotStore::new(dir),
        None => SnapshotStore::beside_executable(),
    };
    let output_path = store.path_for(&build_id);

    let (ids_tx, ids_rx) = mpsc::channel(1);
    let (snapshots_tx, snapshots_rx) = mpsc::channel(1);
    let shutdown = CancellationToken::new();

    info!(
        "Starting crawl of build {build_id} at {describe_url}, writing to {}",
        output_path.display()
    );

    let worker = CrawlWorker::new(client, describe_url, settings.failure_policy);
    let worker = tokio::spawn(worker.run(ids_rx, snapshots_tx, shutdown.clone()));

    let scheduler = PollScheduler::new(store, settings.poll_interval, settings.stop_on_terminal);
    let scheduler = tokio::spawn(scheduler.run(snapshots_rx, ids_tx.clone(), shutdown.clone()));

    ids_tx
        .send(build_id.clone())
        .await
        .map_err(|_| CrawlError::Config("Crawl worker exited before the first poll".to_string()))?;

    Ok(CrawlHandle {
        build_id,
        output_path,
        shutdown,
        worker,
        scheduler,
    })
}
