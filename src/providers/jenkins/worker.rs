use std::sync::Arc;

use log::{debug, error, info};
use tokio::sync::mpsc::{Receiver, Sender};
use tokio_util::sync::CancellationToken;
use url::Url;

use crate::snapshot::{BuildId, BuildSnapshot};

use super::client::JenkinsClient;
use super::extract::{Extractor, FailurePolicy};
use super::types::BuildDescription;

/// Crawls one build per received identifier and emits the resulting snapshot.
pub struct CrawlWorker {
    client: Arc<JenkinsClient>,
    describe_url: Url,
    extractor: Extractor,
}

impl CrawlWorker {
    pub fn new(client: Arc<JenkinsClient>, describe_url: Url, policy: FailurePolicy) -> Self {
        let extractor = Extractor::new(Arc::clone(&client), describe_url.clone(), policy);
        Self {
            client,
            describe_url,
            extractor,
        }
    }

    /// Fetches the build description and extracts a snapshot from it.
    ///
    /// A failed `describe` fetch produces a snapshot of an empty description,
    /// whose empty status makes the scheduler poll again.
    pub async fn crawl(&self, build_id: &BuildId) -> BuildSnapshot {
        match self.client.fetch_build(&self.describe_url).await {
            Ok(description) => self.extractor.extract(&description, build_id).await,
            Err(e) => {
                error!(
                    "Failed to fetch build description {}: {e}",
                    self.describe_url
                );
                let mut snapshot = self
                    .extractor
                    .extract(&BuildDescription::default(), build_id)
                    .await;
                snapshot.error = self.extractor.policy().recorded(&e);
                snapshot
            }
        }
    }

    /// Processes identifiers one at a time until shutdown or until either
    /// channel is closed.
    pub async fn run(
        self,
        mut ids: Receiver<BuildId>,
        snapshots: Sender<BuildSnapshot>,
        shutdown: CancellationToken,
    ) {
        loop {
            let build_id = tokio::select! {
                _ = shutdown.cancelled() => break,
                next = ids.recv() => match next {
                    Some(build_id) => build_id,
                    None => break,
                },
            };

            let snapshot = tokio::select! {
                _ = shutdown.cancelled() => break,
                snapshot = self.crawl(&build_id) => snapshot,
            };
            info!(
                "Extracted Jenkins data for build {build_id}: {} stage logs",
                snapshot.stages.len()
            );

            tokio::select! {
                _ = shutdown.cancelled() => break,
                sent = snapshots.send(snapshot) => {
                    if sent.is_err() {
                        debug!("Snapshot receiver closed");
                        break;
                    }
                }
            }
            debug!("Sent snapshot for build {build_id} to scheduler");
        }

        debug!("Crawl worker stopped");
    }
}
