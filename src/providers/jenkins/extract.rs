use std::sync::Arc;

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{CrawlError, Result};
use crate::snapshot::{BuildId, BuildSnapshot, StageLog};

use super::client::JenkinsClient;
use super::links;
use super::types::{BuildDescription, ExecutionDescription, LogRecord, LogSource, StageRef};

/// What a failed fetch does to the snapshot being built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Log the failure and continue with an empty result.
    #[default]
    Degrade,
    /// Continue like `Degrade`, but keep the error message on the affected entry.
    Record,
}

impl FailurePolicy {
    pub fn recorded(self, err: &CrawlError) -> Option<String> {
        match self {
            Self::Degrade => None,
            Self::Record => Some(err.to_string()),
        }
    }
}

/// Walks a build's stages, executions and flow nodes and collects their logs
/// into a single time-ordered snapshot.
///
/// All requests are issued one after another; links are resolved against the
/// scheme and host of `base`.
pub struct Extractor {
    client: Arc<JenkinsClient>,
    base: Url,
    policy: FailurePolicy,
}

impl Extractor {
    pub fn new(client: Arc<JenkinsClient>, base: Url, policy: FailurePolicy) -> Self {
        Self {
            client,
            base,
            policy,
        }
    }

    pub fn policy(&self) -> FailurePolicy {
        self.policy
    }

    /// Builds a snapshot from a freshly fetched build description.
    ///
    /// Stage logs are emitted in stage order (then node order within a stage)
    /// and stable-sorted by start time, so entries that started at the same
    /// millisecond keep their discovery order.
    pub async fn extract(
        &self,
        description: &BuildDescription,
        build_id: &BuildId,
    ) -> BuildSnapshot {
        let mut stages = Vec::new();
        for stage in &description.stages {
            stages.extend(self.extract_stage(stage).await);
        }

        stages.sort_by_key(|stage| stage.start_time);

        debug!(
            "Extracted {} stage logs from {} stages of build {build_id}",
            stages.len(),
            description.stages.len()
        );

        BuildSnapshot {
            status: description.status.clone(),
            name: description.name.clone(),
            id: description.id.clone(),
            build_id: build_id.clone(),
            stages,
            error: None,
        }
    }

    async fn extract_stage(&self, stage: &StageRef) -> Vec<StageLog> {
        let href = stage.links.self_link.href.as_str();

        match self.fetch_execution(href).await {
            Ok(execution) => self.extract_execution(&execution).await,
            Err(e) => {
                warn!("Failed to fetch stage execution {href}: {e}");
                match self.policy.recorded(&e) {
                    None => vec![],
                    Some(error) => vec![StageLog {
                        status: String::new(),
                        name: if stage.name.is_empty() {
                            href.to_string()
                        } else {
                            stage.name.clone()
                        },
                        log_length: 0,
                        log_text: String::new(),
                        start_time: 0,
                        error: Some(error),
                    }],
                }
            }
        }
    }

    async fn extract_execution(&self, execution: &ExecutionDescription) -> Vec<StageLog> {
        match execution.log_source() {
            LogSource::Direct(href) => {
                let name = execution.name.clone();
                let log = self.stage_log(href, name, execution.start_time_millis).await;
                vec![log]
            }
            LogSource::Nodes(nodes) => {
                let mut logs = Vec::new();
                for node in nodes {
                    let Some(href) = node.log_href() else {
                        continue;
                    };
                    let name = format!("{} - {}", execution.name, node.name);
                    logs.push(self.stage_log(href, name, node.start_time_millis).await);
                }
                logs
            }
        }
    }

    async fn stage_log(&self, href: &str, name: String, start_time: i64) -> StageLog {
        let (log, error) = match self.fetch_log(href).await {
            Ok(log) => (log, None),
            Err(e) => {
                warn!("Failed to fetch log for '{name}' from {href}: {e}");
                (LogRecord::default(), self.policy.recorded(&e))
            }
        };

        StageLog {
            status: log.node_status,
            name,
            log_length: log.length,
            log_text: log.text,
            start_time,
            error,
        }
    }

    async fn fetch_execution(&self, href: &str) -> Result<ExecutionDescription> {
        let url = links::resolve(&self.base, href)?;
        self.client.fetch_execution(&url).await
    }

    async fn fetch_log(&self, href: &str) -> Result<LogRecord> {
        let url = links::resolve(&self.base, href)?;
        self.client.fetch_log(&url).await
    }
}
