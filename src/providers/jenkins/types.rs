use serde::{Deserialize, Serialize};

/// A `{"href": "..."}` object as found under `_links` in `wfapi` responses.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    #[serde(default)]
    pub href: String,
}

/// The `_links` block shared by builds, stages, executions and flow nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Links {
    #[serde(default, rename = "self")]
    pub self_link: Link,
    #[serde(default)]
    pub log: Link,
}

/// Top-level build document returned by `<build>/wfapi/describe`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BuildDescription {
    pub id: String,
    pub name: String,
    /// Build status (e.g. "IN_PROGRESS", "SUCCESS", "FAILED", "ABORTED")
    pub status: String,
    /// Stages in the order Jenkins lists them
    pub stages: Vec<StageRef>,
}

/// A stage entry inside a build description, pointing at its own describe endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StageRef {
    pub name: String,
    #[serde(rename = "_links")]
    pub links: Links,
}

/// Detailed execution record for one stage.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionDescription {
    pub name: String,
    pub start_time_millis: i64,
    #[serde(rename = "_links")]
    pub links: Links,
    pub stage_flow_nodes: Vec<FlowNodeRef>,
}

/// A flow node belonging to an execution without an aggregated log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlowNodeRef {
    pub name: String,
    pub start_time_millis: i64,
    #[serde(rename = "_links")]
    pub links: Links,
}

/// Console log payload returned by a node's `wfapi/log` endpoint.
///
/// `Default` is the zero-valued record used when a fetch fails and the
/// crawl is configured to degrade gracefully.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LogRecord {
    pub node_status: String,
    pub length: i64,
    pub text: String,
}

/// Where an execution's console output lives.
///
/// Jenkins exposes either one aggregated log for the whole execution or a
/// per-flow-node breakdown, and the shape can differ between stages of the
/// same build.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LogSource<'a> {
    /// Aggregated log link on the execution itself
    Direct(&'a str),
    /// No aggregated log; logs hang off the individual flow nodes
    Nodes(&'a [FlowNodeRef]),
}

impl ExecutionDescription {
    /// Resolves the log shape of this execution. A direct log link wins over
    /// any flow nodes that are also present.
    pub fn log_source(&self) -> LogSource<'_> {
        if self.links.log.href.is_empty() {
            LogSource::Nodes(&self.stage_flow_nodes)
        } else {
            LogSource::Direct(&self.links.log.href)
        }
    }
}

impl FlowNodeRef {
    pub fn log_href(&self) -> Option<&str> {
        let href = self.links.log.href.as_str();
        (!href.is_empty()).then_some(href)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_build_description() {
        let json = r##"{
            "_links": {"self": {"href": "/job/app/7/wfapi/describe"}},
            "id": "7",
            "name": "#7",
            "status": "IN_PROGRESS",
            "startTimeMillis": 1700000000000,
            "stages": [
                {"_links": {"self": {"href": "/job/app/7/execution/node/6/wfapi/describe"}},
                 "id": "6", "name": "Build", "status": "SUCCESS"}
            ]
        }"##;

        let description: BuildDescription = serde_json::from_str(json).unwrap();

        assert_eq!(description.id, "7");
        assert_eq!(description.name, "#7");
        assert_eq!(description.status, "IN_PROGRESS");
        assert_eq!(description.stages.len(), 1);
        assert_eq!(
            description.stages[0].links.self_link.href,
            "/job/app/7/execution/node/6/wfapi/describe"
        );
    }

    #[test]
    fn test_decode_tolerates_missing_fields() {
        let description: BuildDescription = serde_json::from_str("{}").unwrap();
        assert_eq!(description.status, "");
        assert!(description.stages.is_empty());

        let execution: ExecutionDescription = serde_json::from_str(r#"{"name": "Test"}"#).unwrap();
        assert_eq!(execution.name, "Test");
        assert_eq!(execution.start_time_millis, 0);
        assert!(execution.stage_flow_nodes.is_empty());
    }

    #[test]
    fn test_decode_log_record() {
        let json = r#"{
            "nodeId": "8",
            "nodeStatus": "SUCCESS",
            "length": 3,
            "hasMore": false,
            "text": "abc",
            "consoleUrl": "/x"
        }"#;
        let log: LogRecord = serde_json::from_str(json).unwrap();
        assert_eq!(
            log,
            LogRecord {
                node_status: "SUCCESS".to_string(),
                length: 3,
                text: "abc".to_string(),
            }
        );
    }

    #[test]
    fn test_log_source_direct_takes_precedence() {
        let execution: ExecutionDescription = serde_json::from_str(
            r#"{
                "name": "Build",
                "_links": {"log": {"href": "/job/app/7/execution/node/6/wfapi/log"}},
                "stageFlowNodes": [{"name": "sh", "_links": {"log": {"href": "/n/7/log"}}}]
            }"#,
        )
        .unwrap();

        assert_eq!(
            execution.log_source(),
            LogSource::Direct("/job/app/7/execution/node/6/wfapi/log")
        );
    }

    #[test]
    fn test_log_source_nodes_without_direct_link() {
        let execution: ExecutionDescription = serde_json::from_str(
            r#"{"name": "Build", "stageFlowNodes": [{"name": "sh"}, {"name": "echo"}]}"#,
        )
        .unwrap();

        match execution.log_source() {
            LogSource::Nodes(nodes) => {
                assert_eq!(nodes.len(), 2);
                assert!(nodes.iter().all(|n| n.log_href().is_none()));
            }
            LogSource::Direct(href) => panic!("unexpected direct log link {href}"),
        }
    }
}
