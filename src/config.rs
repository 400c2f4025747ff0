use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::providers::jenkins::{CrawlSettings, FailurePolicy};

/// Configuration file structure for wfwatch.
///
/// Holds the crawl settings that rarely change between builds, so the
/// command line only needs the build URL and identifier.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Config {
    /// Jenkins HTTP settings
    #[serde(default)]
    pub jenkins: JenkinsConfig,

    /// Re-poll cadence and failure handling
    #[serde(default)]
    pub polling: PollingConfig,

    /// Snapshot location and terminal output
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct JenkinsConfig {
    /// Per-request timeout in seconds (0 disables it)
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollingConfig {
    /// Seconds to wait before re-polling a running build
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Exit once the build reaches a terminal status
    #[serde(default = "default_true")]
    pub stop_on_terminal: bool,

    /// What a failed fetch does to the snapshot
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory for `out_<build>.json` (defaults to the executable's directory)
    pub dir: Option<PathBuf>,

    /// Print a stage table once polling stops
    #[serde(default = "default_true")]
    pub summary: bool,
}

impl Default for JenkinsConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            stop_on_terminal: true,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: None,
            summary: true,
        }
    }
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    format!("wfwatch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_interval_secs() -> u64 {
    5
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Load configuration from a file.
    ///
    /// Searches for configuration files in this order:
    /// 1. Specified path
    /// 2. ./wfwatch.toml
    /// 3. ./wfwatch.json
    /// 4. ./wfwatch.yaml
    /// 5. ./wfwatch.yml
    /// 6. `<user config dir>/wfwatch/config.toml`
    ///
    /// Returns default configuration if no file is found.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(path) = path {
            return Self::load_from_path(path);
        }

        let candidates = [
            "wfwatch.toml",
            "wfwatch.json",
            "wfwatch.yaml",
            "wfwatch.yml",
        ];

        for candidate in &candidates {
            let path = Path::new(candidate);
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        let user_config = dirs::config_dir().map(|dir| dir.join("wfwatch").join("config.toml"));
        if let Some(user_config) = user_config.filter(|path| path.exists()) {
            return Self::load_from_path(&user_config);
        }

        Ok(Self::default())
    }

    /// Load configuration from a specific file path.
    fn load_from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let extension = path.extension().and_then(|ext| ext.to_str()).unwrap_or("");

        match extension {
            "toml" => toml::from_str(&contents)
                .with_context(|| format!("Failed to parse TOML config: {}", path.display())),
            "json" => serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse JSON config: {}", path.display())),
            "yaml" | "yml" => serde_yaml::from_str(&contents)
                .with_context(|| format!("Failed to parse YAML config: {}", path.display())),
            _ => toml::from_str(&contents)
                .or_else(|_| serde_json::from_str(&contents))
                .or_else(|_| serde_yaml::from_str(&contents))
                .with_context(|| format!("Failed to parse config file: {}", path.display())),
        }
    }

    /// Crawl settings derived from this configuration.
    pub fn to_settings(&self) -> CrawlSettings {
        CrawlSettings {
            poll_interval: Duration::from_secs(self.polling.interval_secs),
            request_timeout: (self.jenkins.request_timeout_secs > 0)
                .then(|| Duration::from_secs(self.jenkins.request_timeout_secs)),
            user_agent: self.jenkins.user_agent.clone(),
            failure_policy: self.polling.failure_policy,
            stop_on_terminal: self.polling.stop_on_terminal,
            output_dir: self.output.dir.clone(),
        }
    }
}
