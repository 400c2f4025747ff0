use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::PathBuf;

use crate::config::Config;
use crate::output::{print_summary, PollProgress};
use crate::providers::jenkins::{start_crawl, FailurePolicy};
use crate::snapshot::BuildId;

#[derive(Parser)]
#[command(name = "wfwatch")]
#[command(author, version, about = "Jenkins pipeline log crawler", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./wfwatch.{toml,json,yaml,yml})
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Suppress the spinner and the final summary
    #[arg(short, long, global = true, default_value_t = false)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll a Jenkins pipeline build until it finishes, saving its stage logs
    Jenkins {
        /// Build page URL (e.g. https://ci.example.com/job/app/42/)
        #[arg(short, long, env = "JENKINS_BUILD_URL")]
        url: String,

        /// Identifier used in the snapshot file name (out_<build>.json)
        #[arg(short, long)]
        build: String,

        /// Directory for the snapshot file
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Seconds between polls of a running build
        #[arg(short, long)]
        interval: Option<u64>,

        /// Per-request timeout in seconds (0 disables it)
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Keep failed fetches visible in the snapshot instead of dropping them
        #[arg(long, default_value_t = false)]
        record_errors: bool,

        /// Keep running after the build finishes, until interrupted
        #[arg(long, default_value_t = false)]
        keep_alive: bool,
    },
}

impl Cli {
    #[allow(clippy::too_many_arguments)]
    async fn execute_jenkins(
        &self,
        url: &str,
        build: &str,
        output_dir: Option<&PathBuf>,
        interval: Option<u64>,
        timeout: Option<u64>,
        record_errors: bool,
        keep_alive: bool,
    ) -> Result<()> {
        let mut config = Config::load(self.config.as_deref())?;

        if let Some(dir) = output_dir {
            config.output.dir = Some(dir.clone());
        }
        if let Some(interval) = interval {
            config.polling.interval_secs = interval;
        }
        if let Some(timeout) = timeout {
            config.jenkins.request_timeout_secs = timeout;
        }
        if record_errors {
            config.polling.failure_policy = FailurePolicy::Record;
        }
        if keep_alive {
            config.polling.stop_on_terminal = false;
        }

        info!("Crawling Jenkins build {build} at {url}");

        let handle = start_crawl(config.to_settings(), url, BuildId::from(build))
            .await
            .with_context(|| format!("Failed to start crawl of {url}"))?;
        let output_path = handle.output_path().to_path_buf();

        let progress =
            (!self.quiet).then(|| PollProgress::start(handle.build_id().as_str(), &output_path));

        let shutdown = handle.cancellation_token();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Interrupted, stopping crawl");
                shutdown.cancel();
            }
        });

        let last = handle.wait().await.context("Crawl stopped unexpectedly")?;

        if let Some(progress) = progress {
            progress.finish(last.as_ref());
        }

        match &last {
            Some(snapshot) if config.output.summary && !self.quiet => {
                print_summary(snapshot, &output_path);
            }
            Some(snapshot) => info!(
                "Build {} ended polling with status '{}'",
                snapshot.build_id, snapshot.status
            ),
            None => warn!("No snapshot was collected for build {build}"),
        }

        Ok(())
    }

    pub async fn execute(&self) -> Result<()> {
        match &self.command {
            Commands::Jenkins {
                url,
                build,
                output_dir,
                interval,
                timeout,
                record_errors,
                keep_alive,
            } => {
                self.execute_jenkins(
                    url,
                    build,
                    output_dir.as_ref(),
                    *interval,
                    *timeout,
                    *record_errors,
                    *keep_alive,
                )
                .await
            }
        }
    }
}
