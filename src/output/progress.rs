use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::snapshot::BuildSnapshot;

use super::styling::{bright, bright_green, bright_red, bright_yellow, status};

/// Spinner shown while a build is being polled
pub struct PollProgress {
    pb: ProgressBar,
}

impl PollProgress {
    pub fn start(build_id: &str, output: &std::path::Path) -> Self {
        eprintln!("{}  {}", bright("⚙️"), bright("Polling").underlined());
        let pb = create_spinner(
            bright_yellow(format!(
                "Waiting for build {build_id} to finish (writing {})",
                output.display()
            ))
            .to_string(),
        );
        Self { pb }
    }

    pub fn finish(self, last: Option<&BuildSnapshot>) {
        let message = match last {
            Some(snapshot) if !snapshot.needs_repoll() => {
                bright_green(format!("Build finished: {} ✓", status(&snapshot.status)))
            }
            Some(snapshot) => bright_yellow(format!(
                "Polling stopped while build was {}",
                status(&snapshot.status)
            )),
            None => bright_red("Polling stopped before the first snapshot"),
        };
        self.pb.finish_with_message(message.to_string());
        eprintln!();
    }
}

fn create_spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(ProgressDrawTarget::stderr());
    pb.set_style(
        ProgressStyle::with_template("  {msg} {spinner}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
