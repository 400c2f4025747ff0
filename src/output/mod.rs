mod progress;
mod styling;
mod summary;
mod tables;

pub use progress::PollProgress;
use styling::{dim, magenta_bold};
pub use summary::print_summary;

/// Prints the wfwatch banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("🔭 wfwatch"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("Jenkins pipeline log crawler")
    );
}
