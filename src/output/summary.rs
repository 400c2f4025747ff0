use std::fmt::Write;
use std::path::Path;

use chrono::DateTime;
use comfy_table::Cell;

use crate::snapshot::BuildSnapshot;

use super::styling::{bright, bright_red, bright_yellow, cyan, dim, status};
use super::tables::{color_coded_status_cell, create_table, cyan_header};

/// Longest log excerpt shown per stage in the table.
const EXCERPT_CHARS: usize = 60;

/// Prints a human-readable summary of the last snapshot to stdout.
///
/// Shows the build overview followed by one row per stage log, in the same
/// start-time order as the snapshot file.
pub fn print_summary(snapshot: &BuildSnapshot, output_path: &Path) {
    println!("{}", render_summary(snapshot, output_path));
}

fn add_section_header(output: &mut String, emoji: &str, title: &str) {
    let _ = writeln!(output, "{} {}", bright(emoji), bright(title).underlined());
}

fn format_start_time(millis: i64) -> String {
    if millis <= 0 {
        return "-".to_string();
    }
    DateTime::from_timestamp_millis(millis)
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| millis.to_string())
}

/// Last non-empty line of a log, shortened for a table cell.
fn log_excerpt(text: &str) -> String {
    let line = text
        .lines()
        .rev()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .unwrap_or("");

    if line.chars().count() > EXCERPT_CHARS {
        let cut: String = line.chars().take(EXCERPT_CHARS - 1).collect();
        format!("{cut}…")
    } else {
        line.to_string()
    }
}

fn render_summary(snapshot: &BuildSnapshot, output_path: &Path) -> String {
    let mut output = String::new();

    add_section_header(&mut output, "📊", "Overview");
    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}\n  {} {}\n",
        dim("Build:"),
        cyan(format!("{} ({})", snapshot.name, snapshot.build_id)),
        dim("Status:"),
        status(&snapshot.status),
        dim("Stage logs:"),
        bright_yellow(snapshot.stages.len()),
        dim("Snapshot file:"),
        cyan(output_path.display()),
    );

    if let Some(error) = &snapshot.error {
        let _ = writeln!(output, "  {} {}\n", dim("Last error:"), bright_red(error));
    }

    add_section_header(&mut output, "🧱", "Stages");

    if snapshot.stages.is_empty() {
        let _ = writeln!(output, "  {}", dim("No stage logs collected"));
        return output;
    }

    let has_errors = snapshot.stages.iter().any(|stage| stage.error.is_some());
    let mut labels = vec![
        "Started (UTC)",
        "Stage",
        "Status",
        "Log length",
        "Last line",
    ];
    if has_errors {
        labels.push("Error");
    }

    let mut table = create_table();
    table.set_header(cyan_header(&labels));

    for stage in &snapshot.stages {
        let mut row = vec![
            Cell::new(format_start_time(stage.start_time)),
            Cell::new(&stage.name),
            color_coded_status_cell(&stage.status),
            Cell::new(stage.log_length),
            Cell::new(log_excerpt(&stage.log_text)),
        ];
        if has_errors {
            row.push(Cell::new(stage.error.as_deref().unwrap_or("")));
        }
        table.add_row(row);
    }

    let _ = writeln!(output, "{table}");
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::{BuildId, StageLog};

    fn stage(name: &str, start_time: i64, text: &str) -> StageLog {
        StageLog {
            status: "SUCCESS".to_string(),
            name: name.to_string(),
            log_length: text.len() as i64,
            log_text: text.to_string(),
            start_time,
            error: None,
        }
    }

    fn snapshot(stages: Vec<StageLog>) -> BuildSnapshot {
        BuildSnapshot {
            status: "SUCCESS".to_string(),
            name: "app #9".to_string(),
            id: "9".to_string(),
            build_id: BuildId::from("build9"),
            stages,
            error: None,
        }
    }

    #[test]
    fn test_format_start_time() {
        assert_eq!(format_start_time(0), "-");
        assert_eq!(format_start_time(1_700_000_000_000), "2023-11-14 22:13:20");
    }

    #[test]
    fn test_log_excerpt_takes_last_non_empty_line() {
        assert_eq!(
            log_excerpt("cloning\nbuilding\nFinished: SUCCESS\n\n"),
            "Finished: SUCCESS"
        );
        assert_eq!(log_excerpt(""), "");
    }

    #[test]
    fn test_log_excerpt_truncates_long_lines() {
        let excerpt = log_excerpt(&"x".repeat(200));
        assert_eq!(excerpt.chars().count(), EXCERPT_CHARS);
        assert!(excerpt.ends_with('…'));
    }

    #[test]
    fn test_render_summary_empty_stages() {
        let output = render_summary(&snapshot(vec![]), Path::new("out_build9.json"));

        assert!(output.contains("app #9 (build9)"));
        assert!(output.contains("out_build9.json"));
        assert!(output.contains("No stage logs collected"));
    }

    #[test]
    fn test_render_summary_lists_stages_in_order() {
        let output = render_summary(
            &snapshot(vec![
                stage("Build - checkout", 1_700_000_000_000, "done"),
                stage("Test", 1_700_000_060_000, "all green"),
            ]),
            Path::new("out_build9.json"),
        );

        let checkout = output.find("Build - checkout").unwrap();
        let test = output.find("Test").unwrap();
        assert!(checkout < test);
        assert!(output.contains("all green"));
        assert!(!output.contains("Error"));
    }

    #[test]
    fn test_render_summary_shows_errors_column_when_present() {
        let mut failing = stage("Deploy", 5, "");
        failing.error = Some("Jenkins API returned status 404: gone".to_string());

        let output = render_summary(&snapshot(vec![failing]), Path::new("out.json"));

        assert!(output.contains("Error"));
        assert!(output.contains("404"));
    }
}
