use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn color_coded_status_cell(status: &str) -> Cell {
    match status {
        "SUCCESS" => Cell::new(status).fg(TableColor::Green),
        "FAILED" | "FAILURE" | "ABORTED" => Cell::new(status).fg(TableColor::Red),
        "" => Cell::new("-").fg(TableColor::DarkGrey),
        _ => Cell::new(status).fg(TableColor::Yellow),
    }
}
