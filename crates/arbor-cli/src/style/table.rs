//! Tables using comfy-table.

use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color, ContentArrangement, Table};

use super::Paint;

fn table(headings: &[String]) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);

    let header: Vec<Cell> = headings
        .iter()
        .map(|heading| {
            if super::no_color() {
                Cell::new(heading)
            } else {
                Cell::new(heading).add_attribute(Attribute::Bold).fg(Color::Cyan)
            }
        })
        .collect();
    table.set_header(header);
    table
}

pub fn print_table(headings: &[String], rows: &[Vec<String>]) {
    let mut table = table(headings);
    for row in rows {
        table.add_row(row);
    }
    println!("{table}");
}

/// Prints the rows a report recorded, with a title and row count.
pub fn print_report(title: &str, headings: &[String], rows: &[Vec<String>]) {
    println!("{}", title.header());
    if headings.is_empty() {
        println!("{}", "(no columns)".muted());
        return;
    }
    print_table(headings, rows);
    let noun = if rows.len() == 1 { "row" } else { "rows" };
    println!("{}", format!("({} {noun})", rows.len()).muted());
}
