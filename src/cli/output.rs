/// Terminal output helpers shared by the commands
use colored::*;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Attribute, Cell, Color as TableColor, ContentArrangement, Table};

pub fn section_header_with_line(title: &str) {
    println!("\n{}", title.bold().cyan());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

pub fn subsection_header(title: &str) {
    println!("\n{} {}", "◆".cyan(), title.bold());
}

pub fn warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

pub fn empty(message: &str) {
    println!("{} {}", "◌".dimmed(), message);
}

pub fn tree_item(is_last: bool, label: &str, value: Option<&str>) {
    let prefix = if is_last { "└─" } else { "├─" };
    match value {
        Some(val) => println!("{} {}: {}", prefix.dimmed(), label, val),
        None => println!("{} {}", prefix.dimmed(), label),
    }
}

/// Labelled group of `label: value` lines under one tree branch
pub fn tree_section(title: &str, items: &[(&str, String)], is_last: bool) {
    tree_item(is_last, title, None);
    let continuation = if is_last { "   " } else { "│  " };

    for (i, (label, value)) in items.iter().enumerate() {
        let prefix = if i == items.len() - 1 { "└─" } else { "├─" };
        println!("{}{} {}: {}", continuation.dimmed(), prefix.dimmed(), label, value);
    }
}

pub fn create_standard_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn header_cell(text: &str) -> Cell {
    Cell::new(text).add_attribute(Attribute::Bold).fg(TableColor::Cyan)
}

/// Format a number with thousands separator
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + s.len() / 3);
    for (i, c) in s.chars().enumerate() {
        if i > 0 && (s.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Share of `part` in `total` as a percentage, 0 for an empty total
pub fn percent(part: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64 * 100.0
    }
}
