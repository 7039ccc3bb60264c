//! Terminal rendering helpers

use colored::*;
use nirvana_core::ResolvedInputs;

/// Lines of the deployment summary table
///
/// Keys are bold when `styled` is set; padding is computed on plain text.
pub fn summary_table(inputs: &ResolvedInputs, styled: bool) -> Vec<String> {
    let rows = [
        ("Service", inputs.service.as_str()),
        ("Namespace", inputs.namespace.as_str()),
        ("Environment", inputs.environment.as_str()),
        ("Image Tag", inputs.image_tag.as_str()),
    ];

    let key_width = rows.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let value_width = rows.iter().map(|(_, v)| v.chars().count()).max().unwrap_or(0);
    let rule = |left: &str, mid: &str, right: &str| {
        format!(
            "{}{}{}{}{}",
            left,
            "─".repeat(key_width + 2),
            mid,
            "─".repeat(value_width + 2),
            right
        )
    };

    let mut lines = vec![rule("┌", "┬", "┐")];
    for (index, (key, value)) in rows.iter().enumerate() {
        let key_cell = format!("{:<width$}", key, width = key_width);
        let key_cell = if styled {
            key_cell.bold().to_string()
        } else {
            key_cell
        };
        lines.push(format!(
            "│ {} │ {:<width$} │",
            key_cell,
            value,
            width = value_width
        ));
        if index + 1 < rows.len() {
            lines.push(rule("├", "┼", "┤"));
        }
    }
    lines.push(rule("└", "┴", "┘"));
    lines
}

/// Section banner framing attached helm output
pub fn section_banner(title: &str) -> String {
    format!("----- {} -----", title)
}

/// Prints a fatal error with its context chain
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {:#}", "Error:".red().bold(), err);
}
