//! CLI output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};

use crate::config::Config;

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Print a table of configured users, password field omitted
pub fn print_user_table(config: &Config) {
    if config.users.is_empty() {
        info("No users configured. Add [[users]] entries to gatehouse.toml");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Id").fg(Color::Cyan),
            Cell::new("User").fg(Color::Cyan),
            Cell::new("Other fields").fg(Color::Cyan),
        ]);

    for user in &config.users {
        let name = user
            .fields
            .get(&config.auth.user_field)
            .cloned()
            .unwrap_or_default();

        let mut extra: Vec<&str> = user
            .fields
            .keys()
            .filter(|k| **k != config.auth.user_field && **k != config.auth.password_field)
            .map(String::as_str)
            .collect();
        extra.sort_unstable();

        table.add_row(vec![
            Cell::new(&user.id),
            Cell::new(name),
            Cell::new(extra.join(", ")),
        ]);
    }

    println!("{table}");
}
