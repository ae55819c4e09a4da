//! Terminal output formatting for the CLI's own messages.

use std::path::Path;

use console::style;

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", style("✗").red().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    eprintln!("{} {}", style("ℹ").blue().bold(), message);
}

/// Prints a list item.
pub fn list_item(text: &str) {
    eprintln!("  {} {}", style("•").dim(), text);
}

/// Lists the locations a session will search.
pub fn locations<'a>(origin: &str, paths: impl Iterator<Item = &'a Path>) {
    info(&format!("Searching for commands ({})", origin));
    for path in paths {
        list_item(&path.display().to_string());
    }
}
