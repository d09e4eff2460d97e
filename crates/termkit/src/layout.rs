//! Headers, sections and aligned key-value output

use colored::Colorize;

/// Print a header/title with an underline
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print a step indicator, e.g. `[2/5] ssh`
pub fn step(num: usize, total: usize, msg: &str) {
    println!("{} {}", step_label(num, total).blue().bold(), msg);
}

/// The `[n/total]` label used by [`step`], padded to the width of `total`
pub fn step_label(num: usize, total: usize) -> String {
    let width = total.to_string().len();
    format!("[{num:>width$}/{total}]")
}
