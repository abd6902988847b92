//! Styled terminal output for grafana-generate
//!
//! Everything here prints straight to the terminal. Code that needs to be
//! tested goes through [`crate::traits::Output`] instead.

use owo_colors::OwoColorize;

/// Print a success message with a green checkmark
pub fn success(message: &str) {
    // Pastel mint green: RGB(152, 225, 152)
    println!(
        "{} {}",
        "✓".truecolor(152, 225, 152).bold(),
        message.bright_white()
    );
}

/// Print an error message with a red X
pub fn error(message: &str) {
    // Pastel coral/salmon: RGB(255, 160, 160)
    eprintln!(
        "{} {}",
        "✗".truecolor(255, 160, 160).bold(),
        message.bright_white()
    );
}

/// Print a warning message with a yellow warning symbol
pub fn warning(message: &str) {
    // Pastel cream/yellow: RGB(255, 230, 160)
    println!(
        "{} {}",
        "⚠".truecolor(255, 230, 160).bold(),
        message.bright_white()
    );
}

/// Print an info message with a blue info symbol
pub fn info(message: &str) {
    // Pastel sky blue: RGB(160, 200, 255)
    println!(
        "{} {}",
        "ℹ".truecolor(160, 200, 255).bold(),
        message.bright_white()
    );
}

/// Print a section header with a separator line
pub fn section(title: &str) {
    // Pastel lavender: RGB(181, 174, 254)
    println!("\n{}", title.truecolor(181, 174, 254).bold());
    println!("{}", "─".repeat(50).truecolor(160, 160, 160));
}

/// Print a key-value pair with styled key and value
pub fn key_value(key: &str, value: &str) {
    println!(
        "  {} {}",
        format!("{}:", key).truecolor(160, 160, 160),
        value.bright_white()
    );
}

/// Print a dimmed/muted message
pub fn dimmed(message: &str) {
    println!("{}", message.truecolor(160, 160, 160));
}

/// Print the badge announcing which environment a pass targets
pub fn environment_badge(env_name: &str) {
    println!(
        "  {} {}",
        "Environment:".dimmed(),
        env_name.truecolor(152, 225, 152).bold()
    );
}

/// Print a status check result
pub fn status_check(item: &str, available: bool) {
    if available {
        println!(
            "  {} {} {}",
            "✓".truecolor(152, 225, 152).bold(),
            item.bright_white(),
            "available".truecolor(160, 160, 160)
        );
    } else {
        println!(
            "  {} {} {}",
            "✗".truecolor(255, 160, 160).bold(),
            item.bright_white(),
            "not found".truecolor(160, 160, 160)
        );
    }
}
