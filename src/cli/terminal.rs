//! Terminal capability detection and output helpers.

use owo_colors::{OwoColorize, colors::css};

/// Detects whether colored output should be enabled.
pub fn supports_color() -> bool {
    supports_color::on(supports_color::Stream::Stdout).is_some()
}

/// Shortens a path-like string to fit the terminal width.
///
/// Long paths are truncated from the left so the filename stays visible.
pub fn fit(text: &str) -> String {
    let width = terminal_size::terminal_size().map_or(80, |(w, _)| usize::from(w.0));
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }

    let keep = width.saturating_sub(1);
    let tail: String = text.chars().skip(count - keep).collect();
    format!("…{tail}")
}

/// Extension trait for colorizing output.
pub trait Colorize {
    /// Color as success (green)
    fn success(&self) -> String;
    /// Color as warning (amber)
    fn warning(&self) -> String;
    /// Dim the text
    fn dim(&self) -> String;
}

impl Colorize for str {
    fn success(&self) -> String {
        if supports_color() {
            self.fg::<css::Green>().to_string()
        } else {
            self.to_string()
        }
    }

    fn warning(&self) -> String {
        if supports_color() {
            self.fg::<css::Orange>().to_string()
        } else {
            self.to_string()
        }
    }

    fn dim(&self) -> String {
        if supports_color() {
            self.dimmed().to_string()
        } else {
            self.to_string()
        }
    }
}

impl Colorize for String {
    fn success(&self) -> String {
        self.as_str().success()
    }

    fn warning(&self) -> String {
        self.as_str().warning()
    }

    fn dim(&self) -> String {
        self.as_str().dim()
    }
}

#[cfg(test)]
mod tests {
    use super::fit;

    #[test]
    fn fit_leaves_short_text_alone() {
        assert_eq!(fit("notes/a.md"), "notes/a.md");
    }

    #[test]
    fn fit_truncates_from_the_left() {
        let long = "x".repeat(500) + "/notes/a.md";
        let fitted = fit(&long);
        assert!(fitted.starts_with('…'));
        assert!(fitted.ends_with("/notes/a.md"));
    }
}
