//! Terminal styling helpers

use indicatif::ProgressStyle;
use owo_colors::{OwoColorize, Stream};
use std::fmt::Display;

/// Check mark used in success lines
pub const CHECK: &str = "✓";

/// Color helpers that respect whether stdout supports color
pub trait Stylize: Display {
    /// Bold
    fn emphasis(&self) -> String {
        self.to_string()
            .if_supports_color(Stream::Stdout, |t| t.bold())
            .to_string()
    }

    /// Dimmed
    fn muted(&self) -> String {
        self.to_string()
            .if_supports_color(Stream::Stdout, |t| t.dimmed())
            .to_string()
    }

    /// Cyan
    fn accent(&self) -> String {
        self.to_string()
            .if_supports_color(Stream::Stdout, |t| t.cyan())
            .to_string()
    }

    /// Green
    fn success(&self) -> String {
        self.to_string()
            .if_supports_color(Stream::Stdout, |t| t.green())
            .to_string()
    }

    /// Yellow
    fn warning(&self) -> String {
        self.to_string()
            .if_supports_color(Stream::Stdout, |t| t.yellow())
            .to_string()
    }
}

impl<T: Display + ?Sized> Stylize for T {}

/// Green check mark
pub fn check() -> String {
    CHECK.success()
}

/// Spinner used while git runs
pub fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner().tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
}
