//! Terminal output formatting.
//!
//! Status messages go to stderr so that listings on stdout stay pipeable.

pub mod colors;
pub mod errors;

use colors::ColorSupport;
use errors::ErrorFormatter;

/// Output handler for consistent terminal formatting
pub struct OutputHandler {
    colors: ColorSupport,
    warnings: ErrorFormatter,
}

impl OutputHandler {
    pub fn new() -> Self {
        Self::with_colors(ColorSupport::detect())
    }

    pub fn with_colors(colors: ColorSupport) -> Self {
        Self {
            colors,
            warnings: ErrorFormatter::with_colors(colors),
        }
    }

    pub fn colors(&self) -> &ColorSupport {
        &self.colors
    }

    /// Print a line of command output to stdout
    pub fn line(&self, message: &str) {
        println!("{}", message);
    }

    /// Print an info message
    pub fn info(&self, message: &str) {
        eprintln!("{}", self.colors.dim(message));
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        eprintln!("{} {}", self.colors.green("✓"), message);
    }

    /// Print a warning message
    pub fn warn(&self, message: &str) {
        eprintln!("{}", self.warnings.format_warning(message));
    }

    /// Print an error message
    pub fn error(&self, message: &str) {
        eprintln!("{} {}", self.colors.red("✗"), message);
    }
}

impl Default for OutputHandler {
    fn default() -> Self {
        Self::new()
    }
}
