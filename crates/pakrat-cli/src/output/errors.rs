//! Error message formatting with actionable suggestions.

use super::colors::ColorSupport;
use pakrat_core::error::PakratError;
use std::error::Error;

/// Error formatter with suggestions
pub struct ErrorFormatter {
    colors: ColorSupport,
}

impl ErrorFormatter {
    pub fn new() -> Self {
        Self {
            colors: ColorSupport::detect(),
        }
    }

    pub fn with_colors(colors: ColorSupport) -> Self {
        Self { colors }
    }

    /// Format an error with its location, suggestion and source chain
    pub fn format_error(&self, error: &PakratError) -> String {
        let mut output = String::new();

        output.push_str(&self.colors.red("error"));
        output.push_str(": ");
        output.push_str(&error.to_string());
        output.push('\n');

        if let PakratError::TomlParse { line, column, .. } = error {
            if *line > 0 {
                output.push_str(&self.format_location(*line, *column));
                output.push('\n');
            }
        }

        if let Some(suggestion) = error.suggestion() {
            output.push('\n');
            output.push_str(&self.colors.dim("help"));
            output.push_str(": ");
            output.push_str(suggestion);
            output.push('\n');
        }

        let mut source = error.source();
        while let Some(err) = source {
            output.push('\n');
            output.push_str(&self.colors.dim("caused by"));
            output.push_str(": ");
            output.push_str(&err.to_string());
            source = err.source();
        }

        output
    }

    /// Format a warning message
    pub fn format_warning(&self, message: &str) -> String {
        format!("{}: {}", self.colors.yellow("warning"), message)
    }

    fn format_location(&self, line: usize, column: usize) -> String {
        format!("{} line {}, column {}", self.colors.dim("-->"), line, column)
    }
}

impl Default for ErrorFormatter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn plain() -> ErrorFormatter {
        ErrorFormatter::with_colors(ColorSupport::disabled())
    }

    #[test]
    fn test_format_with_suggestion() {
        let err = PakratError::IndexLocked {
            path: PathBuf::from("/srv/repo/custom.db.lck"),
        };
        let formatted = plain().format_error(&err);

        assert!(formatted.starts_with("error: Repository index is locked"));
        assert!(formatted.contains("help: Another process"));
    }

    #[test]
    fn test_format_source_chain() {
        let err = PakratError::io(
            "Failed to read /srv/repo".to_string(),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "permission denied"),
        );
        let formatted = plain().format_error(&err);
        assert!(formatted.contains("caused by: permission denied"));
    }

    #[test]
    fn test_format_toml_location() {
        let err = PakratError::TomlParse {
            message: "expected `]`".to_string(),
            line: 3,
            column: 9,
        };
        assert!(plain().format_error(&err).contains("--> line 3, column 9"));
    }

    #[test]
    fn test_format_warning() {
        assert_eq!(plain().format_warning("careful"), "warning: careful");
    }
}
