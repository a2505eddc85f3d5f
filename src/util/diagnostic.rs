//! User-facing diagnostic messages.
//!
//! Specification errors are detected deep inside resolution but read by
//! whoever wrote the package declaration. A Diagnostic carries the
//! primary message plus the context and suggested fixes that make the
//! error actionable.

use std::fmt;

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
        }
    }
}

/// A diagnostic message with context lines and suggested fixes.
#[derive(Debug, Clone)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    /// Add a context line.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggested fix.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Render the diagnostic as text, optionally with ANSI color.
    pub fn format(&self, color: bool) -> String {
        let mut out = String::new();

        if color {
            let code = match self.severity {
                Severity::Error => "\x1b[31m",
                Severity::Warning => "\x1b[33m",
            };
            out.push_str(&format!("{}{}\x1b[0m: {}\n", code, self.severity, self.message));
        } else {
            out.push_str(&format!("{}: {}\n", self.severity, self.message));
        }

        for line in &self.context {
            out.push_str(&format!("  note: {}\n", line));
        }

        for suggestion in &self.suggestions {
            out.push_str(&format!("  help: {}\n", suggestion));
        }

        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.format(false))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_plain() {
        let diag = Diagnostic::error("flag `ssl` is not declared")
            .with_context("referenced by the dependency map of `curl`")
            .with_suggestion("add `ssl` to iuse in curl's package.toml");

        let text = diag.format(false);
        assert!(text.starts_with("error: flag `ssl` is not declared"));
        assert!(text.contains("note: referenced by the dependency map"));
        assert!(text.contains("help: add `ssl` to iuse"));
    }

    #[test]
    fn test_warning_severity() {
        let diag = Diagnostic::warning("override for unknown flag ignored");
        assert_eq!(diag.severity, Severity::Warning);
        assert!(diag.format(false).starts_with("warning:"));
    }
}
