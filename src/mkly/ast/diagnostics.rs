//! Diagnostics produced while parsing and compiling
//!
//!     Nothing that is wrong with a document is a Rust error. Problems are recorded as
//!     [`Diagnostic`] values and processing continues with best-effort output. Only a handful
//!     of conditions are fatal (oversized source, block-count overflow, unsupported version);
//!     those short-circuit and suppress all output.
//!
//! Severities
//!
//!     - Error: the document is invalid. A subset of errors is additionally fatal.
//!     - Warning: recorded, rendering continues unchanged.
//!
//!     Every diagnostic carries the 1-based source line it refers to. Diagnostics that concern a
//!     block also name the block type, and those that concern a property name it.

use serde::Serialize;
use std::fmt;

/// Diagnostic severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
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

/// Structured diagnostic attached to a source line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub message: String,
    pub severity: Severity,
    pub line: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub property: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub fatal: bool,
}

impl Diagnostic {
    pub fn new(severity: Severity, line: usize, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            severity,
            line,
            block_type: None,
            property: None,
            code: None,
            fatal: false,
        }
    }

    pub fn error(line: usize, message: impl Into<String>) -> Self {
        Self::new(Severity::Error, line, message)
    }

    pub fn warning(line: usize, message: impl Into<String>) -> Self {
        Self::new(Severity::Warning, line, message)
    }

    /// A fatal error: the result carrying it has no output.
    pub fn fatal(line: usize, message: impl Into<String>) -> Self {
        let mut diag = Self::error(line, message);
        diag.fatal = true;
        diag
    }

    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    pub fn with_block(mut self, block_type: impl Into<String>) -> Self {
        self.block_type = Some(block_type.into());
        self
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = Some(property.into());
        self
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (line {}): {}", self.severity, self.line, self.message)?;
        if let Some(block_type) = &self.block_type {
            write!(f, " [{}", block_type)?;
            if let Some(property) = &self.property {
                write!(f, ".{}", property)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

/// Count the errors in a diagnostics list.
pub fn error_count(diagnostics: &[Diagnostic]) -> usize {
    diagnostics.iter().filter(|d| d.is_error()).count()
}

/// Whether any diagnostic in the list is fatal.
pub fn has_fatal(diagnostics: &[Diagnostic]) -> bool {
    diagnostics.iter().any(|d| d.fatal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_creation() {
        let diag = Diagnostic::error(3, "Test error")
            .with_code("test-001")
            .with_block("core/text")
            .with_property("color");

        assert_eq!(diag.severity, Severity::Error);
        assert_eq!(diag.message, "Test error");
        assert_eq!(diag.code.as_deref(), Some("test-001"));
        assert!(!diag.fatal);
        assert_eq!(
            diag.to_string(),
            "error (line 3): Test error [core/text.color]"
        );
    }

    #[test]
    fn test_fatal_is_an_error() {
        let diags = vec![
            Diagnostic::warning(1, "careful"),
            Diagnostic::fatal(2, "stop"),
        ];
        assert_eq!(error_count(&diags), 1);
        assert!(has_fatal(&diags));
    }
}
