//! Infrastructure errors
//!
//!     Problems in a document are [`Diagnostic`](crate::mkly::ast::Diagnostic)s on the parse or
//!     compile result and never surface here. [`MklyError`] covers what can fail around a
//!     compile: reading files, loading configuration, reading supplier files and writing
//!     structured output.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MklyError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A `key=value` command-line variable without the `=`.
    #[error("invalid variable '{0}', expected key=value")]
    InvalidVariable(String),

    #[error("unknown output format '{0}'")]
    UnknownFormat(String),
}

pub type MklyResult<T> = Result<T, MklyError>;

/// Split a `key=value` variable assignment.
pub fn parse_variable(assignment: &str) -> MklyResult<(String, String)> {
    match assignment.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(MklyError::InvalidVariable(assignment.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_variable() {
        let (key, value) = parse_variable("accent=#e11d48").expect("valid assignment");
        assert_eq!(key, "accent");
        assert_eq!(value, "#e11d48");
        assert!(matches!(
            parse_variable("accent"),
            Err(MklyError::InvalidVariable(_))
        ));
        assert!(parse_variable("=red").is_err());
    }

    #[test]
    fn test_errors_convert_and_display() {
        let err: MklyError = std::io::Error::new(std::io::ErrorKind::NotFound, "gone").into();
        assert_eq!(err.to_string(), "I/O error: gone");
        assert_eq!(
            MklyError::UnknownFormat("xml".to_string()).to_string(),
            "unknown output format 'xml'"
        );
    }
}
