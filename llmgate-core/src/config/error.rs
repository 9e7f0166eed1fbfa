//! Configuration errors
//!
//! Loading fails in one of three places: reading the file, parsing it, or
//! validating the parsed values. Validation errors carry the dotted path of
//! the offending field so a bad `endpoints.openai_url` is easy to find.

use std::fmt;
use thiserror::Error;

/// Why a configuration could not be loaded
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read gateway config '{path}': {source}")]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot parse {format} config '{path}' at line {}, column {}: {message}",
            .line.unwrap_or(0), .column.unwrap_or(0))]
    ParseError {
        path: String,
        format: &'static str,
        line: Option<usize>,
        column: Option<usize>,
        message: String,
    },

    #[error("Invalid gateway config: {0}")]
    ValidationError(#[from] ValidationError),

    #[error("Environment variable '{var}' referenced by the config is not set")]
    EnvVarNotFound { var: String },

    #[error("Bad interpolation pattern: {message}")]
    Interpolation { message: String },
}

/// A single rejected field
#[derive(Debug, Clone, PartialEq, Error)]
pub struct ValidationError {
    /// Dotted path, e.g. `retry.backoff_multiplier`
    pub field_path: String,
    pub kind: ValidationErrorKind,
    pub context: Option<String>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field_path, self.kind)?;
        if let Some(context) = &self.context {
            write!(f, " ({})", context)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationErrorKind {
    #[error("must be set")]
    RequiredFieldMissing,

    #[error("expected {expected}, got {actual}")]
    InvalidValue { expected: String, actual: String },

    #[error("{message}")]
    OutOfRange { message: String },

    #[error("not a valid URL: {message}")]
    InvalidUrl { message: String },

    #[error("unsupported config version {actual} (this build reads {expected})")]
    InvalidVersion { expected: String, actual: String },
}

impl ValidationError {
    pub fn new(field_path: impl Into<String>, kind: ValidationErrorKind) -> Self {
        Self {
            field_path: field_path.into(),
            kind,
            context: None,
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn required(field_path: impl Into<String>) -> Self {
        Self::new(field_path, ValidationErrorKind::RequiredFieldMissing)
    }

    pub fn invalid_value(
        field_path: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::InvalidValue {
                expected: expected.into(),
                actual: actual.into(),
            },
        )
    }

    pub fn out_of_range(field_path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::OutOfRange {
                message: message.into(),
            },
        )
    }

    pub fn invalid_url(field_path: impl Into<String>, url: &str, reason: impl fmt::Display) -> Self {
        Self::new(
            field_path,
            ValidationErrorKind::InvalidUrl {
                message: format!("{}: {}", url, reason),
            },
        )
    }
}

pub type ConfigResult<T> = Result<T, ConfigError>;
