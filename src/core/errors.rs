//! UG-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, GaugeError>;

/// Top-level error type for usage_gauge.
#[derive(Debug, Error)]
pub enum GaugeError {
    #[error("[UG-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[UG-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[UG-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[UG-2001] invalid byte quantity: {details}")]
    InvalidInput { details: String },

    #[error("[UG-2002] byte quantity overflow: {details}")]
    Overflow { details: String },

    #[error("[UG-2101] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[UG-3002] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl GaugeError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "UG-1001",
            Self::MissingConfig { .. } => "UG-1002",
            Self::ConfigParse { .. } => "UG-1003",
            Self::InvalidInput { .. } => "UG-2001",
            Self::Overflow { .. } => "UG-2002",
            Self::Serialization { .. } => "UG-2101",
            Self::Io { .. } => "UG-3002",
        }
    }

    /// Whether the failure came from caller-supplied data rather than the environment.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput { .. }
                | Self::Overflow { .. }
                | Self::InvalidConfig { .. }
                | Self::MissingConfig { .. }
                | Self::ConfigParse { .. }
        )
    }

    /// Convenience constructor for IO errors with a known path.
    #[must_use]
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    /// Convenience constructor for rejected byte-count input.
    #[must_use]
    pub fn invalid_input(details: impl Into<String>) -> Self {
        Self::InvalidInput {
            details: details.into(),
        }
    }
}

impl From<serde_json::Error> for GaugeError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for GaugeError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}
