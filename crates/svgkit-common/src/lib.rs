//! # SvgKit Common
//!
//! Common error types, logging configuration and export parameters shared by the
//! SvgKit crates.
//!
//! ## Features
//!
//! - Unified error type with categories
//! - Logging configuration and setup
//! - Export parameters with a process-wide default

use thiserror::Error;

pub mod config;
pub mod logging;

pub use config::{default_export_params, set_default_export_params, ExportParams};
pub use logging::{init_logging, LogConfig, LogFormat};

/// Unified error type for SvgKit.
#[derive(Error, Debug)]
pub enum SvgKitError {
    /// Configuration errors.
    #[error("Config error: {message}")]
    Config {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// I/O errors.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SvgKitError {
    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
            source: None,
        }
    }

    /// Create a config error with source.
    pub fn config_with_source<E: std::error::Error + Send + Sync + 'static>(
        message: impl Into<String>,
        source: E,
    ) -> Self {
        Self::Config {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Get the error category for diagnostics.
    pub fn category(&self) -> &'static str {
        match self {
            SvgKitError::Config { .. } => "config",
            SvgKitError::Io(_) => "io",
        }
    }
}

/// Result type alias for SvgKit operations.
pub type Result<T> = std::result::Result<T, SvgKitError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_categories() {
        assert_eq!(SvgKitError::config("test").category(), "config");
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert_eq!(SvgKitError::from(io).category(), "io");
    }

    #[test]
    fn test_error_source_is_kept() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk");
        let err = SvgKitError::config_with_source("reading params", io);
        assert!(std::error::Error::source(&err).is_some());
        assert_eq!(err.to_string(), "Config error: reading params");
    }
}
