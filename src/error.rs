//! Error types for plughost
//!
//! This module defines the error types used by the plugin subsystem. Uses
//! `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.
//!
//! Dispatch code must be able to tell "there is no such plugin" apart from
//! every other failure, including when the error has been wrapped by a
//! caller. That question is answered by [`is_not_found`], which walks the
//! `source()` chain instead of relying on the concrete outer type.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::plugins::PluginError;

/// The primary error type for plughost operations.
#[derive(Error, Debug)]
pub enum HostError {
    /// Configuration-related errors (unreadable or malformed config.json, etc.)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A candidate that cannot be considered as a plugin at all
    /// (empty path, wrong prefix, missing executable suffix).
    #[error("{0}")]
    InvalidCandidate(String),

    /// The metadata subcommand ran but did not succeed.
    #[error("{0}")]
    MetadataCommand(String),

    /// The metadata subcommand did not finish within the allowed time.
    #[error("timed out after {}s waiting for plugin metadata", .0.as_secs())]
    MetadataTimeout(Duration),

    /// No plugin with the requested name exists in any plugin directory.
    #[error("no such CLI plugin: {0}")]
    NotFound(String),

    /// A plugin with the requested name exists but failed validation.
    #[error("CLI plugin {name:?} is not valid")]
    Invalid {
        name: String,
        #[source]
        source: PluginError,
    },

    /// A catalog already holds a plugin with this name.
    #[error("plugin {name:?} from {} is already registered from {}", .path.display(), .existing.display())]
    AlreadyRegistered {
        name: String,
        path: PathBuf,
        existing: PathBuf,
    },

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HostError {
    /// Whether this error (or anything it wraps) means "no such plugin".
    pub fn is_not_found(&self) -> bool {
        is_not_found(self)
    }
}

/// Reports whether `err` means "no such plugin".
///
/// The whole `source()` chain is inspected, so a `HostError::NotFound` that has
/// been wrapped (for example with `anyhow::Context`) is still recognized.
/// Callers use this to decide whether to fall back to the generic
/// "unknown command" handling.
pub fn is_not_found(err: &(dyn std::error::Error + 'static)) -> bool {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(HostError::NotFound(_)) = e.downcast_ref::<HostError>() {
            return true;
        }
        current = e.source();
    }
    false
}

/// A specialized `Result` type for plughost operations.
pub type Result<T> = std::result::Result<T, HostError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[derive(Debug, Error)]
    #[error("dispatch failed")]
    struct Wrapper(#[source] HostError);

    #[test]
    fn test_error_display() {
        let err = HostError::Config("bad json".to_string());
        assert_eq!(err.to_string(), "Configuration error: bad json");

        let err = HostError::NotFound("hello".to_string());
        assert_eq!(err.to_string(), "no such CLI plugin: hello");

        let err = HostError::MetadataTimeout(Duration::from_secs(10));
        assert!(err.to_string().contains("timed out after 10s"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: HostError = io_err.into();
        assert!(matches!(err, HostError::Io(_)));
        // An io NotFound is not a missing plugin.
        assert!(!err.is_not_found());
    }

    #[test]
    fn test_is_not_found_direct() {
        let err = HostError::NotFound("x".into());
        assert!(err.is_not_found());
        assert!(is_not_found(&err));
    }

    #[test]
    fn test_is_not_found_other_variants() {
        assert!(!HostError::Config("x".into()).is_not_found());
        assert!(!HostError::InvalidCandidate("x".into()).is_not_found());
        let invalid = HostError::Invalid {
            name: "x".into(),
            source: PluginError::new("broken"),
        };
        assert!(!invalid.is_not_found());
    }

    #[test]
    fn test_is_not_found_through_wrapper() {
        let err = Wrapper(HostError::NotFound("x".into()));
        assert!(is_not_found(&err));

        let err = Wrapper(HostError::Config("x".into()));
        assert!(!is_not_found(&err));
    }

    #[test]
    fn test_is_not_found_through_anyhow_context() {
        let result: std::result::Result<(), HostError> = Err(HostError::NotFound("x".into()));
        let err = result.context("running plugin").unwrap_err();
        assert!(is_not_found(err.as_ref()));

        let err = anyhow::Error::new(HostError::Config("x".into())).context("outer");
        assert!(!is_not_found(err.as_ref()));
    }

    #[test]
    fn test_invalid_exposes_plugin_error_as_source() {
        let err = HostError::Invalid {
            name: "hello".into(),
            source: PluginError::new("plugin metadata does not define a vendor"),
        };
        assert_eq!(err.to_string(), "CLI plugin \"hello\" is not valid");
        let source = std::error::Error::source(&err).unwrap();
        assert!(source.downcast_ref::<PluginError>().is_some());
        assert_eq!(source.to_string(), "plugin metadata does not define a vendor");
    }

    #[test]
    fn test_invalid_reason_reported_once_through_anyhow() {
        let err = anyhow::Error::new(HostError::Invalid {
            name: "bad".into(),
            source: PluginError::new("plugin SchemaVersion \"\" is not valid"),
        });
        let report = format!("{:?}", err);
        assert_eq!(report.matches("SchemaVersion").count(), 1, "{report}");
        assert!(report.starts_with("CLI plugin \"bad\" is not valid"), "{report}");
        assert_eq!(
            format!("{:#}", err),
            "CLI plugin \"bad\" is not valid: plugin SchemaVersion \"\" is not valid"
        );
    }
}
