//! Application error types with rich context

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::version::{MinimumVersion, VersionTriple};

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    // ─────────────────────────────────────────────────────────────
    // Emulator Process Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to launch storage emulator at {path}: {reason}")]
    LaunchFailure { path: PathBuf, reason: String },

    #[error("Unexpected emulator status output: {message}")]
    ParseFailure { message: String },

    #[error("Storage emulator failed to start: {message}")]
    StartFailure { message: String },

    #[error("Storage emulator failed to stop: {message}")]
    StopFailure { message: String },

    #[error("Storage emulator did not finish '{command}' within {waited:?}")]
    Timeout { command: String, waited: Duration },

    #[error("Could not read version info from {path}: {reason}")]
    VersionProbe { path: PathBuf, reason: String },

    #[error("Storage emulator {required} or later is required (installed: {installed})")]
    RequirementsNotMet {
        installed: VersionTriple,
        required: MinimumVersion,
    },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ─────────────────────────────────────────────────────────────
    // Storage Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid resource name '{name}': {reason}")]
    InvalidResourceName { name: String, reason: String },

    #[error("Storage request error: {message}")]
    Storage { message: String },

    #[error("Storage request for {resource} failed with HTTP {status}")]
    StorageStatus { status: u16, resource: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn launch_failure(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::LaunchFailure {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::ParseFailure {
            message: message.into(),
        }
    }

    pub fn start_failure(message: impl Into<String>) -> Self {
        Self::StartFailure {
            message: message.into(),
        }
    }

    pub fn stop_failure(message: impl Into<String>) -> Self {
        Self::StopFailure {
            message: message.into(),
        }
    }

    pub fn timeout(command: impl Into<String>, waited: Duration) -> Self {
        Self::Timeout {
            command: command.into(),
            waited,
        }
    }

    pub fn version_probe(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::VersionProbe {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn requirements_not_met(installed: VersionTriple, required: MinimumVersion) -> Self {
        Self::RequirementsNotMet {
            installed,
            required,
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    pub fn invalid_resource_name(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResourceName {
            name: name.into(),
            reason: reason.into(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    pub fn storage_status(status: u16, resource: impl Into<String>) -> Self {
        Self::StorageStatus {
            status,
            resource: resource.into(),
        }
    }

    /// Check if this is a recoverable error
    ///
    /// Recoverable errors affect a single resource or a diagnostic probe and
    /// never abort a sweep.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Error::VersionProbe { .. }
                | Error::InvalidResourceName { .. }
                | Error::Storage { .. }
                | Error::StorageStatus { .. }
        )
    }

    /// Check if this error should abort the workflow before any deletion
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::LaunchFailure { .. }
                | Error::ParseFailure { .. }
                | Error::StartFailure { .. }
                | Error::StopFailure { .. }
                | Error::Timeout { .. }
                | Error::RequirementsNotMet { .. }
                | Error::Config { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;

    /// Add context with a closure (lazy evaluation)
    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }

    fn with_context<F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", f(), err);
            err
        })
    }
}
