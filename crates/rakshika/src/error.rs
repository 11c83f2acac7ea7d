//! Error types for rakshika.
//!
//! This module defines the error type shared by every part of the crate.
//! Display strings double as the text shown to the user, so they are
//! written as plain sentences.

use std::path::PathBuf;
use thiserror::Error;

use crate::handoff::HandoffError;
use crate::location::GeolocationError;

/// The main error type for rakshika operations.
#[derive(Error, Debug)]
pub enum Error {
    // === Storage Errors ===
    /// Failed to open or create the database.
    #[error("failed to open database at {path}: {source}")]
    DatabaseOpen {
        /// Path to the database file.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: rusqlite::Error,
    },

    /// A database query failed.
    #[error("database query failed: {0}")]
    DatabaseQuery(#[from] rusqlite::Error),

    /// Failed to run database migrations.
    #[error("database migration failed: {message}")]
    DatabaseMigration {
        /// Description of what went wrong.
        message: String,
    },

    // === Configuration Errors ===
    /// Failed to load configuration.
    #[error("failed to load configuration: {0}")]
    ConfigLoad(Box<figment::Error>),

    /// Configuration validation failed.
    #[error("invalid configuration: {message}")]
    ConfigValidation {
        /// Description of the validation failure.
        message: String,
    },

    // === Input Errors ===
    /// User input was rejected; the operation made no change.
    #[error("{message}")]
    Validation {
        /// Message suitable for showing to the user.
        message: String,
    },

    /// The operation needs a signed-in account.
    #[error("no account configured: {operation} requires a user id")]
    NotAuthenticated {
        /// The operation that was attempted.
        operation: &'static str,
    },

    // === Device Errors ===
    /// A position could not be obtained.
    #[error("geolocation failed: {0}")]
    Geolocation(#[from] GeolocationError),

    /// A hand-off channel failed.
    #[error("hand-off failed: {0}")]
    Handoff(#[from] HandoffError),

    /// A desktop host primitive failed.
    #[error("host error: {0}")]
    Desktop(#[from] rakshika_desktop::DesktopError),

    // === State Errors ===
    /// An SOS dispatch is already running.
    #[error("an SOS alert is already in progress")]
    SosAlreadyActive,

    /// A live location session is already running.
    #[error("location sharing is already active")]
    SharingAlreadyActive,

    // === I/O Errors ===
    /// File system operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Failed to create a required directory.
    #[error("failed to create directory {path}: {source}")]
    DirectoryCreate {
        /// Path that couldn't be created.
        path: PathBuf,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },

    // === Serialization Errors ===
    /// JSON serialization/deserialization failed.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // === Generic Errors ===
    /// An internal error occurred (bug).
    #[error("internal error: {0}")]
    Internal(String),
}

/// A specialized Result type for rakshika operations.
pub type Result<T> = std::result::Result<T, Error>;

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::ConfigLoad(Box::new(err))
    }
}

impl Error {
    /// Create a validation error with a user-facing message.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this error is a rejected user input.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }

    /// Check if this error means a session or dispatch is already running.
    #[must_use]
    pub fn is_already_active(&self) -> bool {
        matches!(self, Self::SosAlreadyActive | Self::SharingAlreadyActive)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_display_is_message() {
        let err = Error::validation("Please enter both name and phone number");
        assert_eq!(err.to_string(), "Please enter both name and phone number");
        assert!(err.is_validation());
    }

    #[test]
    fn test_already_active() {
        assert!(Error::SosAlreadyActive.is_already_active());
        assert!(Error::SharingAlreadyActive.is_already_active());
        assert!(!Error::internal("x").is_already_active());
    }

    #[test]
    fn test_internal_error() {
        let err = Error::internal("something went wrong");
        assert_eq!(err.to_string(), "internal error: something went wrong");
    }

    #[test]
    fn test_not_authenticated_display() {
        let err = Error::NotAuthenticated {
            operation: "dashboard",
        };
        assert!(err.to_string().contains("dashboard"));
    }

    #[test]
    fn test_from_geolocation_error() {
        let err: Error = GeolocationError::Timeout.into();
        assert!(matches!(err, Error::Geolocation(GeolocationError::Timeout)));
        assert!(err.to_string().contains("timed out"));
    }

    #[test]
    fn test_from_handoff_error() {
        let err: Error = HandoffError::Unsupported("share").into();
        assert!(matches!(err, Error::Handoff(_)));
        assert!(err.to_string().contains("share"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_rusqlite_error() {
        let result = rusqlite::Connection::open_with_flags(
            "/nonexistent/path/db.sqlite",
            rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
        );
        if let Err(sqlite_err) = result {
            let err: Error = sqlite_err.into();
            assert!(matches!(err, Error::DatabaseQuery(_)));
        }
    }

    #[test]
    fn test_from_json_error() {
        let json_result: std::result::Result<i32, serde_json::Error> =
            serde_json::from_str("not valid json");
        if let Err(json_err) = json_result {
            let err: Error = json_err.into();
            assert!(matches!(err, Error::Json(_)));
        }
    }

    #[test]
    fn test_directory_create_error_display() {
        let io_err = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "access denied");
        let err = Error::DirectoryCreate {
            path: PathBuf::from("/root/forbidden"),
            source: io_err,
        };
        assert!(err.to_string().contains("/root/forbidden"));
    }

    #[test]
    fn test_config_validation_error_display() {
        let err = Error::ConfigValidation {
            message: "min_minutes must be positive".to_string(),
        };
        assert!(err.to_string().contains("min_minutes"));
    }
}
