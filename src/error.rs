//! Structured error types for the packaging pipeline.

use serde::Serialize;
use std::path::{Path, PathBuf};

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Dependency errors
    FetchFailed,

    // Input errors
    ParseFailed,
    InvalidConfig,
    UnknownCommand,

    // Environment errors
    IoError,
    WatchFailed,
}

/// Errors raised by the packaging pipeline.
///
/// Every variant is fatal to the step that produced it. Unresolved
/// placeholders are deliberately not represented here.
#[derive(Debug, thiserror::Error)]
pub enum PackagerError {
    #[error("Unable to fetch dependency {descriptor}: {message}")]
    Fetch { descriptor: String, message: String },

    #[error("Unable to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("File watcher error: {0}")]
    Watch(#[from] notify::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),
}

impl PackagerError {
    /// The programmatic code for this error.
    pub fn code(&self) -> ErrorCode {
        match self {
            PackagerError::Fetch { .. } => ErrorCode::FetchFailed,
            PackagerError::Parse { .. } => ErrorCode::ParseFailed,
            PackagerError::Io { .. } => ErrorCode::IoError,
            PackagerError::Watch(_) => ErrorCode::WatchFailed,
            PackagerError::Config(_) => ErrorCode::InvalidConfig,
            PackagerError::UnknownCommand(_) => ErrorCode::UnknownCommand,
        }
    }

    // Convenience constructors

    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }

    pub fn parse(path: impl AsRef<Path>, err: impl std::fmt::Display) -> Self {
        Self::Parse {
            path: path.as_ref().to_path_buf(),
            message: err.to_string(),
        }
    }

    pub fn fetch(descriptor: impl std::fmt::Display, err: impl std::fmt::Display) -> Self {
        Self::Fetch {
            descriptor: descriptor.to_string(),
            message: err.to_string(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }
}

/// Attach a path to a bare `std::io::Error`.
pub trait IoResultExt<T> {
    fn at_path(self, path: impl AsRef<Path>) -> Result<T>;
}

impl<T> IoResultExt<T> for std::result::Result<T, std::io::Error> {
    fn at_path(self, path: impl AsRef<Path>) -> Result<T> {
        self.map_err(|e| PackagerError::io(path, e))
    }
}

/// Result type for pipeline operations.
pub type Result<T> = std::result::Result<T, PackagerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            PackagerError::fetch("a:b:1", "missing").code(),
            ErrorCode::FetchFailed
        );
        assert_eq!(
            PackagerError::parse("constants.yml", "bad indent").code(),
            ErrorCode::ParseFailed
        );
        assert_eq!(
            PackagerError::config("no server").code(),
            ErrorCode::InvalidConfig
        );
    }

    #[test]
    fn test_messages_name_the_culprit() {
        let err = PackagerError::fetch("org.example:base:1.0", "not found");
        assert_eq!(
            err.to_string(),
            "Unable to fetch dependency org.example:base:1.0: not found"
        );

        let err = PackagerError::io(
            "target/out",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(err.to_string().contains("target/out"));
    }

    #[test]
    fn test_code_serializes_screaming_snake() {
        let json = serde_json::to_string(&ErrorCode::FetchFailed).unwrap();
        assert_eq!(json, "\"FETCH_FAILED\"");
    }

    #[test]
    fn test_at_path() {
        let result: std::result::Result<(), std::io::Error> =
            Err(std::io::Error::new(std::io::ErrorKind::NotFound, "gone"));
        let err = result.at_path("some/file").unwrap_err();
        assert!(matches!(err, PackagerError::Io { ref path, .. } if path == Path::new("some/file")));
    }
}
