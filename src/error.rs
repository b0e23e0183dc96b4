//! Error types for telemetry decoding.
//!
//! Every fallible operation in the crate returns [`TelemetryError`]. The
//! variants map onto the failure classes a caller has to tell apart:
//!
//! - **MalformedHeader**: the header or variable directory is inconsistent with
//!   the buffer it came from. Fatal to that connect/open attempt.
//! - **NotInitialized**: the client was used before a successful start or
//!   after shutdown.
//! - **UnknownVariable**: the requested name is not in the directory.
//! - **NoDataAvailable**: a bounded wait for fresh data expired.
//! - **IndexOutOfRange**: a disk record index past the record count.
//!
//! Session-info decode failures are never reported through this type; the
//! cache degrades to the last good value instead.
//!
//! ```rust
//! use pitlane::TelemetryError;
//! use std::time::Duration;
//!
//! let error = TelemetryError::no_data(Duration::from_millis(32));
//! if error.is_retryable() {
//!     for suggestion in error.recovery_suggestions() {
//!         println!("  - {}", suggestion);
//!     }
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[cfg(windows)]
use windows_core as core;

/// Result type alias for telemetry operations.
pub type Result<T, E = TelemetryError> = std::result::Result<T, E>;

/// Main error type for telemetry operations.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum TelemetryError {
    #[error("Malformed header: {reason}")]
    MalformedHeader { reason: String },

    #[error("Client is not initialized")]
    NotInitialized,

    #[error("Variable '{name}' not found in variable directory")]
    UnknownVariable { name: String },

    #[error("No fresh data available after {waited:?}")]
    NoDataAvailable { waited: Duration },

    #[error("Index {index} out of range (length {len})")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Failed to connect to telemetry source: {reason}")]
    Connection {
        reason: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Telemetry file error: {path}")]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Memory access violation at offset {offset:#x}")]
    Memory { offset: usize },

    #[error("Parse error in {context}: {details}")]
    Parse { context: String, details: String },

    #[error("Type conversion error: {details}")]
    TypeConversion { details: String },

    #[error("{feature} is only available on {required_platform}")]
    UnsupportedPlatform { feature: String, required_platform: String },

    #[error("Windows API error: {operation}")]
    #[cfg(windows)]
    WindowsApi {
        operation: String,
        #[source]
        source: core::Error,
    },
}

impl TelemetryError {
    /// Returns whether this error is potentially recoverable through retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            TelemetryError::MalformedHeader { .. } => true,
            TelemetryError::NoDataAvailable { .. } => true,
            TelemetryError::Connection { .. } => true,
            TelemetryError::NotInitialized => false,
            TelemetryError::UnknownVariable { .. } => false,
            TelemetryError::IndexOutOfRange { .. } => false,
            TelemetryError::File { .. } => false,
            TelemetryError::Memory { .. } => false,
            TelemetryError::Parse { .. } => false,
            TelemetryError::TypeConversion { .. } => false,
            TelemetryError::UnsupportedPlatform { .. } => false,
            #[cfg(windows)]
            TelemetryError::WindowsApi { .. } => true,
        }
    }

    /// Returns suggested recovery actions for this error.
    pub fn recovery_suggestions(&self) -> Vec<&'static str> {
        match self {
            TelemetryError::MalformedHeader { .. } => vec![
                "Retry once the simulator has finished writing the header",
                "Verify the file is a complete telemetry recording",
                "Check the SDK version written by the simulator",
            ],
            TelemetryError::NotInitialized => vec![
                "Call startup() or open() before reading",
                "Do not reuse a client after shutdown()",
            ],
            TelemetryError::UnknownVariable { .. } => vec![
                "Check variable name spelling",
                "List available names with variable_names()",
                "Verify the variable exists for the current car",
            ],
            TelemetryError::NoDataAvailable { .. } => vec![
                "Retry the read on the next poll cycle",
                "Increase data_ready_timeout_ms",
                "Verify the simulator is running a session",
            ],
            TelemetryError::IndexOutOfRange { .. } => vec![
                "Check record_count() before indexing",
                "Use the record cursor for sequential access",
            ],
            TelemetryError::Connection { .. } => vec![
                "Ensure the simulator is running",
                "Check Windows permissions for shared memory access",
                "Try connecting again later",
            ],
            TelemetryError::File { .. } => vec![
                "Check file exists and is readable",
                "Check file permissions",
            ],
            TelemetryError::Memory { .. } => vec![
                "Check memory access bounds",
                "Verify shared memory is still valid",
            ],
            TelemetryError::Parse { .. } => vec![
                "Check data format compatibility",
                "Verify source data integrity",
            ],
            TelemetryError::TypeConversion { .. } => vec![
                "Check the declared variable type",
                "Read the value as an untyped Value instead",
            ],
            TelemetryError::UnsupportedPlatform { .. } => vec![
                "Open a recorded telemetry file instead",
                "Use a test file image for cross-platform testing",
            ],
            #[cfg(windows)]
            TelemetryError::WindowsApi { .. } => vec![
                "Check Windows API permissions",
                "Verify system resources availability",
            ],
        }
    }

    /// Helper constructor for header and directory consistency failures.
    pub fn malformed_header(reason: impl Into<String>) -> Self {
        TelemetryError::MalformedHeader { reason: reason.into() }
    }

    /// Helper constructor for unknown variable lookups.
    pub fn unknown_variable(name: impl Into<String>) -> Self {
        TelemetryError::UnknownVariable { name: name.into() }
    }

    /// Helper constructor for expired data-ready waits.
    pub fn no_data(waited: Duration) -> Self {
        TelemetryError::NoDataAvailable { waited }
    }

    /// Helper constructor for file errors with path context.
    pub fn file_error(path: PathBuf, source: std::io::Error) -> Self {
        TelemetryError::File { path, source }
    }

    /// Helper constructor for connection errors.
    pub fn connection_failed(reason: impl Into<String>) -> Self {
        TelemetryError::Connection { reason: reason.into(), source: None }
    }

    /// Helper constructor for connection errors with source.
    pub fn connection_failed_with_source(
        reason: impl Into<String>,
        source: Box<dyn std::error::Error + Send + Sync>,
    ) -> Self {
        TelemetryError::Connection { reason: reason.into(), source: Some(source) }
    }

    /// Helper constructor for memory access errors.
    pub fn memory_access_error(offset: usize) -> Self {
        TelemetryError::Memory { offset }
    }

    /// Helper constructor for Windows API errors.
    #[cfg(windows)]
    pub fn windows_api_error(operation: impl Into<String>, source: core::Error) -> Self {
        TelemetryError::WindowsApi { operation: operation.into(), source }
    }

    /// Helper constructor for unsupported platform errors.
    pub fn unsupported_platform(
        feature: impl Into<String>,
        required_platform: impl Into<String>,
    ) -> Self {
        TelemetryError::UnsupportedPlatform {
            feature: feature.into(),
            required_platform: required_platform.into(),
        }
    }
}

impl From<std::io::Error> for TelemetryError {
    fn from(err: std::io::Error) -> Self {
        TelemetryError::File { path: PathBuf::from("<unknown>"), source: err }
    }
}

#[cfg(windows)]
impl From<core::Error> for TelemetryError {
    fn from(err: core::Error) -> Self {
        TelemetryError::WindowsApi {
            operation: "Unknown Windows operation".to_string(),
            source: err,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
          #[test]
          fn error_messages_carry_their_context(
            reason in ".*",
            name in "\\w+",
            offset in 0usize..0x10000usize,
            index in 0usize..10_000usize,
            len in 0usize..10_000usize,
            waited_ms in 1u64..60_000u64,
          ) {
            let header = TelemetryError::malformed_header(reason.clone());
            prop_assert!(header.to_string().contains(&reason));

            let unknown = TelemetryError::unknown_variable(name.clone());
            prop_assert!(unknown.to_string().contains(&name));

            let memory = TelemetryError::memory_access_error(offset);
            let hex = format!("{offset:#x}");
            prop_assert!(memory.to_string().contains(&hex), "missing {} in memory error", hex);

            let range = TelemetryError::IndexOutOfRange { index, len };
            let range_msg = range.to_string();
            prop_assert!(range_msg.contains(&index.to_string()));
            prop_assert!(range_msg.contains(&len.to_string()));

            let waited = TelemetryError::no_data(Duration::from_millis(waited_ms));
            prop_assert!(!waited.to_string().is_empty());
          }

          #[test]
          fn io_errors_convert_to_file_errors(reason in ".*") {
            let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, reason.clone());
            let converted: TelemetryError = io_err.into();
            match converted {
              TelemetryError::File { source, path } => {
                prop_assert_eq!(source.to_string(), reason);
                prop_assert_eq!(path, PathBuf::from("<unknown>"));
              }
              _ => prop_assert!(false, "Expected File error from io::Error conversion"),
            }
          }
        }
    }

    #[test]
    fn error_traits_validation() {
        fn assert_send_sync_static<T: Send + Sync + 'static>() {}
        assert_send_sync_static::<TelemetryError>();

        let error = TelemetryError::NotInitialized;
        let _: &dyn std::error::Error = &error;
    }

    #[test]
    fn retry_classification_matches_taxonomy() {
        assert!(TelemetryError::malformed_header("short buffer").is_retryable());
        assert!(TelemetryError::no_data(Duration::from_millis(32)).is_retryable());
        assert!(TelemetryError::connection_failed("missing segment").is_retryable());

        assert!(!TelemetryError::NotInitialized.is_retryable());
        assert!(!TelemetryError::unknown_variable("Speed").is_retryable());
        assert!(!TelemetryError::IndexOutOfRange { index: 5, len: 3 }.is_retryable());
    }

    #[test]
    fn recovery_suggestions_are_descriptive() {
        let errors = [
            TelemetryError::malformed_header("x"),
            TelemetryError::NotInitialized,
            TelemetryError::unknown_variable("x"),
            TelemetryError::no_data(Duration::from_millis(1)),
            TelemetryError::IndexOutOfRange { index: 1, len: 0 },
            TelemetryError::memory_access_error(0x10),
        ];
        for error in &errors {
            let suggestions = error.recovery_suggestions();
            assert!(!suggestions.is_empty(), "{error} has no suggestions");
            for suggestion in suggestions {
                assert!(suggestion.len() > 5);
            }
        }
    }
}
