//! Error types for the Piccolo bridge.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use piccolo_bridge::{Result, ConnectionManager};
//!
//! async fn example(manager: &ConnectionManager) -> Result<()> {
//!     let result = manager.send_command("add_cube", None).await?;
//!     println!("{result}");
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Transport | [`Error::Connect`], [`Error::Timeout`], [`Error::Closed`] |
//! | Protocol | [`Error::Decode`], [`Error::Remote`] |
//! | Lifecycle | [`Error::Connection`] |
//! | External | [`Error::Io`], [`Error::Json`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;

// ============================================================================
// Constants
// ============================================================================

/// Maximum length of the payload preview attached to decode errors.
pub(crate) const DECODE_PREVIEW_LIMIT: usize = 500;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
///
/// All fallible operations in this crate return this type.
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
///
/// Each variant includes relevant context for debugging.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// Socket-level connect failure.
    ///
    /// Returned when the TCP connection to the editor cannot be established.
    #[error("Connect failed to {host}:{port}: {message}")]
    Connect {
        /// Host the connect was attempted against.
        host: String,
        /// Port the connect was attempted against.
        port: u16,
        /// Description of the connect failure.
        message: String,
    },

    /// A read stalled past the configured timeout.
    ///
    /// Returned when the editor stops sending mid-reply, or when the
    /// whole-exchange deadline expires.
    #[error("Timeout after {timeout_ms}ms: {operation}")]
    Timeout {
        /// Description of the operation that timed out.
        operation: String,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// Peer closed the stream before a complete reply arrived.
    ///
    /// Returned when the editor closes the socket with no data pending.
    #[error("Connection closed by editor")]
    Closed,

    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// Accumulated bytes do not form a valid response envelope.
    ///
    /// Carries a truncated preview of the offending payload for diagnosis.
    #[error("Decode error: {message} (payload preview: {preview})")]
    Decode {
        /// Description of the decode failure.
        message: String,
        /// Truncated payload preview (at most 500 characters).
        preview: String,
    },

    /// The editor reported an error envelope.
    ///
    /// Carries the remote-supplied message verbatim.
    #[error("{message}")]
    Remote {
        /// Error message reported by the editor.
        message: String,
    },

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// No usable connection could be obtained or verified.
    ///
    /// Returned by the connection manager when connect or ping verification
    /// fails.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a connect error.
    #[inline]
    pub fn connect(host: impl Into<String>, port: u16, message: impl Into<String>) -> Self {
        Self::Connect {
            host: host.into(),
            port,
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    #[inline]
    pub fn timeout(operation: impl Into<String>, timeout_ms: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            timeout_ms,
        }
    }

    /// Creates a decode error, truncating the payload preview to 500 chars.
    #[inline]
    pub fn decode(message: impl Into<String>, payload: &str) -> Self {
        let preview = if payload.chars().count() > DECODE_PREVIEW_LIMIT {
            let truncated: String = payload.chars().take(DECODE_PREVIEW_LIMIT).collect();
            format!("{truncated}...")
        } else {
            payload.to_string()
        };

        Self::Decode {
            message: message.into(),
            preview,
        }
    }

    /// Creates a remote error from an editor-supplied message.
    #[inline]
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }

    /// Returns `true` if this is a transport- or lifecycle-level
    /// connection error.
    #[inline]
    #[must_use]
    pub fn is_connection_error(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Closed | Self::Connection { .. } | Self::Io(_)
        )
    }

    /// Returns `true` if this error was reported by the editor itself.
    #[inline]
    #[must_use]
    pub fn is_remote(&self) -> bool {
        matches!(self, Self::Remote { .. })
    }

    /// Returns `true` if this error is recoverable.
    ///
    /// Recoverable errors may succeed on retry: the manager drops the cached
    /// connection on any failure, so the next call reconnects from scratch.
    #[inline]
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::Connect { .. } | Self::Timeout { .. } | Self::Closed | Self::Connection { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
