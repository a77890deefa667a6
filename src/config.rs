//! Bridge configuration.
//!
//! Provides a type-safe interface for configuring the bridge: editor
//! address, read buffer size, and the timeouts applied during an exchange.
//!
//! The bridge consumes these as plain values. Loading them from a file or
//! the environment is the embedding application's concern.
//!
//! # Example
//!
//! ```ignore
//! use piccolo_bridge::BridgeConfig;
//!
//! let config = BridgeConfig::new()
//!     .with_host("127.0.0.1")
//!     .with_port(6400)
//!     .with_read_timeout(Duration::from_secs(15));
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

// ============================================================================
// Constants
// ============================================================================

/// Default editor host (localhost).
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default editor port.
pub const DEFAULT_PORT: u16 = 6400;

/// Default read buffer size in bytes.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// Default timeout for a single read attempt.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(15);

/// Default timeout for the TCP connect.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default deadline for a whole command/reply exchange.
///
/// The per-read timeout alone does not bound a peer that trickles bytes
/// indefinitely; this deadline caps the entire receive loop.
pub const DEFAULT_REPLY_DEADLINE: Duration = Duration::from_secs(60);

// ============================================================================
// BridgeConfig
// ============================================================================

/// Bridge configuration values.
///
/// Controls where the bridge connects and how long it waits at each
/// blocking point of an exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeConfig {
    /// Editor host.
    pub host: String,

    /// Editor TCP port.
    pub port: u16,

    /// Read buffer size in bytes.
    ///
    /// Requests larger than half this size trigger a non-fatal warning.
    pub buffer_size: usize,

    /// Timeout applied to each individual read attempt.
    pub read_timeout: Duration,

    /// Timeout applied to the TCP connect.
    pub connect_timeout: Duration,

    /// Deadline for a whole command/reply exchange.
    pub reply_deadline: Duration,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Constructors
// ============================================================================

impl BridgeConfig {
    /// Creates a new configuration with default settings.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            buffer_size: DEFAULT_BUFFER_SIZE,
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            reply_deadline: DEFAULT_REPLY_DEADLINE,
        }
    }
}

// ============================================================================
// Builder Methods
// ============================================================================

impl BridgeConfig {
    /// Sets the editor host.
    #[inline]
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the editor TCP port.
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the read buffer size in bytes.
    #[inline]
    #[must_use]
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    /// Sets the timeout for a single read attempt.
    #[inline]
    #[must_use]
    pub fn with_read_timeout(mut self, read_timeout: Duration) -> Self {
        self.read_timeout = read_timeout;
        self
    }

    /// Sets the timeout for the TCP connect.
    #[inline]
    #[must_use]
    pub fn with_connect_timeout(mut self, connect_timeout: Duration) -> Self {
        self.connect_timeout = connect_timeout;
        self
    }

    /// Sets the deadline for a whole command/reply exchange.
    #[inline]
    #[must_use]
    pub fn with_reply_deadline(mut self, reply_deadline: Duration) -> Self {
        self.reply_deadline = reply_deadline;
        self
    }
}

// ============================================================================
// Accessors
// ============================================================================

impl BridgeConfig {
    /// Returns the editor address as `host:port`.
    #[inline]
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// ============================================================================
// Tests
// ============================================================================
