//! Piccolo Bridge - TCP client for the Piccolo Editor.
//!
//! This library maintains a persistent connection to a running Piccolo
//! Editor process and exchanges newline-terminated JSON commands with it.
//!
//! # Architecture
//!
//! The bridge follows a client model:
//!
//! - **Local End (Rust)**: Encodes commands, frames and decodes replies
//! - **Remote End (Editor)**: Executes commands, emits response envelopes
//!
//! Key design principles:
//!
//! - One connection per [`ConnectionManager`], ping-verified before every use
//! - Strict request-then-reply ordering (no pipelining, no correlation IDs)
//! - Reply boundaries inferred incrementally; the wire has no framing metadata
//! - Every failure leaves the manager disconnected and ready to reconnect
//!
//! # Quick Start
//!
//! ```no_run
//! use piccolo_bridge::{BridgeConfig, ConnectionManager, Result};
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // Point the bridge at the editor's command port
//!     let manager = ConnectionManager::new(
//!         BridgeConfig::new().with_host("127.0.0.1").with_port(6400),
//!     );
//!
//!     // Verify the editor is up, then issue a command
//!     manager.ping().await?;
//!     let result = manager.send_command("add_cube", None).await?;
//!     println!("editor replied: {result}");
//!
//!     manager.disconnect().await;
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`config`] | Bridge configuration values |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`manager`] | Connection ownership, verification, and reconnect policy |
//! | [`protocol`] | Wire envelope types (internal) |
//! | [`transport`] | TCP transport and reply framing (internal) |
//!
//! # Tool Layer
//!
//! Individual editor operations (`add_cube`, ...) are thin parameter-shaping
//! wrappers over [`ConnectionManager::send_command`] and live in the
//! embedding application, not in this crate.

// ============================================================================
// Modules
// ============================================================================

/// Bridge configuration values.
///
/// Plain values consumed by the core; loading them from a file or the
/// environment is the embedding application's concern.
pub mod config;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Connection ownership, verification, and reconnect policy.
pub mod manager;

/// Wire envelope types.
///
/// Internal module defining the request/response message structures.
pub mod protocol;

/// TCP transport layer.
///
/// Internal module handling the socket lifecycle and reply framing.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Configuration
pub use config::BridgeConfig;

// Error types
pub use error::{Error, Result};

// Manager
pub use manager::ConnectionManager;

// Protocol types
pub use protocol::{Request, Response, Status};

// Transport types
pub use transport::Connection;
