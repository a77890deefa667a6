//! Wire protocol message types.
//!
//! This module defines the envelope exchanged with the Piccolo Editor over
//! the TCP stream.
//!
//! # Wire Format
//!
//! Requests are single-line UTF-8 JSON, newline-terminated:
//!
//! ```json
//! {"type": "add_cube", "params": {"name": "Cube"}}
//! ```
//!
//! Responses are UTF-8 JSON objects with a `status` discriminator:
//!
//! ```json
//! {"status": "success", "result": {...}}
//! {"status": "error", "error": "description"}
//! ```
//!
//! The stream carries no length prefix or response delimiter; the
//! [`transport`](crate::transport) layer infers message boundaries.
//!
//! # Ping Probe
//!
//! Liveness checks bypass the JSON envelope: the probe is the literal bytes
//! [`PING_PROBE`] and the reply is recognized by its serialized prefix
//! [`PONG_PREFIX`].

// ============================================================================
// Submodules
// ============================================================================

/// Request and response envelope types.
pub mod request;

// ============================================================================
// Re-exports
// ============================================================================

pub use request::{Request, Response, Status};

// ============================================================================
// Wire Constants
// ============================================================================

/// Literal bytes sent as the liveness probe (not a JSON envelope).
pub const PING_PROBE: &[u8] = b"ping\n";

/// Serialized prefix of the editor's pong reply.
///
/// The reply is recognized by this prefix before the whole envelope has
/// arrived, so the probe never depends on the structural frame scan.
pub const PONG_PREFIX: &str = r#"{"status":"success","result":{"message":"pong""#;

/// Command type string carrying ping semantics through `send_command`.
pub const PING_COMMAND: &str = "ping";
