//! TCP transport layer.
//!
//! This module handles communication between the bridge and the Piccolo
//! Editor process over a raw TCP stream.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Bridge (Rust)  │                              │  Piccolo Editor │
//! │                 │           TCP                │                 │
//! │  Connection     │◄────────────────────────────►│  Command        │
//! │  + FrameScanner │      host:PORT (6400)        │  Dispatcher     │
//! │                 │                              │                 │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Exchange Lifecycle
//!
//! 1. `Connection::connect` - Open the TCP socket to the editor
//! 2. `Connection::ping` - Verify the editor answers the liveness probe
//! 3. `Connection::send_command` - Write one request, frame and decode its reply
//! 4. `Connection::disconnect` - Best-effort close
//!
//! The wire format carries no message boundaries; `framing` infers reply
//! completeness incrementally.
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Socket lifecycle and the command/reply exchange |
//! | `framing` | Incremental reply-boundary detection |

// ============================================================================
// Submodules
// ============================================================================

/// Socket lifecycle and the command/reply exchange.
pub mod connection;

/// Incremental reply-boundary detection.
pub mod framing;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::Connection;
pub use framing::{FrameScanner, ScanOutcome};
