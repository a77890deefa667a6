//! Connection manager.
//!
//! Provides callers a live, ping-verified [`Connection`] without requiring
//! them to manage sockets directly. The manager owns at most one connection
//! at a time behind an async mutex, so it can be shared across tasks (for
//! example inside an `Arc` held by an application context) while commands
//! stay strictly serialized: the protocol has no correlation IDs, and reply
//! ordering is the only thing matching replies to requests.
//!
//! # Verification Policy
//!
//! A connection is handed to an exchange only after it has just answered a
//! ping. A cached connection that fails the ping is discarded and replaced
//! by a fresh connect, itself ping-verified before use. Any exchange
//! failure drops the cached connection, so the next command reconnects
//! from scratch.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::protocol::PING_COMMAND;
use crate::transport::Connection;

// ============================================================================
// ConnectionManager
// ============================================================================

/// Owns the bridge's single editor connection and its reconnect policy.
///
/// # Example
///
/// ```ignore
/// use piccolo_bridge::{BridgeConfig, ConnectionManager};
///
/// let manager = ConnectionManager::new(BridgeConfig::new());
/// let result = manager.send_command("add_cube", None).await?;
/// ```
pub struct ConnectionManager {
    /// Bridge configuration used for every (re)connect.
    config: BridgeConfig,

    /// The single cached connection. `None` while disconnected.
    slot: Mutex<Option<Connection>>,
}

impl ConnectionManager {
    /// Creates a manager in the disconnected state.
    #[inline]
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            slot: Mutex::new(None),
        }
    }

    /// Returns the configuration the manager connects with.
    #[inline]
    #[must_use]
    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    /// Returns `true` if a connection is currently cached.
    ///
    /// The cached connection is re-verified before every use, so this is
    /// an observability helper, not a liveness guarantee.
    pub async fn is_connected(&self) -> bool {
        let slot = self.slot.lock().await;
        slot.as_ref().is_some_and(Connection::is_connected)
    }
}

// ============================================================================
// ConnectionManager - Commands
// ============================================================================

impl ConnectionManager {
    /// Sends a command through a verified connection.
    ///
    /// Obtains a connection (cached and re-verified, or freshly
    /// established), performs the exchange, and returns the decoded result
    /// payload. On any failure the cached connection is dropped so the
    /// next call reconnects.
    ///
    /// A `"ping"` command is answered from the verification probe that
    /// just ran while obtaining the connection, without a second wire
    /// round trip; use [`Connection::ping`] directly to force a probe.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if no usable connection could be obtained
    /// - any error from [`Connection::send_command`]
    pub async fn send_command(
        &self,
        command_type: &str,
        params: Option<Map<String, Value>>,
    ) -> Result<Value> {
        let mut slot = self.slot.lock().await;
        let connection = Self::checked_out(&mut slot, &self.config).await?;

        // A plain health check already ran during verification; answer it
        // without another round trip.
        if command_type == PING_COMMAND {
            return Ok(serde_json::json!({"message": "pong"}));
        }

        match connection.send_command(command_type, params).await {
            Ok(result) => Ok(result),
            Err(e) => {
                // The connection already dropped its socket; clear the
                // slot so nothing hands it out again.
                *slot = None;
                Err(e)
            }
        }
    }

    /// Verifies the editor is reachable and answering.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] if no verified connection could be
    /// obtained.
    pub async fn ping(&self) -> Result<Value> {
        self.send_command(PING_COMMAND, None).await
    }

    /// Closes the cached connection, if any.
    ///
    /// Best-effort and idempotent: close-time errors are swallowed.
    pub async fn disconnect(&self) {
        let mut slot = self.slot.lock().await;
        if let Some(mut connection) = slot.take() {
            connection.disconnect().await;
            info!("Editor connection closed");
        }
    }
}

// ============================================================================
// ConnectionManager - Verification
// ============================================================================

impl ConnectionManager {
    /// Returns a just-verified connection from the slot, reconnecting if
    /// needed.
    async fn checked_out<'a>(
        slot: &'a mut Option<Connection>,
        config: &BridgeConfig,
    ) -> Result<&'a mut Connection> {
        // Re-verify the cached connection before reuse.
        let cached_alive = match slot.as_mut() {
            Some(connection) => match connection.ping().await {
                Ok(_) => true,
                Err(e) => {
                    warn!(error = %e, "Cached connection failed verification");
                    false
                }
            },
            None => false,
        };

        if cached_alive {
            debug!("Reusing existing editor connection");
            return Ok(slot.as_mut().expect("slot populated"));
        }

        // Drop any stale connection, swallowing close errors.
        if let Some(mut stale) = slot.take() {
            stale.disconnect().await;
        }

        // Establish and verify a fresh connection.
        info!("Creating new editor connection");
        let mut connection = Connection::new(config.clone());

        if let Err(e) = connection.connect().await {
            warn!(error = %e, "Could not reach editor");
            return Err(Error::connection(format!(
                "could not reach the editor process at {}: {e}",
                config.address()
            )));
        }

        if let Err(e) = connection.ping().await {
            connection.disconnect().await;
            return Err(Error::connection(format!(
                "could not establish a verified editor connection: {e}"
            )));
        }

        info!("Successfully established new editor connection");
        *slot = Some(connection);
        Ok(slot.as_mut().expect("slot populated"))
    }
}

// ============================================================================
// Tests
// ============================================================================
