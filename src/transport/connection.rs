//! TCP connection to the Piccolo Editor.
//!
//! This module owns one socket and frames one command/reply exchange at a
//! time. The protocol is strictly request-then-reply on a single stream:
//! no pipelining and no correlation IDs, so ordering alone matches replies
//! to requests.
//!
//! # Receive Loop
//!
//! Replies carry no framing metadata. The loop accumulates chunks and asks
//! the [`FrameScanner`](super::framing::FrameScanner) after each one whether
//! a complete message has arrived. Two deadlines bound the loop: the
//! per-read timeout converts a stalled read into an error, and the reply
//! deadline caps the whole exchange against a peer that trickles bytes
//! forever.

// ============================================================================
// Imports
// ============================================================================

use serde_json::{Map, Value, json};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::protocol::{PING_COMMAND, PING_PROBE, Request, Response};

use super::framing::{FrameScanner, ScanOutcome, is_pong_reply};

// ============================================================================
// Connection
// ============================================================================

/// One TCP connection to the editor.
///
/// Created empty; the socket is populated by [`connect`](Self::connect) and
/// cleared by [`disconnect`](Self::disconnect) or by any failure during an
/// exchange, so a failed connection is never reused.
///
/// # Concurrency
///
/// All operations take `&mut self`: the channel supports exactly one
/// in-flight command. Callers sharing a connection across tasks must
/// serialize access, which [`ConnectionManager`](crate::ConnectionManager)
/// does with a mutex.
#[derive(Debug)]
pub struct Connection {
    /// Bridge configuration (host, port, buffer size, timeouts).
    config: BridgeConfig,
    /// Live socket, present only while connected.
    stream: Option<TcpStream>,
}

impl Connection {
    /// Creates a connection in the disconnected state.
    #[inline]
    #[must_use]
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            stream: None,
        }
    }

    /// Returns `true` if a socket is currently held.
    #[inline]
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Returns the configured editor host.
    #[inline]
    #[must_use]
    pub fn host(&self) -> &str {
        &self.config.host
    }

    /// Returns the configured editor port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.config.port
    }
}

// ============================================================================
// Connection - Lifecycle
// ============================================================================

impl Connection {
    /// Establishes the TCP connection to the editor.
    ///
    /// No-op if already connected.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connect`] if the socket cannot be established
    /// within the connect timeout.
    pub async fn connect(&mut self) -> Result<()> {
        if self.stream.is_some() {
            return Ok(());
        }

        let address = self.config.address();
        let connect_timeout = self.config.connect_timeout;

        let stream = match timeout(connect_timeout, TcpStream::connect(&address)).await {
            Ok(Ok(stream)) => stream,
            Ok(Err(e)) => {
                error!(%address, error = %e, "Failed to connect to editor");
                return Err(Error::connect(
                    &self.config.host,
                    self.config.port,
                    e.to_string(),
                ));
            }
            Err(_) => {
                error!(%address, "Connect timed out");
                return Err(Error::connect(
                    &self.config.host,
                    self.config.port,
                    format!("connect timed out after {}ms", connect_timeout.as_millis()),
                ));
            }
        };

        info!(%address, "Connected to editor");
        self.stream = Some(stream);
        Ok(())
    }

    /// Closes the connection.
    ///
    /// Best-effort: close-time errors are logged and swallowed. Idempotent.
    pub async fn disconnect(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            if let Err(e) = stream.shutdown().await {
                debug!(error = %e, "Error closing editor socket");
            }
            debug!("Disconnected from editor");
        }
    }

    /// Drops the socket without a close handshake.
    ///
    /// Used after a failed exchange, where the stream state is unknown.
    #[inline]
    fn invalidate(&mut self) {
        self.stream = None;
    }
}

// ============================================================================
// Connection - Commands
// ============================================================================

impl Connection {
    /// Sends a command and returns the decoded result payload.
    ///
    /// The command type `"ping"` is routed to [`ping`](Self::ping) rather
    /// than the JSON envelope path.
    ///
    /// Any failure drops the cached socket, so the next call must
    /// reconnect from scratch.
    ///
    /// # Errors
    ///
    /// - [`Error::Connection`] if no socket is held
    /// - [`Error::Timeout`] if a read stalls or the reply deadline expires
    /// - [`Error::Closed`] if the editor closes the stream with no data
    /// - [`Error::Decode`] if the reply is not a valid envelope
    /// - [`Error::Remote`] if the editor reports an error
    pub async fn send_command(
        &mut self,
        command_type: &str,
        params: Option<Map<String, Value>>,
    ) -> Result<Value> {
        if self.stream.is_none() {
            return Err(Error::connection("not connected to the editor"));
        }

        if command_type == PING_COMMAND {
            return self.ping().await;
        }

        match self.exchange(command_type, params).await {
            Ok(result) => Ok(result),
            Err(e) => {
                error!(command = command_type, error = %e, "Command exchange failed");
                self.invalidate();
                Err(e)
            }
        }
    }

    /// Sends the liveness probe and verifies the editor answers it.
    ///
    /// The probe is the literal bytes `ping\n`, not a JSON envelope, and
    /// the reply is recognized by its serialized prefix. Returns the fixed
    /// acknowledgement payload `{"message": "pong"}`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Connection`] on any failure (timeout, malformed
    /// reply, non-success status); the socket is dropped first.
    pub async fn ping(&mut self) -> Result<Value> {
        debug!("Sending ping to verify connection");

        match self.ping_exchange().await {
            Ok(()) => Ok(json!({"message": "pong"})),
            Err(e) => {
                warn!(error = %e, "Ping failed");
                self.invalidate();
                Err(Error::connection(format!(
                    "connection verification failed: {e}"
                )))
            }
        }
    }

    /// Writes the probe and checks the decoded reply status.
    async fn ping_exchange(&mut self) -> Result<()> {
        let Self { config, stream } = self;
        let stream = stream
            .as_mut()
            .ok_or_else(|| Error::connection("not connected to the editor"))?;

        stream.write_all(PING_PROBE).await?;

        let reply = Self::receive_reply(stream, config).await?;
        let response = Response::from_wire(&reply)?;

        if !response.is_success() {
            return Err(Error::connection("ping reply status was not success"));
        }

        debug!(
            message = %response.get_string("message"),
            "Ping acknowledged"
        );
        Ok(())
    }

    /// Performs one enveloped command/reply exchange.
    async fn exchange(
        &mut self,
        command_type: &str,
        params: Option<Map<String, Value>>,
    ) -> Result<Value> {
        let request = Request::new(command_type, params);
        let wire = request.to_wire()?;

        // Oversized requests are allowed through; the warning flags the
        // likely cause if the editor then misbehaves.
        if wire.len() > self.config.buffer_size / 2 {
            warn!(
                command = command_type,
                bytes = wire.len(),
                buffer_size = self.config.buffer_size,
                "Large command detected, this might cause issues"
            );
        }

        info!(command = command_type, bytes = wire.len(), "Sending command");

        let Self { config, stream } = self;
        let stream = stream
            .as_mut()
            .ok_or_else(|| Error::connection("not connected to the editor"))?;

        stream.write_all(&wire).await?;

        let reply = Self::receive_reply(stream, config).await?;
        Response::from_wire(&reply)?.into_result()
    }
}

// ============================================================================
// Connection - Receive Loop
// ============================================================================

impl Connection {
    /// Receives one complete reply, bounded by the reply deadline.
    async fn receive_reply(stream: &mut TcpStream, config: &BridgeConfig) -> Result<Vec<u8>> {
        let deadline = config.reply_deadline;

        match timeout(deadline, Self::receive_loop(stream, config)).await {
            Ok(result) => result,
            Err(_) => Err(Error::timeout(
                "waiting for complete editor reply",
                deadline.as_millis() as u64,
            )),
        }
    }

    /// Accumulates chunks until the frame scanner reports a complete
    /// message.
    async fn receive_loop(stream: &mut TcpStream, config: &BridgeConfig) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        let mut chunk = vec![0u8; config.buffer_size];
        let mut scanner = FrameScanner::new();

        loop {
            let read = timeout(config.read_timeout, stream.read(&mut chunk))
                .await
                .map_err(|_| {
                    warn!("Socket timeout during receive");
                    Error::timeout(
                        "reading editor reply",
                        config.read_timeout.as_millis() as u64,
                    )
                })??;

            if read == 0 {
                if buffer.is_empty() {
                    return Err(Error::Closed);
                }
                // Stream closed mid-message: whatever accumulated is final
                // and gets one decode attempt upstream.
                debug!(bytes = buffer.len(), "Stream closed, treating buffer as final");
                return Ok(buffer);
            }

            buffer.extend_from_slice(&chunk[..read]);

            // Fast path: the pong reply is complete the moment its prefix
            // has arrived.
            if is_pong_reply(&buffer) {
                debug!("Received ping response");
                return Ok(buffer);
            }

            if let ScanOutcome::Complete { len } = scanner.scan(&buffer) {
                info!(bytes = len, "Received complete response");
                buffer.truncate(len);
                return Ok(buffer);
            }
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::time::Duration;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio_test::{assert_err, assert_ok};

    /// Binds a listener and returns a config pointing at it.
    async fn local_peer() -> (TcpListener, BridgeConfig) {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let config = BridgeConfig::new()
            .with_port(port)
            .with_read_timeout(Duration::from_millis(500))
            .with_reply_deadline(Duration::from_secs(2));
        (listener, config)
    }

    /// Accepts one connection, reads one request line, replies with the
    /// given chunks (with a small pause between them), then holds the
    /// socket open.
    fn script_reply(listener: TcpListener, chunks: Vec<Vec<u8>>) {
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = vec![0u8; 4096];
            let _ = socket.read(&mut request).await.expect("read request");

            for chunk in chunks {
                socket.write_all(&chunk).await.expect("write chunk");
                socket.flush().await.expect("flush");
                tokio::time::sleep(Duration::from_millis(20)).await;
            }

            // Keep the socket open until the client is done.
            tokio::time::sleep(Duration::from_secs(2)).await;
        });
    }

    #[tokio::test]
    async fn test_connect_and_disconnect() {
        let (listener, config) = local_peer().await;
        tokio::spawn(async move {
            let _ = listener.accept().await;
        });

        let mut connection = Connection::new(config);
        assert!(!connection.is_connected());

        assert_ok!(connection.connect().await);
        assert!(connection.is_connected());

        // connect is a no-op while connected
        assert_ok!(connection.connect().await);

        connection.disconnect().await;
        assert!(!connection.is_connected());

        // disconnect is idempotent
        connection.disconnect().await;
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Grab a free port, then close the listener so nothing answers.
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        drop(listener);

        let config = BridgeConfig::new().with_port(port);
        let mut connection = Connection::new(config);

        let err = assert_err!(connection.connect().await);
        assert!(matches!(err, Error::Connect { .. }));
        assert!(!connection.is_connected());
    }

    #[tokio::test]
    async fn test_send_command_without_socket() {
        let config = BridgeConfig::new();
        let mut connection = Connection::new(config);

        let err = connection
            .send_command("noop", None)
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::Connection { .. }));
    }

    #[tokio::test]
    async fn test_single_chunk_reply() {
        let (listener, config) = local_peer().await;
        script_reply(
            listener,
            vec![br#"{"status":"success","result":{"message":"done"}}"#.to_vec()],
        );

        let mut connection = Connection::new(config);
        connection.connect().await.expect("connect");

        let result = connection
            .send_command("noop", None)
            .await
            .expect("command");
        assert_eq!(result, serde_json::json!({"message": "done"}));
    }

    #[tokio::test]
    async fn test_two_chunk_reply() {
        let (listener, config) = local_peer().await;
        script_reply(
            listener,
            vec![
                br#"{"status":"success","#.to_vec(),
                br#""result":{}}"#.to_vec(),
            ],
        );

        let mut connection = Connection::new(config);
        connection.connect().await.expect("connect");

        let result = connection
            .send_command("noop", None)
            .await
            .expect("command");
        assert_eq!(result, serde_json::json!({}));
    }

    #[tokio::test]
    async fn test_error_envelope_surfaces_remote_error() {
        let (listener, config) = local_peer().await;
        script_reply(
            listener,
            vec![
                br#"{"status":"error","#.to_vec(),
                br#""error":"not found"}"#.to_vec(),
            ],
        );

        let mut connection = Connection::new(config);
        connection.connect().await.expect("connect");

        let err = connection
            .send_command("find_object", None)
            .await
            .expect_err("should fail");
        assert!(err.is_remote());
        assert_eq!(err.to_string(), "not found");

        // Failure invalidated the socket.
        assert!(!connection.is_connected());
    }

    #[tokio::test]
    async fn test_ping_round_trip() {
        let (listener, config) = local_peer().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut probe = vec![0u8; 64];
            let n = socket.read(&mut probe).await.expect("read probe");
            assert_eq!(&probe[..n], b"ping\n");

            socket
                .write_all(br#"{"status":"success","result":{"message":"pong"}}"#)
                .await
                .expect("write pong");
            tokio::time::sleep(Duration::from_secs(1)).await;
        });

        let mut connection = Connection::new(config);
        connection.connect().await.expect("connect");

        let result = connection.send_command("ping", None).await.expect("ping");
        assert_eq!(result, serde_json::json!({"message": "pong"}));
        assert!(connection.is_connected());
    }

    #[tokio::test]
    async fn test_ping_failure_invalidates_socket() {
        let (listener, config) = local_peer().await;
        script_reply(
            listener,
            vec![br#"{"status":"error","error":"busy"}"#.to_vec()],
        );

        let mut connection = Connection::new(config);
        connection.connect().await.expect("connect");

        let err = connection.ping().await.expect_err("should fail");
        assert!(matches!(err, Error::Connection { .. }));
        assert!(!connection.is_connected());
    }

    #[tokio::test]
    async fn test_peer_closes_with_no_data() {
        let (listener, config) = local_peer().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = vec![0u8; 4096];
            let _ = socket.read(&mut request).await.expect("read request");
            // Close without replying.
            drop(socket);
        });

        let mut connection = Connection::new(config);
        connection.connect().await.expect("connect");

        let err = connection
            .send_command("noop", None)
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::Closed));
        assert!(!connection.is_connected());
    }

    #[tokio::test]
    async fn test_peer_closes_mid_message() {
        let (listener, config) = local_peer().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = vec![0u8; 4096];
            let _ = socket.read(&mut request).await.expect("read request");

            socket
                .write_all(br#"{"status":"success","result"#)
                .await
                .expect("write partial");
            drop(socket);
        });

        let mut connection = Connection::new(config);
        connection.connect().await.expect("connect");

        // The truncated buffer gets a final decode attempt, which fails
        // with a payload preview.
        let err = connection
            .send_command("noop", None)
            .await
            .expect_err("should fail");
        assert!(matches!(err, Error::Decode { .. }));
        assert!(!connection.is_connected());
    }

    #[tokio::test]
    async fn test_read_timeout_mid_reply() {
        let (listener, config) = local_peer().await;
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = vec![0u8; 4096];
            let _ = socket.read(&mut request).await.expect("read request");

            // Send an incomplete envelope, then stall with the socket open.
            socket
                .write_all(br#"{"status":"success","#)
                .await
                .expect("write partial");
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let mut connection = Connection::new(config);
        connection.connect().await.expect("connect");

        let err = connection
            .send_command("noop", None)
            .await
            .expect_err("should fail");
        assert!(err.is_timeout());
        assert!(!connection.is_connected());
    }

    #[tokio::test]
    async fn test_reply_deadline_bounds_trickling_sender() {
        // Each byte arrives well inside the per-read timeout, so only the
        // whole-exchange deadline can stop a sender that trickles
        // valid-looking bytes forever.
        let (listener, config) = local_peer().await;
        let config = config
            .with_read_timeout(Duration::from_secs(1))
            .with_reply_deadline(Duration::from_millis(1500));

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept");
            let mut request = vec![0u8; 4096];
            let _ = socket.read(&mut request).await.expect("read request");

            for byte in br#"{"status":"success","result":{"message":"#.iter() {
                if socket.write_all(&[*byte]).await.is_err() {
                    break;
                }
                let _ = socket.flush().await;
                tokio::time::sleep(Duration::from_millis(300)).await;
            }
        });

        let mut connection = Connection::new(config);
        connection.connect().await.expect("connect");

        let err = assert_err!(connection.send_command("noop", None).await);
        let Error::Timeout { timeout_ms, .. } = err else {
            panic!("expected timeout, got {err}");
        };
        // The deadline fired, not the per-read timeout.
        assert_eq!(timeout_ms, 1500);
        assert!(!connection.is_connected());
    }

    #[tokio::test]
    async fn test_reply_with_code_content() {
        // Braces and escaped quotes inside a content string must not
        // confuse the framing.
        let reply = br#"{"status":"success","result":{"content":"fn main() { println!(\"hi\"); }"}}"#;

        let (listener, config) = local_peer().await;
        script_reply(listener, vec![reply.to_vec()]);

        let mut connection = Connection::new(config);
        connection.connect().await.expect("connect");

        let result = connection
            .send_command("read_script", None)
            .await
            .expect("command");
        assert_eq!(
            result.get("content").and_then(Value::as_str),
            Some("fn main() { println!(\"hi\"); }")
        );
    }

    #[tokio::test]
    async fn test_reply_split_into_many_small_chunks() {
        let reply = br#"{"status":"success","result":{"message":"chunked delivery works"}}"#;
        let chunks: Vec<Vec<u8>> = reply.chunks(7).map(<[u8]>::to_vec).collect();

        let (listener, config) = local_peer().await;
        script_reply(listener, chunks);

        let mut connection = Connection::new(config);
        connection.connect().await.expect("connect");

        let result = connection
            .send_command("noop", None)
            .await
            .expect("command");
        assert_eq!(
            result.get("message").and_then(Value::as_str),
            Some("chunked delivery works")
        );
    }
}
