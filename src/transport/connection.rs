//! WebSocket connection and event loop.
//!
//! This module handles the WebSocket connection to a GPU worker.
//!
//! # Event Loop
//!
//! The connection spawns a tokio task that owns the socket and handles:
//!
//! - Outgoing messages from the session controller
//! - Incoming worker replies, forwarded to [`Connection::receive`]
//! - Shutdown requests from [`Connection::close`] or a [`ShutdownHandle`]
//!
//! When the loop ends for any reason the inbound channel closes, so a
//! pending receive resolves with [`Error::ConnectionClosed`] instead of
//! hanging.

// ============================================================================
// Imports
// ============================================================================

use std::time::Duration;

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::timeout;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::connect_async_with_config;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::WebSocketConfig;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::protocol::Outbound;

use super::{Connector, Transport, TransportConfig};

// ============================================================================
// Constants
// ============================================================================

/// Time allowed for the close handshake before the loop is aborted.
const CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

// ============================================================================
// Types
// ============================================================================

/// Inbound messages (or the error that ended the stream).
type InboundMessage = Result<Vec<u8>>;

// ============================================================================
// ConnectionCommand
// ============================================================================

/// Internal commands for the event loop.
enum ConnectionCommand {
    /// Write a message and report the outcome.
    Send {
        message: Outbound,
        result_tx: oneshot::Sender<Result<()>>,
    },
    /// Close the socket and stop the loop.
    Shutdown,
}

// ============================================================================
// ShutdownHandle
// ============================================================================

/// Cloneable handle that closes a [`Connection`] from any task.
///
/// Closing unblocks a pending [`Connection::receive`] with
/// [`Error::ConnectionClosed`].
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
}

impl ShutdownHandle {
    /// Requests the connection to close. No-op if already closed.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }

    /// Returns `true` once the event loop has stopped.
    #[inline]
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.command_tx.is_closed()
    }
}

impl std::fmt::Debug for ConnectionCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Send { message, .. } => f
                .debug_struct("Send")
                .field("len", &message.len())
                .finish_non_exhaustive(),
            Self::Shutdown => f.write_str("Shutdown"),
        }
    }
}

// ============================================================================
// Connection
// ============================================================================

/// WebSocket connection to a GPU worker.
///
/// Owned by a single session; requests and replies are strictly paired.
pub struct Connection {
    /// Channel for sending commands to the event loop.
    command_tx: mpsc::UnboundedSender<ConnectionCommand>,
    /// Replies forwarded by the event loop.
    inbound_rx: mpsc::UnboundedReceiver<InboundMessage>,
    /// Per-call reply timeout.
    receive_timeout: Option<Duration>,
    /// Set once a reply times out; the late reply could be mistaken for
    /// the answer to a later request.
    desynced: bool,
    /// Event loop task, taken on close.
    task: Option<JoinHandle<()>>,
}

impl Connection {
    /// Creates a new connection from a WebSocket stream.
    ///
    /// Spawns the event loop task internally.
    pub fn new<S>(ws_stream: WebSocketStream<S>, receive_timeout: Option<Duration>) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        let task = tokio::spawn(Self::run_event_loop(ws_stream, command_rx, inbound_tx));

        Self {
            command_tx,
            inbound_rx,
            receive_timeout,
            desynced: false,
            task: Some(task),
        }
    }

    /// Returns a handle that can close this connection from another task.
    #[inline]
    #[must_use]
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            command_tx: self.command_tx.clone(),
        }
    }

    /// Writes one message to the worker.
    ///
    /// After a receive timeout only the shutdown command is accepted.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the event loop has stopped or a
    ///   previous reply timed out
    /// - [`Error::WebSocket`] if the write fails
    pub async fn send(&mut self, message: Outbound) -> Result<()> {
        if self.desynced && !message.is_shutdown() {
            return Err(Error::ConnectionClosed);
        }

        let (result_tx, result_rx) = oneshot::channel();
        self.command_tx
            .send(ConnectionCommand::Send { message, result_tx })
            .map_err(|_| Error::ConnectionClosed)?;

        result_rx.await.map_err(|_| Error::ConnectionClosed)?
    }

    /// Waits for the next worker message.
    ///
    /// A timeout leaves the connection unusable for further requests: the
    /// protocol carries no request ids, so a late reply cannot be told
    /// apart from the next one.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionClosed`] if the socket closes first or a
    ///   previous reply timed out
    /// - [`Error::Timeout`] if the receive timeout elapses
    /// - [`Error::WebSocket`] if the read fails (e.g. message too large)
    pub async fn receive(&mut self) -> Result<Vec<u8>> {
        if self.desynced {
            return Err(Error::ConnectionClosed);
        }

        let next = match self.receive_timeout {
            Some(limit) => match timeout(limit, self.inbound_rx.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!(timeout_ms = limit.as_millis() as u64, "Worker reply timed out");
                    self.desynced = true;
                    return Err(Error::timeout(
                        "receive worker reply",
                        limit.as_millis() as u64,
                    ));
                }
            },
            None => self.inbound_rx.recv().await,
        };

        next.unwrap_or(Err(Error::ConnectionClosed))
    }

    /// Closes the socket and waits for the event loop to finish.
    ///
    /// Safe to call multiple times.
    pub async fn close(&mut self) {
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);

        let Some(mut task) = self.task.take() else {
            return;
        };

        if timeout(CLOSE_TIMEOUT, &mut task).await.is_err() {
            warn!("Worker close handshake timed out, aborting event loop");
            task.abort();
        }
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop<S>(
        ws_stream: WebSocketStream<S>,
        mut command_rx: mpsc::UnboundedReceiver<ConnectionCommand>,
        inbound_tx: mpsc::UnboundedSender<InboundMessage>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                // Incoming messages from worker
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Binary(data))) => {
                            trace!(len = data.len(), "Binary message received");
                            let _ = inbound_tx.send(Ok(data.into()));
                        }

                        Some(Ok(Message::Text(text))) => {
                            trace!(len = text.len(), "Text message received");
                            let _ = inbound_tx.send(Ok(text.as_bytes().to_vec()));
                        }

                        Some(Ok(Message::Close(frame))) => {
                            debug!(?frame, "WebSocket closed by worker");
                            break;
                        }

                        Some(Err(e)) => {
                            warn!(error = %e, "WebSocket error");
                            let _ = inbound_tx.send(Err(Error::WebSocket(e)));
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Ping, Pong, Frame
                        _ => {}
                    }
                }

                // Commands from the session
                command = command_rx.recv() => {
                    match command {
                        Some(ConnectionCommand::Send { message, result_tx }) => {
                            let len = message.len();
                            let frame = match message {
                                Outbound::Binary(bytes) => Message::Binary(bytes.into()),
                                Outbound::Text(text) => Message::Text(text.into()),
                            };

                            let result = ws_write.send(frame).await.map_err(Error::from);
                            if result.is_ok() {
                                trace!(len, "Message sent");
                            }
                            let _ = result_tx.send(result);
                        }

                        Some(ConnectionCommand::Shutdown) => {
                            debug!("Shutdown command received");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("Command channel closed");
                            let _ = ws_write.close().await;
                            break;
                        }
                    }
                }
            }
        }

        debug!("Event loop terminated");
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        // ShutdownHandle clones keep the command channel open, so the loop
        // must be told explicitly.
        let _ = self.command_tx.send(ConnectionCommand::Shutdown);
    }
}

#[async_trait]
impl Transport for Connection {
    async fn send(&mut self, message: Outbound) -> Result<()> {
        Connection::send(self, message).await
    }

    async fn receive(&mut self) -> Result<Vec<u8>> {
        Connection::receive(self).await
    }

    async fn close(&mut self) -> Result<()> {
        Connection::close(self).await;
        Ok(())
    }

    fn shutdown_handle(&self) -> Option<ShutdownHandle> {
        Some(Connection::shutdown_handle(self))
    }
}

// ============================================================================
// WsConnector
// ============================================================================

/// Default [`Connector`] that dials workers over `ws://` or `wss://`.
#[derive(Debug, Default, Clone, Copy)]
pub struct WsConnector;

#[async_trait]
impl Connector for WsConnector {
    async fn open(&self, address: &str, config: &TransportConfig) -> Result<Box<dyn Transport>> {
        let ws_config = WebSocketConfig::default()
            .max_message_size(Some(config.max_message_size))
            .max_frame_size(Some(config.max_message_size));

        debug!(address, "Connecting to worker");

        let (ws_stream, _) = timeout(
            config.connect_timeout,
            connect_async_with_config(address, Some(ws_config), true),
        )
        .await
        .map_err(|_| {
            Error::timeout(
                format!("connect to {address}"),
                config.connect_timeout.as_millis() as u64,
            )
        })?
        .map_err(|e| Error::connection(format!("Failed to connect to worker: {e}")))?;

        Ok(Box::new(Connection::new(ws_stream, config.receive_timeout)))
    }
}

// ============================================================================
// Tests
// ============================================================================
