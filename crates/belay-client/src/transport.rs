//! WebSocket transport for the session.
//!
//! Provides [`Socket`] which handles WebSocket I/O for frame transport. This
//! is a thin layer that just sends/receives text frames; session logic
//! remains in the Sans-IO [`crate::Session`].

use std::time::Duration;

use belay_proto::Frame;
use futures_util::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream, connect_async,
    tungstenite::{self, Message},
};

/// Capacity of the frame channels in each direction.
const CHANNEL_CAPACITY: usize = 32;

/// Longest wait for the TCP connect and WebSocket handshake together.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Transport errors.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The socket task has stopped; the frame was not sent.
    #[error("socket closed")]
    Closed,
}

/// Event read from the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Text frame from the server.
    Frame(Frame),

    /// Socket ended (close frame, read or write error).
    Closed {
        /// What ended it
        reason: String,
    },
}

/// Handle to an open WebSocket.
///
/// Frames are sent/received via the channels, and an internal task handles
/// the WebSocket I/O.
pub struct Socket {
    /// Send frames to the server.
    pub to_server: mpsc::Sender<Frame>,
    /// Receive frames and the final close from the server.
    pub from_server: mpsc::Receiver<TransportEvent>,
    /// Abort handle to stop the socket task.
    abort_handle: tokio::task::AbortHandle,
}

impl Socket {
    /// Queue a frame for the server.
    pub async fn send(&self, frame: Frame) -> Result<(), TransportError> {
        self.to_server.send(frame).await.map_err(|_| TransportError::Closed)
    }

    /// Next event without waiting. `None` if nothing is ready.
    pub fn try_recv(&mut self) -> Option<TransportEvent> {
        match self.from_server.try_recv() {
            Ok(event) => Some(event),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Some(TransportEvent::Closed { reason: "socket task ended".to_string() })
            },
        }
    }

    /// Stop the socket.
    pub fn stop(&self) {
        self.abort_handle.abort();
    }
}

impl Drop for Socket {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Open a WebSocket to `url` within [`DEFAULT_CONNECT_TIMEOUT`].
pub async fn connect(url: &str) -> Result<Socket, TransportError> {
    connect_with_timeout(url, DEFAULT_CONNECT_TIMEOUT).await
}

/// Open a WebSocket to `url`.
///
/// Returns a [`Socket`] with channels for frame transport once the handshake
/// completes. A handshake still pending after `timeout` is abandoned and
/// reported as [`TransportError::Connection`].
pub async fn connect_with_timeout(url: &str, timeout: Duration) -> Result<Socket, TransportError> {
    let (stream, _response) = tokio::time::timeout(timeout, connect_async(url))
        .await
        .map_err(|_| {
            TransportError::Connection(format!(
                "{url}: handshake timed out after {} ms",
                timeout.as_millis()
            ))
        })?
        .map_err(|e| TransportError::Connection(format!("{url}: {e}")))?;

    tracing::info!(%url, "websocket open");

    let (to_server_tx, to_server_rx) = mpsc::channel::<Frame>(CHANNEL_CAPACITY);
    let (from_server_tx, from_server_rx) = mpsc::channel::<TransportEvent>(CHANNEL_CAPACITY);

    let handle = tokio::spawn(run_socket(stream, to_server_rx, from_server_tx));

    Ok(Socket {
        to_server: to_server_tx,
        from_server: from_server_rx,
        abort_handle: handle.abort_handle(),
    })
}

type Stream = WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>;

/// Run the socket, bridging between channels and the WebSocket.
async fn run_socket(
    stream: Stream,
    mut to_server: mpsc::Receiver<Frame>,
    from_server: mpsc::Sender<TransportEvent>,
) {
    let (mut write, mut read) = stream.split();

    let reason = loop {
        tokio::select! {
            outgoing = to_server.recv() => {
                let Some(frame) = outgoing else {
                    let _ = write.send(Message::Close(None)).await;
                    break "closed by client".to_string();
                };
                if let Err(e) = write.send(Message::text(frame.into_text())).await {
                    break format!("write failed: {e}");
                }
            },
            incoming = read.next() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        let event = TransportEvent::Frame(Frame::new(text.as_str()));
                        if from_server.send(event).await.is_err() {
                            break "receiver dropped".to_string();
                        }
                    },
                    Some(Ok(Message::Close(close))) => {
                        break close.map_or_else(
                            || "server closed".to_string(),
                            |c| format!("server closed: {}", c.reason.as_str()),
                        );
                    },
                    Some(Ok(_)) => {
                        // Binary and ping/pong frames carry no chat messages
                    },
                    Some(Err(tungstenite::Error::ConnectionClosed)) | None => {
                        break "connection closed".to_string();
                    },
                    Some(Err(e)) => break format!("read failed: {e}"),
                }
            },
        }
    };

    tracing::info!(%reason, "websocket closed");
    let _ = from_server.send(TransportEvent::Closed { reason }).await;
}
