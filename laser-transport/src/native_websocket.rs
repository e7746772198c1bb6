/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under either of
 *
 * * Apache License, Version 2.0
 *   (http://www.apache.org/licenses/LICENSE-2.0)
 * * MIT license
 *   (http://opensource.org/licenses/MIT)
 *
 * at your option.
 *
 * Unless you explicitly state otherwise, any contribution intentionally
 * submitted for inclusion in the work by you, as defined in the Apache-2.0
 * license, shall be dual licensed as above, without any additional terms or
 * conditions.
 */

//! Native WebSocket transport for Engine.IO, built on `tokio-tungstenite`.
//!
//! Engine.IO over WebSocket only uses text frames. Two tasks serve each
//! connection: a reader that forwards text frames to the caller, and a
//! writer that drains an outbound queue, so sending never waits on the
//! socket lock.
//!
//! ```no_run
//! use laser_transport::native_websocket::NativeWebSocketClient;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let (client, mut frames) = NativeWebSocketClient::connect(
//!     "ws://10.0.4.11:1916/socket.io/?EIO=4&transport=websocket",
//! ).await?;
//! client.send("40".to_string()).await?;
//! while let Some(frame) = frames.recv().await {
//!     println!("{frame}");
//! }
//! # Ok(())
//! # }
//! ```

use futures::{SinkExt, StreamExt};
use log::{debug, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::{self, Message};

/// Frames buffered between the reader task and the caller.
const INBOUND_QUEUE: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum WebSocketConnectError {
    /// The server answered the upgrade with an HTTP error, e.g. a wrong
    /// `/socket.io/` path.
    #[error("server refused the WebSocket upgrade with HTTP {0}")]
    Rejected(u16),
    #[error("cannot connect to {url}: {reason}")]
    Unreachable { url: String, reason: String },
    #[error("socket is closed")]
    Closed,
}

impl WebSocketConnectError {
    pub fn http_status(&self) -> Option<u16> {
        match self {
            Self::Rejected(status) => Some(*status),
            _ => None,
        }
    }
}

/// Handle to one open socket. Cloning shares the connection.
#[derive(Clone)]
pub struct NativeWebSocketClient {
    outbound: mpsc::UnboundedSender<Message>,
    open: Arc<AtomicBool>,
}

impl std::fmt::Debug for NativeWebSocketClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NativeWebSocketClient")
            .field("open", &self.is_connected())
            .finish()
    }
}

impl NativeWebSocketClient {
    /// Opens `url` and returns the handle plus the inbound text frames. The
    /// receiver ends once either side closes the socket.
    pub async fn connect(
        url: &str,
    ) -> Result<(Self, mpsc::Receiver<String>), WebSocketConnectError> {
        let (stream, response) = tokio_tungstenite::connect_async(url)
            .await
            .map_err(|e| match e {
                tungstenite::Error::Http(resp) => {
                    WebSocketConnectError::Rejected(resp.status().as_u16())
                }
                other => WebSocketConnectError::Unreachable {
                    url: url.to_string(),
                    reason: other.to_string(),
                },
            })?;
        info!("WebSocket open to {url} (HTTP {})", response.status());

        let (mut sink, mut source) = stream.split();
        let open = Arc::new(AtomicBool::new(true));
        let (outbound, mut queue) = mpsc::unbounded_channel::<Message>();
        let (frames, inbound) = mpsc::channel(INBOUND_QUEUE);

        let writer_open = open.clone();
        tokio::spawn(async move {
            while let Some(message) = queue.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(e) = sink.send(message).await {
                    warn!("WebSocket write failed: {e}");
                    break;
                }
                if closing {
                    break;
                }
            }
            writer_open.store(false, Ordering::Release);
        });

        let reader_open = open.clone();
        tokio::spawn(async move {
            while let Some(next) = source.next().await {
                match next {
                    Ok(Message::Text(text)) => {
                        if frames.send(text).await.is_err() {
                            break;
                        }
                    }
                    Ok(Message::Close(frame)) => {
                        debug!("WebSocket closed by peer: {frame:?}");
                        break;
                    }
                    Ok(Message::Binary(data)) => {
                        debug!("ignoring {} byte binary frame", data.len());
                    }
                    Ok(_) => {}
                    Err(e) => {
                        if reader_open.load(Ordering::Acquire) {
                            warn!("WebSocket read failed: {e}");
                        }
                        break;
                    }
                }
            }
            reader_open.store(false, Ordering::Release);
        });

        Ok((Self { outbound, open }, inbound))
    }

    /// Queues a text frame.
    pub async fn send(&self, text: String) -> Result<(), WebSocketConnectError> {
        if !self.is_connected() {
            return Err(WebSocketConnectError::Closed);
        }
        self.outbound
            .send(Message::Text(text))
            .map_err(|_| WebSocketConnectError::Closed)
    }

    pub fn is_connected(&self) -> bool {
        self.open.load(Ordering::Acquire)
    }

    /// Sends a close frame. Closing twice is a no-op.
    pub async fn close(&self) -> Result<(), WebSocketConnectError> {
        if self.open.swap(false, Ordering::AcqRel) {
            // The writer may already be gone if the peer closed first.
            let _ = self.outbound.send(Message::Close(None));
        }
        Ok(())
    }
}
