//! WebSocket connector.

use std::time::Duration;

use async_trait::async_trait;
use editor_bridge_core::ConnectionConfig;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::Message as WsMessage};

use crate::connector::{ConnectionError, Connector, Link, TransportEvent};

/// Default limit on the opening handshake.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connector speaking JSON text frames over `ws://host:port/`.
#[derive(Debug, Clone)]
pub struct WebSocketConnector {
    connect_timeout: Duration,
    path: String,
}

impl Default for WebSocketConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl WebSocketConnector {
    #[must_use]
    pub fn new() -> Self {
        Self {
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            path: "/".to_string(),
        }
    }

    /// Override the handshake timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    /// Override the request path (must start with `/`).
    #[must_use]
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// URL for `config`.
    #[must_use]
    pub fn url(&self, config: &ConnectionConfig) -> String {
        format!("ws://{}{}", config.authority(), self.path)
    }
}

#[async_trait]
impl Connector for WebSocketConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Link, ConnectionError> {
        let url = self.url(config);
        let authority = config.authority();

        let (stream, _response) = tokio::time::timeout(self.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| ConnectionError::TimedOut {
                authority: authority.clone(),
                after: self.connect_timeout,
            })?
            .map_err(|e| ConnectionError::Unreachable {
                authority,
                reason: e.to_string(),
            })?;

        let (mut sink, mut source) = stream.split();
        let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<String>();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();

        // Forward outbound frames; a dropped sender closes the socket.
        tokio::spawn(async move {
            while let Some(frame) = outbound_rx.recv().await {
                if let Err(e) = sink.send(WsMessage::Text(frame)).await {
                    tracing::error!("Failed to send frame: {e}");
                    break;
                }
            }
            let _ = sink.close().await;
        });

        tokio::spawn(async move {
            let reason = loop {
                tokio::select! {
                    () = inbound_tx.closed() => return,
                    next = source.next() => match next {
                        Some(Ok(WsMessage::Text(text))) => {
                            if inbound_tx.send(TransportEvent::Frame(text)).is_err() {
                                return;
                            }
                        }
                        Some(Ok(WsMessage::Binary(data))) => {
                            if inbound_tx.send(TransportEvent::Binary(data)).is_err() {
                                return;
                            }
                        }
                        Some(Ok(WsMessage::Close(frame))) => {
                            break frame
                                .map(|f| f.reason.to_string())
                                .filter(|r| !r.is_empty());
                        }
                        Some(Ok(_)) => {}
                        Some(Err(e)) => {
                            tracing::error!("WebSocket error: {e}");
                            break Some(e.to_string());
                        }
                        None => break None,
                    },
                }
            };
            let _ = inbound_tx.send(TransportEvent::Closed { reason });
        });

        Ok(Link {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
