//! In-memory connector.
//!
//! Useful for development and in-process testing. Every successful connect
//! creates a [`MemoryPeer`] that plays the server side of the link.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use editor_bridge_core::ConnectionConfig;
use tokio::sync::{mpsc, watch};

use crate::connector::{ConnectionError, Connector, Link, TransportEvent};

/// Server side of one in-memory link.
#[derive(Debug)]
pub struct MemoryPeer {
    /// Configuration the client connected with.
    pub config: ConnectionConfig,
    outbound: mpsc::UnboundedReceiver<String>,
    inbound: mpsc::UnboundedSender<TransportEvent>,
}

impl MemoryPeer {
    /// Deliver a text frame to the client. Returns `false` once the client
    /// has stopped reading.
    pub fn send_frame(&self, frame: impl Into<String>) -> bool {
        self.inbound.send(TransportEvent::Frame(frame.into())).is_ok()
    }

    /// Deliver a binary frame to the client.
    pub fn send_binary(&self, frame: impl Into<Vec<u8>>) -> bool {
        self.inbound.send(TransportEvent::Binary(frame.into())).is_ok()
    }

    /// Close the link from the server side.
    pub fn close(&self, reason: Option<&str>) {
        let _ = self.inbound.send(TransportEvent::Closed {
            reason: reason.map(str::to_string),
        });
    }

    /// Whether the client still holds its end of the link.
    #[must_use]
    pub fn is_live(&self) -> bool {
        !self.outbound.is_closed()
    }

    /// Frames the client has sent so far.
    pub fn drain_sent(&mut self) -> Vec<String> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.outbound.try_recv() {
            frames.push(frame);
        }
        frames
    }
}

#[derive(Default)]
struct Inner {
    attempts: Vec<ConnectionConfig>,
    peers: Vec<MemoryPeer>,
    refusal: Option<String>,
}

/// Connector that links to in-process peers.
#[derive(Clone)]
pub struct MemoryConnector {
    inner: Arc<Mutex<Inner>>,
    gate: Arc<watch::Sender<bool>>,
}

impl Default for MemoryConnector {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryConnector {
    /// Create a connector that accepts every attempt immediately.
    #[must_use]
    pub fn new() -> Self {
        let (gate, _) = watch::channel(true);
        Self {
            inner: Arc::new(Mutex::new(Inner::default())),
            gate: Arc::new(gate),
        }
    }

    /// Fail subsequent attempts with `reason`.
    pub fn refuse(&self, reason: impl Into<String>) {
        self.lock().refusal = Some(reason.into());
    }

    /// Accept subsequent attempts again.
    pub fn accept(&self) {
        self.lock().refusal = None;
    }

    /// Hold subsequent attempts in flight until [`MemoryConnector::resume`].
    pub fn pause(&self) {
        self.gate.send_replace(false);
    }

    /// Let held attempts complete.
    pub fn resume(&self) {
        self.gate.send_replace(true);
    }

    /// Number of connect attempts made so far.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.lock().attempts.len()
    }

    /// Configuration used by the most recent attempt.
    #[must_use]
    pub fn last_config(&self) -> Option<ConnectionConfig> {
        self.lock().attempts.last().cloned()
    }

    /// Number of links the client still holds open.
    #[must_use]
    pub fn live_links(&self) -> usize {
        self.lock().peers.iter().filter(|p| p.is_live()).count()
    }

    /// Run `f` against the most recently opened peer.
    pub fn with_latest_peer<R>(&self, f: impl FnOnce(&mut MemoryPeer) -> R) -> Option<R> {
        self.lock().peers.last_mut().map(f)
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl Connector for MemoryConnector {
    async fn connect(&self, config: &ConnectionConfig) -> Result<Link, ConnectionError> {
        self.lock().attempts.push(config.clone());

        let mut gate = self.gate.subscribe();
        if gate.wait_for(|open| *open).await.is_err() {
            return Err(ConnectionError::Unreachable {
                authority: config.authority(),
                reason: "connector dropped".into(),
            });
        }

        let mut inner = self.lock();
        if let Some(reason) = &inner.refusal {
            return Err(ConnectionError::Unreachable {
                authority: config.authority(),
                reason: reason.clone(),
            });
        }

        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        inner.peers.push(MemoryPeer {
            config: config.clone(),
            outbound: outbound_rx,
            inbound: inbound_tx,
        });

        Ok(Link {
            outbound: outbound_tx,
            inbound: inbound_rx,
        })
    }
}
