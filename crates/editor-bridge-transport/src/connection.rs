//! Connection manager.
//!
//! Owns the transport and the connection state. Decoded inbound messages are
//! republished on the [`EventBus`]; state changes are published as
//! [`ConnectionStateChanged`]. Reconnection is always caller-initiated.
//!
//! Every connect attempt captures the current epoch. Teardown bumps the epoch,
//! so an attempt that completes after a `deactivate` or `reconnect` finds a
//! newer epoch and drops its link instead of installing it.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use editor_bridge_core::{
    ConnectionConfig, ConnectionState, ConnectionStateChanged, EventBus, Message,
};
use tokio::{sync::mpsc, task::JoinHandle};

use crate::{
    connector::{ConnectionError, Connector, Link, TransportEvent},
    protocol::{self, ClientMessage, DecodeError},
};

struct Inner {
    state: ConnectionState,
    epoch: u64,
    config: ConnectionConfig,
    /// Configuration of the most recent connect attempt, cleared on deactivate.
    opened_with: Option<ConnectionConfig>,
    outbound: Option<mpsc::UnboundedSender<String>>,
    reader: Option<JoinHandle<()>>,
}

/// Connection manager.
pub struct ConnectionManager<C: Connector> {
    connector: C,
    bus: Arc<EventBus>,
    inner: Mutex<Inner>,
}

impl<C: Connector> ConnectionManager<C> {
    /// Create a disconnected manager.
    #[must_use]
    pub fn new(connector: C, config: ConnectionConfig, bus: Arc<EventBus>) -> Arc<Self> {
        Arc::new(Self {
            connector,
            bus,
            inner: Mutex::new(Inner {
                state: ConnectionState::Disconnected,
                epoch: 0,
                config,
                opened_with: None,
                outbound: None,
                reader: None,
            }),
        })
    }

    #[must_use]
    pub fn state(&self) -> ConnectionState {
        self.lock().state
    }

    /// Configuration the next connect attempt will use.
    #[must_use]
    pub fn config(&self) -> ConnectionConfig {
        self.lock().config.clone()
    }

    /// Open the transport with the current configuration.
    ///
    /// No-op while already connecting or connected. An attempt superseded by
    /// a later `deactivate` or `reconnect` is discarded and reports `Ok`.
    ///
    /// # Errors
    /// Returns error if the transport cannot be opened; the manager stays
    /// disconnected and does not retry.
    pub async fn activate(self: &Arc<Self>) -> Result<(), ConnectionError> {
        let (epoch, config) = {
            let mut inner = self.lock();
            if inner.state != ConnectionState::Disconnected {
                tracing::debug!(state = ?inner.state, "Activate ignored");
                return Ok(());
            }
            inner.epoch += 1;
            inner.state = ConnectionState::Connecting;
            inner.opened_with = Some(inner.config.clone());
            (inner.epoch, inner.config.clone())
        };

        tracing::info!(server = %config.authority(), epoch, "Connecting to session server");
        self.bus
            .publish(&ConnectionStateChanged::new(ConnectionState::Connecting));

        let result = match config.validate() {
            Ok(()) => self.connector.connect(&config).await,
            Err(e) => Err(e.into()),
        };

        let mut inner = self.lock();
        if inner.epoch != epoch {
            drop(inner);
            tracing::debug!(epoch, "Discarding superseded connect attempt");
            return Ok(());
        }

        match result {
            Ok(Link { outbound, inbound }) => {
                inner.state = ConnectionState::Connected;
                inner.outbound = Some(outbound);
                inner.reader = Some(tokio::spawn(Arc::clone(self).read_loop(epoch, inbound)));
                drop(inner);

                tracing::info!(server = %config.authority(), "Connected to session server");
                self.bus
                    .publish(&ConnectionStateChanged::new(ConnectionState::Connected));
                Ok(())
            }
            Err(e) => {
                inner.state = ConnectionState::Disconnected;
                drop(inner);

                tracing::warn!(server = %config.authority(), "Connection failed: {e}");
                self.bus
                    .publish(&ConnectionStateChanged::disconnected(e.to_string()));
                Err(e)
            }
        }
    }

    /// Drop any existing transport and connect again.
    ///
    /// # Errors
    /// Returns error if the new transport cannot be opened.
    pub async fn reconnect(self: &Arc<Self>) -> Result<(), ConnectionError> {
        let previous = self.teardown();
        tracing::info!(?previous, "Reconnecting to session server");
        self.activate().await
    }

    /// Take a fresh configuration. Reconnects once if it differs from the one
    /// last used to connect; returns whether it did.
    ///
    /// # Errors
    /// Returns error if the reconnect fails.
    pub async fn configuration_changed(
        self: &Arc<Self>,
        config: ConnectionConfig,
    ) -> Result<bool, ConnectionError> {
        let changed = {
            let mut inner = self.lock();
            let changed = inner
                .opened_with
                .as_ref()
                .is_some_and(|used| *used != config);
            inner.config = config;
            changed
        };

        if !changed {
            tracing::debug!("Configuration unchanged, keeping connection");
            return Ok(false);
        }

        self.reconnect().await?;
        Ok(true)
    }

    /// Close the transport. Idempotent.
    pub fn deactivate(&self) {
        let previous = self.teardown();
        self.lock().opened_with = None;

        if previous != ConnectionState::Disconnected {
            tracing::info!("Disconnected from session server");
            self.bus
                .publish(&ConnectionStateChanged::new(ConnectionState::Disconnected));
        }
    }

    /// Send a message to the server.
    ///
    /// # Errors
    /// Returns error if no transport is open or encoding fails.
    pub fn send(&self, message: &ClientMessage) -> Result<(), ConnectionError> {
        let frame = protocol::encode(message)?;
        let inner = self.lock();
        match (&inner.state, &inner.outbound) {
            (ConnectionState::Connected, Some(tx)) => {
                tx.send(frame).map_err(|_| ConnectionError::NotConnected)
            }
            _ => Err(ConnectionError::NotConnected),
        }
    }

    /// Invalidate in-flight attempts and release the transport. Returns the
    /// state before teardown.
    fn teardown(&self) -> ConnectionState {
        let mut inner = self.lock();
        inner.epoch += 1;
        inner.outbound = None;
        if let Some(reader) = inner.reader.take() {
            reader.abort();
        }
        std::mem::replace(&mut inner.state, ConnectionState::Disconnected)
    }

    async fn read_loop(
        self: Arc<Self>,
        epoch: u64,
        mut inbound: mpsc::UnboundedReceiver<TransportEvent>,
    ) {
        let reason = loop {
            match inbound.recv().await {
                Some(TransportEvent::Frame(frame)) => {
                    if !self.is_current(epoch) {
                        return;
                    }
                    self.dispatch(protocol::decode(&frame));
                }
                Some(TransportEvent::Binary(frame)) => {
                    if !self.is_current(epoch) {
                        return;
                    }
                    self.dispatch(protocol::decode_binary(&frame));
                }
                Some(TransportEvent::Closed { reason }) => {
                    break reason.unwrap_or_else(|| "closed by server".to_string());
                }
                None => break "transport ended".to_string(),
            }
        };

        self.transport_lost(epoch, reason);
    }

    fn dispatch(&self, decoded: Result<Message, DecodeError>) {
        match decoded {
            Ok(message) => {
                let delivered = message.publish(&self.bus);
                if delivered == 0 {
                    tracing::debug!(kind = ?message.kind(), "No handler for message");
                }
            }
            Err(e) => tracing::warn!("Dropping inbound frame: {e}"),
        }
    }

    fn transport_lost(&self, epoch: u64, reason: String) {
        {
            let mut inner = self.lock();
            if inner.epoch != epoch {
                return;
            }
            inner.state = ConnectionState::Disconnected;
            inner.outbound = None;
            inner.reader = None;
        }

        tracing::warn!(%reason, "Connection to session server lost");
        self.bus
            .publish(&ConnectionStateChanged::disconnected(reason));
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.lock().epoch == epoch
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
