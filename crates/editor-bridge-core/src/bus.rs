//! Typed publish/subscribe bus.
//!
//! Every payload type gets its own channel. Channels are created lazily by the
//! first subscriber; publishing on a channel nobody has subscribed to is a
//! no-op. Handlers run synchronously, in registration order, before
//! [`EventBus::publish`] returns.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

type Handler<T> = Arc<dyn Fn(&T) + Send + Sync>;

/// Token identifying one registered handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription {
    channel: TypeId,
    id: u64,
}

struct Channel<T> {
    handlers: Mutex<Vec<(u64, Handler<T>)>>,
}

impl<T> Channel<T> {
    fn new() -> Self {
        Self {
            handlers: Mutex::new(Vec::new()),
        }
    }

    fn snapshot(&self) -> Vec<(u64, Handler<T>)> {
        lock(&self.handlers)
            .iter()
            .map(|(id, handler)| (*id, Arc::clone(handler)))
            .collect()
    }

    fn contains(&self, id: u64) -> bool {
        lock(&self.handlers).iter().any(|(h, _)| *h == id)
    }
}

/// Type-erased view of a channel so subscriptions can be removed without
/// knowing the payload type.
trait ErasedChannel: Send + Sync {
    fn remove(&self, id: u64) -> bool;
    fn len(&self) -> usize;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

impl<T: 'static> ErasedChannel for Channel<T> {
    fn remove(&self, id: u64) -> bool {
        let mut handlers = lock(&self.handlers);
        let before = handlers.len();
        handlers.retain(|(h, _)| *h != id);
        handlers.len() != before
    }

    fn len(&self) -> usize {
        lock(&self.handlers).len()
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Multi-channel synchronous event bus.
pub struct EventBus {
    channels: Mutex<HashMap<TypeId, Arc<dyn ErasedChannel>>>,
    next_id: AtomicU64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    /// Create an empty bus.
    #[must_use]
    pub fn new() -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register `handler` on the channel carrying `T`.
    pub fn subscribe<T, F>(&self, handler: F) -> Subscription
    where
        T: 'static,
        F: Fn(&T) + Send + Sync + 'static,
    {
        let channel = TypeId::of::<T>();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);

        let typed = {
            let mut channels = lock(&self.channels);
            let erased = channels
                .entry(channel)
                .or_insert_with(|| Arc::new(Channel::<T>::new()));
            downcast::<T>(Arc::clone(erased))
        };

        if let Some(typed) = typed {
            lock(&typed.handlers).push((id, Arc::new(handler)));
        }

        Subscription { channel, id }
    }

    /// Remove a handler. Safe to call from inside a handler; a handler removed
    /// mid-dispatch is not invoked for the rest of that dispatch.
    ///
    /// Returns `false` if the subscription was already gone.
    pub fn unsubscribe(&self, subscription: Subscription) -> bool {
        let channel = lock(&self.channels).get(&subscription.channel).cloned();
        channel.is_some_and(|c| c.remove(subscription.id))
    }

    /// Deliver `payload` to every handler of its channel.
    ///
    /// Returns the number of handlers invoked.
    pub fn publish<T: 'static>(&self, payload: &T) -> usize {
        let Some(channel) = self.channel::<T>() else {
            tracing::trace!(channel = std::any::type_name::<T>(), "No subscribers");
            return 0;
        };

        let mut delivered = 0;
        for (id, handler) in channel.snapshot() {
            if !channel.contains(id) {
                continue;
            }
            handler(payload);
            delivered += 1;
        }
        delivered
    }

    /// Whether any subscriber ever created the channel for `T`.
    #[must_use]
    pub fn has_channel<T: 'static>(&self) -> bool {
        lock(&self.channels).contains_key(&TypeId::of::<T>())
    }

    /// Number of handlers currently registered for `T`.
    #[must_use]
    pub fn subscriber_count<T: 'static>(&self) -> usize {
        lock(&self.channels)
            .get(&TypeId::of::<T>())
            .map_or(0, |c| c.len())
    }

    fn channel<T: 'static>(&self) -> Option<Arc<Channel<T>>> {
        let erased = lock(&self.channels).get(&TypeId::of::<T>()).cloned()?;
        downcast::<T>(erased)
    }
}

fn downcast<T: 'static>(erased: Arc<dyn ErasedChannel>) -> Option<Arc<Channel<T>>> {
    erased.into_any().downcast::<Channel<T>>().ok()
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
