//! Named-event publish/subscribe.
//!
//! `EventBus` is keyed by an event type's `Kind`, so each event enum
//! decides its own set of names (`object:added`, `execution:failed`, ...)
//! and handlers only ever see events of the kind they subscribed to.

use crate::id::SubscriptionId;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

/// An event that can travel over an [`EventBus`].
pub trait BusEvent: Send + Sync + 'static {
    /// The name space of this event type.
    type Kind: Copy + Eq + Hash + Send + Sync + 'static;

    /// Returns the name under which this event is published.
    fn kind(&self) -> Self::Kind;
}

/// A subscribed event handler.
pub type Handler<E> = Arc<dyn Fn(&E) + Send + Sync>;

/// A subscribe/unsubscribe/emit facility local to its owner.
pub struct EventBus<E: BusEvent> {
    handlers: RwLock<HashMap<E::Kind, Vec<(SubscriptionId, Handler<E>)>>>,
}

impl<E: BusEvent> EventBus<E> {
    /// Creates a bus with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
        }
    }

    /// Subscribes `handler` to events of `kind`.
    pub fn on<F>(&self, kind: E::Kind, handler: F) -> SubscriptionId
    where
        F: Fn(&E) + Send + Sync + 'static,
    {
        let id = SubscriptionId::new();
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(kind)
            .or_default()
            .push((id, Arc::new(handler)));
        id
    }

    /// Removes a subscription. Returns whether anything was removed.
    pub fn off(&self, kind: E::Kind, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        let Some(list) = handlers.get_mut(&kind) else {
            return false;
        };
        let before = list.len();
        list.retain(|(existing, _)| *existing != id);
        let removed = list.len() != before;
        if list.is_empty() {
            handlers.remove(&kind);
        }
        removed
    }

    /// Delivers `event` to every handler subscribed to its kind, in
    /// subscription order.
    ///
    /// The handler list is snapshotted first, so handlers may subscribe or
    /// unsubscribe while being called.
    pub fn emit(&self, event: &E) {
        let snapshot: Vec<Handler<E>> = {
            let handlers = self.handlers.read().unwrap_or_else(PoisonError::into_inner);
            match handlers.get(&event.kind()) {
                Some(list) => list.iter().map(|(_, handler)| Arc::clone(handler)).collect(),
                None => return,
            }
        };

        for handler in snapshot {
            handler(event);
        }
    }

    /// Returns the number of handlers subscribed to `kind`.
    #[must_use]
    pub fn listener_count(&self, kind: E::Kind) -> usize {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .map_or(0, Vec::len)
    }

    /// Drops every subscription.
    pub fn clear(&self) {
        self.handlers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl<E: BusEvent> Default for EventBus<E> {
    fn default() -> Self {
        Self::new()
    }
}
