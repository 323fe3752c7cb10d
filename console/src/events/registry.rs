//! Per-event-type listener registry

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::{error, trace};

use crate::events::event::{EventType, SseEvent};

/// Listener callback
pub type Callback = Arc<dyn Fn(&SseEvent) + Send + Sync>;

/// Identifies one registration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type ListenerMap = HashMap<EventType, Vec<(SubscriptionId, Callback)>>;

#[derive(Default)]
struct Inner {
    next_id: AtomicU64,
    listeners: Mutex<ListenerMap>,
}

/// Mapping from event type to the set of callbacks registered under it.
///
/// Cloning shares the same registry. Independent registries do not see each
/// other's listeners.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    inner: Arc<Inner>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback` under `event_type`
    pub fn subscribe<F>(&self, event_type: EventType, callback: F) -> Subscription
    where
        F: Fn(&SseEvent) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = self.lock();
        listeners
            .entry(event_type)
            .or_default()
            .push((id, Arc::new(callback)));
        trace!("Subscribed {:?} to {}", id, event_type);

        Subscription {
            registry: Arc::downgrade(&self.inner),
            event_type,
            id,
            active: true,
        }
    }

    /// Deliver an event to its type's callbacks, then to the generic ones.
    ///
    /// A panicking callback is logged and does not stop delivery. Returns the
    /// number of callbacks that completed normally.
    pub fn dispatch(&self, event: &SseEvent) -> usize {
        let (specific, generic) = {
            let listeners = self.lock();
            let specific = callbacks_of(&listeners, event.event_type);
            let generic = if event.event_type == EventType::Message {
                Vec::new()
            } else {
                callbacks_of(&listeners, EventType::Message)
            };
            (specific, generic)
        };

        let mut delivered = 0;
        for (id, callback) in specific.iter().chain(generic.iter()) {
            match catch_unwind(AssertUnwindSafe(|| callback(event))) {
                Ok(()) => delivered += 1,
                Err(panic) => {
                    error!(
                        "Listener {:?} panicked while handling {}: {}",
                        id,
                        event.event_type,
                        panic_message(&panic)
                    );
                }
            }
        }
        delivered
    }

    /// Number of callbacks registered under a type
    pub fn listener_count(&self, event_type: EventType) -> usize {
        self.lock().get(&event_type).map_or(0, Vec::len)
    }

    /// Whether the type currently has a registration entry
    pub fn is_registered(&self, event_type: EventType) -> bool {
        self.lock().contains_key(&event_type)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ListenerMap> {
        lock_listeners(&self.inner)
    }
}

impl std::fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let listeners = self.lock();
        let counts: HashMap<_, _> = listeners.iter().map(|(k, v)| (*k, v.len())).collect();
        f.debug_struct("ListenerRegistry").field("listeners", &counts).finish()
    }
}

fn lock_listeners(inner: &Inner) -> std::sync::MutexGuard<'_, ListenerMap> {
    inner.listeners.lock().unwrap_or_else(|e| e.into_inner())
}

fn callbacks_of(listeners: &ListenerMap, event_type: EventType) -> Vec<(SubscriptionId, Callback)> {
    listeners
        .get(&event_type)
        .map(|entries| entries.iter().map(|(id, cb)| (*id, cb.clone())).collect())
        .unwrap_or_default()
}

fn panic_message(panic: &Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Capability that removes exactly one registration.
///
/// Dropping it unsubscribes as well.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    registry: Weak<Inner>,
    event_type: EventType,
    id: SubscriptionId,
    active: bool,
}

impl Subscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    /// Remove this callback; the type's entry goes away with its last callback
    pub fn unsubscribe(mut self) {
        self.remove();
    }

    fn remove(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;

        let Some(inner) = self.registry.upgrade() else {
            return;
        };
        let mut listeners = lock_listeners(&inner);
        if let Some(entries) = listeners.get_mut(&self.event_type) {
            entries.retain(|(id, _)| *id != self.id);
            if entries.is_empty() {
                listeners.remove(&self.event_type);
            }
        }
        trace!("Unsubscribed {:?} from {}", self.id, self.event_type);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.remove();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("event_type", &self.event_type)
            .field("id", &self.id)
            .field("active", &self.active)
            .finish()
    }
}
