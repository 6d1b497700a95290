//! Listener registry shared by tick source implementations

use std::sync::{Arc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;
use ahash::AHashMap;

use super::{TickCallback, TickSubscription};

type ListenerMap = Mutex<AHashMap<u64, TickCallback>>;

/// Set of tick callbacks keyed by subscription id
#[derive(Default)]
pub struct TickListeners {
    listeners: Arc<ListenerMap>,
    next_id: AtomicU64,
}

impl TickListeners {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a callback; it stays registered while the subscription lives
    pub fn subscribe(&self, callback: TickCallback) -> TickSubscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        self.listeners.lock().insert(id, callback);

        let listeners: Weak<ListenerMap> = Arc::downgrade(&self.listeners);
        TickSubscription::new(move || {
            if let Some(listeners) = listeners.upgrade() {
                listeners.lock().remove(&id);
            }
        })
    }

    /// Deliver a tick to every registered callback
    pub fn emit(&self, time: i64) {
        // Snapshot first so callbacks may subscribe or unsubscribe
        let callbacks: Vec<TickCallback> = self.listeners.lock().values().cloned().collect();
        for callback in callbacks {
            callback(time);
        }
    }

    pub fn len(&self) -> usize {
        self.listeners.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::RwLock;

    #[test]
    fn test_dropping_subscription_unregisters() {
        let listeners = TickListeners::new();
        let seen = Arc::new(RwLock::new(Vec::new()));

        let sink = seen.clone();
        let subscription = listeners.subscribe(Arc::new(move |t| sink.write().push(t)));
        listeners.emit(5);
        assert_eq!(listeners.len(), 1);

        drop(subscription);
        listeners.emit(6);

        assert!(listeners.is_empty());
        assert_eq!(*seen.read(), vec![5]);
    }
}
