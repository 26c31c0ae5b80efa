//! Identity change listeners.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::Mutex;

use crate::types::User;

/// Callback invoked with the newly resolved identity (`None` once signed out).
pub type Listener = Arc<dyn Fn(Option<&User>) + Send + Sync>;

/// Handle returned by [`Subscribers::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Insertion-ordered set of listeners.
///
/// Registering the same `Arc` twice returns the original id instead of adding
/// a second entry.
#[derive(Default)]
pub struct Subscribers {
    inner: Mutex<Registry>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: IndexMap<SubscriptionId, Listener>,
}

impl Subscribers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, listener: Listener) -> SubscriptionId {
        let mut registry = self.inner.lock();
        if let Some(id) = registry
            .listeners
            .iter()
            .find(|(_, existing)| same_listener(existing, &listener))
            .map(|(id, _)| *id)
        {
            return id;
        }
        let id = SubscriptionId(registry.next_id);
        registry.next_id += 1;
        registry.listeners.insert(id, listener);
        tracing::trace!(subscribers = registry.listeners.len(), "Listener subscribed");
        id
    }

    /// Removes a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.lock().listeners.shift_remove(&id).is_some()
    }

    /// Calls every listener in registration order.
    ///
    /// The registry lock is released before any listener runs.
    pub fn notify(&self, user: Option<&User>) {
        let snapshot: Vec<Listener> = self.inner.lock().listeners.values().cloned().collect();
        tracing::debug!(
            listeners = snapshot.len(),
            signed_in = user.is_some(),
            "Notifying identity listeners"
        );
        for listener in snapshot {
            listener(user);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().listeners.is_empty()
    }
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    std::ptr::eq(Arc::as_ptr(a).cast::<()>(), Arc::as_ptr(b).cast::<()>())
}
