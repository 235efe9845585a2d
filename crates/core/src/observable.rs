//! Observable state holder
//!
//! An [`Observable`] owns the current value of some published state and the
//! list of parties interested in it. Consumers either register a callback and
//! keep the returned [`Subscription`] alive for as long as they want updates,
//! or take a tokio `watch` receiver to await changes.
//!
//! The holder owns its subscribers; a subscription only holds a weak
//! reference back to the holder, so dropping either side never leaks the
//! other.
//!
//! Writes are serialized: every subscriber sees values in the order they were
//! stored, and the last value a subscriber saw is the current one. A callback
//! must not write to the observable that invoked it.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tokio::sync::watch;
use tracing::trace;

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Subscribers<T> {
    next_id: u64,
    callbacks: BTreeMap<u64, Callback<T>>,
}

struct Inner<T> {
    tx: watch::Sender<T>,
    subscribers: Mutex<Subscribers<T>>,
    /// Held across store and dispatch
    write: Mutex<()>,
}

impl<T> Inner<T> {
    fn write(&self) -> MutexGuard<'_, ()> {
        self.write
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn subscribers(&self) -> MutexGuard<'_, Subscribers<T>> {
        // A panicking callback never runs under this lock, so the data is intact
        self.subscribers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

trait Unsubscribe: Send + Sync {
    fn unsubscribe(&self, id: u64);
}

impl<T: Send + Sync> Unsubscribe for Inner<T> {
    fn unsubscribe(&self, id: u64) {
        self.subscribers().callbacks.remove(&id);
    }
}

/// Shared, cloneable holder of a published value
pub struct Observable<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Observable<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Default + Clone + Send + Sync + 'static> Default for Observable<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone + Send + Sync + 'static> Observable<T> {
    pub fn new(initial: T) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self {
            inner: Arc::new(Inner {
                tx,
                subscribers: Mutex::new(Subscribers {
                    next_id: 0,
                    callbacks: BTreeMap::new(),
                }),
                write: Mutex::new(()),
            }),
        }
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.inner.tx.borrow().clone()
    }

    /// Replace the value and notify every subscriber
    pub fn set(&self, value: T) {
        let _write = self.inner.write();
        self.inner.tx.send_replace(value.clone());
        self.notify(&value);
    }

    /// Mutate the value in place and notify every subscriber
    pub fn update(&self, f: impl FnOnce(&mut T)) {
        let _write = self.inner.write();
        self.inner.tx.send_modify(f);
        let value = self.get();
        self.notify(&value);
    }

    /// Register a callback invoked with every new value
    ///
    /// The callback stays registered until the returned [`Subscription`] is
    /// dropped.
    #[must_use = "dropping the subscription unregisters the callback"]
    pub fn subscribe(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        self.register(callback)
    }

    /// Snapshot the value and register a callback for every later one
    ///
    /// No write can land between the snapshot and the registration, so the
    /// callback starts exactly where the snapshot ends.
    #[must_use = "dropping the subscription unregisters the callback"]
    pub fn subscribe_from_current(
        &self,
        callback: impl Fn(&T) + Send + Sync + 'static,
    ) -> (T, Subscription) {
        let _write = self.inner.write();
        let current = self.get();
        (current, self.register(callback))
    }

    fn register(&self, callback: impl Fn(&T) + Send + Sync + 'static) -> Subscription {
        let id = {
            let mut subs = self.inner.subscribers();
            let id = subs.next_id;
            subs.next_id += 1;
            subs.callbacks.insert(id, Arc::new(callback));
            id
        };
        trace!(subscription = id, "Observer registered");
        let holder: Weak<dyn Unsubscribe> = Arc::downgrade(&self.inner) as Weak<dyn Unsubscribe>;
        Subscription { id, holder }
    }

    /// Async view of the value
    pub fn watch(&self) -> watch::Receiver<T> {
        self.inner.tx.subscribe()
    }

    /// Number of live callback subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers().callbacks.len()
    }

    fn notify(&self, value: &T) {
        // Callbacks run outside the lock so they may subscribe or unsubscribe
        let callbacks: Vec<Callback<T>> =
            self.inner.subscribers().callbacks.values().cloned().collect();
        for callback in callbacks {
            callback(value);
        }
    }
}

/// Registration handle returned by [`Observable::subscribe`]
///
/// Dropping it unregisters the callback. It does not keep the observable
/// alive.
pub struct Subscription {
    id: u64,
    holder: Weak<dyn Unsubscribe>,
}

impl Subscription {
    /// Unregister explicitly; equivalent to dropping
    pub fn cancel(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(holder) = self.holder.upgrade() {
            holder.unsubscribe(self.id);
            trace!(subscription = self.id, "Observer unregistered");
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Observable<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Observable")
            .field("value", &*self.inner.tx.borrow())
            .finish()
    }
}
