//! Mutation/action subscribers and derived-value watchers.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::Mutex;
use serde_json::Value;

use super::dispatch::{ActionRecord, MutationRecord};
use super::{Store, StoreInner};
use crate::reactive::Getters;

/// `(mutation, state after the mutation)`.
pub type MutationListener = dyn Fn(&MutationRecord, &Value) + Send + Sync;

/// `(action, state before any handler ran)`.
pub type ActionListener = dyn Fn(&ActionRecord, &Value) + Send + Sync;

/// Ordered listeners with stable ids.
///
/// Adding the same `Arc` twice yields the existing id, so shared listeners
/// are notified once.
pub(crate) struct SubscriberList<L: ?Sized> {
    next_id: AtomicU64,
    entries: Mutex<Vec<(u64, Arc<L>)>>,
}

impl<L: ?Sized> SubscriberList<L> {
    pub(crate) fn new() -> Self {
        Self {
            next_id: AtomicU64::new(1),
            entries: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn add(&self, listener: Arc<L>) -> u64 {
        let mut entries = self.entries.lock();
        if let Some((id, _)) = entries
            .iter()
            .find(|(_, existing)| Arc::ptr_eq(existing, &listener))
        {
            return *id;
        }
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        entries.push((id, listener));
        id
    }

    /// Remove by id; removing twice is a no-op.
    pub(crate) fn remove(&self, id: u64) {
        self.entries.lock().retain(|(existing, _)| *existing != id);
    }

    /// Listeners in subscription order, copied so none run under the lock.
    pub(crate) fn snapshot(&self) -> Vec<Arc<L>> {
        self.entries
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}

type WatchGetter = dyn Fn(&Value, &Getters) -> Value + Send + Sync;
type WatchCallback = dyn Fn(&Value, &Value) + Send + Sync;

/// A derived value and the callback fired when it changes.
pub(crate) struct Watcher {
    getter: Box<WatchGetter>,
    callback: Box<WatchCallback>,
    last: Mutex<Value>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WatchOptions {
    /// Fire the callback once on registration with `null` as the old value.
    pub immediate: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Mutations,
    Actions,
    Watchers,
}

/// Handle returned by the `subscribe*` and `watch` calls.
///
/// Dropping it keeps the listener; call [`Subscription::unsubscribe`].
#[derive(Debug, Clone)]
pub struct Subscription {
    store: Weak<StoreInner>,
    channel: Channel,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(&self) {
        let Some(inner) = self.store.upgrade() else {
            return;
        };
        match self.channel {
            Channel::Mutations => inner.subscribers.remove(self.id),
            Channel::Actions => inner.action_subscribers.remove(self.id),
            Channel::Watchers => inner.watchers.remove(self.id),
        }
    }
}

impl Store {
    /// Observe every committed mutation.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&MutationRecord, &Value) + Send + Sync + 'static,
    {
        self.subscribe_shared(Arc::new(listener))
    }

    /// Like [`Store::subscribe`]; subscribing the same `Arc` again is a no-op.
    pub fn subscribe_shared(&self, listener: Arc<MutationListener>) -> Subscription {
        let id = self.inner.subscribers.add(listener);
        self.subscription(Channel::Mutations, id)
    }

    /// Observe every dispatched action, before its handlers run.
    pub fn subscribe_action<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&ActionRecord, &Value) + Send + Sync + 'static,
    {
        self.subscribe_action_shared(Arc::new(listener))
    }

    pub fn subscribe_action_shared(&self, listener: Arc<ActionListener>) -> Subscription {
        let id = self.inner.action_subscribers.add(listener);
        self.subscription(Channel::Actions, id)
    }

    /// Call `callback(new, old)` whenever the value `getter` derives from
    /// the root state and getters changes.
    pub fn watch<G, C>(&self, getter: G, callback: C, options: WatchOptions) -> Subscription
    where
        G: Fn(&Value, &Getters) -> Value + Send + Sync + 'static,
        C: Fn(&Value, &Value) + Send + Sync + 'static,
    {
        let initial = getter(&self.state(), &self.getters());
        if options.immediate {
            callback(&initial, &Value::Null);
        }
        let watcher = Watcher {
            getter: Box::new(getter),
            callback: Box::new(callback),
            last: Mutex::new(initial),
        };
        let id = self.inner.watchers.add(Arc::new(watcher));
        self.subscription(Channel::Watchers, id)
    }

    /// Re-evaluate every watcher against the current state.
    pub(crate) fn notify_watchers(&self) {
        let watchers = self.inner.watchers.snapshot();
        if watchers.is_empty() {
            return;
        }
        let state = self.state();
        let getters = self.getters();
        for watcher in watchers {
            let current = (watcher.getter)(&state, &getters);
            let previous = {
                let mut last = watcher.last.lock();
                if *last == current {
                    continue;
                }
                std::mem::replace(&mut *last, current.clone())
            };
            (watcher.callback)(&current, &previous);
        }
    }

    fn subscription(&self, channel: Channel, id: u64) -> Subscription {
        tracing::trace!(?channel, id, "Listener added");
        Subscription {
            store: Arc::downgrade(&self.inner),
            channel,
            id,
        }
    }
}
