//! Namespace-scoped views handed to handlers and getters.

use std::sync::{Arc, Weak};

use futures::future::{self, FutureExt};
use serde_json::Value;

use super::dispatch::ActionFuture;
use super::{Store, StoreInner};
use crate::reactive::{CellSet, Getters};
use crate::state::StateSlice;

/// Options for [`Store::commit_with`] and [`LocalContext::commit_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitOptions {
    /// Commit the type as-is, skipping the namespace prefix.
    pub root: bool,
    /// No longer supported; setting it only produces a warning.
    pub silent: bool,
}

/// Options for [`LocalContext::dispatch_with`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DispatchOptions {
    /// Dispatch the type as-is, skipping the namespace prefix.
    pub root: bool,
}

/// A module's view of the store.
///
/// Types passed to `commit`/`dispatch` are local: inside a namespaced module
/// they get the namespace prepended. `state()` and `getters()` are resolved
/// on every call, so a context built before a re-registration still sees the
/// live tree.
#[derive(Clone)]
pub struct LocalContext {
    store: Weak<StoreInner>,
    namespace: String,
    path: Vec<String>,
}

impl LocalContext {
    pub(crate) fn new(store: Weak<StoreInner>, namespace: String, path: Vec<String>) -> Self {
        Self {
            store,
            namespace,
            path,
        }
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// Module path from the root.
    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// This module's slice of the state tree.
    pub fn state(&self) -> StateSlice {
        match self.store() {
            Some(store) => store.inner.state.slice(&self.path),
            None => StateSlice::new(Arc::new(Value::Null), self.path.clone()),
        }
    }

    /// Getters visible to this module, keys relative to its namespace.
    pub fn getters(&self) -> Getters {
        let Some(store) = self.store() else {
            return Getters::root(Arc::new(CellSet::default()));
        };
        if self.namespace.is_empty() {
            return store.getters();
        }
        let cells = store.inner.getters.read().clone();
        Getters::scoped(cells, &self.namespace)
    }

    pub fn commit(&self, kind: &str, payload: Value) {
        self.commit_with(kind, payload, CommitOptions::default());
    }

    pub fn commit_with(&self, kind: &str, payload: Value, options: CommitOptions) {
        let Some(store) = self.store() else {
            tracing::warn!(type_ = %kind, "Commit on a dropped store ignored");
            return;
        };
        if self.namespace.is_empty() || options.root {
            store.commit_with(kind, payload, options);
            return;
        }

        let qualified = format!("{}{}", self.namespace, kind);
        if !store.registry().mutations.contains_key(&qualified) {
            tracing::error!(
                local = %kind,
                global = %qualified,
                "Unknown local mutation type"
            );
            return;
        }
        store.commit_with(&qualified, payload, options);
    }

    pub fn dispatch(&self, kind: &str, payload: Value) -> ActionFuture {
        self.dispatch_with(kind, payload, DispatchOptions::default())
    }

    pub fn dispatch_with(&self, kind: &str, payload: Value, options: DispatchOptions) -> ActionFuture {
        let Some(store) = self.store() else {
            tracing::warn!(type_ = %kind, "Dispatch on a dropped store ignored");
            return future::ready(Ok(Value::Null)).boxed();
        };
        if self.namespace.is_empty() || options.root {
            return store.dispatch(kind, payload);
        }

        let qualified = format!("{}{}", self.namespace, kind);
        if !store.registry().actions.contains_key(&qualified) {
            tracing::error!(
                local = %kind,
                global = %qualified,
                "Unknown local action type"
            );
            return future::ready(Ok(Value::Null)).boxed();
        }
        store.dispatch(&qualified, payload)
    }

    fn store(&self) -> Option<Store> {
        self.store.upgrade().map(|inner| Store { inner })
    }
}

impl std::fmt::Debug for LocalContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalContext")
            .field("namespace", &self.namespace)
            .field("path", &self.path)
            .finish()
    }
}

/// What an action handler receives: the module's local context plus the
/// root state and getters.
#[derive(Clone)]
pub struct ActionContext {
    local: LocalContext,
    store: Store,
}

impl ActionContext {
    pub(crate) fn new(local: LocalContext, store: Store) -> Self {
        Self { local, store }
    }

    pub fn commit(&self, kind: &str, payload: Value) {
        self.local.commit(kind, payload);
    }

    pub fn commit_with(&self, kind: &str, payload: Value, options: CommitOptions) {
        self.local.commit_with(kind, payload, options);
    }

    pub fn dispatch(&self, kind: &str, payload: Value) -> ActionFuture {
        self.local.dispatch(kind, payload)
    }

    pub fn dispatch_with(&self, kind: &str, payload: Value, options: DispatchOptions) -> ActionFuture {
        self.local.dispatch_with(kind, payload, options)
    }

    pub fn state(&self) -> StateSlice {
        self.local.state()
    }

    pub fn getters(&self) -> Getters {
        self.local.getters()
    }

    pub fn root_state(&self) -> Arc<Value> {
        self.store.state()
    }

    pub fn root_getters(&self) -> Getters {
        self.store.getters()
    }

    pub fn namespace(&self) -> &str {
        self.local.namespace()
    }
}

/// Arguments of a getter: local and root state, local and root getters.
pub struct GetterScope<'a> {
    pub state: &'a Value,
    pub getters: &'a Getters,
    pub root_state: &'a Value,
    pub root_getters: &'a Getters,
}
