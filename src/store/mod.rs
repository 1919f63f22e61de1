//! The store: module tree, registries, state and notification channels.
//!
//! Every change to the module tree (construction, registration,
//! unregistration, hot update) rebuilds the registries and the getter cells
//! from scratch and swaps them in. Locks are never held while user code
//! runs; mutation handlers edit an owned copy of their slice.

mod context;
mod devtool;
mod dispatch;
mod install;
mod options;
mod strict;
mod subscribe;

pub use context::{ActionContext, CommitOptions, DispatchOptions, GetterScope, LocalContext};
pub use devtool::{DevtoolEvent, DevtoolHook, TracingDevtool};
pub use dispatch::{ActionFuture, ActionRecord, MutationRecord};
pub use options::{Plugin, RegisterOptions, StoreOptions};
pub use subscribe::{ActionListener, MutationListener, Subscription, WatchOptions};

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde_json::Value;

use crate::error::{display_path, StoreError};
use crate::module::{Module, ModuleTree};
use crate::reactive::{CellSet, Computation, EpochHost, Getters, ReactiveHost};
use crate::state::StateTree;
use install::{Graft, Installer, Registry};
use strict::ConsistencyGuard;
use subscribe::{SubscriberList, Watcher};

/// Cheap-to-clone handle to a store.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

pub(crate) struct StoreInner {
    state: StateTree,
    modules: Mutex<ModuleTree>,
    registry: RwLock<Arc<Registry>>,
    getters: RwLock<Arc<CellSet>>,
    host: Arc<dyn ReactiveHost>,
    subscribers: SubscriberList<MutationListener>,
    action_subscribers: SubscriberList<ActionListener>,
    watchers: SubscriberList<Watcher>,
    guard: ConsistencyGuard,
    devtool: RwLock<Option<Arc<dyn DevtoolHook>>>,
}

impl Store {
    /// Build a store from its root module.
    ///
    /// The root's declared modules are installed and their state grafted
    /// into the tree, then the devtool is attached and plugins run in order.
    pub fn new(root: Module, options: StoreOptions) -> Result<Self, StoreError> {
        let StoreOptions {
            strict,
            plugins,
            devtool,
            reactive_host,
        } = options;

        let tree = ModuleTree::new(&root)?;
        let host = reactive_host.unwrap_or_else(|| Arc::new(EpochHost::new()));
        let state = StateTree::new(tree.root().state().clone(), Arc::clone(&host));

        let store = Self {
            inner: Arc::new(StoreInner {
                state,
                modules: Mutex::new(tree),
                registry: RwLock::new(Arc::new(Registry::default())),
                getters: RwLock::new(Arc::new(CellSet::default())),
                host,
                subscribers: SubscriberList::new(),
                action_subscribers: SubscriberList::new(),
                watchers: SubscriberList::new(),
                guard: ConsistencyGuard::new(strict),
                devtool: RwLock::new(None),
            }),
        };

        {
            let modules = store.inner.modules.lock();
            store.rebuild(&modules, Graft::Under(&[]));
        }
        tracing::info!(strict, plugins = plugins.len(), "Store created");

        if let Some(hook) = devtool {
            store.attach_devtool(hook);
        }
        for plugin in plugins {
            plugin(&store);
        }
        Ok(store)
    }

    /// Snapshot of the whole state tree.
    pub fn state(&self) -> Arc<Value> {
        self.inner.state.snapshot()
    }

    /// Every getter, by fully-qualified key.
    pub fn getters(&self) -> Getters {
        Getters::root(self.inner.getters.read().clone())
    }

    pub fn is_strict(&self) -> bool {
        self.inner.guard.enabled()
    }

    /// Swap the whole state tree. Never a strict-mode violation.
    pub fn replace_state(&self, state: Value) {
        let tree = &self.inner.state;
        tree.with_commit(|| tree.replace(state));
        tracing::debug!("State replaced");
        self.notify_watchers();
    }

    /// Edit the state tree directly, bypassing mutations.
    ///
    /// In strict mode any change made this way is reported and returned as
    /// [`StoreError::StrictModeViolation`]; the change itself is kept.
    pub fn with_state_mut<R>(&self, f: impl FnOnce(&mut Value) -> R) -> Result<R, StoreError> {
        let guard = &self.inner.guard;
        let before = guard.observe(&self.inner.state);
        let result = self.inner.state.write_root(f);
        let verdict = guard.verify(&self.inner.state, before);
        self.notify_watchers();
        verdict.map(|()| result)
    }

    /// Add a module at `path` after construction.
    ///
    /// The parent must already exist. Unless `preserve_state` is set, the
    /// module's initial state (and its children's) is attached at `path`.
    pub fn register_module(
        &self,
        path: &[&str],
        module: Module,
        options: RegisterOptions,
    ) -> Result<(), StoreError> {
        let path = owned_path(path);
        {
            let mut modules = self.inner.modules.lock();
            modules.register(&path, &module, true)?;
            let graft = if options.preserve_state {
                Graft::Nothing
            } else {
                Graft::Under(&path)
            };
            self.rebuild(&modules, graft);
        }
        tracing::info!(
            path = %display_path(&path),
            preserve_state = options.preserve_state,
            "Module registered"
        );
        self.notify_watchers();
        Ok(())
    }

    /// Remove a runtime-registered module and its state.
    pub fn unregister_module(&self, path: &[&str]) {
        let path = owned_path(path);
        {
            let mut modules = self.inner.modules.lock();
            if !modules.unregister(&path) {
                return;
            }
            if let Some((key, parent)) = path.split_last() {
                let tree = &self.inner.state;
                tree.with_commit(|| tree.detach(parent, key));
            }
            self.rebuild(&modules, Graft::Nothing);
        }
        tracing::info!(path = %display_path(&path), "Module unregistered");
        self.notify_watchers();
    }

    pub fn has_module(&self, path: &[&str]) -> bool {
        self.inner.modules.lock().has(&owned_path(path))
    }

    /// Replace handler definitions in place, keeping the state tree.
    pub fn hot_update(&self, module: Module) -> Result<(), StoreError> {
        {
            let mut modules = self.inner.modules.lock();
            modules.update(&module)?;
            self.rebuild(&modules, Graft::Nothing);
        }
        tracing::info!("Hot update applied");
        self.notify_watchers();
        Ok(())
    }

    /// Attach a devtool observer and send it the current state.
    pub fn attach_devtool(&self, hook: Arc<dyn DevtoolHook>) {
        let state = self.state();
        hook.on_event(&DevtoolEvent::Init { state: &state });
        *self.inner.devtool.write() = Some(hook);
    }

    /// Local context of the namespaced module registered under `namespace`.
    pub(crate) fn module_context(&self, namespace: &str) -> Option<LocalContext> {
        self.registry().namespaces.get(namespace).cloned()
    }

    /// Context of the root module; commits and dispatches go straight to
    /// the store.
    pub(crate) fn root_context(&self) -> LocalContext {
        LocalContext::new(Arc::downgrade(&self.inner), String::new(), Vec::new())
    }

    pub(crate) fn registry(&self) -> Arc<Registry> {
        Arc::clone(&self.inner.registry.read())
    }

    fn devtool(&self) -> Option<Arc<dyn DevtoolHook>> {
        self.inner.devtool.read().clone()
    }

    /// Reinstall everything from `modules` and swap in the new registries
    /// and getter cells. The previous cell set is dropped once the last
    /// reader holding it is done.
    fn rebuild(&self, modules: &ModuleTree, graft: Graft<'_>) {
        let registry =
            Installer::new(Arc::downgrade(&self.inner), &self.inner.state, graft).run(modules);
        let cells = Arc::new(self.build_cells(&registry));
        *self.inner.registry.write() = Arc::new(registry);
        let previous = std::mem::replace(&mut *self.inner.getters.write(), cells);
        tracing::trace!(
            previous_getters = previous.len(),
            previous_readers = Arc::strong_count(&previous) - 1,
            "Getter cells swapped"
        );
    }

    fn build_cells(&self, registry: &Registry) -> CellSet {
        let store = Arc::downgrade(&self.inner);
        let computations = registry.getters.iter().map(|(kind, entry)| {
            let store = store.clone();
            let entry = entry.clone();
            let compute: Computation = Box::new(move || match store.upgrade() {
                Some(inner) => entry.evaluate(&Store { inner }),
                None => Value::Null,
            });
            (kind.clone(), compute)
        });
        CellSet::build(self.inner.host.as_ref(), computations)
    }
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let registry = self.registry();
        f.debug_struct("Store")
            .field("strict", &self.is_strict())
            .field("mutations", &registry.mutations.keys().collect::<Vec<_>>())
            .field("actions", &registry.actions.keys().collect::<Vec<_>>())
            .field("getters", &registry.getters.keys().collect::<Vec<_>>())
            .finish()
    }
}

fn owned_path(path: &[&str]) -> Vec<String> {
    path.iter().map(|segment| segment.to_string()).collect()
}
