//! Registry installer: flattens the module tree into type-keyed registries.

use std::collections::HashMap;
use std::sync::Weak;

use indexmap::IndexMap;
use serde_json::Value;

use super::context::{GetterScope, LocalContext};
use super::{Store, StoreInner};
use crate::error::display_path;
use crate::module::{ActionFn, GetterFn, ModuleNode, ModuleTree, MutationFn};
use crate::state::StateTree;

pub(crate) struct MutationEntry {
    pub(crate) context: LocalContext,
    pub(crate) handler: MutationFn,
}

pub(crate) struct ActionEntry {
    pub(crate) context: LocalContext,
    pub(crate) handler: ActionFn,
}

#[derive(Clone)]
pub(crate) struct GetterEntry {
    context: LocalContext,
    handler: GetterFn,
}

impl GetterEntry {
    /// Run the raw getter against the module's local view and the root.
    pub(crate) fn evaluate(&self, store: &Store) -> Value {
        let state = self.context.state();
        let getters = self.context.getters();
        let root_state = store.state();
        let root_getters = store.getters();
        (self.handler)(&GetterScope {
            state: &state,
            getters: &getters,
            root_state: &root_state,
            root_getters: &root_getters,
        })
    }
}

/// Flat registries keyed by fully-qualified type.
///
/// Built in one pass and never patched afterwards: any change to the module
/// tree produces a brand new registry.
#[derive(Default)]
pub(crate) struct Registry {
    pub(crate) mutations: IndexMap<String, Vec<MutationEntry>>,
    pub(crate) actions: IndexMap<String, Vec<ActionEntry>>,
    pub(crate) getters: IndexMap<String, GetterEntry>,
    /// Namespaced modules by namespace, for the binding helpers.
    pub(crate) namespaces: HashMap<String, LocalContext>,
}

/// Which module states an install pass attaches to the live tree.
#[derive(Clone, Copy)]
pub(crate) enum Graft<'a> {
    /// Keep the live tree as it is.
    Nothing,
    /// Attach every module at or below this path.
    Under(&'a [String]),
}

pub(crate) struct Installer<'a> {
    store: Weak<StoreInner>,
    state: &'a StateTree,
    graft: Graft<'a>,
    registry: Registry,
}

impl<'a> Installer<'a> {
    pub(crate) fn new(store: Weak<StoreInner>, state: &'a StateTree, graft: Graft<'a>) -> Self {
        Self {
            store,
            state,
            graft,
            registry: Registry::default(),
        }
    }

    /// Walk the whole tree depth-first and return the finished registry.
    pub(crate) fn run(mut self, tree: &ModuleTree) -> Registry {
        let mut path = Vec::new();
        self.install(tree, tree.root(), &mut path);
        tracing::debug!(
            mutations = self.registry.mutations.len(),
            actions = self.registry.actions.len(),
            getters = self.registry.getters.len(),
            namespaces = self.registry.namespaces.len(),
            "Registries rebuilt"
        );
        self.registry
    }

    fn install(&mut self, tree: &ModuleTree, module: &ModuleNode, path: &mut Vec<String>) {
        let namespace = tree.namespace(path);

        self.graft_state(module, path);

        let local = LocalContext::new(self.store.clone(), namespace.clone(), path.clone());

        if module.namespaced() {
            if let Some(previous) = self.registry.namespaces.get(&namespace) {
                tracing::error!(
                    namespace = %namespace,
                    previous = %display_path(previous.path()),
                    module = %display_path(path),
                    "Duplicate namespace for a namespaced module; the later module wins"
                );
            }
            self.registry
                .namespaces
                .insert(namespace.clone(), local.clone());
        }

        for (key, handler) in module.mutations() {
            self.registry
                .mutations
                .entry(format!("{}{}", namespace, key))
                .or_default()
                .push(MutationEntry {
                    context: local.clone(),
                    handler: handler.clone(),
                });
        }

        for (key, action) in module.actions() {
            let kind = if action.root {
                key.clone()
            } else {
                format!("{}{}", namespace, key)
            };
            self.registry
                .actions
                .entry(kind)
                .or_default()
                .push(ActionEntry {
                    context: local.clone(),
                    handler: action.handler.clone(),
                });
        }

        for (key, getter) in module.getters() {
            let kind = format!("{}{}", namespace, key);
            if self.registry.getters.contains_key(&kind) {
                tracing::error!(getter = %kind, "Duplicate getter key; keeping the first");
                continue;
            }
            self.registry.getters.insert(
                kind,
                GetterEntry {
                    context: local.clone(),
                    handler: getter.clone(),
                },
            );
        }

        for (key, child) in module.children() {
            path.push(key.clone());
            self.install(tree, child, path);
            path.pop();
        }
    }

    fn graft_state(&self, module: &ModuleNode, path: &[String]) {
        let Graft::Under(prefix) = self.graft else {
            return;
        };
        // The root's state is the tree itself.
        let Some((key, parent)) = path.split_last() else {
            return;
        };
        if !path.starts_with(prefix) {
            return;
        }
        self.state
            .with_commit(|| self.state.attach(parent, key, module.state().clone()));
    }
}
