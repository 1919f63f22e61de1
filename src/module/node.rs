use indexmap::IndexMap;
use serde_json::Value;

use super::raw::{ActionDef, GetterFn, Module, MutationFn};
use crate::error::StoreError;

/// One installed module: its definitions, initial state and children.
pub(crate) struct ModuleNode {
    /// Definitions only; declared children live in `children`.
    raw: Module,
    state: Value,
    children: IndexMap<String, ModuleNode>,
    /// Registered at runtime (and therefore removable).
    runtime: bool,
}

impl ModuleNode {
    /// Build a node and its declared descendants.
    pub(crate) fn build(raw: &Module, path: &[String], runtime: bool) -> Result<Self, StoreError> {
        raw.validate(path)?;
        Ok(Self::build_validated(raw, path, runtime))
    }

    fn build_validated(raw: &Module, path: &[String], runtime: bool) -> Self {
        let mut definitions = raw.clone();
        let declared = std::mem::take(&mut definitions.modules);

        let children = declared
            .iter()
            .map(|(key, child)| {
                let mut child_path = path.to_vec();
                child_path.push(key.clone());
                (key.clone(), Self::build_validated(child, &child_path, runtime))
            })
            .collect();

        Self {
            state: definitions.initial_state(),
            raw: definitions,
            children,
            runtime,
        }
    }

    pub(crate) fn namespaced(&self) -> bool {
        self.raw.is_namespaced()
    }

    pub(crate) fn runtime(&self) -> bool {
        self.runtime
    }

    /// State produced by the factory when this node was built.
    pub(crate) fn state(&self) -> &Value {
        &self.state
    }

    pub(crate) fn child(&self, key: &str) -> Option<&ModuleNode> {
        self.children.get(key)
    }

    pub(crate) fn child_mut(&mut self, key: &str) -> Option<&mut ModuleNode> {
        self.children.get_mut(key)
    }

    pub(crate) fn children(&self) -> impl Iterator<Item = (&String, &ModuleNode)> {
        self.children.iter()
    }

    pub(crate) fn has_children(&self) -> bool {
        !self.children.is_empty()
    }

    /// Insert `child` under `key`, returning the node it replaced.
    pub(crate) fn add_child(&mut self, key: String, child: ModuleNode) -> Option<ModuleNode> {
        self.children.insert(key, child)
    }

    pub(crate) fn remove_child(&mut self, key: &str) -> Option<ModuleNode> {
        self.children.shift_remove(key)
    }

    pub(crate) fn mutations(&self) -> impl Iterator<Item = (&String, &MutationFn)> {
        self.raw.mutations.iter().flatten()
    }

    pub(crate) fn actions(&self) -> impl Iterator<Item = (&String, &ActionDef)> {
        self.raw.actions.iter().flatten()
    }

    pub(crate) fn getters(&self) -> impl Iterator<Item = (&String, &GetterFn)> {
        self.raw.getters.iter().flatten()
    }

    /// Swap in the definitions `update` provides; keep the ones it omits.
    pub(crate) fn update_definitions(&mut self, update: &Module) {
        if let Some(namespaced) = update.namespaced {
            self.raw.namespaced = Some(namespaced);
        }
        if let Some(mutations) = &update.mutations {
            self.raw.mutations = Some(mutations.clone());
        }
        if let Some(actions) = &update.actions {
            self.raw.actions = Some(actions.clone());
        }
        if let Some(getters) = &update.getters {
            self.raw.getters = Some(getters.clone());
        }
    }
}
