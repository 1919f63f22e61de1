//! Raw module definitions, as authored by users.

use std::future::Future;
use std::sync::Arc;

use futures::future::{self, BoxFuture, FutureExt};
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{display_path, StoreError};
use crate::store::{ActionContext, GetterScope};

/// `(local_state, payload)`; edits the module's slice in place.
pub type MutationFn = Arc<dyn Fn(&mut Value, &Value) + Send + Sync>;

/// `(context, payload)`; may suspend, resolves to the action's result.
pub type ActionFn =
    Arc<dyn Fn(ActionContext, Value) -> BoxFuture<'static, anyhow::Result<Value>> + Send + Sync>;

/// Pure derivation from local/root state and getters.
pub type GetterFn = Arc<dyn Fn(&GetterScope<'_>) -> Value + Send + Sync>;

/// Produces a module's initial state on every registration.
pub type StateFactory = Arc<dyn Fn() -> Value + Send + Sync>;

#[derive(Clone)]
pub struct ActionDef {
    pub(crate) handler: ActionFn,
    /// Registered under its bare key even inside a namespaced module.
    pub(crate) root: bool,
}

/// A module: state, mutations, actions, getters and child modules.
///
/// Definition maps are `None` until the first entry is added, which lets a
/// hot update tell "not provided" apart from "provided and empty".
///
/// ```ignore
/// let cart = Module::new()
///     .namespaced(true)
///     .state(json!({"items": []}))
///     .mutation("add", |state, item| {
///         state["items"].as_array_mut().map(|items| items.push(item.clone()));
///     })
///     .getter("count", |scope| json!(scope.state["items"].as_array().map_or(0, Vec::len)));
/// ```
#[derive(Clone, Default)]
pub struct Module {
    pub(crate) state: Option<StateFactory>,
    pub(crate) namespaced: Option<bool>,
    pub(crate) mutations: Option<IndexMap<String, MutationFn>>,
    pub(crate) actions: Option<IndexMap<String, ActionDef>>,
    pub(crate) getters: Option<IndexMap<String, GetterFn>>,
    pub(crate) modules: IndexMap<String, Module>,
}

impl Module {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn namespaced(mut self, namespaced: bool) -> Self {
        self.namespaced = Some(namespaced);
        self
    }

    /// Initial state; cloned for every registration.
    pub fn state(self, state: Value) -> Self {
        self.state_fn(move || state.clone())
    }

    /// Initial state built by a factory, called once per registration.
    pub fn state_fn<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.state = Some(Arc::new(factory));
        self
    }

    pub fn mutation<F>(mut self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(&mut Value, &Value) + Send + Sync + 'static,
    {
        self.mutations
            .get_or_insert_with(IndexMap::new)
            .insert(kind.into(), Arc::new(handler));
        self
    }

    pub fn action<F, Fut>(self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ActionContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.insert_action(kind.into(), boxed_action(handler), false)
    }

    /// An action whose handler returns a plain value instead of a future.
    pub fn action_sync<F>(self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ActionContext, Value) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        let handler: ActionFn =
            Arc::new(move |context, payload| future::ready(handler(context, payload)).boxed());
        self.insert_action(kind.into(), handler, false)
    }

    /// An action registered under its bare key, ignoring the namespace.
    pub fn root_action<F, Fut>(self, kind: impl Into<String>, handler: F) -> Self
    where
        F: Fn(ActionContext, Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
    {
        self.insert_action(kind.into(), boxed_action(handler), true)
    }

    pub fn getter<F>(mut self, kind: impl Into<String>, getter: F) -> Self
    where
        F: Fn(&GetterScope<'_>) -> Value + Send + Sync + 'static,
    {
        self.getters
            .get_or_insert_with(IndexMap::new)
            .insert(kind.into(), Arc::new(getter));
        self
    }

    /// Nest a child module under `key`.
    pub fn module(mut self, key: impl Into<String>, module: Module) -> Self {
        self.modules.insert(key.into(), module);
        self
    }

    pub(crate) fn is_namespaced(&self) -> bool {
        self.namespaced.unwrap_or(false)
    }

    /// Evaluate the state factory; modules without state get an empty object.
    pub(crate) fn initial_state(&self) -> Value {
        match &self.state {
            Some(factory) => factory(),
            None => Value::Object(Map::new()),
        }
    }

    /// Check the shape of this module and every declared descendant.
    pub(crate) fn validate(&self, path: &[String]) -> Result<(), StoreError> {
        let invalid = |message: String| StoreError::InvalidModule {
            path: display_path(path),
            message,
        };

        let keys = self
            .mutations
            .iter()
            .flat_map(|m| m.keys())
            .map(|key| ("mutation", key))
            .chain(
                self.actions
                    .iter()
                    .flat_map(|a| a.keys())
                    .map(|key| ("action", key)),
            )
            .chain(
                self.getters
                    .iter()
                    .flat_map(|g| g.keys())
                    .map(|key| ("getter", key)),
            );
        for (what, key) in keys {
            if key.is_empty() {
                return Err(invalid(format!("{} names must not be empty", what)));
            }
        }

        for (key, child) in &self.modules {
            if key.is_empty() || key.contains('/') {
                return Err(invalid(format!(
                    "child module key '{}' must be non-empty and must not contain '/'",
                    key
                )));
            }
            let mut child_path = path.to_vec();
            child_path.push(key.clone());
            child.validate(&child_path)?;
        }
        Ok(())
    }

    fn insert_action(mut self, kind: String, handler: ActionFn, root: bool) -> Self {
        self.actions
            .get_or_insert_with(IndexMap::new)
            .insert(kind, ActionDef { handler, root });
        self
    }
}

fn boxed_action<F, Fut>(handler: F) -> ActionFn
where
    F: Fn(ActionContext, Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<Value>> + Send + 'static,
{
    Arc::new(move |context, payload| handler(context, payload).boxed())
}

impl std::fmt::Debug for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        fn keys<'a>(map: Option<Vec<&'a String>>) -> Vec<&'a String> {
            map.unwrap_or_default()
        }
        f.debug_struct("Module")
            .field("namespaced", &self.is_namespaced())
            .field("mutations", &keys(self.mutations.as_ref().map(|m| m.keys().collect())))
            .field("actions", &keys(self.actions.as_ref().map(|a| a.keys().collect())))
            .field("getters", &keys(self.getters.as_ref().map(|g| g.keys().collect())))
            .field("modules", &self.modules.keys().collect::<Vec<_>>())
            .finish()
    }
}
