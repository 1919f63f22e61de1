//! Binding helpers: map local names to state, getters, mutations and
//! actions, optionally scoped to a namespaced module.
//!
//! Helpers are built without a store and bound to one when read or called,
//! so the same bindings can serve several stores.
//!
//! ```ignore
//! let cart = create_namespaced_helpers("cart");
//! let getters = cart.map_getters(Bindings::keys(["total"]));
//! let total = getters["total"].read(&store);
//! ```

use std::sync::Arc;

use futures::future::{self, FutureExt};
use indexmap::IndexMap;
use serde_json::Value;

use crate::reactive::Getters;
use crate::store::{ActionFuture, LocalContext, Store};

type StateFn = dyn Fn(&Value, &Getters) -> Value + Send + Sync;
type MutationCallFn = dyn Fn(&LocalContext, Value) + Send + Sync;
type ActionCallFn = dyn Fn(&LocalContext, Value) -> ActionFuture + Send + Sync;

/// Ordered `alias → binding` pairs.
#[derive(Clone)]
pub struct Bindings<B> {
    entries: IndexMap<String, B>,
}

impl<B> Bindings<B> {
    pub fn new() -> Self {
        Self {
            entries: IndexMap::new(),
        }
    }

    /// Bind `alias` to `binding`.
    pub fn aliased(mut self, alias: impl Into<String>, binding: impl Into<B>) -> Self {
        self.entries.insert(alias.into(), binding.into());
        self
    }
}

impl<B: From<String>> Bindings<B> {
    /// Bind each key under its own name.
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entries = keys
            .into_iter()
            .map(|key| {
                let key = key.into();
                (key.clone(), B::from(key))
            })
            .collect();
        Self { entries }
    }
}

impl<B> Default for Bindings<B> {
    fn default() -> Self {
        Self::new()
    }
}

/// A state field by key, or a derivation over local state and getters.
#[derive(Clone)]
pub enum StateBinding {
    Key(String),
    Custom(Arc<StateFn>),
}

impl StateBinding {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value, &Getters) -> Value + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }
}

/// A mutation type, or a closure given the module's context to commit with.
#[derive(Clone)]
pub enum MutationBinding {
    Type(String),
    Custom(Arc<MutationCallFn>),
}

impl MutationBinding {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&LocalContext, Value) + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }
}

/// An action type, or a closure given the module's context to dispatch with.
#[derive(Clone)]
pub enum ActionBinding {
    Type(String),
    Custom(Arc<ActionCallFn>),
}

impl ActionBinding {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&LocalContext, Value) -> ActionFuture + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }
}

macro_rules! named_binding {
    ($binding:ident :: $variant:ident) => {
        impl From<String> for $binding {
            fn from(name: String) -> Self {
                Self::$variant(name)
            }
        }

        impl From<&str> for $binding {
            fn from(name: &str) -> Self {
                Self::$variant(name.to_string())
            }
        }
    };
}

named_binding!(StateBinding::Key);
named_binding!(MutationBinding::Type);
named_binding!(ActionBinding::Type);

#[derive(Clone)]
pub struct MappedState {
    namespace: String,
    binding: StateBinding,
}

impl MappedState {
    /// Current value; `null` when the key or the namespace is missing.
    pub fn read(&self, store: &Store) -> Value {
        let (state, getters) = if self.namespace.is_empty() {
            (store.state(), store.getters())
        } else {
            let Some(context) = module_by_namespace(store, "map_state", &self.namespace) else {
                return Value::Null;
            };
            (Arc::new(context.state().clone_value()), context.getters())
        };
        match &self.binding {
            StateBinding::Key(key) => state.get(key.as_str()).cloned().unwrap_or(Value::Null),
            StateBinding::Custom(f) => f(&state, &getters),
        }
    }
}

#[derive(Clone)]
pub struct MappedGetter {
    namespace: String,
    kind: String,
}

impl MappedGetter {
    /// Fully-qualified getter type this binding reads.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn read(&self, store: &Store) -> Value {
        if !self.namespace.is_empty()
            && module_by_namespace(store, "map_getters", &self.namespace).is_none()
        {
            return Value::Null;
        }
        match store.getters().get(&self.kind) {
            Some(value) => value,
            None => {
                tracing::error!(getter = %self.kind, "Unknown getter");
                Value::Null
            }
        }
    }
}

#[derive(Clone)]
pub struct MappedMutation {
    namespace: String,
    binding: MutationBinding,
}

impl MappedMutation {
    pub fn call(&self, store: &Store, payload: Value) {
        let Some(context) = scope(store, "map_mutations", &self.namespace) else {
            return;
        };
        match &self.binding {
            MutationBinding::Type(kind) => context.commit(kind, payload),
            MutationBinding::Custom(f) => f(&context, payload),
        }
    }
}

#[derive(Clone)]
pub struct MappedAction {
    namespace: String,
    binding: ActionBinding,
}

impl MappedAction {
    pub fn call(&self, store: &Store, payload: Value) -> ActionFuture {
        let Some(context) = scope(store, "map_actions", &self.namespace) else {
            return future::ready(Ok(Value::Null)).boxed();
        };
        match &self.binding {
            ActionBinding::Type(kind) => context.dispatch(kind, payload),
            ActionBinding::Custom(f) => f(&context, payload),
        }
    }
}

pub fn map_state(namespace: &str, bindings: Bindings<StateBinding>) -> IndexMap<String, MappedState> {
    let namespace = normalize_namespace(namespace);
    bindings
        .entries
        .into_iter()
        .map(|(alias, binding)| {
            let mapped = MappedState {
                namespace: namespace.clone(),
                binding,
            };
            (alias, mapped)
        })
        .collect()
}

/// Getter bindings; values are getter keys relative to `namespace`.
pub fn map_getters(namespace: &str, bindings: Bindings<String>) -> IndexMap<String, MappedGetter> {
    let namespace = normalize_namespace(namespace);
    bindings
        .entries
        .into_iter()
        .map(|(alias, key)| {
            let mapped = MappedGetter {
                kind: format!("{}{}", namespace, key),
                namespace: namespace.clone(),
            };
            (alias, mapped)
        })
        .collect()
}

pub fn map_mutations(
    namespace: &str,
    bindings: Bindings<MutationBinding>,
) -> IndexMap<String, MappedMutation> {
    let namespace = normalize_namespace(namespace);
    bindings
        .entries
        .into_iter()
        .map(|(alias, binding)| {
            let mapped = MappedMutation {
                namespace: namespace.clone(),
                binding,
            };
            (alias, mapped)
        })
        .collect()
}

pub fn map_actions(
    namespace: &str,
    bindings: Bindings<ActionBinding>,
) -> IndexMap<String, MappedAction> {
    let namespace = normalize_namespace(namespace);
    bindings
        .entries
        .into_iter()
        .map(|(alias, binding)| {
            let mapped = MappedAction {
                namespace: namespace.clone(),
                binding,
            };
            (alias, mapped)
        })
        .collect()
}

/// The four helpers with `namespace` filled in.
#[derive(Debug, Clone)]
pub struct NamespacedHelpers {
    namespace: String,
}

impl NamespacedHelpers {
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn map_state(&self, bindings: Bindings<StateBinding>) -> IndexMap<String, MappedState> {
        map_state(&self.namespace, bindings)
    }

    pub fn map_getters(&self, bindings: Bindings<String>) -> IndexMap<String, MappedGetter> {
        map_getters(&self.namespace, bindings)
    }

    pub fn map_mutations(
        &self,
        bindings: Bindings<MutationBinding>,
    ) -> IndexMap<String, MappedMutation> {
        map_mutations(&self.namespace, bindings)
    }

    pub fn map_actions(&self, bindings: Bindings<ActionBinding>) -> IndexMap<String, MappedAction> {
        map_actions(&self.namespace, bindings)
    }
}

pub fn create_namespaced_helpers(namespace: &str) -> NamespacedHelpers {
    NamespacedHelpers {
        namespace: normalize_namespace(namespace),
    }
}

/// `cart` → `cart/`. An empty namespace means the root.
pub fn normalize_namespace(namespace: &str) -> String {
    if namespace.is_empty() || namespace.ends_with('/') {
        namespace.to_string()
    } else {
        format!("{}/", namespace)
    }
}

fn scope(store: &Store, helper: &str, namespace: &str) -> Option<LocalContext> {
    if namespace.is_empty() {
        Some(store.root_context())
    } else {
        module_by_namespace(store, helper, namespace)
    }
}

fn module_by_namespace(store: &Store, helper: &str, namespace: &str) -> Option<LocalContext> {
    let context = store.module_context(namespace);
    if context.is_none() {
        tracing::error!(
            helper,
            namespace = %namespace,
            "Module namespace not found in {}(): {}",
            helper,
            namespace
        );
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespace_gets_trailing_slash() {
        assert_eq!(normalize_namespace("cart"), "cart/");
        assert_eq!(normalize_namespace("cart/"), "cart/");
        assert_eq!(normalize_namespace("a/b"), "a/b/");
        assert_eq!(normalize_namespace(""), "");
    }

    #[test]
    fn keys_bind_under_their_own_name() {
        let getters = map_getters("cart", Bindings::keys(["total", "count"]));
        let aliases: Vec<_> = getters.keys().cloned().collect();
        assert_eq!(aliases, vec!["total", "count"]);
        assert_eq!(getters["total"].kind(), "cart/total");
    }

    #[test]
    fn aliases_keep_insertion_order() {
        let mutations = map_mutations(
            "",
            Bindings::new()
                .aliased("add", "increment")
                .aliased("log", MutationBinding::custom(|_, _| {})),
        );
        let aliases: Vec<_> = mutations.keys().cloned().collect();
        assert_eq!(aliases, vec!["add", "log"]);
        assert!(matches!(
            &mutations["add"].binding,
            MutationBinding::Type(kind) if kind == "increment"
        ));
    }

    #[test]
    fn namespaced_helpers_share_namespace() {
        let helpers = create_namespaced_helpers("account/settings");
        assert_eq!(helpers.namespace(), "account/settings/");
        let getters = helpers.map_getters(Bindings::new().aliased("dark", "isDark".to_string()));
        assert_eq!(getters["dark"].kind(), "account/settings/isDark");
    }
}
