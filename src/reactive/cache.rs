//! Derivation cache: the set of getter cells and the views handed to callers.

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use super::{Computation, ReactiveCell, ReactiveHost};

/// Every registered getter wrapped as a host cell, keyed by qualified type.
///
/// A new set is built on every registry rebuild. Readers hold an `Arc` to
/// the set they started with, so a set being replaced stays alive until the
/// last in-flight read finishes.
#[derive(Default)]
pub struct CellSet {
    cells: IndexMap<String, Arc<dyn ReactiveCell>>,
}

impl CellSet {
    pub fn build<I>(host: &dyn ReactiveHost, computations: I) -> Self
    where
        I: IntoIterator<Item = (String, Computation)>,
    {
        let cells = computations
            .into_iter()
            .map(|(kind, compute)| (kind, host.wrap(compute)))
            .collect();
        Self { cells }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Read-only view over getter values.
///
/// The root view exposes every qualified key. A namespaced view only
/// exposes keys under its namespace, with the prefix stripped. Values are
/// resolved on access, never copied up front.
#[derive(Clone)]
pub struct Getters {
    cells: Arc<CellSet>,
    prefix: String,
}

impl Getters {
    pub(crate) fn root(cells: Arc<CellSet>) -> Self {
        Self {
            cells,
            prefix: String::new(),
        }
    }

    pub(crate) fn scoped(cells: Arc<CellSet>, namespace: &str) -> Self {
        Self {
            cells,
            prefix: namespace.to_string(),
        }
    }

    /// Namespace prefix of this view (empty for the root view).
    pub fn namespace(&self) -> &str {
        &self.prefix
    }

    /// Current value of a getter, or `None` if no such getter exists.
    pub fn get(&self, key: &str) -> Option<Value> {
        self.cell(key).map(|cell| cell.read())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.cell(key).is_some()
    }

    /// Keys visible through this view.
    pub fn keys(&self) -> Vec<String> {
        self.cells
            .cells
            .keys()
            .filter_map(|kind| kind.strip_prefix(self.prefix.as_str()))
            .map(str::to_string)
            .collect()
    }

    /// Evaluate every visible getter into a JSON object.
    pub fn to_map(&self) -> Map<String, Value> {
        self.keys()
            .into_iter()
            .filter_map(|key| self.get(&key).map(|value| (key, value)))
            .collect()
    }

    fn cell(&self, key: &str) -> Option<&Arc<dyn ReactiveCell>> {
        if self.prefix.is_empty() {
            self.cells.cells.get(key)
        } else {
            self.cells.cells.get(&format!("{}{}", self.prefix, key))
        }
    }
}

impl std::fmt::Debug for Getters {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Getters")
            .field("namespace", &self.prefix)
            .field("keys", &self.keys())
            .finish()
    }
}
