//! The state tree arena.
//!
//! The whole tree is one `serde_json::Value` behind a copy-on-write `Arc`.
//! Readers take cheap snapshots. Writers go through [`StateTree::write`],
//! [`StateTree::update`], [`StateTree::attach`], [`StateTree::detach`] or
//! [`StateTree::replace`], each of which tells the reactive host which path
//! changed.
//!
//! The committing flag marks the window in which writes are legitimate.
//! Nothing here enforces it; the strict-mode guard reads it.

mod slice;

pub use slice::StateSlice;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Map, Value};

use crate::reactive::ReactiveHost;

pub struct StateTree {
    root: RwLock<Arc<Value>>,
    committing: AtomicBool,
    host: Arc<dyn ReactiveHost>,
}

impl StateTree {
    pub fn new(root: Value, host: Arc<dyn ReactiveHost>) -> Self {
        Self {
            root: RwLock::new(Arc::new(root)),
            committing: AtomicBool::new(false),
            host,
        }
    }

    /// Snapshot of the current root.
    pub fn snapshot(&self) -> Arc<Value> {
        Arc::clone(&self.root.read())
    }

    /// Snapshot of the subtree at `path`.
    pub fn slice(&self, path: &[String]) -> StateSlice {
        StateSlice::new(self.snapshot(), path.to_vec())
    }

    pub fn is_committing(&self) -> bool {
        self.committing.load(Ordering::SeqCst)
    }

    /// Run `f` inside the committing window.
    ///
    /// Windows nest: the previous flag is restored on exit, including when
    /// `f` unwinds.
    pub fn with_commit<R>(&self, f: impl FnOnce() -> R) -> R {
        let previous = self.committing.swap(true, Ordering::SeqCst);
        let _restore = scopeguard::guard(previous, |previous| {
            self.committing.store(previous, Ordering::SeqCst);
        });
        f()
    }

    /// Edit the subtree at `path` in place.
    ///
    /// Returns `None` without calling `f` when the path does not resolve.
    pub fn write<R>(&self, path: &[String], f: impl FnOnce(&mut Value) -> R) -> Option<R> {
        let mut root = self.root.write();
        let slot = resolve_mut(Arc::make_mut(&mut root), path)?;
        // Invalidate even if `f` unwinds halfway through an edit.
        let invalidate = scopeguard::guard(path, |path| self.host.invalidate(path));
        let result = f(slot);
        drop(root);
        drop(invalidate);
        Some(result)
    }

    /// Run `f` on an owned copy of the subtree at `path` with no lock held,
    /// then store the copy back.
    ///
    /// `f` may read or write the tree itself. Its own writes to the same
    /// subtree are overwritten by the copy.
    pub fn update<R>(&self, path: &[String], f: impl FnOnce(&mut Value) -> R) -> Option<R> {
        let mut local = resolve(&self.snapshot(), path)?.clone();
        let result = f(&mut local);
        self.write(path, move |slot| *slot = local)?;
        Some(result)
    }

    /// Graft `value` under the object at `parent`, keyed by `key`.
    pub fn attach(&self, parent: &[String], key: &str, value: Value) -> bool {
        let attached = {
            let mut root = self.root.write();
            match resolve_mut(Arc::make_mut(&mut root), parent) {
                Some(slot) => {
                    if slot.is_null() {
                        *slot = Value::Object(Map::new());
                    }
                    match slot.as_object_mut() {
                        Some(object) => {
                            object.insert(key.to_string(), value);
                            true
                        }
                        None => false,
                    }
                }
                None => false,
            }
        };

        if attached {
            let mut path = parent.to_vec();
            path.push(key.to_string());
            self.host.invalidate(&path);
        } else {
            tracing::error!(
                parent = %parent.join("/"),
                key = %key,
                "Cannot attach module state: parent state is not an object"
            );
        }
        attached
    }

    /// Remove and return the child `key` of the object at `parent`.
    pub fn detach(&self, parent: &[String], key: &str) -> Option<Value> {
        let removed = {
            let mut root = self.root.write();
            resolve_mut(Arc::make_mut(&mut root), parent)
                .and_then(Value::as_object_mut)
                .and_then(|object| object.remove(key))
        };

        if removed.is_some() {
            let mut path = parent.to_vec();
            path.push(key.to_string());
            self.host.invalidate(&path);
        }
        removed
    }

    /// Swap the whole tree.
    pub fn replace(&self, value: Value) {
        *self.root.write() = Arc::new(value);
        self.host.invalidate(&[]);
    }

    /// Edit the whole tree in place, whatever the committing flag says.
    pub fn write_root<R>(&self, f: impl FnOnce(&mut Value) -> R) -> R {
        let mut root = self.root.write();
        let invalidate = scopeguard::guard((), |_| self.host.invalidate(&[]));
        let result = f(Arc::make_mut(&mut root));
        drop(root);
        drop(invalidate);
        result
    }
}

/// Walk `path` down from `root` through object keys.
pub fn resolve<'a>(root: &'a Value, path: &[String]) -> Option<&'a Value> {
    path.iter().try_fold(root, |state, key| state.get(key.as_str()))
}

fn resolve_mut<'a>(root: &'a mut Value, path: &[String]) -> Option<&'a mut Value> {
    path.iter()
        .try_fold(root, |state, key| state.get_mut(key.as_str()))
}
