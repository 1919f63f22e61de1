//! Reactive derivation primitives.
//!
//! The store does not own a reactivity engine. It depends on a
//! [`ReactiveHost`] that can wrap a computation into a cached cell and be
//! told when part of the state tree changed. [`EpochHost`] is the default
//! host: any change invalidates every cell.
//!
//! ```text
//! getter fn ──wrap──→ cell ──read──→ cached value
//!                      ↑
//! state write ──invalidate(path)
//! ```

mod cache;

pub use cache::{CellSet, Getters};

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

/// A derivation to be cached by a host cell.
pub type Computation = Box<dyn Fn() -> Value + Send + Sync>;

/// A computed value owned by a reactive host.
pub trait ReactiveCell: Send + Sync {
    /// Current value, computing it only if a dependency changed since the
    /// last read.
    fn read(&self) -> Value;
}

/// Reactivity engine the store is built on.
pub trait ReactiveHost: Send + Sync {
    /// Wrap a computation into a lazily evaluated, cached cell.
    fn wrap(&self, compute: Computation) -> Arc<dyn ReactiveCell>;

    /// The state at `changed` (and everything under it) was written.
    /// An empty path means the whole tree.
    fn invalidate(&self, changed: &[String]);
}

/// Default host: one global epoch, bumped on every state write.
#[derive(Debug, Default)]
pub struct EpochHost {
    epoch: Arc<AtomicU64>,
}

impl EpochHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of invalidations seen so far.
    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }
}

impl ReactiveHost for EpochHost {
    fn wrap(&self, compute: Computation) -> Arc<dyn ReactiveCell> {
        Arc::new(EpochCell {
            epoch: Arc::clone(&self.epoch),
            compute,
            cached: Mutex::new(None),
        })
    }

    fn invalidate(&self, changed: &[String]) {
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;
        tracing::trace!(epoch, path = %changed.join("/"), "State invalidated");
    }
}

struct EpochCell {
    epoch: Arc<AtomicU64>,
    compute: Computation,
    cached: Mutex<Option<(u64, Value)>>,
}

impl ReactiveCell for EpochCell {
    fn read(&self) -> Value {
        let current = self.epoch.load(Ordering::Acquire);
        if let Some((at, value)) = self.cached.lock().as_ref() {
            if *at == current {
                return value.clone();
            }
        }

        // The lock is released while computing: a getter may read other
        // getters, and those cells lock independently.
        let value = (self.compute)();
        *self.cached.lock() = Some((current, value.clone()));
        value
    }
}
