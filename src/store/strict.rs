use std::sync::Arc;

use serde_json::Value;

use crate::error::StoreError;
use crate::state::StateTree;

/// Strict-mode check around raw writes to the state tree.
///
/// When enabled, the tree is snapshotted before a raw write and compared
/// after it; any difference outside the committing window is a violation.
pub(crate) struct ConsistencyGuard {
    enabled: bool,
}

impl ConsistencyGuard {
    pub(crate) fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub(crate) fn enabled(&self) -> bool {
        self.enabled
    }

    /// Snapshot to compare against, or `None` when strict mode is off.
    pub(crate) fn observe(&self, state: &StateTree) -> Option<Arc<Value>> {
        self.enabled.then(|| state.snapshot())
    }

    pub(crate) fn verify(
        &self,
        state: &StateTree,
        before: Option<Arc<Value>>,
    ) -> Result<(), StoreError> {
        let Some(before) = before else {
            return Ok(());
        };
        if state.is_committing() {
            return Ok(());
        }
        let after = state.snapshot();
        if Arc::ptr_eq(&before, &after) || *before == *after {
            return Ok(());
        }
        tracing::error!("Do not mutate store state outside mutation handlers");
        Err(StoreError::StrictModeViolation)
    }
}
