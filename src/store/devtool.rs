//! Developer-tooling observer.

use serde_json::Value;

use super::dispatch::{ActionRecord, MutationRecord};
use crate::error::ActionError;

/// Events forwarded to an attached [`DevtoolHook`].
#[derive(Debug)]
pub enum DevtoolEvent<'a> {
    /// Sent once when the hook is attached.
    Init { state: &'a Value },
    Mutation {
        record: &'a MutationRecord,
        state: &'a Value,
    },
    Action {
        record: &'a ActionRecord,
        state: &'a Value,
    },
    /// An action failed; sent before the error reaches the caller.
    Error { error: &'a ActionError },
}

impl DevtoolEvent<'_> {
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Init { .. } => "store:init",
            Self::Mutation { .. } => "store:mutation",
            Self::Action { .. } => "store:action",
            Self::Error { .. } => "store:error",
        }
    }
}

/// Receives store events. Called synchronously; keep it cheap.
pub trait DevtoolHook: Send + Sync {
    fn on_event(&self, event: &DevtoolEvent<'_>);
}

/// Writes every event to the `modux::devtool` tracing target.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingDevtool;

impl DevtoolHook for TracingDevtool {
    fn on_event(&self, event: &DevtoolEvent<'_>) {
        match event {
            DevtoolEvent::Init { state } => {
                tracing::info!(target: "modux::devtool", tag = event.tag(), state = %state, "Store attached");
            }
            DevtoolEvent::Mutation { record, state } => {
                tracing::info!(
                    target: "modux::devtool",
                    tag = event.tag(),
                    type_ = %record.kind,
                    payload = %record.payload,
                    state = %state,
                    "Mutation"
                );
            }
            DevtoolEvent::Action { record, .. } => {
                tracing::debug!(
                    target: "modux::devtool",
                    tag = event.tag(),
                    type_ = %record.kind,
                    payload = %record.payload,
                    "Action"
                );
            }
            DevtoolEvent::Error { error } => {
                tracing::warn!(
                    target: "modux::devtool",
                    tag = event.tag(),
                    type_ = %error.kind(),
                    error = %error.reason(),
                    "Action failed"
                );
            }
        }
    }
}
