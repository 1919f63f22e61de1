//! Commit and dispatch.

use futures::future::{self, try_join_all, BoxFuture, FutureExt, TryFutureExt};
use serde::Serialize;
use serde_json::Value;

use super::context::{ActionContext, CommitOptions};
use super::devtool::DevtoolEvent;
use super::Store;
use crate::error::ActionError;

/// Completion of a dispatch. Several handlers resolve to an array of their
/// results in registration order.
pub type ActionFuture = BoxFuture<'static, Result<Value, ActionError>>;

/// A committed mutation, as seen by subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MutationRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Value,
}

/// A dispatched action, as seen by action subscribers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionRecord {
    #[serde(rename = "type")]
    pub kind: String,
    pub payload: Value,
}

impl Store {
    pub fn commit(&self, kind: &str, payload: Value) {
        self.commit_with(kind, payload, CommitOptions::default());
    }

    /// Run every handler registered under `kind`, then notify subscribers,
    /// the devtool and watchers.
    ///
    /// A panicking handler skips the remaining handlers and the
    /// notifications; the committing window is still closed.
    pub fn commit_with(&self, kind: &str, payload: Value, options: CommitOptions) {
        if options.silent {
            tracing::warn!(
                type_ = %kind,
                "The 'silent' commit option has been removed; filter mutations in the devtool instead"
            );
        }

        let registry = self.registry();
        let Some(entries) = registry.mutations.get(kind) else {
            tracing::error!(type_ = %kind, "Unknown mutation type");
            return;
        };

        let state = &self.inner.state;
        state.with_commit(|| {
            for entry in entries {
                let applied = state.update(entry.context.path(), |local| {
                    (entry.handler)(local, &payload)
                });
                if applied.is_none() {
                    tracing::warn!(
                        type_ = %kind,
                        path = %entry.context.path().join("/"),
                        "Mutation skipped: module state is missing"
                    );
                }
            }
        });
        drop(registry);

        let record = MutationRecord {
            kind: kind.to_string(),
            payload,
        };
        let root = self.state();
        for listener in self.inner.subscribers.snapshot() {
            listener(&record, &root);
        }
        if let Some(devtool) = self.devtool() {
            devtool.on_event(&DevtoolEvent::Mutation {
                record: &record,
                state: &root,
            });
        }
        self.notify_watchers();
    }

    /// Commit `{"type": ..., ...}`; the whole object is the payload.
    pub fn commit_object(&self, mutation: Value) {
        if let Some((kind, payload)) = unify_object_style(mutation, "commit") {
            self.commit(&kind, payload);
        }
    }

    /// Invoke every handler registered under `kind`.
    ///
    /// Action subscribers run first, then handlers are called in
    /// registration order. An unknown type resolves to `null`.
    pub fn dispatch(&self, kind: &str, payload: Value) -> ActionFuture {
        let registry = self.registry();
        let Some(entries) = registry.actions.get(kind) else {
            tracing::error!(type_ = %kind, "Unknown action type");
            return future::ready(Ok(Value::Null)).boxed();
        };

        let record = ActionRecord {
            kind: kind.to_string(),
            payload,
        };
        let root = self.state();
        for listener in self.inner.action_subscribers.snapshot() {
            listener(&record, &root);
        }
        let devtool = self.devtool();
        if let Some(devtool) = &devtool {
            devtool.on_event(&DevtoolEvent::Action {
                record: &record,
                state: &root,
            });
        }

        let mut pending: Vec<_> = entries
            .iter()
            .map(|entry| {
                let context = ActionContext::new(entry.context.clone(), self.clone());
                (entry.handler)(context, record.payload.clone())
            })
            .collect();
        drop(registry);

        let joined = if pending.len() == 1 {
            pending.remove(0)
        } else {
            try_join_all(pending).map_ok(Value::Array).boxed()
        };

        let kind = record.kind;
        async move {
            joined.await.map_err(|reason| {
                let error = ActionError::new(kind, reason);
                if let Some(devtool) = devtool {
                    devtool.on_event(&DevtoolEvent::Error { error: &error });
                }
                error
            })
        }
        .boxed()
    }

    /// Dispatch `{"type": ..., ...}`; the whole object is the payload.
    pub fn dispatch_object(&self, action: Value) -> ActionFuture {
        match unify_object_style(action, "dispatch") {
            Some((kind, payload)) => self.dispatch(&kind, payload),
            None => future::ready(Ok(Value::Null)).boxed(),
        }
    }
}

/// Split an object-style call into its type and payload.
fn unify_object_style(value: Value, operation: &str) -> Option<(String, Value)> {
    let Some(kind) = value.get("type").and_then(Value::as_str).map(str::to_string) else {
        tracing::error!(
            operation,
            "Object-style {} expects a string 'type' field",
            operation
        );
        return None;
    };
    Some((kind, value))
}
