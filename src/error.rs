//! Error types for store construction, module registration and actions.
//!
//! Configuration problems are returned as [`StoreError`]. Usage mistakes
//! (unknown mutation or action types) never become errors; they are logged
//! and ignored by the dispatch core.

use thiserror::Error;

/// Errors raised while building or reshaping a store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `register_module` was called with an empty path.
    #[error("cannot register the root module by using register_module")]
    RootRegistration,

    /// A path segment does not resolve to a registered module.
    #[error("module path '{path}' not found")]
    ModuleNotFound { path: String },

    /// The raw module definition has an invalid shape.
    #[error("invalid module at '{path}': {message}")]
    InvalidModule { path: String, message: String },

    /// Strict mode saw the state tree change outside a mutation handler.
    #[error("do not mutate store state outside mutation handlers")]
    StrictModeViolation,
}

/// An action handler failed; returned to whoever awaited the dispatch.
#[derive(Debug, Error)]
#[error("action '{kind}' failed: {reason}")]
pub struct ActionError {
    kind: String,
    reason: anyhow::Error,
}

impl ActionError {
    pub(crate) fn new(kind: impl Into<String>, reason: anyhow::Error) -> Self {
        Self {
            kind: kind.into(),
            reason,
        }
    }

    /// Fully-qualified action type that failed.
    pub fn kind(&self) -> &str {
        &self.kind
    }

    /// The error returned by the handler.
    pub fn reason(&self) -> &anyhow::Error {
        &self.reason
    }

    pub fn into_reason(self) -> anyhow::Error {
        self.reason
    }
}

/// Render a module path for diagnostics (`root` for the empty path).
pub(crate) fn display_path(path: &[String]) -> String {
    if path.is_empty() {
        "root".to_string()
    } else {
        path.join("/")
    }
}
