use std::sync::Arc;

use super::devtool::{DevtoolHook, TracingDevtool};
use super::Store;
use crate::config::StoreSettings;
use crate::reactive::ReactiveHost;

/// Runs once, right after the store is built.
pub type Plugin = Box<dyn FnOnce(&Store) + Send>;

/// Construction options for [`Store::new`].
#[derive(Default)]
pub struct StoreOptions {
    pub(crate) strict: bool,
    pub(crate) plugins: Vec<Plugin>,
    pub(crate) devtool: Option<Arc<dyn DevtoolHook>>,
    pub(crate) reactive_host: Option<Arc<dyn ReactiveHost>>,
}

impl StoreOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options matching loaded settings.
    pub fn from_settings(settings: &StoreSettings) -> Self {
        let options = Self::new().strict(settings.strict);
        if settings.devtools {
            options.devtool(Arc::new(TracingDevtool))
        } else {
            options
        }
    }

    /// Report state changes made outside mutation handlers.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    pub fn plugin<F>(mut self, plugin: F) -> Self
    where
        F: FnOnce(&Store) + Send + 'static,
    {
        self.plugins.push(Box::new(plugin));
        self
    }

    pub fn devtool(mut self, hook: Arc<dyn DevtoolHook>) -> Self {
        self.devtool = Some(hook);
        self
    }

    /// Replace the default [`EpochHost`](crate::reactive::EpochHost).
    pub fn reactive_host(mut self, host: Arc<dyn ReactiveHost>) -> Self {
        self.reactive_host = Some(host);
        self
    }
}

impl std::fmt::Debug for StoreOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreOptions")
            .field("strict", &self.strict)
            .field("plugins", &self.plugins.len())
            .field("devtool", &self.devtool.is_some())
            .field("reactive_host", &self.reactive_host.is_some())
            .finish()
    }
}

/// Options for [`Store::register_module`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RegisterOptions {
    /// Keep whatever state already sits at the module's path instead of
    /// attaching the module's initial state.
    pub preserve_state: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_settings_maps_flags() {
        let options = StoreOptions::from_settings(&StoreSettings {
            strict: true,
            devtools: true,
        });
        assert!(options.strict);
        assert!(options.devtool.is_some());

        let options = StoreOptions::from_settings(&StoreSettings::default());
        assert!(!options.strict);
        assert!(options.devtool.is_none());
    }
}
