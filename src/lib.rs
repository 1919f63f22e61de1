//! modux: a hierarchical state container.
//!
//! State lives in one tree and changes only through named, synchronous
//! mutations. Asynchronous work goes in actions, derived values in cached
//! getters. Modules nest, can be namespaced, and can be registered,
//! unregistered and hot-updated at runtime.
//!
//! ```ignore
//! use modux::{Module, Store, StoreOptions};
//! use serde_json::json;
//!
//! let store = Store::new(
//!     Module::new()
//!         .state(json!({"count": 0}))
//!         .mutation("increment", |state, by| {
//!             state["count"] = json!(state["count"].as_i64().unwrap_or(0) + by.as_i64().unwrap_or(1));
//!         }),
//!     StoreOptions::default(),
//! )?;
//! store.commit("increment", json!(2));
//! assert_eq!(store.state()["count"], json!(2));
//! ```

pub mod config;
pub mod error;
pub mod helpers;
pub mod logging;
pub mod module;
pub mod reactive;
pub mod state;
pub mod store;

pub use config::{SettingsError, StoreSettings};
pub use error::{ActionError, StoreError};
pub use module::Module;
pub use reactive::{EpochHost, Getters, ReactiveCell, ReactiveHost};
pub use store::{
    ActionContext, CommitOptions, DispatchOptions, GetterScope, LocalContext, RegisterOptions,
    Store, StoreOptions, Subscription, WatchOptions,
};
