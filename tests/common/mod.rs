//! Shared fixtures for store integration tests.

#![allow(dead_code, unused_imports)]

use modux::store::{DevtoolEvent, DevtoolHook};
use modux::{Module, Store, StoreOptions};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Root module with a counter: `increment` mutation, `incrementAsync`
/// action and `double` getter.
pub fn counter_module() -> Module {
    Module::new()
        .state(json!({"count": 0}))
        .mutation("increment", |state, amount| {
            let count = state["count"].as_i64().unwrap_or(0);
            state["count"] = json!(count + amount.as_i64().unwrap_or(1));
        })
        .action("incrementAsync", |context, amount| async move {
            tokio::task::yield_now().await;
            context.commit("increment", amount);
            Ok(Value::Null)
        })
        .getter("double", |scope| {
            json!(scope.state["count"].as_i64().unwrap_or(0) * 2)
        })
}

/// Namespaced cart: `push` mutation, `add` action, `total` getter.
pub fn cart_module() -> Module {
    Module::new()
        .namespaced(true)
        .state(json!({"items": []}))
        .mutation("push", |state, item| {
            if let Some(items) = state["items"].as_array_mut() {
                items.push(item.clone());
            }
        })
        .action_sync("add", |context, item| {
            context.commit("push", item);
            Ok(json!("added"))
        })
        .getter("total", |scope| {
            let total: i64 = scope.state["items"]
                .as_array()
                .map(|items| items.iter().filter_map(|item| item["price"].as_i64()).sum())
                .unwrap_or(0);
            json!(total)
        })
}

pub fn counter_store() -> Store {
    Store::new(counter_module(), StoreOptions::default()).expect("Failed to build store")
}

/// Counter root with the cart mounted under `cart`.
pub fn shop_store() -> Store {
    Store::new(
        counter_module().module("cart", cart_module()),
        StoreOptions::default(),
    )
    .expect("Failed to build store")
}

/// Shared call counter for handler and getter bodies.
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

/// Devtool that records event tags.
#[derive(Default)]
pub struct RecordingDevtool {
    pub tags: Mutex<Vec<String>>,
}

impl RecordingDevtool {
    pub fn tags(&self) -> Vec<String> {
        self.tags.lock().clone()
    }
}

impl DevtoolHook for RecordingDevtool {
    fn on_event(&self, event: &DevtoolEvent<'_>) {
        self.tags.lock().push(event.tag().to_string());
    }
}
