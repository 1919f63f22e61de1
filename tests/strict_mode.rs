mod common;

use common::counter_module;
use modux::{RegisterOptions, Store, StoreError, StoreOptions, StoreSettings};
use serde_json::json;

fn strict_store() -> Store {
    Store::new(counter_module(), StoreOptions::default().strict(true)).unwrap()
}

/// Test that a raw write is reported in strict mode.
#[test]
fn test_direct_mutation_is_detected() {
    let store = strict_store();
    let result = store.with_state_mut(|state| state["count"] = json!(42));
    assert!(matches!(result, Err(StoreError::StrictModeViolation)));
}

/// Test that commits, replacements and registrations are never violations.
#[test]
fn test_sanctioned_writes_pass() {
    let store = strict_store();
    store.commit("increment", json!(1));
    store.replace_state(json!({"count": 7}));
    store
        .register_module(&["extra"], common::cart_module(), RegisterOptions::default())
        .unwrap();
    store.unregister_module(&["extra"]);

    assert_eq!(*store.state(), json!({"count": 7}));
    assert!(store.with_state_mut(|state| state["count"].clone()).is_ok());
}

/// Test that raw writes go through untouched when strict mode is off.
#[test]
fn test_non_strict_allows_raw_write() {
    let store = Store::new(counter_module(), StoreOptions::default()).unwrap();
    assert!(!store.is_strict());
    store
        .with_state_mut(|state| state["count"] = json!(3))
        .unwrap();
    assert_eq!(store.state()["count"], json!(3));
}

/// Test that settings switch strict mode on.
#[test]
fn test_strict_from_settings() {
    let settings = StoreSettings::from_toml_str("strict = true").unwrap();
    let store = Store::new(counter_module(), StoreOptions::from_settings(&settings)).unwrap();
    assert!(store.is_strict());
    assert!(store.with_state_mut(|state| state["count"] = json!(1)).is_err());
}
