mod common;

use common::{counter_store, shop_store, Calls, RecordingDevtool};
use modux::{DispatchOptions, Module, Store, StoreOptions};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::sync::Arc;

/// Test that an async action commits and resolves.
#[tokio::test]
async fn test_dispatch_counter_increment() {
    let store = counter_store();
    let result = store.dispatch("incrementAsync", json!(4)).await.unwrap();
    assert_eq!(result, Value::Null);
    assert_eq!(store.state()["count"], json!(4));
}

/// Test that a single handler resolves to its own value.
#[tokio::test]
async fn test_single_handler_resolves_to_its_value() {
    let store = shop_store();
    let result = store
        .dispatch("cart/add", json!({"name": "pear", "price": 4}))
        .await
        .unwrap();
    assert_eq!(result, json!("added"));
    assert_eq!(store.getters().get("cart/total"), Some(json!(4)));
}

/// Test that several handlers under one type resolve to all results in
/// registration order.
#[tokio::test]
async fn test_fan_out_resolves_in_registration_order() {
    let store = Store::new(
        Module::new()
            .action("load", |_, _| async {
                tokio::task::yield_now().await;
                tokio::task::yield_now().await;
                Ok(json!("root"))
            })
            .module(
                "users",
                Module::new().action_sync("load", |_, _| Ok(json!("users"))),
            ),
        StoreOptions::default(),
    )
    .unwrap();

    let result = store.dispatch("load", json!(null)).await.unwrap();
    assert_eq!(result, json!(["root", "users"]));
}

/// Test that one failing handler fails the whole dispatch.
#[tokio::test]
async fn test_fan_out_fails_with_first_failure() {
    let store = Store::new(
        Module::new()
            .action_sync("sync", |_, _| Ok(json!(1)))
            .module(
                "remote",
                Module::new().action("sync", |_, _| async {
                    Err(anyhow::anyhow!("connection refused"))
                }),
            ),
        StoreOptions::default(),
    )
    .unwrap();

    let err = store.dispatch("sync", json!(null)).await.unwrap_err();
    assert_eq!(err.kind(), "sync");
    assert_eq!(err.reason().to_string(), "connection refused");
}

/// Test that an unknown action resolves to null without side effects.
#[tokio::test]
async fn test_unknown_action_is_noop() {
    let store = counter_store();
    let calls = Calls::default();
    let counter = calls.clone();
    store.subscribe_action(move |_, _| counter.hit());

    let result = store.dispatch("missing", json!(1)).await.unwrap();

    assert_eq!(result, Value::Null);
    assert_eq!(calls.count(), 0);
    assert_eq!(store.state()["count"], json!(0));
}

/// Test that action subscribers run before handlers.
#[tokio::test]
async fn test_action_subscribers_see_state_before_handlers() {
    let store = counter_store();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    store.subscribe_action(move |action, state| {
        sink.lock().push((action.kind.clone(), state["count"].clone()));
    });

    store.dispatch("incrementAsync", json!(1)).await.unwrap();

    assert_eq!(*seen.lock(), vec![("incrementAsync".to_string(), json!(0))]);
}

/// Test that actions receive local and root views.
#[tokio::test]
async fn test_action_context_views() {
    let seen = Arc::new(Mutex::new(None));
    let sink = Arc::clone(&seen);
    let store = Store::new(
        common::counter_module().module(
            "cart",
            common::cart_module().action_sync("inspect", move |context, _| {
                *sink.lock() = Some((
                    context.namespace().to_string(),
                    context.state().clone_value(),
                    context.getters().get("total"),
                    context.root_state()["count"].clone(),
                    context.root_getters().get("double"),
                ));
                Ok(Value::Null)
            }),
        ),
        StoreOptions::default(),
    )
    .unwrap();
    store.commit("increment", json!(5));

    store.dispatch("cart/inspect", json!(null)).await.unwrap();

    let (namespace, state, total, count, double) = seen.lock().clone().unwrap();
    assert_eq!(namespace, "cart/");
    assert_eq!(state, json!({"items": []}));
    assert_eq!(total, Some(json!(0)));
    assert_eq!(count, json!(5));
    assert_eq!(double, Some(json!(10)));
}

/// Test that a namespaced action reaches root mutations and actions with
/// the `root` option.
#[tokio::test]
async fn test_root_option_skips_namespace() {
    let store = Store::new(
        common::counter_module().module(
            "cart",
            common::cart_module().action("checkout", |context, _| async move {
                context.commit_with(
                    "increment",
                    json!(10),
                    modux::CommitOptions {
                        root: true,
                        ..Default::default()
                    },
                );
                context
                    .dispatch_with("incrementAsync", json!(1), DispatchOptions { root: true })
                    .await?;
                Ok(Value::Null)
            }),
        ),
        StoreOptions::default(),
    )
    .unwrap();

    store.dispatch("cart/checkout", json!(null)).await.unwrap();
    assert_eq!(store.state()["count"], json!(11));
}

/// Test that unknown local types are not forwarded to the root.
#[tokio::test]
async fn test_unknown_local_type_is_noop() {
    let store = Store::new(
        common::counter_module().module(
            "cart",
            common::cart_module().action("confused", |context, _| async move {
                context.commit("increment", json!(1));
                let nested = context.dispatch("incrementAsync", json!(1)).await?;
                Ok(nested)
            }),
        ),
        StoreOptions::default(),
    )
    .unwrap();

    let result = store.dispatch("cart/confused", json!(null)).await.unwrap();
    assert_eq!(result, Value::Null);
    assert_eq!(store.state()["count"], json!(0));
}

/// Test that root-scoped actions in namespaced modules register bare.
#[tokio::test]
async fn test_root_action_in_namespaced_module() {
    let store = Store::new(
        common::counter_module().module(
            "cart",
            common::cart_module().root_action("clearAll", |context, _| async move {
                context.commit("push", json!({"price": 1}));
                Ok(Value::Null)
            }),
        ),
        StoreOptions::default(),
    )
    .unwrap();

    store.dispatch("clearAll", json!(null)).await.unwrap();
    assert_eq!(store.getters().get("cart/total"), Some(json!(1)));
}

/// Test that failures reach the devtool before the caller.
#[tokio::test]
async fn test_failure_is_reported_to_devtool() {
    let devtool = Arc::new(RecordingDevtool::default());
    let store = Store::new(
        Module::new().action("fail", |_, _| async { Err(anyhow::anyhow!("nope")) }),
        StoreOptions::default().devtool(devtool.clone()),
    )
    .unwrap();

    assert!(store.dispatch("fail", json!(null)).await.is_err());
    assert_eq!(
        devtool.tags(),
        vec!["store:init", "store:action", "store:error"]
    );
}

/// Test the object style for dispatch.
#[tokio::test]
async fn test_dispatch_object_style() {
    let store = counter_store();
    store
        .dispatch_object(json!({"type": "incrementAsync", "amount": 3}))
        .await
        .unwrap();
    // The whole object is the payload, so the handler sees no number.
    assert_eq!(store.state()["count"], json!(1));

    let result = store.dispatch_object(json!({"kind": "x"})).await.unwrap();
    assert_eq!(result, Value::Null);
}
