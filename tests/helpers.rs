mod common;

use common::{cart_module, counter_module, shop_store, Calls};
use modux::helpers::{
    create_namespaced_helpers, map_actions, map_getters, map_mutations, map_state, ActionBinding,
    Bindings, MutationBinding, StateBinding,
};
use modux::{Module, Store, StoreOptions};
use serde_json::{json, Value};

/// Test root-level state and getter bindings, plain and aliased.
#[test]
fn test_root_state_and_getters() {
    let store = shop_store();
    store.commit("increment", json!(4));

    let state = map_state(
        "",
        Bindings::keys(["count"]).aliased(
            "countPlusOne",
            StateBinding::custom(|state, _| json!(state["count"].as_i64().unwrap_or(0) + 1)),
        ),
    );
    let getters = map_getters("", Bindings::new().aliased("twice", "double"));

    assert_eq!(state["count"].read(&store), json!(4));
    assert_eq!(state["countPlusOne"].read(&store), json!(5));
    assert_eq!(getters["twice"].read(&store), json!(8));
}

/// Test namespaced bindings for every helper.
#[tokio::test]
async fn test_namespaced_cart_bindings() {
    let store = shop_store();
    let cart = create_namespaced_helpers("cart");

    let actions = cart.map_actions(Bindings::keys(["add"]));
    let mutations = cart.map_mutations(Bindings::new().aliased("addDirect", "push"));
    let getters = cart.map_getters(Bindings::keys(["total"]));
    let state = cart.map_state(Bindings::keys(["items"]).aliased(
        "firstPrice",
        StateBinding::custom(|state, _| state["items"][0]["price"].clone()),
    ));

    let result = actions["add"].call(&store, json!({"price": 3})).await.unwrap();
    assert_eq!(result, json!("added"));
    mutations["addDirect"].call(&store, json!({"price": 4}));

    assert_eq!(getters["total"].read(&store), json!(7));
    assert_eq!(state["items"].read(&store), json!([{"price": 3}, {"price": 4}]));
    assert_eq!(state["firstPrice"].read(&store), json!(3));
}

/// Test that custom bindings receive the module's context.
#[tokio::test]
async fn test_custom_bindings_use_local_context() {
    let store = shop_store();
    let mutations = map_mutations(
        "cart",
        Bindings::new().aliased(
            "addTwice",
            MutationBinding::custom(|context, item| {
                context.commit("push", item.clone());
                context.commit("push", item);
            }),
        ),
    );
    let actions = map_actions(
        "cart/",
        Bindings::new().aliased(
            "addViaAction",
            ActionBinding::custom(|context, item| context.dispatch("add", item)),
        ),
    );

    mutations["addTwice"].call(&store, json!({"price": 1}));
    actions["addViaAction"]
        .call(&store, json!({"price": 10}))
        .await
        .unwrap();

    assert_eq!(store.getters().get("cart/total"), Some(json!(12)));
}

/// Test that an unknown namespace resolves to null and calls nothing.
#[tokio::test]
async fn test_unknown_namespace_is_noop() {
    let store = shop_store();
    let calls = Calls::default();
    let counter = calls.clone();
    store.subscribe(move |_, _| counter.hit());

    let missing = create_namespaced_helpers("wishlist");
    let state = missing.map_state(Bindings::keys(["items"]));
    let getters = missing.map_getters(Bindings::keys(["total"]));
    let mutations = missing.map_mutations(Bindings::keys(["push"]));
    let actions = missing.map_actions(Bindings::keys(["add"]));

    assert_eq!(state["items"].read(&store), Value::Null);
    assert_eq!(getters["total"].read(&store), Value::Null);
    mutations["push"].call(&store, json!({}));
    let result = actions["add"].call(&store, json!({})).await.unwrap();

    assert_eq!(result, Value::Null);
    assert_eq!(calls.count(), 0);
}

/// Test that an unknown getter in a known namespace reads as null.
#[test]
fn test_unknown_getter_is_null() {
    let store = shop_store();
    let getters = map_getters("cart", Bindings::keys(["missing"]));
    assert_eq!(getters["missing"].read(&store), Value::Null);
}

/// Test that one set of bindings works against several stores.
#[test]
fn test_bindings_are_store_independent() {
    let first = shop_store();
    let second = Store::new(
        counter_module().module("cart", cart_module()),
        StoreOptions::default(),
    )
    .unwrap();
    second.commit("cart/push", json!({"price": 6}));

    let total = map_getters("cart", Bindings::keys(["total"]));
    assert_eq!(total["total"].read(&first), json!(0));
    assert_eq!(total["total"].read(&second), json!(6));
}

/// Test helpers against modules registered at runtime.
#[test]
fn test_helpers_follow_dynamic_registration() {
    let store = Store::new(Module::new(), StoreOptions::default()).unwrap();
    let getters = map_getters("cart", Bindings::keys(["total"]));
    assert_eq!(getters["total"].read(&store), Value::Null);

    store
        .register_module(&["cart"], cart_module(), modux::RegisterOptions::default())
        .unwrap();
    store.commit("cart/push", json!({"price": 2}));
    assert_eq!(getters["total"].read(&store), json!(2));
}
