use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use modux::helpers::{create_namespaced_helpers, Bindings};
use modux::{Module, RegisterOptions, Store, StoreOptions, StoreSettings, WatchOptions};
use serde_json::{json, Value};

/// Drive a sample store: a counter plus a namespaced cart.
#[derive(Debug, Parser)]
#[command(name = "modux-demo", version)]
struct Cli {
    /// Report state changes made outside mutations.
    #[arg(long)]
    strict: bool,

    /// TOML settings file (`strict`, `devtools`).
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Amount added to the counter by each increment.
    #[arg(long, default_value_t = 1)]
    amount: i64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    modux::logging::init_tracing();
    let cli = Cli::parse();

    let mut settings = match &cli.settings {
        Some(path) => StoreSettings::load_from(path)?,
        None => StoreSettings::default(),
    };
    settings.strict |= cli.strict;

    let store = Store::new(root_module(), StoreOptions::from_settings(&settings))
        .context("Failed to build the demo store")?;

    let commits = store.subscribe(|mutation, _| {
        tracing::info!(type_ = %mutation.kind, payload = %mutation.payload, "Committed");
    });
    store.watch(
        |state, _| state["count"].clone(),
        |new, old| tracing::info!(new = %new, old = %old, "Count changed"),
        WatchOptions::default(),
    );

    store.commit("increment", json!(cli.amount));
    store.dispatch("incrementLater", json!(cli.amount)).await?;

    let cart = create_namespaced_helpers("cart");
    let actions = cart.map_actions(Bindings::keys(["addItem"]));
    let getters = cart.map_getters(Bindings::keys(["total"]));
    actions["addItem"]
        .call(&store, json!({"name": "apple", "price": 3}))
        .await?;
    actions["addItem"]
        .call(&store, json!({"name": "pear", "price": 4}))
        .await?;
    tracing::info!(total = %getters["total"].read(&store), "Cart total");

    store.register_module(&["audit"], audit_module(), RegisterOptions::default())?;
    store.commit("audit/record", json!("checkout"));
    println!("{}", serde_json::to_string_pretty(&*store.state())?);
    store.unregister_module(&["audit"]);

    commits.unsubscribe();

    if store.is_strict() {
        if let Err(e) = store.with_state_mut(|state| state["count"] = json!(0)) {
            println!("strict mode: {}", e);
        }
    }

    println!("{}", serde_json::to_string_pretty(&*store.state())?);
    Ok(())
}

fn root_module() -> Module {
    Module::new()
        .state(json!({"count": 0}))
        .mutation("increment", |state, amount| {
            let count = state["count"].as_i64().unwrap_or(0);
            state["count"] = json!(count + amount.as_i64().unwrap_or(1));
        })
        .action("incrementLater", |context, amount| async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            context.commit("increment", amount);
            Ok(Value::Null)
        })
        .getter("doubled", |scope| {
            json!(scope.state["count"].as_i64().unwrap_or(0) * 2)
        })
        .module("cart", cart_module())
}

fn cart_module() -> Module {
    Module::new()
        .namespaced(true)
        .state(json!({"items": []}))
        .mutation("push", |state, item| {
            if let Some(items) = state["items"].as_array_mut() {
                items.push(item.clone());
            }
        })
        .action_sync("addItem", |context, item| {
            context.commit("push", item);
            Ok(Value::Null)
        })
        .getter("total", |scope| {
            let total: i64 = scope.state["items"]
                .as_array()
                .map(|items| items.iter().filter_map(|item| item["price"].as_i64()).sum())
                .unwrap_or(0);
            json!(total)
        })
}

fn audit_module() -> Module {
    Module::new()
        .namespaced(true)
        .state(json!({"entries": []}))
        .mutation("record", |state, entry| {
            if let Some(entries) = state["entries"].as_array_mut() {
                entries.push(entry.clone());
            }
        })
}
