//! Cart Store Binary
//!
//! Demonstration driver: adds one item, removes it, then prints the cart.
//! Stops at the first failing step.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin cart-store
//! ```
//!
//! # Environment Variables
//!
//! - `CART_STORE_CONFIG`: Path to the YAML config (default: `config.yaml`;
//!   built-in defaults are used when the default file is absent)
//! - `RUST_LOG`: Log level (default: `observability.log_level`)

use std::path::Path;

use anyhow::{Context, Result};
use cart_store::config::{self, Config};
use cart_store::{Container, OperationContext};

const DEFAULT_CONFIG_PATH: &str = "config.yaml";

const DEMO_USER: &str = "user123";
const DEMO_PRODUCT: &str = "product123";
const DEMO_QUANTITY: i64 = 2;

#[tokio::main]
async fn main() -> Result<()> {
    load_dotenv();

    let config = load_config()?;
    let telemetry = cart_store::telemetry::init_telemetry(&config.observability.log_level);

    tracing::info!(
        backend = ?config.persistence.backend,
        otlp = telemetry.is_exporting(),
        quantity_policy = ?config.cart.quantity_policy,
        "Starting cart store demo"
    );

    let container = Container::from_config(&config)
        .await
        .context("failed to connect to the document store")?;
    println!("Connected to the document store!");

    let store = container.cart_store();
    let ctx = OperationContext::background();

    store
        .add_item(&ctx, DEMO_USER, DEMO_PRODUCT, DEMO_QUANTITY)
        .await
        .context("failed to add product to cart")?;

    store
        .remove_item(&ctx, DEMO_USER, DEMO_PRODUCT)
        .await
        .context("failed to remove product from cart")?;

    let contents = store
        .list_items(&ctx, DEMO_USER)
        .await
        .context("failed to list cart items")?;

    println!("Cart items:");
    for (product_id, quantity) in contents.iter() {
        println!("Product ID: {product_id}, Quantity: {quantity}");
    }

    Ok(())
}

fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

fn load_dotenv_from_ancestors() {
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Load the config file; fall back to defaults only when no path was given
/// and the default file does not exist.
fn load_config() -> Result<Config> {
    match std::env::var("CART_STORE_CONFIG") {
        Ok(path) => config::load_config(Some(&path)).with_context(|| format!("loading {path}")),
        Err(_) if !Path::new(DEFAULT_CONFIG_PATH).exists() => Ok(Config::default()),
        Err(_) => config::load_config(Some(DEFAULT_CONFIG_PATH))
            .with_context(|| format!("loading {DEFAULT_CONFIG_PATH}")),
    }
}
