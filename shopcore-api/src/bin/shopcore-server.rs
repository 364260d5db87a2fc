//! Development server over the in-memory stores.
//!
//! Seeds a handful of products and a demo user token so the API can be
//! exercised with curl:
//!
//! ```bash
//! RUST_LOG=info cargo run --bin shopcore-server
//! curl -H "Authorization: Bearer demo-token" http://localhost:3000/cart
//! ```

use std::sync::Arc;

use anyhow::Result;
use shopcore::address::AddressBook;
use shopcore::cart::{CartService, CartStore};
use shopcore::catalog::{CatalogStore, Product};
use shopcore::inventory::InventoryLedger;
use shopcore::order::OrderService;
use shopcore::types::{Money, ProductId, ProductName, UserId};
use shopcore_api::{AppState, StaticTokenProvider};
use shopcore_memory::{
    InMemoryAddressStore, InMemoryCartStore, InMemoryCatalogStore, InMemoryOrderStore,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn seed_catalog(catalog: &InMemoryCatalogStore) -> Result<()> {
    let products = [
        ("Classic White Tee", 1_999, 120),
        ("Denim Jacket", 8_999, 35),
        ("Canvas Sneakers", 5_499, 60),
        ("Wool Beanie", 1_499, 200),
    ];
    for (name, cents, stock) in products {
        catalog.put(Product {
            id: ProductId::new(),
            name: ProductName::try_new(name.to_string())?,
            price: Money::from_cents(cents)?,
            image: format!(
                "https://img.example/{}.jpg",
                name.to_lowercase().replace(' ', "-")
            ),
            stock,
            active: true,
        });
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let catalog = InMemoryCatalogStore::new();
    seed_catalog(&catalog)?;

    let catalog_arc: Arc<dyn CatalogStore> = Arc::new(catalog);
    let cart_arc: Arc<dyn CartStore> = Arc::new(InMemoryCartStore::new());

    let demo_user = UserId::new();
    info!(user = %demo_user, "registered demo token 'demo-token'");

    let state = AppState {
        carts: CartService::new(Arc::clone(&catalog_arc), Arc::clone(&cart_arc)),
        orders: OrderService::new(
            cart_arc,
            Arc::new(InMemoryOrderStore::new()),
            InventoryLedger::new(catalog_arc),
        ),
        addresses: AddressBook::new(Arc::new(InMemoryAddressStore::new())),
        identity: Arc::new(StaticTokenProvider::new().with_token("demo-token", demo_user)),
    };

    let addr = std::env::var("SHOPCORE_ADDR").unwrap_or_else(|_| "127.0.0.1:3000".to_string());
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "shopcore API listening");

    axum::serve(listener, shopcore_api::router(state)).await?;
    Ok(())
}
