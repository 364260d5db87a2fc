//! End-to-end storefront scenarios over the in-memory stores.

use std::sync::Arc;

use shopcore::address::{AddressBook, AddressPatch, DeliveryAddress, NewAddress};
use shopcore::cart::{CartService, CartStore};
use shopcore::catalog::{CatalogStore, Product};
use shopcore::errors::CoreError;
use shopcore::inventory::InventoryLedger;
use shopcore::order::{OrderService, OrderStatus, PaymentMethod, PaymentStatus};
use shopcore::types::{Money, ProductId, ProductName, Quantity, UserId};
use shopcore_memory::{
    InMemoryAddressStore, InMemoryCartStore, InMemoryCatalogStore, InMemoryOrderStore,
};

struct Store {
    catalog: InMemoryCatalogStore,
    carts: CartService,
    orders: OrderService,
    addresses: AddressBook,
}

fn storefront() -> Store {
    let catalog = InMemoryCatalogStore::new();
    let cart_store = InMemoryCartStore::new();
    let order_store = InMemoryOrderStore::new();
    let address_store = InMemoryAddressStore::new();

    let catalog_arc: Arc<dyn CatalogStore> = Arc::new(catalog.clone());
    let cart_arc: Arc<dyn CartStore> = Arc::new(cart_store);

    Store {
        catalog,
        carts: CartService::new(Arc::clone(&catalog_arc), Arc::clone(&cart_arc)),
        orders: OrderService::new(
            cart_arc,
            Arc::new(order_store),
            InventoryLedger::new(catalog_arc),
        ),
        addresses: AddressBook::new(Arc::new(address_store)),
    }
}

fn seed_product(store: &Store, price_cents: u64, stock: u32) -> ProductId {
    let id = ProductId::new();
    store.catalog.put(Product {
        id,
        name: ProductName::try_new("Denim Jacket".to_string()).unwrap(),
        price: Money::from_cents(price_cents).unwrap(),
        image: "https://img.example/jacket.jpg".to_string(),
        stock,
        active: true,
    });
    id
}

fn delivery() -> DeliveryAddress {
    DeliveryAddress {
        label: "Home".to_string(),
        line: "1 Main St".to_string(),
        city: Some("Springfield".to_string()),
        state: None,
        postal_code: Some("110001".to_string()),
    }
}

fn qty(value: u32) -> Quantity {
    Quantity::new(value).unwrap()
}

#[tokio::test]
async fn placing_an_order_drains_stock_and_empties_the_cart() {
    let store = storefront();
    let user = UserId::new();
    let product = seed_product(&store, 10_000, 5);

    store
        .carts
        .add_item(user, product, qty(2), None, None)
        .await
        .unwrap();

    let order = store
        .orders
        .place_order(user, delivery(), PaymentMethod::Cod)
        .await
        .unwrap();

    assert_eq!(order.total_amount, Money::from_cents(20_000).unwrap());
    assert_eq!(order.status, OrderStatus::Confirmed);
    assert_eq!(order.payment_status, PaymentStatus::Pending);
    assert_eq!(store.catalog.stock(product), Some(3));

    let cart = store.carts.get(user).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_items, 0);
}

#[tokio::test]
async fn cancelling_restores_stock_and_marks_the_order() {
    let store = storefront();
    let user = UserId::new();
    let product = seed_product(&store, 10_000, 5);

    store
        .carts
        .add_item(user, product, qty(2), None, None)
        .await
        .unwrap();
    let placed = store
        .orders
        .place_order(user, delivery(), PaymentMethod::Cod)
        .await
        .unwrap();

    let cancelled = store.orders.cancel(user, &placed.order_id).await.unwrap();

    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    assert_eq!(store.catalog.stock(product), Some(5));
}

#[tokio::test]
async fn cancelling_twice_is_rejected() {
    let store = storefront();
    let user = UserId::new();
    let product = seed_product(&store, 10_000, 5);

    store
        .carts
        .add_item(user, product, qty(1), None, None)
        .await
        .unwrap();
    let placed = store
        .orders
        .place_order(user, delivery(), PaymentMethod::Upi)
        .await
        .unwrap();
    store.orders.cancel(user, &placed.order_id).await.unwrap();

    let err = store
        .orders
        .cancel(user, &placed.order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));
    // Stock was restored exactly once.
    assert_eq!(store.catalog.stock(product), Some(5));
}

#[tokio::test]
async fn shipped_orders_cannot_be_cancelled() {
    let store = storefront();
    let user = UserId::new();
    let product = seed_product(&store, 10_000, 5);

    store
        .carts
        .add_item(user, product, qty(2), None, None)
        .await
        .unwrap();
    let placed = store
        .orders
        .place_order(user, delivery(), PaymentMethod::Card)
        .await
        .unwrap();
    store
        .orders
        .advance_status(user, &placed.order_id, OrderStatus::Shipped)
        .await
        .unwrap();

    let err = store
        .orders
        .cancel(user, &placed.order_id)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InvalidTransition { .. }));

    let order = store.orders.get_order(user, &placed.order_id).await.unwrap();
    assert_eq!(order.status, OrderStatus::Shipped);
    assert_eq!(store.catalog.stock(product), Some(3));
}

#[tokio::test]
async fn adding_more_than_stock_is_advisory_rejected_and_cart_unchanged() {
    let store = storefront();
    let user = UserId::new();
    let product = seed_product(&store, 10_000, 5);

    let err = store
        .carts
        .add_item(user, product, qty(6), None, None)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InsufficientInventory { .. }));

    let cart = store.carts.get(user).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(store.catalog.stock(product), Some(5));
}

#[tokio::test]
async fn failed_placement_releases_reservations_and_keeps_the_cart() {
    let store = storefront();
    let user = UserId::new();
    let in_stock = seed_product(&store, 10_000, 5);
    let scarce = seed_product(&store, 5_000, 3);

    store
        .carts
        .add_item(user, in_stock, qty(2), None, None)
        .await
        .unwrap();
    store
        .carts
        .add_item(user, scarce, qty(3), None, None)
        .await
        .unwrap();

    // Another shopper drains the scarce product out from under the cart.
    let other = UserId::new();
    store
        .carts
        .add_item(other, scarce, qty(3), None, None)
        .await
        .unwrap();
    store
        .orders
        .place_order(other, delivery(), PaymentMethod::Cod)
        .await
        .unwrap();

    let err = store
        .orders
        .place_order(user, delivery(), PaymentMethod::Cod)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::InsufficientInventory { .. }));

    // The earlier reservation on the in-stock product was compensated.
    assert_eq!(store.catalog.stock(in_stock), Some(5));
    let cart = store.carts.get(user).await.unwrap();
    assert_eq!(cart.items.len(), 2);
}

#[tokio::test]
async fn placing_from_an_empty_cart_is_rejected() {
    let store = storefront();
    let user = UserId::new();

    let err = store
        .orders
        .place_order(user, delivery(), PaymentMethod::Cod)
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::EmptyCart));
}

#[tokio::test]
async fn same_variant_merges_into_one_line() {
    let store = storefront();
    let user = UserId::new();
    let product = seed_product(&store, 10_000, 10);

    store
        .carts
        .add_item(user, product, qty(2), Some("M".to_string()), None)
        .await
        .unwrap();
    let cart = store
        .carts
        .add_item(user, product, qty(3), Some("M".to_string()), None)
        .await
        .unwrap();

    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.total_items, 5);

    // A different size is a different line.
    let cart = store
        .carts
        .add_item(user, product, qty(1), Some("L".to_string()), None)
        .await
        .unwrap();
    assert_eq!(cart.items.len(), 2);
    assert_eq!(cart.total_items, 6);
}

#[tokio::test]
async fn removing_a_missing_cart_line_is_a_no_op() {
    let store = storefront();
    let user = UserId::new();
    let product = seed_product(&store, 10_000, 5);

    store
        .carts
        .add_item(user, product, qty(1), None, None)
        .await
        .unwrap();

    let cart = store
        .carts
        .remove_item(user, shopcore::types::CartItemId::new())
        .await
        .unwrap();
    assert_eq!(cart.items.len(), 1);
}

#[tokio::test]
async fn order_listing_paginates_newest_first() {
    let store = storefront();
    let user = UserId::new();
    let product = seed_product(&store, 1_000, 100);

    let mut ids = Vec::new();
    for _ in 0..3 {
        store
            .carts
            .add_item(user, product, qty(1), None, None)
            .await
            .unwrap();
        let order = store
            .orders
            .place_order(user, delivery(), PaymentMethod::Cod)
            .await
            .unwrap();
        ids.push(order.order_id);
    }

    let page = store.orders.list_orders(user, 1, 2, None).await.unwrap();
    assert_eq!(page.orders.len(), 2);
    assert_eq!(page.orders[0].order_id, ids[2]);
    assert_eq!(page.pagination.total_count, 3);
    assert_eq!(page.pagination.total_pages, 2);
    assert!(page.pagination.has_next);
    assert!(!page.pagination.has_prev);

    let page = store.orders.list_orders(user, 2, 2, None).await.unwrap();
    assert_eq!(page.orders.len(), 1);
    assert_eq!(page.orders[0].order_id, ids[0]);
    assert!(!page.pagination.has_next);
    assert!(page.pagination.has_prev);
}

#[tokio::test]
async fn absurd_page_numbers_yield_an_empty_page() {
    let store = storefront();
    let user = UserId::new();
    let product = seed_product(&store, 1_000, 10);

    store
        .carts
        .add_item(user, product, qty(1), None, None)
        .await
        .unwrap();
    store
        .orders
        .place_order(user, delivery(), PaymentMethod::Cod)
        .await
        .unwrap();

    let page = store
        .orders
        .list_orders(user, u64::MAX, 100, None)
        .await
        .unwrap();
    assert!(page.orders.is_empty());
    assert_eq!(page.pagination.total_count, 1);
    assert!(!page.pagination.has_next);
}

#[tokio::test]
async fn tracking_can_only_be_set_once_shipped() {
    let store = storefront();
    let user = UserId::new();
    let product = seed_product(&store, 10_000, 5);

    store
        .carts
        .add_item(user, product, qty(1), None, None)
        .await
        .unwrap();
    let placed = store
        .orders
        .place_order(user, delivery(), PaymentMethod::Upi)
        .await
        .unwrap();

    // Still Confirmed: no carrier is involved yet.
    let err = store
        .orders
        .set_tracking(user, &placed.order_id, "TRK-123".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed(_)));

    store
        .orders
        .advance_status(user, &placed.order_id, OrderStatus::Shipped)
        .await
        .unwrap();
    let order = store
        .orders
        .set_tracking(user, &placed.order_id, "TRK-123".to_string())
        .await
        .unwrap();
    assert_eq!(order.tracking_id.as_deref(), Some("TRK-123"));

    let err = store
        .orders
        .set_tracking(user, &placed.order_id, "   ".to_string())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::ValidationFailed(_)));
}

#[tokio::test]
async fn new_default_address_unsets_the_previous_default() {
    let store = storefront();
    let user = UserId::new();

    let new = |label: &str, is_default| NewAddress {
        label: label.to_string(),
        line: "1 Main St".to_string(),
        city: None,
        state: None,
        postal_code: None,
        is_default,
    };

    store.addresses.add(user, new("Home", true)).await.unwrap();
    let addresses = store.addresses.add(user, new("Work", true)).await.unwrap();

    let defaults: Vec<_> = addresses.iter().filter(|a| a.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].label, "Work");
}

#[tokio::test]
async fn patching_an_address_to_default_repoints_the_flag() {
    let store = storefront();
    let user = UserId::new();

    let new = |label: &str, is_default| NewAddress {
        label: label.to_string(),
        line: "1 Main St".to_string(),
        city: None,
        state: None,
        postal_code: None,
        is_default,
    };

    store.addresses.add(user, new("Home", true)).await.unwrap();
    let addresses = store.addresses.add(user, new("Work", false)).await.unwrap();
    let work = addresses.iter().find(|a| a.label == "Work").unwrap().id;

    let addresses = store
        .addresses
        .update(
            user,
            work,
            AddressPatch {
                is_default: Some(true),
                ..AddressPatch::default()
            },
        )
        .await
        .unwrap();

    let defaults: Vec<_> = addresses.iter().filter(|a| a.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, work);
}

#[tokio::test]
async fn removing_the_default_address_leaves_no_default() {
    let store = storefront();
    let user = UserId::new();

    let new = |label: &str, is_default| NewAddress {
        label: label.to_string(),
        line: "1 Main St".to_string(),
        city: None,
        state: None,
        postal_code: None,
        is_default,
    };

    store.addresses.add(user, new("Home", true)).await.unwrap();
    let addresses = store.addresses.add(user, new("Work", false)).await.unwrap();
    let home = addresses.iter().find(|a| a.label == "Home").unwrap().id;

    let remaining = store.addresses.remove(user, home).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining.iter().all(|a| !a.is_default));
}
