//! Thread-safe in-memory catalog with atomic stock primitives.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use shopcore::catalog::{CatalogStore, DecrementOutcome, Product};
use shopcore::errors::StorageResult;
use shopcore::types::ProductId;

/// In-memory catalog store. The stock check and write happen under a single
/// write lock, so concurrent reservations on one product serialize and stock
/// can never go negative.
#[derive(Clone, Default)]
pub struct InMemoryCatalogStore {
    products: Arc<RwLock<HashMap<ProductId, Product>>>,
}

impl InMemoryCatalogStore {
    /// Creates an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a product. Seed helper for tests and demos.
    pub fn put(&self, product: Product) {
        let mut products = self.products.write().expect("RwLock poisoned");
        products.insert(product.id, product);
    }

    /// Reads the current stock level, if the product exists.
    pub fn stock(&self, id: ProductId) -> Option<u32> {
        let products = self.products.read().expect("RwLock poisoned");
        products.get(&id).map(|p| p.stock)
    }
}

impl std::fmt::Debug for InMemoryCatalogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCatalogStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn product(&self, id: ProductId) -> StorageResult<Option<Product>> {
        let products = self.products.read().expect("RwLock poisoned");
        Ok(products.get(&id).cloned())
    }

    async fn try_decrement(&self, id: ProductId, qty: u32) -> StorageResult<DecrementOutcome> {
        let mut products = self.products.write().expect("RwLock poisoned");
        Ok(match products.get_mut(&id) {
            None => DecrementOutcome::UnknownProduct,
            Some(product) if product.stock >= qty => {
                product.stock -= qty;
                DecrementOutcome::Reserved {
                    remaining: product.stock,
                }
            }
            Some(product) => DecrementOutcome::Insufficient {
                available: product.stock,
            },
        })
    }

    async fn increment(&self, id: ProductId, qty: u32) -> StorageResult<Option<u32>> {
        let mut products = self.products.write().expect("RwLock poisoned");
        Ok(products.get_mut(&id).map(|product| {
            product.stock = product.stock.saturating_add(qty);
            product.stock
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopcore::types::{Money, ProductName};

    fn product(stock: u32) -> Product {
        Product {
            id: ProductId::new(),
            name: ProductName::try_new("Test".to_string()).unwrap(),
            price: Money::from_cents(1_000).unwrap(),
            image: "https://img.example/t.jpg".to_string(),
            stock,
            active: true,
        }
    }

    #[tokio::test]
    async fn decrement_respects_the_floor() {
        let store = InMemoryCatalogStore::new();
        let p = product(5);
        let id = p.id;
        store.put(p);

        assert_eq!(
            store.try_decrement(id, 3).await.unwrap(),
            DecrementOutcome::Reserved { remaining: 2 }
        );
        assert_eq!(
            store.try_decrement(id, 3).await.unwrap(),
            DecrementOutcome::Insufficient { available: 2 }
        );
        assert_eq!(store.stock(id), Some(2));
    }

    #[tokio::test]
    async fn decrement_unknown_product() {
        let store = InMemoryCatalogStore::new();
        assert_eq!(
            store.try_decrement(ProductId::new(), 1).await.unwrap(),
            DecrementOutcome::UnknownProduct
        );
    }

    #[tokio::test]
    async fn increment_has_no_upper_bound_check() {
        let store = InMemoryCatalogStore::new();
        let p = product(0);
        let id = p.id;
        store.put(p);

        assert_eq!(store.increment(id, 10).await.unwrap(), Some(10));
        assert_eq!(store.increment(id, 10).await.unwrap(), Some(20));
        assert_eq!(store.increment(ProductId::new(), 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn clone_shares_storage() {
        let store1 = InMemoryCatalogStore::new();
        let store2 = store1.clone();
        let p = product(1);
        let id = p.id;
        store1.put(p);
        assert!(store2.product(id).await.unwrap().is_some());
    }
}
