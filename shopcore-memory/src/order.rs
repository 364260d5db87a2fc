//! Thread-safe in-memory order store.

use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use shopcore::errors::{StorageError, StorageResult};
use shopcore::order::{Order, OrderStatus, OrderStore};
use shopcore::types::{OrderId, UserId};

/// In-memory order store. Orders are kept in insertion order, which is also
/// creation order, so listings walk the vector backwards for newest-first.
#[derive(Clone, Default)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<Vec<Order>>>,
}

impl InMemoryOrderStore {
    /// Creates an empty order store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored orders across all users.
    pub fn len(&self) -> usize {
        self.orders.read().expect("RwLock poisoned").len()
    }

    /// Whether the store holds no orders.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Debug for InMemoryOrderStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryOrderStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn insert(&self, order: &Order) -> StorageResult<()> {
        let mut orders = self.orders.write().expect("RwLock poisoned");
        if orders.iter().any(|stored| stored.order_id == order.order_id) {
            return Err(StorageError::DuplicateOrderId(order.order_id.clone()));
        }
        orders.push(order.clone());
        Ok(())
    }

    async fn find(&self, user: UserId, id: &OrderId) -> StorageResult<Option<Order>> {
        let orders = self.orders.read().expect("RwLock poisoned");
        Ok(orders
            .iter()
            .find(|order| order.user == user && &order.order_id == id)
            .cloned())
    }

    async fn update(&self, order: &Order) -> StorageResult<()> {
        let mut orders = self.orders.write().expect("RwLock poisoned");
        match orders
            .iter_mut()
            .find(|stored| stored.user == order.user && stored.order_id == order.order_id)
        {
            Some(stored) => {
                *stored = order.clone();
                Ok(())
            }
            None => Err(StorageError::Missing {
                entity: "order",
                key: order.order_id.to_string(),
            }),
        }
    }

    async fn list(
        &self,
        user: UserId,
        status: Option<OrderStatus>,
        offset: u64,
        limit: u64,
    ) -> StorageResult<(Vec<Order>, u64)> {
        let orders = self.orders.read().expect("RwLock poisoned");
        let matches: Vec<&Order> = orders
            .iter()
            .rev()
            .filter(|order| order.user == user)
            .filter(|order| status.map_or(true, |wanted| order.status == wanted))
            .collect();
        let total = matches.len() as u64;
        let offset = usize::try_from(offset).unwrap_or(usize::MAX);
        let limit = usize::try_from(limit).unwrap_or(usize::MAX);
        let page = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect();
        Ok((page, total))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use shopcore::address::DeliveryAddress;
    use shopcore::order::{OrderItem, PaymentMethod, PaymentStatus};
    use shopcore::types::{Money, ProductId, ProductName, Quantity};

    fn order_for(user: UserId) -> Order {
        let now = Utc::now();
        Order {
            order_id: OrderId::generate(),
            user,
            items: vec![OrderItem {
                product_id: ProductId::new(),
                name: ProductName::try_new("Test".to_string()).unwrap(),
                price: Money::from_cents(500).unwrap(),
                image: "https://img.example/t.jpg".to_string(),
                quantity: Quantity::new(1).unwrap(),
                selected_size: None,
                selected_color: None,
            }],
            total_amount: Money::from_cents(500).unwrap(),
            status: OrderStatus::Confirmed,
            delivery_address: DeliveryAddress {
                label: "Home".to_string(),
                line: "1 Main St".to_string(),
                city: None,
                state: None,
                postal_code: None,
            },
            payment_method: PaymentMethod::Cod,
            payment_status: PaymentStatus::Pending,
            tracking_id: None,
            estimated_delivery: now + Duration::days(7),
            delivered_at: None,
            created_at: now,
        }
    }

    #[tokio::test]
    async fn duplicate_order_ids_are_rejected() {
        let store = InMemoryOrderStore::new();
        let user = UserId::new();
        let order = order_for(user);
        store.insert(&order).await.unwrap();
        assert!(matches!(
            store.insert(&order).await,
            Err(StorageError::DuplicateOrderId(_))
        ));
    }

    #[tokio::test]
    async fn updating_a_missing_order_reports_it_as_missing() {
        let store = InMemoryOrderStore::new();
        let order = order_for(UserId::new());
        assert!(matches!(
            store.update(&order).await,
            Err(StorageError::Missing { entity: "order", .. })
        ));
    }

    #[tokio::test]
    async fn find_checks_ownership() {
        let store = InMemoryOrderStore::new();
        let user = UserId::new();
        let order = order_for(user);
        store.insert(&order).await.unwrap();

        assert!(store.find(user, &order.order_id).await.unwrap().is_some());
        assert!(store
            .find(UserId::new(), &order.order_id)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn list_is_newest_first_with_status_filter() {
        let store = InMemoryOrderStore::new();
        let user = UserId::new();
        let first = order_for(user);
        let mut second = order_for(user);
        second.status = OrderStatus::Cancelled;
        store.insert(&first).await.unwrap();
        store.insert(&second).await.unwrap();

        let (all, total) = store.list(user, None, 0, 10).await.unwrap();
        assert_eq!(total, 2);
        assert_eq!(all[0].order_id, second.order_id);

        let (cancelled, total) = store
            .list(user, Some(OrderStatus::Cancelled), 0, 10)
            .await
            .unwrap();
        assert_eq!(total, 1);
        assert_eq!(cancelled[0].order_id, second.order_id);
    }

    #[tokio::test]
    async fn list_windows_with_offset_and_limit() {
        let store = InMemoryOrderStore::new();
        let user = UserId::new();
        for _ in 0..5 {
            store.insert(&order_for(user)).await.unwrap();
        }
        let (page, total) = store.list(user, None, 2, 2).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);
    }
}
