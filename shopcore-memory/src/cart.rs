//! Thread-safe in-memory cart store with optimistic version checks.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use shopcore::cart::{Cart, CartStore};
use shopcore::errors::{StorageError, StorageResult};
use shopcore::types::UserId;

/// In-memory cart store. Saves compare the stored version against the one
/// the writer read, so two read-modify-write cycles on the same cart cannot
/// silently lose one another's lines.
#[derive(Clone, Default)]
pub struct InMemoryCartStore {
    carts: Arc<RwLock<HashMap<UserId, Cart>>>,
}

impl InMemoryCartStore {
    /// Creates an empty cart store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for InMemoryCartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryCartStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl CartStore for InMemoryCartStore {
    async fn load(&self, user: UserId) -> StorageResult<Option<Cart>> {
        let carts = self.carts.read().expect("RwLock poisoned");
        Ok(carts.get(&user).cloned())
    }

    async fn save(&self, cart: &Cart) -> StorageResult<u64> {
        let mut carts = self.carts.write().expect("RwLock poisoned");
        let current = carts.get(&cart.user).map_or(0, |stored| stored.version);
        if current != cart.version {
            return Err(StorageError::VersionConflict {
                entity: "cart",
                key: cart.user.to_string(),
                expected: cart.version,
                current,
            });
        }
        let mut stored = cart.clone();
        stored.version = current + 1;
        let version = stored.version;
        carts.insert(cart.user, stored);
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn save_bumps_version_and_load_returns_it() {
        let store = InMemoryCartStore::new();
        let user = UserId::new();
        let cart = Cart::empty(user);

        assert_eq!(store.save(&cart).await.unwrap(), 1);
        let loaded = store.load(user).await.unwrap().unwrap();
        assert_eq!(loaded.version, 1);
    }

    #[tokio::test]
    async fn stale_save_is_rejected() {
        let store = InMemoryCartStore::new();
        let user = UserId::new();
        let cart = Cart::empty(user);
        store.save(&cart).await.unwrap();

        // Still at version 0: someone else saved in between.
        let result = store.save(&cart).await;
        assert!(matches!(
            result,
            Err(StorageError::VersionConflict {
                expected: 0,
                current: 1,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn unknown_user_has_no_cart() {
        let store = InMemoryCartStore::new();
        assert!(store.load(UserId::new()).await.unwrap().is_none());
    }
}
