//! Thread-safe in-memory address store.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use shopcore::address::{Address, AddressStore};
use shopcore::errors::{StorageError, StorageResult};
use shopcore::types::UserId;

/// In-memory address store keyed by user, with optimistic versioning on each
/// user's address list.
#[derive(Clone, Default)]
pub struct InMemoryAddressStore {
    books: Arc<RwLock<HashMap<UserId, (Vec<Address>, u64)>>>,
}

impl InMemoryAddressStore {
    /// Creates an empty address store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for InMemoryAddressStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryAddressStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl AddressStore for InMemoryAddressStore {
    async fn load(&self, user: UserId) -> StorageResult<(Vec<Address>, u64)> {
        let books = self.books.read().expect("RwLock poisoned");
        Ok(books.get(&user).cloned().unwrap_or((Vec::new(), 0)))
    }

    async fn save(
        &self,
        user: UserId,
        addresses: &[Address],
        expected_version: u64,
    ) -> StorageResult<u64> {
        let mut books = self.books.write().expect("RwLock poisoned");
        let current = books.get(&user).map_or(0, |(_, version)| *version);
        if current != expected_version {
            return Err(StorageError::VersionConflict {
                entity: "address list",
                key: user.to_string(),
                expected: expected_version,
                current,
            });
        }
        let next = current + 1;
        books.insert(user, (addresses.to_vec(), next));
        Ok(next)
    }
}
