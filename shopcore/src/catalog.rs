//! Catalog collaborator seam.
//!
//! The catalog owns products and their stock counters. The core reads
//! products and mutates stock exclusively through the two atomic primitives
//! on [`CatalogStore`]; no other code path may touch a stock level.

use crate::errors::StorageResult;
use crate::types::{Money, ProductId, ProductName};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A product as the catalog exposes it to the core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Unique product identifier.
    pub id: ProductId,
    /// Display name.
    pub name: ProductName,
    /// Current unit price.
    pub price: Money,
    /// Primary image URL.
    pub image: String,
    /// Units currently available. Non-negative by construction.
    pub stock: u32,
    /// Whether the product is purchasable.
    pub active: bool,
}

/// Outcome of a conditional stock decrement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// Stock was decremented; carries the new level.
    Reserved {
        /// Units remaining after the decrement.
        remaining: u32,
    },
    /// Stock was insufficient; nothing changed.
    Insufficient {
        /// Units actually available.
        available: u32,
    },
    /// The product is not in the catalog; nothing changed.
    UnknownProduct,
}

/// Read and stock-mutation seam onto the catalog.
///
/// Both mutation primitives must be atomic with respect to concurrent calls
/// on the same product: the check and the write happen under one guard, never
/// as a separate read followed by a write.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// Looks up a product by id, active or not.
    async fn product(&self, id: ProductId) -> StorageResult<Option<Product>>;

    /// Atomically decrements stock by `qty` if at least `qty` units remain.
    async fn try_decrement(&self, id: ProductId, qty: u32) -> StorageResult<DecrementOutcome>;

    /// Atomically increments stock by `qty`, saturating at `u32::MAX`.
    ///
    /// Returns the new level, or `None` when the product is unknown. There is
    /// deliberately no upper-bound check against past reservations.
    async fn increment(&self, id: ProductId, qty: u32) -> StorageResult<Option<u32>>;
}
