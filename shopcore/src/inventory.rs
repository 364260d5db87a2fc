//! Inventory ledger: the only place stock is reserved or released.
//!
//! A thin, instrumented wrapper over the catalog's atomic stock primitives.
//! The ledger is the authoritative guard during order placement; cart-time
//! stock checks are advisory only.

use crate::catalog::{CatalogStore, DecrementOutcome};
use crate::errors::StorageError;
use crate::types::{ProductId, Quantity};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, instrument};

/// Failures of a ledger operation.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Current stock is below the requested quantity; nothing changed.
    #[error("product '{product}' is out of stock: requested {requested}, available {available}")]
    OutOfStock {
        /// The product that could not be reserved.
        product: ProductId,
        /// Units requested.
        requested: u32,
        /// Units actually available.
        available: u32,
    },

    /// The product is not in the catalog.
    #[error("product '{0}' not in catalog")]
    UnknownProduct(ProductId),

    /// The catalog store itself failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Atomic reserve/release operations per product.
#[derive(Clone)]
pub struct InventoryLedger {
    catalog: Arc<dyn CatalogStore>,
}

impl std::fmt::Debug for InventoryLedger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InventoryLedger").finish_non_exhaustive()
    }
}

impl InventoryLedger {
    /// Creates a ledger over the given catalog.
    pub fn new(catalog: Arc<dyn CatalogStore>) -> Self {
        Self { catalog }
    }

    /// Reserves `qty` units of `product`, returning the new stock level.
    ///
    /// Fails with [`LedgerError::OutOfStock`] when fewer than `qty` units
    /// remain; the check and decrement are a single atomic step in the store.
    #[instrument(skip(self))]
    pub async fn reserve(&self, product: ProductId, qty: Quantity) -> Result<u32, LedgerError> {
        match self.catalog.try_decrement(product, qty.value()).await? {
            DecrementOutcome::Reserved { remaining } => {
                debug!(%product, qty = qty.value(), remaining, "reserved stock");
                Ok(remaining)
            }
            DecrementOutcome::Insufficient { available } => Err(LedgerError::OutOfStock {
                product,
                requested: qty.value(),
                available,
            }),
            DecrementOutcome::UnknownProduct => Err(LedgerError::UnknownProduct(product)),
        }
    }

    /// Releases `qty` units of `product` back to stock, returning the new
    /// level. Used on cancellation and on order-placement rollback.
    #[instrument(skip(self))]
    pub async fn release(&self, product: ProductId, qty: Quantity) -> Result<u32, LedgerError> {
        match self.catalog.increment(product, qty.value()).await? {
            Some(level) => {
                debug!(%product, qty = qty.value(), level, "released stock");
                Ok(level)
            }
            None => Err(LedgerError::UnknownProduct(product)),
        }
    }
}
