//! Error types for the storefront core.
//!
//! Two layers, converted at the seam:
//!
//! - [`StorageError`]: persistence failures (version conflicts, duplicate
//!   order ids). Adapters produce these; services either retry or wrap them.
//! - [`CoreError`]: the business-facing taxonomy surfaced to callers.
//!   Validation errors are detected before any mutation; business-rule errors
//!   abort the whole operation with no partial state change.

use crate::order::OrderStatus;
use crate::types::OrderId;
use thiserror::Error;

/// Errors produced by store adapters.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Optimistic concurrency check failed on a versioned write.
    #[error("version conflict on {entity} '{key}': expected {expected}, current {current}")]
    VersionConflict {
        /// Kind of entity being written.
        entity: &'static str,
        /// Key of the conflicting record.
        key: String,
        /// The version the writer read.
        expected: u64,
        /// The version actually stored.
        current: u64,
    },

    /// An order with the given id already exists.
    #[error("duplicate order id: {0}")]
    DuplicateOrderId(OrderId),

    /// The record a write addressed is not in the store.
    #[error("{entity} '{key}' not present in store")]
    Missing {
        /// Kind of entity addressed.
        entity: &'static str,
        /// The key that missed.
        key: String,
    },

    /// Serialization of a record failed.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// An I/O error occurred in the backing store.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store adapter operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors surfaced by the storefront services.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The entity is absent, or not owned by the caller.
    #[error("{entity} '{key}' not found")]
    NotFound {
        /// Kind of entity looked up.
        entity: &'static str,
        /// The key that missed.
        key: String,
    },

    /// Malformed or missing input, detected before any mutation.
    #[error("validation failed: {0}")]
    ValidationFailed(String),

    /// Requested quantity exceeds live stock for the named item.
    #[error("insufficient inventory for {name}: requested {requested}, available {available}")]
    InsufficientInventory {
        /// Display name of the offending item.
        name: String,
        /// Units requested.
        requested: u32,
        /// Units actually available.
        available: u32,
    },

    /// Order placement attempted on a cart with zero items.
    #[error("cart is empty")]
    EmptyCart,

    /// Illegal order status change.
    #[error("cannot move order from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: OrderStatus,
        /// Requested status.
        to: OrderStatus,
    },

    /// Missing or invalid caller identity.
    #[error("unauthorized: {0}")]
    Unauthorized(String),

    /// A persistence failure that exhausted any bounded retry.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// An unexpected failure; logged, surfaced without internal detail.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result alias for service operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Convenience constructor for [`CoreError::NotFound`].
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}
