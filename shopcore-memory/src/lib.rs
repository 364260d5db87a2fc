//! In-memory store adapters for the shopcore storefront core.
//!
//! This crate implements the store traits from `shopcore` on top of
//! `Arc<RwLock<HashMap<..>>>`, useful for tests and development scenarios
//! where persistence is not required. Cloning an adapter shares its storage.
//!
//! Concurrency contracts are honored the simple way: stock mutations do the
//! check and the write under one write lock, and cart/address saves compare
//! the stored version before replacing.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::significant_drop_tightening)]

mod address;
mod cart;
mod catalog;
mod order;

pub use address::InMemoryAddressStore;
pub use cart::InMemoryCartStore;
pub use catalog::InMemoryCatalogStore;
pub use order::InMemoryOrderStore;
