//! Shopcore - storefront order core.
//!
//! The core of a storefront: a per-user cart aggregate, an order factory
//! that converts carts into immutable order snapshots while reserving
//! inventory, a forward-only order lifecycle with stock-restoring
//! cancellation, and a per-user address book with a single-default
//! invariant.
//!
//! Persistence and the catalog are seams: services depend on the store
//! traits in [`catalog`], [`cart`], [`order`], and [`address`], so adapters
//! (such as the in-memory ones in `shopcore-memory`) can be swapped without
//! touching business rules.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod address;
pub mod cart;
pub mod catalog;
pub mod errors;
pub mod inventory;
pub mod order;
pub mod types;

pub use address::{Address, AddressBook, AddressPatch, AddressStore, DeliveryAddress, NewAddress};
pub use cart::{Cart, CartItem, CartService, CartStore, CartView};
pub use catalog::{CatalogStore, DecrementOutcome, Product};
pub use errors::{CoreError, CoreResult, StorageError, StorageResult};
pub use inventory::{InventoryLedger, LedgerError};
pub use order::{
    Order, OrderItem, OrderService, OrderStatus, OrderStore, OrdersPage, Pagination,
    PaymentMethod, PaymentStatus,
};
pub use types::{
    AddressId, CartItemId, Money, OrderId, ProductId, ProductName, Quantity, UserId,
};
