//! HTTP API for the shopcore storefront core.
//!
//! Thin axum layer over the domain services in [`shopcore`]: every handler
//! authenticates the caller, parses the request into domain types at the
//! boundary, calls one service operation, and wraps the result in the
//! `{"success": ..., "data": ...}` envelope. No business rules live here.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod error;
pub mod orders;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::Router;
use serde::Serialize;
use shopcore::address::AddressBook;
use shopcore::cart::CartService;
use shopcore::order::OrderService;

pub use auth::{Identity, IdentityProvider, StaticTokenProvider};
pub use error::{ApiError, ApiResult};

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Cart operations.
    pub carts: CartService,
    /// Order placement and lifecycle.
    pub orders: OrderService,
    /// Saved delivery addresses.
    pub addresses: AddressBook,
    /// Token authentication seam.
    pub identity: Arc<dyn IdentityProvider>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState").finish_non_exhaustive()
    }
}

/// Response envelope shared by every successful endpoint.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    /// Always `true` on this path; error responses carry `false`.
    pub success: bool,
    /// Optional human-readable note.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// The payload.
    pub data: T,
}

impl<T: Serialize> Envelope<T> {
    /// Wraps a payload with no message.
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            message: None,
            data,
        }
    }

    /// Wraps a payload with a message.
    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: Some(message.into()),
            data,
        }
    }
}

/// Builds the full API router over the given state.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/cart", get(cart::get_cart))
        .route("/cart/add", post(cart::add_item))
        .route("/cart/clear", delete(cart::clear))
        .route(
            "/cart/{itemId}",
            put(cart::update_item).delete(cart::remove_item),
        )
        .route("/orders", post(orders::place).get(orders::list))
        .route("/orders/{orderId}", get(orders::get))
        .route("/orders/{orderId}/cancel", put(orders::cancel))
        .route("/addresses", get(addresses::list).post(addresses::add))
        .route(
            "/addresses/{addressId}",
            put(addresses::update).delete(addresses::remove),
        )
        .with_state(state)
}
