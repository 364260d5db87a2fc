//! Cart endpoints.

use axum::extract::{Path, State};
use axum::response::Json;
use serde::Deserialize;
use shopcore::cart::CartView;
use shopcore::types::{CartItemId, ProductId, Quantity};
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::ApiResult;
use crate::{AppState, Envelope};

/// Body for `POST /cart/add`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    /// Product to add.
    pub product_id: Uuid,
    /// Units to add; defaults to 1.
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    /// Selected size, if any.
    #[serde(default)]
    pub selected_size: Option<String>,
    /// Selected color, if any.
    #[serde(default)]
    pub selected_color: Option<String>,
}

const fn default_quantity() -> u32 {
    1
}

/// Body for `PUT /cart/{itemId}`.
#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    /// New quantity for the line.
    pub quantity: u32,
}

/// `GET /cart`
pub async fn get_cart(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<Json<Envelope<CartView>>> {
    let cart = state.carts.get(user).await?;
    Ok(Json(Envelope::ok(cart)))
}

/// `POST /cart/add`
pub async fn add_item(
    State(state): State<AppState>,
    Identity(user): Identity,
    Json(request): Json<AddItemRequest>,
) -> ApiResult<Json<Envelope<CartView>>> {
    let qty = Quantity::new(request.quantity)?;
    let cart = state
        .carts
        .add_item(
            user,
            ProductId::from(request.product_id),
            qty,
            request.selected_size,
            request.selected_color,
        )
        .await?;
    Ok(Json(Envelope::with_message(cart, "Item added to cart")))
}

/// `PUT /cart/{itemId}`
pub async fn update_item(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(item_id): Path<Uuid>,
    Json(request): Json<UpdateItemRequest>,
) -> ApiResult<Json<Envelope<CartView>>> {
    let qty = Quantity::new(request.quantity)?;
    let cart = state
        .carts
        .update_item(user, CartItemId::from(item_id), qty)
        .await?;
    Ok(Json(Envelope::ok(cart)))
}

/// `DELETE /cart/{itemId}`
pub async fn remove_item(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(item_id): Path<Uuid>,
) -> ApiResult<Json<Envelope<CartView>>> {
    let cart = state
        .carts
        .remove_item(user, CartItemId::from(item_id))
        .await?;
    Ok(Json(Envelope::ok(cart)))
}

/// `DELETE /cart/clear`
pub async fn clear(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<Json<Envelope<CartView>>> {
    let cart = state.carts.clear(user).await?;
    Ok(Json(Envelope::with_message(cart, "Cart cleared")))
}
