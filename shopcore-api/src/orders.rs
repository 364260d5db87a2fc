//! Order endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use serde::Deserialize;
use shopcore::address::DeliveryAddress;
use shopcore::errors::CoreError;
use shopcore::order::{Order, OrderStatus, OrdersPage, PaymentMethod};
use shopcore::types::OrderId;

use crate::auth::Identity;
use crate::error::ApiResult;
use crate::{AppState, Envelope};

/// Body for `POST /orders`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    /// Where to deliver; snapshotted onto the order.
    pub delivery_address: DeliveryAddress,
    /// How the customer pays.
    pub payment_method: PaymentMethod,
}

/// Query for `GET /orders`.
#[derive(Debug, Deserialize)]
pub struct ListOrdersQuery {
    /// 1-based page, defaulting to 1.
    #[serde(default)]
    pub page: Option<u64>,
    /// Page size, defaulting to 10 and clamped server-side.
    #[serde(default)]
    pub limit: Option<u64>,
    /// Optional status filter, e.g. `Confirmed` or `In Transit`.
    #[serde(default)]
    pub status: Option<String>,
}

fn parse_order_id(raw: &str) -> Result<OrderId, CoreError> {
    OrderId::try_new(raw.to_string()).map_err(|_| CoreError::not_found("order", raw))
}

/// `POST /orders`
pub async fn place(
    State(state): State<AppState>,
    Identity(user): Identity,
    Json(request): Json<PlaceOrderRequest>,
) -> ApiResult<(StatusCode, Json<Envelope<Order>>)> {
    let order = state
        .orders
        .place_order(user, request.delivery_address, request.payment_method)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(order, "Order placed successfully")),
    ))
}

/// `GET /orders`
pub async fn list(
    State(state): State<AppState>,
    Identity(user): Identity,
    Query(query): Query<ListOrdersQuery>,
) -> ApiResult<Json<Envelope<OrdersPage>>> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<OrderStatus>)
        .transpose()?;
    let page = state
        .orders
        .list_orders(
            user,
            query.page.unwrap_or(1),
            query.limit.unwrap_or(10),
            status,
        )
        .await?;
    Ok(Json(Envelope::ok(page)))
}

/// `GET /orders/{orderId}`
pub async fn get(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(order_id): Path<String>,
) -> ApiResult<Json<Envelope<Order>>> {
    let id = parse_order_id(&order_id)?;
    let order = state.orders.get_order(user, &id).await?;
    Ok(Json(Envelope::ok(order)))
}

/// `PUT /orders/{orderId}/cancel`
pub async fn cancel(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(order_id): Path<String>,
) -> ApiResult<Json<Envelope<Order>>> {
    let id = parse_order_id(&order_id)?;
    let order = state.orders.cancel(user, &id).await?;
    Ok(Json(Envelope::with_message(
        order,
        "Order cancelled successfully",
    )))
}
