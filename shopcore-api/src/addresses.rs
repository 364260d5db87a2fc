//! Address book endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use shopcore::address::{Address, AddressPatch, NewAddress};
use shopcore::types::AddressId;
use uuid::Uuid;

use crate::auth::Identity;
use crate::error::ApiResult;
use crate::{AppState, Envelope};

/// `GET /addresses`
pub async fn list(
    State(state): State<AppState>,
    Identity(user): Identity,
) -> ApiResult<Json<Envelope<Vec<Address>>>> {
    let addresses = state.addresses.list(user).await?;
    Ok(Json(Envelope::ok(addresses)))
}

/// `POST /addresses`
pub async fn add(
    State(state): State<AppState>,
    Identity(user): Identity,
    Json(request): Json<NewAddress>,
) -> ApiResult<(StatusCode, Json<Envelope<Vec<Address>>>)> {
    let addresses = state.addresses.add(user, request).await?;
    Ok((
        StatusCode::CREATED,
        Json(Envelope::with_message(addresses, "Address added")),
    ))
}

/// `PUT /addresses/{addressId}`
pub async fn update(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(address_id): Path<Uuid>,
    Json(request): Json<AddressPatch>,
) -> ApiResult<Json<Envelope<Vec<Address>>>> {
    let addresses = state
        .addresses
        .update(user, AddressId::from(address_id), request)
        .await?;
    Ok(Json(Envelope::ok(addresses)))
}

/// `DELETE /addresses/{addressId}`
pub async fn remove(
    State(state): State<AppState>,
    Identity(user): Identity,
    Path(address_id): Path<Uuid>,
) -> ApiResult<Json<Envelope<Vec<Address>>>> {
    let addresses = state
        .addresses
        .remove(user, AddressId::from(address_id))
        .await?;
    Ok(Json(Envelope::with_message(addresses, "Address removed")))
}
