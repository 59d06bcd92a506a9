// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Coin shop: catalogue management and purchases.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use super::require_text;
use crate::{
    auth::{AdminOnly, Auth},
    error::ApiError,
    state::AppState,
    storage::{NewShopItem, Purchase, ShopItem, ShopRepository},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseResponse {
    pub purchase: Purchase,
}

#[utoipa::path(
    get,
    path = "/api/shop",
    tag = "Shop",
    responses((status = 200, body = [ShopItem]))
)]
pub async fn list_items(
    State(state): State<AppState>,
    _caller: Auth,
) -> Result<Json<Vec<ShopItem>>, ApiError> {
    Ok(Json(ShopRepository::new(&state.db).list_items()?))
}

#[utoipa::path(
    post,
    path = "/api/shop",
    request_body = NewShopItem,
    tag = "Shop",
    responses((status = 201, body = ShopItem), (status = 400), (status = 403))
)]
pub async fn create_item(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Json(new): Json<NewShopItem>,
) -> Result<(StatusCode, Json<ShopItem>), ApiError> {
    require_text("name", &new.name)?;
    let item = ShopRepository::new(&state.db).create_item(new)?;
    Ok((StatusCode::CREATED, Json(item)))
}

#[utoipa::path(
    delete,
    path = "/api/shop/{id}",
    params(("id" = u64, Path, description = "Item id")),
    tag = "Shop",
    responses((status = 204), (status = 403), (status = 404))
)]
pub async fn delete_item(
    State(state): State<AppState>,
    _admin: AdminOnly,
    Path(id): Path<u64>,
) -> Result<StatusCode, ApiError> {
    ShopRepository::new(&state.db).delete_item(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Buy one unit for the caller. Balance, stock and purchase log change together or not at all.
#[utoipa::path(
    post,
    path = "/api/shop/{id}/buy",
    params(("id" = u64, Path, description = "Item id")),
    tag = "Shop",
    responses(
        (status = 201, body = PurchaseResponse),
        (status = 404, description = "Unknown item"),
        (status = 409, description = "Out of stock or insufficient coins")
    )
)]
pub async fn buy_item(
    State(state): State<AppState>,
    Auth(caller): Auth,
    Path(id): Path<u64>,
) -> Result<(StatusCode, Json<PurchaseResponse>), ApiError> {
    let purchase = ShopRepository::new(&state.db).buy(caller.id(), id)?;
    Ok((StatusCode::CREATED, Json(PurchaseResponse { purchase })))
}

#[utoipa::path(
    get,
    path = "/api/shop/purchases/me",
    tag = "Shop",
    responses((status = 200, body = [Purchase]))
)]
pub async fn my_purchases(
    State(state): State<AppState>,
    Auth(caller): Auth,
) -> Result<Json<Vec<Purchase>>, ApiError> {
    Ok(Json(ShopRepository::new(&state.db).purchases_by_user(caller.id())?))
}
