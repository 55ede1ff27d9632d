//! Cart endpoints. Identity is an explicit path parameter; there is no
//! session. Checkout returns 201 with the freshly created reservation.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use viajes_core::{CartDetail, ReservationDetail};
use viajes_db::NewCartItem;

use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ItemCount {
    pub count: i64,
}

pub async fn detail(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<CartDetail>> {
    Ok(Json(state.db.carts().detail(&user_id).await?))
}

pub async fn add_item(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(input): Json<NewCartItem>,
) -> ApiResult<(StatusCode, Json<CartDetail>)> {
    let detail = state.db.carts().add_item(&user_id, input).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn remove_item(
    State(state): State<AppState>,
    Path((user_id, item_id)): Path<(String, String)>,
) -> ApiResult<Json<CartDetail>> {
    Ok(Json(state.db.carts().remove_item(&user_id, &item_id).await?))
}

pub async fn clear(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<StatusCode> {
    state.db.carts().clear(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn count(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<ItemCount>> {
    let count = state.db.carts().count_items(&user_id).await?;
    Ok(Json(ItemCount { count }))
}

pub async fn checkout(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<(StatusCode, Json<ReservationDetail>)> {
    let detail = state.db.checkout().checkout(&user_id).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}
