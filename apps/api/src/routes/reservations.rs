//! Reservation endpoints: listing, direct booking, and the two lifecycle
//! transitions.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use viajes_core::{Reservation, ReservationDetail, ServiceSelection};

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Direct booking request, bypassing the cart.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewReservation {
    pub user_id: String,
    pub package_id: String,
    pub travel_start: chrono::NaiveDate,
    #[serde(default)]
    pub services: Vec<ServiceSelection>,
}

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Reservation>>> {
    Ok(Json(state.db.reservations().list().await?))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReservationDetail>> {
    let detail = state
        .db
        .reservations()
        .detail(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Reservation '{id}' not found")))?;
    Ok(Json(detail))
}

pub async fn list_by_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> ApiResult<Json<Vec<Reservation>>> {
    Ok(Json(state.db.reservations().list_by_user(&user_id).await?))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<NewReservation>,
) -> ApiResult<(StatusCode, Json<ReservationDetail>)> {
    let detail = state
        .db
        .checkout()
        .checkout_single(
            &input.user_id,
            &input.package_id,
            input.travel_start,
            &input.services,
        )
        .await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

pub async fn pay(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReservationDetail>> {
    Ok(Json(state.db.lifecycle().confirm_payment(&id).await?))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<ReservationDetail>> {
    Ok(Json(state.db.lifecycle().cancel(&id).await?))
}
