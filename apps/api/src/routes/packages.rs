//! Public catalog reads. Only active packages are listed; direct lookups by
//! id return inactive ones too so existing carts keep resolving.

use axum::{
    extract::{Path, State},
    Json,
};
use viajes_core::Package;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Package>>> {
    let packages = state
        .db
        .catalog()
        .list_active_packages()
        .await?;
    Ok(Json(packages))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Package>> {
    let package = state
        .db
        .catalog()
        .get_package(&id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Package '{id}' not found")))?;
    Ok(Json(package))
}
