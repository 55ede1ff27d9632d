//! Route table for the booking API.

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::state::AppState;

mod cart;
mod packages;
mod reservations;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/packages", get(packages::list))
        .route("/api/packages/{id}", get(packages::get))
        .route("/api/cart/{user_id}", get(cart::detail).delete(cart::clear))
        .route("/api/cart/{user_id}/items", post(cart::add_item))
        .route(
            "/api/cart/{user_id}/items/{item_id}",
            delete(cart::remove_item),
        )
        .route("/api/cart/{user_id}/count", get(cart::count))
        .route("/api/cart/{user_id}/checkout", post(cart::checkout))
        .route(
            "/api/reservations",
            get(reservations::list).post(reservations::create),
        )
        .route("/api/reservations/{id}", get(reservations::get))
        .route("/api/reservations/{id}/pay", post(reservations::pay))
        .route("/api/reservations/{id}/cancel", post(reservations::cancel))
        .route(
            "/api/users/{user_id}/reservations",
            get(reservations::list_by_user),
        )
        .with_state(state)
}
