//! Shared fixtures for the in-memory database tests.

use chrono::{Duration, Utc};
use viajes_core::{CatalogStatus, Package, Service, User};

use crate::pool::{Database, DbConfig};

/// Fresh in-memory database with migrations applied.
pub(crate) async fn setup_db() -> Database {
    Database::new(DbConfig::in_memory())
        .await
        .expect("in-memory database")
}

pub(crate) async fn seed_user(db: &Database, id: &str, name: &str) {
    let user = User {
        id: id.to_string(),
        name: name.to_string(),
        email: format!("{id}@example.com"),
        created_at: Utc::now(),
    };
    db.users().insert(&user).await.expect("seed user");
}

pub(crate) async fn seed_package(db: &Database, id: &str, name: &str, price_cents: i64, stock: i64) {
    let now = Utc::now();
    let start = now.date_naive() + Duration::days(60);
    let package = Package {
        id: id.to_string(),
        name: name.to_string(),
        description: None,
        price_cents,
        travel_start: start,
        travel_end: start + Duration::days(7),
        stock,
        status: CatalogStatus::Active,
        created_at: now,
        updated_at: now,
    };
    db.catalog().insert_package(&package).await.expect("seed package");
}

pub(crate) async fn seed_service(db: &Database, id: &str, name: &str, cost_cents: i64) {
    let service = Service {
        id: id.to_string(),
        name: name.to_string(),
        cost_cents,
        status: CatalogStatus::Active,
        created_at: Utc::now(),
    };
    db.catalog().insert_service(&service).await.expect("seed service");
}

/// Books one package directly and returns the new reservation id.
pub(crate) async fn checkout_single_for(db: &Database, user_id: &str, package_id: &str) -> String {
    let travel_start = Utc::now().date_naive() + Duration::days(30);
    let detail = db
        .checkout()
        .checkout_single(user_id, package_id, travel_start, &[])
        .await
        .expect("direct booking");
    detail.reservation.id
}
