// ============================================================================
// Checkout engine
// ============================================================================
//
// Turns a staged cart into exactly one PENDING reservation, atomically.
// The whole conversion runs inside a single transaction:
//
//   1. snapshot the cart items with current catalog prices
//   2. refuse if any referenced package is out of stock
//   3. insert the reservation, its items, and the frozen service lines
//   4. take one unit of stock per item with a conditional UPDATE
//   5. empty the cart
//
// Step 4 re-checks `stock > 0` at write time, so two concurrent checkouts
// racing for the last unit cannot both succeed. A failed decrement aborts
// the transaction and the cart is left untouched.

use chrono::Utc;
use sqlx::SqlitePool;
use uuid::Uuid;
use viajes_core::{
    pricing::{self, ServiceLine},
    validation, CoreError, Money, Reservation, ReservationDetail, ReservationItem,
    ReservationItemService, ReservationStatus, ServiceSelection,
};

use crate::error::{BookingResult, DbError};
use crate::repository::cart::CartRepository;
use crate::repository::catalog::CatalogRepository;
use crate::repository::reservation::ReservationRepository;

/// Priced snapshot of one cart item, taken before any row is written.
struct ItemSnapshot {
    package_id: String,
    package_name: String,
    travel_start: chrono::NaiveDate,
    subtotal: Money,
    services: Vec<ServiceSnapshot>,
}

struct ServiceSnapshot {
    service_id: String,
    quantity: i64,
    unit_cost: Money,
}

#[derive(Clone)]
pub struct CheckoutEngine {
    pool: SqlitePool,
}

impl CheckoutEngine {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Converts the user's entire cart into one PENDING reservation.
    pub async fn checkout(&self, user_id: &str) -> BookingResult<ReservationDetail> {
        let carts = CartRepository::new(self.pool.clone());
        let cart = carts.get_or_create(user_id).await?;

        // Snapshot, validation, reservation writes, and the cart clear all
        // share this transaction, so a cart mutation racing the checkout
        // either lands before the snapshot or after the commit, never
        // in between.
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let rows = CartRepository::item_rows_on(&mut tx, &cart.id).await?;
        if rows.is_empty() {
            return Err(CoreError::EmptyCart.into());
        }

        // Validate stock across the whole cart before writing anything, so
        // the error names the offending package instead of failing late.
        for row in &rows {
            if row.package_stock <= 0 {
                return Err(CoreError::InsufficientStock {
                    package: row.package_name.clone(),
                }
                .into());
            }
        }

        let mut snapshots = Vec::with_capacity(rows.len());
        for row in &rows {
            let service_rows = CartRepository::service_rows_on(&mut tx, &row.id).await?;
            let services: Vec<ServiceSnapshot> = service_rows
                .into_iter()
                .map(|s| ServiceSnapshot {
                    service_id: s.service_id,
                    quantity: s.quantity,
                    unit_cost: Money::from_cents(s.cost_cents),
                })
                .collect();

            let lines: Vec<ServiceLine> = services
                .iter()
                .map(|s| ServiceLine::new(s.unit_cost, s.quantity))
                .collect();

            snapshots.push(ItemSnapshot {
                package_id: row.package_id.clone(),
                package_name: row.package_name.clone(),
                travel_start: row.travel_start,
                subtotal: pricing::item_subtotal(Money::from_cents(row.package_price_cents), &lines),
                services,
            });
        }

        let reservation_id = self
            .write_reservation(&mut tx, user_id, &snapshots)
            .await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
            .bind(&cart.id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;
        sqlx::query("UPDATE carts SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(&cart.id)
            .execute(&mut *tx)
            .await
            .map_err(DbError::from)?;

        tx.commit().await.map_err(DbError::from)?;

        tracing::info!(user_id, reservation_id = %reservation_id, items = snapshots.len(), "checkout complete");
        self.load_detail(&reservation_id).await
    }

    /// Books a single package directly, bypassing the cart. Same pricing,
    /// stock, and snapshot rules as the cart path.
    pub async fn checkout_single(
        &self,
        user_id: &str,
        package_id: &str,
        travel_start: chrono::NaiveDate,
        selections: &[ServiceSelection],
    ) -> BookingResult<ReservationDetail> {
        let today = Utc::now().date_naive();
        validation::validate_travel_date(travel_start, today)
            .map_err(|_| CoreError::TravelDateInPast { date: travel_start })?;
        validation::validate_service_selections(selections)?;

        // Direct bookings never touch the cart; only the user must exist.
        let users = crate::repository::user::UserRepository::new(self.pool.clone());
        if !users.exists(user_id).await? {
            return Err(CoreError::UserNotFound(user_id.to_string()).into());
        }

        let catalog = CatalogRepository::new(self.pool.clone());
        let package = catalog
            .get_package(package_id)
            .await?
            .ok_or_else(|| CoreError::PackageNotFound(package_id.to_string()))?;
        if !package.is_active() {
            return Err(CoreError::PackageNotFound(package_id.to_string()).into());
        }
        if !package.has_stock() {
            return Err(CoreError::InsufficientStock {
                package: package.name.clone(),
            }
            .into());
        }

        let mut services = Vec::with_capacity(selections.len());
        for selection in selections {
            let service = catalog
                .get_service(&selection.service_id)
                .await?
                .ok_or_else(|| CoreError::ServiceNotFound(selection.service_id.clone()))?;
            let unit_cost = service.cost();
            services.push(ServiceSnapshot {
                service_id: service.id,
                quantity: selection.quantity,
                unit_cost,
            });
        }

        let lines: Vec<ServiceLine> = services
            .iter()
            .map(|s| ServiceLine::new(s.unit_cost, s.quantity))
            .collect();

        let snapshot = ItemSnapshot {
            package_id: package.id.clone(),
            package_name: package.name.clone(),
            travel_start,
            subtotal: pricing::item_subtotal(package.price(), &lines),
            services,
        };

        let mut tx = self.pool.begin().await.map_err(DbError::from)?;
        let reservation_id = self
            .write_reservation(&mut tx, user_id, std::slice::from_ref(&snapshot))
            .await?;
        tx.commit().await.map_err(DbError::from)?;

        tracing::info!(user_id, reservation_id = %reservation_id, package_id, "direct booking complete");
        self.load_detail(&reservation_id).await
    }

    /// Inserts the reservation row, its items, the frozen service lines, and
    /// takes stock for every item. Runs entirely on the caller's transaction.
    async fn write_reservation(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        user_id: &str,
        snapshots: &[ItemSnapshot],
    ) -> BookingResult<String> {
        let subtotals: Vec<Money> = snapshots.iter().map(|s| s.subtotal).collect();
        let total = pricing::booking_total(&subtotals);

        let now = Utc::now();
        let reservation = Reservation {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            total_cents: total.cents(),
            status: ReservationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        ReservationRepository::insert_reservation(tx, &reservation).await?;

        for snapshot in snapshots {
            let item = ReservationItem {
                id: Uuid::new_v4().to_string(),
                reservation_id: reservation.id.clone(),
                package_id: snapshot.package_id.clone(),
                travel_start: snapshot.travel_start,
                subtotal_cents: snapshot.subtotal.cents(),
                created_at: now,
            };
            ReservationRepository::insert_item(tx, &item).await?;

            for service in &snapshot.services {
                ReservationRepository::insert_item_service(
                    tx,
                    &ReservationItemService {
                        reservation_item_id: item.id.clone(),
                        service_id: service.service_id.clone(),
                        quantity: service.quantity,
                        unit_cost_cents: service.unit_cost.cents(),
                    },
                )
                .await?;
            }

            // The authoritative stock check. Failing here unwinds the whole
            // transaction, leaving the cart and every other package intact.
            if !CatalogRepository::decrement_stock(tx, &snapshot.package_id).await? {
                return Err(CoreError::InsufficientStock {
                    package: snapshot.package_name.clone(),
                }
                .into());
            }
        }

        Ok(reservation.id)
    }

    async fn load_detail(&self, reservation_id: &str) -> BookingResult<ReservationDetail> {
        let detail = ReservationRepository::new(self.pool.clone())
            .detail(reservation_id)
            .await?
            .ok_or_else(|| DbError::not_found("reservation", reservation_id))?;
        Ok(detail)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use viajes_core::{CoreError, ReservationStatus, ServiceSelection};

    use crate::error::BookingError;
    use crate::repository::cart::NewCartItem;
    use crate::testutil::{seed_package, seed_service, seed_user, setup_db};

    fn future_date() -> chrono::NaiveDate {
        Utc::now().date_naive() + Duration::days(30)
    }

    fn item(package_id: &str, services: Vec<ServiceSelection>) -> NewCartItem {
        NewCartItem {
            package_id: package_id.to_string(),
            travel_start: future_date(),
            services,
        }
    }

    fn pick(service_id: &str, quantity: i64) -> ServiceSelection {
        ServiceSelection {
            service_id: service_id.to_string(),
            quantity,
        }
    }

    #[tokio::test]
    async fn checkout_freezes_prices_and_totals() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;
        seed_service(&db, "s-1", "Seguro", 5_000).await;

        db.carts()
            .add_item("u-1", item("p-1", vec![pick("s-1", 2)]))
            .await
            .unwrap();

        let detail = db.checkout().checkout("u-1").await.unwrap();
        // 500.00 package plus 50.00 x 2 insurance = 600.00
        assert_eq!(detail.reservation.total_cents, 60_000);
        assert_eq!(detail.reservation.status, ReservationStatus::Pending);
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].item.subtotal_cents, 60_000);
        assert_eq!(detail.items[0].services[0].unit_cost_cents, 5_000);

        // Later catalog changes do not reach the snapshot.
        db.catalog().set_package_price("p-1", 99_000).await.unwrap();
        db.catalog().set_service_cost("s-1", 9_000).await.unwrap();
        let reread = db
            .reservations()
            .detail(&detail.reservation.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reread.reservation.total_cents, 60_000);
        assert_eq!(reread.items[0].services[0].unit_cost_cents, 5_000);
    }

    #[tokio::test]
    async fn checkout_decrements_stock_and_clears_cart() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;
        seed_package(&db, "p-2", "Amazonas", 80_000, 3).await;

        db.carts().add_item("u-1", item("p-1", vec![])).await.unwrap();
        db.carts().add_item("u-1", item("p-2", vec![])).await.unwrap();

        db.checkout().checkout("u-1").await.unwrap();

        assert_eq!(db.catalog().get_package("p-1").await.unwrap().unwrap().stock, 4);
        assert_eq!(db.catalog().get_package("p-2").await.unwrap().unwrap().stock, 2);
        assert_eq!(db.carts().count_items("u-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn empty_cart_cannot_be_checked_out() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;

        let err = db.checkout().checkout("u-1").await.unwrap_err();
        assert!(matches!(err, BookingError::Domain(CoreError::EmptyCart)));
    }

    #[tokio::test]
    async fn one_exhausted_package_aborts_the_whole_checkout() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;
        seed_package(&db, "p-2", "Amazonas", 80_000, 1).await;

        db.carts().add_item("u-1", item("p-1", vec![])).await.unwrap();
        db.carts().add_item("u-1", item("p-2", vec![])).await.unwrap();

        // Someone else takes the last Amazonas unit after staging.
        let mut conn = db.pool().acquire().await.unwrap();
        crate::repository::catalog::CatalogRepository::decrement_stock(&mut conn, "p-2")
            .await
            .unwrap();
        drop(conn);

        let err = db.checkout().checkout("u-1").await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::InsufficientStock { .. })
        ));

        // Nothing moved: cart intact, no reservation, first package untouched.
        assert_eq!(db.carts().count_items("u-1").await.unwrap(), 2);
        assert!(db.reservations().list().await.unwrap().is_empty());
        assert_eq!(db.catalog().get_package("p-1").await.unwrap().unwrap().stock, 5);
    }

    #[tokio::test]
    async fn sequential_checkouts_exhaust_stock_exactly() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_user(&db, "u-2", "Luis").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 1).await;

        db.carts().add_item("u-1", item("p-1", vec![])).await.unwrap();
        db.carts().add_item("u-2", item("p-1", vec![])).await.unwrap();

        db.checkout().checkout("u-1").await.unwrap();
        let err = db.checkout().checkout("u-2").await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::InsufficientStock { .. })
        ));

        assert_eq!(db.catalog().get_package("p-1").await.unwrap().unwrap().stock, 0);
        assert_eq!(db.reservations().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn racing_direct_bookings_cannot_oversell_the_last_unit() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_user(&db, "u-2", "Luis").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 1).await;

        let checkout_a = db.checkout();
        let checkout_b = db.checkout();
        let (a, b) = tokio::join!(
            checkout_a.checkout_single("u-1", "p-1", future_date(), &[]),
            checkout_b.checkout_single("u-2", "p-1", future_date(), &[]),
        );

        let successes = [a.is_ok(), b.is_ok()].iter().filter(|ok| **ok).count();
        assert_eq!(successes, 1);
        for result in [a, b] {
            if let Err(err) = result {
                assert!(matches!(
                    err,
                    BookingError::Domain(CoreError::InsufficientStock { .. })
                ));
            }
        }

        assert_eq!(db.catalog().get_package("p-1").await.unwrap().unwrap().stock, 0);
        assert_eq!(db.reservations().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn concurrent_cart_add_is_never_silently_dropped() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;
        seed_package(&db, "p-2", "Amazonas", 80_000, 5).await;

        db.carts().add_item("u-1", item("p-1", vec![])).await.unwrap();

        // An add racing the checkout lands either before the snapshot (and
        // is reserved) or after the commit (and stays staged). It must
        // never be cleared without having been reserved.
        let checkout_repo = db.checkout();
        let carts_repo = db.carts();
        let (checkout, added) = tokio::join!(
            checkout_repo.checkout("u-1"),
            carts_repo.add_item("u-1", item("p-2", vec![])),
        );
        added.unwrap();

        let reserved = checkout.unwrap().items.len() as i64;
        let staged = db.carts().count_items("u-1").await.unwrap();
        assert_eq!(reserved + staged, 2);
    }

    #[tokio::test]
    async fn direct_booking_skips_the_cart() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 2).await;
        seed_service(&db, "s-1", "Seguro", 5_000).await;

        let detail = db
            .checkout()
            .checkout_single("u-1", "p-1", future_date(), &[pick("s-1", 1)])
            .await
            .unwrap();

        assert_eq!(detail.reservation.total_cents, 55_000);
        assert_eq!(db.catalog().get_package("p-1").await.unwrap().unwrap().stock, 1);
        assert_eq!(db.carts().count_items("u-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn direct_booking_rejects_retired_package() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;
        db.catalog()
            .set_package_status("p-1", viajes_core::CatalogStatus::Inactive)
            .await
            .unwrap();

        let err = db
            .checkout()
            .checkout_single("u-1", "p-1", future_date(), &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::PackageNotFound(_))
        ));
    }

    #[tokio::test]
    async fn direct_booking_rejects_unknown_package() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;

        let err = db
            .checkout()
            .checkout_single("u-1", "p-missing", future_date(), &[])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::PackageNotFound(_))
        ));
    }
}
