//! Per-user staging carts.
//!
//! A cart is created lazily the first time a user stages a package. Items
//! carry no prices; every read re-joins the catalog so the cart always
//! reflects current pricing, and nothing is frozen until checkout.

use chrono::Utc;
use serde::Deserialize;
use sqlx::{SqliteConnection, SqlitePool};
use uuid::Uuid;
use viajes_core::{
    pricing::{self, ServiceLine},
    validation, Cart, CartDetail, CartItem, CartItemDetail, CartItemService, CoreError, Money,
    PricedService, ServiceSelection, MAX_CART_ITEMS,
};

use crate::error::{BookingError, BookingResult, DbError, DbResult};

/// Input for staging a package into a cart.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub package_id: String,
    pub travel_start: chrono::NaiveDate,
    #[serde(default)]
    pub services: Vec<ServiceSelection>,
}

/// Joined cart item row as read back for display and checkout.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CartItemRow {
    pub id: String,
    pub cart_id: String,
    pub package_id: String,
    pub travel_start: chrono::NaiveDate,
    pub added_at: chrono::DateTime<chrono::Utc>,
    pub package_name: String,
    pub package_price_cents: i64,
    pub package_stock: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ItemServiceRow {
    pub service_id: String,
    pub name: String,
    pub quantity: i64,
    pub cost_cents: i64,
}

#[derive(Clone)]
pub struct CartRepository {
    pool: SqlitePool,
}

impl CartRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Returns the user's cart, creating an empty one on first touch.
    pub async fn get_or_create(&self, user_id: &str) -> BookingResult<Cart> {
        self.ensure_user(user_id).await?;

        if let Some(cart) = self.find_by_user(user_id).await? {
            return Ok(cart);
        }

        let now = Utc::now();
        let cart = Cart {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            created_at: now,
            updated_at: now,
        };
        sqlx::query(
            "INSERT INTO carts (id, user_id, created_at, updated_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&cart.id)
        .bind(&cart.user_id)
        .bind(cart.created_at)
        .bind(cart.updated_at)
        .execute(&self.pool)
        .await?;

        tracing::debug!(user_id, cart_id = %cart.id, "created cart");
        Ok(cart)
    }

    /// Stages a package (with optional add-on services) into the user's cart.
    ///
    /// Stock is checked here only as an early courtesy; the authoritative
    /// check happens again inside the checkout transaction.
    pub async fn add_item(&self, user_id: &str, input: NewCartItem) -> BookingResult<CartDetail> {
        let today = Utc::now().date_naive();
        validation::validate_travel_date(input.travel_start, today).map_err(|_| {
            CoreError::TravelDateInPast {
                date: input.travel_start,
            }
        })?;
        validation::validate_service_selections(&input.services)?;

        let cart = self.get_or_create(user_id).await?;

        let package = self
            .db_catalog()
            .get_package(&input.package_id)
            .await?
            .ok_or_else(|| CoreError::PackageNotFound(input.package_id.clone()))?;

        // Retired packages stay resolvable for existing carts but can no
        // longer be staged.
        if !package.is_active() {
            return Err(CoreError::PackageNotFound(input.package_id.clone()).into());
        }

        if !package.has_stock() {
            return Err(CoreError::InsufficientStock {
                package: package.name.clone(),
            }
            .into());
        }

        for selection in &input.services {
            if self
                .db_catalog()
                .get_service(&selection.service_id)
                .await?
                .is_none()
            {
                return Err(CoreError::ServiceNotFound(selection.service_id.clone()).into());
            }
        }

        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE cart_id = ?")
                .bind(&cart.id)
                .fetch_one(&self.pool)
                .await?;
        if count as usize >= MAX_CART_ITEMS {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_ITEMS,
            }
            .into());
        }

        let duplicate: Option<String> = sqlx::query_scalar(
            "SELECT id FROM cart_items WHERE cart_id = ? AND package_id = ?",
        )
        .bind(&cart.id)
        .bind(&input.package_id)
        .fetch_optional(&self.pool)
        .await?;
        if duplicate.is_some() {
            return Err(CoreError::DuplicateItem {
                package: package.name.clone(),
            }
            .into());
        }

        let item = CartItem {
            id: Uuid::new_v4().to_string(),
            cart_id: cart.id.clone(),
            package_id: input.package_id.clone(),
            travel_start: input.travel_start,
            added_at: Utc::now(),
        };

        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "INSERT INTO cart_items (id, cart_id, package_id, travel_start, added_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.cart_id)
        .bind(&item.package_id)
        .bind(item.travel_start)
        .bind(item.added_at)
        .execute(&mut *tx)
        .await?;

        for selection in &input.services {
            let link = CartItemService {
                cart_item_id: item.id.clone(),
                service_id: selection.service_id.clone(),
                quantity: selection.quantity,
            };
            sqlx::query(
                "INSERT INTO cart_item_services (cart_item_id, service_id, quantity)
                 VALUES (?, ?, ?)",
            )
            .bind(&link.cart_item_id)
            .bind(&link.service_id)
            .bind(link.quantity)
            .execute(&mut *tx)
            .await?;
        }

        sqlx::query("UPDATE carts SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(&cart.id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(user_id, package_id = %input.package_id, "staged package in cart");
        self.detail(user_id).await
    }

    /// Removes one staged item. The item must belong to the caller's cart.
    pub async fn remove_item(&self, user_id: &str, item_id: &str) -> BookingResult<CartDetail> {
        let cart = self.get_or_create(user_id).await?;

        let result = sqlx::query("DELETE FROM cart_items WHERE id = ? AND cart_id = ?")
            .bind(item_id)
            .bind(&cart.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(CoreError::CartItemNotFound(item_id.to_string()).into());
        }

        sqlx::query("UPDATE carts SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(&cart.id)
            .execute(&self.pool)
            .await?;

        self.detail(user_id).await
    }

    /// Drops every staged item but keeps the cart row around.
    pub async fn clear(&self, user_id: &str) -> BookingResult<()> {
        let cart = self.get_or_create(user_id).await?;

        sqlx::query("DELETE FROM cart_items WHERE cart_id = ?")
            .bind(&cart.id)
            .execute(&self.pool)
            .await?;

        sqlx::query("UPDATE carts SET updated_at = ? WHERE id = ?")
            .bind(Utc::now())
            .bind(&cart.id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Number of staged items, zero when the user has no cart yet.
    pub async fn count_items(&self, user_id: &str) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)
             FROM cart_items ci
             JOIN carts c ON c.id = ci.cart_id
             WHERE c.user_id = ?",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    /// Full cart view with per-item pricing computed from the live catalog.
    pub async fn detail(&self, user_id: &str) -> BookingResult<CartDetail> {
        let cart = self.get_or_create(user_id).await?;
        let rows = self.item_rows(&cart.id).await?;

        let mut items = Vec::with_capacity(rows.len());
        let mut subtotals = Vec::with_capacity(rows.len());
        for row in rows {
            let service_rows = self.service_rows(&row.id).await?;

            let lines: Vec<ServiceLine> = service_rows
                .iter()
                .map(|s| ServiceLine::new(Money::from_cents(s.cost_cents), s.quantity))
                .collect();
            let subtotal = pricing::item_subtotal(Money::from_cents(row.package_price_cents), &lines);

            let services = service_rows
                .into_iter()
                .map(|s| PricedService {
                    service_id: s.service_id,
                    name: s.name,
                    quantity: s.quantity,
                    unit_cost_cents: s.cost_cents,
                    line_total_cents: s.cost_cents * s.quantity,
                })
                .collect();

            subtotals.push(subtotal);
            items.push(CartItemDetail {
                item: CartItem {
                    id: row.id,
                    cart_id: row.cart_id,
                    package_id: row.package_id,
                    travel_start: row.travel_start,
                    added_at: row.added_at,
                },
                package_name: row.package_name,
                package_price_cents: row.package_price_cents,
                services,
                subtotal_cents: subtotal.cents(),
            });
        }

        let total = pricing::booking_total(&subtotals);
        Ok(CartDetail {
            cart,
            items,
            total_cents: total.cents(),
        })
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    async fn ensure_user(&self, user_id: &str) -> BookingResult<()> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;
        if count == 0 {
            return Err(CoreError::UserNotFound(user_id.to_string()).into());
        }
        Ok(())
    }

    async fn find_by_user(&self, user_id: &str) -> Result<Option<Cart>, BookingError> {
        let cart = sqlx::query_as::<_, Cart>("SELECT * FROM carts WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(cart)
    }

    pub(crate) async fn item_rows(&self, cart_id: &str) -> BookingResult<Vec<CartItemRow>> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Ok(Self::item_rows_on(&mut conn, cart_id).await?)
    }

    /// Transaction-scoped variant: the checkout engine reads its snapshot
    /// through its own transaction so cart mutations cannot slip between
    /// the snapshot and the item delete.
    pub(crate) async fn item_rows_on(
        conn: &mut SqliteConnection,
        cart_id: &str,
    ) -> DbResult<Vec<CartItemRow>> {
        let rows = sqlx::query_as::<_, CartItemRow>(
            "SELECT ci.id, ci.cart_id, ci.package_id, ci.travel_start, ci.added_at,
                    p.name AS package_name, p.price_cents AS package_price_cents,
                    p.stock AS package_stock
             FROM cart_items ci
             JOIN packages p ON p.id = ci.package_id
             WHERE ci.cart_id = ?
             ORDER BY ci.added_at, ci.id",
        )
        .bind(cart_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    pub(crate) async fn service_rows(&self, item_id: &str) -> BookingResult<Vec<ItemServiceRow>> {
        let mut conn = self.pool.acquire().await.map_err(DbError::from)?;
        Ok(Self::service_rows_on(&mut conn, item_id).await?)
    }

    pub(crate) async fn service_rows_on(
        conn: &mut SqliteConnection,
        item_id: &str,
    ) -> DbResult<Vec<ItemServiceRow>> {
        let rows = sqlx::query_as::<_, ItemServiceRow>(
            "SELECT cis.service_id, s.name, cis.quantity, s.cost_cents
             FROM cart_item_services cis
             JOIN services s ON s.id = cis.service_id
             WHERE cis.cart_item_id = ?
             ORDER BY s.name",
        )
        .bind(item_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows)
    }

    fn db_catalog(&self) -> super::catalog::CatalogRepository {
        super::catalog::CatalogRepository::new(self.pool.clone())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use viajes_core::{CoreError, ServiceSelection};

    use super::NewCartItem;
    use crate::error::BookingError;
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

    #[tokio::test]
    async fn get_or_create_is_idempotent() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;

        let first = db.carts().get_or_create("u-1").await.unwrap();
        let second = db.carts().get_or_create("u-1").await.unwrap();
        assert_eq!(first.id, second.id);
    }

    #[tokio::test]
    async fn unknown_user_cannot_have_a_cart() {
        let db = setup_db().await;
        let err = db.carts().get_or_create("ghost").await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::UserNotFound(_))
        ));
    }

    #[tokio::test]
    async fn add_item_prices_from_live_catalog() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;
        seed_service(&db, "s-1", "Seguro", 5_000).await;

        let detail = db
            .carts()
            .add_item(
                "u-1",
                item(
                    "p-1",
                    vec![ServiceSelection {
                        service_id: "s-1".to_string(),
                        quantity: 2,
                    }],
                ),
            )
            .await
            .unwrap();

        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].subtotal_cents, 60_000);
        assert_eq!(detail.total_cents, 60_000);

        // Cart rows store no prices, so a catalog change shows up on re-read.
        db.catalog().set_package_price("p-1", 70_000).await.unwrap();
        let detail = db.carts().detail("u-1").await.unwrap();
        assert_eq!(detail.total_cents, 80_000);
    }

    #[tokio::test]
    async fn repeated_service_in_one_request_is_invalid_input() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;
        seed_service(&db, "s-1", "Seguro", 5_000).await;

        // Repetition is expressed through quantity, not duplicate rows; a
        // request listing the same service twice is a caller error, not an
        // internal one.
        let pick = |qty| ServiceSelection {
            service_id: "s-1".to_string(),
            quantity: qty,
        };
        let err = db
            .carts()
            .add_item("u-1", item("p-1", vec![pick(1), pick(2)]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::Validation(_))
        ));

        // Nothing was staged.
        assert_eq!(db.carts().count_items("u-1").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn retired_package_cannot_be_staged() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;
        db.catalog()
            .set_package_status("p-1", viajes_core::CatalogStatus::Inactive)
            .await
            .unwrap();

        let err = db
            .carts()
            .add_item("u-1", item("p-1", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::PackageNotFound(_))
        ));
    }

    #[tokio::test]
    async fn same_package_cannot_be_staged_twice() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;

        db.carts().add_item("u-1", item("p-1", vec![])).await.unwrap();
        let err = db
            .carts()
            .add_item("u-1", item("p-1", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::DuplicateItem { .. })
        ));
    }

    #[tokio::test]
    async fn out_of_stock_package_is_rejected_at_staging() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 0).await;

        let err = db
            .carts()
            .add_item("u-1", item("p-1", vec![]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::InsufficientStock { .. })
        ));
    }

    #[tokio::test]
    async fn past_travel_date_is_rejected() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;

        let input = NewCartItem {
            package_id: "p-1".to_string(),
            travel_start: Utc::now().date_naive() - Duration::days(1),
            services: vec![],
        };
        let err = db.carts().add_item("u-1", input).await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::TravelDateInPast { .. })
        ));
    }

    #[tokio::test]
    async fn remove_rejects_items_from_other_carts() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_user(&db, "u-2", "Luis").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;

        let detail = db.carts().add_item("u-1", item("p-1", vec![])).await.unwrap();
        let item_id = detail.items[0].item.id.clone();

        let err = db.carts().remove_item("u-2", &item_id).await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::CartItemNotFound(_))
        ));

        // Still removable by its owner.
        let detail = db.carts().remove_item("u-1", &item_id).await.unwrap();
        assert!(detail.is_empty());
    }

    #[tokio::test]
    async fn clear_empties_the_cart() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;
        seed_package(&db, "p-2", "Amazonas", 80_000, 5).await;

        db.carts().add_item("u-1", item("p-1", vec![])).await.unwrap();
        let detail = db.carts().add_item("u-1", item("p-2", vec![])).await.unwrap();
        assert_eq!(detail.item_count(), 2);
        assert_eq!(db.carts().count_items("u-1").await.unwrap(), 2);

        db.carts().clear("u-1").await.unwrap();
        assert_eq!(db.carts().count_items("u-1").await.unwrap(), 0);
    }
}
