//! Catalog access: travel packages and optional add-on services.
//!
//! Everything here is plain CRUD except the two stock adjusters at the
//! bottom. Those take a `&mut SqliteConnection` because stock only ever
//! moves inside a checkout or cancellation transaction, never on its own.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use viajes_core::{validation, CatalogStatus, Package, Service};

use crate::error::{BookingResult, DbError, DbResult};

#[derive(Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
}

impl CatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Packages
    // ========================================================================

    pub async fn get_package(&self, id: &str) -> DbResult<Option<Package>> {
        let package = sqlx::query_as::<_, Package>("SELECT * FROM packages WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(package)
    }

    pub async fn list_active_packages(&self) -> DbResult<Vec<Package>> {
        let packages = sqlx::query_as::<_, Package>(
            "SELECT * FROM packages WHERE status = 'ACTIVE' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(packages)
    }

    pub async fn insert_package(&self, package: &Package) -> BookingResult<()> {
        Self::validate_package(package)?;
        sqlx::query(
            "INSERT INTO packages
                (id, name, description, price_cents, travel_start, travel_end,
                 stock, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&package.id)
        .bind(&package.name)
        .bind(&package.description)
        .bind(package.price_cents)
        .bind(package.travel_start)
        .bind(package.travel_end)
        .bind(package.stock)
        .bind(package.status)
        .bind(package.created_at)
        .bind(package.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn update_package(&self, package: &Package) -> BookingResult<()> {
        Self::validate_package(package)?;
        let result = sqlx::query(
            "UPDATE packages
             SET name = ?, description = ?, price_cents = ?, travel_start = ?,
                 travel_end = ?, stock = ?, status = ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(&package.name)
        .bind(&package.description)
        .bind(package.price_cents)
        .bind(package.travel_start)
        .bind(package.travel_end)
        .bind(package.stock)
        .bind(package.status)
        .bind(Utc::now())
        .bind(&package.id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("package", &package.id).into());
        }
        Ok(())
    }

    pub async fn set_package_price(&self, id: &str, price_cents: i64) -> BookingResult<()> {
        validation::validate_price_cents(price_cents)?;
        let result = sqlx::query(
            "UPDATE packages SET price_cents = ?, updated_at = ? WHERE id = ?",
        )
        .bind(price_cents)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("package", id).into());
        }
        Ok(())
    }

    pub async fn set_package_status(&self, id: &str, status: CatalogStatus) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE packages SET status = ?, updated_at = ? WHERE id = ?",
        )
        .bind(status)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("package", id));
        }
        Ok(())
    }

    /// Field rules shared by insert and update. The schema CHECKs remain
    /// the backstop; this surfaces a typed error before any row is written.
    fn validate_package(package: &Package) -> Result<(), viajes_core::ValidationError> {
        validation::validate_name(&package.name)?;
        validation::validate_price_cents(package.price_cents)?;
        validation::validate_travel_window(package.travel_start, package.travel_end)?;
        validation::validate_stock(package.stock)?;
        Ok(())
    }

    // ========================================================================
    // Services
    // ========================================================================

    pub async fn get_service(&self, id: &str) -> DbResult<Option<Service>> {
        let service = sqlx::query_as::<_, Service>("SELECT * FROM services WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(service)
    }

    pub async fn list_active_services(&self) -> DbResult<Vec<Service>> {
        let services = sqlx::query_as::<_, Service>(
            "SELECT * FROM services WHERE status = 'ACTIVE' ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(services)
    }

    pub async fn insert_service(&self, service: &Service) -> BookingResult<()> {
        validation::validate_name(&service.name)?;
        sqlx::query(
            "INSERT INTO services (id, name, cost_cents, status, created_at)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&service.id)
        .bind(&service.name)
        .bind(service.cost_cents)
        .bind(service.status)
        .bind(service.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn set_service_cost(&self, id: &str, cost_cents: i64) -> DbResult<()> {
        let result = sqlx::query("UPDATE services SET cost_cents = ? WHERE id = ?")
            .bind(cost_cents)
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("service", id));
        }
        Ok(())
    }

    // ========================================================================
    // Stock adjusters (transaction-scoped)
    // ========================================================================

    /// Takes one unit of stock, refusing to go below zero. Returns `false`
    /// when the package exists but has nothing left, so the caller can roll
    /// back and surface an out-of-stock error with the package name.
    pub async fn decrement_stock(conn: &mut SqliteConnection, package_id: &str) -> DbResult<bool> {
        let result = sqlx::query(
            "UPDATE packages
             SET stock = stock - 1, updated_at = ?
             WHERE id = ? AND stock > 0",
        )
        .bind(Utc::now())
        .bind(package_id)
        .execute(&mut *conn)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Gives stock back after a cancellation.
    pub async fn restore_stock(
        conn: &mut SqliteConnection,
        package_id: &str,
        amount: i64,
    ) -> DbResult<()> {
        let result = sqlx::query(
            "UPDATE packages
             SET stock = stock + ?, updated_at = ?
             WHERE id = ?",
        )
        .bind(amount)
        .bind(Utc::now())
        .bind(package_id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("package", package_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use viajes_core::{CatalogStatus, CoreError, Service};

    use super::CatalogRepository;
    use crate::error::BookingError;
    use crate::testutil::{seed_package, seed_service, setup_db};

    #[tokio::test]
    async fn package_roundtrip_and_listing() {
        let db = setup_db().await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;
        seed_package(&db, "p-2", "Amazonas", 80_000, 3).await;

        let found = db.catalog().get_package("p-1").await.unwrap().unwrap();
        assert_eq!(found.price_cents, 50_000);
        assert_eq!(found.stock, 5);

        db.catalog()
            .set_package_status("p-2", CatalogStatus::Inactive)
            .await
            .unwrap();

        let active = db.catalog().list_active_packages().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "p-1");
    }

    #[tokio::test]
    async fn update_package_rewrites_fields() {
        let db = setup_db().await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;

        let mut package = db.catalog().get_package("p-1").await.unwrap().unwrap();
        package.name = "Cusco Magico Plus".to_string();
        package.stock = 8;
        db.catalog().update_package(&package).await.unwrap();

        let reread = db.catalog().get_package("p-1").await.unwrap().unwrap();
        assert_eq!(reread.name, "Cusco Magico Plus");
        assert_eq!(reread.stock, 8);
    }

    #[tokio::test]
    async fn package_writes_enforce_field_rules() {
        let db = setup_db().await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 5).await;

        // Travel window must be open, price at least one cent.
        let mut package = db.catalog().get_package("p-1").await.unwrap().unwrap();
        package.travel_end = package.travel_start;
        let err = db.catalog().update_package(&package).await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::Validation(_))
        ));

        let err = db.catalog().set_package_price("p-1", 0).await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::Validation(_))
        ));

        let reread = db.catalog().get_package("p-1").await.unwrap().unwrap();
        assert_eq!(reread.price_cents, 50_000);
    }

    #[tokio::test]
    async fn active_service_listing_excludes_retired() {
        let db = setup_db().await;
        seed_service(&db, "s-1", "Seguro de viaje", 5_000).await;
        let retired = Service {
            id: "s-2".to_string(),
            name: "Traslado privado".to_string(),
            cost_cents: 3_000,
            status: CatalogStatus::Inactive,
            created_at: Utc::now(),
        };
        db.catalog().insert_service(&retired).await.unwrap();

        let active = db.catalog().list_active_services().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, "s-1");
    }

    #[tokio::test]
    async fn service_roundtrip() {
        let db = setup_db().await;
        seed_service(&db, "s-1", "Seguro de viaje", 5_000).await;

        let found = db.catalog().get_service("s-1").await.unwrap().unwrap();
        assert_eq!(found.cost_cents, 5_000);

        db.catalog().set_service_cost("s-1", 6_000).await.unwrap();
        let found = db.catalog().get_service("s-1").await.unwrap().unwrap();
        assert_eq!(found.cost_cents, 6_000);
    }

    #[tokio::test]
    async fn decrement_refuses_to_go_negative() {
        let db = setup_db().await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 1).await;

        let mut conn = db.pool().acquire().await.unwrap();
        assert!(CatalogRepository::decrement_stock(&mut conn, "p-1")
            .await
            .unwrap());
        assert!(!CatalogRepository::decrement_stock(&mut conn, "p-1")
            .await
            .unwrap());
        drop(conn);

        let found = db.catalog().get_package("p-1").await.unwrap().unwrap();
        assert_eq!(found.stock, 0);
    }

    #[tokio::test]
    async fn restore_adds_stock_back() {
        let db = setup_db().await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 0).await;

        let mut conn = db.pool().acquire().await.unwrap();
        CatalogRepository::restore_stock(&mut conn, "p-1", 1)
            .await
            .unwrap();
        drop(conn);

        let found = db.catalog().get_package("p-1").await.unwrap().unwrap();
        assert_eq!(found.stock, 1);
    }
}
