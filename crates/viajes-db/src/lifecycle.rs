// ============================================================================
// Reservation lifecycle
// ============================================================================
//
// Reservations move PENDING -> PAID or PENDING -> CANCELLED, once. Both
// transitions use a status-guarded UPDATE so a reservation that has already
// reached a final state can never be moved again, even under concurrent
// requests. Cancellation additionally gives back one unit of stock per
// booked package inside the same transaction.

use chrono::Utc;
use sqlx::SqlitePool;
use viajes_core::{CoreError, ReservationDetail, ReservationStatus};

use crate::error::{BookingResult, DbError};
use crate::repository::catalog::CatalogRepository;
use crate::repository::reservation::ReservationRepository;

#[derive(Clone)]
pub struct ReservationLifecycle {
    pool: SqlitePool,
}

impl ReservationLifecycle {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// PENDING -> PAID. Stock is not touched; it was taken at checkout.
    pub async fn confirm_payment(&self, reservation_id: &str) -> BookingResult<ReservationDetail> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let current = self.status_for_update(&mut tx, reservation_id).await?;
        if current.is_final() {
            return Err(CoreError::AlreadyFinalized {
                reservation_id: reservation_id.to_string(),
                status: current,
            }
            .into());
        }

        let updated = sqlx::query(
            "UPDATE reservations
             SET status = 'PAID', updated_at = ?
             WHERE id = ? AND status = 'PENDING'",
        )
        .bind(Utc::now())
        .bind(reservation_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;
        if updated.rows_affected() == 0 {
            return Err(CoreError::AlreadyFinalized {
                reservation_id: reservation_id.to_string(),
                status: current,
            }
            .into());
        }

        tx.commit().await.map_err(DbError::from)?;
        tracing::info!(reservation_id, "payment confirmed");
        self.load_detail(reservation_id).await
    }

    /// PENDING -> CANCELLED, restoring one unit of stock per booked package.
    pub async fn cancel(&self, reservation_id: &str) -> BookingResult<ReservationDetail> {
        let mut tx = self.pool.begin().await.map_err(DbError::from)?;

        let current = self.status_for_update(&mut tx, reservation_id).await?;
        if current.is_final() {
            return Err(CoreError::AlreadyFinalized {
                reservation_id: reservation_id.to_string(),
                status: current,
            }
            .into());
        }

        let updated = sqlx::query(
            "UPDATE reservations
             SET status = 'CANCELLED', updated_at = ?
             WHERE id = ? AND status = 'PENDING'",
        )
        .bind(Utc::now())
        .bind(reservation_id)
        .execute(&mut *tx)
        .await
        .map_err(DbError::from)?;
        if updated.rows_affected() == 0 {
            return Err(CoreError::AlreadyFinalized {
                reservation_id: reservation_id.to_string(),
                status: current,
            }
            .into());
        }

        let package_ids: Vec<String> = sqlx::query_scalar(
            "SELECT DISTINCT package_id FROM reservation_items WHERE reservation_id = ?",
        )
        .bind(reservation_id)
        .fetch_all(&mut *tx)
        .await
        .map_err(DbError::from)?;

        for package_id in &package_ids {
            CatalogRepository::restore_stock(&mut tx, package_id, 1).await?;
        }

        tx.commit().await.map_err(DbError::from)?;
        tracing::info!(reservation_id, packages = package_ids.len(), "reservation cancelled");
        self.load_detail(reservation_id).await
    }

    async fn status_for_update(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        reservation_id: &str,
    ) -> BookingResult<ReservationStatus> {
        let status: Option<ReservationStatus> =
            sqlx::query_scalar("SELECT status FROM reservations WHERE id = ?")
                .bind(reservation_id)
                .fetch_optional(&mut **tx)
                .await
                .map_err(DbError::from)?;
        status.ok_or_else(|| CoreError::ReservationNotFound(reservation_id.to_string()).into())
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
    use viajes_core::{CoreError, ReservationStatus};

    use crate::error::BookingError;
    use crate::testutil::{checkout_single_for, seed_package, seed_user, setup_db};

    #[tokio::test]
    async fn confirm_marks_paid_without_touching_stock() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 3).await;
        let reservation_id = checkout_single_for(&db, "u-1", "p-1").await;
        assert_eq!(db.catalog().get_package("p-1").await.unwrap().unwrap().stock, 2);

        let detail = db.lifecycle().confirm_payment(&reservation_id).await.unwrap();
        assert_eq!(detail.reservation.status, ReservationStatus::Paid);
        assert_eq!(db.catalog().get_package("p-1").await.unwrap().unwrap().stock, 2);
    }

    #[tokio::test]
    async fn cancel_restores_stock_exactly_once() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 3).await;
        let reservation_id = checkout_single_for(&db, "u-1", "p-1").await;
        assert_eq!(db.catalog().get_package("p-1").await.unwrap().unwrap().stock, 2);

        let detail = db.lifecycle().cancel(&reservation_id).await.unwrap();
        assert_eq!(detail.reservation.status, ReservationStatus::Cancelled);
        assert_eq!(db.catalog().get_package("p-1").await.unwrap().unwrap().stock, 3);

        // A second cancel must fail and must not restore again.
        let err = db.lifecycle().cancel(&reservation_id).await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::AlreadyFinalized { .. })
        ));
        assert_eq!(db.catalog().get_package("p-1").await.unwrap().unwrap().stock, 3);
    }

    #[tokio::test]
    async fn final_states_exclude_each_other() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 3).await;

        let paid = checkout_single_for(&db, "u-1", "p-1").await;
        db.lifecycle().confirm_payment(&paid).await.unwrap();
        let err = db.lifecycle().cancel(&paid).await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::AlreadyFinalized {
                status: ReservationStatus::Paid,
                ..
            })
        ));

        let cancelled = checkout_single_for(&db, "u-1", "p-1").await;
        db.lifecycle().cancel(&cancelled).await.unwrap();
        let err = db.lifecycle().confirm_payment(&cancelled).await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::AlreadyFinalized {
                status: ReservationStatus::Cancelled,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn unknown_reservation_is_reported_as_such() {
        let db = setup_db().await;
        let err = db.lifecycle().confirm_payment("r-missing").await.unwrap_err();
        assert!(matches!(
            err,
            BookingError::Domain(CoreError::ReservationNotFound(_))
        ));
    }

    #[tokio::test]
    async fn paying_never_restores_stock() {
        let db = setup_db().await;
        seed_user(&db, "u-1", "Ana").await;
        seed_package(&db, "p-1", "Cusco Magico", 50_000, 1).await;
        let reservation_id = checkout_single_for(&db, "u-1", "p-1").await;

        db.lifecycle().confirm_payment(&reservation_id).await.unwrap();
        assert_eq!(db.catalog().get_package("p-1").await.unwrap().unwrap().stock, 0);
    }
}
