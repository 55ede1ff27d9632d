//! Reservation reads plus the transaction-scoped insert trio used by the
//! checkout engine. Reservation rows are immutable snapshots except for
//! `status` and `updated_at`, which only the lifecycle manager touches.

use sqlx::{SqliteConnection, SqlitePool};
use viajes_core::{
    PricedService, Reservation, ReservationDetail, ReservationItem, ReservationItemDetail,
    ReservationItemService,
};

use crate::error::DbResult;

/// Joined reservation item row for detail views.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct ReservationItemRow {
    pub id: String,
    pub reservation_id: String,
    pub package_id: String,
    pub travel_start: chrono::NaiveDate,
    pub subtotal_cents: i64,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub package_name: String,
}

/// Frozen service line joined with the live service name.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct FrozenServiceRow {
    pub service_id: String,
    pub name: String,
    pub quantity: i64,
    pub unit_cost_cents: i64,
}

#[derive(Clone)]
pub struct ReservationRepository {
    pool: SqlitePool,
}

impl ReservationRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    // ========================================================================
    // Reads
    // ========================================================================

    pub async fn get(&self, id: &str) -> DbResult<Option<Reservation>> {
        let reservation =
            sqlx::query_as::<_, Reservation>("SELECT * FROM reservations WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(reservation)
    }

    pub async fn list(&self) -> DbResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(reservations)
    }

    pub async fn list_by_user(&self, user_id: &str) -> DbResult<Vec<Reservation>> {
        let reservations = sqlx::query_as::<_, Reservation>(
            "SELECT * FROM reservations WHERE user_id = ? ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(reservations)
    }

    /// Reservation with its items and frozen service lines, or `None` when
    /// the id is unknown.
    pub async fn detail(&self, id: &str) -> DbResult<Option<ReservationDetail>> {
        let Some(reservation) = self.get(id).await? else {
            return Ok(None);
        };

        let rows = sqlx::query_as::<_, ReservationItemRow>(
            "SELECT ri.id, ri.reservation_id, ri.package_id, ri.travel_start,
                    ri.subtotal_cents, ri.created_at, p.name AS package_name
             FROM reservation_items ri
             JOIN packages p ON p.id = ri.package_id
             WHERE ri.reservation_id = ?
             ORDER BY ri.created_at, ri.id",
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        let mut items = Vec::with_capacity(rows.len());
        for row in rows {
            let service_rows = sqlx::query_as::<_, FrozenServiceRow>(
                "SELECT ris.service_id, s.name, ris.quantity, ris.unit_cost_cents
                 FROM reservation_item_services ris
                 JOIN services s ON s.id = ris.service_id
                 WHERE ris.reservation_item_id = ?
                 ORDER BY s.name",
            )
            .bind(&row.id)
            .fetch_all(&self.pool)
            .await?;

            let services = service_rows
                .into_iter()
                .map(|s| PricedService {
                    service_id: s.service_id,
                    name: s.name,
                    quantity: s.quantity,
                    unit_cost_cents: s.unit_cost_cents,
                    line_total_cents: s.unit_cost_cents * s.quantity,
                })
                .collect();

            items.push(ReservationItemDetail {
                item: ReservationItem {
                    id: row.id,
                    reservation_id: row.reservation_id,
                    package_id: row.package_id,
                    travel_start: row.travel_start,
                    subtotal_cents: row.subtotal_cents,
                    created_at: row.created_at,
                },
                package_name: row.package_name,
                services,
            });
        }

        Ok(Some(ReservationDetail { reservation, items }))
    }

    // ========================================================================
    // Transaction-scoped inserts
    // ========================================================================

    pub(crate) async fn insert_reservation(
        conn: &mut SqliteConnection,
        reservation: &Reservation,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO reservations (id, user_id, total_cents, status, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&reservation.id)
        .bind(&reservation.user_id)
        .bind(reservation.total_cents)
        .bind(reservation.status)
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub(crate) async fn insert_item(
        conn: &mut SqliteConnection,
        item: &ReservationItem,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO reservation_items
                (id, reservation_id, package_id, travel_start, subtotal_cents, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(&item.id)
        .bind(&item.reservation_id)
        .bind(&item.package_id)
        .bind(item.travel_start)
        .bind(item.subtotal_cents)
        .bind(item.created_at)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }

    pub(crate) async fn insert_item_service(
        conn: &mut SqliteConnection,
        service: &ReservationItemService,
    ) -> DbResult<()> {
        sqlx::query(
            "INSERT INTO reservation_item_services
                (reservation_item_id, service_id, quantity, unit_cost_cents)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&service.reservation_item_id)
        .bind(&service.service_id)
        .bind(service.quantity)
        .bind(service.unit_cost_cents)
        .execute(&mut *conn)
        .await?;
        Ok(())
    }
}
