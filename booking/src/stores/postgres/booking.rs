//! PostgreSQL slot and booking store.
//!
//! # Example
//!
//! ```no_run
//! use booking_core::stores::postgres::{self, PostgresBookingStore};
//! use sqlx::PgPool;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let pool = PgPool::connect("postgresql://localhost/booking").await?;
//! postgres::migrate(&pool).await?;
//! let store = PostgresBookingStore::new(pool);
//! # Ok(())
//! # }
//! ```

use super::{db_error, non_negative, to_bigint};
use crate::constants::{DEFAULT_SLOT_CAPACITY, status};
use crate::error::{BookingError, Entity, Result};
use crate::providers::{BookingStore, BookingTransaction};
use crate::types::{
    Booking, BookingDetails, BookingId, BookingStatus, ClaimOutcome, NewSlot, ProviderId,
    RequesterId, ScheduleSlot, SlotId, SlotVersion,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

/// Partial unique index guarding one active booking per requester and slot.
const ACTIVE_BOOKING_INDEX: &str = "uq_bookings_active_requester_slot";
const ACTIVE_TIME_INDEX: &str = "uq_bookings_active_requester_time";

const SLOT_COLUMNS: &str =
    "id, provider_id, slot_date, start_time, end_time, capacity, occupied, active, version";

const BOOKING_COLUMNS: &str = "id, requester_id, provider_id, slot_id, appointment_time, \
     status, cancel_reason, created_at, updated_at";

/// PostgreSQL slot and booking store.
#[derive(Clone)]
pub struct PostgresBookingStore {
    /// PostgreSQL connection pool.
    pool: PgPool,
}

impl PostgresBookingStore {
    /// Create a new store on a connection pool.
    ///
    /// # Arguments
    ///
    /// * `pool` - PostgreSQL connection pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    row.try_get(name)
        .map_err(|e| BookingError::Database(format!("Failed to decode column {name}: {e}")))
}

fn slot_from_row(row: &PgRow) -> Result<ScheduleSlot> {
    Ok(ScheduleSlot {
        id: SlotId(column(row, "id")?),
        provider_id: ProviderId(column(row, "provider_id")?),
        date: column(row, "slot_date")?,
        start_time: column(row, "start_time")?,
        end_time: column(row, "end_time")?,
        capacity: non_negative(i64::from(column::<i32>(row, "capacity")?), "capacity")?,
        occupied: non_negative(i64::from(column::<i32>(row, "occupied")?), "occupied")?,
        active: column(row, "active")?,
        version: SlotVersion(non_negative(column::<i64>(row, "version")?, "version")?),
    })
}

fn booking_from_row(row: &PgRow) -> Result<Booking> {
    let details = BookingDetails {
        id: BookingId(non_negative(column::<i64>(row, "id")?, "id")?),
        requester_id: RequesterId(column(row, "requester_id")?),
        provider_id: ProviderId(column(row, "provider_id")?),
        slot_id: SlotId(column(row, "slot_id")?),
        appointment_time: column::<DateTime<Utc>>(row, "appointment_time")?,
        created_at: column::<DateTime<Utc>>(row, "created_at")?,
    };
    let label: String = column(row, "status")?;
    let reason: Option<String> = column(row, "cancel_reason")?;

    Ok(Booking::restore(
        details,
        BookingStatus::from_parts(&label, reason)?,
        column::<DateTime<Utc>>(row, "updated_at")?,
    ))
}

impl BookingStore for PostgresBookingStore {
    type Tx = PostgresTransaction;

    async fn begin(&self) -> Result<Self::Tx> {
        let tx = self
            .pool
            .begin()
            .await
            .map_err(db_error("Failed to begin transaction"))?;
        Ok(PostgresTransaction { tx })
    }

    async fn insert_slot(&self, slot: NewSlot) -> Result<ScheduleSlot> {
        slot.validate()?;
        let capacity = i32::try_from(slot.capacity.unwrap_or(DEFAULT_SLOT_CAPACITY))
            .map_err(|_| BookingError::Validation("slot capacity is out of range".to_string()))?;

        let row = sqlx::query(&format!(
            "INSERT INTO schedule_slots (provider_id, slot_date, start_time, end_time, capacity) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {SLOT_COLUMNS}"
        ))
        .bind(slot.provider_id.as_str())
        .bind(slot.date)
        .bind(slot.start_time)
        .bind(slot.end_time)
        .bind(capacity)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to insert slot"))?;

        slot_from_row(&row)
    }

    async fn get_slot(&self, slot_id: SlotId) -> Result<Option<ScheduleSlot>> {
        sqlx::query(&format!("SELECT {SLOT_COLUMNS} FROM schedule_slots WHERE id = $1"))
            .bind(slot_id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get slot"))?
            .as_ref()
            .map(slot_from_row)
            .transpose()
    }

    async fn get_booking(&self, booking_id: BookingId) -> Result<Option<Booking>> {
        sqlx::query(&format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1"))
            .bind(to_bigint(booking_id.0, "booking id")?)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to get booking"))?
            .as_ref()
            .map(booking_from_row)
            .transpose()
    }

    async fn list_by_requester(&self, requester_id: &RequesterId) -> Result<Vec<Booking>> {
        sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE requester_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(requester_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list requester bookings"))?
        .iter()
        .map(booking_from_row)
        .collect()
    }

    async fn list_by_provider(&self, provider_id: &ProviderId) -> Result<Vec<Booking>> {
        sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE provider_id = $1 \
             ORDER BY appointment_time, id"
        ))
        .bind(provider_id.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list provider bookings"))?
        .iter()
        .map(booking_from_row)
        .collect()
    }
}

/// Transaction over a [`PostgresBookingStore`].
///
/// Dropping it without `commit` rolls back (sqlx semantics).
pub struct PostgresTransaction {
    tx: Transaction<'static, Postgres>,
}

impl BookingTransaction for PostgresTransaction {
    async fn load_slot(&mut self, slot_id: SlotId) -> Result<Option<ScheduleSlot>> {
        sqlx::query(&format!("SELECT {SLOT_COLUMNS} FROM schedule_slots WHERE id = $1"))
            .bind(slot_id.0)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error("Failed to load slot"))?
            .as_ref()
            .map(slot_from_row)
            .transpose()
    }

    async fn claim_slot(
        &mut self,
        slot_id: SlotId,
        expected_version: SlotVersion,
    ) -> Result<ClaimOutcome> {
        // Single conditional UPDATE: the row lock taken by the update makes the
        // capacity and version checks and the increments one atomic step.
        let claimed = sqlx::query(
            "UPDATE schedule_slots \
             SET occupied = occupied + 1, version = version + 1 \
             WHERE id = $1 AND active AND occupied < capacity AND version = $2 \
             RETURNING occupied, version",
        )
        .bind(slot_id.0)
        .bind(to_bigint(expected_version.0, "slot version")?)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to claim slot"))?;

        if let Some(row) = claimed {
            let occupied: i32 = column(&row, "occupied")?;
            let version: i64 = column(&row, "version")?;
            return Ok(ClaimOutcome::Claimed {
                version: SlotVersion(non_negative(version, "version")?),
                occupied: non_negative(i64::from(occupied), "occupied")?,
            });
        }

        // Nothing changed; find out why.
        let current =
            sqlx::query("SELECT occupied, capacity, active FROM schedule_slots WHERE id = $1")
                .bind(slot_id.0)
                .fetch_optional(&mut *self.tx)
                .await
                .map_err(db_error("Failed to read slot after refused claim"))?
                .ok_or_else(|| BookingError::not_found(Entity::Slot, slot_id))?;

        let occupied: i32 = column(&current, "occupied")?;
        let capacity: i32 = column(&current, "capacity")?;
        let active: bool = column(&current, "active")?;

        if !active {
            return Err(BookingError::inactive(Entity::Slot, slot_id));
        }
        if occupied >= capacity {
            Ok(ClaimOutcome::Exhausted)
        } else {
            Ok(ClaimOutcome::VersionConflict)
        }
    }

    async fn release_slot(&mut self, slot_id: SlotId) -> Result<SlotVersion> {
        let version: i64 = sqlx::query_scalar(
            "UPDATE schedule_slots \
             SET occupied = GREATEST(occupied - 1, 0), version = version + 1 \
             WHERE id = $1 \
             RETURNING version",
        )
        .bind(slot_id.0)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to release slot"))?
        .ok_or_else(|| BookingError::not_found(Entity::Slot, slot_id))?;

        Ok(SlotVersion(non_negative(version, "version")?))
    }

    async fn withdraw_slot(&mut self, slot_id: SlotId) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE schedule_slots SET active = FALSE WHERE id = $1 AND occupied = 0",
        )
        .bind(slot_id.0)
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to withdraw slot"))?;

        if updated.rows_affected() == 1 {
            return Ok(());
        }

        let occupied: i32 = sqlx::query_scalar("SELECT occupied FROM schedule_slots WHERE id = $1")
            .bind(slot_id.0)
            .fetch_optional(&mut *self.tx)
            .await
            .map_err(db_error("Failed to read slot"))?
            .ok_or_else(|| BookingError::not_found(Entity::Slot, slot_id))?;

        Err(BookingError::SlotInUse {
            occupied: non_negative(i64::from(occupied), "occupied")?,
        })
    }

    async fn has_active_booking_on_slot(
        &mut self,
        requester_id: &RequesterId,
        slot_id: SlotId,
    ) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                 SELECT 1 FROM bookings \
                 WHERE requester_id = $1 AND slot_id = $2 AND status = $3 \
             )",
        )
        .bind(requester_id.as_str())
        .bind(slot_id.0)
        .bind(status::BOOKED)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to check slot conflict"))
    }

    async fn has_active_booking_at_time(
        &mut self,
        requester_id: &RequesterId,
        date: NaiveDate,
        start_time: NaiveTime,
    ) -> Result<bool> {
        sqlx::query_scalar(
            "SELECT EXISTS ( \
                 SELECT 1 FROM bookings b \
                 JOIN schedule_slots s ON s.id = b.slot_id \
                 WHERE b.requester_id = $1 AND b.status = $2 \
                   AND s.slot_date = $3 AND s.start_time = $4 \
             )",
        )
        .bind(requester_id.as_str())
        .bind(status::BOOKED)
        .bind(date)
        .bind(start_time)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(db_error("Failed to check time conflict"))
    }

    async fn load_booking(&mut self, booking_id: BookingId) -> Result<Option<Booking>> {
        sqlx::query(&format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = $1 FOR UPDATE"
        ))
        .bind(to_bigint(booking_id.0, "booking id")?)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(db_error("Failed to load booking"))?
        .as_ref()
        .map(booking_from_row)
        .transpose()
    }

    async fn insert_booking(&mut self, booking: &Booking) -> Result<()> {
        let details = booking.details();
        sqlx::query(
            "INSERT INTO bookings \
                 (id, requester_id, provider_id, slot_id, appointment_time, \
                  status, cancel_reason, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
        )
        .bind(to_bigint(details.id.0, "booking id")?)
        .bind(details.requester_id.as_str())
        .bind(details.provider_id.as_str())
        .bind(details.slot_id.0)
        .bind(details.appointment_time)
        .bind(booking.status().as_str())
        .bind(booking.status().cancel_reason())
        .bind(details.created_at)
        .bind(booking.updated_at())
        .execute(&mut *self.tx)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.is_unique_violation() {
                    match db_err.constraint() {
                        Some(ACTIVE_BOOKING_INDEX) => return BookingError::DuplicateBooking,
                        Some(ACTIVE_TIME_INDEX) => return BookingError::TimeConflict,
                        _ => {}
                    }
                }
            }
            BookingError::Database(format!("Failed to insert booking: {e}"))
        })?;

        Ok(())
    }

    async fn update_booking_status(&mut self, booking: &Booking) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE bookings SET status = $2, cancel_reason = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(to_bigint(booking.id().0, "booking id")?)
        .bind(booking.status().as_str())
        .bind(booking.status().cancel_reason())
        .bind(booking.updated_at())
        .execute(&mut *self.tx)
        .await
        .map_err(db_error("Failed to update booking status"))?;

        if updated.rows_affected() == 0 {
            return Err(BookingError::not_found(Entity::Booking, booking.id()));
        }
        Ok(())
    }

    async fn commit(self) -> Result<()> {
        self.tx
            .commit()
            .await
            .map_err(db_error("Failed to commit transaction"))
    }

    async fn rollback(self) -> Result<()> {
        self.tx
            .rollback()
            .await
            .map_err(db_error("Failed to roll back transaction"))
    }
}
