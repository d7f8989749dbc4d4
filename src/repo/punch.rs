use std::str::FromStr;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use super::decode_error;
use crate::engine::gate::{DayPunches, PunchCheck, PunchLedger, PunchRequest};
use crate::error::{AppError, GateRejection};
use crate::model::attendance::{PunchEvent, PunchType};

#[derive(FromRow)]
struct PunchRow {
    staff_id: u64,
    punch_date: NaiveDate,
    punch_type: String,
    punched_at: NaiveDateTime,
    method: String,
}

impl TryFrom<PunchRow> for PunchEvent {
    type Error = sqlx::Error;

    fn try_from(row: PunchRow) -> Result<Self, Self::Error> {
        Ok(PunchEvent {
            staff_id: row.staff_id,
            punch_date: row.punch_date,
            punch_type: PunchType::from_str(&row.punch_type).map_err(decode_error)?,
            punched_at: row.punched_at,
            method: row.method,
        })
    }
}

/// Punch storage backed by `punch_events`.
///
/// Each insert first locks the staff row, so punches of one staff member are
/// serialized before their day is read. `uq_punch_once` rejects whatever
/// still slips through.
#[derive(Clone)]
pub struct MySqlPunchLedger {
    pool: MySqlPool,
}

impl MySqlPunchLedger {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

/// Maps a failed punch insert; a unique-key violation is a lost race.
fn insert_error(err: sqlx::Error, request: &PunchRequest) -> AppError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            debug!(staff_id = request.staff_id, "Punch lost the race on uq_punch_once");
            return GateRejection::Duplicate(request.punch_type).into();
        }
    }
    err.into()
}

#[async_trait]
impl PunchLedger for MySqlPunchLedger {
    async fn insert_checked(
        &self,
        request: &PunchRequest,
        check: PunchCheck,
    ) -> Result<PunchEvent, AppError> {
        let mut tx = self.pool.begin().await?;

        // Record lock on an existing row; locking the day's punches alone
        // takes gap locks when the day is still empty.
        let staff = sqlx::query_scalar::<_, u64>("SELECT id FROM staff WHERE id = ? FOR UPDATE")
            .bind(request.staff_id)
            .fetch_optional(&mut *tx)
            .await?;
        if staff.is_none() {
            return Err(AppError::NotFound(format!("staff {}", request.staff_id)));
        }

        let rows = sqlx::query_as::<_, PunchRow>(
            r#"
            SELECT staff_id, punch_date, punch_type, punched_at, method
            FROM punch_events
            WHERE staff_id = ? AND punch_date = ?
            "#,
        )
        .bind(request.staff_id)
        .bind(request.punch_date)
        .fetch_all(&mut *tx)
        .await?;

        let mut day = DayPunches::default();
        for row in rows {
            day.set(PunchEvent::try_from(row)?);
        }

        check(&day, request)?;

        sqlx::query(
            r#"
            INSERT INTO punch_events (staff_id, punch_date, punch_type, punched_at, method)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(request.staff_id)
        .bind(request.punch_date)
        .bind(request.punch_type.as_ref())
        .bind(request.punched_at)
        .bind(&request.method)
        .execute(&mut *tx)
        .await
        .map_err(|e| insert_error(e, request))?;

        tx.commit().await?;
        Ok(request.clone().into_event())
    }
}

/// Accepted punches of one staff member within `[from, to]`.
pub async fn list_punches(
    pool: &MySqlPool,
    staff_id: u64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<PunchEvent>, sqlx::Error> {
    sqlx::query_as::<_, PunchRow>(
        r#"
        SELECT staff_id, punch_date, punch_type, punched_at, method
        FROM punch_events
        WHERE staff_id = ? AND punch_date BETWEEN ? AND ?
        ORDER BY punch_date, punched_at
        "#,
    )
    .bind(staff_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(PunchEvent::try_from)
    .collect()
}
