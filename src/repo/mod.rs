//! MySQL access. Every SQL statement of the service lives below this module.

pub mod attendance;
pub mod calendar;
pub mod payroll;
pub mod punch;
pub mod salary_rule;
pub mod shift;
pub mod staff;

use chrono::NaiveDate;
use sqlx::MySqlPool;
use tracing::{debug, instrument};
use uuid::Uuid;

use crate::engine::payroll_run::{
    ConfigSnapshot, StaffMonthInput, StaffMonthOutcome, evaluate_staff_day,
};
use crate::error::AppError;
use crate::model::attendance::DailyAttendanceRecord;
use crate::model::payroll::PayrollPeriod;
use crate::model::staff::Staff;

/// Wraps a domain parse failure as a row decode error.
pub(crate) fn decode_error<E>(err: E) -> sqlx::Error
where
    E: std::error::Error + Send + Sync + 'static,
{
    sqlx::Error::Decode(Box::new(err))
}

/// Reads the current configuration. Called at the start of every
/// evaluation or run; nothing is cached between requests.
pub async fn load_snapshot(pool: &MySqlPool) -> Result<ConfigSnapshot, sqlx::Error> {
    let shifts = shift::load_registry(pool).await?;
    let exceptions = calendar::list_exceptions(pool, false).await?;
    let weekly_off = calendar::fetch_weekly_off(pool).await?;
    let rules = salary_rule::fetch_rule_set(pool).await?;

    debug!(
        exceptions = exceptions.len(),
        rules = rules.rules.len(),
        "Configuration snapshot loaded"
    );

    Ok(ConfigSnapshot {
        shifts,
        exceptions,
        weekly_off,
        rules,
    })
}

pub async fn load_staff_month(
    pool: &MySqlPool,
    staff: Staff,
    period: PayrollPeriod,
) -> Result<StaffMonthInput, AppError> {
    let from = period.first_day().map_err(AppError::from)?;
    let to = period.last_day().map_err(AppError::from)?;

    let punches = punch::list_punches(pool, staff.id, from, to).await?;
    let on_duty = calendar::list_on_duty(pool, staff.id, from, to).await?;

    Ok(StaffMonthInput {
        staff,
        punches,
        on_duty,
    })
}

/// Re-derives one stored day from its accepted punches and the current
/// configuration.
pub async fn refresh_daily_record(
    pool: &MySqlPool,
    staff: &Staff,
    date: NaiveDate,
) -> Result<DailyAttendanceRecord, AppError> {
    let snapshot = load_snapshot(pool).await?;
    let punches = punch::list_punches(pool, staff.id, date, date).await?;
    let on_duty = calendar::list_on_duty(pool, staff.id, date, date).await?;

    let record = evaluate_staff_day(&snapshot, staff, &on_duty, &punches, date)?;

    let mut conn = pool.acquire().await?;
    attendance::upsert_daily_records(&mut conn, std::slice::from_ref(&record)).await?;

    debug!(staff_id = staff.id, %date, status = %record.status, "Daily record refreshed");
    Ok(record)
}

/// Stores the month's daily records and a new salary revision in one
/// transaction. Returns the revision number written.
#[instrument(skip_all, fields(staff_id = outcome.result.staff_id, %run_id))]
pub async fn persist_staff_month(
    pool: &MySqlPool,
    outcome: &StaffMonthOutcome,
    run_id: Uuid,
) -> Result<u32, AppError> {
    let mut tx = pool.begin().await?;

    attendance::upsert_daily_records(&mut tx, &outcome.records).await?;
    let revision = payroll::insert_salary_result(&mut tx, &outcome.result, run_id).await?;

    tx.commit().await?;
    debug!(revision, "Salary result stored");
    Ok(revision)
}

pub async fn require_staff(pool: &MySqlPool, staff_id: u64) -> Result<Staff, AppError> {
    staff::fetch_staff(pool, staff_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("staff {staff_id}")))
}

