use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlConnection, MySqlPool};

use super::decode_error;
use crate::model::attendance::{AttendanceAnomaly, AttendanceStatus, DailyAttendanceRecord};

#[derive(FromRow)]
struct DailyRecordRow {
    staff_id: u64,
    record_date: NaiveDate,
    status: String,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
    late_by_minutes: u32,
    early_arrival_by_minutes: u32,
    early_departure_by_minutes: u32,
    worked_minutes: u32,
    hours_worked: Decimal,
    shift_start: NaiveTime,
    shift_end: NaiveTime,
    anomaly: Option<String>,
}

impl TryFrom<DailyRecordRow> for DailyAttendanceRecord {
    type Error = sqlx::Error;

    fn try_from(row: DailyRecordRow) -> Result<Self, Self::Error> {
        let anomaly = row
            .anomaly
            .as_deref()
            .map(AttendanceAnomaly::from_str)
            .transpose()
            .map_err(decode_error)?;

        Ok(DailyAttendanceRecord {
            staff_id: row.staff_id,
            date: row.record_date,
            status: AttendanceStatus::from_str(&row.status).map_err(decode_error)?,
            check_in: row.check_in,
            check_out: row.check_out,
            late_by_minutes: row.late_by_minutes,
            early_arrival_by_minutes: row.early_arrival_by_minutes,
            early_departure_by_minutes: row.early_departure_by_minutes,
            worked_minutes: row.worked_minutes,
            hours_worked: row.hours_worked,
            shift_start: row.shift_start,
            shift_end: row.shift_end,
            anomaly,
        })
    }
}

/// Replaces the stored record of every (staff, date) in `records`.
pub async fn upsert_daily_records(
    conn: &mut MySqlConnection,
    records: &[DailyAttendanceRecord],
) -> Result<(), sqlx::Error> {
    for record in records {
        sqlx::query(
            r#"
            INSERT INTO daily_attendance_records
                (staff_id, record_date, status, check_in, check_out,
                 late_by_minutes, early_arrival_by_minutes, early_departure_by_minutes,
                 worked_minutes, hours_worked, shift_start, shift_end, anomaly)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON DUPLICATE KEY UPDATE
                status = VALUES(status),
                check_in = VALUES(check_in),
                check_out = VALUES(check_out),
                late_by_minutes = VALUES(late_by_minutes),
                early_arrival_by_minutes = VALUES(early_arrival_by_minutes),
                early_departure_by_minutes = VALUES(early_departure_by_minutes),
                worked_minutes = VALUES(worked_minutes),
                hours_worked = VALUES(hours_worked),
                shift_start = VALUES(shift_start),
                shift_end = VALUES(shift_end),
                anomaly = VALUES(anomaly)
            "#,
        )
        .bind(record.staff_id)
        .bind(record.date)
        .bind(record.status.as_ref())
        .bind(record.check_in)
        .bind(record.check_out)
        .bind(record.late_by_minutes)
        .bind(record.early_arrival_by_minutes)
        .bind(record.early_departure_by_minutes)
        .bind(record.worked_minutes)
        .bind(record.hours_worked)
        .bind(record.shift_start)
        .bind(record.shift_end)
        .bind(record.anomaly.map(|a| a.to_string()))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn list_daily_records(
    pool: &MySqlPool,
    staff_id: u64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<DailyAttendanceRecord>, sqlx::Error> {
    sqlx::query_as::<_, DailyRecordRow>(
        r#"
        SELECT staff_id, record_date, status, check_in, check_out,
               late_by_minutes, early_arrival_by_minutes, early_departure_by_minutes,
               worked_minutes, hours_worked, shift_start, shift_end, anomaly
        FROM daily_attendance_records
        WHERE staff_id = ? AND record_date BETWEEN ? AND ?
        ORDER BY record_date
        "#,
    )
    .bind(staff_id)
    .bind(from)
    .bind(to)
    .fetch_all(pool)
    .await?
    .into_iter()
    .map(DailyAttendanceRecord::try_from)
    .collect()
}
