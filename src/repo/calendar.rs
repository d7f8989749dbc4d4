use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use sqlx::types::Json;
use sqlx::{FromRow, MySqlPool};
use utoipa::ToSchema;

use super::decode_error;
use crate::error::AppError;
use crate::model::calendar::{
    CalendarException, ExceptionScope, OnDutyEntry, WeeklyOffConfig, validate_exception,
};

const WEEKLY_OFF_SUNDAY: &str = "weekly_off_sunday";

#[derive(FromRow)]
struct CalendarExceptionRow {
    id: u64,
    name: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    scope: String,
    departments: Json<Vec<String>>,
    active: bool,
    updated_at: Option<NaiveDateTime>,
}

impl TryFrom<CalendarExceptionRow> for CalendarException {
    type Error = sqlx::Error;

    fn try_from(row: CalendarExceptionRow) -> Result<Self, Self::Error> {
        Ok(CalendarException {
            id: row.id,
            name: row.name,
            start_date: row.start_date,
            end_date: row.end_date,
            scope: ExceptionScope::from_str(&row.scope).map_err(decode_error)?,
            departments: row.departments.0,
            active: row.active,
            updated_at: row.updated_at,
        })
    }
}

/// Body for creating or replacing a calendar exception.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CalendarExceptionInput {
    #[schema(example = "Republic Day")]
    pub name: String,

    #[schema(example = "2024-01-26", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2024-01-26", value_type = String, format = "date")]
    pub end_date: NaiveDate,

    pub scope: ExceptionScope,

    #[serde(default)]
    pub departments: Vec<String>,
}

impl CalendarExceptionInput {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name must not be empty".into()));
        }
        validate_exception(self.start_date, self.end_date, self.scope, &self.departments)?;
        Ok(())
    }

    fn departments(&self) -> Json<Vec<String>> {
        Json(
            self.departments
                .iter()
                .map(|d| d.trim().to_string())
                .filter(|d| !d.is_empty())
                .collect(),
        )
    }
}

const SELECT_EXCEPTION: &str = r#"
    SELECT id, name, start_date, end_date, scope, departments, active, updated_at
    FROM calendar_exceptions
"#;

pub async fn list_exceptions(
    pool: &MySqlPool,
    include_inactive: bool,
) -> Result<Vec<CalendarException>, sqlx::Error> {
    let sql = if include_inactive {
        format!("{SELECT_EXCEPTION} ORDER BY start_date, id")
    } else {
        format!("{SELECT_EXCEPTION} WHERE active = TRUE ORDER BY start_date, id")
    };

    sqlx::query_as::<_, CalendarExceptionRow>(&sql)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(CalendarException::try_from)
        .collect()
}

pub async fn fetch_exception(
    pool: &MySqlPool,
    id: u64,
) -> Result<Option<CalendarException>, sqlx::Error> {
    sqlx::query_as::<_, CalendarExceptionRow>(&format!("{SELECT_EXCEPTION} WHERE id = ?"))
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(CalendarException::try_from)
        .transpose()
}

pub async fn create_exception(
    pool: &MySqlPool,
    input: &CalendarExceptionInput,
) -> Result<u64, AppError> {
    input.validate()?;

    let result = sqlx::query(
        r#"
        INSERT INTO calendar_exceptions (name, start_date, end_date, scope, departments)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.name.trim())
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.scope.as_ref())
    .bind(input.departments())
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

/// Replaces every editable field of an exception.
pub async fn update_exception(
    pool: &MySqlPool,
    id: u64,
    input: &CalendarExceptionInput,
) -> Result<(), AppError> {
    input.validate()?;

    let result = sqlx::query(
        r#"
        UPDATE calendar_exceptions
        SET name = ?, start_date = ?, end_date = ?, scope = ?, departments = ?
        WHERE id = ?
        "#,
    )
    .bind(input.name.trim())
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.scope.as_ref())
    .bind(input.departments())
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 && fetch_exception(pool, id).await?.is_none() {
        return Err(AppError::NotFound(format!("calendar exception {id}")));
    }
    Ok(())
}

/// Retires an exception. Rows are kept so that earlier months can be
/// recomputed.
pub async fn deactivate_exception(pool: &MySqlPool, id: u64) -> Result<(), AppError> {
    let result = sqlx::query("UPDATE calendar_exceptions SET active = FALSE WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 && fetch_exception(pool, id).await?.is_none() {
        return Err(AppError::NotFound(format!("calendar exception {id}")));
    }
    Ok(())
}

pub async fn fetch_weekly_off(pool: &MySqlPool) -> Result<WeeklyOffConfig, sqlx::Error> {
    let value: Option<(String,)> =
        sqlx::query_as("SELECT setting_value FROM institution_settings WHERE setting_key = ?")
            .bind(WEEKLY_OFF_SUNDAY)
            .fetch_optional(pool)
            .await?;

    let sunday = match value {
        Some((raw,)) => bool::from_str(raw.trim()).map_err(decode_error)?,
        None => WeeklyOffConfig::default().sunday,
    };
    Ok(WeeklyOffConfig { sunday })
}

pub async fn set_weekly_off(pool: &MySqlPool, config: WeeklyOffConfig) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO institution_settings (setting_key, setting_value)
        VALUES (?, ?)
        ON DUPLICATE KEY UPDATE setting_value = VALUES(setting_value)
        "#,
    )
    .bind(WEEKLY_OFF_SUNDAY)
    .bind(config.sunday.to_string())
    .execute(pool)
    .await?;
    Ok(())
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct OnDutyInput {
    #[schema(example = "2024-01-15", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2024-01-16", value_type = String, format = "date")]
    pub end_date: NaiveDate,

    #[schema(example = "Client site visit")]
    pub reason: String,
}

/// Active on-duty entries of one staff member that overlap `[from, to]`.
pub async fn list_on_duty(
    pool: &MySqlPool,
    staff_id: u64,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<OnDutyEntry>, sqlx::Error> {
    sqlx::query_as::<_, OnDutyEntry>(
        r#"
        SELECT id, staff_id, start_date, end_date, reason, active
        FROM on_duty_entries
        WHERE staff_id = ? AND active = TRUE AND start_date <= ? AND end_date >= ?
        ORDER BY start_date, id
        "#,
    )
    .bind(staff_id)
    .bind(to)
    .bind(from)
    .fetch_all(pool)
    .await
}

pub async fn create_on_duty(
    pool: &MySqlPool,
    staff_id: u64,
    input: &OnDutyInput,
) -> Result<u64, AppError> {
    if input.start_date > input.end_date {
        return Err(AppError::Validation(
            "start_date cannot be after end_date".into(),
        ));
    }
    if input.reason.trim().is_empty() {
        return Err(AppError::Validation("reason must not be empty".into()));
    }

    let result = sqlx::query(
        "INSERT INTO on_duty_entries (staff_id, start_date, end_date, reason) VALUES (?, ?, ?, ?)",
    )
    .bind(staff_id)
    .bind(input.start_date)
    .bind(input.end_date)
    .bind(input.reason.trim())
    .execute(pool)
    .await?;

    Ok(result.last_insert_id())
}

pub async fn deactivate_on_duty(pool: &MySqlPool, staff_id: u64, id: u64) -> Result<(), AppError> {
    let result = sqlx::query(
        "UPDATE on_duty_entries SET active = FALSE WHERE id = ? AND staff_id = ? AND active = TRUE",
    )
    .bind(id)
    .bind(staff_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound(format!("on-duty entry {id}")));
    }
    Ok(())
}
