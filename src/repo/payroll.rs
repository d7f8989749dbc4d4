use chrono::NaiveDateTime;
use sqlx::types::Json;
use sqlx::{FromRow, MySqlConnection, MySqlPool};
use uuid::Uuid;

use super::decode_error;
use crate::model::payroll::{MonthlySalaryResult, PayrollPeriod, StoredSalaryResult};

#[derive(FromRow)]
struct SalaryResultRow {
    revision: u32,
    run_id: String,
    calculated_at: NaiveDateTime,
    result: Json<MonthlySalaryResult>,
}

impl TryFrom<SalaryResultRow> for StoredSalaryResult {
    type Error = sqlx::Error;

    fn try_from(row: SalaryResultRow) -> Result<Self, Self::Error> {
        Ok(StoredSalaryResult {
            revision: row.revision,
            run_id: Uuid::parse_str(&row.run_id).map_err(decode_error)?,
            calculated_at: row.calculated_at,
            result: row.result.0,
        })
    }
}

/// Appends a new revision for the result's (staff, year, month) and
/// returns its number. Earlier revisions are left untouched.
pub async fn insert_salary_result(
    conn: &mut MySqlConnection,
    result: &MonthlySalaryResult,
    run_id: Uuid,
) -> Result<u32, sqlx::Error> {
    let latest: u64 = sqlx::query_scalar(
        r#"
        SELECT CAST(COALESCE(MAX(revision), 0) AS UNSIGNED) FROM monthly_salary_results
        WHERE staff_id = ? AND year = ? AND month = ?
        FOR UPDATE
        "#,
    )
    .bind(result.staff_id)
    .bind(result.year)
    .bind(result.month)
    .fetch_one(&mut *conn)
    .await?;

    let revision = u32::try_from(latest + 1).map_err(decode_error)?;

    sqlx::query(
        r#"
        INSERT INTO monthly_salary_results
            (staff_id, year, month, revision, run_id, result, gross_pay, net_pay)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(result.staff_id)
    .bind(result.year)
    .bind(result.month)
    .bind(revision)
    .bind(run_id.to_string())
    .bind(Json(result))
    .bind(result.gross_pay)
    .bind(result.net_pay)
    .execute(&mut *conn)
    .await?;

    Ok(revision)
}

const SELECT_RESULT: &str = r#"
    SELECT revision, run_id, calculated_at, result
    FROM monthly_salary_results
    WHERE staff_id = ? AND year = ? AND month = ?
"#;

/// The authoritative (highest) revision, if the month was ever calculated.
pub async fn fetch_latest_result(
    pool: &MySqlPool,
    staff_id: u64,
    period: PayrollPeriod,
) -> Result<Option<StoredSalaryResult>, sqlx::Error> {
    sqlx::query_as::<_, SalaryResultRow>(&format!("{SELECT_RESULT} ORDER BY revision DESC LIMIT 1"))
        .bind(staff_id)
        .bind(period.year)
        .bind(period.month)
        .fetch_optional(pool)
        .await?
        .map(StoredSalaryResult::try_from)
        .transpose()
}

pub async fn list_revisions(
    pool: &MySqlPool,
    staff_id: u64,
    period: PayrollPeriod,
) -> Result<Vec<StoredSalaryResult>, sqlx::Error> {
    sqlx::query_as::<_, SalaryResultRow>(&format!("{SELECT_RESULT} ORDER BY revision"))
        .bind(staff_id)
        .bind(period.year)
        .bind(period.month)
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(StoredSalaryResult::try_from)
        .collect()
}
