use serde::Deserialize;
use serde_json::Value;
use sqlx::{FromRow, MySqlPool};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::staff::{SalaryComponents, Staff};
use crate::utils::db_utils::{ColumnKind, build_update_sql, execute_update};

/// Columns an admin may patch on a staff row.
const UPDATABLE_COLUMNS: &[(&str, ColumnKind)] = &[
    ("full_name", ColumnKind::Text),
    ("department", ColumnKind::Text),
    ("shift_type", ColumnKind::NullableText),
    ("active", ColumnKind::Bool),
    ("base_salary", ColumnKind::Money),
    ("hra", ColumnKind::Money),
    ("transport_allowance", ColumnKind::Money),
    ("other_allowances", ColumnKind::Money),
    ("pf", ColumnKind::Money),
    ("esi", ColumnKind::Money),
    ("professional_tax", ColumnKind::Money),
    ("other_deductions", ColumnKind::Money),
];

#[derive(FromRow)]
struct StaffRow {
    id: u64,
    staff_code: String,
    full_name: String,
    department: String,
    shift_type: Option<String>,
    active: bool,
    #[sqlx(flatten)]
    salary: SalaryComponents,
}

impl From<StaffRow> for Staff {
    fn from(row: StaffRow) -> Self {
        Staff {
            id: row.id,
            staff_code: row.staff_code,
            full_name: row.full_name,
            department: row.department,
            shift_type: row.shift_type,
            active: row.active,
            salary: row.salary,
        }
    }
}

const SELECT_STAFF: &str = r#"
    SELECT id, staff_code, full_name, department, shift_type, active,
           base_salary, hra, transport_allowance, other_allowances,
           pf, esi, professional_tax, other_deductions
    FROM staff
"#;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateStaff {
    #[schema(example = "STF-001")]
    pub staff_code: String,
    #[schema(example = "Asha Rao")]
    pub full_name: String,
    #[schema(example = "IT")]
    pub department: String,
    #[schema(example = "morning")]
    pub shift_type: Option<String>,
    pub salary: SalaryComponents,
}

pub async fn fetch_staff(pool: &MySqlPool, staff_id: u64) -> Result<Option<Staff>, sqlx::Error> {
    let row = sqlx::query_as::<_, StaffRow>(&format!("{SELECT_STAFF} WHERE id = ?"))
        .bind(staff_id)
        .fetch_optional(pool)
        .await?;
    Ok(row.map(Staff::from))
}

pub async fn list_active_staff(pool: &MySqlPool) -> Result<Vec<Staff>, sqlx::Error> {
    let rows = sqlx::query_as::<_, StaffRow>(&format!(
        "{SELECT_STAFF} WHERE active = TRUE ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Staff::from).collect())
}

pub async fn create_staff(pool: &MySqlPool, payload: &CreateStaff) -> Result<u64, AppError> {
    if payload.staff_code.trim().is_empty() || payload.full_name.trim().is_empty() {
        return Err(AppError::Validation(
            "staff_code and full_name must not be empty".into(),
        ));
    }
    payload.salary.validate()?;

    let salary = &payload.salary;
    let result = sqlx::query(
        r#"
        INSERT INTO staff
            (staff_code, full_name, department, shift_type,
             base_salary, hra, transport_allowance, other_allowances,
             pf, esi, professional_tax, other_deductions)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.staff_code.trim())
    .bind(payload.full_name.trim())
    .bind(&payload.department)
    .bind(&payload.shift_type)
    .bind(salary.base_salary)
    .bind(salary.hra)
    .bind(salary.transport_allowance)
    .bind(salary.other_allowances)
    .bind(salary.pf)
    .bind(salary.esi)
    .bind(salary.professional_tax)
    .bind(salary.other_deductions)
    .execute(pool)
    .await;

    match result {
        Ok(done) => Ok(done.last_insert_id()),
        Err(e) => {
            if let sqlx::Error::Database(db_err) = &e {
                if db_err.code().as_deref() == Some("23000") {
                    return Err(AppError::Validation(format!(
                        "staff_code {} already exists",
                        payload.staff_code
                    )));
                }
            }
            Err(e.into())
        }
    }
}

/// Partial update from a JSON object of column → value.
pub async fn update_staff(pool: &MySqlPool, staff_id: u64, payload: &Value) -> Result<(), AppError> {
    let update = build_update_sql("staff", payload, UPDATABLE_COLUMNS, "id", staff_id)?;
    let affected = execute_update(pool, update).await?;
    if affected == 0 && fetch_staff(pool, staff_id).await?.is_none() {
        return Err(AppError::NotFound(format!("staff {staff_id}")));
    }
    Ok(())
}
