use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use crate::error::AttendanceError;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ExceptionScope {
    InstitutionWide,
    DepartmentSpecific,
    CommonLeave,
}

/// A date-range override of the ordinary workday.
///
/// Exceptions are never deleted; `active = false` retires them so past
/// payroll runs can be recomputed against the same calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CalendarException {
    #[schema(example = 7)]
    pub id: u64,

    #[schema(example = "Republic Day")]
    pub name: String,

    #[schema(example = "2024-01-26", value_type = String, format = "date")]
    pub start_date: NaiveDate,

    #[schema(example = "2024-01-26", value_type = String, format = "date")]
    pub end_date: NaiveDate,

    pub scope: ExceptionScope,

    #[schema(example = json!(["IT"]))]
    pub departments: Vec<String>,

    pub active: bool,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub updated_at: Option<NaiveDateTime>,
}

impl CalendarException {
    /// Active and the inclusive range contains `date`.
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.active && self.start_date <= date && date <= self.end_date
    }

    pub fn validate(&self) -> Result<(), AttendanceError> {
        validate_exception(self.start_date, self.end_date, self.scope, &self.departments)
    }
}

pub fn validate_exception(
    start_date: NaiveDate,
    end_date: NaiveDate,
    scope: ExceptionScope,
    departments: &[String],
) -> Result<(), AttendanceError> {
    if start_date > end_date {
        return Err(AttendanceError::validation(
            "start_date cannot be after end_date",
        ));
    }
    if scope == ExceptionScope::DepartmentSpecific
        && departments.iter().all(|d| d.trim().is_empty())
    {
        return Err(AttendanceError::validation(
            "department_specific exceptions need at least one department",
        ));
    }
    Ok(())
}

/// Which weekdays are recurring days off. Only Sunday is configurable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct WeeklyOffConfig {
    #[schema(example = true)]
    pub sunday: bool,
}

/// Approved field or official work for a staff member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct OnDutyEntry {
    pub id: u64,
    pub staff_id: u64,
    #[schema(value_type = String, format = "date")]
    pub start_date: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub end_date: NaiveDate,
    pub reason: String,
    pub active: bool,
}

impl OnDutyEntry {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.active && self.start_date <= date && date <= self.end_date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CalendarClassification {
    Workday,
    InstitutionHoliday,
    DepartmentHoliday,
    CommonLeave,
    WeeklyOff,
    OnDuty,
}
