use chrono::NaiveTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AttendanceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "shift_type": "morning",
        "start_time": "09:00:00",
        "end_time": "17:00:00",
        "grace_minutes": 10
    })
)]
pub struct ShiftDefinition {
    pub shift_type: String,
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
    pub grace_minutes: u32,
}

/// Fallback timing used when a staff member's shift has no definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct InstitutionDefaultTiming {
    #[schema(example = "09:00:00", value_type = String)]
    pub start_time: NaiveTime,
    #[schema(example = "17:00:00", value_type = String)]
    pub end_time: NaiveTime,
    #[schema(example = 10)]
    pub grace_minutes: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum TimingSource {
    Shift,
    InstitutionDefault,
}

/// The resolved start/end/grace for one evaluation.
///
/// The grace period is carried for reporting only; lateness is strict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ShiftTiming {
    #[schema(value_type = String)]
    pub start_time: NaiveTime,
    #[schema(value_type = String)]
    pub end_time: NaiveTime,
    pub grace_minutes: u32,
    pub source: TimingSource,
}

impl ShiftTiming {
    pub fn new(
        start_time: NaiveTime,
        end_time: NaiveTime,
        grace_minutes: u32,
        source: TimingSource,
    ) -> Result<Self, AttendanceError> {
        validate_window(start_time, end_time)?;
        Ok(Self {
            start_time,
            end_time,
            grace_minutes,
            source,
        })
    }

    pub fn standard_hours(&self) -> Decimal {
        standard_hours(self.start_time, self.end_time)
    }
}

/// Shifts never cross midnight.
pub fn validate_window(start: NaiveTime, end: NaiveTime) -> Result<(), AttendanceError> {
    if end <= start {
        return Err(AttendanceError::validation(format!(
            "shift end {end} must be after start {start}"
        )));
    }
    Ok(())
}

pub fn standard_minutes(start: NaiveTime, end: NaiveTime) -> u32 {
    // within one day, so at most 1440
    (end - start).num_minutes().max(0) as u32
}

pub fn standard_hours(start: NaiveTime, end: NaiveTime) -> Decimal {
    Decimal::from(standard_minutes(start, end)) / Decimal::from(60)
}
