use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum PunchType {
    CheckIn,
    CheckOut,
}

/// A check-in or check-out accepted by the verification gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PunchEvent {
    #[schema(example = 1001)]
    pub staff_id: u64,

    #[schema(example = "2024-01-25", value_type = String, format = "date")]
    pub punch_date: NaiveDate,

    pub punch_type: PunchType,

    #[schema(example = "2024-01-25T09:02:00", value_type = String, format = "date-time")]
    pub punched_at: NaiveDateTime,

    #[schema(example = "biometric")]
    pub method: String,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceStatus {
    Present,
    Late,
    Absent,
    Holiday,
    OnLeave,
    WeeklyOff,
    OnDuty,
}

impl AttendanceStatus {
    /// Days that count towards the working-day denominator of rate calculations.
    pub fn is_working_day(&self) -> bool {
        matches!(
            self,
            AttendanceStatus::Present
                | AttendanceStatus::Late
                | AttendanceStatus::Absent
                | AttendanceStatus::OnDuty
        )
    }

    pub fn is_attended(&self) -> bool {
        matches!(self, AttendanceStatus::Present | AttendanceStatus::Late)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum AttendanceAnomaly {
    /// A check-out exists for the day without a check-in.
    CheckoutWithoutCheckin,
}

/// Derived attendance for one staff member on one day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct DailyAttendanceRecord {
    #[schema(example = 1001)]
    pub staff_id: u64,

    #[schema(example = "2024-01-25", value_type = String, format = "date")]
    pub date: NaiveDate,

    pub status: AttendanceStatus,

    #[schema(example = "09:46:00", value_type = Option<String>)]
    pub check_in: Option<NaiveTime>,

    #[schema(example = "17:00:00", value_type = Option<String>)]
    pub check_out: Option<NaiveTime>,

    #[schema(example = 46)]
    pub late_by_minutes: u32,

    #[schema(example = 0)]
    pub early_arrival_by_minutes: u32,

    #[schema(example = 0)]
    pub early_departure_by_minutes: u32,

    /// Whole minutes between check-in and check-out; totals are built from this.
    #[schema(example = 434)]
    pub worked_minutes: u32,

    /// `worked_minutes` in hours, rounded to 2 dp for display.
    #[schema(example = "7.23", value_type = String)]
    pub hours_worked: Decimal,

    // timing used for the computation
    #[schema(example = "09:00:00", value_type = String)]
    pub shift_start: NaiveTime,

    #[schema(example = "17:00:00", value_type = String)]
    pub shift_end: NaiveTime,

    pub anomaly: Option<AttendanceAnomaly>,
}
