use chrono::{NaiveDate, NaiveDateTime};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::AttendanceError;

/// A calendar month payroll is computed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, Display)]
#[display(fmt = "{}-{:02}", year, month)]
pub struct PayrollPeriod {
    #[schema(example = 2024)]
    pub year: i32,
    #[schema(example = 1)]
    pub month: u32,
}

impl PayrollPeriod {
    pub fn new(year: i32, month: u32) -> Result<Self, AttendanceError> {
        if NaiveDate::from_ymd_opt(year, month, 1).is_none() {
            return Err(AttendanceError::validation(format!(
                "invalid payroll period {year}-{month}"
            )));
        }
        Ok(Self { year, month })
    }

    pub fn first_day(&self) -> Result<NaiveDate, AttendanceError> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).ok_or_else(|| {
            AttendanceError::validation(format!("invalid payroll period {self}"))
        })
    }

    pub fn last_day(&self) -> Result<NaiveDate, AttendanceError> {
        let first = self.first_day()?;
        let next_month = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        next_month
            .and_then(|d| d.pred_opt())
            .filter(|d| *d >= first)
            .ok_or_else(|| AttendanceError::validation(format!("invalid payroll period {self}")))
    }

    /// Every calendar day of the month, in order.
    pub fn days(&self) -> Result<Vec<NaiveDate>, AttendanceError> {
        let first = self.first_day()?;
        let last = self.last_day()?;
        Ok(first
            .iter_days()
            .take_while(|d| *d <= last)
            .collect())
    }
}

/// Month-level attendance totals for one staff member.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct MonthlyTotals {
    pub days_present: u32,
    pub days_late: u32,
    pub days_absent: u32,
    pub days_on_leave: u32,
    pub days_holiday: u32,
    pub days_weekly_off: u32,
    pub days_on_duty: u32,
    /// Days that are not holiday, weekly-off or leave.
    pub working_days: u32,

    pub total_late_minutes: u64,
    pub total_early_departure_minutes: u64,
    pub total_early_arrival_minutes: u64,
    pub days_with_early_arrival: u32,

    #[schema(value_type = String)]
    pub total_hours_worked: Decimal,
    #[schema(value_type = String)]
    pub overtime_hours: Decimal,
    /// Sum of the shift length over working days.
    #[schema(value_type = String)]
    pub standard_working_hours: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Allowances {
    #[schema(value_type = String)]
    pub hra: Decimal,
    #[schema(value_type = String)]
    pub transport: Decimal,
    #[schema(value_type = String)]
    pub other: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Deductions {
    #[schema(value_type = String)]
    pub pf: Decimal,
    #[schema(value_type = String)]
    pub esi: Decimal,
    #[schema(value_type = String)]
    pub professional_tax: Decimal,
    #[schema(value_type = String)]
    pub other: Decimal,
    #[schema(value_type = String)]
    pub late_penalty: Decimal,
    #[schema(value_type = String)]
    pub early_departure_penalty: Decimal,
    #[schema(value_type = String)]
    pub absence_deduction: Decimal,
}

impl Deductions {
    pub fn total(&self) -> Decimal {
        self.pf
            + self.esi
            + self.professional_tax
            + self.other
            + self.late_penalty
            + self.early_departure_penalty
            + self.absence_deduction
    }
}

/// Payroll for one (staff, year, month). Always a full recompute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct MonthlySalaryResult {
    pub staff_id: u64,
    pub year: i32,
    pub month: u32,

    pub days_present: u32,
    pub days_absent: u32,
    pub days_late: u32,
    pub days_on_leave: u32,
    pub days_holiday: u32,
    pub days_weekly_off: u32,
    pub days_on_duty: u32,
    pub working_days: u32,
    /// Days the bonus-bearing early-arrival minutes came from.
    #[serde(default)]
    pub days_with_early_arrival: u32,

    #[schema(value_type = String)]
    pub total_hours_worked: Decimal,
    #[schema(value_type = String)]
    pub overtime_hours: Decimal,

    #[schema(value_type = String)]
    pub base_salary: Decimal,
    pub allowances: Allowances,
    pub deductions: Deductions,

    #[schema(value_type = String)]
    pub bonus_amount: Decimal,
    #[schema(value_type = String)]
    pub overtime_pay: Decimal,
    #[schema(value_type = String)]
    pub on_duty_pay: Decimal,

    #[schema(value_type = String)]
    pub gross_pay: Decimal,
    #[schema(value_type = String)]
    pub total_deductions: Decimal,
    #[schema(value_type = String)]
    pub net_pay: Decimal,
}

/// A persisted revision of a salary result.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoredSalaryResult {
    pub revision: u32,
    #[schema(value_type = String, format = "uuid")]
    pub run_id: Uuid,
    #[schema(value_type = String, format = "date-time")]
    pub calculated_at: NaiveDateTime,
    #[serde(flatten)]
    pub result: MonthlySalaryResult,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_days_cover_whole_month() {
        let feb_leap = PayrollPeriod::new(2024, 2).unwrap();
        assert_eq!(feb_leap.days().unwrap().len(), 29);

        let dec = PayrollPeriod::new(2023, 12).unwrap();
        let days = dec.days().unwrap();
        assert_eq!(days.len(), 31);
        assert_eq!(days.last().copied(), NaiveDate::from_ymd_opt(2023, 12, 31));
    }

    #[test]
    fn rejects_invalid_month() {
        assert!(PayrollPeriod::new(2024, 13).is_err());
        assert!(PayrollPeriod::new(2024, 0).is_err());
    }

    #[test]
    fn period_displays_zero_padded() {
        assert_eq!(PayrollPeriod::new(2024, 3).unwrap().to_string(), "2024-03");
    }
}
