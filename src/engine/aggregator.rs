use rust_decimal::Decimal;

use crate::model::attendance::{AttendanceStatus, DailyAttendanceRecord};
use crate::model::payroll::MonthlyTotals;
use crate::model::shift::{standard_hours, standard_minutes};

fn minutes_to_hours(minutes: u64) -> Decimal {
    Decimal::from(minutes) / Decimal::from(60)
}

/// Sums one staff member's daily records for a month.
///
/// Hours are accumulated as whole minutes and converted once, so the
/// per-day display rounding of `hours_worked` never reaches pay.
pub fn aggregate(records: &[DailyAttendanceRecord]) -> MonthlyTotals {
    let mut totals = MonthlyTotals::default();
    let mut worked_minutes = 0u64;
    let mut overtime_minutes = 0u64;

    for record in records {
        match record.status {
            AttendanceStatus::Present => totals.days_present += 1,
            AttendanceStatus::Late => totals.days_late += 1,
            AttendanceStatus::Absent => totals.days_absent += 1,
            AttendanceStatus::Holiday => totals.days_holiday += 1,
            AttendanceStatus::OnLeave => totals.days_on_leave += 1,
            AttendanceStatus::WeeklyOff => totals.days_weekly_off += 1,
            AttendanceStatus::OnDuty => totals.days_on_duty += 1,
        }

        if record.status.is_working_day() {
            totals.working_days += 1;
            totals.standard_working_hours += standard_hours(record.shift_start, record.shift_end);
        }

        worked_minutes += u64::from(record.worked_minutes);
        if record.status.is_attended() {
            let standard = standard_minutes(record.shift_start, record.shift_end);
            overtime_minutes += u64::from(record.worked_minutes.saturating_sub(standard));
        }

        totals.total_late_minutes += u64::from(record.late_by_minutes);
        totals.total_early_departure_minutes += u64::from(record.early_departure_by_minutes);
        totals.total_early_arrival_minutes += u64::from(record.early_arrival_by_minutes);
        if record.early_arrival_by_minutes > 0 {
            totals.days_with_early_arrival += 1;
        }
    }

    totals.total_hours_worked = minutes_to_hours(worked_minutes);
    totals.overtime_hours = minutes_to_hours(overtime_minutes);
    totals
}
