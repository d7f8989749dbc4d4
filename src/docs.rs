use crate::api::attendance::PeriodQuery;
use crate::api::payroll::{BatchRunResponse, BatchSuccess, CalculationResponse};
use crate::api::settings::{ExceptionFilter, SalaryRulesUpdate};
use crate::engine::gate::PunchRequest;
use crate::engine::payroll_run::{DayError, StaffFailure};
use crate::model::attendance::{
    AttendanceAnomaly, AttendanceStatus, DailyAttendanceRecord, PunchEvent, PunchType,
};
use crate::model::calendar::{CalendarException, ExceptionScope, OnDutyEntry, WeeklyOffConfig};
use crate::model::payroll::{
    Allowances, Deductions, MonthlySalaryResult, PayrollPeriod, StoredSalaryResult,
};
use crate::model::salary_rule::SalaryRuleSet;
use crate::model::shift::{InstitutionDefaultTiming, ShiftDefinition};
use crate::model::staff::{SalaryComponents, Staff};
use crate::repo::calendar::{CalendarExceptionInput, OnDutyInput};
use crate::repo::staff::CreateStaff;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance & Payroll API",
        version = "1.0.0",
        description = r#"
## Staff Attendance & Payroll

Decides, for every staff member and day, whether they were present, late,
absent, on holiday, on weekly off or on duty, measures how early or late they
were against their shift, and turns a month of such days into a salary.

### Key Features
- **Verification Gate**
  - At most one check-in and one check-out per staff member per day
  - Rejections carry a stable `reason` code (`missing_checkin`, `already_checked_in`, `already_checked_out`)
- **Daily Records**
  - Derived from punches, shift timing and the institution calendar; recomputable at any time
- **Payroll**
  - Per staff member or for every active staff member, each calculation stored as a new revision
- **Settings**
  - Shifts, institution default timing, calendar exceptions, weekly off, salary rules

### Response Format
- JSON with snake_case fields; money values are decimal strings
- Errors: `{"message": "...", "reason": "..."}`

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::attendance::submit_punch,
        crate::api::attendance::list_records,
        crate::api::attendance::recompute_day,

        crate::api::payroll::calculate_staff,
        crate::api::payroll::run_payroll,
        crate::api::payroll::get_latest_result,
        crate::api::payroll::list_result_revisions,

        crate::api::staff::create_staff,
        crate::api::staff::list_staff,
        crate::api::staff::get_staff,
        crate::api::staff::update_staff,
        crate::api::staff::list_on_duty,
        crate::api::staff::create_on_duty,
        crate::api::staff::deactivate_on_duty,

        crate::api::settings::list_shifts,
        crate::api::settings::upsert_shift,
        crate::api::settings::get_default_timing,
        crate::api::settings::set_default_timing,
        crate::api::settings::list_exceptions,
        crate::api::settings::create_exception,
        crate::api::settings::get_exception,
        crate::api::settings::update_exception,
        crate::api::settings::deactivate_exception,
        crate::api::settings::get_weekly_off,
        crate::api::settings::set_weekly_off,
        crate::api::settings::get_salary_rules,
        crate::api::settings::update_salary_rules
    ),
    components(
        schemas(
            PunchRequest,
            PunchEvent,
            PunchType,
            AttendanceStatus,
            AttendanceAnomaly,
            DailyAttendanceRecord,
            PeriodQuery,
            PayrollPeriod,
            Allowances,
            Deductions,
            MonthlySalaryResult,
            StoredSalaryResult,
            CalculationResponse,
            BatchSuccess,
            BatchRunResponse,
            DayError,
            StaffFailure,
            Staff,
            SalaryComponents,
            CreateStaff,
            OnDutyEntry,
            OnDutyInput,
            ShiftDefinition,
            InstitutionDefaultTiming,
            CalendarException,
            CalendarExceptionInput,
            ExceptionScope,
            ExceptionFilter,
            WeeklyOffConfig,
            SalaryRuleSet,
            SalaryRulesUpdate
        )
    ),
    tags(
        (name = "Attendance", description = "Punch submission and daily attendance records"),
        (name = "Payroll", description = "Monthly salary calculation and results"),
        (name = "Staff", description = "Staff profiles, salary components and on-duty entries"),
        (name = "Settings", description = "Shift, calendar and salary rule configuration"),
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn openapi_lists_punch_and_payroll_paths() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/v1/attendance/punch"));
        assert!(doc.paths.paths.contains_key("/api/v1/payroll/run"));
        assert!(doc.paths.paths.contains_key("/api/v1/settings/calendar/{exception_id}"));
    }
}
