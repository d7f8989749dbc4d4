use chrono::{Datelike, NaiveDate, Weekday};
use tracing::warn;

use crate::model::calendar::{
    CalendarClassification, CalendarException, ExceptionScope, OnDutyEntry, WeeklyOffConfig,
};

/// One step of the calendar precedence list.
struct PrecedenceRule {
    name: &'static str,
    classification: CalendarClassification,
    matches: fn(&CalendarResolver<'_>, &str, NaiveDate) -> bool,
}

/// Evaluated top-down, first match wins. The order is a business rule.
const PRECEDENCE: [PrecedenceRule; 4] = [
    PrecedenceRule {
        name: "institution_holiday",
        classification: CalendarClassification::InstitutionHoliday,
        matches: institution_holiday,
    },
    PrecedenceRule {
        name: "department_holiday",
        classification: CalendarClassification::DepartmentHoliday,
        matches: department_holiday,
    },
    PrecedenceRule {
        name: "common_leave",
        classification: CalendarClassification::CommonLeave,
        matches: common_leave,
    },
    PrecedenceRule {
        name: "weekly_off",
        classification: CalendarClassification::WeeklyOff,
        matches: weekly_off,
    },
];

fn institution_holiday(resolver: &CalendarResolver<'_>, _: &str, date: NaiveDate) -> bool {
    resolver.any_covering(ExceptionScope::InstitutionWide, date)
}

fn department_holiday(resolver: &CalendarResolver<'_>, department: &str, date: NaiveDate) -> bool {
    resolver.department_holiday(department, date)
}

fn common_leave(resolver: &CalendarResolver<'_>, _: &str, date: NaiveDate) -> bool {
    resolver.any_covering(ExceptionScope::CommonLeave, date)
}

fn weekly_off(resolver: &CalendarResolver<'_>, _: &str, date: NaiveDate) -> bool {
    resolver.weekly_off.sunday && date.weekday() == Weekday::Sun
}

/// Classifies days against a snapshot of calendar exceptions and the
/// weekly-off setting. Holds no state of its own.
pub struct CalendarResolver<'a> {
    exceptions: &'a [CalendarException],
    weekly_off: WeeklyOffConfig,
}

impl<'a> CalendarResolver<'a> {
    pub fn new(exceptions: &'a [CalendarException], weekly_off: WeeklyOffConfig) -> Self {
        Self {
            exceptions,
            weekly_off,
        }
    }

    pub fn resolve(&self, staff_department: &str, date: NaiveDate) -> CalendarClassification {
        PRECEDENCE
            .iter()
            .find(|rule| (rule.matches)(self, staff_department, date))
            .map(|rule| {
                tracing::trace!(rule = rule.name, %date, "calendar rule matched");
                rule.classification
            })
            .unwrap_or(CalendarClassification::Workday)
    }

    /// Like [`resolve`](Self::resolve), but a workday covered by an approved
    /// on-duty entry becomes `OnDuty`.
    pub fn resolve_for_staff(
        &self,
        staff_department: &str,
        on_duty: &[OnDutyEntry],
        date: NaiveDate,
    ) -> CalendarClassification {
        match self.resolve(staff_department, date) {
            CalendarClassification::Workday if on_duty.iter().any(|e| e.covers(date)) => {
                CalendarClassification::OnDuty
            }
            other => other,
        }
    }

    fn any_covering(&self, scope: ExceptionScope, date: NaiveDate) -> bool {
        self.exceptions
            .iter()
            .any(|e| e.scope == scope && e.covers(date))
    }

    fn department_holiday(&self, department: &str, date: NaiveDate) -> bool {
        if department.is_empty() {
            return false;
        }

        let mut matched = false;
        for exception in self
            .exceptions
            .iter()
            .filter(|e| e.scope == ExceptionScope::DepartmentSpecific && e.covers(date))
        {
            if exception.departments.iter().any(|d| d == department) {
                matched = true;
                break;
            }

            // exact match only; surface likely typos
            if let Some(near) = exception
                .departments
                .iter()
                .find(|d| d.trim().eq_ignore_ascii_case(department.trim()))
            {
                warn!(
                    exception_id = exception.id,
                    listed = %near,
                    staff_department = %department,
                    "Department name differs only by case/whitespace; holiday not applied"
                );
            }
        }
        matched
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn exception(
        id: u64,
        scope: ExceptionScope,
        start: NaiveDate,
        end: NaiveDate,
        departments: &[&str],
    ) -> CalendarException {
        CalendarException {
            id,
            name: format!("exception-{id}"),
            start_date: start,
            end_date: end,
            scope,
            departments: departments.iter().map(|s| s.to_string()).collect(),
            active: true,
            updated_at: None,
        }
    }

    const SUNDAY_OFF: WeeklyOffConfig = WeeklyOffConfig { sunday: true };

    #[test]
    fn ordinary_weekday_is_workday() {
        let resolver = CalendarResolver::new(&[], SUNDAY_OFF);
        // 2024-01-25 is a Thursday
        assert_eq!(
            resolver.resolve("IT", d(2024, 1, 25)),
            CalendarClassification::Workday
        );
    }

    #[test]
    fn institution_holiday_beats_everything() {
        // 2024-01-28 is a Sunday
        let day = d(2024, 1, 28);
        let exceptions = vec![
            exception(1, ExceptionScope::CommonLeave, day, day, &[]),
            exception(2, ExceptionScope::DepartmentSpecific, day, day, &["IT"]),
            exception(3, ExceptionScope::InstitutionWide, day, day, &[]),
        ];
        let resolver = CalendarResolver::new(&exceptions, SUNDAY_OFF);
        assert_eq!(
            resolver.resolve("IT", day),
            CalendarClassification::InstitutionHoliday
        );
    }

    #[test]
    fn department_holiday_beats_common_leave_and_weekly_off() {
        let day = d(2024, 1, 28);
        let exceptions = vec![
            exception(1, ExceptionScope::CommonLeave, day, day, &[]),
            exception(2, ExceptionScope::DepartmentSpecific, day, day, &["IT", "Admin"]),
        ];
        let resolver = CalendarResolver::new(&exceptions, SUNDAY_OFF);
        assert_eq!(
            resolver.resolve("IT", day),
            CalendarClassification::DepartmentHoliday
        );
        assert_eq!(resolver.resolve("HR", day), CalendarClassification::CommonLeave);
    }

    #[test]
    fn common_leave_beats_weekly_off() {
        let day = d(2024, 1, 28);
        let exceptions = vec![exception(1, ExceptionScope::CommonLeave, day, day, &[])];
        let resolver = CalendarResolver::new(&exceptions, SUNDAY_OFF);
        assert_eq!(resolver.resolve("HR", day), CalendarClassification::CommonLeave);
    }

    #[test]
    fn sunday_is_weekly_off_only_when_enabled() {
        let sunday = d(2024, 1, 28);
        assert_eq!(
            CalendarResolver::new(&[], SUNDAY_OFF).resolve("HR", sunday),
            CalendarClassification::WeeklyOff
        );
        assert_eq!(
            CalendarResolver::new(&[], WeeklyOffConfig { sunday: false }).resolve("HR", sunday),
            CalendarClassification::Workday
        );
    }

    #[test]
    fn department_holiday_does_not_leak_across_departments() {
        let day = d(2024, 2, 14);
        let exceptions = vec![exception(
            1,
            ExceptionScope::DepartmentSpecific,
            day,
            day,
            &["IT"],
        )];
        let resolver = CalendarResolver::new(&exceptions, SUNDAY_OFF);
        assert_eq!(resolver.resolve("HR", day), CalendarClassification::Workday);
        assert_eq!(
            resolver.resolve("IT", day),
            CalendarClassification::DepartmentHoliday
        );
    }

    #[test]
    fn department_matching_is_exact() {
        let day = d(2024, 2, 14);
        let exceptions = vec![exception(
            1,
            ExceptionScope::DepartmentSpecific,
            day,
            day,
            &["it "],
        )];
        let resolver = CalendarResolver::new(&exceptions, SUNDAY_OFF);
        assert_eq!(resolver.resolve("IT", day), CalendarClassification::Workday);
    }

    #[test]
    fn empty_department_never_matches_department_holiday() {
        let day = d(2024, 2, 14);
        let exceptions = vec![exception(
            1,
            ExceptionScope::DepartmentSpecific,
            day,
            day,
            &[""],
        )];
        let resolver = CalendarResolver::new(&exceptions, SUNDAY_OFF);
        assert_eq!(resolver.resolve("", day), CalendarClassification::Workday);
    }

    #[test]
    fn inactive_exceptions_are_ignored() {
        let day = d(2024, 1, 26);
        let mut holiday = exception(1, ExceptionScope::InstitutionWide, day, day, &[]);
        holiday.active = false;
        let exceptions = vec![holiday];
        let resolver = CalendarResolver::new(&exceptions, SUNDAY_OFF);
        assert_eq!(resolver.resolve("HR", day), CalendarClassification::Workday);
    }

    #[test]
    fn on_duty_applies_only_to_workdays() {
        let holiday = d(2024, 1, 26);
        let workday = d(2024, 1, 25);
        let exceptions = vec![exception(
            1,
            ExceptionScope::InstitutionWide,
            holiday,
            holiday,
            &[],
        )];
        let on_duty = vec![OnDutyEntry {
            id: 1,
            staff_id: 7,
            start_date: workday,
            end_date: holiday,
            reason: "exam duty".into(),
            active: true,
        }];
        let resolver = CalendarResolver::new(&exceptions, SUNDAY_OFF);

        assert_eq!(
            resolver.resolve_for_staff("HR", &on_duty, workday),
            CalendarClassification::OnDuty
        );
        assert_eq!(
            resolver.resolve_for_staff("HR", &on_duty, holiday),
            CalendarClassification::InstitutionHoliday
        );
    }
}
