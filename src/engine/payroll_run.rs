use std::collections::HashMap;

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::engine::aggregator::aggregate;
use crate::engine::calendar::CalendarResolver;
use crate::engine::evaluator::evaluate;
use crate::engine::salary::calculate;
use crate::engine::shift::ShiftRegistry;
use crate::error::AttendanceError;
use crate::model::attendance::{DailyAttendanceRecord, PunchEvent, PunchType};
use crate::model::calendar::{CalendarException, OnDutyEntry, WeeklyOffConfig};
use crate::model::payroll::{MonthlySalaryResult, PayrollPeriod};
use crate::model::salary_rule::SalaryRuleSet;
use crate::model::staff::Staff;

/// Configuration read once at the start of an evaluation or payroll run.
#[derive(Debug, Clone, Default)]
pub struct ConfigSnapshot {
    pub shifts: ShiftRegistry,
    pub exceptions: Vec<CalendarException>,
    pub weekly_off: WeeklyOffConfig,
    pub rules: SalaryRuleSet,
}

impl ConfigSnapshot {
    pub fn resolver(&self) -> CalendarResolver<'_> {
        CalendarResolver::new(&self.exceptions, self.weekly_off)
    }
}

/// Everything the run needs about one staff member for one month.
#[derive(Debug, Clone)]
pub struct StaffMonthInput {
    pub staff: Staff,
    pub punches: Vec<PunchEvent>,
    pub on_duty: Vec<OnDutyEntry>,
}

#[derive(Debug, Clone)]
pub struct StaffMonthOutcome {
    pub records: Vec<DailyAttendanceRecord>,
    pub result: MonthlySalaryResult,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DayError {
    #[schema(value_type = Option<String>, format = "date")]
    pub date: Option<NaiveDate>,
    pub kind: String,
    pub message: String,
}

impl DayError {
    fn new(date: Option<NaiveDate>, err: &AttendanceError) -> Self {
        Self {
            date,
            kind: err.kind().to_string(),
            message: err.to_string(),
        }
    }
}

/// A staff member whose payroll could not be produced, with every cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct StaffFailure {
    pub staff_id: u64,
    pub errors: Vec<DayError>,
}

impl StaffFailure {
    /// A failure not tied to any single day, such as loading or storing.
    pub fn whole_month(staff_id: u64, kind: &str, message: impl Into<String>) -> Self {
        Self {
            staff_id,
            errors: vec![DayError {
                date: None,
                kind: kind.to_string(),
                message: message.into(),
            }],
        }
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub run_id: Uuid,
    pub period: PayrollPeriod,
    pub successes: Vec<StaffMonthOutcome>,
    pub failures: Vec<StaffFailure>,
}

type DayPunchTimes = (Option<NaiveTime>, Option<NaiveTime>);

fn punch_times_by_day(punches: &[PunchEvent]) -> HashMap<NaiveDate, DayPunchTimes> {
    let mut by_day: HashMap<NaiveDate, DayPunchTimes> = HashMap::new();
    for punch in punches {
        let entry = by_day.entry(punch.punch_date).or_default();
        let time = punch.punched_at.time();
        match punch.punch_type {
            PunchType::CheckIn => entry.0 = Some(time),
            PunchType::CheckOut => entry.1 = Some(time),
        }
    }
    by_day
}

/// Recomputes a single day for one staff member.
pub fn evaluate_staff_day(
    snapshot: &ConfigSnapshot,
    staff: &Staff,
    on_duty: &[OnDutyEntry],
    punches: &[PunchEvent],
    date: NaiveDate,
) -> Result<DailyAttendanceRecord, AttendanceError> {
    let timing = snapshot.shifts.effective_timing(staff.shift_type.as_deref())?;
    let classification = snapshot
        .resolver()
        .resolve_for_staff(&staff.department, on_duty, date);
    let (check_in, check_out) = punch_times_by_day(punches)
        .get(&date)
        .copied()
        .unwrap_or_default();

    evaluate(staff.id, date, classification, &timing, check_in, check_out)
}

/// Evaluates every day of the month, aggregates and calculates salary.
///
/// Day-level failures are all collected; a staff member with any failed day
/// gets no salary result.
pub fn run_staff_month(
    snapshot: &ConfigSnapshot,
    period: PayrollPeriod,
    input: &StaffMonthInput,
) -> Result<StaffMonthOutcome, StaffFailure> {
    let staff = &input.staff;
    let fail = |errors: Vec<DayError>| StaffFailure {
        staff_id: staff.id,
        errors,
    };

    let days = period.days().map_err(|e| fail(vec![DayError::new(None, &e)]))?;
    let timing = snapshot
        .shifts
        .effective_timing(staff.shift_type.as_deref())
        .map_err(|e| fail(vec![DayError::new(None, &e)]))?;

    let resolver = snapshot.resolver();
    let punches = punch_times_by_day(&input.punches);

    let mut records = Vec::with_capacity(days.len());
    let mut errors = Vec::new();
    for date in days {
        let classification = resolver.resolve_for_staff(&staff.department, &input.on_duty, date);
        let (check_in, check_out) = punches.get(&date).copied().unwrap_or_default();

        match evaluate(staff.id, date, classification, &timing, check_in, check_out) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(staff_id = staff.id, %date, error = %e, "Day evaluation failed");
                errors.push(DayError::new(Some(date), &e));
            }
        }
    }

    if !errors.is_empty() {
        return Err(fail(errors));
    }

    let totals = aggregate(&records);
    debug!(staff_id = staff.id, ?totals, "Month aggregated");

    let result = calculate(staff.id, period, &staff.salary, &totals, &snapshot.rules)
        .map_err(|e| fail(vec![DayError::new(None, &e)]))?;

    Ok(StaffMonthOutcome { records, result })
}

/// Runs payroll for many staff members. One failure never stops the rest;
/// staff whose month could not be loaded are reported as they are.
#[instrument(name = "payroll_batch", skip_all, fields(period = %period, staff = inputs.len()))]
pub fn run_batch(
    snapshot: &ConfigSnapshot,
    period: PayrollPeriod,
    inputs: Vec<Result<StaffMonthInput, StaffFailure>>,
) -> BatchOutcome {
    let run_id = Uuid::new_v4();
    let mut successes = Vec::new();
    let mut failures = Vec::new();

    for input in inputs {
        let computed = input.and_then(|input| run_staff_month(snapshot, period, &input));
        match computed {
            Ok(outcome) => successes.push(outcome),
            Err(failure) => failures.push(failure),
        }
    }

    info!(
        %run_id,
        succeeded = successes.len(),
        failed = failures.len(),
        "Payroll batch computed"
    );

    BatchOutcome {
        run_id,
        period,
        successes,
        failures,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use crate::model::calendar::ExceptionScope;
    use crate::model::salary_rule::{ABSENT_DAY_DEDUCTION_RATE, LATE_ARRIVAL_PENALTY_PER_HOUR};
    use crate::model::shift::{InstitutionDefaultTiming, ShiftDefinition};
    use crate::model::staff::SalaryComponents;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn staff(id: u64, department: &str, shift_type: Option<&str>) -> Staff {
        Staff {
            id,
            staff_code: format!("STF-{id}"),
            full_name: format!("Staff {id}"),
            department: department.into(),
            shift_type: shift_type.map(str::to_string),
            active: true,
            salary: SalaryComponents {
                base_salary: dec!(20000),
                ..SalaryComponents::default()
            },
        }
    }

    fn punch(staff_id: u64, date: NaiveDate, punch_type: PunchType, time: NaiveTime) -> PunchEvent {
        PunchEvent {
            staff_id,
            punch_date: date,
            punch_type,
            punched_at: date.and_time(time),
            method: "biometric".into(),
        }
    }

    fn full_day(staff_id: u64, date: NaiveDate) -> Vec<PunchEvent> {
        vec![
            punch(staff_id, date, PunchType::CheckIn, t(9, 0)),
            punch(staff_id, date, PunchType::CheckOut, t(17, 0)),
        ]
    }

    fn snapshot() -> ConfigSnapshot {
        ConfigSnapshot {
            shifts: ShiftRegistry::new(
                vec![ShiftDefinition {
                    shift_type: "morning".into(),
                    start_time: t(9, 0),
                    end_time: t(17, 0),
                    grace_minutes: 10,
                }],
                None,
            ),
            exceptions: vec![CalendarException {
                id: 1,
                name: "Republic Day".into(),
                start_date: d(2024, 1, 26),
                end_date: d(2024, 1, 26),
                scope: ExceptionScope::InstitutionWide,
                departments: vec![],
                active: true,
                updated_at: None,
            }],
            weekly_off: WeeklyOffConfig { sunday: true },
            rules: SalaryRuleSet::default()
                .with_rule(ABSENT_DAY_DEDUCTION_RATE, dec!(1))
                .with_rule(LATE_ARRIVAL_PENALTY_PER_HOUR, dec!(60)),
        }
    }

    /// Every weekday of January 2024 except the holiday.
    fn january_workdays() -> Vec<NaiveDate> {
        PayrollPeriod::new(2024, 1)
            .unwrap()
            .days()
            .unwrap()
            .into_iter()
            .filter(|date| {
                snapshot().resolver().resolve("IT", *date)
                    == crate::model::calendar::CalendarClassification::Workday
            })
            .collect()
    }

    #[test]
    fn january_has_expected_calendar() {
        // 31 days, 4 Sundays, one holiday
        assert_eq!(january_workdays().len(), 26);
    }

    #[test]
    fn full_month_with_absences_and_late_day() {
        let period = PayrollPeriod::new(2024, 1).unwrap();
        let workdays = january_workdays();
        let mut punches = Vec::new();
        for date in workdays.iter().skip(2) {
            punches.extend(full_day(7, *date));
        }
        // late on the third workday
        punches.retain(|p| !(p.punch_date == workdays[2] && p.punch_type == PunchType::CheckIn));
        punches.push(punch(7, workdays[2], PunchType::CheckIn, t(9, 46)));
        // punched in on the holiday anyway
        punches.push(punch(7, d(2024, 1, 26), PunchType::CheckIn, t(9, 10)));

        let input = StaffMonthInput {
            staff: staff(7, "IT", Some("morning")),
            punches,
            on_duty: vec![],
        };
        let outcome = run_staff_month(&snapshot(), period, &input).unwrap();

        assert_eq!(outcome.records.len(), 31);
        let holiday = outcome
            .records
            .iter()
            .find(|r| r.date == d(2024, 1, 26))
            .unwrap();
        assert_eq!(holiday.status, AttendanceStatus::Holiday);
        assert_eq!(holiday.late_by_minutes, 0);

        let result = outcome.result;
        assert_eq!(result.working_days, 26);
        assert_eq!(result.days_absent, 2);
        assert_eq!(result.days_late, 1);
        assert_eq!(result.days_present, 23);
        assert_eq!(result.days_holiday, 1);
        assert_eq!(result.days_weekly_off, 4);
        assert_eq!(result.deductions.late_penalty, dec!(46));
        // 2 × 20000 / 26
        assert_eq!(result.deductions.absence_deduction, dec!(1538.46));
        assert_eq!(result.net_pay, result.gross_pay - result.total_deductions);
    }

    #[test]
    fn on_duty_days_are_paid_and_not_absent() {
        let period = PayrollPeriod::new(2024, 1).unwrap();
        let input = StaffMonthInput {
            staff: staff(8, "HR", Some("morning")),
            punches: vec![],
            on_duty: vec![OnDutyEntry {
                id: 1,
                staff_id: 8,
                start_date: d(2024, 1, 2),
                end_date: d(2024, 1, 3),
                reason: "inspection".into(),
                active: true,
            }],
        };
        let outcome = run_staff_month(&snapshot(), period, &input).unwrap();
        assert_eq!(outcome.result.days_on_duty, 2);
        assert_eq!(outcome.result.days_absent, 24);
        assert!(outcome.result.on_duty_pay > dec!(0));
    }

    #[test]
    fn configuration_gap_fails_only_that_staff() {
        let period = PayrollPeriod::new(2024, 1).unwrap();
        let inputs = vec![
            StaffMonthInput {
                staff: staff(1, "IT", Some("morning")),
                punches: vec![],
                on_duty: vec![],
            },
            StaffMonthInput {
                staff: staff(2, "IT", Some("night")),
                punches: vec![],
                on_duty: vec![],
            },
        ];

        let batch = run_batch(&snapshot(), period, inputs.into_iter().map(Ok).collect());
        assert_eq!(batch.successes.len(), 1);
        assert_eq!(batch.successes[0].result.staff_id, 1);
        assert_eq!(batch.failures.len(), 1);
        assert_eq!(batch.failures[0].staff_id, 2);
        assert_eq!(batch.failures[0].errors[0].kind, "configuration_gap");
    }

    #[test]
    fn bad_day_records_are_collected_per_day() {
        let period = PayrollPeriod::new(2024, 1).unwrap();
        let bad_days = [d(2024, 1, 3), d(2024, 1, 4)];
        let mut punches = Vec::new();
        for date in bad_days {
            punches.push(punch(3, date, PunchType::CheckIn, t(12, 0)));
            punches.push(punch(3, date, PunchType::CheckOut, t(10, 0)));
        }
        let inputs = vec![
            StaffMonthInput {
                staff: staff(3, "IT", Some("morning")),
                punches,
                on_duty: vec![],
            },
            StaffMonthInput {
                staff: staff(4, "IT", Some("morning")),
                punches: full_day(4, d(2024, 1, 3)),
                on_duty: vec![],
            },
        ];

        let batch = run_batch(&snapshot(), period, inputs.into_iter().map(Ok).collect());
        assert_eq!(batch.successes.len(), 1);
        let failure = &batch.failures[0];
        assert_eq!(failure.staff_id, 3);
        assert_eq!(
            failure.errors.iter().map(|e| e.date).collect::<Vec<_>>(),
            vec![Some(bad_days[0]), Some(bad_days[1])]
        );
        assert!(failure.errors.iter().all(|e| e.kind == "validation_error"));
    }

    #[test]
    fn unloadable_staff_is_reported_and_the_rest_still_run() {
        let period = PayrollPeriod::new(2024, 1).unwrap();
        let inputs = vec![
            Err(StaffFailure::whole_month(10, "load_error", "Internal Server Error")),
            Ok(StaffMonthInput {
                staff: staff(11, "IT", Some("morning")),
                punches: full_day(11, d(2024, 1, 3)),
                on_duty: vec![],
            }),
        ];

        let batch = run_batch(&snapshot(), period, inputs);
        assert_eq!(batch.successes.len(), 1);
        assert_eq!(batch.successes[0].result.staff_id, 11);
        assert_eq!(
            batch.failures,
            vec![StaffFailure {
                staff_id: 10,
                errors: vec![DayError {
                    date: None,
                    kind: "load_error".into(),
                    message: "Internal Server Error".into(),
                }],
            }]
        );
    }

    #[actix_web::test]
    async fn day_record_follows_each_accepted_punch() {
        use crate::engine::gate::memory::InMemoryPunchLedger;
        use crate::engine::gate::{PunchLedger, PunchRequest, VerificationGate, check_punch};

        let gate = VerificationGate::new(InMemoryPunchLedger::default());
        let date = d(2024, 1, 10);
        let member = staff(12, "IT", Some("morning"));
        let submit = |punch_type, time: NaiveTime| PunchRequest {
            staff_id: 12,
            punch_date: date,
            punch_type,
            punched_at: date.and_time(time),
            method: "biometric".into(),
        };
        let stored = |gate: &VerificationGate<InMemoryPunchLedger>| {
            let day = gate.ledger().day(12, date);
            [day.check_in, day.check_out].into_iter().flatten().collect::<Vec<_>>()
        };

        gate.accept(submit(PunchType::CheckIn, t(9, 20))).await.unwrap();
        let record = evaluate_staff_day(&snapshot(), &member, &[], &stored(&gate), date).unwrap();
        assert_eq!(record.status, AttendanceStatus::Late);
        assert_eq!(record.check_in, Some(t(9, 20)));
        assert_eq!(record.check_out, None);

        gate.accept(submit(PunchType::CheckOut, t(17, 20))).await.unwrap();
        let record = evaluate_staff_day(&snapshot(), &member, &[], &stored(&gate), date).unwrap();
        assert_eq!(record.check_out, Some(t(17, 20)));
        assert_eq!(record.worked_minutes, 480);

        // a rejected punch leaves the derived day as it was
        assert!(
            gate.ledger()
                .insert_checked(&submit(PunchType::CheckOut, t(18, 0)), check_punch)
                .await
                .is_err()
        );
        let again = evaluate_staff_day(&snapshot(), &member, &[], &stored(&gate), date).unwrap();
        assert_eq!(again, record);
    }

    #[test]
    fn rerun_is_identical() {
        let period = PayrollPeriod::new(2024, 1).unwrap();
        let input = StaffMonthInput {
            staff: staff(5, "IT", Some("morning")),
            punches: full_day(5, d(2024, 1, 10)),
            on_duty: vec![],
        };
        let first = run_staff_month(&snapshot(), period, &input).unwrap();
        let second = run_staff_month(&snapshot(), period, &input).unwrap();
        assert_eq!(first.records, second.records);
        assert_eq!(first.result, second.result);
    }

    #[test]
    fn single_day_uses_institution_default_without_shift() {
        let mut config = snapshot();
        config.shifts = ShiftRegistry::new(
            vec![],
            Some(InstitutionDefaultTiming {
                start_time: t(8, 30),
                end_time: t(16, 30),
                grace_minutes: 0,
            }),
        );
        let date = d(2024, 1, 10);
        let punches = vec![punch(6, date, PunchType::CheckIn, t(8, 45))];

        let record = evaluate_staff_day(&config, &staff(6, "IT", None), &[], &punches, date).unwrap();
        assert_eq!(record.status, AttendanceStatus::Late);
        assert_eq!(record.late_by_minutes, 15);
        assert_eq!(record.shift_start, t(8, 30));
    }
}
