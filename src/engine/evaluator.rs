use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;

use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceAnomaly, AttendanceStatus, DailyAttendanceRecord};
use crate::model::calendar::CalendarClassification;
use crate::model::shift::ShiftTiming;

/// Whole minutes from `earlier` to `later`, rounded down. Zero if not later.
fn minutes_between(later: NaiveTime, earlier: NaiveTime) -> u32 {
    // both times are within one day, so this always fits
    (later - earlier).num_minutes().max(0) as u32
}

fn terminal_status(classification: CalendarClassification) -> Option<AttendanceStatus> {
    match classification {
        CalendarClassification::Workday => None,
        CalendarClassification::InstitutionHoliday | CalendarClassification::DepartmentHoliday => {
            Some(AttendanceStatus::Holiday)
        }
        CalendarClassification::CommonLeave => Some(AttendanceStatus::OnLeave),
        CalendarClassification::WeeklyOff => Some(AttendanceStatus::WeeklyOff),
        CalendarClassification::OnDuty => Some(AttendanceStatus::OnDuty),
    }
}

/// Computes one day's attendance from its classification, the resolved
/// shift timing and the accepted punches.
///
/// Lateness is strict: any check-in after the shift start is late, whatever
/// grace period the timing carries.
pub fn evaluate(
    staff_id: u64,
    date: NaiveDate,
    classification: CalendarClassification,
    timing: &ShiftTiming,
    check_in: Option<NaiveTime>,
    check_out: Option<NaiveTime>,
) -> Result<DailyAttendanceRecord, AttendanceError> {
    if let (Some(ci), Some(co)) = (check_in, check_out) {
        if co < ci {
            return Err(AttendanceError::validation(format!(
                "check-out {co} is before check-in {ci} for staff {staff_id} on {date}"
            )));
        }
    }

    let mut record = DailyAttendanceRecord {
        staff_id,
        date,
        status: AttendanceStatus::Absent,
        check_in,
        check_out,
        late_by_minutes: 0,
        early_arrival_by_minutes: 0,
        early_departure_by_minutes: 0,
        worked_minutes: 0,
        hours_worked: Decimal::ZERO,
        shift_start: timing.start_time,
        shift_end: timing.end_time,
        anomaly: None,
    };

    if let Some(status) = terminal_status(classification) {
        record.status = status;
        return Ok(record);
    }

    let Some(ci) = check_in else {
        if check_out.is_some() {
            record.anomaly = Some(AttendanceAnomaly::CheckoutWithoutCheckin);
        }
        return Ok(record);
    };

    if ci > timing.start_time {
        record.status = AttendanceStatus::Late;
        record.late_by_minutes = minutes_between(ci, timing.start_time);
    } else {
        record.status = AttendanceStatus::Present;
        record.early_arrival_by_minutes = minutes_between(timing.start_time, ci);
    }

    if let Some(co) = check_out {
        if co < timing.end_time {
            record.early_departure_by_minutes = minutes_between(timing.end_time, co);
        }
        record.worked_minutes = minutes_between(co, ci);
        record.hours_worked = (Decimal::from(record.worked_minutes) / Decimal::from(60)).round_dp(2);
    }

    Ok(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::shift::TimingSource;
    use rust_decimal_macros::dec;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 25).unwrap()
    }

    fn nine_to_five(grace: u32) -> ShiftTiming {
        ShiftTiming::new(t(9, 0), t(17, 0), grace, TimingSource::Shift).unwrap()
    }

    fn workday(ci: Option<NaiveTime>, co: Option<NaiveTime>) -> DailyAttendanceRecord {
        evaluate(1, day(), CalendarClassification::Workday, &nine_to_five(10), ci, co).unwrap()
    }

    #[test]
    fn late_check_in_ignores_grace() {
        let record = workday(Some(t(9, 46)), None);
        assert_eq!(record.status, AttendanceStatus::Late);
        assert_eq!(record.late_by_minutes, 46);

        for grace in [0, 5, 10, 60, 120] {
            let record = evaluate(
                1,
                day(),
                CalendarClassification::Workday,
                &nine_to_five(grace),
                Some(t(9, 1)),
                None,
            )
            .unwrap();
            assert_eq!(record.status, AttendanceStatus::Late);
            assert_eq!(record.late_by_minutes, 1);
        }
    }

    #[test]
    fn late_minutes_round_down() {
        let ci = NaiveTime::from_hms_opt(9, 3, 59).unwrap();
        let record = workday(Some(ci), None);
        assert_eq!(record.status, AttendanceStatus::Late);
        assert_eq!(record.late_by_minutes, 3);
    }

    #[test]
    fn on_time_and_early_arrival() {
        let exact = workday(Some(t(9, 0)), Some(t(17, 0)));
        assert_eq!(exact.status, AttendanceStatus::Present);
        assert_eq!(exact.early_arrival_by_minutes, 0);
        assert_eq!(exact.late_by_minutes, 0);

        let early = workday(Some(t(8, 35)), Some(t(17, 0)));
        assert_eq!(early.status, AttendanceStatus::Present);
        assert_eq!(early.early_arrival_by_minutes, 25);
    }

    #[test]
    fn no_punches_on_workday_is_absent() {
        let record = workday(None, None);
        assert_eq!(record.status, AttendanceStatus::Absent);
        assert_eq!(record.anomaly, None);
        assert_eq!(record.hours_worked, Decimal::ZERO);
    }

    #[test]
    fn checkout_without_checkin_is_absent_anomaly() {
        let record = workday(None, Some(t(17, 5)));
        assert_eq!(record.status, AttendanceStatus::Absent);
        assert_eq!(record.check_out, Some(t(17, 5)));
        assert_eq!(record.anomaly, Some(AttendanceAnomaly::CheckoutWithoutCheckin));
    }

    #[test]
    fn early_departure_is_informational() {
        let record = workday(Some(t(9, 20)), Some(t(16, 30)));
        assert_eq!(record.status, AttendanceStatus::Late);
        assert_eq!(record.early_departure_by_minutes, 30);

        let record = workday(Some(t(8, 50)), Some(t(16, 0)));
        assert_eq!(record.status, AttendanceStatus::Present);
        assert_eq!(record.early_departure_by_minutes, 60);
    }

    #[test]
    fn hours_worked_from_both_punches() {
        let record = workday(Some(t(8, 30)), Some(t(18, 15)));
        assert_eq!(record.worked_minutes, 585);
        assert_eq!(record.hours_worked, dec!(9.75));

        let record = workday(Some(t(9, 0)), None);
        assert_eq!(record.hours_worked, Decimal::ZERO);
    }

    #[test]
    fn checkout_before_checkin_is_rejected() {
        let result = evaluate(
            1,
            day(),
            CalendarClassification::Workday,
            &nine_to_five(0),
            Some(t(12, 0)),
            Some(t(11, 0)),
        );
        assert!(matches!(result, Err(AttendanceError::Validation(_))));
    }

    #[test]
    fn non_workdays_never_absent_or_late() {
        let cases = [
            (CalendarClassification::InstitutionHoliday, AttendanceStatus::Holiday),
            (CalendarClassification::DepartmentHoliday, AttendanceStatus::Holiday),
            (CalendarClassification::CommonLeave, AttendanceStatus::OnLeave),
            (CalendarClassification::WeeklyOff, AttendanceStatus::WeeklyOff),
            (CalendarClassification::OnDuty, AttendanceStatus::OnDuty),
        ];
        let punches = [
            (None, None),
            (Some(t(9, 10)), None),
            (None, Some(t(15, 0))),
            (Some(t(10, 0)), Some(t(12, 0))),
        ];

        for (classification, expected) in cases {
            for (ci, co) in punches {
                let record =
                    evaluate(1, day(), classification, &nine_to_five(10), ci, co).unwrap();
                assert_eq!(record.status, expected);
                assert_eq!(record.late_by_minutes, 0);
                assert_eq!(record.early_departure_by_minutes, 0);
                assert_eq!(record.check_in, ci);
                assert_eq!(record.check_out, co);
            }
        }
    }

    #[test]
    fn holiday_check_in_records_time_without_penalty() {
        let holiday = NaiveDate::from_ymd_opt(2024, 1, 26).unwrap();
        let record = evaluate(
            1,
            holiday,
            CalendarClassification::InstitutionHoliday,
            &nine_to_five(10),
            Some(t(9, 10)),
            None,
        )
        .unwrap();
        assert_eq!(record.status, AttendanceStatus::Holiday);
        assert_eq!(record.check_in, Some(t(9, 10)));
        assert_eq!(record.late_by_minutes, 0);
    }

    #[test]
    fn snapshot_of_timing_is_kept() {
        let record = workday(Some(t(9, 0)), None);
        assert_eq!(record.shift_start, t(9, 0));
        assert_eq!(record.shift_end, t(17, 0));
    }
}
