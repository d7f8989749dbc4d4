use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;

use crate::error::AttendanceError;
use crate::model::payroll::{Allowances, Deductions, MonthlySalaryResult, MonthlyTotals, PayrollPeriod};
use crate::model::salary_rule::{
    ABSENT_DAY_DEDUCTION_RATE, EARLY_ARRIVAL_BONUS_PER_HOUR, EARLY_DEPARTURE_PENALTY_PER_HOUR,
    LATE_ARRIVAL_PENALTY_PER_HOUR, MINIMUM_HOURS_FOR_BONUS, ON_DUTY_RATE, OVERTIME_RATE_MULTIPLIER,
    SalaryRuleSet,
};
use crate::model::staff::SalaryComponents;

const MINUTES_PER_HOUR: Decimal = dec!(60);

/// `numerator / denominator`, or zero when the denominator is zero.
fn guarded_div(numerator: Decimal, denominator: Decimal) -> Decimal {
    if denominator.is_zero() {
        Decimal::ZERO
    } else {
        numerator / denominator
    }
}

/// Presentation rounding for itemized money fields.
fn money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Applies the rule set to a month of totals.
///
/// Intermediate rates keep full precision. Each itemized field is rounded
/// once, and gross, total deductions and net are summed from the rounded
/// items so that `net_pay == gross_pay - total_deductions` holds exactly.
pub fn calculate(
    staff_id: u64,
    period: PayrollPeriod,
    components: &SalaryComponents,
    totals: &MonthlyTotals,
    rules: &SalaryRuleSet,
) -> Result<MonthlySalaryResult, AttendanceError> {
    components.validate()?;
    rules.validate()?;

    let base = components.base_salary;
    let hourly_rate = guarded_div(base, totals.standard_working_hours);
    let daily_rate = guarded_div(base, Decimal::from(totals.working_days));

    let early_arrival_minutes = Decimal::from(totals.total_early_arrival_minutes);
    let bonus = if early_arrival_minutes / MINUTES_PER_HOUR > rules.get(MINIMUM_HOURS_FOR_BONUS) {
        early_arrival_minutes * rules.get(EARLY_ARRIVAL_BONUS_PER_HOUR) / MINUTES_PER_HOUR
    } else {
        Decimal::ZERO
    };

    let late_penalty = Decimal::from(totals.total_late_minutes)
        * rules.get(LATE_ARRIVAL_PENALTY_PER_HOUR)
        / MINUTES_PER_HOUR;
    let early_departure_penalty = Decimal::from(totals.total_early_departure_minutes)
        * rules.get(EARLY_DEPARTURE_PENALTY_PER_HOUR)
        / MINUTES_PER_HOUR;
    let absence_deduction =
        Decimal::from(totals.days_absent) * daily_rate * rules.get(ABSENT_DAY_DEDUCTION_RATE);
    let overtime_pay = totals.overtime_hours * hourly_rate * rules.get(OVERTIME_RATE_MULTIPLIER);
    let on_duty_pay = Decimal::from(totals.days_on_duty) * daily_rate * rules.get(ON_DUTY_RATE);

    let allowances = Allowances {
        hra: money(components.hra),
        transport: money(components.transport_allowance),
        other: money(components.other_allowances),
    };
    let deductions = Deductions {
        pf: money(components.pf),
        esi: money(components.esi),
        professional_tax: money(components.professional_tax),
        other: money(components.other_deductions),
        late_penalty: money(late_penalty),
        early_departure_penalty: money(early_departure_penalty),
        absence_deduction: money(absence_deduction),
    };

    let base_salary = money(base);
    let bonus_amount = money(bonus);
    let overtime_pay = money(overtime_pay);
    let on_duty_pay = money(on_duty_pay);

    let gross_pay = base_salary
        + allowances.hra
        + allowances.transport
        + allowances.other
        + bonus_amount
        + overtime_pay
        + on_duty_pay;
    let total_deductions = deductions.total();
    let net_pay = gross_pay - total_deductions;

    Ok(MonthlySalaryResult {
        staff_id,
        year: period.year,
        month: period.month,
        days_present: totals.days_present,
        days_absent: totals.days_absent,
        days_late: totals.days_late,
        days_on_leave: totals.days_on_leave,
        days_holiday: totals.days_holiday,
        days_weekly_off: totals.days_weekly_off,
        days_on_duty: totals.days_on_duty,
        working_days: totals.working_days,
        days_with_early_arrival: totals.days_with_early_arrival,
        total_hours_worked: totals.total_hours_worked.round_dp(2),
        overtime_hours: totals.overtime_hours.round_dp(2),
        base_salary,
        allowances,
        deductions,
        bonus_amount,
        overtime_pay,
        on_duty_pay,
        gross_pay,
        total_deductions,
        net_pay,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period() -> PayrollPeriod {
        PayrollPeriod::new(2024, 1).unwrap()
    }

    fn base_only(base: Decimal) -> SalaryComponents {
        SalaryComponents {
            base_salary: base,
            ..SalaryComponents::default()
        }
    }

    fn totals(working_days: u32) -> MonthlyTotals {
        MonthlyTotals {
            working_days,
            standard_working_hours: Decimal::from(working_days) * dec!(8),
            ..MonthlyTotals::default()
        }
    }

    #[test]
    fn absence_deduction_uses_working_days() {
        let mut month = totals(22);
        month.days_absent = 2;
        month.days_present = 20;
        let rules = SalaryRuleSet::default().with_rule(ABSENT_DAY_DEDUCTION_RATE, dec!(1.0));

        let result = calculate(7, period(), &base_only(dec!(20000)), &month, &rules).unwrap();
        assert_eq!(result.deductions.absence_deduction, dec!(1818.18));
        assert_eq!(result.net_pay, dec!(18181.82));
    }

    #[test]
    fn zero_working_days_yields_zero_rates() {
        let mut month = MonthlyTotals::default();
        month.days_absent = 3;
        month.days_on_duty = 2;
        month.overtime_hours = dec!(5);
        let rules = SalaryRuleSet::default();

        let result = calculate(7, period(), &base_only(dec!(20000)), &month, &rules).unwrap();
        assert_eq!(result.deductions.absence_deduction, Decimal::ZERO);
        assert_eq!(result.overtime_pay, Decimal::ZERO);
        assert_eq!(result.on_duty_pay, Decimal::ZERO);
        assert_eq!(result.gross_pay, dec!(20000));
    }

    #[test]
    fn penalties_are_per_minute_of_hourly_rate() {
        let mut month = totals(22);
        month.total_late_minutes = 90;
        month.total_early_departure_minutes = 30;
        let rules = SalaryRuleSet::default()
            .with_rule(LATE_ARRIVAL_PENALTY_PER_HOUR, dec!(100))
            .with_rule(EARLY_DEPARTURE_PENALTY_PER_HOUR, dec!(50));

        let result = calculate(7, period(), &base_only(dec!(20000)), &month, &rules).unwrap();
        assert_eq!(result.deductions.late_penalty, dec!(150));
        assert_eq!(result.deductions.early_departure_penalty, dec!(25));
    }

    #[test]
    fn bonus_requires_exceeding_minimum_hours() {
        let rules = SalaryRuleSet::default()
            .with_rule(EARLY_ARRIVAL_BONUS_PER_HOUR, dec!(120))
            .with_rule(MINIMUM_HOURS_FOR_BONUS, dec!(2));

        let mut month = totals(22);
        month.total_early_arrival_minutes = 120;
        let at_threshold = calculate(7, period(), &base_only(dec!(20000)), &month, &rules).unwrap();
        assert_eq!(at_threshold.bonus_amount, Decimal::ZERO);

        month.total_early_arrival_minutes = 150;
        month.days_with_early_arrival = 6;
        let above = calculate(7, period(), &base_only(dec!(20000)), &month, &rules).unwrap();
        assert_eq!(above.bonus_amount, dec!(300));
        assert_eq!(above.days_with_early_arrival, 6);
    }

    #[test]
    fn overtime_pay_uses_exact_minutes_over_the_month() {
        use crate::engine::{aggregator, evaluator};
        use crate::model::calendar::CalendarClassification;
        use crate::model::shift::{ShiftTiming, TimingSource};
        use chrono::{NaiveDate, NaiveTime};

        let t = |h, m| NaiveTime::from_hms_opt(h, m, 0).unwrap();
        let timing = ShiftTiming::new(t(9, 0), t(17, 0), 0, TimingSource::Shift).unwrap();
        let records: Vec<_> = (1..=20)
            .map(|day| {
                let date = NaiveDate::from_ymd_opt(2024, 1, day).unwrap();
                evaluator::evaluate(
                    7,
                    date,
                    CalendarClassification::Workday,
                    &timing,
                    Some(t(9, 0)),
                    Some(t(17, 7)),
                )
                .unwrap()
            })
            .collect();
        let month = aggregator::aggregate(&records);

        // hourly = 16000 / 160 = 100; 20 x 7 min = 140 min
        let result = calculate(7, period(), &base_only(dec!(16000)), &month, &SalaryRuleSet::default())
            .unwrap();
        assert_eq!(result.overtime_hours, dec!(2.33));
        assert_eq!(result.overtime_pay, dec!(233.33));
    }

    #[test]
    fn overtime_and_on_duty_pay() {
        let mut month = totals(20);
        month.overtime_hours = dec!(4);
        month.days_on_duty = 2;
        let rules = SalaryRuleSet::default()
            .with_rule(OVERTIME_RATE_MULTIPLIER, dec!(1.5))
            .with_rule(ON_DUTY_RATE, dec!(0.5));

        // hourly = 16000 / 160 = 100, daily = 800
        let result = calculate(7, period(), &base_only(dec!(16000)), &month, &rules).unwrap();
        assert_eq!(result.overtime_pay, dec!(600));
        assert_eq!(result.on_duty_pay, dec!(800));
        assert_eq!(result.gross_pay, dec!(17400));
    }

    #[test]
    fn net_is_gross_minus_deductions_exactly() {
        let components = SalaryComponents {
            base_salary: dec!(23456.789),
            hra: dec!(4000.005),
            transport_allowance: dec!(1200),
            other_allowances: dec!(333.333),
            pf: dec!(1800.555),
            esi: dec!(150.1),
            professional_tax: dec!(200),
            other_deductions: dec!(12.345),
        };
        let mut month = totals(23);
        month.days_absent = 1;
        month.total_late_minutes = 17;
        month.total_early_departure_minutes = 11;
        month.total_early_arrival_minutes = 301;
        month.overtime_hours = dec!(3.33);
        let rules = SalaryRuleSet::default()
            .with_rule(LATE_ARRIVAL_PENALTY_PER_HOUR, dec!(77.7))
            .with_rule(EARLY_DEPARTURE_PENALTY_PER_HOUR, dec!(33.3))
            .with_rule(EARLY_ARRIVAL_BONUS_PER_HOUR, dec!(41))
            .with_rule(OVERTIME_RATE_MULTIPLIER, dec!(1.75));

        let result = calculate(7, period(), &components, &month, &rules).unwrap();
        assert_eq!(result.net_pay, result.gross_pay - result.total_deductions);
        assert_eq!(result.total_deductions, result.deductions.total());
        assert_eq!(result.allowances.hra, dec!(4000.01));
        assert!(result.gross_pay.scale() <= 2);
    }

    #[test]
    fn recalculation_is_idempotent() {
        let mut month = totals(21);
        month.days_absent = 1;
        month.total_late_minutes = 13;
        let rules = SalaryRuleSet::default().with_rule(LATE_ARRIVAL_PENALTY_PER_HOUR, dec!(10));
        let components = base_only(dec!(31000));

        let first = calculate(9, period(), &components, &month, &rules).unwrap();
        let second = calculate(9, period(), &components, &month, &rules).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn negative_inputs_are_rejected() {
        let rules = SalaryRuleSet::default().with_rule(LATE_ARRIVAL_PENALTY_PER_HOUR, dec!(-1));
        assert!(calculate(1, period(), &base_only(dec!(1000)), &totals(20), &rules).is_err());

        let components = base_only(dec!(-1000));
        assert!(
            calculate(1, period(), &components, &totals(20), &SalaryRuleSet::default()).is_err()
        );
    }
}
