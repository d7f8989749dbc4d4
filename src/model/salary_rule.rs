use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AttendanceError;

pub const EARLY_ARRIVAL_BONUS_PER_HOUR: &str = "early_arrival_bonus_per_hour";
pub const LATE_ARRIVAL_PENALTY_PER_HOUR: &str = "late_arrival_penalty_per_hour";
pub const EARLY_DEPARTURE_PENALTY_PER_HOUR: &str = "early_departure_penalty_per_hour";
pub const OVERTIME_RATE_MULTIPLIER: &str = "overtime_rate_multiplier";
pub const ABSENT_DAY_DEDUCTION_RATE: &str = "absent_day_deduction_rate";
pub const MINIMUM_HOURS_FOR_BONUS: &str = "minimum_hours_for_bonus";
pub const ON_DUTY_RATE: &str = "on_duty_rate";

/// Rule names the salary engine understands, with the value used when a
/// rule has never been configured.
pub const KNOWN_RULES: [(&str, Decimal); 7] = [
    (EARLY_ARRIVAL_BONUS_PER_HOUR, dec!(0)),
    (LATE_ARRIVAL_PENALTY_PER_HOUR, dec!(0)),
    (EARLY_DEPARTURE_PENALTY_PER_HOUR, dec!(0)),
    (OVERTIME_RATE_MULTIPLIER, dec!(1)),
    (ABSENT_DAY_DEDUCTION_RATE, dec!(1)),
    (MINIMUM_HOURS_FOR_BONUS, dec!(0)),
    (ON_DUTY_RATE, dec!(1)),
];

/// Named numeric payroll rules, read fresh for every calculation.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
pub struct SalaryRuleSet {
    #[schema(value_type = Object)]
    pub rules: BTreeMap<String, Decimal>,
    #[schema(value_type = Option<String>, format = "date-time")]
    pub updated_at: Option<NaiveDateTime>,
}

impl SalaryRuleSet {
    pub fn new(rules: BTreeMap<String, Decimal>) -> Self {
        Self {
            rules,
            updated_at: None,
        }
    }

    pub fn with_rule(mut self, name: &str, value: Decimal) -> Self {
        self.rules.insert(name.to_string(), value);
        self
    }

    /// Configured value, or the default for a known rule.
    pub fn get(&self, name: &str) -> Decimal {
        self.rules.get(name).copied().unwrap_or_else(|| {
            KNOWN_RULES
                .iter()
                .find(|(known, _)| *known == name)
                .map(|(_, default)| *default)
                .unwrap_or(Decimal::ZERO)
        })
    }

    pub fn validate(&self) -> Result<(), AttendanceError> {
        for (name, value) in &self.rules {
            validate_rule(name, *value)?;
        }
        Ok(())
    }
}

pub fn validate_rule(name: &str, value: Decimal) -> Result<(), AttendanceError> {
    if name.trim().is_empty() {
        return Err(AttendanceError::validation("rule name must not be empty"));
    }
    if value < Decimal::ZERO {
        return Err(AttendanceError::validation(format!(
            "rule {name} cannot be negative (got {value})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_rules_fall_back_to_defaults() {
        let rules = SalaryRuleSet::default().with_rule(LATE_ARRIVAL_PENALTY_PER_HOUR, dec!(60));
        assert_eq!(rules.get(LATE_ARRIVAL_PENALTY_PER_HOUR), dec!(60));
        assert_eq!(rules.get(OVERTIME_RATE_MULTIPLIER), dec!(1));
        assert_eq!(rules.get(EARLY_ARRIVAL_BONUS_PER_HOUR), dec!(0));
        assert_eq!(rules.get("something_else"), dec!(0));
    }

    #[test]
    fn negative_rule_is_rejected() {
        let rules = SalaryRuleSet::default().with_rule(ON_DUTY_RATE, dec!(-0.5));
        assert!(rules.validate().is_err());
    }
}
