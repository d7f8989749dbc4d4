use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AttendanceError;

/// Fixed monthly pay items for a staff member.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[schema(
    example = json!({
        "base_salary": "20000.00",
        "hra": "4000.00",
        "transport_allowance": "1200.00",
        "other_allowances": "0.00",
        "pf": "1800.00",
        "esi": "150.00",
        "professional_tax": "200.00",
        "other_deductions": "0.00"
    })
)]
pub struct SalaryComponents {
    #[schema(value_type = String)]
    pub base_salary: Decimal,
    #[schema(value_type = String)]
    pub hra: Decimal,
    #[schema(value_type = String)]
    pub transport_allowance: Decimal,
    #[schema(value_type = String)]
    pub other_allowances: Decimal,
    #[schema(value_type = String)]
    pub pf: Decimal,
    #[schema(value_type = String)]
    pub esi: Decimal,
    #[schema(value_type = String)]
    pub professional_tax: Decimal,
    #[schema(value_type = String)]
    pub other_deductions: Decimal,
}

impl SalaryComponents {
    pub fn validate(&self) -> Result<(), AttendanceError> {
        let fields = [
            ("base_salary", self.base_salary),
            ("hra", self.hra),
            ("transport_allowance", self.transport_allowance),
            ("other_allowances", self.other_allowances),
            ("pf", self.pf),
            ("esi", self.esi),
            ("professional_tax", self.professional_tax),
            ("other_deductions", self.other_deductions),
        ];

        match fields.iter().find(|(_, value)| value.is_sign_negative() && !value.is_zero()) {
            Some((name, value)) => Err(AttendanceError::validation(format!(
                "{name} cannot be negative (got {value})"
            ))),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Staff {
    #[schema(example = 1001)]
    pub id: u64,

    #[schema(example = "STF-001")]
    pub staff_code: String,

    #[schema(example = "Asha Rao")]
    pub full_name: String,

    /// Compared exactly against department-specific holidays.
    #[schema(example = "IT")]
    pub department: String,

    /// `None` means the institution default timing applies.
    #[schema(example = "morning", nullable = true)]
    pub shift_type: Option<String>,

    pub active: bool,

    pub salary: SalaryComponents,
}
