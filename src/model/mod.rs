pub mod attendance;
pub mod calendar;
pub mod payroll;
pub mod salary_rule;
pub mod shift;
pub mod staff;
