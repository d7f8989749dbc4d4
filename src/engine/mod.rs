//! Attendance and payroll rules. Everything here is a pure function of its
//! inputs; persistence and HTTP live in `repo` and `api`.

pub mod aggregator;
pub mod calendar;
pub mod evaluator;
pub mod gate;
pub mod payroll_run;
pub mod salary;
pub mod shift;
