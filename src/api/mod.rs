pub mod attendance;
pub mod payroll;
pub mod settings;
pub mod staff;
