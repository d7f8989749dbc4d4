use std::collections::HashMap;

use crate::error::AttendanceError;
use crate::model::shift::{InstitutionDefaultTiming, ShiftDefinition, ShiftTiming, TimingSource};

/// Timing lookup over a snapshot of shift definitions plus the institution
/// default. Build a new registry for every evaluation or batch run so that
/// admin edits are picked up immediately.
#[derive(Debug, Clone, Default)]
pub struct ShiftRegistry {
    definitions: HashMap<String, ShiftDefinition>,
    institution_default: Option<InstitutionDefaultTiming>,
}

impl ShiftRegistry {
    pub fn new(
        definitions: Vec<ShiftDefinition>,
        institution_default: Option<InstitutionDefaultTiming>,
    ) -> Self {
        Self {
            definitions: definitions
                .into_iter()
                .map(|d| (d.shift_type.clone(), d))
                .collect(),
            institution_default,
        }
    }

    /// Exact tag match first, institution default otherwise. A definition
    /// always replaces all three fields of the default.
    pub fn effective_timing(&self, shift_type: Option<&str>) -> Result<ShiftTiming, AttendanceError> {
        if let Some(def) = shift_type.and_then(|tag| self.definitions.get(tag)) {
            return ShiftTiming::new(
                def.start_time,
                def.end_time,
                def.grace_minutes,
                TimingSource::Shift,
            );
        }

        match &self.institution_default {
            Some(default) => ShiftTiming::new(
                default.start_time,
                default.end_time,
                default.grace_minutes,
                TimingSource::InstitutionDefault,
            ),
            None => Err(AttendanceError::ConfigurationGap {
                shift_type: shift_type.unwrap_or("<none>").to_string(),
            }),
        }
    }
}
