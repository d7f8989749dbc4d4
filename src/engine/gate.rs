use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;
use tracing::{info, instrument, warn};
use utoipa::ToSchema;

use crate::error::{AppError, GateRejection};
use crate::model::attendance::{PunchEvent, PunchType};

/// A punch as submitted by a device or manual-entry form.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PunchRequest {
    #[schema(example = 1001)]
    pub staff_id: u64,

    #[schema(example = "2024-01-25", value_type = String, format = "date")]
    pub punch_date: NaiveDate,

    pub punch_type: PunchType,

    #[schema(example = "2024-01-25T09:02:00", value_type = String, format = "date-time")]
    pub punched_at: NaiveDateTime,

    #[schema(example = "biometric")]
    pub method: String,
}

impl PunchRequest {
    pub fn into_event(self) -> PunchEvent {
        PunchEvent {
            staff_id: self.staff_id,
            punch_date: self.punch_date,
            punch_type: self.punch_type,
            punched_at: self.punched_at,
            method: self.method,
        }
    }
}

/// Punches already accepted for one (staff, date).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DayPunches {
    pub check_in: Option<PunchEvent>,
    pub check_out: Option<PunchEvent>,
}

impl DayPunches {
    pub fn get(&self, punch_type: PunchType) -> Option<&PunchEvent> {
        match punch_type {
            PunchType::CheckIn => self.check_in.as_ref(),
            PunchType::CheckOut => self.check_out.as_ref(),
        }
    }

    pub fn set(&mut self, event: PunchEvent) {
        match event.punch_type {
            PunchType::CheckIn => self.check_in = Some(event),
            PunchType::CheckOut => self.check_out = Some(event),
        }
    }
}

/// The gate rules, in order. Pure; callers must hold the (staff, date)
/// guard between reading `existing` and inserting the punch.
pub fn check_punch(existing: &DayPunches, request: &PunchRequest) -> Result<(), GateRejection> {
    if request.punch_type == PunchType::CheckOut && existing.check_in.is_none() {
        return Err(GateRejection::MissingCheckin);
    }

    if existing.get(request.punch_type).is_some() {
        return Err(GateRejection::Duplicate(request.punch_type));
    }

    if request.punched_at.date() != request.punch_date {
        return Err(GateRejection::Invalid(format!(
            "timestamp {} does not fall on {}",
            request.punched_at, request.punch_date
        )));
    }

    if let (PunchType::CheckOut, Some(check_in)) = (request.punch_type, &existing.check_in) {
        if request.punched_at < check_in.punched_at {
            return Err(GateRejection::Invalid(format!(
                "check-out {} is before check-in {}",
                request.punched_at, check_in.punched_at
            )));
        }
    }

    Ok(())
}

/// The rule check a ledger runs under its (staff, date) guard.
pub type PunchCheck =
    for<'a, 'b> fn(&'a DayPunches, &'b PunchRequest) -> Result<(), GateRejection>;

/// Storage for accepted punches.
///
/// `insert_checked` must run `check` and the insert atomically per
/// (staff, date): two concurrent submissions may never both pass.
#[async_trait]
pub trait PunchLedger: Send + Sync {
    async fn insert_checked(
        &self,
        request: &PunchRequest,
        check: PunchCheck,
    ) -> Result<PunchEvent, AppError>;
}

/// Accepts at most one check-in and one check-out per staff per day.
pub struct VerificationGate<L> {
    ledger: L,
}

impl<L: PunchLedger> VerificationGate<L> {
    pub fn new(ledger: L) -> Self {
        Self { ledger }
    }

    #[instrument(
        name = "punch_accept",
        skip(self, request),
        fields(staff_id = request.staff_id, date = %request.punch_date, punch_type = %request.punch_type)
    )]
    pub async fn accept(&self, request: PunchRequest) -> Result<PunchEvent, AppError> {
        match self.ledger.insert_checked(&request, check_punch).await {
            Ok(event) => {
                info!(method = %event.method, "Punch accepted");
                Ok(event)
            }
            Err(e) => {
                warn!(reason = e.reason(), "Punch rejected");
                Err(e)
            }
        }
    }

    #[cfg(test)]
    pub fn ledger(&self) -> &L {
        &self.ledger
    }
}
