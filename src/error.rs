use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde_json::json;
use thiserror::Error;

use crate::model::attendance::PunchType;

/// Errors raised by the pure attendance/payroll engine.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AttendanceError {
    #[error("validation failed: {0}")]
    Validation(String),

    /// Neither a shift definition nor an institution default could be resolved.
    #[error("no timing configured for shift '{shift_type}' and no institution default")]
    ConfigurationGap { shift_type: String },
}

impl AttendanceError {
    pub fn validation(message: impl Into<String>) -> Self {
        AttendanceError::Validation(message.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AttendanceError::Validation(_) => "validation_error",
            AttendanceError::ConfigurationGap { .. } => "configuration_gap",
        }
    }
}

/// Why the verification gate refused a punch.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GateRejection {
    #[error("check-out attempted before any check-in for the day")]
    MissingCheckin,

    #[error("{} already recorded for the day", .0)]
    Duplicate(PunchType),

    #[error("invalid punch: {0}")]
    Invalid(String),
}

impl GateRejection {
    /// Stable reason code returned to punch sources.
    pub fn reason(&self) -> &'static str {
        match self {
            GateRejection::MissingCheckin => "missing_checkin",
            GateRejection::Duplicate(PunchType::CheckIn) => "already_checked_in",
            GateRejection::Duplicate(PunchType::CheckOut) => "already_checked_out",
            GateRejection::Invalid(_) => "invalid_punch",
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("duplicate punch: {} already recorded", .0)]
    DuplicatePunch(PunchType),

    #[error("check-out rejected: no check-in recorded for the day")]
    MissingCheckin,

    #[error("no timing configured for shift '{0}' and no institution default")]
    ConfigurationGap(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl AppError {
    pub fn reason(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::DuplicatePunch(PunchType::CheckIn) => "already_checked_in",
            AppError::DuplicatePunch(PunchType::CheckOut) => "already_checked_out",
            AppError::MissingCheckin => "missing_checkin",
            AppError::ConfigurationGap(_) => "configuration_gap",
            AppError::NotFound(_) => "not_found",
            AppError::Database(_) => "internal_error",
        }
    }
}

impl From<AttendanceError> for AppError {
    fn from(err: AttendanceError) -> Self {
        match err {
            AttendanceError::Validation(msg) => AppError::Validation(msg),
            AttendanceError::ConfigurationGap { shift_type } => AppError::ConfigurationGap(shift_type),
        }
    }
}

impl From<GateRejection> for AppError {
    fn from(rejection: GateRejection) -> Self {
        match rejection {
            GateRejection::MissingCheckin => AppError::MissingCheckin,
            GateRejection::Duplicate(punch_type) => AppError::DuplicatePunch(punch_type),
            GateRejection::Invalid(msg) => AppError::Validation(msg),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicatePunch(_) | AppError::MissingCheckin => StatusCode::CONFLICT,
            AppError::ConfigurationGap(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = match self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "Database error");
                "Internal Server Error".to_string()
            }
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(json!({
            "message": message,
            "reason": self.reason(),
        }))
    }
}
