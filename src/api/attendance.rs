use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::warn;
use utoipa::{IntoParams, ToSchema};

use crate::engine::gate::{PunchRequest, VerificationGate};
use crate::error::AppError;
use crate::model::payroll::PayrollPeriod;
use crate::repo::{self, attendance};
use crate::repo::punch::MySqlPunchLedger;

/// Month selector shared by the attendance and payroll endpoints.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PeriodQuery {
    #[schema(example = 2024)]
    pub year: i32,

    #[schema(example = 1)]
    pub month: u32,
}

impl PeriodQuery {
    pub fn period(&self) -> Result<PayrollPeriod, AppError> {
        Ok(PayrollPeriod::new(self.year, self.month)?)
    }
}

/// Punch submission through the verification gate
#[utoipa::path(
    post,
    path = "/api/v1/attendance/punch",
    request_body = PunchRequest,
    responses(
        (status = 201, description = "Punch accepted", body = crate::model::attendance::PunchEvent),
        (status = 400, description = "Malformed punch", body = Object, example = json!({
            "message": "validation failed: timestamp 2024-01-24 09:00:00 does not fall on 2024-01-25",
            "reason": "validation_error"
        })),
        (status = 404, description = "Unknown staff"),
        (status = 409, description = "Punch rejected", body = Object, example = json!({
            "message": "duplicate punch: check-in already recorded",
            "reason": "already_checked_in"
        })),
        (status = 500, description = "Internal server error")
    ),
    tag = "Attendance"
)]
pub async fn submit_punch(
    pool: web::Data<MySqlPool>,
    gate: web::Data<VerificationGate<MySqlPunchLedger>>,
    body: web::Json<PunchRequest>,
) -> Result<impl Responder, AppError> {
    let event = gate.accept(body.into_inner()).await?;

    // The punch is stored; a record that cannot be derived yet is left to
    // the next recompute or payroll run.
    let refreshed = match repo::require_staff(pool.get_ref(), event.staff_id).await {
        Ok(staff) => repo::refresh_daily_record(pool.get_ref(), &staff, event.punch_date).await,
        Err(e) => Err(e),
    };
    if let Err(e) = refreshed {
        warn!(
            staff_id = event.staff_id,
            date = %event.punch_date,
            error = %e,
            "Punch accepted but daily record not refreshed"
        );
    }

    Ok(HttpResponse::Created().json(event))
}

#[utoipa::path(
    get,
    path = "/api/v1/attendance/{staff_id}/records",
    params(
        ("staff_id", description = "Staff ID"),
        PeriodQuery
    ),
    responses(
        (status = 200, body = [crate::model::attendance::DailyAttendanceRecord]),
        (status = 400, description = "Invalid period"),
        (status = 404, description = "Unknown staff")
    ),
    tag = "Attendance"
)]
pub async fn list_records(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<PeriodQuery>,
) -> Result<impl Responder, AppError> {
    let staff_id = path.into_inner();
    let period = query.period()?;
    repo::require_staff(pool.get_ref(), staff_id).await?;

    let records = attendance::list_daily_records(
        pool.get_ref(),
        staff_id,
        period.first_day()?,
        period.last_day()?,
    )
    .await?;

    Ok(HttpResponse::Ok().json(records))
}

/// Re-derives and stores one day from the accepted punches and the
/// current configuration.
#[utoipa::path(
    post,
    path = "/api/v1/attendance/{staff_id}/records/{date}",
    params(
        ("staff_id", description = "Staff ID"),
        ("date", description = "Day to recompute", example = "2024-01-25")
    ),
    responses(
        (status = 200, body = crate::model::attendance::DailyAttendanceRecord),
        (status = 400, description = "Inconsistent punches"),
        (status = 404, description = "Unknown staff"),
        (status = 422, description = "No shift timing configured", body = Object, example = json!({
            "message": "no timing configured for shift 'night' and no institution default",
            "reason": "configuration_gap"
        }))
    ),
    tag = "Attendance"
)]
pub async fn recompute_day(
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, NaiveDate)>,
) -> Result<impl Responder, AppError> {
    let (staff_id, date) = path.into_inner();
    let staff = repo::require_staff(pool.get_ref(), staff_id).await?;

    let record = repo::refresh_daily_record(pool.get_ref(), &staff, date).await?;
    Ok(HttpResponse::Ok().json(record))
}
