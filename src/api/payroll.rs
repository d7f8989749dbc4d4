use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::{error, info};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::attendance::PeriodQuery;
use crate::engine::payroll_run::{StaffFailure, run_batch, run_staff_month};
use crate::error::AppError;
use crate::model::payroll::{MonthlySalaryResult, PayrollPeriod};
use crate::repo::{self, payroll, staff};

#[derive(Serialize, ToSchema)]
pub struct CalculationResponse {
    pub revision: u32,
    #[schema(value_type = String, format = "uuid")]
    pub run_id: Uuid,
    pub result: MonthlySalaryResult,
}

#[derive(Serialize, ToSchema)]
pub struct BatchSuccess {
    pub staff_id: u64,
    pub revision: u32,
    #[schema(value_type = String)]
    pub net_pay: Decimal,
}

#[derive(Serialize, ToSchema)]
pub struct BatchRunResponse {
    #[schema(value_type = String, format = "uuid")]
    pub run_id: Uuid,
    pub period: PayrollPeriod,
    pub succeeded: Vec<BatchSuccess>,
    pub failed: Vec<StaffFailure>,
}

fn failure_response(failure: &StaffFailure) -> HttpResponse {
    HttpResponse::UnprocessableEntity().json(serde_json::json!({
        "message": "Payroll could not be calculated",
        "reason": "payroll_failed",
        "staff_id": failure.staff_id,
        "errors": failure.errors,
    }))
}

/// Calculate and store a new salary revision for one staff member
#[utoipa::path(
    post,
    path = "/api/v1/payroll/{staff_id}",
    request_body = PeriodQuery,
    params(
        ("staff_id", description = "Staff ID")
    ),
    responses(
        (status = 201, body = CalculationResponse),
        (status = 400, description = "Invalid period"),
        (status = 404, description = "Unknown staff"),
        (status = 422, description = "One or more days could not be evaluated", body = Object, example = json!({
            "message": "Payroll could not be calculated",
            "reason": "payroll_failed",
            "staff_id": 1001,
            "errors": [{
                "date": null,
                "kind": "configuration_gap",
                "message": "no timing configured for shift 'night' and no institution default"
            }]
        }))
    ),
    tag = "Payroll"
)]
pub async fn calculate_staff(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<PeriodQuery>,
) -> Result<impl Responder, AppError> {
    let staff_id = path.into_inner();
    let period = body.period()?;

    let staff = repo::require_staff(pool.get_ref(), staff_id).await?;
    let snapshot = repo::load_snapshot(pool.get_ref()).await?;
    let input = repo::load_staff_month(pool.get_ref(), staff, period).await?;

    let outcome = match run_staff_month(&snapshot, period, &input) {
        Ok(outcome) => outcome,
        Err(failure) => return Ok(failure_response(&failure)),
    };

    let run_id = Uuid::new_v4();
    let revision = repo::persist_staff_month(pool.get_ref(), &outcome, run_id).await?;
    info!(staff_id, %period, revision, net_pay = %outcome.result.net_pay, "Salary calculated");

    Ok(HttpResponse::Created().json(CalculationResponse {
        revision,
        run_id,
        result: outcome.result,
    }))
}

/// Run payroll for every active staff member
///
/// Staff members that fail are reported next to the ones that succeeded.
#[utoipa::path(
    post,
    path = "/api/v1/payroll/run",
    request_body = PeriodQuery,
    responses(
        (status = 200, body = BatchRunResponse),
        (status = 400, description = "Invalid period")
    ),
    tag = "Payroll"
)]
pub async fn run_payroll(
    pool: web::Data<MySqlPool>,
    body: web::Json<PeriodQuery>,
) -> Result<impl Responder, AppError> {
    let period = body.period()?;

    let snapshot = repo::load_snapshot(pool.get_ref()).await?;
    let active = staff::list_active_staff(pool.get_ref()).await?;

    let mut inputs = Vec::with_capacity(active.len());
    for member in active {
        let staff_id = member.id;
        let loaded = repo::load_staff_month(pool.get_ref(), member, period)
            .await
            .map_err(|e| {
                error!(error = %e, staff_id, %period, "Failed to load staff month");
                StaffFailure::whole_month(staff_id, "load_error", "Internal Server Error")
            });
        inputs.push(loaded);
    }

    let batch = run_batch(&snapshot, period, inputs);

    let mut succeeded = Vec::with_capacity(batch.successes.len());
    let mut failed = batch.failures;
    for outcome in &batch.successes {
        let staff_id = outcome.result.staff_id;
        match repo::persist_staff_month(pool.get_ref(), outcome, batch.run_id).await {
            Ok(revision) => succeeded.push(BatchSuccess {
                staff_id,
                revision,
                net_pay: outcome.result.net_pay,
            }),
            Err(e) => {
                error!(error = %e, staff_id, run_id = %batch.run_id, "Failed to store salary result");
                failed.push(StaffFailure::whole_month(
                    staff_id,
                    "persistence_error",
                    "Internal Server Error",
                ));
            }
        }
    }

    Ok(HttpResponse::Ok().json(BatchRunResponse {
        run_id: batch.run_id,
        period,
        succeeded,
        failed,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/{staff_id}",
    params(
        ("staff_id", description = "Staff ID"),
        PeriodQuery
    ),
    responses(
        (status = 200, body = crate::model::payroll::StoredSalaryResult),
        (status = 404, description = "Month not calculated yet")
    ),
    tag = "Payroll"
)]
pub async fn get_latest_result(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<PeriodQuery>,
) -> Result<impl Responder, AppError> {
    let staff_id = path.into_inner();
    let period = query.period()?;

    let stored = payroll::fetch_latest_result(pool.get_ref(), staff_id, period)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("salary result for staff {staff_id} in {period}")))?;

    Ok(HttpResponse::Ok().json(stored))
}

#[utoipa::path(
    get,
    path = "/api/v1/payroll/{staff_id}/revisions",
    params(
        ("staff_id", description = "Staff ID"),
        PeriodQuery
    ),
    responses(
        (status = 200, body = [crate::model::payroll::StoredSalaryResult])
    ),
    tag = "Payroll"
)]
pub async fn list_result_revisions(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<PeriodQuery>,
) -> Result<impl Responder, AppError> {
    let staff_id = path.into_inner();
    let period = query.period()?;

    let revisions = payroll::list_revisions(pool.get_ref(), staff_id, period).await?;
    Ok(HttpResponse::Ok().json(revisions))
}
