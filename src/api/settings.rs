//! Admin getters and setters for the configuration the engine reads.
//! Every change is visible to the next evaluation; nothing is cached.

use std::collections::BTreeMap;

use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::MySqlPool;
use tracing::info;
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::model::calendar::WeeklyOffConfig;
use crate::model::shift::{InstitutionDefaultTiming, ShiftDefinition};
use crate::repo::calendar::{self, CalendarExceptionInput};
use crate::repo::{salary_rule, shift};

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ExceptionFilter {
    /// Include retired exceptions
    #[schema(example = false)]
    pub include_inactive: Option<bool>,
}

#[derive(Deserialize, ToSchema)]
pub struct SalaryRulesUpdate {
    #[schema(value_type = Object, example = json!({
        "late_arrival_penalty_per_hour": "100",
        "absent_day_deduction_rate": "1.0"
    }))]
    pub rules: BTreeMap<String, Decimal>,
}

// ---------------------------------------------------------------------------
// Shifts
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/settings/shifts",
    responses((status = 200, body = [ShiftDefinition])),
    tag = "Settings"
)]
pub async fn list_shifts(pool: web::Data<MySqlPool>) -> Result<impl Responder, AppError> {
    let shifts = shift::list_shift_definitions(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(shifts))
}

#[utoipa::path(
    put,
    path = "/api/v1/settings/shifts",
    request_body = ShiftDefinition,
    responses(
        (status = 200, description = "Shift saved", body = Object, example = json!({
            "message": "Shift saved"
        })),
        (status = 400, description = "End time not after start time")
    ),
    tag = "Settings"
)]
pub async fn upsert_shift(
    pool: web::Data<MySqlPool>,
    body: web::Json<ShiftDefinition>,
) -> Result<impl Responder, AppError> {
    shift::upsert_shift_definition(pool.get_ref(), &body).await?;
    info!(shift_type = %body.shift_type, "Shift definition saved");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Shift saved"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/settings/default-timing",
    responses(
        (status = 200, body = InstitutionDefaultTiming),
        (status = 404, description = "No default configured")
    ),
    tag = "Settings"
)]
pub async fn get_default_timing(pool: web::Data<MySqlPool>) -> Result<impl Responder, AppError> {
    let timing = shift::fetch_institution_default(pool.get_ref())
        .await?
        .ok_or_else(|| AppError::NotFound("institution default timing".into()))?;
    Ok(HttpResponse::Ok().json(timing))
}

#[utoipa::path(
    put,
    path = "/api/v1/settings/default-timing",
    request_body = InstitutionDefaultTiming,
    responses(
        (status = 200, description = "Default timing saved"),
        (status = 400, description = "End time not after start time")
    ),
    tag = "Settings"
)]
pub async fn set_default_timing(
    pool: web::Data<MySqlPool>,
    body: web::Json<InstitutionDefaultTiming>,
) -> Result<impl Responder, AppError> {
    shift::set_institution_default(pool.get_ref(), &body).await?;
    info!(start = %body.start_time, end = %body.end_time, "Institution default timing saved");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Default timing saved"
    })))
}

// ---------------------------------------------------------------------------
// Calendar exceptions
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/settings/calendar",
    params(ExceptionFilter),
    responses((status = 200, body = [crate::model::calendar::CalendarException])),
    tag = "Settings"
)]
pub async fn list_exceptions(
    pool: web::Data<MySqlPool>,
    query: web::Query<ExceptionFilter>,
) -> Result<impl Responder, AppError> {
    let include_inactive = query.include_inactive.unwrap_or(false);
    let exceptions = calendar::list_exceptions(pool.get_ref(), include_inactive).await?;
    Ok(HttpResponse::Ok().json(exceptions))
}

#[utoipa::path(
    post,
    path = "/api/v1/settings/calendar",
    request_body = CalendarExceptionInput,
    responses(
        (status = 201, description = "Exception created", body = Object, example = json!({
            "message": "Calendar exception created",
            "id": 7
        })),
        (status = 400, description = "Invalid range or missing departments")
    ),
    tag = "Settings"
)]
pub async fn create_exception(
    pool: web::Data<MySqlPool>,
    body: web::Json<CalendarExceptionInput>,
) -> Result<impl Responder, AppError> {
    let id = calendar::create_exception(pool.get_ref(), &body).await?;
    info!(id, scope = %body.scope, start = %body.start_date, end = %body.end_date, "Calendar exception created");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Calendar exception created",
        "id": id
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/settings/calendar/{exception_id}",
    params(("exception_id", description = "Calendar exception ID")),
    responses(
        (status = 200, body = crate::model::calendar::CalendarException),
        (status = 404)
    ),
    tag = "Settings"
)]
pub async fn get_exception(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let id = path.into_inner();
    let exception = calendar::fetch_exception(pool.get_ref(), id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("calendar exception {id}")))?;
    Ok(HttpResponse::Ok().json(exception))
}

#[utoipa::path(
    put,
    path = "/api/v1/settings/calendar/{exception_id}",
    request_body = CalendarExceptionInput,
    params(("exception_id", description = "Calendar exception ID")),
    responses(
        (status = 200, description = "Exception updated"),
        (status = 400),
        (status = 404)
    ),
    tag = "Settings"
)]
pub async fn update_exception(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<CalendarExceptionInput>,
) -> Result<impl Responder, AppError> {
    let id = path.into_inner();
    calendar::update_exception(pool.get_ref(), id, &body).await?;
    info!(id, "Calendar exception updated");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Calendar exception updated"
    })))
}

/// Retire a calendar exception (soft delete)
#[utoipa::path(
    delete,
    path = "/api/v1/settings/calendar/{exception_id}",
    params(("exception_id", description = "Calendar exception ID")),
    responses(
        (status = 200, description = "Exception deactivated"),
        (status = 404)
    ),
    tag = "Settings"
)]
pub async fn deactivate_exception(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let id = path.into_inner();
    calendar::deactivate_exception(pool.get_ref(), id).await?;
    info!(id, "Calendar exception deactivated");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Calendar exception deactivated"
    })))
}

// ---------------------------------------------------------------------------
// Weekly off
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/settings/weekly-off",
    responses((status = 200, body = WeeklyOffConfig)),
    tag = "Settings"
)]
pub async fn get_weekly_off(pool: web::Data<MySqlPool>) -> Result<impl Responder, AppError> {
    let config = calendar::fetch_weekly_off(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(config))
}

#[utoipa::path(
    put,
    path = "/api/v1/settings/weekly-off",
    request_body = WeeklyOffConfig,
    responses((status = 200, body = WeeklyOffConfig)),
    tag = "Settings"
)]
pub async fn set_weekly_off(
    pool: web::Data<MySqlPool>,
    body: web::Json<WeeklyOffConfig>,
) -> Result<impl Responder, AppError> {
    let config = body.into_inner();
    calendar::set_weekly_off(pool.get_ref(), config).await?;
    info!(sunday = config.sunday, "Weekly off saved");
    Ok(HttpResponse::Ok().json(config))
}

// ---------------------------------------------------------------------------
// Salary rules
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/api/v1/settings/salary-rules",
    responses((status = 200, body = crate::model::salary_rule::SalaryRuleSet)),
    tag = "Settings"
)]
pub async fn get_salary_rules(pool: web::Data<MySqlPool>) -> Result<impl Responder, AppError> {
    let rules = salary_rule::fetch_rule_set(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(rules))
}

#[utoipa::path(
    put,
    path = "/api/v1/settings/salary-rules",
    request_body = SalaryRulesUpdate,
    responses(
        (status = 200, body = crate::model::salary_rule::SalaryRuleSet),
        (status = 400, description = "Negative or unnamed rule")
    ),
    tag = "Settings"
)]
pub async fn update_salary_rules(
    pool: web::Data<MySqlPool>,
    body: web::Json<SalaryRulesUpdate>,
) -> Result<impl Responder, AppError> {
    salary_rule::upsert_rules(pool.get_ref(), &body.rules).await?;
    info!(count = body.rules.len(), "Salary rules saved");

    let rules = salary_rule::fetch_rule_set(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(rules))
}
