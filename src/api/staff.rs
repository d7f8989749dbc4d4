use actix_web::{HttpResponse, Responder, web};
use serde_json::Value;
use sqlx::MySqlPool;
use tracing::info;

use crate::api::attendance::PeriodQuery;
use crate::error::AppError;
use crate::repo::calendar::{self, OnDutyInput};
use crate::repo::staff::{self, CreateStaff};
use crate::repo;

#[utoipa::path(
    post,
    path = "/api/v1/staff",
    request_body = CreateStaff,
    responses(
        (status = 201, description = "Staff created", body = Object, example = json!({
            "message": "Staff created",
            "id": 1001
        })),
        (status = 400, description = "Invalid or duplicate staff code")
    ),
    tag = "Staff"
)]
pub async fn create_staff(
    pool: web::Data<MySqlPool>,
    body: web::Json<CreateStaff>,
) -> Result<impl Responder, AppError> {
    let id = staff::create_staff(pool.get_ref(), &body).await?;
    info!(id, staff_code = %body.staff_code, "Staff created");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "Staff created",
        "id": id
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/staff",
    responses((status = 200, body = [crate::model::staff::Staff])),
    tag = "Staff"
)]
pub async fn list_staff(pool: web::Data<MySqlPool>) -> Result<impl Responder, AppError> {
    let members = staff::list_active_staff(pool.get_ref()).await?;
    Ok(HttpResponse::Ok().json(members))
}

#[utoipa::path(
    get,
    path = "/api/v1/staff/{staff_id}",
    params(("staff_id", description = "Staff ID")),
    responses(
        (status = 200, body = crate::model::staff::Staff),
        (status = 404)
    ),
    tag = "Staff"
)]
pub async fn get_staff(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let member = repo::require_staff(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(member))
}

/// Partially update a staff member
///
/// Accepts any subset of the profile, shift tag and salary component columns.
#[utoipa::path(
    patch,
    path = "/api/v1/staff/{staff_id}",
    request_body(content = Object, example = json!({
        "department": "IT",
        "shift_type": "morning",
        "base_salary": "20000.00"
    })),
    params(("staff_id", description = "Staff ID")),
    responses(
        (status = 200, description = "Staff updated"),
        (status = 400, description = "Unknown column or negative amount"),
        (status = 404)
    ),
    tag = "Staff"
)]
pub async fn update_staff(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<Value>,
) -> Result<impl Responder, AppError> {
    let staff_id = path.into_inner();
    staff::update_staff(pool.get_ref(), staff_id, &body).await?;
    info!(staff_id, "Staff updated");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Staff updated"
    })))
}

#[utoipa::path(
    get,
    path = "/api/v1/staff/{staff_id}/on-duty",
    params(
        ("staff_id", description = "Staff ID"),
        PeriodQuery
    ),
    responses((status = 200, body = [crate::model::calendar::OnDutyEntry])),
    tag = "Staff"
)]
pub async fn list_on_duty(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<PeriodQuery>,
) -> Result<impl Responder, AppError> {
    let staff_id = path.into_inner();
    let period = query.period()?;

    let entries = calendar::list_on_duty(
        pool.get_ref(),
        staff_id,
        period.first_day()?,
        period.last_day()?,
    )
    .await?;
    Ok(HttpResponse::Ok().json(entries))
}

#[utoipa::path(
    post,
    path = "/api/v1/staff/{staff_id}/on-duty",
    request_body = OnDutyInput,
    params(("staff_id", description = "Staff ID")),
    responses(
        (status = 201, description = "On-duty entry created"),
        (status = 400),
        (status = 404)
    ),
    tag = "Staff"
)]
pub async fn create_on_duty(
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<OnDutyInput>,
) -> Result<impl Responder, AppError> {
    let staff_id = path.into_inner();
    repo::require_staff(pool.get_ref(), staff_id).await?;

    let id = calendar::create_on_duty(pool.get_ref(), staff_id, &body).await?;
    info!(staff_id, id, start = %body.start_date, end = %body.end_date, "On-duty entry created");

    Ok(HttpResponse::Created().json(serde_json::json!({
        "message": "On-duty entry created",
        "id": id
    })))
}

#[utoipa::path(
    delete,
    path = "/api/v1/staff/{staff_id}/on-duty/{entry_id}",
    params(
        ("staff_id", description = "Staff ID"),
        ("entry_id", description = "On-duty entry ID")
    ),
    responses(
        (status = 200, description = "On-duty entry deactivated"),
        (status = 404)
    ),
    tag = "Staff"
)]
pub async fn deactivate_on_duty(
    pool: web::Data<MySqlPool>,
    path: web::Path<(u64, u64)>,
) -> Result<impl Responder, AppError> {
    let (staff_id, entry_id) = path.into_inner();
    calendar::deactivate_on_duty(pool.get_ref(), staff_id, entry_id).await?;
    info!(staff_id, entry_id, "On-duty entry deactivated");

    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "On-duty entry deactivated"
    })))
}
