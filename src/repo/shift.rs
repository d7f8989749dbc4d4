use sqlx::MySqlPool;

use crate::engine::shift::ShiftRegistry;
use crate::error::AppError;
use crate::model::shift::{InstitutionDefaultTiming, ShiftDefinition, validate_window};

pub async fn list_shift_definitions(pool: &MySqlPool) -> Result<Vec<ShiftDefinition>, sqlx::Error> {
    sqlx::query_as::<_, ShiftDefinition>(
        "SELECT shift_type, start_time, end_time, grace_minutes FROM shift_definitions ORDER BY shift_type",
    )
    .fetch_all(pool)
    .await
}

/// Creates or replaces the definition for `shift_type`.
pub async fn upsert_shift_definition(
    pool: &MySqlPool,
    definition: &ShiftDefinition,
) -> Result<(), AppError> {
    if definition.shift_type.trim().is_empty() {
        return Err(AppError::Validation("shift_type must not be empty".into()));
    }
    validate_window(definition.start_time, definition.end_time)?;

    sqlx::query(
        r#"
        INSERT INTO shift_definitions (shift_type, start_time, end_time, grace_minutes)
        VALUES (?, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            start_time = VALUES(start_time),
            end_time = VALUES(end_time),
            grace_minutes = VALUES(grace_minutes)
        "#,
    )
    .bind(definition.shift_type.trim())
    .bind(definition.start_time)
    .bind(definition.end_time)
    .bind(definition.grace_minutes)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn fetch_institution_default(
    pool: &MySqlPool,
) -> Result<Option<InstitutionDefaultTiming>, sqlx::Error> {
    sqlx::query_as::<_, InstitutionDefaultTiming>(
        "SELECT start_time, end_time, grace_minutes FROM institution_default_timing WHERE id = 1",
    )
    .fetch_optional(pool)
    .await
}

pub async fn set_institution_default(
    pool: &MySqlPool,
    timing: &InstitutionDefaultTiming,
) -> Result<(), AppError> {
    validate_window(timing.start_time, timing.end_time)?;

    sqlx::query(
        r#"
        INSERT INTO institution_default_timing (id, start_time, end_time, grace_minutes)
        VALUES (1, ?, ?, ?)
        ON DUPLICATE KEY UPDATE
            start_time = VALUES(start_time),
            end_time = VALUES(end_time),
            grace_minutes = VALUES(grace_minutes)
        "#,
    )
    .bind(timing.start_time)
    .bind(timing.end_time)
    .bind(timing.grace_minutes)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn load_registry(pool: &MySqlPool) -> Result<ShiftRegistry, sqlx::Error> {
    let definitions = list_shift_definitions(pool).await?;
    let institution_default = fetch_institution_default(pool).await?;
    Ok(ShiftRegistry::new(definitions, institution_default))
}
