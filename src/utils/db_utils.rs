use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::MySqlPool;

use crate::error::AppError;

/// ===============================
/// SQL bindable value enum
/// ===============================
#[derive(Debug, PartialEq)]
pub enum SqlValue {
    String(String),
    U64(u64),
    Decimal(Decimal),
    Bool(bool),
    Null,
}

/// What a patchable column accepts. Values are coerced by the column, never
/// by what the JSON string happens to look like.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Text,
    NullableText,
    /// Non-negative decimal, from a JSON string or number.
    Money,
    Bool,
}

/// ===============================
/// SQL update container
/// ===============================
#[derive(Debug)]
pub struct SqlUpdate {
    pub sql: String,
    pub values: Vec<SqlValue>,
}

fn parse_money(column: &str, raw: &str) -> Result<Decimal, AppError> {
    let amount = Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| AppError::Validation(format!("{column} must be a decimal amount")))?;
    if amount.is_sign_negative() {
        return Err(AppError::Validation(format!("{column} cannot be negative")));
    }
    Ok(amount)
}

fn to_sql_value(column: &str, kind: ColumnKind, value: &Value) -> Result<SqlValue, AppError> {
    let converted = match (kind, value) {
        (ColumnKind::NullableText, Value::Null) => SqlValue::Null,
        (_, Value::Null) => {
            return Err(AppError::Validation(format!("{column} cannot be null")));
        }
        (ColumnKind::Text | ColumnKind::NullableText, Value::String(s)) => {
            SqlValue::String(s.clone())
        }
        (ColumnKind::Money, Value::String(s)) => SqlValue::Decimal(parse_money(column, s)?),
        (ColumnKind::Money, Value::Number(n)) => {
            SqlValue::Decimal(parse_money(column, &n.to_string())?)
        }
        (ColumnKind::Bool, Value::Bool(b)) => SqlValue::Bool(*b),
        _ => {
            return Err(AppError::Validation(format!(
                "{column} expects a {} value",
                match kind {
                    ColumnKind::Text | ColumnKind::NullableText => "string",
                    ColumnKind::Money => "decimal",
                    ColumnKind::Bool => "boolean",
                }
            )));
        }
    };
    Ok(converted)
}

/// ===============================
/// Build dynamic UPDATE SQL
/// ===============================
///
/// Only keys listed in `columns` may appear in the payload; they are the only
/// identifiers ever interpolated into the statement.
pub fn build_update_sql(
    table: &str,
    payload: &Value,
    columns: &[(&str, ColumnKind)],
    id_column: &str,
    id_value: u64,
) -> Result<SqlUpdate, AppError> {
    let obj = payload
        .as_object()
        .ok_or_else(|| AppError::Validation("Payload must be a JSON object".into()))?;

    if obj.is_empty() {
        return Err(AppError::Validation("No fields provided for update".into()));
    }

    // Build SET clause
    let set_clause = obj
        .keys()
        .map(|k| format!("{} = ?", k))
        .collect::<Vec<_>>()
        .join(", ");

    let sql = format!("UPDATE {} SET {} WHERE {} = ?", table, set_clause, id_column);

    let mut values = Vec::with_capacity(obj.len() + 1);
    for (key, value) in obj {
        let kind = columns
            .iter()
            .find(|(name, _)| *name == key.as_str())
            .map(|(_, kind)| *kind)
            .ok_or_else(|| AppError::Validation(format!("Field {key} cannot be updated")))?;
        values.push(to_sql_value(key, kind, value)?);
    }

    // WHERE id = ?
    values.push(SqlValue::U64(id_value));

    Ok(SqlUpdate { sql, values })
}

/// ===============================
/// Execute the update
/// ===============================
pub async fn execute_update(pool: &MySqlPool, update: SqlUpdate) -> Result<u64, sqlx::Error> {
    let mut query = sqlx::query(&update.sql);

    for value in update.values {
        query = match value {
            SqlValue::String(v) => query.bind(v),
            SqlValue::U64(v) => query.bind(v),
            SqlValue::Decimal(v) => query.bind(v),
            SqlValue::Bool(v) => query.bind(v),
            SqlValue::Null => query.bind(None::<String>),
        };
    }

    let result = query.execute(pool).await?;
    Ok(result.rows_affected())
}
