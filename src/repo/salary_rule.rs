use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use sqlx::{FromRow, MySqlPool};

use crate::error::AppError;
use crate::model::salary_rule::{SalaryRuleSet, validate_rule};

#[derive(FromRow)]
struct SalaryRuleRow {
    rule_name: String,
    rule_value: Decimal,
    updated_at: NaiveDateTime,
}

/// All configured rules; `updated_at` is the latest change across them.
pub async fn fetch_rule_set(pool: &MySqlPool) -> Result<SalaryRuleSet, sqlx::Error> {
    let rows = sqlx::query_as::<_, SalaryRuleRow>(
        "SELECT rule_name, rule_value, updated_at FROM salary_rules ORDER BY rule_name",
    )
    .fetch_all(pool)
    .await?;

    let updated_at = rows.iter().map(|r| r.updated_at).max();
    let rules: BTreeMap<String, Decimal> = rows
        .into_iter()
        .map(|r| (r.rule_name, r.rule_value))
        .collect();

    Ok(SalaryRuleSet {
        rules,
        updated_at,
    })
}

/// Writes every rule in one transaction; nothing is stored if any value
/// is rejected.
pub async fn upsert_rules(
    pool: &MySqlPool,
    rules: &BTreeMap<String, Decimal>,
) -> Result<(), AppError> {
    if rules.is_empty() {
        return Err(AppError::Validation("No rules provided".into()));
    }
    for (name, value) in rules {
        validate_rule(name, *value)?;
    }

    let mut tx = pool.begin().await?;
    for (name, value) in rules {
        sqlx::query(
            r#"
            INSERT INTO salary_rules (rule_name, rule_value)
            VALUES (?, ?)
            ON DUPLICATE KEY UPDATE rule_value = VALUES(rule_value)
            "#,
        )
        .bind(name.trim())
        .bind(*value)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    Ok(())
}
