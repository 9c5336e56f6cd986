//! Database operations for the `section_items` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `section_items` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SectionRow {
    pub id: i64,
    pub bill_id: i64,
    pub billnumber_version: String,
    pub section_id_attr: String,
    pub label: Option<String>,
    pub header: Option<String>,
    pub length: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upserts a section row on (`billnumber_version`, `section_id_attr`).
/// Sections with an empty `section_id_attr` (malformed `id` in the source
/// XML) are not persisted and this returns `Ok(None)`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_section(
    pool: &PgPool,
    bill_id: i64,
    billnumber_version: &str,
    section_id_attr: &str,
    label: &str,
    header: &str,
    length: usize,
) -> Result<Option<i64>, DbError> {
    if section_id_attr.is_empty() {
        return Ok(None);
    }

    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO section_items \
             (bill_id, billnumber_version, section_id_attr, label, header, length) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (billnumber_version, section_id_attr) DO UPDATE SET \
             label      = EXCLUDED.label, \
             header     = EXCLUDED.header, \
             length     = EXCLUDED.length, \
             updated_at = NOW() \
         RETURNING id",
    )
    .bind(bill_id)
    .bind(billnumber_version)
    .bind(section_id_attr)
    .bind(label)
    .bind(header)
    .bind(length as i32)
    .fetch_one(pool)
    .await?;

    Ok(Some(id))
}

/// Resolves a section's id by (`billnumber_version`, `section_id_attr`),
/// creating a bare row from the identifiers alone when none exists yet.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_or_create_section_id(
    pool: &PgPool,
    bill_id: i64,
    billnumber_version: &str,
    section_id_attr: &str,
) -> Result<Option<i64>, DbError> {
    if section_id_attr.is_empty() {
        return Ok(None);
    }

    let existing = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM section_items \
         WHERE billnumber_version = $1 AND section_id_attr = $2",
    )
    .bind(billnumber_version)
    .bind(section_id_attr)
    .fetch_optional(pool)
    .await?;

    if let Some(id) = existing {
        return Ok(Some(id));
    }

    upsert_section(pool, bill_id, billnumber_version, section_id_attr, "", "", 0).await
}
