//! Database operations for the `section_to_section` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::bills::get_or_create_bill_id;
use crate::sections::get_or_create_section_id;
use crate::DbError;

/// Input to [`upsert_section_to_section`].
#[derive(Debug, Clone)]
pub struct SectionToSectionUpsert {
    pub billnumber_version: String,
    pub section_id_attr: String,
    pub billnumber_version_to: String,
    pub section_to_id_attr: String,
    pub score: Option<f64>,
    pub currency_id: i64,
}

/// A row from the `section_to_section` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SectionToSectionRow {
    pub section_id: i64,
    pub section_to_id: i64,
    pub bill_id: i64,
    pub bill_to_id: i64,
    pub score: Option<f64>,
    pub currency_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upserts a section-to-section edge on (`section_id`, `section_to_id`),
/// resolving both bills and both sections via their create-on-the-fly
/// lookups first. Returns `None` when either side's `section_id_attr` is
/// empty, mirroring the "malformed id, skip persistence" rule sections
/// themselves follow.
///
/// # Errors
///
/// Returns [`DbError::MissingBillId`] if either bill identifier fails to
/// parse, or [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_section_to_section(
    pool: &PgPool,
    input: SectionToSectionUpsert,
) -> Result<Option<SectionToSectionRow>, DbError> {
    let bill_id = get_or_create_bill_id(pool, &input.billnumber_version).await?;
    let bill_to_id = get_or_create_bill_id(pool, &input.billnumber_version_to).await?;

    let Some(section_id) =
        get_or_create_section_id(pool, bill_id, &input.billnumber_version, &input.section_id_attr)
            .await?
    else {
        return Ok(None);
    };
    let Some(section_to_id) = get_or_create_section_id(
        pool,
        bill_to_id,
        &input.billnumber_version_to,
        &input.section_to_id_attr,
    )
    .await?
    else {
        return Ok(None);
    };

    let row = sqlx::query_as::<_, SectionToSectionRow>(
        "INSERT INTO section_to_section \
             (section_id, section_to_id, bill_id, bill_to_id, score, currency_id) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (section_id, section_to_id) DO UPDATE SET \
             score       = COALESCE(EXCLUDED.score, section_to_section.score), \
             currency_id = EXCLUDED.currency_id, \
             updated_at  = NOW() \
         RETURNING section_id, section_to_id, bill_id, bill_to_id, score, \
                   currency_id, created_at, updated_at",
    )
    .bind(section_id)
    .bind(section_to_id)
    .bind(bill_id)
    .bind(bill_to_id)
    .bind(input.score)
    .bind(input.currency_id)
    .fetch_one(pool)
    .await?;

    Ok(Some(row))
}
