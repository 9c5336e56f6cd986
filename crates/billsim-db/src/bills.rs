//! Database operations for the `bills` table.

use billsim_core::parse_billnumber_version;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `bills` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillRow {
    pub id: i64,
    pub billnumber: String,
    pub version: String,
    pub length: Option<i32>,
    pub sections_num: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Upserts a bill row on (`billnumber`, `version`), returning its id.
///
/// `length` and `sections_num` are updated from the incoming value whenever
/// it is present, leaving the stored value untouched on a `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_bill(
    pool: &PgPool,
    billnumber: &str,
    version: &str,
    length: Option<i32>,
    sections_num: Option<i32>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO bills (billnumber, version, length, sections_num) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (billnumber, version) DO UPDATE SET \
             length         = COALESCE(EXCLUDED.length, bills.length), \
             sections_num   = COALESCE(EXCLUDED.sections_num, bills.sections_num), \
             updated_at     = NOW() \
         RETURNING id",
    )
    .bind(billnumber)
    .bind(version)
    .bind(length)
    .bind(sections_num)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Looks up a bill's id by (`billnumber`, `version`), if a row exists.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_bill_id(
    pool: &PgPool,
    billnumber: &str,
    version: &str,
) -> Result<Option<i64>, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "SELECT id FROM bills WHERE billnumber = $1 AND version = $2",
    )
    .bind(billnumber)
    .bind(version)
    .fetch_optional(pool)
    .await?;

    Ok(id)
}

/// Resolves a bill's id from its `billnumber_version` identifier, creating
/// a bare row from the identifier alone when none exists yet. This is the
/// "create on the fly" policy for edges that reference a bill the indexer
/// has not (or not yet) written a full row for.
///
/// # Errors
///
/// Returns [`DbError::MissingBillId`] if `billnumber_version` does not
/// parse, or [`DbError::Sqlx`] if the query fails.
pub async fn get_or_create_bill_id(
    pool: &PgPool,
    billnumber_version: &str,
) -> Result<i64, DbError> {
    let parts = parse_billnumber_version(billnumber_version)
        .ok_or_else(|| DbError::MissingBillId(billnumber_version.to_string()))?;

    if let Some(id) = get_bill_id(pool, &parts.billnumber, &parts.version).await? {
        return Ok(id);
    }

    upsert_bill(pool, &parts.billnumber, &parts.version, None, None).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unparseable_identifier_is_reported_before_any_query() {
        let err = parse_billnumber_version("not-an-id");
        assert!(err.is_none());
    }
}
