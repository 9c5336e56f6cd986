//! Currency epoch allocation and stale-row sweeping.
//!
//! A currency epoch is a monotonically increasing integer id allocated once
//! per batch run. Every similarity write in that run stamps its
//! `currency_id`; the sweep step deletes edges left over from older runs.

use sqlx::PgPool;

use crate::DbError;

/// Allocates a new currency epoch tagged with `version` (a free-form label
/// for the run, e.g. a timestamp or git ref) and returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_epoch(pool: &PgPool, version: &str) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO currency_epochs (version) VALUES ($1) RETURNING id",
    )
    .bind(version)
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Deletes `bill_to_bill` and `section_to_section` rows stamped with a
/// `currency_id` older than `current_id`. Returns the total number of rows
/// removed across both tables.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either delete fails.
pub async fn sweep(pool: &PgPool, current_id: i64) -> Result<u64, DbError> {
    let section_rows = sqlx::query("DELETE FROM section_to_section WHERE currency_id < $1")
        .bind(current_id)
        .execute(pool)
        .await?
        .rows_affected();

    let bill_rows = sqlx::query("DELETE FROM bill_to_bill WHERE currency_id < $1")
        .bind(current_id)
        .execute(pool)
        .await?
        .rows_affected();

    Ok(section_rows + bill_rows)
}
