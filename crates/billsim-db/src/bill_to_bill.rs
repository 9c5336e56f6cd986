//! Database operations for the `bill_to_bill` table.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::bills::get_or_create_bill_id;
use crate::DbError;

/// Input to [`upsert_bill_to_bill`]. Every scored field is optional: a
/// `None` leaves the stored value untouched on conflict, matching the
/// "update only non-null incoming fields" persistence contract.
#[derive(Debug, Clone)]
pub struct BillToBillUpsert {
    pub billnumber_version: String,
    pub billnumber_version_to: String,
    pub score_es: Option<f64>,
    pub score: Option<f64>,
    pub score_to: Option<f64>,
    pub sections_num: Option<i32>,
    pub sections_match: Option<i32>,
    pub reasons: Vec<String>,
    pub identified_by: Option<String>,
    pub currency_id: i64,
}

/// A row from the `bill_to_bill` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillToBillRow {
    pub bill_id: i64,
    pub bill_to_id: i64,
    pub score: Option<f64>,
    pub score_to: Option<f64>,
    pub score_es: Option<f64>,
    pub sections_num: Option<i32>,
    pub sections_match: Option<i32>,
    pub reasonsstring: Option<String>,
    pub identified_by: Option<String>,
    pub currency_id: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

fn tokens(reasonsstring: &str) -> impl Iterator<Item = &str> {
    reasonsstring
        .split(',')
        .map(str::trim)
        .filter(|r| !r.is_empty())
}

/// Merges two comma-joined reason strings into one, set-union deduplicated
/// with stable first-seen ordering.
fn merge_reasonsstrings(existing: &str, incoming: &str) -> String {
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    for reason in tokens(existing).chain(tokens(incoming)) {
        if seen.insert(reason) {
            merged.push(reason);
        }
    }
    merged.join(", ")
}

/// Upserts a bill-to-bill edge on (`bill_id`, `bill_to_id`), resolving both
/// endpoints via [`get_or_create_bill_id`]. `reasonsstring` is merged as a
/// set-union of trimmed comma-split tokens; every other scored field
/// overwrites the stored value only when the incoming value is non-null.
///
/// # Errors
///
/// Returns [`DbError::MissingBillId`] if either identifier fails to parse,
/// or [`DbError::Sqlx`] if the transaction fails.
pub async fn upsert_bill_to_bill(
    pool: &PgPool,
    input: BillToBillUpsert,
) -> Result<BillToBillRow, DbError> {
    let bill_id = get_or_create_bill_id(pool, &input.billnumber_version).await?;
    let bill_to_id = get_or_create_bill_id(pool, &input.billnumber_version_to).await?;

    let mut tx = pool.begin().await?;

    let existing_reasonsstring = sqlx::query_scalar::<_, Option<String>>(
        "SELECT reasonsstring FROM bill_to_bill WHERE bill_id = $1 AND bill_to_id = $2 FOR UPDATE",
    )
    .bind(bill_id)
    .bind(bill_to_id)
    .fetch_optional(&mut *tx)
    .await?
    .flatten();

    let incoming_reasonsstring = if input.reasons.is_empty() {
        None
    } else {
        Some(input.reasons.join(", "))
    };

    let reasonsstring = match (existing_reasonsstring, incoming_reasonsstring) {
        (None, None) => None,
        (Some(existing), None) => Some(existing),
        (None, Some(incoming)) => Some(incoming),
        (Some(existing), Some(incoming)) => Some(merge_reasonsstrings(&existing, &incoming)),
    };

    let row = sqlx::query_as::<_, BillToBillRow>(
        "INSERT INTO bill_to_bill \
             (bill_id, bill_to_id, score, score_to, score_es, \
              sections_num, sections_match, reasonsstring, identified_by, currency_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
         ON CONFLICT (bill_id, bill_to_id) DO UPDATE SET \
             score          = COALESCE(EXCLUDED.score, bill_to_bill.score), \
             score_to       = COALESCE(EXCLUDED.score_to, bill_to_bill.score_to), \
             score_es       = COALESCE(EXCLUDED.score_es, bill_to_bill.score_es), \
             sections_num   = COALESCE(EXCLUDED.sections_num, bill_to_bill.sections_num), \
             sections_match = COALESCE(EXCLUDED.sections_match, bill_to_bill.sections_match), \
             reasonsstring  = EXCLUDED.reasonsstring, \
             identified_by  = COALESCE(EXCLUDED.identified_by, bill_to_bill.identified_by), \
             currency_id    = EXCLUDED.currency_id, \
             updated_at     = NOW() \
         RETURNING bill_id, bill_to_id, score, score_to, score_es, sections_num, \
                   sections_match, reasonsstring, identified_by, currency_id, \
                   created_at, updated_at",
    )
    .bind(bill_id)
    .bind(bill_to_id)
    .bind(input.score)
    .bind(input.score_to)
    .bind(input.score_es)
    .bind(input.sections_num)
    .bind(input.sections_match)
    .bind(reasonsstring)
    .bind(input.identified_by)
    .bind(input.currency_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reason_merge_is_set_union_with_stable_order() {
        let merged = merge_reasonsstrings("a, b", "b, c");
        assert_eq!(merged, "a, b, c");
    }

    #[test]
    fn reason_merge_ignores_blank_tokens() {
        let merged = merge_reasonsstrings("a, , b", "");
        assert_eq!(merged, "a, b");
    }
}
