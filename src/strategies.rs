//! The five insertion strategies.
//!
//! All take the same pool and input sequence and leave the same rows
//! behind: `subscription = 1`, `issuerId = "test"`, `range` from the
//! record's timestamp pair. One transaction each, committed once at the
//! end. They differ only in batching and in which API path builds the
//! statements.

use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use sqlx::postgres::types::PgRange;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::config::BATCH_SIZE;
use crate::data::Interval;

/// Every generated row belongs to the same subscription.
pub const SUBSCRIPTION: i32 = 1;
/// Fixed issuer for generated rows.
pub const ISSUER_ID: &str = "test";

const INSERT_ROW_SQL: &str =
    r#"INSERT INTO "Request" (subscription, range, "issuerId") VALUES ($1, $2, $3)"#;

const INSERT_VALUES_PREFIX: &str =
    r#"INSERT INTO "Request" (subscription, range, "issuerId") "#;

/// One statement for every record: the full array of constructed range
/// values is unnested server-side.
const INSERT_UNNEST_SQL: &str = r#"
INSERT INTO "Request" (subscription, range, "issuerId")
SELECT $1, t.span, $2
FROM unnest($3::daterange[]) AS t(span)
"#;

/// Precompiled raw-SQL insert. The range arrives as raw (start, end) date
/// pairs and is assembled server-side, not as a constructed range value.
const INSERT_PREPARED_SQL: &str = r#"
INSERT INTO "Request" (subscription, range, "issuerId")
SELECT $1, daterange(t.lo, t.hi, '[)'), $2
FROM unnest($3::date[], $4::date[]) AS t(lo, hi)
"#;

/// v1: one `INSERT` per record, commit once at the end. The per-row
/// round-trip baseline.
pub async fn insert_per_row(pool: PgPool, data: Arc<Vec<Interval>>) -> Result<()> {
    let mut tx = pool.begin().await?;
    for record in data.iter() {
        sqlx::query(INSERT_ROW_SQL)
            .bind(SUBSCRIPTION)
            .bind(record.date_range())
            .bind(ISSUER_ID)
            .execute(&mut *tx)
            .await
            .context("row insert failed")?;
    }
    tx.commit().await?;
    Ok(())
}

/// v2: multi-row `VALUES` statements built with the query builder, 10k
/// rows each, commit once at the end.
pub async fn insert_values_batched(pool: PgPool, data: Arc<Vec<Interval>>) -> Result<()> {
    let mut tx = pool.begin().await?;
    for batch in data.chunks(BATCH_SIZE) {
        let mut builder = values_insert(batch);
        builder
            .build()
            .execute(&mut *tx)
            .await
            .context("batched VALUES insert failed")?;
    }
    tx.commit().await?;
    Ok(())
}

/// v3: one unbatched statement covering every record at once.
pub async fn insert_unnest_all(pool: PgPool, data: Arc<Vec<Interval>>) -> Result<()> {
    let ranges: Vec<PgRange<NaiveDate>> = data.iter().map(Interval::date_range).collect();

    let mut tx = pool.begin().await?;
    sqlx::query(INSERT_UNNEST_SQL)
        .bind(SUBSCRIPTION)
        .bind(ISSUER_ID)
        .bind(ranges)
        .execute(&mut *tx)
        .await
        .context("unnest insert failed")?;
    tx.commit().await?;
    Ok(())
}

/// v4: the precompiled statement executed once against the full parameter
/// list.
pub async fn insert_prepared_once(pool: PgPool, data: Arc<Vec<Interval>>) -> Result<()> {
    let (starts, ends) = start_end_dates(&data);

    let mut tx = pool.begin().await?;
    sqlx::query(INSERT_PREPARED_SQL)
        .bind(SUBSCRIPTION)
        .bind(ISSUER_ID)
        .bind(starts)
        .bind(ends)
        .execute(&mut *tx)
        .await
        .context("prepared insert failed")?;
    tx.commit().await?;
    Ok(())
}

/// v5: the same precompiled statement as v4, executed in 10k-row batches
/// to bound peak memory. The driver's statement cache prepares it once and
/// reuses it across batches.
pub async fn insert_prepared_batched(pool: PgPool, data: Arc<Vec<Interval>>) -> Result<()> {
    let mut tx = pool.begin().await?;
    for batch in data.chunks(BATCH_SIZE) {
        let (starts, ends) = start_end_dates(batch);
        sqlx::query(INSERT_PREPARED_SQL)
            .bind(SUBSCRIPTION)
            .bind(ISSUER_ID)
            .bind(starts)
            .bind(ends)
            .execute(&mut *tx)
            .await
            .context("prepared batch insert failed")?;
    }
    tx.commit().await?;
    Ok(())
}

/// Multi-row `VALUES` statement for one batch. Batches stay at
/// `BATCH_SIZE` rows; PostgreSQL rejects oversized parameter lists.
fn values_insert(batch: &[Interval]) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new(INSERT_VALUES_PREFIX);
    builder.push_values(batch, |mut row, record| {
        row.push_bind(SUBSCRIPTION);
        row.push_bind(record.date_range());
        row.push_bind(ISSUER_ID);
    });
    builder
}

/// Splits records into the raw (start, end) date pairs bound by the
/// precompiled statement.
fn start_end_dates(records: &[Interval]) -> (Vec<NaiveDate>, Vec<NaiveDate>) {
    records
        .iter()
        .map(|r| (r.start.date_naive(), r.end.date_naive()))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn interval(day: u32) -> Interval {
        Interval::new(
            Utc.with_ymd_and_hms(2024, 3, day, 8, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2024, 3, day + 1, 8, 0, 0).unwrap(),
        )
    }

    #[test]
    fn values_statement_binds_three_params_per_row() {
        let batch: Vec<Interval> = (1..=3).map(interval).collect();
        let sql = values_insert(&batch).into_sql();

        assert!(sql.starts_with(r#"INSERT INTO "Request""#));
        assert_eq!(sql.matches('$').count(), 9);
    }

    #[test]
    fn batches_never_exceed_the_limit() {
        let data: Vec<Interval> = (0..25_001).map(|_| interval(1)).collect();
        let sizes: Vec<usize> = data.chunks(BATCH_SIZE).map(<[Interval]>::len).collect();

        assert_eq!(sizes, vec![10_000, 10_000, 5_001]);
    }

    #[test]
    fn prepared_statement_is_fixed_text() {
        // Same text for every batch size: the driver prepares it once.
        assert!(INSERT_PREPARED_SQL.contains("$3::date[]"));
        assert!(INSERT_PREPARED_SQL.contains("$4::date[]"));
        assert!(INSERT_PREPARED_SQL.contains("daterange(t.lo, t.hi, '[)')"));
    }

    #[test]
    fn start_end_dates_preserve_order_and_pairing() {
        let records: Vec<Interval> = (1..=3).map(interval).collect();
        let (starts, ends) = start_end_dates(&records);

        assert_eq!(starts.len(), 3);
        assert_eq!(ends.len(), 3);
        assert_eq!(starts[0], records[0].start.date_naive());
        assert_eq!(ends[2], records[2].end.date_naive());
    }
}
