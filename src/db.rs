//! Target schema and connection handling.
//!
//! Covers:
//! - the persisted `Request` entity
//! - the connection factory (fresh pool + drop/recreate schema reset)
//! - the post-run row count

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::types::PgRange;
use sqlx::postgres::PgPoolOptions;
use sqlx::{FromRow, PgPool};
use tracing::debug;

/// One persisted row. `range` is end-exclusive: `[start, end)`.
#[derive(Debug, FromRow)]
pub struct Request {
    pub id: i32,
    #[sqlx(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
    pub subscription: i32,
    pub range: PgRange<NaiveDate>,
    #[sqlx(rename = "issuerId")]
    pub issuer_id: String,
}

const DROP_TABLE_SQL: &str = r#"DROP TABLE IF EXISTS "Request""#;

const CREATE_TABLE_SQL: &str = r#"
CREATE TABLE "Request" (
    id           SERIAL PRIMARY KEY,
    "createdAt"  TIMESTAMPTZ NOT NULL DEFAULT current_timestamp,
    subscription INTEGER NOT NULL,
    range        DATERANGE NOT NULL,
    "issuerId"   TEXT NOT NULL
)
"#;

/// Opens a single-connection pool against `url` and resets the schema, so
/// every benchmarked run starts from an empty table. All statements of a
/// run flow through the one session.
pub async fn connect(url: &str) -> Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(url)
        .await
        .context("failed to connect to postgres")?;
    reset_schema(&pool).await?;
    Ok(pool)
}

/// Drops and recreates the `Request` table.
pub async fn reset_schema(pool: &PgPool) -> Result<()> {
    debug!("resetting schema");
    sqlx::query(DROP_TABLE_SQL)
        .execute(pool)
        .await
        .context("failed to drop the Request table")?;
    sqlx::query(CREATE_TABLE_SQL)
        .execute(pool)
        .await
        .context("failed to create the Request table")?;
    Ok(())
}

/// Number of rows currently in the `Request` table.
pub async fn row_count(pool: &PgPool) -> Result<i64> {
    sqlx::query_scalar(r#"SELECT COUNT(*) FROM "Request""#)
        .fetch_one(pool)
        .await
        .context("failed to count Request rows")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ddl_declares_every_entity_column() {
        for column in ["id", r#""createdAt""#, "subscription", "range", r#""issuerId""#] {
            assert!(CREATE_TABLE_SQL.contains(column), "missing column {column}");
        }
        assert!(CREATE_TABLE_SQL.contains("DATERANGE"));
        assert!(CREATE_TABLE_SQL.contains("SERIAL PRIMARY KEY"));
    }
}
