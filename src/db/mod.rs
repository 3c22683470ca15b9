/// Database Module
///
/// This module handles all PostgreSQL database operations including:
/// - Connection pool management
/// - Schema migrations
/// - Table addressing and metadata queries (row counts, latest extraction)
/// - The append-only extraction audit log
use crate::error::EtlError;
use crate::models::ExtractionLogEntry;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::fmt;

/// A (schema, table) storage target.
///
/// Both parts are validated as SQL identifiers at construction so that
/// statements built from a `TableRef` never interpolate untrusted text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    schema: String,
    table: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Result<Self, EtlError> {
        let schema = schema.into();
        let table = table.into();
        if !is_identifier(&schema) {
            return Err(invalid_identifier(&schema));
        }
        if !is_identifier(&table) {
            return Err(invalid_identifier(&table));
        }

        Ok(Self { schema, table })
    }

    #[allow(dead_code)]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    #[allow(dead_code)]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// The destination for current per-coin market snapshots.
    pub fn cryptocurrency_data() -> Self {
        Self::known("raw_data", "cryptocurrency_data")
    }

    /// The destination for aligned historical time-series rows.
    pub fn historical_data() -> Self {
        Self::known("raw_data", "historical_data")
    }

    /// The destination for global market statistics.
    pub fn global_market_data() -> Self {
        Self::known("raw_data", "global_market_data")
    }

    /// The extraction audit log.
    pub fn extraction_log() -> Self {
        Self::known("raw_data", "extraction_log")
    }

    // Compile-time-known identifiers skip the validation path.
    fn known(schema: &str, table: &str) -> Self {
        Self { schema: schema.to_string(), table: table.to_string() }
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.table)
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub(crate) fn invalid_identifier(name: &str) -> EtlError {
    EtlError::Load(sqlx::Error::Configuration(format!("invalid identifier: {:?}", name).into()))
}

pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("Failed to connect to PostgreSQL database")?;

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Run database migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await.context("Failed to run database migrations")?;

        tracing::info!("Database migrations completed successfully");
        Ok(())
    }

    /// Test the database connection
    pub async fn test_connection(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await.context("Database connection test failed")?;

        Ok(())
    }

    /// Latest `extracted_at` value in a table, None when the table is empty.
    pub async fn latest_extraction_time(&self, target: &TableRef) -> Result<Option<DateTime<Utc>>, EtlError> {
        let query = format!("SELECT MAX(extracted_at) FROM {}", target);
        let latest = sqlx::query_scalar::<_, Option<DateTime<Utc>>>(&query).fetch_one(&self.pool).await?;

        Ok(latest)
    }

    /// Number of rows in a table.
    pub async fn table_row_count(&self, target: &TableRef) -> Result<i64, EtlError> {
        let query = format!("SELECT COUNT(*) FROM {}", target);
        let count = sqlx::query_scalar::<_, i64>(&query).fetch_one(&self.pool).await?;

        Ok(count)
    }

    /// Remove all rows from a table.
    #[allow(dead_code)]
    pub async fn truncate(&self, target: &TableRef) -> Result<(), EtlError> {
        let query = format!("TRUNCATE TABLE {}", target);
        sqlx::query(&query).execute(&self.pool).await?;

        tracing::info!("Truncated table {}", target);
        Ok(())
    }

    /// Per-schema table counts, excluding the system schemas.
    pub async fn schema_summary(&self) -> Result<Vec<SchemaInfo>, EtlError> {
        let summary = sqlx::query_as::<_, SchemaInfo>(
            r#"
            SELECT table_schema AS schema_name, COUNT(*) AS table_count
            FROM information_schema.tables
            WHERE table_schema NOT IN ('pg_catalog', 'information_schema')
            GROUP BY table_schema
            ORDER BY table_schema
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(summary)
    }

    /// Tables in one schema.
    #[allow(dead_code)]
    pub async fn list_tables(&self, schema: &str) -> Result<Vec<TableInfo>, EtlError> {
        let tables = sqlx::query_as::<_, TableInfo>(
            r#"
            SELECT table_schema, table_name, table_type
            FROM information_schema.tables
            WHERE table_schema = $1
            ORDER BY table_name
            "#,
        )
        .bind(schema)
        .fetch_all(&self.pool)
        .await?;

        Ok(tables)
    }

    /// Append one row to the extraction audit log. The log is append-only;
    /// nothing in this crate updates or deletes it.
    pub async fn insert_extraction_log(&self, entry: &ExtractionLogEntry) -> Result<(), EtlError> {
        sqlx::query(
            r#"
            INSERT INTO raw_data.extraction_log (
                extraction_type,
                status,
                records_extracted,
                records_inserted,
                error_message,
                start_time,
                end_time,
                duration_seconds
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(entry.extraction_type.as_str())
        .bind(entry.status.as_str())
        .bind(entry.records_extracted)
        .bind(entry.records_inserted)
        .bind(entry.error_message.as_deref())
        .bind(entry.start_time)
        .bind(entry.end_time)
        .bind(entry.duration_seconds)
        .execute(&self.pool)
        .await?;

        tracing::info!("Logged extraction: {} - {}", entry.extraction_type.as_str(), entry.status.as_str());
        Ok(())
    }
}

/// Per-schema table count from information_schema
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SchemaInfo {
    pub schema_name: String,
    pub table_count: i64,
}

/// One table listing from information_schema
#[derive(Debug, Clone, sqlx::FromRow)]
#[allow(dead_code)]
pub struct TableInfo {
    pub table_schema: String,
    pub table_name: String,
    pub table_type: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_ref_display() {
        let target = TableRef::new("raw_data", "historical_data").unwrap();
        assert_eq!(target.to_string(), "raw_data.historical_data");
    }

    #[test]
    fn test_table_ref_rejects_bad_identifiers() {
        assert!(TableRef::new("raw_data", "coins; DROP TABLE x").is_err());
        assert!(TableRef::new("", "historical_data").is_err());
        assert!(TableRef::new("raw-data", "historical_data").is_err());
        assert!(TableRef::new("raw_data", "1table").is_err());
    }

    #[test]
    fn test_table_ref_invalid_is_load_error() {
        let err = TableRef::new("raw_data", "bad.table").unwrap_err();
        assert!(matches!(err, EtlError::Load(_)));
    }

    #[test]
    fn test_known_targets() {
        assert_eq!(TableRef::historical_data().to_string(), "raw_data.historical_data");
        assert_eq!(TableRef::cryptocurrency_data().to_string(), "raw_data.cryptocurrency_data");
        assert_eq!(TableRef::extraction_log().to_string(), "raw_data.extraction_log");
        assert_eq!(TableRef::global_market_data().to_string(), "raw_data.global_market_data");
    }
}
