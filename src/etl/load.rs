/// Load Module
///
/// Handles storing tabular batches into PostgreSQL.
///
/// Loads are append-only: plain INSERTs with no conflict target, no
/// deduplication, and no uniqueness enforcement - at-least-once semantics
/// per call. All rows of a batch go through one database transaction; a
/// failed load is reported as zero rows written and the caller treats the
/// whole extraction's persistence as aborted.
use crate::db::TableRef;
use crate::error::EtlError;
use crate::etl::transform::{Column, ColumnValues, TabularBatch};
use sqlx::PgPool;

/// How rows are written to the target. Append adds rows without checking
/// for or replacing existing ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadMode {
    Append,
}

/// Write every row of `batch` to `target`, returning the number of rows
/// written (equal to the batch row count on success). An empty batch is a
/// no-op and reports zero rows.
pub async fn load(pool: &PgPool, batch: &TabularBatch, target: &TableRef, mode: LoadMode) -> Result<u64, EtlError> {
    match mode {
        LoadMode::Append => {}
    }

    if batch.is_empty() {
        return Ok(0);
    }

    let statement = insert_statement(target, batch.columns())?;

    let mut tx = pool.begin().await?;

    for row in 0..batch.row_count() {
        let mut query = sqlx::query(&statement);
        for column in batch.columns() {
            query = match &column.values {
                ColumnValues::Float(values) => query.bind(values[row]),
                ColumnValues::Int(values) => query.bind(values[row]),
                ColumnValues::BigInt(values) => query.bind(values[row]),
                ColumnValues::Text(values) => query.bind(values[row].clone()),
                ColumnValues::Timestamp(values) => query.bind(values[row]),
            };
        }
        query.execute(&mut *tx).await?;
    }

    tx.commit().await?;

    let rows = batch.row_count() as u64;
    tracing::info!("Loaded {} rows into {}", rows, target);
    Ok(rows)
}

/// Build the parameterized single-row INSERT for a batch's column set.
///
/// Column names are validated as identifiers and double-quoted; `timestamp`
/// in particular is a PostgreSQL keyword.
fn insert_statement(target: &TableRef, columns: &[Column]) -> Result<String, EtlError> {
    let mut names = Vec::with_capacity(columns.len());
    let mut placeholders = Vec::with_capacity(columns.len());

    for (index, column) in columns.iter().enumerate() {
        if !crate::db::is_identifier(&column.name) {
            return Err(crate::db::invalid_identifier(&column.name));
        }
        names.push(format!("\"{}\"", column.name));
        placeholders.push(format!("${}", index + 1));
    }

    Ok(format!("INSERT INTO {} ({}) VALUES ({})", target, names.join(", "), placeholders.join(", ")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_statement_shape() {
        let target = TableRef::historical_data();
        let columns = vec![
            Column::new("coin_id", ColumnValues::Text(vec![Some("bitcoin".to_string())])),
            Column::new("timestamp", ColumnValues::Timestamp(vec![None])),
            Column::new("price", ColumnValues::Float(vec![Some(1.0)])),
        ];

        let statement = insert_statement(&target, &columns).unwrap();
        assert_eq!(
            statement,
            "INSERT INTO raw_data.historical_data (\"coin_id\", \"timestamp\", \"price\") VALUES ($1, $2, $3)"
        );
    }

    #[test]
    fn test_insert_statement_rejects_bad_column_name() {
        let target = TableRef::historical_data();
        let columns = vec![Column::new("price; --", ColumnValues::Float(vec![Some(1.0)]))];

        let err = insert_statement(&target, &columns).unwrap_err();
        assert!(matches!(err, EtlError::Load(_)));
    }
}
