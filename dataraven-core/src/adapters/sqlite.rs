//! SQLite data source.
//!
//! # Connection Modes
//! - File-based: `sqlite:///path/to/database.db` or a bare `*.db` path
//! - In-memory: `sqlite::memory:` or `:memory:`

use super::{ConnectionConfig, QueryResponse, Row, SqlSource, Value};
use crate::{Result, error::DataRavenError, sql::Dialect};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::{Column, Row as _};
use std::str::FromStr;

/// SQLite source.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    pool: SqlitePool,
}

impl SqliteSource {
    /// Opens a SQLite database, read-only unless the config says otherwise.
    ///
    /// # Errors
    /// Returns error if the path is malformed or the file cannot be opened
    pub async fn connect(connection_string: &str, config: &ConnectionConfig) -> Result<Self> {
        let normalized = normalize_connection_string(connection_string);

        let mut options = SqliteConnectOptions::from_str(&normalized).map_err(|e| {
            DataRavenError::configuration(format!("Invalid SQLite connection string: {}", e))
        })?;

        if config.read_only {
            options = options.read_only(true);
        }

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .acquire_timeout(config.connect_timeout)
            .connect_with(options)
            .await
            .map_err(|e| DataRavenError::data_source("Failed to open SQLite database", e))?;

        Ok(Self { pool })
    }

    /// Wraps an existing pool, e.g. an in-memory database prepared by a caller.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Closes the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SqlSource for SqliteSource {
    fn dialect(&self) -> Dialect {
        Dialect::Sqlite
    }

    async fn execute(&self, sql: &str) -> Result<QueryResponse> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DataRavenError::data_source("SQLite query failed", e))?;

        Ok(QueryResponse::new(rows.iter().map(convert_row).collect()))
    }
}

/// Normalizes a bare path or `:memory:` to a SQLite URL.
fn normalize_connection_string(connection_string: &str) -> String {
    if connection_string == ":memory:" {
        return "sqlite::memory:".to_string();
    }

    if connection_string.starts_with("sqlite:") {
        return connection_string.to_string();
    }

    format!("sqlite://{}", connection_string)
}

fn convert_row(row: &SqliteRow) -> Row {
    Row::new(
        row.columns()
            .iter()
            .map(|column| (column.name().to_string(), extract_value(row, column.ordinal()))),
    )
}

// SQLite is dynamically typed, so each value is decoded by trying types in turn.
fn extract_value(row: &SqliteRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map_or(Value::Null, Value::Int);
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map_or(Value::Null, Value::Float);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map_or(Value::Null, Value::Text);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map_or(Value::Null, Value::Bool);
    }

    tracing::debug!(column = index, "Unsupported SQLite column type, reading as NULL");
    Value::Null
}
