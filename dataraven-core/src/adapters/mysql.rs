//! MySQL data source backed by a sqlx pool.

use super::{ConnectionConfig, QueryResponse, Row, SqlSource, Value};
use crate::{Result, error::DataRavenError, error::redact_database_url, sql::Dialect};
use async_trait::async_trait;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row as _};

/// MySQL source.
#[derive(Debug, Clone)]
pub struct MySqlSource {
    pool: MySqlPool,
}

impl MySqlSource {
    /// Creates a lazily connecting pool for `connection_string`.
    pub async fn connect(connection_string: &str, config: &ConnectionConfig) -> Result<Self> {
        use sqlx::Executor;

        let query_timeout_secs = config.query_timeout.as_secs();
        let read_only = config.read_only;

        let pool = MySqlPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .test_before_acquire(true)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    conn.execute(
                        format!("SET max_execution_time = {}", query_timeout_secs * 1000).as_str(),
                    )
                    .await?;

                    if read_only {
                        conn.execute("SET SESSION TRANSACTION READ ONLY").await?;
                    }

                    Ok(())
                })
            })
            .connect_lazy(connection_string)
            .map_err(|e| {
                DataRavenError::data_source(
                    format!(
                        "Failed to create MySQL connection pool to {}",
                        redact_database_url(connection_string)
                    ),
                    e,
                )
            })?;

        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Closes the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SqlSource for MySqlSource {
    fn dialect(&self) -> Dialect {
        Dialect::MySql
    }

    async fn execute(&self, sql: &str) -> Result<QueryResponse> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DataRavenError::data_source("MySQL query failed", e))?;

        Ok(QueryResponse::new(rows.iter().map(convert_row).collect()))
    }
}

fn convert_row(row: &MySqlRow) -> Row {
    Row::new(
        row.columns()
            .iter()
            .map(|column| (column.name().to_string(), extract_value(row, column.ordinal()))),
    )
}

// CAST(... AS FLOAT) yields a single-precision FLOAT in MySQL, and literals
// such as 0.1 come back as DECIMAL.
fn extract_value(row: &MySqlRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map_or(Value::Null, Value::Float);
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(index) {
        return v.map_or(Value::Null, |n| Value::Float(n.into()));
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map_or(Value::Null, Value::Int);
    }
    if let Ok(v) = row.try_get::<Option<sqlx::types::BigDecimal>, _>(index) {
        return v.map_or(Value::Null, |n| Value::Text(n.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map_or(Value::Null, Value::Text);
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map_or(Value::Null, Value::Bool);
    }

    tracing::debug!(column = index, "Unsupported MySQL column type, reading as NULL");
    Value::Null
}
