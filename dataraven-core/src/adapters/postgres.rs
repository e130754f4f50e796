//! PostgreSQL data source backed by a sqlx pool.
//!
//! Every pooled session is configured with a statement timeout and, unless
//! disabled, `default_transaction_read_only = on`.

use super::{ConnectionConfig, QueryResponse, Row, SqlSource, Value};
use crate::{Result, error::DataRavenError, error::redact_database_url, sql::Dialect};
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row as _};

/// PostgreSQL source.
#[derive(Debug, Clone)]
pub struct PostgresSource {
    pool: PgPool,
}

impl PostgresSource {
    /// Creates a lazily connecting pool for `connection_string`.
    ///
    /// # Errors
    /// Returns a data source error if the URL cannot be turned into a pool
    pub async fn connect(connection_string: &str, config: &ConnectionConfig) -> Result<Self> {
        use sqlx::Executor;

        let query_timeout_secs = config.query_timeout.as_secs();
        let read_only = config.read_only;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connect_timeout)
            .test_before_acquire(true)
            .after_connect(move |conn, _meta| {
                Box::pin(async move {
                    conn.execute(
                        format!("SET statement_timeout = '{}s'", query_timeout_secs).as_str(),
                    )
                    .await?;

                    let app_name = format!("dataraven-{}", env!("CARGO_PKG_VERSION"));
                    conn.execute(format!("SET application_name = '{}'", app_name).as_str())
                        .await?;

                    if read_only {
                        conn.execute("SET default_transaction_read_only = on")
                            .await?;
                    }

                    Ok(())
                })
            })
            .connect_lazy(connection_string)
            .map_err(|e| {
                DataRavenError::data_source(
                    format!(
                        "Failed to create PostgreSQL connection pool to {}",
                        redact_database_url(connection_string)
                    ),
                    e,
                )
            })?;

        Ok(Self { pool })
    }

    /// Wraps an existing pool.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Closes the pool gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SqlSource for PostgresSource {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn execute(&self, sql: &str) -> Result<QueryResponse> {
        let rows = sqlx::query(sql)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| DataRavenError::data_source("PostgreSQL query failed", e))?;

        Ok(QueryResponse::new(rows.iter().map(convert_row).collect()))
    }
}

fn convert_row(row: &PgRow) -> Row {
    Row::new(
        row.columns()
            .iter()
            .map(|column| (column.name().to_string(), extract_value(row, column.ordinal()))),
    )
}

/// Decodes a column by trying the types measure queries produce.
fn extract_value(row: &PgRow, index: usize) -> Value {
    if let Ok(v) = row.try_get::<Option<f64>, _>(index) {
        return v.map_or(Value::Null, Value::Float);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(index) {
        return v.map_or(Value::Null, Value::Int);
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(index) {
        return v.map_or(Value::Null, |n| Value::Int(n.into()));
    }
    if let Ok(v) = row.try_get::<Option<f32>, _>(index) {
        return v.map_or(Value::Null, |n| Value::Float(n.into()));
    }
    if let Ok(v) = row.try_get::<Option<sqlx::types::BigDecimal>, _>(index) {
        return v.map_or(Value::Null, |n| Value::Text(n.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(index) {
        return v.map_or(Value::Null, Value::Bool);
    }
    if let Ok(v) = row.try_get::<Option<String>, _>(index) {
        return v.map_or(Value::Null, Value::Text);
    }

    tracing::debug!(column = index, "Unsupported PostgreSQL column type, reading as NULL");
    Value::Null
}
