//! Check suites: a JSON document listing the checks to run.
//!
//! ```json
//! {
//!   "checks": [
//!     { "type": "sql_null", "from": "test_schema.Orders",
//!       "columns": ["name", "price"], "threshold": 0.05,
//!       "where": ["date(order_ts) = '2020-09-08'"] },
//!     { "type": "csv_set_duplicate", "path": "contacts.csv",
//!       "columns": ["first_name", "last_name"], "threshold": 0 }
//!   ]
//! }
//! ```

use super::csv_check::CsvCheck;
use super::custom_check::CustomSqlCheck;
use super::logger::CheckLogger;
use super::outcome::TestResults;
use super::sql_check::{MeasureKind, SqlCheck};
use super::threshold::Threshold;
use crate::adapters::SqlSource;
use crate::{Result, error::DataRavenError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One entry of a suite file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CheckConfig {
    /// `sql_null`
    SqlNull(SqlCheckConfig),
    /// `sql_duplicate`
    SqlDuplicate(SqlCheckConfig),
    /// `sql_set_duplicate`
    SqlSetDuplicate(SqlCheckConfig),
    /// `csv_null`
    CsvNull(CsvCheckConfig),
    /// `csv_duplicate`
    CsvDuplicate(CsvCheckConfig),
    /// `csv_set_duplicate`
    CsvSetDuplicate(CsvCheckConfig),
    /// `custom_sql`
    CustomSql(CustomCheckConfig),
}

/// Settings shared by the three SQL checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlCheckConfig {
    /// Table name or FROM fragment
    pub from: String,
    /// Columns to test
    pub columns: Vec<String>,
    /// Scalar or per-column threshold
    pub threshold: Threshold,
    /// Predicates ANDed in order (`where` in JSON)
    #[serde(default, rename = "where")]
    pub where_clause: Vec<String>,
    /// Overrides the default description template
    #[serde(default)]
    pub description: Option<String>,
    /// Escalate failures after logging
    #[serde(default)]
    pub raise_on_fail: bool,
}

/// Settings shared by the three CSV checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CsvCheckConfig {
    /// CSV file with a header row
    pub path: PathBuf,
    /// Columns to test
    pub columns: Vec<String>,
    /// Scalar or per-column threshold
    pub threshold: Threshold,
    /// Overrides the default description template
    #[serde(default)]
    pub description: Option<String>,
    /// Escalate failures after logging
    #[serde(default)]
    pub raise_on_fail: bool,
}

/// Settings for a custom query check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomCheckConfig {
    /// Query template with `{column}` and `{threshold}` placeholders
    pub query: String,
    /// Description template
    pub description: String,
    /// Columns to run the query for; empty runs it once
    #[serde(default)]
    pub columns: Vec<String>,
    /// Threshold, unless the query returns its own
    #[serde(default)]
    pub threshold: Option<Threshold>,
    /// Escalate failures after logging
    #[serde(default)]
    pub raise_on_fail: bool,
}

/// A parsed suite file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckSuite {
    /// Checks in run order
    pub checks: Vec<CheckConfig>,
}

impl CheckSuite {
    /// Parses a suite from JSON text.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| DataRavenError::serialization("Invalid check suite", e))
    }

    /// Reads and parses a suite file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| DataRavenError::io(format!("Failed to read {}", path.display()), e))?;
        serde_json::from_str(&json).map_err(|e| {
            DataRavenError::serialization(format!("Invalid check suite {}", path.display()), e)
        })
    }

    /// Builds every check, resolving thresholds up front.
    ///
    /// # Errors
    /// Returns the first configuration error; no check is built partially
    pub fn build(&self) -> Result<Vec<Check>> {
        self.checks.iter().cloned().map(Check::try_from).collect()
    }
}

/// A built check of any variant.
#[derive(Debug, Clone)]
pub enum Check {
    /// NULL, duplicate or set-duplicate check against a database
    Sql(SqlCheck),
    /// Check against a CSV file
    Csv(CsvCheck),
    /// Custom query check
    Custom(CustomSqlCheck),
}

impl Check {
    /// Whether the check needs a SQL source to run.
    pub fn needs_sql_source(&self) -> bool {
        !matches!(self, Self::Csv(_))
    }

    /// Short description for progress logs.
    pub fn name(&self) -> String {
        match self {
            Self::Sql(check) => format!("sql {:?} check", check.kind()).to_lowercase(),
            Self::Csv(check) => format!("csv check on {}", check.path().display()),
            Self::Custom(_) => "custom sql check".to_string(),
        }
    }

    /// Runs the check.
    ///
    /// # Errors
    /// Returns a configuration error if a SQL check is run without a source,
    /// plus whatever the check itself returns
    pub async fn run(
        &self,
        source: Option<&dyn SqlSource>,
        logger: &dyn CheckLogger,
    ) -> Result<TestResults> {
        match self {
            Self::Csv(check) => check.run(logger),
            Self::Sql(check) => check.run(require_source(source)?, logger).await,
            Self::Custom(check) => check.run(require_source(source)?, logger).await,
        }
    }
}

fn require_source(source: Option<&dyn SqlSource>) -> Result<&dyn SqlSource> {
    source.ok_or_else(|| {
        DataRavenError::configuration("SQL checks require a database connection (--database-url)")
    })
}

impl TryFrom<CheckConfig> for Check {
    type Error = DataRavenError;

    fn try_from(config: CheckConfig) -> Result<Self> {
        let check = match config {
            CheckConfig::SqlNull(c) => Self::Sql(sql_check(MeasureKind::Null, c)?),
            CheckConfig::SqlDuplicate(c) => Self::Sql(sql_check(MeasureKind::Duplicate, c)?),
            CheckConfig::SqlSetDuplicate(c) => Self::Sql(sql_check(MeasureKind::SetDuplicate, c)?),
            CheckConfig::CsvNull(c) => Self::Csv(csv_check(MeasureKind::Null, c)?),
            CheckConfig::CsvDuplicate(c) => Self::Csv(csv_check(MeasureKind::Duplicate, c)?),
            CheckConfig::CsvSetDuplicate(c) => Self::Csv(csv_check(MeasureKind::SetDuplicate, c)?),
            CheckConfig::CustomSql(c) => {
                let mut check = CustomSqlCheck::new(c.query, c.description)
                    .with_columns(c.columns)?
                    .raise_on_fail(c.raise_on_fail);
                if let Some(threshold) = c.threshold {
                    check = check.with_threshold(threshold)?;
                }
                Self::Custom(check)
            }
        };
        Ok(check)
    }
}

fn sql_check(kind: MeasureKind, config: SqlCheckConfig) -> Result<SqlCheck> {
    let mut check = SqlCheck::new(kind, config.from, config.threshold, config.columns)?
        .with_where(config.where_clause)
        .raise_on_fail(config.raise_on_fail);
    if let Some(description) = config.description {
        check = check.with_description(description);
    }
    Ok(check)
}

fn csv_check(kind: MeasureKind, config: CsvCheckConfig) -> Result<CsvCheck> {
    let mut check = CsvCheck::new(kind, config.path, config.threshold, config.columns)?
        .raise_on_fail(config.raise_on_fail);
    if let Some(description) = config.description {
        check = check.with_description(description);
    }
    Ok(check)
}
