//! Checks driven by a caller-written SQL query.
//!
//! The query decides the outcome itself. Every row it returns must carry a
//! `result` (`test_pass`/`test_fail`) and a `measure`, and may carry a
//! `threshold` and the `column` it describes.

use super::logger::CheckLogger;
use super::outcome::{TestOutcome, TestResult, TestResults};
use super::report::{Evaluated, format_description, report};
use super::threshold::{Threshold, Thresholds};
use crate::adapters::{Row, SqlSource, Value, query_rows};
use crate::{Result, error::DataRavenError};

/// Label given to rows of a column-less query that do not name a column.
const UNNAMED_LABEL: &str = "custom_query";

/// A check whose query and description are templates over `{column}` and
/// `{threshold}`.
///
/// With columns, the query is rendered and executed once per column and the
/// row describing that column is used. Without columns, the query runs once
/// and each returned row becomes one outcome.
#[derive(Debug, Clone)]
pub struct CustomSqlCheck {
    query: String,
    description: String,
    columns: Vec<String>,
    threshold: Option<Threshold>,
    thresholds: Thresholds,
    raise_on_fail: bool,
}

impl CustomSqlCheck {
    /// Builds a check that runs `query` once and trusts the rows it returns.
    pub fn new(query: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            description: description.into(),
            columns: Vec::new(),
            threshold: None,
            thresholds: Thresholds::default(),
            raise_on_fail: false,
        }
    }

    /// Runs the query once per column instead.
    ///
    /// # Errors
    /// Returns a configuration error if a threshold mapping lacks a column
    pub fn with_columns<I, C>(mut self, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self.resolve()?;
        Ok(self)
    }

    /// Sets the threshold substituted for `{threshold}`.
    ///
    /// Without one, each row must report its own `threshold`.
    pub fn with_threshold(mut self, threshold: impl Into<Threshold>) -> Result<Self> {
        self.threshold = Some(threshold.into());
        self.resolve()?;
        Ok(self)
    }

    /// Return [`DataRavenError::CheckFailed`] after logging if any row fails.
    pub fn raise_on_fail(mut self, raise: bool) -> Self {
        self.raise_on_fail = raise;
        self
    }

    /// Columns the query is rendered for; empty when rows name their own.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Query text for every execution [`Self::run`] would perform.
    ///
    /// # Errors
    /// Same as [`Self::render_query`]
    pub fn rendered_queries(&self) -> Result<Vec<String>> {
        if self.columns.is_empty() {
            return Ok(vec![self.render_query(None)?]);
        }
        self.columns
            .iter()
            .map(|column| self.render_query(Some(column)))
            .collect()
    }

    fn resolve(&mut self) -> Result<()> {
        if let Some(threshold) = &self.threshold {
            self.thresholds = threshold.resolve(&self.columns)?;
        }
        Ok(())
    }

    /// Threshold configured for a label, if any.
    fn configured_threshold(&self, label: &str) -> Option<f64> {
        match &self.threshold {
            Some(Threshold::Scalar(value)) => Some(*value),
            Some(Threshold::PerColumn(map)) => map.get(label).copied(),
            None => None,
        }
    }

    /// Query text for one column.
    ///
    /// # Errors
    /// Returns a configuration error if the template uses `{threshold}` but
    /// no threshold is configured for the column
    pub fn render_query(&self, column: Option<&str>) -> Result<String> {
        let mut sql = self.query.clone();
        if let Some(column) = column {
            sql = sql.replace("{column}", column);
        }

        if sql.contains("{threshold}") {
            let threshold = column
                .and_then(|c| self.thresholds.get(c))
                .or_else(|| match &self.threshold {
                    Some(Threshold::Scalar(value)) => Some(*value),
                    _ => None,
                })
                .ok_or_else(|| {
                    DataRavenError::configuration(
                        "Custom query uses {threshold} but no threshold was configured",
                    )
                })?;
            sql = sql.replace("{threshold}", &threshold.to_string());
        }

        Ok(sql)
    }

    /// Executes the query and collects one outcome per tested column.
    ///
    /// # Errors
    /// Returns a configuration error if a requested column has no row or a
    /// row lacks `result`/`measure`, and a data source error if the query
    /// fails
    pub async fn run(
        &self,
        source: &dyn SqlSource,
        logger: &dyn CheckLogger,
    ) -> Result<TestResults> {
        let mut evaluated = Vec::new();

        if self.columns.is_empty() {
            let rows = query_rows(source, &self.render_query(None)?).await?;
            let mut unnamed = 0usize;
            for row in &rows {
                let label = match row_column(row) {
                    Some(column) => column,
                    None => {
                        unnamed += 1;
                        if unnamed == 1 {
                            UNNAMED_LABEL.to_string()
                        } else {
                            format!("{}_{}", UNNAMED_LABEL, unnamed)
                        }
                    }
                };
                evaluated.push(self.evaluate_row(row, label)?);
            }
        } else {
            for column in &self.columns {
                let rows = query_rows(source, &self.render_query(Some(column))?).await?;
                let row = rows
                    .iter()
                    .find(|row| row_column(row).is_none_or(|c| &c == column))
                    .ok_or_else(|| {
                        DataRavenError::configuration(format!(
                            "Custom query returned no row for column '{}'",
                            column
                        ))
                    })?;
                evaluated.push(self.evaluate_row(row, column.clone())?);
            }
        }

        report(evaluated, logger, self.raise_on_fail)
    }

    fn evaluate_row(&self, row: &Row, label: String) -> Result<Evaluated> {
        let result: TestResult = row
            .get("result")
            .ok_or_else(|| missing_field("result"))?
            .to_string()
            .parse()?;
        let measure = row.get("measure").ok_or_else(|| missing_field("measure"))?.as_f64();
        let threshold = self
            .configured_threshold(&label)
            .or_else(|| row.get("threshold").and_then(Value::as_f64))
            .ok_or_else(|| {
                DataRavenError::configuration(format!(
                    "No threshold for '{}': configure one or return a threshold column",
                    label
                ))
            })?;

        // an undefined measure fails even if the query reports a pass
        let result = if measure.is_none() { TestResult::Fail } else { result };

        Ok(Evaluated {
            description: format_description(&self.description, &label, threshold),
            outcome: TestOutcome::new(result, measure, threshold),
            label,
        })
    }
}

fn row_column(row: &Row) -> Option<String> {
    match row.get("column") {
        None | Some(Value::Null) => None,
        Some(value) => Some(value.to_string()),
    }
}

fn missing_field(name: &str) -> DataRavenError {
    DataRavenError::configuration(format!("Custom query must return a '{}' column", name))
}
