//! Null, duplicate and set-duplicate checks against SQL sources.

use super::logger::CheckLogger;
use super::outcome::{TestOutcome, TestResults};
use super::report::{
    DEFAULT_DUPLICATE_DESCRIPTION, DEFAULT_NULL_DESCRIPTION, DEFAULT_SET_DUPLICATE_DESCRIPTION,
    Evaluated, format_description, report, with_source,
};
use super::threshold::{Threshold, Thresholds};
use crate::adapters::{SqlSource, Value, query_rows};
use crate::sql::{
    AggregateFunc, Clause, Dialect, Query, measure_proportion_each_column,
    measure_set_duplication, set_label,
};
use crate::{Result, error::DataRavenError};
use serde::{Deserialize, Serialize};

/// The measure a check computes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeasureKind {
    /// Fraction of NULL values, per column
    Null,
    /// Fraction of duplicate values, per column
    Duplicate,
    /// Fraction of duplicate rows over the whole column set
    SetDuplicate,
}

impl MeasureKind {
    pub(crate) fn default_description(&self) -> &'static str {
        match self {
            Self::Null => DEFAULT_NULL_DESCRIPTION,
            Self::Duplicate => DEFAULT_DUPLICATE_DESCRIPTION,
            Self::SetDuplicate => DEFAULT_SET_DUPLICATE_DESCRIPTION,
        }
    }

    /// Labels of the outcomes a check over `columns` produces.
    pub(crate) fn labels(&self, columns: &[String]) -> Vec<String> {
        match self {
            Self::Null | Self::Duplicate => columns.to_vec(),
            Self::SetDuplicate => vec![set_label(columns)],
        }
    }
}

/// Validates columns and resolves one threshold per outcome label.
pub(crate) fn prepare_columns<I, C>(
    kind: MeasureKind,
    threshold: Threshold,
    columns: I,
) -> Result<(Vec<String>, Thresholds)>
where
    I: IntoIterator<Item = C>,
    C: Into<String>,
{
    let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
    if columns.is_empty() {
        return Err(DataRavenError::configuration(
            "At least one column is required for a data quality check",
        ));
    }

    let thresholds = threshold.resolve(&kind.labels(&columns))?;
    Ok((columns, thresholds))
}

/// A check that measures a SQL table or view.
///
/// Thresholds are resolved when the check is built, so a mapping that misses
/// a column fails before any query runs.
///
/// # Example
/// ```rust
/// use dataraven_core::quality::SqlCheck;
/// use dataraven_core::sql::Dialect;
///
/// let check = SqlCheck::null("test_schema.Orders", 0.1, ["name", "price"])
///     .unwrap()
///     .with_where(["date(order_ts) = '2020-09-08'"]);
///
/// let sql = check.compile(Dialect::Postgres);
/// assert!(sql.contains("count(price) AS price"));
/// assert!(sql.contains("WHERE date(order_ts) = '2020-09-08'"));
/// ```
#[derive(Debug, Clone)]
pub struct SqlCheck {
    kind: MeasureKind,
    from_clause: String,
    columns: Vec<String>,
    thresholds: Thresholds,
    where_clause: Vec<Clause>,
    description: Option<String>,
    raise_on_fail: bool,
}

impl SqlCheck {
    /// Builds a check of the given kind.
    ///
    /// # Errors
    /// Returns a configuration error if no column is given or the threshold
    /// mapping lacks one
    pub fn new<I, C>(
        kind: MeasureKind,
        from_clause: impl Into<String>,
        threshold: impl Into<Threshold>,
        columns: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        let (columns, thresholds) = prepare_columns(kind, threshold.into(), columns)?;

        Ok(Self {
            kind,
            from_clause: from_clause.into(),
            columns,
            thresholds,
            where_clause: Vec::new(),
            description: None,
            raise_on_fail: false,
        })
    }

    /// NULL-rate check for each column.
    pub fn null<I, C>(
        from_clause: impl Into<String>,
        threshold: impl Into<Threshold>,
        columns: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self::new(MeasureKind::Null, from_clause, threshold, columns)
    }

    /// Duplicate-rate check for each column.
    pub fn duplicate<I, C>(
        from_clause: impl Into<String>,
        threshold: impl Into<Threshold>,
        columns: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self::new(MeasureKind::Duplicate, from_clause, threshold, columns)
    }

    /// Duplicate-row check over a set of columns, reported under one label.
    pub fn set_duplicate<I, C>(
        from_clause: impl Into<String>,
        threshold: impl Into<Threshold>,
        columns: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self::new(MeasureKind::SetDuplicate, from_clause, threshold, columns)
    }

    /// Restricts the measured rows. Predicates are ANDed in order.
    pub fn with_where<I, P>(mut self, where_clause: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Clause>,
    {
        self.where_clause.extend(where_clause.into_iter().map(Into::into));
        self
    }

    /// Replaces the default description template.
    pub fn with_description(mut self, template: impl Into<String>) -> Self {
        self.description = Some(template.into());
        self
    }

    /// Return [`DataRavenError::CheckFailed`] after logging if any column fails.
    pub fn raise_on_fail(mut self, raise: bool) -> Self {
        self.raise_on_fail = raise;
        self
    }

    /// Which measure the check computes.
    pub fn kind(&self) -> MeasureKind {
        self.kind
    }

    /// Resolved per-label thresholds.
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// The abstract measure query.
    pub fn measure_query(&self) -> Query {
        match self.kind {
            MeasureKind::Null => measure_proportion_each_column(
                self.from_clause.as_str(),
                AggregateFunc::Count,
                &self.columns,
                &self.where_clause,
            ),
            MeasureKind::Duplicate => measure_proportion_each_column(
                self.from_clause.as_str(),
                AggregateFunc::CountDistinct,
                &self.columns,
                &self.where_clause,
            ),
            MeasureKind::SetDuplicate => measure_set_duplication(
                self.from_clause.as_str(),
                &self.columns,
                &self.where_clause,
            ),
        }
    }

    /// The measure query as SQL text for a dialect.
    pub fn compile(&self, dialect: Dialect) -> String {
        dialect.render(&self.measure_query())
    }

    /// Runs the check: one query, then evaluation, logging and escalation.
    ///
    /// # Errors
    /// Returns a data source error if the query fails, or
    /// [`DataRavenError::CheckFailed`] if escalation is on and a column fails
    pub async fn run(
        &self,
        source: &dyn SqlSource,
        logger: &dyn CheckLogger,
    ) -> Result<TestResults> {
        let sql = self.compile(source.dialect());
        let rows = query_rows(source, &sql).await?;
        let row = rows.first();

        let template = with_source(
            self.description
                .as_deref()
                .unwrap_or_else(|| self.kind.default_description()),
            &self.from_clause,
        );

        let evaluated = self
            .thresholds
            .iter()
            .map(|(label, threshold)| {
                let measure = row.and_then(|r| r.get(label)).and_then(Value::as_f64);
                Evaluated {
                    label: label.to_string(),
                    description: format_description(&template, label, threshold),
                    outcome: TestOutcome::evaluate(measure, threshold),
                }
            })
            .collect();

        report(evaluated, logger, self.raise_on_fail)
    }
}
