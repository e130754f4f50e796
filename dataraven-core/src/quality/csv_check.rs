//! Null, duplicate and set-duplicate checks against CSV files.

use super::logger::CheckLogger;
use super::outcome::{TestOutcome, TestResults};
use super::report::{Evaluated, format_description, report, with_source};
use super::sql_check::{MeasureKind, prepare_columns};
use super::threshold::{Threshold, Thresholds};
use crate::Result;
use crate::adapters::CsvTable;
use std::path::{Path, PathBuf};

/// A check computed locally over a CSV file.
///
/// Measures follow the SQL formulas: empty fields are NULL and a file with no
/// data rows yields an undefined (failing) measure.
#[derive(Debug, Clone)]
pub struct CsvCheck {
    kind: MeasureKind,
    path: PathBuf,
    columns: Vec<String>,
    thresholds: Thresholds,
    description: Option<String>,
    raise_on_fail: bool,
}

impl CsvCheck {
    /// Builds a check of the given kind.
    ///
    /// # Errors
    /// Returns a configuration error if no column is given or the threshold
    /// mapping lacks one
    pub fn new<I, C>(
        kind: MeasureKind,
        path: impl Into<PathBuf>,
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
            path: path.into(),
            columns,
            thresholds,
            description: None,
            raise_on_fail: false,
        })
    }

    /// NULL rate per column; an empty field counts as NULL.
    pub fn null<I, C>(
        path: impl Into<PathBuf>,
        threshold: impl Into<Threshold>,
        columns: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self::new(MeasureKind::Null, path, threshold, columns)
    }

    /// Duplicate rate per column.
    pub fn duplicate<I, C>(
        path: impl Into<PathBuf>,
        threshold: impl Into<Threshold>,
        columns: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self::new(MeasureKind::Duplicate, path, threshold, columns)
    }

    /// Duplicate-row rate over the whole column set.
    pub fn set_duplicate<I, C>(
        path: impl Into<PathBuf>,
        threshold: impl Into<Threshold>,
        columns: I,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<String>,
    {
        Self::new(MeasureKind::SetDuplicate, path, threshold, columns)
    }

    /// Replaces the default description template.
    pub fn with_description(mut self, template: impl Into<String>) -> Self {
        self.description = Some(template.into());
        self
    }

    /// Return [`crate::error::DataRavenError::CheckFailed`] after logging if
    /// any column fails.
    pub fn raise_on_fail(mut self, raise: bool) -> Self {
        self.raise_on_fail = raise;
        self
    }

    /// File the check reads.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Resolved per-label thresholds.
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    /// Loads the file and runs the check.
    ///
    /// # Errors
    /// Returns an I/O or CSV error if the file cannot be read, a
    /// configuration error if a column is not in the header, or
    /// `CheckFailed` on escalation
    pub fn run(&self, logger: &dyn CheckLogger) -> Result<TestResults> {
        let table = CsvTable::from_path(&self.path)?;
        self.run_on_table(&table, logger)
    }

    /// Runs the check over an already loaded table.
    pub fn run_on_table(&self, table: &CsvTable, logger: &dyn CheckLogger) -> Result<TestResults> {
        tracing::debug!(path = %self.path.display(), rows = table.len(), "Measuring CSV table");

        let template = with_source(
            self.description
                .as_deref()
                .unwrap_or_else(|| self.kind.default_description()),
            &self.path.display().to_string(),
        );

        let evaluated = self
            .thresholds
            .iter()
            .map(|(label, threshold)| {
                let measure = match self.kind {
                    MeasureKind::Null => table.null_proportion(label)?,
                    MeasureKind::Duplicate => table.duplicate_proportion(label)?,
                    MeasureKind::SetDuplicate => table.set_duplication(&self.columns)?,
                };
                Ok(Evaluated {
                    label: label.to_string(),
                    description: format_description(&template, label, threshold),
                    outcome: TestOutcome::evaluate(measure, threshold),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        report(evaluated, logger, self.raise_on_fail)
    }
}
