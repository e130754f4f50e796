//! Local CSV tables.
//!
//! CSV checks compute their measures here instead of in SQL. Empty fields are
//! NULL. The ratios match the SQL formulas exactly, including the undefined
//! result on a table without rows.

use crate::{Result, error::DataRavenError};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// A CSV file held in memory as a header row plus optional field values.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CsvTable {
    headers: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl CsvTable {
    /// Loads a CSV file with a header row.
    ///
    /// # Errors
    /// Returns an I/O error if the file cannot be opened and a CSV error if it
    /// is malformed
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .map_err(|e| DataRavenError::io(format!("Failed to open {}", path.display()), e))?;
        Self::from_reader(file).map_err(|e| match e {
            DataRavenError::Csv { source, .. } => {
                DataRavenError::csv(format!("Failed to read {}", path.display()), source)
            }
            other => other,
        })
    }

    /// Reads CSV data with a header row from any reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut reader = ::csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader
            .headers()
            .map_err(|e| DataRavenError::csv("Failed to read CSV header", e))?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let width = headers.len();
        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record.map_err(|e| DataRavenError::csv("Failed to read CSV record", e))?;
            let mut row: Vec<Option<String>> = record
                .iter()
                .map(|field| (!field.is_empty()).then(|| field.to_string()))
                .collect();
            // short rows are padded with NULLs
            row.resize(width, None);
            rows.push(row);
        }

        Ok(Self { headers, rows })
    }

    /// Header names in file order.
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    /// Number of data rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the file has no data rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn column_index(&self, column: &str) -> Result<usize> {
        self.headers.iter().position(|h| h == column).ok_or_else(|| {
            DataRavenError::configuration(format!("Column '{}' not found in CSV header", column))
        })
    }

    fn ratio(&self, part: usize) -> Option<f64> {
        let total = self.rows.len();
        (total > 0).then(|| 1.0 - part as f64 / total as f64)
    }

    /// Fraction of NULL values in a column, `None` on an empty table.
    pub fn null_proportion(&self, column: &str) -> Result<Option<f64>> {
        let index = self.column_index(column)?;
        let non_null = self.rows.iter().filter(|row| row[index].is_some()).count();
        Ok(self.ratio(non_null))
    }

    /// `1 - distinct non-NULL values / rows` for one column.
    pub fn duplicate_proportion(&self, column: &str) -> Result<Option<f64>> {
        let index = self.column_index(column)?;
        let distinct: HashSet<&str> = self
            .rows
            .iter()
            .filter_map(|row| row[index].as_deref())
            .collect();
        Ok(self.ratio(distinct.len()))
    }

    /// `1 - distinct tuples / rows` over a set of columns.
    ///
    /// NULLs compare equal to each other, as with `SELECT DISTINCT`.
    pub fn set_duplication<S: AsRef<str>>(&self, columns: &[S]) -> Result<Option<f64>> {
        let indices = columns
            .iter()
            .map(|c| self.column_index(c.as_ref()))
            .collect::<Result<Vec<_>>>()?;

        let distinct: HashSet<Vec<Option<&str>>> = self
            .rows
            .iter()
            .map(|row| indices.iter().map(|&i| row[i].as_deref()).collect())
            .collect();
        Ok(self.ratio(distinct.len()))
    }
}
