//! Adapter-neutral result rows.

use serde::Serialize;

/// A single value returned by a data source.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// Floating point
    Float(f64),
    /// Text or anything decoded as text
    Text(String),
}

impl Value {
    /// True for SQL NULL.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric view of the value.
    ///
    /// Text is parsed, so NUMERIC/DECIMAL columns that a driver hands back as
    /// strings still read as numbers. NULL and non-numeric text yield `None`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(v) => Some(*v as f64),
            Self::Float(v) => Some(*v),
            Self::Text(s) => s.trim().parse().ok(),
            Self::Null | Self::Bool(_) => None,
        }
    }

    /// Text view of the value, if it is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => f.write_str("NULL"),
            Self::Bool(v) => write!(f, "{}", v),
            Self::Int(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Text(v) => f.write_str(v),
        }
    }
}

/// One result row: column names paired with values, in select order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from `(column, value)` pairs.
    pub fn new(fields: impl IntoIterator<Item = (String, Value)>) -> Self {
        let (columns, values) = fields.into_iter().unzip();
        Self { columns, values }
    }

    /// Value of a column by name.
    ///
    /// Exact matches win; otherwise the lookup is case-insensitive, since
    /// some engines fold unquoted aliases to upper or lower case.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let index = self
            .columns
            .iter()
            .position(|c| c == name)
            .or_else(|| self.columns.iter().position(|c| c.eq_ignore_ascii_case(name)))?;
        self.values.get(index)
    }

    /// Value at a position.
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }

    /// Column names in result order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of fields.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True when the row has no fields.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Handle returned by [`super::SqlSource::execute`] and consumed by
/// [`super::SqlSource::fetch`].
#[derive(Debug, Clone, Default)]
pub struct QueryResponse {
    rows: Vec<Row>,
}

impl QueryResponse {
    /// Wrap rows already decoded by a driver.
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    /// Number of rows the query returned.
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Consume the response, yielding its rows.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> Row {
        Row::new([
            ("result".to_string(), Value::Text("test_fail".to_string())),
            ("MEASURE".to_string(), Value::Text("0.366".to_string())),
            ("threshold".to_string(), Value::Float(0.1)),
            ("column".to_string(), Value::Null),
        ])
    }

    #[test]
    fn test_row_lookup() {
        let row = row();
        assert_eq!(row.get("result").and_then(Value::as_str), Some("test_fail"));
        assert_eq!(row.get("measure").and_then(Value::as_f64), Some(0.366));
        assert!(row.get("column").is_some_and(Value::is_null));
        assert!(row.get("missing").is_none());
        assert_eq!(row.len(), 4);
    }

    #[test]
    fn test_value_as_f64() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::Text(" 0.5 ".to_string()).as_f64(), Some(0.5));
        assert_eq!(Value::Text("abc".to_string()).as_f64(), None);
        assert_eq!(Value::Null.as_f64(), None);
        assert_eq!(Value::Bool(true).as_f64(), None);
    }

    #[test]
    fn test_value_display() {
        assert_eq!(Value::Null.to_string(), "NULL");
        assert_eq!(Value::Float(0.15).to_string(), "0.15");
    }
}
