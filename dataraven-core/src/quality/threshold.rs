//! Threshold parameters and their resolution to one value per column.

use crate::{Result, error::DataRavenError};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Maximum acceptable measure, for every column or per column.
///
/// Deserializes from either a number or a `{"column": number}` object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Threshold {
    /// One threshold for every column
    Scalar(f64),
    /// Threshold per column or set label
    PerColumn(IndexMap<String, f64>),
}

impl From<f64> for Threshold {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<IndexMap<String, f64>> for Threshold {
    fn from(value: IndexMap<String, f64>) -> Self {
        Self::PerColumn(value)
    }
}

impl<K: Into<String>, const N: usize> From<[(K, f64); N]> for Threshold {
    fn from(value: [(K, f64); N]) -> Self {
        Self::PerColumn(value.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }
}

impl Threshold {
    /// Resolves to exactly one threshold per column, in column order.
    ///
    /// A scalar is broadcast to every column. A mapping must name every
    /// column; entries for other columns are ignored.
    ///
    /// # Errors
    /// Returns a configuration error naming the first column the mapping
    /// lacks
    pub fn resolve<S: AsRef<str>>(&self, columns: &[S]) -> Result<Thresholds> {
        let resolved = columns
            .iter()
            .map(|column| {
                let column = column.as_ref();
                let value = match self {
                    Self::Scalar(value) => *value,
                    Self::PerColumn(map) => *map.get(column).ok_or_else(|| {
                        DataRavenError::configuration(format!(
                            "No threshold given for column '{}'",
                            column
                        ))
                    })?,
                };
                Ok((column.to_string(), value))
            })
            .collect::<Result<IndexMap<_, _>>>()?;

        Ok(Thresholds(resolved))
    }
}

/// Canonical per-column thresholds, produced once by [`Threshold::resolve`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Thresholds(IndexMap<String, f64>);

impl Thresholds {
    /// Threshold for one label.
    pub fn get(&self, column: &str) -> Option<f64> {
        self.0.get(column).copied()
    }

    /// Columns in resolution order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Labels and thresholds in resolution order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    /// Number of labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when no label was resolved.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scalar_broadcasts() {
        let thresholds = Threshold::from(0.05).resolve(&["c1", "c2"]).unwrap();
        assert_eq!(thresholds.get("c1"), Some(0.05));
        assert_eq!(thresholds.get("c2"), Some(0.05));
        assert_eq!(thresholds.len(), 2);
    }

    #[test]
    fn test_mapping_keeps_column_order() {
        let threshold = Threshold::from([("b", 0.2), ("a", 0.1), ("unused", 1.0)]);
        let thresholds = threshold.resolve(&["a", "b"]).unwrap();
        assert_eq!(thresholds.columns().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(thresholds.get("b"), Some(0.2));
        assert_eq!(thresholds.get("unused"), None);
    }

    #[test]
    fn test_mapping_missing_column() {
        let threshold = Threshold::from([("a", 0.1)]);
        let err = threshold.resolve(&["a", "price"]).unwrap_err();
        assert!(matches!(err, DataRavenError::Configuration { .. }));
        assert!(err.to_string().contains("price"));
    }

    #[test]
    fn test_deserialize_untagged() {
        let scalar: Threshold = serde_json::from_str("0.1").unwrap();
        assert_eq!(scalar, Threshold::Scalar(0.1));

        let mapping: Threshold = serde_json::from_str(r#"{"id": 0, "name": 0.5}"#).unwrap();
        assert_eq!(mapping, Threshold::from([("id", 0.0), ("name", 0.5)]));
    }
}
