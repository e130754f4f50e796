//! Test outcomes and the frozen result set a check produces.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Pass/fail verdict for one tested column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TestResult {
    /// Measure within threshold
    #[serde(rename = "test_pass")]
    Pass,
    /// Measure above threshold or undefined
    #[serde(rename = "test_fail")]
    Fail,
}

impl TestResult {
    /// Wire name, as returned by custom queries.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pass => "test_pass",
            Self::Fail => "test_fail",
        }
    }

    /// True for [`TestResult::Fail`].
    pub fn is_fail(&self) -> bool {
        matches!(self, Self::Fail)
    }
}

impl std::fmt::Display for TestResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TestResult {
    type Err = crate::error::DataRavenError;

    fn from_str(s: &str) -> crate::Result<Self> {
        match s.trim() {
            "test_pass" => Ok(Self::Pass),
            "test_fail" => Ok(Self::Fail),
            other => Err(crate::error::DataRavenError::configuration(format!(
                "Invalid test result '{}': expected test_pass or test_fail",
                other
            ))),
        }
    }
}

/// Result, measure and threshold of one tested column.
///
/// `measure` is `None` when the source had no rows.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    /// Verdict for the column
    pub result: TestResult,
    /// Violation ratio; `None` when undefined
    pub measure: Option<f64>,
    /// Largest passing measure
    pub threshold: f64,
}

impl TestOutcome {
    /// Outcome with an explicit verdict.
    pub fn new(result: TestResult, measure: Option<f64>, threshold: f64) -> Self {
        Self {
            result,
            measure,
            threshold,
        }
    }

    /// Evaluates a measure against a threshold.
    ///
    /// Undefined measures fail. Otherwise the outcome fails only when the
    /// measure is strictly greater than the threshold.
    ///
    /// # Example
    /// ```rust
    /// use dataraven_core::quality::{TestOutcome, TestResult};
    ///
    /// assert_eq!(TestOutcome::evaluate(Some(0.1), 0.1).result, TestResult::Pass);
    /// assert_eq!(TestOutcome::evaluate(Some(0.15), 0.1).result, TestResult::Fail);
    /// assert_eq!(TestOutcome::evaluate(None, 1.0).result, TestResult::Fail);
    /// ```
    pub fn evaluate(measure: Option<f64>, threshold: f64) -> Self {
        let result = match measure {
            Some(value) if value <= threshold => TestResult::Pass,
            _ => TestResult::Fail,
        };
        Self::new(result, measure, threshold)
    }

    /// True when the verdict is a failure.
    pub fn is_fail(&self) -> bool {
        self.result.is_fail()
    }

    /// Measure as printed in logs: the number, or `NULL` when undefined.
    pub fn measure_display(&self) -> String {
        self.measure
            .map_or_else(|| "NULL".to_string(), |m| m.to_string())
    }
}

impl std::fmt::Display for TestOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} (measure: {}, threshold: {})",
            self.result,
            self.measure_display(),
            self.threshold
        )
    }
}

/// Insertion-ordered mapping of column label to outcome.
///
/// Built once by a check and read-only afterwards.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct TestResults(IndexMap<String, TestOutcome>);

impl TestResults {
    pub(crate) fn from_outcomes(outcomes: IndexMap<String, TestOutcome>) -> Self {
        Self(outcomes)
    }

    /// Outcome for one label.
    pub fn get(&self, label: &str) -> Option<&TestOutcome> {
        self.0.get(label)
    }

    /// Labels and outcomes in test order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &TestOutcome)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Labels in test order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Number of tested labels.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when nothing was tested.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Failing outcomes, in test order.
    pub fn failures(&self) -> Vec<(String, TestOutcome)> {
        self.0
            .iter()
            .filter(|(_, outcome)| outcome.is_fail())
            .map(|(label, outcome)| (label.clone(), *outcome))
            .collect()
    }

    /// True when every label passed.
    pub fn all_passed(&self) -> bool {
        self.0.values().all(|outcome| !outcome.is_fail())
    }
}

impl<'a> IntoIterator for &'a TestResults {
    type Item = (&'a String, &'a TestOutcome);
    type IntoIter = indexmap::map::Iter<'a, String, TestOutcome>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_evaluate_boundaries() {
        let test_cases = [
            (Some(0.0), 0.0, TestResult::Pass),
            (Some(0.1), 0.1, TestResult::Pass),
            (Some(0.15), 0.1, TestResult::Fail),
            (Some(1.0), 1.0, TestResult::Pass),
            (None, 0.0, TestResult::Fail),
            (None, 1.0, TestResult::Fail),
        ];

        for (measure, threshold, expected) in test_cases {
            assert_eq!(
                TestOutcome::evaluate(measure, threshold).result,
                expected,
                "Failed for measure={:?}, threshold={}",
                measure,
                threshold
            );
        }
    }

    #[test]
    fn test_result_round_trip_strings() {
        assert_eq!("test_pass".parse::<TestResult>().unwrap(), TestResult::Pass);
        assert_eq!(TestResult::Fail.to_string(), "test_fail");
        assert!("passed".parse::<TestResult>().is_err());
    }

    #[test]
    fn test_results_serialize_in_order() {
        let mut outcomes = IndexMap::new();
        outcomes.insert("price".to_string(), TestOutcome::evaluate(Some(0.0), 0.0));
        outcomes.insert("id".to_string(), TestOutcome::evaluate(None, 0.0));
        let results = TestResults::from_outcomes(outcomes);

        let json = serde_json::to_string(&results).unwrap();
        assert_eq!(
            json,
            r#"{"price":{"result":"test_pass","measure":0.0,"threshold":0.0},"id":{"result":"test_fail","measure":null,"threshold":0.0}}"#
        );
        assert_eq!(results.failures().len(), 1);
        assert!(!results.all_passed());
    }

    #[test]
    fn test_outcome_display_undefined_measure() {
        let outcome = TestOutcome::evaluate(None, 0.0);
        assert_eq!(outcome.to_string(), "test_fail (measure: NULL, threshold: 0)");
    }
}
