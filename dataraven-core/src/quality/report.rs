//! Description templates, log blocks and the final report step every check
//! ends with.

use super::logger::CheckLogger;
use super::outcome::{TestOutcome, TestResults};
use crate::{Result, error::DataRavenError};
use indexmap::IndexMap;

/// Description template for NULL checks.
pub const DEFAULT_NULL_DESCRIPTION: &str =
    "{column} in {source} should have fewer than {threshold} NULL values.";
/// Description template for duplicate checks.
pub const DEFAULT_DUPLICATE_DESCRIPTION: &str =
    "{column} in {source} should have fewer than {threshold} duplicate values.";
/// Description template for set-duplicate checks.
pub const DEFAULT_SET_DUPLICATE_DESCRIPTION: &str =
    "{column} in {source} should have fewer than {threshold} duplicate rows.";

/// Fills the `{column}` and `{threshold}` placeholders of a template.
///
/// # Example
/// ```rust
/// use dataraven_core::quality::format_description;
///
/// let text = format_description("{column} should stay under {threshold}", "price", 0.05);
/// assert_eq!(text, "price should stay under 0.05");
/// ```
pub fn format_description(template: &str, column: &str, threshold: f64) -> String {
    template
        .replace("{column}", column)
        .replace("{threshold}", &threshold.to_string())
}

/// Fills `{source}` ahead of the per-column placeholders.
pub(crate) fn with_source(template: &str, source: &str) -> String {
    template.replace("{source}", source)
}

/// One log block: description, result, measure and threshold.
pub fn format_block(description: &str, outcome: &TestOutcome) -> String {
    format!(
        "{}\nresult: {}\nmeasure: {}\nthreshold: {}",
        description,
        outcome.result,
        outcome.measure_display(),
        outcome.threshold
    )
}

/// An evaluated column waiting to be logged.
#[derive(Debug, Clone)]
pub(crate) struct Evaluated {
    pub label: String,
    pub description: String,
    pub outcome: TestOutcome,
}

/// Logs every outcome, freezes them, then escalates if asked to.
///
/// All blocks are logged before any error is returned.
pub(crate) fn report(
    evaluated: Vec<Evaluated>,
    logger: &dyn CheckLogger,
    raise_on_fail: bool,
) -> Result<TestResults> {
    let mut outcomes = IndexMap::with_capacity(evaluated.len());
    for entry in evaluated {
        let block = format_block(&entry.description, &entry.outcome);
        logger.log_outcome(&block, entry.outcome.result);
        outcomes.insert(entry.label, entry.outcome);
    }

    let results = TestResults::from_outcomes(outcomes);
    if raise_on_fail {
        let failures = results.failures();
        if !failures.is_empty() {
            return Err(DataRavenError::CheckFailed { failures });
        }
    }

    Ok(results)
}
