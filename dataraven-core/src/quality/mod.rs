//! Data quality checks.
//!
//! A check is built first, which resolves its thresholds, and then run
//! against a data source. Running produces a frozen [`TestResults`]:
//! - **SQL checks** ([`SqlCheck`]): NULL rate, duplicate rate and duplicate
//!   rows, each computed by one measure query
//! - **CSV checks** ([`CsvCheck`]): the same measures computed locally
//! - **Custom checks** ([`CustomSqlCheck`]): the query reports its own outcome
//!
//! Every tested column is logged through a [`CheckLogger`] before a failing
//! check escalates.
//!
//! # Example
//! ```rust,ignore
//! use dataraven_core::quality::{SqlCheck, TracingLogger};
//!
//! let check = SqlCheck::null("test_schema.Orders", 0.0, ["name", "price"])?;
//! let results = check.run(source.as_ref(), &TracingLogger).await?;
//! assert!(results.all_passed());
//! ```

mod csv_check;
mod custom_check;
mod logger;
mod outcome;
mod report;
mod sql_check;
mod suite;
mod threshold;

// Re-export public API
pub use csv_check::CsvCheck;
pub use custom_check::CustomSqlCheck;
pub use logger::{CheckLogger, NoopLogger, TracingLogger};
pub use outcome::{TestOutcome, TestResult, TestResults};
pub use report::{
    DEFAULT_DUPLICATE_DESCRIPTION, DEFAULT_NULL_DESCRIPTION, DEFAULT_SET_DUPLICATE_DESCRIPTION,
    format_block, format_description,
};
pub use sql_check::{MeasureKind, SqlCheck};
pub use suite::{Check, CheckConfig, CheckSuite, CsvCheckConfig, CustomCheckConfig, SqlCheckConfig};
pub use threshold::{Threshold, Thresholds};
