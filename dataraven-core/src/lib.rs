//! Core query construction, measure logic and check operators for DataRaven.
//!
//! DataRaven evaluates data quality rules (NULL rates, duplicate rates and
//! arbitrary custom predicates) against database tables and CSV files, and
//! turns each measure into a pass/fail outcome against a threshold.
//!
//! # Guarantees
//! - Measures lie in `[0, 1]`; an empty source yields an undefined measure,
//!   which always fails
//! - SQL sources are opened read-only and credentials are redacted from errors
//! - One measure query per check, regardless of the number of columns
//!
//! # Architecture
//! - `sql`: dialect-neutral query AST, builders, dialect rendering and the
//!   measure formulas
//! - `adapters`: the [`SqlSource`] trait, sqlx-backed sources and CSV tables
//! - `quality`: thresholds, outcomes and the check operators

pub mod adapters;
pub mod error;
pub mod logging;
pub mod quality;
pub mod sql;

// Re-export commonly used types
pub use adapters::{ConnectionConfig, CsvTable, SqlSource, create_source};
pub use error::{DataRavenError, Result};
pub use quality::{
    Check, CheckLogger, CheckSuite, CsvCheck, CustomSqlCheck, NoopLogger, SqlCheck, TestOutcome,
    TestResult, TestResults, Threshold, TracingLogger,
};
pub use sql::{Dialect, compile_to_dialect};
