//! Dialect-neutral SQL construction.
//!
//! Queries are assembled as a small AST ([`Query`], [`Expr`]) and only turned
//! into text by a [`Dialect`]. The measure formulas in [`measure`] sit on top
//! of the two builders in [`query`].

pub mod clause;
pub mod dialect;
pub mod expr;
pub mod measure;
pub mod query;

pub use clause::{Clause, FromClause, apply_where_clause, format_from_clause, format_select_columns};
pub use dialect::{Dialect, compile_to_dialect};
pub use expr::{AggregateFunc, BinaryOperator, Expr, col, lit, qualified, raw};
pub use measure::{measure_proportion_each_column, measure_set_duplication, set_label};
pub use query::{Query, SelectItem, build_aggregate_query, build_select_query};
