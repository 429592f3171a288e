//! Presentation-agnostic report payloads
//!
//! Reshapes an [`EvaluationResult`](crate::evaluator::EvaluationResult)
//! into grouped table rows and single-metric drill-down payloads. The
//! structures here are consumed by an external UI layer but depend on
//! no display technology.

pub mod explanation;
pub mod rows;

pub use explanation::{metric_explanation, signal_explanation, MetricExplanation, SignalExplanation};
pub use rows::{build_table_rows, RowGroup, RowMode, TableRow};
