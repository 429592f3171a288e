//! Sap Analyzer Rust Implementation
//!
//! Evaluation engine for plant sap nutrient measurements: classifies
//! raw and derived (ratio) values against crop- and tissue-specific
//! reference bands, compares new-growth vs old-growth readings to infer
//! physiological patterns, and rolls many nutrients into ranked
//! system-level verdicts with confidence heuristics.
//!
//! The engine is a pure library boundary: no I/O, no persistence, no
//! global state. Callers supply a [`SampleDate`] and a [`Ruleset`] and
//! get back a structurally complete [`EvaluationResult`]; malformed
//! input degrades to data values (Unknown status, null deltas), never
//! to an error.

pub mod evaluator;
pub mod metrics;
pub mod report;
pub mod ruleset;
pub mod sample;

// Re-export commonly used types
pub use evaluator::{evaluate, evaluate_batch, EvaluationResult};
pub use metrics::{
    classify, delta, signal, trend, Confidence, Delta, Direction, Issue, LeafSignal, SignalKind,
    Status, StatusResult, SystemStatus, TrendDirection, TrendResult,
};
pub use report::{build_table_rows, metric_explanation, signal_explanation, RowMode};
pub use ruleset::{RatioDefinition, Ruleset, RulesetError, StaticRuleset, Threshold};
pub use sample::{Context, LeafTissue, RawSample, SampleDate};
