//! Single-metric drill-down payloads
//!
//! Assembles everything the issue drawer needs to explain one metric:
//! the tissue value, its reference band, the classification, the
//! cross-leaf delta and signal, and the ruleset revision the bands came
//! from.

use serde::Serialize;

use crate::evaluator::EvaluationResult;
use crate::metrics::{Delta, LeafSignal, StatusResult};
use crate::ruleset::{Ruleset, Threshold};
use crate::sample::{Context, LeafTissue, SampleDate};

/// Drill-down payload for one metric in one tissue.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricExplanation {
    pub metric_id: String,
    pub label: String,
    pub tissue: LeafTissue,
    pub value: Option<f64>,
    pub threshold: Option<Threshold>,
    pub status: StatusResult,
    pub delta: Delta,
    pub signal: Option<LeafSignal>,
    pub is_ratio: bool,
    /// Revision of the ruleset the threshold came from.
    pub ruleset_version: String,
}

/// Drill-down payload for one metric's cross-leaf signal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignalExplanation {
    pub metric_id: String,
    pub label: String,
    pub signal: LeafSignal,
    pub new_status: StatusResult,
    pub old_status: StatusResult,
    pub delta: Delta,
}

/// Explain one metric in one tissue.
///
/// Returns `None` when the evaluation never saw the metric (not in the
/// sample and not a resolved ratio).
pub fn metric_explanation<R: Ruleset + ?Sized>(
    evaluation: &EvaluationResult,
    sample: &SampleDate,
    ruleset: &R,
    context: &Context,
    metric_id: &str,
    tissue: LeafTissue,
) -> Option<MetricExplanation> {
    let status = evaluation
        .per_nutrient_status
        .get(tissue)
        .get(metric_id)
        .cloned()?;

    let is_ratio = ruleset.is_ratio(metric_id);
    let (value, threshold) = if is_ratio {
        (
            evaluation.derived.get(tissue).get(metric_id).copied(),
            ruleset.ratio_threshold(metric_id),
        )
    } else {
        (
            sample.value(tissue, metric_id),
            ruleset.threshold(&context.crop, tissue, metric_id),
        )
    };

    Some(MetricExplanation {
        metric_id: metric_id.to_string(),
        label: ruleset.metric_label(metric_id).to_string(),
        tissue,
        value,
        threshold,
        status,
        delta: evaluation.deltas.get(metric_id).copied().unwrap_or_default(),
        signal: evaluation.leaf_signals.get(metric_id).copied(),
        is_ratio,
        ruleset_version: ruleset.version().to_string(),
    })
}

/// Explain one metric's cross-leaf signal.
///
/// Returns `None` when no pattern was recognized for the metric.
pub fn signal_explanation<R: Ruleset + ?Sized>(
    evaluation: &EvaluationResult,
    ruleset: &R,
    metric_id: &str,
) -> Option<SignalExplanation> {
    let signal = evaluation.leaf_signals.get(metric_id).copied()?;
    let new_status = evaluation.per_nutrient_status.new_leaf.get(metric_id).cloned()?;
    let old_status = evaluation.per_nutrient_status.old_leaf.get(metric_id).cloned()?;

    Some(SignalExplanation {
        metric_id: metric_id.to_string(),
        label: ruleset.metric_label(metric_id).to_string(),
        signal,
        new_status,
        old_status,
        delta: evaluation.deltas.get(metric_id).copied().unwrap_or_default(),
    })
}
