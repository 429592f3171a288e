//! Evaluation coordinator
//!
//! Runs the full pipeline for one sample: ratio derivation, per-tissue
//! classification, cross-leaf deltas and signals, and system-level
//! aggregation. Every entity is built fresh per call; the engine holds
//! no state, so batch evaluation fans out with no coordination.

use rayon::prelude::*;
use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::metrics::{
    aggregate_systems, classify, compute_ratios, delta, signal, Delta, DerivedRatios, LeafSignal,
    StatusMaps, SystemStatus,
};
use crate::ruleset::Ruleset;
use crate::sample::{Context, LeafTissue, SampleDate};

/// Complete evaluation of one sample against one ruleset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationResult {
    /// Per-metric classification for each tissue; includes derived
    /// ratios alongside raw nutrients.
    pub per_nutrient_status: StatusMaps,
    /// New-vs-old numeric comparison per metric.
    pub deltas: FxHashMap<String, Delta>,
    /// Recognized cross-leaf patterns; absent key means no pattern.
    pub leaf_signals: FxHashMap<String, LeafSignal>,
    /// One verdict per configured system group.
    pub system_status: FxHashMap<String, SystemStatus>,
    /// Resolved ratio values per tissue.
    pub derived: DerivedRatios,
}

/// Every metric id the sample or its derived ratios mention, in
/// deterministic order (nutrients sorted, then configured ratios).
fn metric_universe(sample: &SampleDate, derived: &DerivedRatios, ruleset: &(impl Ruleset + ?Sized)) -> Vec<(String, bool)> {
    let mut nutrients: Vec<String> = sample
        .new_leaf
        .keys()
        .chain(sample.old_leaf.keys())
        .cloned()
        .collect();
    nutrients.sort();
    nutrients.dedup();

    let mut universe: Vec<(String, bool)> = nutrients.into_iter().map(|id| (id, false)).collect();
    for def in ruleset.ratio_definitions() {
        if derived.new_leaf.contains_key(&def.id) || derived.old_leaf.contains_key(&def.id) {
            universe.push((def.id.clone(), true));
        }
    }
    universe
}

/// Evaluate one sample. Pure and total: malformed input degrades to
/// Unknown/null data values, never to an error.
pub fn evaluate<R: Ruleset + ?Sized>(
    sample: &SampleDate,
    ruleset: &R,
    context: &Context,
) -> EvaluationResult {
    let derived = compute_ratios(sample, ruleset.ratio_definitions());
    let universe = metric_universe(sample, &derived, ruleset);

    let mut statuses = StatusMaps::default();
    for tissue in LeafTissue::BOTH {
        let out = statuses.get_mut(tissue);
        for (id, is_ratio) in &universe {
            let (value, threshold) = if *is_ratio {
                (
                    derived.get(tissue).get(id).copied(),
                    ruleset.ratio_threshold(id),
                )
            } else {
                (
                    sample.value(tissue, id),
                    ruleset.threshold(&context.crop, tissue, id),
                )
            };
            out.insert(id.clone(), classify(value, threshold.as_ref()));
        }
    }

    let mut deltas = FxHashMap::default();
    let mut leaf_signals = FxHashMap::default();
    for (id, is_ratio) in &universe {
        let (new_val, old_val) = if *is_ratio {
            (
                derived.new_leaf.get(id).copied(),
                derived.old_leaf.get(id).copied(),
            )
        } else {
            (
                sample.value(LeafTissue::NewLeaf, id),
                sample.value(LeafTissue::OldLeaf, id),
            )
        };
        deltas.insert(id.clone(), delta(new_val, old_val));

        let new_status = &statuses.new_leaf[id];
        let old_status = &statuses.old_leaf[id];
        if let Some(s) = signal(new_status, old_status) {
            leaf_signals.insert(id.clone(), s);
        }
    }

    let system_status = aggregate_systems(&statuses, sample, &derived, ruleset, context);

    EvaluationResult {
        per_nutrient_status: statuses,
        deltas,
        leaf_signals,
        system_status,
        derived,
    }
}

/// Evaluate many samples in parallel. Each evaluation is independent,
/// so this is a plain Rayon fan-out over the slice.
pub fn evaluate_batch<R: Ruleset + Sync + ?Sized>(
    samples: &[SampleDate],
    ruleset: &R,
    context: &Context,
) -> Vec<EvaluationResult> {
    samples
        .par_iter()
        .map(|sample| evaluate(sample, ruleset, context))
        .collect()
}
