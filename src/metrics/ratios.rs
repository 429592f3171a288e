//! STAGE 1: DERIVED CHEMICAL RATIOS
//!
//! Evaluates the configured ratio formulas (e.g. K:Ca) against each leaf
//! tissue independently. A ratio is simply omitted for a tissue when a
//! required input is missing or the denominator is not positive; the map
//! only ever contains ratios that resolved.

use rustc_hash::FxHashMap;

use crate::ruleset::RatioDefinition;
use crate::sample::{LeafTissue, PerLeaf, SampleDate};

/// Resolved ratio values per tissue, keyed by ratio id.
pub type DerivedRatios = PerLeaf<FxHashMap<String, f64>>;

/// Evaluate every configured ratio for both tissues of one sample.
pub fn compute_ratios(sample: &SampleDate, definitions: &[RatioDefinition]) -> DerivedRatios {
    let mut derived = DerivedRatios::default();
    for tissue in LeafTissue::BOTH {
        let values = sample.leaf(tissue);
        let out = derived.get_mut(tissue);
        for def in definitions {
            if let Some(value) = def.evaluate(values) {
                out.insert(def.id.clone(), value);
            }
        }
    }
    derived
}
