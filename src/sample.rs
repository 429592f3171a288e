//! Sample data carriers
//!
//! A sap sample pairs two leaf tissues taken from the same plant on the
//! same date: young ("new") growth and mature ("old") growth. Raw records
//! arrive spreadsheet-shaped, so values may be numbers, numeric strings,
//! or junk; parsing drops anything that does not coerce to a finite number.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Parsed numeric readings for one leaf tissue, keyed by nutrient id.
pub type LeafValues = FxHashMap<String, f64>;

/// Leaf tissue identity within a sample.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeafTissue {
    NewLeaf,
    OldLeaf,
}

impl LeafTissue {
    /// Both tissues in evaluation order (new before old).
    pub const BOTH: [LeafTissue; 2] = [LeafTissue::NewLeaf, LeafTissue::OldLeaf];

    /// Stable key used inside issue ids and JSON payloads.
    pub fn key(&self) -> &'static str {
        match self {
            LeafTissue::NewLeaf => "new_leaf",
            LeafTissue::OldLeaf => "old_leaf",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            LeafTissue::NewLeaf => "New growth",
            LeafTissue::OldLeaf => "Old growth",
        }
    }
}

/// Pair of values, one per leaf tissue.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerLeaf<T> {
    pub new_leaf: T,
    pub old_leaf: T,
}

impl<T> PerLeaf<T> {
    pub fn get(&self, tissue: LeafTissue) -> &T {
        match tissue {
            LeafTissue::NewLeaf => &self.new_leaf,
            LeafTissue::OldLeaf => &self.old_leaf,
        }
    }

    pub fn get_mut(&mut self, tissue: LeafTissue) -> &mut T {
        match tissue {
            LeafTissue::NewLeaf => &mut self.new_leaf,
            LeafTissue::OldLeaf => &mut self.old_leaf,
        }
    }
}

/// A raw sample record as imported: values are untyped JSON scalars.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawSample {
    /// ISO-8601 sample date; sorts lexicographically.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub new_leaf: FxHashMap<String, Value>,
    #[serde(default)]
    pub old_leaf: FxHashMap<String, Value>,
}

/// One dated pair of leaf measurements, parsed to numbers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SampleDate {
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub new_leaf: LeafValues,
    #[serde(default)]
    pub old_leaf: LeafValues,
}

impl SampleDate {
    /// Parse a raw record, dropping non-numeric and non-finite values.
    pub fn parse(raw: &RawSample) -> Self {
        Self {
            date: raw.date.clone(),
            new_leaf: parse_leaf(&raw.new_leaf),
            old_leaf: parse_leaf(&raw.old_leaf),
        }
    }

    pub fn leaf(&self, tissue: LeafTissue) -> &LeafValues {
        match tissue {
            LeafTissue::NewLeaf => &self.new_leaf,
            LeafTissue::OldLeaf => &self.old_leaf,
        }
    }

    /// Value of one nutrient in one tissue, if present.
    pub fn value(&self, tissue: LeafTissue, nutrient: &str) -> Option<f64> {
        self.leaf(tissue).get(nutrient).copied()
    }
}

/// Coerce one leaf's raw values to a numeric map.
///
/// Spreadsheet exports frequently carry numbers as strings, so string
/// values are parsed too. Anything else, and any non-finite result, is
/// treated as missing.
pub fn parse_leaf(raw: &FxHashMap<String, Value>) -> LeafValues {
    let mut out = LeafValues::default();
    for (id, value) in raw {
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        if let Some(v) = parsed {
            if v.is_finite() {
                out.insert(id.clone(), v);
            }
        }
    }
    out
}

/// Evaluation context: which crop's reference bands apply.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Context {
    pub crop: String,
    pub growth_stage: String,
}

impl Default for Context {
    fn default() -> Self {
        Self {
            crop: "generic".to_string(),
            growth_stage: "vegetative".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw_map(pairs: &[(&str, Value)]) -> FxHashMap<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn parse_drops_non_numeric() {
        let raw = raw_map(&[
            ("nitrogen", json!(4200.0)),
            ("potassium", json!("3100.5")),
            ("calcium", json!("n/a")),
            ("magnesium", json!(null)),
            ("iron", json!([1, 2])),
        ]);

        let parsed = parse_leaf(&raw);
        assert_eq!(parsed.get("nitrogen"), Some(&4200.0));
        assert_eq!(parsed.get("potassium"), Some(&3100.5));
        assert!(!parsed.contains_key("calcium"));
        assert!(!parsed.contains_key("magnesium"));
        assert!(!parsed.contains_key("iron"));
    }

    #[test]
    fn parse_trims_string_values() {
        let raw = raw_map(&[("zinc", json!(" 42 "))]);
        assert_eq!(parse_leaf(&raw).get("zinc"), Some(&42.0));
    }

    #[test]
    fn sample_parse_keeps_date() {
        let raw = RawSample {
            date: Some("2025-04-12".to_string()),
            new_leaf: raw_map(&[("nitrogen", json!(4000))]),
            old_leaf: raw_map(&[("nitrogen", json!("bad"))]),
        };
        let sample = SampleDate::parse(&raw);
        assert_eq!(sample.date.as_deref(), Some("2025-04-12"));
        assert_eq!(sample.value(LeafTissue::NewLeaf, "nitrogen"), Some(4000.0));
        assert_eq!(sample.value(LeafTissue::OldLeaf, "nitrogen"), None);
    }
}
