//! Ruleset capability
//!
//! Reference bands, ratio definitions, and group tables are supplied by
//! the caller through the [`Ruleset`] trait rather than looked up from
//! ambient state, so several ruleset versions can coexist and tests can
//! inject fixtures. [`StaticRuleset`] is the stock implementation backed
//! by a JSON document.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::sample::{LeafTissue, LeafValues};

/// Reference band for one nutrient or ratio.
///
/// Caller-supplied; the engine consumes the ordering
/// `low <= optimal_low <= optimal_high <= high` but does not enforce it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Threshold {
    pub low: f64,
    pub optimal_low: f64,
    pub optimal_high: f64,
    pub high: f64,
}

impl Threshold {
    pub fn new(low: f64, optimal_low: f64, optimal_high: f64, high: f64) -> Self {
        Self {
            low,
            optimal_low,
            optimal_high,
            high,
        }
    }
}

/// A derived chemical ratio: sum(numerator) / sum(denominator).
///
/// Evaluated independently per leaf tissue; undefined when any required
/// input is missing or the denominator sum is not positive.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatioDefinition {
    pub id: String,
    pub label: String,
    pub numerator: Vec<String>,
    pub denominator: Vec<String>,
}

impl RatioDefinition {
    /// Evaluate against one tissue's parsed values.
    pub fn evaluate(&self, values: &LeafValues) -> Option<f64> {
        let mut num = 0.0;
        for id in &self.numerator {
            num += values.get(id)?;
        }
        let mut den = 0.0;
        for id in &self.denominator {
            den += values.get(id)?;
        }
        if den <= 0.0 {
            return None;
        }
        Some(num / den)
    }
}

/// A physiological system: a set of member nutrient/ratio ids rolled
/// into one summary verdict, with an importance weight for ranking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemGroup {
    pub key: String,
    pub label: String,
    pub members: Vec<String>,
    #[serde(default)]
    pub weight: Option<f64>,
}

/// A display grouping of nutrients for table rows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NutrientGroup {
    pub key: String,
    pub label: String,
    pub members: Vec<String>,
}

/// Default importance weights by system key; unknown keys weigh 1.0.
const DEFAULT_WEIGHTS: &[(&str, f64)] = &[
    ("nitrogen", 1.5),
    ("cations", 1.3),
    ("trace", 1.0),
    ("energy", 1.2),
];

fn default_weight(system: &str) -> f64 {
    DEFAULT_WEIGHTS
        .iter()
        .find(|(key, _)| *key == system)
        .map(|(_, w)| *w)
        .unwrap_or(1.0)
}

/// Capability interface supplying thresholds and configuration.
///
/// Lookups are fail-open: a `None` threshold classifies as OK with
/// reason "No threshold defined", never as an error.
pub trait Ruleset {
    /// Reference band for a raw nutrient in one crop and tissue.
    fn threshold(&self, crop: &str, tissue: LeafTissue, nutrient: &str) -> Option<Threshold>;

    /// Reference band for a derived ratio (crop/tissue independent).
    fn ratio_threshold(&self, ratio_id: &str) -> Option<Threshold>;

    /// Configured ratio formulas, in display order.
    fn ratio_definitions(&self) -> &[RatioDefinition];

    /// System groups, in display order.
    fn system_groups(&self) -> &[SystemGroup];

    /// Nutrient display groups, in display order.
    fn nutrient_groups(&self) -> &[NutrientGroup];

    /// Display label for a nutrient or ratio id (id itself as fallback).
    fn metric_label<'a>(&'a self, id: &'a str) -> &'a str;

    /// Ruleset revision string carried into explanation payloads.
    fn version(&self) -> &str;

    /// Importance weight for a system key.
    fn importance_weight(&self, system: &str) -> f64 {
        self.system_groups()
            .iter()
            .find(|g| g.key == system)
            .and_then(|g| g.weight)
            .unwrap_or_else(|| default_weight(system))
    }

    /// Whether an id names a configured ratio rather than a raw nutrient.
    fn is_ratio(&self, id: &str) -> bool {
        self.ratio_definitions().iter().any(|r| r.id == id)
    }
}

/// Errors from loading or validating a ruleset document.
#[derive(Debug, Error)]
pub enum RulesetError {
    #[error("failed to read ruleset file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse ruleset JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid ruleset: {0}")]
    Invalid(String),
}

/// Thresholds for one crop, keyed tissue -> nutrient id.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CropThresholds {
    #[serde(default)]
    pub new_leaf: FxHashMap<String, Threshold>,
    #[serde(default)]
    pub old_leaf: FxHashMap<String, Threshold>,
}

impl CropThresholds {
    fn tissue(&self, tissue: LeafTissue) -> &FxHashMap<String, Threshold> {
        match tissue {
            LeafTissue::NewLeaf => &self.new_leaf,
            LeafTissue::OldLeaf => &self.old_leaf,
        }
    }
}

/// JSON-backed ruleset.
///
/// Unknown crops fall back to the `"generic"` entry when present, so a
/// partial ruleset degrades to fewer thresholds rather than failing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaticRuleset {
    pub version: String,
    #[serde(default)]
    pub crops: FxHashMap<String, CropThresholds>,
    #[serde(default)]
    pub ratio_thresholds: FxHashMap<String, Threshold>,
    #[serde(default)]
    pub ratios: Vec<RatioDefinition>,
    #[serde(default)]
    pub system_groups: Vec<SystemGroup>,
    #[serde(default)]
    pub nutrient_groups: Vec<NutrientGroup>,
    #[serde(default)]
    pub labels: FxHashMap<String, String>,
}

impl StaticRuleset {
    /// Parse and validate a ruleset document.
    pub fn from_json(json: &str) -> Result<Self, RulesetError> {
        let ruleset: StaticRuleset = serde_json::from_str(json)?;
        ruleset.validate()?;
        Ok(ruleset)
    }

    /// Load a ruleset document from disk.
    pub fn from_path(path: &Path) -> Result<Self, RulesetError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    fn validate(&self) -> Result<(), RulesetError> {
        let mut seen = FxHashMap::default();
        for ratio in &self.ratios {
            if ratio.numerator.is_empty() || ratio.denominator.is_empty() {
                return Err(RulesetError::Invalid(format!(
                    "ratio '{}' has an empty numerator or denominator",
                    ratio.id
                )));
            }
            if seen.insert(ratio.id.clone(), ()).is_some() {
                return Err(RulesetError::Invalid(format!(
                    "duplicate ratio id '{}'",
                    ratio.id
                )));
            }
        }
        Ok(())
    }

    /// Built-in example ruleset (tomato sap bands) used by the demo
    /// binary, the bench, and tests.
    pub fn example() -> Self {
        let mut crops = FxHashMap::default();
        crops.insert("tomato".to_string(), example_tomato());

        let mut ratio_thresholds = FxHashMap::default();
        ratio_thresholds.insert("k_ca".to_string(), Threshold::new(0.5, 1.0, 2.5, 4.0));
        ratio_thresholds.insert("ca_mg".to_string(), Threshold::new(1.0, 2.0, 5.0, 8.0));
        ratio_thresholds.insert("k_ca_mg".to_string(), Threshold::new(0.3, 0.6, 1.6, 2.5));

        let labels: FxHashMap<String, String> = [
            ("nitrogen", "Nitrogen"),
            ("phosphorus", "Phosphorus"),
            ("potassium", "Potassium"),
            ("calcium", "Calcium"),
            ("magnesium", "Magnesium"),
            ("iron", "Iron"),
            ("manganese", "Manganese"),
            ("zinc", "Zinc"),
            ("sugars", "Sugars"),
            ("k_ca", "K : Ca"),
            ("ca_mg", "Ca : Mg"),
            ("k_ca_mg", "K : (Ca+Mg)"),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        Self {
            version: "example-2025.1".to_string(),
            crops,
            ratio_thresholds,
            ratios: vec![
                RatioDefinition {
                    id: "k_ca".to_string(),
                    label: "K : Ca".to_string(),
                    numerator: vec!["potassium".to_string()],
                    denominator: vec!["calcium".to_string()],
                },
                RatioDefinition {
                    id: "ca_mg".to_string(),
                    label: "Ca : Mg".to_string(),
                    numerator: vec!["calcium".to_string()],
                    denominator: vec!["magnesium".to_string()],
                },
                RatioDefinition {
                    id: "k_ca_mg".to_string(),
                    label: "K : (Ca+Mg)".to_string(),
                    numerator: vec!["potassium".to_string()],
                    denominator: vec!["calcium".to_string(), "magnesium".to_string()],
                },
            ],
            system_groups: vec![
                SystemGroup {
                    key: "nitrogen".to_string(),
                    label: "Nitrogen system".to_string(),
                    members: vec!["nitrogen".to_string()],
                    weight: None,
                },
                SystemGroup {
                    key: "cations".to_string(),
                    label: "Cation balance".to_string(),
                    members: vec![
                        "potassium".to_string(),
                        "calcium".to_string(),
                        "magnesium".to_string(),
                        "k_ca".to_string(),
                        "ca_mg".to_string(),
                    ],
                    weight: None,
                },
                SystemGroup {
                    key: "trace".to_string(),
                    label: "Micronutrients".to_string(),
                    members: vec![
                        "iron".to_string(),
                        "manganese".to_string(),
                        "zinc".to_string(),
                    ],
                    weight: None,
                },
                SystemGroup {
                    key: "energy".to_string(),
                    label: "Energy & sugars".to_string(),
                    members: vec!["sugars".to_string(), "phosphorus".to_string()],
                    weight: None,
                },
            ],
            nutrient_groups: vec![
                NutrientGroup {
                    key: "macro".to_string(),
                    label: "Macronutrients".to_string(),
                    members: vec![
                        "nitrogen".to_string(),
                        "phosphorus".to_string(),
                        "potassium".to_string(),
                        "calcium".to_string(),
                        "magnesium".to_string(),
                    ],
                },
                NutrientGroup {
                    key: "micro".to_string(),
                    label: "Micronutrients".to_string(),
                    members: vec![
                        "iron".to_string(),
                        "manganese".to_string(),
                        "zinc".to_string(),
                    ],
                },
                NutrientGroup {
                    key: "energy".to_string(),
                    label: "Energy".to_string(),
                    members: vec!["sugars".to_string()],
                },
            ],
            labels,
        }
    }
}

fn example_tomato() -> CropThresholds {
    let new_leaf: FxHashMap<String, Threshold> = [
        ("nitrogen", Threshold::new(2500.0, 3500.0, 5500.0, 7000.0)),
        ("phosphorus", Threshold::new(150.0, 250.0, 500.0, 700.0)),
        ("potassium", Threshold::new(2000.0, 3000.0, 5000.0, 6500.0)),
        ("calcium", Threshold::new(600.0, 1000.0, 2500.0, 3500.0)),
        ("magnesium", Threshold::new(150.0, 250.0, 550.0, 800.0)),
        ("iron", Threshold::new(1.0, 1.8, 4.0, 6.0)),
        ("manganese", Threshold::new(1.5, 3.0, 8.0, 12.0)),
        ("zinc", Threshold::new(0.8, 1.3, 3.3, 5.0)),
        ("sugars", Threshold::new(4.0, 6.0, 12.0, 16.0)),
    ]
    .iter()
    .map(|(k, t)| (k.to_string(), *t))
    .collect();

    // Old growth runs higher for mobile cations, lower for sugars.
    let old_leaf: FxHashMap<String, Threshold> = [
        ("nitrogen", Threshold::new(2000.0, 3000.0, 5000.0, 6500.0)),
        ("phosphorus", Threshold::new(120.0, 200.0, 450.0, 650.0)),
        ("potassium", Threshold::new(2200.0, 3200.0, 5500.0, 7000.0)),
        ("calcium", Threshold::new(800.0, 1400.0, 3200.0, 4500.0)),
        ("magnesium", Threshold::new(200.0, 320.0, 700.0, 1000.0)),
        ("iron", Threshold::new(1.2, 2.0, 4.5, 7.0)),
        ("manganese", Threshold::new(2.0, 4.0, 10.0, 15.0)),
        ("zinc", Threshold::new(1.0, 1.6, 4.0, 6.0)),
        ("sugars", Threshold::new(3.0, 5.0, 10.0, 14.0)),
    ]
    .iter()
    .map(|(k, t)| (k.to_string(), *t))
    .collect();

    CropThresholds { new_leaf, old_leaf }
}

impl Ruleset for StaticRuleset {
    fn threshold(&self, crop: &str, tissue: LeafTissue, nutrient: &str) -> Option<Threshold> {
        let crop_bands = self
            .crops
            .get(crop)
            .or_else(|| self.crops.get("generic"))?;
        crop_bands.tissue(tissue).get(nutrient).copied()
    }

    fn ratio_threshold(&self, ratio_id: &str) -> Option<Threshold> {
        self.ratio_thresholds.get(ratio_id).copied()
    }

    fn ratio_definitions(&self) -> &[RatioDefinition] {
        &self.ratios
    }

    fn system_groups(&self) -> &[SystemGroup] {
        &self.system_groups
    }

    fn nutrient_groups(&self) -> &[NutrientGroup] {
        &self.nutrient_groups
    }

    fn metric_label<'a>(&'a self, id: &'a str) -> &'a str {
        self.labels.get(id).map(String::as_str).unwrap_or(id)
    }

    fn version(&self) -> &str {
        &self.version
    }
}
