//! STAGE 4: SYSTEM STATUS AGGREGATION
//!
//! Rolls per-nutrient findings into one verdict per physiological
//! system. Each non-OK tissue reading of a member metric becomes an
//! `Issue`; the system's overall status, confidence, and ranking score
//! are derived from the collected issues and cross-leaf agreement.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::metrics::classify::{Direction, Status, StatusResult};
use crate::metrics::ratios::DerivedRatios;
use crate::ruleset::{Ruleset, Threshold};
use crate::sample::{Context, LeafTissue, PerLeaf, SampleDate};

/// Raw display values behind one issue, both tissues.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IssueValues {
    pub new: Option<f64>,
    pub old: Option<f64>,
}

/// One non-OK finding for a member metric in one tissue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Issue {
    /// Unique per (metric, leaf, direction): `{metric}_{leaf}_{direction}`.
    pub id: String,
    pub metric_id: String,
    pub system: String,
    pub leaf: LeafTissue,
    pub status: Status,
    pub severity: u8,
    pub values: IssueValues,
    pub reason: String,
    pub direction: Option<Direction>,
    /// Band used for the finding, carried for display.
    pub threshold: Option<Threshold>,
    pub is_ratio: bool,
}

/// Qualitative certainty of a system verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Confidence {
    Low,
    Med,
    High,
}

impl Confidence {
    /// Ranking multiplier: clean systems score 0 so only active
    /// problems surface; moderate evidence outranks weak evidence.
    pub fn multiplier(&self) -> f64 {
        match self {
            Confidence::High => 0.0,
            Confidence::Med => 1.2,
            Confidence::Low => 1.0,
        }
    }
}

/// Aggregated verdict for one physiological system.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemStatus {
    pub status: Status,
    pub reason: String,
    pub confidence: Confidence,
    /// Sorted by severity descending (stable on ties).
    pub issues: SmallVec<[Issue; 4]>,
    pub max_severity: u8,
    pub score: f64,
}

/// Per-metric statuses for both tissues, keyed by metric id.
pub type StatusMaps = PerLeaf<FxHashMap<String, StatusResult>>;

/// Aggregate every configured system group into a verdict.
pub fn aggregate_systems<R: Ruleset + ?Sized>(
    statuses: &StatusMaps,
    sample: &SampleDate,
    derived: &DerivedRatios,
    ruleset: &R,
    context: &Context,
) -> FxHashMap<String, SystemStatus> {
    let mut out = FxHashMap::default();
    for group in ruleset.system_groups() {
        let status = aggregate_one(group.key.as_str(), &group.members, statuses, sample, derived, ruleset, context);
        out.insert(group.key.clone(), status);
    }
    out
}

fn metric_value(
    metric_id: &str,
    tissue: LeafTissue,
    is_ratio: bool,
    sample: &SampleDate,
    derived: &DerivedRatios,
) -> Option<f64> {
    if is_ratio {
        derived.get(tissue).get(metric_id).copied()
    } else {
        sample.value(tissue, metric_id)
    }
}

fn aggregate_one<R: Ruleset + ?Sized>(
    system: &str,
    members: &[String],
    statuses: &StatusMaps,
    sample: &SampleDate,
    derived: &DerivedRatios,
    ruleset: &R,
    context: &Context,
) -> SystemStatus {
    let mut issues: SmallVec<[Issue; 4]> = SmallVec::new();
    let mut max_severity = 0u8;
    let mut agreement_count = 0usize;

    for metric_id in members {
        let is_ratio = ruleset.is_ratio(metric_id);
        let values = IssueValues {
            new: metric_value(metric_id, LeafTissue::NewLeaf, is_ratio, sample, derived),
            old: metric_value(metric_id, LeafTissue::OldLeaf, is_ratio, sample, derived),
        };

        let mut tissue_statuses: [Option<&StatusResult>; 2] = [None, None];
        for (slot, tissue) in LeafTissue::BOTH.into_iter().enumerate() {
            let result = match statuses.get(tissue).get(metric_id) {
                Some(r) => r,
                None => continue,
            };
            tissue_statuses[slot] = Some(result);
            if !result.is_finding() {
                continue;
            }

            let threshold = if is_ratio {
                ruleset.ratio_threshold(metric_id)
            } else {
                ruleset.threshold(&context.crop, tissue, metric_id)
            };
            let direction_word = result.direction.map(|d| d.word()).unwrap_or("off");
            issues.push(Issue {
                id: format!("{}_{}_{}", metric_id, tissue.key(), direction_word),
                metric_id: metric_id.clone(),
                system: system.to_string(),
                leaf: tissue,
                status: result.status,
                severity: result.severity,
                values,
                reason: result.reason.clone(),
                direction: result.direction,
                threshold,
                is_ratio,
            });
            max_severity = max_severity.max(result.severity);
        }

        if let (Some(new), Some(old)) = (tissue_statuses[0], tissue_statuses[1]) {
            if new.is_finding() && new.status == old.status {
                agreement_count += 1;
            }
        }
    }

    issues.sort_by(|a, b| b.severity.cmp(&a.severity));

    let status = if issues.iter().any(|i| i.status == Status::Action) {
        Status::Action
    } else if !issues.is_empty() {
        Status::Watch
    } else {
        Status::Ok
    };

    let confidence = if issues.is_empty() {
        Confidence::High
    } else if agreement_count > 0 || issues.len() >= 2 {
        Confidence::Med
    } else {
        Confidence::Low
    };

    let score = max_severity as f64 * confidence.multiplier() * ruleset.importance_weight(system);

    let reason = if issues.is_empty() {
        "All values in range".to_string()
    } else {
        let top = &issues[0];
        let label = ruleset.metric_label(&top.metric_id);
        let direction = top.direction.map(|d| d.word()).unwrap_or("off");
        if issues.len() > 1 {
            format!("{} {} (+{} more)", label, direction, issues.len() - 1)
        } else {
            format!("{} {}", label, direction)
        }
    };

    SystemStatus {
        status,
        reason,
        confidence,
        issues,
        max_severity,
        score,
    }
}
